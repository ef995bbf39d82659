use std::process::ExitCode;

fn main() -> ExitCode {
    portico_cli::run()
}
