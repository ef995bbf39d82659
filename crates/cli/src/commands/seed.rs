use crate::commands::CommandResult;
use portico_core::config::{AppConfig, LoadOptions};
use portico_db::{connect_with_settings, migrations, SeedDataset};

pub fn run() -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "seed",
                "config_validation",
                format!("configuration issue: {error}"),
                2,
            );
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                "seed",
                "runtime_init",
                format!("failed to initialize async runtime: {error}"),
                3,
            );
        }
    };

    let result = runtime.block_on(async {
        let pool = connect_with_settings(
            &config.database.url,
            config.database.max_connections,
            config.database.timeout_secs,
        )
        .await
        .map_err(|error| ("db_connectivity", error.to_string(), 4u8))?;

        migrations::run_pending(&pool)
            .await
            .map_err(|error| ("migration", error.to_string(), 5u8))?;

        let seed_result = SeedDataset::load(&pool)
            .await
            .map_err(|error| ("seed_execution", error.to_string(), 5u8))?;

        let verification = SeedDataset::verify(&pool)
            .await
            .map_err(|error| ("seed_verification", error.to_string(), 6u8))?;

        let run_result: Result<usize, (&'static str, String, u8)> = if !verification.all_present {
            let failed_checks = verification
                .checks
                .iter()
                .filter_map(|(check, passed)| (!passed).then_some(*check))
                .collect::<Vec<_>>();
            let message = if failed_checks.is_empty() {
                "Some seed data failed to load".to_string()
            } else {
                format!("Seed verification failed for checks: {}", failed_checks.join(", "))
            };
            Err(("seed_verification", message, 6u8))
        } else {
            Ok(seed_result.items_seeded)
        };

        pool.close().await;
        run_result
    });

    match result {
        Ok(items_seeded) => CommandResult::success(
            "seed",
            format!("demo catalog loaded: {items_seeded} entries across both product lines"),
        ),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("seed", error_class, message, exit_code)
        }
    }
}

#[cfg(test)]
mod tests {
    #[test]
    fn verification_error_message_targets_failed_checks() {
        let checks = [("steel-models", true), ("wood-models", false), ("wood-surfaces", false)];

        let failed_checks = checks
            .iter()
            .filter_map(|(check, passed)| (!passed).then_some(*check))
            .collect::<Vec<_>>();

        let message = if failed_checks.is_empty() {
            "Some seed data failed to load".to_string()
        } else {
            format!("Seed verification failed for checks: {}", failed_checks.join(", "))
        };

        assert_eq!(message, "Seed verification failed for checks: wood-models, wood-surfaces");
    }
}
