pub mod connection;
pub mod fixtures;
pub mod migrations;
pub mod repositories;
pub mod tables;

pub use connection::{connect, connect_with_settings, DbPool};
pub use fixtures::{SeedDataset, SeedResult, VerificationResult};
pub use repositories::{
    CatalogRepository, ConfigurationRepository, ConfigurationRow, ConfigurationSummary,
    RepositoryError, SqlCatalogRepository, SqlConfigurationRepository,
};
