use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

use portico_core::domain::catalog::{CatalogItem, CatalogItemId, CatalogKind, ProductLine};
use portico_core::domain::configuration::{ConfigurationId, StoredConfiguration};

pub mod catalog;
pub mod configuration;
pub mod memory;

pub use catalog::SqlCatalogRepository;
pub use configuration::SqlConfigurationRepository;
pub use memory::{InMemoryCatalogRepository, InMemoryConfigurationRepository};

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

/// Admin list view of a persisted configuration.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ConfigurationSummary {
    pub id: ConfigurationId,
    pub customer_name: String,
    pub customer_email: String,
    pub total_price: Decimal,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

/// A persisted configuration with its row-level lifecycle fields.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ConfigurationRow {
    pub id: ConfigurationId,
    pub record: StoredConfiguration,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[async_trait]
pub trait CatalogRepository: Send + Sync {
    /// Active entries for one wizard step, ordered by display order with a
    /// name fallback. Tables without an `active` column are read unfiltered.
    async fn list_active(
        &self,
        product_line: ProductLine,
        kind: CatalogKind,
    ) -> Result<Vec<CatalogItem>, RepositoryError>;

    /// Every entry including inactive ones, for the admin screens.
    async fn list_all(
        &self,
        product_line: ProductLine,
        kind: CatalogKind,
    ) -> Result<Vec<CatalogItem>, RepositoryError>;

    async fn find_by_id(
        &self,
        product_line: ProductLine,
        kind: CatalogKind,
        id: &CatalogItemId,
    ) -> Result<Option<CatalogItem>, RepositoryError>;

    /// Case-insensitive partial-name color lookup, first match only. Used by
    /// the submission pipeline to resolve free-text steel color names.
    async fn find_color_by_name(
        &self,
        product_line: ProductLine,
        pattern: &str,
    ) -> Result<Option<CatalogItem>, RepositoryError>;

    async fn save(
        &self,
        product_line: ProductLine,
        kind: CatalogKind,
        item: CatalogItem,
    ) -> Result<(), RepositoryError>;

    async fn delete(
        &self,
        product_line: ProductLine,
        kind: CatalogKind,
        id: &CatalogItemId,
    ) -> Result<bool, RepositoryError>;
}

#[async_trait]
pub trait ConfigurationRepository: Send + Sync {
    /// Persist one submission as a single atomic insert and return the
    /// generated id. Never deduplicates: identical submissions create
    /// distinct rows.
    async fn insert(
        &self,
        record: &StoredConfiguration,
    ) -> Result<ConfigurationId, RepositoryError>;

    async fn find_by_id(
        &self,
        product_line: ProductLine,
        id: &ConfigurationId,
    ) -> Result<Option<ConfigurationRow>, RepositoryError>;

    async fn list(
        &self,
        product_line: ProductLine,
    ) -> Result<Vec<ConfigurationSummary>, RepositoryError>;

    async fn update_status(
        &self,
        product_line: ProductLine,
        id: &ConfigurationId,
        status: &str,
    ) -> Result<bool, RepositoryError>;

    async fn delete(
        &self,
        product_line: ProductLine,
        id: &ConfigurationId,
    ) -> Result<bool, RepositoryError>;
}

pub(crate) fn parse_decimal(column: &str, value: String) -> Result<Decimal, RepositoryError> {
    value.parse::<Decimal>().map_err(|error| {
        RepositoryError::Decode(format!("invalid decimal in `{column}`: `{value}` ({error})"))
    })
}

pub(crate) fn parse_timestamp(
    column: &str,
    value: String,
) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(&value).map(|timestamp| timestamp.with_timezone(&Utc)).map_err(
        |error| {
            RepositoryError::Decode(format!("invalid timestamp in `{column}`: `{value}` ({error})"))
        },
    )
}
