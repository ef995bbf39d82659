use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use portico_core::domain::catalog::{CatalogItem, CatalogItemId, CatalogKind, ProductLine};
use portico_core::domain::configuration::{ConfigurationId, StoredConfiguration, DEFAULT_STATUS};

use super::{
    CatalogRepository, ConfigurationRepository, ConfigurationRow, ConfigurationSummary,
    RepositoryError,
};

/// Catalog fake with the same ordering and matching semantics as the SQL
/// repository. Color lookups are counted so pipeline tests can assert that
/// UUID-shaped colors never hit the catalog.
#[derive(Default)]
pub struct InMemoryCatalogRepository {
    items: RwLock<HashMap<(ProductLine, CatalogKind), Vec<CatalogItem>>>,
    color_lookups: AtomicUsize,
}

impl InMemoryCatalogRepository {
    pub async fn put(&self, product_line: ProductLine, kind: CatalogKind, item: CatalogItem) {
        let mut items = self.items.write().await;
        let bucket = items.entry((product_line, kind)).or_default();
        bucket.retain(|existing| existing.id != item.id);
        bucket.push(item);
    }

    pub fn color_lookup_count(&self) -> usize {
        self.color_lookups.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl CatalogRepository for InMemoryCatalogRepository {
    async fn list_active(
        &self,
        product_line: ProductLine,
        kind: CatalogKind,
    ) -> Result<Vec<CatalogItem>, RepositoryError> {
        let items = self.items.read().await;
        let mut listed: Vec<CatalogItem> = items
            .get(&(product_line, kind))
            .map(|bucket| bucket.iter().filter(|item| item.active).cloned().collect())
            .unwrap_or_default();

        sort_for_display(&mut listed);
        Ok(listed)
    }

    async fn list_all(
        &self,
        product_line: ProductLine,
        kind: CatalogKind,
    ) -> Result<Vec<CatalogItem>, RepositoryError> {
        let items = self.items.read().await;
        let mut listed: Vec<CatalogItem> =
            items.get(&(product_line, kind)).cloned().unwrap_or_default();

        sort_for_display(&mut listed);
        Ok(listed)
    }

    async fn find_by_id(
        &self,
        product_line: ProductLine,
        kind: CatalogKind,
        id: &CatalogItemId,
    ) -> Result<Option<CatalogItem>, RepositoryError> {
        let items = self.items.read().await;
        Ok(items
            .get(&(product_line, kind))
            .and_then(|bucket| bucket.iter().find(|item| &item.id == id).cloned()))
    }

    async fn find_color_by_name(
        &self,
        product_line: ProductLine,
        pattern: &str,
    ) -> Result<Option<CatalogItem>, RepositoryError> {
        self.color_lookups.fetch_add(1, Ordering::SeqCst);

        let needle = pattern.to_lowercase();
        let items = self.items.read().await;
        let mut matches: Vec<CatalogItem> = items
            .get(&(product_line, CatalogKind::Color))
            .map(|bucket| {
                bucket
                    .iter()
                    .filter(|item| item.name.to_lowercase().contains(&needle))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        matches.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(matches.into_iter().next())
    }

    async fn save(
        &self,
        product_line: ProductLine,
        kind: CatalogKind,
        item: CatalogItem,
    ) -> Result<(), RepositoryError> {
        self.put(product_line, kind, item).await;
        Ok(())
    }

    async fn delete(
        &self,
        product_line: ProductLine,
        kind: CatalogKind,
        id: &CatalogItemId,
    ) -> Result<bool, RepositoryError> {
        let mut items = self.items.write().await;
        let Some(bucket) = items.get_mut(&(product_line, kind)) else {
            return Ok(false);
        };
        let before = bucket.len();
        bucket.retain(|item| &item.id != id);
        Ok(bucket.len() < before)
    }
}

fn sort_for_display(items: &mut [CatalogItem]) {
    items.sort_by(|a, b| match (a.display_order, b.display_order) {
        (Some(left), Some(right)) => left.cmp(&right).then_with(|| a.name.cmp(&b.name)),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => a.name.cmp(&b.name),
    });
}

/// Configuration fake. `fail_with` arms a bounded number of insert failures
/// so pipeline tests can exercise the persistence-error and retry paths.
#[derive(Default)]
pub struct InMemoryConfigurationRepository {
    rows: RwLock<Vec<ConfigurationRow>>,
    armed_failure: RwLock<Option<(String, u32)>>,
}

impl InMemoryConfigurationRepository {
    pub async fn fail_with(&self, message: &str, times: u32) {
        *self.armed_failure.write().await = Some((message.to_string(), times));
    }

    pub async fn row_count(&self) -> usize {
        self.rows.read().await.len()
    }
}

#[async_trait::async_trait]
impl ConfigurationRepository for InMemoryConfigurationRepository {
    async fn insert(
        &self,
        record: &StoredConfiguration,
    ) -> Result<ConfigurationId, RepositoryError> {
        let mut armed = self.armed_failure.write().await;
        if let Some((message, remaining)) = armed.take() {
            if remaining > 1 {
                *armed = Some((message.clone(), remaining - 1));
            }
            if remaining > 0 {
                return Err(RepositoryError::Decode(message));
            }
        }
        drop(armed);

        let id = ConfigurationId(Uuid::new_v4().to_string());
        let mut rows = self.rows.write().await;
        rows.push(ConfigurationRow {
            id: id.clone(),
            record: record.clone(),
            status: DEFAULT_STATUS.to_string(),
            created_at: Utc::now(),
        });

        Ok(id)
    }

    async fn find_by_id(
        &self,
        product_line: ProductLine,
        id: &ConfigurationId,
    ) -> Result<Option<ConfigurationRow>, RepositoryError> {
        let rows = self.rows.read().await;
        Ok(rows
            .iter()
            .find(|row| row.record.product_line() == product_line && &row.id == id)
            .cloned())
    }

    async fn list(
        &self,
        product_line: ProductLine,
    ) -> Result<Vec<ConfigurationSummary>, RepositoryError> {
        let rows = self.rows.read().await;
        let mut summaries: Vec<ConfigurationSummary> = rows
            .iter()
            .filter(|row| row.record.product_line() == product_line)
            .map(|row| ConfigurationSummary {
                id: row.id.clone(),
                customer_name: row.record.customer().name.clone(),
                customer_email: row.record.customer().email.clone(),
                total_price: match &row.record {
                    StoredConfiguration::Steel(steel) => steel.total_price,
                    StoredConfiguration::Wood(wood) => wood.total_price,
                },
                status: row.status.clone(),
                created_at: row.created_at,
            })
            .collect();

        summaries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(summaries)
    }

    async fn update_status(
        &self,
        product_line: ProductLine,
        id: &ConfigurationId,
        status: &str,
    ) -> Result<bool, RepositoryError> {
        let mut rows = self.rows.write().await;
        match rows
            .iter_mut()
            .find(|row| row.record.product_line() == product_line && &row.id == id)
        {
            Some(row) => {
                row.status = status.to_string();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(
        &self,
        product_line: ProductLine,
        id: &ConfigurationId,
    ) -> Result<bool, RepositoryError> {
        let mut rows = self.rows.write().await;
        let before = rows.len();
        rows.retain(|row| !(row.record.product_line() == product_line && &row.id == id));
        Ok(rows.len() < before)
    }
}
