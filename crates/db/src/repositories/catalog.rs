use chrono::Utc;
use sqlx::{sqlite::SqliteRow, Row};

use portico_core::domain::catalog::{CatalogItem, CatalogItemId, CatalogKind, ProductLine};

use super::{parse_decimal, CatalogRepository, RepositoryError};
use crate::{tables, DbPool};

pub struct SqlCatalogRepository {
    pool: DbPool,
}

impl SqlCatalogRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Hosted deployments occasionally drop the `active` column from single
    /// catalog tables; reads must degrade to "no active filter" instead of
    /// erroring.
    async fn has_active_column(&self, table: &str) -> Result<bool, RepositoryError> {
        let count = sqlx::query(
            "SELECT COUNT(*) AS count FROM pragma_table_info(?) WHERE name = 'active'",
        )
        .bind(table)
        .fetch_one(&self.pool)
        .await?
        .get::<i64, _>("count");

        Ok(count > 0)
    }
}

#[async_trait::async_trait]
impl CatalogRepository for SqlCatalogRepository {
    async fn list_active(
        &self,
        product_line: ProductLine,
        kind: CatalogKind,
    ) -> Result<Vec<CatalogItem>, RepositoryError> {
        let table = tables::catalog_table(product_line, kind);
        let sql = if self.has_active_column(table).await? {
            format!(
                "SELECT id, name, description, image_url, price_modifier, active, display_order
                 FROM {table}
                 WHERE active = 1
                 ORDER BY display_order IS NULL, display_order ASC, name ASC"
            )
        } else {
            format!(
                "SELECT id, name, description, image_url, price_modifier, 1 AS active, display_order
                 FROM {table}
                 ORDER BY display_order IS NULL, display_order ASC, name ASC"
            )
        };

        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        rows.into_iter().map(item_from_row).collect()
    }

    async fn list_all(
        &self,
        product_line: ProductLine,
        kind: CatalogKind,
    ) -> Result<Vec<CatalogItem>, RepositoryError> {
        let table = tables::catalog_table(product_line, kind);
        let active_select = if self.has_active_column(table).await? { "active" } else { "1 AS active" };
        let sql = format!(
            "SELECT id, name, description, image_url, price_modifier, {active_select}, display_order
             FROM {table}
             ORDER BY display_order IS NULL, display_order ASC, name ASC"
        );

        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        rows.into_iter().map(item_from_row).collect()
    }

    async fn find_by_id(
        &self,
        product_line: ProductLine,
        kind: CatalogKind,
        id: &CatalogItemId,
    ) -> Result<Option<CatalogItem>, RepositoryError> {
        let table = tables::catalog_table(product_line, kind);
        let active_select = if self.has_active_column(table).await? { "active" } else { "1 AS active" };
        let sql = format!(
            "SELECT id, name, description, image_url, price_modifier, {active_select}, display_order
             FROM {table}
             WHERE id = ?"
        );

        let row = sqlx::query(&sql).bind(&id.0).fetch_optional(&self.pool).await?;
        row.map(item_from_row).transpose()
    }

    async fn find_color_by_name(
        &self,
        product_line: ProductLine,
        pattern: &str,
    ) -> Result<Option<CatalogItem>, RepositoryError> {
        let table = tables::catalog_table(product_line, CatalogKind::Color);
        let active_select = if self.has_active_column(table).await? { "active" } else { "1 AS active" };
        let sql = format!(
            "SELECT id, name, description, image_url, price_modifier, {active_select}, display_order
             FROM {table}
             WHERE LOWER(name) LIKE '%' || LOWER(?) || '%'
             ORDER BY name ASC
             LIMIT 1"
        );

        let row = sqlx::query(&sql).bind(pattern).fetch_optional(&self.pool).await?;
        row.map(item_from_row).transpose()
    }

    async fn save(
        &self,
        product_line: ProductLine,
        kind: CatalogKind,
        item: CatalogItem,
    ) -> Result<(), RepositoryError> {
        let table = tables::catalog_table(product_line, kind);
        let sql = format!(
            "INSERT INTO {table} (
                id, name, description, image_url, price_modifier, active, display_order, created_at
             ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                description = excluded.description,
                image_url = excluded.image_url,
                price_modifier = excluded.price_modifier,
                active = excluded.active,
                display_order = excluded.display_order"
        );

        sqlx::query(&sql)
            .bind(&item.id.0)
            .bind(&item.name)
            .bind(item.description.as_deref())
            .bind(item.image_url.as_deref())
            .bind(item.price_modifier.to_string())
            .bind(i64::from(item.active))
            .bind(item.display_order)
            .bind(Utc::now().to_rfc3339())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn delete(
        &self,
        product_line: ProductLine,
        kind: CatalogKind,
        id: &CatalogItemId,
    ) -> Result<bool, RepositoryError> {
        let table = tables::catalog_table(product_line, kind);
        let sql = format!("DELETE FROM {table} WHERE id = ?");

        let result = sqlx::query(&sql).bind(&id.0).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }
}

fn item_from_row(row: SqliteRow) -> Result<CatalogItem, RepositoryError> {
    Ok(CatalogItem {
        id: CatalogItemId(row.try_get("id")?),
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        image_url: row.try_get("image_url")?,
        price_modifier: parse_decimal("price_modifier", row.try_get("price_modifier")?)?,
        active: row.try_get::<i64, _>("active")? != 0,
        display_order: row.try_get("display_order")?,
    })
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use portico_core::domain::catalog::{CatalogItem, CatalogItemId, CatalogKind, ProductLine};

    use super::SqlCatalogRepository;
    use crate::repositories::CatalogRepository;
    use crate::{connect_with_settings, migrations, DbPool};

    async fn setup_pool() -> DbPool {
        let pool = connect_with_settings("sqlite::memory:?cache=shared", 1, 30)
            .await
            .expect("connect test pool");
        migrations::run_pending(&pool).await.expect("run migrations");
        pool
    }

    fn item(id: &str, name: &str, active: bool, display_order: Option<i64>) -> CatalogItem {
        CatalogItem {
            id: CatalogItemId(id.to_string()),
            name: name.to_string(),
            description: None,
            image_url: None,
            price_modifier: Decimal::from(100),
            active,
            display_order,
        }
    }

    #[tokio::test]
    async fn list_active_filters_and_orders_with_name_fallback() {
        let pool = setup_pool().await;
        let repo = SqlCatalogRepository::new(pool.clone());

        repo.save(ProductLine::Steel, CatalogKind::Model, item("m-b", "Beta", true, None))
            .await
            .expect("save m-b");
        repo.save(ProductLine::Steel, CatalogKind::Model, item("m-a", "Alpha", true, None))
            .await
            .expect("save m-a");
        repo.save(ProductLine::Steel, CatalogKind::Model, item("m-z", "Zeta", true, Some(1)))
            .await
            .expect("save m-z");
        repo.save(ProductLine::Steel, CatalogKind::Model, item("m-x", "Retired", false, Some(0)))
            .await
            .expect("save m-x");

        let listed = repo
            .list_active(ProductLine::Steel, CatalogKind::Model)
            .await
            .expect("list steel models");

        let names: Vec<&str> = listed.iter().map(|entry| entry.name.as_str()).collect();
        assert_eq!(names, vec!["Zeta", "Alpha", "Beta"]);

        pool.close().await;
    }

    #[tokio::test]
    async fn missing_active_column_degrades_to_no_filter() {
        let pool = setup_pool().await;
        let repo = SqlCatalogRepository::new(pool.clone());

        repo.save(ProductLine::Steel, CatalogKind::Surface, item("s-1", "Gravel", false, None))
            .await
            .expect("save surface");

        sqlx::query("ALTER TABLE steel_surfaces DROP COLUMN active")
            .execute(&pool)
            .await
            .expect("drop active column");

        let listed = repo
            .list_active(ProductLine::Steel, CatalogKind::Surface)
            .await
            .expect("list without active column");

        assert_eq!(listed.len(), 1);
        assert!(listed[0].active, "rows read without an active column default to active");

        pool.close().await;
    }

    #[tokio::test]
    async fn color_lookup_is_case_insensitive_and_partial() {
        let pool = setup_pool().await;
        let repo = SqlCatalogRepository::new(pool.clone());

        repo.save(
            ProductLine::Steel,
            CatalogKind::Color,
            item("col-1", "Anthracite Grey RAL 7016", true, None),
        )
        .await
        .expect("save color");

        let hit = repo
            .find_color_by_name(ProductLine::Steel, "anthracite")
            .await
            .expect("lookup")
            .expect("color should match");
        assert_eq!(hit.id.0, "col-1");

        let miss = repo.find_color_by_name(ProductLine::Steel, "crimson").await.expect("lookup");
        assert!(miss.is_none());

        pool.close().await;
    }

    #[tokio::test]
    async fn save_find_delete_round_trip() {
        let pool = setup_pool().await;
        let repo = SqlCatalogRepository::new(pool.clone());
        let entry = item("p-1", "Comfort package", true, Some(2));

        repo.save(ProductLine::Wood, CatalogKind::Package, entry.clone())
            .await
            .expect("save package");

        let found = repo
            .find_by_id(ProductLine::Wood, CatalogKind::Package, &entry.id)
            .await
            .expect("find package");
        assert_eq!(found, Some(entry.clone()));

        let deleted =
            repo.delete(ProductLine::Wood, CatalogKind::Package, &entry.id).await.expect("delete");
        assert!(deleted);

        let gone = repo
            .find_by_id(ProductLine::Wood, CatalogKind::Package, &entry.id)
            .await
            .expect("find after delete");
        assert_eq!(gone, None);

        pool.close().await;
    }
}
