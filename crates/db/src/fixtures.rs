use chrono::Utc;

use portico_core::domain::catalog::{CatalogKind, ProductLine};

use crate::repositories::RepositoryError;
use crate::{tables, DbPool};

/// Deterministic demo catalog used by `portico seed` and the end-to-end
/// tests. Ids are stable so seeded environments can be scripted against.
pub struct SeedDataset;

pub struct SeedResult {
    pub items_seeded: usize,
}

pub struct VerificationResult {
    pub all_present: bool,
    pub checks: Vec<(&'static str, bool)>,
}

struct SeedItem {
    product_line: ProductLine,
    kind: CatalogKind,
    id: &'static str,
    name: &'static str,
    price_modifier: &'static str,
    display_order: Option<i64>,
}

const SEED_ITEMS: &[SeedItem] = &[
    // Steel carports.
    SeedItem { product_line: ProductLine::Steel, kind: CatalogKind::StructureType, id: "steel-structure-001", name: "Freestanding carport", price_modifier: "0", display_order: Some(1) },
    SeedItem { product_line: ProductLine::Steel, kind: CatalogKind::StructureType, id: "steel-structure-002", name: "Wall-mounted carport", price_modifier: "-180", display_order: Some(2) },
    SeedItem { product_line: ProductLine::Steel, kind: CatalogKind::Model, id: "steel-model-001", name: "Linea", price_modifier: "4200", display_order: Some(1) },
    SeedItem { product_line: ProductLine::Steel, kind: CatalogKind::Model, id: "steel-model-002", name: "Quadra", price_modifier: "5350", display_order: Some(2) },
    SeedItem { product_line: ProductLine::Steel, kind: CatalogKind::Coverage, id: "steel-coverage-001", name: "Corrugated sheet", price_modifier: "0", display_order: Some(1) },
    SeedItem { product_line: ProductLine::Steel, kind: CatalogKind::Coverage, id: "steel-coverage-002", name: "Insulated panel", price_modifier: "620", display_order: Some(2) },
    SeedItem { product_line: ProductLine::Steel, kind: CatalogKind::Color, id: "steel-color-001", name: "Anthracite Grey RAL 7016", price_modifier: "0", display_order: Some(1) },
    SeedItem { product_line: ProductLine::Steel, kind: CatalogKind::Color, id: "steel-color-002", name: "Pure White RAL 9010", price_modifier: "120", display_order: Some(2) },
    SeedItem { product_line: ProductLine::Steel, kind: CatalogKind::Color, id: "steel-color-003", name: "Moss Green RAL 6005", price_modifier: "160", display_order: Some(3) },
    SeedItem { product_line: ProductLine::Steel, kind: CatalogKind::Surface, id: "steel-surface-001", name: "Gravel bed", price_modifier: "28", display_order: Some(1) },
    SeedItem { product_line: ProductLine::Steel, kind: CatalogKind::Surface, id: "steel-surface-002", name: "Concrete slab", price_modifier: "45", display_order: Some(2) },
    SeedItem { product_line: ProductLine::Steel, kind: CatalogKind::Package, id: "steel-package-001", name: "Comfort (LED + downpipe)", price_modifier: "390", display_order: Some(1) },
    // Wood pergolas.
    SeedItem { product_line: ProductLine::Wood, kind: CatalogKind::StructureType, id: "wood-structure-001", name: "Freestanding pergola", price_modifier: "0", display_order: Some(1) },
    SeedItem { product_line: ProductLine::Wood, kind: CatalogKind::StructureType, id: "wood-structure-002", name: "Lean-to pergola", price_modifier: "-220", display_order: Some(2) },
    SeedItem { product_line: ProductLine::Wood, kind: CatalogKind::Model, id: "wood-model-001", name: "Tavola", price_modifier: "5150", display_order: Some(1) },
    SeedItem { product_line: ProductLine::Wood, kind: CatalogKind::Model, id: "wood-model-002", name: "Pergusto", price_modifier: "6400", display_order: Some(2) },
    SeedItem { product_line: ProductLine::Wood, kind: CatalogKind::Coverage, id: "wood-coverage-001", name: "Polycarbonate", price_modifier: "480", display_order: Some(1) },
    SeedItem { product_line: ProductLine::Wood, kind: CatalogKind::Coverage, id: "wood-coverage-002", name: "Safety glass", price_modifier: "1150", display_order: Some(2) },
    SeedItem { product_line: ProductLine::Wood, kind: CatalogKind::Color, id: "wood-color-001", name: "Natural larch", price_modifier: "0", display_order: Some(1) },
    SeedItem { product_line: ProductLine::Wood, kind: CatalogKind::Color, id: "wood-color-002", name: "Walnut glaze", price_modifier: "240", display_order: Some(2) },
    SeedItem { product_line: ProductLine::Wood, kind: CatalogKind::Surface, id: "wood-surface-001", name: "Wood decking", price_modifier: "45", display_order: Some(1) },
    SeedItem { product_line: ProductLine::Wood, kind: CatalogKind::Surface, id: "wood-surface-002", name: "Porphyry paving", price_modifier: "68", display_order: Some(2) },
    SeedItem { product_line: ProductLine::Wood, kind: CatalogKind::Package, id: "wood-package-001", name: "Shade (side curtains)", price_modifier: "520", display_order: Some(1) },
];

impl SeedDataset {
    pub async fn load(pool: &DbPool) -> Result<SeedResult, RepositoryError> {
        let created_at = Utc::now().to_rfc3339();

        for item in SEED_ITEMS {
            let table = tables::catalog_table(item.product_line, item.kind);
            let sql = format!(
                "INSERT INTO {table} (
                    id, name, description, image_url, price_modifier, active, display_order, created_at
                 ) VALUES (?, ?, NULL, NULL, ?, 1, ?, ?)
                 ON CONFLICT(id) DO UPDATE SET
                    name = excluded.name,
                    price_modifier = excluded.price_modifier,
                    display_order = excluded.display_order"
            );

            sqlx::query(&sql)
                .bind(item.id)
                .bind(item.name)
                .bind(item.price_modifier)
                .bind(item.display_order)
                .bind(&created_at)
                .execute(pool)
                .await?;
        }

        Ok(SeedResult { items_seeded: SEED_ITEMS.len() })
    }

    pub async fn verify(pool: &DbPool) -> Result<VerificationResult, RepositoryError> {
        let mut checks = Vec::new();

        for (label, product_line, kind, expected) in [
            ("steel-models", ProductLine::Steel, CatalogKind::Model, 2i64),
            ("steel-colors", ProductLine::Steel, CatalogKind::Color, 3),
            ("steel-surfaces", ProductLine::Steel, CatalogKind::Surface, 2),
            ("wood-models", ProductLine::Wood, CatalogKind::Model, 2),
            ("wood-structure-types", ProductLine::Wood, CatalogKind::StructureType, 2),
            ("wood-surfaces", ProductLine::Wood, CatalogKind::Surface, 2),
        ] {
            let table = tables::catalog_table(product_line, kind);
            let sql = format!("SELECT COUNT(*) FROM {table}");
            let (count,): (i64,) = sqlx::query_as(&sql).fetch_one(pool).await?;
            checks.push((label, count >= expected));
        }

        let all_present = checks.iter().all(|(_, passed)| *passed);
        Ok(VerificationResult { all_present, checks })
    }
}

#[cfg(test)]
mod tests {
    use super::SeedDataset;
    use crate::{connect_with_settings, migrations};

    #[tokio::test]
    async fn seed_load_is_idempotent_and_verifiable() {
        let pool = connect_with_settings("sqlite::memory:?cache=shared", 1, 30)
            .await
            .expect("connect");
        migrations::run_pending(&pool).await.expect("run migrations");

        let first = SeedDataset::load(&pool).await.expect("first load");
        let second = SeedDataset::load(&pool).await.expect("second load");
        assert_eq!(first.items_seeded, second.items_seeded);

        let verification = SeedDataset::verify(&pool).await.expect("verify");
        assert!(
            verification.all_present,
            "failed checks: {:?}",
            verification
                .checks
                .iter()
                .filter_map(|(check, passed)| (!passed).then_some(*check))
                .collect::<Vec<_>>()
        );

        pool.close().await;
    }
}
