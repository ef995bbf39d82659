use chrono::Utc;
use sqlx::{sqlite::SqliteRow, Row};
use uuid::Uuid;

use portico_core::domain::catalog::ProductLine;
use portico_core::domain::configuration::{
    ConfigurationId, ContactPreference, CustomerContact, Dimensions, SteelRecord,
    StoredConfiguration, WoodRecord, DEFAULT_STATUS,
};

use super::{
    parse_decimal, parse_timestamp, ConfigurationRepository, ConfigurationRow,
    ConfigurationSummary, RepositoryError,
};
use crate::{tables, DbPool};

pub struct SqlConfigurationRepository {
    pool: DbPool,
}

impl SqlConfigurationRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl ConfigurationRepository for SqlConfigurationRepository {
    async fn insert(
        &self,
        record: &StoredConfiguration,
    ) -> Result<ConfigurationId, RepositoryError> {
        let id = ConfigurationId(Uuid::new_v4().to_string());
        let created_at = Utc::now().to_rfc3339();

        match record {
            StoredConfiguration::Steel(steel) => {
                sqlx::query(
                    "INSERT INTO steel_configurations (
                        id, structure_type, model_id, coverage_id, structure_color_id,
                        surface_id, package_type, width_cm, depth_cm, height_cm,
                        customer_name, customer_email, customer_phone, customer_address,
                        customer_city, customer_zip, customer_province, contact_preference,
                        total_price, status, notes, created_at
                     ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                )
                .bind(&id.0)
                .bind(&steel.structure_type)
                .bind(&steel.model_id)
                .bind(&steel.coverage_id)
                .bind(steel.structure_color_id.as_deref())
                .bind(steel.surface_id.as_deref())
                .bind(steel.package_type.as_deref())
                .bind(steel.dimensions.width_cm.to_string())
                .bind(steel.dimensions.depth_cm.to_string())
                .bind(steel.dimensions.height_cm.to_string())
                .bind(&steel.customer.name)
                .bind(&steel.customer.email)
                .bind(&steel.customer.phone)
                .bind(&steel.customer.address)
                .bind(&steel.customer.city)
                .bind(&steel.customer.postal_code)
                .bind(steel.customer.province.as_deref())
                .bind(steel.contact_preference.as_str())
                .bind(steel.total_price.to_string())
                .bind(DEFAULT_STATUS)
                .bind(steel.notes.as_deref())
                .bind(&created_at)
                .execute(&self.pool)
                .await?;
            }
            StoredConfiguration::Wood(wood) => {
                sqlx::query(
                    "INSERT INTO wood_configurations (
                        id, structure_type_id, model_id, coverage_id, color_id,
                        surface_id, package_id, width_cm, depth_cm, height_cm,
                        customer_name, customer_email, customer_phone, customer_address,
                        customer_city, customer_postal_code, contact_preference,
                        total_price, status, notes, created_at
                     ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                )
                .bind(&id.0)
                .bind(&wood.structure_type_id)
                .bind(&wood.model_id)
                .bind(&wood.coverage_id)
                .bind(&wood.color_id)
                .bind(&wood.surface_id)
                .bind(wood.package_id.as_deref())
                .bind(wood.dimensions.width_cm.to_string())
                .bind(wood.dimensions.depth_cm.to_string())
                .bind(wood.dimensions.height_cm.to_string())
                .bind(&wood.customer.name)
                .bind(&wood.customer.email)
                .bind(&wood.customer.phone)
                .bind(&wood.customer.address)
                .bind(&wood.customer.city)
                .bind(&wood.customer.postal_code)
                .bind(wood.contact_preference.as_str())
                .bind(wood.total_price.to_string())
                .bind(DEFAULT_STATUS)
                .bind(wood.notes.as_deref())
                .bind(&created_at)
                .execute(&self.pool)
                .await?;
            }
        }

        Ok(id)
    }

    async fn find_by_id(
        &self,
        product_line: ProductLine,
        id: &ConfigurationId,
    ) -> Result<Option<ConfigurationRow>, RepositoryError> {
        match product_line {
            ProductLine::Steel => {
                let row = sqlx::query("SELECT * FROM steel_configurations WHERE id = ?")
                    .bind(&id.0)
                    .fetch_optional(&self.pool)
                    .await?;
                row.map(steel_row).transpose()
            }
            ProductLine::Wood => {
                let row = sqlx::query("SELECT * FROM wood_configurations WHERE id = ?")
                    .bind(&id.0)
                    .fetch_optional(&self.pool)
                    .await?;
                row.map(wood_row).transpose()
            }
        }
    }

    async fn list(
        &self,
        product_line: ProductLine,
    ) -> Result<Vec<ConfigurationSummary>, RepositoryError> {
        let table = tables::configuration_table(product_line);
        let sql = format!(
            "SELECT id, customer_name, customer_email, total_price, status, created_at
             FROM {table}
             ORDER BY created_at DESC, id ASC"
        );

        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        rows.into_iter().map(summary_from_row).collect()
    }

    async fn update_status(
        &self,
        product_line: ProductLine,
        id: &ConfigurationId,
        status: &str,
    ) -> Result<bool, RepositoryError> {
        let table = tables::configuration_table(product_line);
        let sql = format!("UPDATE {table} SET status = ? WHERE id = ?");

        let result = sqlx::query(&sql).bind(status).bind(&id.0).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete(
        &self,
        product_line: ProductLine,
        id: &ConfigurationId,
    ) -> Result<bool, RepositoryError> {
        let table = tables::configuration_table(product_line);
        let sql = format!("DELETE FROM {table} WHERE id = ?");

        let result = sqlx::query(&sql).bind(&id.0).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }
}

fn contact_preference(row: &SqliteRow) -> Result<ContactPreference, RepositoryError> {
    let raw = row.try_get::<String, _>("contact_preference")?;
    ContactPreference::parse(&raw)
        .ok_or_else(|| RepositoryError::Decode(format!("unknown contact preference `{raw}`")))
}

fn dimensions(row: &SqliteRow) -> Result<Dimensions, RepositoryError> {
    Ok(Dimensions {
        width_cm: parse_decimal("width_cm", row.try_get("width_cm")?)?,
        depth_cm: parse_decimal("depth_cm", row.try_get("depth_cm")?)?,
        height_cm: parse_decimal("height_cm", row.try_get("height_cm")?)?,
    })
}

fn steel_row(row: SqliteRow) -> Result<ConfigurationRow, RepositoryError> {
    let record = SteelRecord {
        structure_type: row.try_get("structure_type")?,
        model_id: row.try_get("model_id")?,
        coverage_id: row.try_get("coverage_id")?,
        structure_color_id: row.try_get("structure_color_id")?,
        surface_id: row.try_get("surface_id")?,
        package_type: row.try_get("package_type")?,
        dimensions: dimensions(&row)?,
        customer: CustomerContact {
            name: row.try_get("customer_name")?,
            email: row.try_get("customer_email")?,
            phone: row.try_get("customer_phone")?,
            address: row.try_get("customer_address")?,
            city: row.try_get("customer_city")?,
            postal_code: row.try_get("customer_zip")?,
            province: row.try_get("customer_province")?,
        },
        contact_preference: contact_preference(&row)?,
        total_price: parse_decimal("total_price", row.try_get("total_price")?)?,
        notes: row.try_get("notes")?,
    };

    Ok(ConfigurationRow {
        id: ConfigurationId(row.try_get("id")?),
        record: StoredConfiguration::Steel(record),
        status: row.try_get("status")?,
        created_at: parse_timestamp("created_at", row.try_get("created_at")?)?,
    })
}

fn wood_row(row: SqliteRow) -> Result<ConfigurationRow, RepositoryError> {
    let record = WoodRecord {
        structure_type_id: row.try_get("structure_type_id")?,
        model_id: row.try_get("model_id")?,
        coverage_id: row.try_get("coverage_id")?,
        color_id: row.try_get("color_id")?,
        surface_id: row.try_get("surface_id")?,
        package_id: row.try_get("package_id")?,
        dimensions: dimensions(&row)?,
        customer: CustomerContact {
            name: row.try_get("customer_name")?,
            email: row.try_get("customer_email")?,
            phone: row.try_get("customer_phone")?,
            address: row.try_get("customer_address")?,
            city: row.try_get("customer_city")?,
            postal_code: row.try_get("customer_postal_code")?,
            province: None,
        },
        contact_preference: contact_preference(&row)?,
        total_price: parse_decimal("total_price", row.try_get("total_price")?)?,
        notes: row.try_get("notes")?,
    };

    Ok(ConfigurationRow {
        id: ConfigurationId(row.try_get("id")?),
        record: StoredConfiguration::Wood(record),
        status: row.try_get("status")?,
        created_at: parse_timestamp("created_at", row.try_get("created_at")?)?,
    })
}

fn summary_from_row(row: SqliteRow) -> Result<ConfigurationSummary, RepositoryError> {
    Ok(ConfigurationSummary {
        id: ConfigurationId(row.try_get("id")?),
        customer_name: row.try_get("customer_name")?,
        customer_email: row.try_get("customer_email")?,
        total_price: parse_decimal("total_price", row.try_get("total_price")?)?,
        status: row.try_get("status")?,
        created_at: parse_timestamp("created_at", row.try_get("created_at")?)?,
    })
}
