use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::Serialize;
use tera::{Context, Tera};
use thiserror::Error;

/// Fully denormalized, display-ready view of one saved configuration.
/// Reference ids have already been resolved to names by the caller; fields
/// whose resolution failed carry the `"N/A"` placeholder.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ConfigurationView {
    pub configuration_id: String,
    pub product_line: String,
    pub structure_type: String,
    pub model: String,
    pub coverage: String,
    pub color: String,
    pub surface: String,
    pub package: String,
    pub width_cm: Decimal,
    pub depth_cm: Decimal,
    pub height_cm: Decimal,
    pub area_m2: Decimal,
    pub total_price: Decimal,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub customer_address: String,
    pub customer_city: String,
    pub customer_postal_code: String,
    pub contact_preference: String,
    pub notes: Option<String>,
    pub submitted_at: String,
}

pub const PLACEHOLDER: &str = "N/A";

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("template error: {0}")]
    Template(String),
}

/// Renders the two outbound documents from embedded templates.
#[derive(Clone, Debug)]
pub struct EmailRenderer {
    tera: Tera,
}

impl EmailRenderer {
    pub fn new() -> Result<Self, RenderError> {
        let mut tera = Tera::default();
        register_template_filters(&mut tera);

        tera.add_raw_template(
            "customer_confirmation.html.tera",
            include_str!("../../../templates/email/customer_confirmation.html.tera"),
        )
        .map_err(|error| RenderError::Template(error.to_string()))?;

        tera.add_raw_template(
            "admin_alert.html.tera",
            include_str!("../../../templates/email/admin_alert.html.tera"),
        )
        .map_err(|error| RenderError::Template(error.to_string()))?;

        Ok(Self { tera })
    }

    pub fn render_customer_confirmation(
        &self,
        view: &ConfigurationView,
    ) -> Result<String, RenderError> {
        self.render("customer_confirmation.html.tera", view)
    }

    pub fn render_admin_alert(&self, view: &ConfigurationView) -> Result<String, RenderError> {
        self.render("admin_alert.html.tera", view)
    }

    fn render(&self, template: &str, view: &ConfigurationView) -> Result<String, RenderError> {
        let mut context = Context::new();
        context.insert("config", view);

        self.tera
            .render(template, &context)
            .map_err(|error| RenderError::Template(error.to_string()))
    }
}

/// Register custom Tera filters used by the email templates.
///
/// - `money`: two-decimal formatting, e.g. `config.total_price | money`
pub fn register_template_filters(tera: &mut Tera) {
    tera.register_filter("money", tera_money_filter);
}

/// Formats a number to two decimal places. Decimal values arrive as JSON
/// strings, so both shapes are accepted.
fn tera_money_filter(
    value: &tera::Value,
    _args: &HashMap<String, tera::Value>,
) -> tera::Result<tera::Value> {
    let num = match value {
        tera::Value::Number(n) => n.as_f64().unwrap_or(0.0),
        tera::Value::String(s) => s.parse::<f64>().unwrap_or(0.0),
        _ => 0.0,
    };
    Ok(tera::Value::String(format!("{num:.2}")))
}
