use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::catalog::ProductLine;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConfigurationId(pub String);

/// Lifecycle tag of a persisted configuration. Free text by contract with the
/// admin surface; the wizard only ever writes [`DEFAULT_STATUS`].
pub const DEFAULT_STATUS: &str = "new";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactPreference {
    Email,
    Phone,
    Whatsapp,
}

impl ContactPreference {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "email" => Some(Self::Email),
            "phone" => Some(Self::Phone),
            "whatsapp" => Some(Self::Whatsapp),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::Phone => "phone",
            Self::Whatsapp => "whatsapp",
        }
    }
}

/// Outer dimensions in centimeters, as configured in the dimensions step.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width_cm: Decimal,
    pub depth_cm: Decimal,
    pub height_cm: Decimal,
}

impl Dimensions {
    /// Footprint in square meters: width × depth / 10 000.
    pub fn area_m2(&self) -> Decimal {
        self.width_cm * self.depth_cm / Decimal::from(10_000)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerContact {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub postal_code: String,
    #[serde(default)]
    pub province: Option<String>,
}

/// A steel candidate as assembled from the wizard. Structure type and package
/// are free text; `structure_color` may be a raw UUID or a color name that
/// the submission pipeline resolves against the steel color catalog.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SteelCandidate {
    pub structure_type: String,
    pub model_id: String,
    pub coverage_id: String,
    pub structure_color: String,
    #[serde(default)]
    pub surface_id: Option<String>,
    #[serde(default)]
    pub package_type: Option<String>,
    pub dimensions: Dimensions,
    pub customer: CustomerContact,
    pub contact_preference: ContactPreference,
    pub total_price: Decimal,
    #[serde(default)]
    pub notes: Option<String>,
}

/// A wood candidate. Every structural choice is a catalog reference and the
/// surface is mandatory; `color_id` is taken verbatim, never name-resolved.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WoodCandidate {
    pub structure_type_id: String,
    pub model_id: String,
    pub coverage_id: String,
    pub color_id: String,
    pub surface_id: String,
    #[serde(default)]
    pub package_id: Option<String>,
    pub dimensions: Dimensions,
    pub customer: CustomerContact,
    pub contact_preference: ContactPreference,
    pub total_price: Decimal,
    #[serde(default)]
    pub notes: Option<String>,
}

/// One submission, discriminated on the wire by its `product_line` tag.
/// Exactly one variant's field set is populated per record; the two are
/// never mixed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "product_line", rename_all = "snake_case")]
pub enum ConfigurationCandidate {
    Steel(SteelCandidate),
    Wood(WoodCandidate),
}

impl ConfigurationCandidate {
    pub fn product_line(&self) -> ProductLine {
        match self {
            Self::Steel(_) => ProductLine::Steel,
            Self::Wood(_) => ProductLine::Wood,
        }
    }

    pub fn customer(&self) -> &CustomerContact {
        match self {
            Self::Steel(candidate) => &candidate.customer,
            Self::Wood(candidate) => &candidate.customer,
        }
    }

    pub fn dimensions(&self) -> &Dimensions {
        match self {
            Self::Steel(candidate) => &candidate.dimensions,
            Self::Wood(candidate) => &candidate.dimensions,
        }
    }

    pub fn total_price(&self) -> Decimal {
        match self {
            Self::Steel(candidate) => candidate.total_price,
            Self::Wood(candidate) => candidate.total_price,
        }
    }
}

/// A steel candidate after the branching step: the color has been resolved
/// to a reference or degraded to `None`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SteelRecord {
    pub structure_type: String,
    pub model_id: String,
    pub coverage_id: String,
    pub structure_color_id: Option<String>,
    pub surface_id: Option<String>,
    pub package_type: Option<String>,
    pub dimensions: Dimensions,
    pub customer: CustomerContact,
    pub contact_preference: ContactPreference,
    pub total_price: Decimal,
    pub notes: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WoodRecord {
    pub structure_type_id: String,
    pub model_id: String,
    pub coverage_id: String,
    pub color_id: String,
    pub surface_id: String,
    pub package_id: Option<String>,
    pub dimensions: Dimensions,
    pub customer: CustomerContact,
    pub contact_preference: ContactPreference,
    pub total_price: Decimal,
    pub notes: Option<String>,
}

/// The shape handed to the persistence layer, one variant per product-line
/// configuration table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "product_line", rename_all = "snake_case")]
pub enum StoredConfiguration {
    Steel(SteelRecord),
    Wood(WoodRecord),
}

impl StoredConfiguration {
    pub fn product_line(&self) -> ProductLine {
        match self {
            Self::Steel(_) => ProductLine::Steel,
            Self::Wood(_) => ProductLine::Wood,
        }
    }

    pub fn customer(&self) -> &CustomerContact {
        match self {
            Self::Steel(record) => &record.customer,
            Self::Wood(record) => &record.customer,
        }
    }
}

impl From<WoodCandidate> for WoodRecord {
    fn from(candidate: WoodCandidate) -> Self {
        Self {
            structure_type_id: candidate.structure_type_id,
            model_id: candidate.model_id,
            coverage_id: candidate.coverage_id,
            color_id: candidate.color_id,
            surface_id: candidate.surface_id,
            package_id: candidate.package_id,
            dimensions: candidate.dimensions,
            customer: candidate.customer,
            contact_preference: candidate.contact_preference,
            total_price: candidate.total_price,
            notes: candidate.notes,
        }
    }
}

impl SteelCandidate {
    /// Finish the branching step with an already-resolved color reference.
    pub fn into_record(self, structure_color_id: Option<String>) -> SteelRecord {
        SteelRecord {
            structure_type: self.structure_type,
            model_id: self.model_id,
            coverage_id: self.coverage_id,
            structure_color_id,
            surface_id: self.surface_id,
            package_type: self.package_type,
            dimensions: self.dimensions,
            customer: self.customer,
            contact_preference: self.contact_preference,
            total_price: self.total_price,
            notes: self.notes,
        }
    }
}
