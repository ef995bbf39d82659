use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CatalogItemId(pub String);

/// Which physical product family a configuration or catalog row belongs to.
/// Established when the wizard starts and never changed mid-flow.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductLine {
    Steel,
    Wood,
}

impl ProductLine {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "steel" => Some(Self::Steel),
            "wood" => Some(Self::Wood),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Steel => "steel",
            Self::Wood => "wood",
        }
    }
}

impl std::fmt::Display for ProductLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The kinds of reference entities the wizard offers as selectable options.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalogKind {
    Model,
    Color,
    Coverage,
    Surface,
    StructureType,
    Package,
}

impl CatalogKind {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "model" | "models" => Some(Self::Model),
            "color" | "colors" => Some(Self::Color),
            "coverage" | "coverages" => Some(Self::Coverage),
            "surface" | "surfaces" => Some(Self::Surface),
            "structure_type" | "structure_types" => Some(Self::StructureType),
            "package" | "packages" => Some(Self::Package),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Model => "model",
            Self::Color => "color",
            Self::Coverage => "coverage",
            Self::Surface => "surface",
            Self::StructureType => "structure_type",
            Self::Package => "package",
        }
    }
}

/// One selectable reference row. `price_modifier` is the base price for
/// models and the per-square-meter price for surfaces; a plain signed
/// adjustment for every other kind. The product line is implied by the
/// physical table the row lives in.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub id: CatalogItemId,
    pub name: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub price_modifier: Decimal,
    pub active: bool,
    pub display_order: Option<i64>,
}
