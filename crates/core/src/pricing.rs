use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::configuration::Dimensions;

/// The looked-up price modifiers for one submission, one slot per selected
/// catalog entity. Unselected slots stay at zero. `coverage_color_modifier`
/// only ever carries a value in the steel flow.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceSheet {
    pub model_base: Decimal,
    pub coverage_modifier: Decimal,
    pub structure_color_modifier: Decimal,
    pub coverage_color_modifier: Decimal,
    pub surface_price_per_m2: Decimal,
    pub package_modifier: Decimal,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PriceComponent {
    pub label: &'static str,
    pub amount: Decimal,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PriceBreakdown {
    pub components: Vec<PriceComponent>,
    pub total: Decimal,
}

/// Flat sum of the sheet's modifiers, with the surface priced per square
/// meter of footprint. Addition is commutative, so the order of the slots
/// carries no meaning.
pub fn total_price(sheet: &PriceSheet, dimensions: &Dimensions) -> Decimal {
    sheet.model_base
        + sheet.coverage_modifier
        + sheet.structure_color_modifier
        + sheet.coverage_color_modifier
        + sheet.surface_price_per_m2 * dimensions.area_m2()
        + sheet.package_modifier
}

pub fn price_with_breakdown(sheet: &PriceSheet, dimensions: &Dimensions) -> PriceBreakdown {
    let surface_cost = sheet.surface_price_per_m2 * dimensions.area_m2();
    let components = vec![
        PriceComponent { label: "model", amount: sheet.model_base },
        PriceComponent { label: "coverage", amount: sheet.coverage_modifier },
        PriceComponent { label: "structure_color", amount: sheet.structure_color_modifier },
        PriceComponent { label: "coverage_color", amount: sheet.coverage_color_modifier },
        PriceComponent { label: "surface", amount: surface_cost },
        PriceComponent { label: "package", amount: sheet.package_modifier },
    ];

    PriceBreakdown { total: components.iter().map(|component| component.amount).sum(), components }
}
