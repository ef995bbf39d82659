use serde::{Deserialize, Serialize};

use crate::domain::catalog::ProductLine;
use crate::domain::configuration::{ContactPreference, CustomerContact, Dimensions};

/// The wizard steps, in presentation order. Used for missing-step reporting
/// and for addressing a step's slot by key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardStep {
    StructureType,
    Model,
    Dimensions,
    Coverage,
    Color,
    CoverageColor,
    Surface,
    Package,
    Contact,
}

impl WizardStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StructureType => "structure_type",
            Self::Model => "model",
            Self::Dimensions => "dimensions",
            Self::Coverage => "coverage",
            Self::Color => "color",
            Self::CoverageColor => "coverage_color",
            Self::Surface => "surface",
            Self::Package => "package",
            Self::Contact => "contact",
        }
    }
}

/// The transient selection state of one wizard run. Each slot is `None`
/// until the user picks it; no cross-step invariants are enforced here —
/// that happens at assembly and submission time.
///
/// `structure_type` holds a free-text name for the steel flow and a catalog
/// id for the wood flow; `color` likewise is a name-or-UUID for steel and a
/// catalog id for wood. `coverage_color_id` exists only in the steel flow
/// and only feeds the price.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WizardSelection {
    pub product_line: Option<ProductLine>,
    #[serde(default)]
    pub structure_type: Option<String>,
    #[serde(default)]
    pub model_id: Option<String>,
    #[serde(default)]
    pub dimensions: Option<Dimensions>,
    #[serde(default)]
    pub coverage_id: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub coverage_color_id: Option<String>,
    #[serde(default)]
    pub surface_id: Option<String>,
    #[serde(default)]
    pub package: Option<String>,
    #[serde(default)]
    pub customer: Option<CustomerContact>,
    #[serde(default)]
    pub contact_preference: Option<ContactPreference>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl WizardSelection {
    /// Required steps that still have no selection for the given line.
    /// Surface and package are optional for steel; both flows treat
    /// coverage-color and notes as optional.
    pub fn missing_steps(&self, product_line: ProductLine) -> Vec<WizardStep> {
        let mut missing = Vec::new();

        if self.structure_type.as_deref().map_or(true, str::is_empty) {
            missing.push(WizardStep::StructureType);
        }
        if self.model_id.as_deref().map_or(true, str::is_empty) {
            missing.push(WizardStep::Model);
        }
        if self.dimensions.is_none() {
            missing.push(WizardStep::Dimensions);
        }
        if self.coverage_id.as_deref().map_or(true, str::is_empty) {
            missing.push(WizardStep::Coverage);
        }
        if self.color.as_deref().map_or(true, str::is_empty) {
            missing.push(WizardStep::Color);
        }
        if product_line == ProductLine::Wood
            && self.surface_id.as_deref().map_or(true, str::is_empty)
        {
            missing.push(WizardStep::Surface);
        }
        if self.customer.is_none() || self.contact_preference.is_none() {
            missing.push(WizardStep::Contact);
        }

        missing
    }
}

#[cfg(test)]
mod tests {
    use super::{WizardSelection, WizardStep};
    use crate::domain::catalog::ProductLine;

    #[test]
    fn empty_selection_reports_every_required_step() {
        let missing = WizardSelection::default().missing_steps(ProductLine::Wood);

        assert!(missing.contains(&WizardStep::StructureType));
        assert!(missing.contains(&WizardStep::Model));
        assert!(missing.contains(&WizardStep::Dimensions));
        assert!(missing.contains(&WizardStep::Coverage));
        assert!(missing.contains(&WizardStep::Color));
        assert!(missing.contains(&WizardStep::Surface));
        assert!(missing.contains(&WizardStep::Contact));
    }

    #[test]
    fn surface_is_not_required_for_steel() {
        let missing = WizardSelection::default().missing_steps(ProductLine::Steel);
        assert!(!missing.contains(&WizardStep::Surface));
    }

    #[test]
    fn blank_reference_counts_as_missing() {
        let selection =
            WizardSelection { model_id: Some(String::new()), ..WizardSelection::default() };

        assert!(selection.missing_steps(ProductLine::Steel).contains(&WizardStep::Model));
    }
}
