use thiserror::Error;

use crate::domain::catalog::ProductLine;
use crate::domain::configuration::{ConfigurationCandidate, SteelCandidate, WoodCandidate};
use crate::domain::wizard::{WizardSelection, WizardStep};
use crate::pricing::{total_price, PriceSheet};

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum AssemblyError {
    #[error("wizard step `{}` has no selection", .0.as_str())]
    MissingStep(WizardStep),
    #[error("a product line must be chosen before assembly")]
    MissingProductLine,
}

/// Merge the wizard's per-step slots into exactly one candidate variant.
///
/// Identifier fields are never defaulted: a missing required step aborts the
/// assembly. The total is computed from the looked-up modifier sheet; notes
/// stay empty when the user wrote none.
pub fn assemble(
    selection: &WizardSelection,
    sheet: &PriceSheet,
) -> Result<ConfigurationCandidate, AssemblyError> {
    let product_line = selection.product_line.ok_or(AssemblyError::MissingProductLine)?;

    let structure = required(WizardStep::StructureType, selection.structure_type.as_deref())?;
    let model_id = required(WizardStep::Model, selection.model_id.as_deref())?;
    let coverage_id = required(WizardStep::Coverage, selection.coverage_id.as_deref())?;
    let color = required(WizardStep::Color, selection.color.as_deref())?;
    let dimensions =
        selection.dimensions.clone().ok_or(AssemblyError::MissingStep(WizardStep::Dimensions))?;
    let customer =
        selection.customer.clone().ok_or(AssemblyError::MissingStep(WizardStep::Contact))?;
    let contact_preference =
        selection.contact_preference.ok_or(AssemblyError::MissingStep(WizardStep::Contact))?;

    let total = total_price(sheet, &dimensions);

    let candidate = match product_line {
        ProductLine::Steel => ConfigurationCandidate::Steel(SteelCandidate {
            structure_type: structure,
            model_id,
            coverage_id,
            structure_color: color,
            surface_id: non_empty(selection.surface_id.as_deref()),
            package_type: non_empty(selection.package.as_deref()),
            dimensions,
            customer,
            contact_preference,
            total_price: total,
            notes: non_empty(selection.notes.as_deref()),
        }),
        ProductLine::Wood => ConfigurationCandidate::Wood(WoodCandidate {
            structure_type_id: structure,
            model_id,
            coverage_id,
            color_id: color,
            surface_id: required(WizardStep::Surface, selection.surface_id.as_deref())?,
            package_id: non_empty(selection.package.as_deref()),
            dimensions,
            customer,
            contact_preference,
            total_price: total,
            notes: non_empty(selection.notes.as_deref()),
        }),
    };

    Ok(candidate)
}

fn required(step: WizardStep, value: Option<&str>) -> Result<String, AssemblyError> {
    match value {
        Some(value) if !value.trim().is_empty() => Ok(value.to_string()),
        _ => Err(AssemblyError::MissingStep(step)),
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|value| !value.is_empty()).map(str::to_string)
}
