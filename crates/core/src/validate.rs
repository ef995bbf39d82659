use std::sync::OnceLock;

use regex::Regex;

use crate::domain::configuration::{ConfigurationCandidate, CustomerContact};
use crate::errors::ValidationError;

static EMAIL_SHAPE: OnceLock<Regex> = OnceLock::new();

fn email_shape() -> &'static Regex {
    EMAIL_SHAPE.get_or_init(|| {
        Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern is valid")
    })
}

/// Fail-fast candidate validation, the first pipeline state. Checks only
/// presence and shape; referential integrity against the catalog is not this
/// layer's concern.
pub fn validate_candidate(candidate: &ConfigurationCandidate) -> Result<(), ValidationError> {
    match candidate {
        ConfigurationCandidate::Steel(steel) => {
            require("structure_type", &steel.structure_type)?;
            require("model_id", &steel.model_id)?;
            require("coverage_id", &steel.coverage_id)?;
            require("structure_color", &steel.structure_color)?;
            validate_contact(&steel.customer)?;
        }
        ConfigurationCandidate::Wood(wood) => {
            require("structure_type_id", &wood.structure_type_id)?;
            require("model_id", &wood.model_id)?;
            require("coverage_id", &wood.coverage_id)?;
            require("color_id", &wood.color_id)?;
            require("surface_id", &wood.surface_id)?;
            validate_contact(&wood.customer)?;
        }
    }

    Ok(())
}

fn validate_contact(contact: &CustomerContact) -> Result<(), ValidationError> {
    require("customer_name", &contact.name)?;
    require("customer_email", &contact.email)?;
    require("customer_phone", &contact.phone)?;

    if !email_shape().is_match(contact.email.trim()) {
        return Err(ValidationError::MalformedEmail(contact.email.clone()));
    }

    Ok(())
}

fn require(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::MissingField(field));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::validate_candidate;
    use crate::domain::configuration::{
        ConfigurationCandidate, ContactPreference, CustomerContact, Dimensions, SteelCandidate,
        WoodCandidate,
    };
    use crate::errors::ValidationError;

    fn contact() -> CustomerContact {
        CustomerContact {
            name: "Mara Vogel".to_string(),
            email: "mara@example.com".to_string(),
            phone: "+39 333 1234567".to_string(),
            address: "Via Dante 12".to_string(),
            city: "Trento".to_string(),
            postal_code: "38100".to_string(),
            province: Some("TN".to_string()),
        }
    }

    fn dims() -> Dimensions {
        Dimensions {
            width_cm: Decimal::from(300),
            depth_cm: Decimal::from(500),
            height_cm: Decimal::from(240),
        }
    }

    fn steel() -> SteelCandidate {
        SteelCandidate {
            structure_type: "carport".to_string(),
            model_id: "m-1".to_string(),
            coverage_id: "c-1".to_string(),
            structure_color: "anthracite".to_string(),
            surface_id: None,
            package_type: None,
            dimensions: dims(),
            customer: contact(),
            contact_preference: ContactPreference::Email,
            total_price: Decimal::from(4_000),
            notes: None,
        }
    }

    fn wood() -> WoodCandidate {
        WoodCandidate {
            structure_type_id: "st-1".to_string(),
            model_id: "m-1".to_string(),
            coverage_id: "c-1".to_string(),
            color_id: "col-1".to_string(),
            surface_id: "s-1".to_string(),
            package_id: None,
            dimensions: dims(),
            customer: contact(),
            contact_preference: ContactPreference::Phone,
            total_price: Decimal::from(6_000),
            notes: None,
        }
    }

    #[test]
    fn complete_candidates_pass() {
        validate_candidate(&ConfigurationCandidate::Steel(steel())).expect("steel valid");
        validate_candidate(&ConfigurationCandidate::Wood(wood())).expect("wood valid");
    }

    #[test]
    fn every_steel_reference_field_is_required() {
        for field in ["structure_type", "model_id", "coverage_id", "structure_color"] {
            let mut candidate = steel();
            match field {
                "structure_type" => candidate.structure_type.clear(),
                "model_id" => candidate.model_id.clear(),
                "coverage_id" => candidate.coverage_id.clear(),
                "structure_color" => candidate.structure_color.clear(),
                _ => unreachable!(),
            }

            let error = validate_candidate(&ConfigurationCandidate::Steel(candidate))
                .expect_err("blank field should fail");
            assert_eq!(error, ValidationError::MissingField(field), "field {field}");
        }
    }

    #[test]
    fn wood_requires_structure_type_and_surface_references() {
        let mut candidate = wood();
        candidate.structure_type_id = "  ".to_string();
        let error = validate_candidate(&ConfigurationCandidate::Wood(candidate))
            .expect_err("blank structure type should fail");
        assert_eq!(error, ValidationError::MissingField("structure_type_id"));

        let mut candidate = wood();
        candidate.surface_id.clear();
        let error = validate_candidate(&ConfigurationCandidate::Wood(candidate))
            .expect_err("blank surface should fail");
        assert_eq!(error, ValidationError::MissingField("surface_id"));
    }

    #[test]
    fn malformed_email_is_rejected() {
        let mut candidate = wood();
        candidate.customer.email = "not-an-email".to_string();

        let error = validate_candidate(&ConfigurationCandidate::Wood(candidate))
            .expect_err("malformed email should fail");
        assert_eq!(error, ValidationError::MalformedEmail("not-an-email".to_string()));
    }

    #[test]
    fn contact_fields_are_required() {
        let mut candidate = steel();
        candidate.customer.phone.clear();

        let error = validate_candidate(&ConfigurationCandidate::Steel(candidate))
            .expect_err("blank phone should fail");
        assert_eq!(error, ValidationError::MissingField("customer_phone"));
    }
}
