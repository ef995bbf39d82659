pub mod assembler;
pub mod config;
pub mod domain;
pub mod errors;
pub mod pricing;
pub mod session;
pub mod validate;

pub use assembler::{assemble, AssemblyError};
pub use domain::catalog::{CatalogItem, CatalogItemId, CatalogKind, ProductLine};
pub use domain::configuration::{
    ConfigurationCandidate, ConfigurationId, ContactPreference, CustomerContact, Dimensions,
    SteelCandidate, SteelRecord, StoredConfiguration, WoodCandidate, WoodRecord, DEFAULT_STATUS,
};
pub use domain::wizard::{WizardSelection, WizardStep};
pub use errors::{SubmissionError, ValidationError};
pub use pricing::{price_with_breakdown, total_price, PriceBreakdown, PriceComponent, PriceSheet};
pub use session::SessionContext;
pub use validate::validate_candidate;
