//! The configuration submission pipeline and its HTTP entry points.
//!
//! One authoritative path turns an assembled candidate into a persisted row
//! and a best-effort notification: validate → branch by product line →
//! persist → notify. Validation and persistence are the only fatal states;
//! color resolution and notification degrade without failing the
//! submission.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::post,
    Router,
};
use chrono::Utc;
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use portico_core::assembler::{assemble, AssemblyError};
use portico_core::domain::catalog::{CatalogItemId, CatalogKind, ProductLine};
use portico_core::domain::configuration::{
    ConfigurationCandidate, ConfigurationId, StoredConfiguration,
};
use portico_core::domain::wizard::WizardSelection;
use portico_core::errors::SubmissionError;
use portico_core::pricing::PriceSheet;
use portico_core::validate::validate_candidate;
use portico_db::repositories::{CatalogRepository, ConfigurationRepository};
use portico_mailer::{ConfigurationView, NotificationStatus, SubmissionNotifier, PLACEHOLDER};

/// One bounded retry keeps a transient backend hiccup from losing a lead
/// without risking an unbounded loop.
const INSERT_TIMEOUT: Duration = Duration::from_secs(10);
const INSERT_ATTEMPTS: u32 = 2;

pub struct SubmissionService {
    catalog: Arc<dyn CatalogRepository>,
    configurations: Arc<dyn ConfigurationRepository>,
    notifier: Arc<dyn SubmissionNotifier>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubmissionReceipt {
    pub id: ConfigurationId,
    pub email_sent: bool,
}

/// Failures of the selection-based entry point: either the wizard state was
/// incomplete, or the assembled candidate failed the pipeline proper.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SelectionError {
    #[error(transparent)]
    Assembly(#[from] AssemblyError),
    #[error(transparent)]
    Submission(#[from] SubmissionError),
}

impl SelectionError {
    pub fn user_message(&self) -> String {
        match self {
            Self::Assembly(error) => error.to_string(),
            Self::Submission(error) => error.user_message(),
        }
    }
}

impl SubmissionService {
    pub fn new(
        catalog: Arc<dyn CatalogRepository>,
        configurations: Arc<dyn ConfigurationRepository>,
        notifier: Arc<dyn SubmissionNotifier>,
    ) -> Self {
        Self { catalog, configurations, notifier }
    }

    /// The `submitConfiguration` contract: candidate in, persisted id or
    /// typed error out. The `email_sent` flag is auxiliary UI feedback and
    /// never influences the outcome.
    pub async fn submit(
        &self,
        candidate: ConfigurationCandidate,
    ) -> Result<SubmissionReceipt, SubmissionError> {
        let product_line = candidate.product_line();

        validate_candidate(&candidate)?;

        let record = self.branch(candidate).await;
        let id = self.persist(&record).await?;

        let status = self.notify(&id, &record).await;
        info!(
            event_name = "submission.completed",
            configuration_id = %id.0,
            product_line = %product_line,
            email_sent = status.all_sent(),
            "configuration submission persisted"
        );

        Ok(SubmissionReceipt { id, email_sent: status.all_sent() })
    }

    /// Selection-based entry point: resolve the price sheet, assemble, then
    /// run the same pipeline.
    pub async fn submit_selection(
        &self,
        selection: WizardSelection,
    ) -> Result<SubmissionReceipt, SelectionError> {
        let sheet = self.price_sheet_for(&selection).await;
        let candidate = assemble(&selection, &sheet)?;
        Ok(self.submit(candidate).await?)
    }

    async fn branch(&self, candidate: ConfigurationCandidate) -> StoredConfiguration {
        match candidate {
            ConfigurationCandidate::Wood(wood) => {
                // Wood color ids are taken verbatim; no name resolution, by
                // design asymmetry with the steel flow.
                StoredConfiguration::Wood(wood.into())
            }
            ConfigurationCandidate::Steel(steel) => {
                let color_id = self.resolve_steel_color(&steel.structure_color).await;
                StoredConfiguration::Steel(steel.into_record(color_id))
            }
        }
    }

    /// A well-formed UUID passes through untouched without a catalog query.
    /// Anything else is matched case-insensitively against steel color
    /// names; no match (or a lookup error) degrades to a null reference
    /// rather than failing the sale.
    async fn resolve_steel_color(&self, raw: &str) -> Option<String> {
        let trimmed = raw.trim();
        if Uuid::parse_str(trimmed).is_ok() {
            return Some(trimmed.to_string());
        }

        match self.catalog.find_color_by_name(ProductLine::Steel, trimmed).await {
            Ok(Some(color)) => Some(color.id.0),
            Ok(None) => {
                warn!(
                    event_name = "submission.color.unresolved",
                    structure_color = %trimmed,
                    "no steel color matches; persisting a null color reference"
                );
                None
            }
            Err(error) => {
                warn!(
                    event_name = "submission.color.lookup_failed",
                    structure_color = %trimmed,
                    error = %error,
                    "steel color lookup failed; persisting a null color reference"
                );
                None
            }
        }
    }

    async fn persist(
        &self,
        record: &StoredConfiguration,
    ) -> Result<ConfigurationId, SubmissionError> {
        let mut last_error = String::new();

        for attempt in 1..=INSERT_ATTEMPTS {
            match tokio::time::timeout(INSERT_TIMEOUT, self.configurations.insert(record)).await {
                Ok(Ok(id)) => return Ok(id),
                Ok(Err(error)) => {
                    warn!(
                        event_name = "submission.persist.failed",
                        attempt,
                        error = %error,
                        "configuration insert failed"
                    );
                    last_error = error.to_string();
                }
                Err(_) => {
                    warn!(
                        event_name = "submission.persist.timeout",
                        attempt,
                        timeout_secs = INSERT_TIMEOUT.as_secs(),
                        "configuration insert timed out"
                    );
                    last_error =
                        format!("insert timed out after {}s", INSERT_TIMEOUT.as_secs());
                }
            }
        }

        Err(SubmissionError::Persistence(last_error))
    }

    async fn notify(
        &self,
        id: &ConfigurationId,
        record: &StoredConfiguration,
    ) -> NotificationStatus {
        let view = self.build_view(id, record).await;
        self.notifier.notify_submission(&view).await
    }

    /// Denormalize the saved record for the email templates. The name
    /// lookups run in parallel and every individual failure degrades to the
    /// `"N/A"` placeholder.
    async fn build_view(
        &self,
        id: &ConfigurationId,
        record: &StoredConfiguration,
    ) -> ConfigurationView {
        let submitted_at = Utc::now().to_rfc3339();

        match record {
            StoredConfiguration::Steel(steel) => {
                let (model, coverage, color, surface) = tokio::join!(
                    self.display_name(ProductLine::Steel, CatalogKind::Model, Some(&steel.model_id)),
                    self.display_name(
                        ProductLine::Steel,
                        CatalogKind::Coverage,
                        Some(&steel.coverage_id)
                    ),
                    self.display_name(
                        ProductLine::Steel,
                        CatalogKind::Color,
                        steel.structure_color_id.as_deref()
                    ),
                    self.display_name(
                        ProductLine::Steel,
                        CatalogKind::Surface,
                        steel.surface_id.as_deref()
                    ),
                );

                ConfigurationView {
                    configuration_id: id.0.clone(),
                    product_line: ProductLine::Steel.as_str().to_string(),
                    structure_type: steel.structure_type.clone(),
                    model,
                    coverage,
                    color,
                    surface,
                    package: steel
                        .package_type
                        .clone()
                        .unwrap_or_else(|| PLACEHOLDER.to_string()),
                    width_cm: steel.dimensions.width_cm,
                    depth_cm: steel.dimensions.depth_cm,
                    height_cm: steel.dimensions.height_cm,
                    area_m2: steel.dimensions.area_m2(),
                    total_price: steel.total_price,
                    customer_name: steel.customer.name.clone(),
                    customer_email: steel.customer.email.clone(),
                    customer_phone: steel.customer.phone.clone(),
                    customer_address: steel.customer.address.clone(),
                    customer_city: steel.customer.city.clone(),
                    customer_postal_code: steel.customer.postal_code.clone(),
                    contact_preference: steel.contact_preference.as_str().to_string(),
                    notes: steel.notes.clone(),
                    submitted_at,
                }
            }
            StoredConfiguration::Wood(wood) => {
                let (structure_type, model, coverage, color, surface, package) = tokio::join!(
                    self.display_name(
                        ProductLine::Wood,
                        CatalogKind::StructureType,
                        Some(&wood.structure_type_id)
                    ),
                    self.display_name(ProductLine::Wood, CatalogKind::Model, Some(&wood.model_id)),
                    self.display_name(
                        ProductLine::Wood,
                        CatalogKind::Coverage,
                        Some(&wood.coverage_id)
                    ),
                    self.display_name(ProductLine::Wood, CatalogKind::Color, Some(&wood.color_id)),
                    self.display_name(
                        ProductLine::Wood,
                        CatalogKind::Surface,
                        Some(&wood.surface_id)
                    ),
                    self.display_name(
                        ProductLine::Wood,
                        CatalogKind::Package,
                        wood.package_id.as_deref()
                    ),
                );

                ConfigurationView {
                    configuration_id: id.0.clone(),
                    product_line: ProductLine::Wood.as_str().to_string(),
                    structure_type,
                    model,
                    coverage,
                    color,
                    surface,
                    package,
                    width_cm: wood.dimensions.width_cm,
                    depth_cm: wood.dimensions.depth_cm,
                    height_cm: wood.dimensions.height_cm,
                    area_m2: wood.dimensions.area_m2(),
                    total_price: wood.total_price,
                    customer_name: wood.customer.name.clone(),
                    customer_email: wood.customer.email.clone(),
                    customer_phone: wood.customer.phone.clone(),
                    customer_address: wood.customer.address.clone(),
                    customer_city: wood.customer.city.clone(),
                    customer_postal_code: wood.customer.postal_code.clone(),
                    contact_preference: wood.contact_preference.as_str().to_string(),
                    notes: wood.notes.clone(),
                    submitted_at,
                }
            }
        }
    }

    async fn display_name(
        &self,
        product_line: ProductLine,
        kind: CatalogKind,
        id: Option<&str>,
    ) -> String {
        let Some(id) = id else {
            return PLACEHOLDER.to_string();
        };

        match self.catalog.find_by_id(product_line, kind, &CatalogItemId(id.to_string())).await {
            Ok(Some(item)) => item.name,
            Ok(None) => PLACEHOLDER.to_string(),
            Err(error) => {
                warn!(
                    event_name = "submission.view.lookup_failed",
                    kind = kind.as_str(),
                    id = %id,
                    error = %error,
                    "name resolution failed; using placeholder"
                );
                PLACEHOLDER.to_string()
            }
        }
    }

    /// Resolve the selected entities' price modifiers. A missing or unknown
    /// selection contributes zero; the assembler decides separately whether
    /// the step was allowed to be absent.
    async fn price_sheet_for(&self, selection: &WizardSelection) -> PriceSheet {
        let Some(product_line) = selection.product_line else {
            return PriceSheet::default();
        };

        let structure_color_modifier = match product_line {
            ProductLine::Wood => {
                self.modifier_for(product_line, CatalogKind::Color, selection.color.as_deref())
                    .await
            }
            ProductLine::Steel => self.steel_color_modifier(selection.color.as_deref()).await,
        };

        let coverage_color_modifier = match product_line {
            ProductLine::Steel => {
                self.modifier_for(
                    product_line,
                    CatalogKind::Color,
                    selection.coverage_color_id.as_deref(),
                )
                .await
            }
            ProductLine::Wood => Decimal::ZERO,
        };

        PriceSheet {
            model_base: self
                .modifier_for(product_line, CatalogKind::Model, selection.model_id.as_deref())
                .await,
            coverage_modifier: self
                .modifier_for(product_line, CatalogKind::Coverage, selection.coverage_id.as_deref())
                .await,
            structure_color_modifier,
            coverage_color_modifier,
            surface_price_per_m2: self
                .modifier_for(product_line, CatalogKind::Surface, selection.surface_id.as_deref())
                .await,
            package_modifier: self
                .modifier_for(product_line, CatalogKind::Package, selection.package.as_deref())
                .await,
        }
    }

    async fn steel_color_modifier(&self, color: Option<&str>) -> Decimal {
        let Some(color) = color.map(str::trim).filter(|value| !value.is_empty()) else {
            return Decimal::ZERO;
        };

        if Uuid::parse_str(color).is_ok() {
            return self
                .modifier_for(ProductLine::Steel, CatalogKind::Color, Some(color))
                .await;
        }

        match self.catalog.find_color_by_name(ProductLine::Steel, color).await {
            Ok(Some(item)) => item.price_modifier,
            Ok(None) => Decimal::ZERO,
            Err(error) => {
                warn!(
                    event_name = "submission.price.color_lookup_failed",
                    color = %color,
                    error = %error,
                    "steel color price lookup failed; contributing zero"
                );
                Decimal::ZERO
            }
        }
    }

    async fn modifier_for(
        &self,
        product_line: ProductLine,
        kind: CatalogKind,
        id: Option<&str>,
    ) -> Decimal {
        let Some(id) = id.map(str::trim).filter(|value| !value.is_empty()) else {
            return Decimal::ZERO;
        };

        match self.catalog.find_by_id(product_line, kind, &CatalogItemId(id.to_string())).await {
            Ok(Some(item)) => item.price_modifier,
            Ok(None) => Decimal::ZERO,
            Err(error) => {
                warn!(
                    event_name = "submission.price.lookup_failed",
                    kind = kind.as_str(),
                    id = %id,
                    error = %error,
                    "price modifier lookup failed; contributing zero"
                );
                Decimal::ZERO
            }
        }
    }
}

#[derive(Clone)]
pub struct SubmissionState {
    pub service: Arc<SubmissionService>,
}

#[derive(Debug, Serialize)]
struct SubmitSuccess {
    success: bool,
    id: String,
    email_sent: bool,
}

#[derive(Debug, Serialize)]
struct SubmitFailure {
    success: bool,
    error: String,
}

pub fn router(state: SubmissionState) -> Router {
    Router::new()
        .route("/api/configurations", post(submit_configuration))
        .route("/api/wizard/submissions", post(submit_wizard_selection))
        .with_state(state)
}

async fn submit_configuration(
    State(state): State<SubmissionState>,
    Json(candidate): Json<ConfigurationCandidate>,
) -> Response {
    match state.service.submit(candidate).await {
        Ok(receipt) => (
            StatusCode::OK,
            Json(SubmitSuccess { success: true, id: receipt.id.0, email_sent: receipt.email_sent }),
        )
            .into_response(),
        Err(error) => {
            let status = match &error {
                SubmissionError::Validation(_) => StatusCode::BAD_REQUEST,
                SubmissionError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
            };
            (status, Json(SubmitFailure { success: false, error: error.user_message() }))
                .into_response()
        }
    }
}

async fn submit_wizard_selection(
    State(state): State<SubmissionState>,
    Json(selection): Json<WizardSelection>,
) -> Response {
    match state.service.submit_selection(selection).await {
        Ok(receipt) => (
            StatusCode::OK,
            Json(SubmitSuccess { success: true, id: receipt.id.0, email_sent: receipt.email_sent }),
        )
            .into_response(),
        Err(error) => {
            let status = match &error {
                SelectionError::Assembly(_)
                | SelectionError::Submission(SubmissionError::Validation(_)) => {
                    StatusCode::BAD_REQUEST
                }
                SelectionError::Submission(SubmissionError::Persistence(_)) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            };
            (status, Json(SubmitFailure { success: false, error: error.user_message() }))
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use rust_decimal::Decimal;
    use tokio::sync::Mutex;

    use portico_core::assembler::AssemblyError;
    use portico_core::domain::catalog::{CatalogItem, CatalogItemId, CatalogKind, ProductLine};
    use portico_core::domain::configuration::{
        ConfigurationCandidate, ContactPreference, CustomerContact, Dimensions, SteelCandidate,
        StoredConfiguration, WoodCandidate,
    };
    use portico_core::domain::wizard::{WizardSelection, WizardStep};
    use portico_core::errors::{SubmissionError, ValidationError};
    use portico_db::repositories::{
        ConfigurationRepository, InMemoryCatalogRepository, InMemoryConfigurationRepository,
    };
    use portico_mailer::{
        ConfigurationView, MailError, MailTransport, MessageId, NotificationDispatcher,
        NotificationStatus, OutboundEmail, SubmissionNotifier,
    };

    use super::{SelectionError, SubmissionService};

    struct RecordingNotifier {
        views: Mutex<Vec<ConfigurationView>>,
        status: NotificationStatus,
    }

    impl RecordingNotifier {
        fn delivering() -> Self {
            Self {
                views: Mutex::new(Vec::new()),
                status: NotificationStatus { customer_sent: true, admin_sent: true },
            }
        }
    }

    #[async_trait]
    impl SubmissionNotifier for RecordingNotifier {
        async fn notify_submission(&self, view: &ConfigurationView) -> NotificationStatus {
            self.views.lock().await.push(view.clone());
            self.status
        }
    }

    struct UnreachableTransport;

    #[async_trait]
    impl MailTransport for UnreachableTransport {
        async fn send(&self, _email: &OutboundEmail) -> Result<MessageId, MailError> {
            Err(MailError::Smtp("connection refused".to_string()))
        }
    }

    struct Harness {
        catalog: Arc<InMemoryCatalogRepository>,
        configurations: Arc<InMemoryConfigurationRepository>,
        notifier: Arc<RecordingNotifier>,
        service: SubmissionService,
    }

    fn harness() -> Harness {
        let catalog = Arc::new(InMemoryCatalogRepository::default());
        let configurations = Arc::new(InMemoryConfigurationRepository::default());
        let notifier = Arc::new(RecordingNotifier::delivering());
        let service = SubmissionService::new(
            catalog.clone(),
            configurations.clone(),
            notifier.clone(),
        );
        Harness { catalog, configurations, notifier, service }
    }

    fn catalog_item(id: &str, name: &str, price: i64) -> CatalogItem {
        CatalogItem {
            id: CatalogItemId(id.to_string()),
            name: name.to_string(),
            description: None,
            image_url: None,
            price_modifier: Decimal::from(price),
            active: true,
            display_order: None,
        }
    }

    fn contact() -> CustomerContact {
        CustomerContact {
            name: "Rosa Mair".to_string(),
            email: "rosa@example.com".to_string(),
            phone: "+39 331 2223334".to_string(),
            address: "Via Cavour 5".to_string(),
            city: "Bolzano".to_string(),
            postal_code: "39100".to_string(),
            province: Some("BZ".to_string()),
        }
    }

    fn dims() -> Dimensions {
        Dimensions {
            width_cm: Decimal::from(300),
            depth_cm: Decimal::from(500),
            height_cm: Decimal::from(240),
        }
    }

    fn steel_candidate(structure_color: &str) -> ConfigurationCandidate {
        ConfigurationCandidate::Steel(SteelCandidate {
            structure_type: "freestanding carport".to_string(),
            model_id: "steel-model-001".to_string(),
            coverage_id: "steel-coverage-001".to_string(),
            structure_color: structure_color.to_string(),
            surface_id: None,
            package_type: None,
            dimensions: dims(),
            customer: contact(),
            contact_preference: ContactPreference::Email,
            total_price: Decimal::from(4_500),
            notes: None,
        })
    }

    fn wood_candidate() -> ConfigurationCandidate {
        ConfigurationCandidate::Wood(WoodCandidate {
            structure_type_id: "wood-structure-001".to_string(),
            model_id: "wood-model-001".to_string(),
            coverage_id: "wood-coverage-001".to_string(),
            color_id: "wood-color-001".to_string(),
            surface_id: "wood-surface-001".to_string(),
            package_id: None,
            dimensions: dims(),
            customer: CustomerContact { province: None, ..contact() },
            contact_preference: ContactPreference::Phone,
            total_price: Decimal::from(6_000),
            notes: None,
        })
    }

    #[tokio::test]
    async fn missing_reference_field_fails_with_zero_writes() {
        let harness = harness();
        let mut candidate = wood_candidate();
        if let ConfigurationCandidate::Wood(wood) = &mut candidate {
            wood.model_id.clear();
        }

        let error = harness.service.submit(candidate).await.expect_err("missing model");

        assert_eq!(
            error,
            SubmissionError::Validation(ValidationError::MissingField("model_id"))
        );
        assert_eq!(harness.configurations.row_count().await, 0);
        assert!(harness.notifier.views.lock().await.is_empty());
    }

    #[tokio::test]
    async fn malformed_email_is_rejected_before_any_backend_call() {
        let harness = harness();
        let mut candidate = steel_candidate("anthracite");
        if let ConfigurationCandidate::Steel(steel) = &mut candidate {
            steel.customer.email = "not-an-email".to_string();
        }

        let error = harness.service.submit(candidate).await.expect_err("bad email");

        assert!(matches!(
            error,
            SubmissionError::Validation(ValidationError::MalformedEmail(_))
        ));
        assert_eq!(harness.configurations.row_count().await, 0);
        assert_eq!(harness.catalog.color_lookup_count(), 0);
    }

    #[tokio::test]
    async fn uuid_structure_color_persists_unchanged_without_catalog_query() {
        let harness = harness();
        let uuid = "f47ac10b-58cc-4372-a567-0e02b2c3d479";

        let receipt =
            harness.service.submit(steel_candidate(uuid)).await.expect("submission succeeds");

        let row = harness
            .configurations
            .find_by_id(ProductLine::Steel, &receipt.id)
            .await
            .expect("find")
            .expect("row exists");
        match row.record {
            StoredConfiguration::Steel(steel) => {
                assert_eq!(steel.structure_color_id.as_deref(), Some(uuid));
            }
            StoredConfiguration::Wood(_) => panic!("expected a steel record"),
        }
        assert_eq!(harness.catalog.color_lookup_count(), 0, "no catalog query for UUID colors");
    }

    #[tokio::test]
    async fn unresolved_color_name_degrades_to_null_and_still_succeeds() {
        let harness = harness();

        let receipt = harness
            .service
            .submit(steel_candidate("sunset orange"))
            .await
            .expect("unresolved color must not fail the sale");

        let row = harness
            .configurations
            .find_by_id(ProductLine::Steel, &receipt.id)
            .await
            .expect("find")
            .expect("row exists");
        match row.record {
            StoredConfiguration::Steel(steel) => assert_eq!(steel.structure_color_id, None),
            StoredConfiguration::Wood(_) => panic!("expected a steel record"),
        }
        assert_eq!(harness.catalog.color_lookup_count(), 1);
    }

    #[tokio::test]
    async fn color_name_resolves_case_insensitively_and_partially() {
        let harness = harness();
        harness
            .catalog
            .put(
                ProductLine::Steel,
                CatalogKind::Color,
                catalog_item("steel-color-003", "Moss Green RAL 6005", 160),
            )
            .await;

        let receipt =
            harness.service.submit(steel_candidate("moss green")).await.expect("submit");

        let row = harness
            .configurations
            .find_by_id(ProductLine::Steel, &receipt.id)
            .await
            .expect("find")
            .expect("row exists");
        match row.record {
            StoredConfiguration::Steel(steel) => {
                assert_eq!(steel.structure_color_id.as_deref(), Some("steel-color-003"));
            }
            StoredConfiguration::Wood(_) => panic!("expected a steel record"),
        }
    }

    #[tokio::test]
    async fn wood_color_id_is_used_verbatim() {
        let harness = harness();

        let receipt = harness.service.submit(wood_candidate()).await.expect("submit");

        let row = harness
            .configurations
            .find_by_id(ProductLine::Wood, &receipt.id)
            .await
            .expect("find")
            .expect("row exists");
        match row.record {
            StoredConfiguration::Wood(wood) => assert_eq!(wood.color_id, "wood-color-001"),
            StoredConfiguration::Steel(_) => panic!("expected a wood record"),
        }
        assert_eq!(harness.catalog.color_lookup_count(), 0);
    }

    #[tokio::test]
    async fn unreachable_mail_transport_does_not_fail_the_submission() {
        let catalog = Arc::new(InMemoryCatalogRepository::default());
        let configurations = Arc::new(InMemoryConfigurationRepository::default());
        let dispatcher = NotificationDispatcher::new(
            Arc::new(UnreachableTransport),
            "noreply@portico.example",
            "sales@portico.example",
        )
        .expect("dispatcher");
        let service =
            SubmissionService::new(catalog, configurations.clone(), Arc::new(dispatcher));

        let receipt = service
            .submit(wood_candidate())
            .await
            .expect("persisted submissions succeed even when mail is down");

        assert!(!receipt.email_sent);
        assert_eq!(configurations.row_count().await, 1);
    }

    #[tokio::test]
    async fn identical_candidates_produce_two_distinct_rows() {
        let harness = harness();

        let first = harness.service.submit(wood_candidate()).await.expect("first");
        let second = harness.service.submit(wood_candidate()).await.expect("second");

        assert_ne!(first.id, second.id);
        assert_eq!(harness.configurations.row_count().await, 2);
    }

    #[tokio::test]
    async fn transient_insert_failure_is_retried_once() {
        let harness = harness();
        harness.configurations.fail_with("database is locked", 1).await;

        let receipt = harness.service.submit(wood_candidate()).await.expect("retry succeeds");

        assert_eq!(harness.configurations.row_count().await, 1);
        assert!(!receipt.id.0.is_empty());
    }

    #[tokio::test]
    async fn persistent_insert_failure_surfaces_as_persistence_error() {
        let harness = harness();
        harness.configurations.fail_with("database is locked", 2).await;

        let error = harness.service.submit(wood_candidate()).await.expect_err("both attempts fail");

        assert!(matches!(error, SubmissionError::Persistence(_)));
        assert_eq!(harness.configurations.row_count().await, 0);
        assert!(
            harness.notifier.views.lock().await.is_empty(),
            "nothing proceeds to notification after a failed write"
        );
    }

    #[tokio::test]
    async fn notification_view_resolves_names_and_degrades_to_placeholder() {
        let harness = harness();
        harness
            .catalog
            .put(ProductLine::Wood, CatalogKind::Model, catalog_item("wood-model-001", "Tavola", 5150))
            .await;
        harness
            .catalog
            .put(
                ProductLine::Wood,
                CatalogKind::Surface,
                catalog_item("wood-surface-001", "Wood decking", 45),
            )
            .await;

        harness.service.submit(wood_candidate()).await.expect("submit");

        let views = harness.notifier.views.lock().await;
        assert_eq!(views.len(), 1);
        assert_eq!(views[0].model, "Tavola");
        assert_eq!(views[0].surface, "Wood decking");
        // Unseeded references fall back to the placeholder instead of
        // aborting the notification.
        assert_eq!(views[0].coverage, "N/A");
        assert_eq!(views[0].structure_type, "N/A");
    }

    #[tokio::test]
    async fn selection_submission_prices_and_persists_in_one_pass() {
        let harness = harness();
        harness
            .catalog
            .put(ProductLine::Wood, CatalogKind::Model, catalog_item("wood-model-001", "Tavola", 5000))
            .await;
        harness
            .catalog
            .put(
                ProductLine::Wood,
                CatalogKind::Surface,
                catalog_item("wood-surface-001", "Wood decking", 45),
            )
            .await;

        let selection = WizardSelection {
            product_line: Some(ProductLine::Wood),
            structure_type: Some("wood-structure-001".to_string()),
            model_id: Some("wood-model-001".to_string()),
            dimensions: Some(dims()),
            coverage_id: Some("wood-coverage-001".to_string()),
            color: Some("wood-color-001".to_string()),
            coverage_color_id: None,
            surface_id: Some("wood-surface-001".to_string()),
            package: None,
            customer: Some(CustomerContact { province: None, ..contact() }),
            contact_preference: Some(ContactPreference::Email),
            notes: None,
        };

        let receipt = harness.service.submit_selection(selection).await.expect("submit");

        let row = harness
            .configurations
            .find_by_id(ProductLine::Wood, &receipt.id)
            .await
            .expect("find")
            .expect("row exists");
        match row.record {
            StoredConfiguration::Wood(wood) => {
                // 5000 model base + 45 €/m² × 15 m² = 5675.
                assert_eq!(wood.total_price, Decimal::from(5_675));
            }
            StoredConfiguration::Steel(_) => panic!("expected a wood record"),
        }
    }

    #[tokio::test]
    async fn incomplete_selection_fails_assembly_before_the_pipeline() {
        let harness = harness();
        let selection = WizardSelection {
            product_line: Some(ProductLine::Wood),
            ..WizardSelection::default()
        };

        let error =
            harness.service.submit_selection(selection).await.expect_err("incomplete selection");

        assert_eq!(
            error,
            SelectionError::Assembly(AssemblyError::MissingStep(WizardStep::StructureType))
        );
        assert_eq!(harness.configurations.row_count().await, 0);
    }
}
