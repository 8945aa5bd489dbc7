//! HTTP API handlers for mentiscope-api

pub mod action_plans;
pub mod assessments;
pub mod health;
pub mod payments;
pub mod references;
pub mod students;
pub mod support;

pub use action_plans::action_plan_routes;
pub use assessments::assessment_routes;
pub use health::health_routes;
pub use payments::payment_routes;
pub use references::reference_routes;
pub use students::student_routes;
pub use support::support_routes;

use uuid::Uuid;

/// Parse an id from a path or body, reporting `what` as not found when malformed
///
/// A string that is not a UUID can never match a stored row.
pub(crate) fn lookup_id(raw: &str, what: &str) -> crate::ApiResult<Uuid> {
    Uuid::parse_str(raw.trim()).map_err(|_| crate::ApiError::NotFound(format!("{} not found", what)))
}
