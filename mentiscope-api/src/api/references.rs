//! Scientific reference catalog endpoints

use axum::{extract::Path, routing::get, Json, Router};
use mentiscope_common::references::{
    all_groups, format_citation, group_for, reference_summary, ReferenceGroup, ScientificReference,
};
use serde::Serialize;

use crate::{ApiError, ApiResult, AppState};

#[derive(Debug, Serialize)]
pub struct ReferenceGroupResponse {
    pub key: &'static str,
    pub name: &'static str,
    /// Plain-text overview of the research behind the dimension
    pub summary: String,
    pub references: Vec<ReferenceEntry>,
}

#[derive(Debug, Serialize)]
pub struct ReferenceEntry {
    #[serde(flatten)]
    pub reference: ScientificReference,
    /// APA formatted
    pub citation: String,
}

impl From<&ReferenceGroup> for ReferenceGroupResponse {
    fn from(group: &ReferenceGroup) -> Self {
        Self {
            key: group.key,
            name: group.name,
            summary: reference_summary(group.key),
            references: group
                .references
                .iter()
                .map(|r| ReferenceEntry { reference: *r, citation: format_citation(r) })
                .collect(),
        }
    }
}

/// GET /api/v1/references
pub async fn list_references() -> Json<Vec<ReferenceGroupResponse>> {
    Json(all_groups().iter().map(ReferenceGroupResponse::from).collect())
}

/// GET /api/v1/references/:dimension
pub async fn get_references(Path(dimension): Path<String>) -> ApiResult<Json<ReferenceGroupResponse>> {
    group_for(&dimension)
        .map(|g| Json(ReferenceGroupResponse::from(g)))
        .ok_or_else(|| ApiError::NotFound(format!("No references for dimension '{}'", dimension)))
}

/// Build reference catalog routes
pub fn reference_routes() -> Router<AppState> {
    Router::new()
        .route("/references", get(list_references))
        .route("/references/:dimension", get(get_references))
}
