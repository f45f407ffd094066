//! Route handlers for the REST API
//!
//! Handlers are organized by concern:
//! - [`check`] - Batch checks, cancellation and manifest parsing
//! - [`view`] - Filtered pages and report exports over supplied records
//! - [`system`] - Health and OpenAPI

use serde::{Deserialize, Serialize};

use crate::types::{BatchId, CheckReport, PackageRecord};
use crate::version::UpgradeAdvice;
use crate::view::{QuickFilter, Summary, ViewQuery};

mod check;
mod system;
mod view;

pub use check::*;
pub use system::*;
pub use view::*;

// ============================================================================
// Request/Response Types (shared across handlers)
// ============================================================================

/// Body of POST /check
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct CheckRequest {
    /// Identifiers as typed; an entry may hold a comma or newline separated list
    pub packages: Vec<String>,
    /// Runtime version of the project, used for upgrade advice
    #[serde(default)]
    pub runtime_version: Option<String>,
    /// Caller's session; a new check replaces only the same session's
    /// check in flight. Without one the check runs on its own.
    #[serde(default)]
    pub session: Option<String>,
}

/// Body of POST /check/cancel
#[derive(Debug, Default, Deserialize, Serialize, utoipa::ToSchema)]
pub struct CancelRequest {
    /// Cancel the check in flight for this session
    #[serde(default)]
    pub session: Option<String>,
    /// Cancel this batch, whichever session started it
    #[serde(default)]
    pub batch_id: Option<BatchId>,
}

/// Response of POST /check
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct CheckResponse {
    /// Reconciled results
    #[serde(flatten)]
    pub report: CheckReport,
    /// Present when `runtime_version` is a known, outdated release
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upgrade: Option<UpgradeAdvice>,
}

/// Body of POST /view
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct ViewRequest {
    /// Records from a previous check
    pub packages: Vec<PackageRecord>,
    /// Filter, sort and page parameters
    #[serde(default)]
    pub query: ViewQuery,
    /// Preset that replaces the architecture and maintenance filters
    #[serde(default)]
    pub quick_filter: Option<QuickFilter>,
}

/// Response of POST /view
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct ViewResponse {
    /// Records on the requested page
    pub items: Vec<PackageRecord>,
    /// Requested page (1-based)
    pub page: usize,
    /// Pages in the filtered view
    pub total_pages: usize,
    /// Records in the filtered view
    pub total_count: usize,
    /// Counts over every supplied record, before filtering
    pub summary: Summary,
}

/// Body of POST /export/csv and POST /export/document
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct ExportRequest {
    /// Records to include in the report
    pub packages: Vec<PackageRecord>,
}
