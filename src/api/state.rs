//! Application state for the API server

use crate::{Config, PackageChecker};
use std::sync::Arc;

/// Shared state handed to every route handler
///
/// Cloned per request. All clones drive the same [`PackageChecker`]; checks
/// only supersede each other within one caller session.
#[derive(Clone)]
pub struct AppState {
    /// Checker that runs the batches
    pub checker: PackageChecker,

    /// Configuration (read only)
    pub config: Arc<Config>,
}

impl AppState {
    /// Create a new AppState
    pub fn new(checker: PackageChecker, config: Arc<Config>) -> Self {
        Self { checker, config }
    }
}
