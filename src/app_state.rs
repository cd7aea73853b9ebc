// =============================================================================
// Application State - shared by every HTTP handler via `Arc<AppState>`
// =============================================================================
//
// Read-only after startup: the provider source, the scanner built on top of
// it, and the static file directory. Requests share nothing mutable.
// =============================================================================

use std::path::PathBuf;
use std::sync::Arc;

use crate::provider::IndicatorSource;
use crate::scanner::Scanner;

pub struct AppState {
    /// Provider used by the single-symbol passthrough endpoints.
    pub source: Arc<dyn IndicatorSource>,
    pub scanner: Scanner,
    /// Directory served for every path outside `/api`.
    pub public_dir: PathBuf,
    pub start_time: std::time::Instant,
}

impl AppState {
    pub fn new(source: Arc<dyn IndicatorSource>, public_dir: impl Into<PathBuf>) -> Self {
        Self {
            scanner: Scanner::new(source.clone()),
            source,
            public_dir: public_dir.into(),
            start_time: std::time::Instant::now(),
        }
    }
}
