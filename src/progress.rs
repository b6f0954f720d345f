//! Progress-callback trait for per-stage analysis events.
//!
//! Inject an [`Arc<dyn AnalysisProgressCallback>`] via
//! [`crate::config::AnalyzerConfigBuilder::progress_callback`] to be told when
//! the resume page is rendered and when the model call starts and finishes.
//! The CLI uses it to drive a spinner; a web shell could forward the events
//! to a socket.
//!
//! # Example
//!
//! ```rust
//! use ats_checker::{Action, AnalysisProgressCallback, AnalyzerConfig};
//! use std::sync::Arc;
//!
//! struct Printer;
//!
//! impl AnalysisProgressCallback for Printer {
//!     fn on_dispatch_start(&self, action: Action, model: &str) {
//!         eprintln!("asking {model}: {}", action.label());
//!     }
//! }
//!
//! let config = AnalyzerConfig::builder()
//!     .progress_callback(Arc::new(Printer) as Arc<dyn AnalysisProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use crate::prompts::Action;
use std::sync::Arc;

/// Called by the analyzer as one request moves through the pipeline.
///
/// Implementations must be `Send + Sync`: a shared analyzer may serve several
/// sessions at once. All methods default to no-ops.
pub trait AnalysisProgressCallback: Send + Sync {
    /// Called once per request, before anything else.
    fn on_analysis_start(&self, action: Action) {
        let _ = action;
    }

    /// Called after the first page has been rasterised.
    ///
    /// # Arguments
    /// * `width`, `height`: rendered page size in pixels
    /// * `jpeg_len`: size of the encoded JPEG in bytes
    fn on_page_rendered(&self, width: u32, height: u32, jpeg_len: usize) {
        let _ = (width, height, jpeg_len);
    }

    /// Called just before the model request is sent.
    fn on_dispatch_start(&self, action: Action, model: &str) {
        let _ = (action, model);
    }

    /// Called when the model returned text.
    fn on_analysis_complete(&self, action: Action, text_len: usize) {
        let _ = (action, text_len);
    }

    /// Called when the request failed at any stage.
    fn on_analysis_error(&self, action: Action, error: &str) {
        let _ = (action, error);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl AnalysisProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::AnalyzerConfig`].
pub type ProgressCallback = Arc<dyn AnalysisProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct EventLog {
        events: Mutex<Vec<String>>,
    }

    impl AnalysisProgressCallback for EventLog {
        fn on_analysis_start(&self, action: Action) {
            self.events.lock().unwrap().push(format!("start {action}"));
        }

        fn on_page_rendered(&self, width: u32, height: u32, _jpeg_len: usize) {
            self.events.lock().unwrap().push(format!("page {width}x{height}"));
        }

        fn on_analysis_error(&self, action: Action, error: &str) {
            self.events.lock().unwrap().push(format!("error {action}: {error}"));
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_analysis_start(Action::AboutResume);
        cb.on_page_rendered(100, 200, 4096);
        cb.on_dispatch_start(Action::AboutResume, "gemini-2.5-flash");
        cb.on_analysis_complete(Action::AboutResume, 42);
        cb.on_analysis_error(Action::AboutResume, "boom");
    }

    #[test]
    fn overridden_methods_receive_events() {
        let log = EventLog::default();
        log.on_analysis_start(Action::MissingKeywords);
        log.on_page_rendered(1700, 2200, 1);
        log.on_dispatch_start(Action::MissingKeywords, "m");
        log.on_analysis_error(Action::MissingKeywords, "timeout");

        let events = log.events.lock().unwrap();
        assert_eq!(
            *events,
            vec![
                "start missing-keywords".to_string(),
                "page 1700x2200".to_string(),
                "error missing-keywords: timeout".to_string(),
            ]
        );
    }

    #[test]
    fn arc_dyn_callback_works() {
        let cb: ProgressCallback = Arc::new(NoopProgressCallback);
        cb.on_analysis_complete(Action::PercentageMatch, 512);
    }
}
