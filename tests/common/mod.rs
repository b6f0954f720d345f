//! Shared helpers for the integration tests: a minimal PDF writer and a
//! recording model backend.

#![allow(dead_code)]

use async_trait::async_trait;
use ats_checker::{
    Action, AnalysisProgressCallback, DispatchError, ModelBackend, ModelReply, ModelRequest,
};
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

/// Route library logs to the test harness output; `RUST_LOG` picks the level.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_test_writer()
        .try_init();
}

/// Skip the current test when no pdfium library can be bound.
#[macro_export]
macro_rules! require_pdfium {
    () => {
        if ats_checker::pipeline::render::shared_pdfium(None).is_err() {
            println!("SKIP: pdfium library not found (set PDFIUM_LIB_PATH or copy it into ./)");
            return;
        }
    };
}

/// Build a valid PDF with one US-Letter page per entry of `pages`, each
/// showing its string in 24pt Helvetica.
pub fn pdf_with_pages(pages: &[&str]) -> Vec<u8> {
    let first_page_obj = 4;
    let kids: Vec<String> = (0..pages.len())
        .map(|i| format!("{} 0 R", first_page_obj + 2 * i))
        .collect();

    let mut objects = vec![
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        format!(
            "<< /Type /Pages /Kids [{}] /Count {} >>",
            kids.join(" "),
            pages.len()
        ),
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>".to_string(),
    ];

    for (i, text) in pages.iter().enumerate() {
        let content_obj = first_page_obj + 2 * i + 1;
        objects.push(format!(
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] \
             /Resources << /Font << /F1 3 0 R >> >> /Contents {} 0 R >>",
            content_obj
        ));
        let content = format!("BT /F1 24 Tf 72 700 Td ({}) Tj ET", escape(text));
        objects.push(format!(
            "<< /Length {} >>\nstream\n{}\nendstream",
            content.len(),
            content
        ));
    }

    let mut out = b"%PDF-1.4\n".to_vec();
    let mut offsets = Vec::with_capacity(objects.len());
    for (i, body) in objects.iter().enumerate() {
        offsets.push(out.len());
        out.extend_from_slice(format!("{} 0 obj\n{}\nendobj\n", i + 1, body).as_bytes());
    }

    let xref_at = out.len();
    let mut xref = format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1);
    for off in offsets {
        xref.push_str(&format!("{:010} 00000 n \n", off));
    }
    xref.push_str(&format!(
        "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
        objects.len() + 1,
        xref_at
    ));
    out.extend_from_slice(xref.as_bytes());
    out
}

fn escape(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace('(', "\\(")
        .replace(')', "\\)")
}

/// Backend that records every request and answers with a fixed reply or
/// error.
pub struct Recording {
    pub requests: Mutex<Vec<ModelRequest>>,
    outcome: Result<String, DispatchError>,
}

impl Recording {
    pub fn replying(text: &str) -> Self {
        Self {
            requests: Mutex::new(Vec::new()),
            outcome: Ok(text.to_string()),
        }
    }

    pub fn failing(err: DispatchError) -> Self {
        Self {
            requests: Mutex::new(Vec::new()),
            outcome: Err(err),
        }
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<ModelRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ModelBackend for Recording {
    fn name(&self) -> &str {
        "recording"
    }

    fn model(&self) -> &str {
        "recording-1"
    }

    async fn generate(&self, request: &ModelRequest) -> Result<ModelReply, DispatchError> {
        self.requests.lock().unwrap().push(request.clone());
        self.outcome.clone().map(ModelReply::text)
    }
}

/// Backend that never answers.
pub struct Stalled;

#[async_trait]
impl ModelBackend for Stalled {
    fn name(&self) -> &str {
        "stalled"
    }

    fn model(&self) -> &str {
        "stalled-1"
    }

    async fn generate(&self, _request: &ModelRequest) -> Result<ModelReply, DispatchError> {
        std::future::pending().await
    }
}

/// Progress listener that records each event as a line of text.
#[derive(Default)]
pub struct EventLog {
    events: Mutex<Vec<String>>,
}

impl EventLog {
    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    fn push(&self, event: String) {
        self.events.lock().unwrap().push(event);
    }
}

impl AnalysisProgressCallback for EventLog {
    fn on_analysis_start(&self, action: Action) {
        self.push(format!("start {action}"));
    }

    fn on_page_rendered(&self, width: u32, height: u32, jpeg_len: usize) {
        assert!(width > 0 && height > 0 && jpeg_len > 0);
        self.push("rendered".to_string());
    }

    fn on_dispatch_start(&self, action: Action, model: &str) {
        self.push(format!("dispatch {action} {model}"));
    }

    fn on_analysis_complete(&self, action: Action, text_len: usize) {
        self.push(format!("complete {action} {text_len}"));
    }

    fn on_analysis_error(&self, action: Action, error: &str) {
        self.push(format!("error {action}: {error}"));
    }
}
