//! Model dispatch: compose the ordered request and make the remote call.
//!
//! ## Message Layout
//!
//! Every request has exactly three parts, in this order:
//! 1. **Text**: the job description, verbatim
//! 2. **Image**: the resume's first page as a JPEG
//! 3. **Text**: the instruction template of the selected action
//!
//! One call per action. No retry: a failure goes straight back to the user,
//! who decides whether to press the button again.

use crate::backend::{ModelBackend, ModelReply, ModelRequest, Part};
use crate::document::ImagePayload;
use crate::error::DispatchError;
use std::time::Instant;
use tokio::time::{timeout, Duration};
use tracing::{debug, warn};

/// Build the three-part request.
pub fn build_request(
    job_description: &str,
    image: ImagePayload,
    instruction: &str,
) -> ModelRequest {
    ModelRequest {
        parts: vec![
            Part::Text(job_description.to_string()),
            Part::Image(image),
            Part::Text(instruction.to_string()),
        ],
    }
}

/// Send one request through `backend`, bounded by `timeout_secs`.
pub async fn dispatch(
    backend: &dyn ModelBackend,
    job_description: &str,
    image: ImagePayload,
    instruction: &str,
    timeout_secs: u64,
) -> Result<ModelReply, DispatchError> {
    let request = build_request(job_description, image, instruction);
    let start = Instant::now();

    let result = match timeout(Duration::from_secs(timeout_secs), backend.generate(&request)).await {
        Ok(result) => result,
        Err(_) => Err(DispatchError::Timeout { secs: timeout_secs }),
    };

    match &result {
        Ok(reply) => debug!(
            "{} ({}): {} chars in {:?}",
            backend.name(),
            backend.model(),
            reply.text.len(),
            start.elapsed()
        ),
        Err(e) => warn!("{} ({}): dispatch failed: {}", backend.name(), backend.model(), e),
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct Echo;

    #[async_trait]
    impl ModelBackend for Echo {
        fn name(&self) -> &str {
            "echo"
        }

        fn model(&self) -> &str {
            "echo-1"
        }

        async fn generate(&self, request: &ModelRequest) -> Result<ModelReply, DispatchError> {
            let texts: Vec<&str> = request.parts.iter().filter_map(Part::as_text).collect();
            Ok(ModelReply::text(texts.join("|")))
        }
    }

    struct Stalled;

    #[async_trait]
    impl ModelBackend for Stalled {
        fn name(&self) -> &str {
            "stalled"
        }

        fn model(&self) -> &str {
            "never"
        }

        async fn generate(&self, _request: &ModelRequest) -> Result<ModelReply, DispatchError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(ModelReply::text("too late"))
        }
    }

    fn image() -> ImagePayload {
        ImagePayload::from_jpeg(&[0xFF, 0xD8, 0xFF, 0xD9])
    }

    #[test]
    fn request_order() {
        let req = build_request("JD", image(), "INSTR");
        assert_eq!(req.parts.len(), 3);
        assert_eq!(req.parts[0], Part::Text("JD".into()));
        assert_eq!(req.parts[1], Part::Image(image()));
        assert_eq!(req.parts[2], Part::Text("INSTR".into()));
    }

    #[test]
    fn empty_job_description_is_still_sent() {
        let req = build_request("", image(), "INSTR");
        assert_eq!(req.parts[0].as_text(), Some(""));
    }

    #[tokio::test]
    async fn dispatch_returns_backend_text() {
        let reply = dispatch(&Echo, "JD", image(), "INSTR", 5).await.unwrap();
        assert_eq!(reply.text, "JD|INSTR");
    }

    #[tokio::test(start_paused = true)]
    async fn dispatch_times_out() {
        let err = dispatch(&Stalled, "JD", image(), "INSTR", 2).await.unwrap_err();
        assert!(matches!(err, DispatchError::Timeout { secs: 2 }));
    }
}
