//! Pipeline stages from uploaded resume to model reply.
//!
//! Each submodule implements exactly one transformation step, so each can be
//! tested on its own and swapped without touching the others.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ render ──▶ encode ──▶ llm
//! (bytes)   (pdfium)   (JPEG)     (dispatch)
//! ```
//!
//! 1. [`input`] : reject empty uploads and non-PDF bytes before pdfium sees them
//! 2. [`render`]: rasterise page 0 only; runs in `spawn_blocking` because
//!    pdfium is not async-safe
//! 3. [`encode`]: JPEG-encode and base64-wrap the page into an
//!    [`crate::document::ImagePayload`]
//! 4. [`llm`]   : compose the ordered request and make the single remote
//!    call; the only stage with network I/O

pub mod encode;
pub mod input;
pub mod llm;
pub mod render;
