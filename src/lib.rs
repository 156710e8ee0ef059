//! # Receipt Press
//!
//! Adaptive compression for receipt photos attached to a reimbursement form.
//! A phone camera hands over anything from a 300 KB screenshot to a 90 MB
//! scan; the form wants something small enough to upload quickly that is
//! still legible. This crate decides how hard to squeeze each image and does
//! the squeezing.
//!
//! # Architecture: One Call, Five Stages
//!
//! ```text
//! RawImage ─► Validation Gate ─► Option Selector ─► Executor ─► CompressionReport
//!                                      ▲               │
//!                          Capability Classifier     Codec (1 or 2 passes)
//! ```
//!
//! The caller only sees [`compress::Compressor::compress`]. Rejected input is
//! the only error; a failure after validation hands the original image back
//! with a zero-reduction result and a user-facing notice, so there is always
//! something to attach.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`validation`] | Allow-list and size ceiling, plus large-file and legacy-format advisories |
//! | [`capability`] | Classifies the device as low / medium / high from core count and memory |
//! | [`plan`] | Size tier table then capability adjustment → [`plan::CompressionPlan`] |
//! | [`imaging`] | Decode (primary + alternate path), fit, redraw on white, encode |
//! | [`compress`] | Executor state machine: single pass or staged, fallback to original |
//! | [`progress`] | Ordered phase percentages sent over an optional channel |
//! | [`attachment`] | Ticketed slot that discards results of superseded selections |
//! | [`metrics`] | Rolling per-path duration statistics |
//! | [`config`] | Policy table: TOML overlay on stock defaults, validated on load |
//! | [`types`] | [`types::RawImage`] and size helpers |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Policy As Data
//!
//! Every threshold, preset and delta lives in [`config::PolicyConfig`]. The
//! selector walks a tier table instead of branching on constants, so tuning
//! the policy never touches the state machine and tests can swap tables.
//!
//! ## Staged Compression
//!
//! Inputs of 50 MB and up are first shrunk with a fixed coarse preset. The
//! second pass works on the much smaller stage-one output: with the plan's own
//! values when stage one already landed under 5 MB, with an aggressive preset
//! otherwise. Low-capability devices skip staging above the memory-risk size
//! to avoid a second large allocation.
//!
//! ## Scoped Surfaces
//!
//! The rendering buffer is an RAII [`imaging::Surface`]. Dropping it shrinks
//! the canvas to nothing and decrements a live counter, so every exit path of
//! a pass releases it and tests can assert that nothing leaked.
//!
//! ## Pure-Rust Imaging
//!
//! Decoding and encoding use the `image` crate only. Formats are detected
//! from the content, so a mislabelled file still decodes. Legacy phone-camera
//! types are sniffed with `infer` first; a genuine HEIF container fails with
//! a distinct error so the UI can suggest JPEG or PNG.

pub mod attachment;
pub mod capability;
pub mod compress;
pub mod config;
pub mod imaging;
pub mod metrics;
pub mod output;
pub mod plan;
pub mod progress;
pub mod types;
pub mod validation;

#[cfg(test)]
pub(crate) mod test_helpers;
