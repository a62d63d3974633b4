//! User-initiated request flows. Each one is a single-owner state object that
//! mirrors one screen: inputs, a busy flag, results and an inline error.
//!
//! Submission is split in two so an event loop can keep the busy flag visible
//! while the request runs: `begin_submit` validates and marks the flow busy,
//! the returned pending request is awaited anywhere, and `complete` applies
//! the outcome. `submit` chains the three for callers that just await.

pub mod batch;
pub mod feedback;
pub mod upload;
