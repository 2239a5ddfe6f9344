//! seal-pipeline: the paper sealing and recovery pipelines
//!
//! Submission walks a paper forward through its lifecycle:
//! plaintext → encrypted chunks → locked key (K1 discarded) → stored record.
//! The defining invariant: once `submit` returns, no single party retains
//! decrypting power except through the locked key's unlock condition.
//!
//! Retrieval is the independent reverse path: record → unlocked key →
//! fetched chunks → verified document. Errors never surface a partial
//! document.

pub mod retrieve;
pub mod submit;

pub use retrieve::{retrieve, RetrieveOptions};
pub use submit::{submit, SubmissionReceipt, SubmitOptions};
