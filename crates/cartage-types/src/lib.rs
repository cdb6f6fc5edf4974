//! Foundation types for Cartage.
//!
//! This crate provides the core identifier and integrity types used
//! throughout the Cartage archive-pull pipeline. Every other Cartage crate
//! depends on `cartage-types`.
//!
//! # Key Types
//!
//! - [`Checksum`] — MD5 content digest with transport-header normalization
//! - [`QueueId`] — Opaque identifier for one batch scheduler instance (UUID v7)
//! - [`SubmitReceipt`] — What a caller gets back from a batch submission

pub mod checksum;
pub mod error;
pub mod queue;

pub use checksum::Checksum;
pub use error::TypeError;
pub use queue::{QueueId, SubmitReceipt};
