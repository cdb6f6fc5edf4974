//! The Cartage pull worker: fetch → verify → store.
//!
//! One [`PullWorker::pull`] call fetches an archive from an externally
//! supplied URL, extracts the checksum the origin declared in its response
//! headers, and commits the body to the content store under a key derived
//! from the URL's path. A checksum disagreement discards the whole body —
//! nothing partial is ever persisted.
//!
//! The outbound HTTP call sits behind the [`ArchiveFetcher`] trait so tests
//! can script upstream behavior without a network.

pub mod error;
pub mod fetcher;
pub mod worker;

pub use error::{FetchError, PullError, PullResult};
pub use fetcher::{ArchiveFetcher, FetchedArchive, HttpArchiveFetcher};
pub use worker::PullWorker;
