//! Content-addressed archive storage for Cartage.
//!
//! This crate implements the durable key→blob store the pull pipeline commits
//! fetched archives into. Keys are caller-derived paths (the path component
//! of the source URL), values are the archive bytes plus a little metadata.
//!
//! # Integrity
//!
//! A `put` that declares a checksum is verified before anything becomes
//! visible: the store recomputes the MD5 of the received bytes and rejects
//! the write on disagreement. A rejected put leaves no partial object behind
//! for `get` to observe.
//!
//! # Storage Backends
//!
//! All backends implement the [`ContentStore`] trait:
//!
//! - [`InMemoryContentStore`] — `HashMap`-based store for tests and embedding
//! - [`FsContentStore`] — filesystem store committing objects atomically via
//!   temp-file-then-rename
//!
//! # Design Rules
//!
//! 1. Writes are all-or-nothing: verify first, then commit.
//! 2. Re-put with the same key overwrites; there is no versioning.
//! 3. The store never interprets archive contents — it is a pure key-value
//!    store.
//! 4. All I/O errors are propagated, never silently ignored.

pub mod error;
pub mod fs;
pub mod memory;
pub mod object;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use fs::FsContentStore;
pub use memory::InMemoryContentStore;
pub use object::{ArchiveMetadata, StoredArchive};
pub use traits::{ContentStore, PutOptions};
