//! Core domain types and shared logic for the WTTP resource protocol.
//!
//! This crate defines the canonical data model used across all other crates:
//! - Content hashes and content-addressed chunks
//! - Roles and account identities
//! - Protocol methods and method bitmasks
//! - Header policy records (cache, per-method origins, redirects)
//! - Resource metadata, lifecycle and chunk bookkeeping
//! - ETags and conditional-request evaluation
//! - Request and response shapes consumed by the dispatcher

pub mod chunk;
pub mod clock;
pub mod config;
pub mod error;
pub mod etag;
pub mod hash;
pub mod header;
pub mod method;
pub mod request;
pub mod resource;
pub mod role;

pub use chunk::{Chunk, ChunkHash, ChunkRef, chunk_data};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{Error, Result};
pub use etag::{Conditional, ETag};
pub use hash::{ContentHash, ContentHasher};
pub use header::{CachePolicy, CachePreset, HeaderAddress, HeaderContent, Redirect};
pub use method::{Method, MethodSet};
pub use request::{
    ChunkWrite, DefineRequest, DeleteRequest, GetRequest, GetResponse, HeadRequest, HeadResponse,
    LocateResponse, OptionsRequest, OptionsResponse, PatchRequest, PutRequest, Range,
    Status, WriteResponse,
};
pub use resource::{ContentProperties, Lifecycle, ResourceMetadata, ResourceRecord};
pub use role::{AccountId, Role};

/// Reference chunk size used by collaborators splitting content: 32 KiB.
pub const DEFAULT_CHUNK_SIZE: u64 = 32 * 1024;
