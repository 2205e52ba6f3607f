pub mod fixtures;

#[allow(unused_imports)]
pub use fixtures::{seeded_bytes, seeded_chunk, sha256_hash};
