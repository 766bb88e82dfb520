//! The bundled chunk-level RIFX parser.
//!
//! This is the default, non-core implementation of the `ChunkProvider`
//! collaborator (see `crate::external`): it turns raw Shockwave/Director
//! file bytes into the `DirectorFile` the cast registry and score player
//! are built from. A host may supply its own chunk provider instead.

pub mod cast;
pub mod chunks;
pub mod enums;
pub mod file;
pub mod guid;
pub mod lingo;
pub mod log_compat;
pub mod rifx;
pub mod static_datum;
pub mod utils;

use async_trait::async_trait;

use crate::director::file::{read_director_file_bytes, DirectorFile};
use crate::runtime::external::ChunkProvider;

/// The crate's own `ChunkProvider`: wraps `file::read_director_file_bytes`
/// behind the async collaborator trait so a host that has no reason to
/// supply a custom parser can just use this one.
pub struct BundledChunkProvider;

#[async_trait]
impl ChunkProvider for BundledChunkProvider {
    async fn load(&self, bytes: Vec<u8>, file_name: String, base_path: url::Url) -> Result<DirectorFile, String> {
        read_director_file_bytes(&bytes, &file_name, base_path.as_str())
    }
}
