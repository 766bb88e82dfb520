//! Host-collaborator traits. This is the only place `async`/`.await` is
//! idiomatic in this crate: the VM itself stays a plain synchronous loop
//! and never blocks on one of these mid-handler. A reference into a
//! not-yet-loaded external cast just resolves to void; the host drives
//! these futures on its own executor and splices results in between ticks.

use async_trait::async_trait;

use crate::runtime::handles::BitmapRef;

/// Turns raw movie bytes into a parsed `DirectorFile`. `director::BundledChunkProvider`
/// is the default implementation; a host may supply its own (e.g. to read
/// from a custom archive format) instead.
#[async_trait]
pub trait ChunkProvider: Send + Sync {
    async fn load(&self, bytes: Vec<u8>, file_name: String, base_path: url::Url) -> Result<crate::director::file::DirectorFile, String>;
}

/// Decodes a bitmap cast member's raw pixel data into whatever the host's
/// rendering surface wants. The core never looks past the `BitmapRef`
/// handle this returns.
#[async_trait]
pub trait BitmapDecoder: Send + Sync {
    async fn decode(&self, raw: Vec<u8>, bit_depth: u8, palette_id: i16) -> Result<BitmapRef, String>;
}

/// Fetches an external/linked cast library's bytes given its resolved file
/// name, for `ExternalCastLoader` to splice into the `CastRegistry`.
#[async_trait]
pub trait ExternalCastFetcher: Send + Sync {
    async fn fetch(&self, file_name: String) -> Result<Vec<u8>, String>;
}

/// Generic network fetch for `preloadNetThing`/`postNetText`/`getNetText`.
#[async_trait]
pub trait NetClient: Send + Sync {
    async fn get(&self, url: url::Url) -> Result<Vec<u8>, i32>;
    async fn post(&self, url: url::Url, body: String) -> Result<Vec<u8>, i32>;
}
