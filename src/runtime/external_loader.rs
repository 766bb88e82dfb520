//! External cast acquisition (§4.4 "Loading", §4.6/§5 "External async"):
//! resolves a linked cast library's declared file path, fetches its bytes
//! through the host's `ExternalCastFetcher`, parses them with a
//! `ChunkProvider`, and splices the result into the target `CastLibrary` via
//! `CastLibrary::apply_cast_def` — the same splice path a movie's own
//! embedded casts go through at initial load. Grounded on the teacher's
//! `CastLib::load_internal`/`JsNetTask` cast-fetch flow in `cast_lib.rs`,
//! re-expressed against the explicit collaborator traits in
//! `runtime::external` instead of its `wasm_bindgen` JS bridge.
//!
//! The VM itself never calls into this module (§4.1's note: a reference into
//! a `NotLoaded` cast resolves to void rather than blocking). A host drives
//! `load_external_cast` on its own executor, typically once per
//! `casts_pending_preload` entry returned after `ScorePlayer::tick`.

use crate::runtime::cast_lib::CastLoadState;
use crate::runtime::cast_registry::CastRegistry;
use crate::runtime::external::{ChunkProvider, ExternalCastFetcher};

/// §4.4 path normalization: unify path separators, keep only the trailing
/// path component, strip any extension, append `.cct`, then optionally join
/// under a configured base path.
pub fn normalize_cast_path(raw_path: &str, base_path: Option<&str>) -> String {
    let unified = raw_path.replace('\\', "/");
    let trailing = unified.rsplit('/').next().unwrap_or(unified.as_str());
    let stem = trailing.rsplit_once('.').map(|(stem, _ext)| stem).unwrap_or(trailing);
    let file_name = format!("{}.cct", stem);
    match base_path {
        Some(base) if !base.is_empty() => format!("{}/{}", base.trim_end_matches('/'), file_name),
        _ => file_name,
    }
}

/// Fetches and splices one external cast library, unless it's already
/// `Loading`/`Loaded` (§4.4 "concurrent duplicate loads are coalesced by a
/// single LOADING state"). On fetch or parse failure the cast drops back to
/// `NotLoaded` and the error is returned; the registry is left otherwise
/// untouched (§7: a load failure marks the cast `NotLoaded` and logs, it
/// never panics or poisons the registry).
pub async fn load_external_cast(
    registry: &mut CastRegistry,
    number: u32,
    base_path: Option<&str>,
    fetcher: &dyn ExternalCastFetcher,
    chunk_provider: &dyn ChunkProvider,
    movie_base_path: url::Url,
) -> Result<(), String> {
    let (raw_path, already_in_flight) = {
        let cast = registry.get_cast(number).map_err(|e| e.to_string())?;
        (cast.file_name.clone(), cast.state != CastLoadState::NotLoaded)
    };
    if already_in_flight {
        return Ok(());
    }
    let normalized = normalize_cast_path(&raw_path, base_path);
    registry.get_cast_mut(number).map_err(|e| e.to_string())?.state = CastLoadState::Loading;

    let bytes = fetcher.fetch(normalized.clone()).await;
    let bytes = match bytes {
        Ok(bytes) => bytes,
        Err(e) => {
            log::warn!("external cast {} ({}): fetch failed: {}", number, normalized, e);
            registry.get_cast_mut(number).map_err(|e| e.to_string())?.state = CastLoadState::NotLoaded;
            return Err(e);
        }
    };

    let parsed = chunk_provider.load(bytes, normalized.clone(), movie_base_path).await;
    let dir = match parsed {
        Ok(dir) => dir,
        Err(e) => {
            log::warn!("external cast {} ({}): parse failed: {}", number, normalized, e);
            registry.get_cast_mut(number).map_err(|e| e.to_string())?.state = CastLoadState::NotLoaded;
            return Err(e);
        }
    };

    let def = dir.casts.into_iter().next();
    let cast = registry.get_cast_mut(number).map_err(|e| e.to_string())?;
    match def {
        Some(def) => {
            cast.apply_cast_def(&def);
            Ok(())
        }
        None => {
            cast.state = CastLoadState::NotLoaded;
            let message = format!("external cast file \"{}\" contained no cast chunk", normalized);
            log::warn!("{}", message);
            Err(message)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_cast_path_strips_windows_separators_and_extension() {
        assert_eq!(normalize_cast_path(r"Casts\extra.cst", None), "extra.cct");
    }

    #[test]
    fn normalize_cast_path_takes_trailing_component_only() {
        assert_eq!(normalize_cast_path("a/b/c/movie.dir", None), "movie.cct");
    }

    #[test]
    fn normalize_cast_path_joins_under_base() {
        assert_eq!(normalize_cast_path("assets/foo.cst", Some("https://example.com/movies")), "https://example.com/movies/foo.cct");
    }

    #[test]
    fn normalize_cast_path_handles_no_extension() {
        assert_eq!(normalize_cast_path("extra", None), "extra.cct");
    }
}
