use std::collections::HashMap;

use crate::director::cast::CastDef;
use crate::director::enums::ScriptType;
use crate::director::file::DirectorFile;
use crate::director::lingo::script::ScriptContext;
use crate::runtime::cast_lib::{cast_member_ref, CastLoadState, CastMemberRef, PreloadMode, PreloadReason};
use crate::runtime::cast_member::CastMember;
use crate::runtime::error::{RuntimeError, RuntimeResult};
use crate::runtime::script::Script;

/// One cast library: its members, parsed scripts, and name-resolution
/// context (`lctx`). Mirrors the teacher's `CastLib`, minus the async
/// preload bookkeeping that now lives on `ExternalCastLoader`.
pub struct CastLibrary {
    pub name: String,
    pub file_name: String,
    pub number: u32,
    pub is_external: bool,
    pub state: CastLoadState,
    pub preload_mode: PreloadMode,
    pub lctx: Option<ScriptContext>,
    pub members: HashMap<u32, CastMember>,
    pub scripts: HashMap<u32, Script>,
    pub capital_x: bool,
    pub dir_version: u16,
    /// Declared member-number range for this library from its cast-list
    /// entry, used to resolve a movie-global member number into
    /// `(lib, local_number)` in `CastRegistry::find_member_ref_by_number`.
    pub min_member: u32,
    pub max_member: u32,
}

impl CastLibrary {
    pub fn max_member_id(&self) -> u32 {
        *self.members.keys().max().unwrap_or(&0)
    }

    pub fn find_member_by_name(&self, name: &str) -> Option<&CastMember> {
        self.members.values().find(|m| m.name == name)
    }

    pub fn find_member_by_number(&self, number: u32) -> Option<&CastMember> {
        self.members.get(&number)
    }

    pub fn apply_cast_def(&mut self, def: &CastDef) {
        self.capital_x = def.capital_x;
        self.dir_version = def.dir_version;
        self.lctx = def.lctx.clone();
        self.members = def
            .members
            .iter()
            .map(|(number, member_def)| (*number, CastMember::from_def(*number, member_def)))
            .collect();

        if let Some(lctx) = &def.lctx {
            self.scripts = def
                .members
                .iter()
                .filter_map(|(number, member_def)| {
                    let script_chunk = lctx.scripts.get(number)?;
                    let member_ref = cast_member_ref(self.number as i32, *number as i32);
                    let name = member_def
                        .chunk
                        .member_info
                        .as_ref()
                        .map(|info| info.name.clone())
                        .unwrap_or_default();
                    let script_type = member_def
                        .chunk
                        .specific_data
                        .script_type()
                        .unwrap_or(ScriptType::Invalid);
                    Some((
                        *number,
                        Script::new(member_ref, name, script_chunk.clone(), script_type, lctx),
                    ))
                })
                .collect();
        }
        self.state = CastLoadState::Loaded;
    }
}

/// Owns every cast library for a loaded movie. Built once from a parsed
/// `DirectorFile`; external casts are spliced in later by
/// `ExternalCastLoader` as they finish loading.
pub struct CastRegistry {
    pub casts: Vec<CastLibrary>,
}

impl CastRegistry {
    pub fn empty() -> CastRegistry {
        CastRegistry { casts: Vec::new() }
    }

    pub fn load_from_dir(&mut self, dir: &DirectorFile) {
        self.casts = dir
            .cast_entries
            .iter()
            .enumerate()
            .map(|(index, entry)| {
                let def = dir.casts.iter().find(|c| c.id == entry.id);
                let mut cast = CastLibrary {
                    name: entry.name.clone(),
                    file_name: entry.file_path.clone(),
                    number: (index + 1) as u32,
                    is_external: !entry.file_path.is_empty(),
                    state: if def.is_some() { CastLoadState::NotLoaded } else { CastLoadState::NotLoaded },
                    preload_mode: PreloadMode::from(entry.preload_settings),
                    lctx: None,
                    members: HashMap::new(),
                    scripts: HashMap::new(),
                    capital_x: false,
                    dir_version: dir.version,
                    min_member: entry.min_member as u32,
                    max_member: entry.max_member as u32,
                };
                if let Some(def) = def {
                    cast.apply_cast_def(def);
                }
                cast
            })
            .collect();
    }

    pub fn get_cast(&self, number: u32) -> RuntimeResult<&CastLibrary> {
        self.casts
            .get(number as usize - 1)
            .ok_or_else(|| RuntimeError::CastNotLoaded { lib: number.to_string() })
    }

    pub fn get_cast_mut(&mut self, number: u32) -> RuntimeResult<&mut CastLibrary> {
        self.casts
            .get_mut(number as usize - 1)
            .ok_or_else(|| RuntimeError::CastNotLoaded { lib: number.to_string() })
    }

    pub fn get_cast_by_name(&self, name: &str) -> Option<&CastLibrary> {
        self.casts.iter().find(|c| c.name.eq_ignore_ascii_case(name))
    }

    pub fn get_member(&self, member_ref: CastMemberRef) -> Option<&CastMember> {
        self.get_cast(member_ref.cast_lib as u32).ok()?.members.get(&(member_ref.cast_member as u32))
    }

    pub fn get_script(&self, member_ref: CastMemberRef) -> Option<&Script> {
        self.get_cast(member_ref.cast_lib as u32).ok()?.scripts.get(&(member_ref.cast_member as u32))
    }

    /// §4.4: resolves a movie-global member number by walking the libraries
    /// in load order and treating each one's declared `[min_member,
    /// max_member]` range as a slot in a single concatenated address space,
    /// rather than requiring the number to match a per-library member id
    /// directly. A library whose range is degenerate (`min_member == 0 &&
    /// max_member == 0`, i.e. the chunk provider never populated it) falls
    /// back to exact per-library lookup so movies authored before this
    /// field existed still resolve.
    pub fn find_member_ref_by_number(&self, number: u32) -> Option<CastMemberRef> {
        self.casts.iter().find_map(|cast| {
            let has_range = cast.min_member != 0 || cast.max_member != 0;
            if has_range {
                if number < cast.min_member || number > cast.max_member {
                    return None;
                }
                let local = number - cast.min_member + 1;
                cast.members
                    .get(&local)
                    .map(|member| cast_member_ref(cast.number as i32, member.number as i32))
            } else {
                cast.members
                    .get(&number)
                    .map(|member| cast_member_ref(cast.number as i32, member.number as i32))
            }
        })
    }

    pub fn find_member_ref_by_name(&self, name: &str) -> Option<CastMemberRef> {
        self.casts.iter().find_map(|cast| {
            cast.find_member_by_name(name)
                .map(|member| cast_member_ref(cast.number as i32, member.number as i32))
        })
    }

    /// Casts flagged `WhenNeeded` never come back here; a host loads those
    /// lazily on first reference instead. `MovieLoaded` pulls in
    /// `BeforeFrameOne` casts; `AfterFrameOne` pulls in `AfterFrameOne` casts
    /// (§4.4's reason-to-mode mapping).
    pub fn casts_pending_preload(&self, reason: PreloadReason) -> Vec<u32> {
        let wanted = match reason {
            PreloadReason::MovieLoaded => PreloadMode::BeforeFrameOne,
            PreloadReason::AfterFrameOne => PreloadMode::AfterFrameOne,
        };
        self.casts
            .iter()
            .filter(|c| c.is_external && c.state == CastLoadState::NotLoaded && c.preload_mode == wanted)
            .map(|c| c.number)
            .collect()
    }
}
