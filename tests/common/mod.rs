//! Shared scaffolding for the integration tests: builds a `Runtime` (or
//! `Player`) carrying a single, hand-assembled movie script, so a test can
//! drive the VM/score player against real bytecode without a chunk to parse
//! it from (SPEC_FULL.md's testing section).
//!
//! `tests/common` is compiled fresh into every test binary that declares
//! `mod common;`, so a helper unused by one binary still shows up unused in
//! that binary's own compile.
#![allow(dead_code)]

use std::collections::HashMap;

use lingo_runtime::director::chunks::handler::{Bytecode, HandlerDef};
use lingo_runtime::director::chunks::script::ScriptChunk;
use lingo_runtime::director::enums::ScriptType;
use lingo_runtime::director::lingo::datum::Datum;
use lingo_runtime::director::lingo::script::ScriptContext;
use lingo_runtime::runtime::cast_lib::{CastLoadState, CastMemberRef, PreloadMode};
use lingo_runtime::runtime::cast_registry::{CastLibrary, CastRegistry};
use lingo_runtime::runtime::config::RuntimeConfig;
use lingo_runtime::runtime::movie::Runtime;
use lingo_runtime::runtime::script::Script;

pub const SCRIPT_REF: CastMemberRef = CastMemberRef { cast_lib: 1, cast_member: 1 };

/// Builds a `Runtime` whose only loaded cast is one Movie-type script
/// exposing a single handler, looked up by name in `names`. `capital_x` is
/// forced true so the variable multiplier is 1 and every `obj` on a
/// local/param opcode is a plain slot index (§4.1).
pub fn handler_runtime(
    names: Vec<&str>,
    handler_name: &str,
    literals: Vec<Datum>,
    bytecode: Vec<Bytecode>,
    local_name_ids: Vec<u16>,
) -> Runtime {
    let name_id = names
        .iter()
        .position(|n| *n == handler_name)
        .unwrap_or_else(|| panic!("handler name \"{}\" not in names table", handler_name)) as u16;
    let handler = HandlerDef::from_instructions(name_id, bytecode, local_name_ids);
    single_script_runtime(names, literals, vec![handler])
}

pub fn single_script_runtime(names: Vec<&str>, literals: Vec<Datum>, handlers: Vec<HandlerDef>) -> Runtime {
    let names: Vec<String> = names.into_iter().map(String::from).collect();
    let chunk = ScriptChunk { literals, handlers, property_name_ids: Vec::new(), property_defaults: HashMap::new() };
    let mut scripts = HashMap::new();
    scripts.insert(1u32, chunk.clone());
    let lctx = ScriptContext { names, scripts };
    let script = Script::new(SCRIPT_REF, "test".to_string(), chunk, ScriptType::Movie, &lctx);

    let mut cast_scripts = HashMap::new();
    cast_scripts.insert(1u32, script);

    let cast = CastLibrary {
        name: "internal".to_string(),
        file_name: String::new(),
        number: 1,
        is_external: false,
        state: CastLoadState::Loaded,
        preload_mode: PreloadMode::WhenNeeded,
        lctx: Some(lctx),
        members: HashMap::new(),
        scripts: cast_scripts,
        capital_x: true,
        dir_version: 0,
        min_member: 0,
        max_member: 0,
    };

    let mut runtime = Runtime::new(RuntimeConfig::default());
    runtime.capital_x = true;
    runtime.cast_registry = CastRegistry { casts: vec![cast] };
    runtime
}
