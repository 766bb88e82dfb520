use std::collections::HashMap;

use slab::Slab;

use crate::director::chunks::handler::HandlerDef;
use crate::director::chunks::script::ScriptChunk;
use crate::director::enums::ScriptType;
use crate::director::lingo::datum::Datum;
use crate::director::lingo::script::ScriptContext;
use crate::director::static_datum::static_datum_to_runtime;
use crate::runtime::allocator::DatumAllocator;
use crate::runtime::cast_lib::CastMemberRef;
use crate::runtime::datum_ref::DatumRef;
use crate::runtime::error::{RuntimeError, RuntimeResult, ScriptError};
use crate::runtime::script_ref::{ScriptInstanceId, ScriptInstanceRef};

/// A compiled script (cast member of type `Script`): its parsed bytecode
/// chunk plus a name-keyed handler table built from `handler_names`/
/// `handlers` so dispatch doesn't need to re-walk `chunk.handlers` linearly.
#[derive(Clone)]
pub struct Script {
    pub member_ref: CastMemberRef,
    pub name: String,
    pub chunk: ScriptChunk,
    pub script_type: ScriptType,
    pub handlers: HashMap<String, HandlerDef>,
    pub handler_names: Vec<String>,
}

pub type ScriptHandlerRef = (CastMemberRef, String);

impl Script {
    pub fn new(
        member_ref: CastMemberRef,
        name: String,
        chunk: ScriptChunk,
        script_type: ScriptType,
        lctx: &ScriptContext,
    ) -> Script {
        let mut handlers = HashMap::new();
        let mut handler_names = Vec::new();
        for handler in &chunk.handlers {
            let handler_name = lctx
                .names
                .get(handler.name_id as usize)
                .cloned()
                .unwrap_or_default();
            handler_names.push(handler_name.clone());
            handlers.insert(handler_name, handler.clone());
        }
        Script { member_ref, name, chunk, script_type, handlers, handler_names }
    }

    pub fn get_own_handler(&self, name: &str) -> Option<&HandlerDef> {
        self.handlers.get(name)
    }

    pub fn get_handler(&self, name: &str) -> Option<(CastMemberRef, &HandlerDef)> {
        self.get_own_handler(name).map(|h| (self.member_ref, h))
    }
}

/// A live instance of a parent/ancestor script (`new(script)` result). No
/// refcounting: outlives exactly as long as the arena it's allocated in.
pub struct ScriptInstance {
    pub id: ScriptInstanceId,
    pub script: CastMemberRef,
    pub ancestor: Option<ScriptInstanceId>,
    pub properties: HashMap<String, DatumRef>,
}

impl ScriptInstance {
    pub fn new(id: ScriptInstanceId, script_ref: CastMemberRef, script: &Script, lctx: &ScriptContext, allocator: &mut DatumAllocator) -> ScriptInstance {
        let mut properties = HashMap::new();
        for name_id in &script.chunk.property_name_ids {
            let name = lctx.names.get(*name_id as usize).cloned().unwrap_or_default();
            let default = script
                .chunk
                .property_defaults
                .get(name_id)
                .map(|static_datum| static_datum_to_runtime(static_datum, allocator))
                .unwrap_or(DatumRef::Void);
            properties.insert(name, default);
        }
        ScriptInstance { id, script: script_ref, ancestor: None, properties }
    }
}

/// Arena of live script instances for one `Runtime`.
#[derive(Default)]
pub struct ScriptInstanceTable {
    instances: Slab<ScriptInstance>,
}

impl ScriptInstanceTable {
    pub fn new() -> Self {
        ScriptInstanceTable { instances: Slab::new() }
    }

    pub fn insert(&mut self, script_ref: CastMemberRef, script: &Script, lctx: &ScriptContext, allocator: &mut DatumAllocator) -> ScriptInstanceRef {
        let entry = self.instances.vacant_entry();
        let id = entry.key();
        entry.insert(ScriptInstance::new(id, script_ref, script, lctx, allocator));
        ScriptInstanceRef(id)
    }

    pub fn get(&self, r: ScriptInstanceRef) -> RuntimeResult<&ScriptInstance> {
        self.instances.get(r.0).ok_or(RuntimeError::IndexOutOfBounds { index: r.0 as i32, len: self.instances.len() })
    }

    pub fn get_mut(&mut self, r: ScriptInstanceRef) -> RuntimeResult<&mut ScriptInstance> {
        let len = self.instances.len();
        self.instances.get_mut(r.0).ok_or(RuntimeError::IndexOutOfBounds { index: r.0 as i32, len })
    }

    /// Resolves a property through the ancestor chain (§3/§4.3): checks this
    /// instance first, then `ancestor`, bounded by `depth_limit` hops so a
    /// cyclic ancestor chain can't spin forever.
    pub fn get_prop(&self, r: ScriptInstanceRef, prop_name: &str, depth_limit: u32) -> Result<DatumRef, ScriptError> {
        self.get_prop_at_depth(r, prop_name, depth_limit, 0)
    }

    fn get_prop_at_depth(&self, r: ScriptInstanceRef, prop_name: &str, depth_limit: u32, depth: u32) -> Result<DatumRef, ScriptError> {
        if depth >= depth_limit {
            return Err(ScriptError::new(format!(
                "ancestor chain exceeded depth limit ({}) resolving \"{}\"",
                depth_limit, prop_name
            )));
        }
        let instance = self
            .instances
            .get(r.0)
            .ok_or_else(|| ScriptError::new("invalid script instance ref".to_string()))?;
        if let Some(value) = instance.properties.get(prop_name) {
            return Ok(*value);
        }
        match instance.ancestor {
            Some(ancestor_id) => self.get_prop_at_depth(ScriptInstanceRef(ancestor_id), prop_name, depth_limit, depth + 1),
            None => Err(ScriptError::new(format!("property \"{}\" not found", prop_name))),
        }
    }

    /// Sets a property through the ancestor chain. If no instance in the
    /// chain already owns `prop_name` and `required` is false, it's created
    /// on the receiving instance (the teacher's exact fallback behavior).
    pub fn set_prop(&mut self, r: ScriptInstanceRef, prop_name: &str, value: DatumRef, required: bool, depth_limit: u32) -> Result<(), ScriptError> {
        if self.set_prop_at_depth(r, prop_name, value, depth_limit, 0) {
            return Ok(());
        }
        if required {
            return Err(ScriptError::new(format!("cannot set property \"{}\"", prop_name)));
        }
        let instance = self
            .instances
            .get_mut(r.0)
            .ok_or_else(|| ScriptError::new("invalid script instance ref".to_string()))?;
        instance.properties.insert(prop_name.to_string(), value);
        Ok(())
    }

    fn set_prop_at_depth(&mut self, r: ScriptInstanceRef, prop_name: &str, value: DatumRef, depth_limit: u32, depth: u32) -> bool {
        if depth >= depth_limit {
            return false;
        }
        let (has_prop, ancestor) = match self.instances.get(r.0) {
            Some(instance) => (instance.properties.contains_key(prop_name), instance.ancestor),
            None => return false,
        };
        if has_prop {
            if let Some(instance) = self.instances.get_mut(r.0) {
                instance.properties.insert(prop_name.to_string(), value);
                return true;
            }
        }
        match ancestor {
            Some(ancestor_id) => self.set_prop_at_depth(ScriptInstanceRef(ancestor_id), prop_name, value, depth_limit, depth + 1),
            None => false,
        }
    }

    pub fn set_ancestor(&mut self, r: ScriptInstanceRef, ancestor: Option<ScriptInstanceRef>) -> RuntimeResult<()> {
        let instance = self.get_mut(r)?;
        instance.ancestor = ancestor.map(|a| a.0);
        Ok(())
    }

    /// Walks `ancestor` links looking for a handler, the same ancestor chain
    /// `get_prop` uses. Returns the instance that actually owns the handler
    /// (needed so the call frame's `receiver`/`me` stays the originating
    /// instance while the handler body comes from an ancestor).
    pub fn find_handler<'a>(
        &self,
        r: ScriptInstanceRef,
        name: &str,
        scripts: &'a HashMap<u32, Script>,
        member_key: impl Fn(CastMemberRef) -> u32,
        depth_limit: u32,
    ) -> Option<(ScriptInstanceRef, &'a HandlerDef)> {
        let mut current = r;
        for _ in 0..depth_limit {
            let instance = self.instances.get(current.0)?;
            let script = scripts.get(&member_key(instance.script))?;
            if let Some(handler) = script.get_own_handler(name) {
                return Some((current, handler));
            }
            match instance.ancestor {
                Some(ancestor_id) => current = ScriptInstanceRef(ancestor_id),
                None => return None,
            }
        }
        None
    }
}
