use fxhash::FxHashMap;

use crate::runtime::cast_lib::CastMemberRef;
use crate::runtime::datum_ref::DatumRef;
use crate::runtime::script_ref::ScriptInstanceRef;

/// One call frame on the VM's scope stack. Locals are keyed by name (as the
/// teacher does it) rather than by slot index, since `GetLocal`/`SetLocal`
/// resolve through the handler's `local_name_ids` table anyway.
pub struct Scope {
    pub script_ref: CastMemberRef,
    pub handler_name: String,
    pub receiver: Option<ScriptInstanceRef>,
    pub args: Vec<DatumRef>,
    pub bytecode_index: usize,
    pub locals: FxHashMap<String, DatumRef>,
    pub loop_return_indices: Vec<usize>,
    pub stack: Vec<DatumRef>,
    /// Set when this frame's handler called `pass`: the event dispatch
    /// cascade should keep walking to the next candidate instead of
    /// stopping here (§4.5 "Event dispatch order").
    pub passed: bool,
}

impl Scope {
    pub fn new(script_ref: CastMemberRef, handler_name: String, receiver: Option<ScriptInstanceRef>, args: Vec<DatumRef>) -> Scope {
        Scope {
            script_ref,
            handler_name,
            receiver,
            args,
            bytecode_index: 0,
            locals: FxHashMap::default(),
            loop_return_indices: vec![],
            stack: vec![],
            passed: false,
        }
    }

    pub fn pop(&mut self) -> Option<DatumRef> {
        self.stack.pop()
    }

    pub fn pop_n(&mut self, n: usize) -> Vec<DatumRef> {
        let len = self.stack.len();
        let start = len.saturating_sub(n);
        self.stack.split_off(start)
    }

    pub fn push(&mut self, value: DatumRef) {
        self.stack.push(value);
    }
}
