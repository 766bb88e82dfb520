/// Arena index into a `Runtime`'s script-instance table. Like `DatumRef`,
/// plain `Copy`, no refcounting: a script instance lives until the movie
/// (and its arena) is unloaded, not until its last reference disappears.
pub type ScriptInstanceId = usize;

#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct ScriptInstanceRef(pub ScriptInstanceId);

impl ScriptInstanceRef {
    pub fn id(&self) -> ScriptInstanceId {
        self.0
    }
}
