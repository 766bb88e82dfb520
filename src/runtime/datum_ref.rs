/// Arena index into a `Runtime`'s datum allocator.
///
/// Unlike the teacher's `DatumRef`, this carries no refcount and implements
/// no `Drop`: lifetime follows the arena, not the individual value. A
/// `Runtime` never frees a single `Datum` mid-movie; the whole arena (and
/// every `DatumRef` into it) is dropped together when the movie unloads.
/// That's also why cyclic structures (a list containing itself, a prop list
/// referencing its own script instance) are safe here with no cycle
/// collector: there's nothing to collect until the arena itself goes away.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
pub enum DatumRef {
    #[default]
    Void,
    Ref(DatumId),
}

pub type DatumId = usize;

impl DatumRef {
    pub fn is_void(&self) -> bool {
        matches!(self, DatumRef::Void)
    }
}
