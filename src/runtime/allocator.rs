use slab::Slab;

use crate::director::lingo::datum::Datum;
use crate::runtime::datum_ref::{DatumId, DatumRef};
use crate::runtime::error::{RuntimeError, RuntimeResult};

/// Owns every live `Datum` for one `Runtime`. A plain `slab::Slab` arena: no
/// per-entry refcounting, no `Drop` bookkeeping. Entries are only ever
/// reclaimed in bulk, when the whole `Runtime` (and this allocator with it)
/// is dropped on movie unload.
#[derive(Default)]
pub struct DatumAllocator {
    datums: Slab<Datum>,
}

impl DatumAllocator {
    pub fn new() -> Self {
        DatumAllocator { datums: Slab::new() }
    }

    pub fn alloc(&mut self, datum: Datum) -> DatumRef {
        let id: DatumId = self.datums.insert(datum);
        DatumRef::Ref(id)
    }

    pub fn get_datum(&self, dref: &DatumRef) -> RuntimeResult<&Datum> {
        match dref {
            DatumRef::Void => Ok(&Datum::Void),
            DatumRef::Ref(id) => self.datums.get(*id).ok_or(RuntimeError::IndexOutOfBounds {
                index: *id as i32,
                len: self.datums.len(),
            }),
        }
    }

    pub fn get_datum_mut(&mut self, dref: &DatumRef) -> RuntimeResult<&mut Datum> {
        match dref {
            DatumRef::Void => Err(RuntimeError::TypeMismatch {
                expected: "allocated datum".to_string(),
                found: "void".to_string(),
            }),
            DatumRef::Ref(id) => {
                let len = self.datums.len();
                self.datums
                    .get_mut(*id)
                    .ok_or(RuntimeError::IndexOutOfBounds { index: *id as i32, len })
            }
        }
    }

    pub fn len(&self) -> usize {
        self.datums.len()
    }

    pub fn is_empty(&self) -> bool {
        self.datums.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alloc_and_get_roundtrips() {
        let mut allocator = DatumAllocator::new();
        let r = allocator.alloc(Datum::Int(42));
        assert_eq!(allocator.get_datum(&r).unwrap().int_value().unwrap(), 42);
    }

    #[test]
    fn void_ref_resolves_to_void_without_touching_arena() {
        let allocator = DatumAllocator::new();
        assert!(allocator.get_datum(&DatumRef::Void).unwrap().is_void());
    }

    #[test]
    fn cyclic_list_does_not_need_special_handling() {
        let mut allocator = DatumAllocator::new();
        let list_ref = allocator.alloc(Datum::List(
            crate::director::lingo::datum::DatumType::List,
            vec![],
            false,
        ));
        // A list containing itself is perfectly representable: the arena
        // doesn't care, there's no refcount to deadlock.
        if let Datum::List(_, items, _) = allocator.get_datum_mut(&list_ref).unwrap() {
            items.push(list_ref);
        }
        assert_eq!(allocator.get_datum(&list_ref).unwrap().to_list().unwrap().len(), 1);
    }
}
