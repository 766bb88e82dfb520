use crate::director::lingo::datum::{Datum, DatumType};
use crate::runtime::allocator::DatumAllocator;
use crate::runtime::datum_ref::DatumRef;

#[derive(Clone, Debug, PartialEq)]
pub enum StaticDatum {
    Int(i32),
    Float(f32),
    String(String),
    Symbol(String),
    List(Vec<StaticDatum>),
    PropList(Vec<(StaticDatum, StaticDatum)>),
    IntPoint(i32, i32),
    IntRect(i32, i32, i32, i32),
    Void,
}

/// Resolves a live `DatumRef` into an owned, allocator-independent snapshot.
/// Needs an explicit allocator reference since there is no global player to
/// reach through anymore.
pub fn static_datum_from_ref(dref: &DatumRef, allocator: &DatumAllocator) -> StaticDatum {
    match dref {
        DatumRef::Void => StaticDatum::Void,
        DatumRef::Ref(_) => match allocator.get_datum(dref) {
            Ok(datum) => match datum.clone() {
                Datum::Int(i) => StaticDatum::Int(i),
                Datum::Float(f) => StaticDatum::Float(f),
                Datum::String(s) => StaticDatum::String(s),
                Datum::Symbol(s) => StaticDatum::Symbol(s),
                Datum::List(_, items, _) => StaticDatum::List(
                    items.iter().map(|item| static_datum_from_ref(item, allocator)).collect(),
                ),
                Datum::PropList(pairs, _) => StaticDatum::PropList(
                    pairs
                        .iter()
                        .map(|(k, v)| (static_datum_from_ref(k, allocator), static_datum_from_ref(v, allocator)))
                        .collect(),
                ),
                Datum::IntPoint((x, y)) => StaticDatum::IntPoint(x, y),
                Datum::IntRect((l, t, r, b)) => StaticDatum::IntRect(l, t, r, b),
                _ => StaticDatum::Void,
            },
            Err(_) => StaticDatum::Void,
        },
    }
}

impl From<Datum> for StaticDatum {
    /// Literal-table values are always scalar (no list/propList literals),
    /// so this never needs an allocator to resolve nested `DatumRef`s.
    fn from(d: Datum) -> Self {
        match d {
            Datum::Int(i) => StaticDatum::Int(i),
            Datum::Float(f) => StaticDatum::Float(f),
            Datum::String(s) => StaticDatum::String(s),
            Datum::Symbol(s) => StaticDatum::Symbol(s),
            Datum::IntPoint((x, y)) => StaticDatum::IntPoint(x, y),
            Datum::IntRect((l, t, r, b)) => StaticDatum::IntRect(l, t, r, b),
            _ => StaticDatum::Void,
        }
    }
}

impl StaticDatum {
    pub fn as_string(&self) -> Option<String> {
        match self {
            StaticDatum::String(s) => Some(s.clone()),
            StaticDatum::Symbol(s) => Some(s.clone()),
            StaticDatum::Int(i) => Some(i.to_string()),
            StaticDatum::Float(f) => Some(f.to_string()),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i32> {
        match self {
            StaticDatum::Int(i) => Some(*i),
            StaticDatum::String(s) => s.parse().ok(),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f32> {
        match self {
            StaticDatum::Float(f) => Some(*f),
            StaticDatum::Int(i) => Some(*i as f32),
            StaticDatum::String(s) => s.parse().ok(),
            _ => None,
        }
    }

    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            StaticDatum::Int(i) => Some(*i != 0),
            _ => None,
        }
    }
}

/// Materializes a parse-time property default (a `StaticDatum` read straight
/// out of a script chunk's literal table) into a live `Datum` in the given
/// allocator. Used when a script instance is constructed and its properties
/// need a starting value before any bytecode has run.
pub fn static_datum_to_runtime(param: &StaticDatum, allocator: &mut DatumAllocator) -> DatumRef {
    match param {
        StaticDatum::String(s) => allocator.alloc(Datum::String(s.clone())),
        StaticDatum::Int(i) => allocator.alloc(Datum::Int(*i)),
        StaticDatum::Float(f) => allocator.alloc(Datum::Float(*f)),
        StaticDatum::Symbol(s) => allocator.alloc(Datum::Symbol(s.clone())),
        StaticDatum::List(items) => {
            let datum_refs: Vec<DatumRef> = items
                .iter()
                .map(|item| static_datum_to_runtime(item, allocator))
                .collect();
            allocator.alloc(Datum::List(DatumType::List, datum_refs, false))
        }
        StaticDatum::PropList(items) => {
            let datum_refs: Vec<(DatumRef, DatumRef)> = items
                .iter()
                .map(|(key, val)| {
                    let key_ref = static_datum_to_runtime(key, allocator);
                    let val_ref = static_datum_to_runtime(val, allocator);
                    (key_ref, val_ref)
                })
                .collect();
            allocator.alloc(Datum::PropList(datum_refs, false))
        }
        StaticDatum::IntPoint(x, y) => allocator.alloc(Datum::IntPoint((*x, *y))),
        StaticDatum::IntRect(left, top, right, bottom) => {
            allocator.alloc(Datum::IntRect((*left, *top, *right, *bottom)))
        }
        StaticDatum::Void => DatumRef::Void,
    }
}
