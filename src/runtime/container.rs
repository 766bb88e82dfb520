//! List/propList method tables: the builtins reachable through `objCall`
//! when the target datum is a `List` or `PropList` rather than a script
//! instance or a registered global handler. Grounded on the teacher's
//! `datum_operations.rs`/`list_datum.rs` method names, re-expressed against
//! the arena-backed `DatumAllocator` instead of a global player.

use crate::director::lingo::datum::{Datum, DatumType};
use crate::runtime::allocator::DatumAllocator;
use crate::runtime::datum_ref::DatumRef;
use crate::runtime::error::{RuntimeError, RuntimeResult};

fn datum_eq(a: &DatumRef, b: &DatumRef, allocator: &DatumAllocator) -> bool {
    match (allocator.get_datum(a), allocator.get_datum(b)) {
        (Ok(Datum::Int(x)), Ok(Datum::Int(y))) => x == y,
        (Ok(Datum::Float(x)), Ok(Datum::Float(y))) => x == y,
        (Ok(Datum::Int(x)), Ok(Datum::Float(y))) | (Ok(Datum::Float(y)), Ok(Datum::Int(x))) => {
            *x as f32 == *y
        }
        (Ok(Datum::String(x)), Ok(Datum::String(y))) => x.eq_ignore_ascii_case(y),
        (Ok(Datum::Symbol(x)), Ok(Datum::Symbol(y))) => x.eq_ignore_ascii_case(y),
        (Ok(Datum::Void), Ok(Datum::Void)) => true,
        _ => false,
    }
}

fn find_pos(list: &[DatumRef], value: &DatumRef, allocator: &DatumAllocator) -> Option<usize> {
    list.iter().position(|item| datum_eq(item, value, allocator))
}

fn insert_sorted(list: &mut Vec<DatumRef>, value: DatumRef, allocator: &DatumAllocator) {
    let pos = list
        .iter()
        .position(|item| datum_less_than(value, *item, allocator))
        .unwrap_or(list.len());
    list.insert(pos, value);
}

fn datum_less_than(a: DatumRef, b: DatumRef, allocator: &DatumAllocator) -> bool {
    match (allocator.get_datum(&a), allocator.get_datum(&b)) {
        (Ok(Datum::Int(x)), Ok(Datum::Int(y))) => x < y,
        (Ok(Datum::Float(x)), Ok(Datum::Float(y))) => x < y,
        (Ok(Datum::Int(x)), Ok(Datum::Float(y))) => (*x as f32) < *y,
        (Ok(Datum::Float(x)), Ok(Datum::Int(y))) => *x < (*y as f32),
        (Ok(Datum::String(x)), Ok(Datum::String(y))) => x < y,
        _ => false,
    }
}

/// Dispatches a linear-list method (`append`, `getAt`, `count`, ...) on the
/// list living at `target`. `args` are the remaining call arguments in
/// left-to-right order, `name` the bare method name (no leading `#`).
pub fn call_list_method(
    allocator: &mut DatumAllocator,
    target: DatumRef,
    name: &str,
    args: &[DatumRef],
) -> RuntimeResult<DatumRef> {
    match name {
        "count" => {
            let len = allocator.get_datum(&target)?.to_list()?.len();
            Ok(allocator.alloc(Datum::Int(len as i32)))
        }
        "add" | "append" => {
            let value = *args.first().ok_or(RuntimeError::StackUnderflow)?;
            let sorted = allocator.get_datum(&target)?.to_list_tuple()?.2;
            if sorted {
                let mut items = allocator.get_datum(&target)?.to_list()?.clone();
                insert_sorted(&mut items, value, allocator);
                *allocator.get_datum_mut(&target)?.to_list_mut()? = items;
            } else {
                allocator.get_datum_mut(&target)?.to_list_mut()?.push(value);
            }
            Ok(target)
        }
        "addAt" => {
            let index = arg_int(allocator, args, 0)? as usize;
            let value = *args.get(1).ok_or(RuntimeError::StackUnderflow)?;
            let list = allocator.get_datum_mut(&target)?.to_list_mut()?;
            let idx = index.saturating_sub(1).min(list.len());
            list.insert(idx, value);
            Ok(target)
        }
        "deleteAt" => {
            let index = arg_int(allocator, args, 0)? as usize;
            let list = allocator.get_datum_mut(&target)?.to_list_mut()?;
            if index >= 1 && index <= list.len() {
                list.remove(index - 1);
            }
            Ok(target)
        }
        "deleteOne" => {
            let value = *args.first().ok_or(RuntimeError::StackUnderflow)?;
            let pos = find_pos(allocator.get_datum(&target)?.to_list()?, &value, allocator);
            if let Some(pos) = pos {
                allocator.get_datum_mut(&target)?.to_list_mut()?.remove(pos);
            }
            Ok(target)
        }
        "getAt" => {
            let index = arg_int(allocator, args, 0)? as usize;
            let list = allocator.get_datum(&target)?.to_list()?;
            list.get(index.wrapping_sub(1))
                .copied()
                .ok_or(RuntimeError::IndexOutOfBounds { index: index as i32, len: list.len() })
        }
        "setAt" => {
            let index = arg_int(allocator, args, 0)? as usize;
            let value = *args.get(1).ok_or(RuntimeError::StackUnderflow)?;
            let void = allocator.alloc(Datum::Void);
            let list = allocator.get_datum_mut(&target)?.to_list_mut()?;
            if index >= 1 {
                if index > list.len() {
                    list.resize(index, void);
                }
                list[index - 1] = value;
            }
            Ok(target)
        }
        "getOne" | "findPos" => {
            let value = *args.first().ok_or(RuntimeError::StackUnderflow)?;
            let pos = find_pos(allocator.get_datum(&target)?.to_list()?, &value, allocator);
            Ok(allocator.alloc(Datum::Int(pos.map(|p| p as i32 + 1).unwrap_or(0))))
        }
        "getLast" => {
            let list = allocator.get_datum(&target)?.to_list()?;
            list.last().copied().ok_or(RuntimeError::IndexOutOfBounds { index: 0, len: 0 })
        }
        "getProp" | "getPropAt" => {
            // lists don't carry props; mirrors the teacher's behavior of
            // returning void rather than erroring.
            Ok(DatumRef::Void)
        }
        "duplicate" => {
            let (ty, items, sorted) = {
                let d = allocator.get_datum(&target)?;
                let (ty, items, sorted) = d.to_list_tuple()?;
                (ty.clone(), items.clone(), sorted)
            };
            Ok(allocator.alloc(Datum::List(ty, items, sorted)))
        }
        "sort" => {
            let mut items = allocator.get_datum(&target)?.to_list()?.clone();
            items.sort_by(|a, b| {
                if datum_less_than(*a, *b, allocator) {
                    std::cmp::Ordering::Less
                } else if datum_less_than(*b, *a, allocator) {
                    std::cmp::Ordering::Greater
                } else {
                    std::cmp::Ordering::Equal
                }
            });
            *allocator.get_datum_mut(&target)?.to_list_mut()? = items;
            Ok(target)
        }
        "emptyList" => {
            allocator.get_datum_mut(&target)?.to_list_mut()?.clear();
            Ok(target)
        }
        _ => Err(RuntimeError::UndefinedHandler { name: name.to_string() }),
    }
}

fn arg_int(allocator: &DatumAllocator, args: &[DatumRef], i: usize) -> RuntimeResult<i32> {
    let r = args.get(i).ok_or(RuntimeError::StackUnderflow)?;
    Ok(allocator.get_datum(r)?.int_value()?)
}

/// Dispatches a property-list method (`setaProp`, `getaProp`, `addProp`,
/// ...) on the propList living at `target`.
pub fn call_prop_list_method(
    allocator: &mut DatumAllocator,
    target: DatumRef,
    name: &str,
    args: &[DatumRef],
) -> RuntimeResult<DatumRef> {
    match name {
        "count" => {
            let len = allocator.get_datum(&target)?.to_map()?.len();
            Ok(allocator.alloc(Datum::Int(len as i32)))
        }
        "addProp" | "setaProp" | "setProp" => {
            let key = *args.first().ok_or(RuntimeError::StackUnderflow)?;
            let value = *args.get(1).ok_or(RuntimeError::StackUnderflow)?;
            let sorted = allocator.get_datum(&target)?.to_map_tuple()?.1;
            let existing = {
                let map = allocator.get_datum(&target)?.to_map()?;
                map.iter().position(|(k, _)| datum_eq(k, &key, allocator))
            };
            let map = allocator.get_datum_mut(&target)?.to_map_mut()?;
            match existing {
                Some(pos) => map[pos].1 = value,
                None if sorted => {
                    let pos = map
                        .iter()
                        .position(|(k, _)| datum_less_than(key, *k, allocator))
                        .unwrap_or(map.len());
                    map.insert(pos, (key, value));
                }
                None => map.push((key, value)),
            }
            Ok(target)
        }
        "deleteProp" => {
            let key = *args.first().ok_or(RuntimeError::StackUnderflow)?;
            let pos = {
                let map = allocator.get_datum(&target)?.to_map()?;
                map.iter().position(|(k, _)| datum_eq(k, &key, allocator))
            };
            if let Some(pos) = pos {
                allocator.get_datum_mut(&target)?.to_map_mut()?.remove(pos);
            }
            Ok(target)
        }
        "getaProp" | "getProp" => {
            let key = *args.first().ok_or(RuntimeError::StackUnderflow)?;
            let map = allocator.get_datum(&target)?.to_map()?;
            map.iter()
                .find(|(k, _)| datum_eq(k, &key, allocator))
                .map(|(_, v)| *v)
                .ok_or_else(|| RuntimeError::UndefinedName { name: "property".to_string() })
        }
        "getPropAt" => {
            let index = arg_int(allocator, args, 0)? as usize;
            let map = allocator.get_datum(&target)?.to_map()?;
            map.get(index.wrapping_sub(1))
                .map(|(k, _)| *k)
                .ok_or(RuntimeError::IndexOutOfBounds { index: index as i32, len: map.len() })
        }
        "getAt" => {
            let key_or_index = *args.first().ok_or(RuntimeError::StackUnderflow)?;
            let is_int = matches!(allocator.get_datum(&key_or_index)?, Datum::Int(_) | Datum::Float(_));
            if is_int {
                let index = allocator.get_datum(&key_or_index)?.int_value()? as usize;
                let map = allocator.get_datum(&target)?.to_map()?;
                map.get(index.wrapping_sub(1))
                    .map(|(_, v)| *v)
                    .ok_or(RuntimeError::IndexOutOfBounds { index: index as i32, len: map.len() })
            } else {
                let map = allocator.get_datum(&target)?.to_map()?;
                map.iter()
                    .find(|(k, _)| datum_eq(k, &key_or_index, allocator))
                    .map(|(_, v)| *v)
                    .ok_or_else(|| RuntimeError::UndefinedName { name: "property".to_string() })
            }
        }
        "setAt" => {
            let key_or_index = *args.first().ok_or(RuntimeError::StackUnderflow)?;
            let value = *args.get(1).ok_or(RuntimeError::StackUnderflow)?;
            let is_int = matches!(allocator.get_datum(&key_or_index)?, Datum::Int(_) | Datum::Float(_));
            if is_int {
                let index = allocator.get_datum(&key_or_index)?.int_value()? as usize;
                let map = allocator.get_datum_mut(&target)?.to_map_mut()?;
                let idx = index.wrapping_sub(1);
                if idx < map.len() {
                    map[idx].1 = value;
                } else {
                    map.push((key_or_index, value));
                }
            } else {
                let existing = {
                    let map = allocator.get_datum(&target)?.to_map()?;
                    map.iter().position(|(k, _)| datum_eq(k, &key_or_index, allocator))
                };
                let map = allocator.get_datum_mut(&target)?.to_map_mut()?;
                match existing {
                    Some(pos) => map[pos].1 = value,
                    None => map.push((key_or_index, value)),
                }
            }
            Ok(target)
        }
        "findPos" => {
            let key = *args.first().ok_or(RuntimeError::StackUnderflow)?;
            let map = allocator.get_datum(&target)?.to_map()?;
            let pos = map.iter().position(|(k, _)| datum_eq(k, &key, allocator));
            Ok(allocator.alloc(Datum::Int(pos.map(|p| p as i32 + 1).unwrap_or(0))))
        }
        "duplicate" => {
            let (items, sorted) = {
                let d = allocator.get_datum(&target)?;
                let (items, sorted) = d.to_map_tuple()?;
                (items.clone(), sorted)
            };
            Ok(allocator.alloc(Datum::PropList(items, sorted)))
        }
        _ => Err(RuntimeError::UndefinedHandler { name: name.to_string() }),
    }
}

/// True for the handful of method names recognized by both list kinds so a
/// VM dispatch site can decide ahead of time whether to reach for
/// `call_list_method`/`call_prop_list_method` versus a script/builtin call.
pub fn is_container_datum(datum_type: &DatumType) -> bool {
    matches!(datum_type, DatumType::List | DatumType::PropList)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_and_count() {
        let mut allocator = DatumAllocator::new();
        let list = allocator.alloc(Datum::List(DatumType::List, vec![], false));
        let one = allocator.alloc(Datum::Int(1));
        call_list_method(&mut allocator, list, "append", &[one]).unwrap();
        let count = call_list_method(&mut allocator, list, "count", &[]).unwrap();
        assert_eq!(allocator.get_datum(&count).unwrap().int_value().unwrap(), 1);
    }

    #[test]
    fn get_at_out_of_bounds_errors() {
        let mut allocator = DatumAllocator::new();
        let list = allocator.alloc(Datum::List(DatumType::List, vec![], false));
        let idx = allocator.alloc(Datum::Int(1));
        let err = call_list_method(&mut allocator, list, "getAt", &[idx]);
        assert!(err.is_err());
    }

    #[test]
    fn prop_list_seta_and_geta() {
        let mut allocator = DatumAllocator::new();
        let plist = allocator.alloc(Datum::PropList(vec![], false));
        let key = allocator.alloc(Datum::Symbol("x".to_string()));
        let value = allocator.alloc(Datum::Int(42));
        call_prop_list_method(&mut allocator, plist, "setaProp", &[key, value]).unwrap();
        let got = call_prop_list_method(&mut allocator, plist, "getaProp", &[key]).unwrap();
        assert_eq!(allocator.get_datum(&got).unwrap().int_value().unwrap(), 42);
    }
}
