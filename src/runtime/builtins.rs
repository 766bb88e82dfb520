//! The global builtin-handler registry (§4.2): flat Lingo functions like
//! `put`, `random`, `integer`, `offset` that aren't reached through
//! `objCall` on a particular datum. Grounded on the teacher's
//! `handlers/manager.rs` dispatch table and its `handlers/string.rs` /
//! `handlers/types.rs` implementations, minus anything tied to a JS host
//! (`JsApi`, `puppetSprite` stage wiring) — those move to the score player
//! and the host-facing API instead.

use rand::Rng;

use crate::director::lingo::datum::{datum_bool, Datum, DatumType};
use crate::runtime::allocator::DatumAllocator;
use crate::runtime::cast_lib::cast_member_ref;
use crate::runtime::datum_ref::DatumRef;
use crate::runtime::error::{RuntimeError, RuntimeResult};
use crate::runtime::movie::Runtime;
use crate::runtime::scope::Scope;

/// Emitted by the `put` builtin instead of writing to stdout, so the host
/// decides where a Lingo `put` statement's text actually goes (§10's
/// ambient logging requirement covers the runtime's own diagnostics; this
/// is movie-authored output, kept distinct).
pub trait MessageSink {
    fn put_line(&mut self, line: &str);
}

pub struct NullMessageSink;
impl MessageSink for NullMessageSink {
    fn put_line(&mut self, line: &str) {
        log::debug!("put: {}", line);
    }
}

/// A host-registered replacement for a named builtin (§6's `registerBuiltin`).
pub type BuiltinOverride =
    Box<dyn Fn(&[DatumRef], &mut Runtime, &mut dyn MessageSink) -> RuntimeResult<DatumRef>>;

fn arg(args: &[DatumRef], i: usize) -> RuntimeResult<&DatumRef> {
    args.get(i).ok_or(RuntimeError::StackUnderflow)
}

fn format_datum(allocator: &DatumAllocator, r: &DatumRef) -> String {
    match allocator.get_datum(r) {
        Ok(Datum::Int(i)) => i.to_string(),
        Ok(Datum::Float(f)) => f.to_string(),
        Ok(Datum::String(s)) => s.clone(),
        Ok(Datum::Symbol(s)) => format!("#{}", s),
        Ok(Datum::Void) => "<Void>".to_string(),
        _ => "<Object>".to_string(),
    }
}

/// Name-dispatched call into a global builtin. `sink` receives `put` output.
/// Takes the whole `Runtime` (not just the allocator) because the
/// navigation builtins (`go`, `play`, `stop`, `pause`, `puppetTempo`) and
/// `pass` mutate movie/scope state outside the datum arena.
pub fn call_builtin(
    name: &str,
    args: &[DatumRef],
    runtime: &mut Runtime,
    sink: &mut dyn MessageSink,
) -> RuntimeResult<DatumRef> {
    if let Some(overridden) = runtime.builtin_overrides.remove(name) {
        let result = overridden(args, runtime, sink);
        runtime.builtin_overrides.insert(name.to_string(), overridden);
        return result;
    }
    let allocator = &mut runtime.allocator;
    match name {
        "param" => {
            let n = allocator.get_datum(arg(args, 0)?)?.int_value()?;
            let idx = (n - 1).max(0) as usize;
            let scope = runtime.scopes.last().ok_or(RuntimeError::StackUnderflow)?;
            return Ok(scope.args.get(idx).copied().unwrap_or(DatumRef::Void));
        }
        "count" => {
            let d = allocator.get_datum(arg(args, 0)?)?;
            let n = match d {
                Datum::List(_, items, _) => items.len(),
                Datum::PropList(items, _) => items.len(),
                _ => return Err(RuntimeError::TypeMismatch { expected: "list".to_string(), found: d.type_str() }),
            };
            return Ok(allocator.alloc(Datum::Int(n as i32)));
        }
        "getAt" => {
            let d = allocator.get_datum(arg(args, 0)?)?;
            let index = allocator.get_datum(arg(args, 1)?)?.int_value()? as usize;
            return match d {
                Datum::List(_, items, _) => items.get(index.wrapping_sub(1)).copied().ok_or(RuntimeError::IndexOutOfBounds { index: index as i32, len: items.len() }),
                Datum::PropList(items, _) => items.get(index.wrapping_sub(1)).map(|(_, v)| *v).ok_or(RuntimeError::IndexOutOfBounds { index: index as i32, len: items.len() }),
                other => Err(RuntimeError::TypeMismatch { expected: "list".to_string(), found: other.type_str() }),
            };
        }
        "put" => {
            let mut parts = Vec::with_capacity(args.len());
            for a in args {
                parts.push(format_datum(allocator, a));
            }
            sink.put_line(&parts.join(" "));
            return Ok(DatumRef::Void);
        }
        "random" => {
            let max = allocator.get_datum(arg(args, 0)?)?.int_value()? - 1;
            if max < 0 {
                return Err(RuntimeError::ArithmeticError { reason: "random: max must be >= 0".to_string() });
            }
            let mut rng = rand::rng();
            let roll: i32 = rng.random_range(0..=max);
            return Ok(allocator.alloc(Datum::Int(roll + 1)));
        }
        "bitAnd" => return binop_int(args, allocator, |a, b| a & b),
        "bitOr" => return binop_int(args, allocator, |a, b| a | b),
        "bitXor" => return binop_int(args, allocator, |a, b| a ^ b),
        "abs" => {
            let d = allocator.get_datum(arg(args, 0)?)?;
            return Ok(match d {
                Datum::Int(i) => allocator.alloc(Datum::Int(i.wrapping_abs())),
                Datum::Float(f) => allocator.alloc(Datum::Float(f.abs())),
                other => return Err(RuntimeError::TypeMismatch { expected: "number".to_string(), found: other.type_str() }),
            });
        }
        "power" => {
            let base = allocator.get_datum(arg(args, 0)?)?.to_float()?;
            let exp = allocator.get_datum(arg(args, 1)?)?.to_float()?;
            return Ok(allocator.alloc(Datum::Float(base.powf(exp))));
        }
        "sqrt" => {
            let v = allocator.get_datum(arg(args, 0)?)?.to_float()?;
            return Ok(allocator.alloc(Datum::Float(v.sqrt())));
        }
        "pi" => return Ok(allocator.alloc(Datum::Float(std::f32::consts::PI))),
        "sin" => return unary_float(args, allocator, f32::sin),
        "cos" => return unary_float(args, allocator, f32::cos),
        "min" => return fold_numeric(args, allocator, f32::min),
        "max" => return fold_numeric(args, allocator, f32::max),
        "integer" => {
            let d = allocator.get_datum(arg(args, 0)?)?;
            let v = match d {
                Datum::Int(i) => *i,
                Datum::Float(f) => f.round() as i32,
                Datum::String(s) => s.trim().parse::<f32>().map(|f| f.round() as i32).map_err(|_| RuntimeError::TypeMismatch { expected: "number".to_string(), found: s.clone() })?,
                other => return Err(RuntimeError::TypeMismatch { expected: "number".to_string(), found: other.type_str() }),
            };
            return Ok(allocator.alloc(Datum::Int(v)));
        }
        "float" => {
            let v = allocator.get_datum(arg(args, 0)?)?.to_float()?;
            return Ok(allocator.alloc(Datum::Float(v)));
        }
        "string" => {
            let s = format_datum(allocator, arg(args, 0)?);
            return Ok(allocator.alloc(Datum::String(s)));
        }
        "symbol" => {
            let s = allocator.get_datum(arg(args, 0)?)?.string_value()?;
            return Ok(allocator.alloc(Datum::Symbol(s)));
        }
        "value" => {
            let s = allocator.get_datum(arg(args, 0)?)?.string_value()?;
            return Ok(parse_lingo_value(&s, allocator));
        }
        "void" | "nothing" => return Ok(DatumRef::Void),
        "objectp" => return Ok(bool_datum(allocator, matches!(allocator.get_datum(arg(args, 0)?)?, Datum::ScriptInstanceRef(_) | Datum::List(..) | Datum::PropList(..)))),
        "voidp" => return Ok(bool_datum(allocator, allocator.get_datum(arg(args, 0)?)?.is_void())),
        "listp" => return Ok(bool_datum(allocator, allocator.get_datum(arg(args, 0)?)?.is_list())),
        "symbolp" => return Ok(bool_datum(allocator, allocator.get_datum(arg(args, 0)?)?.is_symbol())),
        "stringp" => return Ok(bool_datum(allocator, allocator.get_datum(arg(args, 0)?)?.is_string())),
        "integerp" => return Ok(bool_datum(allocator, allocator.get_datum(arg(args, 0)?)?.is_int())),
        "floatp" => return Ok(bool_datum(allocator, matches!(allocator.get_datum(arg(args, 0)?)?, Datum::Float(_)))),
        "ilk" => {
            let type_str = allocator.get_datum(arg(args, 0)?)?.type_enum().type_str();
            return Ok(allocator.alloc(Datum::Symbol(type_str)));
        }
        "length" => {
            let s = allocator.get_datum(arg(args, 0)?)?.string_value()?;
            return Ok(allocator.alloc(Datum::Int(s.chars().count() as i32)));
        }
        "space" => return Ok(allocator.alloc(Datum::String(" ".to_string()))),
        "offset" => {
            let needle = allocator.get_datum(arg(args, 0)?)?.string_value()?;
            let haystack = allocator.get_datum(arg(args, 1)?)?.string_value()?;
            let pos = haystack.find(&needle).map(|byte_idx| haystack[..byte_idx].chars().count() as i32 + 1).unwrap_or(0);
            return Ok(allocator.alloc(Datum::Int(pos)));
        }
        "charToNum" => {
            let s = allocator.get_datum(arg(args, 0)?)?.string_value()?;
            let code = s.chars().next().map(|c| c as i32).unwrap_or(0);
            return Ok(allocator.alloc(Datum::Int(code)));
        }
        "numToChar" => {
            let n = allocator.get_datum(arg(args, 0)?)?.int_value()?;
            let c = char::from_u32(n as u32).unwrap_or('\0');
            return Ok(allocator.alloc(Datum::String(c.to_string())));
        }
        "list" => {
            let items: Vec<DatumRef> = args.to_vec();
            return Ok(allocator.alloc(Datum::List(DatumType::List, items, false)));
        }
        "rgb" => {
            return if args.len() == 1 {
                let hex = allocator.get_datum(arg(args, 0)?)?.int_value()? as u32;
                Ok(allocator.alloc(Datum::ColorRef(crate::runtime::sprite::ColorRef::Rgb(((hex >> 16) & 0xFF) as u8, ((hex >> 8) & 0xFF) as u8, (hex & 0xFF) as u8))))
            } else {
                let r = allocator.get_datum(arg(args, 0)?)?.int_value()? as u8;
                let g = allocator.get_datum(arg(args, 1)?)?.int_value()? as u8;
                let b = allocator.get_datum(arg(args, 2)?)?.int_value()? as u8;
                Ok(allocator.alloc(Datum::ColorRef(crate::runtime::sprite::ColorRef::Rgb(r, g, b))))
            };
        }
        "paletteIndex" => {
            let i = allocator.get_datum(arg(args, 0)?)?.int_value()? as u8;
            return Ok(allocator.alloc(Datum::ColorRef(crate::runtime::sprite::ColorRef::PaletteIndex(i))));
        }
        "point" => {
            let x = allocator.get_datum(arg(args, 0)?)?.int_value()?;
            let y = allocator.get_datum(arg(args, 1)?)?.int_value()?;
            return Ok(allocator.alloc(Datum::IntPoint((x, y))));
        }
        "rect" => {
            let l = allocator.get_datum(arg(args, 0)?)?.int_value()?;
            let t = allocator.get_datum(arg(args, 1)?)?.int_value()?;
            let r = allocator.get_datum(arg(args, 2)?)?.int_value()?;
            let b = allocator.get_datum(arg(args, 3)?)?.int_value()?;
            return Ok(allocator.alloc(Datum::IntRect((l, t, r, b))));
        }
        "inside" => {
            let (x, y) = allocator.get_datum(arg(args, 0)?)?.to_int_point()?;
            let (l, t, r, b) = allocator.get_datum(arg(args, 1)?)?.to_int_rect()?;
            return Ok(bool_datum(allocator, x >= l && x < r && y >= t && y < b));
        }
        "intersect" => {
            let a = allocator.get_datum(arg(args, 0)?)?.to_int_rect()?;
            let b = allocator.get_datum(arg(args, 1)?)?.to_int_rect()?;
            return Ok(bool_datum(allocator, a.0 < b.2 && b.0 < a.2 && a.1 < b.3 && b.1 < a.3));
        }
        "union" => {
            let (al, at, ar, ab) = allocator.get_datum(arg(args, 0)?)?.to_int_rect()?;
            let (bl, bt, br, bb) = allocator.get_datum(arg(args, 1)?)?.to_int_rect()?;
            return Ok(allocator.alloc(Datum::IntRect((al.min(bl), at.min(bt), ar.max(br), ab.max(bb)))));
        }
        "member" => return reference_member(args, runtime),
        "sprite" => {
            let n = runtime.allocator.get_datum(arg(args, 0)?)?.int_value()?;
            return Ok(runtime.allocator.alloc(Datum::SpriteRef(n as i16)));
        }
        "sound" => {
            let n = runtime.allocator.get_datum(arg(args, 0)?)?.int_value()?;
            return Ok(runtime.allocator.alloc(Datum::SoundChannel(n as u16)));
        }
        "castLib" => return reference_cast_lib(args, runtime),
        "script" => return reference_script(args, runtime),
        "pass" => {
            runtime.current_scope_mut()?.passed = true;
            return Ok(DatumRef::Void);
        }
        "go" => return nav_go(args, runtime),
        "play" => {
            runtime.movie.playing = true;
            runtime.movie.script_paused = false;
            if !args.is_empty() {
                return nav_go(args, runtime);
            }
            return Ok(DatumRef::Void);
        }
        "stop" => {
            runtime.movie.playing = false;
            return Ok(DatumRef::Void);
        }
        "pause" => {
            runtime.movie.script_paused = true;
            return Ok(DatumRef::Void);
        }
        "updateStage" => {
            log::debug!("updateStage: yield point reached (no-op without a host render loop)");
            return Ok(DatumRef::Void);
        }
        "puppetTempo" => {
            let n = runtime.allocator.get_datum(arg(args, 0)?)?.int_value()?;
            runtime.movie.tempo = runtime.config.clamp_tempo(n);
            return Ok(DatumRef::Void);
        }
        _ => {}
    }
    Err(RuntimeError::UndefinedHandler { name: name.to_string() })
}

fn reference_member(args: &[DatumRef], runtime: &mut Runtime) -> RuntimeResult<DatumRef> {
    let first = runtime.allocator.get_datum(arg(args, 0)?)?.clone();
    let cast_lib = match args.get(1) {
        Some(r) => runtime.allocator.get_datum(r)?.int_value()?,
        None => 0,
    };
    let member_ref = match first {
        Datum::Int(n) if cast_lib > 0 => cast_member_ref(cast_lib, n),
        Datum::Int(n) => runtime.cast_registry.find_member_ref_by_number(n as u32).unwrap_or(cast_member_ref(1, n)),
        Datum::String(name) | Datum::Symbol(name) => {
            runtime.cast_registry.find_member_ref_by_name(&name).unwrap_or(crate::runtime::cast_lib::INVALID_CAST_MEMBER_REF)
        }
        other => return Err(RuntimeError::TypeMismatch { expected: "member number or name".to_string(), found: other.type_str() }),
    };
    Ok(runtime.allocator.alloc(Datum::CastMember(member_ref)))
}

fn reference_cast_lib(args: &[DatumRef], runtime: &mut Runtime) -> RuntimeResult<DatumRef> {
    let first = runtime.allocator.get_datum(arg(args, 0)?)?.clone();
    let number = match first {
        Datum::Int(n) => n as u32,
        Datum::String(name) | Datum::Symbol(name) => {
            runtime.cast_registry.get_cast_by_name(&name).map(|c| c.number).unwrap_or(0)
        }
        other => return Err(RuntimeError::TypeMismatch { expected: "cast lib number or name".to_string(), found: other.type_str() }),
    };
    Ok(runtime.allocator.alloc(Datum::CastLib(number)))
}

fn reference_script(args: &[DatumRef], runtime: &mut Runtime) -> RuntimeResult<DatumRef> {
    let first = runtime.allocator.get_datum(arg(args, 0)?)?.clone();
    let member_ref = match first {
        Datum::Int(n) => runtime.cast_registry.find_member_ref_by_number(n as u32).unwrap_or(crate::runtime::cast_lib::INVALID_CAST_MEMBER_REF),
        Datum::String(name) | Datum::Symbol(name) => {
            runtime.cast_registry.find_member_ref_by_name(&name).unwrap_or(crate::runtime::cast_lib::INVALID_CAST_MEMBER_REF)
        }
        other => return Err(RuntimeError::TypeMismatch { expected: "script number or name".to_string(), found: other.type_str() }),
    };
    Ok(runtime.allocator.alloc(Datum::ScriptRef(member_ref)))
}

/// `go(frame)` / `go(label)` (§4.5 `goToFrame`/`goToLabel`, exposed to
/// scripts as the single `go` builtin). Unknown labels are a warning, not an
/// error — matches `Score::resolve_label`'s contract.
fn nav_go(args: &[DatumRef], runtime: &mut Runtime) -> RuntimeResult<DatumRef> {
    let target = runtime.allocator.get_datum(arg(args, 0)?)?.clone();
    let frame_num = match target {
        Datum::Int(n) => Some(n),
        Datum::Float(f) => Some(f as i32),
        Datum::String(s) | Datum::Symbol(s) => {
            let resolved = runtime.score.resolve_label(&s);
            if resolved.is_none() {
                log::warn!("go: unknown frame label \"{}\"", s);
            }
            resolved
        }
        other => return Err(RuntimeError::TypeMismatch { expected: "frame number or label".to_string(), found: other.type_str() }),
    };
    if let Some(n) = frame_num {
        runtime.movie.next_frame = Some(n);
    }
    Ok(DatumRef::Void)
}

/// Parses a Lingo literal the way `value()` does: numbers, `#symbol`,
/// quoted strings, `[...]`/`[:]` list and prop-list literals, and the four
/// bareword constants. Anything else (including a handler-call expression —
/// `value()` only ever sees its argument as inert text, it doesn't compile
/// Lingo) yields void.
fn parse_lingo_value(input: &str, allocator: &mut DatumAllocator) -> DatumRef {
    let trimmed = input.trim();
    match parse_value_token(trimmed, allocator) {
        Some((datum, rest)) if rest.trim().is_empty() => allocator.alloc(datum),
        _ => DatumRef::Void,
    }
}

fn parse_value_token<'a>(s: &'a str, allocator: &mut DatumAllocator) -> Option<(Datum, &'a str)> {
    let s = s.trim_start();
    if let Some(rest) = s.strip_prefix('[') {
        return parse_list_or_prop_list(rest, allocator);
    }
    if let Some(rest) = s.strip_prefix('"') {
        let end = rest.find('"')?;
        return Some((Datum::String(rest[..end].to_string()), &rest[end + 1..]));
    }
    if let Some(rest) = s.strip_prefix('#') {
        let end = rest.find(|c: char| !(c.is_alphanumeric() || c == '_')).unwrap_or(rest.len());
        if end == 0 {
            return None;
        }
        return Some((Datum::Symbol(rest[..end].to_string()), &rest[end..]));
    }
    let end = s.find(|c: char| !(c.is_alphanumeric() || c == '.' || c == '-' || c == '+')).unwrap_or(s.len());
    if end == 0 {
        return None;
    }
    let token = &s[..end];
    let rest = &s[end..];
    match token.to_ascii_uppercase().as_str() {
        "VOID" => return Some((Datum::Void, rest)),
        "TRUE" => return Some((Datum::Int(1), rest)),
        "FALSE" => return Some((Datum::Int(0), rest)),
        "EMPTY" => return Some((Datum::String(String::new()), rest)),
        _ => {}
    }
    if let Ok(i) = token.parse::<i32>() {
        return Some((Datum::Int(i), rest));
    }
    if let Ok(f) = token.parse::<f32>() {
        return Some((Datum::Float(f), rest));
    }
    None
}

fn parse_list_or_prop_list<'a>(rest: &'a str, allocator: &mut DatumAllocator) -> Option<(Datum, &'a str)> {
    let trimmed = rest.trim_start();
    if let Some(after) = trimmed.strip_prefix(':') {
        let after = after.trim_start();
        if let Some(close) = after.strip_prefix(']') {
            return Some((Datum::PropList(vec![], false), close));
        }
    }
    let mut cursor = trimmed;
    let mut entries: Vec<DatumRef> = vec![];
    let mut keys: Vec<Option<DatumRef>> = vec![];
    loop {
        cursor = cursor.trim_start();
        if let Some(rest_after_close) = cursor.strip_prefix(']') {
            break Some((
                if keys.iter().all(|k| k.is_some()) && !keys.is_empty() {
                    Datum::PropList(keys.into_iter().map(|k| k.unwrap()).zip(entries).collect(), false)
                } else {
                    Datum::List(DatumType::List, entries, false)
                },
                rest_after_close,
            ));
        }
        let (first, after_first) = parse_value_token(cursor, allocator)?;
        let after_first = after_first.trim_start();
        if let Some(after_colon) = after_first.strip_prefix(':') {
            let (value, after_value) = parse_value_token(after_colon, allocator)?;
            keys.push(Some(allocator.alloc(first)));
            entries.push(allocator.alloc(value));
            cursor = after_value.trim_start();
        } else {
            keys.push(None);
            entries.push(allocator.alloc(first));
            cursor = after_first;
        }
        cursor = cursor.trim_start();
        if let Some(after_comma) = cursor.strip_prefix(',') {
            cursor = after_comma;
        }
    }
}

fn bool_datum(allocator: &mut DatumAllocator, v: bool) -> DatumRef {
    allocator.alloc(datum_bool(v))
}

fn binop_int(args: &[DatumRef], allocator: &mut DatumAllocator, f: impl Fn(i32, i32) -> i32) -> RuntimeResult<DatumRef> {
    let a = allocator.get_datum(arg(args, 0)?)?.int_value()?;
    let b = allocator.get_datum(arg(args, 1)?)?.int_value()?;
    Ok(allocator.alloc(Datum::Int(f(a, b))))
}

fn unary_float(args: &[DatumRef], allocator: &mut DatumAllocator, f: impl Fn(f32) -> f32) -> RuntimeResult<DatumRef> {
    let v = allocator.get_datum(arg(args, 0)?)?.to_float()?;
    Ok(allocator.alloc(Datum::Float(f(v))))
}

fn fold_numeric(args: &[DatumRef], allocator: &mut DatumAllocator, f: impl Fn(f32, f32) -> f32) -> RuntimeResult<DatumRef> {
    let mut acc = allocator.get_datum(arg(args, 0)?)?.to_float()?;
    let mut all_int = matches!(allocator.get_datum(arg(args, 0)?)?, Datum::Int(_));
    for a in &args[1..] {
        let v = allocator.get_datum(a)?;
        all_int = all_int && matches!(v, Datum::Int(_));
        acc = f(acc, v.to_float()?);
    }
    Ok(if all_int { allocator.alloc(Datum::Int(acc as i32)) } else { allocator.alloc(Datum::Float(acc)) })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::config::RuntimeConfig;

    fn runtime() -> Runtime {
        Runtime::new(RuntimeConfig::default())
    }

    #[test]
    fn integer_rounds_floats() {
        let mut runtime = runtime();
        let f = runtime.allocator.alloc(Datum::Float(3.7));
        let result = call_builtin("integer", &[f], &mut runtime, &mut NullMessageSink).unwrap();
        assert_eq!(runtime.allocator.get_datum(&result).unwrap().int_value().unwrap(), 4);
    }

    #[test]
    fn random_is_in_range() {
        let mut runtime = runtime();
        let max = runtime.allocator.alloc(Datum::Int(6));
        let result = call_builtin("random", &[max], &mut runtime, &mut NullMessageSink).unwrap();
        let v = runtime.allocator.get_datum(&result).unwrap().int_value().unwrap();
        assert!((1..=6).contains(&v));
    }

    #[test]
    fn unknown_name_errors() {
        let mut runtime = runtime();
        let result = call_builtin("notARealBuiltin", &[], &mut runtime, &mut NullMessageSink);
        assert!(result.is_err());
    }

    #[test]
    fn value_parses_int_float_and_symbol() {
        let mut runtime = runtime();
        let s = runtime.allocator.alloc(Datum::String("42".to_string()));
        let result = call_builtin("value", &[s], &mut runtime, &mut NullMessageSink).unwrap();
        assert_eq!(runtime.allocator.get_datum(&result).unwrap().int_value().unwrap(), 42);

        let s = runtime.allocator.alloc(Datum::String("#foo".to_string()));
        let result = call_builtin("value", &[s], &mut runtime, &mut NullMessageSink).unwrap();
        assert_eq!(runtime.allocator.get_datum(&result).unwrap().symbol_value().unwrap(), "foo");

        let s = runtime.allocator.alloc(Datum::String("not a literal".to_string()));
        let result = call_builtin("value", &[s], &mut runtime, &mut NullMessageSink).unwrap();
        assert_eq!(result, DatumRef::Void);
    }

    #[test]
    fn value_parses_list_literal() {
        let mut runtime = runtime();
        let s = runtime.allocator.alloc(Datum::String("[1, 2, 3]".to_string()));
        let result = call_builtin("value", &[s], &mut runtime, &mut NullMessageSink).unwrap();
        let items = runtime.allocator.get_datum(&result).unwrap().to_list().unwrap().clone();
        assert_eq!(items.len(), 3);
        assert_eq!(runtime.allocator.get_datum(&items[1]).unwrap().int_value().unwrap(), 2);
    }

    #[test]
    fn go_sets_next_frame_from_label() {
        use crate::runtime::score::{FrameLabel, Score};
        let mut runtime = runtime();
        runtime.score = Score { frames: vec![], frame_intervals: vec![], labels: vec![FrameLabel { frame_num: 7, name: "intro".to_string() }] };
        let scope = Scope::new(crate::runtime::cast_lib::CastMemberRef::default(), "test".to_string(), None, vec![]);
        runtime.scopes.push(scope);
        let label = runtime.allocator.alloc(Datum::String("intro".to_string()));
        call_builtin("go", &[label], &mut runtime, &mut NullMessageSink).unwrap();
        assert_eq!(runtime.movie.next_frame, Some(7));
    }

    #[test]
    fn pass_marks_current_scope() {
        let mut runtime = runtime();
        let scope = Scope::new(crate::runtime::cast_lib::CastMemberRef::default(), "test".to_string(), None, vec![]);
        runtime.scopes.push(scope);
        call_builtin("pass", &[], &mut runtime, &mut NullMessageSink).unwrap();
        assert!(runtime.current_scope().unwrap().passed);
    }
}
