//! §8 scenarios 1 and 2: integer arithmetic and int/float promotion through
//! the real stack machine, with no receiver and no chunk-parsed movie.

mod common;

use lingo_runtime::director::chunks::handler::Bytecode;
use lingo_runtime::director::lingo::opcode::OpCode;
use lingo_runtime::runtime::builtins::NullMessageSink;
use lingo_runtime::runtime::vm::call_handler;

#[test]
fn pushing_and_adding_two_ints_stays_int() {
    let bytecode = vec![
        Bytecode::new(OpCode::PushInt8, 3, 0),
        Bytecode::new(OpCode::PushInt8, 4, 1),
        Bytecode::new(OpCode::Add, 0, 2),
        Bytecode::new(OpCode::Ret, 0, 3),
    ];
    let mut runtime = common::handler_runtime(vec!["add"], "add", vec![], bytecode, vec![]);
    let result = call_handler(&mut runtime, common::SCRIPT_REF, "add", None, vec![], &mut NullMessageSink).unwrap();
    assert_eq!(runtime.allocator.get_datum(&result).unwrap().int_value().unwrap(), 5);
    assert!(matches!(runtime.allocator.get_datum(&result).unwrap(), lingo_runtime::director::lingo::datum::Datum::Int(5)));
}

#[test]
fn adding_an_int_and_a_float_promotes_to_float() {
    let three_point_oh: i64 = 3.0f32.to_bits() as i64;
    let bytecode = vec![
        Bytecode::new(OpCode::PushInt8, 2, 0),
        Bytecode::new(OpCode::PushFloat32, three_point_oh, 1),
        Bytecode::new(OpCode::Add, 0, 2),
        Bytecode::new(OpCode::Ret, 0, 3),
    ];
    let mut runtime = common::handler_runtime(vec!["addFloat"], "addFloat", vec![], bytecode, vec![]);
    let result = call_handler(&mut runtime, common::SCRIPT_REF, "addFloat", None, vec![], &mut NullMessageSink).unwrap();
    let datum = runtime.allocator.get_datum(&result).unwrap();
    match datum {
        lingo_runtime::director::lingo::datum::Datum::Float(f) => assert_eq!(*f, 5.0),
        other => panic!("expected a float, got {:?}", other.type_str()),
    }
}
