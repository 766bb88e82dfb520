//! §8 scenario 5: a prop-list key set with one symbol case and read back
//! with another, driven through real `PushPropList`/`ObjCall` bytecode.

mod common;

use lingo_runtime::director::chunks::handler::Bytecode;
use lingo_runtime::director::lingo::datum::Datum;
use lingo_runtime::director::lingo::opcode::OpCode;
use lingo_runtime::runtime::builtins::NullMessageSink;
use lingo_runtime::runtime::vm::call_handler;

#[test]
fn proplist_property_lookup_is_case_insensitive() {
    // p = [:]
    // addProp(p, #Name, "x")
    // return getProp(p, #NAME)
    let names = vec!["p", "addProp", "getProp", "Name", "NAME", "caseTest"];
    let literals = vec![Datum::String("x".to_string())];
    let bytecode = vec![
        Bytecode::new(OpCode::PushArgList, 0, 0),
        Bytecode::new(OpCode::PushPropList, 0, 1), // p = [:]
        Bytecode::new(OpCode::SetLocal, 0, 2),
        Bytecode::new(OpCode::GetLocal, 0, 3), // target: p
        Bytecode::new(OpCode::PushSymb, 3, 4), // #Name
        Bytecode::new(OpCode::PushCons, 0, 5), // "x"
        Bytecode::new(OpCode::PushArgList, 3, 6),
        Bytecode::new(OpCode::ObjCall, 1, 7), // addProp(p, #Name, "x")
        Bytecode::new(OpCode::Pop, 1, 8),
        Bytecode::new(OpCode::GetLocal, 0, 9), // target: p
        Bytecode::new(OpCode::PushSymb, 4, 10), // #NAME
        Bytecode::new(OpCode::PushArgList, 2, 11),
        Bytecode::new(OpCode::ObjCall, 2, 12), // getProp(p, #NAME)
        Bytecode::new(OpCode::Ret, 0, 13),
    ];
    let mut runtime = common::handler_runtime(names, "caseTest", literals, bytecode, vec![0]);
    let result =
        call_handler(&mut runtime, common::SCRIPT_REF, "caseTest", None, vec![], &mut NullMessageSink).unwrap();
    assert_eq!(runtime.allocator.get_datum(&result).unwrap().string_value().unwrap(), "x");
}
