//! §8 scenario 4: two variables bound to the same list observe each other's
//! mutations, driven through real `PushList`/`ObjCall` bytecode rather than
//! manipulating the allocator directly.

mod common;

use lingo_runtime::director::chunks::handler::Bytecode;
use lingo_runtime::director::lingo::opcode::OpCode;
use lingo_runtime::runtime::builtins::NullMessageSink;
use lingo_runtime::runtime::vm::call_handler;

#[test]
fn list_aliasing_is_observed_through_addat() {
    // l = [1, 2]
    // l2 = l
    // addAt(l, 1, 0)
    // return getAt(l2, 1)
    let names = vec!["l", "l2", "addAt", "getAt", "aliasTest"];
    let bytecode = vec![
        Bytecode::new(OpCode::PushInt8, 1, 0),
        Bytecode::new(OpCode::PushInt8, 2, 1),
        Bytecode::new(OpCode::PushArgList, 2, 2),
        Bytecode::new(OpCode::PushList, 0, 3),
        Bytecode::new(OpCode::SetLocal, 0, 4), // l = [1, 2]
        Bytecode::new(OpCode::GetLocal, 0, 5),
        Bytecode::new(OpCode::SetLocal, 1, 6), // l2 = l (same handle)
        Bytecode::new(OpCode::GetLocal, 0, 7), // target: l
        Bytecode::new(OpCode::PushInt8, 1, 8), // index
        Bytecode::new(OpCode::PushInt8, 0, 9), // value
        Bytecode::new(OpCode::PushArgList, 3, 10),
        Bytecode::new(OpCode::ObjCall, 2, 11), // addAt(l, 1, 0)
        Bytecode::new(OpCode::Pop, 1, 12),
        Bytecode::new(OpCode::GetLocal, 1, 13), // target: l2
        Bytecode::new(OpCode::PushInt8, 1, 14), // index
        Bytecode::new(OpCode::PushArgList, 2, 15),
        Bytecode::new(OpCode::ObjCall, 3, 16), // getAt(l2, 1)
        Bytecode::new(OpCode::Ret, 0, 17),
    ];
    let mut runtime = common::handler_runtime(names, "aliasTest", vec![], bytecode, vec![0, 1]);
    let result =
        call_handler(&mut runtime, common::SCRIPT_REF, "aliasTest", None, vec![], &mut NullMessageSink).unwrap();
    assert_eq!(runtime.allocator.get_datum(&result).unwrap().int_value().unwrap(), 0);
}
