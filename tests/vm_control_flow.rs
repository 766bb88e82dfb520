//! §8 scenario 3: a backward-branch loop (`EndRepeat`) counting a local
//! variable up to 3, driven through the real opcode dispatch loop.

mod common;

use lingo_runtime::director::chunks::handler::Bytecode;
use lingo_runtime::director::lingo::opcode::OpCode;
use lingo_runtime::runtime::builtins::NullMessageSink;
use lingo_runtime::runtime::vm::call_handler;

#[test]
fn backward_branch_loop_counts_local_to_three() {
    // i = 0
    // loop: i = i + 1
    //       if not (i < 3) goto exit
    //       goto loop
    // exit: return i
    let bytecode = vec![
        Bytecode::new(OpCode::PushZero, 0, 0),
        Bytecode::new(OpCode::SetLocal, 0, 1),
        Bytecode::new(OpCode::GetLocal, 0, 2), // loop top
        Bytecode::new(OpCode::PushInt8, 1, 3),
        Bytecode::new(OpCode::Add, 0, 4),
        Bytecode::new(OpCode::SetLocal, 0, 5),
        Bytecode::new(OpCode::GetLocal, 0, 6),
        Bytecode::new(OpCode::PushInt8, 3, 7),
        Bytecode::new(OpCode::Lt, 0, 8),
        Bytecode::new(OpCode::JmpIfZ, 2, 9),   // 9 + 2 = 11 (exit)
        Bytecode::new(OpCode::EndRepeat, 8, 10), // 10 - 8 = 2 (loop top)
        Bytecode::new(OpCode::GetLocal, 0, 11), // exit
        Bytecode::new(OpCode::Ret, 0, 12),
    ];
    let mut runtime = common::handler_runtime(vec!["i", "countTo3"], "countTo3", vec![], bytecode, vec![0]);
    let result = call_handler(&mut runtime, common::SCRIPT_REF, "countTo3", None, vec![], &mut NullMessageSink).unwrap();
    assert_eq!(runtime.allocator.get_datum(&result).unwrap().int_value().unwrap(), 3);
}
