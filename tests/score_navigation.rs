//! §8 scenario 6: `goToLabel` resolves a frame label and the next tick lands
//! on it, firing the movie script's `enterFrame` handler along the way.

mod common;

use lingo_runtime::director::chunks::handler::{Bytecode, HandlerDef};
use lingo_runtime::director::lingo::datum::Datum;
use lingo_runtime::director::lingo::opcode::OpCode;
use lingo_runtime::runtime::config::RuntimeConfig;
use lingo_runtime::runtime::score::{Frame, FrameLabel, Score};
use lingo_runtime::Player;

#[test]
fn go_to_label_lands_on_labeled_frame_and_fires_enter_frame() {
    let names = vec!["hits", "enterFrame"];
    let bytecode = vec![
        Bytecode::new(OpCode::PushInt8, 1, 0),
        Bytecode::new(OpCode::SetGlobal, 0, 1), // hits = 1
        Bytecode::new(OpCode::Ret, 0, 2),
    ];
    let handler_name_id = 1u16; // "enterFrame"
    let handler = HandlerDef::from_instructions(handler_name_id, bytecode, vec![]);
    let mut runtime = common::single_script_runtime(names, vec![], vec![handler]);
    runtime.score = Score {
        frames: vec![Frame::default(); 10],
        frame_intervals: vec![],
        labels: vec![
            FrameLabel { frame_num: 5, name: "intro".to_string() },
            FrameLabel { frame_num: 10, name: "main".to_string() },
        ],
    };

    let mut player = Player::new(RuntimeConfig::default());
    player.runtime = runtime;
    player.play();
    player.go_to_label("main");
    player.tick().unwrap();

    assert_eq!(player.current_frame(), 10);
    let hits_ref = *player.runtime.globals.get("hits").expect("enterFrame handler should have set \"hits\"");
    let hits = player.runtime.allocator.get_datum(&hits_ref).unwrap();
    assert!(matches!(hits, Datum::Int(1)));
}
