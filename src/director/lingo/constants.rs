use super::opcode::OpCode;

pub fn get_opcode_name(opcode: &OpCode) -> String {
  match opcode {
    OpCode::Invalid => "invalid",

    // single-byte
    OpCode::Ret => "ret",
    OpCode::RetFactory => "retfactory",
    OpCode::Mul => "mul",
    OpCode::PushZero => "pushzero",
    OpCode::Add => "add",
    OpCode::Sub => "sub",
    OpCode::Div => "div",
    OpCode::Mod => "mod",
    OpCode::Inv => "inv",
    OpCode::JoinStr => "joinstr",
    OpCode::JoinPadStr => "joinpadstr",
    OpCode::Lt => "lt",
    OpCode::LtEq => "lteq",
    OpCode::NtEq => "nteq",
    OpCode::Eq => "eq",
    OpCode::Gt => "gt",
    OpCode::GtEq => "gteq",
    OpCode::And => "and",
    OpCode::Or => "or",
    OpCode::Not => "not",
    OpCode::ContainsStr => "containsstr",
    OpCode::Contains0Str => "contains0str",
    OpCode::GetChunk => "getchunk",
    OpCode::HiliteChunk => "hilitechunk",
    OpCode::OntoSpr => "ontospr",
    OpCode::IntoSpr => "intospr",
    OpCode::GetField => "getfield",
    OpCode::StartTell => "starttell",
    OpCode::EndTell => "endtell",
    OpCode::PushList => "pushlist",
    OpCode::PushPropList => "pushproplist",
    OpCode::Swap => "swap",
    OpCode::CallJavaScript => "calljavascript",

    // multi-byte
    OpCode::PushInt8 => "pushint8",
    OpCode::PushArgListNoRet => "pusharglistnoret",
    OpCode::PushArgList => "pusharglist",
    OpCode::PushCons => "pushcons",
    OpCode::PushSymb => "pushsymb",
    OpCode::PushVarRef => "pushvarref",
    OpCode::GetGlobal2 => "getglobal2",
    OpCode::GetGlobal => "getglobal",
    OpCode::GetProp => "getprop",
    OpCode::GetParam => "getparam",
    OpCode::GetLocal => "getlocal",
    OpCode::SetGlobal2 => "setglobal2",
    OpCode::SetGlobal => "setglobal",
    OpCode::SetProp => "setprop",
    OpCode::SetParam => "setparam",
    OpCode::SetLocal => "setlocal",
    OpCode::Jmp => "jmp",
    OpCode::EndRepeat => "endrepeat",
    OpCode::JmpIfZ => "jmpifz",
    OpCode::LocalCall => "localcall",
    OpCode::ExtCall => "extcall",
    OpCode::ObjCallV4 => "objcallv4",
    OpCode::Put => "put",
    OpCode::PutChunk => "putchunk",
    OpCode::DeleteChunk => "deletechunk",
    OpCode::Get => "get",
    OpCode::Set => "set",
    OpCode::GetMovieProp => "getmovieprop",
    OpCode::SetMovieProp => "setmovieprop",
    OpCode::GetObjProp => "getobjprop",
    OpCode::SetObjProp => "setobjprop",
    OpCode::TellCall => "tellcall",
    OpCode::Peek => "peek",
    OpCode::Pop => "pop",
    OpCode::TheBuiltin => "thebuiltin",
    OpCode::ObjCall => "objcall",
    OpCode::PushChunkVarRef => "pushchunkvarref",
    OpCode::PushInt16 => "pushint16",
    OpCode::PushInt32 => "pushint32",
    OpCode::GetChainedProp => "getchainedprop",
    OpCode::PushFloat32 => "pushfloat32",
    OpCode::GetTopLevelProp => "gettoplevelprop",
    OpCode::NewObj => "newobj",
  }
  .to_owned()
}

/// Normalizes the raw opcode byte the way `HandlerRecord::read_data` does
/// before looking up its name, so callers that only have the raw byte (e.g.
/// disassembly/trace output) get the same name the decoder would have used.
pub fn opcode_name_for_raw_byte(raw: u16) -> String {
  let normalized = if raw >= 0x40 { 0x40 + raw % 0x40 } else { raw };
  match OpCode::try_from_u16(normalized) {
    Some(opcode) => get_opcode_name(&opcode),
    None => format!("unk0x{:02x}", raw),
  }
}

pub fn get_anim_prop_name(name_id: u16) -> String {
  match name_id {
    0x01 => "beepOn",
    0x02 => "buttonStyle",
    0x03 => "centerStage",
    0x04 => "checkBoxAccess",
    0x05 => "checkboxType",
    0x06 => "colorDepth",
    0x07 => "colorQD",
    0x08 => "exitLock",
    0x09 => "fixStageSize",
    0x0a => "fullColorPermit",
    0x0b => "imageDirect",
    0x0c => "doubleClick",
    0x0d => "key",
    0x0e => "lastClick",
    0x0f => "lastEvent",
    0x10 => "keyCode",
    0x11 => "lastKey",
    0x12 => "lastRoll",
    0x13 => "timeoutLapsed",
    0x14 => "multiSound",
    0x15 => "pauseState",
    0x16 => "quickTimePresent",
    0x17 => "selEnd",
    0x18 => "selStart",
    0x19 => "soundEnabled",
    0x1a => "soundLevel",
    0x1b => "stageColor",
    // 0x1c indicates dontPassEvent was called.
    // It doesn't seem to have a Lingo-accessible name.
    0x1d => "switchColorDepth",
    0x1e => "timeoutKeyDown",
    0x1f => "timeoutLength",
    0x20 => "timeoutMouse",
    0x21 => "timeoutPlay",
    0x22 => "timer",
    0x23 => "preLoadRAM",
    0x24 => "videoForWindowsPresent",
    0x25 => "netPresent",
    0x26 => "safePlayer",
    0x27 => "soundKeepDevice",
    0x28 => "soundMixMedia",
    _ => "",
  }
  .to_owned()
}

pub fn get_anim2_prop_name(name_id: u16) -> String {
  match name_id {
    0x01 => "perFramework",
    0x02 => "number of castMembers",
    0x03 => "number of menus",
    0x04 => "number of castLibs",
    0x05 => "number of xtras",
    _ => "",
  }
  .to_owned()
}

pub fn get_movie_prop_name(name_id: u16) -> String {
  match name_id {
    0x00 => "floatPrecision",
    0x01 => "mouseDownScript",
    0x02 => "mouseUpScript",
    0x03 => "keyDownScript",
    0x04 => "keyUpScript",
    0x05 => "timeoutScript",
    0x06 => "short time",
    0x07 => "abbr time",
    0x08 => "long time",
    0x09 => "short date",
    0x0a => "abbr date",
    0x0b => "long date",
    _ => "",
  }
  .to_owned()
}
