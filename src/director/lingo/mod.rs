pub mod constants;
pub mod datum;
pub mod opcode;
pub mod script;
