pub mod constants;
pub mod datum;
pub mod decompiler;
pub mod opcode;
pub mod script;
