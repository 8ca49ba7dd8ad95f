pub mod ast;
pub mod code_writer;
pub mod enums;
pub mod handler;
