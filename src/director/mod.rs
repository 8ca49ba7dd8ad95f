pub mod afterburner;
pub mod cast;
pub mod chunks;
pub mod compression;
pub mod enums;
pub mod errors;
pub mod file;
pub mod guid;
pub mod lingo;
pub mod map;
pub mod payload;
pub mod rifx;
pub mod utils;

#[cfg(test)]
pub mod test_writer;
