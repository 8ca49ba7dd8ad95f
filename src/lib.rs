pub mod director;
pub mod io;
pub mod js_api;
pub mod utils;

pub use director::{
    cast::{ScriptEntry, ScriptInfoLayout},
    chunks::{ResourceContainer, ResourceEntry},
    enums::ScriptFormat,
    errors::FatalError,
    file::{DirectorFile, LineEnding, ReadOptions},
};
