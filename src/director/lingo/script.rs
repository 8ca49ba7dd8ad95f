use crate::director::chunks::{lctx::ScriptContextChunk, script_names::ScriptNamesChunk};
use crate::director::utils::get_variable_multiplier;

/// Name table and variable encoding shared by the scripts of one context.
#[derive(Clone, Debug, Default)]
pub struct ScriptContext {
    pub names: Vec<String>,
    pub capital_x: bool,
    pub script_section_ids: Vec<i32>,
}

impl ScriptContext {
    pub fn new(names: &ScriptNamesChunk, context: Option<&ScriptContextChunk>, capital_x: bool) -> ScriptContext {
        ScriptContext {
            names: names.names.clone(),
            capital_x,
            script_section_ids: context
                .map(|c| c.script_section_ids().collect())
                .unwrap_or_default(),
        }
    }

    pub fn get_name(&self, id: i64) -> Option<&str> {
        usize::try_from(id)
            .ok()
            .and_then(|id| self.names.get(id))
            .map(String::as_str)
    }

    pub fn variable_multiplier(&self, dir_version: u16) -> u32 {
        get_variable_multiplier(self.capital_x, dir_version)
    }
}
