use js_sys::{Array, Uint8Array};
use log::debug;
use wasm_bindgen::prelude::*;

use crate::{
    director::{
        cast::{ScriptEntry, ScriptInfoLayout},
        chunks::{ResourceEntry, ResourceStorage},
        file::{DirectorFile, ReadOptions},
    },
    utils::{init_logging, set_panic_hook},
};

pub fn ascii_safe(string: &str) -> String {
    string
        .chars()
        .map(|c| match c as u32 {
            9 => '\t',
            10 => '\n',
            13 => '\r',
            32..=126 => c,
            _ => '?',
        })
        .collect()
}

pub fn safe_js_string(s: &str) -> JsValue {
    JsValue::from_str(s)
}

#[wasm_bindgen(getter_with_clone)]
pub struct DecompiledScriptData {
    pub resource_id: i32,
    pub name: String,
    pub format: String,
    pub source: String,
}

#[wasm_bindgen]
pub fn init() {
    set_panic_hook();
    init_logging();
}

fn read_movie(file_name: &str, bytes: &[u8]) -> Result<DirectorFile, JsValue> {
    DirectorFile::read(file_name, bytes, &ReadOptions::default())
        .map_err(|err| JsValue::from_str(&format!("{}: {}", file_name, err)))
}

/// Movie header fields and the flat resource table.
#[wasm_bindgen]
pub fn read_movie_resources(file_name: String, bytes: &[u8]) -> Result<JsValue, JsValue> {
    let movie = read_movie(&file_name, bytes)?;
    let format = &movie.data_block.format;

    let result = js_sys::Map::new();
    result.str_set("fileName", &movie.file_name.to_js_value());
    result.str_set("rifxOffset", &movie.rifx_offset.to_js_value());
    result.str_set("codec", &format!("{:?}", format.codec).to_js_value());
    result.str_set("bigEndian", &format.is_big_endian.to_js_value());
    result.str_set("archiveVersion", &format.archive_version.to_js_value());
    result.str_set("directorVersion", &format.director_version_label().to_js_value());
    result.str_set("afterburner", &movie.afterburner.is_some().to_js_value());

    let resources = Array::new();
    for entry in &movie.resources {
        resources.push(&entry.to_js_value());
    }
    result.str_set("resources", &resources.into());
    Ok(result.to_js_object().into())
}

#[wasm_bindgen]
pub fn read_movie_scripts(file_name: String, bytes: &[u8]) -> Result<JsValue, JsValue> {
    let movie = read_movie(&file_name, bytes)?;
    let scripts = Array::new();
    for script in &movie.scripts {
        scripts.push(&script.to_js_value());
    }
    Ok(scripts.into())
}

/// One `DecompiledScriptData` per script whose bytecode could be parsed.
#[wasm_bindgen]
pub fn decompile_movie_scripts(file_name: String, bytes: &[u8]) -> Result<JsValue, JsValue> {
    let movie = read_movie(&file_name, bytes)?;
    let result = Array::new();
    for script in &movie.scripts {
        let source = match movie.decompile_script(script) {
            Some(source) => source,
            None => continue,
        };
        let data = DecompiledScriptData {
            resource_id: script.resource_id,
            name: script.name.clone().unwrap_or_default(),
            format: script.format.name().to_owned(),
            source,
        };
        result.push(&JsValue::from(data));
    }
    debug!("{}: decompiled {} of {} scripts", file_name, result.length(), movie.scripts.len());
    Ok(result.into())
}

impl ToJsValue for ResourceEntry {
    fn to_js_value(&self) -> JsValue {
        let map = js_sys::Map::new();
        map.str_set("id", &self.index.to_js_value());
        map.str_set("tag", &ascii_safe(&self.tag_name()).to_js_value());
        map.str_set("size", &self.size.to_js_value());
        map.str_set("offset", &self.map_offset.to_js_value());
        map.str_set("flags", &self.flags.to_js_value());
        map.str_set("free", &self.is_free().to_js_value());
        if let ResourceStorage::Afterburner { compression_index, uncompressed_size, .. } = self.storage {
            map.str_set("compressionIndex", &compression_index.to_js_value());
            map.str_set("uncompressedSize", &uncompressed_size.to_js_value());
        }
        map.to_js_object().into()
    }
}

impl ToJsValue for ScriptEntry {
    fn to_js_value(&self) -> JsValue {
        let map = js_sys::Map::new();
        map.str_set("resourceId", &self.resource_id.to_js_value());
        map.str_set("castMemberId", &self.cast_member_id.to_js_value());
        map.str_set("format", &self.format.name().to_owned().to_js_value());
        let layout = self.layout.map(|layout| match layout {
            ScriptInfoLayout::PointerTable => "pointerTable".to_owned(),
            ScriptInfoLayout::LegacyTextAfterLength => "legacyTextAfterLength".to_owned(),
        });
        map.str_set("layout", &layout.to_js_value());
        map.str_set("layoutAmbiguous", &self.layout_ambiguous.to_js_value());
        map.str_set("scriptNumber", &self.script_number.to_js_value());
        map.str_set("text", &self.text.to_js_value());
        map.str_set("name", &self.name.to_js_value());
        map.str_set("bytes", &Uint8Array::from(self.bytes.as_slice()).into());
        map.to_js_object().into()
    }
}

pub trait JsSerializable {
    fn to_js_object(&self) -> js_sys::Object;
}

pub trait JsUtils {
    fn str_set(&self, key: &str, value: &JsValue);
}

impl JsSerializable for js_sys::Map {
    fn to_js_object(&self) -> js_sys::Object {
        js_sys::Object::from_entries(self).unwrap_or_else(|_| js_sys::Object::new())
    }
}

impl JsUtils for js_sys::Map {
    fn str_set(&self, key: &str, value: &JsValue) {
        self.set(&safe_js_string(key), value);
    }
}

pub trait ToJsValue {
    fn to_js_value(&self) -> JsValue;
}

impl ToJsValue for String {
    fn to_js_value(&self) -> JsValue {
        safe_js_string(self)
    }
}

impl ToJsValue for bool {
    fn to_js_value(&self) -> JsValue {
        JsValue::from_bool(*self)
    }
}

impl ToJsValue for u16 {
    fn to_js_value(&self) -> JsValue {
        JsValue::from_f64(*self as f64)
    }
}

impl ToJsValue for u32 {
    fn to_js_value(&self) -> JsValue {
        JsValue::from_f64(*self as f64)
    }
}

impl ToJsValue for i32 {
    fn to_js_value(&self) -> JsValue {
        JsValue::from_f64(*self as f64)
    }
}

impl ToJsValue for usize {
    fn to_js_value(&self) -> JsValue {
        JsValue::from_f64(*self as f64)
    }
}

impl<T: ToJsValue> ToJsValue for Option<T> {
    fn to_js_value(&self) -> JsValue {
        match self {
            Some(value) => value.to_js_value(),
            None => JsValue::NULL,
        }
    }
}
