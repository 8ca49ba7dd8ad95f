use binary_reader::BinaryReader;
use log::{debug, warn};

use super::{
    afterburner::{read_afterburner_map, AfterburnerState},
    cast::{read_script_entries, ScriptEntry},
    chunks::{
        key_table::KeyTableEntry, lctx::ScriptContextChunk, script::ScriptChunk,
        script_names::ScriptNamesChunk, ResourceEntry,
    },
    compression::CompressionDescriptor,
    errors::FatalError,
    lingo::{decompiler::handler::decompile_script, script::ScriptContext},
    map::read_classic_map,
    rifx::{locate_rifx, read_data_block, DataBlock, RIFXReaderContext},
    utils::{fourcc_to_string, FOURCC},
};

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum LineEnding {
    #[default]
    Lf,
    Cr,
    CrLf,
}

impl LineEnding {
    pub fn as_str(self) -> &'static str {
        match self {
            LineEnding::Lf => "\n",
            LineEnding::Cr => "\r",
            LineEnding::CrLf => "\r\n",
        }
    }
}

#[derive(Clone, Debug)]
pub struct ReadOptions {
    /// Search the whole stream for the container magic when neither the start
    /// nor a projector header points at it.
    pub scan_for_magic: bool,
    pub decode_script_text: bool,
    pub decompile_line_ending: LineEnding,
}

impl Default for ReadOptions {
    fn default() -> Self {
        ReadOptions {
            scan_for_magic: true,
            decode_script_text: true,
            decompile_line_ending: LineEnding::Lf,
        }
    }
}

/// A parsed movie. Nothing here refers back to the input stream.
#[derive(Clone, Debug)]
pub struct DirectorFile {
    pub file_name: String,
    pub rifx_offset: usize,
    pub data_block: DataBlock,
    pub resources: Vec<ResourceEntry>,
    pub key_entries: Vec<KeyTableEntry>,
    pub compressions: Vec<CompressionDescriptor>,
    pub afterburner: Option<AfterburnerState>,
    pub scripts: Vec<ScriptEntry>,
    pub script_contexts: Vec<ScriptContext>,
    line_ending: LineEnding,
}

impl DirectorFile {
    pub fn read(file_name: &str, bytes: &[u8], options: &ReadOptions) -> Result<DirectorFile, FatalError> {
        let mut rifx = RIFXReaderContext::new(file_name, bytes);
        DirectorFile::read_with_context(&mut rifx, options)
    }

    pub fn read_with_context(
        rifx: &mut RIFXReaderContext,
        options: &ReadOptions,
    ) -> Result<DirectorFile, FatalError> {
        rifx.reset();
        let rifx_offset = locate_rifx(&mut rifx.reader, options.scan_for_magic)?;
        rifx.rifx_offset = rifx_offset;

        let mut data_block = read_data_block(&mut rifx.reader, rifx_offset)?;
        debug!(
            "{}: container at {}, codec {}, {} payload bytes",
            rifx.file_name,
            rifx_offset,
            fourcc_to_string(data_block.format.codec_fourcc),
            data_block.declared_size
        );

        if data_block.format.codec.is_afterburner() {
            let state = read_afterburner_map(
                &mut rifx.reader,
                &mut data_block,
                &mut rifx.resources,
                &mut rifx.compressions,
            )?;
            rifx.afterburner = Some(state);
        } else {
            read_classic_map(&mut rifx.reader, &mut data_block, rifx_offset, &mut rifx.resources);
        }
        debug!(
            "{}: {} ({:#x}), {} resources",
            rifx.file_name,
            data_block.format.director_version_label(),
            data_block.format.archive_version,
            rifx.resources.entries().len()
        );

        let scripts = read_script_entries(
            rifx,
            data_block.format.archive_version,
            options.decode_script_text,
        );
        let script_contexts = read_script_contexts(rifx);

        let mut compressions = rifx.compressions.iter().cloned().collect::<Vec<_>>();
        compressions.sort_by_key(|c| c.index);

        Ok(DirectorFile {
            file_name: rifx.file_name.clone(),
            rifx_offset,
            data_block,
            resources: rifx.resources.entries().to_vec(),
            key_entries: rifx.resources.relationships().to_vec(),
            compressions,
            afterburner: rifx.afterburner.clone(),
            scripts,
            script_contexts,
            line_ending: options.decompile_line_ending,
        })
    }

    pub fn lingo_version(&self) -> u16 {
        self.data_block.format.lingo_version()
    }

    /// The context listing `resource_id`, else the first one read.
    pub fn script_context_for(&self, resource_id: i32) -> Option<&ScriptContext> {
        self.script_contexts
            .iter()
            .find(|c| c.script_section_ids.contains(&resource_id))
            .or_else(|| self.script_contexts.first())
    }

    /// Lingo source for a script's bytecode, `None` when the `Lscr` payload
    /// cannot be parsed.
    pub fn decompile_script(&self, script: &ScriptEntry) -> Option<String> {
        let version = self.lingo_version();
        let fallback = ScriptContext::default();
        let context = self.script_context_for(script.resource_id).unwrap_or(&fallback);

        let mut reader = BinaryReader::from_vec(&script.bytes);
        let chunk = match ScriptChunk::from_reader(&mut reader, version, context.capital_x) {
            Ok(chunk) => chunk,
            Err(err) => {
                warn!("Lscr {} could not be parsed: {}", script.resource_id, err);
                return None;
            }
        };
        Some(decompile_script(&chunk, context, version, self.line_ending.as_str()))
    }
}

fn read_script_contexts(rifx: &mut RIFXReaderContext) -> Vec<ScriptContext> {
    let lnam = FOURCC("Lnam");
    let context_entries = rifx
        .resources
        .entries()
        .iter()
        .filter(|e| e.fourcc == FOURCC("Lctx") || e.fourcc == FOURCC("LctX"))
        .cloned()
        .collect::<Vec<_>>();

    let mut contexts = Vec::new();
    for entry in &context_entries {
        let capital_x = entry.fourcc == FOURCC("LctX");
        let chunk = match rifx.load_payload(entry) {
            Some(bytes) => ScriptContextChunk::from_reader(&mut BinaryReader::from_vec(&bytes)),
            None => continue,
        };
        let chunk = match chunk {
            Ok(chunk) => chunk,
            Err(err) => {
                warn!("{} {} is unreadable: {}", entry.tag_name(), entry.index, err);
                continue;
            }
        };

        let lnam_id = match rifx.resources.try_get_entry(chunk.lnam_section_id) {
            Some(e) if e.fourcc == lnam => Some(e.index),
            _ => rifx.resources.first_with_fourcc(lnam).map(|e| e.index),
        };
        let names = lnam_id
            .and_then(|id| read_script_names(rifx, id))
            .unwrap_or_default();
        contexts.push(ScriptContext::new(&names, Some(&chunk), capital_x));
    }

    if contexts.is_empty() {
        let lnam_id = rifx.resources.first_with_fourcc(lnam).map(|e| e.index);
        if let Some(names) = lnam_id.and_then(|id| read_script_names(rifx, id)) {
            debug!("No script context, using Lnam {} alone", lnam_id.unwrap_or(-1));
            contexts.push(ScriptContext::new(&names, None, false));
        }
    }
    contexts
}

fn read_script_names(rifx: &mut RIFXReaderContext, id: i32) -> Option<ScriptNamesChunk> {
    let bytes = rifx.load_payload_by_id(id)?;
    match ScriptNamesChunk::from_reader(&mut BinaryReader::from_vec(&bytes)) {
        Ok(names) => Some(names),
        Err(err) => {
            warn!("Lnam {} is unreadable: {}", id, err);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::director::{
        cast::ScriptInfoLayout,
        enums::ScriptFormat,
        test_writer::{
            lctx, lnam, lscr, script_cast_member, AfterburnerBuilder, HandlerSpec, MovieBuilder,
        },
    };

    const TEXT: &str = "on beginsprite\r  put 12\rend";

    fn put_12_script() -> Vec<u8> {
        lscr(
            &[HandlerSpec {
                name_id: 0,
                argument_name_ids: vec![],
                local_name_ids: vec![2, 3, 4],
                bytecode: vec![0x41, 0x0c, 0x42, 0x01, 0x57, 0x01, 0x01],
            }],
            &[],
        )
    }

    fn behavior_movie(big_endian: bool) -> MovieBuilder {
        MovieBuilder::new(big_endian)
            .resource(*b"VWCF", vec![0; 8])
            .resource(
                *b"CASt",
                script_cast_member(5, 1, TEXT, "MyTestBe", ScriptInfoLayout::PointerTable),
            )
            .resource(*b"Lctx", lctx(3, &[5]))
            .resource(*b"Lnam", lnam(&["beginsprite", "put", "a", "b", "c"]))
            .resource(*b"STXT", vec![1, 2, 3])
            .resource(*b"Lscr", put_12_script())
    }

    #[test]
    fn test_script_round_trip_for_each_format() {
        for format in [ScriptFormat::Behavior, ScriptFormat::Movie, ScriptFormat::Parent] {
            let mut movie = MovieBuilder::new(true).resource(*b"VWCF", vec![0; 4]);
            let mut expected = vec![];
            for i in 0..3 {
                let script_id = 2 + 2 * i;
                movie = movie
                    .resource(
                        *b"CASt",
                        script_cast_member(
                            script_id as u32,
                            format.selector(),
                            "on x\rend",
                            "S",
                            ScriptInfoLayout::PointerTable,
                        ),
                    )
                    .resource(*b"Lscr", lscr(&[], &[]));
                expected.push((script_id, format));
            }

            let file = DirectorFile::read("round.dir", &movie.build(), &ReadOptions::default()).unwrap();
            let actual = file
                .scripts
                .iter()
                .map(|s| (s.resource_id, s.format))
                .collect::<Vec<_>>();
            assert_eq!(actual, expected);
        }
    }

    #[test]
    fn test_behavior_text_is_byte_exact() {
        let file = DirectorFile::read("5spritesTest_With_Behavior.dir", &behavior_movie(true).build(), &ReadOptions::default())
            .unwrap();
        let script = file.scripts.iter().find(|s| s.resource_id == 5).unwrap();
        assert_eq!(script.bytes.len(), 148);
        assert_eq!(script.text.as_deref(), Some(TEXT));
        assert_eq!(script.name.as_deref(), Some("MyTestBe"));
        assert_eq!(script.format, ScriptFormat::Behavior);
        assert_eq!(script.cast_member_id, Some(1));
    }

    #[test]
    fn test_decompile_behavior() {
        for big_endian in [true, false] {
            let file = DirectorFile::read("b.dir", &behavior_movie(big_endian).build(), &ReadOptions::default())
                .unwrap();
            assert_eq!(file.lingo_version(), 600);
            assert_eq!(file.script_contexts.len(), 1);
            let source = file.decompile_script(&file.scripts[0]).unwrap();
            assert_eq!(source, "on beginsprite\n  put 12\nend\n");
        }

        let options = ReadOptions {
            decompile_line_ending: LineEnding::Cr,
            ..ReadOptions::default()
        };
        let file = DirectorFile::read("b.dir", &behavior_movie(true).build(), &options).unwrap();
        let source = file.decompile_script(&file.scripts[0]).unwrap();
        assert_eq!(source, "on beginsprite\r  put 12\rend\r");
    }

    #[test]
    fn test_layouts_decode_to_the_same_text() {
        let decode = |archive_version: u32, layout: ScriptInfoLayout| {
            let bytes = MovieBuilder::new(true)
                .archive_version(archive_version)
                .resource(*b"VWCF", vec![0; 4])
                .resource(*b"CASt", script_cast_member(2, 1, TEXT, "MyTestBe", layout))
                .resource(*b"Lscr", lscr(&[], &[]))
                .build();
            let file = DirectorFile::read("layout.dir", &bytes, &ReadOptions::default()).unwrap();
            let script = file.scripts[0].clone();
            assert_eq!(script.layout, Some(layout));
            (script.text, script.name)
        };

        let pointer = decode(0x4C7, ScriptInfoLayout::PointerTable);
        let legacy = decode(0xDEADBEEF, ScriptInfoLayout::LegacyTextAfterLength);
        assert_eq!(pointer, legacy);
        assert_eq!(pointer.0.as_deref(), Some(TEXT));
    }

    #[test]
    fn test_script_text_decoding_can_be_disabled() {
        let options = ReadOptions {
            decode_script_text: false,
            ..ReadOptions::default()
        };
        let file = DirectorFile::read("b.dir", &behavior_movie(true).build(), &options).unwrap();
        assert_eq!(file.scripts[0].format, ScriptFormat::Behavior);
        assert_eq!(file.scripts[0].text, None);
        assert_eq!(file.scripts[0].name, None);
    }

    #[test]
    fn test_projector_wrapped_movie() {
        let movie = behavior_movie(false).build();
        let mut bytes = b"PJ01".to_vec();
        bytes.extend_from_slice(&32u32.to_le_bytes());
        bytes.resize(32, 0);
        bytes.extend_from_slice(&movie);

        let file = DirectorFile::read("projector.exe", &bytes, &ReadOptions::default()).unwrap();
        assert_eq!(file.rifx_offset, 32);
        assert_eq!(file.scripts.len(), 1);
        assert_eq!(file.scripts[0].text.as_deref(), Some(TEXT));
    }

    #[test]
    fn test_afterburner_scripts() {
        let member = script_cast_member(4, 3, TEXT, "Main", ScriptInfoLayout::PointerTable);
        let bytes = AfterburnerBuilder::new()
            .resource(3, *b"CASt", member, false, 0)
            .resource(4, *b"Lscr", lscr(&[], &[]), true, 1)
            .build();

        let file = DirectorFile::read("movie.dcr", &bytes, &ReadOptions::default()).unwrap();
        assert!(file.afterburner.is_some());
        assert_eq!(file.compressions.len(), 2);
        assert_eq!(file.scripts.len(), 1);
        let script = &file.scripts[0];
        assert_eq!(script.resource_id, 4);
        assert_eq!(script.format, ScriptFormat::Movie);
        assert_eq!(script.text.as_deref(), Some(TEXT));
        assert_eq!(script.name.as_deref(), Some("Main"));
        assert_eq!(script.bytes, lscr(&[], &[]));
    }

    #[test]
    fn test_upper_case_cast_tag_owns_script() {
        let bytes = MovieBuilder::new(true)
            .resource(*b"VWCF", vec![0; 4])
            .resource(
                *b"CAST",
                script_cast_member(2, 1, TEXT, "MyTestBe", ScriptInfoLayout::PointerTable),
            )
            .resource(*b"Lscr", put_12_script())
            .build();
        let file = DirectorFile::read("upper.dir", &bytes, &ReadOptions::default()).unwrap();
        assert_eq!(file.scripts.len(), 1);
        assert_eq!(file.scripts[0].resource_id, 2);
        assert_eq!(file.scripts[0].format, ScriptFormat::Behavior);
        assert_eq!(file.scripts[0].text.as_deref(), Some(TEXT));
        assert_eq!(file.scripts[0].name.as_deref(), Some("MyTestBe"));
    }

    #[test]
    fn test_orphan_script_has_unknown_format() {
        let bytes = MovieBuilder::new(true)
            .resource(*b"VWCF", vec![0; 4])
            .resource(*b"Lscr", lscr(&[], &[]))
            .build();
        let file = DirectorFile::read("orphan.dir", &bytes, &ReadOptions::default()).unwrap();
        assert_eq!(file.scripts.len(), 1);
        assert_eq!(file.scripts[0].format, ScriptFormat::Unknown);
        assert_eq!(file.scripts[0].layout, None);
        assert!(file.script_contexts.is_empty());
        assert_eq!(file.decompile_script(&file.scripts[0]).as_deref(), Some(""));
    }

    #[test]
    fn test_fatal_errors() {
        assert!(matches!(
            DirectorFile::read("tiny", b"RIFX", &ReadOptions::default()),
            Err(FatalError::StreamTooSmall)
        ));
        assert!(matches!(
            DirectorFile::read("garbage", &[0x55; 64], &ReadOptions::default()),
            Err(FatalError::MagicNotFound)
        ));
    }

    #[test]
    fn test_reading_twice_resets_registries() {
        let bytes = behavior_movie(true).build();
        let mut rifx = RIFXReaderContext::new("b.dir", &bytes);
        let first = DirectorFile::read_with_context(&mut rifx, &ReadOptions::default()).unwrap();
        let second = DirectorFile::read_with_context(&mut rifx, &ReadOptions::default()).unwrap();
        assert_eq!(first.resources.len(), second.resources.len());
        assert_eq!(second.scripts.len(), 1);
    }
}
