//! Component G: the emitter. Serializes the three linked tables plus the
//! script→transliterator table to a sink with deterministic ordering
//! (spec §4.G). No semantic decisions happen here -- only encoding.

use std::io::{self, Write};

use crate::model::{CompiledRule, StepRecord, TransformRecord};
use crate::script_table::ScriptTable;
use crate::transform_graph::LinkedTables;

/// Accepts the compiler's output records. The concrete file-based sink
/// below is one implementation; a library consumer could write another
/// (buffer, network) without touching any upstream component (SPEC_FULL §4.G).
pub trait TableSink {
    fn write_transforms(&mut self, transforms: &[TransformRecord]) -> io::Result<()>;
    fn write_steps(&mut self, steps: &[StepRecord]) -> io::Result<()>;
    fn write_rules(&mut self, rules: &[CompiledRule]) -> io::Result<()>;
    fn write_scripts(&mut self, table: &ScriptTable) -> io::Result<()>;
}

/// Escapes a byte string so a reader can split fields on `\0` unambiguously:
/// backslash and NUL are escaped, everything else passes through as raw
/// UTF-8 bytes (spec §4.G "strings are emitted with byte-level escaping").
fn escape_bytes(bytes: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(bytes.len());
    for &b in bytes {
        match b {
            b'\\' => {
                out.push(b'\\');
                out.push(b'\\');
            }
            0 => {
                out.push(b'\\');
                out.push(b'0');
            }
            other => out.push(other),
        }
    }
    out
}

fn write_field(w: &mut impl Write, bytes: &[u8]) -> io::Result<()> {
    w.write_all(&escape_bytes(bytes))?;
    w.write_all(b"\0")
}

/// Writes `transliteration_data.bin` and `transliteration_scripts.bin` to
/// a directory (spec §6 CLI detail).
pub struct FileSink {
    data_file: std::fs::File,
    scripts_file: std::fs::File,
}

impl FileSink {
    pub fn create(output_dir: &std::path::Path) -> io::Result<Self> {
        std::fs::create_dir_all(output_dir)?;
        Ok(Self {
            data_file: std::fs::File::create(output_dir.join("transliteration_data.bin"))?,
            scripts_file: std::fs::File::create(output_dir.join("transliteration_scripts.bin"))?,
        })
    }
}

impl TableSink for FileSink {
    fn write_transforms(&mut self, transforms: &[TransformRecord]) -> io::Result<()> {
        writeln!(self.data_file, "TRANSFORMS {}", transforms.len())?;
        for t in transforms {
            write_field(&mut self.data_file, t.name.as_bytes())?;
            writeln!(
                self.data_file,
                "{} {} {}",
                t.internal as u8, t.step_index, t.step_count
            )?;
        }
        Ok(())
    }

    fn write_steps(&mut self, steps: &[StepRecord]) -> io::Result<()> {
        writeln!(self.data_file, "STEPS {}", steps.len())?;
        for s in steps {
            writeln!(self.data_file, "{} {}", s.rule_index, s.rule_count)?;
            write_field(&mut self.data_file, s.payload.as_bytes())?;
        }
        Ok(())
    }

    fn write_rules(&mut self, rules: &[CompiledRule]) -> io::Result<()> {
        writeln!(self.data_file, "RULES {}", rules.len())?;
        for r in rules {
            write_field(&mut self.data_file, &r.key)?;
            writeln!(self.data_file, "{}", r.key_len)?;
            writeln!(self.data_file, "{}", context_kind_tag(r.pre_context_kind))?;
            write_field(&mut self.data_file, &r.pre_context)?;
            writeln!(
                self.data_file,
                "{} {}",
                r.pre_context_len, r.pre_context_max_len
            )?;
            writeln!(self.data_file, "{}", context_kind_tag(r.post_context_kind))?;
            write_field(&mut self.data_file, &r.post_context)?;
            writeln!(
                self.data_file,
                "{} {}",
                r.post_context_len, r.post_context_max_len
            )?;
            write_field(&mut self.data_file, &r.groups)?;
            writeln!(self.data_file, "{}", r.groups_len)?;
            write_field(&mut self.data_file, &r.replacement)?;
            writeln!(self.data_file, "{} {}", r.replacement_len, r.revisit_offset)?;
        }
        Ok(())
    }

    fn write_scripts(&mut self, table: &ScriptTable) -> io::Result<()> {
        let mut scripts: Vec<&&str> = table.keys().collect();
        scripts.sort();
        writeln!(self.scripts_file, "SCRIPTS {}", scripts.len())?;
        for script in scripts {
            let entries = &table[script];
            write_field(&mut self.scripts_file, script.as_bytes())?;
            writeln!(self.scripts_file, "{}", entries.len())?;
            for (lang, names) in entries {
                write_field(
                    &mut self.scripts_file,
                    lang.unwrap_or("NULL").as_bytes(),
                )?;
                writeln!(self.scripts_file, "{}", names.len())?;
                for name in names {
                    write_field(&mut self.scripts_file, name.as_bytes())?;
                }
            }
        }
        Ok(())
    }
}

fn context_kind_tag(kind: crate::model::ContextKind) -> u8 {
    match kind {
        crate::model::ContextKind::None => 0,
        crate::model::ContextKind::Literal => 1,
        crate::model::ContextKind::WordBoundary => 2,
        crate::model::ContextKind::RegexLike => 3,
    }
}

/// Emits a fully linked table set to `sink` (spec §4.G).
pub fn emit(
    linked: &LinkedTables,
    scripts: &ScriptTable,
    sink: &mut dyn TableSink,
) -> io::Result<()> {
    sink.write_transforms(&linked.transforms)?;
    sink.write_steps(&linked.steps)?;
    sink.write_rules(&linked.rules)?;
    sink.write_scripts(scripts)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_bytes_escapes_backslash_and_nul() {
        let escaped = escape_bytes(b"a\\b\0c");
        assert_eq!(escaped, b"a\\\\b\\0c");
    }
}
