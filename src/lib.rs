//! Compiles CLDR LDML transform rules into a flat rule table for a
//! downstream transliteration runtime. See `SPEC_FULL.md` for the full
//! component breakdown (A-G) this crate implements.

pub mod charset;
pub mod codepoint_set;
pub mod config;
pub mod emitter;
pub mod error;
pub mod file_parser;
pub mod model;
pub mod rule_parser;
pub mod script_table;
pub mod sentinel;
pub mod slots;
pub mod tokenizer;
pub mod transform_graph;
pub mod unicode_oracle;
pub mod variables;

use std::path::Path;

use log::info;

use crate::config::CompilerConfig;
use crate::emitter::{emit, FileSink};
use crate::error::CompileError;
use crate::unicode_oracle::StaticUnicodeOracle;

/// Runs the full pipeline: parse every transform file under `input_dir`,
/// link and prune the dependency graph, and write the two output files
/// into `output_dir` (spec §1 "THE CORE", §6).
pub fn compile(input_dir: &Path, output_dir: &Path, config: &CompilerConfig) -> Result<(), CompileError> {
    let oracle = StaticUnicodeOracle::new();
    info!("compiling transforms from {}", input_dir.display());

    let linked = transform_graph::link(input_dir, config, &oracle)?;
    info!(
        "linked {} transforms, {} steps, {} rules",
        linked.transforms.len(),
        linked.steps.len(),
        linked.rules.len()
    );

    let mut sink = FileSink::create(output_dir)?;
    emit(&linked, &config.script_table, &mut sink)?;
    info!("wrote output to {}", output_dir.display());
    Ok(())
}
