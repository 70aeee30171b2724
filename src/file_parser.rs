//! Ties components D and E together: ingests one transform XML file via
//! `quick_xml` (grounded in `earleybird::testsuite_utils::read_test_catalog`'s
//! event-loop style) and replays its rules into a `Step` list plus the
//! delegation edges the linker (component F) needs.

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::codepoint_set::CodePointSet;
use crate::config::{CompilerConfig, NORMALIZATION_ALIASES};
use crate::error::{FileParseError, ParseError};
use crate::model::{CompiledRule, Direction, NormalizeKind, RawRule, Step};
use crate::rule_parser::{
    apply_rule_map, classify_rule, parse_rule_sides, strip_trailing, update_filter,
};
use crate::slots::build_slots;
use crate::unicode_oracle::UnicodeOracle;
use crate::variables::VariableTable;
use std::path::Path;

pub struct ParsedFile {
    pub source: String,
    pub target: String,
    pub steps: Vec<Step>,
    /// Names this file's `::Other` pre-transform rules delegate to, in order.
    pub dependencies: Vec<String>,
}

/// Reads `<transform source target>` attributes and every `<tRule>` text
/// node, in document order, joining backslash-continued lines.
fn read_xml(path: &Path) -> Result<(String, String, Vec<String>), std::io::Error> {
    let content = std::fs::read_to_string(path)?;
    let mut reader = Reader::from_str(&content);
    reader.trim_text(true);

    let mut source = String::new();
    let mut target = String::new();
    let mut rule_texts = Vec::new();
    let mut in_rule = false;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                if e.name().as_ref() == b"transform" {
                    for attr in e.attributes().flatten() {
                        match attr.key.as_ref() {
                            b"source" => {
                                source = String::from_utf8_lossy(&attr.value).to_string();
                            }
                            b"target" => {
                                target = String::from_utf8_lossy(&attr.value).to_string();
                            }
                            _ => {}
                        }
                    }
                } else if e.name().as_ref() == b"tRule" {
                    in_rule = true;
                }
            }
            Ok(Event::Text(e)) if in_rule => {
                let text = e.unescape().unwrap_or_default().to_string();
                rule_texts.push(text);
            }
            Ok(Event::End(e)) => {
                if e.name().as_ref() == b"tRule" {
                    in_rule = false;
                }
            }
            Ok(Event::Eof) => break,
            Err(_) => break,
            _ => {}
        }
        buf.clear();
    }

    // Join backslash line continuations (spec §4.D step 2).
    let mut lines = Vec::new();
    let mut pending = String::new();
    for raw in rule_texts {
        let trimmed = raw.trim_end();
        if let Some(stripped) = trimmed.strip_suffix('\\') {
            pending.push_str(stripped);
            continue;
        }
        pending.push_str(trimmed);
        lines.push(std::mem::take(&mut pending));
    }
    if !pending.is_empty() {
        lines.push(pending);
    }

    Ok((source, target, lines))
}

/// Parses one transform file end to end: extraction, rule_map
/// substitution, classification, variable fixed-point, and replay into
/// a step list (spec §4.D steps 1-7).
pub fn parse_file(
    path: &Path,
    config: &CompilerConfig,
    oracle: &dyn UnicodeOracle,
) -> Result<ParsedFile, FileParseError> {
    let (source, target, raw_lines) = read_xml(path).map_err(|e| FileParseError {
        file: path.to_path_buf(),
        rule_text: None,
        source: ParseError::UnrecognizedToken {
            context: e.to_string(),
            offset: 0,
        },
    })?;

    let lines: Vec<String> = raw_lines
        .iter()
        .map(|l| strip_trailing(l))
        .filter(|l| !l.is_empty())
        .map(|l| apply_rule_map(&l, config))
        .collect();

    let mut vars = VariableTable::new();
    let mut raw_rules = Vec::new();

    for line in &lines {
        let classified = classify_rule(line).map_err(|e| FileParseError {
            file: path.to_path_buf(),
            rule_text: Some(line.clone()),
            source: e,
        })?;
        if let RawRule::Assignment { name, rhs } = &classified {
            vars.define(name, rhs);
        }
        raw_rules.push((line.clone(), classified));
    }

    vars.resolve().map_err(|e| FileParseError {
        file: path.to_path_buf(),
        rule_text: None,
        source: e,
    })?;

    let mut filter = CodePointSet::full_bmp();
    let mut steps: Vec<Step> = Vec::new();
    let mut dependencies = Vec::new();
    let mut current_block: Vec<CompiledRule> = Vec::new();
    let block_label = smol_str::SmolStr::new("block");

    macro_rules! flush_block {
        () => {
            if !current_block.is_empty() {
                steps.push(Step::RuleSet {
                    label: block_label.clone(),
                    rules: std::mem::take(&mut current_block),
                });
            }
        };
    }

    for (text, rule) in &raw_rules {
        let err_ctx = |e: ParseError| FileParseError {
            file: path.to_path_buf(),
            rule_text: Some(text.clone()),
            source: e,
        };

        match rule {
            RawRule::Assignment { .. } => {}
            RawRule::PreTransform { payload, .. } => {
                let payload = vars.substitute(payload).map_err(err_ctx)?;
                if payload.trim_start().starts_with('[') {
                    filter = update_filter(payload.trim(), &filter, oracle).map_err(err_ctx)?;
                } else {
                    let name = payload.trim();
                    if let Some((_, norm)) = NORMALIZATION_ALIASES
                        .iter()
                        .find(|(alias, _)| *alias == name)
                    {
                        flush_block!();
                        steps.push(Step::Normalize(normalize_kind(norm)));
                    } else if name == "STRIP_MARK" {
                        flush_block!();
                        steps.push(Step::Normalize(NormalizeKind::StripCombiningMarks));
                    } else {
                        flush_block!();
                        dependencies.push(name.to_lowercase());
                        steps.push(Step::Delegate {
                            target: name.to_lowercase().into(),
                        });
                    }
                }
            }
            RawRule::Transform {
                direction,
                lvalue,
                rvalue,
            } => {
                if *direction == Direction::Backward {
                    continue; // IgnorableRule: backward-only direction.
                }
                let parsed = parse_rule_sides(lvalue, rvalue, &vars).map_err(err_ctx)?;
                let Some(parsed) = parsed else {
                    continue; // IgnorableRule: empty body/contexts or Han-start.
                };

                let key_slots = build_slots(parsed.body.trim(), &filter, oracle).map_err(err_ctx)?;
                let pre_slots = if parsed.pre_context.trim().is_empty() {
                    None
                } else {
                    Some(build_slots(parsed.pre_context.trim(), &filter, oracle).map_err(err_ctx)?)
                };
                let post_slots = if parsed.post_context.trim().is_empty() {
                    None
                } else {
                    Some(build_slots(parsed.post_context.trim(), &filter, oracle).map_err(err_ctx)?)
                };
                let replacement_slots =
                    build_slots(parsed.replacement.trim(), &filter, oracle).map_err(err_ctx)?;

                let key: Vec<u8> = key_slots
                    .slots
                    .iter()
                    .flat_map(|s| s.0.iter().flat_map(|a| a.encode_chars()))
                    .collect::<String>()
                    .into_bytes();

                let (pre_bytes, pre_max) = encode_context(&pre_slots);
                let (post_bytes, post_max) = encode_context(&post_slots);

                let groups_bytes: Vec<u8> = key_slots
                    .groups
                    .iter()
                    .flat_map(|g| vec![g.start as u8, g.end as u8])
                    .collect();

                let replacement: Vec<u8> = replacement_slots
                    .slots
                    .iter()
                    .flat_map(|s| s.0.iter().flat_map(|a| a.encode_chars()))
                    .collect::<String>()
                    .into_bytes();

                let rule = CompiledRule {
                    key_len: key.len(),
                    key,
                    pre_context_kind: parsed.pre_context_kind,
                    pre_context_len: pre_bytes.len(),
                    pre_context: pre_bytes,
                    pre_context_max_len: pre_max,
                    post_context_kind: parsed.post_context_kind,
                    post_context_len: post_bytes.len(),
                    post_context: post_bytes,
                    post_context_max_len: post_max,
                    groups_len: groups_bytes.len(),
                    groups: groups_bytes,
                    replacement_len: replacement.len(),
                    replacement,
                    revisit_offset: replacement_slots.revisit_offset,
                };

                current_block.push(rule);
            }
        }
    }

    flush_block!();

    Ok(ParsedFile {
        source,
        target,
        steps,
        dependencies,
    })
}

fn encode_context(slots: &Option<crate::slots::SlotResult>) -> (Vec<u8>, usize) {
    match slots {
        None => (Vec::new(), 0),
        Some(s) => {
            let bytes: Vec<u8> = s
                .slots
                .iter()
                .flat_map(|slot| slot.0.iter().flat_map(|a| a.encode_chars()))
                .collect::<String>()
                .into_bytes();
            let max_len = s.slots.len();
            (bytes, max_len)
        }
    }
}

fn normalize_kind(name: &str) -> NormalizeKind {
    match name {
        "nfc" => NormalizeKind::Nfc,
        "nfd" => NormalizeKind::Nfd,
        "nfkc" => NormalizeKind::Nfkc,
        "nfkd" => NormalizeKind::Nfkd,
        "lower" => NormalizeKind::Lowercase,
        "upper" => NormalizeKind::Uppercase,
        "title" => NormalizeKind::Titlecase,
        _ => NormalizeKind::StripCombiningMarks,
    }
}

