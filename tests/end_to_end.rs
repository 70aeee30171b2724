//! End-to-end scenarios S1-S6 (spec §8), driving the real pipeline
//! pieces (rule_parser + slots, and the full transform_graph::link for
//! the filter/normalization and reachability scenarios) the way
//! `earleybird`'s `builtin_grammars.rs` smoke-tests its own parser with
//! `indoc!`-embedded fixtures.

use indoc::indoc;
use std::io::Write;

use translit_compiler::codepoint_set::CodePointSet;
use translit_compiler::config::CompilerConfig;
use translit_compiler::model::{ContextKind, SlotAtom};
use translit_compiler::rule_parser::parse_rule_sides;
use translit_compiler::slots::build_slots;
use translit_compiler::unicode_oracle::StaticUnicodeOracle;
use translit_compiler::variables::VariableTable;

fn key_string(slots: &[translit_compiler::model::Slot]) -> String {
    slots
        .iter()
        .flat_map(|s| s.0.iter().flat_map(|a| a.encode_chars()))
        .collect()
}

/// S1: `a > b ;` has key "a", no contexts, replacement "b", no groups, revisit 0.
#[test]
fn s1_simple_rewrite() {
    let oracle = StaticUnicodeOracle::new();
    let filter = CodePointSet::full_bmp();
    let vars = VariableTable::new();

    let parsed = parse_rule_sides("a", "b", &vars).unwrap().unwrap();
    assert_eq!(parsed.pre_context_kind, ContextKind::None);
    assert_eq!(parsed.post_context_kind, ContextKind::None);

    let key = build_slots(parsed.body.trim(), &filter, &oracle).unwrap();
    assert_eq!(key_string(&key.slots), "a");

    let replacement = build_slots(parsed.replacement.trim(), &filter, &oracle).unwrap();
    assert_eq!(key_string(&replacement.slots), "b");
    assert!(key.groups.is_empty());
    assert_eq!(replacement.revisit_offset, 0);
}

/// S2: `$vowel = [aeiou] ; $vowel } k > c ;` yields key "k", regex-like
/// pre-context containing {a,e,i,o,u}, no post-context, replacement "c".
#[test]
fn s2_variable_expansion_into_context() {
    let oracle = StaticUnicodeOracle::new();
    let filter = CodePointSet::full_bmp();
    let mut vars = VariableTable::new();
    vars.define("vowel", "[aeiou]");
    vars.resolve().unwrap();

    let parsed = parse_rule_sides("$vowel } k", "c", &vars).unwrap().unwrap();
    assert_eq!(parsed.pre_context_kind, ContextKind::RegexLike);
    assert_eq!(parsed.post_context_kind, ContextKind::None);

    let key = build_slots(parsed.body.trim(), &filter, &oracle).unwrap();
    assert_eq!(key_string(&key.slots), "k");

    let pre = build_slots(parsed.pre_context.trim(), &filter, &oracle).unwrap();
    let pre_chars: Vec<char> = pre.slots[0]
        .0
        .iter()
        .filter_map(|a| match a {
            SlotAtom::Char(c) => Some(*c),
            _ => None,
        })
        .collect();
    for v in ['a', 'e', 'i', 'o', 'u'] {
        assert!(pre_chars.contains(&v));
    }
}

/// S3/S4: a `::[...]` filter preamble followed by rules, then `::NFD` and
/// `::Any-Lower` pre-transforms, parsed through the full file pipeline.
#[test]
fn s3_and_s4_filter_and_normalization_steps() {
    let dir = fixture_dir("s3_s4");
    write_transform(
        &dir,
        "cyrillic-latin.xml",
        "Cyrillic",
        "Latin",
        indoc! {r#"
            ::[[:Cyrillic:]] ;
            а > a ;
            б > b ;
            ::NFD ;
            ::Any-Lower ;
        "#},
    );
    write_transform(&dir, "latin-ascii.xml", "Latin", "Ascii", "a > a ;\n");

    let oracle = StaticUnicodeOracle::new();
    let config = CompilerConfig::new();
    let linked = translit_compiler::transform_graph::link(&dir, &config, &oracle).unwrap();

    let cyrillic = linked
        .transforms
        .iter()
        .find(|t| t.name == "cyrillic-latin")
        .expect("cyrillic-latin targets Latin, so it is a sink and must be retained");

    let steps = &linked.steps[cyrillic.step_index..cyrillic.step_index + cyrillic.step_count];
    let has_ruleset = steps.iter().any(|s| s.rule_index >= 0);
    assert!(has_ruleset, "expected at least one ruleset step");
    let normalize_payloads: Vec<&str> = steps
        .iter()
        .filter(|s| s.rule_index < 0)
        .map(|s| s.payload.as_str())
        .collect();
    assert!(normalize_payloads.contains(&"nfd"));
    assert!(normalize_payloads.contains(&"lower"));

    std::fs::remove_dir_all(&dir).ok();
}

/// S5: `(a)(b) > $2$1 ;` emits key "ab" with groups [0,1) and [1,2), and a
/// replacement carrying the group-indicator sentinel for each back-reference.
#[test]
fn s5_group_back_references() {
    let oracle = StaticUnicodeOracle::new();
    let filter = CodePointSet::full_bmp();
    let vars = VariableTable::new();

    let parsed = parse_rule_sides("(a)(b)", "$2$1", &vars).unwrap().unwrap();
    let key = build_slots(parsed.body.trim(), &filter, &oracle).unwrap();
    assert_eq!(key_string(&key.slots), "ab");
    assert_eq!(key.groups.len(), 2);
    assert_eq!(key.groups[0].start, 0);
    assert_eq!(key.groups[0].end, 1);
    assert_eq!(key.groups[1].start, 1);
    assert_eq!(key.groups[1].end, 2);

    let replacement = build_slots(parsed.replacement.trim(), &filter, &oracle).unwrap();
    assert_eq!(
        replacement.slots[0].0[0],
        SlotAtom::GroupIndicator(2)
    );
    assert_eq!(
        replacement.slots[1].0[0],
        SlotAtom::GroupIndicator(1)
    );

    let sentinel = translit_compiler::sentinel::GROUP_INDICATOR;
    assert_eq!(
        key_string(&replacement.slots),
        format!("{sentinel}2{sentinel}1")
    );
}

/// S6: a transform targeting a non-Latin script that nothing depends on
/// is dropped from the emitted tables.
#[test]
fn s6_unreachable_transform_is_dropped() {
    let dir = fixture_dir("s6");
    write_transform(&dir, "latin-ascii.xml", "Latin", "Ascii", "a > a ;\n");
    write_transform(&dir, "latin-cyrillic.xml", "Latin", "Cyrillic", "a > а ;\n");

    let oracle = StaticUnicodeOracle::new();
    let config = CompilerConfig::new();
    let linked = translit_compiler::transform_graph::link(&dir, &config, &oracle).unwrap();

    assert!(linked.transforms.iter().any(|t| t.name == "latin-ascii"));
    assert!(!linked.transforms.iter().any(|t| t.name == "latin-cyrillic"));

    std::fs::remove_dir_all(&dir).ok();
}

fn fixture_dir(name: &str) -> std::path::PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "cldr_translit_compiler_test_{name}_{}",
        std::process::id()
    ));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn write_transform(dir: &std::path::Path, filename: &str, source: &str, target: &str, rules: &str) {
    let mut tag_rules = String::new();
    for line in rules.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        tag_rules.push_str("<tRule>");
        tag_rules.push_str(line);
        tag_rules.push_str("</tRule>\n");
    }
    let xml = format!(
        "<transform source=\"{source}\" target=\"{target}\">\n{tag_rules}</transform>\n"
    );
    let mut file = std::fs::File::create(dir.join(filename)).unwrap();
    file.write_all(xml.as_bytes()).unwrap();
}
