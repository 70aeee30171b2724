//! Component F: the transform dependency graph and linker (spec §4.F).

use std::collections::{HashMap, HashSet, VecDeque};
use std::path::Path;

use log::{debug, info, warn};

use crate::config::{AttachMode, CompilerConfig};
use crate::error::CompileError;
use crate::file_parser::{parse_file, ParsedFile};
use crate::model::{CompiledRule, NormalizeKind, Step, StepRecord, TransformRecord};
use crate::rule_parser::{classify_rule, parse_rule_sides, strip_trailing};
use crate::slots::build_slots;
use crate::unicode_oracle::UnicodeOracle;
use crate::variables::VariableTable;

pub struct LinkedTables {
    pub transforms: Vec<TransformRecord>,
    pub steps: Vec<StepRecord>,
    pub rules: Vec<CompiledRule>,
}

struct Transform {
    name: String,
    parsed: ParsedFile,
}

/// Derives a canonical lowercase name (`source-target`) for a file's base
/// name, and the `source-target` alias it should also resolve under
/// (spec §4.F step 1).
fn canonical_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}

/// Walks the transforms directory, parses every file, builds the
/// dependency graph, prunes unreachable transforms, splices supplemental
/// rules, and linearizes the three output tables (spec §4.F steps 1-8).
pub fn link(
    input_dir: &Path,
    config: &CompilerConfig,
    oracle: &dyn UnicodeOracle,
) -> Result<LinkedTables, CompileError> {
    let entries: Vec<_> = itertools::sorted(
        std::fs::read_dir(input_dir)?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.extension().map(|e| e == "xml").unwrap_or(false)),
    )
    .collect();

    let mut transforms: Vec<Transform> = Vec::new();
    let mut alias_map: HashMap<String, String> = HashMap::new();
    let mut by_name: HashMap<String, usize> = HashMap::new();

    for path in &entries {
        let name = canonical_name(path);
        if config.is_excluded(&name) {
            debug!("skipping excluded transform {name}");
            continue;
        }

        let parsed = parse_file(path, config, oracle).map_err(CompileError::Parse)?;

        let alias = format!(
            "{}-{}",
            parsed.source.to_lowercase(),
            parsed.target.to_lowercase()
        );
        alias_map.insert(alias, name.clone());
        by_name.insert(name.clone(), transforms.len());
        transforms.push(Transform { name, parsed });
    }

    info!("parsed {} transform files", transforms.len());

    // Resolve each dependency name through the alias map (spec §4.F step 2).
    let resolve = |raw: &str| -> Option<String> {
        if by_name.contains_key(raw) {
            Some(raw.to_string())
        } else {
            alias_map.get(raw).cloned()
        }
    };

    let mut dependency_map: HashMap<String, Vec<String>> = HashMap::new();
    for t in &transforms {
        let mut resolved = Vec::new();
        for dep in &t.parsed.dependencies {
            match resolve(dep) {
                Some(target) => resolved.push(target),
                None => warn!("missing dependency {dep} referenced by {}", t.name),
            }
        }
        dependency_map.insert(t.name.clone(), resolved);
    }

    // Sinks: target == latin, or the distinguished latin-ascii (spec §4.F step 5).
    let sinks: Vec<String> = transforms
        .iter()
        .filter(|t| t.parsed.target.to_lowercase() == "latin" || t.name == "latin-ascii")
        .map(|t| t.name.clone())
        .collect();

    // BFS reachability from the sinks, insertion-order queue (spec §5, §4.F step 6).
    // `reachable_order` records the order names were first discovered, which is
    // also the order spec §4.G/§5 require for emission -- not an alphabetical one.
    let mut reachable: HashSet<String> = HashSet::new();
    let mut reachable_order: Vec<String> = Vec::new();
    let mut queue: VecDeque<String> = VecDeque::new();
    for s in &sinks {
        if reachable.insert(s.clone()) {
            reachable_order.push(s.clone());
            queue.push_back(s.clone());
        }
    }
    while let Some(name) = queue.pop_front() {
        if let Some(deps) = dependency_map.get(&name) {
            for dep in deps {
                if reachable.insert(dep.clone()) {
                    reachable_order.push(dep.clone());
                    queue.push_back(dep.clone());
                }
            }
        }
    }

    for t in &transforms {
        if !reachable.contains(&t.name) {
            debug!("dropping unreachable transform {}", t.name);
        }
    }

    // Splice supplemental rules (spec §4.F step 7).
    let mut step_lists: HashMap<String, Vec<Step>> = transforms
        .iter()
        .filter(|t| reachable.contains(&t.name))
        .map(|t| (t.name.clone(), t.parsed.steps.clone()))
        .collect();

    for supplement in &config.supplemental_rules {
        let Some(steps) = step_lists.get_mut(&supplement.target_transform) else {
            continue;
        };
        let mut compiled = Vec::new();
        for rule_text in &supplement.rules {
            let text = strip_trailing(rule_text);
            if let Ok(crate::model::RawRule::Transform { lvalue, rvalue, .. }) =
                classify_rule(&text)
            {
                let vars = VariableTable::new();
                if let Ok(Some(parsed)) = parse_rule_sides(&lvalue, &rvalue, &vars) {
                    let filter = crate::codepoint_set::CodePointSet::full_bmp();
                    if let Ok(key_slots) = build_slots(parsed.body.trim(), &filter, oracle) {
                        if let Ok(repl_slots) =
                            build_slots(parsed.replacement.trim(), &filter, oracle)
                        {
                            let key: Vec<u8> = key_slots
                                .slots
                                .iter()
                                .flat_map(|s| s.0.iter().flat_map(|a| a.encode_chars()))
                                .collect::<String>()
                                .into_bytes();
                            let replacement: Vec<u8> = repl_slots
                                .slots
                                .iter()
                                .flat_map(|s| s.0.iter().flat_map(|a| a.encode_chars()))
                                .collect::<String>()
                                .into_bytes();
                            compiled.push(CompiledRule {
                                key_len: key.len(),
                                key,
                                pre_context_kind: crate::model::ContextKind::None,
                                pre_context: Vec::new(),
                                pre_context_len: 0,
                                pre_context_max_len: 0,
                                post_context_kind: crate::model::ContextKind::None,
                                post_context: Vec::new(),
                                post_context_len: 0,
                                post_context_max_len: 0,
                                groups: Vec::new(),
                                groups_len: 0,
                                replacement_len: replacement.len(),
                                replacement,
                                revisit_offset: repl_slots.revisit_offset,
                            });
                        }
                    }
                }
            }
        }
        if compiled.is_empty() {
            continue;
        }
        match supplement.attach_mode {
            AttachMode::AppendToLastStep => {
                if let Some(Step::RuleSet { rules, .. }) = steps
                    .iter_mut()
                    .rev()
                    .find(|s| matches!(s, Step::RuleSet { .. }))
                {
                    rules.extend(compiled);
                } else {
                    steps.push(Step::RuleSet {
                        label: "supplemental".into(),
                        rules: compiled,
                    });
                }
            }
            AttachMode::NewStep => steps.push(Step::RuleSet {
                label: "supplemental".into(),
                rules: compiled,
            }),
        }
    }

    // Linearize (spec §4.F step 8).
    let mut all_rules: Vec<CompiledRule> = Vec::new();
    let mut all_steps: Vec<StepRecord> = Vec::new();
    let mut all_transforms: Vec<TransformRecord> = Vec::new();

    for name in &reachable_order {
        let Some(steps) = step_lists.get(name) else {
            continue;
        };
        let step_index = all_steps.len();
        for step in steps {
            match step {
                Step::RuleSet { label, rules } => {
                    let rule_index = all_rules.len();
                    all_rules.extend(rules.iter().cloned());
                    all_steps.push(StepRecord {
                        rule_index: rule_index as i64,
                        rule_count: rules.len() as i64,
                        payload: label.clone(),
                    });
                }
                Step::Delegate { target } => {
                    all_steps.push(StepRecord {
                        rule_index: -1,
                        rule_count: -1,
                        payload: target.clone(),
                    });
                }
                Step::Normalize(kind) => {
                    all_steps.push(StepRecord {
                        rule_index: -1,
                        rule_count: -1,
                        payload: normalize_payload(*kind).into(),
                    });
                }
            }
        }
        let step_count = all_steps.len() - step_index;
        let internal = !sinks.contains(name);
        all_transforms.push(TransformRecord {
            name: name.as_str().into(),
            internal,
            step_index,
            step_count,
        });
    }

    Ok(LinkedTables {
        transforms: all_transforms,
        steps: all_steps,
        rules: all_rules,
    })
}

fn normalize_payload(kind: NormalizeKind) -> &'static str {
    match kind {
        NormalizeKind::Nfd => "nfd",
        NormalizeKind::Nfkd => "nfkd",
        NormalizeKind::Nfc => "nfc",
        NormalizeKind::Nfkc => "nfkc",
        NormalizeKind::Lowercase => "lower",
        NormalizeKind::Uppercase => "upper",
        NormalizeKind::Titlecase => "title",
        NormalizeKind::StripCombiningMarks => "strip_combining_marks",
    }
}

