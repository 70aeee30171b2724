//! Compiler-wide configuration (spec §2 ambient stack). Modeled on
//! `earleybird::debug::DebugConfig`: a plain struct built with sane
//! defaults and overridable from the CLI, rather than global state.

use crate::script_table::{ScriptTable, ScriptTransliterators};

/// How a supplemental rule attaches to an existing transform
/// (spec §4.F step 7, §9 "Supplemental rules as data").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachMode {
    AppendToLastStep,
    NewStep,
}

/// One supplemental built-in rule entry: `(target_transform, attach_mode, rules)`.
#[derive(Debug, Clone)]
pub struct SupplementalRuleSet {
    pub target_transform: String,
    pub attach_mode: AttachMode,
    pub rules: Vec<String>,
}

/// Transforms excluded outright regardless of reachability (spec §4.F step 3).
pub const DEFAULT_EXCLUDED_TRANSFORMS: &[&str] =
    &["hangul-latin", "interindic-latin", "jamo-latin", "han-spacedhan"];

/// `Any-X` pre-transform names that resolve to a normalization step
/// instead of a delegation (spec §8 S4, ported from the original's
/// `UTF8PROC_TRANSFORMS`).
pub const NORMALIZATION_ALIASES: &[(&str, &str)] = &[
    ("Any-NFC", "nfc"),
    ("Any-NFD", "nfd"),
    ("Any-NFKD", "nfkd"),
    ("Any-NFKC", "nfkc"),
    ("Any-Lower", "lower"),
    ("Any-Upper", "upper"),
    ("Any-Title", "title"),
];

pub struct CompilerConfig {
    pub rule_map: Vec<(String, String)>,
    pub supplemental_rules: Vec<SupplementalRuleSet>,
    pub script_table: ScriptTable,
    pub excluded_transforms: Vec<String>,
}

impl CompilerConfig {
    pub fn new() -> Self {
        Self {
            rule_map: default_rule_map(),
            supplemental_rules: default_supplemental_rules(),
            script_table: ScriptTransliterators::default_table(),
            excluded_transforms: DEFAULT_EXCLUDED_TRANSFORMS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }

    pub fn is_excluded(&self, name: &str) -> bool {
        self.excluded_transforms.iter().any(|e| e == name)
    }
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// The hardcoded `rule_map` table (spec §4.D step 3, §9 Open Questions),
/// ported byte-for-byte from `transliteration_rules.py`.
fn default_rule_map() -> Vec<(String, String)> {
    vec![
        (
            "[:Latin:] { [:Mn:]+ \u{2192} ;".to_string(),
            ":: STRIP_MARK".to_string(),
        ),
        (
            ":: [[[:Greek:][:Mn:][:Me:]] [\\:-;?\u{00b7};\u{00b7}]] ;".to_string(),
            ":: [[[:Greek:][\u{0301}\u{0300}\u{1fbf}\u{1fbf}\u{02dc}\u{0311}\u{0340}\u{00a8}\u{037a}\u{00b4}\u{0060}\u{0340}\u{1fbf}\u{1fbe}\u{1fbd}\u{1fcf}\u{1fde}\u{1ffe}\u{0385}\u{1fed}\u{1fc1}\u{02c9}\u{02d8}]] ['\\:-;?\u{00b7};\u{00b7}]]".to_string(),
        ),
    ]
}

/// The hardcoded German-umlaut supplemental transliterations appended to
/// `latin-ascii`'s last step (spec §4.F step 7, §8 S_supplemental).
fn default_supplemental_rules() -> Vec<SupplementalRuleSet> {
    vec![SupplementalRuleSet {
        target_transform: "latin-ascii".to_string(),
        attach_mode: AttachMode::AppendToLastStep,
        rules: vec![
            "\u{00e4} > ae ;".to_string(),
            "\u{00f6} > oe ;".to_string(),
            "\u{00fc} > ue ;".to_string(),
            "\u{00df} > ss ;".to_string(),
        ],
    }]
}
