//! Core data model shared across components (spec §3).

use smol_str::SmolStr;

use crate::codepoint_set::CodePointSet;

/// The ambient filter scoping a transform file's rule interpretation.
/// Reset per file, replaced wholesale by a `::[set]` preamble rule.
pub type Filter = CodePointSet;

/// A single element of a parsed slot: either a literal character or one
/// of the reserved sentinels from §6, kept as a tagged variant rather
/// than a raw code point so later stages never confuse a sentinel with
/// a real character that happens to share its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotAtom {
    Char(char),
    WordBoundary,
    PreContextOpen,
    PostContextOpen,
    EmptyTransition,
    RepeatZero,
    RepeatOne,
    BeginSet,
    EndSet,
    GroupIndicator(u8),
}

impl SlotAtom {
    /// The code point this atom occupies once spliced into an emitted string.
    /// Not meaningful for `GroupIndicator`, which also carries a trailing
    /// digit string -- use `encode_chars` when building emitted output.
    pub fn to_char(self) -> char {
        match self {
            SlotAtom::Char(c) => c,
            SlotAtom::WordBoundary => crate::sentinel::WORD_BOUNDARY,
            SlotAtom::PreContextOpen => crate::sentinel::PRE_CONTEXT_OPEN,
            SlotAtom::PostContextOpen => crate::sentinel::POST_CONTEXT_OPEN,
            SlotAtom::EmptyTransition => crate::sentinel::EMPTY_TRANSITION,
            SlotAtom::RepeatZero => crate::sentinel::REPEAT_ZERO,
            SlotAtom::RepeatOne => crate::sentinel::REPEAT_ONE,
            SlotAtom::BeginSet => crate::sentinel::BEGIN_SET,
            SlotAtom::EndSet => crate::sentinel::END_SET,
            SlotAtom::GroupIndicator(_) => crate::sentinel::GROUP_INDICATOR,
        }
    }

    /// The full code point sequence this atom contributes to emitted output
    /// (spec §3: a back-reference is "a single group-indicator code point
    /// followed by the digit"). Every other atom is one code point, same as
    /// `to_char`.
    pub fn encode_chars(self) -> impl Iterator<Item = char> {
        match self {
            SlotAtom::GroupIndicator(n) => {
                let mut chars = vec![crate::sentinel::GROUP_INDICATOR];
                chars.extend(n.to_string().chars());
                itertools::Either::Left(chars.into_iter())
            }
            other => itertools::Either::Right(std::iter::once(other.to_char())),
        }
    }
}

/// A non-empty list of alternative atoms; length 1 is a single character,
/// length > 1 is a bracketed alternation (spec §3 "ParsedSide").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slot(pub Vec<SlotAtom>);

impl Slot {
    pub fn single(atom: SlotAtom) -> Self {
        Self(vec![atom])
    }

    pub fn alternatives(atoms: Vec<SlotAtom>) -> Self {
        debug_assert!(!atoms.is_empty(), "a slot must carry at least one atom");
        Self(atoms)
    }

    pub fn push_alternative(&mut self, atom: SlotAtom) {
        self.0.push(atom);
    }
}

/// A sequence of character slots (spec §3).
pub type ParsedSide = Vec<Slot>;

/// A `(start_slot, end_slot)` half-open range identifying a capture group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Group {
    pub start: usize,
    pub end: usize,
}

/// How a parsed context should be matched against input (spec §3/§8 inv. 9-10).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextKind {
    None,
    Literal,
    WordBoundary,
    RegexLike,
}

/// One rewrite's flattened, emittable form (spec §3).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledRule {
    pub key: Vec<u8>,
    pub key_len: usize,
    pub pre_context_kind: ContextKind,
    pub pre_context: Vec<u8>,
    pub pre_context_len: usize,
    pub pre_context_max_len: usize,
    pub post_context_kind: ContextKind,
    pub post_context: Vec<u8>,
    pub post_context_len: usize,
    pub post_context_max_len: usize,
    pub groups: Vec<u8>,
    pub groups_len: usize,
    pub replacement: Vec<u8>,
    pub replacement_len: usize,
    pub revisit_offset: i32,
}

/// The fixed set of normalization passes a `Normalize` step may invoke.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NormalizeKind {
    Nfd,
    Nfkd,
    Nfc,
    Nfkc,
    Lowercase,
    Uppercase,
    Titlecase,
    StripCombiningMarks,
}

/// One unit inside a transform (spec §3). `label`/`target` are `SmolStr`
/// rather than `String`: both are short, copied every time a step moves
/// between the per-file step list and the linearized `all_steps` table,
/// and almost always short enough to stay inline (the teacher reaches
/// for `SmolStr` for exactly this kind of cheap-to-clone identifier).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    RuleSet {
        label: SmolStr,
        rules: Vec<CompiledRule>,
    },
    Delegate {
        target: SmolStr,
    },
    Normalize(NormalizeKind),
}

/// A linearized step record as allocated by the linker (spec §4.F step 8):
/// `(rule_index, rule_count, label)`, with `(-1, -1, payload)` for
/// delegation/normalization steps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepRecord {
    pub rule_index: i64,
    pub rule_count: i64,
    pub payload: SmolStr,
}

/// `(name, internal_flag, step_index, step_count)` (spec §3).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformRecord {
    pub name: SmolStr,
    pub internal: bool,
    pub step_index: usize,
    pub step_count: usize,
}

/// A rule-line's declared direction (spec §3 "RawRule").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    PreTransform,
    Forward,
    Backward,
    Bidirectional,
}

/// A line from a transform file, not yet split into sides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawRule {
    /// `::Name` or `::[filter]`.
    PreTransform { direction: Direction, payload: String },
    /// `$var = rhs`.
    Assignment { name: String, rhs: String },
    /// `lvalue op rvalue`.
    Transform {
        direction: Direction,
        lvalue: String,
        rvalue: String,
    },
}
