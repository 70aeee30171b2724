//! Component C: the character-set solver (spec §4.C). Resolves a
//! bracketed expression like `[[:Latin:] & [:Ll:] - [а-я]]` into a
//! concrete `CodePointSet` under an ambient filter.

use crate::codepoint_set::CodePointSet;
use crate::error::ParseError;
use crate::tokenizer::{scan_char_set, CharSetToken};
use crate::unicode_oracle::UnicodeOracle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PendingOp {
    Union,
    Intersect,
    Difference,
}

/// Result of solving a `[...]` expression: the code points plus whether
/// a `$` word-boundary marker appeared at this level (spec §4.C step 5).
pub struct SolvedSet {
    pub chars: CodePointSet,
    pub word_boundary_present: bool,
}

fn html_decimal_entity(name: &str) -> Option<char> {
    let digits = name.strip_prefix('#')?;
    let cp: u32 = if let Some(hex) = digits.strip_prefix('x').or_else(|| digits.strip_prefix('X'))
    {
        u32::from_str_radix(hex, 16).ok()?
    } else {
        digits.parse().ok()?
    };
    char::from_u32(cp)
}

/// Solves a `[...]` expression (brackets included) against `filter`.
pub fn solve(expr: &str, filter: &CodePointSet, oracle: &dyn UnicodeOracle) -> Result<SolvedSet, ParseError> {
    let trimmed = expr.trim();
    let inner = trimmed
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .ok_or_else(|| ParseError::UnbalancedBracket {
            expr: expr.to_string(),
        })?;
    solve_inner(inner, filter, oracle)
}

fn solve_inner(
    inner: &str,
    filter: &CodePointSet,
    oracle: &dyn UnicodeOracle,
) -> Result<SolvedSet, ParseError> {
    let tokens = scan_char_set(inner)?;

    let mut current_group = CodePointSet::new();
    let mut pending_op = PendingOp::Union;
    let mut negated = false;
    let mut word_boundary_present = false;
    let mut real_chars = CodePointSet::new();

    let apply = |current: &mut CodePointSet, op: PendingOp, incoming: CodePointSet| {
        *current = match op {
            PendingOp::Union => current.union(&incoming),
            PendingOp::Intersect => current.intersection(&incoming),
            PendingOp::Difference => current.difference(&incoming),
        };
    };

    for token in tokens {
        match token {
            CharSetToken::Negate => negated = true,
            CharSetToken::Intersect => pending_op = PendingOp::Intersect,
            CharSetToken::Difference => pending_op = PendingOp::Difference,
            CharSetToken::WordBoundary => word_boundary_present = true,
            CharSetToken::Range(lo, hi) => {
                let set = CodePointSet::from_range(lo, hi);
                real_chars.union_with(&set);
                apply(&mut current_group, pending_op, set);
                pending_op = PendingOp::Union;
            }
            CharSetToken::Char(c) | CharSetToken::Escaped(c) | CharSetToken::UnicodeEscape(c) => {
                let set = CodePointSet::from_char(c);
                real_chars.union_with(&set);
                apply(&mut current_group, pending_op, set);
                pending_op = PendingOp::Union;
            }
            CharSetToken::QuoteEscape => {
                let set = CodePointSet::from_char('\'');
                real_chars.union_with(&set);
                apply(&mut current_group, pending_op, set);
                pending_op = PendingOp::Union;
            }
            CharSetToken::QuotedString(s) | CharSetToken::BracketedChar(s) => {
                let set: CodePointSet = s.chars().collect();
                real_chars.union_with(&set);
                apply(&mut current_group, pending_op, set);
                pending_op = PendingOp::Union;
            }
            CharSetToken::PosixClass(name) => {
                let set = resolve_posix_class(&name, oracle)?;
                apply(&mut current_group, pending_op, set);
                pending_op = PendingOp::Union;
            }
            CharSetToken::PcreProperty { name, value } => {
                let set = oracle.chars_of_property(&name, &value)?;
                apply(&mut current_group, pending_op, set);
                pending_op = PendingOp::Union;
            }
            CharSetToken::NestedSet(text) => {
                let solved = solve_inner(&text, filter, oracle)?;
                word_boundary_present |= solved.word_boundary_present;
                apply(&mut current_group, pending_op, solved.chars);
                pending_op = PendingOp::Union;
            }
            CharSetToken::OpenSet | CharSetToken::CloseSet => {}
        }
    }

    let resolved = if negated {
        filter.difference(&current_group)
    } else {
        current_group
    };

    let scoped = resolved
        .intersection(&filter.union(&real_chars))
        .difference(oracle.control_chars());

    Ok(SolvedSet {
        chars: scoped,
        word_boundary_present,
    })
}

/// Resolves a bare `[:Name:]` POSIX class. `Name` may be a general-category
/// short code (`Lu`), a script name (`Cyrillic`), or a binary property
/// (`Ideographic`) -- tried in that order, matching the original's
/// general-category -> categories -> properties -> scripts fallthrough.
fn resolve_posix_class(name: &str, oracle: &dyn UnicodeOracle) -> Result<CodePointSet, ParseError> {
    oracle
        .chars_of_property("general_category", name)
        .or_else(|_| oracle.chars_of_property("script", name))
        .or_else(|_| oracle.chars_of_property(name, ""))
}

/// Decodes a named HTML entity or a numeric `&#NNN;`/`&#xHHHH;` form, used
/// by the rvalue/lvalue scanner (spec §4.B). Exposed here since it shares
/// the same decimal/hex entity grammar as bracketed-character escapes.
pub fn decode_numeric_entity(name: &str) -> Option<char> {
    html_decimal_entity(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::unicode_oracle::StaticUnicodeOracle;

    #[test]
    fn nested_brackets_are_idempotent() {
        let oracle = StaticUnicodeOracle::new();
        let filter = CodePointSet::full_bmp();
        let a = solve("[a-c]", &filter, &oracle).unwrap();
        let b = solve("[[a-c]]", &filter, &oracle).unwrap();
        assert_eq!(a.chars, b.chars);
    }

    #[test]
    fn intersection_is_subset() {
        let oracle = StaticUnicodeOracle::new();
        let filter = CodePointSet::full_bmp();
        let a = solve("[a-z]", &filter, &oracle).unwrap();
        let ab = solve("[a-z & b-d]", &filter, &oracle).unwrap();
        assert!(ab.chars.iter().all(|c| a.chars.contains(c)));
    }

    #[test]
    fn difference_excludes_subtrahend() {
        let oracle = StaticUnicodeOracle::new();
        let filter = CodePointSet::full_bmp();
        let ab = solve("[a-z - b-d]", &filter, &oracle).unwrap();
        let b = solve("[b-d]", &filter, &oracle).unwrap();
        assert!(ab.chars.iter().all(|c| !b.chars.contains(c)));
    }

    #[test]
    fn negation_is_filter_minus_set() {
        let oracle = StaticUnicodeOracle::new();
        let filter = CodePointSet::from_range('a', 'z');
        let neg = solve("[^a-m]", &filter, &oracle).unwrap();
        let pos = solve("[a-m]", &filter, &oracle).unwrap();
        let expected = filter.difference(&pos.chars).difference(oracle.control_chars());
        assert_eq!(neg.chars, expected);
    }

    #[test]
    fn chaining_is_left_to_right_not_precedence() {
        // `[A & B - C]` == `(A & B) - C`, not `A & (B - C)` (spec §9).
        let oracle = StaticUnicodeOracle::new();
        let filter = CodePointSet::full_bmp();
        let left_to_right = solve("[a-z & c-z - c-f]", &filter, &oracle).unwrap();
        let a = solve("[a-z]", &filter, &oracle).unwrap().chars;
        let b = solve("[c-z]", &filter, &oracle).unwrap().chars;
        let c = solve("[c-f]", &filter, &oracle).unwrap().chars;
        let expected = a.intersection(&b).difference(&c);
        assert_eq!(left_to_right.chars, expected);
    }

    #[test]
    fn posix_class_falls_through_to_script() {
        // `[:Cyrillic:]` is not a general-category code, so the solver must
        // fall through to a script lookup rather than erroring.
        let oracle = StaticUnicodeOracle::new();
        let filter = CodePointSet::full_bmp();
        let solved = solve("[[:Cyrillic:]]", &filter, &oracle).unwrap();
        assert!(solved.chars.contains('а' as u32));
    }

    #[test]
    fn word_boundary_marker_is_detected() {
        let oracle = StaticUnicodeOracle::new();
        let filter = CodePointSet::full_bmp();
        let s = solve("[a-c $]", &filter, &oracle).unwrap();
        assert!(s.word_boundary_present);
    }
}
