//! Component E: the slot/group construction state machine (spec §4.E,
//! §9 "Slot/group construction is a small state machine").

use crate::charset::{decode_numeric_entity, solve};
use crate::codepoint_set::CodePointSet;
use crate::error::ParseError;
use crate::model::{Group, Slot, SlotAtom};
use crate::tokenizer::{scan_transform_side, TransformToken};
use crate::unicode_oracle::UnicodeOracle;

pub struct SlotResult {
    pub slots: Vec<Slot>,
    pub groups: Vec<Group>,
    pub revisit_offset: i32,
}

enum MachineState {
    Outside,
    InsideGroup { start_slot: usize },
}

/// Converts a token stream into `(slots, revisit_offset, groups)`
/// (spec §4.E). `filter` and `oracle` are needed to resolve bracket
/// expressions encountered mid-side into one alternation slot.
pub fn build_slots(
    text: &str,
    filter: &CodePointSet,
    oracle: &dyn UnicodeOracle,
) -> Result<SlotResult, ParseError> {
    let tokens = scan_transform_side(text)?;

    let mut slots: Vec<Slot> = Vec::new();
    let mut groups: Vec<Group> = Vec::new();
    let mut state = MachineState::Outside;
    let mut revisiting = false;
    let mut revisit_offset = 0i32;

    let mut i = 0usize;
    while i < tokens.len() {
        match &tokens[i] {
            TransformToken::OpenSet => {
                let mut depth = 1i32;
                let mut j = i + 1;
                let mut inner_tokens_end = j;
                // Re-scan raw text is awkward from tokens; instead track
                // depth over OpenSet/CloseSet tokens directly.
                while j < tokens.len() && depth > 0 {
                    match &tokens[j] {
                        TransformToken::OpenSet => depth += 1,
                        TransformToken::CloseSet => depth -= 1,
                        _ => {}
                    }
                    j += 1;
                    inner_tokens_end = j;
                }
                if depth != 0 {
                    return Err(ParseError::UnbalancedBracket {
                        expr: text.to_string(),
                    });
                }
                let bracket_text = render_bracket(&tokens[i..inner_tokens_end]);
                let solved = solve(&bracket_text, filter, oracle)?;
                let mut atoms: Vec<SlotAtom> =
                    solved.chars.chars().map(SlotAtom::Char).collect();
                if solved.word_boundary_present {
                    atoms.push(SlotAtom::WordBoundary);
                }
                if atoms.is_empty() {
                    atoms.push(SlotAtom::EmptyTransition);
                }
                push_slot(&mut slots, Slot::alternatives(atoms), revisiting, &mut revisit_offset);
                i = inner_tokens_end;
                continue;
            }
            TransformToken::CloseSet => {
                return Err(ParseError::UnbalancedBracket {
                    expr: text.to_string(),
                });
            }
            TransformToken::OpenGroup => {
                state = MachineState::InsideGroup {
                    start_slot: slots.len(),
                };
            }
            TransformToken::CloseGroup => {
                if let MachineState::InsideGroup { start_slot } = state {
                    groups.push(Group {
                        start: start_slot,
                        end: slots.len(),
                    });
                    state = MachineState::Outside;
                } else {
                    return Err(ParseError::InvalidGroup {
                        detail: "close-group with no matching open-group".to_string(),
                    });
                }
            }
            TransformToken::Optional => {
                if let Some(last) = slots.last_mut() {
                    last.push_alternative(SlotAtom::EmptyTransition);
                } else {
                    return Err(ParseError::InvalidGroup {
                        detail: "'?' with no preceding slot".to_string(),
                    });
                }
            }
            TransformToken::Star => {
                push_slot(
                    &mut slots,
                    Slot::single(SlotAtom::RepeatZero),
                    revisiting,
                    &mut revisit_offset,
                );
            }
            TransformToken::Plus => {
                push_slot(
                    &mut slots,
                    Slot::single(SlotAtom::RepeatOne),
                    revisiting,
                    &mut revisit_offset,
                );
            }
            TransformToken::GroupRef(n) => {
                push_slot(
                    &mut slots,
                    Slot::single(SlotAtom::GroupIndicator(*n)),
                    revisiting,
                    &mut revisit_offset,
                );
            }
            TransformToken::Revisit => {
                revisiting = true;
            }
            TransformToken::QuotedString(s) => {
                for ch in s.chars() {
                    push_slot(
                        &mut slots,
                        Slot::single(SlotAtom::Char(ch)),
                        revisiting,
                        &mut revisit_offset,
                    );
                }
            }
            TransformToken::QuoteEscape => {
                push_slot(
                    &mut slots,
                    Slot::single(SlotAtom::Char('\'')),
                    revisiting,
                    &mut revisit_offset,
                );
            }
            TransformToken::Escaped(c) => {
                push_slot(
                    &mut slots,
                    Slot::single(SlotAtom::Char(*c)),
                    revisiting,
                    &mut revisit_offset,
                );
            }
            TransformToken::UnicodeEscape(c) => {
                push_slot(
                    &mut slots,
                    Slot::single(SlotAtom::Char(*c)),
                    revisiting,
                    &mut revisit_offset,
                );
            }
            TransformToken::HtmlEntity(c) => {
                push_slot(
                    &mut slots,
                    Slot::single(SlotAtom::Char(*c)),
                    revisiting,
                    &mut revisit_offset,
                );
            }
            TransformToken::Char(c) => {
                // Skip lone surrogate-pair halves (bug-compatible BMP scope, §9).
                if !(0xD800..=0xDFFF).contains(&(*c as u32)) {
                    push_slot(
                        &mut slots,
                        Slot::single(SlotAtom::Char(*c)),
                        revisiting,
                        &mut revisit_offset,
                    );
                }
            }
        }
        i += 1;
    }

    if matches!(state, MachineState::InsideGroup { .. }) {
        return Err(ParseError::InvalidGroup {
            detail: "unclosed group".to_string(),
        });
    }

    for g in &groups {
        if g.start > g.end || g.end > slots.len() {
            return Err(ParseError::InvalidGroup {
                detail: format!("group ({}, {}) out of range for {} slots", g.start, g.end, slots.len()),
            });
        }
    }

    Ok(SlotResult {
        slots,
        groups,
        revisit_offset,
    })
}

fn push_slot(slots: &mut Vec<Slot>, slot: Slot, revisiting: bool, revisit_offset: &mut i32) {
    slots.push(slot);
    if revisiting {
        *revisit_offset += 1;
    }
}

/// Reconstructs a bracket expression's source text from its tokens well
/// enough for the character-set solver to re-scan it. Used only for the
/// nested-set path where `build_slots` has already tokenized the side.
fn render_bracket(tokens: &[TransformToken]) -> String {
    let mut s = String::new();
    for t in tokens {
        match t {
            TransformToken::OpenSet => s.push('['),
            TransformToken::CloseSet => s.push(']'),
            TransformToken::Char(c) => s.push(*c),
            TransformToken::Escaped(c) => {
                s.push('\\');
                s.push(*c);
            }
            TransformToken::UnicodeEscape(c) => {
                s.push_str(&format!("\\u{:04X}", *c as u32));
            }
            TransformToken::QuotedString(text) => {
                s.push('\'');
                s.push_str(text);
                s.push('\'');
            }
            TransformToken::QuoteEscape => s.push_str("''"),
            TransformToken::GroupRef(n) => s.push_str(&format!("${n}")),
            TransformToken::HtmlEntity(c) => {
                if let Some(decoded) = decode_numeric_entity(&c.to_string()) {
                    s.push(decoded);
                } else {
                    s.push(*c);
                }
            }
            TransformToken::Star => s.push('*'),
            TransformToken::Plus => s.push('+'),
            TransformToken::Optional => s.push('?'),
            TransformToken::OpenGroup => s.push('('),
            TransformToken::CloseGroup => s.push(')'),
            TransformToken::Revisit => s.push('|'),
        }
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::unicode_oracle::StaticUnicodeOracle;

    #[test]
    fn simple_literal_is_one_slot() {
        let oracle = StaticUnicodeOracle::new();
        let filter = CodePointSet::full_bmp();
        let result = build_slots("a", &filter, &oracle).unwrap();
        assert_eq!(result.slots.len(), 1);
        assert_eq!(result.slots[0].0, vec![SlotAtom::Char('a')]);
    }

    #[test]
    fn group_refs_emit_group_indicator_slots() {
        let oracle = StaticUnicodeOracle::new();
        let filter = CodePointSet::full_bmp();
        let result = build_slots("$2$1", &filter, &oracle).unwrap();
        assert_eq!(
            result.slots,
            vec![
                Slot::single(SlotAtom::GroupIndicator(2)),
                Slot::single(SlotAtom::GroupIndicator(1)),
            ]
        );
    }

    #[test]
    fn parenthesized_spans_record_groups() {
        let oracle = StaticUnicodeOracle::new();
        let filter = CodePointSet::full_bmp();
        let result = build_slots("(a)(b)", &filter, &oracle).unwrap();
        assert_eq!(result.slots.len(), 2);
        assert_eq!(
            result.groups,
            vec![Group { start: 0, end: 1 }, Group { start: 1, end: 2 }]
        );
    }

    #[test]
    fn optional_marks_empty_transition_on_same_slot() {
        let oracle = StaticUnicodeOracle::new();
        let filter = CodePointSet::full_bmp();
        let result = build_slots("a?", &filter, &oracle).unwrap();
        assert_eq!(result.slots.len(), 1);
        assert_eq!(
            result.slots[0].0,
            vec![SlotAtom::Char('a'), SlotAtom::EmptyTransition]
        );
    }

    #[test]
    fn unclosed_group_is_an_error() {
        let oracle = StaticUnicodeOracle::new();
        let filter = CodePointSet::full_bmp();
        assert!(build_slots("(a", &filter, &oracle).is_err());
    }
}
