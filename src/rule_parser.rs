//! Component D: per-file rule parsing (spec §4.D). Ingests the raw rule
//! text nodes of one transform XML file, resolves variables and the
//! ambient filter, and produces parsed sides ready for component E.

use crate::charset::solve;
use crate::codepoint_set::CodePointSet;
use crate::config::CompilerConfig;
use crate::error::ParseError;
use crate::model::{ContextKind, Direction, RawRule};
use crate::tokenizer::{scan_rule_structure, RuleToken};
use crate::unicode_oracle::UnicodeOracle;
use crate::variables::{VariableTable, HAN_START_VAR, WORD_BOUNDARY_VAR};

/// A fully parsed transform rule, ready for slot/group construction.
pub struct ParsedRule {
    pub pre_context: String,
    pub body: String,
    pub post_context: String,
    pub pre_context_kind: ContextKind,
    pub post_context_kind: ContextKind,
    pub replacement: String,
}

/// Classifies one raw rule text node (spec §4.D step 4). Priority order:
/// pre-transform, assignment, transform.
pub fn classify_rule(text: &str) -> Result<RawRule, ParseError> {
    let text = text.trim();

    if let Some(rest) = text.strip_prefix("::") {
        return Ok(RawRule::PreTransform {
            direction: Direction::PreTransform,
            payload: rest.trim().to_string(),
        });
    }

    if let Some(eq) = text.find('=') {
        let (lhs, rhs) = text.split_at(eq);
        let lhs = lhs.trim();
        if let Some(name) = lhs.strip_prefix('$') {
            if !name.trim().is_empty() {
                return Ok(RawRule::Assignment {
                    name: name.trim().to_string(),
                    rhs: rhs[1..].trim().to_string(),
                });
            }
        }
    }

    for (marker, direction) in [
        ("<>", Direction::Bidirectional),
        ("\u{2194}", Direction::Bidirectional),
        ("\u{2192}", Direction::Forward),
        (">", Direction::Forward),
        ("\u{2190}", Direction::Backward),
        ("<", Direction::Backward),
    ] {
        if let Some(pos) = text.find(marker) {
            let lvalue = text[..pos].trim().to_string();
            let rvalue = text[pos + marker.len()..].trim().to_string();
            return Ok(RawRule::Transform {
                direction,
                lvalue,
                rvalue,
            });
        }
    }

    Err(ParseError::UnrecognizedRuleShape {
        rule: text.to_string(),
    })
}

/// Strips a trailing `;` and any `#` comment from a raw rule line text
/// node (spec §4.D step 2). Does not join backslash continuations --
/// the caller joins those across rule nodes before calling this.
pub fn strip_trailing(text: &str) -> String {
    let without_comment = match find_unquoted_hash(text) {
        Some(idx) => &text[..idx],
        None => text,
    };
    without_comment.trim_end().trim_end_matches(';').trim().to_string()
}

fn find_unquoted_hash(text: &str) -> Option<usize> {
    let mut in_quote = false;
    for (i, c) in text.char_indices() {
        match c {
            '\'' => in_quote = !in_quote,
            '#' if !in_quote => return Some(i),
            _ => {}
        }
    }
    None
}

/// Applies the hardcoded `rule_map` substitution table (spec §4.D step
/// 3). Entries are byte-for-byte from the original, preserved per the
/// Open Question resolution in SPEC_FULL.md §9.
pub fn apply_rule_map(text: &str, config: &CompilerConfig) -> String {
    config
        .rule_map
        .iter()
        .find(|(from, _)| from == text)
        .map(|(_, to)| to.clone())
        .unwrap_or_else(|| text.to_string())
}

/// Splits a side into `pre_context | body | post_context` using the
/// rule-structure scanner (spec §4.D step 7). `{` and `}` inside a `[...]`
/// set are not context delimiters -- `scan_rule_structure` already
/// accounts for this via its own bracket depth counter.
pub fn split_context(side: &str) -> Result<(String, String, String), ParseError> {
    let tokens = scan_rule_structure(side)?;

    let mut pre = String::new();
    let mut body = String::new();
    let mut post = String::new();
    let mut seen_before = false;
    let mut seen_after = false;

    for token in tokens {
        let (target, rendered) = match token {
            RuleToken::BeforeContext => {
                seen_before = true;
                continue;
            }
            RuleToken::AfterContext => {
                seen_after = true;
                continue;
            }
            RuleToken::Escaped(c) => (target_for(seen_before, seen_after), format!("\\{c}")),
            RuleToken::OpenSet => (target_for(seen_before, seen_after), "[".to_string()),
            RuleToken::CloseSet => (target_for(seen_before, seen_after), "]".to_string()),
            RuleToken::OpenGroup => (target_for(seen_before, seen_after), "(".to_string()),
            RuleToken::CloseGroup => (target_for(seen_before, seen_after), ")".to_string()),
            RuleToken::Char(c) => (target_for(seen_before, seen_after), c.to_string()),
        };
        match target {
            Segment::Pre => pre.push_str(&rendered),
            Segment::Body => body.push_str(&rendered),
            Segment::Post => post.push_str(&rendered),
        }
    }

    Ok((pre, body, post))
}

enum Segment {
    Pre,
    Body,
    Post,
}

fn target_for(seen_before: bool, seen_after: bool) -> Segment {
    if !seen_before {
        Segment::Pre
    } else if !seen_after {
        Segment::Body
    } else {
        Segment::Post
    }
}

/// Classifies a context string (spec §4.D step 7, last bullet; §8 inv. 9-10).
pub fn classify_context(ctx: &str) -> ContextKind {
    if ctx.is_empty() {
        return ContextKind::None;
    }
    if ctx.trim() == format!("${WORD_BOUNDARY_VAR}") || ctx == "\u{01}" {
        return ContextKind::WordBoundary;
    }
    if ctx.contains('[') && !ctx.contains("\\[") {
        return ContextKind::RegexLike;
    }
    ContextKind::Literal
}

/// Whether a side references the Han-start sentinel (spec §4.D step 7,
/// second bullet: "if either side references the Han-start sentinel,
/// drop the rule").
pub fn references_han_start(side: &str) -> bool {
    side.contains(&format!("${HAN_START_VAR}"))
}

/// Processes one eligible forward/bidirectional rule (spec §4.D step 7)
/// into pre/body/post segments with classified context kinds, after
/// variable substitution on both sides.
pub fn parse_rule_sides(
    lvalue: &str,
    rvalue: &str,
    vars: &VariableTable,
) -> Result<Option<ParsedRule>, ParseError> {
    let lvalue = vars.substitute(lvalue)?;
    let rvalue = vars.substitute(rvalue)?;

    if references_han_start(&lvalue) || references_han_start(&rvalue) {
        return Ok(None);
    }

    let (pre_context, body, post_context) = split_context(&lvalue)?;

    if body.trim().is_empty() && pre_context.trim().is_empty() && post_context.trim().is_empty() {
        return Ok(None);
    }

    let pre_context_kind = classify_context(pre_context.trim());
    let post_context_kind = classify_context(post_context.trim());

    Ok(Some(ParsedRule {
        pre_context,
        body,
        post_context,
        pre_context_kind,
        post_context_kind,
        replacement: rvalue,
    }))
}

/// Updates the ambient filter from a `::[set]` preamble rule
/// (spec §4.D step 6, first bullet).
pub fn update_filter(
    payload: &str,
    current: &CodePointSet,
    oracle: &dyn UnicodeOracle,
) -> Result<CodePointSet, ParseError> {
    let solved = solve(payload, current, oracle)?;
    Ok(solved.chars)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_pre_transform() {
        let rule = classify_rule("::[[:Cyrillic:]]").unwrap();
        assert!(matches!(rule, RawRule::PreTransform { .. }));
    }

    #[test]
    fn classify_assignment() {
        let rule = classify_rule("$vowel = [aeiou]").unwrap();
        match rule {
            RawRule::Assignment { name, rhs } => {
                assert_eq!(name, "vowel");
                assert_eq!(rhs, "[aeiou]");
            }
            _ => panic!("expected assignment"),
        }
    }

    #[test]
    fn classify_transform_forward() {
        let rule = classify_rule("a > b").unwrap();
        match rule {
            RawRule::Transform { direction, lvalue, rvalue } => {
                assert_eq!(direction, Direction::Forward);
                assert_eq!(lvalue, "a");
                assert_eq!(rvalue, "b");
            }
            _ => panic!("expected transform"),
        }
    }

    #[test]
    fn strip_trailing_removes_semicolon_and_comment() {
        assert_eq!(strip_trailing("a > b ; # comment"), "a > b");
    }

    #[test]
    fn split_context_recognizes_markers() {
        let (pre, body, post) = split_context("a{b}c").unwrap();
        assert_eq!(pre, "a");
        assert_eq!(body, "b");
        assert_eq!(post, "c");
    }

    #[test]
    fn empty_context_classifies_as_none() {
        assert_eq!(classify_context(""), ContextKind::None);
    }

    #[test]
    fn bracketed_context_classifies_as_regex_like() {
        assert_eq!(classify_context("[aeiou]"), ContextKind::RegexLike);
    }
}
