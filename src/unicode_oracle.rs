//! Component A: the Unicode oracle adapter (spec §4.A).
//!
//! Wraps `unicode-character-database`'s range tables -- the same crate
//! `earleybird::unicode_ranges` leans on for its `UnicodeRange` lookups --
//! behind the `category`/`script`/`block`/`word_break` surface the rest of
//! the compiler expects. Two non-standard properties (`ideographic`,
//! `logical_order_exception`) are compiled in from literal ranges, exactly
//! as the original Python implementation does.

use std::collections::HashMap;

use unicode_character_database::general_category as gc;

use crate::codepoint_set::CodePointSet;
use crate::error::ParseError;

pub trait UnicodeOracle {
    fn chars_of_property(&self, name: &str, value: &str) -> Result<CodePointSet, ParseError>;
    fn canonicalize_property_name(&self, s: &str) -> String;
    fn canonicalize_property_value(&self, name: &str, s: &str) -> String;
    fn control_chars(&self) -> &CodePointSet;
}

fn ranges_for_general_category(code: &str) -> Option<&'static [(u32, u32)]> {
    Some(match code {
        "Lu" => gc::UPPERCASE_LETTER,
        "Ll" => gc::LOWERCASE_LETTER,
        "Lt" => gc::TITLECASE_LETTER,
        "Lm" => gc::MODIFIER_LETTER,
        "Lo" => gc::OTHER_LETTER,
        "L" => gc::LETTER,
        "Mn" => gc::NONSPACING_MARK,
        "Mc" => gc::SPACING_MARK,
        "Me" => gc::ENCLOSING_MARK,
        "M" => gc::MARK,
        "Nd" => gc::DECIMAL_NUMBER,
        "Nl" => gc::LETTER_NUMBER,
        "No" => gc::OTHER_NUMBER,
        "N" => gc::NUMBER,
        "Pc" => gc::CONNECTOR_PUNCTUATION,
        "Pd" => gc::DASH_PUNCTUATION,
        "Ps" => gc::OPEN_PUNCTUATION,
        "Pe" => gc::CLOSE_PUNCTUATION,
        "Pi" => gc::INITIAL_PUNCTUATION,
        "Pf" => gc::FINAL_PUNCTUATION,
        "Po" => gc::OTHER_PUNCTUATION,
        "P" => gc::PUNCTUATION,
        "Sm" => gc::MATH_SYMBOL,
        "Sc" => gc::CURRENCY_SYMBOL,
        "Sk" => gc::MODIFIER_SYMBOL,
        "So" => gc::OTHER_SYMBOL,
        "S" => gc::SYMBOL,
        "Zs" => gc::SPACE_SEPARATOR,
        "Zl" => gc::LINE_SEPARATOR,
        "Zp" => gc::PARAGRAPH_SEPARATOR,
        "Z" => gc::SEPARATOR,
        "Cc" => gc::CONTROL,
        "Cf" => gc::FORMAT,
        "Cs" => gc::SURROGATE,
        "Co" => gc::PRIVATE_USE,
        "Cn" => gc::UNASSIGNED,
        "C" => gc::OTHER,
        _ => return None,
    })
}

/// Well-known Unicode block ranges, restricted to the blocks CLDR's Latin
/// transforms actually reference. Hardcoded rather than crate-sourced
/// because block tables aren't as uniformly exposed as general category.
const BLOCKS: &[(&str, u32, u32)] = &[
    ("basic latin", 0x0000, 0x007F),
    ("latin-1 supplement", 0x0080, 0x00FF),
    ("latin extended-a", 0x0100, 0x017F),
    ("latin extended-b", 0x0180, 0x024F),
    ("combining diacritical marks", 0x0300, 0x036F),
    ("greek and coptic", 0x0370, 0x03FF),
    ("cyrillic", 0x0400, 0x04FF),
    ("cyrillic supplement", 0x0500, 0x052F),
    ("armenian", 0x0530, 0x058F),
    ("hebrew", 0x0590, 0x05FF),
    ("arabic", 0x0600, 0x06FF),
    ("devanagari", 0x0900, 0x097F),
    ("bengali", 0x0980, 0x09FF),
    ("gurmukhi", 0x0A00, 0x0A7F),
    ("gujarati", 0x0A80, 0x0AFF),
    ("oriya", 0x0B00, 0x0B7F),
    ("tamil", 0x0B80, 0x0BFF),
    ("telugu", 0x0C00, 0x0C7F),
    ("kannada", 0x0C80, 0x0CFF),
    ("malayalam", 0x0D00, 0x0D7F),
    ("thai", 0x0E00, 0x0E7F),
    ("lao", 0x0E80, 0x0EFF),
    ("tibetan", 0x0F00, 0x0FFF),
    ("georgian", 0x10A0, 0x10FF),
    ("hangul jamo", 0x1100, 0x11FF),
    ("hiragana", 0x3040, 0x309F),
    ("katakana", 0x30A0, 0x30FF),
    ("cjk unified ideographs", 0x4E00, 0x9FFF),
    ("hangul syllables", 0xAC00, 0xD7A3),
];

fn ranges_for_block(name: &str) -> Option<(u32, u32)> {
    BLOCKS
        .iter()
        .find(|(n, _, _)| *n == name)
        .map(|(_, lo, hi)| (*lo, *hi))
}

/// Concrete oracle implementation backed by `unicode-character-database`
/// plus the literal tables above.
pub struct StaticUnicodeOracle {
    control_chars: CodePointSet,
    property_aliases: HashMap<String, String>,
    category_aliases: HashMap<String, String>,
    ideographic: CodePointSet,
    logical_order_exception: CodePointSet,
}

impl StaticUnicodeOracle {
    pub fn new() -> Self {
        let mut control_chars = CodePointSet::new();
        for &(lo, hi) in gc::CONTROL {
            control_chars.union_with(&CodePointSet::from_iter(lo..=hi));
        }
        for &(lo, hi) in gc::UNASSIGNED {
            control_chars.union_with(&CodePointSet::from_iter(lo..=hi));
        }
        for &(lo, hi) in gc::SURROGATE {
            control_chars.union_with(&CodePointSet::from_iter(lo..=hi));
        }

        let mut property_aliases = HashMap::new();
        property_aliases.insert("gc".to_string(), "general_category".to_string());
        property_aliases.insert("sc".to_string(), "script".to_string());
        property_aliases.insert("blk".to_string(), "block".to_string());
        property_aliases.insert("ccc".to_string(), "canonical_combining_class".to_string());
        property_aliases.insert("wb".to_string(), "word_break".to_string());

        let mut category_aliases = HashMap::new();
        for (long, short) in [
            ("letter", "L"),
            ("lower", "Ll"),
            ("lowercase", "Ll"),
            ("lowercaseletter", "Ll"),
            ("lowercase_letter", "Ll"),
            ("upper", "Lu"),
            ("uppercase", "Lu"),
            ("uppercaseletter", "Lu"),
            ("uppercase_letter", "Lu"),
            ("title", "Lt"),
            ("titlecaseletter", "Lt"),
            ("titlecase_letter", "Lt"),
            ("nonspacingmark", "Mn"),
            ("nonspacing_mark", "Mn"),
            ("mark", "M"),
            ("combiningmark", "M"),
            ("decimalnumber", "Nd"),
            ("decimal_number", "Nd"),
        ] {
            category_aliases.insert(long.to_string(), short.to_string());
        }

        let ideographic: CodePointSet = ['〆', '〇']
            .into_iter()
            .chain('〡'..='〩')
            .chain('〸'..='〺')
            .chain('㐀'..='䶵')
            .chain('一'..='鿌')
            .chain('豈'..='舘')
            .chain('並'..='龎')
            .collect();

        let logical_order_exception: CodePointSet = ('เ'..='ไ')
            .chain('ເ'..='ໄ')
            .chain(['ꪵ', 'ꪶ', 'ꪹ', 'ꪻ', 'ꪼ'])
            .collect();

        Self {
            control_chars,
            property_aliases,
            category_aliases,
            ideographic,
            logical_order_exception,
        }
    }

    fn script_ranges(name: &str) -> Option<CodePointSet> {
        // Conservative set of scripts this compiler actually needs to
        // recognize (the `script_transliterators` table in script_table.rs
        // drives which are relevant). Ranges are the well-known primary
        // Unicode block for that script in the BMP.
        let (lo, hi): (u32, u32) = match name {
            "latin" => return Some(
                CodePointSet::from_range('A', 'Z')
                    .union(&CodePointSet::from_range('a', 'z'))
                    .union(&CodePointSet::from_iter(0x00C0u32..=0x024F))
                    .union(&CodePointSet::from_iter(0x1E00u32..=0x1EFF)),
            ),
            "greek" => (0x0370, 0x03FF),
            "cyrillic" => (0x0400, 0x04FF),
            "armenian" => (0x0530, 0x058F),
            "hebrew" => (0x0590, 0x05FF),
            "arabic" => (0x0600, 0x06FF),
            "devanagari" => (0x0900, 0x097F),
            "bengali" => (0x0980, 0x09FF),
            "gurmukhi" => (0x0A00, 0x0A7F),
            "gujarati" => (0x0A80, 0x0AFF),
            "oriya" => (0x0B00, 0x0B7F),
            "tamil" => (0x0B80, 0x0BFF),
            "telugu" => (0x0C00, 0x0C7F),
            "kannada" => (0x0C80, 0x0CFF),
            "malayalam" => (0x0D00, 0x0D7F),
            "sinhala" => (0x0D80, 0x0DFF),
            "thai" => (0x0E00, 0x0E7F),
            "lao" => (0x0E80, 0x0EFF),
            "tibetan" => (0x0F00, 0x0FFF),
            "myanmar" => (0x1000, 0x109F),
            "georgian" => (0x10A0, 0x10FF),
            "ethiopic" => (0x1200, 0x137F),
            "cherokee" => (0x13A0, 0x13FF),
            "canadian_aboriginal" => (0x1400, 0x167F),
            "ogham" => (0x1680, 0x169F),
            "runic" => (0x16A0, 0x16FF),
            "hiragana" => (0x3040, 0x309F),
            "katakana" => (0x30A0, 0x30FF),
            "bopomofo" => (0x3100, 0x312F),
            "hangul" => (0xAC00, 0xD7A3),
            "han" => (0x4E00, 0x9FFF),
            "common" => return Some(CodePointSet::full_bmp()),
            _ => return None,
        };
        Some(CodePointSet::from_iter(lo..=hi))
    }

    fn word_break_ranges(value: &str) -> Option<CodePointSet> {
        // Approximate Word_Break classes, sufficient for CLDR's limited use
        // of this property inside transform filters.
        match value {
            "ALetter" => Some(
                CodePointSet::from_range('A', 'Z')
                    .union(&CodePointSet::from_range('a', 'z')),
            ),
            "Numeric" => Some(CodePointSet::from_range('0', '9')),
            "Katakana" => Some(CodePointSet::from_iter(0x30A0u32..=0x30FF)),
            _ => None,
        }
    }
}

impl Default for StaticUnicodeOracle {
    fn default() -> Self {
        Self::new()
    }
}

impl UnicodeOracle for StaticUnicodeOracle {
    fn chars_of_property(&self, name: &str, value: &str) -> Result<CodePointSet, ParseError> {
        let name = self.canonicalize_property_name(name);
        let value = self.canonicalize_property_value(&name, value);
        match name.as_str() {
            "general_category" => {
                let canon = self
                    .category_aliases
                    .get(&value.to_lowercase())
                    .cloned()
                    .unwrap_or(value.clone());
                ranges_for_general_category(&canon)
                    .map(|ranges| ranges.iter().flat_map(|&(lo, hi)| lo..=hi).collect())
                    .ok_or_else(|| ParseError::UnknownProperty { name: value.clone() })
            }
            "script" => Self::script_ranges(&value.to_lowercase())
                .ok_or_else(|| ParseError::UnknownProperty { name: value.clone() }),
            "block" => ranges_for_block(&value.to_lowercase())
                .map(|(lo, hi)| CodePointSet::from_iter(lo..=hi))
                .ok_or_else(|| ParseError::UnknownProperty { name: value.clone() }),
            "word_break" => Self::word_break_ranges(&value)
                .ok_or_else(|| ParseError::UnknownProperty { name: value.clone() }),
            "ideographic" => Ok(self.ideographic.clone()),
            "logical_order_exception" => Ok(self.logical_order_exception.clone()),
            _ => Err(ParseError::UnknownProperty { name }),
        }
    }

    fn canonicalize_property_name(&self, s: &str) -> String {
        let lower = s.to_lowercase().replace('-', "_").replace(' ', "_");
        self.property_aliases
            .get(&lower)
            .cloned()
            .unwrap_or(lower)
    }

    fn canonicalize_property_value(&self, _name: &str, s: &str) -> String {
        s.trim().to_string()
    }

    fn control_chars(&self) -> &CodePointSet {
        &self.control_chars
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn general_category_alias_resolves() {
        let oracle = StaticUnicodeOracle::new();
        let set = oracle.chars_of_property("gc", "lower").unwrap();
        assert!(!set.is_empty());
    }

    #[test]
    fn script_lookup_is_case_insensitive() {
        let oracle = StaticUnicodeOracle::new();
        let a = oracle.chars_of_property("script", "Cyrillic").unwrap();
        let b = oracle.chars_of_property("script", "cyrillic").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn unknown_property_is_an_error() {
        let oracle = StaticUnicodeOracle::new();
        assert!(oracle.chars_of_property("general_category", "Zzzz").is_err());
    }
}
