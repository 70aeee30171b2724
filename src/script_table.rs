//! The static script → {language → transliterator names} table
//! (spec §4.G, SPEC_FULL §10.1). Ported verbatim from
//! `transliteration_rules.py`'s `script_transliterators` dict -- not
//! derived from CLDR, compiled directly into this tool.

use std::collections::HashMap;

/// `lang == None` means "the default transliterator chain for this script".
pub type ScriptTable = HashMap<&'static str, Vec<(Option<&'static str>, Vec<&'static str>)>>;

pub struct ScriptTransliterators;

impl ScriptTransliterators {
    pub fn default_table() -> ScriptTable {
        let mut t: ScriptTable = HashMap::new();

        t.insert(
            "arabic",
            vec![
                (None, vec!["arabic-latin", "arabic-latin-bgn"]),
                (Some("fa"), vec!["persian-latin-bgn"]),
                (Some("ps"), vec!["pashto-latin-bgn"]),
            ],
        );
        t.insert("armenian", vec![(None, vec!["armenian-latin-bgn"])]);
        t.insert("bengali", vec![(None, vec!["bengali-latin"])]);
        t.insert(
            "canadian_aboriginal",
            vec![(None, vec!["canadianaboriginal-latin"])],
        );
        t.insert("common", vec![(None, vec!["latin-ascii"])]);
        t.insert(
            "cyrillic",
            vec![
                (None, vec!["cyrillic-latin"]),
                (Some("be"), vec!["belarusian-latin-bgn"]),
                (Some("ru"), vec!["russian-latin-bgn"]),
                (Some("bg"), vec!["bulgarian-latin-bgn"]),
                (Some("kk"), vec!["kazakh-latin-bgn"]),
                (Some("ky"), vec!["kirghiz-latin-bgn"]),
                (Some("mk"), vec!["macedonian-latin-bgn"]),
                (Some("mn"), vec!["mongolian-latin-bgn"]),
                (Some("sr"), vec!["serbian-latin-bgn"]),
                (Some("uk"), vec!["ukrainian-latin-bgn"]),
                (Some("uz"), vec!["uzbek-latin-bgn"]),
            ],
        );
        t.insert("devanagari", vec![(None, vec!["devanagari-latin"])]);
        t.insert(
            "georgian",
            vec![(None, vec!["georgian-latin", "georgian-latin-bgn"])],
        );
        t.insert(
            "greek",
            vec![(
                None,
                vec!["greek-latin", "greek-latin-bgn", "greek_latin_ungegn"],
            )],
        );
        t.insert("gujarati", vec![(None, vec!["gujarati-latin"])]);
        t.insert("gurmukhi", vec![(None, vec!["gurmukhi-latin"])]);
        t.insert("han", vec![(None, vec!["han-latin"])]);
        t.insert("hangul", vec![(None, vec!["korean-latin-bgn"])]);
        t.insert(
            "hebrew",
            vec![(None, vec!["hebrew-latin", "hebrew-latin-bgn"])],
        );
        t.insert("hiragana", vec![(None, vec!["hiragana-latin"])]);
        t.insert("kannada", vec![(None, vec!["kannada-latin"])]);
        t.insert("katakana", vec![(None, vec!["katakana-latin-bgn"])]);
        t.insert("latin", vec![(None, vec!["latin-ascii"])]);
        t.insert("malayalam", vec![(None, vec!["malayam-latin"])]);
        t.insert("oriya", vec![(None, vec!["oriya-latin"])]);
        t.insert("tamil", vec![(None, vec!["tamil-latin"])]);
        t.insert("telugu", vec![(None, vec!["telugu-latin"])]);
        t.insert("thai", vec![(None, vec!["thai-latin"])]);

        // Scripts with no transliterator (the original's `None` entries)
        // are simply absent from this map -- `lookup` treats a miss the
        // same way the Python `if not spec: continue` does.
        t
    }

    /// Looks up the transliterator chain for `script`/`language`, falling
    /// back to the script's `None` (default) entry when no language-specific
    /// entry exists.
    pub fn lookup<'a>(table: &'a ScriptTable, script: &str, language: Option<&str>) -> Option<&'a [&'static str]> {
        let entries = table.get(script.to_lowercase().as_str())?;
        if let Some(lang) = language {
            if let Some((_, names)) = entries.iter().find(|(l, _)| *l == Some(lang)) {
                return Some(names);
            }
        }
        entries
            .iter()
            .find(|(l, _)| l.is_none())
            .map(|(_, names)| names.as_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_entry_used_when_no_language_match() {
        let table = ScriptTransliterators::default_table();
        let names = ScriptTransliterators::lookup(&table, "cyrillic", Some("fr")).unwrap();
        assert_eq!(names, &["cyrillic-latin"]);
    }

    #[test]
    fn language_specific_entry_overrides_default() {
        let table = ScriptTransliterators::default_table();
        let names = ScriptTransliterators::lookup(&table, "cyrillic", Some("ru")).unwrap();
        assert_eq!(names, &["russian-latin-bgn"]);
    }

    #[test]
    fn unknown_script_is_none() {
        let table = ScriptTransliterators::default_table();
        assert!(ScriptTransliterators::lookup(&table, "tifinagh", None).is_none());
    }
}
