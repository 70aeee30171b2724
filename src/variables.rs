//! `$name` variable expansion (spec §4.D step 5, §9 "Variables as
//! iterative substitution"). Variables are textual macros, not scoped
//! bindings: expansion is a fixed-point worklist over a `name -> body`
//! map, exactly as the design notes prescribe.

use std::collections::HashMap;

use crate::error::ParseError;

/// The two reserved sentinel variable names (spec §3). Their bodies are
/// never expanded further -- they're bound last and refer to themselves.
pub const WORD_BOUNDARY_VAR: &str = "wb";
pub const HAN_START_VAR: &str = "han_start";

pub struct VariableTable {
    values: HashMap<String, String>,
}

impl VariableTable {
    pub fn new() -> Self {
        Self {
            values: HashMap::new(),
        }
    }

    pub fn define(&mut self, name: &str, body: &str) {
        self.values.insert(name.to_string(), body.to_string());
    }

    /// Fixed-point expansion: repeatedly replace `$name` references with
    /// their bodies until no value in the table contains an expandable
    /// reference, or a cycle is detected.
    pub fn resolve(&mut self) -> Result<(), ParseError> {
        self.values.insert(
            WORD_BOUNDARY_VAR.to_string(),
            format!("${WORD_BOUNDARY_VAR}"),
        );
        self.values
            .insert(HAN_START_VAR.to_string(), format!("${HAN_START_VAR}"));

        let reserved = [WORD_BOUNDARY_VAR, HAN_START_VAR];
        let names: Vec<String> = self.values.keys().cloned().collect();

        for _ in 0..names.len() + 1 {
            let mut changed = false;
            for name in &names {
                if reserved.contains(&name.as_str()) {
                    continue;
                }
                let body = self.values.get(name).cloned().unwrap_or_default();
                let expanded = self.expand_once(&body, name, &reserved)?;
                if expanded != body {
                    self.values.insert(name.clone(), expanded);
                    changed = true;
                }
            }
            if !changed {
                return Ok(());
            }
        }

        Err(ParseError::UnresolvedVariable {
            name: "<cycle>".to_string(),
        })
    }

    fn expand_once(
        &self,
        body: &str,
        owner: &str,
        reserved: &[&str],
    ) -> Result<String, ParseError> {
        let mut out = String::with_capacity(body.len());
        let mut chars = body.chars().peekable();
        while let Some(c) = chars.next() {
            if c != '$' {
                out.push(c);
                continue;
            }
            let mut name = String::new();
            while let Some(&next) = chars.peek() {
                if next.is_alphanumeric() || next == '_' {
                    name.push(next);
                    chars.next();
                } else {
                    break;
                }
            }
            if name.is_empty() {
                out.push('$');
                continue;
            }
            if reserved.contains(&name.as_str()) {
                out.push('$');
                out.push_str(&name);
                continue;
            }
            if name == owner {
                return Err(ParseError::UnresolvedVariable { name });
            }
            match self.values.get(&name) {
                Some(value) => out.push_str(value),
                None => return Err(ParseError::UnresolvedVariable { name }),
            }
        }
        Ok(out)
    }

    /// Substitute all `$name` references in `text` using the fully
    /// resolved table (spec §4.D step 7, "substitute $var on both sides").
    pub fn substitute(&self, text: &str) -> Result<String, ParseError> {
        let reserved = [WORD_BOUNDARY_VAR, HAN_START_VAR];
        let mut out = String::with_capacity(text.len());
        let mut chars = text.chars().peekable();
        while let Some(c) = chars.next() {
            if c != '$' {
                out.push(c);
                continue;
            }
            if chars.peek().map(|c| c.is_ascii_digit()).unwrap_or(false) {
                // A `$N` group reference, not a variable -- leave untouched
                // for the transform-side scanner to pick up.
                out.push('$');
                continue;
            }
            let mut name = String::new();
            while let Some(&next) = chars.peek() {
                if next.is_alphanumeric() || next == '_' {
                    name.push(next);
                    chars.next();
                } else {
                    break;
                }
            }
            if name.is_empty() {
                out.push('$');
                continue;
            }
            if reserved.contains(&name.as_str()) {
                out.push('$');
                out.push_str(&name);
                continue;
            }
            match self.values.get(&name) {
                Some(value) => out.push_str(value),
                None => return Err(ParseError::UnresolvedVariable { name }),
            }
        }
        Ok(out)
    }
}

impl Default for VariableTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variables_referring_to_variables_resolve() {
        let mut vars = VariableTable::new();
        vars.define("a", "[bc]");
        vars.define("b", "$a d");
        vars.resolve().unwrap();
        let resolved = vars.substitute("$b").unwrap();
        assert!(!resolved.contains('$'));
        assert_eq!(resolved, "[bc] d");
    }

    #[test]
    fn unresolved_variable_is_an_error() {
        let vars = VariableTable::new();
        assert!(vars.substitute("$missing").is_err());
    }

    #[test]
    fn reserved_sentinels_never_expand() {
        let mut vars = VariableTable::new();
        vars.resolve().unwrap();
        let resolved = vars.substitute("$wb x $han_start").unwrap();
        assert_eq!(resolved, "$wb x $han_start");
    }

    #[test]
    fn self_referential_variable_is_a_cycle() {
        let mut vars = VariableTable::new();
        vars.define("a", "$b");
        vars.define("b", "$a");
        assert!(vars.resolve().is_err());
    }
}
