//! Error taxonomy for the compiler (spec §7).
//!
//! `ParseError` is fatal and aborts the whole run; `MissingDependency`
//! and `UnreachableTransform` are logged and do not carry a payload
//! past the log line (see `transform_graph`). `IgnorableRule` has no
//! type of its own -- callers return `Ok(None)` and log instead, the
//! way `earleybird::parser` treats a previously-seen task as a no-op
//! rather than an error.

use std::fmt;
use std::path::PathBuf;

#[derive(Debug)]
pub enum ParseError {
    /// An unrecognized byte/token while scanning (component B).
    UnrecognizedToken { context: String, offset: usize },
    /// A `[` with no matching `]`, or vice versa.
    UnbalancedBracket { expr: String },
    /// A `$name` reference that never resolves, or a cycle among variables.
    UnresolvedVariable { name: String },
    /// A Unicode property/value name this oracle doesn't recognize.
    UnknownProperty { name: String },
    /// A rule line that matches none of pre-transform/assignment/transform.
    UnrecognizedRuleShape { rule: String },
    /// A group reference or slot range nonsensical in context (invariant violation).
    InvalidGroup { detail: String },
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnrecognizedToken { context, offset } => {
                write!(f, "unrecognized token at offset {offset} in: {context}")
            }
            Self::UnbalancedBracket { expr } => write!(f, "unbalanced bracket in: {expr}"),
            Self::UnresolvedVariable { name } => write!(f, "unresolved variable ${name}"),
            Self::UnknownProperty { name } => write!(f, "unknown Unicode property: {name}"),
            Self::UnrecognizedRuleShape { rule } => write!(f, "unrecognized rule shape: {rule}"),
            Self::InvalidGroup { detail } => write!(f, "invalid group: {detail}"),
        }
    }
}

impl std::error::Error for ParseError {}

/// Wraps a `ParseError` with the file it came from, for fatal abort messages.
#[derive(Debug)]
pub struct FileParseError {
    pub file: PathBuf,
    pub rule_text: Option<String>,
    pub source: ParseError,
}

impl fmt::Display for FileParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.rule_text {
            Some(rule) => write!(
                f,
                "{}: {} (rule: {rule})",
                self.file.display(),
                self.source
            ),
            None => write!(f, "{}: {}", self.file.display(), self.source),
        }
    }
}

impl std::error::Error for FileParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

/// Top-level error returned from a compiler run.
#[derive(Debug)]
pub enum CompileError {
    Io(std::io::Error),
    Parse(FileParseError),
    Xml { file: PathBuf, detail: String },
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::Parse(e) => write!(f, "{e}"),
            Self::Xml { file, detail } => write!(f, "{}: XML error: {detail}", file.display()),
        }
    }
}

impl std::error::Error for CompileError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Parse(e) => Some(e),
            Self::Xml { .. } => None,
        }
    }
}

impl From<std::io::Error> for CompileError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<FileParseError> for CompileError {
    fn from(e: FileParseError) -> Self {
        Self::Parse(e)
    }
}
