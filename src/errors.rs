//! Error taxonomy.
//!
//! Errors fall into three groups, matching the three ways bad input can reach
//! the engine:
//!
//! - [`CompileError`]: a grammar file failed to compile. Syntax errors carry
//!   line and column; semantic errors (undefined or cyclic set definitions)
//!   carry the offending set names.
//! - [`DocumentError`]: a cohort/reading stream failed to parse. Carries the
//!   1-based line number.
//! - [`InvalidTagError`]: a tag name handed to the interner was rejected.
//!
//! Rule *application* has no error type on purpose: once a grammar compiled
//! and a document parsed, running rules is total. The only runtime condition
//! worth reporting is a section hitting its pass cap, and that is a warning
//! plus a flag on `RunMetrics`, not a failure.

use thiserror::Error;

/// Errors produced while compiling a grammar file into a `RuleSet`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CompileError {
    /// Malformed grammar syntax.
    #[error("syntax error at line {line}, column {column}: {message}")]
    Syntax { line: usize, column: usize, message: String },

    /// A rule or set expression referenced a set name that is never defined.
    #[error("undefined set '{name}' referenced at line {line}")]
    UndefinedSet { name: String, line: usize },

    /// Set definitions reference each other cyclically.
    #[error("cyclic set definition: {}", cycle.join(" -> "))]
    CyclicSet { cycle: Vec<String> },

    /// A tag inside the grammar was rejected by the interner.
    #[error("invalid tag at line {line}: {source}")]
    InvalidTag {
        line: usize,
        #[source]
        source: InvalidTagError,
    },

    /// The grammar file could not be read.
    #[error("failed to read grammar: {message}")]
    Io { message: String },
}

/// Errors produced while parsing a document stream.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DocumentError {
    /// Malformed document syntax (missing quotes, bad indentation, a reading
    /// line with no preceding cohort, and similar).
    #[error("document syntax error at line {line}: {message}")]
    Syntax { line: usize, message: String },

    /// A tag inside the document was rejected by the interner.
    #[error("invalid tag at line {line}: {source}")]
    InvalidTag {
        line: usize,
        #[source]
        source: InvalidTagError,
    },
}

/// A tag name the interner refuses to accept.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InvalidTagError {
    #[error("tag name is empty")]
    Empty,

    #[error("tag name contains a NUL byte")]
    Nul,
}
