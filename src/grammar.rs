//! Grammar compilation.
//!
//! This module is the *static* side of the crate: everything that happens
//! once per grammar, before any document is touched.
//!
//! ```text
//! grammar text
//!      │
//!      ▼
//!  lexer.rs          tokens with line/column
//!      │
//!      ▼
//!  parser.rs         statements: DELIMITERS, LIST/SET, sections, rules
//!      │                (set references still by name)
//!      ▼
//!  sets.rs           set algebra evaluated, cycles detected
//!      │
//!      ▼
//!  ruleset.rs        RuleSet: resolved sections + closed tag-sets
//! ```
//!
//! Compilation resolves every named set to a closed set of tag combinations,
//! so rule execution never re-parses text and never looks anything up by
//! name. All compile-time failures carry positions; see
//! [`CompileError`](crate::errors::CompileError).

#[path = "grammar/lexer.rs"]
mod lexer;
#[path = "grammar/parser.rs"]
mod parser;
#[path = "grammar/ruleset.rs"]
mod ruleset;
#[path = "grammar/sets.rs"]
mod sets;

pub use parser::compile;
pub use ruleset::{Rule, RuleKind, RuleSet, Section, SectionKind, Test, TestFlags};
