//! Public binding surface.
//!
//! The [`Applicator`] is the compile-once, run-many entry point host
//! programs use:
//!
//! ```
//! use kielo::Applicator;
//!
//! let applicator = Applicator::from_text("REMOVE (verb) IF (0 (noun)) ;").unwrap();
//! let mut doc = applicator.parse("\"<run>\"\n\t\"run\" verb\n\t\"run\" noun\n").unwrap();
//! applicator.run_rules(&mut doc);
//! assert_eq!(doc.to_string(), "\"<run>\"\n\t\"run\" noun\n");
//! ```
//!
//! An `Applicator` owns a compiled [`RuleSet`] and the tag interner for that
//! grammar; both are immutable after construction, so one `Applicator` can
//! serve many documents, including from multiple threads, each document
//! being processed independently.

use std::path::Path;
use std::sync::Arc;

use crate::document::Document;
use crate::engine::{Options, RuleApplicator, RunMetrics};
use crate::errors::{CompileError, DocumentError, InvalidTagError};
use crate::grammar::{self, RuleSet};
use crate::intern::Interner;
use crate::tags::{Tag, TagParseError};

/// A compiled grammar plus its tag interner, ready to process documents.
#[derive(Debug)]
pub struct Applicator {
    ruleset: Arc<RuleSet>,
    interner: Arc<Interner>,
    options: Options,
}

impl Applicator {
    /// Compile the grammar file at `path`.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Applicator, CompileError> {
        let text = std::fs::read_to_string(path.as_ref())
            .map_err(|err| CompileError::Io { message: format!("{}: {err}", path.as_ref().display()) })?;
        Applicator::from_text(&text)
    }

    /// Compile grammar source text.
    pub fn from_text(text: &str) -> Result<Applicator, CompileError> {
        let interner = Arc::new(Interner::new());
        let ruleset = grammar::compile(text, &interner)?;
        Ok(Applicator { ruleset: Arc::new(ruleset), interner, options: Options::default() })
    }

    /// Replace the run options (pass cap and similar).
    pub fn with_options(mut self, options: Options) -> Applicator {
        self.options = options;
        self
    }

    /// Parse a document stream against this grammar.
    ///
    /// Cohorts matching the grammar's DELIMITERS set are marked as soft
    /// window boundaries; readings already carrying a mapping-prefixed tag
    /// are marked mapped.
    pub fn parse(&self, text: &str) -> Result<Document, DocumentError> {
        let mut doc = Document::parse(text, Arc::clone(&self.interner))?;

        let prefix = self.ruleset.mapping_prefix;
        for cohort in &mut doc.cohorts {
            let delimits = if cohort.readings.is_empty() {
                self.ruleset.delimiters.matches(&self.interner, cohort.wordform, &[])
            } else {
                cohort
                    .enabled_readings()
                    .any(|r| self.ruleset.delimiters.matches(&self.interner, cohort.wordform, &r.tags))
            };
            if delimits {
                cohort.is_boundary = true;
            }
            for reading in &mut cohort.readings {
                if reading.tags.iter().skip(1).any(|&t| self.interner.resolve(t).starts_with(prefix)) {
                    reading.mapped = true;
                }
            }
        }

        Ok(doc)
    }

    /// Apply the grammar to `doc` in place, returning the run trace.
    pub fn run_rules(&self, doc: &mut Document) -> RunMetrics {
        RuleApplicator::new(&self.ruleset, &self.interner, &self.options).run(doc)
    }

    /// Intern a tag by name. Any non-empty, NUL-free string is accepted; the
    /// returned tag's textual form equals the input.
    pub fn create_tag(&self, name: &str) -> Result<Tag, InvalidTagError> {
        match Tag::parse(name, &self.interner) {
            Ok(tag) => Ok(tag),
            Err(TagParseError::Invalid(err)) => Err(err),
            // Odd quoting (say a lone '"') still names a legitimate literal tag.
            Err(TagParseError::Syntax(_)) => Ok(Tag::plain(self.interner.intern(name)?)),
        }
    }

    /// The textual form of a tag created by [`Applicator::create_tag`].
    pub fn tag_text<'a>(&'a self, tag: &Tag) -> &'a str {
        self.interner.resolve(tag.id())
    }

    pub fn interner(&self) -> &Arc<Interner> {
        &self.interner
    }

    pub fn ruleset(&self) -> &RuleSet {
        &self.ruleset
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compile_parse_run_roundtrip() {
        let applicator = Applicator::from_text("REMOVE (verb) IF (0 (noun)) ;").unwrap();
        let text = "\"<run>\"\n\t\"run\" verb\n\t\"run\" noun\n";
        let mut doc = applicator.parse(text).unwrap();
        assert_eq!(doc.to_string(), text);

        let metrics = applicator.run_rules(&mut doc);
        assert_eq!(doc.to_string(), "\"<run>\"\n\t\"run\" noun\n");
        assert!(!metrics.cap_hit);
        assert!(metrics.rule_applications >= 1);
    }

    #[test]
    fn create_tag_validates_and_preserves_text() {
        let applicator = Applicator::from_text("").unwrap();
        assert_eq!(applicator.create_tag(""), Err(InvalidTagError::Empty));
        assert_eq!(applicator.create_tag("a\0b"), Err(InvalidTagError::Nul));

        for name in ["N", "@SUBJ", "\"run\"", "\"<løper>\"", "\"$.\"", "\""] {
            let tag = applicator.create_tag(name).unwrap();
            assert_eq!(applicator.tag_text(&tag), name);
        }
    }

    #[test]
    fn delimiter_cohorts_become_boundaries_at_parse() {
        let applicator = Applicator::from_text("DELIMITERS = \"<$.>\" ;\nREMOVE (x) ;").unwrap();
        let doc = applicator.parse("\"<go>\"\n\t\"go\" v\n\"<$.>\"\n\t\"$.\" clb\n").unwrap();
        assert!(!doc.cohorts[0].is_boundary);
        assert!(doc.cohorts[1].is_boundary);
    }

    #[test]
    fn premapped_readings_are_detected() {
        let applicator = Applicator::from_text("MAPPING-PREFIX = @ ;\nSELECT (x) ;").unwrap();
        let doc = applicator.parse("\"<go>\"\n\t\"go\" v @pred\n\t\"go\" n\n").unwrap();
        assert!(doc.cohorts[0].readings[0].mapped);
        assert!(!doc.cohorts[0].readings[1].mapped);
    }

    #[test]
    fn applicator_is_shareable_across_threads() {
        let applicator = Arc::new(Applicator::from_text("SELECT (noun) IF (-1 (det)) ;").unwrap());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let applicator = Arc::clone(&applicator);
                std::thread::spawn(move || {
                    let text = "\"<the>\"\n\t\"the\" det\n\"<run>\"\n\t\"run\" verb\n\t\"run\" noun\n";
                    let mut doc = applicator.parse(text).unwrap();
                    applicator.run_rules(&mut doc);
                    doc.to_string()
                })
            })
            .collect();
        for handle in handles {
            let out = handle.join().unwrap();
            assert_eq!(out, "\"<the>\"\n\t\"the\" det\n\"<run>\"\n\t\"run\" noun\n");
        }
    }
}
