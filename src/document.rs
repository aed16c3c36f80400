//! Document model and the cohort/reading stream format.
//!
//! A document is one token stream: an ordered sequence of cohorts, each the
//! word-form of one input token plus every candidate reading the upstream
//! morphological analyser produced for it.
//!
//! The wire format is line-oriented:
//!
//! ```text
//! "<ran>"
//! 	"run" V Past
//! 	"ran" N Sg
//! "<.>"
//! 	"$." CLB
//! ```
//!
//! A cohort line holds the word-form; each following tab-indented line is one
//! reading (baseform first, then tags in order); deeper tabs attach
//! sub-readings to the reading above. Serializing a freshly parsed document
//! reproduces the input byte-for-byte; this is the primary correctness oracle
//! for the parser.
//!
//! Readings are never physically removed: rule actions flip the `disabled`
//! liveness bit, so indices stay stable for the whole run and later rules can
//! still observe what was once a candidate. Disabled readings are simply
//! omitted when the document is serialized.

use std::fmt;
use std::sync::Arc;

use crate::errors::DocumentError;
use crate::intern::{Interner, TagId};
use crate::tags::escape_lexeme;

/// One candidate analysis: baseform tag first, then tags in appearance order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reading {
    pub tags: Vec<TagId>,
    /// Liveness bit; set by REMOVE-class actions instead of deletion.
    pub disabled: bool,
    /// Set by MAP; a mapped reading is not re-mapped.
    pub mapped: bool,
    /// Nested sub-reading chain (compound/derivation analysis).
    pub sub: Option<Box<Reading>>,
}

impl Reading {
    /// Build a reading from an unquoted lexeme and bare tags. The lexeme is
    /// `$`-escaped and quoted here, so a punctuation lexeme like `.` arrives
    /// on the wire as `"$."`.
    pub fn new(lexeme: &str, tags: &[&str], interner: &Interner) -> Result<Reading, DocumentError> {
        let baseform = format!("\"{}\"", escape_lexeme(lexeme));
        let mut ids = Vec::with_capacity(tags.len() + 1);
        ids.push(intern_tag(&baseform, interner, 0)?);
        for tag in tags {
            ids.push(intern_tag(tag, interner, 0)?);
        }
        Ok(Reading { tags: ids, disabled: false, mapped: false, sub: None })
    }

    pub(crate) fn from_tags(tags: Vec<TagId>) -> Reading {
        Reading { tags, disabled: false, mapped: false, sub: None }
    }

    /// The baseform tag (always present for well-formed readings).
    pub fn baseform(&self) -> Option<TagId> {
        self.tags.first().copied()
    }
}

/// One input token with all its candidate readings.
#[derive(Debug, Clone)]
pub struct Cohort {
    /// Word-form tag; never changes after creation.
    pub wordform: TagId,
    /// Candidate readings in insertion order. The first enabled reading is
    /// the primary analysis.
    pub readings: Vec<Reading>,
    /// Dependency link to a parent cohort (index into the document).
    pub parent: Option<usize>,
    /// Dependency links to child cohorts.
    pub children: Vec<usize>,
    /// Excluded from further rule application.
    pub is_static: bool,
    /// Soft window boundary; context scans stop here unless spanning.
    pub is_boundary: bool,
}

impl Cohort {
    /// Build a cohort from an unbracketed word-form and its readings.
    pub fn new(wordform: &str, readings: Vec<Reading>, interner: &Interner) -> Result<Cohort, DocumentError> {
        let surface = format!("\"<{wordform}>\"");
        let id = intern_tag(&surface, interner, 0)?;
        Ok(Cohort::with_wordform(id, readings))
    }

    pub(crate) fn with_wordform(wordform: TagId, readings: Vec<Reading>) -> Cohort {
        Cohort { wordform, readings, parent: None, children: Vec::new(), is_static: false, is_boundary: false }
    }

    pub fn enabled_readings(&self) -> impl Iterator<Item = &Reading> {
        self.readings.iter().filter(|r| !r.disabled)
    }

    pub fn enabled_count(&self) -> usize {
        self.readings.iter().filter(|r| !r.disabled).count()
    }

    /// The primary analysis: the first enabled reading.
    pub fn primary(&self) -> Option<&Reading> {
        self.readings.iter().find(|r| !r.disabled)
    }
}

/// An ordered sequence of cohorts for one token stream.
///
/// Holds a handle to the interner it was parsed with so it can serialize
/// itself; all mutation happens through the rule applicator.
#[derive(Debug, Clone)]
pub struct Document {
    interner: Arc<Interner>,
    pub cohorts: Vec<Cohort>,
}

impl Document {
    pub fn new(interner: Arc<Interner>, cohorts: Vec<Cohort>) -> Document {
        Document { interner, cohorts }
    }

    pub fn interner(&self) -> &Interner {
        &self.interner
    }

    /// Parse the stream format. Strict: every line must be a cohort line or a
    /// tab-indented reading line, so that serialization can reproduce the
    /// input exactly.
    pub fn parse(text: &str, interner: Arc<Interner>) -> Result<Document, DocumentError> {
        let mut cohorts: Vec<Cohort> = Vec::new();

        for (idx, line) in text.lines().enumerate() {
            let line_no = idx + 1;
            let depth = line.bytes().take_while(|&b| b == b'\t').count();
            let content = &line[depth..];

            if content.is_empty() {
                return Err(DocumentError::Syntax { line: line_no, message: "empty line".into() });
            }

            if depth == 0 {
                let is_wordform = content.starts_with("\"<") && content.ends_with(">\"") && content.len() >= 4;
                if !is_wordform {
                    return Err(DocumentError::Syntax {
                        line: line_no,
                        message: format!("expected a cohort word-form line, found '{content}'"),
                    });
                }
                let wordform = intern_tag(content, &interner, line_no)?;
                cohorts.push(Cohort::with_wordform(wordform, Vec::new()));
                continue;
            }

            let cohort = cohorts.last_mut().ok_or_else(|| DocumentError::Syntax {
                line: line_no,
                message: "reading line before any cohort".into(),
            })?;
            let reading = parse_reading_line(content, &interner, line_no)?;

            if depth == 1 {
                cohort.readings.push(reading);
            } else {
                let parent = cohort.readings.last_mut().ok_or_else(|| DocumentError::Syntax {
                    line: line_no,
                    message: "sub-reading line with no parent reading".into(),
                })?;
                attach_sub(parent, reading, depth - 1).map_err(|_| DocumentError::Syntax {
                    line: line_no,
                    message: format!("sub-reading indented {depth} levels with no reading at level {}", depth - 1),
                })?;
            }
        }

        Ok(Document { interner, cohorts })
    }
}

fn parse_reading_line(content: &str, interner: &Interner, line_no: usize) -> Result<Reading, DocumentError> {
    let mut tags = Vec::new();
    for (i, token) in content.split(' ').enumerate() {
        if token.is_empty() {
            return Err(DocumentError::Syntax {
                line: line_no,
                message: "readings separate tags with single spaces".into(),
            });
        }
        if i == 0 {
            let quoted = token.len() >= 3 && token.starts_with('"') && token.ends_with('"');
            if !quoted {
                return Err(DocumentError::Syntax {
                    line: line_no,
                    message: format!("reading must start with a quoted baseform, found '{token}'"),
                });
            }
        }
        tags.push(intern_tag(token, interner, line_no)?);
    }
    Ok(Reading::from_tags(tags))
}

/// Walk the sub-reading chain down to `depth` parents and attach there.
fn attach_sub(reading: &mut Reading, sub: Reading, depth: usize) -> Result<(), ()> {
    if depth == 1 {
        if reading.sub.is_some() {
            return Err(());
        }
        reading.sub = Some(Box::new(sub));
        return Ok(());
    }
    match reading.sub.as_deref_mut() {
        Some(inner) => attach_sub(inner, sub, depth - 1),
        None => Err(()),
    }
}

fn intern_tag(token: &str, interner: &Interner, line: usize) -> Result<TagId, DocumentError> {
    interner.intern(token).map_err(|source| DocumentError::InvalidTag { line, source })
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for cohort in &self.cohorts {
            writeln!(f, "{}", self.interner.resolve(cohort.wordform))?;
            for reading in &cohort.readings {
                if reading.disabled {
                    continue;
                }
                write_reading(f, &self.interner, reading, 1)?;
            }
        }
        Ok(())
    }
}

fn write_reading(f: &mut fmt::Formatter<'_>, interner: &Interner, reading: &Reading, depth: usize) -> fmt::Result {
    for _ in 0..depth {
        f.write_str("\t")?;
    }
    let mut first = true;
    for &tag in &reading.tags {
        if !first {
            f.write_str(" ")?;
        }
        f.write_str(interner.resolve(tag))?;
        first = false;
    }
    f.write_str("\n")?;
    if let Some(sub) = &reading.sub {
        write_reading(f, interner, sub, depth + 1)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Document {
        Document::parse(text, Arc::new(Interner::new())).unwrap()
    }

    #[test]
    fn roundtrip_plain() {
        let text = "\"<ran>\"\n\t\"run\" V Past\n\t\"ran\" N Sg\n\"<.>\"\n\t\"$.\" CLB\n";
        assert_eq!(parse(text).to_string(), text);
    }

    #[test]
    fn roundtrip_unicode_and_punctuation() {
        let text = "\"<løper>\"\n\t\"løpe\" V Pres\n\"<æøå>\"\n\t\"æøå\" N\n\"<!>\"\n\t\"$!\" PUNCT\n";
        assert_eq!(parse(text).to_string(), text);
    }

    #[test]
    fn roundtrip_sub_readings() {
        let text = "\"<bokhylle>\"\n\t\"hylle\" N\n\t\t\"bok\" N Cmp\n";
        let doc = parse(text);
        assert_eq!(doc.to_string(), text);
        assert!(doc.cohorts[0].readings[0].sub.is_some());
    }

    #[test]
    fn parse_structure() {
        let doc = parse("\"<ran>\"\n\t\"run\" V Past\n\t\"ran\" N Sg\n");
        assert_eq!(doc.cohorts.len(), 1);
        assert_eq!(doc.cohorts[0].readings.len(), 2);
        assert_eq!(doc.cohorts[0].enabled_count(), 2);
        let primary = doc.cohorts[0].primary().unwrap();
        assert_eq!(doc.interner().resolve(primary.baseform().unwrap()), "\"run\"");
    }

    #[test]
    fn disabled_readings_are_kept_but_not_printed() {
        let mut doc = parse("\"<ran>\"\n\t\"run\" V Past\n\t\"ran\" N Sg\n");
        doc.cohorts[0].readings[0].disabled = true;
        assert_eq!(doc.to_string(), "\"<ran>\"\n\t\"ran\" N Sg\n");
        assert_eq!(doc.cohorts[0].readings.len(), 2);
    }

    #[test]
    fn parse_errors() {
        let interner = Arc::new(Interner::new());
        let bad = [
            ("no quotes\n", 1),
            ("\"<ok>\"\n\nmore\n", 2),
            ("\t\"orphan\" N\n", 1),
            ("\"<ok>\"\n\t\"a\"  B\n", 2),
            ("\"<ok>\"\n\tbare N\n", 2),
            ("\"<ok>\"\n\t\t\"sub\" N\n", 2),
        ];
        for (text, line) in bad {
            match Document::parse(text, Arc::clone(&interner)) {
                Err(DocumentError::Syntax { line: l, .. }) => assert_eq!(l, line, "input: {text:?}"),
                other => panic!("expected syntax error for {text:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn builders_escape_punctuation() {
        let interner = Arc::new(Interner::new());
        let reading = Reading::new(".", &["CLB"], &interner).unwrap();
        let cohort = Cohort::new(".", vec![reading], &interner).unwrap();
        let doc = Document::new(Arc::clone(&interner), vec![cohort]);
        assert_eq!(doc.to_string(), "\"<.>\"\n\t\"$.\" CLB\n");
    }
}
