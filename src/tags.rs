//! Tag and tag-set model.
//!
//! A *tag* is one atomic label as written in a grammar or a document stream:
//!
//! ```text
//! N            bare morphological/syntactic tag
//! @SUBJ        bare mapping tag (prefix is grammar-configurable)
//! "run"        quoted baseform (lexeme)
//! "<ran>"      quoted, angle-bracketed word-form
//! "r.n"r       regex tag, matched against the baseform
//! "<r.n>"ri    case-insensitive regex tag, matched against the word-form
//! "run"i       case-insensitive literal baseform
//! ```
//!
//! Tags are interned on construction; identity is the interned id of the full
//! surface text, so equality and hashing never look at string contents.
//!
//! A *composite* tag `(a b c)` matches a reading carrying every member. A
//! [`TagSet`] is an ordered list of composite alternatives and matches a
//! reading when any alternative does. Set algebra (`|`, `-`, `+`) is closed
//! over this representation and is evaluated once at grammar compile time.

use lasso::Key;
use regex::Regex;

use crate::errors::InvalidTagError;
use crate::intern::{Interner, TagId};

/// How a quoted tag compares against its candidate text.
#[derive(Debug, Clone)]
pub enum TextMatch {
    /// Exact surface equality, decided by interned id.
    Literal,
    /// Case-insensitive literal; holds the lowercased inner text.
    FoldCase(String),
    /// Anchored regular expression over the inner text.
    Pattern(Regex),
}

#[derive(Debug, Clone)]
pub enum TagKind {
    /// Bare tag; matches a reading that carries the same tag.
    Plain,
    /// `*`; matches every reading.
    Any,
    /// `"..."`; matches against the reading's baseform.
    Baseform(TextMatch),
    /// `"<...>"`; matches against the cohort's word-form.
    Wordform(TextMatch),
}

/// One parsed tag. Identity is the interned full surface text.
#[derive(Debug, Clone)]
pub struct Tag {
    id: TagId,
    kind: TagKind,
}

impl PartialEq for Tag {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Tag {}

impl std::hash::Hash for Tag {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// Failure modes of [`Tag::parse`]. The grammar and document parsers wrap
/// these with their own positions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagParseError {
    Invalid(InvalidTagError),
    Syntax(String),
}

impl From<InvalidTagError> for TagParseError {
    fn from(err: InvalidTagError) -> Self {
        TagParseError::Invalid(err)
    }
}

impl Tag {
    /// Parse one tag token as written in a grammar.
    ///
    /// The token arrives as one unit including quotes and trailing flags
    /// (`r` regex, `i` case-insensitive); the lexer guarantees it contains no
    /// whitespace.
    pub fn parse(token: &str, interner: &Interner) -> Result<Tag, TagParseError> {
        let id = interner.intern(token)?;

        if token == "*" {
            return Ok(Tag { id, kind: TagKind::Any });
        }

        if let Some(rest) = token.strip_prefix("\"<") {
            let close = rest
                .rfind(">\"")
                .ok_or_else(|| TagParseError::Syntax(format!("unterminated word-form tag '{token}'")))?;
            let inner = &rest[..close];
            let flags = &rest[close + 2..];
            return Ok(Tag { id, kind: TagKind::Wordform(parse_text_match(inner, flags, token)?) });
        }

        if let Some(rest) = token.strip_prefix('"') {
            let close = rest
                .rfind('"')
                .ok_or_else(|| TagParseError::Syntax(format!("unterminated quoted tag '{token}'")))?;
            let inner = &rest[..close];
            let flags = &rest[close + 1..];
            return Ok(Tag { id, kind: TagKind::Baseform(parse_text_match(inner, flags, token)?) });
        }

        Ok(Tag { id, kind: TagKind::Plain })
    }

    /// Construct a plain tag from an already-interned id.
    pub fn plain(id: TagId) -> Tag {
        Tag { id, kind: TagKind::Plain }
    }

    pub fn id(&self) -> TagId {
        self.id
    }

    pub fn kind(&self) -> &TagKind {
        &self.kind
    }

    /// The full surface text this tag was parsed from.
    pub fn text<'a>(&self, interner: &'a Interner) -> &'a str {
        interner.resolve(self.id)
    }

    /// Does this tag hold for a reading with `tags` inside a cohort whose
    /// word-form is `wordform`?
    pub fn matches(&self, interner: &Interner, wordform: TagId, tags: &[TagId]) -> bool {
        match &self.kind {
            TagKind::Plain => tags.contains(&self.id),
            TagKind::Any => true,
            TagKind::Baseform(TextMatch::Literal) => tags.contains(&self.id),
            TagKind::Baseform(m) => {
                let Some(&base) = tags.first() else { return false };
                text_matches(m, baseform_inner(interner.resolve(base)))
            }
            TagKind::Wordform(TextMatch::Literal) => wordform == self.id,
            TagKind::Wordform(m) => text_matches(m, wordform_inner(interner.resolve(wordform))),
        }
    }
}

fn parse_text_match(inner: &str, flags: &str, token: &str) -> Result<TextMatch, TagParseError> {
    let mut regex = false;
    let mut fold = false;
    for c in flags.chars() {
        match c {
            'r' if !regex => regex = true,
            'i' if !fold => fold = true,
            _ => return Err(TagParseError::Syntax(format!("unknown tag flag '{c}' in '{token}'"))),
        }
    }

    if regex {
        let pattern = if fold { format!("(?i)^(?:{inner})$") } else { format!("^(?:{inner})$") };
        let re = Regex::new(&pattern)
            .map_err(|err| TagParseError::Syntax(format!("invalid regex tag '{token}': {err}")))?;
        Ok(TextMatch::Pattern(re))
    } else if fold {
        Ok(TextMatch::FoldCase(inner.to_lowercase()))
    } else {
        Ok(TextMatch::Literal)
    }
}

fn text_matches(m: &TextMatch, candidate: &str) -> bool {
    match m {
        TextMatch::Literal => unreachable!("literal tags match by id"),
        TextMatch::FoldCase(lower) => candidate.to_lowercase() == *lower,
        TextMatch::Pattern(re) => re.is_match(candidate),
    }
}

/// Strip the quotes of a baseform tag; raw text is returned unchanged if the
/// quotes are absent.
pub(crate) fn baseform_inner(text: &str) -> &str {
    text.strip_prefix('"').and_then(|t| t.strip_suffix('"')).unwrap_or(text)
}

/// Strip the `"<`/`>"` of a word-form tag.
pub(crate) fn wordform_inner(text: &str) -> &str {
    text.strip_prefix("\"<").and_then(|t| t.strip_suffix(">\"")).unwrap_or(text)
}

/// Escape a lexeme for the stream format: a lexeme that is a single
/// punctuation character is written with a `$` prefix (`.` becomes `$.`), so
/// it cannot be confused with stream markup.
pub fn escape_lexeme(lexeme: &str) -> String {
    let mut chars = lexeme.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii_punctuation() => format!("${c}"),
        _ => lexeme.to_string(),
    }
}

// --- Composite tags and tag-sets ----------------------------------------------

/// Conjunction of tags: a reading matches when it matches every member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompositeTag {
    members: Vec<Tag>,
}

impl CompositeTag {
    pub fn new(members: Vec<Tag>) -> CompositeTag {
        CompositeTag { members }
    }

    pub fn single(tag: Tag) -> CompositeTag {
        CompositeTag { members: vec![tag] }
    }

    pub fn members(&self) -> &[Tag] {
        &self.members
    }

    pub fn matches(&self, interner: &Interner, wordform: TagId, tags: &[TagId]) -> bool {
        self.members.iter().all(|t| t.matches(interner, wordform, tags))
    }

    /// Order-insensitive identity key, used by set difference and dedup.
    fn key(&self) -> Vec<usize> {
        let mut ids: Vec<usize> = self.members.iter().map(|t| t.id().into_usize()).collect();
        ids.sort_unstable();
        ids
    }
}

/// A resolved tag-set: ordered composite alternatives.
///
/// The order is the order alternatives were written in, kept so diagnostics
/// and iteration are reproducible.
#[derive(Debug, Clone, Default)]
pub struct TagSet {
    alts: Vec<CompositeTag>,
}

impl TagSet {
    pub fn new(alts: Vec<CompositeTag>) -> TagSet {
        TagSet { alts }
    }

    pub fn alts(&self) -> &[CompositeTag] {
        &self.alts
    }

    pub fn is_empty(&self) -> bool {
        self.alts.is_empty()
    }

    /// Does any alternative hold for this reading?
    pub fn matches(&self, interner: &Interner, wordform: TagId, tags: &[TagId]) -> bool {
        self.alts.iter().any(|alt| alt.matches(interner, wordform, tags))
    }

    /// `self | other`: alternatives of both, left operand first, deduplicated.
    pub fn union(&self, other: &TagSet) -> TagSet {
        let mut alts = self.alts.clone();
        let mut seen: Vec<Vec<usize>> = alts.iter().map(CompositeTag::key).collect();
        for alt in &other.alts {
            let key = alt.key();
            if !seen.contains(&key) {
                seen.push(key);
                alts.push(alt.clone());
            }
        }
        TagSet { alts }
    }

    /// `self - other`: alternatives of `self` not structurally present in `other`.
    pub fn difference(&self, other: &TagSet) -> TagSet {
        let removed: Vec<Vec<usize>> = other.alts.iter().map(CompositeTag::key).collect();
        let alts = self.alts.iter().filter(|alt| !removed.contains(&alt.key())).cloned().collect();
        TagSet { alts }
    }

    /// `self + other`: conjunctive combination. Every alternative of the
    /// result carries one alternative from each operand, so a reading matches
    /// the result iff it matches both operands: the intersection of the two
    /// match sets.
    pub fn combine(&self, other: &TagSet) -> TagSet {
        let mut alts = Vec::with_capacity(self.alts.len() * other.alts.len());
        for left in &self.alts {
            for right in &other.alts {
                let mut members = left.members.clone();
                for tag in &right.members {
                    if !members.contains(tag) {
                        members.push(tag.clone());
                    }
                }
                alts.push(CompositeTag { members });
            }
        }
        TagSet { alts }
    }
}
