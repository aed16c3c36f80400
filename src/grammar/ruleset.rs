//! Compiled rule-set representation.
//!
//! This is the *static* side of the engine: everything derived from a grammar
//! file at compile time. A `RuleSet` is immutable once built and is shared
//! read-only by every document run, so rule execution never re-parses text
//! and never re-resolves a set name.
//!
//! ## Invariants
//!
//! - Section order is BEFORE-SECTIONS, then numbered SECTIONs in declaration
//!   order, then AFTER-SECTIONS; the applicator iterates them as stored.
//! - Every tag-set reachable from a rule is fully resolved: named sets were
//!   substituted and set algebra evaluated during compilation.
//! - `Test::offset` is never 0 for scanning tests (the parser rejects it).

use crate::tags::{Tag, TagSet};

bitflags::bitflags! {
    /// Options on a single context test.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct TestFlags: u8 {
        /// `*n`: scan in the offset direction instead of addressing one cohort.
        const SCAN     = 1 << 0;
        /// `**n`: scan, additionally skipping static cohorts ("unsafe" scan).
        const SCAN_ALL = 1 << 1;
        /// `nC`: every enabled reading must match, not just one.
        const CAREFUL  = 1 << 2;
        /// `NOT`: succeed exactly when the positional test fails.
        const NEGATED  = 1 << 3;
        /// `nW`: the scan may cross soft window boundaries.
        const SPAN     = 1 << 4;
        /// `NEGATE`: invert the whole test including its linked chain.
        const NEGATE_ALL = 1 << 5;
        /// The barrier is careful: it blocks only unambiguous cohorts.
        const CAREFUL_BARRIER = 1 << 6;
    }
}

impl TestFlags {
    /// True for both scan variants.
    pub fn scans(self) -> bool {
        self.intersects(TestFlags::SCAN | TestFlags::SCAN_ALL)
    }
}

/// One contextual condition of a rule.
#[derive(Debug, Clone)]
pub struct Test {
    /// Relative position: 0 is the target cohort, positive is rightward.
    pub offset: i32,
    pub flags: TestFlags,
    /// Tag-set the addressed cohort must match.
    pub set: TagSet,
    /// Scan aborts with non-match when a cohort matches this set first.
    pub barrier: Option<TagSet>,
    /// Chained test anchored at the cohort this test matched.
    pub link: Option<Box<Test>>,
}

/// What a rule does once its target and tests hold.
#[derive(Debug, Clone)]
pub enum RuleKind {
    /// Disable every enabled reading *not* matching the target.
    Select,
    /// Disable every enabled reading matching the target, keeping the last.
    Remove,
    /// SELECT when the tests match, REMOVE the target when they fail.
    Iff,
    /// Add mapping tags to matching readings and mark them mapped.
    Map { tags: Vec<Tag> },
    /// Strip mapping tags from matching readings and clear the mapped flag.
    Unmap,
    /// Add tags to matching readings.
    Add { tags: Vec<Tag> },
    /// Replace the old tags with the new tags in matching readings.
    Substitute { old: Vec<Tag>, new: Vec<Tag> },
    /// Append a new reading to the cohort.
    Append { tags: Vec<Tag> },
    /// Mark the cohort as a soft window boundary and static.
    Delimit,
    /// Link the target cohort to the TO-matched cohort as its parent.
    SetParent { to: Test },
    /// Link the TO-matched cohort to the target cohort as its child.
    SetChild { to: Test },
}

impl RuleKind {
    pub fn keyword(&self) -> &'static str {
        match self {
            RuleKind::Select => "SELECT",
            RuleKind::Remove => "REMOVE",
            RuleKind::Iff => "IFF",
            RuleKind::Map { .. } => "MAP",
            RuleKind::Unmap => "UNMAP",
            RuleKind::Add { .. } => "ADD",
            RuleKind::Substitute { .. } => "SUBSTITUTE",
            RuleKind::Append { .. } => "APPEND",
            RuleKind::Delimit => "DELIMIT",
            RuleKind::SetParent { .. } => "SETPARENT",
            RuleKind::SetChild { .. } => "SETCHILD",
        }
    }
}

/// One compiled rule.
#[derive(Debug, Clone)]
pub struct Rule {
    pub kind: RuleKind,
    /// Which readings of the current cohort the rule may act on.
    pub target: TagSet,
    /// Contextual conditions; all must match (conjunction).
    pub tests: Vec<Test>,
    /// Grammar line the rule was declared on.
    pub line: usize,
    /// Display name for traces, e.g. `REMOVE:14`.
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionKind {
    Before,
    /// 1-based declaration index among plain SECTIONs.
    Main(usize),
    After,
}

impl SectionKind {
    pub fn label(&self) -> String {
        match self {
            SectionKind::Before => "BEFORE-SECTIONS".to_string(),
            SectionKind::Main(n) => format!("SECTION {n}"),
            SectionKind::After => "AFTER-SECTIONS".to_string(),
        }
    }
}

/// An ordered group of rules iterated to its own fixpoint.
#[derive(Debug, Clone)]
pub struct Section {
    pub kind: SectionKind,
    pub rules: Vec<Rule>,
}

/// A compiled grammar: ordered sections plus the resolved set table.
#[derive(Debug, Clone)]
pub struct RuleSet {
    pub sections: Vec<Section>,
    /// Resolved named sets, kept for diagnostics and tooling.
    pub sets: std::collections::HashMap<String, TagSet>,
    /// Cohorts matching this set are soft window boundaries.
    pub delimiters: TagSet,
    /// Readings carrying a tag with this prefix count as mapped.
    pub mapping_prefix: char,
}

impl RuleSet {
    pub fn rule_count(&self) -> usize {
        self.sections.iter().map(|s| s.rules.len()).sum()
    }
}
