//! Context matching.
//!
//! Evaluates one rule test against the live document, anchored at a cohort.
//! The matcher only ever borrows the document read-only, for the duration of
//! one evaluation; the applicator keeps exclusive ownership between
//! evaluations, so a test always observes the current mutated state and
//! never a snapshot.
//!
//! Evaluation of a test:
//!
//! ```text
//! (NOT *-1C Set BARRIER Bar LINK 1 Other)
//!       │  │  │          │       └ next segment, anchored at the match
//!       │  │  │          └ abort scan with non-match when Bar matches first
//!       │  │  └ the set the addressed cohort must match
//!       │  └ C: every enabled reading must match, not just one
//!       └ *: scan leftward from the anchor; ** also skips static cohorts
//! ```
//!
//! There is no error path: a position with no cohort under it is simply a
//! non-match. A negated segment that succeeds anchors any linked segment at
//! the original anchor, since it matched nothing in particular.

use crate::document::{Cohort, Document};
use crate::grammar::{Test, TestFlags};
use crate::intern::Interner;
use crate::tags::TagSet;

pub(crate) struct ContextMatcher<'a> {
    doc: &'a Document,
    interner: &'a Interner,
}

impl<'a> ContextMatcher<'a> {
    pub fn new(doc: &'a Document, interner: &'a Interner) -> Self {
        ContextMatcher { doc, interner }
    }

    /// Evaluate `test` anchored at cohort `anchor`. Returns the index of the
    /// cohort that satisfied the final segment of the chain, or `None`.
    pub fn eval(&self, anchor: usize, test: &Test) -> Option<usize> {
        if test.flags.contains(TestFlags::NEGATE_ALL) {
            // NEGATE inverts the whole chain, links included.
            return match self.eval_chain(anchor, test) {
                Some(_) => None,
                None => Some(anchor),
            };
        }
        self.eval_chain(anchor, test)
    }

    fn eval_chain(&self, anchor: usize, test: &Test) -> Option<usize> {
        let found = self.find(anchor, test);
        let here = match (test.flags.contains(TestFlags::NEGATED), found) {
            (false, Some(idx)) => Some(idx),
            (false, None) => None,
            (true, Some(_)) => None,
            (true, None) => Some(anchor),
        }?;

        match &test.link {
            Some(link) => self.eval(here, link),
            None => Some(here),
        }
    }

    /// The positional part of a segment: address or scan, ignoring negation
    /// and links.
    fn find(&self, anchor: usize, test: &Test) -> Option<usize> {
        let len = self.doc.cohorts.len() as i64;
        let start = anchor as i64 + test.offset as i64;

        if !test.flags.scans() {
            if start < 0 || start >= len {
                return None;
            }
            let idx = start as usize;
            return self.cohort_matches(&self.doc.cohorts[idx], &test.set, test.flags).then_some(idx);
        }

        let step: i64 = if test.offset > 0 { 1 } else { -1 };
        let mut pos = start;
        while pos >= 0 && pos < len {
            let idx = pos as usize;
            let cohort = &self.doc.cohorts[idx];

            if test.flags.contains(TestFlags::SCAN_ALL) && cohort.is_static {
                pos += step;
                continue;
            }
            if self.cohort_matches(cohort, &test.set, test.flags) {
                return Some(idx);
            }
            if let Some(barrier) = &test.barrier {
                let barrier_flags = if test.flags.contains(TestFlags::CAREFUL_BARRIER) {
                    TestFlags::CAREFUL
                } else {
                    TestFlags::empty()
                };
                if self.cohort_matches(cohort, barrier, barrier_flags) {
                    return None;
                }
            }
            if cohort.is_boundary && !test.flags.contains(TestFlags::SPAN) {
                return None;
            }
            pos += step;
        }

        // Ran off the document edge: plain non-match, never a wrap.
        None
    }

    /// Does `cohort` match `set`, under the careful flag if present?
    fn cohort_matches(&self, cohort: &Cohort, set: &TagSet, flags: TestFlags) -> bool {
        if cohort.readings.is_empty() {
            return set.matches(self.interner, cohort.wordform, &[]);
        }
        if flags.contains(TestFlags::CAREFUL) {
            cohort.enabled_readings().all(|r| set.matches(self.interner, cohort.wordform, &r.tags))
        } else {
            cohort.enabled_readings().any(|r| set.matches(self.interner, cohort.wordform, &r.tags))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar;
    use std::sync::Arc;

    /// Build a document and a throwaway grammar whose first rule holds the
    /// tests we want to probe.
    fn fixture(grammar_src: &str, doc_src: &str) -> (Document, Arc<Interner>, grammar::RuleSet) {
        let interner = Arc::new(Interner::new());
        let ruleset = grammar::compile(grammar_src, &interner).unwrap();
        let doc = Document::parse(doc_src, Arc::clone(&interner)).unwrap();
        (doc, interner, ruleset)
    }

    fn first_test(ruleset: &grammar::RuleSet) -> &Test {
        &ruleset.sections[0].rules[0].tests[0]
    }

    const DOC: &str = "\"<the>\"\n\t\"the\" det\n\"<old>\"\n\t\"old\" adj\n\"<man>\"\n\t\"man\" n\n\t\"man\" v\n";

    #[test]
    fn position_zero_and_fixed_offsets() {
        let (doc, interner, rs) = fixture("SELECT (n) IF (0 (n)) (-2 (det)) (1 (adj)) (-5 (det)) ;", DOC);
        let m = ContextMatcher::new(&doc, &interner);
        let tests = &rs.sections[0].rules[0].tests;

        assert_eq!(m.eval(2, &tests[0]), Some(2));
        assert_eq!(m.eval(2, &tests[1]), Some(0));
        assert_eq!(m.eval(0, &tests[2]), Some(1));
        // No such cohort: plain non-match.
        assert_eq!(m.eval(2, &tests[3]), None);
    }

    #[test]
    fn careful_requires_all_enabled_readings() {
        let (doc, interner, rs) = fixture("SELECT (n) IF (0C (n)) ;", DOC);
        let m = ContextMatcher::new(&doc, &interner);
        // "man" has an n and a v reading: careful fails, plain would match.
        assert_eq!(m.eval(2, first_test(&rs)), None);

        let (doc, interner, rs) = fixture("SELECT (det) IF (0C (det)) ;", DOC);
        let m = ContextMatcher::new(&doc, &interner);
        assert_eq!(m.eval(0, first_test(&rs)), Some(0));
    }

    #[test]
    fn scans_run_to_the_edge_and_fail() {
        let (doc, interner, rs) = fixture("SELECT (n) IF (*1 (n)) ;", DOC);
        let m = ContextMatcher::new(&doc, &interner);
        assert_eq!(m.eval(0, first_test(&rs)), Some(2));

        let (doc, interner, rs) = fixture("SELECT (n) IF (*-1 (v)) ;", DOC);
        let m = ContextMatcher::new(&doc, &interner);
        assert_eq!(m.eval(2, first_test(&rs)), None);
    }

    #[test]
    fn barrier_aborts_before_target() {
        let (doc, interner, rs) = fixture("SELECT (n) IF (*1 (n) BARRIER (adj)) ;", DOC);
        let m = ContextMatcher::new(&doc, &interner);
        // Scanning right from "the": "old" is adj, a barrier before "man".
        assert_eq!(m.eval(0, first_test(&rs)), None);

        // The barrier is not hit when the target comes first.
        let (doc, interner, rs) = fixture("SELECT (n) IF (*1 (adj) BARRIER (n)) ;", DOC);
        let m = ContextMatcher::new(&doc, &interner);
        assert_eq!(m.eval(0, first_test(&rs)), Some(1));
    }

    #[test]
    fn negation_inverts_and_anchors_links_at_origin() {
        let (doc, interner, rs) = fixture("SELECT (n) IF (NOT 1 (det) LINK -1 (adj)) ;", DOC);
        let m = ContextMatcher::new(&doc, &interner);
        // At "man": position 1 has no cohort, so NOT succeeds; the link then
        // runs from the original anchor and finds "old".
        assert_eq!(m.eval(2, first_test(&rs)), Some(1));
    }

    #[test]
    fn linked_tests_chain_from_the_match() {
        let (doc, interner, rs) = fixture("SELECT (det) IF (*1 (adj) LINK 1 (n)) ;", DOC);
        let m = ContextMatcher::new(&doc, &interner);
        assert_eq!(m.eval(0, first_test(&rs)), Some(2));

        let (doc, interner, rs) = fixture("SELECT (det) IF (*1 (adj) LINK 1 (det)) ;", DOC);
        let m = ContextMatcher::new(&doc, &interner);
        assert_eq!(m.eval(0, first_test(&rs)), None);
    }

    #[test]
    fn negate_inverts_the_whole_chain() {
        // The chain "adj to the right, then a noun after it" holds, so NEGATE
        // fails; NOT on the first segment alone would too, but for a
        // different reason.
        let (doc, interner, rs) = fixture("SELECT (det) IF (NEGATE *1 (adj) LINK 1 (n)) ;", DOC);
        let m = ContextMatcher::new(&doc, &interner);
        assert_eq!(m.eval(0, first_test(&rs)), None);

        // Break the chain at the link: NEGATE now succeeds at the anchor.
        let (doc, interner, rs) = fixture("SELECT (det) IF (NEGATE *1 (adj) LINK 1 (adv)) ;", DOC);
        let m = ContextMatcher::new(&doc, &interner);
        assert_eq!(m.eval(0, first_test(&rs)), Some(0));
    }

    #[test]
    fn careful_barrier_only_blocks_unambiguous_cohorts() {
        // "man" is n/v ambiguous, so a careful (v) barrier between "the" and
        // a later verb does not block, while a plain barrier does.
        let doc_src = "\"<the>\"\n\t\"the\" det\n\"<man>\"\n\t\"man\" n\n\t\"man\" v\n\"<ran>\"\n\t\"run\" v\n";
        let (doc, interner, rs) = fixture("SELECT (det) IF (*1 (\"run\") CBARRIER (v)) ;", doc_src);
        let m = ContextMatcher::new(&doc, &interner);
        assert_eq!(m.eval(0, first_test(&rs)), Some(2));

        let (doc, interner, rs) = fixture("SELECT (det) IF (*1 (\"run\") BARRIER (v)) ;", doc_src);
        let m = ContextMatcher::new(&doc, &interner);
        assert_eq!(m.eval(0, first_test(&rs)), None);
    }

    #[test]
    fn any_tag_matches_every_cohort() {
        let (doc, interner, rs) = fixture("SELECT (det) IF (*1 (*) BARRIER (n)) ;", DOC);
        let m = ContextMatcher::new(&doc, &interner);
        // (*) matches the very first scanned cohort.
        assert_eq!(m.eval(0, first_test(&rs)), Some(1));
    }

    #[test]
    fn boundaries_stop_scans_unless_spanning() {
        let doc_src = "\"<one>\"\n\t\"one\" n\n\"<.>\"\n\t\"$.\" clb\n\"<two>\"\n\t\"two\" n\n";
        let (mut doc, interner, rs) = fixture("SELECT (n) IF (*1 (n)) ;", doc_src);
        doc.cohorts[1].is_boundary = true;
        let m = ContextMatcher::new(&doc, &interner);
        // The boundary cohort itself is still visible, but nothing past it is.
        assert_eq!(m.eval(0, first_test(&rs)), None);

        let (mut doc, interner, rs) = fixture("SELECT (n) IF (*1W (n)) ;", doc_src);
        doc.cohorts[1].is_boundary = true;
        let m = ContextMatcher::new(&doc, &interner);
        assert_eq!(m.eval(0, first_test(&rs)), Some(2));
    }

    #[test]
    fn unsafe_scan_skips_static_cohorts() {
        let doc_src = "\"<a>\"\n\t\"a\" det\n\"<b>\"\n\t\"b\" n\n\"<c>\"\n\t\"c\" n\n";
        let (mut doc, interner, rs) = fixture("SELECT (det) IF (**1 (n)) ;", doc_src);
        doc.cohorts[1].is_static = true;
        let m = ContextMatcher::new(&doc, &interner);
        // The static "b" is skipped; the scan matches "c".
        assert_eq!(m.eval(0, first_test(&rs)), Some(2));

        // A safe scan still sees the static cohort.
        let (mut doc, interner, rs) = fixture("SELECT (det) IF (*1 (n)) ;", doc_src);
        doc.cohorts[1].is_static = true;
        let m = ContextMatcher::new(&doc, &interner);
        assert_eq!(m.eval(0, first_test(&rs)), Some(1));
    }

    #[test]
    fn disabled_readings_are_invisible_to_matching() {
        let (mut doc, interner, rs) = fixture("SELECT (x) IF (0 (v)) ;", DOC);
        let m = ContextMatcher::new(&doc, &interner);
        assert_eq!(m.eval(2, first_test(&rs)), Some(2));

        doc.cohorts[2].readings[1].disabled = true;
        let m = ContextMatcher::new(&doc, &interner);
        assert_eq!(m.eval(2, first_test(&rs)), None);
    }
}
