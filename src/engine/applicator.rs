//! Rule application loop.
//!
//! This module is the operational core of the engine: it drives a compiled
//! [`RuleSet`] over a mutable [`Document`] until every section converges.
//!
//! ```text
//! for section in sections (BEFORE-SECTIONS, SECTION…, AFTER-SECTIONS):
//!     repeat:                         ── one pass ──
//!         for cohort left-to-right (skipping static cohorts):
//!             for rule in declared order:
//!                 target selects an enabled reading?
//!                 every context test matches?
//!                 ── then apply the action in place
//!     until a pass changes nothing, or the pass cap is reached
//! ```
//!
//! ## Convergence
//!
//! A pass "changed" the document iff some action mutated state: flipped a
//! reading's liveness, added tags, appended a reading, marked a boundary, or
//! relinked a dependency. A rule whose tests matched but whose action was a
//! no-op (a REMOVE blocked by the never-empty rule, an ADD of tags already
//! present) does not force another pass. Both counts are recorded in
//! [`PassMetrics`], so the alternative "tests matched" reading of firing
//! stays observable for rule authors.
//!
//! Every action is either strictly shrinking (REMOVE/SELECT disable
//! readings) or idempotent (MAP/ADD/SUBSTITUTE/APPEND/DELIMIT/SETPARENT
//! re-application changes nothing), so sections converge without the cap on
//! well-behaved grammars; the cap is a safety net for pathological ones, and
//! hitting it is reported as a warning, never an error.

use std::time::Instant;

use tracing::{debug, warn};

use super::context::ContextMatcher;
use super::metrics::{PassMetrics, RunMetrics, SectionMetrics};
use crate::document::{Document, Reading};
use crate::grammar::{Rule, RuleKind, RuleSet, Test};
use crate::intern::{Interner, TagId};
use crate::tags::Tag;

/// Knobs for a rule run.
#[derive(Debug, Clone)]
pub struct Options {
    /// Upper bound on passes per section; reaching it stops the section with
    /// a diagnostic instead of looping forever.
    pub max_section_passes: usize,
}

impl Default for Options {
    fn default() -> Self {
        Options { max_section_passes: 100 }
    }
}

/// Applies a rule set to documents. Holds only shared references; all
/// document state lives in the caller's [`Document`].
pub(crate) struct RuleApplicator<'a> {
    ruleset: &'a RuleSet,
    interner: &'a Interner,
    options: &'a Options,
}

impl<'a> RuleApplicator<'a> {
    pub fn new(ruleset: &'a RuleSet, interner: &'a Interner, options: &'a Options) -> Self {
        RuleApplicator { ruleset, interner, options }
    }

    /// Run every section to its fixpoint (or pass cap) and return the trace.
    pub fn run(&self, doc: &mut Document) -> RunMetrics {
        let total_start = Instant::now();
        let mut metrics = RunMetrics::default();

        for section in &self.ruleset.sections {
            let mut section_metrics = SectionMetrics { kind: section.kind, passes: Vec::new(), cap_hit: false };

            loop {
                let pass_start = Instant::now();
                let mut pass = PassMetrics::default();

                for idx in 0..doc.cohorts.len() {
                    if doc.cohorts[idx].is_static {
                        continue;
                    }
                    for rule in &section.rules {
                        pass._rules_considered += 1;
                        let (fired, changed) = self.attempt(doc, idx, rule);
                        if fired {
                            pass.fired += 1;
                            metrics.rule_applications += 1;
                            debug!(rule = %rule.name, cohort = idx, changed, "rule fired");
                        }
                        if changed {
                            pass.changed += 1;
                        }
                    }
                }

                pass.duration = pass_start.elapsed();
                let converged = pass.changed == 0;
                section_metrics.passes.push(pass);

                if converged {
                    break;
                }
                if section_metrics.passes.len() >= self.options.max_section_passes {
                    section_metrics.cap_hit = true;
                    metrics.cap_hit = true;
                    warn!(
                        section = %section.kind.label(),
                        passes = section_metrics.passes.len(),
                        "section stopped at its pass cap before converging"
                    );
                    break;
                }
            }

            metrics.sections.push(section_metrics);
        }

        metrics.total = total_start.elapsed();
        metrics
    }

    /// Attempt one rule at one cohort. Returns `(fired, changed)`.
    fn attempt(&self, doc: &mut Document, idx: usize, rule: &Rule) -> (bool, bool) {
        // Read phase: everything below borrows the document immutably and is
        // decided before any mutation.
        let cohort = &doc.cohorts[idx];
        let target_hits: Vec<usize> = cohort
            .readings
            .iter()
            .enumerate()
            .filter(|(_, r)| !r.disabled && rule.target.matches(self.interner, cohort.wordform, &r.tags))
            .map(|(i, _)| i)
            .collect();
        if target_hits.is_empty() {
            return (false, false);
        }

        let matcher = ContextMatcher::new(doc, self.interner);
        let tests_pass = rule.tests.iter().all(|t| matcher.eval(idx, t).is_some());

        // IFF fires on a matched target either way: tests decide which half.
        let select = match (&rule.kind, tests_pass) {
            (RuleKind::Iff, true) => true,
            (RuleKind::Iff, false) => false,
            (_, false) => return (false, false),
            (RuleKind::Select, true) => true,
            _ => false,
        };

        // Dependency rules only fire when the TO context resolves.
        let to_idx = match &rule.kind {
            RuleKind::SetParent { to } | RuleKind::SetChild { to } => match self.eval_to(&matcher, idx, to) {
                Some(found) => Some(found),
                None => return (false, false),
            },
            _ => None,
        };

        // Mutation phase.
        let changed = match &rule.kind {
            RuleKind::Select | RuleKind::Remove | RuleKind::Iff => {
                if select {
                    disable_all_but(doc, idx, &target_hits)
                } else {
                    disable_guarded(doc, idx, &target_hits)
                }
            }
            RuleKind::Map { tags } => map_tags(doc, idx, &target_hits, tags, true),
            RuleKind::Unmap => self.unmap_readings(doc, idx, &target_hits),
            RuleKind::Add { tags } => map_tags(doc, idx, &target_hits, tags, false),
            RuleKind::Substitute { old, new } => substitute_tags(doc, idx, &target_hits, old, new),
            RuleKind::Append { tags } => append_reading(doc, idx, tags),
            RuleKind::Delimit => {
                let cohort = &mut doc.cohorts[idx];
                let flipped = !cohort.is_boundary || !cohort.is_static;
                cohort.is_boundary = true;
                cohort.is_static = true;
                flipped
            }
            RuleKind::SetParent { .. } => link_dependency(doc, idx, to_idx.expect("checked above")),
            RuleKind::SetChild { .. } => link_dependency(doc, to_idx.expect("checked above"), idx),
        };

        (true, changed)
    }

    fn eval_to(&self, matcher: &ContextMatcher<'_>, idx: usize, to: &Test) -> Option<usize> {
        let found = matcher.eval(idx, to)?;
        // A dependency of a cohort on itself is meaningless; treat as no match.
        (found != idx).then_some(found)
    }

    /// UNMAP: strip mapping-prefixed tags from the hit readings and clear the
    /// mapped flag, re-opening them for MAP.
    fn unmap_readings(&self, doc: &mut Document, idx: usize, hits: &[usize]) -> bool {
        let prefix = self.ruleset.mapping_prefix;
        let mut changed = false;
        for &i in hits {
            let reading = &mut doc.cohorts[idx].readings[i];
            let before = reading.tags.len();
            let interner = self.interner;
            // The baseform is never a mapping tag.
            reading.tags.retain(|&t| !interner.resolve(t).starts_with(prefix));
            if reading.tags.len() != before || reading.mapped {
                reading.mapped = false;
                changed = true;
            }
        }
        changed
    }
}

// --- Actions -------------------------------------------------------------------

/// SELECT: disable every enabled reading not in `keep`.
fn disable_all_but(doc: &mut Document, idx: usize, keep: &[usize]) -> bool {
    let mut changed = false;
    for (i, reading) in doc.cohorts[idx].readings.iter_mut().enumerate() {
        if !reading.disabled && !keep.contains(&i) {
            reading.disabled = true;
            changed = true;
        }
    }
    changed
}

/// REMOVE: disable the readings in `hits`, unless that would disable the
/// cohort's last enabled reading.
fn disable_guarded(doc: &mut Document, idx: usize, hits: &[usize]) -> bool {
    let cohort = &mut doc.cohorts[idx];
    if hits.len() >= cohort.enabled_count() {
        return false;
    }
    for &i in hits {
        cohort.readings[i].disabled = true;
    }
    !hits.is_empty()
}

/// MAP/ADD: add `tags` to the hit readings. MAP additionally marks readings
/// mapped and skips readings that already are.
fn map_tags(doc: &mut Document, idx: usize, hits: &[usize], tags: &[Tag], mapping: bool) -> bool {
    let mut changed = false;
    for &i in hits {
        let reading = &mut doc.cohorts[idx].readings[i];
        if mapping && reading.mapped {
            continue;
        }
        for tag in tags {
            if !reading.tags.contains(&tag.id()) {
                reading.tags.push(tag.id());
                changed = true;
            }
        }
        if mapping {
            reading.mapped = true;
            changed = true;
        }
    }
    changed
}

/// SUBSTITUTE: in each hit reading carrying any of the old tags, replace the
/// first occurrence with the new tags and drop the rest of the old ones.
fn substitute_tags(doc: &mut Document, idx: usize, hits: &[usize], old: &[Tag], new: &[Tag]) -> bool {
    let old_ids: Vec<TagId> = old.iter().map(Tag::id).collect();
    let mut changed = false;

    for &i in hits {
        let reading = &mut doc.cohorts[idx].readings[i];
        let Some(first) = reading.tags.iter().position(|t| old_ids.contains(t)) else { continue };

        reading.tags.retain(|t| !old_ids.contains(t));
        let mut insert_at = first;
        for tag in new {
            if !reading.tags.contains(&tag.id()) {
                reading.tags.insert(insert_at.min(reading.tags.len()), tag.id());
                insert_at += 1;
            }
        }
        changed = true;
    }
    changed
}

/// APPEND: add a new reading unless an identical one already exists.
fn append_reading(doc: &mut Document, idx: usize, tags: &[Tag]) -> bool {
    let new_tags: Vec<TagId> = tags.iter().map(Tag::id).collect();
    let cohort = &mut doc.cohorts[idx];
    if cohort.readings.iter().any(|r| r.tags == new_tags) {
        return false;
    }
    cohort.readings.push(Reading::from_tags(new_tags));
    true
}

/// SETPARENT/SETCHILD: make `parent` the parent of `child`.
fn link_dependency(doc: &mut Document, child: usize, parent: usize) -> bool {
    if doc.cohorts[child].parent == Some(parent) {
        return false;
    }
    if let Some(old) = doc.cohorts[child].parent {
        doc.cohorts[old].children.retain(|&c| c != child);
    }
    doc.cohorts[child].parent = Some(parent);
    let children = &mut doc.cohorts[parent].children;
    if !children.contains(&child) {
        children.push(child);
    }
    true
}
