//! Run metrics.
//!
//! Small observation structs for a rule-application run. Metrics are
//! intentionally cheap and always collected: counting passes and rule
//! applications costs a few integers per section, and the pass-cap condition
//! has to be reported somewhere regardless.
//!
//! ## Design notes
//!
//! - `fired` counts rules whose target and tests all matched; `changed`
//!   counts rules whose action actually mutated the document. Keeping both
//!   makes either fixpoint definition observable, whichever one the loop
//!   uses.
//! - Fields prefixed with `_` are collected for potential future reporting
//!   but are not currently surfaced in user-facing output.

use std::time::Duration;

use crate::grammar::SectionKind;

/// Measurements for one full rule run over a document.
#[derive(Debug, Default, Clone)]
pub struct RunMetrics {
    /// Total elapsed time for the run.
    pub total: Duration,
    /// Per-section traces, in execution order.
    pub sections: Vec<SectionMetrics>,
    /// Rules applied (action executed) across the whole run.
    pub rule_applications: usize,
    /// True when any section stopped at its pass cap instead of converging.
    pub cap_hit: bool,
}

impl RunMetrics {
    /// Total passes executed across all sections.
    pub fn total_passes(&self) -> usize {
        self.sections.iter().map(|s| s.passes.len()).sum()
    }
}

/// Trace of one section's pass loop.
#[derive(Debug, Clone)]
pub struct SectionMetrics {
    pub kind: SectionKind,
    pub passes: Vec<PassMetrics>,
    /// This section stopped at the pass cap.
    pub cap_hit: bool,
}

/// Counters for a single pass over the document.
#[derive(Debug, Default, Clone)]
pub struct PassMetrics {
    /// Elapsed time for the pass.
    pub duration: Duration,
    /// Rules whose target and tests matched.
    pub fired: usize,
    /// Rules whose action mutated the document.
    pub changed: usize,
    /// Rule attempts evaluated during the pass.
    pub _rules_considered: usize,
}
