//! Rule application engine.
//!
//! This module is the *dynamic* side of the crate: given a compiled
//! [`RuleSet`](crate::grammar::RuleSet), it mutates a
//! [`Document`](crate::document::Document) in place until the analysis
//! converges.
//!
//! ## How the parts work together
//!
//! Running a document through a grammar is a pipeline:
//!
//! ```text
//! grammar text ── grammar::compile ──┐      (once per grammar)
//!                                    │
//! document text ── Document::parse ──┼─ RuleApplicator::run   (applicator.rs)
//!                                    │    - sections in declared order
//!                                    │    - passes to fixpoint per section
//!                                    │    - ContextMatcher per test (context.rs)
//!                                    │    - actions mutate cohorts in place
//!                                    ▼
//!                          disambiguated Document + RunMetrics (metrics.rs)
//! ```
//!
//! The engine leans on **fixpoint iteration**: a section's rules are applied
//! pass after pass until a pass changes nothing. Later rule attempts always
//! observe the mutations of earlier ones, which is why the loop is strictly
//! sequential within one document; sharing happens only at the level of the
//! immutable `RuleSet` and interner, across documents.
//!
//! ## Responsibilities by module
//!
//! - `context.rs`: evaluates one contextual test (offsets, scans, barriers,
//!   careful, negation, links) with read-only document access.
//! - `applicator.rs`: the section/pass/cohort/rule loops and the rule
//!   actions.
//! - `metrics.rs`: per-pass and per-section observation data.

#[path = "engine/applicator.rs"]
mod applicator;
#[path = "engine/context.rs"]
mod context;
#[path = "engine/metrics.rs"]
mod metrics;

pub use applicator::Options;
pub(crate) use applicator::RuleApplicator;
pub use metrics::{PassMetrics, RunMetrics, SectionMetrics};
