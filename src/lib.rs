//! kielo: a constraint-grammar disambiguation engine.
//!
//! Constraint Grammar is a declarative rule formalism for disambiguating
//! morphologically ambiguous text: every input token (a *cohort*) carries the
//! candidate analyses (*readings*) an upstream analyser produced, and
//! linguist-authored rules inspect each cohort's neighbours to remove, select
//! or rewrite readings until the text converges on a consistent analysis.
//!
//! The crate has two halves:
//!
//! - [`grammar`]: compiles a CG rule file once into an immutable rule set —
//!   named tag-sets with their algebra fully evaluated, rules grouped into
//!   ordered sections.
//! - [`engine`]: applies a compiled rule set to a [`Document`] in place,
//!   section by section, pass after pass to a fixpoint, with deterministic
//!   rule and cohort order.
//!
//! Most callers only need [`Applicator`]:
//!
//! ```
//! use kielo::Applicator;
//!
//! let applicator = Applicator::from_text(
//!     "LIST Noun = noun ;\nSELECT Noun IF (-1 (det)) ;",
//! ).unwrap();
//!
//! let mut doc = applicator
//!     .parse("\"<the>\"\n\t\"the\" det\n\"<run>\"\n\t\"run\" verb\n\t\"run\" noun\n")
//!     .unwrap();
//! applicator.run_rules(&mut doc);
//!
//! assert_eq!(doc.to_string(), "\"<the>\"\n\t\"the\" det\n\"<run>\"\n\t\"run\" noun\n");
//! ```
//!
//! Disambiguation never deletes: removed readings are disabled in place and
//! stay addressable for the rest of the run, and a cohort always keeps at
//! least one enabled reading, so rule application is total over well-formed
//! input.

#[macro_use]
mod macros;

mod api;
mod document;
mod errors;
mod intern;
mod tags;

pub mod engine;
pub mod grammar;


pub use api::Applicator;
pub use document::{Cohort, Document, Reading};
pub use engine::{Options, PassMetrics, RunMetrics, SectionMetrics};
pub use errors::{CompileError, DocumentError, InvalidTagError};
pub use intern::{Interner, TagId};
pub use tags::{CompositeTag, Tag, TagKind, TagSet, TextMatch, escape_lexeme};
