//! Deterministic sequencing of registered UI contributions.
//!
//! [`SequenceBuilder`] resolves one definition of a [`tessera_registry::Registry`] into an
//! ordered, nested sequence and writes it into any [`SequenceSink`]. Placement hints are local
//! and may conflict; the builder applies a fixed tie-break policy and drops what it cannot
//! place instead of failing, so the application always starts with a usable UI.
//!
//! ```
//! use tessera_registry::{Position, Registry, Rule, Separation};
//! use tessera_sequence::{SequenceTree, build};
//!
//! let mut registry = Registry::new();
//! registry.register_definition("file", "core").unwrap();
//! let exit = registry.register_item("file", "core", "exit", "Exit").unwrap();
//! registry.register_rule(exit, Rule::position(Position::Bottom)).unwrap();
//! registry.register_rule(exit, Rule::separation(Separation::Above)).unwrap();
//! registry.register_item("file", "core", "open", "Open").unwrap();
//!
//! let mut tree = SequenceTree::new();
//! let report = build(&registry, "file", &mut tree).unwrap();
//! assert!(report.is_complete());
//! assert_eq!(tree.outline(), "open | exit");
//! ```

mod builder;
mod error;
mod options;
mod report;
mod sink;
mod tree;

pub use builder::{SequenceBuilder, build};
pub use error::BuildError;
pub use options::{BuildOptions, DEFAULT_MAX_DEPTH};
pub use report::{BuildReport, Problem, ProblemKind};
pub use sink::SequenceSink;
pub use tree::{Node, SequenceTree};
