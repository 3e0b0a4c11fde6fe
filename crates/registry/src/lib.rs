//! Definition store and registration API for ordered UI contributions.
//!
//! Feature modules register [`Contribution`]s (items, groups, nested sub-sequences) into named
//! [`Definition`]s and attach placement [`Rule`]s to them, without knowing about each other.
//! The `tessera-sequence` crate resolves a definition into one ordered, nested sequence.
//!
//! # Mental Model
//!
//! 1. **Setup:** each module calls [`Registry::register_definition`] for the structures it owns,
//!    then registers contributions into any definition and attaches rules via the returned
//!    [`ContributionHandle`].
//! 2. **Build:** the registry is borrowed shared; nothing here reorders contributions.
//! 3. **Teardown:** [`Registry::unregister_definition`] or [`Registry::unregister_owner`]
//!    discards contributions and rules atomically, after which builds can be repeated.
//!
//! # Key Types
//!
//! | Type | Role |
//! |------|------|
//! | [`Registry`] | Owned store plus registration API. |
//! | [`Definition`] | One buildable structure, contributions in registration order. |
//! | [`Contribution`] | Group, item, or sub-sequence. |
//! | [`Rule`] | Position, scope, relative order, or separation hint. |

mod collision;
mod error;
pub mod model;
mod options;
mod registry;
mod store;

pub use collision::Collision;
pub use error::RegistryError;
pub use model::{Contribution, Position, ROOT_SCOPE, Relation, Rule, Separation};
pub use options::{DuplicatePolicy, RegistryOptions};
pub use registry::{Registry, Unregistered};
pub use store::{ContributionHandle, Definition, Registered};
