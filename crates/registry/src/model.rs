//! Contribution and placement rule types.
//!
//! A contribution is one unit of UI content registered into a named definition. Rules attach
//! local, partial placement hints to a contribution; the sequence builder resolves them into
//! a single nested order.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Id of the root sub-scope and of the root group inside every sub-scope.
pub const ROOT_SCOPE: &str = "";

/// One unit of UI content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Contribution<P> {
	/// Structural container. Children name it through [`Rule::GroupScope`].
	Group {
		/// Group id, unique within its sub-scope.
		id: Arc<str>,
	},
	/// Leaf entry handed to the sink.
	Item {
		/// Contribution id, unique within its sub-scope.
		id: Arc<str>,
		/// Renderer-defined data.
		payload: P,
	},
	/// Nested sequence (submenu, flyout). Children name `scope` through [`Rule::SubScope`].
	SubSequence {
		/// Contribution id, unique within its sub-scope.
		id: Arc<str>,
		/// Renderer-defined data.
		payload: P,
		/// Id of the nested sub-scope this sequence opens.
		scope: Arc<str>,
	},
}

impl<P> Contribution<P> {
	/// Creates a group contribution.
	pub fn group(id: impl Into<Arc<str>>) -> Self {
		Self::Group { id: id.into() }
	}

	/// Creates an item contribution.
	pub fn item(id: impl Into<Arc<str>>, payload: P) -> Self {
		Self::Item {
			id: id.into(),
			payload,
		}
	}

	/// Creates a sub-sequence whose nested scope shares its id.
	pub fn sub_sequence(id: impl Into<Arc<str>>, payload: P) -> Self {
		let id = id.into();
		Self::SubSequence {
			scope: Arc::clone(&id),
			id,
			payload,
		}
	}

	/// Creates a sub-sequence opening an explicitly named nested scope.
	pub fn sub_sequence_opening(id: impl Into<Arc<str>>, scope: impl Into<Arc<str>>, payload: P) -> Self {
		Self::SubSequence {
			id: id.into(),
			payload,
			scope: scope.into(),
		}
	}

	/// Returns the contribution id.
	pub fn id(&self) -> &str {
		match self {
			Self::Group { id } | Self::Item { id, .. } | Self::SubSequence { id, .. } => id,
		}
	}

	/// Returns the shared contribution id.
	pub fn id_arc(&self) -> &Arc<str> {
		match self {
			Self::Group { id } | Self::Item { id, .. } | Self::SubSequence { id, .. } => id,
		}
	}

	/// Returns the payload for items and sub-sequences.
	pub fn payload(&self) -> Option<&P> {
		match self {
			Self::Group { .. } => None,
			Self::Item { payload, .. } | Self::SubSequence { payload, .. } => Some(payload),
		}
	}

	/// Returns a short variant name for diagnostics.
	pub fn kind(&self) -> &'static str {
		match self {
			Self::Group { .. } => "group",
			Self::Item { .. } => "item",
			Self::SubSequence { .. } => "sub_sequence",
		}
	}
}

/// Coarse placement zone. Buckets are swept in declaration order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Position {
	Top,
	TopLast,
	#[default]
	Middle,
	MiddleLast,
	Bottom,
	BottomLast,
	Custom,
}

impl Position {
	/// All buckets in sweep order.
	pub const SWEEP: [Position; 7] = [
		Position::Top,
		Position::TopLast,
		Position::Middle,
		Position::MiddleLast,
		Position::Bottom,
		Position::BottomLast,
		Position::Custom,
	];
}

/// Where dividers are emitted relative to a contribution or group block.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Separation {
	#[default]
	None,
	Above,
	Below,
	Around,
}

impl Separation {
	/// Returns true for [`Separation::Above`] and [`Separation::Around`].
	pub const fn above(self) -> bool {
		matches!(self, Self::Above | Self::Around)
	}

	/// Returns true for [`Separation::Below`] and [`Separation::Around`].
	pub const fn below(self) -> bool {
		matches!(self, Self::Below | Self::Around)
	}
}

/// Direction of a [`Rule::Relative`] constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Relation {
	/// The declaring contribution is placed before the target.
	Before,
	/// The declaring contribution is placed after the target.
	After,
}

/// Placement hint attached to a registered contribution.
///
/// Scalar hints (position, separation, scopes) follow last-registered-wins; relative rules
/// accumulate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rule {
	Position(Position),
	/// Files the contribution under the named group of its sub-scope.
	GroupScope(Arc<str>),
	/// Moves the contribution into the named nested sub-scope.
	SubScope(Arc<str>),
	Relative {
		target: Arc<str>,
		relation: Relation,
	},
	Separation(Separation),
}

impl Rule {
	pub fn position(position: Position) -> Self {
		Self::Position(position)
	}

	pub fn group(parent: impl Into<Arc<str>>) -> Self {
		Self::GroupScope(parent.into())
	}

	pub fn sub_scope(parent: impl Into<Arc<str>>) -> Self {
		Self::SubScope(parent.into())
	}

	/// The declaring contribution is placed before `target`.
	pub fn before(target: impl Into<Arc<str>>) -> Self {
		Self::Relative {
			target: target.into(),
			relation: Relation::Before,
		}
	}

	/// The declaring contribution is placed after `target`.
	pub fn after(target: impl Into<Arc<str>>) -> Self {
		Self::Relative {
			target: target.into(),
			relation: Relation::After,
		}
	}

	pub fn separation(separation: Separation) -> Self {
		Self::Separation(separation)
	}
}

/// Resolves the effective sub-scope from a rule list (last `SubScope` wins).
pub fn effective_scope(rules: &[Rule]) -> &str {
	rules
		.iter()
		.rev()
		.find_map(|rule| match rule {
			Rule::SubScope(scope) => Some(scope.as_ref()),
			_ => None,
		})
		.unwrap_or(ROOT_SCOPE)
}
