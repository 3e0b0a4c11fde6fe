//! In-memory sink producing a plain node tree.
//!
//! Renderers that build their widgets in a second step (and tests) can collect a sequence
//! here and walk the nodes afterwards.

use std::fmt;
use std::sync::Arc;

use tessera_registry::Contribution;

use crate::sink::SequenceSink;

/// A node in a resolved sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node<P> {
	Item {
		id: Arc<str>,
		payload: P,
	},
	Separator,
	/// Nested sequence; `children` is never empty.
	SubSequence {
		id: Arc<str>,
		payload: P,
		children: Vec<Node<P>>,
	},
}

impl<P> Node<P> {
	/// Returns the contribution id, or `None` for separators.
	pub fn id(&self) -> Option<&str> {
		match self {
			Self::Item { id, .. } | Self::SubSequence { id, .. } => Some(id),
			Self::Separator => None,
		}
	}

	pub fn is_separator(&self) -> bool {
		matches!(self, Self::Separator)
	}

	pub fn children(&self) -> &[Node<P>] {
		match self {
			Self::SubSequence { children, .. } => children,
			_ => &[],
		}
	}
}

type Filter<P> = Arc<dyn Fn(&Contribution<P>) -> bool + Send + Sync>;

/// Sink collecting [`Node`]s, optionally hiding contributions through a filter.
///
/// Nested sinks inherit the filter.
pub struct SequenceTree<P> {
	nodes: Vec<Node<P>>,
	filter: Option<Filter<P>>,
}

impl<P> Default for SequenceTree<P> {
	fn default() -> Self {
		Self {
			nodes: Vec::new(),
			filter: None,
		}
	}
}

impl<P> SequenceTree<P> {
	pub fn new() -> Self {
		Self::default()
	}

	/// Creates a tree that only accepts contributions for which `filter` returns true.
	pub fn with_filter(filter: impl Fn(&Contribution<P>) -> bool + Send + Sync + 'static) -> Self {
		Self {
			nodes: Vec::new(),
			filter: Some(Arc::new(filter)),
		}
	}

	pub fn nodes(&self) -> &[Node<P>] {
		&self.nodes
	}

	pub fn into_nodes(self) -> Vec<Node<P>> {
		self.nodes
	}

	/// Renders the tree on one line: ids separated by spaces, `|` for separators and
	/// `id[...]` for sub-sequences.
	pub fn outline(&self) -> String {
		let mut out = String::new();
		write_outline(&mut out, &self.nodes);
		out
	}
}

fn write_outline<P>(out: &mut String, nodes: &[Node<P>]) {
	for (i, node) in nodes.iter().enumerate() {
		if i > 0 {
			out.push(' ');
		}
		match node {
			Node::Item { id, .. } => out.push_str(id),
			Node::Separator => out.push('|'),
			Node::SubSequence { id, children, .. } => {
				out.push_str(id);
				out.push('[');
				write_outline(out, children);
				out.push(']');
			}
		}
	}
}

impl<P> fmt::Debug for SequenceTree<P> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("SequenceTree")
			.field("outline", &self.outline())
			.field("filtered", &self.filter.is_some())
			.finish()
	}
}

impl<P: Clone> SequenceSink<P> for SequenceTree<P> {
	fn init_item(&mut self, contribution: &Contribution<P>) -> bool {
		self.filter.as_ref().is_none_or(|filter| filter(contribution))
	}

	fn add(&mut self, contribution: &Contribution<P>) {
		if let Some(payload) = contribution.payload() {
			self.nodes.push(Node::Item {
				id: Arc::clone(contribution.id_arc()),
				payload: payload.clone(),
			});
		}
	}

	fn add_separator(&mut self) {
		self.nodes.push(Node::Separator);
	}

	fn is_empty(&self) -> bool {
		self.nodes.is_empty()
	}

	fn nested(&self, _contribution: &Contribution<P>) -> Self {
		Self {
			nodes: Vec::new(),
			filter: self.filter.clone(),
		}
	}

	fn add_sub_sequence(&mut self, contribution: &Contribution<P>, nested: Self) {
		if let Some(payload) = contribution.payload() {
			self.nodes.push(Node::SubSequence {
				id: Arc::clone(contribution.id_arc()),
				payload: payload.clone(),
				children: nested.nodes,
			});
		}
	}
}
