//! Per-definition storage.
//!
//! A [`Definition`] keeps its contributions in registration order. Removal shifts later
//! entries down but never reorders them; only the sequence builder produces a different order.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use rustc_hash::FxBuildHasher;

use crate::model::{Contribution, Rule, effective_scope};

pub(crate) type Map<K, V> = IndexMap<K, V, FxBuildHasher>;

/// Opaque handle to a registered contribution. Never reused within a registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ContributionHandle(pub(crate) u64);

impl ContributionHandle {
	#[inline]
	pub fn as_u64(self) -> u64 {
		self.0
	}
}

impl fmt::Display for ContributionHandle {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "#{}", self.0)
	}
}

/// A contribution together with its owner and attached rules.
#[derive(Debug, Clone)]
pub struct Registered<P> {
	pub(crate) handle: ContributionHandle,
	pub(crate) owner: Arc<str>,
	pub(crate) contribution: Contribution<P>,
	pub(crate) rules: Vec<Rule>,
}

impl<P> Registered<P> {
	#[inline]
	pub fn handle(&self) -> ContributionHandle {
		self.handle
	}

	/// Module that registered this contribution.
	#[inline]
	pub fn owner(&self) -> &str {
		&self.owner
	}

	#[inline]
	pub fn contribution(&self) -> &Contribution<P> {
		&self.contribution
	}

	#[inline]
	pub fn id(&self) -> &str {
		self.contribution.id()
	}

	/// Rules in attachment order.
	#[inline]
	pub fn rules(&self) -> &[Rule] {
		&self.rules
	}

	/// Sub-scope this contribution currently lives in.
	#[inline]
	pub fn scope(&self) -> &str {
		effective_scope(&self.rules)
	}
}

/// One buildable structure (a menu tree, a tool strip).
#[derive(Debug, Clone)]
pub struct Definition<P> {
	pub(crate) id: Arc<str>,
	pub(crate) owner: Arc<str>,
	pub(crate) contributions: Map<ContributionHandle, Registered<P>>,
}

impl<P> Definition<P> {
	pub(crate) fn new(id: Arc<str>, owner: Arc<str>) -> Self {
		Self {
			id,
			owner,
			contributions: Map::default(),
		}
	}

	#[inline]
	pub fn id(&self) -> &str {
		&self.id
	}

	#[inline]
	pub fn id_arc(&self) -> &Arc<str> {
		&self.id
	}

	/// Module that created this definition.
	#[inline]
	pub fn owner(&self) -> &str {
		&self.owner
	}

	/// Contributions in registration order.
	pub fn contributions(&self) -> impl ExactSizeIterator<Item = &Registered<P>> + '_ {
		self.contributions.values()
	}

	#[inline]
	pub fn get(&self, handle: ContributionHandle) -> Option<&Registered<P>> {
		self.contributions.get(&handle)
	}

	#[inline]
	pub fn len(&self) -> usize {
		self.contributions.len()
	}

	#[inline]
	pub fn is_empty(&self) -> bool {
		self.contributions.is_empty()
	}

	/// Finds the live contribution with `id` in `scope`, skipping `except`.
	pub(crate) fn find_in_scope(
		&self,
		scope: &str,
		id: &str,
		except: Option<ContributionHandle>,
	) -> Option<&Registered<P>> {
		self.contributions
			.values()
			.find(|reg| Some(reg.handle) != except && reg.id() == id && reg.scope() == scope)
	}
}
