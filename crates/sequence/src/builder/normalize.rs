//! Pass 1: resolve each contribution's rules and file it into its (sub-scope, group) bucket.
//!
//! `Relative { target, Before }` on A is stored as an AFTER edge on the target. When the target
//! has not been seen yet in A's sub-scope, the edge is parked in that sub-scope's deferred map
//! and spliced in when the target is materialized, so one left-to-right pass handles forward
//! references.

use rustc_hash::{FxHashMap, FxHashSet};
use tessera_registry::{
	Contribution, Definition, Position, ROOT_SCOPE, Relation, Rule, Separation,
};

/// Index of the root sub-scope, and of the root group inside every sub-scope.
pub(super) const ROOT: usize = 0;

/// What a contribution opens when it is dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Opens {
	Nothing,
	/// Group record in the contribution's own sub-scope.
	Group(usize),
	/// Nested sub-scope record.
	Scope(usize),
}

pub(super) struct Entry<'a, P> {
	pub(super) contribution: &'a Contribution<P>,
	pub(super) position: Position,
	pub(super) separation: Separation,
	pub(super) scope: usize,
	/// Ids that must be processed in this sub-scope first, in insertion order.
	pub(super) after: Vec<&'a str>,
	/// Ordinal of the contribution registered immediately before this one.
	pub(super) previous_hint: Option<usize>,
	pub(super) opens: Opens,
}

impl<'a, P> Entry<'a, P> {
	#[inline]
	pub(super) fn id(&self) -> &'a str {
		self.contribution.id()
	}
}

pub(super) struct GroupRecord<'a> {
	pub(super) id: &'a str,
	/// Ordinals not placed yet, in registration order.
	pub(super) unplaced: Vec<usize>,
	pub(super) separation: Separation,
	/// Set once a Group contribution (or the root) owns this record.
	pub(super) declared: bool,
}

pub(super) struct ScopeRecord<'a> {
	pub(super) id: &'a str,
	pub(super) groups: Vec<GroupRecord<'a>>,
	group_index: FxHashMap<&'a str, usize>,
	by_id: FxHashMap<&'a str, usize>,
	deferred: FxHashMap<&'a str, Vec<&'a str>>,
	pub(super) processed: FxHashSet<&'a str>,
	pub(super) last_placed: Option<usize>,
	/// Set once a SubSequence (or the root) opens this scope.
	pub(super) opened: bool,
	/// Ordinal of the first SubSequence naming this scope; later ones share it and are dropped.
	pub(super) opener: Option<usize>,
}

impl<'a> ScopeRecord<'a> {
	fn new(id: &'a str) -> Self {
		let mut record = Self {
			id,
			groups: Vec::new(),
			group_index: FxHashMap::default(),
			by_id: FxHashMap::default(),
			deferred: FxHashMap::default(),
			processed: FxHashSet::default(),
			last_placed: None,
			opened: false,
			opener: None,
		};
		let root = record.group(ROOT_SCOPE);
		debug_assert_eq!(root, ROOT);
		record.groups[root].declared = true;
		record
	}

	fn group(&mut self, id: &'a str) -> usize {
		if let Some(&index) = self.group_index.get(id) {
			return index;
		}
		let index = self.groups.len();
		self.groups.push(GroupRecord {
			id,
			unplaced: Vec::new(),
			separation: Separation::None,
			declared: false,
		});
		self.group_index.insert(id, index);
		index
	}

	/// Returns true when every dependency of `entry` has been processed in this scope.
	#[inline]
	pub(super) fn satisfied<P>(&self, entry: &Entry<'a, P>) -> bool {
		entry.after.iter().all(|dep| self.processed.contains(dep))
	}
}

/// Normalized view of one definition, borrowed from the registry for the build.
pub(super) struct Layout<'a, P> {
	pub(super) entries: Vec<Entry<'a, P>>,
	pub(super) scopes: Vec<ScopeRecord<'a>>,
	scope_index: FxHashMap<&'a str, usize>,
}

struct Hints<'a> {
	position: Position,
	separation: Separation,
	scope: &'a str,
	group: &'a str,
	after: Vec<&'a str>,
	before: Vec<&'a str>,
}

impl<'a> Hints<'a> {
	fn resolve(rules: &'a [Rule]) -> Self {
		let mut hints = Self {
			position: Position::default(),
			separation: Separation::default(),
			scope: ROOT_SCOPE,
			group: ROOT_SCOPE,
			after: Vec::new(),
			before: Vec::new(),
		};
		for rule in rules {
			match rule {
				Rule::Position(position) => hints.position = *position,
				Rule::Separation(separation) => hints.separation = *separation,
				Rule::SubScope(scope) => hints.scope = scope.as_ref(),
				Rule::GroupScope(group) => hints.group = group.as_ref(),
				Rule::Relative {
					target,
					relation: Relation::After,
				} => push_unique(&mut hints.after, target),
				Rule::Relative {
					target,
					relation: Relation::Before,
				} => push_unique(&mut hints.before, target),
			}
		}
		hints
	}
}

fn push_unique<'a>(ids: &mut Vec<&'a str>, id: &'a str) {
	if !ids.contains(&id) {
		ids.push(id);
	}
}

impl<'a, P> Layout<'a, P> {
	pub(super) fn normalize(definition: &'a Definition<P>) -> Self {
		let mut layout = Self {
			entries: Vec::with_capacity(definition.len()),
			scopes: Vec::new(),
			scope_index: FxHashMap::default(),
		};
		let root = layout.scope(ROOT_SCOPE);
		debug_assert_eq!(root, ROOT);
		layout.scopes[root].opened = true;

		for (ordinal, registered) in definition.contributions().enumerate() {
			let contribution = registered.contribution();
			let id = contribution.id();
			let hints = Hints::resolve(registered.rules());
			let scope = layout.scope(hints.scope);

			let record = &mut layout.scopes[scope];
			let mut after = hints.after;
			if let Some(parked) = record.deferred.remove(id) {
				for dep in parked {
					push_unique(&mut after, dep);
				}
			}
			record.by_id.insert(id, ordinal);
			for target in hints.before {
				if target == id {
					push_unique(&mut after, id);
					continue;
				}
				match record.by_id.get(target) {
					Some(&seen) => push_unique(&mut layout.entries[seen].after, id),
					None => record.deferred.entry(target).or_default().push(id),
				}
			}

			let group = record.group(hints.group);
			record.groups[group].unplaced.push(ordinal);

			let opens = match contribution {
				Contribution::Item { .. } => Opens::Nothing,
				Contribution::Group { .. } => {
					let own = record.group(id);
					if id != ROOT_SCOPE {
						record.groups[own].declared = true;
						record.groups[own].separation = hints.separation;
					}
					Opens::Group(own)
				}
				Contribution::SubSequence { scope: nested, .. } => {
					let nested = layout.scope(nested);
					layout.scopes[nested].opened = true;
					if nested != ROOT {
						layout.scopes[nested].opener.get_or_insert(ordinal);
					}
					Opens::Scope(nested)
				}
			};

			layout.entries.push(Entry {
				contribution,
				position: hints.position,
				separation: hints.separation,
				scope,
				after,
				previous_hint: ordinal.checked_sub(1),
				opens,
			});
		}

		layout
	}

	fn scope(&mut self, id: &'a str) -> usize {
		if let Some(&index) = self.scope_index.get(id) {
			return index;
		}
		let index = self.scopes.len();
		self.scopes.push(ScopeRecord::new(id));
		self.scope_index.insert(id, index);
		index
	}

	/// Buckets holding contributions that no frame can ever open, as (scope, group) indices.
	pub(super) fn unreachable(&self) -> Vec<(usize, usize)> {
		let mut buckets = Vec::new();
		for (s, scope) in self.scopes.iter().enumerate() {
			for (g, group) in scope.groups.iter().enumerate() {
				if !group.unplaced.is_empty() && !(scope.opened && group.declared) {
					buckets.push((s, g));
				}
			}
		}
		buckets
	}
}
