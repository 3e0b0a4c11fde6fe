//! Registration API over the definition store.
//!
//! # Invariants
//!
//! - Definition ids are unique within a registry.
//!   - Enforced in: [`Registry::register_definition`].
//!   - Failure symptom: two modules silently share one menu tree.
//!
//! - Contribution ids are unique within a (definition, sub-scope) pair.
//!   - Enforced in: [`Registry::register_contribution_in`], [`Registry::register_rule`]
//!     (for `SubScope` moves).
//!   - Failure symptom: relative rules resolve against the wrong contribution.
//!
//! - Every rule is attached to a live contribution.
//!   - Enforced in: [`Registry::register_rule`] via the handle table.
//!   - Failure symptom: rules survive their contribution and leak into rebuilds.

use std::sync::Arc;

use rustc_hash::FxHashMap;
use tracing::{debug, trace};

use crate::collision::Collision;
use crate::error::RegistryError;
use crate::model::{Contribution, ROOT_SCOPE, Rule};
use crate::options::{DuplicatePolicy, RegistryOptions};
use crate::store::{ContributionHandle, Definition, Map, Registered};

/// Counts returned by [`Registry::unregister_owner`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Unregistered {
	pub definitions: usize,
	pub contributions: usize,
}

/// Owned store of definitions, scoped to the application session that creates it.
///
/// Mutation requires `&mut self`; builds borrow it shared.
#[derive(Debug, Clone)]
pub struct Registry<P> {
	options: RegistryOptions,
	definitions: Map<Arc<str>, Definition<P>>,
	handles: FxHashMap<ContributionHandle, Arc<str>>,
	next_handle: u64,
	collisions: Vec<Collision>,
}

impl<P> Default for Registry<P> {
	fn default() -> Self {
		Self::with_options(RegistryOptions::default())
	}
}

impl<P> Registry<P> {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_options(options: RegistryOptions) -> Self {
		Self {
			options,
			definitions: Map::default(),
			handles: FxHashMap::default(),
			next_handle: 0,
			collisions: Vec::new(),
		}
	}

	#[inline]
	pub fn options(&self) -> &RegistryOptions {
		&self.options
	}

	/// Creates an empty definition.
	pub fn register_definition(
		&mut self,
		id: impl Into<Arc<str>>,
		owner: impl Into<Arc<str>>,
	) -> Result<(), RegistryError> {
		let id = id.into();
		let owner = owner.into();
		if let Some(existing) = self.definitions.get(&id) {
			return Err(RegistryError::DuplicateDefinition {
				id,
				existing_owner: Arc::clone(&existing.owner),
				new_owner: owner,
			});
		}
		trace!(definition = %id, %owner, "registered definition");
		self.definitions
			.insert(Arc::clone(&id), Definition::new(id, owner));
		Ok(())
	}

	/// Appends a contribution to the root sub-scope of `definition`.
	///
	/// The id is checked against the root scope. Contributions meant for a nested scope whose
	/// id may already exist at the root go through [`Self::register_contribution_in`].
	pub fn register_contribution(
		&mut self,
		definition: &str,
		owner: impl Into<Arc<str>>,
		contribution: Contribution<P>,
	) -> Result<ContributionHandle, RegistryError> {
		self.register_contribution_in(definition, ROOT_SCOPE, owner, contribution)
	}

	/// Appends a contribution directly into sub-scope `scope` of `definition`.
	///
	/// The id is checked against `scope` only. A non-root scope is recorded as the
	/// contribution's first rule, so later `SubScope` rules still move it.
	pub fn register_contribution_in(
		&mut self,
		definition: &str,
		scope: impl Into<Arc<str>>,
		owner: impl Into<Arc<str>>,
		contribution: Contribution<P>,
	) -> Result<ContributionHandle, RegistryError> {
		let scope = scope.into();
		let owner = owner.into();
		let policy = self.options.duplicate_policy;
		let def = self
			.definitions
			.get_mut(definition)
			.ok_or_else(|| RegistryError::UnknownDefinition {
				id: Arc::from(definition),
			})?;

		let handle = ContributionHandle(self.next_handle);
		let existing = def
			.find_in_scope(&scope, contribution.id(), None)
			.map(|reg| (reg.handle, Arc::clone(&reg.owner)));
		if let Some((existing, existing_owner)) = existing {
			match policy {
				DuplicatePolicy::Reject => {
					return Err(RegistryError::DuplicateContribution {
						definition: Arc::clone(&def.id),
						scope,
						id: Arc::clone(contribution.id_arc()),
						existing_owner,
						new_owner: owner,
					});
				}
				DuplicatePolicy::LastWins => {
					def.contributions.shift_remove(&existing);
					self.handles.remove(&existing);
					let collision = Collision {
						definition: Arc::clone(&def.id),
						scope: Arc::clone(&scope),
						id: Arc::clone(contribution.id_arc()),
						replaced: existing,
						replaced_owner: existing_owner,
						incoming: handle,
						incoming_owner: Arc::clone(&owner),
					};
					debug!(?collision, "contribution replaced");
					self.collisions.push(collision);
				}
			}
		}

		self.next_handle += 1;
		trace!(
			definition = %def.id,
			%owner,
			%scope,
			id = contribution.id(),
			kind = contribution.kind(),
			%handle,
			"registered contribution"
		);
		let rules = if scope.as_ref() == ROOT_SCOPE {
			Vec::new()
		} else {
			vec![Rule::SubScope(scope)]
		};
		def.contributions.insert(
			handle,
			Registered {
				handle,
				owner,
				contribution,
				rules,
			},
		);
		self.handles.insert(handle, Arc::clone(&def.id));
		Ok(handle)
	}

	pub fn register_group(
		&mut self,
		definition: &str,
		owner: impl Into<Arc<str>>,
		id: impl Into<Arc<str>>,
	) -> Result<ContributionHandle, RegistryError> {
		self.register_contribution(definition, owner, Contribution::group(id))
	}

	pub fn register_item(
		&mut self,
		definition: &str,
		owner: impl Into<Arc<str>>,
		id: impl Into<Arc<str>>,
		payload: P,
	) -> Result<ContributionHandle, RegistryError> {
		self.register_contribution(definition, owner, Contribution::item(id, payload))
	}

	/// Registers a sub-sequence whose nested scope shares its id.
	pub fn register_sub_sequence(
		&mut self,
		definition: &str,
		owner: impl Into<Arc<str>>,
		id: impl Into<Arc<str>>,
		payload: P,
	) -> Result<ContributionHandle, RegistryError> {
		self.register_contribution(definition, owner, Contribution::sub_sequence(id, payload))
	}

	/// Registers a sub-sequence opening an explicitly named nested scope.
	pub fn register_sub_sequence_opening(
		&mut self,
		definition: &str,
		owner: impl Into<Arc<str>>,
		id: impl Into<Arc<str>>,
		scope: impl Into<Arc<str>>,
		payload: P,
	) -> Result<ContributionHandle, RegistryError> {
		self.register_contribution(
			definition,
			owner,
			Contribution::sub_sequence_opening(id, scope, payload),
		)
	}

	pub fn register_group_in(
		&mut self,
		definition: &str,
		scope: impl Into<Arc<str>>,
		owner: impl Into<Arc<str>>,
		id: impl Into<Arc<str>>,
	) -> Result<ContributionHandle, RegistryError> {
		self.register_contribution_in(definition, scope, owner, Contribution::group(id))
	}

	/// Registers an item directly into sub-scope `scope`.
	pub fn register_item_in(
		&mut self,
		definition: &str,
		scope: impl Into<Arc<str>>,
		owner: impl Into<Arc<str>>,
		id: impl Into<Arc<str>>,
		payload: P,
	) -> Result<ContributionHandle, RegistryError> {
		self.register_contribution_in(definition, scope, owner, Contribution::item(id, payload))
	}

	pub fn register_sub_sequence_in(
		&mut self,
		definition: &str,
		scope: impl Into<Arc<str>>,
		owner: impl Into<Arc<str>>,
		id: impl Into<Arc<str>>,
		payload: P,
	) -> Result<ContributionHandle, RegistryError> {
		self.register_contribution_in(
			definition,
			scope,
			owner,
			Contribution::sub_sequence(id, payload),
		)
	}

	/// Appends `rule` to the contribution's rule list.
	pub fn register_rule(
		&mut self,
		handle: ContributionHandle,
		rule: Rule,
	) -> Result<(), RegistryError> {
		let orphan = || RegistryError::OrphanContribution { handle };
		let def_id = self.handles.get(&handle).ok_or_else(orphan)?;
		let def = self.definitions.get_mut(def_id).ok_or_else(orphan)?;
		let current = def.get(handle).ok_or_else(orphan)?;

		if let Rule::SubScope(scope) = &rule
			&& current.scope() != scope.as_ref()
		{
			let incoming_owner = Arc::clone(&current.owner);
			let id = Arc::clone(current.contribution.id_arc());
			let existing = def
				.find_in_scope(scope, &id, Some(handle))
				.map(|reg| (reg.handle, Arc::clone(&reg.owner)));
			if let Some((existing, existing_owner)) = existing {
				match self.options.duplicate_policy {
					DuplicatePolicy::Reject => {
						return Err(RegistryError::DuplicateContribution {
							definition: Arc::clone(&def.id),
							scope: Arc::clone(scope),
							id,
							existing_owner,
							new_owner: incoming_owner,
						});
					}
					DuplicatePolicy::LastWins => {
						def.contributions.shift_remove(&existing);
						self.handles.remove(&existing);
						let collision = Collision {
							definition: Arc::clone(&def.id),
							scope: Arc::clone(scope),
							id,
							replaced: existing,
							replaced_owner: existing_owner,
							incoming: handle,
							incoming_owner,
						};
						debug!(?collision, "contribution replaced");
						self.collisions.push(collision);
					}
				}
			}
		}

		let reg = def.contributions.get_mut(&handle).ok_or_else(orphan)?;
		trace!(definition = %def.id, id = reg.id(), %handle, ?rule, "registered rule");
		reg.rules.push(rule);
		Ok(())
	}

	/// Removes a definition together with all of its contributions and rules.
	///
	/// Returns the removed definition, or `None` if it was not registered.
	pub fn unregister_definition(&mut self, id: &str) -> Option<Definition<P>> {
		let def = self.definitions.shift_remove(id)?;
		for handle in def.contributions.keys() {
			self.handles.remove(handle);
		}
		debug!(
			definition = %def.id,
			contributions = def.contributions.len(),
			"unregistered definition"
		);
		Some(def)
	}

	/// Removes everything `owner` registered: its definitions, and its contributions inside
	/// definitions owned by other modules.
	pub fn unregister_owner(&mut self, owner: &str) -> Unregistered {
		let mut removed = Unregistered::default();

		let owned: Vec<Arc<str>> = self
			.definitions
			.values()
			.filter(|def| def.owner.as_ref() == owner)
			.map(|def| Arc::clone(&def.id))
			.collect();
		for id in owned {
			if let Some(def) = self.unregister_definition(&id) {
				removed.definitions += 1;
				removed.contributions += def.contributions.len();
			}
		}

		for def in self.definitions.values_mut() {
			let handles = &mut self.handles;
			def.contributions.retain(|handle, reg| {
				let keep = reg.owner.as_ref() != owner;
				if !keep {
					handles.remove(handle);
					removed.contributions += 1;
				}
				keep
			});
		}

		debug!(
			%owner,
			definitions = removed.definitions,
			contributions = removed.contributions,
			"unregistered owner"
		);
		removed
	}

	#[inline]
	pub fn definition(&self, id: &str) -> Option<&Definition<P>> {
		self.definitions.get(id)
	}

	#[inline]
	pub fn contains_definition(&self, id: &str) -> bool {
		self.definitions.contains_key(id)
	}

	/// Definition ids in registration order.
	pub fn definition_ids(&self) -> impl Iterator<Item = &str> + '_ {
		self.definitions.keys().map(|id| id.as_ref())
	}

	/// Resolves a handle to its live contribution.
	pub fn contribution(&self, handle: ContributionHandle) -> Option<&Registered<P>> {
		let def_id = self.handles.get(&handle)?;
		self.definitions.get(def_id)?.get(handle)
	}

	/// Rules attached to a live contribution.
	pub fn rules(&self, handle: ContributionHandle) -> Option<&[Rule]> {
		self.contribution(handle).map(Registered::rules)
	}

	/// Replacements performed under [`DuplicatePolicy::LastWins`].
	#[inline]
	pub fn collisions(&self) -> &[Collision] {
		&self.collisions
	}

	#[inline]
	pub fn len(&self) -> usize {
		self.definitions.len()
	}

	#[inline]
	pub fn is_empty(&self) -> bool {
		self.definitions.is_empty()
	}
}
