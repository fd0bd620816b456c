//! Action registry with user override layers.
//!
//! Specs are keyed by id in registration order. Shortcut and icon overrides
//! are kept in separate caches with their own lifecycle: they may be set
//! before the action they refer to is registered and survive its removal.
//! Lookups go override first (when present and non-empty), declared value
//! second.

use appcore_keyseq::KeySequence;
use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::error::{ActionError, EntityKind};
use crate::spec::{ActionSpec, IconRef, SpecEvent};


/// Flat mapping from action id to [`ActionSpec`].
#[derive(Debug, Default)]
pub struct ActionRegistry {
	specs: IndexMap<String, ActionSpec>,
	shortcut_overrides: IndexMap<String, Vec<KeySequence>>,
	icon_overrides: IndexMap<String, IconRef>,
}

impl ActionRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	/// Takes ownership of `spec`.
	///
	/// # Errors
	///
	/// [`ActionError::DuplicateId`] if the id is taken. The existing spec is
	/// kept.
	pub fn register(&mut self, spec: ActionSpec) -> Result<(), ActionError> {
		if self.specs.contains_key(spec.id()) {
			warn!(id = spec.id(), "duplicate action id rejected");
			return Err(ActionError::duplicate(EntityKind::Action, spec.id()));
		}
		debug!(id = spec.id(), "action registered");
		self.specs.insert(spec.id().to_string(), spec);
		Ok(())
	}

	/// Removes and returns a spec. Overrides for the id are kept.
	///
	/// # Errors
	///
	/// [`ActionError::NotFound`] if no spec has this id.
	pub fn unregister(&mut self, id: &str) -> Result<ActionSpec, ActionError> {
		match self.specs.shift_remove(id) {
			Some(spec) => Ok(spec),
			None => {
				warn!(id, "unregister of unknown action");
				Err(ActionError::not_found(EntityKind::Action, id))
			}
		}
	}

	pub fn lookup(&self, id: &str) -> Option<&ActionSpec> {
		self.specs.get(id)
	}

	pub fn lookup_mut(&mut self, id: &str) -> Option<&mut ActionSpec> {
		self.specs.get_mut(id)
	}

	pub fn contains(&self, id: &str) -> bool {
		self.specs.contains_key(id)
	}

	/// Action ids in registration order.
	pub fn ids(&self) -> impl Iterator<Item = &str> {
		self.specs.keys().map(String::as_str)
	}

	pub fn specs(&self) -> impl Iterator<Item = &ActionSpec> {
		self.specs.values()
	}

	pub fn len(&self) -> usize {
		self.specs.len()
	}

	pub fn is_empty(&self) -> bool {
		self.specs.is_empty()
	}

	/// Shortcuts in effect for `id`: the override when present and non-empty,
	/// otherwise the declared list. Empty for unknown ids without override.
	pub fn effective_shortcuts(&self, id: &str) -> &[KeySequence] {
		if let Some(keys) = self.shortcut_overrides.get(id)
			&& !keys.is_empty()
		{
			return keys;
		}
		self.specs.get(id).map_or(&[], ActionSpec::shortcuts)
	}

	/// Icon in effect for `id`, with the same precedence as shortcuts.
	pub fn effective_icon(&self, id: &str) -> Option<&IconRef> {
		self.icon_overrides
			.get(id)
			.filter(|icon| !icon.is_empty())
			.or_else(|| self.specs.get(id).and_then(ActionSpec::icon))
	}

	pub fn set_shortcut_override(&mut self, id: impl Into<String>, keys: Vec<KeySequence>) {
		let id = id.into();
		self.shortcut_overrides.insert(id.clone(), keys);
		self.notify(&id, SpecEvent::ShortcutsChanged { id: id.clone() });
	}

	/// Drops the override for `id`, returning it.
	pub fn clear_shortcut_override(&mut self, id: &str) -> Option<Vec<KeySequence>> {
		let removed = self.shortcut_overrides.shift_remove(id)?;
		self.notify(id, SpecEvent::ShortcutsChanged { id: id.to_string() });
		Some(removed)
	}

	pub fn set_icon_override(&mut self, id: impl Into<String>, icon: IconRef) {
		let id = id.into();
		self.icon_overrides.insert(id.clone(), icon);
		self.notify(&id, SpecEvent::IconChanged { id: id.clone() });
	}

	pub fn clear_icon_override(&mut self, id: &str) -> Option<IconRef> {
		let removed = self.icon_overrides.shift_remove(id)?;
		self.notify(id, SpecEvent::IconChanged { id: id.to_string() });
		Some(removed)
	}

	/// Drops every override, notifying affected live specs.
	pub fn clear_overrides(&mut self) {
		let shortcuts = std::mem::take(&mut self.shortcut_overrides);
		let icons = std::mem::take(&mut self.icon_overrides);
		for id in shortcuts.keys() {
			self.notify(id, SpecEvent::ShortcutsChanged { id: id.clone() });
		}
		for id in icons.keys() {
			self.notify(id, SpecEvent::IconChanged { id: id.clone() });
		}
	}

	pub fn shortcut_overrides(&self) -> &IndexMap<String, Vec<KeySequence>> {
		&self.shortcut_overrides
	}

	pub fn icon_overrides(&self) -> &IndexMap<String, IconRef> {
		&self.icon_overrides
	}

	fn notify(&self, id: &str, event: SpecEvent) {
		if let Some(spec) = self.specs.get(id) {
			spec.notify(&event);
		}
	}
}
