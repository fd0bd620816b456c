//! The [`ActionSystem`] context object.
//!
//! Owns the registry, every domain and the persisted layouts. Components
//! that need action lookup receive a reference to it instead of reaching for
//! a process-wide instance.

use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use tracing::{debug, info, warn};

use crate::domain::{ActionDomain, DomainState};
use crate::error::{ActionError, EntityKind};
use crate::loader::{self, LoadOptions, LoadReport};
use crate::registry::ActionRegistry;
use crate::settings::{Customization, SETTINGS_KEY, SettingsStore};

#[cfg(test)]
mod tests;

#[derive(Debug, Default)]
pub struct ActionSystem {
	registry: ActionRegistry,
	domains: IndexMap<String, ActionDomain>,
	/// User layouts by domain id, kept for domains not added yet.
	state_overrides: IndexMap<String, DomainState>,
}

impl ActionSystem {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn registry(&self) -> &ActionRegistry {
		&self.registry
	}

	pub fn registry_mut(&mut self) -> &mut ActionRegistry {
		&mut self.registry
	}

	/// Adds a domain, handing it any layout stored for its id.
	///
	/// A layout the domain already carries is adopted when none is stored.
	pub fn add_domain(&mut self, mut domain: ActionDomain) -> Result<(), ActionError> {
		if self.domains.contains_key(domain.id()) {
			warn!(domain = %domain.id(), "duplicate domain rejected");
			return Err(ActionError::duplicate(EntityKind::Domain, domain.id()));
		}
		match self.state_overrides.get(domain.id()) {
			Some(state) => domain.set_state_override(Some(state.clone())),
			None => {
				if let Some(state) = domain.state_override() {
					self.state_overrides.insert(domain.id().to_string(), state.clone());
				}
			}
		}
		debug!(domain = %domain.id(), "domain added");
		self.domains.insert(domain.id().to_string(), domain);
		Ok(())
	}

	/// Removes a domain. Its stored layout stays for a later re-add.
	pub fn remove_domain(&mut self, id: &str) -> Result<ActionDomain, ActionError> {
		self.domains.shift_remove(id).ok_or_else(|| {
			warn!(domain = id, "cannot remove unknown domain");
			ActionError::not_found(EntityKind::Domain, id)
		})
	}

	pub fn domain(&self, id: &str) -> Option<&ActionDomain> {
		self.domains.get(id)
	}

	pub fn domain_mut(&mut self, id: &str) -> Option<&mut ActionDomain> {
		self.domains.get_mut(id)
	}

	/// Domains in the order they were added.
	pub fn domains(&self) -> impl Iterator<Item = &ActionDomain> {
		self.domains.values()
	}

	pub fn domain_ids(&self) -> impl Iterator<Item = &str> {
		self.domains.keys().map(String::as_str)
	}

	pub fn state_override(&self, id: &str) -> Option<&DomainState> {
		self.state_overrides.get(id)
	}

	/// Stores or clears the user layout for domain `id` and forwards it to
	/// the domain when present.
	pub fn set_state_override(&mut self, id: &str, state: Option<DomainState>) {
		match &state {
			Some(state) => {
				self.state_overrides.insert(id.to_string(), state.clone());
			}
			None => {
				self.state_overrides.shift_remove(id);
			}
		}
		if let Some(domain) = self.domains.get_mut(id) {
			domain.set_state_override(state);
		}
	}

	/// Merges a manifest into the system. See [`crate::loader`] for the format.
	pub fn load_manifest(&mut self, bytes: &[u8], options: &LoadOptions) -> Result<LoadReport, ActionError> {
		loader::load(self, bytes, options)
	}

	pub fn load_manifest_file(&mut self, path: impl AsRef<Path>, options: &LoadOptions) -> Result<LoadReport, ActionError> {
		let path = path.as_ref();
		let bytes = fs::read(path).inspect_err(|error| {
			warn!(path = %path.display(), %error, "manifest unreadable");
		})?;
		let report = self.load_manifest(&bytes, options)?;
		info!(
			path = %path.display(),
			actions = report.actions.len(),
			domains = report.domains.len(),
			"manifest file loaded"
		);
		Ok(report)
	}

	/// Replaces all user customization with what `store` holds.
	///
	/// A missing entry resets to the declared defaults.
	pub fn read_settings(&mut self, store: &dyn SettingsStore) {
		let custom = store
			.get(SETTINGS_KEY)
			.map(|value| Customization::decode(&value))
			.unwrap_or_default();

		self.registry.clear_overrides();
		for (id, keys) in custom.shortcuts {
			self.registry.set_shortcut_override(id, keys);
		}
		for (id, icon) in custom.icons {
			self.registry.set_icon_override(id, icon);
		}

		let stale: Vec<String> = self
			.state_overrides
			.keys()
			.filter(|id| !custom.state.contains_key(id.as_str()))
			.cloned()
			.collect();
		for id in stale {
			self.set_state_override(&id, None);
		}
		for (id, state) in custom.state {
			self.set_state_override(&id, Some(state));
		}
		debug!(
			layouts = self.state_overrides.len(),
			shortcuts = self.registry.shortcut_overrides().len(),
			icons = self.registry.icon_overrides().len(),
			"settings read"
		);
	}

	/// Writes all user customization to `store`.
	pub fn save_settings(&self, store: &mut dyn SettingsStore) {
		let custom = Customization {
			state: self.state_overrides.clone(),
			shortcuts: self.registry.shortcut_overrides().clone(),
			icons: self.registry.icon_overrides().clone(),
		};
		store.set(SETTINGS_KEY, custom.encode());
	}
}
