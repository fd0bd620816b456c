//! Action domains: items, insertion rules and the resolved layout state.
//!
//! A domain owns a flat set of items plus rules placing each item under a
//! target (a top-level slot, group or menu). The resolved [`DomainState`] maps
//! every target to its ordered children and is cached in two layers:
//!
//! * the base layer, derived from items and rules only;
//! * the cached layer, which additionally applies the user's persisted
//!   layout override.
//!
//! Structural changes dirty both layers. Changing the override dirties only
//! the cached layer. Both are recomputed lazily on the next read and handed
//! out as shared immutable snapshots.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use indexmap::{IndexMap, IndexSet};
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::error::{ActionError, EntityKind};
use crate::notify::{Notifier, SubscriptionId};

mod builder;
mod resolver;


pub use builder::{ActionItem, ActionItemKind, UiContainer};

/// Resolved layout: target id to ordered child ids.
pub type DomainState = BTreeMap<String, Vec<String>>;

/// Kind of a domain item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemKind {
	Action,
	Group,
	Menu,
	Separator,
	Stretch,
}

impl ItemKind {
	/// Maps a manifest tag name to a kind.
	pub fn from_tag(tag: &str) -> Option<Self> {
		Some(match tag {
			"action" => ItemKind::Action,
			"group" => ItemKind::Group,
			"menu" => ItemKind::Menu,
			"separator" => ItemKind::Separator,
			"stretch" => ItemKind::Stretch,
			_ => return None,
		})
	}

	pub fn as_str(&self) -> &'static str {
		match self {
			ItemKind::Action => "action",
			ItemKind::Group => "group",
			ItemKind::Menu => "menu",
			ItemKind::Separator => "separator",
			ItemKind::Stretch => "stretch",
		}
	}

	/// Whether items of this kind can be rule targets.
	pub fn is_container(&self) -> bool {
		matches!(self, ItemKind::Group | ItemKind::Menu)
	}
}

impl fmt::Display for ItemKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// An entry of a domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainItem {
	pub id: String,
	pub kind: ItemKind,
	pub title: String,
}

impl DomainItem {
	pub fn new(id: impl Into<String>, kind: ItemKind) -> Self {
		Self {
			id: id.into(),
			kind,
			title: String::new(),
		}
	}

	pub fn with_title(mut self, title: impl Into<String>) -> Self {
		self.title = title.into();
		self
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum InsertMode {
	#[default]
	Append,
	Unshift,
}

/// Places an item under `target`.
///
/// Without an anchor, [`InsertMode::Append`] pushes to the end and
/// [`InsertMode::Unshift`] to the front. With `relative_to`, the item goes
/// immediately after (append) or before (unshift) the anchor.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InsertionRule {
	pub target: String,
	pub mode: InsertMode,
	pub relative_to: Option<String>,
	/// Splice a group's children into the target instead of nesting it.
	pub expand: bool,
}

impl InsertionRule {
	pub fn new(target: impl Into<String>, mode: InsertMode) -> Self {
		Self {
			target: target.into(),
			mode,
			relative_to: None,
			expand: false,
		}
	}

	pub fn append(target: impl Into<String>) -> Self {
		Self::new(target, InsertMode::Append)
	}

	pub fn unshift(target: impl Into<String>) -> Self {
		Self::new(target, InsertMode::Unshift)
	}

	/// Inserts immediately after `anchor`.
	pub fn after(target: impl Into<String>, anchor: impl Into<String>) -> Self {
		Self::append(target).relative_to(anchor)
	}

	/// Inserts immediately before `anchor`.
	pub fn before(target: impl Into<String>, anchor: impl Into<String>) -> Self {
		Self::unshift(target).relative_to(anchor)
	}

	pub fn relative_to(mut self, anchor: impl Into<String>) -> Self {
		self.relative_to = Some(anchor.into());
		self
	}

	pub fn expanded(mut self) -> Self {
		self.expand = true;
		self
	}
}

/// Recoverable problem found while resolving a domain. Resolution always
/// completes; the offending rule or edge is left out.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Diagnostic {
	/// The rule targets something that is neither a slot, group nor menu.
	UnknownTarget { target: String, item: String },
	/// The rule's subject is not an item of the domain.
	UnknownItem { target: String, item: String },
	/// The rule's anchor never appeared under its target.
	UnresolvedAnchor {
		target: String,
		item: String,
		anchor: String,
	},
	/// The edge `parent -> child` would close a cycle and was dropped.
	Cycle { parent: String, child: String },
	/// A persisted layout names a target that no longer exists.
	StaleOverride { target: String },
}

impl fmt::Display for Diagnostic {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Diagnostic::UnknownTarget { target, item } => {
				write!(f, "'{item}' targets unknown container '{target}'")
			}
			Diagnostic::UnknownItem { target, item } => {
				write!(f, "rule under '{target}' refers to unknown item '{item}'")
			}
			Diagnostic::UnresolvedAnchor { target, item, anchor } => {
				write!(f, "'{item}' anchored to '{anchor}' which never appears under '{target}'")
			}
			Diagnostic::Cycle { parent, child } => {
				write!(f, "dropped '{parent}' -> '{child}' to break a cycle")
			}
			Diagnostic::StaleOverride { target } => {
				write!(f, "saved layout for unknown container '{target}' ignored")
			}
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainEvent {
	/// The resolved state was invalidated. `structural` is false when only
	/// the override layer changed.
	StateChanged { structural: bool },
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct RuleEntry {
	item: String,
	rule: InsertionRule,
}

/// Items, slots and rules: everything the resolver reads.
#[derive(Debug, Default)]
pub(crate) struct DomainModel {
	top_levels: IndexSet<String>,
	items: IndexMap<String, DomainItem>,
	rules: Vec<RuleEntry>,
}

impl DomainModel {
	fn is_target(&self, id: &str) -> bool {
		self.top_levels.contains(id) || self.items.get(id).is_some_and(|item| item.kind.is_container())
	}
}

/// One resolved layer with the diagnostics of the pass that produced it.
#[derive(Debug, Clone)]
struct Layer {
	state: Arc<DomainState>,
	diagnostics: Arc<[Diagnostic]>,
}

/// `None` marks a dirty layer.
#[derive(Debug, Default)]
struct StateCache {
	base: Option<Layer>,
	cached: Option<Layer>,
}

/// A named, configurable collection of actions, groups and menus.
#[derive(Debug)]
pub struct ActionDomain {
	id: String,
	title: String,
	configurable: bool,
	model: DomainModel,
	state_override: Option<DomainState>,
	cache: Mutex<StateCache>,
	events: Notifier<DomainEvent>,
}

impl ActionDomain {
	pub fn new(id: impl Into<String>) -> Self {
		Self {
			id: id.into(),
			title: String::new(),
			configurable: true,
			model: DomainModel::default(),
			state_override: None,
			cache: Mutex::new(StateCache::default()),
			events: Notifier::new(),
		}
	}

	pub fn id(&self) -> &str {
		&self.id
	}

	pub fn title(&self) -> &str {
		&self.title
	}

	pub fn set_title(&mut self, title: impl Into<String>) {
		self.title = title.into();
	}

	/// Whether users may customize this domain's layout.
	pub fn configurable(&self) -> bool {
		self.configurable
	}

	pub fn set_configurable(&mut self, configurable: bool) {
		self.configurable = configurable;
	}

	/// Declares a top-level slot such as a menu bar or toolbar.
	///
	/// # Errors
	///
	/// [`ActionError::DuplicateId`] if the id is already a slot or an item.
	pub fn add_top_level(&mut self, id: impl Into<String>) -> Result<(), ActionError> {
		let id = id.into();
		if self.model.top_levels.contains(&id) || self.model.items.contains_key(&id) {
			warn!(domain = %self.id, id = %id, "duplicate top-level slot rejected");
			return Err(ActionError::duplicate(EntityKind::TopLevel, id));
		}
		self.model.top_levels.insert(id);
		self.invalidate();
		Ok(())
	}

	pub fn remove_top_level(&mut self, id: &str) -> Result<(), ActionError> {
		if !self.model.top_levels.shift_remove(id) {
			warn!(domain = %self.id, id, "removal of unknown top-level slot");
			return Err(ActionError::not_found(EntityKind::TopLevel, id));
		}
		self.invalidate();
		Ok(())
	}

	pub fn contains_top_level(&self, id: &str) -> bool {
		self.model.top_levels.contains(id)
	}

	/// Top-level slots in declaration order.
	pub fn top_levels(&self) -> impl Iterator<Item = &str> {
		self.model.top_levels.iter().map(String::as_str)
	}

	/// # Errors
	///
	/// [`ActionError::DuplicateId`] if the id is already an item or a slot.
	pub fn add_item(&mut self, item: DomainItem) -> Result<(), ActionError> {
		if self.model.items.contains_key(&item.id) || self.model.top_levels.contains(&item.id) {
			warn!(domain = %self.id, id = %item.id, "duplicate domain item rejected");
			return Err(ActionError::duplicate(EntityKind::Item, item.id));
		}
		self.model.items.insert(item.id.clone(), item);
		self.invalidate();
		Ok(())
	}

	/// Removes an item together with the rules placing it.
	pub fn remove_item(&mut self, id: &str) -> Result<DomainItem, ActionError> {
		let Some(item) = self.model.items.shift_remove(id) else {
			warn!(domain = %self.id, id, "removal of unknown domain item");
			return Err(ActionError::not_found(EntityKind::Item, id));
		};
		self.model.rules.retain(|entry| entry.item != id);
		self.invalidate();
		Ok(item)
	}

	pub fn item(&self, id: &str) -> Option<&DomainItem> {
		self.model.items.get(id)
	}

	pub fn contains_item(&self, id: &str) -> bool {
		self.model.items.contains_key(id)
	}

	pub fn item_kind(&self, id: &str) -> Option<ItemKind> {
		self.model.items.get(id).map(|item| item.kind)
	}

	/// Items in declaration order.
	pub fn items(&self) -> impl Iterator<Item = &DomainItem> {
		self.model.items.values()
	}

	/// Adds a rule placing `item`. A rule for the same target and item
	/// replaces the previous one and keeps its position in declaration order.
	pub fn add_rule(&mut self, item: impl Into<String>, rule: InsertionRule) {
		let item = item.into();
		match self
			.model
			.rules
			.iter_mut()
			.find(|entry| entry.item == item && entry.rule.target == rule.target)
		{
			Some(entry) => entry.rule = rule,
			None => self.model.rules.push(RuleEntry { item, rule }),
		}
		self.invalidate();
	}

	/// Removes the rule placing `item` under `target`.
	pub fn remove_rule(&mut self, target: &str, item: &str) -> bool {
		let before = self.model.rules.len();
		self.model
			.rules
			.retain(|entry| !(entry.item == item && entry.rule.target == target));
		let removed = self.model.rules.len() != before;
		if removed {
			self.invalidate();
		}
		removed
	}

	pub fn has_rule(&self, target: &str, item: &str) -> bool {
		self.model
			.rules
			.iter()
			.any(|entry| entry.item == item && entry.rule.target == target)
	}

	/// Rules placing `item`, in declaration order.
	pub fn item_rules<'a>(&'a self, item: &'a str) -> impl Iterator<Item = &'a InsertionRule> + 'a {
		self.model
			.rules
			.iter()
			.filter(move |entry| entry.item == item)
			.map(|entry| &entry.rule)
	}

	/// `(item, rule)` pairs under `target`, in declaration order.
	pub fn target_rules<'a>(&'a self, target: &'a str) -> impl Iterator<Item = (&'a str, &'a InsertionRule)> + 'a {
		self.model
			.rules
			.iter()
			.filter(move |entry| entry.rule.target == target)
			.map(|entry| (entry.item.as_str(), &entry.rule))
	}

	/// Persisted user layout applied on top of the declared rules.
	pub fn state_override(&self) -> Option<&DomainState> {
		self.state_override.as_ref()
	}

	/// Replaces the user layout. Only the cached layer is invalidated.
	pub fn set_state_override(&mut self, state: Option<DomainState>) {
		if self.state_override == state {
			return;
		}
		self.state_override = state;
		self.cache.get_mut().cached = None;
		self.events.emit(&DomainEvent::StateChanged { structural: false });
	}

	/// Layout derived from items and rules alone.
	pub fn state(&self) -> Arc<DomainState> {
		let mut cache = self.cache.lock();
		self.base_layer(&mut cache).state
	}

	/// Diagnostics of the last base resolution.
	pub fn diagnostics(&self) -> Arc<[Diagnostic]> {
		let mut cache = self.cache.lock();
		self.base_layer(&mut cache).diagnostics
	}

	/// Layout with the user override applied. Equal to [`state`] when no
	/// override is set.
	///
	/// [`state`]: ActionDomain::state
	pub fn cached_state(&self) -> Arc<DomainState> {
		let mut cache = self.cache.lock();
		self.cached_layer(&mut cache).state
	}

	pub fn cached_diagnostics(&self) -> Arc<[Diagnostic]> {
		let mut cache = self.cache.lock();
		self.cached_layer(&mut cache).diagnostics
	}

	pub fn is_state_dirty(&self) -> bool {
		self.cache.lock().base.is_none()
	}

	pub fn is_cached_state_dirty(&self) -> bool {
		self.cache.lock().cached.is_none()
	}

	pub fn subscribe<F>(&mut self, callback: F) -> SubscriptionId
	where
		F: Fn(&DomainEvent) + Send + Sync + 'static,
	{
		self.events.subscribe(callback)
	}

	pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
		self.events.unsubscribe(id)
	}

	fn base_layer(&self, cache: &mut StateCache) -> Layer {
		if let Some(layer) = &cache.base {
			return layer.clone();
		}
		debug!(domain = %self.id, "resolving domain state");
		let layer = self.resolve_layer(None);
		cache.base = Some(layer.clone());
		layer
	}

	fn cached_layer(&self, cache: &mut StateCache) -> Layer {
		if let Some(layer) = &cache.cached {
			return layer.clone();
		}
		let layer = match &self.state_override {
			Some(overrides) if !overrides.is_empty() => {
				debug!(domain = %self.id, "resolving domain state with user layout");
				self.resolve_layer(Some(overrides))
			}
			_ => self.base_layer(cache),
		};
		cache.cached = Some(layer.clone());
		layer
	}

	fn resolve_layer(&self, overrides: Option<&DomainState>) -> Layer {
		let resolution = resolver::resolve(&self.model, overrides);
		for diagnostic in &resolution.diagnostics {
			warn!(domain = %self.id, %diagnostic, "domain layout problem");
		}
		Layer {
			state: Arc::new(resolution.state),
			diagnostics: resolution.diagnostics.into(),
		}
	}

	fn invalidate(&mut self) {
		let cache = self.cache.get_mut();
		cache.base = None;
		cache.cached = None;
		self.events.emit(&DomainEvent::StateChanged { structural: true });
	}
}
