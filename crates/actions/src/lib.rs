//! Declarative actions, menus and toolbars.
//!
//! An [`ActionSystem`] holds the [`ActionRegistry`] of UI-independent
//! [`ActionSpec`]s and a set of [`ActionDomain`]s. Each domain owns items and
//! insertion rules; resolving them yields a [`DomainState`], the ordered
//! children of every slot, group and menu. [`ActionDomain::build`] binds that
//! state onto toolkit containers supplied by the embedder.
//!
//! Manifests populate both sides at once, see [`ActionSystem::load_manifest`].
//! User customization (layouts, shortcut and icon overrides) round-trips
//! through a [`SettingsStore`].

mod domain;
mod error;
mod loader;
mod notify;
mod registry;
mod settings;
mod spec;
mod system;

pub use domain::{
	ActionDomain, ActionItem, ActionItemKind, Diagnostic, DomainEvent, DomainItem, DomainState, InsertMode,
	InsertionRule, ItemKind, UiContainer,
};
pub use error::{ActionError, EntityKind};
pub use loader::{LoadOptions, LoadReport, ROOT_TAG};
pub use notify::{Notifier, SubscriptionId};
pub use registry::ActionRegistry;
pub use settings::{MemorySettings, SETTINGS_KEY, SettingsStore};
pub use spec::{ActionSpec, IconRef, SpecEvent};
pub use system::ActionSystem;
