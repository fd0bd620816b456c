//! UI-independent action descriptions.

use std::fmt;

use appcore_keyseq::KeySequence;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::notify::{Notifier, SubscriptionId};

/// Reference to an icon resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IconRef {
	/// Plain file or resource path.
	File(String),
	/// Named vector icon, written `svg(name)` in manifests.
	Vector(String),
}

impl IconRef {
	/// Parses a manifest icon value. `svg(name)` becomes [`IconRef::Vector`],
	/// anything else is taken as a path.
	pub fn parse(s: &str) -> Self {
		let s = s.trim();
		match s.strip_prefix("svg(").and_then(|rest| rest.strip_suffix(')')) {
			Some(name) => IconRef::Vector(name.trim().to_string()),
			None => IconRef::File(s.to_string()),
		}
	}

	/// Whether the reference names nothing.
	pub fn is_empty(&self) -> bool {
		match self {
			IconRef::File(name) | IconRef::Vector(name) => name.is_empty(),
		}
	}

	/// Source string handed to the toolkit icon loader. Vector icons use the
	/// `"<name>, .svgx"` convention.
	pub fn source(&self) -> String {
		match self {
			IconRef::File(path) => path.clone(),
			IconRef::Vector(name) => format!("{name}, .svgx"),
		}
	}
}

impl fmt::Display for IconRef {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			IconRef::File(path) => f.write_str(path),
			IconRef::Vector(name) => write!(f, "svg({name})"),
		}
	}
}

impl Serialize for IconRef {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		serializer.collect_str(self)
	}
}

impl<'de> Deserialize<'de> for IconRef {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		let text = String::deserialize(deserializer)?;
		Ok(IconRef::parse(&text))
	}
}

/// Change notification emitted by an [`ActionSpec`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpecEvent {
	ShortcutsChanged { id: String },
	IconChanged { id: String },
}

/// Declarative description of an action: command binding, shortcuts, icon.
///
/// Declared values live here. User overrides are kept by the
/// [`ActionRegistry`](crate::ActionRegistry) and take precedence when set.
#[derive(Debug)]
pub struct ActionSpec {
	id: String,
	command_name: String,
	command_display_name: String,
	shortcuts: Vec<KeySequence>,
	icon: Option<IconRef>,
	events: Notifier<SpecEvent>,
}

impl ActionSpec {
	pub fn new(id: impl Into<String>) -> Self {
		Self {
			id: id.into(),
			command_name: String::new(),
			command_display_name: String::new(),
			shortcuts: Vec::new(),
			icon: None,
			events: Notifier::new(),
		}
	}

	pub fn with_command_name(mut self, name: impl Into<String>) -> Self {
		self.command_name = name.into();
		self
	}

	pub fn with_shortcuts(mut self, shortcuts: Vec<KeySequence>) -> Self {
		self.shortcuts = shortcuts;
		self
	}

	pub fn with_icon(mut self, icon: IconRef) -> Self {
		self.icon = Some(icon);
		self
	}

	pub fn id(&self) -> &str {
		&self.id
	}

	pub fn command_name(&self) -> &str {
		&self.command_name
	}

	pub fn set_command_name(&mut self, name: impl Into<String>) {
		self.command_name = name.into();
	}

	/// Human-readable command name. Falls back to the command name when unset.
	pub fn command_display_name(&self) -> &str {
		if self.command_display_name.is_empty() {
			&self.command_name
		} else {
			&self.command_display_name
		}
	}

	pub fn set_command_display_name(&mut self, name: impl Into<String>) {
		self.command_display_name = name.into();
	}

	/// Declared shortcuts, ignoring overrides.
	pub fn shortcuts(&self) -> &[KeySequence] {
		&self.shortcuts
	}

	pub fn set_shortcuts(&mut self, shortcuts: Vec<KeySequence>) {
		self.shortcuts = shortcuts;
		self.notify(&SpecEvent::ShortcutsChanged { id: self.id.clone() });
	}

	/// Declared icon, ignoring overrides.
	pub fn icon(&self) -> Option<&IconRef> {
		self.icon.as_ref()
	}

	pub fn set_icon(&mut self, icon: Option<IconRef>) {
		self.icon = icon;
		self.notify(&SpecEvent::IconChanged { id: self.id.clone() });
	}

	pub fn subscribe<F>(&mut self, callback: F) -> SubscriptionId
	where
		F: Fn(&SpecEvent) + Send + Sync + 'static,
	{
		self.events.subscribe(callback)
	}

	pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
		self.events.unsubscribe(id)
	}

	pub(crate) fn notify(&self, event: &SpecEvent) {
		self.events.emit(event);
	}
}
