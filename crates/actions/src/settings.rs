//! Persisted user customization.
//!
//! Everything lives under one [`SETTINGS_KEY`] entry of an external
//! key/value store:
//!
//! ```json
//! {
//!   "State":     { "main": { "file": ["core.open", "core.save"] } },
//!   "Shortcuts": { "core.save": ["Ctrl+S", "Ctrl+Alt+S"] },
//!   "Icons":     { "core.save": "svg(save)" }
//! }
//! ```
//!
//! Decoding is lenient: malformed entries are skipped with a warning and the
//! rest of the document still applies.

use indexmap::IndexMap;
use serde_json::{Map, Value};
use tracing::warn;

use appcore_keyseq::{KeySequence, split_list};

use crate::domain::DomainState;
use crate::spec::IconRef;

/// Store key holding the whole action system customization.
pub const SETTINGS_KEY: &str = "ActionSystem";

const STATE: &str = "State";
const SHORTCUTS: &str = "Shortcuts";
const ICONS: &str = "Icons";

/// Key/value settings backend supplied by the embedder.
pub trait SettingsStore {
	fn get(&self, key: &str) -> Option<Value>;
	fn set(&mut self, key: &str, value: Value);
}

/// In-process [`SettingsStore`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemorySettings {
	values: IndexMap<String, Value>,
}

impl MemorySettings {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with(mut self, key: impl Into<String>, value: Value) -> Self {
		self.values.insert(key.into(), value);
		self
	}

	pub fn values(&self) -> &IndexMap<String, Value> {
		&self.values
	}
}

impl SettingsStore for MemorySettings {
	fn get(&self, key: &str) -> Option<Value> {
		self.values.get(key).cloned()
	}

	fn set(&mut self, key: &str, value: Value) {
		self.values.insert(key.to_string(), value);
	}
}

/// Decoded [`SETTINGS_KEY`] document.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct Customization {
	pub state: IndexMap<String, DomainState>,
	pub shortcuts: IndexMap<String, Vec<KeySequence>>,
	pub icons: IndexMap<String, IconRef>,
}

impl Customization {
	pub(crate) fn decode(value: &Value) -> Self {
		let mut out = Self::default();
		let Some(root) = value.as_object() else {
			warn!(key = SETTINGS_KEY, "settings entry is not an object, ignored");
			return out;
		};

		for (domain, layout) in section(root, STATE) {
			match serde_json::from_value::<DomainState>(layout.clone()) {
				Ok(state) => {
					out.state.insert(domain.clone(), state);
				}
				Err(error) => warn!(domain = %domain, %error, "malformed persisted layout skipped"),
			}
		}

		for (action, keys) in section(root, SHORTCUTS) {
			match decode_shortcuts(action, keys) {
				Some(keys) => {
					out.shortcuts.insert(action.clone(), keys);
				}
				None => warn!(action = %action, "malformed shortcut override skipped"),
			}
		}

		for (action, icon) in section(root, ICONS) {
			match icon.as_str() {
				Some(icon) => {
					out.icons.insert(action.clone(), IconRef::parse(icon));
				}
				None => warn!(action = %action, "malformed icon override skipped"),
			}
		}

		out
	}

	pub(crate) fn encode(&self) -> Value {
		let state: Map<String, Value> = self
			.state
			.iter()
			.map(|(domain, layout)| {
				let layout: Map<String, Value> = layout
					.iter()
					.map(|(parent, children)| (parent.clone(), Value::from(children.clone())))
					.collect();
				(domain.clone(), Value::Object(layout))
			})
			.collect();
		let shortcuts: Map<String, Value> = self
			.shortcuts
			.iter()
			.map(|(action, keys)| {
				let keys: Vec<Value> = keys.iter().map(|k| Value::String(k.to_string())).collect();
				(action.clone(), Value::Array(keys))
			})
			.collect();
		let icons: Map<String, Value> = self
			.icons
			.iter()
			.map(|(action, icon)| (action.clone(), Value::String(icon.to_string())))
			.collect();

		let mut root = Map::new();
		root.insert(STATE.to_string(), Value::Object(state));
		root.insert(SHORTCUTS.to_string(), Value::Object(shortcuts));
		root.insert(ICONS.to_string(), Value::Object(icons));
		Value::Object(root)
	}
}

fn section<'a>(root: &'a Map<String, Value>, name: &str) -> impl Iterator<Item = (&'a String, &'a Value)> {
	let entries = match root.get(name) {
		None => None,
		Some(Value::Object(entries)) => Some(entries),
		Some(_) => {
			warn!(section = name, "settings section is not an object, ignored");
			None
		}
	};
	entries.into_iter().flatten()
}

/// Accepts either a list of strings or a single `;`-delimited string.
/// Unparsable sequences are dropped individually.
fn decode_shortcuts(action: &str, value: &Value) -> Option<Vec<KeySequence>> {
	let texts: Vec<String> = match value {
		Value::String(list) => split_list(list),
		Value::Array(items) => items.iter().map(|item| item.as_str().map(str::to_string)).collect::<Option<_>>()?,
		_ => return None,
	};
	Some(
		texts
			.iter()
			.filter_map(|text| match KeySequence::parse(text) {
				Ok(seq) => Some(seq),
				Err(error) => {
					warn!(action, shortcut = %text, %error, "invalid persisted shortcut ignored");
					None
				}
			})
			.collect(),
	)
}
