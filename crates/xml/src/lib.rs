//! Generic element trees for action manifests.
//!
//! [`parse`] turns well-formed markup into an [`Element`] tree without
//! interpreting any tag or attribute; [`serialize`] writes a tree back out.
//! Re-parsing serialized output yields the same names, properties, values and
//! child order.
//!
//! Trees also have a JSON object form mirroring their fields:
//!
//! ```text
//! { "name": "document", "properties": { "key": "val" }, "value": "", "children": [] }
//! ```

use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

mod read;
mod write;


pub use read::parse;
pub use write::serialize;

/// Malformed markup, invalid encoding, or an unrepresentable tree.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("malformed markup at byte {position}: {message}")]
pub struct FormatError {
	pub message: String,
	/// Byte offset in the input, `0` when not applicable.
	pub position: u64,
}

impl FormatError {
	pub(crate) fn new(message: impl Into<String>, position: u64) -> Self {
		Self {
			message: message.into(),
			position,
		}
	}
}

/// Errors from the file helpers.
#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),
	#[error(transparent)]
	Format(#[from] FormatError),
}

/// One node of a markup tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Element {
	/// Tag name.
	pub name: String,
	/// Attributes in document order.
	#[serde(default)]
	pub properties: IndexMap<String, String>,
	/// Trimmed text content. Only kept for elements without children.
	#[serde(default)]
	pub value: String,
	#[serde(default)]
	pub children: Vec<Element>,
}

impl Element {
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			..Self::default()
		}
	}

	/// Builder-style attribute setter.
	pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.properties.insert(key.into(), value.into());
		self
	}

	pub fn with_value(mut self, value: impl Into<String>) -> Self {
		self.value = value.into();
		self
	}

	pub fn with_child(mut self, child: Element) -> Self {
		self.children.push(child);
		self
	}

	pub fn property(&self, key: &str) -> Option<&str> {
		self.properties.get(key).map(String::as_str)
	}

	/// First child with the given tag name.
	pub fn child(&self, name: &str) -> Option<&Element> {
		self.children.iter().find(|c| c.name == name)
	}

	pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
		self.children.iter().filter(move |c| c.name == name)
	}

	pub fn is_leaf(&self) -> bool {
		self.children.is_empty()
	}

	/// Converts the tree into its JSON object form.
	pub fn to_json(&self) -> serde_json::Value {
		serde_json::to_value(self).unwrap_or_default()
	}

	/// Builds a tree from its JSON object form. Missing `properties`,
	/// `value` and `children` default to empty.
	///
	/// # Errors
	///
	/// Returns a [`FormatError`] if the value is not an object of that shape.
	pub fn from_json(value: serde_json::Value) -> Result<Self, FormatError> {
		serde_json::from_value(value).map_err(|e| FormatError::new(e.to_string(), 0))
	}
}

/// Reads and parses a markup file.
pub fn load(path: impl AsRef<Path>) -> Result<Element, Error> {
	let bytes = fs::read(path)?;
	Ok(parse(&bytes)?)
}

/// Serializes a tree and writes it to `path`.
pub fn save(path: impl AsRef<Path>, root: &Element) -> Result<(), Error> {
	let bytes = serialize(root)?;
	fs::write(path, bytes)?;
	Ok(())
}
