use std::fmt;

/// Kind of entity an [`ActionError`] refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
	Action,
	Domain,
	Item,
	TopLevel,
}

impl fmt::Display for EntityKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			EntityKind::Action => "action",
			EntityKind::Domain => "domain",
			EntityKind::Item => "item",
			EntityKind::TopLevel => "top-level slot",
		})
	}
}

/// Errors returned by registry, domain and manifest operations.
///
/// Only [`ActionError::Format`], [`ActionError::InvalidRoot`] and
/// [`ActionError::Io`] abort a manifest load. The others reject a single
/// operation and leave existing state untouched.
#[derive(Debug, thiserror::Error)]
pub enum ActionError {
	/// The manifest is not well-formed markup.
	#[error("malformed manifest: {0}")]
	Format(#[from] appcore_xml::FormatError),

	/// The id is already registered; the existing entry is kept.
	#[error("duplicate {kind} id: {id}")]
	DuplicateId { kind: EntityKind, id: String },

	#[error("{kind} not found: {id}")]
	NotFound { kind: EntityKind, id: String },

	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),

	/// The manifest root element is not `actionSystem`.
	#[error("invalid manifest root <{found}>, expected <actionSystem>")]
	InvalidRoot { found: String },
}

impl ActionError {
	pub(crate) fn duplicate(kind: EntityKind, id: impl Into<String>) -> Self {
		Self::DuplicateId { kind, id: id.into() }
	}

	pub(crate) fn not_found(kind: EntityKind, id: impl Into<String>) -> Self {
		Self::NotFound { kind, id: id.into() }
	}
}
