//! `${NAME}` substitution in manifest attribute values.

use std::sync::LazyLock;

use indexmap::IndexMap;
use regex::{Captures, Regex};

static VARIABLE: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"\$\{([^${}]+)\}").expect("variable pattern is valid"));

/// Substitution rounds before giving up on self-referencing values.
const MAX_DEPTH: usize = 8;

/// Replaces every `${NAME}` with its value, repeatedly, so values may refer
/// to other variables. Unknown names expand to the bare name.
pub(crate) fn expand(input: &str, variables: &IndexMap<String, String>) -> String {
	let mut current = input.to_string();
	for _ in 0..MAX_DEPTH {
		if !VARIABLE.is_match(&current) {
			break;
		}
		let next = VARIABLE
			.replace_all(&current, |caps: &Captures<'_>| {
				let name = &caps[1];
				variables.get(name).cloned().unwrap_or_else(|| name.to_string())
			})
			.into_owned();
		if next == current {
			break;
		}
		current = next;
	}
	current
}
