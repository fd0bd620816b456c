//! `;`-delimited shortcut lists, as used by manifest `shortcuts` attributes.
//!
//! A doubled `;;` stands for a literal `;` so that the semicolon key itself can
//! be bound (`Ctrl+;;` is the single sequence `Ctrl+;`).

use crate::{KeySequence, ParseError, parse};

const LIST_SEP: char = ';';

/// Splits a list into its raw, trimmed, non-empty segments.
pub fn split_list(s: &str) -> Vec<String> {
	let mut segments = Vec::new();
	let mut current = String::new();
	let mut chars = s.chars().peekable();

	while let Some(ch) = chars.next() {
		if ch != LIST_SEP {
			current.push(ch);
			continue;
		}
		if chars.peek() == Some(&LIST_SEP) {
			chars.next();
			current.push(LIST_SEP);
			continue;
		}
		push_segment(&mut segments, &mut current);
	}
	push_segment(&mut segments, &mut current);

	segments
}

fn push_segment(segments: &mut Vec<String>, current: &mut String) {
	let trimmed = current.trim();
	if !trimmed.is_empty() {
		segments.push(trimmed.to_string());
	}
	current.clear();
}

/// Parses every segment of a list.
///
/// # Errors
///
/// Fails on the first segment that is not a valid key sequence.
pub fn parse_list(s: &str) -> Result<Vec<KeySequence>, ParseError> {
	split_list(s).iter().map(|segment| parse(segment)).collect()
}

/// Formats sequences back into list syntax, escaping literal semicolons.
pub fn format_list(sequences: &[KeySequence]) -> String {
	sequences
		.iter()
		.map(|seq| seq.to_string().replace(LIST_SEP, ";;"))
		.collect::<Vec<_>>()
		.join(";")
}
