//! # Parser
//!
//! Recursive descent parser for the portable key sequence syntax.
//!
//! ## Supported Syntax
//!
//! ```text
//! sequence  = chord ("," chord)*
//! chord     = (modifier "+")* key
//! modifier  = "ctrl" | "control" | "alt" | "option" | "shift" | "meta" | "cmd" | "win" | "super"
//! key       = fn-key | named-key | char
//! fn-key    = "f" digit digit?
//! named-key = "esc" | "del" | "pgup" | "space" | ...
//! char      = any non-whitespace character
//! ```
//!
//! Names are case-insensitive. Whitespace around `,` is ignored.

use std::str::FromStr;

use crate::{Key, KeyChord, KeySequence, MAX_CHORDS, Modifiers};


/// Separator between modifiers and the key of one chord.
const MOD_SEP: char = '+';
/// Separator between chords.
const CHORD_SEP: char = ',';

/// Function pointer type for parser combinators.
type ParserFn<T> = fn(&mut Parser) -> Result<Option<T>, ParseError>;

/// Represents an error that occurred during parsing.
#[derive(Debug, PartialEq, Eq, Clone, thiserror::Error)]
#[error("parse error at position {position}: {message}")]
pub struct ParseError {
	/// Human-readable description of the parse error.
	pub message: String,
	/// Byte offset in the input where the error occurred.
	pub position: usize,
}

/// Maintains the parser's state for recursive descent parsing.
struct Parser<'a> {
	/// The remaining input.
	input: &'a str,
	/// Current byte position in the original input.
	position: usize,
}

impl<'a> Parser<'a> {
	fn new(input: &'a str) -> Self {
		Self { input, position: 0 }
	}

	fn peek(&self) -> Option<char> {
		self.input.chars().next()
	}

	fn peek_at(&self, n: usize) -> Option<char> {
		self.input.chars().nth(n)
	}

	/// Consumes and returns the next character.
	fn next(&mut self) -> Option<char> {
		let ch = self.peek()?;
		self.position += ch.len_utf8();
		self.input = &self.input[ch.len_utf8()..];
		Some(ch)
	}

	fn is_end(&self) -> bool {
		self.input.is_empty()
	}

	/// Consumes the next character if it matches the expected one.
	fn take(&mut self, expected: char) -> Result<(), ParseError> {
		match self.next() {
			Some(ch) if ch == expected => Ok(()),
			Some(ch) => Err(ParseError {
				message: format!("expected '{expected}', found '{ch}'"),
				position: self.position - ch.len_utf8(),
			}),
			None => Err(ParseError {
				message: format!("expected '{expected}', found end of input"),
				position: self.position,
			}),
		}
	}

	/// Runs `f`, restoring the parser state unless it yields a value.
	fn try_parse<T, F>(&mut self, f: F) -> Result<Option<T>, ParseError>
	where
		F: FnOnce(&mut Parser<'a>) -> Result<Option<T>, ParseError>,
	{
		let snapshot = (self.input, self.position);
		match f(self) {
			Ok(Some(val)) => Ok(Some(val)),
			Ok(None) | Err(_) => {
				self.input = snapshot.0;
				self.position = snapshot.1;
				Ok(None)
			}
		}
	}

	fn take_while<F>(&mut self, predicate: F) -> &'a str
	where
		F: Fn(char) -> bool,
	{
		let len = self
			.input
			.char_indices()
			.find(|&(_, ch)| !predicate(ch))
			.map_or(self.input.len(), |(idx, _)| idx);
		let (taken, rest) = self.input.split_at(len);
		self.input = rest;
		self.position += len;
		taken
	}

	fn skip_whitespace(&mut self) {
		self.take_while(char::is_whitespace);
	}

	/// Tries parsers in order, returning the first successful result.
	fn alt<T>(&mut self, parsers: &[ParserFn<T>]) -> Result<Option<T>, ParseError> {
		for p in parsers {
			if let Some(value) = p(self)? {
				return Ok(Some(value));
			}
		}
		Ok(None)
	}

	fn error(&self, message: String) -> ParseError {
		ParseError {
			message,
			position: self.position,
		}
	}
}

/// Parses a key sequence such as `"Ctrl+S"` or `"Ctrl+K, Ctrl+C"`.
///
/// # Errors
///
/// Returns a [`ParseError`] if the input does not match the grammar, is empty,
/// or holds more than [`MAX_CHORDS`] chords.
pub fn parse(s: &str) -> Result<KeySequence, ParseError> {
	let mut parser = Parser::new(s);
	parser.skip_whitespace();

	let mut chords = Vec::new();
	loop {
		chords.push(parse_chord(&mut parser)?);
		parser.skip_whitespace();
		if parser.is_end() {
			break;
		}
		if chords.len() == MAX_CHORDS {
			return Err(parser.error(format!("too many chords (at most {MAX_CHORDS})")));
		}
		parser.take(CHORD_SEP)?;
		parser.skip_whitespace();
	}

	Ok(KeySequence { chords })
}

/// Grammar: `chord = (modifier "+")* key`
fn parse_chord(parser: &mut Parser) -> Result<KeyChord, ParseError> {
	let mut modifiers = Modifiers::empty();
	while let Some(modifier) = try_parse_modifier(parser)? {
		modifiers |= modifier;
	}

	let key = parse_key(parser)?;
	Ok(KeyChord::new(modifiers, key))
}

/// Attempts to parse a single modifier followed by `+`.
fn try_parse_modifier(parser: &mut Parser) -> Result<Option<Modifiers>, ParseError> {
	parser.try_parse(|p| {
		let name = p.take_while(|ch| ch.is_ascii_alphabetic());
		let Ok(modifier) = name.parse::<Modifiers>() else {
			return Ok(None);
		};

		p.take(MOD_SEP)?;

		Ok(Some(modifier))
	})
}

fn parse_key(parser: &mut Parser) -> Result<Key, ParseError> {
	match parser.alt(&[try_parse_fn_key, try_parse_named_key, try_parse_char])? {
		Some(key) => Ok(key),
		None => Err(parser.error("expected a valid key".to_string())),
	}
}

/// Attempts to parse a function key (`F1` to `F35`).
///
/// Only activates on `f` followed by a digit; after that the number must be
/// in range or an error is returned.
fn try_parse_fn_key(parser: &mut Parser) -> Result<Option<Key>, ParseError> {
	if !matches!(parser.peek(), Some('f' | 'F')) {
		return Ok(None);
	}
	if !matches!(parser.peek_at(1), Some(ch) if ch.is_ascii_digit()) {
		return Ok(None);
	}

	parser.next();
	let num = parser.take_while(|ch| ch.is_ascii_digit());

	match num.parse::<u8>() {
		Ok(n) if (1..=35).contains(&n) => Ok(Some(Key::F(n))),
		_ => Err(parser.error("invalid function key number (must be 1-35)".to_string())),
	}
}

/// Attempts to parse a named key such as `Del`, `PgUp` or `Space`.
fn try_parse_named_key(parser: &mut Parser) -> Result<Option<Key>, ParseError> {
	parser.try_parse(|p| {
		let name = p.take_while(|ch| ch.is_ascii_alphabetic());
		if name.len() < 2 {
			return Ok(None);
		}
		Ok(Key::from_str(name).ok())
	})
}

/// Attempts to parse a single printable character.
fn try_parse_char(parser: &mut Parser) -> Result<Option<Key>, ParseError> {
	match parser.peek() {
		Some(ch) if !ch.is_whitespace() => {
			parser.next();
			Ok(Some(Key::char(ch)))
		}
		_ => Ok(None),
	}
}
