//! Keyboard shortcut sequences.
//!
//! A [`KeySequence`] is one to four [`KeyChord`]s, each a [`Key`] with a set of
//! [`Modifiers`]. Sequences use the portable text form found in action
//! manifests and persisted settings:
//!
//! ```text
//! Ctrl+S
//! Ctrl+Shift+N
//! Ctrl+K, Ctrl+C
//! Ctrl++
//! ```
//!
//! Parsing is case-insensitive and normalizing, so `shift+ctrl+n` and
//! `Ctrl+Shift+N` compare and hash equal. [`parse_list`] handles the
//! `;`-delimited lists used by manifest `shortcuts` attributes.

use std::fmt;
use std::str::FromStr;

use bitflags::bitflags;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

mod list;
mod parser;

pub use list::{format_list, parse_list, split_list};
pub use parser::{ParseError, parse};

/// Maximum number of chords in a single sequence.
pub const MAX_CHORDS: usize = 4;

bitflags! {
	/// Modifier keys held during a chord.
	#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
	pub struct Modifiers: u8 {
		const CTRL = 1;
		const ALT = 1 << 1;
		const SHIFT = 1 << 2;
		const META = 1 << 3;
	}
}

impl Modifiers {
	/// Display names in canonical order.
	const NAMES: [(Modifiers, &'static str); 4] = [
		(Modifiers::CTRL, "Ctrl"),
		(Modifiers::ALT, "Alt"),
		(Modifiers::SHIFT, "Shift"),
		(Modifiers::META, "Meta"),
	];
}

impl FromStr for Modifiers {
	type Err = ();

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_ascii_lowercase().as_str() {
			"ctrl" | "control" => Ok(Modifiers::CTRL),
			"alt" | "option" => Ok(Modifiers::ALT),
			"shift" => Ok(Modifiers::SHIFT),
			"meta" | "cmd" | "win" | "super" => Ok(Modifiers::META),
			_ => Err(()),
		}
	}
}

/// A single key, without modifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Key {
	/// A printable character. ASCII letters are stored uppercase.
	Char(char),
	/// Function key `F1` to `F35`.
	F(u8),
	Escape,
	Tab,
	Backspace,
	Return,
	Insert,
	Delete,
	Home,
	End,
	PageUp,
	PageDown,
	Left,
	Up,
	Right,
	Down,
	Space,
	Print,
	Pause,
	Menu,
}

impl Key {
	/// Builds a character key, normalizing ASCII letters to uppercase.
	pub fn char(ch: char) -> Self {
		Key::Char(ch.to_ascii_uppercase())
	}

	fn name(&self) -> Option<&'static str> {
		Some(match self {
			Key::Escape => "Esc",
			Key::Tab => "Tab",
			Key::Backspace => "Backspace",
			Key::Return => "Return",
			Key::Insert => "Ins",
			Key::Delete => "Del",
			Key::Home => "Home",
			Key::End => "End",
			Key::PageUp => "PgUp",
			Key::PageDown => "PgDown",
			Key::Left => "Left",
			Key::Up => "Up",
			Key::Right => "Right",
			Key::Down => "Down",
			Key::Space => "Space",
			Key::Print => "Print",
			Key::Pause => "Pause",
			Key::Menu => "Menu",
			Key::Char(_) | Key::F(_) => return None,
		})
	}
}

impl FromStr for Key {
	type Err = ();

	/// Parses a named key. Single characters and function keys are handled by
	/// the sequence parser.
	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Ok(match s.to_ascii_lowercase().as_str() {
			"esc" | "escape" => Key::Escape,
			"tab" => Key::Tab,
			"backspace" => Key::Backspace,
			"return" | "enter" => Key::Return,
			"ins" | "insert" => Key::Insert,
			"del" | "delete" => Key::Delete,
			"home" => Key::Home,
			"end" => Key::End,
			"pgup" | "pageup" => Key::PageUp,
			"pgdown" | "pagedown" => Key::PageDown,
			"left" => Key::Left,
			"up" => Key::Up,
			"right" => Key::Right,
			"down" => Key::Down,
			"space" => Key::Space,
			"print" => Key::Print,
			"pause" => Key::Pause,
			"menu" => Key::Menu,
			_ => return Err(()),
		})
	}
}

impl fmt::Display for Key {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Key::Char(ch) => write!(f, "{ch}"),
			Key::F(n) => write!(f, "F{n}"),
			other => f.write_str(other.name().unwrap_or_default()),
		}
	}
}

/// A key pressed together with a set of modifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct KeyChord {
	pub modifiers: Modifiers,
	pub key: Key,
}

impl KeyChord {
	pub fn new(modifiers: Modifiers, key: Key) -> Self {
		Self { modifiers, key }
	}

	/// A chord without modifiers.
	pub fn plain(key: Key) -> Self {
		Self::new(Modifiers::empty(), key)
	}
}

impl fmt::Display for KeyChord {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		for (flag, name) in Modifiers::NAMES {
			if self.modifiers.contains(flag) {
				write!(f, "{name}+")?;
			}
		}
		write!(f, "{}", self.key)
	}
}

/// A shortcut made of one to [`MAX_CHORDS`] chords pressed in order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct KeySequence {
	chords: Vec<KeyChord>,
}

impl KeySequence {
	/// Builds a single-chord sequence.
	pub fn single(chord: KeyChord) -> Self {
		Self { chords: vec![chord] }
	}

	/// Builds a sequence from chords. Returns `None` for an empty list or more
	/// than [`MAX_CHORDS`] chords.
	pub fn from_chords(chords: Vec<KeyChord>) -> Option<Self> {
		if chords.is_empty() || chords.len() > MAX_CHORDS {
			return None;
		}
		Some(Self { chords })
	}

	/// Parses the portable text form.
	pub fn parse(s: &str) -> Result<Self, ParseError> {
		parse(s)
	}

	pub fn chords(&self) -> &[KeyChord] {
		&self.chords
	}

	pub fn len(&self) -> usize {
		self.chords.len()
	}

	/// Always `false`; a sequence holds at least one chord.
	pub fn is_empty(&self) -> bool {
		self.chords.is_empty()
	}
}

impl fmt::Display for KeySequence {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		for (i, chord) in self.chords.iter().enumerate() {
			if i > 0 {
				f.write_str(", ")?;
			}
			write!(f, "{chord}")?;
		}
		Ok(())
	}
}

impl FromStr for KeySequence {
	type Err = ParseError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		parse(s)
	}
}

impl Serialize for KeySequence {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		serializer.collect_str(self)
	}
}

impl<'de> Deserialize<'de> for KeySequence {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		let text = String::deserialize(deserializer)?;
		parse(&text).map_err(serde::de::Error::custom)
	}
}
