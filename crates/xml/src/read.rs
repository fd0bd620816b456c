use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::{Element, FormatError};

/// Parses a UTF-8 markup document into its root element.
///
/// Whitespace-only text is ignored and text is trimmed. Text of elements
/// that have children is discarded. Comments, processing instructions and
/// the declaration are skipped.
///
/// # Errors
///
/// Returns a [`FormatError`] for invalid UTF-8, mismatched or unclosed tags,
/// duplicate attributes, bad escapes, or anything other than exactly one
/// root element.
pub fn parse(bytes: &[u8]) -> Result<Element, FormatError> {
	let text = std::str::from_utf8(bytes)
		.map_err(|e| FormatError::new(format!("invalid UTF-8: {e}"), e.valid_up_to() as u64))?;

	let mut reader = Reader::from_str(text);
	reader.config_mut().trim_text(true);

	let mut stack: Vec<Element> = Vec::new();
	let mut root: Option<Element> = None;
	let mut buf = Vec::new();

	loop {
		let position = reader.buffer_position() as u64;
		let event = reader.read_event_into(&mut buf);

		match event.map_err(|e| FormatError::new(e.to_string(), position))? {
			Event::Start(ref e) => {
				ensure_single_root(&root, &stack, position)?;
				stack.push(start_element(e, position)?);
			}
			Event::Empty(ref e) => {
				ensure_single_root(&root, &stack, position)?;
				let element = start_element(e, position)?;
				attach(&mut stack, &mut root, element);
			}
			Event::End(_) => {
				let Some(mut element) = stack.pop() else {
					return Err(FormatError::new("unexpected closing tag", position));
				};
				if !element.children.is_empty() {
					element.value.clear();
				}
				attach(&mut stack, &mut root, element);
			}
			Event::Text(ref t) => {
				let content = t.unescape().map_err(|e| FormatError::new(e.to_string(), position))?;
				push_text(&mut stack, &content, position)?;
			}
			Event::CData(t) => {
				let raw = t.into_inner();
				let content = std::str::from_utf8(&raw).map_err(|e| FormatError::new(e.to_string(), position))?;
				push_text(&mut stack, content.trim(), position)?;
			}
			Event::Eof => break,
			_ => {}
		}
		buf.clear();
	}

	if let Some(open) = stack.last() {
		return Err(FormatError::new(
			format!("unclosed element <{}>", open.name),
			reader.buffer_position() as u64,
		));
	}
	root.ok_or_else(|| FormatError::new("document has no root element", 0))
}

fn ensure_single_root(root: &Option<Element>, stack: &[Element], position: u64) -> Result<(), FormatError> {
	if root.is_some() && stack.is_empty() {
		return Err(FormatError::new("multiple root elements", position));
	}
	Ok(())
}

fn start_element(e: &BytesStart<'_>, position: u64) -> Result<Element, FormatError> {
	let name = std::str::from_utf8(e.name().as_ref())
		.map_err(|err| FormatError::new(err.to_string(), position))?
		.to_string();

	let mut element = Element::new(name);
	for attr in e.attributes() {
		let attr = attr.map_err(|err| FormatError::new(err.to_string(), position))?;
		let key = std::str::from_utf8(attr.key.as_ref())
			.map_err(|err| FormatError::new(err.to_string(), position))?
			.to_string();
		let value = attr
			.unescape_value()
			.map_err(|err| FormatError::new(err.to_string(), position))?
			.into_owned();
		element.properties.insert(key, value);
	}
	Ok(element)
}

fn attach(stack: &mut [Element], root: &mut Option<Element>, element: Element) {
	match stack.last_mut() {
		Some(parent) => parent.children.push(element),
		None => *root = Some(element),
	}
}

fn push_text(stack: &mut [Element], content: &str, position: u64) -> Result<(), FormatError> {
	if content.is_empty() {
		return Ok(());
	}
	match stack.last_mut() {
		Some(current) => {
			current.value.push_str(content);
			Ok(())
		}
		None => Err(FormatError::new("text outside the root element", position)),
	}
}
