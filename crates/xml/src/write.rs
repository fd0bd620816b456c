use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};

use crate::{Element, FormatError};

const INDENT: usize = 2;

/// Serializes a tree as an indented UTF-8 document with an XML declaration.
///
/// # Errors
///
/// Returns a [`FormatError`] if the tree cannot be represented as markup
/// (for example an empty tag name).
pub fn serialize(root: &Element) -> Result<Vec<u8>, FormatError> {
	let mut writer = Writer::new_with_indent(Vec::new(), b' ', INDENT);
	writer
		.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
		.map_err(write_error)?;
	write_element(&mut writer, root)?;

	let mut bytes = writer.into_inner();
	bytes.push(b'\n');
	Ok(bytes)
}

fn write_element(writer: &mut Writer<Vec<u8>>, element: &Element) -> Result<(), FormatError> {
	if !is_valid_name(&element.name) {
		return Err(FormatError::new(format!("invalid tag name {:?}", element.name), 0));
	}
	for key in element.properties.keys() {
		if !is_valid_name(key) {
			return Err(FormatError::new(format!("invalid attribute name {key:?}"), 0));
		}
	}

	let mut start = BytesStart::new(element.name.as_str());
	for (key, value) in &element.properties {
		start.push_attribute((key.as_str(), value.as_str()));
	}

	if element.children.is_empty() && element.value.is_empty() {
		return writer.write_event(Event::Empty(start)).map_err(write_error);
	}

	writer.write_event(Event::Start(start)).map_err(write_error)?;
	if element.children.is_empty() {
		writer
			.write_event(Event::Text(BytesText::new(&element.value)))
			.map_err(write_error)?;
	} else {
		for child in &element.children {
			write_element(writer, child)?;
		}
	}
	writer
		.write_event(Event::End(BytesEnd::new(element.name.as_str())))
		.map_err(write_error)
}

fn is_valid_name(name: &str) -> bool {
	let mut chars = name.chars();
	match chars.next() {
		Some(first) if first.is_alphabetic() || first == '_' || first == ':' => {}
		_ => return false,
	}
	chars.all(|ch| ch.is_alphanumeric() || matches!(ch, '_' | ':' | '-' | '.'))
}

fn write_error(e: impl std::fmt::Display) -> FormatError {
	FormatError::new(e.to_string(), 0)
}
