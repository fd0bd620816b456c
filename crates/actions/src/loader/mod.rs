//! Manifest loading.
//!
//! A manifest is an `actionSystem` document with three kinds of sections:
//!
//! ```xml
//! <actionSystem>
//!   <actions>
//!     <item id="core.save" command="Save" shortcuts="Ctrl+S" icon="svg(save)"/>
//!   </actions>
//!   <domains>
//!     <domain id="main">
//!       <menu id="%menubar">
//!         <menu id="file">
//!           <action id="core.save"/>
//!           <separator/>
//!         </menu>
//!       </menu>
//!       <insert id="core.export" target="file/core.save" mode="append"/>
//!     </domain>
//!   </domains>
//! </actionSystem>
//! ```
//!
//! `actions` and `menus` register action specs. Each `domain` creates or
//! extends an [`ActionDomain`]: `%`-prefixed ids declare top-level slots,
//! other direct children declare floating items, nested children are placed
//! under their parent in document order, and `insert` elements add rules for
//! items declared elsewhere.

use indexmap::IndexMap;
use tracing::{debug, warn};

use appcore_keyseq::{KeySequence, split_list};
use appcore_xml::Element;

use crate::domain::{ActionDomain, DomainItem, InsertMode, InsertionRule, ItemKind};
use crate::error::ActionError;
use crate::registry::ActionRegistry;
use crate::spec::{ActionSpec, IconRef};
use crate::system::ActionSystem;

mod vars;

#[cfg(test)]
mod tests;

use vars::expand;

pub const ROOT_TAG: &str = "actionSystem";

/// Marks a top-level slot id in manifests.
const SLOT_PREFIX: char = '%';

/// Options for a single manifest load.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
	/// Values for `${NAME}` references in `command`, `displayName`, `text`
	/// and `title` attributes.
	pub variables: IndexMap<String, String>,
}

impl LoadOptions {
	pub fn with_variable(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.variables.insert(name.into(), value.into());
		self
	}
}

/// Ids touched by a load, in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
	/// Newly registered actions.
	pub actions: Vec<String>,
	/// Domains created or extended.
	pub domains: Vec<String>,
}

/// Parses `bytes` and merges the manifest into `system`.
///
/// The whole document is parsed and its root checked before anything is
/// touched, so a malformed file installs nothing.
pub(crate) fn load(system: &mut ActionSystem, bytes: &[u8], options: &LoadOptions) -> Result<LoadReport, ActionError> {
	let root = appcore_xml::parse(bytes)?;
	if root.name != ROOT_TAG {
		warn!(found = %root.name, "manifest root is not actionSystem");
		return Err(ActionError::InvalidRoot { found: root.name });
	}

	let mut report = LoadReport::default();
	for section in &root.children {
		match section.name.as_str() {
			"actions" | "menus" => {
				for item in section.children_named("item") {
					load_action(system.registry_mut(), item, options, &mut report);
				}
			}
			"domains" => {
				for element in section.children_named("domain") {
					load_domain(system, element, options, &mut report);
				}
			}
			other => debug!(section = other, "unknown manifest section ignored"),
		}
	}
	debug!(
		actions = report.actions.len(),
		domains = report.domains.len(),
		"manifest loaded"
	);
	Ok(report)
}

fn load_action(registry: &mut ActionRegistry, element: &Element, options: &LoadOptions, report: &mut LoadReport) {
	let Some(id) = element.property("id").filter(|id| !id.is_empty()) else {
		warn!("action item without id ignored");
		return;
	};

	let mut spec = ActionSpec::new(id);
	if let Some(command) = element.property("command") {
		spec.set_command_name(expand(command, &options.variables));
	}
	if let Some(name) = element.property("displayName").or_else(|| element.property("text")) {
		spec.set_command_display_name(expand(name, &options.variables));
	}
	if let Some(list) = element.property("shortcuts").or_else(|| element.property("shortcut")) {
		spec = spec.with_shortcuts(parse_shortcuts(id, list));
	}
	if let Some(icon) = element.property("icon").filter(|icon| !icon.trim().is_empty()) {
		spec = spec.with_icon(IconRef::parse(icon));
	}

	if registry.register(spec).is_ok() {
		report.actions.push(id.to_string());
	}
}

/// Parses a `;`-delimited shortcut list, dropping invalid entries.
fn parse_shortcuts(id: &str, list: &str) -> Vec<KeySequence> {
	split_list(list)
		.into_iter()
		.filter_map(|segment| match KeySequence::parse(&segment) {
			Ok(seq) => Some(seq),
			Err(error) => {
				warn!(id, shortcut = %segment, %error, "invalid shortcut ignored");
				None
			}
		})
		.collect()
}

fn load_domain(system: &mut ActionSystem, element: &Element, options: &LoadOptions, report: &mut LoadReport) {
	let Some(id) = element.property("id").filter(|id| !id.is_empty()) else {
		warn!("domain without id ignored");
		return;
	};

	if system.domain(id).is_none()
		&& let Err(error) = system.add_domain(ActionDomain::new(id))
	{
		debug!(domain = id, %error, "domain not created");
		return;
	}
	let Some(domain) = system.domain_mut(id) else {
		return;
	};

	if let Some(title) = element.property("title") {
		domain.set_title(expand(title, &options.variables));
	}
	if let Some(value) = element.property("configurable") {
		domain.set_configurable(parse_bool(value, true));
	}

	let mut loader = DomainLoader {
		domain,
		options,
		auto_ids: AutoIds::default(),
	};
	for child in &element.children {
		loader.direct_child(child);
	}

	if !report.domains.iter().any(|d| d == id) {
		report.domains.push(id.to_string());
	}
}

/// Per-load counters for `separator_N` and `stretch_N` ids.
#[derive(Debug, Default)]
struct AutoIds {
	separators: usize,
	stretches: usize,
}

impl AutoIds {
	fn next(&mut self, kind: ItemKind, domain: &ActionDomain) -> Option<String> {
		let (prefix, counter) = match kind {
			ItemKind::Separator => ("separator", &mut self.separators),
			ItemKind::Stretch => ("stretch", &mut self.stretches),
			_ => return None,
		};
		loop {
			*counter += 1;
			let id = format!("{prefix}_{counter}");
			if !domain.contains_item(&id) && !domain.contains_top_level(&id) {
				return Some(id);
			}
		}
	}
}

struct DomainLoader<'a> {
	domain: &'a mut ActionDomain,
	options: &'a LoadOptions,
	auto_ids: AutoIds,
}

impl DomainLoader<'_> {
	fn direct_child(&mut self, element: &Element) {
		if element.name == "insert" {
			self.insert(element);
			return;
		}

		if let Some(slot) = element.property("id").and_then(|id| id.strip_prefix(SLOT_PREFIX)) {
			if !self.domain.contains_top_level(slot)
				&& let Err(error) = self.domain.add_top_level(slot)
			{
				debug!(domain = %self.domain.id(), slot, %error, "slot entries skipped");
				return;
			}
			self.children(slot, element);
			return;
		}

		if let Some((id, kind)) = self.declare(element)
			&& kind.is_container()
		{
			self.children(&id, element);
		}
	}

	/// Walks nested entries depth-first, placing each under `parent`.
	fn children(&mut self, parent: &str, element: &Element) {
		for child in &element.children {
			if child.name == "insert" {
				warn!(domain = %self.domain.id(), parent, "nested insert ignored");
				continue;
			}
			let Some((id, kind)) = self.declare(child) else {
				continue;
			};

			let mut rule = InsertionRule::append(parent);
			rule.expand = child.property("expand").is_some_and(|v| parse_bool(v, false));
			self.domain.add_rule(id.as_str(), rule);

			if kind.is_container() {
				self.children(&id, child);
			} else if !child.children.is_empty() {
				warn!(domain = %self.domain.id(), id = %id, %kind, "children of non-container ignored");
			}
		}
	}

	/// Creates the item an element names unless it exists already. An
	/// element redeclaring an item with another kind is skipped.
	fn declare(&mut self, element: &Element) -> Option<(String, ItemKind)> {
		let Some(kind) = ItemKind::from_tag(&element.name) else {
			warn!(domain = %self.domain.id(), tag = %element.name, "unknown domain entry ignored");
			return None;
		};

		let explicit = element
			.property("id")
			.map(|id| id.trim_start_matches(SLOT_PREFIX))
			.filter(|id| !id.is_empty());
		let id = match explicit {
			Some(id) => id.to_string(),
			None => match self.auto_ids.next(kind, &*self.domain) {
				Some(id) => id,
				None => {
					warn!(domain = %self.domain.id(), %kind, "entry without id ignored");
					return None;
				}
			},
		};

		match self.domain.item_kind(&id) {
			Some(existing) if existing != kind => {
				warn!(domain = %self.domain.id(), id = %id, %existing, %kind, "entry redeclared with another kind");
				return None;
			}
			Some(_) => {}
			None => {
				let title = element
					.property("title")
					.or_else(|| element.property("text"))
					.map(|t| expand(t, &self.options.variables))
					.unwrap_or_default();
				self.domain.add_item(DomainItem::new(id.as_str(), kind).with_title(title)).ok()?;
			}
		}
		Some((id, kind))
	}

	fn insert(&mut self, element: &Element) {
		let (Some(id), Some(target)) = (element.property("id"), element.property("target")) else {
			warn!(domain = %self.domain.id(), "insert without id or target ignored");
			return;
		};
		let id = id.trim_start_matches(SLOT_PREFIX);
		let (parent, anchor) = match target.split_once('/') {
			Some((parent, anchor)) => (parent, Some(anchor.trim_start_matches(SLOT_PREFIX))),
			None => (target, None),
		};
		let parent = parent.trim_start_matches(SLOT_PREFIX);

		let mut rule = InsertionRule::new(parent, parse_mode(element.property("mode")));
		rule.relative_to = anchor.filter(|a| !a.is_empty()).map(str::to_string);
		rule.expand = element.property("expand").is_some_and(|v| parse_bool(v, false));
		self.domain.add_rule(id, rule);
	}
}

fn parse_mode(mode: Option<&str>) -> InsertMode {
	match mode.map(str::trim) {
		None | Some("" | "append" | "after" | "insertBehind") => InsertMode::Append,
		Some("prepend" | "unshift" | "before" | "insertFront") => InsertMode::Unshift,
		Some(other) => {
			warn!(mode = other, "unknown insert mode, appending");
			InsertMode::Append
		}
	}
}

fn parse_bool(value: &str, default: bool) -> bool {
	match value.trim().to_ascii_lowercase().as_str() {
		"true" | "1" | "yes" | "on" => true,
		"false" | "0" | "no" | "off" => false,
		other => {
			warn!(value = other, "invalid boolean attribute");
			default
		}
	}
}
