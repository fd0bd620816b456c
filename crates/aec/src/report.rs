//! JSON description of a loaded action system.

use std::collections::BTreeMap;

use appcore_actions::{ActionDomain, ActionSystem};
use appcore_keyseq::KeySequence;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct Report {
	pub identifier: String,
	pub actions: Vec<ActionEntry>,
	pub domains: Vec<DomainEntry>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionEntry {
	pub id: String,
	pub command: String,
	pub display_name: String,
	/// Effective shortcuts, overrides applied.
	pub shortcuts: Vec<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub icon: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainEntry {
	pub id: String,
	pub title: String,
	pub configurable: bool,
	pub top_levels: Vec<String>,
	pub state: BTreeMap<String, Vec<String>>,
	pub diagnostics: Vec<String>,
}

/// Describes every action and domain of `system`. With `cached` the
/// domain layouts include user overrides.
pub fn build(system: &ActionSystem, identifier: &str, cached: bool) -> Report {
	let registry = system.registry();
	let actions = registry
		.specs()
		.map(|spec| ActionEntry {
			id: spec.id().to_string(),
			command: spec.command_name().to_string(),
			display_name: spec.command_display_name().to_string(),
			shortcuts: registry.effective_shortcuts(spec.id()).iter().map(KeySequence::to_string).collect(),
			icon: registry.effective_icon(spec.id()).map(ToString::to_string),
		})
		.collect();
	let domains = system.domains().map(|domain| describe(domain, cached)).collect();

	Report {
		identifier: identifier.to_string(),
		actions,
		domains,
	}
}

fn describe(domain: &ActionDomain, cached: bool) -> DomainEntry {
	let (state, diagnostics) = if cached {
		(domain.cached_state(), domain.cached_diagnostics())
	} else {
		(domain.state(), domain.diagnostics())
	};
	DomainEntry {
		id: domain.id().to_string(),
		title: domain.title().to_string(),
		configurable: domain.configurable(),
		top_levels: domain.top_levels().map(str::to_string).collect(),
		state: (*state).clone(),
		diagnostics: diagnostics.iter().map(ToString::to_string).collect(),
	}
}
