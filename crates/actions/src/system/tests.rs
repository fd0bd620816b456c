use appcore_keyseq::KeySequence;
use pretty_assertions::assert_eq;
use serde_json::json;

use super::*;
use crate::domain::{DomainItem, InsertionRule, ItemKind};
use crate::settings::MemorySettings;
use crate::spec::{ActionSpec, IconRef};

fn domain(id: &str) -> ActionDomain {
	let mut domain = ActionDomain::new(id);
	domain.add_top_level("bar").unwrap();
	domain.add_item(DomainItem::new("a", ItemKind::Action)).unwrap();
	domain.add_item(DomainItem::new("b", ItemKind::Action)).unwrap();
	domain.add_rule("a", InsertionRule::append("bar"));
	domain.add_rule("b", InsertionRule::append("bar"));
	domain
}

fn layout(children: &[&str]) -> DomainState {
	DomainState::from([("bar".to_string(), children.iter().map(|c| c.to_string()).collect())])
}

#[test]
fn domains_keep_insertion_order_and_reject_duplicates() {
	let mut system = ActionSystem::new();
	system.add_domain(domain("main")).unwrap();
	system.add_domain(domain("aux")).unwrap();

	let err = system.add_domain(domain("main")).unwrap_err();
	assert!(matches!(err, ActionError::DuplicateId { kind: EntityKind::Domain, .. }));
	assert_eq!(system.domain_ids().collect::<Vec<_>>(), ["main", "aux"]);

	assert_eq!(system.remove_domain("main").unwrap().id(), "main");
	assert!(matches!(
		system.remove_domain("main"),
		Err(ActionError::NotFound { kind: EntityKind::Domain, .. })
	));
	assert_eq!(system.domains().map(ActionDomain::id).collect::<Vec<_>>(), ["aux"]);
}

#[test]
fn override_set_before_domain_exists_is_applied_on_add() {
	let mut system = ActionSystem::new();
	system.set_state_override("main", Some(layout(&["b", "a"])));
	system.add_domain(domain("main")).unwrap();

	let main = system.domain("main").unwrap();
	assert_eq!(main.state()["bar"], ["a", "b"]);
	assert_eq!(main.cached_state()["bar"], ["b", "a"]);
}

#[test]
fn clearing_override_restores_declared_layout() {
	let mut system = ActionSystem::new();
	system.add_domain(domain("main")).unwrap();
	system.set_state_override("main", Some(layout(&["b", "a"])));
	assert_eq!(system.domain("main").unwrap().cached_state()["bar"], ["b", "a"]);

	system.set_state_override("main", None);
	assert!(system.state_override("main").is_none());
	assert_eq!(system.domain("main").unwrap().cached_state()["bar"], ["a", "b"]);
}

#[test]
fn removed_domain_gets_its_layout_back() {
	let mut system = ActionSystem::new();
	system.add_domain(domain("main")).unwrap();
	system.set_state_override("main", Some(layout(&["b", "a"])));
	system.remove_domain("main").unwrap();

	system.add_domain(domain("main")).unwrap();
	assert_eq!(system.domain("main").unwrap().cached_state()["bar"], ["b", "a"]);
}

#[test]
fn domain_carried_layout_is_adopted() {
	let mut system = ActionSystem::new();
	let mut main = domain("main");
	main.set_state_override(Some(layout(&["b"])));
	system.add_domain(main).unwrap();
	assert_eq!(system.state_override("main"), Some(&layout(&["b"])));
}

#[test]
fn settings_save_and_read_are_symmetric() {
	let mut system = ActionSystem::new();
	system
		.registry_mut()
		.register(ActionSpec::new("a").with_shortcuts(vec![KeySequence::parse("Ctrl+A").unwrap()]))
		.unwrap();
	system.add_domain(domain("main")).unwrap();
	system.set_state_override("main", Some(layout(&["b", "a"])));
	system
		.registry_mut()
		.set_shortcut_override("a", vec![KeySequence::parse("Ctrl+Shift+A").unwrap()]);
	system.registry_mut().set_icon_override("a", IconRef::Vector("alpha".into()));

	let mut store = MemorySettings::new();
	system.save_settings(&mut store);
	assert_eq!(
		store.get(SETTINGS_KEY),
		Some(json!({
			"State": { "main": { "bar": ["b", "a"] } },
			"Shortcuts": { "a": ["Ctrl+Shift+A"] },
			"Icons": { "a": "svg(alpha)" }
		}))
	);

	let mut fresh = ActionSystem::new();
	fresh.registry_mut().register(ActionSpec::new("a")).unwrap();
	fresh.add_domain(domain("main")).unwrap();
	fresh.read_settings(&store);

	assert_eq!(fresh.state_override("main"), system.state_override("main"));
	assert_eq!(fresh.domain("main").unwrap().cached_state()["bar"], ["b", "a"]);
	assert_eq!(
		fresh.registry().effective_shortcuts("a"),
		[KeySequence::parse("Ctrl+Shift+A").unwrap()]
	);
	assert_eq!(fresh.registry().effective_icon("a"), Some(&IconRef::Vector("alpha".into())));
}

#[test]
fn reading_settings_replaces_previous_customization() {
	let mut system = ActionSystem::new();
	system.add_domain(domain("main")).unwrap();
	system.set_state_override("main", Some(layout(&["b", "a"])));
	system
		.registry_mut()
		.set_shortcut_override("x", vec![KeySequence::parse("F1").unwrap()]);

	let store = MemorySettings::new().with(SETTINGS_KEY, json!({ "Shortcuts": { "y": ["F2"] } }));
	system.read_settings(&store);

	assert!(system.state_override("main").is_none());
	assert_eq!(system.domain("main").unwrap().cached_state()["bar"], ["a", "b"]);
	assert_eq!(system.registry().shortcut_overrides().keys().collect::<Vec<_>>(), ["y"]);
}

#[test]
fn missing_settings_entry_resets() {
	let mut system = ActionSystem::new();
	system.set_state_override("main", Some(layout(&["a"])));
	system.read_settings(&MemorySettings::new());
	assert!(system.state_override("main").is_none());
}

#[test]
fn missing_manifest_file_is_io_error() {
	let dir = tempfile::tempdir().unwrap();
	let mut system = ActionSystem::new();
	let err = system
		.load_manifest_file(dir.path().join("absent.xml"), &LoadOptions::default())
		.unwrap_err();
	assert!(matches!(err, ActionError::Io(_)));
}
