use appcore_keyseq::KeySequence;
use pretty_assertions::assert_eq;

use super::*;
use crate::domain::Diagnostic;

const MANIFEST: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<actionSystem>
  <actions>
    <item id="core.new" command="New" displayName="New ${KIND}" shortcuts="Ctrl+N;Ctrl+Alt+N"/>
    <item id="core.open" command="Open" shortcut="Ctrl+O" icon="svg(open)"/>
    <item id="core.save" command="Save" shortcuts="Ctrl+S;Ctrl+;Bogus+;;" icon=":/save.png"/>
    <item command="Nameless"/>
  </actions>
  <menus>
    <item id="file" text="&amp;File"/>
    <item id="core.new" command="Shadowed"/>
  </menus>
  <domains>
    <domain id="main" title="${APP} Main">
      <menu id="%menubar">
        <menu id="file" title="File">
          <action id="core.new"/>
          <group id="io" expand="true">
            <action id="core.open"/>
            <action id="core.save"/>
          </group>
          <separator/>
          <stretch/>
          <separator/>
        </menu>
      </menu>
      <group id="floating"/>
      <insert id="core.save" target="file/core.new" mode="before"/>
      <insert id="floating" target="file" mode="prepend" expand="true"/>
      <insert id="core.open" target="floating"/>
      <bogus id="x"/>
    </domain>
  </domains>
</actionSystem>
"#;

fn load_sample() -> (ActionSystem, LoadReport) {
	let mut system = ActionSystem::new();
	let options = LoadOptions::default()
		.with_variable("APP", "DiffScope")
		.with_variable("KIND", "File");
	let report = system.load_manifest(MANIFEST.as_bytes(), &options).unwrap();
	(system, report)
}

fn seq(s: &str) -> KeySequence {
	KeySequence::parse(s).unwrap()
}

#[test]
fn registers_action_specs() {
	let (system, report) = load_sample();
	assert_eq!(report.actions, ["core.new", "core.open", "core.save", "file"]);

	let registry = system.registry();
	let new = registry.lookup("core.new").unwrap();
	assert_eq!(new.command_name(), "New");
	assert_eq!(new.command_display_name(), "New File");
	assert_eq!(new.shortcuts(), [seq("Ctrl+N"), seq("Ctrl+Alt+N")]);

	let open = registry.lookup("core.open").unwrap();
	assert_eq!(open.shortcuts(), [seq("Ctrl+O")]);
	assert_eq!(open.icon(), Some(&IconRef::Vector("open".into())));

	let save = registry.lookup("core.save").unwrap();
	assert_eq!(save.shortcuts(), [seq("Ctrl+S")]);
	assert_eq!(save.icon().map(IconRef::source).as_deref(), Some(":/save.png"));

	assert_eq!(registry.lookup("file").unwrap().command_display_name(), "&File");
}

#[test]
fn invalid_shortcut_segments_are_skipped() {
	assert_eq!(parse_shortcuts("x", "Ctrl+;;;Nope+Q;F3"), [seq("Ctrl+;"), seq("F3")]);
}

#[test]
fn builds_domain_structure() {
	let (system, report) = load_sample();
	assert_eq!(report.domains, ["main"]);

	let domain = system.domain("main").unwrap();
	assert_eq!(domain.title(), "DiffScope Main");
	assert_eq!(domain.top_levels().collect::<Vec<_>>(), ["menubar"]);
	assert_eq!(domain.item("file").unwrap().title, "File");
	assert_eq!(domain.item_kind("io"), Some(ItemKind::Group));
	assert_eq!(domain.item_kind("separator_1"), Some(ItemKind::Separator));
	assert_eq!(domain.item_kind("separator_2"), Some(ItemKind::Separator));
	assert_eq!(domain.item_kind("stretch_1"), Some(ItemKind::Stretch));
	assert!(!domain.contains_item("x"));
}

#[test]
fn resolves_loaded_rules() {
	let (system, _) = load_sample();
	let domain = system.domain("main").unwrap();
	let state = domain.state();

	assert_eq!(state["menubar"], ["file"]);
	assert_eq!(
		state["file"],
		[
			"core.open",
			"core.save",
			"core.new",
			"separator_1",
			"stretch_1",
			"separator_2"
		]
	);
	assert_eq!(state["io"], ["core.open", "core.save"]);
	assert_eq!(state["floating"], ["core.open"]);
	assert!(domain.diagnostics().is_empty());
}

#[test]
fn insert_modes_and_anchor_rules() {
	let (system, _) = load_sample();
	let domain = system.domain("main").unwrap();

	let save_rules: Vec<_> = domain.item_rules("core.save").cloned().collect();
	assert_eq!(
		save_rules,
		[
			InsertionRule::append("io"),
			InsertionRule::before("file", "core.new"),
		]
	);
	let floating: Vec<_> = domain.item_rules("floating").cloned().collect();
	assert_eq!(floating, [InsertionRule::unshift("file").expanded()]);
	assert!(domain.has_rule("file", "core.new"));
}

#[test]
fn reloading_into_fresh_system_is_deterministic() {
	let (first, _) = load_sample();
	let (second, _) = load_sample();
	assert_eq!(
		*first.domain("main").unwrap().state(),
		*second.domain("main").unwrap().state()
	);
}

#[test]
fn auto_ids_skip_existing_items() {
	let mut system = ActionSystem::new();
	let manifest = br#"<actionSystem><domains>
		<domain id="d"><menu id="%bar"><separator/><separator id="separator_2"/><separator/></menu></domain>
	</domains></actionSystem>"#;
	system.load_manifest(manifest, &LoadOptions::default()).unwrap();

	let domain = system.domain("d").unwrap();
	assert_eq!(domain.state()["bar"], ["separator_1", "separator_2", "separator_3"]);
}

#[test]
fn unresolved_anchor_from_manifest_is_diagnosed() {
	let mut system = ActionSystem::new();
	let manifest = br#"<actionSystem><domains><domain id="d">
		<menu id="%bar"><action id="a"/></menu>
		<action id="b"/>
		<insert id="b" target="bar/missing" mode="after"/>
	</domain></domains></actionSystem>"#;
	system.load_manifest(manifest, &LoadOptions::default()).unwrap();

	let domain = system.domain("d").unwrap();
	assert_eq!(domain.state()["bar"], ["a"]);
	assert_eq!(
		*domain.diagnostics(),
		[Diagnostic::UnresolvedAnchor {
			target: "bar".into(),
			item: "b".into(),
			anchor: "missing".into(),
		}]
	);
}

#[test]
fn redeclaration_with_other_kind_skips_children() {
	let mut system = ActionSystem::new();
	let manifest = br#"<actionSystem><domains><domain id="d">
		<menu id="%bar"><action id="x"/><menu id="x"><action id="z"/></menu></menu>
		<menu id="x"><action id="y"/></menu>
	</domain></domains></actionSystem>"#;
	system.load_manifest(manifest, &LoadOptions::default()).unwrap();

	let domain = system.domain("d").unwrap();
	assert_eq!(domain.item_kind("x"), Some(ItemKind::Action));
	assert!(!domain.contains_item("y"));
	assert!(!domain.contains_item("z"));
	assert_eq!(domain.state()["bar"], ["x"]);
	assert!(domain.diagnostics().is_empty());
}

#[test]
fn slot_colliding_with_item_is_skipped() {
	let mut system = ActionSystem::new();
	let manifest = br#"<actionSystem><domains><domain id="d">
		<menu id="file"/>
		<menu id="%file"><action id="a"/></menu>
	</domain></domains></actionSystem>"#;
	let report = system.load_manifest(manifest, &LoadOptions::default()).unwrap();
	assert_eq!(report.domains, ["d"]);

	let domain = system.domain("d").unwrap();
	assert!(!domain.contains_top_level("file"));
	assert_eq!(domain.item_kind("file"), Some(ItemKind::Menu));
	assert!(!domain.contains_item("a"));
}

#[test]
fn malformed_manifest_installs_nothing() {
	let mut system = ActionSystem::new();
	let err = system
		.load_manifest(b"<actionSystem><actions><item id=\"a\"></actions>", &LoadOptions::default())
		.unwrap_err();
	assert!(matches!(err, ActionError::Format(_)));
	assert!(system.registry().is_empty());
	assert_eq!(system.domain_ids().count(), 0);
}

#[test]
fn wrong_root_is_rejected() {
	let mut system = ActionSystem::new();
	let err = system
		.load_manifest(b"<menus><item id=\"a\"/></menus>", &LoadOptions::default())
		.unwrap_err();
	assert!(matches!(err, ActionError::InvalidRoot { ref found } if found == "menus"));
	assert!(system.registry().is_empty());
}

#[test]
fn second_manifest_extends_existing_domain() {
	let (mut system, _) = load_sample();
	let extra = br#"<actionSystem>
		<actions><item id="plugin.run" command="Run"/></actions>
		<domains><domain id="main">
			<action id="plugin.run"/>
			<insert id="plugin.run" target="file/core.new"/>
		</domain></domains>
	</actionSystem>"#;
	let report = system.load_manifest(extra, &LoadOptions::default()).unwrap();
	assert_eq!(report.actions, ["plugin.run"]);

	let state = system.domain("main").unwrap().state();
	assert_eq!(state["file"][..4], ["core.open", "core.save", "core.new", "plugin.run"]);
}

#[rstest::rstest]
#[case(None, InsertMode::Append)]
#[case(Some("append"), InsertMode::Append)]
#[case(Some("insertBehind"), InsertMode::Append)]
#[case(Some("after"), InsertMode::Append)]
#[case(Some("prepend"), InsertMode::Unshift)]
#[case(Some("unshift"), InsertMode::Unshift)]
#[case(Some("before"), InsertMode::Unshift)]
#[case(Some("insertFront"), InsertMode::Unshift)]
#[case(Some("sideways"), InsertMode::Append)]
fn insert_mode_names(#[case] mode: Option<&str>, #[case] expected: InsertMode) {
	assert_eq!(parse_mode(mode), expected);
}
