use std::fs;

use command_grammar_core::{DefinitionError, FieldKind, TreeDefinition, ValidationError};

#[test]
fn load_picks_format_from_extension() {
    let dir = tempfile::tempdir().unwrap();

    let json = dir.path().join("tree.json");
    fs::write(&json, r#"{"name": "tool", "commands": [{"name": "run"}]}"#).unwrap();
    let def = TreeDefinition::load(&json).unwrap();
    assert_eq!(def.name.as_deref(), Some("tool"));

    let yaml = dir.path().join("tree.yml");
    fs::write(
        &yaml,
        "commands:\n  - name: run\n    fields:\n      - ident: script\n        kind: positional\n",
    )
    .unwrap();
    let tree = TreeDefinition::load(&yaml).unwrap().build().unwrap();
    let run = tree.find_root("run").unwrap();
    assert_eq!(tree.node(run).fields[0].kind, FieldKind::Positional);
}

#[test]
fn load_reports_io_and_parse_errors() {
    let dir = tempfile::tempdir().unwrap();

    let missing = TreeDefinition::load(dir.path().join("absent.yaml"));
    assert!(matches!(missing, Err(DefinitionError::IoError(_))));

    let broken = dir.path().join("broken.json");
    fs::write(&broken, "{ not json").unwrap();
    assert!(matches!(
        TreeDefinition::load(&broken),
        Err(DefinitionError::JsonError(_))
    ));
}

#[test]
fn build_rejects_flag_collision_along_chain() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("clash.yaml");
    fs::write(
        &path,
        r#"commands:
  - name: app
    fields:
      - ident: output
    subcommands:
      - name: build
        fields:
          - ident: out
            name: output
"#,
    )
    .unwrap();

    let err = TreeDefinition::load(&path).unwrap().build().unwrap_err();
    assert!(matches!(
        err,
        DefinitionError::Invalid(ValidationError::DuplicateFlag { ref name, .. }) if name == "--output"
    ));
}

#[test]
fn sibling_subcommands_may_reuse_flag_names() {
    let def = TreeDefinition::from_yaml_str(
        r#"commands:
  - name: app
    subcommands:
      - name: build
        fields:
          - ident: release
            short: r
      - name: test
        fields:
          - ident: release
            short: r
"#,
    )
    .unwrap();
    assert!(def.build().is_ok());
}
