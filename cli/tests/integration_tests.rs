use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

const DEPLOY_YAML: &str = r#"name: deployer
commands:
  - name: deploy
    description: Deploy a service
    fields:
      - ident: mode
        short: m
        enum: [dev, prod]
      - ident: verbose
        short: v
        type: bool
      - ident: target
        kind: positional
        name: TARGET
        required: true
    subcommands:
      - name: status
      - name: logs
        fields:
          - ident: follow
            short: f
            type: bool
"#;

const TWO_ROOTS_JSON: &str = r#"{
  "commands": [
    { "name": "alpha", "fields": [{ "ident": "input", "kind": "positional", "required": true }] },
    { "name": "beta", "fields": [{ "ident": "tags", "type": { "list": "string" } }] }
  ]
}"#;

fn write_tree(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).expect("failed to write tree definition");
    path
}

fn grammar(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_grammar"))
        .args(args)
        .output()
        .expect("failed to run grammar")
}

fn stdout_lines(output: &Output) -> Vec<String> {
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(str::to_string)
        .collect()
}

// ---------------------------------------------------------------------------
// validate
// ---------------------------------------------------------------------------

#[test]
fn validate_reports_command_counts() {
    let dir = tempfile::tempdir().unwrap();
    let tree = write_tree(dir.path(), "deploy.yaml", DEPLOY_YAML);

    let out = grammar(&["validate", "--tree", tree.to_str().unwrap()]);
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("Validated 1 root command(s), 3 command(s) in total"));
}

#[test]
fn validate_rejects_chain_flag_collision() {
    let dir = tempfile::tempdir().unwrap();
    let tree = write_tree(
        dir.path(),
        "bad.yaml",
        r#"commands:
  - name: app
    fields:
      - ident: verbose
        short: v
    subcommands:
      - name: run
        fields:
          - ident: version
            short: v
"#,
    );

    let out = grammar(&["validate", "--tree", tree.to_str().unwrap()]);
    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.starts_with("error:"), "stderr: {stderr}");
    assert!(stderr.contains("-v"), "stderr: {stderr}");
}

#[test]
fn validate_reports_missing_file() {
    let out = grammar(&["validate", "--tree", "/nonexistent/tree.yaml"]);
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("Failed to load"));
}

// ---------------------------------------------------------------------------
// parse
// ---------------------------------------------------------------------------

#[test]
fn parse_prints_invocations_as_json() {
    let dir = tempfile::tempdir().unwrap();
    let tree = write_tree(dir.path(), "deploy.yaml", DEPLOY_YAML);

    let out = grammar(&[
        "parse",
        "--tree",
        tree.to_str().unwrap(),
        "--",
        "deploy",
        "-vm",
        "prod",
        "api",
        "logs",
        "-f",
    ]);
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));

    let json: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    let runs = json.as_array().unwrap();
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0]["path"], serde_json::json!(["deploy", "logs"]));
    assert_eq!(runs[0]["chain"][0]["values"]["mode"], "prod");
    assert_eq!(runs[0]["chain"][0]["values"]["verbose"], true);
    assert_eq!(runs[0]["chain"][0]["values"]["target"], "api");
    assert_eq!(runs[0]["chain"][1]["values"]["follow"], true);
}

#[test]
fn parse_strips_reserved_flags() {
    let dir = tempfile::tempdir().unwrap();
    let tree = write_tree(dir.path(), "deploy.yaml", DEPLOY_YAML);

    let out = grammar(&[
        "parse", "--tree", tree.to_str().unwrap(), "--", "--timeout", "30s", "api", "--help",
    ]);
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));
    let json: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(json[0]["chain"][0]["values"]["target"], "api");
}

#[test]
fn parse_reports_missing_positional_by_display_name() {
    let dir = tempfile::tempdir().unwrap();
    let tree = write_tree(dir.path(), "deploy.yaml", DEPLOY_YAML);

    let out = grammar(&["parse", "--tree", tree.to_str().unwrap(), "--", "--mode", "dev"]);
    assert_eq!(out.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("missing required positional argument: TARGET"), "stderr: {stderr}");
}

#[test]
fn parse_chains_roots_from_json_definition() {
    let dir = tempfile::tempdir().unwrap();
    let tree = write_tree(dir.path(), "roots.json", TWO_ROOTS_JSON);

    let out = grammar(&[
        "parse",
        "--tree",
        tree.to_str().unwrap(),
        "--format",
        "yaml",
        "--",
        "alpha",
        "in.txt",
        "beta",
        "--tags",
        "a",
        "b",
    ]);
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("- alpha"));
    assert!(stdout.contains("- beta"));
    assert!(stdout.contains("in.txt"));
}

// ---------------------------------------------------------------------------
// complete
// ---------------------------------------------------------------------------

#[test]
fn complete_prints_enum_values_one_per_line() {
    let dir = tempfile::tempdir().unwrap();
    let tree = write_tree(dir.path(), "deploy.yaml", DEPLOY_YAML);
    let tree = tree.to_str().unwrap();

    let out = grammar(&["complete", "--tree", tree, "--", "deployer --mode "]);
    assert!(out.status.success());
    assert_eq!(stdout_lines(&out), vec!["dev", "prod"]);

    let out = grammar(&["complete", "--tree", tree, "--", "deployer -m p"]);
    assert_eq!(stdout_lines(&out), vec!["prod"]);
}

#[test]
fn complete_never_fails_on_bad_input() {
    let dir = tempfile::tempdir().unwrap();
    let tree = write_tree(dir.path(), "deploy.yaml", DEPLOY_YAML);

    let out = grammar(&["complete", "--tree", tree.to_str().unwrap(), "--", "deployer --nope \"open"]);
    assert!(out.status.success());
    assert!(out.stdout.is_empty());
}

#[test]
fn complete_offers_next_root() {
    let dir = tempfile::tempdir().unwrap();
    let tree = write_tree(dir.path(), "roots.json", TWO_ROOTS_JSON);

    let out = grammar(&["complete", "--tree", tree.to_str().unwrap(), "--", "app alpha x "]);
    let lines = stdout_lines(&out);
    assert!(lines.contains(&"alpha".to_string()));
    assert!(lines.contains(&"beta".to_string()));
}

// ---------------------------------------------------------------------------
// script
// ---------------------------------------------------------------------------

#[test]
fn script_uses_definition_name() {
    let dir = tempfile::tempdir().unwrap();
    let tree = write_tree(dir.path(), "deploy.yaml", DEPLOY_YAML);

    let out = grammar(&["script", "bash", "--tree", tree.to_str().unwrap()]);
    assert!(out.status.success());
    let script = String::from_utf8_lossy(&out.stdout);
    assert!(script.contains("complete -o default -F _deployer_complete deployer"));
    assert!(script.contains("complete --tree"));
}

#[test]
fn script_requires_a_binary_name() {
    let dir = tempfile::tempdir().unwrap();
    let tree = write_tree(dir.path(), "roots.json", TWO_ROOTS_JSON);

    let out = grammar(&["script", "zsh", "--tree", tree.to_str().unwrap()]);
    assert!(!out.status.success());

    let out = grammar(&["script", "zsh", "--tree", tree.to_str().unwrap(), "--bin", "tool"]);
    assert!(out.status.success());
    assert!(String::from_utf8_lossy(&out.stdout).starts_with("#compdef tool"));
}
