//! Completion behavior on in-progress command lines.

use command_grammar_core::{
    CommandBuilder, CommandTree, FieldDescriptor, Registry, ReservedTokens, ValueType,
};
use command_grammar_engine::Grammar;

fn tree_of(commands: Vec<CommandBuilder>) -> CommandTree {
    let mut registry = Registry::new();
    for command in commands {
        registry.register(command).unwrap();
    }
    registry.resolve().unwrap()
}

fn mode_tree() -> CommandTree {
    tree_of(vec![
        CommandBuilder::new("app")
            .with_field(
                FieldDescriptor::flag("mode", ValueType::String)
                    .short('m')
                    .one_of(["dev", "prod"]),
            )
            .with_field(FieldDescriptor::flag("quiet", ValueType::Bool).short('q')),
    ])
}

fn alpha_beta() -> CommandTree {
    tree_of(vec![
        CommandBuilder::new("alpha")
            .with_field(FieldDescriptor::positional("input", ValueType::String).required()),
        CommandBuilder::new("beta")
            .with_field(FieldDescriptor::flag("level", ValueType::Int))
            .with_subcommand(CommandBuilder::new("gamma")),
    ])
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[test]
fn test_enum_values_after_long_and_short_flag() {
    let tree = mode_tree();
    let grammar = Grammar::new(&tree);
    assert_eq!(grammar.complete("app --mode "), strings(&["dev", "prod"]));
    assert_eq!(grammar.complete("app -m "), strings(&["dev", "prod"]));
    assert_eq!(grammar.complete("app -qm "), strings(&["dev", "prod"]));
    assert_eq!(grammar.complete("app --mode d"), strings(&["dev"]));
}

#[test]
fn test_flag_prefix_suppresses_enum_values() {
    let tree = mode_tree();
    let grammar = Grammar::new(&tree).with_reserved(ReservedTokens::none());
    assert_eq!(grammar.complete("app --mode -"), strings(&["--mode", "-m", "--quiet", "-q"]));
}

#[test]
fn test_flags_offered_on_empty_prefix() {
    let tree = mode_tree();
    let grammar = Grammar::new(&tree);
    let out = grammar.complete("app --mode dev ");
    for expected in ["--mode", "-m", "--quiet", "-q", "--help", "-h", "--timeout"] {
        assert!(out.contains(&expected.to_string()), "missing {expected} in {out:?}");
    }
    assert!(!out.contains(&"dev".to_string()));
}

#[test]
fn test_several_roots_without_tokens() {
    let tree = alpha_beta();
    let grammar = Grammar::new(&tree);
    let out = grammar.complete("app ");
    assert_eq!(&out[..2], &strings(&["alpha", "beta"])[..]);
    assert!(out.contains(&"--version".to_string()));

    assert_eq!(grammar.complete("app b"), strings(&["beta"]));
}

#[test]
fn test_unknown_first_token_suggests_matching_roots() {
    let tree = alpha_beta();
    let grammar = Grammar::new(&tree);
    assert!(grammar.complete("app zeta ").is_empty());
    assert_eq!(grammar.complete("app ALP "), strings(&["alpha"]));
}

#[test]
fn test_next_root_after_finished_command() {
    let tree = alpha_beta();
    let grammar = Grammar::new(&tree);

    let out = grammar.complete("app alpha in.txt ");
    assert!(out.contains(&"alpha".to_string()));
    assert!(out.contains(&"beta".to_string()));

    // alpha still needs its input
    let out = grammar.complete("app alpha ");
    assert!(!out.contains(&"beta".to_string()));

    let out = grammar.complete("app beta alpha x ");
    assert!(out.contains(&"beta".to_string()));
}

#[test]
fn test_subcommands_and_reset_below_root() {
    let tree = alpha_beta();
    let grammar = Grammar::new(&tree).with_reserved(ReservedTokens::none());
    assert_eq!(grammar.complete("app beta g"), strings(&["gamma"]));

    let out = grammar.complete("app beta gamma ");
    assert!(out.contains(&"^".to_string()));
    assert!(out.contains(&"gamma".to_string()));
    assert!(out.contains(&"--level".to_string()));
}

#[test]
fn test_reset_returns_to_root_choice() {
    let tree = alpha_beta();
    let grammar = Grammar::new(&tree).with_reserved(ReservedTokens::none());
    assert_eq!(grammar.complete("app beta ^ "), strings(&["alpha", "beta"]));
}

#[test]
fn test_single_root_name_is_offered_once() {
    let tree = mode_tree();
    let grammar = Grammar::new(&tree).with_reserved(ReservedTokens::none());
    assert_eq!(grammar.complete("app a"), strings(&["app"]));
    // naming the root explicitly moves past it
    assert!(!grammar.complete("app app ").contains(&"app".to_string()));
}

#[test]
fn test_positional_enum_after_flags() {
    let tree = tree_of(vec![
        CommandBuilder::new("app")
            .with_field(FieldDescriptor::flag("tags", ValueType::List(Box::new(ValueType::String))))
            .with_field(FieldDescriptor::flag("dry_run", ValueType::Bool))
            .with_field(FieldDescriptor::positional("action", ValueType::String).one_of(["start", "stop"])),
    ]);
    let grammar = Grammar::new(&tree).with_reserved(ReservedTokens::none());
    assert_eq!(grammar.complete("app --dry-run --tags a b -- s"), strings(&["start", "stop"]));
    assert_eq!(grammar.complete("app --dry-run st"), strings(&["start", "stop"]));
}

#[test]
fn test_never_fails_on_odd_input() {
    let tree = alpha_beta();
    let grammar = Grammar::new(&tree);
    for line in [
        "",
        " ",
        "app",
        "app \"unterminated",
        "app 'half",
        "app \\",
        "app alpha --nope ",
        "app beta --level ",
        "app beta --level notanumber ",
        "app beta -zzz ",
        "app ^ ^ ^ ",
        "app -- -- ",
        "app alpha x y z ",
    ] {
        let _ = grammar.complete(line);
    }
    assert!(grammar.complete("app beta --level notanumber ").is_empty());
}

fn build_and_test() -> CommandTree {
    tree_of(vec![
        CommandBuilder::new("app")
            .with_subcommand(CommandBuilder::new("build").with_subcommand(CommandBuilder::new("linux")))
            .with_subcommand(
                CommandBuilder::new("test").with_field(
                    FieldDescriptor::positional("suite", ValueType::String)
                        .one_of(["unit", "e2e"])
                        .required(),
                ),
            ),
    ])
}

#[test]
fn test_single_root_runs_again_after_leftover() {
    let tree = build_and_test();
    let grammar = Grammar::new(&tree).with_reserved(ReservedTokens::none());
    let out = grammar.complete("app build linux test ");
    assert!(out.contains(&"unit".to_string()), "{out:?}");
    assert!(out.contains(&"e2e".to_string()), "{out:?}");
    assert!(!out.contains(&"linux".to_string()));
}

#[test]
fn test_single_root_positionals_fill_again() {
    let tree = tree_of(vec![
        CommandBuilder::new("app")
            .with_field(FieldDescriptor::positional("first", ValueType::String).one_of(["a1", "a2"]))
            .with_field(FieldDescriptor::positional("second", ValueType::String).one_of(["x", "y"])),
    ]);
    let grammar = Grammar::new(&tree).with_reserved(ReservedTokens::none());
    assert_eq!(grammar.complete("app a1 x a2 "), strings(&["^", "x", "y"]));
}

#[test]
fn test_several_roots_keep_last_good_context() {
    let tree = alpha_beta();
    let grammar = Grammar::new(&tree).with_reserved(ReservedTokens::none());
    let out = grammar.complete("app beta zzz ");
    assert!(out.contains(&"gamma".to_string()), "{out:?}");
    assert!(out.contains(&"--level".to_string()), "{out:?}");
}

#[test]
fn test_pending_free_form_flags_still_offer_flags() {
    let tree = tree_of(vec![
        CommandBuilder::new("app")
            .with_field(FieldDescriptor::flag("name", ValueType::String))
            .with_field(FieldDescriptor::flag("files", ValueType::List(Box::new(ValueType::String))))
            .with_field(FieldDescriptor::flag("quiet", ValueType::Bool))
            .with_subcommand(CommandBuilder::new("run")),
    ]);
    let grammar = Grammar::new(&tree).with_reserved(ReservedTokens::none());
    let flags = strings(&["--name", "--files", "--quiet"]);
    assert_eq!(grammar.complete("app --name "), flags);
    assert_eq!(grammar.complete("app --files a b "), flags);
    assert_eq!(grammar.complete("app --files a b --q"), strings(&["--quiet"]));
}
