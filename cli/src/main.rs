use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use command_grammar_core::{CommandTree, TreeDefinition};
use command_grammar_engine::{Grammar, Invocation};
use tracing::debug;

mod scripts;

use scripts::Shell;

/// Output format for parsed invocations.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum CliOutputFormat {
    Json,
    Yaml,
}

#[derive(Debug, Parser)]
#[command(name = "grammar")]
#[command(about = "Parse and complete command lines against a declarative command tree")]
#[command(version)]
struct Cli {
    /// Log parser decisions to stderr.
    #[arg(long, global = true)]
    verbose: bool,
    /// Only log errors.
    #[arg(long, global = true, conflicts_with = "verbose")]
    quiet: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Parse an argument vector and print the resulting invocations.
    Parse(ParseArgs),
    /// Print completion candidates for a command line, one per line.
    Complete(CompleteArgs),
    /// Check that a definition file describes a valid command tree.
    Validate(ValidateArgs),
    /// Print a shell completion script.
    Script(ScriptArgs),
}

#[derive(Debug, Args)]
struct ParseArgs {
    /// Command tree definition (JSON or YAML).
    #[arg(long)]
    tree: PathBuf,
    /// Output format.
    #[arg(long, value_enum, default_value = "json")]
    format: CliOutputFormat,
    /// Arguments as the program would receive them (use `--` before them).
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
}

#[derive(Debug, Args)]
struct CompleteArgs {
    /// Command tree definition (JSON or YAML).
    #[arg(long)]
    tree: PathBuf,
    /// Command line up to the cursor, program name included.
    #[arg(allow_hyphen_values = true)]
    line: String,
}

#[derive(Debug, Args)]
struct ValidateArgs {
    /// Command tree definition (JSON or YAML).
    #[arg(long)]
    tree: PathBuf,
}

#[derive(Debug, Args)]
struct ScriptArgs {
    /// Target shell.
    #[arg(value_enum)]
    shell: Shell,
    /// Command tree definition passed to `grammar complete`.
    #[arg(long)]
    tree: PathBuf,
    /// Program to complete; defaults to the definition's name.
    #[arg(long)]
    bin: Option<String>,
    /// Path of the `grammar` executable the script calls.
    #[arg(long, default_value = "grammar")]
    exe: String,
}

fn main() {
    let cli = Cli::parse();
    configure_logging(cli.verbose, cli.quiet);

    let result = match cli.command {
        Command::Parse(args) => run_parse(args),
        Command::Complete(args) => run_complete(args),
        Command::Validate(args) => run_validate(args),
        Command::Script(args) => run_script(args),
    };

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

/// Logs go to stderr so completion output on stdout stays clean.
fn configure_logging(verbose: bool, quiet: bool) {
    use tracing::Level;
    use tracing_subscriber::EnvFilter;

    let filter = if quiet {
        EnvFilter::new(Level::ERROR.to_string())
    } else if verbose {
        EnvFilter::new(Level::DEBUG.to_string())
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(Level::WARN.to_string()))
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn load_tree(path: &Path) -> Result<(TreeDefinition, CommandTree), String> {
    let definition = TreeDefinition::load(path)
        .map_err(|err| format!("Failed to load '{}': {err}", path.display()))?;
    let tree = definition
        .build()
        .map_err(|err| format!("Invalid definition '{}': {err}", path.display()))?;
    debug!(
        path = %path.display(),
        roots = tree.roots().len(),
        nodes = tree.len(),
        "loaded command tree"
    );
    Ok((definition, tree))
}

fn render_invocations(invocations: &[Invocation], format: CliOutputFormat) -> Result<String, String> {
    match format {
        CliOutputFormat::Json => serde_json::to_string_pretty(invocations)
            .map_err(|err| format!("Failed to serialize invocations: {err}")),
        CliOutputFormat::Yaml => serde_yaml::to_string(invocations)
            .map_err(|err| format!("Failed to serialize invocations: {err}")),
    }
}

fn run_parse(args: ParseArgs) -> Result<(), String> {
    let (definition, tree) = load_tree(&args.tree)?;
    let grammar = Grammar::new(&tree).with_reserved(definition.reserved);

    let invocations = grammar
        .parse_process_args(&args.args)
        .map_err(|err| err.to_string())?;
    println!("{}", render_invocations(&invocations, args.format)?);
    Ok(())
}

fn run_complete(args: CompleteArgs) -> Result<(), String> {
    let (definition, tree) = load_tree(&args.tree)?;
    let grammar = Grammar::new(&tree).with_reserved(definition.reserved);

    let suggestions = grammar.complete(&args.line);
    debug!(line = %args.line, count = suggestions.len(), "completed line");
    for suggestion in suggestions {
        println!("{suggestion}");
    }
    Ok(())
}

fn run_validate(args: ValidateArgs) -> Result<(), String> {
    let (_, tree) = load_tree(&args.tree)?;
    println!(
        "Validated {} root command(s), {} command(s) in total, from '{}'.",
        tree.roots().len(),
        tree.len(),
        args.tree.display()
    );
    Ok(())
}

fn run_script(args: ScriptArgs) -> Result<(), String> {
    let (definition, _) = load_tree(&args.tree)?;
    let bin = args
        .bin
        .or(definition.name)
        .ok_or_else(|| "Specify --bin or set `name` in the definition".to_string())?;

    let tree_path = args.tree.canonicalize().unwrap_or(args.tree);
    print!(
        "{}",
        scripts::render(args.shell, &bin, &args.exe, &tree_path.display().to_string())
    );
    Ok(())
}
