//! Shell completion script templates.
//!
//! Each script forwards the line up to the cursor to `grammar complete` and
//! offers one candidate per output line.

use clap::ValueEnum;

/// Supported shells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
}

const BASH: &str = r#"# bash completion for @BIN@
_@FN@_complete() {
    local IFS=$'\n'
    COMPREPLY=( $(@EXE@ --quiet complete --tree @TREE@ -- "${COMP_LINE:0:$COMP_POINT}" 2>/dev/null) )
}
complete -o default -F _@FN@_complete @BIN@
"#;

const ZSH: &str = r#"#compdef @BIN@

_@FN@() {
    local -a suggestions
    suggestions=("${(@f)$(@EXE@ --quiet complete --tree @TREE@ -- "${BUFFER[1,CURSOR]}" 2>/dev/null)}")
    compadd -- "${suggestions[@]}"
}

compdef _@FN@ @BIN@
"#;

const FISH: &str = r#"# fish completion for @BIN@
function __@FN@_complete
    @EXE@ --quiet complete --tree @TREE@ -- (commandline -cp) 2>/dev/null
end
complete -c @BIN@ -f -a '(__@FN@_complete)'
"#;

/// Single-quotes `text` for POSIX shells and fish.
pub fn shell_quote(text: &str) -> String {
    format!("'{}'", text.replace('\'', r"'\''"))
}

fn function_name(bin: &str) -> String {
    bin.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

/// Renders the completion script for `bin`.
///
/// `exe` is the `grammar` executable the script calls and `tree` the
/// definition file it passes along.
pub fn render(shell: Shell, bin: &str, exe: &str, tree: &str) -> String {
    let template = match shell {
        Shell::Bash => BASH,
        Shell::Zsh => ZSH,
        Shell::Fish => FISH,
    };
    template
        .replace("@FN@", &function_name(bin))
        .replace("@BIN@", bin)
        .replace("@EXE@", &shell_quote(exe))
        .replace("@TREE@", &shell_quote(tree))
}
