//! Grammar parser for a single command node.
//!
//! Consumes a token vector against the flags of the active chain and the
//! positionals and subcommands of its terminal node. Each token is
//! classified as the `--` terminator, the reset operator, a flag, a
//! positional, or a subcommand name, in that order. The parse ends in one of
//! three ways (see [`Step`]): every token consumed, a hand-off into a
//! subcommand, or leftover tokens the caller has to reinterpret.
//!
//! The same algorithm serves full parsing ([`Strictness::Strict`]) and
//! completion ([`Strictness::Lenient`]). Lenient mode only differs in two
//! places: a valued flag at the very end of the line is left pending instead
//! of failing, and an unmatched token in implicit dispatch is returned as a
//! leftover instead of an unknown-command error.

use command_grammar_core::{CommandInstance, CommandTree, NodeId, Value};
use tracing::{debug, trace};

use crate::bind;
use crate::collect::{ChainFlags, FlagSpec, PositionalSpec, collect_flags, collect_positionals};
use crate::error::{GrammarError, Result};

/// How the current root was entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// The single root was entered without the user naming it.
    Implicit,
    /// The user named the root command.
    Explicit,
}

/// Full parse or completion parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strictness {
    Strict,
    Lenient,
}

/// How a node parse ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Every token was consumed.
    Done,
    /// A subcommand name was found; parsing continues in `node` with `remaining`.
    Descend { node: NodeId, remaining: Vec<String> },
    /// Tokens starting at the first one this node could not place.
    Leftover(Vec<String>),
}

/// A valued flag at the end of the line still waiting for its value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingFlag {
    /// Chain index of the owning command.
    pub owner: usize,
    /// Field identifier.
    pub ident: String,
    /// Variadic flags stay pending while their run continues.
    pub variadic: bool,
    /// Allowed values of the flag, offered as completions.
    pub enum_values: Vec<String>,
    /// Values already collected by a variadic run.
    pub collected: usize,
}

/// Where the parse stopped inside the node's grammar.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Tail {
    /// Index of the positional slot the next token would fill.
    pub positional: usize,
    /// Flag awaiting a value when the tokens ran out (lenient only).
    pub pending: Option<PendingFlag>,
}

/// Outcome of parsing one node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeParse {
    pub step: Step,
    /// Every required positional is filled or has a default.
    pub positionals_complete: bool,
    pub tail: Tail,
    /// Tokens this node processed (after short-group expansion).
    pub consumed: usize,
    /// Argument position to continue numbering from.
    pub position: usize,
}

/// Input of a node parse.
#[derive(Debug, Clone)]
pub struct NodeRequest<'a> {
    pub tree: &'a CommandTree,
    /// Active chain, root first; the last entry is the node being parsed.
    pub chain: &'a [NodeId],
    pub args: Vec<String>,
    pub dispatch: Dispatch,
    pub strictness: Strictness,
    /// Enforce required positionals and flags if the parse is terminal.
    pub enforce_required: bool,
    /// Argument position of `args[0]`.
    pub position: usize,
    /// Root reset operator.
    pub reset: &'a str,
}

/// `-x`, `--xyz`, and `--` look like flags; a lone `-` does not.
pub fn looks_like_flag(token: &str) -> bool {
    token.starts_with('-') && token != "-"
}

fn split_inline(body: &str) -> (&str, Option<&str>) {
    match body.split_once('=') {
        Some((name, value)) => (name, Some(value)),
        None => (body, None),
    }
}

struct ParseContext<'a> {
    tree: &'a CommandTree,
    node: NodeId,
    terminal: usize,
    tokens: Vec<String>,
    cursor: usize,
    flags: ChainFlags,
    positionals: Vec<PositionalSpec>,
    filled: Vec<usize>,
    slot: usize,
    dispatch: Dispatch,
    lenient: bool,
    base: usize,
    reset: &'a str,
    pending: Option<PendingFlag>,
}

impl ParseContext<'_> {
    fn position_of(&self, index: usize) -> usize {
        self.base + index
    }

    fn is_value(&self, token: &str) -> bool {
        !looks_like_flag(token) && token != self.reset
    }

    fn run(&mut self, instances: &mut [CommandInstance]) -> Result<Step> {
        while self.cursor < self.tokens.len() {
            let token = self.tokens[self.cursor].clone();
            trace!(token = %token, cursor = self.cursor, "classifying token");

            if token == self.reset {
                return Ok(Step::Leftover(self.tokens[self.cursor..].to_vec()));
            }

            if token == "--" {
                if self.positionals.get(self.slot).is_some_and(|p| p.variadic) {
                    self.slot += 1;
                }
                self.cursor += 1;
                continue;
            }

            if looks_like_flag(&token) {
                self.flag(instances)?;
                continue;
            }

            if self.slot < self.positionals.len() {
                self.positional(&token, instances)?;
                self.cursor += 1;
                continue;
            }

            if let Some(child) = self.tree.subcommand(self.node, &token) {
                debug!(subcommand = %token, "descending into subcommand");
                return Ok(Step::Descend {
                    node: child,
                    remaining: self.tokens[self.cursor + 1..].to_vec(),
                });
            }

            if self.dispatch == Dispatch::Implicit && !self.lenient {
                return Err(GrammarError::UnknownCommand(token));
            }
            debug!(token = %token, "returning leftover tokens");
            return Ok(Step::Leftover(self.tokens[self.cursor..].to_vec()));
        }
        Ok(Step::Done)
    }

    fn positional(&mut self, token: &str, instances: &mut [CommandInstance]) -> Result<()> {
        let spec = &self.positionals[self.slot];
        let position = self.position_of(self.cursor);
        bind::assign(&mut instances[self.terminal], &spec.target(), token, position)?;
        self.filled[self.slot] += 1;
        if !spec.variadic {
            self.slot += 1;
        }
        Ok(())
    }

    fn flag(&mut self, instances: &mut [CommandInstance]) -> Result<()> {
        let token = self.tokens[self.cursor].clone();

        if let Some(body) = token.strip_prefix("--") {
            let (name, inline) = split_inline(body);
            let spec = self
                .flags
                .by_long(name)
                .cloned()
                .ok_or_else(|| GrammarError::FlagNotDefined(format!("--{name}")))?;
            return self.apply(&spec, inline, instances);
        }

        let body = &token[1..];
        let (letters, inline) = split_inline(body);
        let chars: Vec<char> = letters.chars().collect();
        match chars.as_slice() {
            [] => Err(GrammarError::FlagNotDefined(token.clone())),
            [letter] => {
                let spec = self
                    .flags
                    .by_short(*letter)
                    .cloned()
                    .ok_or_else(|| GrammarError::FlagNotDefined(format!("-{letter}")))?;
                self.apply(&spec, inline, instances)
            }
            group => {
                let expanded = self.expand_group(&token, group, inline)?;
                trace!(group = %token, ?expanded, "expanded short flag group");
                let rest = self.tokens.split_off(self.cursor + 1);
                self.tokens.truncate(self.cursor);
                self.tokens.extend(expanded);
                self.tokens.extend(rest);
                Ok(())
            }
        }
    }

    /// `-abc` becomes `-a -b -c`; only the last letter may take a value.
    fn expand_group(&self, token: &str, letters: &[char], inline: Option<&str>) -> Result<Vec<String>> {
        let last = letters.len() - 1;
        let mut expanded = Vec::with_capacity(letters.len());

        for (i, letter) in letters.iter().enumerate() {
            let spec = self
                .flags
                .by_short(*letter)
                .ok_or_else(|| GrammarError::FlagNotDefined(format!("-{letter}")))?;
            if i < last && spec.takes_value {
                return Err(GrammarError::ShortFlagGroupNotBool {
                    group: token.to_string(),
                    letter: *letter,
                });
            }
            match inline {
                Some(value) if i == last => expanded.push(format!("-{letter}={value}")),
                _ => expanded.push(format!("-{letter}")),
            }
        }
        Ok(expanded)
    }

    fn bind_flag(
        &self,
        spec: &FlagSpec,
        raw: &str,
        index: usize,
        instances: &mut [CommandInstance],
    ) -> Result<()> {
        let name = spec.display_name();
        bind::assign(
            &mut instances[spec.owner],
            &spec.target(&name),
            raw,
            self.position_of(index),
        )
    }

    fn pend(&mut self, spec: &FlagSpec, collected: usize) {
        self.pending = Some(PendingFlag {
            owner: spec.owner,
            ident: spec.ident.clone(),
            variadic: spec.variadic,
            enum_values: spec.enum_values.clone(),
            collected,
        });
    }

    fn apply(
        &mut self,
        spec: &FlagSpec,
        inline: Option<&str>,
        instances: &mut [CommandInstance],
    ) -> Result<()> {
        let index = self.cursor;

        if let Some(raw) = inline {
            self.bind_flag(spec, raw, index, instances)?;
            self.cursor += 1;
            return Ok(());
        }

        if !spec.takes_value {
            self.bind_flag(spec, "true", index, instances)?;
            self.cursor += 1;
            return Ok(());
        }

        if spec.variadic {
            let mut next = index + 1;
            let mut collected = 0;
            while next < self.tokens.len() && self.is_value(&self.tokens[next]) {
                let raw = self.tokens[next].clone();
                self.bind_flag(spec, &raw, next, instances)?;
                next += 1;
                collected += 1;
            }

            let exhausted = next >= self.tokens.len();
            if collected == 0 && !(self.lenient && exhausted) {
                return Err(GrammarError::FlagNeedsArgument(spec.display_name()));
            }
            if self.lenient && exhausted {
                self.pend(spec, collected);
            }
            self.cursor = next;
            return Ok(());
        }

        match self.tokens.get(index + 1).cloned() {
            None if self.lenient => {
                self.pend(spec, 0);
                self.cursor = index + 1;
                Ok(())
            }
            Some(raw) if self.is_value(&raw) => {
                self.bind_flag(spec, &raw, index + 1, instances)?;
                self.cursor = index + 2;
                Ok(())
            }
            _ => Err(GrammarError::FlagNeedsArgument(spec.display_name())),
        }
    }

    fn positionals_complete(&self) -> bool {
        self.positionals
            .iter()
            .zip(&self.filled)
            .all(|(spec, filled)| !spec.required || *filled > 0 || spec.default.is_some())
    }

    fn finalize(&mut self, instances: &mut [CommandInstance], enforce: bool) -> Result<bool> {
        for (spec, filled) in self.positionals.iter().zip(&self.filled) {
            if *filled == 0 {
                if let Some(default) = &spec.default {
                    bind::assign_default(&mut instances[self.terminal], &spec.target(), default)?;
                }
            }
        }

        if enforce {
            if let Some((spec, _)) = self
                .positionals
                .iter()
                .zip(&self.filled)
                .find(|(spec, filled)| spec.required && **filled == 0 && spec.default.is_none())
            {
                return Err(GrammarError::MissingRequiredPositional(spec.name.clone()));
            }

            if let Some(spec) = self
                .flags
                .specs
                .iter()
                .find(|spec| spec.required && instances[spec.owner].get(&spec.ident).is_none())
            {
                return Err(GrammarError::MissingRequiredFlag(spec.display_name()));
            }
        }

        Ok(self.positionals_complete())
    }
}

/// Parses `request.args` against the last node of `request.chain`.
///
/// `instances` must be aligned with the chain; values are bound into the
/// instance owning each flag. Defaults of the terminal node's flags are bound
/// before any token is read.
///
/// # Errors
///
/// Any [`GrammarError`] raised by spec collection, value binding, or token
/// classification. Required fields are only enforced when
/// `enforce_required` is set and the parse neither descends nor hands off.
pub fn parse_node(request: NodeRequest<'_>, instances: &mut [CommandInstance]) -> Result<NodeParse> {
    let terminal = request.chain.len() - 1;
    let node = request.chain[terminal];

    let flags = collect_flags(request.tree, request.chain, instances)?;
    let positionals = collect_positionals(request.tree, node, &instances[terminal])?;

    for spec in flags.specs.iter().filter(|spec| spec.owner == terminal) {
        if let Some(default) = &spec.default {
            if instances[terminal].get(&spec.ident).is_none() {
                let name = spec.display_name();
                bind::assign_default(&mut instances[terminal], &spec.target(&name), default)?;
            }
        }
    }

    let mut ctx = ParseContext {
        tree: request.tree,
        node,
        terminal,
        tokens: request.args,
        cursor: 0,
        filled: vec![0; positionals.len()],
        flags,
        positionals,
        slot: 0,
        dispatch: request.dispatch,
        lenient: request.strictness == Strictness::Lenient,
        base: request.position,
        reset: request.reset,
        pending: None,
    };

    let step = ctx.run(instances)?;
    let consumed = match &step {
        Step::Done => ctx.tokens.len(),
        Step::Descend { .. } | Step::Leftover(_) => ctx.cursor,
    };
    let position = match &step {
        Step::Descend { .. } => ctx.position_of(ctx.cursor + 1),
        _ => ctx.position_of(consumed),
    };

    let positionals_complete = match &step {
        Step::Descend { .. } => ctx.positionals_complete(),
        Step::Done | Step::Leftover(_) => ctx.finalize(instances, request.enforce_required)?,
    };

    Ok(NodeParse {
        step,
        positionals_complete,
        tail: Tail {
            positional: ctx.slot,
            pending: ctx.pending.take(),
        },
        consumed,
        position,
    })
}

fn rendered_values(value: &Value) -> Vec<String> {
    match value {
        Value::List(items) => items.iter().map(ToString::to_string).collect(),
        other => vec![other.to_string()],
    }
}

fn check_allowed(name: &str, allowed: &[String], value: Option<&Value>) -> Result<()> {
    if allowed.is_empty() {
        return Ok(());
    }
    let Some(value) = value else {
        return Ok(());
    };
    for rendered in rendered_values(value) {
        if !allowed.contains(&rendered) {
            return Err(GrammarError::ValueNotAllowed {
                name: name.to_string(),
                value: rendered,
                allowed: allowed.join("|"),
            });
        }
    }
    Ok(())
}

/// Checks every explicitly bound value of the chain against its enum set.
///
/// Specs are re-collected so override hooks see the populated instances.
pub fn check_enums(tree: &CommandTree, chain: &[NodeId], instances: &[CommandInstance]) -> Result<()> {
    let flags = collect_flags(tree, chain, instances)?;
    for spec in &flags.specs {
        let instance = &instances[spec.owner];
        if instance.is_explicit(&spec.ident) {
            check_allowed(&spec.display_name(), &spec.enum_values, instance.get(&spec.ident))?;
        }
    }

    let terminal = chain.len() - 1;
    let instance = &instances[terminal];
    for spec in collect_positionals(tree, chain[terminal], instance)? {
        if instance.is_explicit(&spec.ident) {
            check_allowed(&spec.name, &spec.enum_values, instance.get(&spec.ident))?;
        }
    }
    Ok(())
}
