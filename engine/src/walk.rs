//! Chain walker shared by parsing and completion.
//!
//! Drives [`parse_node`] across subcommand hand-offs and resolves leftover
//! tokens: the reset operator returns to root selection, a sibling of the
//! current command (explicit dispatch only) or a root name starts a new
//! invocation, and with a single root the leftover runs that root again.
//! Completed invocations are collected in order.

use command_grammar_core::{CommandInstance, CommandTree, NodeId};
use serde::Serialize;
use tracing::debug;

use crate::error::{GrammarError, Result};
use crate::parser::{Dispatch, NodeRequest, Step, Strictness, Tail, check_enums, parse_node};

/// One fully resolved command chain, root first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Invocation {
    /// Command names from root to terminal.
    pub path: Vec<String>,
    /// Bound values per command, aligned with `path`.
    pub chain: Vec<CommandInstance>,
}

impl Invocation {
    /// Instance of the terminal command.
    pub fn command(&self) -> Option<&CommandInstance> {
        self.chain.last()
    }

    /// Instance of the command named `name` in this chain.
    pub fn instance(&self, name: &str) -> Option<&CommandInstance> {
        self.chain.iter().find(|instance| instance.command == name)
    }

    /// `root sub leaf` form of the path.
    pub fn display_path(&self) -> String {
        self.path.join(" ")
    }
}

/// Result of choosing a root for an argument list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum RootSelection {
    Selected {
        root: NodeId,
        dispatch: Dispatch,
        rest: Vec<String>,
    },
    /// Several roots and no tokens to pick one with.
    Empty,
    /// Several roots and the first token names none of them.
    Unknown(String),
}

/// Picks the root for `args`.
///
/// With a single root the leading token is consumed only if it spells the
/// root's name (ignoring case); otherwise the root is entered implicitly.
/// With several roots the first token must name one.
pub(crate) fn select_root(tree: &CommandTree, args: &[String]) -> RootSelection {
    if let [root] = tree.roots() {
        let (dispatch, rest) = enter_single_root(tree, *root, args);
        return RootSelection::Selected {
            root: *root,
            dispatch,
            rest,
        };
    }

    match args.split_first() {
        None => RootSelection::Empty,
        Some((first, rest)) => match tree.find_root(first) {
            Some(root) => RootSelection::Selected {
                root,
                dispatch: Dispatch::Explicit,
                rest: rest.to_vec(),
            },
            None => RootSelection::Unknown(first.clone()),
        },
    }
}

fn enter_single_root(tree: &CommandTree, root: NodeId, args: &[String]) -> (Dispatch, Vec<String>) {
    match args.split_first() {
        Some((first, rest)) if tree.node(root).name.eq_ignore_ascii_case(first) => {
            (Dispatch::Explicit, rest.to_vec())
        }
        _ => (Dispatch::Implicit, args.to_vec()),
    }
}

/// How a walk ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum WalkEnd {
    /// The active chain consumed every token.
    Resolved,
    /// Several roots and none chosen yet; carries the unmatched token, if any.
    AwaitingRoot(Option<String>),
    /// Lenient walk stopped at a token it could not place.
    Halted,
}

/// State left behind by a walk.
#[derive(Debug, Clone)]
pub(crate) struct Walk {
    pub invocations: Vec<Invocation>,
    pub chain: Vec<NodeId>,
    pub instances: Vec<CommandInstance>,
    pub dispatch: Dispatch,
    /// Tokens processed by the terminal node of the active chain.
    pub consumed: usize,
    pub positionals_complete: bool,
    pub tail: Tail,
    pub end: WalkEnd,
    position: usize,
}

impl Walk {
    fn new() -> Self {
        Self {
            invocations: Vec::new(),
            chain: Vec::new(),
            instances: Vec::new(),
            dispatch: Dispatch::Implicit,
            consumed: 0,
            positionals_complete: true,
            tail: Tail::default(),
            end: WalkEnd::Resolved,
            position: 0,
        }
    }

    /// Terminal command of the active chain.
    pub fn current(&self) -> Option<NodeId> {
        self.chain.last().copied()
    }

    /// No token has been placed below the root yet.
    pub fn at_root(&self) -> bool {
        self.chain.len() == 1 && self.consumed == 0
    }

    fn enter_root(&mut self, tree: &CommandTree, root: NodeId, dispatch: Dispatch) {
        debug!(root = %tree.node(root).name, ?dispatch, "entering root command");
        self.chain = vec![root];
        self.instances = vec![CommandInstance::new(root, &tree.node(root).name)];
        self.dispatch = dispatch;
        self.reset_node_state();
    }

    /// Naming a subcommand makes the rest of the chain explicit.
    fn descend(&mut self, tree: &CommandTree, node: NodeId) {
        self.dispatch = Dispatch::Explicit;
        self.chain.push(node);
        self.instances
            .push(CommandInstance::new(node, &tree.node(node).name));
        self.reset_node_state();
    }

    /// Replaces the terminal command with its sibling, keeping the ancestors'
    /// bound values.
    fn switch_to_sibling(&mut self, tree: &CommandTree, sibling: NodeId) {
        self.chain.pop();
        self.instances.pop();
        self.descend(tree, sibling);
    }

    fn reset_node_state(&mut self) {
        self.consumed = 0;
        self.positionals_complete = true;
        self.tail = Tail::default();
    }

    fn sibling(&self, tree: &CommandTree, name: &str) -> Option<NodeId> {
        if self.chain.len() < 2 {
            return None;
        }
        let parent = self.chain[self.chain.len() - 2];
        tree.subcommand(parent, name)
    }

    fn finish_invocation(&mut self, tree: &CommandTree) {
        let path = self
            .chain
            .iter()
            .map(|id| tree.node(*id).name.clone())
            .collect();
        self.invocations.push(Invocation {
            path,
            chain: self.instances.clone(),
        });
    }

    fn await_root(mut self, token: Option<String>) -> Self {
        self.chain.clear();
        self.instances.clear();
        self.reset_node_state();
        self.end = WalkEnd::AwaitingRoot(token);
        self
    }
}

/// Walks `args` through the tree.
///
/// Strict walks fail on the first [`GrammarError`] and validate enum sets
/// before an invocation is completed. Lenient walks tolerate a dangling
/// valued flag and stop quietly at a token they cannot place, leaving the
/// last state that placed tokens for completion.
///
/// With a single root, leftover tokens start another run of that root. A
/// rerun that places nothing ends the walk.
pub(crate) fn walk(
    tree: &CommandTree,
    args: &[String],
    reset: &str,
    strictness: Strictness,
) -> Result<Walk> {
    let strict = strictness == Strictness::Strict;
    let mut state = Walk::new();

    let mut args = match select_root(tree, args) {
        RootSelection::Selected {
            root,
            dispatch,
            rest,
        } => {
            state.enter_root(tree, root, dispatch);
            rest
        }
        RootSelection::Empty => return Ok(state.await_root(None)),
        RootSelection::Unknown(token) if strict => {
            return Err(GrammarError::UnknownCommand(token));
        }
        RootSelection::Unknown(token) => return Ok(state.await_root(Some(token))),
    };

    // state before the latest single-root rerun
    let mut rerun_from: Option<Walk> = None;

    loop {
        let request = NodeRequest {
            tree,
            chain: &state.chain,
            args: std::mem::take(&mut args),
            dispatch: state.dispatch,
            strictness,
            enforce_required: strict,
            position: state.position,
            reset,
        };
        let outcome = parse_node(request, &mut state.instances)?;
        let previous = rerun_from.take();
        state.consumed = outcome.consumed;
        state.positionals_complete = outcome.positionals_complete;
        state.tail = outcome.tail;
        state.position = outcome.position;

        let leftover = match outcome.step {
            Step::Descend { node, remaining } => {
                state.descend(tree, node);
                args = remaining;
                continue;
            }
            Step::Done => {
                if strict {
                    check_enums(tree, &state.chain, &state.instances)?;
                    state.finish_invocation(tree);
                }
                state.end = WalkEnd::Resolved;
                return Ok(state);
            }
            Step::Leftover(tokens) => tokens,
        };

        if strict {
            check_enums(tree, &state.chain, &state.instances)?;
        }

        let Some((first, rest)) = leftover.split_first() else {
            state.end = WalkEnd::Resolved;
            return Ok(state);
        };

        if first == reset {
            state.finish_invocation(tree);
            // a trailing reset starts nothing to run
            if strict && rest.is_empty() {
                state.end = WalkEnd::Resolved;
                return Ok(state);
            }
            state.position += 1;
            match select_root(tree, rest) {
                RootSelection::Selected {
                    root,
                    dispatch,
                    rest,
                } => {
                    state.enter_root(tree, root, dispatch);
                    args = rest;
                }
                RootSelection::Empty => return Ok(state.await_root(None)),
                RootSelection::Unknown(token) if strict => {
                    return Err(GrammarError::UnknownCommand(token));
                }
                RootSelection::Unknown(token) => return Ok(state.await_root(Some(token))),
            }
            continue;
        }

        if state.dispatch == Dispatch::Explicit {
            if let Some(sibling) = state.sibling(tree, first) {
                debug!(command = %first, "chaining sibling command");
                state.finish_invocation(tree);
                state.switch_to_sibling(tree, sibling);
                state.position += 1;
                args = rest.to_vec();
                continue;
            }
            if let Some(root) = tree.find_root(first) {
                debug!(command = %first, "chaining root command");
                state.finish_invocation(tree);
                state.enter_root(tree, root, Dispatch::Explicit);
                state.position += 1;
                args = rest.to_vec();
                continue;
            }
        }

        if let [root] = tree.roots() {
            if previous.is_none() || state.consumed > 0 {
                debug!(command = %first, "running single root again");
                rerun_from = Some(state.clone());
                state.finish_invocation(tree);
                let (dispatch, rest) = enter_single_root(tree, *root, &leftover);
                state.enter_root(tree, *root, dispatch);
                args = rest;
                continue;
            }
        }

        if strict {
            return Err(GrammarError::UnknownCommand(first.clone()));
        }
        debug!(token = %first, "stopping at unresolved token");
        if let Some(previous) = previous {
            state = previous;
        }
        state.end = WalkEnd::Halted;
        return Ok(state);
    }
}
