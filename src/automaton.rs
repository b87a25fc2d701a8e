//! A generalized Aho-Corasick automaton over [`Symbol`]s.
//!
//! The trie is stored as an arena of nodes addressed by [`StateId`]. Once
//! built, the automaton is immutable and can be shared between any number of
//! concurrent traversals.
use crate::{paths::root_to_leaf_paths, Path, Result, Symbol, Tree};
use std::collections::{HashMap, VecDeque};
use tracing::debug;

pub type StateId = usize;

/// Index of a path in [`Automaton::paths`].
pub type PathId = usize;

/// A node of the trie, plus the links that make it an automaton.
#[derive(Debug, Clone)]
struct TrieNode {
    arrows: HashMap<Symbol, StateId>,
    parent: Option<StateId>,
    suffix: StateId,
    output: Option<StateId>,
    /// Paths that end exactly here. A node can be terminal for a short path
    /// and still be an internal prefix of a longer one.
    terminal: Vec<PathId>,
}

impl TrieNode {
    fn new(parent: Option<StateId>) -> Self {
        Self {
            arrows: HashMap::new(),
            parent,
            suffix: Automaton::ROOT,
            output: None,
            terminal: Vec::new(),
        }
    }

    fn is_terminal(&self) -> bool {
        !self.terminal.is_empty()
    }
}

/// Collects paths into a bare trie. The suffix and output links are only
/// computed by [`AutomatonBuilder::build`], so a half-linked trie is never
/// observable.
#[derive(Debug, Clone)]
pub struct AutomatonBuilder {
    nodes: Vec<TrieNode>,
    paths: Vec<Path>,
}

impl Default for AutomatonBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl AutomatonBuilder {
    pub fn new() -> Self {
        Self {
            nodes: vec![TrieNode::new(None)],
            paths: Vec::new(),
        }
    }

    /// Insert a path into the trie, creating nodes as needed.
    pub fn add(&mut self, path: Path) -> &mut Self {
        let path_id = self.paths.len();

        let mut current = Automaton::ROOT;
        for symbol in path.symbols() {
            current = match self.nodes[current].arrows.get(symbol) {
                Some(&next) => next,
                None => {
                    let next = self.nodes.len();
                    self.nodes.push(TrieNode::new(Some(current)));
                    self.nodes[current].arrows.insert(symbol.clone(), next);
                    next
                }
            };
        }

        self.nodes[current].terminal.push(path_id);
        self.paths.push(path);
        self
    }

    pub fn build(mut self) -> Automaton {
        self.compute_links();
        let automaton = Automaton {
            nodes: self.nodes,
            paths: self.paths,
        };
        debug!(
            "Built automaton with {} states for {} paths",
            automaton.state_count(),
            automaton.path_count()
        );
        automaton
    }

    /// Resolve suffix and output links breadth first, so that a node's
    /// parent (and everything shallower) is always linked before the node.
    fn compute_links(&mut self) {
        let mut queue: VecDeque<(Symbol, StateId)> = VecDeque::new();

        // The root is its own suffix, and so is every child of the root
        let root_children: Vec<StateId> =
            self.nodes[Automaton::ROOT].arrows.values().copied().collect();
        for child in root_children {
            self.nodes[child].suffix = Automaton::ROOT;
            self.nodes[child].output = None;
            self.enqueue_children(child, &mut queue);
        }

        while let Some((symbol, current)) = queue.pop_front() {
            let Some(parent) = self.nodes[current].parent else {
                continue;
            };

            // Chase the parent's suffix chain until something continues on
            // the same symbol, settling for the root if nothing does.
            let mut candidate = self.nodes[parent].suffix;
            let suffix = loop {
                if let Some(&next) = self.nodes[candidate].arrows.get(&symbol) {
                    break next;
                }
                if candidate == Automaton::ROOT {
                    break Automaton::ROOT;
                }
                candidate = self.nodes[candidate].suffix;
            };

            self.nodes[current].suffix = suffix;
            self.nodes[current].output = if self.nodes[suffix].is_terminal() {
                Some(suffix)
            } else {
                self.nodes[suffix].output
            };

            self.enqueue_children(current, &mut queue);
        }
    }

    fn enqueue_children(&self, state: StateId, queue: &mut VecDeque<(Symbol, StateId)>) {
        queue.extend(
            self.nodes[state]
                .arrows
                .iter()
                .map(|(symbol, &child)| (symbol.clone(), child)),
        );
    }
}

/// The trie of a pattern's paths together with its suffix and output links.
#[derive(Debug, Clone)]
pub struct Automaton {
    nodes: Vec<TrieNode>,
    paths: Vec<Path>,
}

impl Automaton {
    pub const ROOT: StateId = 0;

    /// Build the automaton recognising every root-to-leaf path of `pattern`.
    /// Fails with [`crate::Error::InvalidPattern`] if the root is a wildcard.
    pub fn build(pattern: &Tree) -> Result<Self> {
        let mut builder = AutomatonBuilder::new();
        for path in root_to_leaf_paths(pattern)? {
            builder.add(path);
        }
        Ok(builder.build())
    }

    pub fn from_paths(paths: impl IntoIterator<Item = Path>) -> Self {
        let mut builder = AutomatonBuilder::new();
        for path in paths {
            builder.add(path);
        }
        builder.build()
    }

    /// Follow `symbol` out of `state`, falling back along suffix links when
    /// there is no direct arrow. The root never fails: without an arrow on
    /// `symbol` it transitions to itself.
    pub fn goto(&self, state: StateId, symbol: &Symbol) -> StateId {
        let mut state = state;
        loop {
            if let Some(&next) = self.nodes[state].arrows.get(symbol) {
                return next;
            }
            if state == Self::ROOT {
                return Self::ROOT;
            }
            state = self.nodes[state].suffix;
        }
    }

    /// Every path that ends at `state`: its own, then those reached through
    /// the chain of output links.
    pub fn outputs(&self, state: StateId) -> Outputs<'_> {
        Outputs {
            automaton: self,
            next_state: Some(state),
            pending: (&[] as &[PathId]).iter(),
        }
    }

    pub fn suffix(&self, state: StateId) -> StateId {
        self.nodes[state].suffix
    }

    pub fn output_link(&self, state: StateId) -> Option<StateId> {
        self.nodes[state].output
    }

    pub fn is_terminal(&self, state: StateId) -> bool {
        self.nodes[state].is_terminal()
    }

    pub fn paths(&self) -> &[Path] {
        &self.paths
    }

    /// How many paths a subject node has to satisfy to match.
    pub fn path_count(&self) -> usize {
        self.paths.len()
    }

    pub fn state_count(&self) -> usize {
        self.nodes.len()
    }
}

pub struct Outputs<'a> {
    automaton: &'a Automaton,
    next_state: Option<StateId>,
    pending: std::slice::Iter<'a, PathId>,
}

impl<'a> Iterator for Outputs<'a> {
    type Item = &'a Path;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(&path_id) = self.pending.next() {
                return Some(&self.automaton.paths[path_id]);
            }
            let node = &self.automaton.nodes[self.next_state?];
            self.pending = node.terminal.iter();
            self.next_state = node.output;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{tree, Error};

    fn walk(automaton: &Automaton, symbols: &[Symbol]) -> StateId {
        symbols
            .iter()
            .fold(Automaton::ROOT, |state, symbol| automaton.goto(state, symbol))
    }

    fn spelled_outputs(automaton: &Automaton, state: StateId) -> Vec<String> {
        let mut outputs: Vec<_> = automaton.outputs(state).map(Path::to_string).collect();
        outputs.sort();
        outputs
    }

    #[test]
    fn test_trie_shares_prefixes() {
        // a 0 b, a 1 c -> root, a, a0, a0b, a1, a1c
        let automaton = Automaton::build(&tree!["a"; "b"; "c"]).unwrap();
        assert_eq!(automaton.state_count(), 6);
        assert_eq!(automaton.path_count(), 2);
    }

    #[test]
    fn test_root_never_fails() {
        let automaton = Automaton::build(&tree!["a"; "b"]).unwrap();
        assert_eq!(automaton.goto(Automaton::ROOT, &Symbol::label("zzz")), Automaton::ROOT);
        assert_eq!(automaton.goto(Automaton::ROOT, &Symbol::Index(3)), Automaton::ROOT);
        assert_eq!(automaton.suffix(Automaton::ROOT), Automaton::ROOT);
    }

    #[test]
    fn test_suffix_links_recover_without_backtracking() {
        // Single path a 0 a 0 b: after reading "a 0 a 0", an "a" where "b"
        // was expected has to resume from "a 0 a" rather than the root.
        let automaton = Automaton::build(&tree!["a"; #["a"; "b"]]).unwrap();
        let a0a = walk(&automaton, &[Symbol::label("a"), Symbol::Index(0), Symbol::label("a")]);
        let a = walk(&automaton, &[Symbol::label("a")]);
        assert_eq!(automaton.suffix(a0a), a);

        let restarted = automaton.goto(a0a, &Symbol::Index(0));
        let state = automaton.goto(restarted, &Symbol::label("a"));
        assert_eq!(state, a0a);
    }

    #[test]
    fn test_outputs_follow_output_links() {
        // Paths "b" and "a 0 b": reaching "a 0 b" reports both, because the
        // bare leaf pattern "b" is a suffix of it.
        let automaton = Automaton::from_paths(
            root_to_leaf_paths(&tree!["a"; "b"])
                .unwrap()
                .into_iter()
                .chain(root_to_leaf_paths(&tree!["b"]).unwrap()),
        );
        let state = walk(
            &automaton,
            &[Symbol::label("a"), Symbol::Index(0), Symbol::label("b")],
        );
        assert!(automaton.is_terminal(state));
        assert_eq!(spelled_outputs(&automaton, state), ["a 0 b", "b"]);
        assert!(automaton.output_link(state).is_some());
    }

    #[test]
    fn test_terminal_and_internal_on_same_node() {
        // "a" is terminal for the leaf pattern "a" and a prefix of "a 0 b"
        let automaton = Automaton::from_paths(
            root_to_leaf_paths(&tree!["a"])
                .unwrap()
                .into_iter()
                .chain(root_to_leaf_paths(&tree!["a"; "b"]).unwrap()),
        );
        let a = automaton.goto(Automaton::ROOT, &Symbol::label("a"));
        assert_eq!(spelled_outputs(&automaton, a), ["a"]);
        assert_ne!(automaton.goto(a, &Symbol::Index(0)), Automaton::ROOT);
    }

    #[test]
    fn test_non_terminal_state_has_no_outputs() {
        let automaton = Automaton::build(&tree!["a"; "b"; "c"]).unwrap();
        let a = automaton.goto(Automaton::ROOT, &Symbol::label("a"));
        assert_eq!(automaton.outputs(a).count(), 0);
        assert_eq!(automaton.outputs(Automaton::ROOT).count(), 0);
    }

    #[test]
    fn test_wildcard_root_is_invalid_pattern() {
        assert_eq!(Automaton::build(&tree![_]).err(), Some(Error::InvalidPattern));
    }
}
