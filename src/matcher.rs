//! Algorithm D: one pre-order pass over the subject, driving the automaton.
//!
//! Every edge of the subject is crossed exactly once, as an `Index` symbol
//! followed by the child's `Label`, mirroring the way a pattern path
//! alternates. After visiting a node the automaton state is the longest
//! suffix of the root-to-here walk that is a prefix of some path. Each path
//! the state reports is credited to the subject node its match is rooted at,
//! and a node whose credits reach the pattern's path count is matched.
use crate::{Automaton, Error, NodeId, Result, StateId, Subject, Symbol, Tree};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, trace};

/// How many of the pattern's paths a subject node satisfies.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MatchRecord {
    pub count: usize,
    pub matched: bool,
}

/// Side-table of [`MatchRecord`]s, one per subject node.
///
/// A table is created zeroed for each traversal and is never shared between
/// traversals, so the subject itself stays untouched.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Matches {
    records: Vec<MatchRecord>,
    required: usize,
}

impl Matches {
    fn new(len: usize, required: usize) -> Self {
        Self {
            records: vec![MatchRecord::default(); len],
            required,
        }
    }

    fn credit(&mut self, id: NodeId) {
        let record = &mut self.records[id.index()];
        record.count += 1;
        if record.count == self.required {
            record.matched = true;
        }
    }

    pub fn record(&self, id: NodeId) -> MatchRecord {
        self.records[id.index()]
    }

    pub fn is_matched(&self, id: NodeId) -> bool {
        self.records[id.index()].matched
    }

    /// Matched nodes in pre-order.
    pub fn matched(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.records
            .iter()
            .enumerate()
            .filter(|(_, record)| record.matched)
            .map(|(index, _)| NodeId::new(index))
    }

    pub fn matched_count(&self) -> usize {
        self.records.iter().filter(|record| record.matched).count()
    }

    /// The pattern's path count: the credits a node needs to match.
    pub fn required(&self) -> usize {
        self.required
    }
}

/// A subject together with the match annotations of one traversal.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AnnotatedTree {
    pub subject: Subject,
    pub matches: Matches,
}

impl AnnotatedTree {
    pub fn is_matched(&self, id: NodeId) -> bool {
        self.matches.is_matched(id)
    }

    pub fn root_matched(&self) -> bool {
        self.matches.is_matched(Subject::ROOT)
    }

    /// The matched nodes' subtrees, in pre-order.
    pub fn matched_subtrees(&self) -> Vec<Tree> {
        self.matches
            .matched()
            .map(|id| self.subject.subtree(id))
            .collect()
    }
}

/// Match `subject` against the automaton. Fails with
/// [`Error::InvalidSubject`] if the subject is not fully concrete.
pub fn match_tree(automaton: &Automaton, subject: &Tree) -> Result<AnnotatedTree> {
    let subject = Subject::new(subject)?;
    let matches = find_matches(automaton, &subject);
    Ok(AnnotatedTree { subject, matches })
}

/// Run Algorithm D over an already flattened subject.
pub fn find_matches(automaton: &Automaton, subject: &Subject) -> Matches {
    Traversal::new(automaton, subject).run()
}

/// Like [`find_matches`], but checks `cancel` once per stack frame and gives
/// up with [`Error::Cancelled`] as soon as it is set.
pub fn find_matches_until(
    automaton: &Automaton,
    subject: &Subject,
    cancel: &AtomicBool,
) -> Result<Matches> {
    let mut traversal = Traversal::new(automaton, subject);
    loop {
        if cancel.load(Ordering::Relaxed) {
            debug!(
                "Traversal cancelled with {} frames on the stack",
                traversal.stack.len()
            );
            return Err(Error::Cancelled);
        }
        if !traversal.step() {
            return Ok(traversal.into_matches());
        }
    }
}

/// A pre-order stack entry.
#[derive(Clone, Copy, Debug)]
struct Frame {
    node: NodeId,
    state: StateId,
    /// Index of the next child to descend into.
    next_child: usize,
}

/// An in-progress Algorithm D run that can be advanced one frame at a time.
pub struct Traversal<'a> {
    automaton: &'a Automaton,
    subject: &'a Subject,
    stack: Vec<Frame>,
    matches: Matches,
}

impl<'a> Traversal<'a> {
    /// Start a traversal by transitioning on the subject root's label.
    pub fn new(automaton: &'a Automaton, subject: &'a Subject) -> Self {
        let mut traversal = Traversal {
            automaton,
            subject,
            stack: Vec::new(),
            matches: Matches::new(subject.len(), automaton.path_count()),
        };

        let state = automaton.goto(Automaton::ROOT, &Symbol::label(subject.root().label()));
        traversal.stack.push(Frame {
            node: Subject::ROOT,
            state,
            next_child: 0,
        });
        traversal.tabulate(state);
        traversal
    }

    /// Process the frame on top of the stack: either pop it, if all of its
    /// children have been visited, or descend into the next child. Returns
    /// `false` once the stack is empty.
    pub fn step(&mut self) -> bool {
        let Some(top) = self.stack.last_mut() else {
            return false;
        };

        let node = self.subject.node(top.node);
        let Some(&child) = node.children().get(top.next_child) else {
            // Done with this subtree
            self.stack.pop();
            return !self.stack.is_empty();
        };

        let index = top.next_child;
        top.next_child += 1;
        let state = top.state;

        let intermediate = self.automaton.goto(state, &Symbol::Index(index));
        self.tabulate(intermediate);

        let label = Symbol::label(self.subject.node(child).label());
        let next = self.automaton.goto(intermediate, &label);
        self.stack.push(Frame {
            node: child,
            state: next,
            next_child: 0,
        });
        self.tabulate(next);

        true
    }

    pub fn is_finished(&self) -> bool {
        self.stack.is_empty()
    }

    /// Drive the traversal to the end.
    pub fn run(mut self) -> Matches {
        while self.step() {}
        self.into_matches()
    }

    pub fn into_matches(self) -> Matches {
        debug!(
            "Traversal visited {} nodes, {} matched",
            self.matches.records.len(),
            self.matches.matched_count()
        );
        self.matches
    }

    /// Credit every path reported by `state`. A path with `k` labels was
    /// matched by the walk starting `k` frames from the top of the stack, so
    /// that is the node whose subtree it certifies.
    fn tabulate(&mut self, state: StateId) {
        let automaton = self.automaton;
        for path in automaton.outputs(state) {
            let Some(node) = self
                .stack
                .len()
                .checked_sub(path.depth())
                .and_then(|index| self.stack.get(index))
                .map(|frame| frame.node)
            else {
                continue;
            };
            trace!("Path {} satisfied at {}", path, node);
            self.matches.credit(node);
        }
    }
}
