use crate::{Error, Result, Tree};
use std::fmt::{Display, Formatter, Result as FmtResult};

/// Stable identity of a subject node: its slot in the [`Subject`] arena.
/// Slots are handed out in pre-order, so the root is always `NodeId(0)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub(crate) fn new(index: usize) -> Self {
        NodeId(index)
    }

    pub fn index(self) -> usize {
        self.0
    }
}

impl Display for NodeId {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "#{}", self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubjectNode {
    label: String,
    children: Vec<NodeId>,
}

impl SubjectNode {
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// A subject tree flattened into an arena.
///
/// The arena is never mutated after construction. Match results live in a
/// separate side-table keyed by [`NodeId`], so one subject can be searched
/// for many patterns, concurrently if need be.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Subject {
    nodes: Vec<SubjectNode>,
}

impl Subject {
    pub const ROOT: NodeId = NodeId(0);

    /// Flatten `tree`, which must be fully concrete: a subject has no
    /// wildcards, least of all at the root.
    pub fn new(tree: &Tree) -> Result<Self> {
        if tree.is_wildcard() {
            return Err(Error::InvalidSubject(
                "the root must be a labelled node, not a wildcard",
            ));
        }

        let mut nodes: Vec<SubjectNode> = Vec::with_capacity(tree.size());
        let mut stack: Vec<(&Tree, Option<NodeId>)> = vec![(tree, None)];

        while let Some((subtree, parent)) = stack.pop() {
            let Tree::Node { label, children } = subtree else {
                return Err(Error::InvalidSubject("wildcards may only appear in patterns"));
            };

            let id = NodeId(nodes.len());
            nodes.push(SubjectNode {
                label: label.clone(),
                children: Vec::with_capacity(children.len()),
            });
            if let Some(parent) = parent {
                nodes[parent.0].children.push(id);
            }

            // Reversed, so the leftmost child is numbered first
            stack.extend(children.iter().rev().map(|child| (child, Some(id))));
        }

        Ok(Subject { nodes })
    }

    pub fn root(&self) -> &SubjectNode {
        &self.nodes[Self::ROOT.0]
    }

    pub fn node(&self, id: NodeId) -> &SubjectNode {
        &self.nodes[id.0]
    }

    pub fn get(&self, id: NodeId) -> Option<&SubjectNode> {
        self.nodes.get(id.0)
    }

    /// Get the number of nodes in the subject
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// A subject always holds at least its root.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Every node id, in pre-order.
    pub fn ids(&self) -> impl Iterator<Item = NodeId> {
        (0..self.nodes.len()).map(NodeId)
    }

    /// Rebuild the nested form of the subject.
    pub fn to_tree(&self) -> Tree {
        self.subtree(Self::ROOT)
    }

    /// Rebuild the nested form of the subtree rooted at `id`, bottom up.
    pub fn subtree(&self, id: NodeId) -> Tree {
        let mut order = Vec::new();
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            order.push(next);
            stack.extend(self.node(next).children.iter().rev());
        }

        // Walking the pre-order backwards leaves each node's finished
        // children on top of `built`, first child uppermost
        let mut built: Vec<Tree> = Vec::new();
        for &next in order[1..].iter().rev() {
            let node = self.node(next);
            let first = built.len() - node.children.len();
            let children: Vec<Tree> = built.drain(first..).rev().collect();
            built.push(Tree::node(&node.label, children));
        }
        Tree::node(&self.node(id).label, built.into_iter().rev())
    }
}

impl TryFrom<&Tree> for Subject {
    type Error = Error;

    fn try_from(tree: &Tree) -> Result<Self> {
        Subject::new(tree)
    }
}
