use std::fmt::{Debug, Display, Formatter, Result as FmtResult};
use std::ops::Index;
use std::sync::Arc;

/// A labelled, ordered tree whose leaves may be wildcards.
///
/// Patterns and subjects share this representation. Children are kept behind
/// an `Arc` so cloning a tree is cheap, and only the path being modified is
/// copied on write.
#[derive(Clone, PartialEq, Eq, Hash)]
pub enum Tree {
    Node {
        label: String,
        children: Arc<Vec<Tree>>,
    },
    Wildcard,
}

impl Tree {
    pub fn node<I>(label: impl ToString, children: I) -> Self
    where
        I: IntoIterator<Item = Tree>,
    {
        Tree::Node {
            label: label.to_string(),
            children: Arc::new(children.into_iter().collect()),
        }
    }

    pub fn leaf(label: impl ToString) -> Self {
        Tree::Node {
            label: label.to_string(),
            children: Arc::new(Vec::new()),
        }
    }

    pub fn wildcard() -> Self {
        Tree::Wildcard
    }

    /*
     *
     * BEGIN TREE MANIPULATION METHODS
     *
     */

    /// Append a child. Wildcards cannot carry children, so this has no
    /// effect on one.
    pub fn add_child(&mut self, child: Tree) {
        if let Tree::Node { children, .. } = self {
            Arc::make_mut(children).push(child);
        }
    }

    pub fn add_children<I>(&mut self, children: I)
    where
        I: IntoIterator<Item = Tree>,
    {
        if let Tree::Node { children: mine, .. } = self {
            Arc::make_mut(mine).extend(children);
        }
    }

    pub fn with_children<I>(mut self, children: I) -> Self
    where
        I: IntoIterator<Item = Tree>,
    {
        self.add_children(children);
        self
    }

    /*
     *
     * BEGIN TREE INFORMATION METHODS
     *
     */

    /// The node's label, or `None` for a wildcard.
    pub fn label(&self) -> Option<&str> {
        match self {
            Tree::Node { label, .. } => Some(label),
            Tree::Wildcard => None,
        }
    }

    pub fn is_wildcard(&self) -> bool {
        matches!(self, Tree::Wildcard)
    }

    pub fn children(&self) -> impl Iterator<Item = &Tree> {
        self.child_slice().iter()
    }

    pub fn child(&self, index: usize) -> Option<&Tree> {
        self.child_slice().get(index)
    }

    fn child_slice(&self) -> &[Tree] {
        match self {
            Tree::Node { children, .. } => children,
            Tree::Wildcard => &[],
        }
    }

    /// Get the number of children of the tree node
    pub fn len(&self) -> usize {
        self.child_slice().len()
    }

    /// Check if the tree is a leaf node.
    /// Wildcards are always leaves.
    pub fn is_leaf(&self) -> bool {
        self.child_slice().is_empty()
    }

    /// Get the depth of the tree
    pub fn depth(&self) -> usize {
        1 + self.children().map(Tree::depth).max().unwrap_or(0)
    }

    /// Get the number of nodes in the tree, wildcards included
    pub fn size(&self) -> usize {
        self.iter().count()
    }

    pub fn contains_wildcard(&self) -> bool {
        self.iter().any(Tree::is_wildcard)
    }

    /// Iterate over every subtree in pre-order, children left to right.
    pub fn iter(&self) -> TreeIter<'_> {
        TreeIter::new(self)
    }
}

impl Debug for Tree {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        match self {
            Tree::Node { label, children } => f
                .debug_struct("Node")
                .field("label", label)
                .field("children", children)
                .finish(),
            Tree::Wildcard => write!(f, "Wildcard"),
        }
    }
}

/// Writes the tree back in the expression grammar, e.g. `a(b,_)`.
impl Display for Tree {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        match self {
            Tree::Wildcard => write!(f, "_"),
            Tree::Node { label, children } if children.is_empty() => write!(f, "{}", label),
            Tree::Node { label, children } => {
                write!(f, "{}(", label)?;
                for (i, child) in children.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{}", child)?;
                }
                write!(f, ")")
            }
        }
    }
}

impl From<&str> for Tree {
    fn from(label: &str) -> Self {
        Tree::leaf(label)
    }
}

impl From<String> for Tree {
    fn from(label: String) -> Self {
        Tree::leaf(label)
    }
}

impl Index<usize> for Tree {
    type Output = Tree;

    fn index(&self, index: usize) -> &Self::Output {
        &self.child_slice()[index]
    }
}

pub struct TreeIter<'a> {
    stack: Vec<&'a Tree>,
}

impl<'a> TreeIter<'a> {
    fn new(tree: &'a Tree) -> Self {
        TreeIter { stack: vec![tree] }
    }
}

impl<'a> Iterator for TreeIter<'a> {
    type Item = &'a Tree;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.child_slice().iter().rev());
        Some(node)
    }
}

#[macro_export]
macro_rules! tree {
    // --- Entry points ----------------------------------------------------

    // A bare wildcard
    (_) => {
        $crate::Tree::wildcard()
    };

    // A node with children: the label, then more tokens
    ($label:expr; $($rest:tt)*) => {{
        let mut t = $crate::Tree::from($label);
        $crate::tree!(@parse_children t, $($rest)*);
        t
    }};

    // A leaf node: just a label with no children
    ($label:expr) => {
        $crate::Tree::from($label)
    };

    // --- Internal rules for parsing children -----------------------------

    // No more children
    (@parse_children $tree:ident) => {};
    (@parse_children $tree:ident,) => {};

    // A nested child subtree: looks like #[ child_root ; child2 ; child3 ; ... ]
    (@parse_children $tree:ident, #[ $($subtree:tt)* ]; $($rest:tt)*) => {{
        $tree.add_child($crate::tree!($($subtree)*));
        $crate::tree!(@parse_children $tree, $($rest)*);
    }};
    // Same, but no trailing semicolon
    (@parse_children $tree:ident, #[ $($subtree:tt)* ]) => {{
        $tree.add_child($crate::tree!($($subtree)*));
    }};

    // A wildcard child
    (@parse_children $tree:ident, _; $($rest:tt)*) => {{
        $tree.add_child($crate::Tree::wildcard());
        $crate::tree!(@parse_children $tree, $($rest)*);
    }};
    (@parse_children $tree:ident, _) => {{
        $tree.add_child($crate::Tree::wildcard());
    }};

    // A single leaf child with trailing siblings
    (@parse_children $tree:ident, $child:expr; $($rest:tt)*) => {{
        $tree.add_child($crate::tree!($child));
        $crate::tree!(@parse_children $tree, $($rest)*);
    }};
    // A single leaf child without trailing siblings
    (@parse_children $tree:ident, $child:expr) => {{
        $tree.add_child($crate::tree!($child));
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tree_macro() {
        let tree = tree!["a"; "b"; "c"];
        assert_eq!(tree.to_string(), "a(b,c)");

        // Nested tree
        let tree = tree!["f"; "x"; #["y"; "z"]];
        assert_eq!(tree.to_string(), "f(x,y(z))");

        // Wildcards, both nested and as siblings
        let tree = tree!["a"; _; #["b"; _; "c"]; _];
        assert_eq!(tree.to_string(), "a(_,b(_,c),_)");

        assert_eq!(tree![_], Tree::Wildcard);
        assert_eq!(tree!["leaf"], Tree::leaf("leaf"));
    }

    #[test]
    fn test_builders_agree_with_macro() {
        let built = Tree::node("a", [Tree::leaf("b"), Tree::wildcard()]);
        assert_eq!(built, tree!["a"; "b"; _]);

        let extended = Tree::leaf("a").with_children([Tree::leaf("b")]);
        assert_eq!(extended, tree!["a"; "b"]);
    }

    #[test]
    fn test_wildcard_has_no_children() {
        let mut wildcard = Tree::wildcard();
        wildcard.add_child(Tree::leaf("x"));
        assert!(wildcard.is_leaf());
        assert_eq!(wildcard.label(), None);
    }

    #[test]
    fn test_shape_queries() {
        let tree = tree!["a"; #["b"; #["c"; _]]; "d"];
        assert_eq!(tree.depth(), 4);
        assert_eq!(tree.size(), 5);
        assert_eq!(tree.len(), 2);
        assert!(tree.contains_wildcard());
        assert_eq!(tree[1].label(), Some("d"));
        assert_eq!(tree.child(0).and_then(|b| b.child(0)).and_then(Tree::label), Some("c"));
        assert!(tree.child(2).is_none());
    }

    #[test]
    fn test_iter_is_preorder() {
        let tree = tree!["a"; #["b"; "c"; "d"]; #["e"; _]];
        let labels: Vec<_> = tree.iter().map(|t| t.label().unwrap_or("_")).collect();
        assert_eq!(labels, ["a", "b", "c", "d", "e", "_"]);
    }
}
