use std::fmt::{Display, Formatter, Result as FmtResult};

/// A letter of the automaton's alphabet.
///
/// Walking a tree from the root alternates between the two cases: a `Label`
/// says which node we are standing on, an `Index` says which child we step
/// into next. A `Label` never equals an `Index`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Symbol {
    Label(String),
    Index(usize),
}

impl Symbol {
    pub fn label(label: impl ToString) -> Self {
        Symbol::Label(label.to_string())
    }

    pub fn is_label(&self) -> bool {
        matches!(self, Symbol::Label(_))
    }
}

impl Display for Symbol {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Symbol::Label(label) => write!(f, "{}", label),
            Symbol::Index(index) => write!(f, "{}", index),
        }
    }
}

/// One root-to-leaf (or root-to-wildcard) walk of a pattern tree.
///
/// A path always starts with a `Label` and alternates from there. It ends in
/// a `Label` when the walk reached a labelled leaf, or in an `Index` when it
/// reached a wildcard, which contributes nothing but the requirement that the
/// indexed child exists.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Path {
    symbols: Vec<Symbol>,
    depth: usize,
}

impl Path {
    /// Paths are only ever produced by walking a labelled pattern root.
    pub(crate) fn new(symbols: Vec<Symbol>) -> Self {
        debug_assert!(matches!(symbols.first(), Some(Symbol::Label(_))));
        let depth = symbols.iter().filter(|symbol| symbol.is_label()).count();
        Path { symbols, depth }
    }

    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    /// The number of `Label` symbols, i.e. how many tree nodes the walk
    /// passes through. A match of this path is attributed to the subject
    /// node this many frames up the traversal stack.
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn ends_in_wildcard(&self) -> bool {
        matches!(self.symbols.last(), Some(Symbol::Index(_)))
    }
}

impl Display for Path {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        for (i, symbol) in self.symbols.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{}", symbol)?;
        }
        Ok(())
    }
}
