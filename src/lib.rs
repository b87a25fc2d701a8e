//! Finds every place a pattern tree matches inside a subject tree in one
//! linear pass, by running an Aho-Corasick automaton over root-to-leaf walks
//! instead of strings.
//!
//! ```
//! use treematch::*;
//!
//! let pattern: Tree = "a(b,_)".parse()?;
//! let subject: Tree = "f(a(b,c),a(d,e))".parse()?;
//!
//! let automaton = Automaton::build(&pattern)?;
//! let annotated = match_tree(&automaton, &subject)?;
//! assert_eq!(annotated.to_string(), "f([a(b,c)],a(d,e))");
//! # Ok::<(), treematch::Error>(())
//! ```
mod automaton;
mod error;
mod matcher;
pub mod parser;
mod paths;
pub mod render;
pub mod session;
mod subject;
mod symbol;
mod tree;

pub use automaton::{Automaton, AutomatonBuilder, Outputs, PathId, StateId};
pub use error::{Error, Result};
pub use matcher::{
    find_matches, find_matches_until, match_tree, AnnotatedTree, MatchRecord, Matches, Traversal,
};
pub use parser::parse;
pub use paths::root_to_leaf_paths;
pub use subject::{NodeId, Subject, SubjectNode};
pub use symbol::{Path, Symbol};
pub use tree::{Tree, TreeIter};
