use crate::{Error, Path, Result, Symbol, Tree};
use tracing::trace;

/// Decompose a pattern into its root-to-leaf paths, depth first with children
/// in their given order.
///
/// A pattern with `L` leaves and wildcards yields exactly `L` paths, and a
/// subject node matches the pattern once all of them are satisfied beneath it.
pub fn root_to_leaf_paths(pattern: &Tree) -> Result<Vec<Path>> {
    if pattern.is_wildcard() {
        return Err(Error::InvalidPattern);
    }

    let mut paths = Vec::new();
    collect_paths(pattern, &mut Vec::new(), &mut paths);
    trace!("Pattern {} decomposes into {} paths", pattern, paths.len());
    Ok(paths)
}

fn collect_paths(tree: &Tree, acc: &mut Vec<Symbol>, paths: &mut Vec<Path>) {
    match tree {
        Tree::Node { label, children } if children.is_empty() => {
            let mut symbols = acc.clone();
            symbols.push(Symbol::Label(label.clone()));
            paths.push(Path::new(symbols));
        }
        Tree::Node { label, children } => {
            for (i, child) in children.iter().enumerate() {
                // The label is pushed once per edge so `acc` always spells
                // the walk from the root to the current point.
                acc.push(Symbol::Label(label.clone()));
                acc.push(Symbol::Index(i));
                collect_paths(child, acc, paths);
                acc.pop();
                acc.pop();
            }
        }
        // `acc` already ends in the index that selected this child
        Tree::Wildcard => paths.push(Path::new(acc.clone())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree;

    fn spelled(pattern: &Tree) -> Vec<String> {
        root_to_leaf_paths(pattern)
            .unwrap()
            .iter()
            .map(Path::to_string)
            .collect()
    }

    #[test]
    fn test_leaf_paths() {
        assert_eq!(spelled(&tree!["a"; "b"; "c"]), ["a 0 b", "a 1 c"]);
        assert_eq!(spelled(&tree!["a"]), ["a"]);
    }

    #[test]
    fn test_wildcard_paths_end_in_index() {
        assert_eq!(spelled(&tree!["a"; _]), ["a 0"]);
        assert_eq!(spelled(&tree!["a"; "b"; _]), ["a 0 b", "a 1"]);
    }

    #[test]
    fn test_nested_paths_are_depth_first() {
        let pattern = tree!["f"; "x"; #["y"; "z"; _]; #["w"; #["v"; "u"]]];
        assert_eq!(
            spelled(&pattern),
            ["f 0 x", "f 1 y 0 z", "f 1 y 1", "f 2 w 0 v 0 u"]
        );
    }

    #[test]
    fn test_path_count_equals_leaf_count() {
        let pattern = tree!["a"; #["b"; _; _]; "c"; #["d"; #["e"; "f"; _]]];
        let leaves = pattern.iter().filter(|t| t.is_leaf()).count();
        assert_eq!(root_to_leaf_paths(&pattern).unwrap().len(), leaves);
    }

    #[test]
    fn test_wildcard_root_is_rejected() {
        assert_eq!(root_to_leaf_paths(&tree![_]), Err(Error::InvalidPattern));
    }
}
