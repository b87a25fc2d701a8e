use crate::{AnnotatedTree, NodeId, Subject};
use graph::Graph;
use std::fmt::{Display, Formatter, Result as FmtResult};

/// Colours cycled through by bracket nesting depth.
const COLOURS: [&str; 6] = [
    "\u{1b}[31m",
    "\u{1b}[33m",
    "\u{1b}[32m",
    "\u{1b}[33m",
    "\u{1b}[36m",
    "\u{1b}[35m",
];
const RESET: &str = "\u{1b}[0m";

/// A pending piece of output while rendering.
enum Token {
    Node(NodeId),
    Text(&'static str),
}

/// Writes the subject in the expression grammar, wrapping every matched
/// subtree in brackets: `a([a(b)])`. Leaves are written bare, matched or not.
impl Display for AnnotatedTree {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        let mut pending = vec![Token::Node(Subject::ROOT)];

        while let Some(token) = pending.pop() {
            let id = match token {
                Token::Text(text) => {
                    f.write_str(text)?;
                    continue;
                }
                Token::Node(id) => id,
            };

            let node = self.subject.node(id);
            if node.is_leaf() {
                f.write_str(node.label())?;
                continue;
            }

            let matched = self.is_matched(id);
            if matched {
                f.write_str("[")?;
            }
            write!(f, "{}(", node.label())?;

            pending.push(Token::Text(if matched { ")]" } else { ")" }));
            for (i, &child) in node.children().iter().enumerate().rev() {
                pending.push(Token::Node(child));
                if i > 0 {
                    pending.push(Token::Text(","));
                }
            }
        }

        Ok(())
    }
}

/// Replace the brackets of a rendering with terminal colours, one per
/// nesting depth. Text outside any bracket is printed in the default colour.
pub fn colorize(bracketed: &str) -> String {
    let mut out = String::with_capacity(bracketed.len() * 2);
    let mut nesting = 0usize;
    let mut current = None;

    for c in bracketed.chars() {
        match c {
            '[' => nesting += 1,
            ']' => nesting = nesting.saturating_sub(1),
            _ => {
                let colour = match nesting {
                    0 => RESET,
                    depth => COLOURS[(depth - 1) % COLOURS.len()],
                };
                if current != Some(colour) {
                    out.push_str(colour);
                    current = Some(colour);
                }
                out.push(c);
            }
        }
    }

    out.push_str(RESET);
    out
}

/// Render for display, with brackets or with colours.
pub fn render(annotated: &AnnotatedTree, colour: bool) -> String {
    let bracketed = annotated.to_string();
    if colour {
        colorize(&bracketed)
    } else {
        bracketed
    }
}

/// Build a Graphviz graph of the subject, filling in the matched nodes.
pub fn graphviz(annotated: &AnnotatedTree) -> Graph {
    let subject = &annotated.subject;
    let mut graph = Graph::new();

    let nodes: Vec<_> = subject
        .ids()
        .map(|id| {
            graph
                .new_node(id.index())
                .with_property("label", subject.node(id).label().to_string())
                .finalize()
        })
        .collect();

    for id in subject.ids() {
        for &child in subject.node(id).children() {
            graph.new_edge(nodes[id.index()], nodes[child.index()]).finalize();
        }

        if annotated.is_matched(id) {
            if let Some(props) = graph.get_node_properties_mut(id.index()) {
                props.set("color", "lightblue"); // Highlight the node
                props.set("style", "filled"); // Fill the node
            }
        }
    }

    graph
}

pub fn to_dot(annotated: &AnnotatedTree) -> String {
    graphviz(annotated).to_dot()
}
