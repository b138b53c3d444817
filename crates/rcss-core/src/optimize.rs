//! Final clean-up before printing.

use crate::ast::AstNode;
use crate::walk::{walk, WalkAction};
use tracing::debug;

/// Prepares a tree for output.
///
/// `Context` nodes are replaced by their children, the contents of every
/// `AtRoot` are moved to the end of the stylesheet in document order, and
/// rules left without any content are removed. Body-less at-rules such as
/// `@import` are statements and always stay.
pub fn optimize_ast(nodes: Vec<AstNode>) -> Vec<AstNode> {
    let mut out = Vec::new();
    let mut pending = nodes;
    let mut hoisted_total = 0usize;

    while !pending.is_empty() {
        let mut hoisted = Vec::new();
        // `walk` looks through `Context` nodes; they are spliced away in `prune`.
        walk(&mut pending, |node, _| match node {
            AstNode::AtRoot { .. } => {
                hoisted.extend(node.take_nodes());
                WalkAction::ReplaceSkip(Vec::new())
            }
            _ => WalkAction::Continue,
        });
        hoisted_total += hoisted.len();
        out.append(&mut pending);
        pending = hoisted;
    }

    let before = out.len();
    let out = prune(out);
    debug!(hoisted = hoisted_total, kept = out.len(), before, "optimized AST");
    out
}

fn prune(nodes: Vec<AstNode>) -> Vec<AstNode> {
    let mut out = Vec::with_capacity(nodes.len());
    for node in nodes {
        match node {
            AstNode::Context { nodes, .. } => out.extend(prune(nodes)),
            other => out.extend(prune_node(other)),
        }
    }
    out
}

fn prune_node(node: AstNode) -> Option<AstNode> {
    match node {
        AstNode::StyleRule { selector, nodes } => {
            let nodes = prune(nodes);
            (!nodes.is_empty()).then_some(AstNode::StyleRule { selector, nodes })
        }
        AstNode::AtRule {
            name,
            params,
            nodes,
        } if !nodes.is_empty() => {
            let nodes = prune(nodes);
            (!nodes.is_empty()).then_some(AstNode::AtRule {
                name,
                params,
                nodes,
            })
        }
        other => Some(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{at_root, at_rule, comment, context, decl, style_rule, ContextMap};
    use crate::emitter::to_css;
    use pretty_assertions::assert_eq;

    #[test]
    fn unwraps_context() {
        let mut map = ContextMap::new();
        map.insert("theme".to_string(), "dark".into());
        let ast = vec![context(
            map.clone(),
            vec![style_rule(
                ".a",
                vec![context(map, vec![decl("color", "red")])],
            )],
        )];
        assert_eq!(
            optimize_ast(ast),
            vec![style_rule(".a", vec![decl("color", "red")])]
        );
    }

    #[test]
    fn no_context_survives_inside_rules() {
        let mut map = ContextMap::new();
        map.insert("dark".to_string(), true.into());
        let ast = vec![
            at_root(vec![context(map.clone(), vec![decl("top", "0")])]),
            at_rule(
                "@media",
                "(x)",
                vec![context(
                    map,
                    vec![style_rule(".a", vec![decl("color", "red")])],
                )],
            ),
        ];
        assert_eq!(
            optimize_ast(ast),
            vec![
                at_rule(
                    "@media",
                    "(x)",
                    vec![style_rule(".a", vec![decl("color", "red")])]
                ),
                decl("top", "0"),
            ]
        );
    }

    #[test]
    fn hoists_at_root_in_document_order() {
        let ast = vec![
            style_rule(
                ".a",
                vec![
                    decl("top", "0"),
                    at_root(vec![style_rule(".b", vec![decl("left", "0")])]),
                ],
            ),
            at_root(vec![style_rule(".c", vec![decl("right", "0")])]),
            style_rule(".d", vec![decl("bottom", "0")]),
        ];
        assert_eq!(
            to_css(&optimize_ast(ast)),
            ".a {\n  top: 0;\n}\n.d {\n  bottom: 0;\n}\n.b {\n  left: 0;\n}\n.c {\n  right: 0;\n}\n"
        );
    }

    #[test]
    fn hoisted_content_is_optimized_too() {
        let ast = vec![at_root(vec![context(
            ContextMap::new(),
            vec![
                style_rule(".a", vec![decl("top", "0")]),
                at_root(vec![style_rule(".b", vec![decl("top", "1")])]),
            ],
        )])];
        assert_eq!(
            optimize_ast(ast),
            vec![
                style_rule(".a", vec![decl("top", "0")]),
                style_rule(".b", vec![decl("top", "1")]),
            ]
        );
    }

    #[test]
    fn drops_rules_left_empty() {
        let ast = vec![
            style_rule(".empty", Vec::new()),
            at_rule(
                "@media",
                "(x)",
                vec![style_rule(".a", vec![at_root(Vec::new())])],
            ),
            at_rule("@import", "\"a.css\"", Vec::new()),
            style_rule(".note", vec![comment(" kept ")]),
        ];
        assert_eq!(
            optimize_ast(ast),
            vec![
                at_rule("@import", "\"a.css\"", Vec::new()),
                style_rule(".note", vec![comment(" kept ")]),
            ]
        );
    }
}
