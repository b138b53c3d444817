//! Normalizes nested rules into canonical, un-nested form.
//!
//! After flattening, every rule or at-rule holds either statements only
//! (declarations, comments, body-less at-rules) or exactly one block child.
//! Style rules are merged into their parent selector and nestable at-rules
//! wrap the style rule they used to sit in.

use crate::ast::{style_rule, AstNode};
use crate::selector::{
    as_nesting_parent, has_nesting_selector, split_list, substitute, wrap_list,
};
use crate::walk::{walk, walk_depth, WalkAction, WalkDepthAction};
use tracing::debug;

/// Flattens `ast` in place and hands it back.
pub fn flatten_nesting(ast: &mut Vec<AstNode>) -> &mut Vec<AstNode> {
    normalize_nested_selectors(ast);

    let mut splits = 0usize;
    walk_depth(ast, |node, _| match split_mixed(node) {
        Some(parts) => {
            splits += 1;
            WalkDepthAction::Replace(parts)
        }
        None => WalkDepthAction::Continue,
    });

    let mut merges = 0usize;
    walk(ast, |node, _| match merge_into_child(node) {
        Some(merged) => {
            merges += 1;
            WalkAction::Replace(vec![merged])
        }
        None => WalkAction::Continue,
    });

    debug!(splits, merges, "flattened nesting");
    ast
}

/// Gives every nested selector an explicit `&` and wraps nested lists in `:is()`.
fn normalize_nested_selectors(ast: &mut Vec<AstNode>) {
    walk(ast, |node, ctx| {
        if let AstNode::StyleRule { selector, .. } = node {
            let nested = ctx
                .path
                .iter()
                .rev()
                .take_while(|ancestor| !matches!(ancestor, AstNode::AtRoot { .. }))
                .any(|ancestor| matches!(ancestor, AstNode::StyleRule { .. }));
            if nested {
                *selector = explicit_nesting(selector);
            }
        }
        WalkAction::Continue
    });
}

fn explicit_nesting(selector: &str) -> String {
    let parts: Vec<String> = split_list(selector)
        .into_iter()
        .map(|part| {
            if has_nesting_selector(part) {
                part.to_string()
            } else {
                // `.bar` and `> .bar` alike are relative to the parent.
                format!("& {}", part)
            }
        })
        .collect();

    if parts.is_empty() {
        return selector.to_string();
    }
    wrap_list(&parts)
}

/// Splits a rule whose children mix statements with blocks (or hold several
/// blocks) into one copy per run of statements and one copy per block,
/// keeping document order.
fn split_mixed(node: &mut AstNode) -> Option<Vec<AstNode>> {
    if !matches!(node, AstNode::StyleRule { .. } | AstNode::AtRule { .. }) {
        return None;
    }
    let children = node.nodes()?;
    if children.len() <= 1 || !children.iter().any(AstNode::is_block) {
        return None;
    }

    let mut parts = Vec::new();
    let mut statements = Vec::new();
    for child in node.take_nodes() {
        if child.is_block() {
            if !statements.is_empty() {
                parts.push(node.with_nodes(std::mem::take(&mut statements)));
            }
            parts.push(node.with_nodes(vec![child]));
        } else {
            statements.push(child);
        }
    }
    if !statements.is_empty() {
        parts.push(node.with_nodes(statements));
    }
    Some(parts)
}

/// Collapses a style rule into its only child: a nested style rule takes over
/// the merged selector, a nestable at-rule is hoisted above the style rule.
fn merge_into_child(node: &mut AstNode) -> Option<AstNode> {
    let AstNode::StyleRule { selector, nodes } = node else {
        return None;
    };
    if nodes.len() != 1 {
        return None;
    }

    let only = &mut nodes[0];
    if let AstNode::StyleRule {
        selector: child_selector,
        nodes: child_nodes,
    } = only
    {
        let merged = merge_selector(child_selector, selector);
        return Some(style_rule(merged, std::mem::take(child_nodes)));
    }

    if only.is_nestable_at_rule() && only.is_block() {
        let inner = only.take_nodes();
        return Some(only.with_nodes(vec![style_rule(selector.clone(), inner)]));
    }

    None
}

fn merge_selector(child: &str, parent: &str) -> String {
    let parent = as_nesting_parent(parent);
    if has_nesting_selector(child) {
        substitute(child, &parent)
    } else {
        format!("{} {}", parent, child)
    }
}
