//! Pre-order and post-order traversal with in-place rewriting.
//!
//! Visitors never see indices. They return an action and the traversal owns
//! all of the splicing and cursor bookkeeping.

use crate::ast::{AstNode, ContextMap};

#[derive(Debug, Clone, PartialEq)]
pub enum WalkAction {
    Continue,
    /// Do not descend into the children of the current node.
    Skip,
    Stop,
    /// Splice in the replacement and visit it, starting at its first node.
    Replace(Vec<AstNode>),
    /// Splice in the replacement and move past it without visiting it.
    ReplaceSkip(Vec<AstNode>),
    ReplaceStop(Vec<AstNode>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum WalkDepthAction {
    Continue,
    Stop,
    Replace(Vec<AstNode>),
    ReplaceStop(Vec<AstNode>),
}

/// What a visitor can see besides the node itself.
///
/// `path` holds the ancestors, outermost first, without `Context` nodes. An
/// ancestor's children are detached while its subtree is being walked, so
/// only its header is meaningful.
pub struct VisitContext<'a> {
    pub path: &'a [AstNode],
    pub context: &'a ContextMap,
}

impl VisitContext<'_> {
    /// Nearest ancestor. Its `nodes()` is empty while its subtree is walked,
    /// so siblings of the visited node cannot be reached through it.
    pub fn parent(&self) -> Option<&AstNode> {
        self.path.last()
    }
}

enum Flow {
    Continue,
    Stop,
}

pub fn walk<F>(nodes: &mut Vec<AstNode>, mut visit: F)
where
    F: FnMut(&mut AstNode, &VisitContext<'_>) -> WalkAction,
{
    walk_with_context(nodes, &ContextMap::new(), &mut visit);
}

pub fn walk_with_context<F>(nodes: &mut Vec<AstNode>, context: &ContextMap, visit: &mut F)
where
    F: FnMut(&mut AstNode, &VisitContext<'_>) -> WalkAction,
{
    let mut path = Vec::new();
    walk_nodes(nodes, visit, &mut path, context);
}

fn walk_nodes<F>(
    nodes: &mut Vec<AstNode>,
    visit: &mut F,
    path: &mut Vec<AstNode>,
    context: &ContextMap,
) -> Flow
where
    F: FnMut(&mut AstNode, &VisitContext<'_>) -> WalkAction,
{
    let mut i = 0;
    while i < nodes.len() {
        if let AstNode::Context {
            context: inner,
            nodes: children,
        } = &mut nodes[i]
        {
            let merged = merge_context(context, inner);
            if let Flow::Stop = walk_nodes(children, visit, path, &merged) {
                return Flow::Stop;
            }
            i += 1;
            continue;
        }

        let action = visit(
            &mut nodes[i],
            &VisitContext {
                path: path.as_slice(),
                context,
            },
        );
        match action {
            WalkAction::Continue => {}
            WalkAction::Skip => {
                i += 1;
                continue;
            }
            WalkAction::Stop => return Flow::Stop,
            WalkAction::Replace(replacement) => {
                nodes.splice(i..=i, replacement);
                continue;
            }
            WalkAction::ReplaceSkip(replacement) => {
                let len = replacement.len();
                nodes.splice(i..=i, replacement);
                i += len;
                continue;
            }
            WalkAction::ReplaceStop(replacement) => {
                nodes.splice(i..=i, replacement);
                return Flow::Stop;
            }
        }

        let flow = descend(nodes, i, path, |children, path| {
            walk_nodes(children, visit, path, context)
        });
        if let Flow::Stop = flow {
            return Flow::Stop;
        }
        i += 1;
    }
    Flow::Continue
}

/// Post-order walk: a node is visited only after its whole subtree.
pub fn walk_depth<F>(nodes: &mut Vec<AstNode>, mut visit: F)
where
    F: FnMut(&mut AstNode, &VisitContext<'_>) -> WalkDepthAction,
{
    let mut path = Vec::new();
    walk_depth_nodes(nodes, &mut visit, &mut path, &ContextMap::new());
}

fn walk_depth_nodes<F>(
    nodes: &mut Vec<AstNode>,
    visit: &mut F,
    path: &mut Vec<AstNode>,
    context: &ContextMap,
) -> Flow
where
    F: FnMut(&mut AstNode, &VisitContext<'_>) -> WalkDepthAction,
{
    let mut i = 0;
    while i < nodes.len() {
        if let AstNode::Context {
            context: inner,
            nodes: children,
        } = &mut nodes[i]
        {
            let merged = merge_context(context, inner);
            if let Flow::Stop = walk_depth_nodes(children, visit, path, &merged) {
                return Flow::Stop;
            }
            i += 1;
            continue;
        }

        let flow = descend(nodes, i, path, |children, path| {
            walk_depth_nodes(children, visit, path, context)
        });
        if let Flow::Stop = flow {
            return Flow::Stop;
        }

        let action = visit(
            &mut nodes[i],
            &VisitContext {
                path: path.as_slice(),
                context,
            },
        );
        match action {
            WalkDepthAction::Continue => i += 1,
            WalkDepthAction::Stop => return Flow::Stop,
            WalkDepthAction::Replace(replacement) => {
                let len = replacement.len();
                nodes.splice(i..=i, replacement);
                i += len;
            }
            WalkDepthAction::ReplaceStop(replacement) => {
                nodes.splice(i..=i, replacement);
                return Flow::Stop;
            }
        }
    }
    Flow::Continue
}

/// Moves `nodes[i]` onto the path, runs `f` on its detached children and
/// puts everything back where it was.
fn descend<F>(nodes: &mut [AstNode], i: usize, path: &mut Vec<AstNode>, f: F) -> Flow
where
    F: FnOnce(&mut Vec<AstNode>, &mut Vec<AstNode>) -> Flow,
{
    if nodes[i].nodes().map_or(true, Vec::is_empty) {
        return Flow::Continue;
    }

    let mut parent = std::mem::replace(&mut nodes[i], AstNode::Comment { value: String::new() });
    let mut children = parent.take_nodes();
    path.push(parent);
    let flow = f(&mut children, path);
    if let Some(mut parent) = path.pop() {
        if let Some(slot) = parent.nodes_mut() {
            *slot = children;
        }
        nodes[i] = parent;
    }
    flow
}

fn merge_context(outer: &ContextMap, inner: &ContextMap) -> ContextMap {
    let mut merged = outer.clone();
    merged.extend(inner.iter().map(|(k, v)| (k.clone(), v.clone())));
    merged
}
