//! Negation of a fragment of CSS: given rules that match under some set of
//! selector and at-rule conditions, build rules that match exactly when none
//! of those conditions hold.

use crate::ast::{at_rule, style_rule, AstNode};
use crate::dnf::to_dnf;
use crate::error::{Error, Result};
use crate::expr::{and, lit, not, or, Expr};
use crate::nesting::flatten_nesting;
use crate::selector::{split_list, substitute};
use crate::walk::{walk, WalkAction};
use std::fmt;
use tracing::debug;

const SLOT: &str = "@slot";

/// One literal of the boolean graph: a selector or an at-rule prelude.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    Selector(String),
    AtRule { name: String, params: String },
}

impl Condition {
    fn from_node(node: &AstNode) -> Option<Condition> {
        match node {
            AstNode::StyleRule { selector, .. } => Some(Condition::Selector(selector.clone())),
            AstNode::AtRule { name, params, .. }
                if node.is_block() || node.is_nestable_at_rule() =>
            {
                Some(Condition::AtRule {
                    name: name.clone(),
                    params: params.clone(),
                })
            }
            _ => None,
        }
    }

    fn is_negatable(&self) -> bool {
        match self {
            Condition::Selector(_) => true,
            Condition::AtRule { name, params } => {
                !params.trim().is_empty()
                    && matches!(
                        name.as_str(),
                        "@media" | "@supports" | "@document" | "@container"
                    )
            }
        }
    }

    fn to_node(&self, nodes: Vec<AstNode>) -> AstNode {
        match self {
            Condition::Selector(selector) => style_rule(selector.clone(), nodes),
            Condition::AtRule { name, params } => at_rule(name.clone(), params.clone(), nodes),
        }
    }

    fn to_negated_node(&self, nodes: Vec<AstNode>) -> AstNode {
        match self {
            Condition::Selector(selector) => style_rule(negate_selector(selector), nodes),
            Condition::AtRule { name, params } if name == "@container" => {
                at_rule(name.clone(), negate_container_params(params), nodes)
            }
            Condition::AtRule { name, params } => {
                at_rule(name.clone(), negate_params(params), nodes)
            }
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::Selector(selector) => write!(f, "{}", selector),
            Condition::AtRule { name, params } if params.is_empty() => write!(f, "{}", name),
            Condition::AtRule { name, params } => write!(f, "{} {}", name, params),
        }
    }
}

/// Builds the negation of `ast` without touching the input.
///
/// Every leaf rule contributes the conjunction of the conditions on its
/// ancestor chain; the result holds when none of those chains hold. Fails with
/// [`Error::Structural`] on a condition that has no negated form, such as
/// `@layer`.
pub fn negate_rules(ast: &[AstNode]) -> Result<Vec<AstNode>> {
    let mut ast = ast.to_vec();
    flatten_nesting(&mut ast);

    let collected = collect_leaf_chains(&mut ast)?;
    if collected.chains.is_empty() {
        return Ok(Vec::new());
    }

    let clauses = collected
        .chains
        .into_iter()
        .map(|chain| and(chain.into_iter().map(lit).collect()))
        .collect();
    let dnf = to_dnf(not(or(clauses)))?;

    let slot = || {
        if collected.has_slot {
            vec![at_rule(SLOT, "", Vec::new())]
        } else {
            Vec::new()
        }
    };

    let mut out = Vec::with_capacity(dnf.children().len());
    for clause in dnf.children() {
        let mut nodes = slot();
        for literal in clause.children().iter().rev() {
            nodes = vec![rebuild(literal, nodes)];
        }
        out.extend(nodes);
    }

    debug!(rules = out.len(), "negated rules");
    Ok(out)
}

struct LeafChains {
    chains: Vec<Vec<Condition>>,
    has_slot: bool,
}

fn collect_leaf_chains(ast: &mut Vec<AstNode>) -> Result<LeafChains> {
    let mut chains = Vec::new();
    let mut has_slot = false;
    let mut failure = None;

    walk(ast, |node, ctx| {
        if let AstNode::AtRule { name, .. } = node {
            if name.as_str() == SLOT {
                has_slot = true;
                return WalkAction::Continue;
            }
        }

        let Some(condition) = Condition::from_node(node) else {
            return WalkAction::Continue;
        };
        let is_leaf = node.nodes().map_or(true, |children| {
            children
                .iter()
                .all(|child| Condition::from_node(child).is_none())
        });
        if !is_leaf {
            return WalkAction::Continue;
        }

        // Content under `@at-root` no longer depends on the conditions above it.
        let scope = ctx
            .path
            .iter()
            .rposition(|ancestor| matches!(ancestor, AstNode::AtRoot { .. }))
            .map_or(0, |idx| idx + 1);

        let mut chain: Vec<Condition> = ctx.path[scope..]
            .iter()
            .filter_map(Condition::from_node)
            .collect();
        chain.push(condition);

        if let Some(bad) = chain.iter().find(|condition| !condition.is_negatable()) {
            failure = Some(Error::Structural(format!("Unable to negate rule: {}", bad)));
            return WalkAction::Stop;
        }

        chains.push(chain);
        WalkAction::Continue
    });

    match failure {
        Some(err) => Err(err),
        None => Ok(LeafChains { chains, has_slot }),
    }
}

fn rebuild(literal: &Expr<Condition>, nodes: Vec<AstNode>) -> AstNode {
    match literal {
        Expr::Not(inner) => match inner.as_ref() {
            Expr::Lit(condition) => condition.to_negated_node(nodes),
            other => rebuild(other, nodes),
        },
        Expr::Lit(condition) => condition.to_node(nodes),
        // DNF clauses only hold literals and negated literals.
        Expr::And(_) | Expr::Or(_) | Expr::None => AstNode::AtRoot { nodes },
    }
}

/// `&:hover, .a &` becomes `&:not(*:hover, .a *)`.
fn negate_selector(selector: &str) -> String {
    let parts: Vec<String> = split_list(selector)
        .into_iter()
        .map(|part| substitute(part, "*"))
        .collect();
    format!("&:not({})", parts.join(", "))
}

fn negate_params(params: &str) -> String {
    let params = params.trim();
    match strip_not(params) {
        Some(rest) => rest.to_string(),
        None => format!("not {}", params),
    }
}

/// `@container` takes an optional name before its condition, and the
/// negation goes between the two.
fn negate_container_params(params: &str) -> String {
    let params = params.trim();
    let (name, condition) = match params.split_once(char::is_whitespace) {
        Some((first, rest)) if is_container_name(first) => (Some(first), rest.trim_start()),
        _ => (None, params),
    };
    let condition = negate_params(condition);
    match name {
        Some(name) => format!("{} {}", name, condition),
        None => condition,
    }
}

fn is_container_name(token: &str) -> bool {
    !token.contains('(')
        && !["not", "and", "or"]
            .iter()
            .any(|keyword| token.eq_ignore_ascii_case(keyword))
}

fn strip_not(params: &str) -> Option<&str> {
    let head = params.get(..4)?;
    if head.eq_ignore_ascii_case("not ") {
        Some(params[4..].trim_start())
    } else {
        None
    }
}
