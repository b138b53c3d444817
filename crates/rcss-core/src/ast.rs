use serde::Serialize;
use std::collections::BTreeMap;

/// Value stored in a [`AstNode::Context`] entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ContextValue {
    Str(String),
    Bool(bool),
}

impl From<&str> for ContextValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<bool> for ContextValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

pub type ContextMap = BTreeMap<String, ContextValue>;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum AstNode {
    StyleRule {
        selector: String,
        nodes: Vec<AstNode>,
    },
    /// `name` keeps its leading `@`. Without children it is a statement such
    /// as `@import "a.css";`, unless it is a conditional group rule.
    AtRule {
        name: String,
        params: String,
        nodes: Vec<AstNode>,
    },
    Declaration {
        property: String,
        value: String,
        important: bool,
    },
    Comment {
        value: String,
    },
    /// Inherited key/value state. Never visited by the walkers.
    Context {
        context: ContextMap,
        nodes: Vec<AstNode>,
    },
    /// Content to be hoisted to the document root by [`crate::optimize::optimize_ast`].
    AtRoot {
        nodes: Vec<AstNode>,
    },
}

/// At-rules that may wrap the style rule they are nested in.
pub const NESTABLE_AT_RULES: [&str; 6] = [
    "@container",
    "@supports",
    "@media",
    "@layer",
    "@starting-style",
    "@document",
];

pub fn style_rule(selector: impl Into<String>, nodes: Vec<AstNode>) -> AstNode {
    AstNode::StyleRule {
        selector: selector.into(),
        nodes,
    }
}

pub fn at_rule(name: impl Into<String>, params: impl Into<String>, nodes: Vec<AstNode>) -> AstNode {
    AstNode::AtRule {
        name: name.into(),
        params: params.into(),
        nodes,
    }
}

/// Builds a style rule or, when the header starts with `@`, an at-rule.
pub fn rule(header: &str, nodes: Vec<AstNode>) -> AstNode {
    if header.starts_with('@') {
        parse_at_rule(header, nodes)
    } else {
        style_rule(header, nodes)
    }
}

/// Splits an at-rule header at the first space or `(` after the name.
pub fn parse_at_rule(header: &str, nodes: Vec<AstNode>) -> AstNode {
    let header = header.trim();
    match header
        .char_indices()
        .skip(1)
        .find(|(_, ch)| ch.is_whitespace() || *ch == '(')
    {
        Some((idx, _)) => at_rule(header[..idx].trim(), header[idx..].trim(), nodes),
        None => at_rule(header, "", nodes),
    }
}

pub fn decl(property: impl Into<String>, value: impl Into<String>) -> AstNode {
    AstNode::Declaration {
        property: property.into(),
        value: value.into(),
        important: false,
    }
}

pub fn comment(value: impl Into<String>) -> AstNode {
    AstNode::Comment {
        value: value.into(),
    }
}

pub fn context(context: ContextMap, nodes: Vec<AstNode>) -> AstNode {
    AstNode::Context { context, nodes }
}

pub fn at_root(nodes: Vec<AstNode>) -> AstNode {
    AstNode::AtRoot { nodes }
}

impl AstNode {
    pub fn nodes(&self) -> Option<&Vec<AstNode>> {
        match self {
            Self::StyleRule { nodes, .. }
            | Self::AtRule { nodes, .. }
            | Self::Context { nodes, .. }
            | Self::AtRoot { nodes } => Some(nodes),
            Self::Declaration { .. } | Self::Comment { .. } => None,
        }
    }

    pub fn nodes_mut(&mut self) -> Option<&mut Vec<AstNode>> {
        match self {
            Self::StyleRule { nodes, .. }
            | Self::AtRule { nodes, .. }
            | Self::Context { nodes, .. }
            | Self::AtRoot { nodes } => Some(nodes),
            Self::Declaration { .. } | Self::Comment { .. } => None,
        }
    }

    /// Detaches and returns the children, leaving an empty list behind.
    pub fn take_nodes(&mut self) -> Vec<AstNode> {
        self.nodes_mut().map(std::mem::take).unwrap_or_default()
    }

    /// Copy of this node's own header with no children.
    pub fn shallow_clone(&self) -> AstNode {
        match self {
            Self::StyleRule { selector, .. } => style_rule(selector.clone(), Vec::new()),
            Self::AtRule { name, params, .. } => at_rule(name.clone(), params.clone(), Vec::new()),
            Self::Declaration { .. } | Self::Comment { .. } => self.clone(),
            Self::Context { context, .. } => AstNode::Context {
                context: context.clone(),
                nodes: Vec::new(),
            },
            Self::AtRoot { .. } => at_root(Vec::new()),
        }
    }

    /// Same header as `self`, holding `nodes` as children.
    pub fn with_nodes(&self, nodes: Vec<AstNode>) -> AstNode {
        let mut node = self.shallow_clone();
        if let Some(children) = node.nodes_mut() {
            *children = nodes;
        }
        node
    }

    pub fn is_nestable_at_rule(&self) -> bool {
        matches!(self, Self::AtRule { name, .. } if NESTABLE_AT_RULES.contains(&name.as_str()))
    }

    /// A node that opens a block rather than a single statement.
    ///
    /// Body-less at-rules such as `@import "x";` or `@slot;` are statements,
    /// but a nestable at-rule counts as a block even with an empty body.
    /// `@layer a, b;` is the exception: it declares layer order.
    pub fn is_block(&self) -> bool {
        match self {
            Self::StyleRule { .. } | Self::Context { .. } | Self::AtRoot { .. } => true,
            Self::AtRule { name, nodes, .. } => {
                !nodes.is_empty() || (self.is_nestable_at_rule() && name != "@layer")
            }
            Self::Declaration { .. } | Self::Comment { .. } => false,
        }
    }

    /// Header text used in diagnostics, e.g. `.foo` or `@media (x)`.
    pub fn header(&self) -> String {
        match self {
            Self::StyleRule { selector, .. } => selector.clone(),
            Self::AtRule { name, params, .. } if params.is_empty() => name.clone(),
            Self::AtRule { name, params, .. } => format!("{} {}", name, params),
            Self::Declaration { property, .. } => property.clone(),
            Self::Comment { value } => format!("/*{}*/", value),
            Self::Context { .. } => "context".to_string(),
            Self::AtRoot { .. } => "@at-root".to_string(),
        }
    }
}
