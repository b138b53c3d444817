use crate::ast::AstNode;

/// Serializes nodes with two-space indentation.
///
/// `Context` and `AtRoot` nodes print their children in place; run
/// [`crate::optimize::optimize_ast`] first to hoist at-root content.
pub fn to_css(nodes: &[AstNode]) -> String {
    let mut out = String::new();
    for node in nodes {
        emit_node(node, 0, &mut out);
    }
    out
}

fn emit_node(node: &AstNode, depth: usize, out: &mut String) {
    match node {
        AstNode::StyleRule { selector, nodes } => emit_block(selector, nodes, depth, out),
        AstNode::AtRule { name, params, nodes } => {
            if !node.is_block() {
                indent(depth, out);
                out.push_str(name);
                if !params.is_empty() {
                    out.push(' ');
                    out.push_str(params);
                }
                out.push_str(";\n");
            } else if params.is_empty() {
                emit_block(name, nodes, depth, out);
            } else {
                emit_block(&format!("{} {}", name, params), nodes, depth, out);
            }
        }
        AstNode::Declaration {
            property,
            value,
            important,
        } => emit_declaration(property, value, *important, depth, out),
        AstNode::Comment { value } => {
            indent(depth, out);
            out.push_str("/*");
            out.push_str(value);
            out.push_str("*/\n");
        }
        AstNode::Context { nodes, .. } | AstNode::AtRoot { nodes } => {
            for child in nodes {
                emit_node(child, depth, out);
            }
        }
    }
}

fn emit_block(header: &str, nodes: &[AstNode], depth: usize, out: &mut String) {
    indent(depth, out);
    out.push_str(header);
    out.push_str(" {\n");

    for child in nodes {
        emit_node(child, depth + 1, out);
    }

    indent(depth, out);
    out.push_str("}\n");
}

fn emit_declaration(property: &str, value: &str, important: bool, depth: usize, out: &mut String) {
    indent(depth, out);
    out.push_str(property);
    out.push_str(": ");
    out.push_str(value);
    if important {
        out.push_str(" !important");
    }
    out.push_str(";\n");
}

fn indent(depth: usize, out: &mut String) {
    for _ in 0..depth {
        out.push_str("  ");
    }
}
