//! Boolean expression graphs over arbitrary literals.

use std::convert::Infallible;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr<T> {
    Lit(T),
    Not(Box<Expr<T>>),
    And(Vec<Expr<T>>),
    Or(Vec<Expr<T>>),
    /// Tombstone left behind while rewriting; compacted away afterwards.
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExprKind {
    Lit,
    Not,
    And,
    Or,
    None,
}

pub fn lit<T>(value: T) -> Expr<T> {
    Expr::Lit(value)
}

pub fn not<T>(expr: Expr<T>) -> Expr<T> {
    Expr::Not(Box::new(expr))
}

pub fn and<T>(nodes: Vec<Expr<T>>) -> Expr<T> {
    Expr::And(nodes)
}

pub fn or<T>(nodes: Vec<Expr<T>>) -> Expr<T> {
    Expr::Or(nodes)
}

pub fn none<T>() -> Expr<T> {
    Expr::None
}

impl<T> Expr<T> {
    pub fn kind(&self) -> ExprKind {
        match self {
            Expr::Lit(_) => ExprKind::Lit,
            Expr::Not(_) => ExprKind::Not,
            Expr::And(_) => ExprKind::And,
            Expr::Or(_) => ExprKind::Or,
            Expr::None => ExprKind::None,
        }
    }

    /// Builds an `and` or `or` node; any other kind yields `none`.
    pub fn group(kind: ExprKind, nodes: Vec<Expr<T>>) -> Expr<T> {
        match kind {
            ExprKind::And => Expr::And(nodes),
            ExprKind::Or => Expr::Or(nodes),
            ExprKind::Lit | ExprKind::Not | ExprKind::None => Expr::None,
        }
    }

    /// Children of an `and`/`or` node, empty for everything else.
    pub fn children(&self) -> &[Expr<T>] {
        match self {
            Expr::And(nodes) | Expr::Or(nodes) => nodes,
            Expr::Lit(_) | Expr::Not(_) | Expr::None => &[],
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Expr::None)
    }

    /// Rewrites the graph with `visitor`: `enter` runs before the children are
    /// visited, `exit` after, each receiving the node produced so far.
    pub fn accept<V>(self, visitor: &mut V) -> Result<Expr<T>, V::Error>
    where
        V: ExprVisitor<T> + ?Sized,
    {
        let expr = match visitor.enter(self)? {
            Expr::Not(inner) => Expr::Not(Box::new((*inner).accept(visitor)?)),
            Expr::And(nodes) => Expr::And(accept_all(nodes, visitor)?),
            Expr::Or(nodes) => Expr::Or(accept_all(nodes, visitor)?),
            other => other,
        };
        visitor.exit(expr)
    }
}

fn accept_all<T, V>(nodes: Vec<Expr<T>>, visitor: &mut V) -> Result<Vec<Expr<T>>, V::Error>
where
    V: ExprVisitor<T> + ?Sized,
{
    nodes.into_iter().map(|node| node.accept(visitor)).collect()
}

pub trait ExprVisitor<T> {
    type Error;

    fn enter(&mut self, expr: Expr<T>) -> Result<Expr<T>, Self::Error> {
        Ok(expr)
    }

    fn exit(&mut self, expr: Expr<T>) -> Result<Expr<T>, Self::Error> {
        Ok(expr)
    }
}

struct Enter<F>(F);

impl<T, F> ExprVisitor<T> for Enter<F>
where
    F: FnMut(Expr<T>) -> Expr<T>,
{
    type Error = Infallible;

    fn enter(&mut self, expr: Expr<T>) -> Result<Expr<T>, Infallible> {
        Ok((self.0)(expr))
    }
}

/// Pre-order rewrite: `f` sees every node before its (rewritten) children.
pub fn visit<T, F>(expr: Expr<T>, f: F) -> Expr<T>
where
    F: FnMut(Expr<T>) -> Expr<T>,
{
    match expr.accept(&mut Enter(f)) {
        Ok(expr) => expr,
        Err(never) => match never {},
    }
}

impl<T: fmt::Display> fmt::Display for Expr<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Lit(value) => write!(f, "{}", value),
            Expr::Not(inner) => write!(f, "!{}", inner),
            Expr::And(nodes) => write_group(f, nodes, " & "),
            Expr::Or(nodes) => write_group(f, nodes, " | "),
            Expr::None => write!(f, "none"),
        }
    }
}

fn write_group<T: fmt::Display>(
    f: &mut fmt::Formatter<'_>,
    nodes: &[Expr<T>],
    separator: &str,
) -> fmt::Result {
    write!(f, "(")?;
    for (idx, node) in nodes.iter().enumerate() {
        if idx > 0 {
            write!(f, "{}", separator)?;
        }
        write!(f, "{}", node)?;
    }
    write!(f, ")")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display() {
        let expr = or(vec![and(vec![lit(1), not(lit(2))]), lit(3)]);
        assert_eq!(expr.to_string(), "((1 & !2) | 3)");
        assert_eq!(none::<u8>().to_string(), "none");
    }

    #[test]
    fn visit_is_pre_order() {
        let mut seen = Vec::new();
        let expr = and(vec![lit(1), or(vec![lit(2), lit(3)])]);
        let out = visit(expr.clone(), |node| {
            seen.push(node.kind());
            node
        });
        assert_eq!(out, expr);
        assert_eq!(
            seen,
            vec![
                ExprKind::And,
                ExprKind::Lit,
                ExprKind::Or,
                ExprKind::Lit,
                ExprKind::Lit
            ]
        );
    }

    #[test]
    fn visit_descends_into_rewritten_nodes() {
        // Rewriting a parent exposes the new children to the same visitor.
        let expr = not(lit(1));
        let out = visit(expr, |node| match node {
            Expr::Not(inner) => and(vec![*inner, lit(10)]),
            Expr::Lit(n) => lit(n * 2),
            other => other,
        });
        assert_eq!(out, and(vec![lit(2), lit(20)]));
    }

    struct Counter {
        entered: usize,
        exited: Vec<ExprKind>,
    }

    impl ExprVisitor<u8> for Counter {
        type Error = String;

        fn enter(&mut self, expr: Expr<u8>) -> Result<Expr<u8>, String> {
            self.entered += 1;
            Ok(expr)
        }

        fn exit(&mut self, expr: Expr<u8>) -> Result<Expr<u8>, String> {
            if let Expr::Lit(9) = expr {
                return Err("nine".to_string());
            }
            self.exited.push(expr.kind());
            Ok(expr)
        }
    }

    #[test]
    fn exit_runs_after_children() {
        let mut counter = Counter {
            entered: 0,
            exited: Vec::new(),
        };
        let out = or(vec![lit(1), not(lit(2))]).accept(&mut counter);
        assert!(out.is_ok());
        assert_eq!(counter.entered, 4);
        assert_eq!(
            counter.exited,
            vec![ExprKind::Lit, ExprKind::Lit, ExprKind::Not, ExprKind::Or]
        );
    }

    #[test]
    fn visitor_errors_propagate() {
        let mut counter = Counter {
            entered: 0,
            exited: Vec::new(),
        };
        let out = and(vec![lit(1), lit(9), lit(3)]).accept(&mut counter);
        assert_eq!(out, Err("nine".to_string()));
    }

    #[test]
    fn group_and_children() {
        let expr = Expr::group(ExprKind::Or, vec![lit('a'), lit('b')]);
        assert_eq!(expr.kind(), ExprKind::Or);
        assert_eq!(expr.children().len(), 2);
        assert!(Expr::<char>::group(ExprKind::Lit, Vec::new()).is_none());
    }
}
