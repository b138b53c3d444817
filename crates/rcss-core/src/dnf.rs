//! Conversion of boolean expressions into disjunctive normal form.
//!
//! The result of [`to_dnf`] is always `or` of `and` nodes (or `none` when
//! nothing is left): a strict two-level tree whose leaves are literals or
//! negated literals.

use crate::error::{Error, Result};
use crate::expr::{Expr, ExprKind, ExprVisitor};
use std::convert::Infallible;
use tracing::{debug, trace};

pub fn to_dnf<T>(expr: Expr<T>) -> Result<Expr<T>>
where
    T: Clone + PartialEq,
{
    let expr = to_nnf(expr);
    let expr = expr.accept(&mut Distribute)?;
    let expr = reflatten(expr);
    let expr = normalize_shape(expr, ExprKind::Or, ExprKind::And);
    let expr = dedupe(expr);
    let expr = eliminate_supersets(expr, ExprKind::Or, ExprKind::And);
    let expr = compact(expr);

    debug!(clauses = expr.children().len(), "converted to DNF");
    Ok(expr)
}

/// Pushes every negation down onto a literal.
pub fn to_nnf<T>(expr: Expr<T>) -> Expr<T> {
    match expr.accept(&mut Nnf) {
        Ok(expr) => expr,
        Err(never) => match never {},
    }
}

struct Nnf;

impl<T> ExprVisitor<T> for Nnf {
    type Error = Infallible;

    fn enter(&mut self, mut expr: Expr<T>) -> std::result::Result<Expr<T>, Infallible> {
        loop {
            let inner = match expr {
                Expr::Not(inner) => inner,
                other => return Ok(other),
            };
            expr = match *inner {
                Expr::Not(double) => *double,
                Expr::Or(nodes) => return Ok(Expr::And(negate_all(nodes))),
                Expr::And(nodes) => return Ok(Expr::Or(negate_all(nodes))),
                other => return Ok(Expr::Not(Box::new(other))),
            };
        }
    }

    fn exit(&mut self, expr: Expr<T>) -> std::result::Result<Expr<T>, Infallible> {
        Ok(simplify(expr))
    }
}

fn negate_all<T>(nodes: Vec<Expr<T>>) -> Vec<Expr<T>> {
    nodes
        .into_iter()
        .map(|node| Expr::Not(Box::new(node)))
        .collect()
}

/// Removes double negation, splices nested groups of the same kind into their
/// parent and unwraps single-child groups.
fn simplify<T>(expr: Expr<T>) -> Expr<T> {
    match expr {
        Expr::Not(inner) => match *inner {
            Expr::Not(double) => *double,
            other => Expr::Not(Box::new(other)),
        },
        Expr::And(nodes) => unwrap_single(ExprKind::And, splice_same_kind(ExprKind::And, nodes)),
        Expr::Or(nodes) => unwrap_single(ExprKind::Or, splice_same_kind(ExprKind::Or, nodes)),
        other => other,
    }
}

fn splice_same_kind<T>(kind: ExprKind, nodes: Vec<Expr<T>>) -> Vec<Expr<T>> {
    let mut out = Vec::with_capacity(nodes.len());
    for node in nodes {
        match node {
            Expr::And(inner) if kind == ExprKind::And => out.extend(inner),
            Expr::Or(inner) if kind == ExprKind::Or => out.extend(inner),
            other => out.push(other),
        }
    }
    out
}

fn unwrap_single<T>(kind: ExprKind, mut nodes: Vec<Expr<T>>) -> Expr<T> {
    if nodes.len() == 1 {
        if let Some(only) = nodes.pop() {
            return only;
        }
    }
    Expr::group(kind, nodes)
}

fn reflatten<T>(expr: Expr<T>) -> Expr<T> {
    match expr.accept(&mut Reflatten) {
        Ok(expr) => expr,
        Err(never) => match never {},
    }
}

struct Reflatten;

impl<T> ExprVisitor<T> for Reflatten {
    type Error = Infallible;

    fn exit(&mut self, expr: Expr<T>) -> std::result::Result<Expr<T>, Infallible> {
        Ok(simplify(expr))
    }
}

/// Distributes `and` over `or`, bottom-up.
struct Distribute;

impl<T: Clone> ExprVisitor<T> for Distribute {
    type Error = Error;

    fn exit(&mut self, expr: Expr<T>) -> Result<Expr<T>> {
        match simplify(expr) {
            Expr::And(nodes) if nodes.iter().any(|node| node.kind() == ExprKind::Or) => {
                Ok(simplify(distribute(nodes)?))
            }
            other => Ok(other),
        }
    }
}

/// Cartesian product of the children's clause lists, walked with a
/// mixed-radix counter whose last digit turns fastest.
fn distribute<T: Clone>(nodes: Vec<Expr<T>>) -> Result<Expr<T>> {
    let clause_lists: Vec<Vec<Expr<T>>> = nodes
        .into_iter()
        .map(|node| match node {
            Expr::Or(clauses) => clauses,
            other => vec![other],
        })
        .collect();

    let radices: Vec<usize> = clause_lists.iter().map(Vec::len).collect();
    let total = radices
        .iter()
        .try_fold(1u64, |acc, &radix| acc.checked_mul(radix as u64))
        .ok_or_else(|| {
            Error::Overflow(format!(
                "Too many combinations while distributing into DNF: the product of {:?} exceeds {}",
                radices,
                u64::MAX
            ))
        })?;
    trace!(?radices, total, "distributing conjunction");

    let total = usize::try_from(total).map_err(|_| {
        Error::Overflow(format!(
            "Too many combinations while distributing into DNF: {} exceeds {}",
            total,
            usize::MAX
        ))
    })?;

    let mut digits = vec![0usize; clause_lists.len()];
    let mut combinations = Vec::new();
    combinations.try_reserve(total).map_err(|err| {
        Error::Overflow(format!(
            "Too many combinations while distributing into DNF: {} ({})",
            total, err
        ))
    })?;
    for _ in 0..total {
        let mut conjunction = Vec::new();
        for (list, &digit) in clause_lists.iter().zip(&digits) {
            match &list[digit] {
                Expr::And(inner) => conjunction.extend(inner.iter().cloned()),
                other => conjunction.push(other.clone()),
            }
        }
        combinations.push(Expr::And(conjunction));

        for position in (0..digits.len()).rev() {
            digits[position] += 1;
            if digits[position] < radices[position] {
                break;
            }
            digits[position] = 0;
        }
    }

    Ok(Expr::Or(combinations))
}

/// Forces `outer` of `inner` at the root, wrapping stray nodes in singleton groups.
fn normalize_shape<T>(expr: Expr<T>, outer: ExprKind, inner: ExprKind) -> Expr<T> {
    let wrap = |node: Expr<T>| {
        if node.kind() == inner {
            node
        } else {
            Expr::group(inner, vec![node])
        }
    };

    match expr {
        Expr::None => Expr::group(outer, Vec::new()),
        Expr::And(nodes) if outer == ExprKind::And => {
            Expr::group(outer, nodes.into_iter().map(wrap).collect())
        }
        Expr::Or(nodes) if outer == ExprKind::Or => {
            Expr::group(outer, nodes.into_iter().map(wrap).collect())
        }
        other => Expr::group(outer, vec![wrap(other)]),
    }
}

/// Replaces siblings equivalent to an earlier sibling with `none`, then compacts.
pub fn dedupe<T: PartialEq>(expr: Expr<T>) -> Expr<T> {
    compact(dedupe_siblings(expr))
}

fn dedupe_siblings<T: PartialEq>(expr: Expr<T>) -> Expr<T> {
    match expr {
        Expr::Not(inner) => Expr::Not(Box::new(dedupe_siblings(*inner))),
        Expr::And(nodes) => Expr::And(tombstone_duplicates(nodes)),
        Expr::Or(nodes) => Expr::Or(tombstone_duplicates(nodes)),
        other => other,
    }
}

fn tombstone_duplicates<T: PartialEq>(nodes: Vec<Expr<T>>) -> Vec<Expr<T>> {
    let mut nodes: Vec<Expr<T>> = nodes
        .into_iter()
        .map(|node| compact(dedupe_siblings(node)))
        .collect();
    for i in 1..nodes.len() {
        let duplicate = nodes[..i]
            .iter()
            .any(|earlier| !earlier.is_none() && equivalent(earlier, &nodes[i]));
        if duplicate {
            nodes[i] = Expr::None;
        }
    }
    nodes
}

/// Structural equality that treats `and`/`or` children as multisets.
pub fn equivalent<T: PartialEq>(a: &Expr<T>, b: &Expr<T>) -> bool {
    match (a, b) {
        (Expr::Lit(x), Expr::Lit(y)) => x == y,
        (Expr::Not(x), Expr::Not(y)) => equivalent(x, y),
        (Expr::And(xs), Expr::And(ys)) | (Expr::Or(xs), Expr::Or(ys)) => same_members(xs, ys),
        (Expr::None, Expr::None) => true,
        _ => false,
    }
}

fn same_members<T: PartialEq>(xs: &[Expr<T>], ys: &[Expr<T>]) -> bool {
    if xs.len() != ys.len() {
        return false;
    }
    let mut used = vec![false; ys.len()];
    xs.iter().all(|x| {
        let found = ys
            .iter()
            .enumerate()
            .find(|(idx, y)| !used[*idx] && equivalent(x, y))
            .map(|(idx, _)| idx);
        match found {
            Some(idx) => {
                used[idx] = true;
                true
            }
            None => false,
        }
    })
}

/// Drops tombstones. Empty groups and negated tombstones become `none`.
pub fn compact<T>(expr: Expr<T>) -> Expr<T> {
    match expr {
        Expr::Not(inner) => match compact(*inner) {
            Expr::None => Expr::None,
            inner => Expr::Not(Box::new(inner)),
        },
        Expr::And(nodes) => compact_group(ExprKind::And, nodes),
        Expr::Or(nodes) => compact_group(ExprKind::Or, nodes),
        other => other,
    }
}

fn compact_group<T>(kind: ExprKind, nodes: Vec<Expr<T>>) -> Expr<T> {
    let nodes: Vec<Expr<T>> = nodes
        .into_iter()
        .map(compact)
        .filter(|node| !node.is_none())
        .collect();
    if nodes.is_empty() {
        Expr::None
    } else {
        Expr::group(kind, nodes)
    }
}

/// Absorption over an `outer` group of `inner` clauses: `A | (A & B) = A`,
/// and dually `A & (A | B) = A`. A clause whose members include all members
/// of a sibling is dropped; of two equal clauses the later one goes.
pub fn eliminate_supersets<T: PartialEq>(
    expr: Expr<T>,
    outer: ExprKind,
    inner: ExprKind,
) -> Expr<T> {
    if expr.kind() != outer {
        return expr;
    }
    let clauses = match expr {
        Expr::And(nodes) | Expr::Or(nodes) => nodes,
        other => return other,
    };

    let mut removed = vec![false; clauses.len()];
    for i in 0..clauses.len() {
        if removed[i] {
            continue;
        }
        let one = members(&clauses[i], inner);
        for j in i + 1..clauses.len() {
            if removed[j] {
                continue;
            }
            let two = members(&clauses[j], inner);
            let shared = two
                .iter()
                .filter(|member| one.iter().any(|other| equivalent(member, other)))
                .count();
            if shared == one.len() {
                removed[j] = true;
            } else if shared == two.len() {
                removed[i] = true;
                break;
            }
        }
    }

    let kept = clauses
        .into_iter()
        .zip(removed)
        .filter_map(|(clause, removed)| (!removed).then_some(clause))
        .collect();
    Expr::group(outer, kept)
}

fn members<T>(clause: &Expr<T>, inner: ExprKind) -> Vec<&Expr<T>> {
    if clause.kind() == inner {
        clause.children().iter().collect()
    } else {
        vec![clause]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{and, lit, none, not, or};
    use pretty_assertions::assert_eq;

    #[test]
    fn de_morgan_over_or() {
        assert_eq!(
            to_dnf(not(or(vec![lit(1), lit(2)]))).unwrap(),
            or(vec![and(vec![not(lit(1)), not(lit(2))])])
        );
    }

    #[test]
    fn nnf_handles_nested_negations() {
        assert_eq!(
            to_nnf(not(not(and(vec![lit(1), not(or(vec![lit(2), lit(3)]))])))),
            and(vec![lit(1), not(lit(2)), not(lit(3))])
        );
        assert_eq!(
            to_nnf(not(not(not(and(vec![lit(1), lit(2)]))))),
            or(vec![not(lit(1)), not(lit(2))])
        );
    }

    #[test]
    fn distributes_in_odometer_order() {
        let expr = and(vec![
            or(vec![lit(1), lit(2)]),
            or(vec![lit(3), lit(4)]),
            or(vec![lit(5), lit(6)]),
        ]);
        let clause = |a, b, c| and(vec![lit(a), lit(b), lit(c)]);
        assert_eq!(
            to_dnf(expr).unwrap(),
            or(vec![
                clause(1, 3, 5),
                clause(1, 3, 6),
                clause(1, 4, 5),
                clause(1, 4, 6),
                clause(2, 3, 5),
                clause(2, 3, 6),
                clause(2, 4, 5),
                clause(2, 4, 6),
            ])
        );
    }

    #[test]
    fn distributes_with_plain_literals_and_uneven_arity() {
        let expr = and(vec![
            lit(0),
            or(vec![lit(1), and(vec![lit(2), lit(3)]), lit(4)]),
            or(vec![lit(5), lit(6)]),
        ]);
        let dnf = to_dnf(expr).unwrap();
        assert_eq!(dnf.children().len(), 6);
        assert_eq!(
            dnf.children()[2],
            and(vec![lit(0), lit(2), lit(3), lit(5)])
        );
    }

    #[test]
    fn overflow_is_an_error() {
        let expr = and((0..65).map(|n| or(vec![lit(2 * n), lit(2 * n + 1)])).collect());
        match to_dnf(expr) {
            Err(Error::Overflow(message)) => {
                assert!(message.contains("18446744073709551615"), "{}", message)
            }
            other => panic!("expected overflow, got {:?}", other.map(|e| e.kind())),
        }
    }

    #[test]
    fn unallocatable_product_is_an_error() {
        let expr = and((0..60).map(|n| or(vec![lit(2 * n), lit(2 * n + 1)])).collect());
        assert!(matches!(to_dnf(expr), Err(Error::Overflow(_))));
    }

    #[test]
    fn literals_are_wrapped_into_clauses() {
        assert_eq!(to_dnf(lit('a')).unwrap(), or(vec![and(vec![lit('a')])]));
        assert_eq!(
            to_dnf(or(vec![lit('a'), not(lit('b'))])).unwrap(),
            or(vec![and(vec![lit('a')]), and(vec![not(lit('b'))])])
        );
    }

    #[test]
    fn duplicates_are_removed() {
        assert_eq!(
            to_dnf(or(vec![
                and(vec![lit(1), lit(2), lit(1)]),
                and(vec![lit(2), lit(1)]),
                lit(3),
            ]))
            .unwrap(),
            or(vec![and(vec![lit(1), lit(2)]), and(vec![lit(3)])])
        );
    }

    #[test]
    fn supersets_are_eliminated() {
        let expr = or(vec![
            and(vec![lit(1), lit(2)]),
            and(vec![lit(1), lit(2), lit(3)]),
        ]);
        assert_eq!(
            eliminate_supersets(expr, ExprKind::Or, ExprKind::And),
            or(vec![and(vec![lit(1), lit(2)])])
        );

        let expr = or(vec![
            and(vec![lit(1), lit(2), lit(3)]),
            and(vec![lit(4)]),
            and(vec![lit(3), lit(1)]),
        ]);
        assert_eq!(
            eliminate_supersets(expr, ExprKind::Or, ExprKind::And),
            or(vec![and(vec![lit(4)]), and(vec![lit(3), lit(1)])])
        );
    }

    #[test]
    fn supersets_in_the_dual_shape() {
        let expr = and(vec![or(vec![lit('a'), lit('b')]), lit('a')]);
        assert_eq!(
            eliminate_supersets(expr, ExprKind::And, ExprKind::Or),
            and(vec![lit('a')])
        );
    }

    #[test]
    fn absorption_through_to_dnf() {
        // a | (a & b)
        let expr = or(vec![lit(1), and(vec![lit(1), lit(2)])]);
        assert_eq!(to_dnf(expr).unwrap(), or(vec![and(vec![lit(1)])]));
    }

    #[test]
    fn compact_collapses_tombstones() {
        assert_eq!(compact(and(vec![none::<u8>(), none()])), none());
        assert_eq!(compact(not(or(vec![none::<u8>()]))), none());
        assert_eq!(compact(or(vec![lit(1), none()])), or(vec![lit(1)]));
    }

    #[test]
    fn nothing_left_is_none() {
        assert_eq!(to_dnf(or(Vec::<Expr<u8>>::new())).unwrap(), none());
    }
}
