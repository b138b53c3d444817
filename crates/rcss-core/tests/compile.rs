use pretty_assertions::assert_eq;
use rcss_core::ast::{decl, style_rule, AstNode};
use rcss_core::dnf::{eliminate_supersets, to_dnf};
use rcss_core::expr::{and, lit, not, or, ExprKind};
use rcss_core::walk::{walk, WalkAction};
use rcss_core::{flatten_nesting, negate_rules, optimize_ast, parse, to_css, Error};
use rstest::rstest;

fn build(source: &str) -> String {
    let mut ast = parse(source).unwrap();
    flatten_nesting(&mut ast);
    to_css(&optimize_ast(ast))
}

#[test]
fn builds_card_fixture() {
    assert_eq!(
        build(include_str!("fixtures/card.rcss")),
        include_str!("fixtures/card.css")
    );
}

#[test]
fn negates_variant_fixture() {
    let ast = parse(include_str!("fixtures/variant.rcss")).unwrap();
    assert_eq!(
        to_css(&negate_rules(&ast).unwrap()),
        include_str!("fixtures/variant.css")
    );
}

#[test]
fn flattening_twice_changes_nothing() {
    let mut once = parse(include_str!("fixtures/card.rcss")).unwrap();
    flatten_nesting(&mut once);
    let mut twice = once.clone();
    flatten_nesting(&mut twice);
    assert_eq!(twice, once);
}

#[test]
fn negation_leaves_its_input_alone() {
    let ast = parse(include_str!("fixtures/variant.rcss")).unwrap();
    let before = ast.clone();
    negate_rules(&ast).unwrap();
    assert_eq!(ast, before);
}

#[rstest]
#[case("&:hover, &:focus {}", "&:not(*:hover, *:focus) {\n}\n")]
#[case("@media (min-width: 500px) {}", "@media not (min-width: 500px) {\n}\n")]
#[case("@supports not (display: grid) {}", "@supports (display: grid) {\n}\n")]
fn negates(#[case] source: &str, #[case] expected: &str) {
    let ast = parse(source).unwrap();
    assert_eq!(to_css(&negate_rules(&ast).unwrap()), expected);
}

#[test]
fn negation_fails_on_layer() {
    let ast = parse("@media (min-width: 500px) { @layer components {} }").unwrap();
    assert_eq!(
        negate_rules(&ast).unwrap_err(),
        Error::Structural("Unable to negate rule: @layer components".to_string())
    );
}

#[rstest]
#[case("\"abc", "Unterminated string: \"abc\"")]
#[case(".a { color: red; }}", "Missing opening {")]
#[case(".a { color: red;", "Missing closing } at .a")]
fn parse_errors_are_fatal(#[case] source: &str, #[case] message: &str) {
    let err = parse(source).unwrap_err();
    assert!(matches!(err, Error::Syntax(_)));
    assert_eq!(err.to_string(), message);
}

#[test]
fn walker_replacements_are_revisited() {
    let mut ast = vec![style_rule(".a", vec![decl("x", "1")])];
    let mut seen = Vec::new();
    walk(&mut ast, |node, _| {
        seen.push(node.header());
        match node {
            AstNode::Declaration { property, .. } if property == "x" => {
                WalkAction::Replace(vec![decl("y", "2"), decl("z", "3")])
            }
            _ => WalkAction::Continue,
        }
    });
    assert_eq!(seen, vec![".a", "x", "y", "z"]);
    assert_eq!(
        ast,
        vec![style_rule(".a", vec![decl("y", "2"), decl("z", "3")])]
    );
}

#[test]
fn dnf_of_negated_disjunction() {
    assert_eq!(
        to_dnf(not(or(vec![lit(1), lit(2)]))).unwrap(),
        or(vec![and(vec![not(lit(1)), not(lit(2))])])
    );
    assert_eq!(
        eliminate_supersets(
            or(vec![
                and(vec![lit(1), lit(2)]),
                and(vec![lit(1), lit(2), lit(3)])
            ]),
            ExprKind::Or,
            ExprKind::And,
        ),
        or(vec![and(vec![lit(1), lit(2)])])
    );
}
