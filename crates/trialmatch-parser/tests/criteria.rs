//! Parsing curated criteria
//!
//! Covers nested composites, token lists, whitespace and every class of
//! syntax error, plus a Display round-trip property over generated trees.

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use rstest::rstest;
use trialmatch_diagnostics::{TM0001, TM0002, TM0003, TM0004, TM0005};
use trialmatch_parser::parse_criterion;
use trialmatch_types::{Parameter, Rule, RuleExpression};

#[test]
fn test_nested_criterion() {
    let text = "AND(IS_AT_LEAST_X_YEARS_OLD[18], OR(HAS_TUMOR_STAGE_X[III], HAS_TUMOR_STAGE_X[IV]), NOT(HAS_KNOWN_ACTIVE_CNS_METASTASES))";
    let expression = parse_criterion(text).unwrap();

    let expected = RuleExpression::composite(
        Rule::And,
        [
            RuleExpression::leaf(Rule::IsAtLeastXYearsOld, ["18"]),
            RuleExpression::composite(
                Rule::Or,
                [
                    RuleExpression::leaf(Rule::HasTumorStageX, ["III"]),
                    RuleExpression::leaf(Rule::HasTumorStageX, ["IV"]),
                ],
            ),
            RuleExpression::composite(
                Rule::Not,
                [RuleExpression::leaf(Rule::HasKnownActiveCnsMetastases, Vec::<String>::new())],
            ),
        ],
    );
    assert_eq!(expression, expected);
    assert_eq!(expression.to_string(), text);
}

#[test]
fn test_multiline_criterion() {
    let text = "FALLBACK(\n  HAS_HAD_CATEGORY_X_TREATMENT_OF_AT_LEAST_Y_LINES[IMMUNOTHERAPY, 2],\n  HAS_HAD_AT_LEAST_X_SYSTEMIC_TREATMENT_LINES[2]\n)";
    let expression = parse_criterion(text).unwrap();
    assert_eq!(expression.rule, Rule::Fallback);
    assert_eq!(expression.children().count(), 2);
    let first = expression.children().next().unwrap();
    assert_eq!(
        first.parameters,
        vec![Parameter::from("IMMUNOTHERAPY"), Parameter::from("2")]
    );
}

#[test]
fn test_parser_does_not_check_arity() {
    // arity is the resolver's concern; the parser only builds the tree
    let expression = parse_criterion("NOT(IS_MALE, IS_FEMALE)").unwrap();
    assert_eq!(expression.parameters.len(), 2);
}

#[test]
fn test_unknown_nested_rule_location() {
    let text = "OR(\n  IS_MALE,\n  IS_VERY_OLD)";
    let err = parse_criterion(text).unwrap_err();
    assert_eq!(err.code(), TM0003);
    let location = err.location().unwrap();
    assert_eq!((location.line, location.column), (3, 3));
    assert!(err.to_string().contains("IS_VERY_OLD"));
}

#[rstest]
#[case("", TM0002)]
#[case("   ", TM0002)]
#[case("AND(", TM0004)]
#[case("AND(IS_MALE]", TM0004)]
#[case("is_male", TM0001)]
#[case("AND()", TM0001)]
#[case("AND(IS_MALE,)", TM0001)]
#[case("OR(IS_MALE, [18])", TM0001)]
#[case("IS_MALE, IS_FEMALE", TM0005)]
#[case("HAS_TUMOR_STAGE_X[IV] extra", TM0005)]
#[case("NOT_A_RULE", TM0003)]
fn test_syntax_errors(#[case] text: &str, #[case] code: trialmatch_diagnostics::ErrorCode) {
    let err = parse_criterion(text).unwrap_err();
    assert_eq!(err.code(), code, "criterion {:?} gave {}", text, err);
    assert!(err.is_configuration_error());
}

fn leaf_rules() -> Vec<Rule> {
    Rule::ALL.iter().copied().filter(|r| !r.is_composite()).collect()
}

fn composite_rules() -> Vec<Rule> {
    Rule::ALL.iter().copied().filter(|r| r.is_composite()).collect()
}

fn expression_tree() -> impl Strategy<Value = RuleExpression> {
    let leaf = (
        prop::sample::select(leaf_rules()),
        prop::collection::vec("[A-Za-z0-9;.*:+-]{1,8}", 0..3),
    )
        .prop_map(|(rule, tokens)| RuleExpression::leaf(rule, tokens));

    leaf.prop_recursive(3, 16, 4, |inner| {
        (
            prop::sample::select(composite_rules()),
            prop::collection::vec(inner, 1..4),
        )
            .prop_map(|(rule, children)| RuleExpression::composite(rule, children))
    })
}

proptest! {
    #[test]
    fn display_round_trips(expression in expression_tree()) {
        let text = expression.to_string();
        let parsed = parse_criterion(&text).unwrap();
        prop_assert_eq!(parsed, expression);
    }
}
