//! Tests for constraint parsing and matching.

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use simple_test_case::test_case;
use static_assertions::assert_impl_all;

use relaxed_semver::{
    BasicDependency, Constraint, ConstraintParseErrorKind, RelaxedVersion, Version, constraint,
    parse_constraint, version,
};

assert_impl_all!(Constraint: Send, Sync, Clone);

#[test_case(constraint!(Equal => version!(1, 2, 3)), "1.2.3", true; "equal")]
#[test_case(constraint!(Equal => version!(1, 2, 3)), "1.2.3+b", true; "equal_ignores_build")]
#[test_case(constraint!(Equal => version!("1.2")), "1.2.0", true; "equal_elided")]
#[test_case(constraint!(Equal => version!(1, 2, 3)), "1.2.4", false; "not_equal")]
#[test_case(constraint!(Less => version!(1, 2, 3)), "1.2.2", true; "less")]
#[test_case(constraint!(Less => version!(1, 2, 3)), "1.2.3-rc", true; "less_prerelease")]
#[test_case(constraint!(Less => version!(1, 2, 3)), "1.2.3", false; "not_less")]
#[test_case(constraint!(LessOrEqual => version!(1, 2, 3)), "1.2.3", true; "less_or_equal")]
#[test_case(constraint!(Greater => version!(1, 2, 3)), "1.2.4", true; "greater")]
#[test_case(constraint!(Greater => version!(1, 2, 3)), "1.2.3", false; "not_greater")]
#[test_case(constraint!(GreaterOrEqual => version!(1, 2, 3)), "1.2.3", true; "greater_or_equal")]
#[test_case(constraint!(Compatible => version!(1, 2, 3)), "1.9.0", true; "compatible")]
#[test_case(Constraint::True, "0.0.0-alpha", true; "always")]
#[test]
fn matches(constraint: Constraint, target: &str, expected: bool) {
    pretty_assertions::assert_eq!(
        expected,
        constraint.matches(&version!(target)),
        "'{target}' against '{constraint}'"
    );
}

#[test_case("=1.3.0", "1.3.0", true; "equal")]
#[test_case("=1.3.0", "1.3.1", false; "equal_mismatch")]
#[test_case(">=1.3.0", "1.3.0", true; "greater_or_equal")]
#[test_case(">=1.3.0", "1.2.9", false; "greater_or_equal_below")]
#[test_case("<=1.3.0", "1.3.0", true; "less_or_equal")]
#[test_case("!=1.3.0", "1.3.1", true; "negated")]
#[test_case("!(=1.3.0)", "1.3.0", false; "negated_group")]
#[test_case(">1.0.0 && <2.0.0", "1.5.0", true; "range")]
#[test_case(">1.0.0 && <2.0.0", "2.0.0", false; "range_upper")]
#[test_case("<1.0.0 || >2.0.0", "2.0.1", true; "outside_range")]
#[test_case("<1.0.0 || >2.0.0", "1.5.0", false; "inside_range")]
#[test_case("(=1.2.4 || !>1.3.0) && =1.2.0", "1.2.0", true; "grouped")]
#[test_case("", "3.2.1", true; "empty")]
#[test]
fn parse_and_match(input: &str, target: &str, expected: bool) {
    let constraint = parse_constraint(input).expect("must parse");
    pretty_assertions::assert_eq!(expected, constraint.matches(&version!(target)));
}

#[test_case("1.2.3", false; "below_patch")]
#[test_case("1.3.2", false; "below_prerelease")]
#[test_case("1.3.4-rc.1", false; "earlier_prerelease")]
#[test_case("1.3.4-rc.3", true; "bound")]
#[test_case("1.3.4-rc.5", true; "later_prerelease")]
#[test_case("1.3.4", true; "release")]
#[test_case("1.3.6", true; "patch")]
#[test_case("1.4.0", true; "minor")]
#[test_case("1.4.5", true; "minor_patch")]
#[test_case("1.4.5-rc.2", true; "minor_prerelease")]
#[test_case("2.0.0", false; "major")]
#[test]
fn compatible_with_prerelease_bound(target: &str, expected: bool) {
    let constraint = parse_constraint("^1.3.4-rc.3").expect("must parse");
    pretty_assertions::assert_eq!(expected, constraint.matches(&version!(target)));
}

#[test_case("1.2.3", true; "valid")]
#[test_case("r1234", false; "custom")]
#[test]
fn matches_relaxed_target(target: &str, expected: bool) {
    let constraint = constraint!(">=1.0.0");
    pretty_assertions::assert_eq!(expected, constraint.matches(&RelaxedVersion::parse(target)));
}

#[test]
fn custom_target_sorts_below_versions() {
    let custom = RelaxedVersion::parse("r1234");
    assert!(constraint!("<0.0.1").matches(&custom));
    assert!(!constraint!("^0").matches(&custom));
    assert!(!constraint!("=0").matches(&custom));
}

#[test]
fn relaxed_constraint() {
    let constraint = constraint!(Equal => RelaxedVersion::parse("r1234"));
    assert!(constraint.matches(&RelaxedVersion::parse("r1234")));
    assert!(!constraint.matches(&RelaxedVersion::parse("r1235")));
    assert_eq!("=r1234", constraint.to_string());

    let relaxed = parse_constraint("^1.2")
        .expect("must parse")
        .map(&|v: Version| RelaxedVersion::from(v));
    assert!(relaxed.matches(&RelaxedVersion::parse("1.5")));
    assert!(!relaxed.matches(&RelaxedVersion::parse("1.5.x")));
}

#[test_case("1.0.0"; "missing_operator")]
#[test_case("= 1.0.0"; "space_after_operator")]
#[test_case(">= 1.0.0"; "space_after_two_char_operator")]
#[test_case(">>1.0.0"; "doubled_operator")]
#[test_case(">1.0.0 =2.0.0"; "missing_conjunction")]
#[test_case(">1.0.0 &"; "single_ampersand")]
#[test_case("^1.1.1.1"; "invalid_version")]
#[test_case("!1.0.0"; "negated_bare_version")]
#[test_case(">1.0.0 && 2.0.0"; "and_bare_version")]
#[test_case(">1.0.0 | =2.0.0"; "single_pipe")]
#[test_case("(>1.0.0 | =2.0.0)"; "single_pipe_in_group")]
#[test_case("(>1.0.0 || =2.0.0"; "unclosed_group")]
#[test_case(">1.0.0 || 2.0.0"; "or_bare_version")]
#[test_case(">1.0.0)"; "unopened_group")]
#[test]
fn parse_invalid(input: &str) {
    let err = parse_constraint(input).expect_err("must fail");
    pretty_assertions::assert_eq!(input.trim(), err.input());
    let err = relaxed_semver::Error::from(err);
    assert!(err.to_string().starts_with("invalid constraint"), "{err}");
}

#[test]
fn invalid_version_keeps_source() {
    let err = parse_constraint("  <1.02  ").expect_err("must fail");
    let ConstraintParseErrorKind::InvalidVersion { version, error } = err.kind() else {
        panic!("unexpected error: {err:?}");
    };
    assert_eq!("1.02", version);
    assert_eq!("1.02", error.input());
    assert_eq!("1.02", err.remainder());
}

#[test_case("=1.3.0"; "equal")]
#[test_case(">=1.3.0"; "greater_or_equal")]
#[test_case("!(=1.4.0)"; "negated")]
#[test_case("(=1 || <2) && ^3"; "grouped")]
#[test_case("!(!(>1 && <2) || !=3)"; "nested_negation")]
#[test_case("=1 && =2 && =3 || =4 || !=5"; "flat")]
#[test]
fn render_roundtrip(input: &str) {
    let parsed = parse_constraint(input).expect("must parse");
    let rendered = parsed.to_string();
    let reparsed = parse_constraint(&rendered).expect("rendered text must parse");
    pretty_assertions::assert_eq!(parsed, reparsed);
    pretty_assertions::assert_eq!(rendered, reparsed.to_string());
}

#[test_case(Constraint::True.not(); "negated_true")]
#[test_case(Constraint::And(vec![Constraint::True, constraint!("=1")]); "true_in_and")]
#[test_case(Constraint::Or(vec![Constraint::True.not(), constraint!("<1")]); "negated_true_in_or")]
#[test_case(Constraint::And(vec![]); "empty_and")]
#[test_case(Constraint::Or(vec![]); "empty_or")]
#[test_case(Constraint::Or(vec![]).not(); "negated_empty_or")]
#[test_case(Constraint::And(vec![Constraint::Or(vec![]), Constraint::True]); "nested_empty")]
#[test]
fn render_built_roundtrip(constraint: Constraint) {
    let rendered = constraint.to_string();
    let reparsed = parse_constraint(&rendered).expect("rendered text must parse");
    pretty_assertions::assert_eq!(rendered, reparsed.to_string());
    for target in ["0.0.0-0", "0", "0.9.9", "1.0.0-rc.1", "1", "1.0.1", "2.3.4"] {
        let target = version!(target);
        pretty_assertions::assert_eq!(
            constraint.matches(&target),
            reparsed.matches(&target),
            "'{rendered}' against {target}"
        );
    }
}

#[test]
fn negated_true_serializes() {
    let dependency = BasicDependency::new("lib", Constraint::True.not());
    let json = serde_json::to_string(&dependency).expect("must serialize");
    let parsed = serde_json::from_str::<BasicDependency>(&json).expect("must deserialize");
    assert!(!parsed.constraint.matches(&version!("1.2.3")));
    assert!(!parsed.constraint.matches(&version!("0-0")));
}

fn leaf() -> impl Strategy<Value = Constraint> {
    let version = r"(0|[1-9][0-9]?)(\.(0|[1-9][0-9]?)){0,2}(-rc\.[1-9])?".prop_map(Version::must_parse);
    (0..7usize, version).prop_map(|(op, v)| match op {
        0 => Constraint::Equal(v),
        1 => Constraint::Less(v),
        2 => Constraint::LessOrEqual(v),
        3 => Constraint::Greater(v),
        4 => Constraint::GreaterOrEqual(v),
        5 => Constraint::Compatible(v),
        _ => Constraint::True,
    })
}

fn tree() -> impl Strategy<Value = Constraint> {
    leaf().prop_recursive(4, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 2..4).prop_map(Constraint::And),
            prop::collection::vec(inner.clone(), 2..4).prop_map(Constraint::Or),
            inner.prop_map(Constraint::not),
        ]
    })
}

fn target() -> impl Strategy<Value = Version> {
    r"(0|[1-9][0-9]?)\.(0|[1-9][0-9]?)\.(0|[1-9][0-9]?)(-rc\.[1-9])?".prop_map(Version::must_parse)
}

proptest! {
    #[test]
    fn rendered_tree_reparses(constraint in tree(), target in target()) {
        let rendered = constraint.to_string();
        let reparsed = parse_constraint(&rendered).expect("rendered text must parse");
        prop_assert_eq!(&rendered, &reparsed.to_string());
        prop_assert_eq!(constraint.matches(&target), reparsed.matches(&target));
    }

    #[test]
    fn negation_inverts(constraint in tree(), target in target()) {
        prop_assert_ne!(constraint.matches(&target), constraint.clone().not().matches(&target));
    }
}
