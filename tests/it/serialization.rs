//! Tests for serde and schema support.

use pretty_assertions::assert_eq;
use serde_json::json;
use utoipa::ToSchema;

use relaxed_semver::{
    BasicDependency, BasicRelease, Constraint, RelaxedVersion, Version, constraint, version,
};

#[test]
fn version_as_string() {
    let version = version!("1.2.3-rc.1+b");
    let value = serde_json::to_value(&version).expect("must serialize");
    assert_eq!(json!("1.2.3-rc.1+b"), value);

    let parsed = serde_json::from_value::<Version>(value).expect("must deserialize");
    assert_eq!(version.as_str(), parsed.as_str());
}

#[test]
fn invalid_version_is_rejected() {
    let err = serde_json::from_value::<Version>(json!("1.2.x")).expect_err("must fail");
    assert!(err.to_string().contains("1.2.x"), "{err}");
}

#[test]
fn relaxed_version_falls_back_to_custom() {
    let version = serde_json::from_value::<RelaxedVersion>(json!("r1234")).expect("must deserialize");
    assert!(version.is_custom());
    assert_eq!(json!("r1234"), serde_json::to_value(&version).expect("must serialize"));

    let version = serde_json::from_value::<RelaxedVersion>(json!("1.2")).expect("must deserialize");
    assert!(!version.is_custom());
}

#[test]
fn constraint_as_expression() {
    let constraint = constraint!(">=1.0.0 && <2.0.0");
    let value = serde_json::to_value(&constraint).expect("must serialize");
    assert_eq!(json!("(>=1.0.0 && <2.0.0)"), value);

    let parsed = serde_json::from_value::<Constraint>(value).expect("must deserialize");
    assert_eq!(constraint, parsed);

    let err = serde_json::from_value::<Constraint>(json!(">=1.0.0 &&")).expect_err("must fail");
    assert!(err.to_string().contains("invalid constraint"), "{err}");
}

#[test]
fn release_round_trip() {
    let release = BasicRelease::builder()
        .name("app")
        .version(version!("1.0.0"))
        .dependencies(vec![
            BasicDependency::new("lib", constraint!("^1.2")),
            BasicDependency::new("any", Constraint::True),
        ])
        .build();

    let value = serde_json::to_value(&release).expect("must serialize");
    assert_eq!(
        json!({
            "name": "app",
            "version": "1.0.0",
            "dependencies": [
                { "name": "lib", "constraint": "^1.2" },
                { "name": "any", "constraint": "" },
            ],
        }),
        value
    );

    let parsed = serde_json::from_value::<BasicRelease>(value).expect("must deserialize");
    assert_eq!(release, parsed);
}

#[test]
fn release_defaults() {
    let release = serde_json::from_value::<BasicRelease>(json!({
        "name": "app",
        "version": "1.0",
        "dependencies": [{ "name": "lib" }],
    }))
    .expect("must deserialize");
    assert_eq!(vec![BasicDependency::new("lib", Constraint::True)], release.dependencies);

    let release = serde_json::from_value::<BasicRelease>(json!({ "name": "lib", "version": "2" }))
        .expect("must deserialize");
    assert!(release.dependencies.is_empty());
}

#[test]
fn schema_names() {
    assert_eq!("Version", Version::name());
    assert_eq!("RelaxedVersion", RelaxedVersion::name());
}
