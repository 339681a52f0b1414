//! Generation tests against the fixture model shared with `fluentfga-tests`.

use std::process::Command;

use fluentfga_codegen::{generate, AccessorPolicy};
use fluentfga_schema::{AuthorizationModel, RelationKind};

const FIXTURE: &str = include_str!("../../fluentfga-tests/fga-model.json");

fn fixture() -> AuthorizationModel {
    AuthorizationModel::from_json(FIXTURE).unwrap()
}

#[test]
fn test_fixture_relations_are_classified() {
    let model = fixture();

    let crm_person = model.type_definition("crm_person").unwrap();
    let direct: Vec<_> = crm_person.direct_relations().map(|r| r.name.as_str()).collect();
    let computed: Vec<_> = crm_person
        .computed_relations()
        .map(|r| r.name.as_str())
        .collect();
    assert_eq!(direct, vec!["blocked", "parent"]);
    assert_eq!(computed, vec!["edit", "editor", "owner", "read", "reader"]);

    let subscription = model.type_definition("subscription").unwrap();
    assert_eq!(
        subscription.relation("free_trial").unwrap().kind,
        RelationKind::Direct
    );
}

#[test]
fn test_fixture_generates_every_type() {
    let out = generate(&fixture(), &AccessorPolicy::default()).unwrap();

    for marker in ["pub struct User;", "pub struct CrmEmailAccount;"] {
        assert!(out.contains(marker), "missing {marker}");
    }
    for entity in [
        "pub struct Group {",
        "pub struct Team {",
        "pub struct Form {",
        "pub struct Document {",
        "pub struct CrmCompany {",
        "pub struct CrmPerson {",
        "pub struct Subscription {",
    ] {
        assert!(out.contains(entity), "missing {entity}");
    }

    assert!(out.contains("impl ::fluentfga::Accessor for Group {}"));
    assert!(out.contains("impl ::fluentfga::Accessor for Team {}"));
    assert!(!out.contains("impl ::fluentfga::Accessor for Form {}"));
    assert!(!out.contains("impl ::fluentfga::Accessor for CrmCompany {}"));

    assert!(out.contains(
        "const ELEMENTS: &'static [&'static str] = &[\"edit\", \"editor\", \"owner\", \"read\", \"reader\"];"
    ));
    assert!(out.contains("pub mod active_trial {"));
}

#[test]
fn test_policy_table_changes_classification() {
    let policy = AccessorPolicy::empty().with_type("crm_company");
    let out = generate(&fixture(), &policy).unwrap();

    assert!(out.contains("impl ::fluentfga::Accessor for CrmCompany {}"));
    assert!(!out.contains("impl ::fluentfga::Accessor for Group {}"));
    // Relation-less types stay accessors regardless of the table
    assert!(out.contains("impl ::fluentfga::Accessor for User {}"));
}

#[test]
fn test_binary_writes_generated_file() {
    let dir = tempfile::tempdir().unwrap();
    let schema = dir.path().join("fga-model.json");
    let out = dir.path().join("entities.rs");
    std::fs::write(&schema, FIXTURE).unwrap();

    let status = Command::new(env!("CARGO_BIN_EXE_fluentfga-codegen"))
        .arg("--schema")
        .arg(&schema)
        .arg("--out")
        .arg(&out)
        .arg("--accessor-type")
        .arg("crm_company")
        .status()
        .unwrap();
    assert!(status.success());

    let generated = std::fs::read_to_string(&out).unwrap();
    assert!(generated.starts_with("// @generated by fluentfga-codegen."));
    assert!(generated.contains("impl ::fluentfga::Accessor for CrmCompany {}"));
}

#[test]
fn test_binary_fails_on_missing_schema() {
    let status = Command::new(env!("CARGO_BIN_EXE_fluentfga-codegen"))
        .arg("--schema")
        .arg("/nonexistent/fga-model.json")
        .status()
        .unwrap();
    assert!(!status.success());
}
