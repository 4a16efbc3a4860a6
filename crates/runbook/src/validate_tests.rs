use super::*;
use quaero_core::{DefinitionId, StepSpec, WorkerKind};

fn step(name: &str, depends: &[&str]) -> StepSpec {
    StepSpec {
        name: name.to_string(),
        kind: WorkerKind::Crawler,
        depends: depends.iter().map(|s| s.to_string()).collect(),
        count: 0,
        filters: Default::default(),
        config: serde_json::json!({}),
        on_child_failure: Default::default(),
    }
}

fn definition(id: &str, steps: Vec<StepSpec>) -> JobDefinition {
    JobDefinition {
        id: DefinitionId::new(id),
        name: "test".to_string(),
        enabled: true,
        tags: vec![],
        auth_id: "acct".to_string(),
        steps,
    }
}

#[test]
fn valid_definition_passes() {
    let def = definition("d1", vec![step("s1", &[]), step("s2", &["s1"])]);
    assert!(validate_structure(&def).is_ok());
}

#[test]
fn empty_id_is_rejected() {
    let def = definition("", vec![step("s1", &[])]);
    assert_eq!(validate_structure(&def), Err(ValidationError::EmptyId));
}

#[test]
fn definition_with_no_steps_is_rejected() {
    let def = definition("d1", vec![]);
    assert_eq!(validate_structure(&def), Err(ValidationError::NoSteps));
}

#[test]
fn self_dependency_is_rejected() {
    let def = definition("d1", vec![step("s1", &["s1"])]);
    assert_eq!(
        validate_structure(&def),
        Err(ValidationError::SelfDependency("s1".to_string()))
    );
}

#[test]
fn unknown_dependency_is_rejected() {
    let def = definition("d1", vec![step("s1", &["ghost"])]);
    assert_eq!(
        validate_structure(&def),
        Err(ValidationError::UnknownDependency {
            step: "s1".to_string(),
            depends_on: "ghost".to_string(),
        })
    );
}
