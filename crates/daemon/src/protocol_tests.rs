use super::*;
use quaero_core::DefinitionId;

fn sample_job_summary() -> JobSummary {
    JobSummary {
        job_id: JobId::new("job-1"),
        parent_id: None,
        step_name: "s1".into(),
        phase: JobPhase::Execution,
        status: JobStatus::Completed,
        child_count: 0,
        completed_children: 0,
        failed_children: 0,
        document_count: 3,
        error: None,
    }
}

#[test]
fn request_round_trips_through_json_with_tagged_command() {
    let request = Request::GetJob {
        job_id: JobId::new("job-1"),
    };
    let json = serde_json::to_value(&request).unwrap();
    assert_eq!(json["command"], "get_job");
    let back: Request = serde_json::from_value(json).unwrap();
    assert!(matches!(back, Request::GetJob { job_id } if job_id == JobId::new("job-1")));
}

#[test]
fn submit_definition_carries_the_full_definition() {
    let definition = JobDefinition {
        id: DefinitionId::new("def-1"),
        name: "test".into(),
        enabled: true,
        tags: vec![],
        auth_id: String::new(),
        steps: vec![],
    };
    let request = Request::SubmitDefinition {
        definition: definition.clone(),
    };
    let json = serde_json::to_string(&request).unwrap();
    let back: Request = serde_json::from_str(&json).unwrap();
    match back {
        Request::SubmitDefinition { definition: got } => assert_eq!(got.id, definition.id),
        other => panic!("unexpected request: {other:?}"),
    }
}

#[test]
fn response_round_trips_with_tagged_result() {
    let response = Response::Job {
        job: sample_job_summary(),
    };
    let json = serde_json::to_value(&response).unwrap();
    assert_eq!(json["result"], "job");
    let back: Response = serde_json::from_value(json).unwrap();
    assert!(matches!(back, Response::Job { .. }));
}

#[test]
fn error_helper_builds_a_tagged_error_response() {
    let response = Response::error(ErrorKind::NotFound, "no such job");
    match response {
        Response::Error { kind, message } => {
            assert_eq!(kind, ErrorKind::NotFound);
            assert_eq!(message, "no such job");
        }
        other => panic!("unexpected response: {other:?}"),
    }
}
