use crate::prelude::*;

fn submit_and_get_job_id(project: &Project) -> String {
    project.file("definition.json", MINIMAL_DEFINITION);
    let stdout = project
        .quaero()
        .args(&["-o", "json", "submit", "definition.json"])
        .passes()
        .stdout();
    let jobs: serde_json::Value = serde_json::from_str(&stdout).expect("valid json");
    jobs.get(0)
        .and_then(|job| job.get("job_id"))
        .and_then(|v| v.as_str())
        .expect("submit response should include a job_id")
        .to_string()
}

#[test]
fn submit_then_get_shows_the_job() {
    let project = Project::empty();
    let job_id = submit_and_get_job_id(&project);

    project
        .quaero()
        .args(&["get", &job_id])
        .passes()
        .stdout_has(&job_id);
}

#[test]
fn submit_then_list_includes_the_job() {
    let project = Project::empty();
    let job_id = submit_and_get_job_id(&project);

    project
        .quaero()
        .args(&["list"])
        .passes()
        .stdout_has(&job_id);
}

#[test]
fn list_as_json_is_an_array() {
    let project = Project::empty();
    submit_and_get_job_id(&project);

    let stdout = project
        .quaero()
        .args(&["-o", "json", "list"])
        .passes()
        .stdout();

    let parsed: serde_json::Value = serde_json::from_str(&stdout).expect("valid json");
    assert!(parsed.is_array(), "expected a JSON array, got: {stdout}");
}

#[test]
fn logs_for_the_root_step_return_a_page() {
    let project = Project::empty();
    let job_id = submit_and_get_job_id(&project);

    project
        .quaero()
        .args(&["-o", "json", "logs", &job_id, "crawl"])
        .passes();
}

#[test]
fn get_for_an_unknown_job_fails() {
    Project::empty()
        .quaero()
        .args(&["get", "no-such-job"])
        .fails();
}
