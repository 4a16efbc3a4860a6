use crate::prelude::*;

#[test]
fn submit_rejects_a_missing_file() {
    Project::empty()
        .quaero()
        .args(&["submit", "does-not-exist.json"])
        .fails()
        .stderr_has("reading");
}

#[test]
fn submit_rejects_invalid_json() {
    let project = Project::empty();
    project.file("bad.json", "not json");
    project
        .quaero()
        .args(&["submit", "bad.json"])
        .fails()
        .stderr_has("parsing");
}

#[test]
fn list_rejects_an_unknown_status() {
    Project::empty()
        .quaero()
        .args(&["list", "--status", "sideways"])
        .fails()
        .stderr_has("invalid status");
}

#[test]
fn logs_rejects_an_unknown_level() {
    Project::empty()
        .quaero()
        .args(&["logs", "job-1", "crawl", "--level", "shout"])
        .fails()
        .stderr_has("invalid level");
}

#[test]
fn kv_requires_a_subcommand() {
    Project::empty().quaero().args(&["kv"]).fails();
}

#[test]
fn unknown_top_level_command_fails() {
    Project::empty()
        .quaero()
        .args(&["not-a-command"])
        .fails();
}
