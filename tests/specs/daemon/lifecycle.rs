use crate::prelude::*;

#[test]
fn status_reports_not_running_before_start() {
    Project::empty()
        .quaero()
        .args(&["daemon", "status"])
        .passes()
        .stdout_has("not running");
}

#[test]
fn start_then_status_then_stop() {
    let project = Project::empty();

    project
        .quaero()
        .args(&["daemon", "start"])
        .passes()
        .stdout_has("started");

    let socket = project.state_path().join("daemon.sock");
    assert!(socket.exists(), "daemon.sock should exist after start");

    project
        .quaero()
        .args(&["daemon", "status"])
        .passes()
        .stdout_has("running");

    project
        .quaero()
        .args(&["daemon", "stop"])
        .passes()
        .stdout_has("stopped");

    let stopped = wait_for(SPEC_WAIT_MAX_MS, || !socket.exists());
    assert!(stopped, "daemon.sock should be removed after stop");
}

#[test]
fn starting_twice_is_a_no_op() {
    let project = Project::empty();

    project.quaero().args(&["daemon", "start"]).passes();
    project
        .quaero()
        .args(&["daemon", "start"])
        .passes()
        .stdout_has("already running");
}

#[test]
fn a_command_auto_starts_the_daemon() {
    let project = Project::empty();

    project
        .quaero()
        .args(&["list"])
        .passes();

    let socket = project.state_path().join("daemon.sock");
    assert!(socket.exists(), "first command should have auto-started the daemon");
}
