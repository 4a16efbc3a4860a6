use crate::prelude::*;

#[test]
fn put_then_get_round_trips() {
    let project = Project::empty();

    project
        .quaero()
        .args(&["kv", "put", "greeting", "\"hello\""])
        .passes();

    project
        .quaero()
        .args(&["kv", "get", "greeting"])
        .passes()
        .stdout_has("hello");
}

#[test]
fn put_accepts_a_bare_string_value() {
    let project = Project::empty();

    project
        .quaero()
        .args(&["kv", "put", "name", "plain-text"])
        .passes();

    project
        .quaero()
        .args(&["kv", "get", "name"])
        .passes()
        .stdout_has("plain-text");
}

#[test]
fn get_of_an_unknown_key_fails() {
    Project::empty()
        .quaero()
        .args(&["kv", "get", "never-set"])
        .fails();
}
