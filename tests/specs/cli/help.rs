use crate::prelude::*;

#[test]
fn bare_invocation_prints_help_and_exits_zero() {
    cli()
        .passes()
        .stdout_has("Actions:")
        .stdout_has("submit");
}

#[test]
fn help_flag_lists_every_command() {
    let stdout = cli().args(&["--help"]).passes().stdout();
    for name in ["submit", "get", "list", "logs", "kv", "daemon"] {
        assert!(stdout.contains(name), "help missing '{name}':\n{stdout}");
    }
}

#[test]
fn version_flag_prints_a_version() {
    cli().args(&["-v"]).passes();
}
