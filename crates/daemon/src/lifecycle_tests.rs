use super::*;
use crate::protocol::{Request, Response};
use crate::protocol_wire::{read_response, write_request};
use tempfile::tempdir;
use tokio::net::UnixStream;

fn test_config(data_dir: std::path::PathBuf) -> Config {
    let mut config = Config::load(data_dir).unwrap();
    // Bind to an OS-assigned port so parallel tests never collide.
    config.websocket_addr = "127.0.0.1:0".to_string();
    config
}

#[tokio::test]
async fn daemon_starts_and_stops_cleanly() {
    let dir = tempdir().unwrap();
    let config = test_config(dir.path().to_path_buf());
    let daemon = Daemon::start(config).await.unwrap();
    daemon.stop().await;
}

#[tokio::test]
async fn daemon_answers_ping_over_the_socket() {
    let dir = tempdir().unwrap();
    let config = test_config(dir.path().to_path_buf());
    let socket_path = config.socket_path.clone();
    let daemon = Daemon::start(config).await.unwrap();

    let mut stream = UnixStream::connect(&socket_path).await.unwrap();
    write_request(&mut stream, &Request::Ping).await.unwrap();
    let response = read_response(&mut stream).await.unwrap();
    assert!(matches!(response, Response::Pong));

    drop(stream);
    daemon.stop().await;
}

#[tokio::test]
async fn second_daemon_on_the_same_data_dir_refuses_to_start() {
    let dir = tempdir().unwrap();
    let first = Daemon::start(test_config(dir.path().to_path_buf()))
        .await
        .unwrap();

    let err = Daemon::start(test_config(dir.path().to_path_buf()))
        .await
        .unwrap_err();
    assert!(matches!(err, StartupError::AlreadyRunning(_)));

    first.stop().await;
}

#[tokio::test]
async fn checkpoint_on_shutdown_lets_the_next_start_recover_submitted_jobs() {
    let dir = tempdir().unwrap();
    let data_dir = dir.path().to_path_buf();

    let definition_json = serde_json::json!({
        "id": "checkpoint-recovery",
        "name": "checkpoint-recovery",
        "auth_id": "test-auth",
        "steps": [
            {
                "name": "crawl",
                "type": "crawler",
                "config": {"url": "https://example.invalid"},
            },
        ],
    });
    let definition: quaero_core::JobDefinition = serde_json::from_value(definition_json).unwrap();

    let job_id = {
        let config = test_config(data_dir.clone());
        let socket_path = config.socket_path.clone();
        let daemon = Daemon::start(config).await.unwrap();

        let mut stream = UnixStream::connect(&socket_path).await.unwrap();
        write_request(
            &mut stream,
            &Request::SubmitDefinition { definition },
        )
        .await
        .unwrap();
        let response = read_response(&mut stream).await.unwrap();
        let job_id = match response {
            Response::Job { job } => job.job_id,
            other => panic!("unexpected response: {other:?}"),
        };
        drop(stream);
        daemon.stop().await;
        job_id
    };

    let config = test_config(data_dir);
    let socket_path = config.socket_path.clone();
    let daemon = Daemon::start(config).await.unwrap();

    let mut stream = UnixStream::connect(&socket_path).await.unwrap();
    write_request(&mut stream, &Request::GetJob { job_id }).await.unwrap();
    let response = read_response(&mut stream).await.unwrap();
    assert!(matches!(response, Response::Job { .. }));

    drop(stream);
    daemon.stop().await;
}
