//! Integration test: start the gateway from a config directory on a free port, GET /, assert health JSON.
//! Does not require a running engine. The server task is left running when the test ends.

use bridge::config::{load_config, Config};
use bridge::gateway;
use std::path::PathBuf;
use std::time::Duration;

fn free_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind free port");
    listener.local_addr().expect("local_addr").port()
}

fn temp_config_dir(config_json: &str, credentials_yaml: Option<&str>) -> (PathBuf, PathBuf) {
    let dir = std::env::temp_dir().join(format!("eva-bridge-test-{}", uuid::Uuid::new_v4()));
    std::fs::create_dir_all(&dir).expect("create config dir");
    let config_path = dir.join("config.json");
    std::fs::write(&config_path, config_json).expect("write config.json");
    if let Some(yaml) = credentials_yaml {
        std::fs::write(dir.join("credentials.yml"), yaml).expect("write credentials.yml");
    }
    (dir, config_path)
}

#[tokio::test]
async fn gateway_health_http_responds_with_running() {
    let port = free_port();
    let config_json = format!(
        r#"{{"gateway":{{"port":{},"bind":"127.0.0.1"}},"engine":{{"url":"http://127.0.0.1:9/webhook"}}}}"#,
        port
    );
    let (_dir, config_path) = temp_config_dir(
        &config_json,
        Some("evachannel:\n  url: http://127.0.0.1:9/send\nwebchannel:\n  url: http://127.0.0.1:9/send\n  access_token: t\n"),
    );
    let (config, path) = load_config(Some(config_path)).expect("load config");

    let gateway_handle = tokio::spawn(async move {
        let _ = gateway::run_gateway(config, path).await;
    });

    let url = format!("http://127.0.0.1:{}/", port);
    let client = reqwest::Client::new();
    let mut last_err = None;
    for _ in 0..100 {
        match client.get(&url).send().await {
            Ok(resp) if resp.status().is_success() => {
                let json: serde_json::Value = resp.json().await.expect("parse JSON");
                assert_eq!(json.get("runtime").and_then(|v| v.as_str()), Some("running"));
                assert_eq!(json.get("port").and_then(|v| v.as_u64()), Some(port as u64));
                assert_eq!(
                    json.get("channels"),
                    Some(&serde_json::json!(["evachannel", "webchannel"]))
                );
                return;
            }
            Ok(_) => {}
            Err(e) => last_err = Some(e),
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    gateway_handle.abort();
    panic!(
        "GET {} did not return 200 with health JSON within 5s; last error: {:?}",
        url, last_err
    );
}

#[tokio::test]
async fn gateway_refuses_to_start_without_channels() {
    let (_dir, config_path) = temp_config_dir("{}", None);
    let mut config = Config::default();
    config.gateway.port = free_port();
    config.engine.url = Some("http://127.0.0.1:9/webhook".to_string());

    let err = gateway::run_gateway(config, config_path)
        .await
        .expect_err("no channels configured");
    assert!(err.to_string().contains("no channels configured"));
}
