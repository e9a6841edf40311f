//! Shared helpers: a mock Rapport service and ready-to-use agents.

#![allow(dead_code)]

use rapport::agent::Agent;
use rapport::config::AgentConfig;
use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const API_KEY: &str = "rk-test-key";

/// Config pointed at the mock server, warnings off.
pub fn config(server: &MockServer) -> AgentConfig {
    AgentConfig::new(API_KEY)
        .with_base_url(server.uri())
        .with_suppress_warnings(true)
}

/// Mount a successful verification and a usage response.
pub async fn mount_init(server: &MockServer, messages: i64, sorts: i64, rewrites: i64) {
    Mock::given(method("POST"))
        .and(path("/verify"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "valid": true })))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/usage"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "limits": {
                "messages": { "remaining": messages },
                "sorts": { "remaining": sorts },
                "rewrites": { "remaining": rewrites }
            }
        })))
        .mount(server)
        .await;
}

/// An initialized agent with generous quota.
pub async fn ready_agent(server: &MockServer) -> Agent {
    mount_init(server, 100, 100, 100).await;
    Agent::connect(config(server)).await.expect("agent initializes")
}

/// JSON bodies of every request the server saw on `endpoint`.
pub async fn bodies(server: &MockServer, endpoint: &str) -> Vec<Value> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .filter(|req| req.url.path() == endpoint)
        .map(|req| req.body_json::<Value>().expect("json body"))
        .collect()
}

/// A bare HTTP/1.1 server that answers verify and usage normally. On any
/// other path it sends `partial` as the first chunk of a chunked body and
/// then hangs up without the terminating chunk. Returns the base URL.
pub async fn truncated_stream_server(partial: &'static str) -> String {
    use tokio::io::AsyncWriteExt;

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                let reply = match read_request_path(&mut socket).await.as_str() {
                    "/verify" => json_reply(r#"{"valid":true}"#),
                    "/usage" => json_reply(r#"{"limits":{"messages":{"remaining":10}}}"#),
                    _ => format!(
                        "HTTP/1.1 200 OK\r\ncontent-type: application/x-ndjson\r\n\
                         transfer-encoding: chunked\r\nconnection: close\r\n\r\n\
                         {:x}\r\n{partial}\r\n",
                        partial.len()
                    ),
                };
                let _ = socket.write_all(reply.as_bytes()).await;
                let _ = socket.flush().await;
            });
        }
    });
    format!("http://{addr}")
}

fn json_reply(body: &str) -> String {
    format!(
        "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\n\
         connection: close\r\n\r\n{body}",
        body.len()
    )
}

/// Read one request in full and return its path.
async fn read_request_path(socket: &mut tokio::net::TcpStream) -> String {
    use tokio::io::AsyncReadExt;

    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    let head_end = loop {
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
        match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => return String::new(),
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    };

    let head = String::from_utf8_lossy(&buf[..head_end]).to_string();
    let content_length = head
        .lines()
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse::<usize>().ok())
        .unwrap_or(0);
    while buf.len() < head_end + content_length {
        match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    }

    head.split_whitespace().nth(1).unwrap_or_default().to_string()
}
