//! `HttpCompletionClient` against a one-shot local HTTP responder.

use edgequake_pdftrans::pipeline::llm::{ChatMessage, ChatRequest};
use edgequake_pdftrans::{CompletionBackend, CompletionError, Credentials, HttpCompletionClient};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Serve one canned response; the join handle yields the raw request.
async fn respond_once(status_line: &str, body: &str) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());
    let response = format!(
        "HTTP/1.1 {status_line}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
        body.len()
    );

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let request = read_request(&mut socket).await;
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.ok();
        request
    });
    (base_url, handle)
}

async fn read_request(socket: &mut tokio::net::TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let n = socket.read(&mut chunk).await.unwrap();
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
        let text = String::from_utf8_lossy(&buf);
        if let Some(header_end) = text.find("\r\n\r\n") {
            let content_length = text[..header_end]
                .lines()
                .find_map(|l| {
                    let (name, value) = l.split_once(':')?;
                    name.eq_ignore_ascii_case("content-length")
                        .then(|| value.trim().parse::<usize>().ok())
                        .flatten()
                })
                .unwrap_or(0);
            if buf.len() >= header_end + 4 + content_length {
                break;
            }
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}

fn request() -> ChatRequest {
    ChatRequest {
        model: "gpt-4o-mini".into(),
        messages: vec![ChatMessage::system("sys"), ChatMessage::user("hello")],
        temperature: None,
    }
}

fn client() -> HttpCompletionClient {
    HttpCompletionClient::new(Duration::from_secs(10)).unwrap()
}

#[tokio::test]
async fn success_returns_trimmed_content_and_usage() {
    let body = r#"{"choices":[{"message":{"role":"assistant","content":"  Hallo Welt \n"}}],"usage":{"prompt_tokens":12,"completion_tokens":3}}"#;
    let (base_url, server) = respond_once("200 OK", body).await;
    let creds = Credentials::new("sk-secret", format!("{base_url}/"));

    let completion = client().complete(&creds, &request()).await.unwrap();
    assert_eq!(completion.content, "Hallo Welt");
    assert_eq!(completion.prompt_tokens, 12);
    assert_eq!(completion.completion_tokens, 3);

    let raw = server.await.unwrap();
    assert!(raw.starts_with("POST /v1/chat/completions "), "got: {raw}");
    assert!(
        raw.to_ascii_lowercase().contains("authorization: bearer sk-secret"),
        "got: {raw}"
    );
    assert!(raw.contains(r#""model":"gpt-4o-mini""#), "got: {raw}");
    assert!(!raw.contains("temperature"), "unset temperature is omitted");
}

#[tokio::test]
async fn error_status_carries_reason_and_remote_message() {
    let body = r#"{"error":{"message":"Incorrect API key provided","type":"invalid_request_error"}}"#;
    let (base_url, server) = respond_once("401 Unauthorized", body).await;
    let creds = Credentials::new("sk-wrong", base_url);

    let err = client().complete(&creds, &request()).await.unwrap_err();
    server.await.unwrap();
    assert_eq!(
        err,
        CompletionError::Api {
            status: 401,
            status_text: "Unauthorized".into(),
            remote_message: Some("Incorrect API key provided".into()),
        }
    );
    assert_eq!(
        err.to_string(),
        "API request failed: Unauthorized - Incorrect API key provided"
    );
}

#[tokio::test]
async fn non_json_error_body_has_no_remote_message() {
    let (base_url, server) = respond_once("500 Internal Server Error", "upstream exploded").await;
    let creds = Credentials::new("sk-test", base_url);

    let err = client().complete(&creds, &request()).await.unwrap_err();
    server.await.unwrap();
    assert_eq!(
        err,
        CompletionError::Api {
            status: 500,
            status_text: "Internal Server Error".into(),
            remote_message: None,
        }
    );
}

#[tokio::test]
async fn empty_choices_is_malformed() {
    let (base_url, server) = respond_once("200 OK", r#"{"choices":[]}"#).await;
    let creds = Credentials::new("sk-test", base_url);

    let err = client().complete(&creds, &request()).await.unwrap_err();
    server.await.unwrap();
    assert!(matches!(err, CompletionError::MalformedResponse { .. }), "got {err:?}");
}

#[tokio::test]
async fn unreachable_endpoint_is_a_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);
    let creds = Credentials::new("sk-test", base_url);

    let err = client().complete(&creds, &request()).await.unwrap_err();
    assert!(matches!(err, CompletionError::Transport { .. }), "got {err:?}");
}
