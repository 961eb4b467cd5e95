//! HTTP driver tests against a scripted local endpoint.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use taleweaver_core::{ChatMessage, GenerateRequest, ModelConfig, ProviderKind};
use taleweaver_error::{ModelsErrorKind, TaleweaverErrorKind};
use taleweaver_interface::StoryDriver;
use taleweaver_models::{HttpStoryDriver, RetryPolicy};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// A captured request: head (request line + headers) and body.
#[derive(Debug, Clone)]
struct Captured {
    head: String,
    body: String,
}

/// Serve one scripted `(status, body)` per connection, recording what was received.
async fn serve(
    responses: Vec<(u16, String)>,
) -> anyhow::Result<(String, Arc<tokio::sync::Mutex<Vec<Captured>>>, Arc<AtomicUsize>)> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let captured = Arc::new(tokio::sync::Mutex::new(Vec::new()));
    let hits = Arc::new(AtomicUsize::new(0));

    let captured_task = captured.clone();
    let hits_task = hits.clone();
    tokio::spawn(async move {
        for (status, body) in responses {
            let Ok((mut socket, _)) = listener.accept().await else {
                return;
            };
            hits_task.fetch_add(1, Ordering::SeqCst);

            let mut buf = Vec::new();
            let mut chunk = [0u8; 4096];
            let (head, body_start) = loop {
                let Ok(n) = socket.read(&mut chunk).await else {
                    return;
                };
                if n == 0 {
                    return;
                }
                buf.extend_from_slice(&chunk[..n]);
                if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                    break (String::from_utf8_lossy(&buf[..pos]).to_string(), pos + 4);
                }
            };
            let content_length = head
                .lines()
                .find_map(|line| {
                    let (name, value) = line.split_once(':')?;
                    name.eq_ignore_ascii_case("content-length")
                        .then(|| value.trim().parse::<usize>().ok())
                        .flatten()
                })
                .unwrap_or(0);
            while buf.len() < body_start + content_length {
                let Ok(n) = socket.read(&mut chunk).await else {
                    return;
                };
                if n == 0 {
                    break;
                }
                buf.extend_from_slice(&chunk[..n]);
            }
            captured_task.lock().await.push(Captured {
                head,
                body: String::from_utf8_lossy(&buf[body_start..]).to_string(),
            });

            let reply = format!(
                "HTTP/1.1 {} Scripted\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            let _ = socket.write_all(reply.as_bytes()).await;
            let _ = socket.shutdown().await;
        }
    });

    Ok((format!("http://{}/v1", addr), captured, hits))
}

fn fast_retry() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 3,
        initial_backoff: Duration::from_millis(5),
        max_delay: Duration::from_millis(20),
    }
}

fn request() -> GenerateRequest {
    GenerateRequest::builder()
        .messages(vec![
            ChatMessage::system("You narrate."),
            ChatMessage::user("Begin"),
        ])
        .build()
        .unwrap()
}

fn openai_ok(text: &str) -> String {
    serde_json::json!({"choices": [{"message": {"role": "assistant", "content": text}}]})
        .to_string()
}

#[tokio::test]
async fn test_openai_compatible_round_trip() -> anyhow::Result<()> {
    let (base, captured, _) = serve(vec![(200, openai_ok("The gate creaks open."))]).await?;
    let mut config = ModelConfig::new(ProviderKind::Custom);
    config.base_url = Some(base);
    config.model = "story-model".to_string();

    let driver = HttpStoryDriver::new(config, Some("sk-test".to_string()))?;
    let response = driver.generate(&request()).await?;
    assert_eq!(response.text, "The gate creaks open.");

    let captured = captured.lock().await;
    let first = &captured[0];
    assert!(first.head.starts_with("POST /v1/chat/completions"));
    assert!(first.head.to_ascii_lowercase().contains("authorization: bearer sk-test"));
    let body: serde_json::Value = serde_json::from_str(&first.body)?;
    assert_eq!(body["model"], "story-model");
    assert_eq!(body["messages"][0]["role"], "system");
    Ok(())
}

#[tokio::test]
async fn test_anthropic_headers_and_body() -> anyhow::Result<()> {
    let reply = serde_json::json!({"content": [{"type": "text", "text": "Night falls."}]}).to_string();
    let (base, captured, _) = serve(vec![(200, reply)]).await?;
    let mut config = ModelConfig::new(ProviderKind::Anthropic);
    config.base_url = Some(base);

    let driver = HttpStoryDriver::new(config, Some("ak-test".to_string()))?;
    let response = driver.generate(&request()).await?;
    assert_eq!(response.text, "Night falls.");

    let captured = captured.lock().await;
    let head = captured[0].head.to_ascii_lowercase();
    assert!(head.starts_with("post /v1/messages"));
    assert!(head.contains("x-api-key: ak-test"));
    assert!(head.contains("anthropic-version: 2023-06-01"));
    let body: serde_json::Value = serde_json::from_str(&captured[0].body)?;
    assert_eq!(body["system"], "You narrate.");
    assert_eq!(body["messages"].as_array().map(Vec::len), Some(1));
    Ok(())
}

#[tokio::test]
async fn test_server_errors_are_retried() -> anyhow::Result<()> {
    let (base, _, hits) = serve(vec![
        (503, "{\"error\":\"overloaded\"}".to_string()),
        (429, "{}".to_string()),
        (200, openai_ok("Third time lucky.")),
    ])
    .await?;
    let mut config = ModelConfig::new(ProviderKind::Ollama);
    config.base_url = Some(base);

    let driver = HttpStoryDriver::new(config, None)?.with_retry(fast_retry());
    let response = driver.generate(&request()).await?;

    assert_eq!(response.text, "Third time lucky.");
    assert_eq!(hits.load(Ordering::SeqCst), 3);
    Ok(())
}

#[tokio::test]
async fn test_client_errors_fail_without_retry() -> anyhow::Result<()> {
    let (base, _, hits) = serve(vec![
        (401, "{\"error\":\"bad key\"}".to_string()),
        (200, openai_ok("never reached")),
    ])
    .await?;
    let mut config = ModelConfig::new(ProviderKind::Ollama);
    config.base_url = Some(base);

    let driver = HttpStoryDriver::new(config, None)?.with_retry(fast_retry());
    let err = driver.generate(&request()).await.unwrap_err();

    match err.kind() {
        TaleweaverErrorKind::Models(models) => {
            assert!(matches!(models.kind, ModelsErrorKind::Api { status: 401, .. }));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(hits.load(Ordering::SeqCst), 1);
    Ok(())
}

#[tokio::test]
async fn test_empty_completion_exhausts_attempts() -> anyhow::Result<()> {
    let (base, _, hits) = serve(vec![
        (200, openai_ok("")),
        (200, openai_ok("")),
        (200, openai_ok("")),
    ])
    .await?;
    let mut config = ModelConfig::new(ProviderKind::Ollama);
    config.base_url = Some(base);

    let driver = HttpStoryDriver::new(config, None)?.with_retry(fast_retry());
    let err = driver.generate(&request()).await.unwrap_err();

    match err.kind() {
        TaleweaverErrorKind::Models(models) => {
            assert_eq!(models.kind, ModelsErrorKind::EmptyResponse);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(hits.load(Ordering::SeqCst), 3);
    Ok(())
}
