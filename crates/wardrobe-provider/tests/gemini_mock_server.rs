use std::time::Duration;

use tokio_stream::StreamExt;
use wardrobe_provider::{
    ChatBackend, ChatSession, ChatTurn, GeminiAnalyzer, GeminiChat, GeminiClient, GeminiVideo,
    ImageAnalyzer, VideoBackend, VideoRequest,
};
use wardrobe_schema::AspectRatio;
use wiremock::matchers::{
    body_partial_json, header, method, path, query_param, query_param_is_missing,
};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> GeminiClient {
    GeminiClient::new(server.uri(), Duration::from_secs(5)).unwrap()
}

fn text_response(text: &str) -> serde_json::Value {
    serde_json::json!({
        "candidates": [{
            "content": {"role": "model", "parts": [{"text": text}]},
            "finishReason": "STOP"
        }]
    })
}

fn sse_body(chunks: &[&str]) -> String {
    chunks
        .iter()
        .map(|chunk| {
            let event = serde_json::json!({
                "candidates": [{"content": {"role": "model", "parts": [{"text": chunk}]}}]
            });
            format!("data: {event}\r\n\r\n")
        })
        .collect()
}

#[tokio::test]
async fn analysis_parses_structured_output() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/models/gemini-test:generateContent"))
        .and(header("x-goog-api-key", "test-key"))
        .and(query_param_is_missing("key"))
        .and(body_partial_json(serde_json::json!({
            "generationConfig": {"responseMimeType": "application/json"}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(text_response(
            r#"{"name":"Blue Striped T-Shirt","type":"T-Shirt","color":"Blue","season":"Summer"}"#,
        )))
        .expect(1)
        .mount(&server)
        .await;

    let analyzer = GeminiAnalyzer::new(client_for(&server), "test-key", "gemini-test");
    let analysis = analyzer.analyze("QUJD", "image/jpeg").await.unwrap();

    assert_eq!(analysis.name, "Blue Striped T-Shirt");
    assert_eq!(analysis.kind, "T-Shirt");
    assert_eq!(analysis.color, "Blue");
    assert_eq!(analysis.season, "Summer");
}

#[tokio::test]
async fn analysis_rejects_non_json_output() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/models/gemini-test:generateContent"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(text_response("I think it is a shirt.")),
        )
        .mount(&server)
        .await;

    let analyzer = GeminiAnalyzer::new(client_for(&server), "test-key", "gemini-test");
    let err = analyzer.analyze("QUJD", "image/jpeg").await.unwrap_err();
    assert!(err.to_string().contains("does not match schema"));
}

#[tokio::test]
async fn analysis_surfaces_http_errors() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/models/gemini-test:generateContent"))
        .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
        .mount(&server)
        .await;

    let analyzer = GeminiAnalyzer::new(client_for(&server), "test-key", "gemini-test");
    let err = analyzer.analyze("QUJD", "image/jpeg").await.unwrap_err();
    let message = err.to_string();
    assert!(message.contains("503"));
    assert!(message.contains("[retryable]"));
}

#[tokio::test]
async fn chat_stream_yields_chunks_in_order() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/models/gemini-chat:streamGenerateContent"))
        .and(query_param("alt", "sse"))
        .and(body_partial_json(serde_json::json!({
            "systemInstruction": {"parts": [{"text": "be a wardrobe assistant"}]}
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(sse_body(&["Hel", "lo ", "world"]), "text/event-stream"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let chat = GeminiChat::new(client_for(&server), "test-key", "gemini-chat");
    let mut session = chat.open_session();
    let mut stream = session
        .send_stream(ChatTurn {
            message: "hi".into(),
            system_instruction: "be a wardrobe assistant".into(),
        })
        .await
        .unwrap();

    let mut chunks = Vec::new();
    while let Some(chunk) = stream.next().await {
        chunks.push(chunk.unwrap());
    }
    assert_eq!(chunks, vec!["Hel", "lo ", "world"]);
}

#[tokio::test]
async fn chat_stream_reports_malformed_event() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/models/gemini-chat:streamGenerateContent"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw("data: {broken\n\n", "text/event-stream"),
        )
        .mount(&server)
        .await;

    let chat = GeminiChat::new(client_for(&server), "test-key", "gemini-chat");
    let mut session = chat.open_session();
    let mut stream = session
        .send_stream(ChatTurn {
            message: "hi".into(),
            system_instruction: String::new(),
        })
        .await
        .unwrap();

    let first = stream.next().await.unwrap();
    assert!(first.unwrap_err().to_string().contains("invalid sse event payload"));
    assert!(stream.next().await.is_none());
}

#[tokio::test]
async fn video_job_lifecycle_against_mock_server() {
    let server = MockServer::start().await;
    let asset_uri = format!("{}/files/vid-1:download?alt=media", server.uri());

    Mock::given(method("POST"))
        .and(path("/models/veo-test:predictLongRunning"))
        .and(header("x-goog-api-key", "paid-key"))
        .and(query_param_is_missing("key"))
        .and(body_partial_json(serde_json::json!({
            "parameters": {"aspectRatio": "16:9"}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "name": "models/veo-test/operations/op-1"
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/models/veo-test/operations/op-1"))
        .and(header("x-goog-api-key", "paid-key"))
        .and(query_param_is_missing("key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "name": "models/veo-test/operations/op-1",
            "done": true,
            "response": {
                "generateVideoResponse": {
                    "generatedSamples": [{"video": {"uri": asset_uri}}]
                }
            }
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/files/vid-1:download"))
        .and(query_param("alt", "media"))
        .and(header("x-goog-api-key", "paid-key"))
        .and(query_param_is_missing("key"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"MP4DATA".to_vec()))
        .mount(&server)
        .await;

    let video = GeminiVideo::new(client_for(&server), "veo-test", "720p");
    let request = VideoRequest {
        prompt: "a cat wearing a wizard hat".into(),
        aspect_ratio: AspectRatio::Landscape,
    };

    let job = video.create_job(&request, "paid-key").await.unwrap();
    assert!(!job.done);

    let status = video.job_status(&job.handle, "paid-key").await.unwrap();
    assert!(status.done);
    let uri = status.result_uri.unwrap();
    assert_eq!(uri, asset_uri);

    let payload = video.fetch_asset(&uri, "paid-key").await.unwrap();
    assert_eq!(payload.as_ref(), b"MP4DATA");
}

#[tokio::test]
async fn video_status_not_found_keeps_entity_signature() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/models/veo-test/operations/op-404"))
        .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
            "error": {
                "code": 404,
                "message": "Requested entity was not found.",
                "status": "NOT_FOUND"
            }
        })))
        .mount(&server)
        .await;

    let video = GeminiVideo::new(client_for(&server), "veo-test", "720p");
    let err = video
        .job_status("models/veo-test/operations/op-404", "stale-key")
        .await
        .unwrap_err();
    assert!(err.to_string().contains("Requested entity was not found"));
}

#[tokio::test]
async fn transport_errors_do_not_reveal_the_key() {
    let client = GeminiClient::new("http://127.0.0.1:1", Duration::from_secs(5)).unwrap();
    let video = GeminiVideo::new(client.clone(), "veo-test", "720p");
    let request = VideoRequest {
        prompt: "a cat".into(),
        aspect_ratio: AspectRatio::Landscape,
    };

    let err = video.create_job(&request, "SECRET-PAID-KEY").await.unwrap_err();
    let message = format!("{err:#}");
    assert!(message.contains("[retryable]"));
    assert!(!message.contains("SECRET-PAID-KEY"));

    let err = video
        .fetch_asset("http://127.0.0.1:1/files/v1:download?alt=media", "SECRET-PAID-KEY")
        .await
        .unwrap_err();
    let message = format!("{err:#}");
    assert!(!message.contains("SECRET-PAID-KEY"));
    assert!(!message.contains("/files/v1"));

    let chat = GeminiChat::new(client, "SECRET-PAID-KEY", "gemini-chat");
    let err = chat
        .open_session()
        .send_stream(ChatTurn {
            message: "hi".into(),
            system_instruction: String::new(),
        })
        .await
        .err()
        .unwrap();
    assert!(!format!("{err:#}").contains("SECRET-PAID-KEY"));
}
