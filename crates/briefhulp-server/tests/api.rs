//! Router tests: drive the API in-process with `tower::ServiceExt::oneshot`
//! against mock LLM, TTS and Supabase servers.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use briefhulp_chat::LLMConfig;
use briefhulp_core::BriefhulpConfig;
use briefhulp_infer::NoopEmbedder;
use briefhulp_server::error::{
    MSG_FEEDBACK_OFF, MSG_LLM_FAILED, MSG_NOT_AGREED, MSG_NO_RECIPIENT, MSG_UNSUPPORTED_FILE,
};
use briefhulp_server::{build_router, AppState};
use briefhulp_store::SqliteStore;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const EXPLAIN_REPLY: &str = "Dit is geen goed nieuws.\n* 🏢 **Van wie:** CJIB\n\
Is dit zo duidelijk, of is er een woord dat ik extra moet uitleggen?\n\
###ACTIE### Uitstel vragen\n###DATA### Afzender: CJIB | Kenmerk: 123456789";

struct TestApp {
    router: Router,
    state: Arc<AppState>,
    _dir: TempDir,
}

fn test_app(llm: Option<&MockServer>, extra_env: &[(&str, String)]) -> TestApp {
    let dir = TempDir::new().unwrap();
    let env: Vec<(String, String)> = extra_env
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect();
    let config = BriefhulpConfig::from_lookup(dir.path(), |key| {
        env.iter().find(|(k, _)| k == key).map(|(_, v)| v.clone())
    })
    .unwrap();

    let store = Arc::new(SqliteStore::open(&config.data_paths.knowledge, config.embedding_dim).unwrap());
    let embedder = Arc::new(NoopEmbedder::new(config.embedding_dim));
    let llm_config = match llm {
        Some(server) => LLMConfig {
            preferred_provider: "openai".into(),
            openai_api_key: Some("sk-test".into()),
            openai_base_url: server.uri(),
            config_path: config.data_paths.llm_config_file.clone(),
            ..Default::default()
        },
        None => LLMConfig {
            config_path: config.data_paths.llm_config_file.clone(),
            ..Default::default()
        },
    };

    let state = Arc::new(AppState::new(config, llm_config, store, embedder));
    TestApp {
        router: build_router(state.clone()),
        state,
        _dir: dir,
    }
}

fn sse_reply(text: &str) -> ResponseTemplate {
    let event = json!({"choices": [{"delta": {"content": text}}]});
    ResponseTemplate::new(200).set_body_raw(
        format!("data: {event}\n\ndata: [DONE]\n\n"),
        "text/event-stream",
    )
}

async fn mount_llm(server: &MockServer, contains: &str, reply: &str) {
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_string_contains(contains))
        .respond_with(sse_reply(reply))
        .mount(server)
        .await;
}

async fn send(app: &TestApp, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(b) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(b.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = app.router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

/// POST a JSON body and collect the `data:` payloads of the SSE reply.
async fn send_stream(app: &TestApp, uri: &str, body: Value) -> (StatusCode, Vec<String>) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let events = String::from_utf8_lossy(&bytes)
        .lines()
        .filter_map(|line| line.strip_prefix("data:"))
        .map(|data| data.trim().to_string())
        .collect();
    (status, events)
}

async fn transcript_len(app: &TestApp, id: &str) -> usize {
    let (status, body) = send(app, "GET", &format!("/api/sessions/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    body["transcript"].as_array().unwrap().len()
}

async fn new_session(app: &TestApp) -> String {
    let (status, body) = send(app, "POST", "/api/sessions", None).await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_str().unwrap().to_string()
}

async fn explain(app: &TestApp, id: &str) -> Value {
    let (status, body) = send(
        app,
        "POST",
        &format!("/api/sessions/{id}/letter"),
        Some(json!({"text": "Beschikking CJIB, betaal € 95 voor 1 juli.", "agreed": true})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    body
}

#[tokio::test]
async fn test_status_without_provider() {
    let app = test_app(None, &[]);
    let (status, body) = send(&app, "GET", "/api/status", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["llmAvailable"], false);
    assert_eq!(body["feedbackSink"], "local");
    assert_eq!(body["examples"], 0);
}

#[tokio::test]
async fn test_explain_requires_agreement_and_text() {
    let app = test_app(None, &[]);
    let id = new_session(&app).await;
    let uri = format!("/api/sessions/{id}/letter");

    let (status, body) = send(&app, "POST", &uri, Some(json!({"text": "Brief", "agreed": false}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], MSG_NOT_AGREED);

    let (status, body) = send(&app, "POST", &uri, Some(json!({"text": "  ", "agreed": true}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("Geen tekst gevonden"));

    let (status, _) = send(&app, "POST", &uri, Some(json!({"text": "Brief", "agreed": true}))).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_unknown_session_is_not_found() {
    let app = test_app(None, &[]);
    let (status, body) = send(&app, "GET", "/api/sessions/does-not-exist", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_explain_chat_feedback_reset_flow() {
    let llm = MockServer::start().await;
    mount_llm(&llm, "UITLEG", EXPLAIN_REPLY).await;
    mount_llm(&llm, "Hoeveel moet ik betalen?", "U moet € 95 betalen.").await;

    let app = test_app(Some(&llm), &[]);
    let id = new_session(&app).await;

    let body = explain(&app, &id).await;
    assert_eq!(
        body["summary"].as_str().unwrap(),
        "Dit is geen goed nieuws.\n* 🏢 **Van wie:** CJIB\nIs dit zo duidelijk, of is er een woord dat ik extra moet uitleggen?"
    );
    assert_eq!(body["analysis"]["action"], "Uitstel vragen");
    assert_eq!(body["analysis"]["reference"], "123456789");
    assert_eq!(body["draftPrefill"]["kind"], "Vraag om uitstel van betaling");
    assert_eq!(body["transcript"].as_array().unwrap().len(), 1);

    // Follow-up question
    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/sessions/{id}/chat"),
        Some(json!({"question": "Hoeveel moet ik betalen?"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["answer"], "U moet € 95 betalen.");
    assert_eq!(body["transcript"].as_array().unwrap().len(), 3);

    // Feedback once per result
    let uri = format!("/api/sessions/{id}/feedback");
    let (status, _) = send(&app, "POST", &uri, Some(json!({"score": 1}))).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, "POST", &uri, Some(json!({"score": 0}))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(app.state.assistant.store().count_feedback().unwrap(), 1);

    // Reset keeps the id and clears the transcript
    let (status, body) = send(&app, "POST", &format!("/api/sessions/{id}/reset"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], id.as_str());
    assert_eq!(body["mode"], "none");
    assert!(body["transcript"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_consequences_are_cached_per_result() {
    let llm = MockServer::start().await;
    mount_llm(&llm, "UITLEG", EXPLAIN_REPLY).await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_string_contains("Wat gebeurt er als ik niets doe?"))
        .respond_with(sse_reply("Dan komen er extra kosten bij."))
        .expect(1)
        .mount(&llm)
        .await;

    let app = test_app(Some(&llm), &[]);
    let id = new_session(&app).await;
    explain(&app, &id).await;

    let uri = format!("/api/sessions/{id}/consequences");
    let (_, first) = send(&app, "GET", &uri, None).await;
    let (_, second) = send(&app, "GET", &uri, None).await;
    assert_eq!(first["cached"], false);
    assert_eq!(second["cached"], true);
    assert_eq!(second["consequences"], "Dan komen er extra kosten bij.");
}

#[tokio::test]
async fn test_audio_of_explanation() {
    let llm = MockServer::start().await;
    mount_llm(&llm, "UITLEG", EXPLAIN_REPLY).await;
    let tts = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/translate_tts"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0xFFu8, 0xF3]))
        .mount(&tts)
        .await;

    let app = test_app(Some(&llm), &[("TTS_URL", format!("{}/translate_tts", tts.uri()))]);
    let id = new_session(&app).await;
    explain(&app, &id).await;

    let request = Request::builder()
        .uri(format!("/api/sessions/{id}/audio"))
        .body(Body::empty())
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "audio/mpeg");
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    // One mock frame per spoken piece
    assert!(bytes.starts_with(&[0xFF, 0xF3]));
    assert_eq!(bytes.len() % 2, 0);
}

#[tokio::test]
async fn test_audio_failure_message() {
    let llm = MockServer::start().await;
    mount_llm(&llm, "UITLEG", EXPLAIN_REPLY).await;
    let tts = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&tts)
        .await;

    let app = test_app(Some(&llm), &[("TTS_URL", tts.uri())]);
    let id = new_session(&app).await;
    explain(&app, &id).await;

    let (status, body) = send(&app, "GET", &format!("/api/sessions/{id}/audio"), None).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"], "Voorlezen is op dit moment niet beschikbaar.");
}

#[tokio::test]
async fn test_feedback_to_supabase() {
    let llm = MockServer::start().await;
    mount_llm(&llm, "UITLEG", EXPLAIN_REPLY).await;
    let supabase = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/logs"))
        .and(body_string_contains("\"feedback_score\":0"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&supabase)
        .await;

    let app = test_app(
        Some(&llm),
        &[
            ("SUPABASE_URL", supabase.uri()),
            ("SUPABASE_KEY", "anon".to_string()),
        ],
    );
    let id = new_session(&app).await;
    explain(&app, &id).await;

    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/sessions/{id}/feedback"),
        Some(json!({"score": 0})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["recorded"], true);
    assert_eq!(app.state.assistant.store().count_feedback().unwrap(), 0);
}

#[tokio::test]
async fn test_draft_options_and_validation() {
    let app = test_app(None, &[]);
    let (status, body) = send(&app, "GET", "/api/draft/options", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["kinds"].as_array().unwrap().len(), 6);
    assert_eq!(body["tones"].as_array().unwrap().len(), 5);
    assert_eq!(body["defaultTone"], "Zakelijk en formeel");

    let (status, body) = send(
        &app,
        "POST",
        "/api/draft",
        Some(json!({"kind": "Bezwaar maken", "recipient": ""})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], MSG_NO_RECIPIENT);
}

#[tokio::test]
async fn test_draft_letter() {
    let llm = MockServer::start().await;
    mount_llm(&llm, "Gemeente Rotterdam", "Geachte heer/mevrouw,\n\nIk maak bezwaar.").await;
    let app = test_app(Some(&llm), &[]);

    let (status, body) = send(
        &app,
        "POST",
        "/api/draft",
        Some(json!({
            "kind": "Bezwaar maken",
            "recipient": "Gemeente Rotterdam",
            "reference": "WOZ-2024-1",
            "tone": "Streng en direct",
            "extraInfo": "De WOZ-waarde is te hoog.",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert!(body["letter"].as_str().unwrap().contains("Ik maak bezwaar."));
}

#[tokio::test]
async fn test_upload_rejects_unsupported_file() {
    let app = test_app(None, &[]);
    let id = new_session(&app).await;

    let boundary = "briefhulp-boundary";
    let body = format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"agreed\"\r\n\r\ntrue\r\n\
--{b}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"brief.docx\"\r\n\
Content-Type: application/octet-stream\r\n\r\nPK\u{3}\u{4}\r\n--{b}--\r\n",
        b = boundary
    );
    let request = Request::builder()
        .method("POST")
        .uri(format!("/api/sessions/{id}/letter/upload"))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .unwrap();

    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(value["error"], MSG_UNSUPPORTED_FILE);
}

#[tokio::test]
async fn test_example_search_after_seeding() {
    let app = test_app(None, &[]);
    let store = app.state.assistant.store().clone();
    let dir = TempDir::new().unwrap();
    briefhulp_ingest::samples::write_samples(dir.path()).unwrap();
    let ingester = briefhulp_ingest::Ingester::new(
        &store,
        app.state.assistant.embedder().as_ref(),
        app.state.assistant.extractor(),
    );
    let report = ingester.ingest_dir(dir.path()).await.unwrap();
    assert!(report.added > 0);

    let (status, body) = send(&app, "GET", "/api/examples/search?q=studieschuld&limit=2", None).await;
    assert_eq!(status, StatusCode::OK);
    let results = body["results"].as_array().unwrap();
    assert!(!results.is_empty());
    assert_eq!(results[0]["source"], "duo");

    let (status, body) = send(&app, "GET", "/api/examples/stats", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["stats"]["totalDocuments"], report.added as i64);
}

#[tokio::test]
async fn test_chat_stream_sends_tokens_then_done() {
    let llm = MockServer::start().await;
    mount_llm(&llm, "UITLEG", EXPLAIN_REPLY).await;
    let tokens = ["U moet ", "€ 95 betalen."]
        .iter()
        .map(|t| format!("data: {}\n\n", json!({"choices": [{"delta": {"content": t}}]})))
        .collect::<String>();
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_string_contains("Hoeveel moet ik betalen?"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(format!("{tokens}data: [DONE]\n\n"), "text/event-stream"),
        )
        .mount(&llm)
        .await;

    let app = test_app(Some(&llm), &[]);
    let id = new_session(&app).await;
    explain(&app, &id).await;

    let (status, events) = send_stream(
        &app,
        &format!("/api/sessions/{id}/chat/stream"),
        json!({"question": "Hoeveel moet ik betalen?"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(events.last().map(String::as_str), Some("[DONE]"));

    let parsed: Vec<Value> = events
        .iter()
        .filter_map(|e| serde_json::from_str(e).ok())
        .collect();
    let streamed: String = parsed
        .iter()
        .filter(|e| e["type"] == "token")
        .map(|e| e["content"].as_str().unwrap())
        .collect();
    assert_eq!(streamed, "U moet € 95 betalen.");
    let done = parsed.iter().find(|e| e["type"] == "done").unwrap();
    assert_eq!(done["answer"], "U moet € 95 betalen.");

    assert_eq!(transcript_len(&app, &id).await, 3);
}

#[tokio::test]
async fn test_chat_stream_error_keeps_transcript() {
    let llm = MockServer::start().await;
    mount_llm(&llm, "UITLEG", EXPLAIN_REPLY).await;
    let body = format!(
        "data: {}\n\ndata: {}\n\n",
        json!({"choices": [{"delta": {"content": "U moet"}}]}),
        json!({"error": {"message": "overloaded"}}),
    );
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_string_contains("Hoeveel moet ik betalen?"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
        .mount(&llm)
        .await;

    let app = test_app(Some(&llm), &[]);
    let id = new_session(&app).await;
    explain(&app, &id).await;

    let (status, events) = send_stream(
        &app,
        &format!("/api/sessions/{id}/chat/stream"),
        json!({"question": "Hoeveel moet ik betalen?"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let parsed: Vec<Value> = events
        .iter()
        .filter_map(|e| serde_json::from_str(e).ok())
        .collect();
    let error = parsed.iter().find(|e| e["type"] == "error").unwrap();
    assert_eq!(error["error"], MSG_LLM_FAILED);
    assert!(!parsed.iter().any(|e| e["type"] == "done"));

    // Only the explanation, no half answer
    assert_eq!(transcript_len(&app, &id).await, 1);
}

#[tokio::test]
async fn test_translate_explanation() {
    let llm = MockServer::start().await;
    // Mounted first: the translation prompt also contains the explanation marker
    mount_llm(&llm, "naar het Engels", "This is not good news.").await;
    mount_llm(&llm, "UITLEG", EXPLAIN_REPLY).await;

    let app = test_app(Some(&llm), &[]);
    let id = new_session(&app).await;
    let uri = format!("/api/sessions/{id}/translate");

    let (status, _) = send(&app, "POST", &uri, Some(json!({"language": "Engels"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    explain(&app, &id).await;
    let (status, body) = send(&app, "POST", &uri, Some(json!({"language": " Engels "}))).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["language"], "Engels");
    assert_eq!(body["translation"], "This is not good news.");
}

#[tokio::test]
async fn test_draft_prefill_from_explained_letter() {
    let llm = MockServer::start().await;
    mount_llm(&llm, "UITLEG", EXPLAIN_REPLY).await;
    let app = test_app(Some(&llm), &[]);
    let id = new_session(&app).await;
    let uri = format!("/api/sessions/{id}/draft/prefill");

    let (status, body) = send(&app, "GET", &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["suggested"], false);

    explain(&app, &id).await;
    let (status, body) = send(&app, "GET", &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["suggested"], true);
    assert_eq!(body["action"], "Uitstel vragen");
    assert_eq!(body["prefill"]["kind"], "Vraag om uitstel van betaling");
    assert_eq!(body["prefill"]["recipient"], "CJIB");
    assert_eq!(body["prefill"]["reference"], "123456789");
}

#[tokio::test]
async fn test_config_masks_keys_and_persists() {
    let app = test_app(None, &[]);
    let (status, body) = send(&app, "GET", "/api/config", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["groqConfigured"], false);
    assert!(body["activeProvider"].is_null());

    let (status, body) = send(
        &app,
        "PUT",
        "/api/config",
        Some(json!({"preferredProvider": "groq", "groqApiKey": "gsk-secret-123"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["preferredProvider"], "groq");
    assert_eq!(body["groqConfigured"], true);
    assert_eq!(body["activeProvider"], "groq");
    assert!(!body.to_string().contains("gsk-secret-123"));

    let path = app.state.assistant.llm_config().read().config_path.clone();
    let saved = LLMConfig::load_with(&path, |_| None);
    assert_eq!(saved.preferred_provider, "groq");
    assert_eq!(saved.groq_api_key.as_deref(), Some("gsk-secret-123"));

    let (_, body) = send(&app, "GET", "/api/config", None).await;
    assert!(!body.to_string().contains("gsk-secret-123"));
}

#[tokio::test]
async fn test_config_key_check() {
    let llm = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/models"))
        .and(wiremock::matchers::header("authorization", "Bearer sk-good"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
        .mount(&llm)
        .await;
    Mock::given(method("GET"))
        .and(path("/models"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&llm)
        .await;

    let app = test_app(Some(&llm), &[]);
    let uri = "/api/config/test";

    let (status, body) = send(&app, "POST", uri, Some(json!({"provider": "openai", "apiKey": "sk-good"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let (status, body) = send(&app, "POST", uri, Some(json!({"provider": "openai", "apiKey": "sk-bad"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains("401"));

    let (status, body) = send(&app, "POST", uri, Some(json!({"provider": "mistral", "apiKey": "x"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_feedback_turned_off() {
    let llm = MockServer::start().await;
    mount_llm(&llm, "UITLEG", EXPLAIN_REPLY).await;
    let app = test_app(Some(&llm), &[("FEEDBACK_SINK", "off".to_string())]);

    let (_, status_body) = send(&app, "GET", "/api/status", None).await;
    assert_eq!(status_body["feedbackSink"], "disabled");

    let id = new_session(&app).await;
    explain(&app, &id).await;
    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/sessions/{id}/feedback"),
        Some(json!({"score": 1})),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], MSG_FEEDBACK_OFF);
    assert_eq!(app.state.assistant.store().count_feedback().unwrap(), 0);
}
