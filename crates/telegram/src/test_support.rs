//! In-process Bot API double for tests.

use std::sync::{Arc, Mutex};

use {
    axum::{Json, Router, body::Bytes, extract::State, http::Uri, routing::post},
    serde_json::{Value, json},
    teloxide::Bot,
    tokio::sync::oneshot,
};

/// Produces the JSON reply for one Bot API call: `(method, body, call_index)`.
pub(crate) type Responder = Arc<dyn Fn(&str, &Value, usize) -> Value + Send + Sync>;

#[derive(Clone)]
struct MockTelegramApi {
    requests: Arc<Mutex<Vec<(String, Value)>>>,
    respond: Responder,
}

async fn telegram_api_handler(
    State(state): State<MockTelegramApi>,
    uri: Uri,
    body: Bytes,
) -> Json<Value> {
    let method = uri.path().rsplit('/').next().unwrap_or_default().to_string();
    let body: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    let index = {
        let mut requests = state.requests.lock().expect("lock requests");
        requests.push((method.clone(), body.clone()));
        requests.len() - 1
    };
    Json((state.respond)(&method, &body, index))
}

pub(crate) struct MockBotApi {
    requests: Arc<Mutex<Vec<(String, Value)>>>,
    pub(crate) bot: Bot,
    shutdown: Option<oneshot::Sender<()>>,
}

impl MockBotApi {
    pub(crate) async fn start(respond: Responder) -> Self {
        let requests = Arc::new(Mutex::new(Vec::new()));
        let app = Router::new()
            .route("/{*path}", post(telegram_api_handler))
            .with_state(MockTelegramApi {
                requests: Arc::clone(&requests),
                respond,
            });
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind test listener");
        let addr = listener.local_addr().expect("local addr");
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
                .expect("serve mock telegram api");
        });

        let api_url = reqwest::Url::parse(&format!("http://{addr}/")).expect("parse api url");
        Self {
            requests,
            bot: Bot::new("test-token").set_api_url(api_url),
            shutdown: Some(shutdown_tx),
        }
    }

    /// Recorded calls, method names lower-cased.
    pub(crate) fn requests(&self) -> Vec<(String, Value)> {
        self.requests
            .lock()
            .expect("lock requests")
            .iter()
            .map(|(m, b)| (m.to_ascii_lowercase(), b.clone()))
            .collect()
    }

    pub(crate) fn calls_to(&self, method: &str) -> Vec<Value> {
        let method = method.to_ascii_lowercase();
        self.requests()
            .into_iter()
            .filter(|(m, _)| *m == method)
            .map(|(_, b)| b)
            .collect()
    }
}

impl Drop for MockBotApi {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

pub(crate) fn ok(result: Value) -> Value {
    json!({ "ok": true, "result": result })
}

pub(crate) fn api_error(code: u16, description: &str) -> Value {
    json!({ "ok": false, "error_code": code, "description": description })
}

/// Minimal `Message` payload returned by send/forward methods.
pub(crate) fn forwarded_message(message_id: i32) -> Value {
    json!({
        "message_id": message_id,
        "date": 0,
        "chat": { "id": 42, "type": "private" },
        "text": "ok"
    })
}

/// Default replies for the forward methods.
pub(crate) fn forward_reply(method: &str, body: &Value) -> Value {
    if method.eq_ignore_ascii_case("forwardMessages") {
        let ids: Vec<Value> = body["message_ids"]
            .as_array()
            .map(|ids| {
                ids.iter()
                    .enumerate()
                    .map(|(i, _)| json!({ "message_id": 900 + i }))
                    .collect()
            })
            .unwrap_or_default();
        ok(Value::Array(ids))
    } else {
        ok(forwarded_message(900))
    }
}
