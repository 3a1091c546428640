//! Local stand-in for an InstantMesh Gradio app. Serves the `/config`,
//! `/upload`, `/call` and `/file=` routes on a loopback port and records
//! every request it receives.

use std::sync::{Arc, Mutex};
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

pub const API_PREFIX: &str = "/gradio_api";
pub const UPLOADED_PATH: &str = "/tmp/gradio/up/drawing.png";
pub const PREPROCESSED_PATH: &str = "/tmp/gradio/p/image.png";
pub const MULTIVIEW_PATH: &str = "/tmp/gradio/m/mv.png";
pub const OBJ_PATH: &str = "/tmp/gradio/r/mesh.obj";
pub const GLB_PATH: &str = "/tmp/gradio/r/mesh.glb";

#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: &'static str,
    pub path: String,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl Recorded {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap()
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

struct AppState {
    requests: Mutex<Vec<Recorded>>,
    /// Endpoint whose event stream ends in `event: error`
    failing: Option<&'static str>,
}

impl AppState {
    fn record(&self, method: &'static str, uri: &Uri, headers: &HeaderMap, body: &[u8]) {
        let content_type = headers
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);

        self.requests.lock().unwrap().push(Recorded {
            method,
            path: uri.path().to_string(),
            content_type,
            body: body.to_vec(),
        });
    }
}

pub struct FakeApp {
    root: String,
    state: Arc<AppState>,
}

impl FakeApp {
    pub fn start() -> Self {
        Self::serve(None)
    }

    /// An app whose `endpoint` (e.g. `generate_mvs`) raises
    pub fn failing(endpoint: &'static str) -> Self {
        Self::serve(Some(endpoint))
    }

    fn serve(failing: Option<&'static str>) -> Self {
        let state = Arc::new(AppState {
            requests: Mutex::new(Vec::new()),
            failing,
        });

        // Bound before returning so the first request never races the server
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.set_nonblocking(true).unwrap();
        let root = format!("http://{}", listener.local_addr().unwrap());

        let app = Router::new()
            .route("/config", get(app_config))
            .route("/gradio_api/upload", post(upload))
            .route("/gradio_api/call/{endpoint}", post(submit))
            .route("/gradio_api/call/{endpoint}/{event_id}", get(outcome))
            .fallback(file)
            .with_state(state.clone());

        std::thread::spawn(move || {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap();
            runtime.block_on(async move {
                let listener = tokio::net::TcpListener::from_std(listener).unwrap();
                axum::serve(listener, app).await.unwrap();
            });
        });

        Self { root, state }
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.state.requests.lock().unwrap().clone()
    }

    /// The `POST /call/{endpoint}` submissions, in arrival order
    pub fn calls(&self) -> Vec<Recorded> {
        let prefix = format!("{}/call/", API_PREFIX);
        self.requests()
            .into_iter()
            .filter(|request| request.method == "POST" && request.path.starts_with(&prefix))
            .collect()
    }
}

async fn app_config(State(app): State<Arc<AppState>>, uri: Uri, headers: HeaderMap) -> Json<Value> {
    app.record("GET", &uri, &headers, &[]);
    Json(json!({"version": "5.0.0", "api_prefix": API_PREFIX}))
}

async fn upload(State(app): State<Arc<AppState>>, uri: Uri, headers: HeaderMap, body: Bytes) -> Json<Value> {
    app.record("POST", &uri, &headers, &body);
    Json(json!([UPLOADED_PATH]))
}

async fn submit(
    State(app): State<Arc<AppState>>,
    Path(endpoint): Path<String>,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Json<Value> {
    app.record("POST", &uri, &headers, &body);
    Json(json!({"event_id": format!("ev-{}", endpoint)}))
}

async fn outcome(
    State(app): State<Arc<AppState>>,
    Path((endpoint, _event_id)): Path<(String, String)>,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    app.record("GET", &uri, &headers, &[]);

    let terminal = if app.failing == Some(endpoint.as_str()) {
        "event: error\ndata: \"CUDA out of memory\"\n\n".to_string()
    } else {
        let outputs = match endpoint.as_str() {
            // No url, so the download falls back to the /file= route
            "preprocess" => json!([{"path": PREPROCESSED_PATH}]),
            "generate_mvs" => json!([{
                "path": MULTIVIEW_PATH,
                "url": format!("{}/file={}", API_PREFIX, MULTIVIEW_PATH),
                "orig_name": "mv.png",
            }]),
            "make3d" => json!([{"path": OBJ_PATH}, GLB_PATH]),
            _ => return StatusCode::NOT_FOUND.into_response(),
        };
        format!("event: complete\ndata: {}\n\n", outputs)
    };

    let stream = format!("event: heartbeat\ndata: null\n\nevent: generating\ndata: [null]\n\n{}", terminal);
    ([(header::CONTENT_TYPE, "text/event-stream")], stream).into_response()
}

/// Serves `/gradio_api/file={path}` as the text `bytes:{path}`
async fn file(State(app): State<Arc<AppState>>, uri: Uri, headers: HeaderMap) -> Response {
    app.record("GET", &uri, &headers, &[]);

    let file_route = format!("{}/file=", API_PREFIX);
    match uri.path().strip_prefix(&file_route) {
        Some(path) => format!("bytes:{}", path).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}
