//! In-process trivia backend used by the integration tests.

#![allow(dead_code)]

use std::{
    net::SocketAddr,
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering},
    },
    time::Duration,
};

use axum::{
    Json, Router,
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use futures::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::{
    net::TcpListener,
    sync::{Mutex, broadcast},
    task::JoinHandle,
};

/// Frame that makes every open socket close itself.
const KICK: &str = "__kick__";

pub struct BackendState {
    pub users: Mutex<Vec<Value>>,
    pub received: Mutex<Vec<String>>,
    pub questions: Mutex<Vec<Value>>,
    pub registration_open: AtomicBool,
    pub game_started: AtomicBool,
    pub countdown: AtomicU64,
    pub connections: AtomicUsize,
    pub user_polls: AtomicUsize,
    next_id: AtomicU64,
    events: broadcast::Sender<String>,
}

pub struct MockBackend {
    pub addr: SocketAddr,
    pub state: Arc<BackendState>,
    task: JoinHandle<()>,
}

impl MockBackend {
    pub async fn start() -> Self {
        let (events, _) = broadcast::channel(64);
        let state = Arc::new(BackendState {
            users: Mutex::new(Vec::new()),
            received: Mutex::new(Vec::new()),
            questions: Mutex::new(Vec::new()),
            registration_open: AtomicBool::new(false),
            game_started: AtomicBool::new(false),
            countdown: AtomicU64::new(1),
            connections: AtomicUsize::new(0),
            user_polls: AtomicUsize::new(0),
            next_id: AtomicU64::new(1),
            events,
        });

        let app = Router::new()
            .route("/start-registration", post(start_registration))
            .route("/start-game", post(start_game))
            .route("/start-first-question", post(start_first_question))
            .route("/next-question", post(next_question))
            .route("/users", get(list_users))
            .route("/register", post(register))
            .route("/submit-answer", post(submit_answer))
            .route("/ws", get(ws_handler))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let task = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr, state, task }
    }

    pub fn http_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn ws_url(&self) -> String {
        format!("ws://{}/ws", self.addr)
    }

    /// Queue a question served by the next `start-first-question` / `next-question`.
    pub async fn add_question(&self, id: u64, text: &str) {
        self.state.questions.lock().await.push(json!({
            "id": id,
            "question_text": text,
            "option_a": "Ownership",
            "option_b": "Borrowing",
            "option_c": "Garbage collection",
            "option_d": "Reference counting",
        }));
    }

    /// Push a raw frame to every connected client.
    pub fn push(&self, payload: Value) {
        let _ = self.state.events.send(payload.to_string());
    }

    /// Push a raw text frame, which need not be valid JSON.
    pub fn push_raw(&self, payload: &str) {
        let _ = self.state.events.send(payload.to_string());
    }

    /// Close every open socket from the server side.
    pub fn kick_all(&self) {
        let _ = self.state.events.send(KICK.to_string());
    }

    pub async fn received(&self) -> Vec<String> {
        self.state.received.lock().await.clone()
    }

    /// Wait until `predicate` holds for the frames received so far.
    pub async fn wait_for_received(&self, predicate: impl Fn(&[String]) -> bool) -> Vec<String> {
        for _ in 0..200 {
            let received = self.received().await;
            if predicate(&received) {
                return received;
            }
            tokio::time::sleep(Duration::from_millis(25)).await;
        }
        panic!("backend never received the expected frames: {:?}", self.received().await);
    }
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        self.task.abort();
    }
}

fn broadcast(state: &BackendState, payload: Value) {
    let _ = state.events.send(payload.to_string());
}

fn detail(status: StatusCode, detail: &str) -> Response {
    (status, Json(json!({ "detail": detail }))).into_response()
}

async fn start_registration(State(state): State<Arc<BackendState>>) -> Json<Value> {
    state.registration_open.store(true, Ordering::SeqCst);
    state.game_started.store(false, Ordering::SeqCst);
    broadcast(
        &state,
        json!({"type": "registration_started", "message": "Registration is now open!"}),
    );
    Json(json!({"message": "Registration started"}))
}

async fn start_game(State(state): State<Arc<BackendState>>) -> Json<Value> {
    state.registration_open.store(false, Ordering::SeqCst);
    state.game_started.store(true, Ordering::SeqCst);
    let countdown = state.countdown.load(Ordering::SeqCst);
    broadcast(
        &state,
        json!({"type": "game_started", "message": "Game starting!", "countdown": countdown}),
    );
    Json(json!({"message": "Game started"}))
}

async fn serve_question(state: &BackendState) -> Option<Value> {
    let mut questions = state.questions.lock().await;
    if questions.is_empty() {
        return None;
    }
    let question = questions.remove(0);
    broadcast(
        state,
        json!({"type": "new_question", "question": question, "timer": 15}),
    );
    Some(question)
}

async fn start_first_question(State(state): State<Arc<BackendState>>) -> Json<Value> {
    match serve_question(&state).await {
        Some(_) => Json(json!({"message": "First question started"})),
        None => Json(json!({"error": "No questions available"})),
    }
}

async fn next_question(State(state): State<Arc<BackendState>>) -> Json<Value> {
    if serve_question(&state).await.is_some() {
        return Json(json!({"message": "Next question started"}));
    }

    let mut leaderboard: Vec<Value> = state
        .users
        .lock()
        .await
        .iter()
        .filter(|user| user["is_host"] == false)
        .cloned()
        .collect();
    leaderboard.sort_by_key(|user| -user["score"].as_i64().unwrap_or(0));
    state.game_started.store(false, Ordering::SeqCst);
    broadcast(
        &state,
        json!({"type": "game_finished", "leaderboard": leaderboard}),
    );
    Json(json!({"message": "Game finished"}))
}

async fn list_users(State(state): State<Arc<BackendState>>) -> Json<Value> {
    state.user_polls.fetch_add(1, Ordering::SeqCst);
    Json(Value::Array(state.users.lock().await.clone()))
}

async fn register(State(state): State<Arc<BackendState>>, Json(body): Json<Value>) -> Response {
    if !state.registration_open.load(Ordering::SeqCst) {
        return detail(StatusCode::FORBIDDEN, "Registration is closed");
    }
    let id = state.next_id.fetch_add(1, Ordering::SeqCst);
    let user = json!({
        "id": id,
        "name": body["name"],
        "score": 0,
        "is_host": body["is_host"].as_bool().unwrap_or(false),
    });
    state.users.lock().await.push(user.clone());
    Json(user).into_response()
}

async fn submit_answer(
    State(state): State<Arc<BackendState>>,
    Json(body): Json<Value>,
) -> Response {
    if !state.game_started.load(Ordering::SeqCst) {
        return detail(StatusCode::BAD_REQUEST, "No active question");
    }
    let correct = body["selected_answer"] == "B";
    let mut users = state.users.lock().await;
    let Some(user) = users.iter_mut().find(|user| user["id"] == body["user_id"]) else {
        return detail(StatusCode::NOT_FOUND, "User not found");
    };
    if correct {
        let score = user["score"].as_i64().unwrap_or(0) + 10;
        user["score"] = json!(score);
    }
    Json(json!({"correct": correct, "score": user["score"]})).into_response()
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<BackendState>>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: Arc<BackendState>) {
    state.connections.fetch_add(1, Ordering::SeqCst);
    let (mut sender, mut receiver) = socket.split();
    let mut events = state.events.subscribe();

    loop {
        tokio::select! {
            event = events.recv() => {
                let Ok(event) = event else { break };
                if event == KICK {
                    let _ = sender.send(Message::Close(None)).await;
                    break;
                }
                if sender.send(Message::Text(event.into())).await.is_err() {
                    break;
                }
            }
            frame = receiver.next() => {
                let Some(Ok(Message::Text(text))) = frame else { break };
                state.received.lock().await.push(text.as_str().to_string());
                let Ok(message) = serde_json::from_str::<Value>(text.as_str()) else { continue };
                let reply = match message["type"].as_str() {
                    Some("host_connect") => json!({
                        "type": "host_confirmed",
                        "message": "Host connection confirmed",
                    }),
                    Some("get_game_state") => json!({
                        "type": "game_state",
                        "state": {
                            "is_registration_open": state.registration_open.load(Ordering::SeqCst),
                            "is_game_started": state.game_started.load(Ordering::SeqCst),
                        },
                    }),
                    _ => continue,
                };
                if sender.send(Message::Text(reply.to_string().into())).await.is_err() {
                    break;
                }
            }
        }
    }

    state.connections.fetch_sub(1, Ordering::SeqCst);
}
