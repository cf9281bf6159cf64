use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Context;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use futures_util::{SinkExt, StreamExt};
use maze_chase::constants::TICK_MS;
use maze_chase::engine::GameEngine;
use maze_chase::logging::init_tracing;
use maze_chase::server_protocol::{parse_client_message, ParsedClientMessage};
use maze_chase::server_utils::{load_game_config, parse_port, parse_seed, resolve_static_dir};
use maze_chase::types::{OutcomeSignal, RuntimeEvent};
use serde_json::{json, Value};
use tokio::sync::{mpsc, Mutex};
use tower_http::services::{ServeDir, ServeFile};
use tracing::{debug, info, warn};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

const CLIENT_QUEUE: usize = 256;

type SharedState = Arc<Mutex<ServerState>>;

#[derive(Clone)]
struct ClientContext {
    tx: mpsc::Sender<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum QueuePolicy {
    DropOnFull,
    DisconnectOnFull,
}

struct ServerState {
    clients: HashMap<String, ClientContext>,
    game: GameEngine,
    last_step: Instant,
}

impl ServerState {
    fn new(game: GameEngine) -> Self {
        Self {
            clients: HashMap::new(),
            game,
            last_step: Instant::now(),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing("info");

    let port = parse_port(std::env::var("PORT").ok().as_deref());
    let seed = parse_seed(std::env::var("MAZE_SEED").ok().as_deref()).unwrap_or_else(rand::random);
    let config_path = std::env::var("MAZE_CONFIG").ok();
    let config = load_game_config(config_path.as_deref().map(Path::new), Some(seed))
        .context("failed to load game config")?;
    let game = GameEngine::new(config).context("failed to start game session")?;
    info!(seed, pellets = game.session().pellet_total(), "game session ready");

    let state = Arc::new(Mutex::new(ServerState::new(game)));
    start_tick_loop(state.clone());

    let app = Router::new()
        .route("/healthz", get(healthz))
        .route("/ws", get(ws_handler))
        .with_state(state);

    let static_dir = resolve_static_dir(std::env::var("STATIC_DIR").ok().as_deref());
    let app = if let Some(static_dir) = static_dir {
        let index_file = static_dir.join("index.html");
        info!(root = %static_dir.display(), "serving static files");
        app.fallback_service(
            ServeDir::new(static_dir).not_found_service(ServeFile::new(index_file)),
        )
    } else {
        warn!("static file root not found; only /ws and /healthz are served");
        app
    };

    let bind_addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;

    info!(port, "listening");
    axum::serve(listener, app)
        .await
        .context("server runtime failed")?;
    Ok(())
}

async fn healthz() -> impl IntoResponse {
    Json(json!({ "ok": true }))
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<SharedState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(state, socket))
}

async fn handle_socket(state: SharedState, socket: WebSocket) {
    let client_id = make_id("client");
    let (tx, mut rx) = mpsc::channel::<String>(CLIENT_QUEUE);

    {
        let mut guard = state.lock().await;
        guard
            .clients
            .insert(client_id.clone(), ClientContext { tx: tx.clone() });
        send_welcome_and_initial_state(&mut guard, &client_id);
    }
    info!(client = %client_id, "client connected");

    let (mut ws_sender, mut ws_receiver) = socket.split();
    let writer = tokio::spawn(async move {
        while let Some(payload) = rx.recv().await {
            if ws_sender.send(Message::Text(payload.into())).await.is_err() {
                break;
            }
        }
    });

    while let Some(received) = ws_receiver.next().await {
        let Ok(message) = received else {
            break;
        };

        match message {
            Message::Text(raw) => {
                handle_client_message(&state, &client_id, raw.as_str()).await;
            }
            Message::Binary(raw) => {
                if let Ok(text) = std::str::from_utf8(&raw) {
                    handle_client_message(&state, &client_id, text).await;
                } else {
                    send_error_to_client(&state, &client_id, "invalid utf8 message").await;
                }
            }
            Message::Close(_) => break,
            _ => {}
        }
    }

    {
        let mut guard = state.lock().await;
        guard.clients.remove(&client_id);
    }
    info!(client = %client_id, "client disconnected");
    drop(tx);
    let _ = writer.await;
}

async fn handle_client_message(state: &SharedState, client_id: &str, raw: &str) {
    let Some(message) = parse_client_message(raw) else {
        warn!(client = %client_id, "rejected client message");
        send_error_to_client(state, client_id, "invalid message").await;
        return;
    };

    let mut guard = state.lock().await;
    match message {
        ParsedClientMessage::Ping { t } => {
            send_to_client(
                &mut guard,
                client_id,
                &json!({
                    "type": "pong",
                    "t": t,
                }),
                QueuePolicy::DisconnectOnFull,
            );
        }
        ParsedClientMessage::Restart => {
            info!(client = %client_id, "restart requested");
            guard.game.restart();
            guard.last_step = Instant::now();
            let snapshot = guard.game.build_snapshot(true);
            broadcast(
                &mut guard,
                &json!({
                    "type": "state",
                    "snapshot": snapshot,
                }),
                QueuePolicy::DropOnFull,
            );
        }
        steering => match steering.direction() {
            Some(dir) => guard.game.request_direction(dir),
            None => debug!(client = %client_id, ?steering, "input without a direction"),
        },
    }
}

fn send_welcome_and_initial_state(state: &mut ServerState, client_id: &str) {
    let world = state.game.world_init();
    let snapshot = state.game.build_snapshot(false);
    send_to_client(
        state,
        client_id,
        &json!({
            "type": "welcome",
            "clientId": client_id,
            "tickRate": world.tick_rate,
            "cellSize": world.cell_size,
            "world": world,
        }),
        QueuePolicy::DisconnectOnFull,
    );
    send_to_client(
        state,
        client_id,
        &json!({
            "type": "state",
            "snapshot": snapshot,
        }),
        QueuePolicy::DisconnectOnFull,
    );
}

fn start_tick_loop(state: SharedState) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_millis(TICK_MS));
        loop {
            interval.tick().await;
            let mut guard = state.lock().await;
            tick_game(&mut guard);
        }
    });
}

fn tick_game(state: &mut ServerState) {
    let elapsed_ms = state.last_step.elapsed().as_millis() as u64;
    state.last_step += Duration::from_millis(elapsed_ms);
    if state.game.step(elapsed_ms) == 0 {
        return;
    }

    let snapshot = state.game.build_snapshot(true);
    let outcomes: Vec<OutcomeSignal> = snapshot
        .events
        .iter()
        .filter_map(|event| match event {
            RuntimeEvent::Outcome { signal } => Some(*signal),
            _ => None,
        })
        .collect();

    broadcast(
        state,
        &json!({
            "type": "state",
            "snapshot": snapshot,
        }),
        QueuePolicy::DropOnFull,
    );

    for signal in outcomes {
        let summary = state.game.build_summary();
        info!(
            outcome = signal.name(),
            score = summary.score,
            ticks = summary.ticks,
            "game over"
        );
        broadcast(
            state,
            &json!({
                "type": signal.name(),
                "summary": summary,
            }),
            QueuePolicy::DisconnectOnFull,
        );
    }
}

fn send_to_client(state: &mut ServerState, client_id: &str, message: &Value, policy: QueuePolicy) {
    let send_failed = if let Some(client) = state.clients.get(client_id) {
        client.tx.try_send(message.to_string()).is_err()
    } else {
        false
    };
    if send_failed && policy == QueuePolicy::DisconnectOnFull {
        disconnect_client(state, client_id);
    }
}

fn broadcast(state: &mut ServerState, message: &Value, policy: QueuePolicy) {
    let payload = message.to_string();
    let mut failed_clients = Vec::new();
    for (client_id, client) in &state.clients {
        if client.tx.try_send(payload.clone()).is_err() && policy == QueuePolicy::DisconnectOnFull
        {
            failed_clients.push(client_id.clone());
        }
    }
    for client_id in failed_clients {
        disconnect_client(state, &client_id);
    }
}

/// Dropping the sender closes the writer task once the socket reader exits.
fn disconnect_client(state: &mut ServerState, client_id: &str) {
    if state.clients.remove(client_id).is_some() {
        warn!(client = %client_id, "client queue full; disconnecting");
    }
}

async fn send_error_to_client(state: &SharedState, client_id: &str, message: &str) {
    let mut guard = state.lock().await;
    send_to_client(
        &mut guard,
        client_id,
        &json!({
            "type": "error",
            "message": message,
        }),
        QueuePolicy::DisconnectOnFull,
    );
}

fn make_id(prefix: &str) -> String {
    let seq = NEXT_ID.fetch_add(1, Ordering::Relaxed);
    format!("{prefix}_{seq}")
}
