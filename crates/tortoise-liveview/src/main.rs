//! Tortoise Live View Server
//!
//! Hosts the receiving side of the turtle relay. A sending turtle connects
//! over WebSocket and streams command values; the live view replays them and
//! serves the current drawing.
//!
//! ## Protocol
//!
//! Each text frame is one tagged JSON value:
//! ```json
//! {"dictionary": {"Command": {"string": "forward"}, "distance": {"floatingPoint": 50.0}}}
//! ```
//! Replies produced while debug mode is on are sent back as plain text frames.

mod config;

use axum::{
    Router,
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::{StatusCode, header},
    response::IntoResponse,
    routing::get,
};
use futures_util::{SinkExt, StreamExt};
use std::sync::{Arc, Mutex, MutexGuard};
use tortoise_core::{HostEffect, LiveView, WireValue};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::config::ServerConfig;

/// Shared application state
struct AppState {
    /// The one live view every connection feeds.
    view: Mutex<LiveView>,
    config: ServerConfig,
}

impl AppState {
    fn new(config: ServerConfig) -> Self {
        Self {
            view: Mutex::new(LiveView::new()),
            config,
        }
    }

    fn view(&self) -> MutexGuard<'_, LiveView> {
        self.view.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Apply one value and collect what should go back to the sender.
    fn process(&self, value: &WireValue) -> Processed {
        let mut view = self.view();
        let effect = view.receive(value);
        let export = match effect {
            Some(HostEffect::ExportRequested) => Some(self.render(&view)),
            _ => None,
        };
        Processed {
            replies: view.take_replies(),
            export,
        }
    }

    fn render(&self, view: &LiveView) -> Result<String, tortoise_render::RendererError> {
        tortoise_render::render_svg(view.turtle(), self.config.canvas)
    }
}

/// Outcome of one received frame.
struct Processed {
    replies: Vec<String>,
    /// Rendered drawing when the sender asked for an export.
    export: Option<Result<String, tortoise_render::RendererError>>,
}

/// Interpret a text frame. Anything that is not a tagged value is plain text.
fn decode_frame(text: &str) -> WireValue {
    serde_json::from_str(text).unwrap_or_else(|_| WireValue::String(text.to_string()))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "tortoise_liveview=info,tortoise_core=info,tower_http=info".into()
            }),
        )
        .init();

    let config = ServerConfig::from_env()?;
    let addr = config.addr;
    let state = Arc::new(AppState::new(config));

    let app = Router::new()
        .route("/", get(index))
        .route("/ws", get(ws_handler))
        .route("/health", get(health))
        .route("/drawing.svg", get(drawing))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    info!("Tortoise live view listening on {}", addr);
    info!("WebSocket endpoint: ws://{}/ws", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

/// Index page
async fn index() -> &'static str {
    "Tortoise Live View - send turtle commands via WebSocket at /ws, \
     view the drawing at /drawing.svg"
}

/// Health check
async fn health() -> &'static str {
    "ok"
}

/// Current drawing as SVG
async fn drawing(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let rendered = {
        let view = state.view();
        state.render(&view)
    };
    match rendered {
        Ok(svg) => (StatusCode::OK, [(header::CONTENT_TYPE, "image/svg+xml")], svg).into_response(),
        Err(e) => {
            error!("Render failed: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

/// WebSocket upgrade handler
async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle a WebSocket connection
async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let connection_id = Uuid::new_v4().to_string();
    info!("New connection: {}", connection_id);
    state.view().connection_opened();

    let (mut sender, mut receiver) = socket.split();

    while let Some(msg) = receiver.next().await {
        let value = match msg {
            Ok(Message::Text(text)) => decode_frame(text.as_str()),
            Ok(Message::Binary(data)) => WireValue::Data(data.to_vec()),
            Ok(Message::Close(_)) => break,
            Ok(_) => continue, // Ignore ping/pong
            Err(e) => {
                warn!("WebSocket error for {}: {}", connection_id, e);
                break;
            }
        };

        let processed = state.process(&value);

        if let Some(export) = processed.export {
            export_drawing(&state, export).await;
        }

        let mut closed = false;
        for reply in processed.replies {
            if sender.send(Message::Text(reply.into())).await.is_err() {
                closed = true;
                break;
            }
        }
        if closed {
            break;
        }
    }

    state.view().connection_closed();
    info!("Connection closed: {}", connection_id);
}

async fn export_drawing(
    state: &AppState,
    rendered: Result<String, tortoise_render::RendererError>,
) {
    let svg = match rendered {
        Ok(svg) => svg,
        Err(e) => {
            error!("Export failed: {}", e);
            return;
        }
    };
    match &state.config.export_path {
        Some(path) => match tokio::fs::write(path, svg).await {
            Ok(()) => info!("Exported drawing to {}", path.display()),
            Err(e) => error!("Export to {} failed: {}", path.display(), e),
        },
        None => info!("Export requested; drawing is available at /drawing.svg"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Size;
    use tortoise_core::Command;

    fn state() -> AppState {
        AppState::new(ServerConfig {
            addr: ([127, 0, 0, 1], 0).into(),
            canvas: Size::new(100.0, 100.0),
            export_path: None,
        })
    }

    fn frame(command: Command) -> WireValue {
        decode_frame(&command.to_json_text().unwrap())
    }

    #[test]
    fn test_text_frames_decode_as_values() {
        let value = frame(Command::Forward { distance: 20.0 });
        assert_eq!(value, Command::Forward { distance: 20.0 }.to_value().unwrap());
        assert_eq!(decode_frame("hello"), WireValue::from("hello"));
    }

    #[test]
    fn test_frames_drive_the_shared_view() {
        let state = state();
        state.process(&frame(Command::Forward { distance: 20.0 }));
        state.process(&frame(Command::ToggleDebugMode));
        let processed = state.process(&decode_frame("hello"));
        assert_eq!(processed.replies, ["You sent this text: hello"]);
        assert!((state.view().turtle().position().x - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_export_request_renders() {
        let state = state();
        state.process(&frame(Command::Forward { distance: 20.0 }));
        let processed = state.process(&frame(Command::RenderDrawingToPdf));
        let svg = processed.export.unwrap().unwrap();
        assert!(svg.contains("<path"));
    }
}
