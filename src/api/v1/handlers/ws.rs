/*
 * Responsibility
 * - GET /ws: 認証済みの WebSocket echo
 * - instrumentation / gate を経由しても upgrade が成立することの確認用
 */
use axum::{
    extract::ws::{Message, WebSocket, WebSocketUpgrade},
    response::Response,
};
use tracing::Instrument;

use crate::api::v1::extractors::Scope;

pub async fn echo(ws: WebSocketUpgrade, Scope(scope): Scope) -> Response {
    let logger = scope.identity_logger();
    ws.on_upgrade(move |socket| echo_loop(socket).instrument(logger))
}

async fn echo_loop(mut socket: WebSocket) {
    while let Some(msg) = socket.recv().await {
        let msg = match msg {
            Ok(msg) => msg,
            Err(err) => {
                tracing::debug!(error = %err, "websocket receive failed");
                return;
            }
        };

        match msg {
            Message::Text(_) | Message::Binary(_) => {
                if socket.send(msg).await.is_err() {
                    return;
                }
            }
            Message::Close(_) => return,
            Message::Ping(_) | Message::Pong(_) => {}
        }
    }
}
