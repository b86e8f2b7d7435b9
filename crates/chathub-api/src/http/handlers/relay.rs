//! WebSocket relay hub at `/messageRelayHub`.
//!
//! Each connection gets a [`RelaySubscription`] and starts with no groups.
//! The handler multiplexes two directions in one task:
//!
//! - **Events:** every [`RelayEvent`] for a joined chat is pushed to the
//!   client as a JSON text frame (`{"type": "chat_edited", ...}`).
//! - **Commands:** text frames are parsed as [`RelayCommand`]. Joining a group
//!   requires being a participant of the chat; relaying messages and typing
//!   notifications requires having joined the group.
//!
//! Malformed commands get an `{"type":"error"}` reply; the connection stays open.

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::IntoResponse;
use chathub_core::event::RelaySubscription;
use chathub_types::event::RelayEvent;
use chathub_types::identity::UserIdentity;
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::{Value, json};
use uuid::Uuid;

use crate::http::extractors::auth::AuthenticatedUser;
use crate::state::AppState;

/// Incoming command from a relay client.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum RelayCommand {
    /// Start receiving events for a chat.
    JoinGroup { chat_id: Uuid },
    LeaveGroup { chat_id: Uuid },
    /// Relay an arbitrary message to the rest of the group.
    SendMessage { chat_id: Uuid, message: Value },
    /// Typing indicator for the caller. A `user_id`, when sent, must be the caller's.
    UserTyping {
        chat_id: Uuid,
        #[serde(default)]
        user_id: Option<String>,
        is_typing: bool,
    },
    /// Keep-alive ping. Server responds with `{"type":"pong"}`.
    Ping,
}

/// GET /messageRelayHub
pub async fn relay_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_relay_connection(socket, state, user))
}

async fn handle_relay_connection(socket: WebSocket, state: AppState, user: UserIdentity) {
    let (mut ws_sender, mut ws_receiver) = socket.split();
    let mut subscription = state.relay.subscribe(Uuid::now_v7().to_string());
    tracing::debug!(
        connection_id = subscription.connection_id(),
        user_id = %user.user_id,
        "Relay connection opened"
    );

    loop {
        tokio::select! {
            event = subscription.recv() => {
                let Some(event) = event else {
                    // Hub dropped, server shutting down
                    break;
                };
                match serde_json::to_string(&event) {
                    Ok(json) => {
                        if ws_sender.send(Message::Text(json.into())).await.is_err() {
                            break;
                        }
                    }
                    Err(err) => tracing::warn!("Failed to serialize relay event: {err}"),
                }
            }

            msg = ws_receiver.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        let reply = process_command(&text, &state, &user, &mut subscription).await;
                        if let Some(reply) = reply {
                            if ws_sender.send(Message::Text(reply.to_string().into())).await.is_err() {
                                break;
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(err)) => {
                        tracing::debug!("WebSocket receive error: {err}");
                        break;
                    }
                    Some(Ok(_)) => {}
                }
            }
        }
    }

    tracing::debug!(
        connection_id = subscription.connection_id(),
        "Relay connection closed"
    );
}

fn error_reply(message: impl Into<String>) -> Option<Value> {
    Some(json!({ "type": "error", "message": message.into() }))
}

/// Apply one client command. Returns the direct reply to send, if any.
async fn process_command(
    text: &str,
    state: &AppState,
    user: &UserIdentity,
    subscription: &mut RelaySubscription,
) -> Option<Value> {
    let command: RelayCommand = match serde_json::from_str(text) {
        Ok(command) => command,
        Err(err) => {
            tracing::debug!("Invalid relay command: {err}");
            return error_reply(format!("invalid command: {err}"));
        }
    };

    match command {
        RelayCommand::JoinGroup { chat_id } => {
            match state.chat_service.is_participant(&user.user_id, &chat_id).await {
                Ok(true) => {
                    subscription.join(chat_id);
                    Some(json!({ "type": "group_joined", "chat_id": chat_id }))
                }
                Ok(false) => error_reply(format!("not a participant of chat {chat_id}")),
                Err(err) => {
                    tracing::error!(%chat_id, error = %err, "Membership check failed");
                    error_reply("membership check failed")
                }
            }
        }
        RelayCommand::LeaveGroup { chat_id } => {
            subscription.leave(&chat_id);
            Some(json!({ "type": "group_left", "chat_id": chat_id }))
        }
        RelayCommand::SendMessage { chat_id, message } => {
            if !subscription.is_member(&chat_id) {
                return error_reply(format!("join chat {chat_id} before sending"));
            }
            state.relay.publish(RelayEvent::ReceiveMessage {
                chat_id,
                sender_id: subscription.connection_id().to_string(),
                message,
            });
            None
        }
        RelayCommand::UserTyping {
            chat_id,
            user_id,
            is_typing,
        } => {
            if !subscription.is_member(&chat_id) {
                return error_reply(format!("join chat {chat_id} before sending"));
            }
            if user_id.is_some_and(|id| id != user.user_id) {
                return error_reply("typing indicators can only be sent for yourself");
            }
            state.relay.publish(RelayEvent::UserTyping {
                chat_id,
                user_id: user.user_id.clone(),
                is_typing,
            });
            None
        }
        RelayCommand::Ping => Some(json!({ "type": "pong" })),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use chathub_core::ocr::{BoxOcrEngine, NullOcrEngine};
    use chathub_infra::storage::build_chat_stores;
    use chathub_types::config::AppConfig;

    use crate::state::AuthScheme;

    async fn state() -> AppState {
        let config = AppConfig::default();
        let stores = build_chat_stores(&config.chat_store).await.unwrap();
        AppState::from_parts(
            stores,
            BoxOcrEngine::new(NullOcrEngine),
            AuthScheme::PassThrough,
            config,
        )
    }

    #[tokio::test]
    async fn ping_pongs_and_garbage_is_error() {
        let state = state().await;
        let user = UserIdentity::default_user();
        let mut sub = state.relay.subscribe("conn-1");

        let reply = process_command(r#"{"type":"ping"}"#, &state, &user, &mut sub).await;
        assert_eq!(reply, Some(json!({ "type": "pong" })));

        let reply = process_command("not json", &state, &user, &mut sub).await.unwrap();
        assert_eq!(reply["type"], "error");
    }

    #[tokio::test]
    async fn join_requires_participation() {
        let state = state().await;
        let owner = UserIdentity::default_user();
        let stranger = UserIdentity::new("stranger", "Stranger");
        let chat = state.chat_service.create_chat(&owner, "Team").await.unwrap();
        let join = format!(r#"{{"type":"join_group","chat_id":"{}"}}"#, chat.session.id);

        let mut sub = state.relay.subscribe("conn-1");
        let reply = process_command(&join, &state, &stranger, &mut sub).await.unwrap();
        assert_eq!(reply["type"], "error");
        assert!(!sub.is_member(&chat.session.id));

        let reply = process_command(&join, &state, &owner, &mut sub).await.unwrap();
        assert_eq!(reply["type"], "group_joined");
        assert!(sub.is_member(&chat.session.id));
    }

    #[tokio::test]
    async fn messages_reach_other_members_only() {
        let state = state().await;
        let owner = UserIdentity::default_user();
        let chat = state.chat_service.create_chat(&owner, "Team").await.unwrap();
        let chat_id = chat.session.id;
        let join = format!(r#"{{"type":"join_group","chat_id":"{chat_id}"}}"#);

        let mut sender = state.relay.subscribe("conn-1");
        let mut member = state.relay.subscribe("conn-2");
        let mut outsider = state.relay.subscribe("conn-3");
        process_command(&join, &state, &owner, &mut sender).await;
        process_command(&join, &state, &owner, &mut member).await;

        let send = format!(
            r#"{{"type":"send_message","chat_id":"{chat_id}","message":{{"content":"hi"}}}}"#
        );
        assert!(process_command(&send, &state, &owner, &mut sender).await.is_none());

        match member.recv().await.unwrap() {
            RelayEvent::ReceiveMessage {
                sender_id, message, ..
            } => {
                assert_eq!(sender_id, "conn-1");
                assert_eq!(message["content"], "hi");
            }
            other => panic!("unexpected event {other:?}"),
        }
        let quiet = tokio::time::timeout(Duration::from_millis(50), outsider.recv()).await;
        assert!(quiet.is_err());
        let echo = tokio::time::timeout(Duration::from_millis(50), sender.recv()).await;
        assert!(echo.is_err());
    }

    #[tokio::test]
    async fn typing_requires_joined_group() {
        let state = state().await;
        let owner = UserIdentity::default_user();
        let chat = state.chat_service.create_chat(&owner, "Team").await.unwrap();
        let chat_id = chat.session.id;
        let typing = format!(r#"{{"type":"user_typing","chat_id":"{chat_id}","is_typing":true}}"#);

        let mut sub = state.relay.subscribe("conn-1");
        let reply = process_command(&typing, &state, &owner, &mut sub).await.unwrap();
        assert_eq!(reply["type"], "error");

        let join = format!(r#"{{"type":"join_group","chat_id":"{chat_id}"}}"#);
        process_command(&join, &state, &owner, &mut sub).await;
        assert!(process_command(&typing, &state, &owner, &mut sub).await.is_none());
        match sub.recv().await.unwrap() {
            RelayEvent::UserTyping {
                user_id, is_typing, ..
            } => {
                assert_eq!(user_id, owner.user_id);
                assert!(is_typing);
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[tokio::test]
    async fn typing_for_another_user_is_rejected() {
        let state = state().await;
        let owner = UserIdentity::default_user();
        let chat = state.chat_service.create_chat(&owner, "Team").await.unwrap();
        let chat_id = chat.session.id;

        let mut sub = state.relay.subscribe("conn-1");
        let mut watcher = state.relay.subscribe("conn-2");
        let join = format!(r#"{{"type":"join_group","chat_id":"{chat_id}"}}"#);
        process_command(&join, &state, &owner, &mut sub).await;
        process_command(&join, &state, &owner, &mut watcher).await;

        let spoofed = format!(
            r#"{{"type":"user_typing","chat_id":"{chat_id}","user_id":"someone-else","is_typing":true}}"#
        );
        let reply = process_command(&spoofed, &state, &owner, &mut sub).await.unwrap();
        assert_eq!(reply["type"], "error");
        let quiet = tokio::time::timeout(Duration::from_millis(50), watcher.recv()).await;
        assert!(quiet.is_err());

        let own = format!(
            r#"{{"type":"user_typing","chat_id":"{chat_id}","user_id":"{}","is_typing":false}}"#,
            owner.user_id
        );
        assert!(process_command(&own, &state, &owner, &mut sub).await.is_none());
        match watcher.recv().await.unwrap() {
            RelayEvent::UserTyping { user_id, .. } => assert_eq!(user_id, owner.user_id),
            other => panic!("unexpected event {other:?}"),
        }
    }
}
