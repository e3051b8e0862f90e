//! # Course Chat Rooms
//!
//! Each course has one chat group, `chat_{course_id}`. A WebSocket joins the
//! group of its course; every valid frame it sends is broadcast to the whole
//! group (sender included) and then stored as a [`educa_core::Message`].
//!
//! ```text
//!  client ──frame──▶ reader ──validate──▶ hub.publish ──▶ every writer ──▶ clients
//!                                 │
//!                                 └──▶ store.append_message
//! ```
//!
//! Delivery is best effort: a writer that falls behind the broadcast buffer
//! skips the missed frames and carries on.

use super::{
    AppState,
    auth::AuthUser,
    error::ApiError,
    types::{ChatFrame, ChatRoomResponse, ClientFrame, CourseRef, MessageResponse},
};
use axum::{
    Json,
    extract::{
        Path, State,
        ws::{Message as WsMessage, WebSocket, WebSocketUpgrade, rejection::WebSocketUpgradeRejection},
    },
    response::{IntoResponse, Response},
};
use chrono::Utc;
use educa_core::{Course, CourseId, EducaError, User, validation};
use futures::{SinkExt, StreamExt};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::{RwLock, broadcast, mpsc};

/// Frames buffered per group before slow receivers start lagging.
const GROUP_CAPACITY: usize = 128;

/// Frames addressed to a single connection (error replies).
const DIRECT_CAPACITY: usize = 16;

// =============================================================================
// HUB
// =============================================================================

/// Name of the chat group of a course.
pub fn group_name(course: CourseId) -> String {
    format!("chat_{course}")
}

struct Group {
    sender: broadcast::Sender<ChatFrame>,
    members: usize,
}

/// Registry of live chat groups. Groups are created on first join and
/// dropped when their last member leaves.
#[derive(Clone, Default)]
pub struct ChatHub {
    groups: Arc<RwLock<BTreeMap<CourseId, Group>>>,
}

impl std::fmt::Debug for ChatHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatHub").finish_non_exhaustive()
    }
}

impl ChatHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Join the group of `course`, creating it if needed.
    pub async fn join(&self, course: CourseId) -> broadcast::Receiver<ChatFrame> {
        let mut groups = self.groups.write().await;
        let group = groups.entry(course).or_insert_with(|| {
            tracing::debug!(event = "group_created", group = %group_name(course));
            Group {
                sender: broadcast::channel(GROUP_CAPACITY).0,
                members: 0,
            }
        });
        group.members = group.members.saturating_add(1);
        group.sender.subscribe()
    }

    /// Leave the group of `course`; the last member out removes it.
    pub async fn leave(&self, course: CourseId) {
        let mut groups = self.groups.write().await;
        let Some(group) = groups.get_mut(&course) else {
            return;
        };
        group.members = group.members.saturating_sub(1);
        if group.members == 0 {
            groups.remove(&course);
            tracing::debug!(event = "group_removed", group = %group_name(course));
        }
    }

    /// Send `frame` to every member of the group. Returns how many
    /// receivers it reached (0 when nobody is connected).
    pub async fn publish(&self, course: CourseId, frame: ChatFrame) -> usize {
        let groups = self.groups.read().await;
        groups
            .get(&course)
            .and_then(|group| group.sender.send(frame).ok())
            .unwrap_or(0)
    }

    /// Connections currently in the group of `course`.
    pub async fn members(&self, course: CourseId) -> usize {
        let groups = self.groups.read().await;
        groups.get(&course).map_or(0, |group| group.members)
    }

    #[cfg(test)]
    async fn group_count(&self) -> usize {
        self.groups.read().await.len()
    }
}

// =============================================================================
// ACCESS
// =============================================================================

/// The course, if `user` may use its chat room.
fn room_access(state: &AppState, course: CourseId, user: &User) -> Result<Course, ApiError> {
    let Some(found) = state.store.course(course)? else {
        return Err(EducaError::Forbidden.into());
    };
    if !state.store.is_enrolled(course, user.id)? {
        return Err(EducaError::Forbidden.into());
    }
    Ok(found)
}

// =============================================================================
// HANDLERS
// =============================================================================

/// Chat room page: the course and its latest messages, oldest first.
pub async fn chat_room_handler(
    State(state): State<AppState>,
    Path(course_id): Path<u64>,
    AuthUser(user): AuthUser,
) -> Result<Json<ChatRoomResponse>, ApiError> {
    let course = room_access(&state, CourseId(course_id), &user)?;
    let latest = state
        .store
        .latest_messages(course.id, state.config.chat_history)?;

    let mut usernames: BTreeMap<u64, String> = BTreeMap::new();
    let mut latest_messages = Vec::with_capacity(latest.len());
    for message in latest {
        let author = message.user;
        let username = match usernames.get(&author.0) {
            Some(name) => name.clone(),
            None => {
                let name = state
                    .store
                    .user(author)?
                    .map(|u| u.username)
                    .unwrap_or_default();
                usernames.insert(author.0, name.clone());
                name
            }
        };
        latest_messages.push(MessageResponse::new(message, username));
    }

    Ok(Json(ChatRoomResponse {
        course: CourseRef::from(course),
        latest_messages,
    }))
}

/// Upgrade to the chat socket of a course.
///
/// Credentials and enrollment are checked before the upgrade headers, so a
/// stranger gets 401/403 rather than a protocol error.
pub async fn chat_socket_handler(
    State(state): State<AppState>,
    Path(course_id): Path<u64>,
    AuthUser(user): AuthUser,
    upgrade: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Result<Response, ApiError> {
    let course = room_access(&state, CourseId(course_id), &user)?;
    let upgrade = match upgrade {
        Ok(upgrade) => upgrade,
        Err(rejection) => return Ok(rejection.into_response()),
    };
    tracing::info!(
        event = "chat_connect",
        group = %group_name(course.id),
        user = %user.username
    );
    Ok(upgrade.on_upgrade(move |socket| run_session(socket, state, course.id, user)))
}

// =============================================================================
// SESSION
// =============================================================================

async fn run_session(socket: WebSocket, state: AppState, course: CourseId, user: User) {
    let mut events = state.hub.join(course).await;
    let (mut sink, mut stream) = socket.split();
    let (direct_tx, mut direct_rx) = mpsc::channel::<ChatFrame>(DIRECT_CAPACITY);

    let group = group_name(course);
    let writer_group = group.clone();
    let writer = tokio::spawn(async move {
        loop {
            let frame = tokio::select! {
                event = events.recv() => match event {
                    Ok(frame) => frame,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(
                            event = "chat_lagged",
                            group = %writer_group,
                            skipped,
                            "Receiver fell behind; frames dropped"
                        );
                        continue;
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
                direct = direct_rx.recv() => match direct {
                    Some(frame) => frame,
                    None => break,
                },
            };
            let text = match serde_json::to_string(&frame) {
                Ok(text) => text,
                Err(e) => {
                    tracing::error!(event = "chat_encode_failed", error = %e);
                    continue;
                }
            };
            if sink.send(WsMessage::Text(text.into())).await.is_err() {
                break;
            }
        }
    });

    while let Some(incoming) = stream.next().await {
        let text = match incoming {
            Ok(WsMessage::Text(text)) => text,
            Ok(WsMessage::Close(_)) => break,
            Ok(_) => continue,
            Err(e) => {
                tracing::debug!(event = "chat_receive_failed", group = %group, error = %e);
                break;
            }
        };
        match parse_frame(text.as_str()) {
            Ok(content) => broadcast_and_store(&state, course, &user, content).await,
            Err(error) => {
                if direct_tx.send(ChatFrame::Error { error }).await.is_err() {
                    break;
                }
            }
        }
    }

    writer.abort();
    state.hub.leave(course).await;
    tracing::info!(event = "chat_disconnect", group = %group, user = %user.username);
}

/// Extract and validate the message of a client frame.
fn parse_frame(text: &str) -> Result<String, String> {
    let frame: ClientFrame =
        serde_json::from_str(text).map_err(|e| format!("invalid frame: {e}"))?;
    validation::message(&frame.message).map_err(|e| e.to_string())
}

async fn broadcast_and_store(state: &AppState, course: CourseId, user: &User, content: String) {
    let frame = ChatFrame::ChatMessage {
        message: content.clone(),
        user: user.username.clone(),
        datetime: Utc::now().to_rfc3339(),
    };
    let reached = state.hub.publish(course, frame).await;
    tracing::debug!(event = "chat_broadcast", group = %group_name(course), reached);

    if let Err(e) = state.store.append_message(user.id, course, &content) {
        tracing::error!(
            event = "chat_persist_failed",
            group = %group_name(course),
            error = %e,
            "Failed to store chat message"
        );
    }
}

// =============================================================================
// TESTS
// =============================================================================
