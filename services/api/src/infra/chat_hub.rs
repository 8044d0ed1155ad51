//! In-process room registry for the chat relay.
//!
//! Each connection owns a bounded outbox; publishing to a room pushes a clone
//! of the event into every member's outbox. Rooms disappear with their last
//! member.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{RwLock, mpsc};
use tracing::{debug, warn};
use uuid::Uuid;

/// Identifies one live relay connection.
pub type ConnectionId = Uuid;

struct Member<E> {
    username: String,
    outbox: mpsc::Sender<E>,
}

/// Room membership and fan-out. Cloning shares the registry.
pub struct ChatHub<E> {
    rooms: Arc<RwLock<HashMap<String, HashMap<ConnectionId, Member<E>>>>>,
}

impl<E> Clone for ChatHub<E> {
    fn clone(&self) -> Self {
        Self {
            rooms: Arc::clone(&self.rooms),
        }
    }
}

impl<E> Default for ChatHub<E> {
    fn default() -> Self {
        Self {
            rooms: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl<E: Clone + Send + Sync + 'static> ChatHub<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `conn` to `room`. Returns `false` if it was already a member.
    pub async fn join(
        &self,
        room: &str,
        conn: ConnectionId,
        username: &str,
        outbox: mpsc::Sender<E>,
    ) -> bool {
        let mut rooms = self.rooms.write().await;
        let members = rooms.entry(room.to_owned()).or_default();
        if members.contains_key(&conn) {
            return false;
        }
        members.insert(
            conn,
            Member {
                username: username.to_owned(),
                outbox,
            },
        );
        debug!(room, %conn, username, "joined room");
        true
    }

    /// Remove `conn` from `room`. Returns `false` if it was not a member.
    pub async fn leave(&self, room: &str, conn: ConnectionId) -> bool {
        let mut rooms = self.rooms.write().await;
        let Some(members) = rooms.get_mut(room) else {
            return false;
        };
        let removed = members.remove(&conn).is_some();
        if members.is_empty() {
            rooms.remove(room);
        }
        removed
    }

    /// Drop every membership of `conn`, returning `(room, username)` for each.
    pub async fn leave_all(&self, conn: ConnectionId) -> Vec<(String, String)> {
        let mut rooms = self.rooms.write().await;
        let mut left = Vec::new();
        rooms.retain(|room, members| {
            if let Some(member) = members.remove(&conn) {
                left.push((room.clone(), member.username));
            }
            !members.is_empty()
        });
        left
    }

    pub async fn is_member(&self, room: &str, conn: ConnectionId) -> bool {
        self.rooms
            .read()
            .await
            .get(room)
            .is_some_and(|members| members.contains_key(&conn))
    }

    pub async fn member_count(&self, room: &str) -> usize {
        self.rooms.read().await.get(room).map_or(0, HashMap::len)
    }

    /// Deliver `event` to every member of `room` except `exclude`.
    ///
    /// Members whose outbox is full or closed miss the event. Returns the
    /// number of members it was delivered to.
    pub async fn publish(&self, room: &str, event: E, exclude: Option<ConnectionId>) -> usize {
        let rooms = self.rooms.read().await;
        let Some(members) = rooms.get(room) else {
            return 0;
        };
        let mut delivered = 0;
        for (conn, member) in members {
            if Some(*conn) == exclude {
                continue;
            }
            match member.outbox.try_send(event.clone()) {
                Ok(()) => delivered += 1,
                Err(e) => warn!(room, conn = %conn, error = %e, "dropped chat event"),
            }
        }
        delivered
    }
}
