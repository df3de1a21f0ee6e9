//! Process-wide directory of live game sessions.
//!
//! The registry is the single source of truth for "what games exist and who
//! is in them". It holds no persistence: a process restart loses all in-flight
//! games, and callers must not assume otherwise. Constructed once and
//! injected into the lobby/handlers, so tests can build a fresh one per case.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::{
    domain::{ChannelId, SessionId, UserId},
    errors::Reject,
    game::GameSession,
};

pub type SharedSession = Arc<Mutex<GameSession>>;

#[derive(Default)]
struct RegistryState {
    by_id: HashMap<SessionId, SharedSession>,
    by_channel: HashMap<ChannelId, SessionId>,
    by_player: HashMap<UserId, HashSet<SessionId>>,
}

#[derive(Default)]
pub struct GameRegistry {
    state: Mutex<RegistryState>,
}

impl GameRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a freshly created session under its channel. A channel may
    /// hold at most one live session; a second registration is rejected
    /// rather than silently overwriting (which would leak the old session).
    pub async fn register(&self, channel: ChannelId, session: SharedSession) -> Result<(), Reject> {
        let (id, players) = {
            let s = session.lock().await;
            (s.id().clone(), s.players().to_vec())
        };

        let mut st = self.state.lock().await;
        if st.by_channel.contains_key(&channel) {
            return Err(Reject::ChannelBusy);
        }

        st.by_channel.insert(channel, id.clone());
        for p in players {
            st.by_player.entry(p).or_default().insert(id.clone());
        }
        st.by_id.insert(id, session);
        Ok(())
    }

    /// Remove a session from all three directories. Idempotent: missing or
    /// partial entries are tolerated.
    pub async fn unregister(&self, id: &SessionId) {
        let mut st = self.state.lock().await;
        st.by_id.remove(id);
        st.by_channel.retain(|_, sid| sid != id);
        st.by_player.retain(|_, ids| {
            ids.remove(id);
            !ids.is_empty()
        });
    }

    /// Record that a player joined an already registered session.
    pub async fn index_player(&self, id: &SessionId, player: UserId) {
        let mut st = self.state.lock().await;
        if st.by_id.contains_key(id) {
            st.by_player.entry(player).or_default().insert(id.clone());
        }
    }

    /// Drop a player's membership index for one session.
    pub async fn unindex_player(&self, id: &SessionId, player: UserId) {
        let mut st = self.state.lock().await;
        if let Some(ids) = st.by_player.get_mut(&player) {
            ids.remove(id);
            if ids.is_empty() {
                st.by_player.remove(&player);
            }
        }
    }

    pub async fn find_by_id(&self, id: &SessionId) -> Option<SharedSession> {
        self.state.lock().await.by_id.get(id).cloned()
    }

    /// Channel a session is registered under. Linear in the number of live
    /// channels, which stays small.
    pub async fn channel_of(&self, id: &SessionId) -> Option<ChannelId> {
        let st = self.state.lock().await;
        st.by_channel
            .iter()
            .find(|(_, sid)| *sid == id)
            .map(|(ch, _)| *ch)
    }

    pub async fn find_by_channel(&self, channel: ChannelId) -> Option<SharedSession> {
        let st = self.state.lock().await;
        let id = st.by_channel.get(&channel)?;
        st.by_id.get(id).cloned()
    }

    /// First session the player is a member of, if any. Supports reconnect
    /// flows for players who are in a game in another channel.
    pub async fn find_active_for_player(&self, player: UserId) -> Option<SharedSession> {
        let st = self.state.lock().await;
        let ids = st.by_player.get(&player)?;
        let id = ids.iter().next()?;
        st.by_id.get(id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.state.lock().await.by_id.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
