//! In-memory call session store.
//!
//! Tracks one [`CallSessionInfo`] per in-flight call, keyed by `call_id`.
//! A single pipeline process owns its own store; multi-instance deployments
//! are expected to shard calls by `call_id` hash rather than share state
//! (see the Open Questions entry in DESIGN.md for the shared-store tradeoff).

use std::collections::HashMap;

use chrono::Utc;
use parking_lot::RwLock;

use vc_domain::trace::TraceEvent;
use vc_domain::types::{CallSessionInfo, ConversationState};

pub struct CallSessionStore {
    sessions: RwLock<HashMap<String, CallSessionInfo>>,
}

impl CallSessionStore {
    pub fn new() -> Self {
        Self { sessions: RwLock::new(HashMap::new()) }
    }

    pub fn create(&self, call_id: String, tenant_id: String, campaign_id: String, lead_id: String) -> CallSessionInfo {
        let now = Utc::now();
        let info = CallSessionInfo {
            call_id: call_id.clone(),
            tenant_id,
            campaign_id,
            lead_id,
            state: ConversationState::Greeting,
            created_at: now,
            last_activity: now,
            turn_count: 0,
            barge_in_count: 0,
        };
        self.sessions.write().insert(call_id, info.clone());
        info
    }

    pub fn get(&self, call_id: &str) -> Option<CallSessionInfo> {
        self.sessions.read().get(call_id).cloned()
    }

    pub fn touch(&self, call_id: &str) {
        if let Some(entry) = self.sessions.write().get_mut(call_id) {
            entry.last_activity = Utc::now();
        }
    }

    pub fn transition(&self, call_id: &str, to: ConversationState) {
        let mut sessions = self.sessions.write();
        if let Some(entry) = sessions.get_mut(call_id) {
            let from = entry.state;
            entry.state = to;
            entry.last_activity = Utc::now();
            drop(sessions);
            TraceEvent::CallStateTransition {
                call_id: call_id.to_string(),
                from: format!("{from:?}"),
                to: format!("{to:?}"),
            }
            .emit();
        }
    }

    pub fn record_turn(&self, call_id: &str) {
        if let Some(entry) = self.sessions.write().get_mut(call_id) {
            entry.turn_count += 1;
            entry.last_activity = Utc::now();
        }
    }

    pub fn record_barge_in(&self, call_id: &str) {
        if let Some(entry) = self.sessions.write().get_mut(call_id) {
            entry.barge_in_count += 1;
            entry.last_activity = Utc::now();
        }
    }

    pub fn remove(&self, call_id: &str) -> Option<CallSessionInfo> {
        self.sessions.write().remove(call_id)
    }

    pub fn list(&self) -> Vec<CallSessionInfo> {
        self.sessions.read().values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }
}

impl Default for CallSessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_and_get_round_trips() {
        let store = CallSessionStore::new();
        let info = store.create("c1".into(), "t1".into(), "camp1".into(), "lead1".into());
        assert_eq!(info.state, ConversationState::Greeting);
        assert_eq!(store.get("c1").unwrap().call_id, "c1");
    }

    #[test]
    fn transition_updates_state() {
        let store = CallSessionStore::new();
        store.create("c1".into(), "t1".into(), "camp1".into(), "lead1".into());
        store.transition("c1", ConversationState::Listening);
        assert_eq!(store.get("c1").unwrap().state, ConversationState::Listening);
    }

    #[test]
    fn record_turn_and_barge_in_increment_counters() {
        let store = CallSessionStore::new();
        store.create("c1".into(), "t1".into(), "camp1".into(), "lead1".into());
        store.record_turn("c1");
        store.record_turn("c1");
        store.record_barge_in("c1");
        let info = store.get("c1").unwrap();
        assert_eq!(info.turn_count, 2);
        assert_eq!(info.barge_in_count, 1);
    }

    #[test]
    fn remove_deletes_session() {
        let store = CallSessionStore::new();
        store.create("c1".into(), "t1".into(), "camp1".into(), "lead1".into());
        assert!(store.remove("c1").is_some());
        assert!(store.get("c1").is_none());
    }

    #[test]
    fn unknown_call_id_is_noop() {
        let store = CallSessionStore::new();
        store.touch("nonexistent");
        store.record_turn("nonexistent");
        assert!(store.is_empty());
    }
}
