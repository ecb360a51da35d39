//! Conversation state store
//!
//! One [`ConversationSession`] per user identifier. Each lives in a
//! [`SessionSlot`] whose async mutex is held for a whole dialogue turn, so
//! concurrent messages from the same user are applied one after the other
//! while different users never contend.
//!
//! The store is bounded: slots idle longer than the TTL are evicted by a
//! periodic cleanup task, and inserting beyond `max_sessions` evicts the
//! least recently touched idle slot. A slot that a request is currently
//! using is never evicted.

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, MutexGuard};
use tokio::time::Instant;

use medibot_config::constants::sessions::CLEANUP_INTERVAL_SECS;
use medibot_config::DialogueConfig;
use medibot_core::ProviderRecord;

/// Per-user conversational state
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversationSession {
    /// Lowercased symptoms, deduplicated, in first-reported order
    pub symptoms: Vec<String>,
    /// Last stated severity
    pub severity: Option<String>,
    /// Time of the most recent message, `None` before the first one
    pub last_interaction_at: Option<DateTime<Utc>>,
    /// Most recently recommended provider
    pub last_recommended_provider: Option<ProviderRecord>,
    /// Next non-negative message is more symptom input
    pub awaiting_more_symptoms: bool,
}

impl ConversationSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add symptoms not already recorded
    pub fn merge_symptoms<I, S>(&mut self, symptoms: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for symptom in symptoms {
            let symptom = symptom.as_ref().trim().to_lowercase();
            if !symptom.is_empty() && !self.symptoms.contains(&symptom) {
                self.symptoms.push(symptom);
            }
        }
    }

    /// Start a fresh episode with these symptoms
    pub fn replace_symptoms<I, S>(&mut self, symptoms: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.symptoms.clear();
        self.severity = None;
        self.merge_symptoms(symptoms);
    }

    /// Record a severity; last value wins
    pub fn set_severity(&mut self, severity: Option<String>) {
        if let Some(severity) = severity.filter(|s| !s.trim().is_empty()) {
            self.severity = Some(severity.trim().to_string());
        }
    }

    pub fn has_symptom_context(&self) -> bool {
        !self.symptoms.is_empty() || self.severity.is_some()
    }

    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.last_interaction_at = Some(now);
    }

    /// Whether prior context is older than `threshold`
    pub fn is_stale(&self, now: DateTime<Utc>, threshold: Duration) -> bool {
        match self.last_interaction_at {
            None => true,
            Some(last) => match (now - last).to_std() {
                Ok(elapsed) => elapsed > threshold,
                // clock went backwards
                Err(_) => false,
            },
        }
    }
}

/// True when there is no session or its last interaction is older than `threshold`
pub fn is_session_stale(
    session: Option<&ConversationSession>,
    now: DateTime<Utc>,
    threshold: Duration,
) -> bool {
    session.map_or(true, |s| s.is_stale(now, threshold))
}

/// Holder of one user's session
#[derive(Debug)]
pub struct SessionSlot {
    session: tokio::sync::Mutex<ConversationSession>,
    last_touched: Mutex<Instant>,
}

impl SessionSlot {
    fn new() -> Self {
        Self {
            session: tokio::sync::Mutex::new(ConversationSession::new()),
            last_touched: Mutex::new(Instant::now()),
        }
    }

    /// Exclusive access for one dialogue turn
    pub async fn lock(&self) -> MutexGuard<'_, ConversationSession> {
        self.touch();
        self.session.lock().await
    }

    pub fn touch(&self) {
        *self.last_touched.lock() = Instant::now();
    }

    pub fn idle_for(&self) -> Duration {
        self.last_touched.lock().elapsed()
    }
}

/// Bounded map of user identifier to session slot
pub struct SessionStore {
    slots: RwLock<HashMap<String, Arc<SessionSlot>>>,
    max_sessions: usize,
    idle_ttl: Duration,
    cleanup_interval: Duration,
}

impl SessionStore {
    /// Create a new session store
    pub fn new(max_sessions: usize, idle_ttl: Duration) -> Self {
        Self::with_config(max_sessions, idle_ttl, Duration::from_secs(CLEANUP_INTERVAL_SECS))
    }

    /// Create a new session store with custom TTL and cleanup interval
    pub fn with_config(max_sessions: usize, idle_ttl: Duration, cleanup_interval: Duration) -> Self {
        Self {
            slots: RwLock::new(HashMap::new()),
            max_sessions: max_sessions.max(1),
            idle_ttl,
            cleanup_interval,
        }
    }

    pub fn from_config(config: &DialogueConfig) -> Self {
        Self::with_config(
            config.max_sessions,
            Duration::from_secs(config.session_idle_ttl_seconds),
            Duration::from_secs(config.cleanup_interval_seconds),
        )
    }

    /// Slot for `user_id`, created on first use
    pub fn slot(&self, user_id: &str) -> Arc<SessionSlot> {
        if let Some(slot) = self.slots.read().get(user_id) {
            slot.touch();
            return Arc::clone(slot);
        }

        let mut slots = self.slots.write();
        if let Some(slot) = slots.get(user_id) {
            slot.touch();
            return Arc::clone(slot);
        }

        if slots.len() >= self.max_sessions {
            self.cleanup_expired_internal(&mut slots);
        }
        if slots.len() >= self.max_sessions {
            self.evict_least_recent(&mut slots);
        }

        let slot = Arc::new(SessionSlot::new());
        slots.insert(user_id.to_string(), Arc::clone(&slot));
        tracing::debug!(user_id = %user_id, sessions = slots.len(), "Created conversation session");
        slot
    }

    /// Copy of a user's session, if one exists
    pub async fn snapshot(&self, user_id: &str) -> Option<ConversationSession> {
        let slot = self.slots.read().get(user_id).cloned()?;
        let session = slot.session.lock().await;
        Some(session.clone())
    }

    pub fn contains(&self, user_id: &str) -> bool {
        self.slots.read().contains_key(user_id)
    }

    /// Tracked session count
    pub fn count(&self) -> usize {
        self.slots.read().len()
    }

    /// Remove a session
    pub fn remove(&self, user_id: &str) -> bool {
        self.slots.write().remove(user_id).is_some()
    }

    /// Cleanup expired sessions
    pub fn cleanup_expired(&self) -> usize {
        let mut slots = self.slots.write();
        self.cleanup_expired_internal(&mut slots)
    }

    /// Only the map holds an idle slot; any in-flight request holds a clone
    fn in_use(slot: &Arc<SessionSlot>) -> bool {
        Arc::strong_count(slot) > 1
    }

    fn cleanup_expired_internal(&self, slots: &mut HashMap<String, Arc<SessionSlot>>) -> usize {
        let ttl = self.idle_ttl;
        let before = slots.len();
        slots.retain(|user_id, slot| {
            let keep = Self::in_use(slot) || slot.idle_for() <= ttl;
            if !keep {
                tracing::debug!(user_id = %user_id, "Expired conversation session");
            }
            keep
        });
        before - slots.len()
    }

    fn evict_least_recent(&self, slots: &mut HashMap<String, Arc<SessionSlot>>) {
        let oldest = slots
            .iter()
            .filter(|(_, slot)| !Self::in_use(slot))
            .max_by_key(|(_, slot)| slot.idle_for())
            .map(|(user_id, _)| user_id.clone());

        match oldest {
            Some(user_id) => {
                slots.remove(&user_id);
                tracing::info!(user_id = %user_id, "Evicted least recently used session");
            }
            None => tracing::warn!(
                sessions = slots.len(),
                max_sessions = self.max_sessions,
                "All sessions busy, exceeding session limit"
            ),
        }
    }

    /// Start a background task that periodically evicts idle sessions.
    ///
    /// Returns a shutdown sender that stops the task.
    pub fn start_cleanup_task(self: &Arc<Self>) -> watch::Sender<bool> {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let store = Arc::clone(self);
        let interval = store.cleanup_interval;

        tokio::spawn(async move {
            let mut interval_timer = tokio::time::interval(interval);
            interval_timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = interval_timer.tick() => {
                        let removed = store.cleanup_expired();
                        if removed > 0 {
                            tracing::info!(
                                "Session cleanup: removed {} idle sessions ({} remaining)",
                                removed,
                                store.count()
                            );
                        }
                    }
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() || *shutdown_rx.borrow() {
                            tracing::info!("Session cleanup task shutting down");
                            break;
                        }
                    }
                }
            }
        });

        shutdown_tx
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOUR: Duration = Duration::from_secs(3600);

    #[test]
    fn test_staleness_threshold() {
        let now = Utc::now();
        let mut session = ConversationSession::new();
        assert!(session.is_stale(now, HOUR));

        session.touch(now - chrono::Duration::seconds(3601));
        assert!(session.is_stale(now, HOUR));

        session.touch(now - chrono::Duration::seconds(3599));
        assert!(!session.is_stale(now, HOUR));

        assert!(is_session_stale(None, now, HOUR));
        assert!(!is_session_stale(Some(&session), now, HOUR));
    }

    #[test]
    fn test_merge_symptoms_dedupes() {
        let mut session = ConversationSession::new();
        session.merge_symptoms(["Chest Pain", "nausea"]);
        session.merge_symptoms(["nausea", " dizziness ", ""]);
        assert_eq!(session.symptoms, vec!["chest pain", "nausea", "dizziness"]);
    }

    #[test]
    fn test_replace_symptoms_resets_episode() {
        let mut session = ConversationSession::new();
        session.merge_symptoms(["headache"]);
        session.set_severity(Some("4".to_string()));
        session.replace_symptoms(["rash"]);
        assert_eq!(session.symptoms, vec!["rash"]);
        assert_eq!(session.severity, None);
    }

    #[test]
    fn test_severity_last_wins() {
        let mut session = ConversationSession::new();
        session.set_severity(Some("3".to_string()));
        session.set_severity(None);
        session.set_severity(Some(" 8 ".to_string()));
        assert_eq!(session.severity.as_deref(), Some("8"));
    }

    #[tokio::test]
    async fn test_sessions_are_isolated() {
        let store = SessionStore::new(10, HOUR);
        store.slot("alice").lock().await.merge_symptoms(["cough"]);
        store.slot("bob").lock().await.merge_symptoms(["rash"]);

        assert_eq!(store.snapshot("alice").await.unwrap().symptoms, vec!["cough"]);
        assert_eq!(store.snapshot("bob").await.unwrap().symptoms, vec!["rash"]);
        assert!(store.snapshot("carol").await.is_none());
        assert_eq!(store.count(), 2);
    }

    #[tokio::test]
    async fn test_same_slot_for_same_user() {
        let store = SessionStore::new(10, HOUR);
        let a = store.slot("alice");
        let b = store.slot("alice");
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cleanup_evicts_idle_sessions() {
        let store = SessionStore::new(10, Duration::from_secs(60));
        drop(store.slot("old"));
        tokio::time::advance(Duration::from_secs(61)).await;
        drop(store.slot("fresh"));

        assert_eq!(store.cleanup_expired(), 1);
        assert!(!store.contains("old"));
        assert!(store.contains("fresh"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cleanup_keeps_sessions_in_use() {
        let store = SessionStore::new(10, Duration::from_secs(60));
        let held = store.slot("busy");
        tokio::time::advance(Duration::from_secs(120)).await;

        assert_eq!(store.cleanup_expired(), 0);
        assert!(store.contains("busy"));
        drop(held);
    }

    #[tokio::test(start_paused = true)]
    async fn test_capacity_evicts_least_recent() {
        let store = SessionStore::new(2, HOUR);
        drop(store.slot("first"));
        tokio::time::advance(Duration::from_secs(5)).await;
        drop(store.slot("second"));
        tokio::time::advance(Duration::from_secs(5)).await;
        drop(store.slot("third"));

        assert_eq!(store.count(), 2);
        assert!(!store.contains("first"));
        assert!(store.contains("second"));
        assert!(store.contains("third"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cleanup_task_runs_and_stops() {
        let store = Arc::new(SessionStore::with_config(
            10,
            Duration::from_secs(60),
            Duration::from_secs(30),
        ));
        drop(store.slot("idle"));

        let shutdown = store.start_cleanup_task();
        tokio::time::sleep(Duration::from_secs(95)).await;
        assert!(!store.contains("idle"));

        shutdown.send(true).unwrap();
    }
}
