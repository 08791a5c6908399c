use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

/// Where a conversation currently is in the profile form.
///
/// Explicit variant for "no form in progress" so every handler matches
/// exhaustively instead of probing an optional field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormStep {
    Telegram,
    Twitter,
    Usdt,
    #[default]
    Idle,
}

/// Ephemeral per-conversation form progress. Created on `/start` (to hold
/// a referral payload) or when an edit begins; destroyed on completion or
/// after `ttl` of inactivity.
#[derive(Debug, Clone)]
pub struct FormSession {
    pub step: FormStep,
    pub pending_referral: Option<String>,
    touched_at: Instant,
}

impl FormSession {
    fn new() -> Self {
        Self {
            step: FormStep::Idle,
            pending_referral: None,
            touched_at: Instant::now(),
        }
    }
}

/// In-memory session store keyed by telegram id.
///
/// Expiry is enforced lazily: an entry older than the sliding TTL reads
/// as absent and is dropped on the next access.
pub struct SessionStore {
    inner: RwLock<HashMap<String, FormSession>>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    pub async fn current_step(&self, key: &str) -> FormStep {
        let mut sessions = self.inner.write().await;
        match live_entry(&mut sessions, key, self.ttl) {
            Some(session) => session.step,
            None => FormStep::Idle,
        }
    }

    /// Start (or restart) the form at step one. A referral payload that
    /// was captured at `/start` survives the reset.
    pub async fn begin(&self, key: &str) {
        let mut sessions = self.inner.write().await;
        let session = live_entry(&mut sessions, key, self.ttl)
            .map(|s| s.clone())
            .unwrap_or_else(FormSession::new);

        sessions.insert(
            key.to_string(),
            FormSession {
                step: FormStep::Telegram,
                touched_at: Instant::now(),
                ..session
            },
        );
    }

    pub async fn advance(&self, key: &str, step: FormStep) {
        let mut sessions = self.inner.write().await;
        let session = live_entry(&mut sessions, key, self.ttl)
            .map(|s| s.clone())
            .unwrap_or_else(FormSession::new);

        sessions.insert(
            key.to_string(),
            FormSession {
                step,
                touched_at: Instant::now(),
                ..session
            },
        );
    }

    pub async fn set_pending_referral(&self, key: &str, referrer: String) {
        let mut sessions = self.inner.write().await;
        let mut session = live_entry(&mut sessions, key, self.ttl)
            .map(|s| s.clone())
            .unwrap_or_else(FormSession::new);

        session.pending_referral = Some(referrer);
        session.touched_at = Instant::now();
        sessions.insert(key.to_string(), session);
    }

    pub async fn pending_referral(&self, key: &str) -> Option<String> {
        let mut sessions = self.inner.write().await;
        live_entry(&mut sessions, key, self.ttl).and_then(|s| s.pending_referral.clone())
    }

    /// Drop the whole session: step and pending referral.
    pub async fn clear(&self, key: &str) {
        self.inner.write().await.remove(key);
    }
}

fn live_entry<'a>(
    sessions: &'a mut HashMap<String, FormSession>,
    key: &str,
    ttl: Duration,
) -> Option<&'a mut FormSession> {
    let expired = sessions
        .get(key)
        .map(|s| s.touched_at.elapsed() > ttl)
        .unwrap_or(false);

    if expired {
        sessions.remove(key);
        return None;
    }

    sessions.get_mut(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> SessionStore {
        SessionStore::new(Duration::from_secs(1800))
    }

    #[tokio::test]
    async fn absent_session_reads_idle() {
        assert_eq!(store().current_step("7").await, FormStep::Idle);
    }

    #[tokio::test]
    async fn begin_resets_step_and_keeps_referral() {
        let store = store();
        store.set_pending_referral("7", "99".to_string()).await;
        store.begin("7").await;
        store.advance("7", FormStep::Usdt).await;

        store.begin("7").await;
        assert_eq!(store.current_step("7").await, FormStep::Telegram);
        assert_eq!(store.pending_referral("7").await, Some("99".to_string()));
    }

    #[tokio::test]
    async fn clear_drops_everything() {
        let store = store();
        store.set_pending_referral("7", "99".to_string()).await;
        store.begin("7").await;

        store.clear("7").await;
        assert_eq!(store.current_step("7").await, FormStep::Idle);
        assert_eq!(store.pending_referral("7").await, None);
    }

    #[tokio::test]
    async fn expired_session_reads_idle() {
        let store = SessionStore::new(Duration::from_millis(10));
        store.begin("7").await;
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(store.current_step("7").await, FormStep::Idle);
        assert_eq!(store.pending_referral("7").await, None);
    }

    #[tokio::test]
    async fn touch_slides_the_ttl() {
        let store = SessionStore::new(Duration::from_millis(80));
        store.begin("7").await;
        tokio::time::sleep(Duration::from_millis(50)).await;
        store.advance("7", FormStep::Twitter).await;
        tokio::time::sleep(Duration::from_millis(50)).await;
        // 100ms since begin, but only 50ms since the last touch
        assert_eq!(store.current_step("7").await, FormStep::Twitter);
    }
}
