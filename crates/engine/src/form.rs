use crate::{
    presenter::{BotReply, DynPresenter},
    session::{FormStep, SessionStore},
    validation::is_valid_bep20_address,
};
use chrono::Utc;
use database::{DynProfileRepository, ReferralRecord, UserProfile};
use std::sync::Arc;
use tracing::{debug, error, warn};
use utils::{AppError, AppResult};

/// Who is talking to us, passed explicitly into every entry point instead
/// of living on an ambient request context.
#[derive(Debug, Clone)]
pub struct Identity {
    /// Stable Telegram user id; also the chat id in a private chat
    pub telegram_id: String,
    pub username: Option<String>,
    pub first_name: Option<String>,
}

impl Identity {
    pub fn key(&self) -> &str {
        &self.telegram_id
    }
}

/// Referral bonus policy. Off by default: the referral is recorded but
/// nobody's balance is credited.
#[derive(Debug, Clone, Copy)]
pub struct ReferralBonus {
    pub enabled: bool,
    pub referrer_amount: f64,
    pub welcome_amount: f64,
}

impl ReferralBonus {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            referrer_amount: 0.0,
            welcome_amount: 0.0,
        }
    }
}

/// Drives the three-step profile form: Telegram handle, Twitter handle,
/// payout address. Each turn re-fetches the stored profile, validates one
/// answer, persists it and advances the session; step three additionally
/// attributes a pending referral before handing back to the main menu.
pub struct ProfileFormEngine {
    profiles: DynProfileRepository,
    sessions: Arc<SessionStore>,
    presenter: DynPresenter,
    bonus: ReferralBonus,
}

impl ProfileFormEngine {
    pub fn new(
        profiles: DynProfileRepository,
        sessions: Arc<SessionStore>,
        presenter: DynPresenter,
        bonus: ReferralBonus,
    ) -> Self {
        Self {
            profiles,
            sessions,
            presenter,
            bonus,
        }
    }

    /// Lazily create the profile on first contact.
    pub async fn ensure_profile(&self, who: &Identity) -> AppResult<UserProfile> {
        self.profiles
            .find_or_create(who.key(), who.username.clone(), who.first_name.clone())
            .await
    }

    pub async fn current_step(&self, who: &Identity) -> FormStep {
        self.sessions.current_step(who.key()).await
    }

    /// Capture a referral payload from a `/start ref_<id>` deep link.
    /// Referring yourself is ignored.
    pub async fn record_referral(&self, who: &Identity, referrer_id: &str) {
        if referrer_id == who.telegram_id {
            debug!("ignoring self-referral from {}", who.telegram_id);
            return;
        }
        self.sessions
            .set_pending_referral(who.key(), referrer_id.to_string())
            .await;
    }

    /// (Re)start the form at step one. Always resets the step, whether the
    /// profile is complete, mid-edit or untouched.
    pub async fn start_edit(&self, who: &Identity) -> AppResult<()> {
        match self.begin_edit(who).await {
            Ok(()) => Ok(()),
            Err(err) => self.report(who, err).await,
        }
    }

    /// Feed one free-text message into whatever step is active.
    pub async fn handle_text(&self, who: &Identity, text: &str) -> AppResult<()> {
        match self.advance_form(who, text).await {
            Ok(()) => Ok(()),
            Err(err) => self.report(who, err).await,
        }
    }

    /// Render the profile card with the edit/refresh/menu keyboard.
    pub async fn show_profile(&self, who: &Identity) -> AppResult<()> {
        match self.render_profile(who).await {
            Ok(()) => Ok(()),
            Err(err) => self.report(who, err).await,
        }
    }

    async fn begin_edit(&self, who: &Identity) -> AppResult<()> {
        self.ensure_profile(who).await?;
        self.sessions.begin(who.key()).await;
        self.presenter.present(who, BotReply::EditIntro).await
    }

    async fn advance_form(&self, who: &Identity, text: &str) -> AppResult<()> {
        // Act on the freshest stored copy, never on state carried over
        // from an earlier turn.
        let profile = self.ensure_profile(who).await?;

        match self.sessions.current_step(who.key()).await {
            FormStep::Telegram => self.collect_telegram_handle(who, profile, text).await,
            FormStep::Twitter => self.collect_twitter_handle(who, profile, text).await,
            FormStep::Usdt => self.collect_payout_address(who, profile, text).await,
            FormStep::Idle => self.presenter.present(who, BotReply::CommandHint).await,
        }
    }

    async fn collect_telegram_handle(
        &self,
        who: &Identity,
        mut profile: UserProfile,
        text: &str,
    ) -> AppResult<()> {
        let handle = text.trim();

        if !handle.starts_with('@') {
            return self.presenter.present(who, BotReply::TelegramHandleNeedsAt).await;
        }
        if handle.chars().count() < 5 {
            return self.presenter.present(who, BotReply::TelegramHandleTooShort).await;
        }

        profile.telegram_handle = Some(handle.to_string());
        self.profiles.save(&profile).await?;

        self.sessions.advance(who.key(), FormStep::Twitter).await;
        self.presenter.present(who, BotReply::TwitterPrompt).await
    }

    async fn collect_twitter_handle(
        &self,
        who: &Identity,
        mut profile: UserProfile,
        text: &str,
    ) -> AppResult<()> {
        let trimmed = text.trim();
        let handle = trimmed.strip_prefix('@').unwrap_or(trimmed);

        if handle.is_empty() {
            return self.presenter.present(who, BotReply::TwitterHandleEmpty).await;
        }
        if handle.chars().count() > 15 {
            return self.presenter.present(who, BotReply::TwitterHandleTooLong).await;
        }

        profile.twitter_handle = Some(handle.to_string());
        self.profiles.save(&profile).await?;

        self.sessions.advance(who.key(), FormStep::Usdt).await;
        self.presenter.present(who, BotReply::AddressPrompt).await
    }

    async fn collect_payout_address(
        &self,
        who: &Identity,
        mut profile: UserProfile,
        text: &str,
    ) -> AppResult<()> {
        let address = text.trim();

        if !is_valid_bep20_address(address) {
            return self.presenter.present(who, BotReply::AddressRejected).await;
        }

        profile.payout_address = Some(address.to_string());
        profile.profile_completed = true;

        // Referral attribution is best-effort: a missing referrer or a
        // failed append never blocks the user's own completion.
        if let Some(referrer_id) = self.sessions.pending_referral(who.key()).await {
            if let Err(err) = self.attribute_referral(who, &referrer_id, &mut profile).await {
                warn!("⚠️ referral attribution to {} failed: {}", referrer_id, err);
            }
        }

        self.profiles.save(&profile).await?;
        self.sessions.clear(who.key()).await;

        self.presenter
            .present(
                who,
                BotReply::ProfileCompleted {
                    telegram_handle: profile.telegram_handle.clone().unwrap_or_default(),
                    twitter_handle: profile.twitter_handle.clone().unwrap_or_default(),
                    payout_address: profile.payout_address.clone().unwrap_or_default(),
                },
            )
            .await?;

        // Hand control back to the main menu.
        self.presenter.present(who, BotReply::MainMenu).await
    }

    async fn attribute_referral(
        &self,
        who: &Identity,
        referrer_id: &str,
        profile: &mut UserProfile,
    ) -> AppResult<()> {
        let Some(mut referrer) = self.profiles.find_by_telegram_id(referrer_id).await? else {
            debug!("referrer {} not found, skipping attribution", referrer_id);
            return Ok(());
        };

        referrer.referrals.push(ReferralRecord {
            user_id: profile.telegram_id.clone(),
            username: profile.username.clone().or_else(|| profile.first_name.clone()),
            completed: true,
            claimed: false,
            referred_at: Utc::now().timestamp() as u64,
        });

        if self.bonus.enabled {
            referrer.balance += self.bonus.referrer_amount;
        }

        self.profiles.save(&referrer).await?;

        // Credit the newcomer only once the referrer side is durably
        // recorded; the caller persists `profile` right after us.
        if self.bonus.enabled {
            profile.balance += self.bonus.welcome_amount;
        }

        self.presenter
            .present(
                who,
                BotReply::ReferralWelcome {
                    referrer: referrer.display_name(),
                },
            )
            .await
    }

    async fn render_profile(&self, who: &Identity) -> AppResult<()> {
        let profile = self.ensure_profile(who).await?;
        // Re-read by document id so a parallel edit is reflected.
        let profile = match profile.id {
            Some(id) => self.profiles.find_by_id(&id).await?.unwrap_or(profile),
            None => profile,
        };

        self.presenter
            .present(
                who,
                BotReply::ProfileSummary {
                    telegram_handle: profile.telegram_handle.clone(),
                    twitter_handle: profile.twitter_handle.clone(),
                    payout_address: profile.payout_address.clone(),
                    balance: profile.balance,
                    referral_count: profile.referrals.len(),
                    completed: profile.profile_completed,
                },
            )
            .await
    }

    async fn report(&self, who: &Identity, err: AppError) -> AppResult<()> {
        error!("❌ profile flow error for {}: {}", who.telegram_id, err);
        let reply = if err.is_persistence() {
            BotReply::StoreUnavailable
        } else {
            BotReply::Unexpected
        };
        self.presenter.present(who, reply).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use database::ProfileRepositoryTrait;
    use mongodb::bson::oid::ObjectId;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio::sync::RwLock;

    struct MemoryProfileStore {
        profiles: RwLock<HashMap<String, UserProfile>>,
        fail_saves: AtomicBool,
    }

    impl MemoryProfileStore {
        fn new() -> Self {
            Self {
                profiles: RwLock::new(HashMap::new()),
                fail_saves: AtomicBool::new(false),
            }
        }

        async fn seed(&self, profile: UserProfile) {
            self.profiles
                .write()
                .await
                .insert(profile.telegram_id.clone(), profile);
        }

        async fn get(&self, telegram_id: &str) -> Option<UserProfile> {
            self.profiles.read().await.get(telegram_id).cloned()
        }

        fn fail_next_saves(&self) {
            self.fail_saves.store(true, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl ProfileRepositoryTrait for MemoryProfileStore {
        async fn find_by_id(&self, id: &ObjectId) -> AppResult<Option<UserProfile>> {
            Ok(self
                .profiles
                .read()
                .await
                .values()
                .find(|p| p.id.as_ref() == Some(id))
                .cloned())
        }

        async fn find_by_telegram_id(&self, telegram_id: &str) -> AppResult<Option<UserProfile>> {
            Ok(self.get(telegram_id).await)
        }

        async fn find_or_create(
            &self,
            telegram_id: &str,
            username: Option<String>,
            first_name: Option<String>,
        ) -> AppResult<UserProfile> {
            if let Some(existing) = self.get(telegram_id).await {
                return Ok(existing);
            }
            let mut profile = UserProfile::new(telegram_id, username, first_name);
            profile.id = Some(ObjectId::new());
            self.seed(profile.clone()).await;
            Ok(profile)
        }

        async fn save(&self, profile: &UserProfile) -> AppResult<()> {
            if self.fail_saves.load(Ordering::SeqCst) {
                let io = std::io::Error::new(std::io::ErrorKind::Other, "store down");
                return Err(AppError::Database(io.into()));
            }
            self.seed(profile.clone()).await;
            Ok(())
        }
    }

    struct RecordingPresenter {
        replies: Mutex<Vec<BotReply>>,
    }

    impl RecordingPresenter {
        fn new() -> Self {
            Self {
                replies: Mutex::new(Vec::new()),
            }
        }

        fn all(&self) -> Vec<BotReply> {
            self.replies.lock().unwrap().clone()
        }

        fn last(&self) -> Option<BotReply> {
            self.replies.lock().unwrap().last().cloned()
        }
    }

    #[async_trait]
    impl crate::presenter::Presenter for RecordingPresenter {
        async fn present(&self, _who: &Identity, reply: BotReply) -> AppResult<()> {
            self.replies.lock().unwrap().push(reply);
            Ok(())
        }
    }

    struct Harness {
        engine: ProfileFormEngine,
        store: Arc<MemoryProfileStore>,
        presenter: Arc<RecordingPresenter>,
        sessions: Arc<SessionStore>,
    }

    fn harness_with_bonus(bonus: ReferralBonus) -> Harness {
        let store = Arc::new(MemoryProfileStore::new());
        let presenter = Arc::new(RecordingPresenter::new());
        let sessions = Arc::new(SessionStore::new(Duration::from_secs(1800)));
        let engine = ProfileFormEngine::new(
            store.clone(),
            sessions.clone(),
            presenter.clone(),
            bonus,
        );
        Harness {
            engine,
            store,
            presenter,
            sessions,
        }
    }

    fn harness() -> Harness {
        harness_with_bonus(ReferralBonus::disabled())
    }

    fn alice() -> Identity {
        Identity {
            telegram_id: "1001".to_string(),
            username: Some("alice".to_string()),
            first_name: Some("Alice".to_string()),
        }
    }

    const VALID_ADDRESS: &str = "0xa7c15a46fa8feb53140844e0b31d847e6087d2ca";

    async fn complete_form(h: &Harness, who: &Identity) {
        h.engine.start_edit(who).await.unwrap();
        h.engine.handle_text(who, "@alice_tg").await.unwrap();
        h.engine.handle_text(who, "@alice_tw").await.unwrap();
        h.engine.handle_text(who, VALID_ADDRESS).await.unwrap();
    }

    #[tokio::test]
    async fn handle_without_at_stays_on_step_one() {
        let h = harness();
        let who = alice();

        h.engine.start_edit(&who).await.unwrap();
        h.engine.handle_text(&who, "myusername").await.unwrap();

        assert_eq!(h.presenter.last(), Some(BotReply::TelegramHandleNeedsAt));
        assert_eq!(h.engine.current_step(&who).await, FormStep::Telegram);
        assert_eq!(h.store.get("1001").await.unwrap().telegram_handle, None);
    }

    #[tokio::test]
    async fn short_handle_stays_on_step_one() {
        let h = harness();
        let who = alice();

        h.engine.start_edit(&who).await.unwrap();
        h.engine.handle_text(&who, "@abc").await.unwrap();

        assert_eq!(h.presenter.last(), Some(BotReply::TelegramHandleTooShort));
        assert_eq!(h.engine.current_step(&who).await, FormStep::Telegram);
    }

    #[tokio::test]
    async fn five_char_handle_advances_to_twitter() {
        let h = harness();
        let who = alice();

        h.engine.start_edit(&who).await.unwrap();
        h.engine.handle_text(&who, "@abcd").await.unwrap();

        assert_eq!(h.presenter.last(), Some(BotReply::TwitterPrompt));
        assert_eq!(h.engine.current_step(&who).await, FormStep::Twitter);
        assert_eq!(
            h.store.get("1001").await.unwrap().telegram_handle,
            Some("@abcd".to_string())
        );
    }

    #[tokio::test]
    async fn twitter_handle_is_stored_without_at() {
        let h = harness();
        let who = alice();

        h.engine.start_edit(&who).await.unwrap();
        h.engine.handle_text(&who, "@alice_tg").await.unwrap();
        h.engine.handle_text(&who, "@bob").await.unwrap();

        assert_eq!(h.presenter.last(), Some(BotReply::AddressPrompt));
        assert_eq!(h.engine.current_step(&who).await, FormStep::Usdt);
        assert_eq!(
            h.store.get("1001").await.unwrap().twitter_handle,
            Some("bob".to_string())
        );
    }

    #[tokio::test]
    async fn overlong_twitter_handle_stays_on_step_two() {
        let h = harness();
        let who = alice();

        h.engine.start_edit(&who).await.unwrap();
        h.engine.handle_text(&who, "@alice_tg").await.unwrap();
        h.engine.handle_text(&who, "sixteen_chars_xx").await.unwrap();

        assert_eq!(h.presenter.last(), Some(BotReply::TwitterHandleTooLong));
        assert_eq!(h.engine.current_step(&who).await, FormStep::Twitter);
    }

    #[tokio::test]
    async fn bare_at_reads_as_empty_twitter_handle() {
        let h = harness();
        let who = alice();

        h.engine.start_edit(&who).await.unwrap();
        h.engine.handle_text(&who, "@alice_tg").await.unwrap();
        h.engine.handle_text(&who, "@").await.unwrap();

        assert_eq!(h.presenter.last(), Some(BotReply::TwitterHandleEmpty));
        assert_eq!(h.engine.current_step(&who).await, FormStep::Twitter);
    }

    #[tokio::test]
    async fn invalid_address_stays_on_step_three() {
        let h = harness();
        let who = alice();

        h.engine.start_edit(&who).await.unwrap();
        h.engine.handle_text(&who, "@alice_tg").await.unwrap();
        h.engine.handle_text(&who, "alice_tw").await.unwrap();
        h.engine.handle_text(&who, "0x123").await.unwrap();

        assert_eq!(h.presenter.last(), Some(BotReply::AddressRejected));
        assert_eq!(h.engine.current_step(&who).await, FormStep::Usdt);
        assert!(!h.store.get("1001").await.unwrap().profile_completed);
    }

    #[tokio::test]
    async fn completion_attributes_pending_referral() {
        let h = harness();
        let who = alice();

        let referrer = UserProfile::new("99", Some("ref_guy".to_string()), None);
        h.store.seed(referrer).await;

        h.engine.ensure_profile(&who).await.unwrap();
        h.engine.record_referral(&who, "99").await;
        complete_form(&h, &who).await;

        let referrer = h.store.get("99").await.unwrap();
        assert_eq!(referrer.referrals.len(), 1);
        assert!(referrer.referrals[0].completed);
        assert!(!referrer.referrals[0].claimed);
        assert_eq!(referrer.referrals[0].user_id, "1001");
        // bonus disabled by default
        assert_eq!(referrer.balance, 0.0);

        let user = h.store.get("1001").await.unwrap();
        assert!(user.profile_completed);
        assert_eq!(user.payout_address, Some(VALID_ADDRESS.to_string()));
        assert_eq!(user.balance, 0.0);

        // session fully cleared: no leftover step or referral id
        assert_eq!(h.engine.current_step(&who).await, FormStep::Idle);
        assert_eq!(h.sessions.pending_referral("1001").await, None);

        let replies = h.presenter.all();
        assert!(replies.contains(&BotReply::ReferralWelcome {
            referrer: "ref_guy".to_string()
        }));
        assert_eq!(replies.last(), Some(&BotReply::MainMenu));
    }

    #[tokio::test]
    async fn missing_referrer_never_blocks_completion() {
        let h = harness();
        let who = alice();

        h.engine.ensure_profile(&who).await.unwrap();
        h.engine.record_referral(&who, "404").await;
        complete_form(&h, &who).await;

        assert!(h.store.get("1001").await.unwrap().profile_completed);
        assert_eq!(h.engine.current_step(&who).await, FormStep::Idle);

        let replies = h.presenter.all();
        assert!(!replies
            .iter()
            .any(|r| matches!(r, BotReply::ReferralWelcome { .. })));
        assert!(!replies.contains(&BotReply::Unexpected));
    }

    #[tokio::test]
    async fn start_edit_always_resets_to_step_one() {
        let h = harness();
        let who = alice();

        h.engine.start_edit(&who).await.unwrap();
        h.engine.handle_text(&who, "@alice_tg").await.unwrap();
        assert_eq!(h.engine.current_step(&who).await, FormStep::Twitter);

        h.engine.start_edit(&who).await.unwrap();
        assert_eq!(h.engine.current_step(&who).await, FormStep::Telegram);
        assert_eq!(h.presenter.last(), Some(BotReply::EditIntro));
    }

    #[tokio::test]
    async fn save_failure_keeps_step_and_asks_for_retry() {
        let h = harness();
        let who = alice();

        h.engine.start_edit(&who).await.unwrap();
        h.store.fail_next_saves();
        h.engine.handle_text(&who, "@abcd").await.unwrap();

        assert_eq!(h.presenter.last(), Some(BotReply::StoreUnavailable));
        // same step, nothing persisted: resubmitting retries cleanly
        assert_eq!(h.engine.current_step(&who).await, FormStep::Telegram);
        assert_eq!(h.store.get("1001").await.unwrap().telegram_handle, None);
    }

    #[tokio::test]
    async fn bonus_credits_both_sides_when_enabled() {
        let h = harness_with_bonus(ReferralBonus {
            enabled: true,
            referrer_amount: 10.0,
            welcome_amount: 5.0,
        });
        let who = alice();

        h.store
            .seed(UserProfile::new("99", Some("ref_guy".to_string()), None))
            .await;
        h.engine.ensure_profile(&who).await.unwrap();
        h.engine.record_referral(&who, "99").await;
        complete_form(&h, &who).await;

        assert_eq!(h.store.get("99").await.unwrap().balance, 10.0);
        assert_eq!(h.store.get("1001").await.unwrap().balance, 5.0);
    }

    #[tokio::test]
    async fn self_referral_is_ignored() {
        let h = harness();
        let who = alice();

        h.engine.record_referral(&who, "1001").await;
        assert_eq!(h.sessions.pending_referral("1001").await, None);
    }

    #[tokio::test]
    async fn text_outside_a_form_gets_the_hint() {
        let h = harness();
        let who = alice();

        h.engine.handle_text(&who, "hello?").await.unwrap();
        assert_eq!(h.presenter.last(), Some(BotReply::CommandHint));
    }

    #[tokio::test]
    async fn show_profile_reports_fresh_state() {
        let h = harness();
        let who = alice();

        complete_form(&h, &who).await;
        h.engine.show_profile(&who).await.unwrap();

        match h.presenter.last() {
            Some(BotReply::ProfileSummary {
                telegram_handle,
                twitter_handle,
                payout_address,
                referral_count,
                completed,
                ..
            }) => {
                assert_eq!(telegram_handle, Some("@alice_tg".to_string()));
                assert_eq!(twitter_handle, Some("alice_tw".to_string()));
                assert_eq!(payout_address, Some(VALID_ADDRESS.to_string()));
                assert_eq!(referral_count, 0);
                assert!(completed);
            }
            other => panic!("expected ProfileSummary, got {:?}", other),
        }
    }
}
