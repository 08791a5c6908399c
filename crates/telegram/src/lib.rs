// Telegram: the bot surface — commands, free-text routing and rendering
// for the profile onboarding flow.

mod command;
mod handler;
mod identity;
mod keyboard;
mod message;
mod presenter;

use database::Database;
use engine::{DynPresenter, ProfileFormEngine, ReferralBonus, SessionStore};
use presenter::TelegramPresenter;
use std::{sync::Arc, time::Duration};
use teloxide::prelude::*;
use tracing::info;
use utils::AppConfig;

pub use command::Command;
pub use handler::schema;

#[derive(Clone)]
pub struct ProfileBot {
    pub engine: Arc<ProfileFormEngine>,
    pub bot: Bot,
}

impl ProfileBot {
    pub fn new(config: Arc<AppConfig>, database: Database) -> Self {
        let bot = Bot::new(&config.bot_token);

        let sessions = Arc::new(SessionStore::new(Duration::from_secs(config.session_ttl_secs)));
        let presenter = Arc::new(TelegramPresenter::new(bot.clone())) as DynPresenter;
        let bonus = ReferralBonus {
            enabled: config.enable_referral_bonus,
            referrer_amount: config.referral_bonus_amount,
            welcome_amount: config.welcome_bonus_amount,
        };

        let engine = Arc::new(ProfileFormEngine::new(
            Arc::new(database),
            sessions,
            presenter,
            bonus,
        ));

        Self { engine, bot }
    }

    pub async fn run(&self) {
        info!("🤖 ProfileBot running ...");

        Dispatcher::builder(self.bot.clone(), handler::schema())
            .dependencies(dptree::deps![self.engine.clone()])
            .enable_ctrlc_handler()
            .build()
            .dispatch()
            .await;
    }
}
