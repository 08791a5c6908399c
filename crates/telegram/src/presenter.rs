use crate::{keyboard, message};
use async_trait::async_trait;
use engine::{BotReply, Identity, Presenter};
use teloxide::{
    prelude::*,
    types::{InlineKeyboardMarkup, ParseMode},
};
use utils::{AppError, AppResult};

/// Renders engine intent as Telegram HTML messages. In a private chat the
/// user id doubles as the chat id.
pub struct TelegramPresenter {
    bot: Bot,
}

impl TelegramPresenter {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }

    fn chat_id(who: &Identity) -> AppResult<ChatId> {
        who.telegram_id
            .parse::<i64>()
            .map(ChatId)
            .map_err(|_| AppError::BadRequest(format!("bad telegram id: {}", who.telegram_id)))
    }

    async fn send(
        &self,
        who: &Identity,
        text: String,
        markup: Option<InlineKeyboardMarkup>,
    ) -> AppResult<()> {
        let chat = Self::chat_id(who)?;
        let request = self.bot.send_message(chat, text).parse_mode(ParseMode::Html);
        let request = match markup {
            Some(kb) => request.reply_markup(kb),
            None => request,
        };
        request
            .await
            .map_err(|e| AppError::Internal(format!("telegram api: {}", e)))?;

        Ok(())
    }
}

#[async_trait]
impl Presenter for TelegramPresenter {
    async fn present(&self, who: &Identity, reply: BotReply) -> AppResult<()> {
        match reply {
            BotReply::EditIntro => self.send(who, message::message_edit_intro(), None).await,
            BotReply::TwitterPrompt => self.send(who, message::message_twitter_prompt(), None).await,
            BotReply::AddressPrompt => self.send(who, message::message_address_prompt(), None).await,

            BotReply::TelegramHandleNeedsAt => {
                self.send(who, message::message_telegram_needs_at(), None).await
            }
            BotReply::TelegramHandleTooShort => {
                self.send(who, message::message_telegram_too_short(), None).await
            }
            BotReply::TwitterHandleEmpty => {
                self.send(who, message::message_twitter_empty(), None).await
            }
            BotReply::TwitterHandleTooLong => {
                self.send(who, message::message_twitter_too_long(), None).await
            }
            BotReply::AddressRejected => {
                self.send(who, message::message_address_rejected(), None).await
            }

            BotReply::ReferralWelcome { referrer } => {
                self.send(who, message::message_referral_welcome(&referrer), None)
                    .await
            }
            BotReply::ProfileCompleted {
                telegram_handle,
                twitter_handle,
                payout_address,
            } => {
                self.send(
                    who,
                    message::message_profile_completed(&telegram_handle, &twitter_handle, &payout_address),
                    None,
                )
                .await
            }
            BotReply::ProfileSummary {
                telegram_handle,
                twitter_handle,
                payout_address,
                balance,
                referral_count,
                completed,
            } => {
                self.send(
                    who,
                    message::message_profile_summary(
                        &telegram_handle,
                        &twitter_handle,
                        &payout_address,
                        balance,
                        referral_count,
                        completed,
                    ),
                    Some(keyboard::keyboard_profile()),
                )
                .await
            }
            BotReply::MainMenu => {
                self.send(who, message::message_main_menu(), Some(keyboard::keyboard_main()))
                    .await
            }
            BotReply::CommandHint => self.send(who, message::message_command_hint(), None).await,

            BotReply::StoreUnavailable => {
                self.send(who, message::message_store_unavailable(), None).await
            }
            BotReply::Unexpected => self.send(who, message::message_unexpected(), None).await,
        }
    }
}
