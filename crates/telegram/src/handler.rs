use crate::{
    command::Command,
    identity::{identity_from_callback, identity_from_message},
    keyboard, message,
};
use engine::ProfileFormEngine;
use std::sync::Arc;
use teloxide::{
    dispatching::UpdateHandler,
    prelude::*,
    types::ParseMode,
    utils::command::BotCommands,
};
use tracing::warn;

pub type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

pub fn schema() -> UpdateHandler<Box<dyn std::error::Error + Send + Sync + 'static>> {
    use dptree::case;

    let command_handler = teloxide::filter_command::<Command, _>()
        .branch(case![Command::Help].endpoint(handler_help))
        .branch(case![Command::Start(payload)].endpoint(handler_start))
        .branch(case![Command::Profile].endpoint(handler_profile))
        .branch(case![Command::Edit].endpoint(handler_edit));

    let message_handler = Update::filter_message()
        .branch(command_handler)
        .branch(dptree::endpoint(handler_text));

    let callback_query_handler = Update::filter_callback_query().endpoint(handler_callback);

    dptree::entry()
        .branch(message_handler)
        .branch(callback_query_handler)
}

async fn handler_help(bot: Bot, msg: Message) -> HandlerResult {
    bot.send_message(msg.chat.id, Command::descriptions().to_string())
        .await?;

    Ok(())
}

async fn handler_start(
    bot: Bot,
    msg: Message,
    payload: String,
    engine: Arc<ProfileFormEngine>,
) -> HandlerResult {
    let Some(who) = identity_from_message(&msg) else {
        return Ok(());
    };

    // Profile is created lazily on first contact; a failure here must not
    // kill the conversation.
    if let Err(err) = engine.ensure_profile(&who).await {
        warn!("⚠️ could not ensure profile for {}: {}", who.telegram_id, err);
    }

    // Deep-link referral payload: /start ref_<telegram id>
    if let Some(referrer) = payload.trim().strip_prefix("ref_") {
        if !referrer.is_empty() {
            engine.record_referral(&who, referrer).await;
        }
    }

    bot.send_message(msg.chat.id, message::message_welcome(&who))
        .parse_mode(ParseMode::Html)
        .reply_markup(keyboard::keyboard_main())
        .await?;

    Ok(())
}

async fn handler_profile(msg: Message, engine: Arc<ProfileFormEngine>) -> HandlerResult {
    let Some(who) = identity_from_message(&msg) else {
        return Ok(());
    };

    engine.show_profile(&who).await?;

    Ok(())
}

async fn handler_edit(msg: Message, engine: Arc<ProfileFormEngine>) -> HandlerResult {
    let Some(who) = identity_from_message(&msg) else {
        return Ok(());
    };

    engine.start_edit(&who).await?;

    Ok(())
}

// Every non-command text lands here; the engine routes it into whatever
// form step is active, or answers with the command hint.
async fn handler_text(msg: Message, engine: Arc<ProfileFormEngine>) -> HandlerResult {
    let Some(who) = identity_from_message(&msg) else {
        return Ok(());
    };
    let Some(text) = msg.text() else {
        return Ok(());
    };

    engine.handle_text(&who, text).await?;

    Ok(())
}

async fn handler_callback(bot: Bot, q: CallbackQuery, engine: Arc<ProfileFormEngine>) -> HandlerResult {
    let who = identity_from_callback(&q);
    let query_id = q.id.clone();

    match q.data.as_deref() {
        Some("edit_profile") => {
            bot.answer_callback_query(query_id).await?;
            engine.start_edit(&who).await?;
        }
        Some("refresh_profile") => {
            bot.answer_callback_query(query_id).text("Profile refreshed!").await?;
            engine.show_profile(&who).await?;
        }
        Some("main_menu") => {
            bot.answer_callback_query(query_id).await?;
            if let Some(msg) = q.message {
                bot.send_message(msg.chat.id, message::message_main_menu())
                    .parse_mode(ParseMode::Html)
                    .reply_markup(keyboard::keyboard_main())
                    .await?;
            }
        }
        _ => {
            bot.answer_callback_query(query_id).await?;
        }
    }

    Ok(())
}
