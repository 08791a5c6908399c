use engine::Identity;
use teloxide::types::{CallbackQuery, Message};

/// Identity of the message sender, if Telegram told us who that is.
pub fn identity_from_message(msg: &Message) -> Option<Identity> {
    msg.from().map(|user| Identity {
        telegram_id: user.id.0.to_string(),
        username: user.username.clone(),
        first_name: Some(user.first_name.clone()),
    })
}

pub fn identity_from_callback(query: &CallbackQuery) -> Identity {
    let user = &query.from;
    Identity {
        telegram_id: user.id.0.to_string(),
        username: user.username.clone(),
        first_name: Some(user.first_name.clone()),
    }
}
