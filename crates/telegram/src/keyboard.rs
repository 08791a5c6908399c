use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

pub fn keyboard_profile() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![
            InlineKeyboardButton::callback("✏️ Edit Profile", "edit_profile"),
            InlineKeyboardButton::callback("🔄 Refresh", "refresh_profile"),
        ],
        vec![InlineKeyboardButton::callback("🏠 Main Menu", "main_menu")],
    ])
}

pub fn keyboard_main() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![
        InlineKeyboardButton::callback("📋 My Profile", "refresh_profile"),
        InlineKeyboardButton::callback("✏️ Edit Profile", "edit_profile"),
    ]])
}
