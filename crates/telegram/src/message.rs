// Message bodies, HTML parse mode. Texts live here so the engine only
// ever deals in intent.

use engine::Identity;

pub fn format_usd(amount: f64) -> String {
    format!("${:.2}", amount)
}

fn or_not_set(value: &Option<String>) -> String {
    value.clone().unwrap_or_else(|| "Not set".to_string())
}

pub fn message_welcome(who: &Identity) -> String {
    let name = who
        .first_name
        .clone()
        .or_else(|| who.username.clone())
        .unwrap_or_else(|| "there".to_string());

    format!(
        "👋 Welcome, <b>{}</b>!\n\n\
         Complete your profile to participate in activities and withdraw earnings.\n\
         Use /edit to fill it in, /profile to review it.",
        name
    )
}

pub fn message_edit_intro() -> String {
    "📝 <b>Edit Your Profile</b>\n\n\
     We will update your profile step by step.\n\n\
     <b>Step 1: Telegram Username</b>\n\
     Please enter your Telegram username (starting with @):\n\
     Example: @yourusername"
        .to_string()
}

pub fn message_telegram_needs_at() -> String {
    "⚠️ Please enter a valid Telegram username starting with @\n\
     Example: @yourusername"
        .to_string()
}

pub fn message_telegram_too_short() -> String {
    "⚠️ Username is too short. Minimum 5 characters required.".to_string()
}

pub fn message_twitter_prompt() -> String {
    "📝 <b>Step 2: Twitter Username</b>\n\n\
     Please enter your Twitter username (without @):\n\
     Example: yourusername"
        .to_string()
}

pub fn message_twitter_empty() -> String {
    "⚠️ Please enter a valid Twitter username.".to_string()
}

pub fn message_twitter_too_long() -> String {
    "⚠️ Twitter username is too long. Maximum 15 characters.".to_string()
}

pub fn message_address_prompt() -> String {
    "📝 <b>Step 3: USDT (BEP20) Address</b>\n\n\
     Please enter your USDT (BEP20) wallet address:\n\
     • Should start with 0x\n\
     • Should be exactly 42 characters\n\
     • Example: <code>0xa7c15a46fa8feb53140844e0b31d847e6087d2ca</code>\n\n\
     ⚠️ <i>Make sure this is correct as it will be used for withdrawals.</i>"
        .to_string()
}

pub fn message_address_rejected() -> String {
    "❌ <b>Invalid USDT (BEP20) Address!</b>\n\n\
     Please enter a valid USDT (BEP20) wallet address:\n\
     • Must start with <code>0x</code>\n\
     • Must be exactly 42 characters long\n\
     • Must be a valid BEP20 address\n\
     • Example: <code>0xa7c15a46fa8feb53140844e0b31d847e6087d2ca</code>\n\n\
     ⚠️ <i>Double-check your address before submitting.</i>"
        .to_string()
}

pub fn message_referral_welcome(referrer: &str) -> String {
    format!(
        "🎉 <b>Referral Bonus!</b>\n\n\
         You were referred by {}!\n\
         Thank you for joining through their referral link.",
        referrer
    )
}

pub fn message_profile_completed(telegram: &str, twitter: &str, address: &str) -> String {
    format!(
        "✅ <b>Profile Successfully Updated!</b>\n\n\
         • Telegram: <code>{}</code>\n\
         • Twitter: <code>{}</code>\n\
         • USDT (BEP20): <code>{}</code>\n\n\
         🎉 Your profile is now complete!\n\
         You can now participate in all activities and withdraw your earnings.",
        telegram, twitter, address
    )
}

pub fn message_profile_summary(
    telegram_handle: &Option<String>,
    twitter_handle: &Option<String>,
    payout_address: &Option<String>,
    balance: f64,
    referral_count: usize,
    completed: bool,
) -> String {
    format!(
        "<b>📋 Your Profile:</b>\n\n\
         <b>🆔 Telegram:</b> <code>{}</code>\n\
         <b>🐦 Twitter:</b> <code>{}</code>\n\
         <b>💰 USDT (BEP20):</b> <code>{}</code>\n\n\
         <b>💰 Balance:</b> <b>{}</b>\n\
         <b>👥 Referrals:</b> <b>{}</b>\n\
         <b>✅ Profile Status:</b> {}",
        or_not_set(telegram_handle),
        or_not_set(twitter_handle),
        or_not_set(payout_address),
        format_usd(balance),
        referral_count,
        if completed { "Completed" } else { "Incomplete" }
    )
}

pub fn message_main_menu() -> String {
    "🏠 <b>Main Menu</b>\n\n\
     /profile - view your profile\n\
     /edit - update your profile\n\
     /help - all commands"
        .to_string()
}

pub fn message_command_hint() -> String {
    "Type /help to see available commands".to_string()
}

pub fn message_store_unavailable() -> String {
    "❌ <b>Error Saving Profile</b>\n\n\
     An error occurred while saving your profile data.\n\
     Please try again or contact support if the problem persists."
        .to_string()
}

pub fn message_unexpected() -> String {
    "❌ An error occurred. Please try again.".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usd_formatting() {
        assert_eq!(format_usd(0.0), "$0.00");
        assert_eq!(format_usd(12.5), "$12.50");
    }

    #[test]
    fn summary_falls_back_to_not_set() {
        let text = message_profile_summary(&None, &None, &None, 0.0, 0, false);
        assert!(text.contains("Not set"));
        assert!(text.contains("Incomplete"));
    }
}
