use teloxide::utils::command::BotCommands;

// Commands the bot accepts in any state.
#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase", description = "——— EarnBot ———")]
pub enum Command {
    #[command(description = "📝 Show help information")]
    Help,

    /// `/start` may carry a referral deep-link payload (`ref_<id>`).
    #[command(description = "🛸 Enter EarnBot's world")]
    Start(String),

    #[command(description = "📋 Show your profile")]
    Profile,

    #[command(description = "✏️ Edit your profile step by step")]
    Edit,
}
