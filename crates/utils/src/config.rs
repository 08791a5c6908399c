use clap::Parser;

#[derive(clap::ValueEnum, Clone, Debug, Copy)]
#[clap(rename_all = "lowercase")]
pub enum CargoEnv {
    Development,
    Production,
}

/// Loads the `.env` file matching `CARGO_ENV` before the config is parsed.
pub struct EnvLoader;

impl EnvLoader {
    pub fn load_env_file() -> Result<(), Box<dyn std::error::Error>> {
        let cargo_env = std::env::var("CARGO_ENV").unwrap_or_else(|_| "development".to_string());

        let env_file = match cargo_env.as_str() {
            "production" | "Production" | "prod" => ".env.production",
            "development" | "Development" | "dev" => ".env.development",
            "test" | "Test" => ".env.test",
            _ => {
                println!("⚠️  unknown CARGO_ENV: {}, falling back to .env.development", cargo_env);
                ".env.development"
            }
        };

        if !std::path::Path::new(env_file).exists() {
            // Fall back to a plain .env if the per-environment file is missing.
            if std::path::Path::new(".env").exists() {
                dotenvy::from_filename(".env")?;
                println!("✅ loaded default env file: .env");
            } else {
                eprintln!("❌ no env file found, relying on process environment");
            }
            return Ok(());
        }

        dotenvy::from_filename(env_file)?;
        println!("✅ loaded env file: {} (CARGO_ENV={})", env_file, cargo_env);

        Ok(())
    }
}

#[derive(clap::Parser, Clone)]
pub struct AppConfig {
    #[clap(long, env, value_enum)]
    pub cargo_env: CargoEnv,

    /// Telegram bot API token.
    #[clap(long, env)]
    pub bot_token: String,

    #[clap(long, env, default_value = "mongodb://localhost:27017")]
    pub mongo_uri: String,

    #[clap(long, env)]
    pub mongo_db: String,

    #[clap(long, env, default_value = "info")]
    pub rust_log: String,

    /// Sliding lifetime of an in-progress profile form, in seconds.
    /// An abandoned form decays back to idle after this much inactivity.
    #[clap(long, env, default_value = "1800")]
    pub session_ttl_secs: u64,

    /// When false (the default) a completed referral is recorded but
    /// nobody's balance is credited.
    #[clap(long, env, default_value = "false")]
    pub enable_referral_bonus: bool,

    /// Credited to the referrer on a completed referral, in USD.
    #[clap(long, env, default_value = "10.0")]
    pub referral_bonus_amount: f64,

    /// Credited to the referred user on completion, in USD.
    #[clap(long, env, default_value = "5.0")]
    pub welcome_bonus_amount: f64,
}

impl Default for AppConfig {
    fn default() -> Self {
        EnvLoader::load_env_file().ok();
        AppConfig::parse()
    }
}

impl AppConfig {
    /// Manual config instance for tests.
    pub fn new_for_test() -> Self {
        Self {
            cargo_env: CargoEnv::Development,
            bot_token: "000000:test-token".to_string(),
            mongo_uri: std::env::var("MONGO_URI").unwrap_or_else(|_| "mongodb://localhost:27017".to_string()),
            mongo_db: std::env::var("MONGO_DB").unwrap_or_else(|_| "test_db".to_string()),
            rust_log: "info".to_string(),
            session_ttl_secs: 1800,
            enable_referral_bonus: false,
            referral_bonus_amount: 10.0,
            welcome_bonus_amount: 5.0,
        }
    }
}
