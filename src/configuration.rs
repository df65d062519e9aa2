use config::ConfigError;

#[derive(serde::Deserialize, Clone)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub application: ApplicationSettings,
    pub tokens: TokenSettings,
    pub email: Option<EmailSettings>,
}

#[derive(serde::Deserialize, Clone)]
pub struct ApplicationSettings {
    pub host: String,
    pub port: u16,
}

#[derive(serde::Deserialize, Clone)]
pub struct DatabaseSettings {
    pub username: String,
    pub password: String,
    pub port: u16,
    pub host: String,
    pub database_name: String,
}

impl DatabaseSettings {
    pub fn connection_string(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.username, self.password, self.host, self.port, self.database_name
        )
    }

    pub fn connection_string_without_db(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}",
            self.username, self.password, self.host, self.port
        )
    }
}

/// Token lifetimes, in seconds. Tokens are opaque random strings whose
/// validity window is fixed at issue time.
#[derive(serde::Deserialize, Clone)]
pub struct TokenSettings {
    pub access_ttl_seconds: i64,  // e.g. 3600 for 1 hour
    pub reset_ttl_seconds: i64,   // e.g. 3600 for 1 hour
    pub verify_ttl_seconds: i64,  // e.g. 86400 for 1 day
}

/// External email delivery service. Optional: when absent, reset and
/// verification tokens are only returned to the caller.
#[derive(serde::Deserialize, Clone)]
pub struct EmailSettings {
    pub base_url: String,
    pub sender: String,
}

pub fn get_configuration() -> Result<Settings, ConfigError> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("configuration").required(false))
        .add_source(config::Environment::with_prefix("AUTHD").separator("__"))
        .build()?;
    settings.try_deserialize::<Settings>()
}
