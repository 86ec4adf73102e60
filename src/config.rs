use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub telegram: TelegramSettings,
    pub application: ApplicationSettings,
    #[serde(default)]
    pub roster: RosterSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    pub url: String,
    pub pool_size: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelegramSettings {
    pub token: String,
    pub webhook_secret: String,
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApplicationSettings {
    #[serde(default = "default_host")]
    pub host: String,
    pub port: u16,
    pub log_level: String,
    #[serde(default = "default_log_format")]
    pub log_format: String,
}

/// Alias map installed into a chat that has none yet.
#[derive(Debug, Clone, Deserialize)]
pub struct RosterSettings {
    pub default_aliases: Vec<AliasSetting>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AliasSetting {
    pub initial: String,
    pub fullname: String,
}

impl AliasSetting {
    pub fn new(initial: impl Into<String>, fullname: impl Into<String>) -> Self {
        Self {
            initial: initial.into(),
            fullname: fullname.into(),
        }
    }
}

impl Default for RosterSettings {
    fn default() -> Self {
        Self {
            default_aliases: vec![
                AliasSetting::new("b", "Bình"),
                AliasSetting::new("a", "An"),
                AliasSetting::new("d", "Duy"),
            ],
        }
    }
}

impl RosterSettings {
    pub fn pairs(&self) -> Vec<(String, String)> {
        self.default_aliases
            .iter()
            .map(|a| (a.initial.to_lowercase(), a.fullname.clone()))
            .collect()
    }
}

fn default_api_base_url() -> String {
    "https://api.telegram.org".to_string()
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Settings {
    pub fn new() -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(config::Environment::with_prefix("APP").separator("__"));

        builder.build()?.try_deserialize()
    }
}
