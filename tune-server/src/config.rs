use std::collections::HashMap;
use std::env;
use std::fmt::Display;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;

use tune_core::{CategoryKeys, GameRules};

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub base_path: PathBuf,
    pub static_dir: PathBuf,
    pub categories: Vec<String>,
    pub master_key: Option<String>,
    pub category_keys: HashMap<String, String>,
    pub max_distance: u32,
    pub max_rounds: u32,
    pub hint_after_round: u32,
    pub candidate_frames: u32,
}

impl Config {
    pub fn new() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key/value source; unset or malformed values fall back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let max_rounds = parse_or(&lookup, "MAX_ROUNDS", 8);
        let max_rounds = at_least(max_rounds, 1, "MAX_ROUNDS", 8);
        let hint_after_round = parse_or(&lookup, "HINT_AFTER_ROUND", max_rounds);
        let hint_after_round = at_most(hint_after_round, max_rounds, "HINT_AFTER_ROUND");
        let candidate_frames = parse_or(&lookup, "CANDIDATE_FRAMES", 40);
        let candidate_frames =
            at_least(candidate_frames, max_rounds, "CANDIDATE_FRAMES", 40.max(max_rounds));
        Self {
            host: lookup("HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            port: parse_or(&lookup, "PORT", 8080),
            database_url: lookup("DATABASE_URL")
                .unwrap_or_else(|| "sqlite://freeze_tune.db?mode=rwc".to_string()),
            base_path: lookup("BASE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("./data")),
            static_dir: lookup("STATIC_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("./wwwroot")),
            categories: lookup("CATEGORIES")
                .map(|raw| parse_list(&raw))
                .filter(|list| !list.is_empty())
                .unwrap_or_else(|| vec!["80s".to_string()]),
            master_key: lookup("FREEZE_API_KEY").filter(|k| !k.is_empty()),
            category_keys: lookup("CATEGORY_KEYS")
                .map(|raw| parse_key_map(&raw))
                .unwrap_or_default(),
            max_distance: parse_or(&lookup, "MAX_DISTANCE", 4),
            max_rounds,
            hint_after_round,
            candidate_frames,
        }
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        let ip: IpAddr = self.host.parse()?;
        Ok(SocketAddr::new(ip, self.port))
    }

    pub fn rules(&self) -> GameRules {
        GameRules {
            max_distance: self.max_distance,
            max_rounds: self.max_rounds,
            hint_after_round: self.hint_after_round,
            candidate_frames: self.candidate_frames,
        }
    }

    pub fn keys(&self) -> CategoryKeys {
        CategoryKeys::new(self.master_key.clone(), self.category_keys.clone())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: FromStr + Display,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!("Invalid {} '{}', using {}", key, raw, default);
            default
        }),
        None => default,
    }
}

fn at_least(value: u32, min: u32, key: &str, default: u32) -> u32 {
    if value < min {
        tracing::warn!("{} must be at least {}, using {}", key, min, default);
        default
    } else {
        value
    }
}

fn at_most(value: u32, max: u32, key: &str) -> u32 {
    if value > max {
        tracing::warn!("{} must not exceed {}, using {}", key, max, max);
        max
    } else {
        value
    }
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

/// "80s=key1,90s=key2"
fn parse_key_map(raw: &str) -> HashMap<String, String> {
    raw.split(',')
        .filter_map(|pair| pair.split_once('='))
        .map(|(category, key)| (category.trim().to_string(), key.trim().to_string()))
        .filter(|(category, key)| !category.is_empty() && !key.is_empty())
        .collect()
}
