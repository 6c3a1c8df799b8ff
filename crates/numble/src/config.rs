//! Server configuration.
//!
//! Defaults suit local development. The binary overlays `NUMBLE_*`
//! environment variables through [`ServerConfig::from_env`].

use std::str::FromStr;
use std::time::Duration;

use numble_protocol::{AccountType, Identity, UserId};
use numble_room::RoomConfig;

use crate::NumbleError;

/// Everything the server needs to start.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address the WebSocket listener binds to.
    pub bind_addr: String,

    /// A connection that sends nothing for this long is closed.
    pub idle_timeout: Duration,

    /// Settings for every room.
    pub rooms: RoomConfig,

    /// `(token, username)` pairs accepted by the development identity
    /// provider.
    pub dev_users: Vec<(String, String)>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            idle_timeout: Duration::from_secs(30 * 60),
            rooms: RoomConfig::default(),
            dev_users: Vec::new(),
        }
    }
}

impl ServerConfig {
    /// Defaults overlaid with the process environment.
    ///
    /// # Errors
    /// [`NumbleError::Config`] naming the variable that failed to parse.
    pub fn from_env() -> Result<Self, NumbleError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overlaid with whatever `lookup` returns for each
    /// `NUMBLE_*` key.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, NumbleError> {
        let mut config = Self::default();

        if let Some(addr) = lookup("NUMBLE_BIND_ADDR") {
            config.bind_addr = addr;
        }
        if let Some(secs) = lookup("NUMBLE_ROOM_TTL_SECS") {
            config.rooms.ttl = Duration::from_secs(parse("NUMBLE_ROOM_TTL_SECS", &secs)?);
        }
        if let Some(secs) = lookup("NUMBLE_SWEEP_INTERVAL_SECS") {
            let secs: u64 = parse("NUMBLE_SWEEP_INTERVAL_SECS", &secs)?;
            if secs == 0 {
                return Err(NumbleError::Config(
                    "NUMBLE_SWEEP_INTERVAL_SECS must be positive".into(),
                ));
            }
            config.rooms.sweep_interval = Duration::from_secs(secs);
        }
        if let Some(secs) = lookup("NUMBLE_IDLE_TIMEOUT_SECS") {
            config.idle_timeout = Duration::from_secs(parse("NUMBLE_IDLE_TIMEOUT_SECS", &secs)?);
        }
        if let Some(flag) = lookup("NUMBLE_ENFORCE_TURN_TIMER") {
            config.rooms.enforce_turn_timer = parse("NUMBLE_ENFORCE_TURN_TIMER", &flag)?;
        }
        if let Some(users) = lookup("NUMBLE_DEV_USERS") {
            config.dev_users = parse_dev_users(&users)?;
        }

        Ok(config)
    }

    /// The development users as `(token, identity)` pairs.
    pub fn dev_identities(&self) -> Vec<(String, Identity)> {
        self.dev_users
            .iter()
            .map(|(token, username)| {
                let identity = Identity {
                    user_id: UserId(username.clone()),
                    username: username.clone(),
                    account_type: AccountType::Persistent,
                };
                (token.clone(), identity)
            })
            .collect()
    }
}

fn parse<T: FromStr>(key: &str, value: &str) -> Result<T, NumbleError> {
    value
        .trim()
        .parse()
        .map_err(|_| NumbleError::Config(format!("{key}: cannot parse {value:?}")))
}

/// Parses `token=username` pairs separated by commas.
fn parse_dev_users(value: &str) -> Result<Vec<(String, String)>, NumbleError> {
    value
        .split(',')
        .map(str::trim)
        .filter(|pair| !pair.is_empty())
        .map(|pair| match pair.split_once('=') {
            Some((token, username)) if !token.trim().is_empty() && !username.trim().is_empty() => {
                Ok((token.trim().to_string(), username.trim().to_string()))
            }
            _ => Err(NumbleError::Config(format!(
                "NUMBLE_DEV_USERS: expected token=username, got {pair:?}"
            ))),
        })
        .collect()
}
