// Copyright © 2024 Pathway

use std::str::FromStr;

use log::warn;

use crate::engine::{Error, Result};
use crate::env::parse_env_var_or;

pub const MAX_SHARDS: usize = 256;

pub const SHARDS_ENV_VAR: &str = "COGROUP_SHARDS";
pub const KEY_ERRORS_ENV_VAR: &str = "COGROUP_KEY_ERRORS";

/// What the host does when a key function rejects a record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum KeyErrorPolicy {
    /// Stop the run and return the error.
    #[default]
    Fail,
    /// Log a warning, count the record as skipped and go on.
    Skip,
}

#[derive(Debug, thiserror::Error)]
#[error("unknown key error policy {0:?}, expected \"fail\" or \"skip\"")]
pub struct UnknownKeyErrorPolicy(String);

impl FromStr for KeyErrorPolicy {
    type Err = UnknownKeyErrorPolicy;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "fail" => Ok(Self::Fail),
            "skip" => Ok(Self::Skip),
            _ => Err(UnknownKeyErrorPolicy(value.to_string())),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    shards: usize,
    key_error_policy: KeyErrorPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            shards: 1,
            key_error_policy: KeyErrorPolicy::default(),
        }
    }
}

impl Config {
    pub fn new(shards: usize) -> Result<Self> {
        if shards == 0 {
            return Err(Error::NeedsShards);
        }
        let shards = if shards > MAX_SHARDS {
            warn!("{shards} is greater than the maximum allowed number of shards ({MAX_SHARDS}), reducing");
            MAX_SHARDS
        } else {
            shards
        };
        Ok(Self {
            shards,
            key_error_policy: KeyErrorPolicy::default(),
        })
    }

    #[must_use]
    pub fn with_key_error_policy(mut self, key_error_policy: KeyErrorPolicy) -> Self {
        self.key_error_policy = key_error_policy;
        self
    }

    pub fn shards(&self) -> usize {
        self.shards
    }

    pub fn key_error_policy(&self) -> KeyErrorPolicy {
        self.key_error_policy
    }

    pub fn from_env() -> Result<Self> {
        let shards = parse_env_var_or(SHARDS_ENV_VAR, 1)?;
        let key_error_policy = parse_env_var_or(KEY_ERRORS_ENV_VAR, KeyErrorPolicy::default())?;
        Ok(Self::new(shards)?.with_key_error_policy(key_error_policy))
    }
}
