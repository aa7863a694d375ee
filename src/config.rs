// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Configuration layout.
//!
//! Specify the layout of the wiki configuration file to simplify the process
//! of serialization and deserialization. File I/O is left to the caller to
//! figure out.

use serde::{Deserialize, Serialize};
use std::{
    fmt::{Display, Error as FmtError, Formatter, Result as FmtResult},
    str::FromStr,
};

/// File kind used when nothing else is configured.
///
/// Plain text always has a renderer, so it is the safe choice.
pub const FALLBACK_FILE_KIND: &str = ".txt";

/// Wiki configuration layout.
///
/// Every wiki keeps a small, human-editable configuration file at the top of
/// its repository. It is tracked like any other file, so changing it is just
/// another commit.
///
/// # General Layout
///
/// The configuration is split into three sections: general wiki settings,
/// the author identity used for every commit, and the remote to pull from
/// and push to. Each section and each field may be omitted, in which case a
/// default is used.
#[derive(Default, Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
pub struct WikiConfig {
    /// General wiki settings.
    #[serde(default)]
    pub wiki: WikiSettings,

    /// Identity recorded as author and committer.
    #[serde(default)]
    pub author: Author,

    /// Remote repository settings.
    #[serde(default)]
    pub remote: RemoteSettings,
}

impl FromStr for WikiConfig {
    type Err = ConfigError;

    fn from_str(data: &str) -> Result<Self, Self::Err> {
        let mut config: WikiConfig = toml::de::from_str(data).map_err(ConfigError::Deserialize)?;

        // INVARIANT: Perform shell expansion on remote URL field.
        config.remote.url = shellexpand::full(config.remote.url.as_str())
            .map_err(ConfigError::ShellExpansion)?
            .into_owned();

        Ok(config)
    }
}

impl Display for WikiConfig {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        fmt.write_str(
            toml::ser::to_string_pretty(self)
                .map_err(ConfigError::Serialize)?
                .as_str(),
        )
    }
}

/// General wiki settings.
#[derive(Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WikiSettings {
    /// Display name of the wiki, also used as the root article's name.
    pub name: String,

    /// File kind given to new articles, e.g., ".md".
    pub default_file_kind: String,
}

impl Default for WikiSettings {
    fn default() -> Self {
        Self {
            name: String::new(),
            default_file_kind: FALLBACK_FILE_KIND.into(),
        }
    }
}

/// Author identity for commits.
#[derive(Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Author {
    pub name: String,
    pub mail: String,
}

impl Default for Author {
    fn default() -> Self {
        Self {
            name: "Anonymous".into(),
            mail: "anonymous@localhost".into(),
        }
    }
}

impl Display for Author {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        write!(fmt, "{} <{}>", self.name, self.mail)
    }
}

/// Remote repository settings.
#[derive(Default, Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RemoteSettings {
    /// URL of the remote. Empty means the wiki is local only.
    pub url: String,
}

/// Configuration error types.
#[derive(Clone, Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to deserialize configuration.
    #[error(transparent)]
    Deserialize(#[from] toml::de::Error),

    /// Failed to serialize configuration.
    #[error(transparent)]
    Serialize(#[from] toml::ser::Error),

    /// Failed to perform shell expansion on configuration.
    #[error(transparent)]
    ShellExpansion(#[from] shellexpand::LookupError<std::env::VarError>),
}

impl From<ConfigError> for FmtError {
    fn from(_: ConfigError) -> Self {
        FmtError
    }
}
