//! Settings: storage path, listen address, csrf secret and the controller registry
//!
//! Loaded from an optional TOML file; the server binary overlays command-line
//! arguments and environment variables on top.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::constants::ROLE_CONTROLLER;
use crate::csrf::CsrfTokens;
use crate::error::{Result, RolegateError};
use crate::registry::ControllerRegistry;

pub const DEFAULT_DB_PATH: &str = "./data/rolegate.mdb";
pub const DEFAULT_BIND: &str = "0.0.0.0:3000";
pub const DEFAULT_CONTROLLERS: &[&str] = &[
    "RoleController",
    "UserController",
    "StatusController",
    "PermissionController",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub db_path: String,
    pub bind: String,
    pub csrf_secret: Option<String>,
    pub controllers: ControllerRegistry,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            db_path: DEFAULT_DB_PATH.to_string(),
            bind: DEFAULT_BIND.to_string(),
            csrf_secret: None,
            controllers: ControllerRegistry::new(DEFAULT_CONTROLLERS.iter().copied()),
        }
    }
}

impl Settings {
    pub fn from_toml(s: &str) -> Result<Self> {
        let settings: Settings = toml::from_str(s).map_err(|e| RolegateError::Config(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Settings from a TOML file, or defaults when no path is given
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => {
                let s = std::fs::read_to_string(p)
                    .map_err(|e| RolegateError::Config(format!("{}: {}", p.display(), e)))?;
                Self::from_toml(&s)
            }
            None => Ok(Self::default()),
        }
    }

    /// The registry must name the role screen's own controller, or no role
    /// could ever be granted rights to manage roles.
    pub fn validate(&self) -> Result<()> {
        if !self.controllers.contains(ROLE_CONTROLLER) {
            return Err(RolegateError::Config(format!("controllers must include {}", ROLE_CONTROLLER)));
        }
        Ok(())
    }

    /// Token issuer from the configured secret, or a random per-process secret
    pub fn csrf(&self) -> Result<CsrfTokens> {
        match self.csrf_secret.as_deref().filter(|s| !s.is_empty()) {
            Some(secret) => CsrfTokens::new(secret),
            None => {
                tracing::warn!("no csrf secret configured, generating one; delete tokens will not survive a restart");
                CsrfTokens::new(CsrfTokens::generate_secret()?)
            }
        }
    }
}
