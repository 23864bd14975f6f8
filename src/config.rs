//! Deployment configuration: whether parsed templates are cached.

use std::env::VarError;

use kstring::KString;

use crate::error::{Result, TemplateErrorKind};

pub const PRODUCTION_MODE_ENV: &str = "HTMLTEMPLATE_PRODUCTION_MODE";

/// Reads a boolean env var. `Ok(None)` if it is not set; `0`, the
/// empty string, `off`, `false` and `no` are false, everything else
/// true.
pub fn env_flag(name: &str) -> Result<Option<bool>> {
    match std::env::var(name) {
        Ok(s) => Ok(Some(parse_flag(&s))),
        Err(VarError::NotPresent) => Ok(None),
        Err(VarError::NotUnicode(_)) =>
            Err(TemplateErrorKind::InvalidEnvVar {
                name: KString::from_ref(name)
            }.into()),
    }
}

pub fn parse_flag(s: &str) -> bool {
    match s.trim() {
        "0" | "" | "off" | "false" | "no" => false,
        _ => true
    }
}

/// In production mode parsed templates are cached forever. In
/// development mode every instantiation reads and parses its template
/// again, so that edits show up without a restart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeploymentConfiguration {
    pub production_mode: bool,
}

impl Default for DeploymentConfiguration {
    fn default() -> Self {
        DeploymentConfiguration::production()
    }
}

impl DeploymentConfiguration {
    pub const fn production() -> Self {
        DeploymentConfiguration { production_mode: true }
    }

    pub const fn development() -> Self {
        DeploymentConfiguration { production_mode: false }
    }

    /// From `HTMLTEMPLATE_PRODUCTION_MODE`, production if unset.
    pub fn from_env() -> Result<Self> {
        Ok(DeploymentConfiguration {
            production_mode: env_flag(PRODUCTION_MODE_ENV)?.unwrap_or(true)
        })
    }
}

/// Without any configuration, templates are cached.
pub fn is_production_mode(config: Option<&DeploymentConfiguration>) -> bool {
    config.map_or(true, |c| c.production_mode)
}
