//! CLI configuration: thin wrapper around `vigil_config` shared types.
//!
//! Adds resolution that respects `GlobalOpts` flag overrides
//! (--server, --search, --insecure, --timeout).

use vigil_core::MonitorConfig;

use crate::cli::GlobalOpts;
use crate::error::CliError;

pub use vigil_config::{Config, Profile, config_path, load_config_or_default};

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Apply flag overrides to a profile. Flags win over profile values.
pub fn apply_overrides(profile: &Profile, global: &GlobalOpts) -> Profile {
    let mut resolved = profile.clone();
    if let Some(ref server) = global.server {
        resolved.server.clone_from(server);
    }
    if let Some(ref search) = global.search {
        resolved.search = Some(search.clone());
    }
    if global.insecure {
        resolved.insecure = Some(true);
    }
    if let Some(timeout) = global.timeout {
        resolved.timeout = Some(timeout);
    }
    resolved
}

/// Translate a `Profile` + global flags into a `MonitorConfig`.
pub fn resolve_profile(
    profile: &Profile,
    config: &Config,
    global: &GlobalOpts,
) -> Result<MonitorConfig, CliError> {
    let resolved = apply_overrides(profile, global);
    Ok(vigil_config::profile_to_monitor_config(
        &resolved,
        &config.defaults,
    )?)
}

/// Available profile names, for error help text.
pub fn profile_names(config: &Config) -> String {
    if config.profiles.is_empty() {
        return "(none)".into();
    }
    config
        .profiles
        .keys()
        .cloned()
        .collect::<Vec<_>>()
        .join(", ")
}
