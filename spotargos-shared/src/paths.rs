use std::path::{MAIN_SEPARATOR, MAIN_SEPARATOR_STR, Path, PathBuf};

use anyhow::{Result, anyhow};

use crate::env::ENV;

const CONFIG_NAME: &str = "config.ron";
const APP_DIR: &str = "spotargos";

pub fn home_dir() -> Option<PathBuf> {
    ENV.var_os("HOME").filter(|home| !home.is_empty()).map(PathBuf::from)
}

pub fn config_dir() -> Option<PathBuf> {
    ENV.var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .filter(|p| p.is_absolute())
        .or_else(|| home_dir().map(|home| home.join(".config")))
}

/// Location of the config file. An explicit path from the command line always wins.
pub fn config_path(cli_arg_config_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = cli_arg_config_path {
        return Some(path.to_path_buf());
    }

    let path = config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_NAME));
    if path.is_none() {
        log::warn!("Could not determine configuration directory");
    }
    path
}

/// Where the Argos plugin has always kept its album art.
pub fn default_cache_dir() -> String {
    format!("~{MAIN_SEPARATOR}.config{MAIN_SEPARATOR}argos{MAIN_SEPARATOR}spotify")
}

/// Expands `~` and `$VARS` in a user supplied path. The result has to be absolute.
pub fn expand_path(input: &Path) -> Result<PathBuf> {
    let raw = input.to_str().ok_or_else(|| anyhow!("Invalid path: '{}'", input.display()))?;
    let home = ENV.var("HOME");
    let expanded = expand(raw, home.as_deref(), |key| ENV.var(key));

    let path = PathBuf::from(expanded);
    if path.is_absolute() {
        Ok(path)
    } else {
        Err(anyhow!("Path is not absolute: {}", path.display()))
    }
}

/// Variables are only substituted when they make up a whole path segment; unknown
/// variables are left untouched.
fn expand(input: &str, home: Option<&str>, lookup: impl Fn(&str) -> Option<String>) -> String {
    let substituted = input
        .split(MAIN_SEPARATOR)
        .map(|segment| match segment.strip_prefix('$') {
            Some(key) => lookup(key).unwrap_or_else(|| segment.to_owned()),
            None => segment.to_owned(),
        })
        .collect::<Vec<_>>()
        .join(MAIN_SEPARATOR_STR);

    let Some(home) = home.map(|h| h.strip_suffix(MAIN_SEPARATOR).unwrap_or(h)) else {
        return substituted;
    };

    match substituted.strip_prefix('~') {
        Some("") => home.to_owned(),
        Some(rest) if rest.starts_with(MAIN_SEPARATOR) => format!("{home}{rest}"),
        _ => substituted,
    }
}
