use serde::Deserialize;
use std::fs;
use std::io;
use std::path::Path;

use crate::error::Error;

/// Default name of the configuration file, resolved against the working
/// directory. The `--config` flag overrides it.
pub const CONFIG_FILE: &str = "config.json";

/// Repository coordinates and credentials for one run.
///
/// Loaded once from `config.json` and read-only afterwards; nothing is
/// written back or persisted.
#[derive(Debug, Clone)]
pub struct Config {
    pub token: String,
    pub username: String,
    pub repo_name: String,
    pub branch: String,
    pub file_path: String,
    pub commit_message: String,
}

/// File shape as written by the user. Every key is optional here so an
/// absent one can be reported by name instead of as an opaque parse error.
#[derive(Debug, Deserialize)]
struct RawConfig {
    github_token: Option<String>,
    github_username: Option<String>,
    github_repo_name: Option<String>,
    github_branch: Option<String>,
    github_file_path: Option<String>,
    github_commit_message: Option<String>,
}

/// Load and validate the configuration file at `path`.
///
/// All required keys are checked here, before any network traffic happens.
///
/// # Errors
/// - [`Error::ConfigNotFound`] if the file does not exist.
/// - [`Error::ConfigMalformed`] if it is not valid JSON.
/// - [`Error::ConfigFieldMissing`] naming the first absent required key.
pub fn load_config(path: &Path) -> Result<Config, Error> {
    let txt = match fs::read_to_string(path) {
        Ok(txt) => txt,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(Error::ConfigNotFound(path.to_path_buf()));
        }
        Err(e) => return Err(Error::Unexpected(e.into())),
    };
    let raw: RawConfig = serde_json::from_str(&txt).map_err(Error::ConfigMalformed)?;
    Ok(Config {
        token: require("github_token", raw.github_token)?,
        username: require("github_username", raw.github_username)?,
        repo_name: require("github_repo_name", raw.github_repo_name)?,
        branch: require("github_branch", raw.github_branch)?,
        file_path: require("github_file_path", raw.github_file_path)?,
        commit_message: require("github_commit_message", raw.github_commit_message)?,
    })
}

fn require(field: &'static str, value: Option<String>) -> Result<String, Error> {
    value.ok_or(Error::ConfigFieldMissing(field))
}

/// Template of the expected file, embedded at compile time and printed when
/// no config file exists.
pub fn config_template() -> &'static str {
    include_str!("../assets/config.example.json")
}
