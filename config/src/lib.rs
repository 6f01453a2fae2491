//! App-wide configuration. The config lives in one global tree that starts
//! out empty, gets loaded from a YAML (or JSON, which is YAML) file, and can
//! have runtime values merged over it by whoever embeds the core.

#[macro_use]
extern crate lazy_static;

use std::env;
use std::fs;
use std::path::Path;
use std::sync::RwLock;

use jedi::{DeserializeOwned, JSONError, Serialize, Value};

pub type CResult<T> = Result<T, JSONError>;

/// Env var that points at the config file when no explicit path is given
pub const CONFIG_FILE_ENV: &str = "RSVP_CONFIG_FILE";

lazy_static! {
    static ref CONFIG: RwLock<Value> = RwLock::new(jedi::obj());
}

/// Load the config file and merge it over whatever config we already have.
///
/// An explicit `location` must exist. Otherwise we try `$RSVP_CONFIG_FILE`
/// and then `config.yaml`, and a missing file just means "no file config".
pub fn load_config(location: Option<String>) -> CResult<()> {
    let explicit = location.is_some();
    let path_str = match location {
        Some(x) => x,
        None => env::var(CONFIG_FILE_ENV).unwrap_or_else(|_| String::from("config.yaml")),
    };
    let path = Path::new(&path_str);
    if !explicit && !path.exists() {
        return Ok(());
    }
    let contents = fs::read_to_string(path)?;
    let data = jedi::parse_yaml(&contents)?;
    merge(&data)
}

/// Get a value out of the config
pub fn get<T: DeserializeOwned>(keys: &[&str]) -> CResult<T> {
    let guard = CONFIG.read().map_err(|_| JSONError::DeadEnd)?;
    jedi::get(keys, &guard)
}

/// Get a value out of the config, falling back to `default` when it's missing
/// or has the wrong type
pub fn get_or<T: DeserializeOwned>(keys: &[&str], default: T) -> T {
    get(keys).unwrap_or(default)
}

/// Set a value into the config
pub fn set<T: Serialize>(keys: &[&str], val: &T) -> CResult<()> {
    let mut guard = CONFIG.write().map_err(|_| JSONError::DeadEnd)?;
    jedi::set(keys, &mut guard, val)
}

/// Deep-merge a value over the current config
pub fn merge(data: &Value) -> CResult<()> {
    let mut guard = CONFIG.write().map_err(|_| JSONError::DeadEnd)?;
    jedi::merge(&mut guard, data);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn set_get() {
        set(&["tests", "set_get", "endpoint"], &"http://127.0.0.1:8080/api").unwrap();
        let endpoint: String = get(&["tests", "set_get", "endpoint"]).unwrap();
        assert_eq!(endpoint, "http://127.0.0.1:8080/api");
        assert!(get::<String>(&["tests", "set_get", "nope"]).is_err());
        assert_eq!(get_or(&["tests", "set_get", "nope"], 7u64), 7);
    }

    #[test]
    fn merges_over() {
        merge(&json!({"tests": {"merge": {"loglevel": "warn", "timeout_secs": 10}}})).unwrap();
        merge(&json!({"tests": {"merge": {"loglevel": "debug"}}})).unwrap();
        assert_eq!(get::<String>(&["tests", "merge", "loglevel"]).unwrap(), "debug");
        assert_eq!(get::<u64>(&["tests", "merge", "timeout_secs"]).unwrap(), 10);
    }

    #[test]
    fn missing_explicit_file_errors() {
        assert!(load_config(Some(String::from("/definitely/not/here/config.yaml"))).is_err());
    }
}
