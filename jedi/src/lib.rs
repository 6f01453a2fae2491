//! JSON/YAML helpers shared by the core and its config crate. Mostly a thin
//! layer over serde_json that adds key-path lookups, so envelopes coming off
//! the wire can be probed without defining a struct for every shape.

#[macro_use]
extern crate quick_error;

use std::error::Error;

pub use serde::de::{Deserialize, DeserializeOwned};
pub use serde::ser::Serialize;
pub use serde_json::Map;
pub use serde_json::Value;

quick_error! {
    #[derive(Debug)]
    pub enum JSONError {
        Boxed(err: Box<dyn Error + Send + Sync>) {
            description("boxed error")
            display("json: error: {}", err)
        }
        Parse(err: serde_json::Error) {
            cause(err)
            description("parse error")
            display("json: parse error: {}", err)
        }
        Stringify(err: serde_json::Error) {
            cause(err)
            description("stringify error")
            display("json: stringify error: {}", err)
        }
        Yaml(err: serde_yaml::Error) {
            cause(err)
            description("yaml error")
            display("json: yaml error: {}", err)
        }
        DeadEnd {
            description("dead end")
            display("json: lookup dead end")
        }
        NotFound(key: String) {
            description("key not found")
            display("json: key not found: {}", key)
        }
        InvalidKey(key: String) {
            description("invalid key")
            display("json: invalid key for object: {}", key)
        }
    }
}

pub type JResult<T> = Result<T, JSONError>;

impl From<std::io::Error> for JSONError {
    fn from(err: std::io::Error) -> JSONError {
        JSONError::Boxed(Box::new(err))
    }
}

impl From<serde_yaml::Error> for JSONError {
    fn from(err: serde_yaml::Error) -> JSONError {
        JSONError::Yaml(err)
    }
}

/// Parse a JSON string into any deserializable type
pub fn parse<T: DeserializeOwned>(string: &str) -> JResult<T> {
    serde_json::from_str(string).map_err(JSONError::Parse)
}

/// Parse a YAML string into a JSON Value
pub fn parse_yaml(string: &str) -> JResult<Value> {
    Ok(serde_yaml::from_str(string)?)
}

/// Serialize an object to a JSON string
pub fn stringify<T: Serialize>(obj: &T) -> JResult<String> {
    serde_json::to_string(obj).map_err(JSONError::Stringify)
}

/// Serialize an object to a JSON Value
pub fn to_val<T: Serialize>(obj: &T) -> JResult<Value> {
    serde_json::to_value(obj).map_err(JSONError::Stringify)
}

/// Convert a JSON Value into a concrete type
pub fn from_val<T: DeserializeOwned>(val: Value) -> JResult<T> {
    serde_json::from_value(val).map_err(JSONError::Parse)
}

/// A blank object. Handy as an "ok, nothing to report" response.
pub fn obj() -> Value {
    Value::Object(Map::new())
}

/// Does this object carry the given top-level key? Non-objects never do.
pub fn has_key(key: &str, data: &Value) -> bool {
    match *data {
        Value::Object(ref obj) => obj.contains_key(key),
        _ => false,
    }
}

/// Follow a key path into a Value. Array elements are addressed with their
/// index as a string, so `["users", "0", "id"]` works.
pub fn walk<'a>(keys: &[&str], data: &'a Value) -> JResult<&'a Value> {
    let mut cur = data;
    for key in keys {
        cur = match *cur {
            Value::Object(ref obj) => {
                obj.get(*key).ok_or_else(|| JSONError::NotFound(String::from(*key)))?
            }
            Value::Array(ref arr) => {
                let idx = key.parse::<usize>()
                    .map_err(|_| JSONError::InvalidKey(String::from(*key)))?;
                arr.get(idx).ok_or_else(|| JSONError::NotFound(String::from(*key)))?
            }
            _ => return Err(JSONError::DeadEnd),
        };
    }
    Ok(cur)
}

/// Grab the value at a key path and deserialize it
pub fn get<T: DeserializeOwned>(keys: &[&str], data: &Value) -> JResult<T> {
    let found = walk(keys, data)?;
    serde_json::from_value(found.clone())
        .map_err(|e| JSONError::NotFound(format!("get: {:?}: {}", keys, e)))
}

/// Like `get()` but any failure becomes None
pub fn get_opt<T: DeserializeOwned>(keys: &[&str], data: &Value) -> Option<T> {
    get(keys, data).ok()
}

/// Set a value at a key path, creating intermediate objects as needed. Only
/// objects are created; an existing scalar in the path is a dead end.
pub fn set<T: Serialize>(keys: &[&str], container: &mut Value, to: &T) -> JResult<()> {
    let (last, parents) = match keys.split_last() {
        Some(x) => x,
        None => return Err(JSONError::InvalidKey(String::from("set: no keys given"))),
    };
    let mut cur = container;
    for key in parents {
        cur = match cur {
            Value::Object(obj) => obj.entry(String::from(*key)).or_insert_with(obj_value),
            _ => return Err(JSONError::DeadEnd),
        };
        if cur.is_null() {
            *cur = obj();
        }
    }
    match *cur {
        Value::Object(ref mut obj) => {
            obj.insert(String::from(*last), to_val(to)?);
            Ok(())
        }
        _ => Err(JSONError::DeadEnd),
    }
}

fn obj_value() -> Value {
    obj()
}

/// Deep-merge `from` into `into`. Objects merge key by key; anything else in
/// `from` replaces what was there.
pub fn merge(into: &mut Value, from: &Value) {
    match (into, from) {
        (&mut Value::Object(ref mut target), &Value::Object(ref source)) => {
            for (key, val) in source {
                match target.get_mut(key) {
                    Some(existing) => merge(existing, val),
                    None => {
                        target.insert(key.clone(), val.clone());
                    }
                }
            }
        }
        (target, source) => {
            *target = source.clone();
        }
    }
}
