//! The Api system is responsible for talking to the event server. Everything
//! above this layer only sees the `Transport` trait, which hands back parsed
//! JSON or an `RError`; `Api` is the real HTTP implementation and
//! `mock::MockTransport` is a scripted one.

pub mod mock;

use std::fmt;
use std::sync::RwLock;
use std::time::Duration;

use jedi::Value;

use crate::error::{RError, RResult};

/// Default request timeout when the config doesn't say
const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match *self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        };
        write!(f, "{}", name)
    }
}

impl Method {
    fn to_reqwest(self) -> reqwest::Method {
        match self {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

/// A struct used for building API requests
#[derive(Debug, Clone, Default)]
pub struct ApiReq {
    headers: Vec<(String, String)>,
    timeout: Option<Duration>,
    data: Option<Value>,
}

impl ApiReq {
    pub fn new() -> Self {
        Default::default()
    }

    /// Set a header
    pub fn header(mut self, name: &str, val: &str) -> Self {
        self.headers.push((String::from(name), String::from(val)));
        self
    }

    /// Set (override) the timeout for this request
    pub fn timeout(mut self, secs: u64) -> Self {
        self.timeout = Some(Duration::new(secs, 0));
        self
    }

    /// Set this request's JSON body
    pub fn data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn body(&self) -> Option<&Value> {
        self.data.as_ref()
    }
}

/// Anything that can carry a request to the server and bring back JSON.
///
/// Non-2xx responses come back as `RError::Api(status, message)` with the
/// server's message; an empty 2xx body comes back as `Value::Null`.
pub trait Transport: Send + Sync {
    fn call(&self, method: Method, resource: &str, req: ApiReq) -> RResult<Value>;

    /// Use this bearer token for the calls that follow
    fn set_auth(&self, _token: &str) {}

    /// Stop sending a token
    fn clear_auth(&self) {}

    fn get(&self, resource: &str, req: ApiReq) -> RResult<Value> {
        self.call(Method::Get, resource, req)
    }

    fn post(&self, resource: &str, req: ApiReq) -> RResult<Value> {
        self.call(Method::Post, resource, req)
    }

    fn put(&self, resource: &str, req: ApiReq) -> RResult<Value> {
        self.call(Method::Put, resource, req)
    }

    fn delete(&self, resource: &str, req: ApiReq) -> RResult<Value> {
        self.call(Method::Delete, resource, req)
    }
}

/// Pull a human message out of an error response body. Prefers the
/// envelope's `error`, then `message`, then whatever text came back.
pub fn error_message(body: &str) -> String {
    let parsed: Option<Value> = jedi::parse(body).ok();
    if let Some(ref val) = parsed {
        for key in &["error", "message"] {
            match jedi::get_opt::<String>(&[*key], val) {
                Some(ref msg) if !msg.trim().is_empty() => return msg.clone(),
                _ => {}
            }
        }
    }
    String::from(body.trim())
}

/// Holds our Api configuration. This consists of any mutable fields the Api
/// needs to build requests.
struct ApiConfig {
    auth: Option<String>,
}

/// Our Api object. Responsible for making outbound calls to the event server.
pub struct Api {
    config: RwLock<ApiConfig>,
    client: reqwest::blocking::Client,
}

impl Api {
    pub fn new() -> RResult<Api> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::new(DEFAULT_TIMEOUT_SECS, 0))
            .build()?;
        Ok(Api {
            config: RwLock::new(ApiConfig { auth: None }),
            client: client,
        })
    }

    /// Build a full URL given a resource. The endpoint is read from config on
    /// every call so it can be switched at runtime.
    fn build_url(&self, resource: &str) -> RResult<String> {
        let endpoint: String = match config::get(&["api", "endpoint"]) {
            Ok(x) => x,
            Err(_) => return RErr!(RError::MissingData(String::from("api.endpoint is not configured"))),
        };
        let mut url = String::with_capacity(endpoint.len() + resource.len());
        url.push_str(endpoint.trim_end_matches('/'));
        url.push_str(resource);
        // catch garbage endpoints here instead of deep inside reqwest
        url::Url::parse(&url)?;
        Ok(url)
    }

    fn auth_header(&self) -> Option<String> {
        lockr!(self.config).auth.clone()
    }
}

impl Transport for Api {
    fn call(&self, method: Method, resource: &str, req: ApiReq) -> RResult<Value> {
        debug!("api::call() -- req: {} {}", method, resource);
        let ApiReq { headers, timeout, data } = req;
        let url = self.build_url(resource)?;
        let timeout = timeout.unwrap_or_else(|| {
            Duration::new(config::get_or(&["api", "timeout_secs"], DEFAULT_TIMEOUT_SECS), 0)
        });

        let mut builder = self.client
            .request(method.to_reqwest(), url.as_str())
            .header("Content-Type", "application/json")
            .header("Accept", "application/json")
            .timeout(timeout);
        if let Some(auth) = self.auth_header() {
            builder = builder.header("Authorization", auth);
        }
        for (name, val) in headers {
            builder = builder.header(name.as_str(), val.as_str());
        }
        if let Some(data) = data {
            builder = builder.body(jedi::stringify(&data)?);
        }

        let res = builder.send()?;
        let status = res.status();
        let out = res.text()?;
        if !status.is_success() {
            warn!("api::call() -- {} {} failed: {}", method, resource, status);
            return RErr!(RError::Api(status.as_u16(), error_message(&out)));
        }
        info!("api::call() -- res({}): {} {} {}", out.len(), status.as_u16(), method, resource);
        trace!("  api::call() -- body: {}", out);
        if out.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(jedi::parse(&out)?)
    }

    fn set_auth(&self, token: &str) {
        let mut guard = lockw!(self.config);
        guard.auth = Some(format!("Bearer {}", token));
    }

    fn clear_auth(&self) {
        let mut guard = lockw!(self.config);
        guard.auth = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages() {
        assert_eq!(error_message(r#"{"success":false,"error":"Invitation introuvable"}"#), "Invitation introuvable");
        assert_eq!(error_message(r#"{"success":false,"message":"Non autorisé"}"#), "Non autorisé");
        assert_eq!(error_message(r#"{"success":false,"error":"","message":"fallback"}"#), "fallback");
        assert_eq!(error_message("Bad Gateway\n"), "Bad Gateway");
    }

    #[test]
    fn builds_requests() {
        let req = ApiReq::new()
            .header("X-Trace", "1")
            .timeout(3)
            .data(json!({"userId": 4}));
        assert_eq!(req.body(), Some(&json!({"userId": 4})));
        assert_eq!(req.timeout, Some(Duration::new(3, 0)));
        assert_eq!(req.headers, vec![(String::from("X-Trace"), String::from("1"))]);
    }

    #[test]
    fn urls() {
        let api = Api::new().unwrap();
        config::set(&["api", "endpoint"], &"http://127.0.0.1:3000/api/").unwrap();
        assert_eq!(api.build_url("/event/invitations/user").unwrap(), "http://127.0.0.1:3000/api/event/invitations/user");
        api.set_auth("abc");
        assert_eq!(api.auth_header(), Some(String::from("Bearer abc")));
        api.clear_auth();
        assert_eq!(api.auth_header(), None);
    }
}
