//! Job description: the raw, deserializable form and the validated form

use crate::error::{AppError, Result};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Method;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::time::Duration;
use url::Url;

/// Job as it arrives from CLI flags, a config document or a request body.
///
/// Field names match the config/wire format (`new`, `lowerIsBetter`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobSpec {
    /// URL to probe
    #[serde(default, deserialize_with = "null_as_default")]
    pub endpoint: String,

    /// Request headers
    #[serde(default, deserialize_with = "null_as_default")]
    pub headers: BTreeMap<String, String>,

    /// Request body
    #[serde(default, deserialize_with = "null_as_default")]
    pub body: String,

    /// HTTP method, `GET` when empty
    #[serde(default, deserialize_with = "null_as_default")]
    pub method: String,

    /// Replacement target: hostname, IP literal or `localhost`
    #[serde(default, deserialize_with = "null_as_default")]
    pub new: String,

    /// Overall request timeout, 5s when zero or unset
    #[serde(
        default,
        deserialize_with = "deserialize_timeout",
        serialize_with = "serialize_timeout"
    )]
    pub timeout: Option<Duration>,

    /// Accept a numerically lower candidate status as a pass
    #[serde(default, deserialize_with = "null_as_default")]
    pub lower_is_better: bool,

    /// Print the equivalent shell command instead of probing
    #[serde(default, deserialize_with = "null_as_default")]
    pub equiv: bool,
}

impl JobSpec {
    /// Create a spec for the two required fields
    pub fn new<E: Into<String>, N: Into<String>>(endpoint: E, new: N) -> Self {
        Self {
            endpoint: endpoint.into(),
            new: new.into(),
            ..Self::default()
        }
    }

    pub fn with_method<S: Into<String>>(mut self, method: S) -> Self {
        self.method = method.into();
        self
    }

    pub fn with_header<K: Into<String>, V: Into<String>>(mut self, name: K, value: V) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_body<S: Into<String>>(mut self, body: S) -> Self {
        self.body = body.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn lower_is_better(mut self, lower_is_better: bool) -> Self {
        self.lower_is_better = lower_is_better;
        self
    }
}

/// Validated, defaulted, immutable job.
#[derive(Debug, Clone)]
pub struct Job {
    endpoint: Url,
    method: Method,
    headers: HeaderMap,
    body: Option<String>,
    new_target: String,
    timeout: Duration,
    lower_is_better: bool,
}

impl Job {
    /// Validate and default a spec. Never touches the network.
    pub fn from_spec(spec: &JobSpec) -> Result<Self> {
        if spec.endpoint.is_empty() {
            return Err(AppError::validation("no endpoint provided"));
        }
        if spec.new.is_empty() {
            return Err(AppError::validation("no new ip provided"));
        }

        let endpoint = Url::parse(&spec.endpoint)
            .map_err(|e| AppError::validation(format!("invalid endpoint '{}': {}", spec.endpoint, e)))?;
        match endpoint.scheme() {
            "http" | "https" => {}
            scheme => {
                return Err(AppError::validation(format!("unsupported endpoint scheme: {}", scheme)));
            }
        }
        if endpoint.host_str().is_none() {
            return Err(AppError::validation("endpoint must have a host"));
        }

        let method_name = if spec.method.is_empty() {
            crate::defaults::DEFAULT_METHOD
        } else {
            spec.method.as_str()
        };
        let method = Method::from_bytes(method_name.as_bytes())
            .map_err(|e| AppError::validation(format!("invalid method '{}': {}", method_name, e)))?;

        let mut headers = HeaderMap::new();
        for (name, value) in &spec.headers {
            let header_name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| AppError::validation(format!("invalid header name '{}': {}", name, e)))?;
            let header_value = HeaderValue::from_str(value)
                .map_err(|e| AppError::validation(format!("invalid value for header '{}': {}", name, e)))?;
            // Names are case-insensitive; a later duplicate replaces the earlier one.
            headers.insert(header_name, header_value);
        }

        let timeout = match spec.timeout {
            Some(timeout) if !timeout.is_zero() => timeout,
            _ => crate::defaults::DEFAULT_TIMEOUT,
        };

        Ok(Self {
            endpoint,
            method,
            headers,
            body: if spec.body.is_empty() { None } else { Some(spec.body.clone()) },
            new_target: spec.new.clone(),
            timeout,
            lower_is_better: spec.lower_is_better,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }

    /// Replacement target exactly as supplied (hostname or literal)
    pub fn new_target(&self) -> &str {
        &self.new_target
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn lower_is_better(&self) -> bool {
        self.lower_is_better
    }
}

/// Parse a duration string such as `5s` or `1500ms`.
pub fn parse_duration(value: &str) -> Result<Duration> {
    Ok(humantime::parse_duration(value.trim())?)
}

// An explicit `null` (Go's nil map, a bare YAML key) reads as the field's default.
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawTimeout {
    Nanos(u64),
    Text(String),
}

// Integers are nanoseconds, matching how Go-based tooling encodes durations.
fn deserialize_timeout<'de, D>(deserializer: D) -> std::result::Result<Option<Duration>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<RawTimeout>::deserialize(deserializer)? {
        None => Ok(None),
        Some(RawTimeout::Nanos(nanos)) => Ok(Some(Duration::from_nanos(nanos))),
        Some(RawTimeout::Text(text)) if text.trim().is_empty() => Ok(None),
        Some(RawTimeout::Text(text)) => humantime::parse_duration(text.trim())
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

fn serialize_timeout<S>(timeout: &Option<Duration>, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match timeout {
        Some(timeout) => serializer.serialize_str(&humantime::format_duration(*timeout).to_string()),
        None => serializer.serialize_none(),
    }
}
