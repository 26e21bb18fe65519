//! Route destination URIs

use crate::annotations::LOAD_BALANCER_SCHEME;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use url::Url;

/// Base used only to check that a relative reference is well formed
const RELATIVE_CHECK_BASE: &str = "http://localhost/";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UriError {
    #[error("Route uri must not be empty")]
    Empty,

    #[error("Route uri '{0}' contains whitespace or control characters")]
    IllegalCharacter(String),

    #[error("Invalid route uri '{uri}': {source}")]
    Invalid {
        uri: String,
        #[source]
        source: url::ParseError,
    },
}

/// Destination of a route, kept exactly as authored.
///
/// The text is validated as an absolute URI or a relative reference but
/// never rewritten: no trailing slash is added, host case and default ports
/// stay as written.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RouteUri {
    text: String,
    absolute: Option<Url>,
}

impl RouteUri {
    pub fn parse(text: impl Into<String>) -> Result<Self, UriError> {
        let text = text.into();
        if text.is_empty() {
            return Err(UriError::Empty);
        }
        if text.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(UriError::IllegalCharacter(text));
        }

        let absolute = match Url::parse(&text) {
            Ok(url) => Some(url),
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                Url::parse(RELATIVE_CHECK_BASE)
                    .and_then(|base| base.join(&text))
                    .map_err(|source| UriError::Invalid {
                        uri: text.clone(),
                        source,
                    })?;
                None
            }
            Err(source) => return Err(UriError::Invalid { uri: text, source }),
        };

        Ok(Self { text, absolute })
    }

    /// `lb://<service>`, or None when the service name cannot be a host
    pub fn load_balanced(service: &str) -> Option<Self> {
        if service.is_empty() {
            return None;
        }
        let uri = Self::parse(format!("{}://{}", LOAD_BALANCER_SCHEME, service)).ok()?;
        uri.host()?;
        Some(uri)
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Scheme of an absolute URI; None for relative references
    pub fn scheme(&self) -> Option<&str> {
        self.absolute.as_ref().map(Url::scheme)
    }

    pub fn host(&self) -> Option<&str> {
        self.absolute.as_ref().and_then(Url::host_str)
    }

    pub fn is_relative(&self) -> bool {
        self.absolute.is_none()
    }
}

impl FromStr for RouteUri {
    type Err = UriError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        Self::parse(text)
    }
}

impl TryFrom<String> for RouteUri {
    type Error = UriError;

    fn try_from(text: String) -> Result<Self, Self::Error> {
        Self::parse(text)
    }
}

impl From<RouteUri> for String {
    fn from(uri: RouteUri) -> Self {
        uri.text
    }
}

impl fmt::Display for RouteUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}
