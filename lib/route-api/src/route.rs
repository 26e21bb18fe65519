//! Gateway route definitions carried in Ingress annotations

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use crate::uri::RouteUri;
use indexmap::IndexMap;
use serde_yaml::Value;
use std::collections::BTreeMap;
use std::str::FromStr;
use thiserror::Error;

/// Prefix of generated argument keys for shortcut definitions
const GENERATED_KEY_PREFIX: &str = "_genkey_";

/// A route the gateway should serve.
///
/// Predicates, filters and metadata are carried as authored; nothing here
/// interprets them.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RouteDefinition {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,

    #[serde(default)]
    pub predicates: Vec<PredicateDefinition>,

    #[serde(default)]
    pub filters: Vec<FilterDefinition>,

    /// Destination; None until synthesized from the default backend
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<RouteUri>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, Value>,

    #[serde(default)]
    pub order: i32,
}

impl RouteDefinition {
    /// Parse a YAML route payload. A payload with no document content
    /// (empty, whitespace or comments only, or a bare null) is an error.
    pub fn from_yaml(payload: &str) -> Result<Self, serde_yaml::Error> {
        if payload.trim().is_empty() {
            return Err(de::Error::custom("no content in routes payload"));
        }
        match serde_yaml::from_str(payload)? {
            Value::Null => Err(de::Error::custom("no content in routes payload")),
            document => serde_yaml::from_value(document),
        }
    }

    /// Render the definition as YAML
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }
}

pub type PredicateDefinition = NamedDefinition;
pub type FilterDefinition = NamedDefinition;

/// A named predicate or filter with its arguments.
///
/// Accepts either `{name: Path, args: {pattern: /a}}` or the shortcut
/// text `Path=/a,/b`, whose arguments get generated keys `_genkey_0`,
/// `_genkey_1`, ... Arguments keep their authored order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct NamedDefinition {
    pub name: String,

    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub args: IndexMap<String, String>,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("Unable to parse definition text '{0}', must be of the form name=value")]
    MissingSeparator(String),

    #[error("Definition is missing a string 'name'")]
    MissingName,

    #[error("Arguments of definition '{0}' must be a mapping of scalars")]
    InvalidArgs(String),

    #[error("Definition must be a string or a mapping")]
    UnsupportedForm,
}

impl NamedDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: IndexMap::new(),
        }
    }

    pub fn with_arg(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.args.insert(key.into(), value.into());
        self
    }

    /// Key given to the shortcut argument at `index`
    pub fn generated_key(index: usize) -> String {
        format!("{}{}", GENERATED_KEY_PREFIX, index)
    }

    fn from_value(value: Value) -> Result<Self, ParseError> {
        match value {
            Value::String(text) => text.parse(),
            Value::Mapping(mut mapping) => {
                let name = match mapping.remove("name") {
                    Some(Value::String(name)) => name,
                    _ => return Err(ParseError::MissingName),
                };

                let args = match mapping.remove("args") {
                    None | Some(Value::Null) => IndexMap::new(),
                    Some(Value::Mapping(args)) => {
                        let mut parsed = IndexMap::with_capacity(args.len());
                        for (key, value) in args {
                            match (scalar_to_string(key), scalar_to_string(value)) {
                                (Some(key), Some(value)) => {
                                    parsed.insert(key, value);
                                }
                                _ => return Err(ParseError::InvalidArgs(name)),
                            }
                        }
                        parsed
                    }
                    Some(_) => return Err(ParseError::InvalidArgs(name)),
                };

                Ok(Self { name, args })
            }
            _ => Err(ParseError::UnsupportedForm),
        }
    }
}

impl FromStr for NamedDefinition {
    type Err = ParseError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let (name, raw_args) = match text.find('=') {
            Some(idx) if idx > 0 => (&text[..idx], &text[idx + 1..]),
            _ => return Err(ParseError::MissingSeparator(text.to_string())),
        };

        let args = raw_args
            .split(',')
            .map(str::trim)
            .filter(|arg| !arg.is_empty())
            .enumerate()
            .map(|(i, arg)| (Self::generated_key(i), arg.to_string()))
            .collect();

        Ok(Self {
            name: name.to_string(),
            args,
        })
    }
}

impl<'de> Deserialize<'de> for NamedDefinition {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        NamedDefinition::from_value(value).map_err(de::Error::custom)
    }
}

fn scalar_to_string(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null => Some(String::new()),
        _ => None,
    }
}
