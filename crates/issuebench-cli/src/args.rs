//! `key=value` token parsing
//!
//! Keys are case-insensitive and order does not matter. Tokens without `=`
//! or with an empty key are skipped, and so are keys nobody asks for.

use std::collections::HashMap;
use std::str::FromStr;

use tracing::{debug, warn};

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct KeyValueArgs {
    values: HashMap<String, String>,
}

impl KeyValueArgs {
    pub fn parse<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut values = HashMap::new();
        for token in tokens {
            let token = token.as_ref();
            match token.split_once('=') {
                Some((key, value)) if !key.trim().is_empty() => {
                    // Later tokens win
                    values.insert(key.trim().to_ascii_lowercase(), value.trim().to_string());
                }
                _ => debug!(token, "Ignoring malformed argument"),
            }
        }
        Self { values }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values
            .get(&key.to_ascii_lowercase())
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    /// Parsed value for `key`, or `default` when absent or unparsable
    pub fn parse_or<T>(&self, key: &str, default: T) -> T
    where
        T: FromStr + Copy,
    {
        match self.get(key) {
            None => default,
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                warn!(key, value = raw, "Unparsable value, keeping default");
                default
            }),
        }
    }

    /// Keys present in the tokens but not in `known`
    pub fn unknown_keys<'a>(&'a self, known: &'a [&str]) -> impl Iterator<Item = &'a str> + 'a {
        self.values
            .keys()
            .map(String::as_str)
            .filter(move |k| !known.contains(k))
    }
}
