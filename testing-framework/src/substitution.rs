//! Literal placeholder substitution
//!
//! Fixture text contains environment specific tokens such as `@PSCHEMANAME`
//! or `@MSERVER`. Each entry of a [`PlaceholderMap`] is applied as a plain,
//! global find-and-replace. Entries are independent, so the result only
//! makes sense when no token is a substring of another token and no
//! replacement value contains a token. That is the caller's responsibility;
//! [`PlaceholderMap::ambiguities`] lists violations without changing how
//! substitution behaves.

use std::collections::HashMap;
use std::fmt;

/// Token → replacement value
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlaceholderMap(HashMap<String, String>);

impl PlaceholderMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, token: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.0.insert(token.into(), value.into())
    }

    pub fn get(&self, token: &str) -> Option<&str> {
        self.0.get(token).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Token pairs whose substitution result depends on application order.
    ///
    /// Sorted so the report is stable across runs.
    pub fn ambiguities(&self) -> Vec<Ambiguity> {
        let mut found = Vec::new();
        for (token, value) in self.iter() {
            for (other, _) in self.iter() {
                if token == other || token.is_empty() {
                    continue;
                }
                if other.contains(token) {
                    found.push(Ambiguity::TokenInToken {
                        inner: token.to_owned(),
                        outer: other.to_owned(),
                    });
                }
                if !other.is_empty() && value.contains(other) {
                    found.push(Ambiguity::TokenInValue {
                        token: token.to_owned(),
                        contained: other.to_owned(),
                    });
                }
            }
        }
        found.sort();
        found
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for PlaceholderMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// An order dependency between two placeholder entries
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum Ambiguity {
    /// `inner` occurs inside the token `outer`
    TokenInToken { inner: String, outer: String },
    /// The replacement value of `token` contains the token `contained`
    TokenInValue { token: String, contained: String },
}

impl fmt::Display for Ambiguity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TokenInToken { inner, outer } => {
                write!(f, "placeholder {} is part of placeholder {}", inner, outer)
            }
            Self::TokenInValue { token, contained } => write!(
                f,
                "value of placeholder {} contains placeholder {}",
                token, contained
            ),
        }
    }
}

/// Replace every occurrence of every token in `text`
pub fn substitute(text: &str, placeholders: &PlaceholderMap) -> String {
    placeholders
        .iter()
        .filter(|(token, _)| !token.is_empty())
        .fold(text.to_owned(), |acc, (token, value)| acc.replace(token, value))
}
