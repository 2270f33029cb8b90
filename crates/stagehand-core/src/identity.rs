//! Deterministic identity tokens for interactive elements.
//!
//! A token is derived purely from `(context, base_key, discriminator)` and
//! doubles as the element's session-state key:
//! `"<context>::<base_key>::<discriminator-or-empty>"`. Each component has
//! `\` and `:` backslash-escaped, so two different triples can never encode
//! to the same text. An empty discriminator is the same as none.

use std::borrow::Cow;
use std::fmt;

use crate::collections::map::HashSet;
use crate::hash::hash_one;
use crate::Key;

pub const SEPARATOR: &str = "::";

fn escape_component(raw: &str) -> Cow<'_, str> {
    if !raw.contains(|ch: char| ch == '\\' || ch == ':') {
        return Cow::Borrowed(raw);
    }
    let mut escaped = String::with_capacity(raw.len() + 4);
    for ch in raw.chars() {
        if ch == '\\' || ch == ':' {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    Cow::Owned(escaped)
}

/// Prefix shared by every token derived in `context`.
pub fn context_prefix(context: &str) -> String {
    let mut prefix = escape_component(context).into_owned();
    prefix.push_str(SEPARATOR);
    prefix
}

/// Derives the token for one element. Pure: no counters, no clock.
pub fn derive(context: &str, base_key: &str, discriminator: Option<&str>) -> IdentityToken {
    let discriminator = discriminator.unwrap_or_default();
    let mut text = context_prefix(context);
    text.push_str(&escape_component(base_key));
    text.push_str(SEPARATOR);
    text.push_str(&escape_component(discriminator));
    IdentityToken(text)
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IdentityToken(String);

impl IdentityToken {
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Compact numeric form of the token for hosts keyed by integers.
    pub fn digest(&self) -> Key {
        hash_one(self.0.as_str())
    }

    pub fn has_prefix(&self, prefix: &str) -> bool {
        self.0.starts_with(prefix)
    }
}

impl fmt::Display for IdentityToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for IdentityToken {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<IdentityToken> for String {
    fn from(token: IdentityToken) -> Self {
        token.0
    }
}

/// Identity scope of one renderer: every key it requests carries its context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityKeyGenerator {
    context: String,
}

impl IdentityKeyGenerator {
    pub fn for_context(context: impl Into<String>) -> Self {
        Self {
            context: context.into(),
        }
    }

    pub fn context(&self) -> &str {
        &self.context
    }

    pub fn derive(&self, base_key: &str, discriminator: Option<&str>) -> IdentityToken {
        derive(&self.context, base_key, discriminator)
    }

    pub fn prefix(&self) -> String {
        context_prefix(&self.context)
    }
}

/// Tokens handed to live elements during a single pass.
#[derive(Debug, Default)]
pub struct IssuedKeys {
    issued: HashSet<IdentityToken>,
}

impl IssuedKeys {
    /// Records `token`; `false` means another element already holds it.
    pub fn issue(&mut self, token: &IdentityToken) -> bool {
        self.issued.insert(token.clone())
    }

    pub fn contains(&self, token: &IdentityToken) -> bool {
        self.issued.contains(token)
    }

    pub fn len(&self) -> usize {
        self.issued.len()
    }

    pub fn is_empty(&self) -> bool {
        self.issued.is_empty()
    }
}

#[cfg(test)]
#[path = "tests/identity_tests.rs"]
mod tests;
