//! Per-session key-value store surviving across passes.

use std::any::Any;
use std::fmt;

use crate::collections::map::HashMap;
use crate::error::StateError;

#[derive(Default)]
pub struct SessionState {
    values: HashMap<String, Box<dyn Any>>,
}

impl fmt::Debug for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<&str> = self.keys().collect();
        keys.sort_unstable();
        f.debug_struct("SessionState").field("keys", &keys).finish()
    }
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// Stored keys starting with `prefix`, sorted.
    pub fn keys_with_prefix(&self, prefix: &str) -> Vec<String> {
        let mut keys: Vec<String> = self
            .keys()
            .filter(|key| key.starts_with(prefix))
            .map(str::to_owned)
            .collect();
        keys.sort_unstable();
        keys
    }

    pub fn get<T: 'static>(&self, key: &str) -> Result<Option<&T>, StateError> {
        match self.values.get(key) {
            None => Ok(None),
            Some(value) => value
                .downcast_ref::<T>()
                .map(Some)
                .ok_or_else(|| StateError::TypeMismatch {
                    key: key.to_owned(),
                    expected: std::any::type_name::<T>(),
                }),
        }
    }

    /// Stores `value`, returning whether a previous value was replaced.
    pub fn insert<T: 'static>(&mut self, key: impl Into<String>, value: T) -> bool {
        self.values.insert(key.into(), Box::new(value)).is_some()
    }

    pub fn remove(&mut self, key: &str) -> bool {
        self.values.remove(key).is_some()
    }

    /// Drops every key and returns how many there were.
    pub fn clear(&mut self) -> usize {
        let count = self.values.len();
        self.values.clear();
        count
    }
}
