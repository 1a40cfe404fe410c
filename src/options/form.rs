//! Ordered key → values mapping used for form bodies and search params.

use std::collections::BTreeMap;
use url::form_urlencoded;

/// Form data that encodes to an `application/x-www-form-urlencoded` string.
///
/// Without an order hint keys encode in the map's default (sorted) order.
/// A form created with [`Form::ordered`], or given an explicit hint through
/// [`Form::set_order`], encodes keys in hint order; keys missing from the
/// hint follow, sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Form {
    values: BTreeMap<String, Vec<String>>,
    order: Option<Vec<String>>,
}

impl Form {
    /// An empty form without an order hint.
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty form that records key insertion order as its order hint.
    pub fn ordered() -> Self {
        Self {
            values: BTreeMap::new(),
            order: Some(Vec::new()),
        }
    }

    /// Append a value for `key`.
    pub fn add(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        self.note_key(&key);
        self.values.entry(key).or_default().push(value.into());
    }

    /// Replace all values for `key` with a single value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        self.note_key(&key);
        self.values.insert(key, vec![value.into()]);
    }

    /// Builder form of [`Form::add`].
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.add(key, value);
        self
    }

    /// Remove `key` and its values.
    pub fn remove(&mut self, key: &str) -> Option<Vec<String>> {
        if let Some(order) = self.order.as_mut() {
            order.retain(|k| k != key);
        }
        self.values.remove(key)
    }

    /// First value for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values
            .get(key)
            .and_then(|v| v.first())
            .map(String::as_str)
    }

    /// All values for `key`.
    pub fn get_all(&self, key: &str) -> &[String] {
        self.values.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Set an explicit key order hint.
    pub fn set_order<I, S>(&mut self, keys: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.order = Some(keys.into_iter().map(Into::into).collect());
    }

    /// The current order hint, if any.
    pub fn order(&self) -> Option<&[String]> {
        self.order.as_deref()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Encode as `key=value&key2=value2`.
    pub fn encode(&self) -> String {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        for key in self.key_order() {
            for value in self.get_all(key) {
                serializer.append_pair(key, value);
            }
        }
        serializer.finish()
    }

    fn key_order(&self) -> Vec<&str> {
        let Some(order) = self.order.as_ref() else {
            return self.values.keys().map(String::as_str).collect();
        };

        let mut keys: Vec<&str> = Vec::with_capacity(self.values.len());
        for key in order {
            if self.values.contains_key(key) && !keys.contains(&key.as_str()) {
                keys.push(key.as_str());
            }
        }
        for key in self.values.keys() {
            if !keys.contains(&key.as_str()) {
                keys.push(key.as_str());
            }
        }
        keys
    }

    fn note_key(&mut self, key: &str) {
        if let Some(order) = self.order.as_mut() {
            if !order.iter().any(|k| k == key) {
                order.push(key.to_string());
            }
        }
    }
}

impl<K, V> FromIterator<(K, V)> for Form
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut form = Form::ordered();
        for (k, v) in iter {
            form.add(k, v);
        }
        form
    }
}
