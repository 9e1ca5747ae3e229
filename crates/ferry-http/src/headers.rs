//! Ordered, case-insensitive header multi-map
//!
//! Lookups ignore ASCII case while enumeration reports the casing of the first
//! time a name was seen.

use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Eq)]
struct HeaderEntry {
    name: String,
    values: Vec<String>,
}

/// HTTP headers of a request, a response or a configuration layer
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: Vec<HeaderEntry>,
}

impl Headers {
    /// Create an empty header map
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the raw `name: value` lines reported by a transport.
    ///
    /// Lines without a name are skipped; a repeated name replaces the earlier value.
    pub fn from_response_header_string(raw: &str) -> Self {
        let mut headers = Self::new();
        for line in raw.split('\n') {
            if let Some(index) = line.find(':') {
                if index > 0 {
                    headers.set(&line[..index], line[index + 1..].trim());
                }
            }
        }
        headers
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|entry| entry.name.eq_ignore_ascii_case(name))
    }

    /// Append a value to the list of values for `name`
    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        match self.position(&name) {
            Some(index) => self.entries[index].values.push(value.into()),
            None => self.entries.push(HeaderEntry {
                name,
                values: vec![value.into()],
            }),
        }
    }

    /// Set `name` to a single value, replacing whatever was stored before
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        match self.position(&name) {
            Some(index) => self.entries[index].values = vec![value.into()],
            None => self.entries.push(HeaderEntry {
                name,
                values: vec![value.into()],
            }),
        }
    }

    /// Set `name` to the comma-joined `values`. An empty slice leaves the map untouched.
    pub fn set_all<S: AsRef<str>>(&mut self, name: impl Into<String>, values: &[S]) {
        if values.is_empty() {
            return;
        }
        let joined = values
            .iter()
            .map(|v| v.as_ref())
            .collect::<Vec<_>>()
            .join(",");
        self.set(name, joined);
    }

    /// Remove every value stored for `name`
    pub fn delete(&mut self, name: &str) {
        self.entries
            .retain(|entry| !entry.name.eq_ignore_ascii_case(name));
    }

    /// First value stored for `name`
    pub fn get(&self, name: &str) -> Option<&str> {
        self.get_all(name)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    /// Every value stored for `name`
    pub fn get_all(&self, name: &str) -> Option<&[String]> {
        self.position(name)
            .map(|index| self.entries[index].values.as_slice())
    }

    /// Whether `name` is present
    pub fn has(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Header names in insertion order, with their first-seen casing
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.name.as_str())
    }

    /// Value lists in insertion order
    pub fn values(&self) -> impl Iterator<Item = &[String]> {
        self.entries.iter().map(|entry| entry.values.as_slice())
    }

    /// `(name, values)` pairs in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|entry| (entry.name.as_str(), entry.values.as_slice()))
    }

    /// Number of distinct header names
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no header is stored
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Append every value of `other` on top of this map.
    ///
    /// Same-named headers keep both sets of values.
    pub fn merge(&mut self, other: &Headers) -> &mut Self {
        for (name, values) in other.iter() {
            for value in values {
                self.append(name, value.clone());
            }
        }
        self
    }

    /// Name to values, each stored value further split on `,`
    pub fn to_json(&self) -> Value {
        let mut serialized = Map::new();
        for (name, values) in self.iter() {
            let split = values
                .iter()
                .flat_map(|v| v.split(','))
                .map(|v| Value::String(v.to_string()))
                .collect();
            serialized.insert(name.to_string(), Value::Array(split));
        }
        Value::Object(serialized)
    }

    /// Flatten to one comma-joined value per name, for transports expecting a flat map
    pub fn to_flat_map(&self) -> Vec<(String, String)> {
        self.iter()
            .map(|(name, values)| (name.to_string(), values.join(",")))
            .collect()
    }
}

impl<K, V> FromIterator<(K, V)> for Headers
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut headers = Headers::new();
        for (name, value) in iter {
            headers.append(name, value);
        }
        headers
    }
}
