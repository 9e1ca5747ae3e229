//! Query-string multi-map
//!
//! Wire format: `key=value` pairs joined by `&`. Values are percent-encoded
//! like `encodeURIComponent`, except `@ : $ , ; + = ? /` which stay verbatim.

use std::fmt;

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde_json::{Map, Value};

use crate::error::Error;

const QUERY_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')')
    .remove(b'@')
    .remove(b':')
    .remove(b'$')
    .remove(b',')
    .remove(b';')
    .remove(b'+')
    .remove(b'=')
    .remove(b'?')
    .remove(b'/');

/// Encode a single query key or value
pub fn encode_component(value: &str) -> String {
    utf8_percent_encode(value, QUERY_ENCODE_SET).to_string()
}

fn decode_component(value: &str) -> String {
    percent_decode_str(value).decode_utf8_lossy().into_owned()
}

/// Ordered query parameters; a key keeps the position of its first insertion
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchParams {
    params: Vec<(String, Vec<String>)>,
}

impl SearchParams {
    /// Create empty parameters
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a raw query string (without the leading `?`)
    pub fn parse(raw: &str) -> Self {
        let mut params = Self::new();
        if raw.is_empty() {
            return params;
        }
        for param in raw.split('&') {
            let (key, value) = match param.find('=') {
                Some(index) => (&param[..index], &param[index + 1..]),
                None => (param, ""),
            };
            params.append(decode_component(key), decode_component(value));
        }
        params
    }

    /// Build from `(key, value)` pairs
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        pairs.into_iter().collect()
    }

    /// Build from a JSON object: strings are taken verbatim, other scalars as
    /// their JSON text, arrays repeat the key once per element and nulls are skipped.
    pub fn from_json_object(object: &Map<String, Value>) -> Self {
        let mut params = Self::new();
        for (key, value) in object {
            match value {
                Value::Array(items) => {
                    for item in items {
                        params.append_json(key, item);
                    }
                }
                other => params.append_json(key, other),
            }
        }
        params
    }

    /// Build from either a JSON object or a raw query string
    pub fn from_json(value: &Value) -> Result<Self, Error> {
        match value {
            Value::Object(object) => Ok(Self::from_json_object(object)),
            Value::String(raw) => Ok(Self::parse(raw)),
            Value::Null => Ok(Self::new()),
            other => Err(Error::InvalidArgument(format!(
                "query parameters must be an object or a string, got {other}"
            ))),
        }
    }

    fn append_json(&mut self, key: &str, value: &Value) {
        match value {
            Value::Null => {}
            Value::String(s) => self.append(key, s.clone()),
            other => self.append(key, other.to_string()),
        }
    }

    fn position(&self, key: &str) -> Option<usize> {
        self.params.iter().position(|(k, _)| k == key)
    }

    /// Whether `key` is present
    pub fn has(&self, key: &str) -> bool {
        self.position(key).is_some()
    }

    /// First value of `key`
    pub fn get(&self, key: &str) -> Option<&str> {
        self.position(key)
            .and_then(|index| self.params[index].1.first())
            .map(String::as_str)
    }

    /// Every value of `key`
    pub fn get_all(&self, key: &str) -> &[String] {
        self.position(key)
            .map(|index| self.params[index].1.as_slice())
            .unwrap_or(&[])
    }

    /// Replace the values of `key` with a single value
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        match self.position(&key) {
            Some(index) => self.params[index].1 = vec![value.into()],
            None => self.params.push((key, vec![value.into()])),
        }
    }

    /// For every key of `other`, replace the local values with its first value
    pub fn set_all(&mut self, other: &SearchParams) {
        for (key, values) in &other.params {
            if let Some(first) = values.first() {
                self.set(key.clone(), first.clone());
            }
        }
    }

    /// Append a value to `key`
    pub fn append(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        match self.position(&key) {
            Some(index) => self.params[index].1.push(value.into()),
            None => self.params.push((key, vec![value.into()])),
        }
    }

    /// Append every value of `other`
    pub fn append_all(&mut self, other: &SearchParams) {
        for (key, values) in &other.params {
            for value in values {
                self.append(key.clone(), value.clone());
            }
        }
    }

    /// For every key of `other`, replace the local values with all of its values
    pub fn replace_all(&mut self, other: &SearchParams) {
        for (key, values) in &other.params {
            match self.position(key) {
                Some(index) => self.params[index].1 = values.clone(),
                None => self.params.push((key.clone(), values.clone())),
            }
        }
    }

    /// Remove `key` and all of its values
    pub fn delete(&mut self, key: &str) {
        self.params.retain(|(k, _)| k != key);
    }

    /// Whether there are no parameters
    pub fn is_empty(&self) -> bool {
        self.params.iter().all(|(_, values)| values.is_empty())
    }

    /// `(key, value)` pairs in wire order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.params.iter().flat_map(|(key, values)| {
            values
                .iter()
                .map(move |value| (key.as_str(), value.as_str()))
        })
    }
}

impl fmt::Display for SearchParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (key, value) in self.iter() {
            if !first {
                f.write_str("&")?;
            }
            first = false;
            write!(f, "{}={}", encode_component(key), encode_component(value))?;
        }
        Ok(())
    }
}

impl<K, V> FromIterator<(K, V)> for SearchParams
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = SearchParams::new();
        for (key, value) in iter {
            params.append(key, value);
        }
        params
    }
}

impl From<&str> for SearchParams {
    fn from(raw: &str) -> Self {
        Self::parse(raw)
    }
}

impl From<String> for SearchParams {
    fn from(raw: String) -> Self {
        Self::parse(&raw)
    }
}

impl From<&Map<String, Value>> for SearchParams {
    fn from(object: &Map<String, Value>) -> Self {
        Self::from_json_object(object)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_object_params_repeat_array_keys_in_order() {
        let value = json!({ "x": 1, "y": [2, 3] });
        let params = SearchParams::from_json(&value).expect("object params");
        assert_eq!(params.to_string(), "x=1&y=2&y=3");
    }

    #[test]
    fn test_reserved_characters_stay_verbatim() {
        let params = SearchParams::from_pairs([("q", "a@b:c$d,e;f+g=h?i/j k&l")]);
        assert_eq!(params.to_string(), "q=a@b:c$d,e;f+g=h?i/j%20k%26l");
    }

    #[test]
    fn test_parse_splits_on_first_equals() {
        let params = SearchParams::parse("a=1&b=x=y&c&a=2&d=%20");
        assert_eq!(params.get_all("a"), &["1".to_string(), "2".to_string()]);
        assert_eq!(params.get("b"), Some("x=y"));
        assert_eq!(params.get("c"), Some(""));
        assert_eq!(params.get("d"), Some(" "));
        assert!(SearchParams::parse("").is_empty());
    }

    #[test]
    fn test_set_append_replace_and_delete() {
        let mut params = SearchParams::from_pairs([("a", "1"), ("a", "2"), ("b", "3")]);
        params.set("a", "9");
        assert_eq!(params.get_all("a"), &["9".to_string()]);

        let other = SearchParams::from_pairs([("b", "4"), ("b", "5"), ("c", "6")]);
        let mut appended = params.clone();
        appended.append_all(&other);
        assert_eq!(appended.to_string(), "a=9&b=3&b=4&b=5&c=6");

        let mut replaced = params.clone();
        replaced.replace_all(&other);
        assert_eq!(replaced.to_string(), "a=9&b=4&b=5&c=6");

        let mut set = params.clone();
        set.set_all(&other);
        assert_eq!(set.to_string(), "a=9&b=4&c=6");

        params.delete("a");
        assert!(!params.has("a"));
        assert_eq!(params.to_string(), "b=3");
    }

    #[test]
    fn test_from_json_rejects_scalars() {
        assert!(SearchParams::from_json(&json!(3)).is_err());
        assert_eq!(
            SearchParams::from_json(&json!("a=1"))
                .expect("string params")
                .get("a"),
            Some("1")
        );
    }
}
