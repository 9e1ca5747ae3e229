//! Request and response bodies
//!
//! A body is a tagged union decided once when it is attached. The derived
//! [`ContentType`] tag selects how it is rendered on the wire, and
//! [`BodyReader`] decodes it back into text, JSON or bytes.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::Error;
use crate::search_params::SearchParams;

/// Classification of a body used to pick its wire representation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ContentType {
    /// No body
    #[default]
    None,
    /// `application/json`
    Json,
    /// `application/x-www-form-urlencoded`
    Form,
    /// `multipart/form-data`
    FormData,
    /// `text/plain` or `text/html`
    Text,
    /// Binary blob with an optional MIME type
    Blob,
    /// Raw byte buffer
    ArrayBuffer,
}

impl ContentType {
    /// `Content-Type` header value a transport should send when none was given
    pub fn default_header(&self) -> Option<&'static str> {
        match self {
            ContentType::Json => Some("application/json"),
            ContentType::Form => Some("application/x-www-form-urlencoded;charset=UTF-8"),
            ContentType::Text => Some("text/plain"),
            _ => None,
        }
    }
}

/// How bytes are mapped to characters and back
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EncodingHint {
    /// Little-endian UTF-16 code units
    #[default]
    Legacy,
    /// One byte per character
    Iso8859,
    /// UTF-8
    Utf8,
}

/// Binary payload with an optional MIME type
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Blob {
    bytes: Vec<u8>,
    mime_type: Option<String>,
}

impl Blob {
    /// Create an untyped blob
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
            mime_type: None,
        }
    }

    /// Create a blob with a MIME type
    pub fn with_type(bytes: impl Into<Vec<u8>>, mime_type: impl Into<String>) -> Self {
        Self {
            bytes: bytes.into(),
            mime_type: Some(mime_type.into()),
        }
    }

    /// Blob contents
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// MIME type, if known
    pub fn mime_type(&self) -> Option<&str> {
        self.mime_type.as_deref()
    }

    /// Size in bytes
    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    /// Take the contents
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

/// One field of a multipart form
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormPart {
    /// Plain text field
    Text(String),
    /// File field
    File {
        /// File contents
        blob: Blob,
        /// File name sent with the part
        file_name: Option<String>,
    },
}

/// Multipart form container
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FormData {
    parts: Vec<(String, FormPart)>,
}

impl FormData {
    /// Create an empty form
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a text field
    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parts.push((name.into(), FormPart::Text(value.into())));
        self
    }

    /// Append a file field
    pub fn file(mut self, name: impl Into<String>, blob: Blob, file_name: Option<String>) -> Self {
        self.parts
            .push((name.into(), FormPart::File { blob, file_name }));
        self
    }

    /// Fields in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FormPart)> {
        self.parts.iter().map(|(name, part)| (name.as_str(), part))
    }

    /// Number of fields
    pub fn len(&self) -> usize {
        self.parts.len()
    }

    /// Whether the form has no field
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }
}

/// Body payload
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    /// Plain text
    Text(String),
    /// Structured JSON value
    Json(Value),
    /// URL-encoded form
    Form(SearchParams),
    /// Multipart form
    FormData(FormData),
    /// Binary blob
    Blob(Blob),
    /// Raw bytes
    Bytes(Vec<u8>),
}

impl Body {
    /// Serialize `value` into a JSON body
    pub fn json<T: Serialize + ?Sized>(value: &T) -> Result<Self, Error> {
        Ok(Body::Json(serde_json::to_value(value)?))
    }

    /// Content type implied by the shape of the payload alone
    pub fn content_type(&self) -> ContentType {
        match self {
            Body::Text(_) => ContentType::Text,
            Body::Json(Value::Null) => ContentType::None,
            Body::Json(Value::Object(_)) | Body::Json(Value::Array(_)) => ContentType::Json,
            Body::Json(_) => ContentType::Text,
            Body::Form(_) => ContentType::Form,
            Body::FormData(_) => ContentType::FormData,
            Body::Blob(_) => ContentType::Blob,
            Body::Bytes(_) => ContentType::ArrayBuffer,
        }
    }
}

impl From<String> for Body {
    fn from(value: String) -> Self {
        Body::Text(value)
    }
}

impl From<&str> for Body {
    fn from(value: &str) -> Self {
        Body::Text(value.to_string())
    }
}

impl From<Value> for Body {
    fn from(value: Value) -> Self {
        Body::Json(value)
    }
}

impl From<Vec<u8>> for Body {
    fn from(value: Vec<u8>) -> Self {
        Body::Bytes(value)
    }
}

impl From<SearchParams> for Body {
    fn from(value: SearchParams) -> Self {
        Body::Form(value)
    }
}

impl From<FormData> for Body {
    fn from(value: FormData) -> Self {
        Body::FormData(value)
    }
}

impl From<Blob> for Body {
    fn from(value: Blob) -> Self {
        Body::Blob(value)
    }
}

/// Wire representation handed to a transport
#[derive(Debug, Clone, PartialEq)]
pub enum RenderedBody {
    /// Nothing to send
    Empty,
    /// Text payload (JSON, form and plain text bodies)
    Text(String),
    /// Multipart form, encoded by the transport
    FormData(FormData),
    /// Binary blob
    Blob(Blob),
    /// Raw bytes
    Bytes(Vec<u8>),
}

/// Decode `bytes` into a string according to `hint`
pub fn decode_bytes(bytes: &[u8], hint: EncodingHint) -> Result<String, Error> {
    match hint {
        EncodingHint::Legacy => {
            if bytes.len() % 2 != 0 {
                return Err(Error::InvalidBody(format!(
                    "byte length {} is not a multiple of 2",
                    bytes.len()
                )));
            }
            let units = bytes
                .chunks_exact(2)
                .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
                .collect::<Vec<_>>();
            // Lone surrogates have no `String` form and would not re-encode to the same bytes
            String::from_utf16(&units).map_err(|e| Error::InvalidBody(e.to_string()))
        }
        EncodingHint::Iso8859 => Ok(bytes.iter().map(|b| char::from(*b)).collect()),
        EncodingHint::Utf8 => {
            String::from_utf8(bytes.to_vec()).map_err(|e| Error::InvalidBody(e.to_string()))
        }
    }
}

/// Encode `text` into bytes according to `hint`, the inverse of [`decode_bytes`]
pub fn encode_text(text: &str, hint: EncodingHint) -> Vec<u8> {
    match hint {
        EncodingHint::Legacy => text.encode_utf16().flat_map(u16::to_le_bytes).collect(),
        // Code units above 0xFF are truncated like a byte array store would
        EncodingHint::Iso8859 => text.encode_utf16().map(|unit| unit as u8).collect(),
        EncodingHint::Utf8 => text.as_bytes().to_vec(),
    }
}

fn form_to_json(params: &SearchParams) -> Value {
    let mut object = Map::new();
    for (key, value) in params.iter() {
        match object.get_mut(key) {
            Some(Value::Array(values)) => values.push(Value::String(value.to_string())),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, Value::String(value.to_string())]);
            }
            None => {
                object.insert(key.to_string(), Value::String(value.to_string()));
            }
        }
    }
    Value::Object(object)
}

/// Decoding shared by requests and responses
pub trait BodyReader {
    /// The payload, if any
    fn raw_body(&self) -> Option<&Body>;

    /// Body as text, bytes interpreted with the default [`EncodingHint`]
    fn text(&self) -> Result<String, Error> {
        self.text_with(EncodingHint::default())
    }

    /// Body as text, bytes interpreted with `hint`
    fn text_with(&self, hint: EncodingHint) -> Result<String, Error> {
        match self.raw_body() {
            None => Ok(String::new()),
            Some(Body::Text(text)) => Ok(text.clone()),
            Some(Body::Json(Value::Null)) => Ok(String::new()),
            Some(Body::Json(Value::String(text))) => Ok(text.clone()),
            Some(Body::Json(value)) => Ok(value.to_string()),
            Some(Body::Form(params)) => Ok(params.to_string()),
            Some(Body::Bytes(bytes)) => decode_bytes(bytes, hint),
            Some(Body::Blob(blob)) => decode_bytes(blob.bytes(), hint),
            Some(Body::FormData(_)) => Err(Error::UnsupportedContentType(
                "multipart form data cannot be read as text".to_string(),
            )),
        }
    }

    /// Body parsed as JSON
    fn json(&self) -> Result<Value, Error> {
        match self.raw_body() {
            None => Ok(Value::Null),
            Some(Body::Json(value)) => Ok(value.clone()),
            Some(Body::Form(params)) => Ok(form_to_json(params)),
            Some(Body::Text(text)) => Ok(serde_json::from_str(text)?),
            Some(_) => Ok(serde_json::from_str(&self.text()?)?),
        }
    }

    /// Body deserialized into `T`
    fn json_as<T: DeserializeOwned>(&self) -> Result<T, Error>
    where
        Self: Sized,
    {
        Ok(serde_json::from_value(self.json()?)?)
    }

    /// Body as bytes, text encoded with the default [`EncodingHint`]
    fn array_buffer(&self) -> Result<Vec<u8>, Error> {
        self.array_buffer_with(EncodingHint::default())
    }

    /// Body as bytes, text encoded with `hint`
    fn array_buffer_with(&self, hint: EncodingHint) -> Result<Vec<u8>, Error> {
        match self.raw_body() {
            Some(Body::Bytes(bytes)) => Ok(bytes.clone()),
            Some(Body::Blob(blob)) => Ok(blob.bytes().to_vec()),
            _ => Ok(encode_text(&self.text_with(hint)?, hint)),
        }
    }

    /// Body as a blob; only blob and byte payloads qualify
    fn blob(&self) -> Result<Blob, Error> {
        match self.raw_body() {
            Some(Body::Blob(blob)) => Ok(blob.clone()),
            Some(Body::Bytes(bytes)) => Ok(Blob::new(bytes.clone())),
            _ => Err(Error::InvalidBody(
                "The body isn't either a blob or an array buffer".to_string(),
            )),
        }
    }
}

impl BodyReader for Option<Body> {
    fn raw_body(&self) -> Option<&Body> {
        self.as_ref()
    }
}
