//! Request bodies: JSON by default, multipart when a payload carries files.

use crate::error::ClientError;
use serde::Serialize;
use serde_json::Value;

/// A file to upload with a create/update payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Upload {
    pub file_name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn new(file_name: impl Into<String>, mime: impl Into<String>, bytes: Vec<u8>) -> Self {
        Upload {
            file_name: file_name.into(),
            mime: mime.into(),
            bytes,
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Anything a store can send as a request body.
///
/// File fields should be `#[serde(skip)]` and reported through `uploads`.
pub trait Payload: Serialize + Send + Sync {
    fn uploads(&self) -> Vec<(&'static str, &Upload)> {
        Vec::new()
    }
}

impl Payload for Value {}

#[derive(Clone, Debug, PartialEq)]
pub enum RequestBody {
    Empty,
    Json(Value),
    Multipart {
        fields: Vec<(String, String)>,
        files: Vec<(String, Upload)>,
    },
}

impl RequestBody {
    pub fn from_payload<P: Payload + ?Sized>(payload: &P) -> Result<Self, ClientError> {
        let value = serde_json::to_value(payload)?;
        let uploads = payload.uploads();
        if uploads.is_empty() {
            return Ok(RequestBody::Json(value));
        }
        let mut fields = Vec::new();
        if let Value::Object(map) = value {
            for (key, v) in map {
                push_form_value(&mut fields, &key, v);
            }
        }
        let files = uploads
            .into_iter()
            .map(|(name, upload)| (name.to_string(), upload.clone()))
            .collect();
        Ok(RequestBody::Multipart { fields, files })
    }

    /// Multipart forms are single-use, so one is rebuilt for every attempt.
    pub(crate) fn to_form(&self) -> Result<Option<reqwest::multipart::Form>, ClientError> {
        let RequestBody::Multipart { fields, files } = self else {
            return Ok(None);
        };
        let mut form = reqwest::multipart::Form::new();
        for (key, value) in fields {
            form = form.text(key.clone(), value.clone());
        }
        for (key, upload) in files {
            let part = reqwest::multipart::Part::bytes(upload.bytes.clone())
                .file_name(upload.file_name.clone())
                .mime_str(&upload.mime)?;
            form = form.part(key.clone(), part);
        }
        Ok(Some(form))
    }
}

fn push_form_value(fields: &mut Vec<(String, String)>, key: &str, value: Value) {
    match value {
        Value::Null => {}
        Value::String(s) => fields.push((key.to_string(), s)),
        Value::Bool(b) => fields.push((key.to_string(), b.to_string())),
        Value::Number(n) => fields.push((key.to_string(), n.to_string())),
        Value::Array(items) => {
            for item in items {
                push_form_value(fields, key, item);
            }
        }
        obj @ Value::Object(_) => fields.push((key.to_string(), obj.to_string())),
    }
}
