use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequest, Multipart, Request},
    http::header::CONTENT_TYPE,
};
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::error::Error;

/// A file part of a multipart submission.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub field: String,
    pub file_name: String,
    pub bytes: Bytes,
}

/// Submitted form, either `multipart/form-data` or url-encoded.
///
/// Field order and repeated keys are preserved.
#[derive(Debug, Clone, Default)]
pub struct FormData {
    fields: Vec<(String, String)>,
    files: Vec<UploadedFile>,
}

#[async_trait]
impl<S> FromRequest<S> for FormData
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_multipart = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("multipart/form-data"));

        if is_multipart {
            let multipart = Multipart::from_request(req, state)
                .await
                .map_err(|e| Error::MalformedData(e.body_text()))?;
            return Self::from_multipart(multipart).await;
        }

        let body = Bytes::from_request(req, state)
            .await
            .map_err(|e| Error::MalformedData(e.body_text()))?;
        Self::from_urlencoded(&body)
    }
}

impl FormData {
    pub fn from_urlencoded(body: &[u8]) -> Result<Self, Error> {
        let fields: Vec<(String, String)> = serde_urlencoded::from_bytes(body)
            .map_err(|e| Error::MalformedData(e.to_string()))?;
        Ok(Self {
            fields,
            files: Vec::new(),
        })
    }

    async fn from_multipart(mut multipart: Multipart) -> Result<Self, Error> {
        let mut form = Self::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| Error::MalformedData(e.body_text()))?
        {
            let name = field.name().unwrap_or_default().to_string();
            match field.file_name().map(str::to_string) {
                Some(file_name) => {
                    let bytes = field
                        .bytes()
                        .await
                        .map_err(|e| Error::MalformedData(e.body_text()))?;
                    form.files.push(UploadedFile {
                        field: name,
                        file_name,
                        bytes,
                    });
                }
                None => {
                    let value = field
                        .text()
                        .await
                        .map_err(|e| Error::MalformedData(e.body_text()))?;
                    form.fields.push((name, value));
                }
            }
        }

        Ok(form)
    }

    /// First value of `key`, or `""`.
    pub fn get(&self, key: &str) -> &str {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .unwrap_or_default()
    }

    /// Every value of a repeated key, in submission order.
    pub fn get_all(&self, key: &str) -> Vec<String> {
        self.fields
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
            .collect()
    }

    /// Non-empty value of `key`, or a malformed-data error naming it.
    pub fn require(&self, key: &str) -> Result<&str, Error> {
        match self.get(key) {
            "" => Err(Error::MalformedData(format!("missing {key}"))),
            value => Ok(value),
        }
    }

    #[cfg(test)]
    pub(crate) fn push_file(&mut self, file: UploadedFile) {
        self.files.push(file);
    }

    pub fn file(&self, field: &str) -> Option<&UploadedFile> {
        self.files.iter().find(|f| f.field == field)
    }

    /// JSON-encoded sub-field. Empty means absent.
    pub fn json_field<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, Error> {
        let raw = self.get(key).trim();
        if raw.is_empty() {
            return Ok(None);
        }
        serde_json::from_str(raw)
            .map(Some)
            .map_err(|e| Error::MalformedData(format!("{key}: {e}")))
    }

    /// Action list given either as repeated fields or as one JSON array.
    pub fn actions(&self) -> Result<Vec<String>, Error> {
        let values = self.get_all("actions");
        match values.as_slice() {
            [single] if single.trim_start().starts_with('[') => {
                Ok(self.json_field("actions")?.unwrap_or_default())
            }
            _ => Ok(values.into_iter().filter(|v| !v.is_empty()).collect()),
        }
    }

    /// Deserialize the scalar fields into `T` and validate it.
    ///
    /// Only the first value of a repeated key takes part.
    pub fn parse<T: DeserializeOwned + Validate>(&self) -> Result<T, Error> {
        let mut first: Vec<(&str, &str)> = Vec::with_capacity(self.fields.len());
        for (k, v) in &self.fields {
            if !first.iter().any(|(seen, _)| *seen == k.as_str()) {
                first.push((k.as_str(), v.as_str()));
            }
        }

        let encoded =
            serde_urlencoded::to_string(&first).map_err(|e| Error::MalformedData(e.to_string()))?;
        let value: T =
            serde_urlencoded::from_str(&encoded).map_err(|e| Error::MalformedData(e.to_string()))?;
        value.validate()?;
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize, Validate)]
    struct Login {
        #[validate(length(min = 1))]
        username: String,
        #[serde(default)]
        password: String,
    }

    #[test]
    fn repeated_keys_are_kept() {
        let form = FormData::from_urlencoded(b"actions=m_read&actions=m_write&object=c1").unwrap();
        assert_eq!(form.get_all("actions"), vec!["m_read", "m_write"]);
        assert_eq!(form.get("actions"), "m_read");
        assert_eq!(form.get("missing"), "");
    }

    #[test]
    fn actions_accept_json_array() {
        let form = FormData::from_urlencoded(b"actions=%5B%22m_read%22%5D").unwrap();
        assert_eq!(form.actions().unwrap(), vec!["m_read"]);
    }

    #[test]
    fn json_field_empty_is_absent_and_invalid_is_malformed() {
        let form = FormData::from_urlencoded(b"metadata=&tags=%5Bbroken").unwrap();
        assert!(form
            .json_field::<serde_json::Value>("metadata")
            .unwrap()
            .is_none());
        assert!(matches!(
            form.json_field::<Vec<String>>("tags"),
            Err(Error::MalformedData(_))
        ));
    }

    #[test]
    fn parse_validates() {
        let form = FormData::from_urlencoded(b"username=alice&password=pw").unwrap();
        let login: Login = form.parse().unwrap();
        assert_eq!(login.username, "alice");
        assert_eq!(login.password, "pw");

        let form = FormData::from_urlencoded(b"username=&password=pw").unwrap();
        assert!(matches!(
            form.parse::<Login>(),
            Err(Error::MalformedData(_))
        ));
    }
}
