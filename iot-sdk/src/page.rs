//! Pagination and filtering shared by every list operation.

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::models::Metadata;

/// Filter and pagination parameters for list calls.
///
/// Only fields that differ from their zero value reach the wire.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageMetadata {
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub offset: u64,
    #[serde(default)]
    pub limit: u64,
    #[serde(default)]
    pub level: u64,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub metadata: Option<Metadata>,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub action: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub object: String,
    #[serde(default)]
    pub permission: String,
    #[serde(default)]
    pub tag: String,
    #[serde(default)]
    pub owner: String,
    #[serde(default)]
    pub shared_by: String,
    #[serde(default)]
    pub visibility: String,
    #[serde(default)]
    pub topic: String,
    #[serde(default)]
    pub contact: String,
    #[serde(default)]
    pub state: String,
}

impl PageMetadata {
    pub fn new(offset: u64, limit: u64) -> Self {
        Self {
            offset,
            limit,
            ..Default::default()
        }
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = status.into();
        self
    }

    /// Non-default fields as `(key, value)` pairs, sorted by key.
    ///
    /// The backend's reference client encodes its query with sorted keys, so
    /// the same order is reproduced here. Metadata travels as one JSON-encoded
    /// parameter.
    pub fn query_pairs(&self) -> Result<Vec<(&'static str, String)>, Error> {
        let mut pairs: Vec<(&'static str, String)> = Vec::new();

        let numbers = [
            ("offset", self.offset),
            ("limit", self.limit),
            ("total", self.total),
            ("level", self.level),
        ];
        pairs.extend(
            numbers
                .into_iter()
                .filter(|(_, v)| *v != 0)
                .map(|(k, v)| (k, v.to_string())),
        );

        let strings = [
            ("email", &self.email),
            ("name", &self.name),
            ("type", &self.kind),
            ("visibility", &self.visibility),
            ("status", &self.status),
        ];
        pairs.extend(
            strings
                .into_iter()
                .filter(|(_, v)| !v.is_empty())
                .map(|(k, v)| (k, v.clone())),
        );

        if let Some(metadata) = self.metadata.as_ref().filter(|m| !m.is_empty()) {
            let encoded = serde_json::to_string(metadata).map_err(Error::Encoding)?;
            pairs.push(("metadata", encoded));
        }

        let filters = [
            ("action", &self.action),
            ("subject", &self.subject),
            ("object", &self.object),
            ("permission", &self.permission),
            ("tag", &self.tag),
            ("owner", &self.owner),
            ("shared_by", &self.shared_by),
            ("topic", &self.topic),
            ("contact", &self.contact),
            ("state", &self.state),
        ];
        pairs.extend(
            filters
                .into_iter()
                .filter(|(_, v)| !v.is_empty())
                .map(|(k, v)| (k, v.clone())),
        );

        pairs.sort_by(|a, b| a.0.cmp(b.0));
        Ok(pairs)
    }

    /// Form-url-encoded query string (no leading `?`).
    pub fn query(&self) -> Result<String, Error> {
        let pairs = self.query_pairs()?;
        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        for (key, value) in &pairs {
            serializer.append_pair(key, value);
        }
        Ok(serializer.finish())
    }
}

/// One page of a list answer.
///
/// The backend names the collection after the resource (`users`, `things`,
/// ...); all of those land in `items`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    #[serde(
        default = "Vec::new",
        alias = "users",
        alias = "things",
        alias = "channels",
        alias = "groups",
        alias = "policies",
        alias = "messages",
        alias = "configs",
        alias = "subscriptions",
        alias = "members"
    )]
    pub items: Vec<T>,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub offset: u64,
    #[serde(default)]
    pub limit: u64,
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            total: 0,
            offset: 0,
            limit: 0,
        }
    }
}

impl<T> Page<T> {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
