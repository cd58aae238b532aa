//! Typed request payloads decoded from forms and JSON bodies.

use iot_sdk::Metadata;
use serde::Deserialize;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct TokenRequest {
    #[validate(length(min = 1))]
    pub username: String,
    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct PasswordUpdateRequest {
    #[validate(length(min = 1))]
    pub oldpass: String,
    #[validate(length(min = 1))]
    pub newpass: String,
}

/// Scalar fields of the user creation form; `tags` and `metadata` are JSON
/// sub-fields read separately.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[serde(default)]
    pub name: String,
    #[validate(length(min = 1))]
    pub identity: String,
    #[validate(length(min = 1))]
    pub secret: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateThingRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "thingID")]
    pub id: String,
    #[serde(default)]
    pub identity: String,
    #[serde(default)]
    pub secret: String,
}

/// Channels and groups share one creation form.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateContainerRequest {
    #[validate(length(min = 1))]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, rename = "parentID")]
    pub parent_id: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct PublishRequest {
    #[serde(rename = "channelID")]
    #[validate(length(min = 1))]
    pub channel_id: String,
    #[serde(default)]
    pub subtopic: String,
    #[serde(default)]
    pub message: String,
    #[serde(rename = "thingKey")]
    #[validate(length(min = 1))]
    pub thing_key: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ReadMessagesRequest {
    #[serde(rename = "chanID")]
    #[validate(length(min = 1))]
    pub chan_id: String,
    #[serde(rename = "thingKey")]
    #[validate(length(min = 1))]
    pub thing_key: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ConnectionRequest {
    #[serde(rename = "channelID")]
    #[validate(length(min = 1))]
    pub channel_id: String,
    #[serde(rename = "thingID")]
    #[validate(length(min = 1))]
    pub thing_id: String,
}

// JSON bodies of the in-place edit endpoints.

#[derive(Debug, Default, Deserialize)]
pub struct UpdateEntityRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub metadata: Option<Metadata>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateTagsRequest {
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateIdentityRequest {
    #[validate(length(min = 1))]
    pub identity: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateSecretRequest {
    #[validate(length(min = 1))]
    pub secret: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateOwnerRequest {
    #[validate(length(min = 1))]
    pub owner: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn publish_request_needs_channel_and_key() {
        let req: PublishRequest =
            serde_json::from_str(r#"{"channelID":"","thingKey":"k"}"#).unwrap();
        assert!(req.validate().is_err());

        let req: PublishRequest =
            serde_json::from_str(r#"{"channelID":"c","thingKey":"k","message":"[]"}"#).unwrap();
        assert!(req.validate().is_ok());
        assert!(req.subtopic.is_empty());
    }

    #[test]
    fn update_entity_fields_are_optional() {
        let req: UpdateEntityRequest = serde_json::from_str(r#"{"name":"n"}"#).unwrap();
        assert_eq!(req.name, "n");
        assert!(req.metadata.is_none());
    }
}
