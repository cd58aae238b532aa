//! Flat rows handed to templates.

use iot_sdk::{Channel, Group, Message, Metadata, Page, Policy, Status, Thing, User};

use crate::decode::PageQuery;

/// One user, thing, channel or group in a table or detail view.
#[derive(Debug, Clone, Default)]
pub struct EntityRow {
    pub id: String,
    pub name: String,
    /// Identity for users, description for channels and groups.
    pub detail: String,
    /// Thing key; empty for everything else.
    pub secret: String,
    pub owner: String,
    pub parent_id: String,
    pub status: String,
    pub tags: String,
    pub metadata: String,
}

fn status_label(status: Option<Status>) -> String {
    status.unwrap_or_default().to_string()
}

fn metadata_json(metadata: &Option<Metadata>) -> String {
    match metadata {
        Some(m) if !m.is_empty() => serde_json::to_string(m).unwrap_or_default(),
        _ => String::new(),
    }
}

fn tags_json(tags: &[String]) -> String {
    if tags.is_empty() {
        return String::new();
    }
    serde_json::to_string(tags).unwrap_or_default()
}

impl From<&User> for EntityRow {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            name: user.name.clone(),
            detail: user.credentials.identity.clone(),
            owner: user.owner.clone(),
            status: status_label(user.status),
            tags: tags_json(&user.tags),
            metadata: metadata_json(&user.metadata),
            ..Default::default()
        }
    }
}

impl From<&Thing> for EntityRow {
    fn from(thing: &Thing) -> Self {
        Self {
            id: thing.id.clone(),
            name: thing.name.clone(),
            detail: thing.credentials.identity.clone(),
            secret: thing.credentials.secret.clone(),
            owner: thing.owner.clone(),
            status: status_label(thing.status),
            tags: tags_json(&thing.tags),
            metadata: metadata_json(&thing.metadata),
            ..Default::default()
        }
    }
}

impl From<&Channel> for EntityRow {
    fn from(channel: &Channel) -> Self {
        Self {
            id: channel.id.clone(),
            name: channel.name.clone(),
            detail: channel.description.clone(),
            owner: channel.owner_id.clone(),
            parent_id: channel.parent_id.clone(),
            status: status_label(channel.status),
            metadata: metadata_json(&channel.metadata),
            ..Default::default()
        }
    }
}

impl From<&Group> for EntityRow {
    fn from(group: &Group) -> Self {
        Self {
            id: group.id.clone(),
            name: group.name.clone(),
            detail: group.description.clone(),
            owner: group.owner_id.clone(),
            parent_id: group.parent_id.clone(),
            status: status_label(group.status),
            metadata: metadata_json(&group.metadata),
            ..Default::default()
        }
    }
}

pub fn rows<'a, T: 'a>(items: impl IntoIterator<Item = &'a T>) -> Vec<EntityRow>
where
    EntityRow: From<&'a T>,
{
    items.into_iter().map(EntityRow::from).collect()
}

#[derive(Debug, Clone)]
pub struct PolicyRow {
    pub subject: String,
    pub object: String,
    pub actions: String,
    /// The action list as JSON, for the edit form.
    pub actions_json: String,
}

impl From<&Policy> for PolicyRow {
    fn from(policy: &Policy) -> Self {
        Self {
            subject: policy.subject.clone(),
            object: policy.object.clone(),
            actions: policy.actions.join(", "),
            actions_json: serde_json::to_string(&policy.actions).unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MessageRow {
    pub subtopic: String,
    pub publisher: String,
    pub protocol: String,
    pub name: String,
    pub unit: String,
    pub time: String,
    pub value: String,
}

impl From<&Message> for MessageRow {
    fn from(msg: &Message) -> Self {
        Self {
            subtopic: msg.subtopic.clone(),
            publisher: msg.publisher.clone(),
            protocol: msg.protocol.clone(),
            name: msg.name.clone(),
            unit: msg.unit.clone(),
            time: msg.time.to_string(),
            value: msg.display_value(),
        }
    }
}

/// Previous/next links for a list page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Pager {
    pub offset: u64,
    pub limit: u64,
    pub total: u64,
    pub has_prev: bool,
    pub prev_offset: u64,
    pub has_next: bool,
    pub next_offset: u64,
}

impl Pager {
    pub fn new<T>(query: &PageQuery, page: &Page<T>) -> Self {
        let offset = query.offset();
        let limit = query.limit();
        let total = page.total;
        Self {
            offset,
            limit,
            total,
            has_prev: offset > 0,
            prev_offset: offset.saturating_sub(limit),
            has_next: offset + limit < total,
            next_offset: offset + limit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use iot_sdk::Credentials;

    #[test]
    fn thing_row_carries_key_and_json_fields() {
        let mut metadata = Metadata::new();
        metadata.insert("site".into(), "lab".into());
        let thing = Thing {
            id: "t1".into(),
            name: "sensor".into(),
            credentials: Credentials {
                identity: "sensor".into(),
                secret: "key-1".into(),
            },
            tags: vec!["a".into()],
            metadata: Some(metadata),
            status: Some(Status::Disabled),
            ..Default::default()
        };

        let row = EntityRow::from(&thing);
        assert_eq!(row.secret, "key-1");
        assert_eq!(row.tags, r#"["a"]"#);
        assert_eq!(row.metadata, r#"{"site":"lab"}"#);
        assert_eq!(row.status, "disabled");
    }

    #[test]
    fn pager_bounds() {
        let page: Page<Thing> = Page {
            items: Vec::new(),
            total: 25,
            offset: 10,
            limit: 10,
        };
        let query = PageQuery {
            offset: Some(10),
            limit: Some(10),
        };

        let pager = Pager::new(&query, &page);
        assert!(pager.has_prev && pager.has_next);
        assert_eq!((pager.prev_offset, pager.next_offset), (0, 20));

        let last = PageQuery {
            offset: Some(20),
            limit: Some(10),
        };
        assert!(!Pager::new(&last, &page).has_next);
    }
}
