use askama::Template;
use axum::extract::{Query, State};
use iot_sdk::{thing_token, Message, Page};
use serde::Deserialize;
use tracing::info;

use crate::decode::{FormData, PageQuery};
use crate::error::Error;
use crate::models::requests::{PublishRequest, ReadMessagesRequest};
use crate::models::views::{MessageRow, Pager};
use crate::models::AuthToken;
use crate::response::{local_path, UiResponse};
use crate::AppState;

const WILDCARDS: &[char] = &['*', '>', '#', '+'];

#[derive(Template)]
#[template(path = "messages.html")]
pub struct MessagesTemplate {
    pub channel_id: String,
    pub messages: Vec<MessageRow>,
    pub pager: Pager,
}

#[derive(Debug, Default, Deserialize)]
pub struct ReadQuery {
    #[serde(default, rename = "channelID")]
    pub channel_id: String,
}

/// Channel name the publisher expects: `chan.a.b` for subtopic `a/b`.
///
/// A subtopic with an empty segment or a wildcard is rejected.
pub fn channel_name(channel_id: &str, subtopic: &str) -> Result<String, Error> {
    let subtopic = subtopic.trim().trim_matches('/');
    if subtopic.is_empty() {
        return Ok(channel_id.to_string());
    }

    let mut name = channel_id.to_string();
    for segment in subtopic.split(['/', '.']) {
        if segment.is_empty() || segment.contains(WILDCARDS) {
            return Err(Error::MalformedSubtopic);
        }
        name.push('.');
        name.push_str(segment);
    }
    Ok(name)
}

fn render(
    channel_id: String,
    page: &PageQuery,
    messages: &Page<Message>,
) -> Result<UiResponse, Error> {
    UiResponse::render(&MessagesTemplate {
        channel_id,
        messages: messages.items.iter().map(MessageRow::from).collect(),
        pager: Pager::new(page, messages),
    })
}

pub async fn publish(
    State(state): State<AppState>,
    _token: AuthToken,
    form: FormData,
) -> Result<UiResponse, Error> {
    let req: PublishRequest = form.parse()?;
    let chan_name = channel_name(&req.channel_id, &req.subtopic)?;

    state
        .messages
        .send_message(&chan_name, &req.message, &req.thing_key)
        .await?;
    info!(channel_id = %req.channel_id, "message published");

    Ok(UiResponse::see_other(local_path(
        &["readmessages"],
        &[("channelID", req.channel_id.as_str())],
    )?))
}

/// Messages of `?channelID=`, read with the user's own token.
pub async fn read_messages(
    State(state): State<AppState>,
    token: AuthToken,
    Query(query): Query<ReadQuery>,
    Query(page): Query<PageQuery>,
) -> Result<UiResponse, Error> {
    if query.channel_id.is_empty() {
        return render(String::new(), &page, &Page::default());
    }

    let messages = state
        .messages
        .read_messages(&query.channel_id, &page.page_metadata(), token.as_str())
        .await?;
    render(query.channel_id, &page, &messages)
}

/// Messages of the form's channel, read with a thing key.
pub async fn read_messages_as_thing(
    State(state): State<AppState>,
    _token: AuthToken,
    Query(page): Query<PageQuery>,
    form: FormData,
) -> Result<UiResponse, Error> {
    let req: ReadMessagesRequest = form.parse()?;

    let messages = state
        .messages
        .read_messages(&req.chan_id, &page.page_metadata(), &thing_token(&req.thing_key))
        .await?;
    render(req.chan_id, &page, &messages)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subtopic_segments_join_with_dots() {
        assert_eq!(channel_name("c1", "").unwrap(), "c1");
        assert_eq!(channel_name("c1", "room/temp").unwrap(), "c1.room.temp");
        assert_eq!(channel_name("c1", "/room/").unwrap(), "c1.room");
    }

    #[test]
    fn wildcards_and_empty_segments_are_malformed() {
        for bad in ["room/*", "room//temp", "a.>", "#", "x+y"] {
            assert!(
                matches!(channel_name("c1", bad), Err(Error::MalformedSubtopic)),
                "{bad}"
            );
        }
    }
}
