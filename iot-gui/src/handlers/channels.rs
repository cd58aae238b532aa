use askama::Template;
use axum::extract::{Path, Query, State};
use iot_sdk::{Channel, Connection, Policy};
use tracing::info;

use super::things::ConnectionsTemplate;
use crate::decode::{collect_rows, csv_file, FormData, JsonBody, NameRow, PageQuery, ThingIdRow};
use crate::error::Error;
use crate::models::requests::{ConnectionRequest, CreateContainerRequest, UpdateEntityRequest};
use crate::models::views::{rows, EntityRow, Pager};
use crate::models::AuthToken;
use crate::response::{local_path, UiResponse};
use crate::AppState;

#[derive(Template)]
#[template(path = "channels.html")]
pub struct ChannelsTemplate {
    pub channels: Vec<EntityRow>,
    pub pager: Pager,
}

#[derive(Template)]
#[template(path = "channel.html")]
pub struct ChannelTemplate {
    pub channel: EntityRow,
}

pub async fn create_channel(
    State(state): State<AppState>,
    token: AuthToken,
    form: FormData,
) -> Result<UiResponse, Error> {
    let req: CreateContainerRequest = form.parse()?;
    let channel = Channel {
        name: req.name,
        description: req.description,
        parent_id: req.parent_id,
        metadata: form.json_field("metadata")?,
        ..Default::default()
    };

    let channel = state.channels.create_channel(&channel, token.as_str()).await?;
    info!(channel_id = %channel.id, "channel created");
    Ok(UiResponse::see_other("/channels"))
}

pub async fn create_channels(
    State(state): State<AppState>,
    token: AuthToken,
    form: FormData,
) -> Result<UiResponse, Error> {
    let file = csv_file(&form, "channelsFile")?;
    let channels: Vec<Channel> = collect_rows::<NameRow>(file)?
        .into_iter()
        .map(|row| Channel {
            name: row.name,
            ..Default::default()
        })
        .collect();

    let created = state
        .channels
        .create_channels(&channels, token.as_str())
        .await?;
    info!(count = created.len(), "channels imported");
    Ok(UiResponse::see_other("/channels"))
}

pub async fn list_channels(
    State(state): State<AppState>,
    token: AuthToken,
    Query(page): Query<PageQuery>,
) -> Result<UiResponse, Error> {
    let channels = state
        .channels
        .channels(&page.page_metadata(), token.as_str())
        .await?;

    UiResponse::render(&ChannelsTemplate {
        channels: rows(&channels.items),
        pager: Pager::new(&page, &channels),
    })
}

pub async fn view_channel(
    State(state): State<AppState>,
    token: AuthToken,
    Path(id): Path<String>,
) -> Result<UiResponse, Error> {
    let channel = state.channels.channel(&id, token.as_str()).await?;
    UiResponse::render(&ChannelTemplate {
        channel: EntityRow::from(&channel),
    })
}

pub async fn enable_channel(
    State(state): State<AppState>,
    token: AuthToken,
    form: FormData,
) -> Result<UiResponse, Error> {
    let id = form.require("channelID")?;
    state.channels.enable_channel(id, token.as_str()).await?;
    Ok(UiResponse::see_other("/channels"))
}

pub async fn disable_channel(
    State(state): State<AppState>,
    token: AuthToken,
    form: FormData,
) -> Result<UiResponse, Error> {
    let id = form.require("channelID")?;
    state.channels.disable_channel(id, token.as_str()).await?;
    Ok(UiResponse::see_other("/channels"))
}

pub async fn update_channel(
    State(state): State<AppState>,
    token: AuthToken,
    Path(id): Path<String>,
    JsonBody(req): JsonBody<UpdateEntityRequest>,
) -> Result<UiResponse, Error> {
    let channel = Channel {
        id,
        name: req.name,
        description: req.description,
        metadata: req.metadata,
        ..Default::default()
    };
    state.channels.update_channel(&channel, token.as_str()).await?;
    Ok(UiResponse::empty())
}

/// Things connected to the channel.
pub async fn list_channel_things(
    State(state): State<AppState>,
    token: AuthToken,
    Path(id): Path<String>,
    Query(page): Query<PageQuery>,
) -> Result<UiResponse, Error> {
    let things = state
        .things
        .things_by_channel(&id, &page.page_metadata(), token.as_str())
        .await?;

    UiResponse::render(&ConnectionsTemplate {
        owner_kind: "channel",
        owner_id: id,
        items: rows(&things.items),
        pager: Pager::new(&page, &things),
    })
}

/// One connect call for the single thing named in the form.
pub async fn connect_thing(
    State(state): State<AppState>,
    token: AuthToken,
    Path(id): Path<String>,
    form: FormData,
) -> Result<UiResponse, Error> {
    let thing_id = form.require("thingID")?;
    let conn = Connection::pair(id.as_str(), thing_id).with_actions(form.actions()?);
    state.policies.connect(&conn, token.as_str()).await?;
    Ok(UiResponse::see_other(local_path(&["channels", id.as_str(), "things"], &[])?))
}

/// Grant a user the listed actions on this channel.
pub async fn share_thing(
    State(state): State<AppState>,
    token: AuthToken,
    Path(id): Path<String>,
    form: FormData,
) -> Result<UiResponse, Error> {
    let policy = Policy {
        subject: form.require("userID")?.to_string(),
        object: id.clone(),
        actions: form.actions()?,
        ..Default::default()
    };
    state.policies.create_user_policy(&policy, token.as_str()).await?;
    Ok(UiResponse::see_other(local_path(&["channels", id.as_str(), "things"], &[])?))
}

pub async fn disconnect_thing(
    State(state): State<AppState>,
    token: AuthToken,
    form: FormData,
) -> Result<UiResponse, Error> {
    let req: ConnectionRequest = form.parse()?;
    state
        .policies
        .disconnect_thing(&req.thing_id, &req.channel_id, token.as_str())
        .await?;
    Ok(UiResponse::see_other(local_path(
        &["channels", req.channel_id.as_str(), "things"],
        &[],
    )?))
}

/// Thing ids from `thingsFile`, each paired with the `chanID` channel.
fn csv_connection(form: &FormData) -> Result<(String, Connection), Error> {
    let chan_id = form.require("chanID")?.to_string();
    let file = csv_file(form, "thingsFile")?;
    let thing_ids: Vec<String> = collect_rows::<ThingIdRow>(file)?
        .into_iter()
        .map(|row| row.thing_id)
        .collect();

    let conn = Connection {
        channel_ids: vec![chan_id.clone(); thing_ids.len()],
        thing_ids,
        actions: Vec::new(),
    };
    Ok((chan_id, conn))
}

pub async fn connect(
    State(state): State<AppState>,
    token: AuthToken,
    form: FormData,
) -> Result<UiResponse, Error> {
    let (chan_id, conn) = csv_connection(&form)?;
    state.policies.connect(&conn, token.as_str()).await?;
    info!(channel_id = %chan_id, count = conn.thing_ids.len(), "things connected");
    Ok(UiResponse::see_other(local_path(&["channels", chan_id.as_str(), "things"], &[])?))
}

pub async fn disconnect(
    State(state): State<AppState>,
    token: AuthToken,
    form: FormData,
) -> Result<UiResponse, Error> {
    let (chan_id, conn) = csv_connection(&form)?;
    state.policies.disconnect(&conn, token.as_str()).await?;
    info!(channel_id = %chan_id, count = conn.thing_ids.len(), "things disconnected");
    Ok(UiResponse::see_other(local_path(&["channels", chan_id.as_str(), "things"], &[])?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::UploadedFile;

    #[test]
    fn csv_connection_repeats_the_channel() {
        let mut form = FormData::from_urlencoded(b"chanID=c1").unwrap();
        form.push_file(UploadedFile {
            field: "thingsFile".into(),
            file_name: "things.csv".into(),
            bytes: "t1\nt2\n".into(),
        });

        let (chan_id, conn) = csv_connection(&form).unwrap();
        assert_eq!(chan_id, "c1");
        assert_eq!(conn.channel_ids, vec!["c1", "c1"]);
        assert_eq!(conn.thing_ids, vec!["t1", "t2"]);
    }

    #[test]
    fn csv_connection_needs_a_channel() {
        let form = FormData::default();
        assert!(matches!(
            csv_connection(&form),
            Err(Error::MalformedData(_))
        ));
    }
}
