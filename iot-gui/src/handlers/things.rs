use askama::Template;
use axum::extract::{Path, Query, State};
use iot_sdk::{Connection, Credentials, Thing};
use tracing::info;
use validator::Validate;

use crate::decode::{collect_rows, csv_file, FormData, JsonBody, NameRow, PageQuery};
use crate::error::Error;
use crate::models::requests::{
    ConnectionRequest, CreateThingRequest, UpdateEntityRequest, UpdateOwnerRequest,
    UpdateSecretRequest, UpdateTagsRequest,
};
use crate::models::views::{rows, EntityRow, Pager};
use crate::models::AuthToken;
use crate::response::{local_path, UiResponse};
use crate::AppState;

#[derive(Template)]
#[template(path = "things.html")]
pub struct ThingsTemplate {
    pub things: Vec<EntityRow>,
    pub pager: Pager,
}

#[derive(Template)]
#[template(path = "thing.html")]
pub struct ThingTemplate {
    pub thing: EntityRow,
}

/// Either side of a thing/channel connection listing.
#[derive(Template)]
#[template(path = "connections.html")]
pub struct ConnectionsTemplate {
    /// `"thing"` when listing a thing's channels, `"channel"` otherwise.
    pub owner_kind: &'static str,
    pub owner_id: String,
    pub items: Vec<EntityRow>,
    pub pager: Pager,
}

pub async fn create_thing(
    State(state): State<AppState>,
    token: AuthToken,
    form: FormData,
) -> Result<UiResponse, Error> {
    let req: CreateThingRequest = form.parse()?;
    let thing = Thing {
        id: req.id,
        name: req.name,
        credentials: Credentials {
            identity: req.identity,
            secret: req.secret,
        },
        tags: form.json_field("tags")?.unwrap_or_default(),
        metadata: form.json_field("metadata")?,
        ..Default::default()
    };

    let thing = state.things.create_thing(&thing, token.as_str()).await?;
    info!(thing_id = %thing.id, "thing created");
    Ok(UiResponse::see_other("/things"))
}

/// The whole file is decoded before the single bulk call.
pub async fn create_things(
    State(state): State<AppState>,
    token: AuthToken,
    form: FormData,
) -> Result<UiResponse, Error> {
    let file = csv_file(&form, "thingsFile")?;
    let things: Vec<Thing> = collect_rows::<NameRow>(file)?
        .into_iter()
        .map(|row| Thing {
            name: row.name,
            ..Default::default()
        })
        .collect();

    let created = state.things.create_things(&things, token.as_str()).await?;
    info!(count = created.len(), "things imported");
    Ok(UiResponse::see_other("/things"))
}

pub async fn list_things(
    State(state): State<AppState>,
    token: AuthToken,
    Query(page): Query<PageQuery>,
) -> Result<UiResponse, Error> {
    let things = state
        .things
        .things(&page.page_metadata(), token.as_str())
        .await?;

    UiResponse::render(&ThingsTemplate {
        things: rows(&things.items),
        pager: Pager::new(&page, &things),
    })
}

pub async fn view_thing(
    State(state): State<AppState>,
    token: AuthToken,
    Path(id): Path<String>,
) -> Result<UiResponse, Error> {
    let thing = state.things.thing(&id, token.as_str()).await?;
    UiResponse::render(&ThingTemplate {
        thing: EntityRow::from(&thing),
    })
}

pub async fn enable_thing(
    State(state): State<AppState>,
    token: AuthToken,
    form: FormData,
) -> Result<UiResponse, Error> {
    let id = form.require("thingID")?;
    state.things.enable_thing(id, token.as_str()).await?;
    Ok(UiResponse::see_other("/things"))
}

pub async fn disable_thing(
    State(state): State<AppState>,
    token: AuthToken,
    form: FormData,
) -> Result<UiResponse, Error> {
    let id = form.require("thingID")?;
    state.things.disable_thing(id, token.as_str()).await?;
    Ok(UiResponse::see_other("/things"))
}

pub async fn update_thing(
    State(state): State<AppState>,
    token: AuthToken,
    Path(id): Path<String>,
    JsonBody(req): JsonBody<UpdateEntityRequest>,
) -> Result<UiResponse, Error> {
    let thing = Thing {
        id,
        name: req.name,
        metadata: req.metadata,
        ..Default::default()
    };
    state.things.update_thing(&thing, token.as_str()).await?;
    Ok(UiResponse::empty())
}

pub async fn update_thing_tags(
    State(state): State<AppState>,
    token: AuthToken,
    Path(id): Path<String>,
    JsonBody(req): JsonBody<UpdateTagsRequest>,
) -> Result<UiResponse, Error> {
    let thing = Thing {
        id,
        tags: req.tags,
        ..Default::default()
    };
    state.things.update_thing_tags(&thing, token.as_str()).await?;
    Ok(UiResponse::empty())
}

pub async fn update_thing_secret(
    State(state): State<AppState>,
    token: AuthToken,
    Path(id): Path<String>,
    JsonBody(req): JsonBody<UpdateSecretRequest>,
) -> Result<UiResponse, Error> {
    req.validate()?;
    state
        .things
        .update_thing_secret(&id, &req.secret, token.as_str())
        .await?;
    Ok(UiResponse::empty())
}

pub async fn update_thing_owner(
    State(state): State<AppState>,
    token: AuthToken,
    Path(id): Path<String>,
    JsonBody(req): JsonBody<UpdateOwnerRequest>,
) -> Result<UiResponse, Error> {
    req.validate()?;
    let thing = Thing {
        id,
        owner: req.owner,
        ..Default::default()
    };
    state.things.update_thing_owner(&thing, token.as_str()).await?;
    Ok(UiResponse::empty())
}

/// Channels the thing is connected to.
pub async fn list_thing_channels(
    State(state): State<AppState>,
    token: AuthToken,
    Path(id): Path<String>,
    Query(page): Query<PageQuery>,
) -> Result<UiResponse, Error> {
    let channels = state
        .channels
        .channels_by_thing(&id, &page.page_metadata(), token.as_str())
        .await?;

    UiResponse::render(&ConnectionsTemplate {
        owner_kind: "thing",
        owner_id: id,
        items: rows(&channels.items),
        pager: Pager::new(&page, &channels),
    })
}

/// Connect this thing to the channel named in the form.
pub async fn connect_channel(
    State(state): State<AppState>,
    token: AuthToken,
    Path(id): Path<String>,
    form: FormData,
) -> Result<UiResponse, Error> {
    let channel_id = form.require("channelID")?;
    let conn = Connection::pair(channel_id, id.as_str()).with_actions(form.actions()?);
    state.policies.connect(&conn, token.as_str()).await?;
    Ok(UiResponse::see_other(local_path(&["things", id.as_str(), "channels"], &[])?))
}

pub async fn disconnect_channel(
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
        &["things", req.thing_id.as_str(), "channels"],
        &[],
    )?))
}
