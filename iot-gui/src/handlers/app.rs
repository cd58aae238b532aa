use askama::Template;
use axum::{
    extract::{Query, State},
    Json,
};
use iot_sdk::{HealthInfo, PageMetadata, Status};
use serde::Deserialize;

use crate::decode::PageQuery;
use crate::error::Error;
use crate::models::views::{rows, EntityRow, Pager};
use crate::models::AuthToken;
use crate::response::UiResponse;
use crate::AppState;

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub users: u64,
    pub things: u64,
    pub channels: u64,
    pub groups: u64,
}

#[derive(Template)]
#[template(path = "deleted.html")]
pub struct DeletedTemplate {
    pub entity: &'static str,
    pub items: Vec<EntityRow>,
    pub pager: Pager,
}

#[derive(Debug, Deserialize)]
pub struct DeletedQuery {
    #[serde(default)]
    pub entity: String,
}

/// Dashboard with one count per resource.
pub async fn index(
    State(state): State<AppState>,
    token: AuthToken,
) -> Result<UiResponse, Error> {
    let pm = PageMetadata::new(0, 1);
    let token = token.as_str();

    let template = IndexTemplate {
        users: state.users.users(&pm, token).await?.total,
        things: state.things.things(&pm, token).await?.total,
        channels: state.channels.channels(&pm, token).await?.total,
        groups: state.groups.groups(&pm, token).await?.total,
    };
    UiResponse::render(&template)
}

/// Disabled users, or disabled things with `?entity=things`.
pub async fn deleted(
    State(state): State<AppState>,
    token: AuthToken,
    Query(query): Query<DeletedQuery>,
    Query(page): Query<PageQuery>,
) -> Result<UiResponse, Error> {
    let pm = page.page_metadata().with_status(Status::Disabled.as_str());

    let (entity, items, pager) = if query.entity == "things" {
        let things = state.things.things(&pm, token.as_str()).await?;
        ("things", rows(&things.items), Pager::new(&page, &things))
    } else {
        let users = state.users.users(&pm, token.as_str()).await?;
        ("users", rows(&users.items), Pager::new(&page, &users))
    };

    UiResponse::render(&DeletedTemplate {
        entity,
        items,
        pager,
    })
}

pub async fn health_check() -> &'static str {
    "OK"
}

pub async fn version(State(state): State<AppState>) -> Json<HealthInfo> {
    Json(HealthInfo {
        status: "pass".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        description: "ui service".to_string(),
        instance_id: state.instance_id.clone(),
        ..Default::default()
    })
}
