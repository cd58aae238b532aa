use askama::Template;
use axum::extract::{Path, Query, State};
use iot_sdk::{Group, PageMetadata, UsersRelationRequest};
use tracing::info;

use crate::decode::{csv_file, rows, FormData, JsonBody, NameRow, PageQuery};
use crate::error::Error;
use crate::handlers::import_rows;
use crate::models::requests::{CreateContainerRequest, UpdateEntityRequest};
use crate::models::views::{self, EntityRow, Pager};
use crate::models::AuthToken;
use crate::response::{local_path, UiResponse};
use crate::AppState;

/// Relation used when the unassign form names none.
pub const DEFAULT_RELATION: &str = "member";

#[derive(Template)]
#[template(path = "groups.html")]
pub struct GroupsTemplate {
    pub groups: Vec<EntityRow>,
    pub pager: Pager,
}

#[derive(Template)]
#[template(path = "group.html")]
pub struct GroupTemplate {
    pub group: EntityRow,
    pub children: Vec<EntityRow>,
}

#[derive(Template)]
#[template(path = "members.html")]
pub struct MembersTemplate {
    pub group_id: String,
    pub members: Vec<EntityRow>,
    pub pager: Pager,
}

pub async fn create_group(
    State(state): State<AppState>,
    token: AuthToken,
    form: FormData,
) -> Result<UiResponse, Error> {
    let req: CreateContainerRequest = form.parse()?;
    let group = Group {
        name: req.name,
        description: req.description,
        parent_id: req.parent_id,
        metadata: form.json_field("metadata")?,
        ..Default::default()
    };

    let group = state.groups.create_group(&group, token.as_str()).await?;
    info!(group_id = %group.id, "group created");
    Ok(UiResponse::see_other("/groups"))
}

/// Row by row, like the users import.
pub async fn create_groups(
    State(state): State<AppState>,
    token: AuthToken,
    form: FormData,
) -> Result<UiResponse, Error> {
    let file = csv_file(&form, "groupsFile")?;
    let groups = &state.groups;
    let token = token.as_str();

    let committed = import_rows(rows::<NameRow>(file)?, |row| async move {
        let group = Group {
            name: row.name,
            ..Default::default()
        };
        groups.create_group(&group, token).await
    })
    .await?;

    info!(count = committed, "groups imported");
    Ok(UiResponse::see_other("/groups"))
}

pub async fn list_groups(
    State(state): State<AppState>,
    token: AuthToken,
    Query(page): Query<PageQuery>,
) -> Result<UiResponse, Error> {
    let groups = state
        .groups
        .groups(&page.page_metadata(), token.as_str())
        .await?;

    UiResponse::render(&GroupsTemplate {
        groups: views::rows(&groups.items),
        pager: Pager::new(&page, &groups),
    })
}

pub async fn view_group(
    State(state): State<AppState>,
    token: AuthToken,
    Path(id): Path<String>,
) -> Result<UiResponse, Error> {
    let group = state.groups.group(&id, token.as_str()).await?;
    let children = state
        .groups
        .children(&id, &PageMetadata::new(0, 100), token.as_str())
        .await?;

    UiResponse::render(&GroupTemplate {
        group: EntityRow::from(&group),
        children: views::rows(children.items.iter().filter(|g| g.id != id)),
    })
}

pub async fn enable_group(
    State(state): State<AppState>,
    token: AuthToken,
    form: FormData,
) -> Result<UiResponse, Error> {
    let id = form.require("groupID")?;
    state.groups.enable_group(id, token.as_str()).await?;
    Ok(UiResponse::see_other("/groups"))
}

pub async fn disable_group(
    State(state): State<AppState>,
    token: AuthToken,
    form: FormData,
) -> Result<UiResponse, Error> {
    let id = form.require("groupID")?;
    state.groups.disable_group(id, token.as_str()).await?;
    Ok(UiResponse::see_other("/groups"))
}

pub async fn update_group(
    State(state): State<AppState>,
    token: AuthToken,
    Path(id): Path<String>,
    JsonBody(req): JsonBody<UpdateEntityRequest>,
) -> Result<UiResponse, Error> {
    let group = Group {
        id,
        name: req.name,
        description: req.description,
        metadata: req.metadata,
        ..Default::default()
    };
    state.groups.update_group(&group, token.as_str()).await?;
    Ok(UiResponse::empty())
}

pub async fn list_members(
    State(state): State<AppState>,
    token: AuthToken,
    Path(id): Path<String>,
    Query(page): Query<PageQuery>,
) -> Result<UiResponse, Error> {
    let members = state
        .groups
        .list_group_users(&id, &page.page_metadata(), token.as_str())
        .await?;

    UiResponse::render(&MembersTemplate {
        group_id: id,
        members: views::rows(&members.items),
        pager: Pager::new(&page, &members),
    })
}

/// Add `memberID` under every relation listed in `Type`.
pub async fn assign(
    State(state): State<AppState>,
    token: AuthToken,
    Path(id): Path<String>,
    form: FormData,
) -> Result<UiResponse, Error> {
    let member_id = form.require("memberID")?;
    let relations: Vec<String> = form
        .get_all("Type")
        .into_iter()
        .filter(|r| !r.is_empty())
        .collect();
    if relations.is_empty() {
        return Err(Error::MalformedData("missing Type".into()));
    }

    for relation in relations {
        let req = UsersRelationRequest {
            relation,
            user_ids: vec![member_id.to_string()],
        };
        state
            .groups
            .add_users_to_group(&id, &req, token.as_str())
            .await?;
    }
    Ok(UiResponse::see_other(local_path(&["groups", id.as_str(), "members"], &[])?))
}

pub async fn unassign(
    State(state): State<AppState>,
    token: AuthToken,
    Path(id): Path<String>,
    form: FormData,
) -> Result<UiResponse, Error> {
    let relation = match form.get("Type") {
        "" => DEFAULT_RELATION,
        relation => relation,
    };
    let req = UsersRelationRequest {
        relation: relation.to_string(),
        user_ids: vec![form.require("memberID")?.to_string()],
    };
    state
        .groups
        .remove_users_from_group(&id, &req, token.as_str())
        .await?;
    Ok(UiResponse::see_other(local_path(&["groups", id.as_str(), "members"], &[])?))
}
