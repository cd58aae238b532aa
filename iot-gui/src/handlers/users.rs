use askama::Template;
use axum::extract::{Path, Query, State};
use iot_sdk::{Credentials, User};
use tracing::info;
use validator::Validate;

use crate::decode::{csv_file, rows, FormData, JsonBody, PageQuery, UserRow};
use crate::error::Error;
use crate::handlers::import_rows;
use crate::models::requests::{
    CreateUserRequest, UpdateEntityRequest, UpdateIdentityRequest, UpdateTagsRequest,
};
use crate::models::views::{self, EntityRow, Pager};
use crate::models::AuthToken;
use crate::response::UiResponse;
use crate::AppState;

#[derive(Template)]
#[template(path = "users.html")]
pub struct UsersTemplate {
    pub users: Vec<EntityRow>,
    pub pager: Pager,
}

#[derive(Template)]
#[template(path = "user.html")]
pub struct UserTemplate {
    pub user: EntityRow,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            name: row.name,
            credentials: Credentials {
                identity: row.identity,
                secret: row.secret,
            },
            ..Default::default()
        }
    }
}

pub async fn create_user(
    State(state): State<AppState>,
    token: AuthToken,
    form: FormData,
) -> Result<UiResponse, Error> {
    let req: CreateUserRequest = form.parse()?;
    let user = User {
        name: req.name,
        credentials: Credentials {
            identity: req.identity,
            secret: req.secret,
        },
        tags: form.json_field("tags")?.unwrap_or_default(),
        metadata: form.json_field("metadata")?,
        ..Default::default()
    };

    let user = state.users.create_user(&user, token.as_str()).await?;
    info!(user_id = %user.id, "user created");
    Ok(UiResponse::see_other("/users"))
}

/// One create call per row, in file order. Stops at the first failure;
/// users created before it are kept.
pub async fn create_users(
    State(state): State<AppState>,
    token: AuthToken,
    form: FormData,
) -> Result<UiResponse, Error> {
    let file = csv_file(&form, "usersFile")?;
    let users = &state.users;
    let token = token.as_str();

    let committed = import_rows(rows::<UserRow>(file)?, |row| async move {
        users.create_user(&User::from(row), token).await
    })
    .await?;

    info!(count = committed, "users imported");
    Ok(UiResponse::see_other("/users"))
}

pub async fn list_users(
    State(state): State<AppState>,
    token: AuthToken,
    Query(page): Query<PageQuery>,
) -> Result<UiResponse, Error> {
    let users = state
        .users
        .users(&page.page_metadata(), token.as_str())
        .await?;

    UiResponse::render(&UsersTemplate {
        users: views::rows(&users.items),
        pager: Pager::new(&page, &users),
    })
}

pub async fn view_user(
    State(state): State<AppState>,
    token: AuthToken,
    Path(id): Path<String>,
) -> Result<UiResponse, Error> {
    let user = state.users.user(&id, token.as_str()).await?;
    UiResponse::render(&UserTemplate {
        user: EntityRow::from(&user),
    })
}

pub async fn enable_user(
    State(state): State<AppState>,
    token: AuthToken,
    form: FormData,
) -> Result<UiResponse, Error> {
    let id = form.require("userID")?;
    state.users.enable_user(id, token.as_str()).await?;
    Ok(UiResponse::see_other("/users"))
}

pub async fn disable_user(
    State(state): State<AppState>,
    token: AuthToken,
    form: FormData,
) -> Result<UiResponse, Error> {
    let id = form.require("userID")?;
    state.users.disable_user(id, token.as_str()).await?;
    Ok(UiResponse::see_other("/users"))
}

pub async fn update_user(
    State(state): State<AppState>,
    token: AuthToken,
    Path(id): Path<String>,
    JsonBody(req): JsonBody<UpdateEntityRequest>,
) -> Result<UiResponse, Error> {
    let user = User {
        id,
        name: req.name,
        metadata: req.metadata,
        ..Default::default()
    };
    state.users.update_user(&user, token.as_str()).await?;
    Ok(UiResponse::empty())
}

pub async fn update_user_tags(
    State(state): State<AppState>,
    token: AuthToken,
    Path(id): Path<String>,
    JsonBody(req): JsonBody<UpdateTagsRequest>,
) -> Result<UiResponse, Error> {
    let user = User {
        id,
        tags: req.tags,
        ..Default::default()
    };
    state.users.update_user_tags(&user, token.as_str()).await?;
    Ok(UiResponse::empty())
}

pub async fn update_user_identity(
    State(state): State<AppState>,
    token: AuthToken,
    Path(id): Path<String>,
    JsonBody(req): JsonBody<UpdateIdentityRequest>,
) -> Result<UiResponse, Error> {
    req.validate()?;
    let user = User {
        id,
        credentials: Credentials {
            identity: req.identity,
            ..Default::default()
        },
        ..Default::default()
    };
    state.users.update_user_identity(&user, token.as_str()).await?;
    Ok(UiResponse::empty())
}
