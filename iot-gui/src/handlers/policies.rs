use askama::Template;
use axum::extract::{Query, State};
use iot_sdk::{Connection, Policy};

use crate::decode::{FormData, PageQuery};
use crate::error::Error;
use crate::models::views::{Pager, PolicyRow};
use crate::models::AuthToken;
use crate::response::UiResponse;
use crate::AppState;

const USER_POLICIES: &str = "/policies";
const THING_POLICIES: &str = "/things_policies";

/// User policies and thing policies share one table; `base` is the route
/// prefix the forms post to.
#[derive(Template)]
#[template(path = "policies.html")]
pub struct PoliciesTemplate {
    pub base: &'static str,
    pub policies: Vec<PolicyRow>,
    pub pager: Pager,
}

fn policy_from_form(form: &FormData, actions: Vec<String>) -> Result<Policy, Error> {
    Ok(Policy {
        subject: form.require("subject")?.to_string(),
        object: form.require("object")?.to_string(),
        actions,
        ..Default::default()
    })
}

/// `subject` is the thing, `object` the channel.
fn connection_from_form(form: &FormData) -> Result<Connection, Error> {
    Ok(Connection::pair(form.require("object")?, form.require("subject")?)
        .with_actions(form.actions()?))
}

pub async fn list_user_policies(
    State(state): State<AppState>,
    token: AuthToken,
    Query(page): Query<PageQuery>,
) -> Result<UiResponse, Error> {
    let policies = state
        .policies
        .list_user_policies(&page.page_metadata(), token.as_str())
        .await?;

    UiResponse::render(&PoliciesTemplate {
        base: USER_POLICIES,
        policies: policies.items.iter().map(PolicyRow::from).collect(),
        pager: Pager::new(&page, &policies),
    })
}

pub async fn add_user_policy(
    State(state): State<AppState>,
    token: AuthToken,
    form: FormData,
) -> Result<UiResponse, Error> {
    let policy = policy_from_form(&form, form.actions()?)?;
    state
        .policies
        .create_user_policy(&policy, token.as_str())
        .await?;
    Ok(UiResponse::see_other(USER_POLICIES))
}

pub async fn update_user_policy(
    State(state): State<AppState>,
    token: AuthToken,
    form: FormData,
) -> Result<UiResponse, Error> {
    let policy = policy_from_form(&form, form.actions()?)?;
    state
        .policies
        .update_user_policy(&policy, token.as_str())
        .await?;
    Ok(UiResponse::see_other(USER_POLICIES))
}

pub async fn delete_user_policy(
    State(state): State<AppState>,
    token: AuthToken,
    form: FormData,
) -> Result<UiResponse, Error> {
    let policy = policy_from_form(&form, Vec::new())?;
    state
        .policies
        .delete_user_policy(&policy, token.as_str())
        .await?;
    Ok(UiResponse::see_other(USER_POLICIES))
}

pub async fn list_thing_policies(
    State(state): State<AppState>,
    token: AuthToken,
    Query(page): Query<PageQuery>,
) -> Result<UiResponse, Error> {
    let policies = state
        .policies
        .list_thing_policies(&page.page_metadata(), token.as_str())
        .await?;

    UiResponse::render(&PoliciesTemplate {
        base: THING_POLICIES,
        policies: policies.items.iter().map(PolicyRow::from).collect(),
        pager: Pager::new(&page, &policies),
    })
}

/// A thing policy is a connection carrying actions.
pub async fn add_thing_policy(
    State(state): State<AppState>,
    token: AuthToken,
    form: FormData,
) -> Result<UiResponse, Error> {
    let conn = connection_from_form(&form)?;
    state.policies.connect(&conn, token.as_str()).await?;
    Ok(UiResponse::see_other(THING_POLICIES))
}

pub async fn update_thing_policy(
    State(state): State<AppState>,
    token: AuthToken,
    form: FormData,
) -> Result<UiResponse, Error> {
    let policy = policy_from_form(&form, form.actions()?)?;
    state
        .policies
        .update_thing_policy(&policy, token.as_str())
        .await?;
    Ok(UiResponse::see_other(THING_POLICIES))
}

pub async fn delete_thing_policy(
    State(state): State<AppState>,
    token: AuthToken,
    form: FormData,
) -> Result<UiResponse, Error> {
    let conn = connection_from_form(&form)?;
    state.policies.disconnect(&conn, token.as_str()).await?;
    Ok(UiResponse::see_other(THING_POLICIES))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thing_policy_form_maps_subject_to_thing() {
        let form =
            FormData::from_urlencoded(b"subject=t1&object=c1&actions=m_read&actions=m_write")
                .unwrap();
        let conn = connection_from_form(&form).unwrap();
        assert_eq!(conn.thing_ids, vec!["t1"]);
        assert_eq!(conn.channel_ids, vec!["c1"]);
        assert_eq!(conn.actions, vec!["m_read", "m_write"]);
    }

    #[test]
    fn update_form_takes_json_actions() {
        let form =
            FormData::from_urlencoded(b"subject=u1&object=g1&actions=%5B%22g_list%22%5D").unwrap();
        let policy = policy_from_form(&form, form.actions().unwrap()).unwrap();
        assert_eq!(policy.actions, vec!["g_list"]);
    }
}
