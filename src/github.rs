use reqwest::{
    StatusCode,
    blocking::{Client, RequestBuilder},
    header::ACCEPT,
};
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::Value;
use thiserror::Error;

use crate::domain::{RateLimitStatus, Repository, Session, UserProfile};

const USER_AGENT_HEADER: &str = "octodash/0.1";
const GITHUB_JSON: &str = "application/vnd.github+json";
const REPOS_PER_PAGE: &str = "100";

/// Where requests go and who they are made as.
#[derive(Clone)]
pub struct ApiContext {
    pub base_url: String,
    pub session: Session,
}

pub fn build_client() -> Result<Client, FetchError> {
    Client::builder()
        .user_agent(USER_AGENT_HEADER)
        .build()
        .map_err(FetchError::Http)
}

pub fn fetch_user(client: &Client, api: &ApiContext) -> Result<UserProfile, FetchError> {
    send_json(get(client, api, "/user")?)
}

/// Lists the session user's repositories, most recently updated first.
/// Private repositories are only requested (and only kept) when
/// `include_private` is set. Records that fail to decode are skipped.
pub fn fetch_repositories(
    client: &Client,
    api: &ApiContext,
    include_private: bool,
) -> Result<Vec<Repository>, FetchError> {
    let visibility = if include_private { "all" } else { "public" };
    let raw: Vec<Value> = send_json(get(client, api, "/user/repos")?.query(&[
        ("per_page", REPOS_PER_PAGE),
        ("sort", "updated"),
        ("visibility", visibility),
    ]))?;
    Ok(retain_visible(decode_repositories(&raw), include_private))
}

pub fn fetch_rate_limit(client: &Client, api: &ApiContext) -> Result<RateLimitStatus, FetchError> {
    send_json(get(client, api, "/rate_limit")?)
}

/// Recent events for `login`, left as raw JSON so that one bad record does
/// not fail the whole page.
pub fn fetch_events(
    client: &Client,
    api: &ApiContext,
    login: &str,
    limit: usize,
) -> Result<Vec<Value>, FetchError> {
    let path = format!("/users/{login}/events");
    let per_page = limit.to_string();
    send_json(get(client, api, &path)?.query(&[("per_page", per_page.as_str())]))
}

fn get(client: &Client, api: &ApiContext, path: &str) -> Result<RequestBuilder, FetchError> {
    if api.session.is_empty() {
        return Err(FetchError::MissingToken);
    }
    let url = format!("{}{path}", api.base_url);
    tracing::debug!(%url, "GET");
    Ok(client
        .get(url)
        .header(ACCEPT, GITHUB_JSON)
        .bearer_auth(&api.session.token))
}

fn send_json<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, FetchError> {
    let response = request.send()?;
    check_status(response.status())?;
    Ok(response.json()?)
}

fn check_status(status: StatusCode) -> Result<(), FetchError> {
    if status == StatusCode::UNAUTHORIZED {
        Err(FetchError::Unauthorized)
    } else if !status.is_success() {
        Err(FetchError::Status(status.as_u16()))
    } else {
        Ok(())
    }
}

fn decode_repositories(raw: &[Value]) -> Vec<Repository> {
    raw.iter()
        .filter_map(|record| match Repository::deserialize(record) {
            Ok(repo) => Some(repo),
            Err(err) => {
                tracing::warn!(error = %err, "skipping malformed repository");
                None
            }
        })
        .collect()
}

fn retain_visible(mut repos: Vec<Repository>, include_private: bool) -> Vec<Repository> {
    if !include_private {
        repos.retain(|repo| !repo.private);
    }
    repos
}

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("GitHub API request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("GitHub rejected the session credentials; sign in again")]
    Unauthorized,
    #[error("GitHub API responded with status {0}")]
    Status(u16),
    #[error("No access token configured")]
    MissingToken,
    #[error("Background worker disconnected before returning a result")]
    BackgroundWorkerGone,
}

// -------------------------------------------------------------------------
// Tests
// -------------------------------------------------------------------------
