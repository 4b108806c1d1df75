use std::fmt;

use chrono::{DateTime, TimeZone, Utc};
use serde::Deserialize;

// Domain data structures shared across modules.

#[derive(Clone, Default)]
pub struct Session {
    pub token: String,
}

impl Session {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into().trim().to_owned(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.token.is_empty()
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct UserProfile {
    pub login: String,
    #[serde(default)]
    pub name: Option<String>,
    pub html_url: String,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub blog: Option<String>,
    #[serde(default)]
    pub public_repos: u64,
    #[serde(default)]
    pub followers: u64,
    #[serde(default)]
    pub following: u64,
    pub created_at: DateTime<Utc>,
}

impl UserProfile {
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(&self.login)
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct Repository {
    pub name: String,
    pub full_name: String,
    #[serde(default)]
    pub private: bool,
    pub html_url: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub fork: bool,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub stargazers_count: u64,
    #[serde(default)]
    pub forks_count: u64,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct RateLimitStatus {
    pub resources: RateLimitResources,
}

#[derive(Clone, Debug, Deserialize)]
pub struct RateLimitResources {
    pub core: RateLimitResource,
    #[serde(default)]
    pub search: Option<RateLimitResource>,
    #[serde(default)]
    pub graphql: Option<RateLimitResource>,
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
pub struct RateLimitResource {
    pub limit: u64,
    pub used: u64,
    pub remaining: u64,
    pub reset: i64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RateLimitLevel {
    Healthy,
    Warning,
    Critical,
}

impl RateLimitResource {
    /// Share of the quota still available, rounded to a whole percent.
    pub fn percent_remaining(&self) -> u8 {
        if self.limit == 0 {
            return 0;
        }
        let left = self.limit.saturating_sub(self.used) as f64;
        (left / self.limit as f64 * 100.0).round().clamp(0.0, 100.0) as u8
    }

    pub fn level(&self) -> RateLimitLevel {
        match self.percent_remaining() {
            p if p > 50 => RateLimitLevel::Healthy,
            p if p > 25 => RateLimitLevel::Warning,
            _ => RateLimitLevel::Critical,
        }
    }

    pub fn reset_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.reset, 0).single()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ActivityKind {
    Commit,
    Star,
    Fork,
    PullRequest,
    Issue,
    Comment,
    Create,
    Unknown,
}

impl ActivityKind {
    pub const ALL: [ActivityKind; 7] = [
        ActivityKind::Commit,
        ActivityKind::Star,
        ActivityKind::Fork,
        ActivityKind::PullRequest,
        ActivityKind::Issue,
        ActivityKind::Comment,
        ActivityKind::Create,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityKind::Commit => "commit",
            ActivityKind::Star => "star",
            ActivityKind::Fork => "fork",
            ActivityKind::PullRequest => "pull-request",
            ActivityKind::Issue => "issue",
            ActivityKind::Comment => "comment",
            ActivityKind::Create => "create",
            ActivityKind::Unknown => "unknown",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ActivityKind::Commit => "Commit",
            ActivityKind::Star => "Star",
            ActivityKind::Fork => "Fork",
            ActivityKind::PullRequest => "Pull request",
            ActivityKind::Issue => "Issue",
            ActivityKind::Comment => "Comment",
            ActivityKind::Create => "Create",
            ActivityKind::Unknown => "Other",
        }
    }
}

impl fmt::Display for ActivityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Activity {
    pub id: String,
    pub kind: ActivityKind,
    pub repo: String,
    pub repo_url: String,
    pub message: String,
    pub time: String,
    pub url: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LanguageBreakdown {
    pub language: String,
    pub size: u64,
    pub percentage: u8,
    pub repositories: usize,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RepoSummary {
    pub repositories: usize,
    pub private_repositories: usize,
    pub stars: u64,
    pub forks: u64,
}
