//! Turns the raw GitHub events feed into the dashboard's activity list.
//!
//! Every recognised event yields exactly one [`Activity`] in input order.
//! Unrecognised event types and records that fail to decode are skipped
//! without failing the batch.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use crate::domain::{Activity, ActivityKind};

const GITHUB_WEB: &str = "https://github.com";

/// Events from private repositories (`"public": false`) are dropped unless
/// `include_private` is set. A record without the field counts as public.
pub fn normalize_events(
    events: &[Value],
    include_private: bool,
    now: DateTime<Utc>,
) -> Vec<Activity> {
    events
        .iter()
        .filter_map(|raw| {
            let event = match RawEvent::deserialize(raw) {
                Ok(event) => event,
                Err(err) => {
                    tracing::warn!(error = %err, "skipping malformed event");
                    return None;
                }
            };
            if !include_private && !event.public {
                tracing::debug!(id = %event.id, "hiding private event");
                return None;
            }
            let event_type = event.kind.clone();
            let activity = normalize_event(event, now);
            if activity.is_none() {
                tracing::debug!(%event_type, "dropping unrecognised event type");
            }
            activity
        })
        .collect()
}

fn normalize_event(event: RawEvent, now: DateTime<Utc>) -> Option<Activity> {
    let repo = event.repo.name;
    let repo_url = format!("{GITHUB_WEB}/{repo}");
    let payload = event.payload;

    let kind = classify(&event.kind);
    let (message, url) = match kind {
        ActivityKind::Commit => {
            let commits = payload.commits.unwrap_or_default();
            let count = commits.len();
            let message = format!("Pushed {count} {}", pluralize("commit", count as i64));
            let url = commits
                .first()
                .map(|commit| format!("{repo_url}/commit/{}", commit.sha))
                .unwrap_or_else(|| repo_url.clone());
            (message, url)
        }
        ActivityKind::Star => (format!("Starred {repo}"), repo_url.clone()),
        ActivityKind::Fork => {
            let url = payload
                .forkee
                .and_then(|forkee| forkee.full_name)
                .filter(|name| !name.is_empty())
                .map(|name| format!("{GITHUB_WEB}/{name}"))
                .unwrap_or_else(|| repo_url.clone());
            (format!("Forked {repo}"), url)
        }
        ActivityKind::PullRequest => {
            let target = payload.pull_request.unwrap_or_default();
            let message = action_message(payload.action.as_deref(), "PR", target.number);
            let url = target.html_url.unwrap_or_else(|| repo_url.clone());
            (message, url)
        }
        ActivityKind::Issue => {
            let target = payload.issue.unwrap_or_default();
            let message = action_message(payload.action.as_deref(), "issue", target.number);
            let url = target.html_url.unwrap_or_else(|| repo_url.clone());
            (message, url)
        }
        ActivityKind::Comment => {
            let number = payload.issue.and_then(|issue| issue.number);
            let message = with_number("Commented on issue".to_owned(), number);
            let url = payload
                .comment
                .and_then(|comment| comment.html_url)
                .unwrap_or_else(|| repo_url.clone());
            (message, url)
        }
        ActivityKind::Create => {
            let message = ["Created", payload.ref_type.as_deref().unwrap_or("")]
                .into_iter()
                .chain(payload.ref_name.as_deref())
                .filter(|part| !part.is_empty())
                .collect::<Vec<_>>()
                .join(" ");
            (message, repo_url.clone())
        }
        ActivityKind::Unknown => return None,
    };

    Some(Activity {
        id: event.id,
        kind,
        repo,
        repo_url,
        message,
        time: format_time_ago(event.created_at, now),
        url,
    })
}

fn classify(event_type: &str) -> ActivityKind {
    match event_type {
        "PushEvent" => ActivityKind::Commit,
        "WatchEvent" => ActivityKind::Star,
        "ForkEvent" => ActivityKind::Fork,
        "PullRequestEvent" => ActivityKind::PullRequest,
        "IssuesEvent" => ActivityKind::Issue,
        "IssueCommentEvent" => ActivityKind::Comment,
        "CreateEvent" => ActivityKind::Create,
        _ => ActivityKind::Unknown,
    }
}

/// Renders the elapsed time between `then` and `now` using the largest
/// whole unit, e.g. `125s` becomes "2 minutes ago". Future instants clamp
/// to zero.
pub fn format_time_ago(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let seconds = (now - then).num_seconds().max(0);
    if seconds < 60 {
        return ago(seconds, "second");
    }
    let minutes = seconds / 60;
    if minutes < 60 {
        return ago(minutes, "minute");
    }
    let hours = minutes / 60;
    if hours < 24 {
        return ago(hours, "hour");
    }
    let days = hours / 24;
    if days < 30 {
        return ago(days, "day");
    }
    let months = days / 30;
    if months < 12 {
        return ago(months, "month");
    }
    ago(months / 12, "year")
}

fn ago(count: i64, unit: &str) -> String {
    format!("{count} {} ago", pluralize(unit, count))
}

fn pluralize(unit: &str, count: i64) -> String {
    if count == 1 {
        unit.to_owned()
    } else {
        format!("{unit}s")
    }
}

fn capitalize_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

// "Opened PR #12", or "PR #12" when the action is missing.
fn action_message(action: Option<&str>, noun: &str, number: Option<u64>) -> String {
    let action = capitalize_first(action.unwrap_or(""));
    let base = if action.is_empty() {
        noun.to_owned()
    } else {
        format!("{action} {noun}")
    };
    with_number(base, number)
}

fn with_number(base: String, number: Option<u64>) -> String {
    match number {
        Some(number) => format!("{base} #{number}"),
        None => base,
    }
}

// Upstream payloads ---------------------------------------------------------

#[derive(Debug, Deserialize)]
struct RawEvent {
    id: String,
    #[serde(rename = "type")]
    kind: String,
    repo: RawEventRepo,
    #[serde(default = "public_by_default")]
    public: bool,
    #[serde(default)]
    payload: RawPayload,
    created_at: DateTime<Utc>,
}

fn public_by_default() -> bool {
    true
}

#[derive(Debug, Deserialize)]
struct RawEventRepo {
    name: String,
}

#[derive(Debug, Default, Deserialize)]
struct RawPayload {
    #[serde(default)]
    action: Option<String>,
    #[serde(default)]
    commits: Option<Vec<RawCommit>>,
    #[serde(default)]
    forkee: Option<RawForkee>,
    #[serde(default)]
    pull_request: Option<RawTarget>,
    #[serde(default)]
    issue: Option<RawTarget>,
    #[serde(default)]
    comment: Option<RawTarget>,
    #[serde(default)]
    ref_type: Option<String>,
    #[serde(default, rename = "ref")]
    ref_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawCommit {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct RawForkee {
    #[serde(default)]
    full_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawTarget {
    #[serde(default)]
    number: Option<u64>,
    #[serde(default)]
    html_url: Option<String>,
}

// -------------------------------------------------------------------------
// Tests
// -------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use serde_json::json;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn event(kind: &str, payload: Value) -> Value {
        json!({
            "id": "1001",
            "type": kind,
            "repo": { "name": "octocat/Hello-World" },
            "payload": payload,
            "created_at": "2024-06-01T11:57:55Z",
        })
    }

    fn single(kind: &str, payload: Value) -> Activity {
        let mut out = normalize_events(&[event(kind, payload)], false, now());
        assert_eq!(out.len(), 1);
        out.remove(0)
    }

    #[test]
    fn push_event_links_first_commit() {
        let activity = single(
            "PushEvent",
            json!({ "commits": [{ "sha": "abc123" }, { "sha": "def" }, { "sha": "ghi" }] }),
        );
        assert_eq!(activity.kind, ActivityKind::Commit);
        assert_eq!(activity.message, "Pushed 3 commits");
        assert_eq!(
            activity.url,
            "https://github.com/octocat/Hello-World/commit/abc123"
        );
        assert_eq!(activity.time, "2 minutes ago");
        assert_eq!(activity.id, "1001");
        assert_eq!(activity.repo, "octocat/Hello-World");
        assert_eq!(activity.repo_url, "https://github.com/octocat/Hello-World");
    }

    #[test]
    fn push_message_is_singular_only_for_one_commit() {
        for count in 0..4 {
            let commits: Vec<Value> = (0..count).map(|i| json!({ "sha": format!("s{i}") })).collect();
            let activity = single("PushEvent", json!({ "commits": commits }));
            let singular = !activity.message.ends_with("commits");
            assert_eq!(singular, count == 1, "message: {}", activity.message);
        }
    }

    #[test]
    fn push_without_commits_falls_back_to_repo() {
        let activity = single("PushEvent", json!({}));
        assert_eq!(activity.message, "Pushed 0 commits");
        assert_eq!(activity.url, activity.repo_url);
    }

    #[test]
    fn watch_and_fork_events() {
        let star = single("WatchEvent", json!({ "action": "started" }));
        assert_eq!(star.kind, ActivityKind::Star);
        assert_eq!(star.message, "Starred octocat/Hello-World");
        assert_eq!(star.url, star.repo_url);

        let fork = single("ForkEvent", json!({ "forkee": { "full_name": "me/Hello-World" } }));
        assert_eq!(fork.kind, ActivityKind::Fork);
        assert_eq!(fork.message, "Forked octocat/Hello-World");
        assert_eq!(fork.url, "https://github.com/me/Hello-World");

        let bare = single("ForkEvent", json!({}));
        assert_eq!(bare.url, bare.repo_url);
    }

    #[test]
    fn pull_request_event_capitalizes_action() {
        let activity = single(
            "PullRequestEvent",
            json!({
                "action": "opened",
                "pull_request": { "number": 42, "html_url": "https://github.com/octocat/Hello-World/pull/42" }
            }),
        );
        assert_eq!(activity.kind, ActivityKind::PullRequest);
        assert_eq!(activity.message, "Opened PR #42");
        assert_eq!(activity.url, "https://github.com/octocat/Hello-World/pull/42");
    }

    #[test]
    fn missing_action_has_no_leading_space() {
        let activity = single("PullRequestEvent", json!({ "pull_request": { "number": 7 } }));
        assert_eq!(activity.message, "PR #7");
        assert_eq!(activity.url, activity.repo_url);

        let issue = single("IssuesEvent", json!({ "action": "", "issue": { "number": 3 } }));
        assert_eq!(issue.message, "issue #3");
    }

    #[test]
    fn missing_pull_request_payload_falls_back_to_repo_url() {
        let activity = single("PullRequestEvent", json!({ "action": "closed" }));
        assert_eq!(activity.message, "Closed PR");
        assert_eq!(activity.url, activity.repo_url);
    }

    #[test]
    fn issue_and_comment_events() {
        let issue = single(
            "IssuesEvent",
            json!({ "action": "reopened", "issue": { "number": 9, "html_url": "https://x/issues/9" } }),
        );
        assert_eq!(issue.kind, ActivityKind::Issue);
        assert_eq!(issue.message, "Reopened issue #9");
        assert_eq!(issue.url, "https://x/issues/9");

        let comment = single(
            "IssueCommentEvent",
            json!({
                "action": "created",
                "issue": { "number": 9 },
                "comment": { "html_url": "https://x/issues/9#issuecomment-1" }
            }),
        );
        assert_eq!(comment.kind, ActivityKind::Comment);
        assert_eq!(comment.message, "Commented on issue #9");
        assert_eq!(comment.url, "https://x/issues/9#issuecomment-1");
    }

    #[test]
    fn create_event_tolerates_null_ref() {
        let branch = single("CreateEvent", json!({ "ref_type": "branch", "ref": "main" }));
        assert_eq!(branch.kind, ActivityKind::Create);
        assert_eq!(branch.message, "Created branch main");

        let repo = single("CreateEvent", json!({ "ref_type": "repository", "ref": null }));
        assert_eq!(repo.message, "Created repository");
        assert_eq!(repo.url, repo.repo_url);

        let untyped = single("CreateEvent", json!({ "ref": "main" }));
        assert_eq!(untyped.message, "Created main");
        assert_eq!(single("CreateEvent", json!({})).message, "Created");
    }

    #[test]
    fn action_keeps_everything_after_first_character() {
        let activity = single(
            "IssuesEvent",
            json!({ "action": "reOpened", "issue": { "number": 1 } }),
        );
        assert_eq!(activity.message, "ReOpened issue #1");
    }

    #[test]
    fn private_events_need_the_private_flag() {
        let mut hidden = event("WatchEvent", json!({}));
        hidden["id"] = json!("p");
        hidden["public"] = json!(false);
        let mut open = event("WatchEvent", json!({}));
        open["id"] = json!("o");
        open["public"] = json!(true);
        let unmarked = event("WatchEvent", json!({}));
        let events = [hidden, open, unmarked];

        let ids = |include_private| {
            normalize_events(&events, include_private, now())
                .into_iter()
                .map(|a| a.id)
                .collect::<Vec<_>>()
        };
        assert_eq!(ids(false), ["o", "1001"]);
        assert_eq!(ids(true), ["p", "o", "1001"]);
    }

    #[test]
    fn unknown_and_malformed_events_are_dropped_in_order() {
        let mut first = event("WatchEvent", json!({}));
        first["id"] = json!("a");
        let unknown = event("GollumEvent", json!({}));
        let malformed = json!({ "id": "b", "type": "PushEvent", "payload": {} });
        let mut last = event("ForkEvent", json!({}));
        last["id"] = json!("c");

        let out = normalize_events(&[first, unknown, malformed, last], false, now());
        let ids: Vec<_> = out.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, ["a", "c"]);
        assert!(out.iter().all(|a| a.kind != ActivityKind::Unknown));
    }

    #[test]
    fn classify_covers_recognised_types_only() {
        assert_eq!(classify("PushEvent"), ActivityKind::Commit);
        assert_eq!(classify("IssueCommentEvent"), ActivityKind::Comment);
        assert_eq!(classify("ReleaseEvent"), ActivityKind::Unknown);
        assert_eq!(classify("pushevent"), ActivityKind::Unknown);
    }

    #[test]
    fn time_ago_picks_largest_unit() {
        let at = |secs: i64| format_time_ago(now() - Duration::seconds(secs), now());
        assert_eq!(at(0), "0 seconds ago");
        assert_eq!(at(1), "1 second ago");
        assert_eq!(at(59), "59 seconds ago");
        assert_eq!(at(60), "1 minute ago");
        assert_eq!(at(125), "2 minutes ago");
        assert_eq!(at(3600), "1 hour ago");
        assert_eq!(at(86_399), "23 hours ago");
        assert_eq!(at(86_400), "1 day ago");
        assert_eq!(at(86_400 * 29), "29 days ago");
        assert_eq!(at(86_400 * 30), "1 month ago");
        assert_eq!(at(86_400 * 359), "11 months ago");
        assert_eq!(at(86_400 * 360), "1 year ago");
        assert_eq!(at(86_400 * 800), "2 years ago");
    }

    #[test]
    fn future_timestamps_clamp_to_zero() {
        assert_eq!(
            format_time_ago(now() + Duration::seconds(30), now()),
            "0 seconds ago"
        );
    }
}
