use std::cmp::Reverse;

use crate::{
    domain::{RepoSummary, Repository},
    search::SearchFilter,
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RepoSort {
    #[default]
    Updated,
    Stars,
    Forks,
    Name,
}

impl RepoSort {
    pub const ALL: [RepoSort; 4] = [
        RepoSort::Updated,
        RepoSort::Stars,
        RepoSort::Forks,
        RepoSort::Name,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            RepoSort::Updated => "Last updated",
            RepoSort::Stars => "Stars",
            RepoSort::Forks => "Forks",
            RepoSort::Name => "Name",
        }
    }
}

pub fn summarize(repos: &[&Repository]) -> RepoSummary {
    repos.iter().fold(RepoSummary::default(), |mut acc, repo| {
        acc.repositories += 1;
        acc.stars += repo.stargazers_count;
        acc.forks += repo.forks_count;
        if repo.private {
            acc.private_repositories += 1;
        }
        acc
    })
}

/// Repositories visible under the private-repo preference.
pub fn visible(repos: &[Repository], show_private: bool) -> Vec<&Repository> {
    repos
        .iter()
        .filter(|repo| show_private || !repo.private)
        .collect()
}

pub fn filter_and_sort<'a>(
    repos: &[&'a Repository],
    query: &str,
    sort: RepoSort,
) -> Vec<&'a Repository> {
    let filter = SearchFilter::new(query);
    let mut rows: Vec<&Repository> = repos
        .iter()
        .copied()
        .filter(|repo| {
            let description = repo.description.as_deref().unwrap_or("");
            filter.matches_any(&[&repo.name, description])
        })
        .collect();

    match sort {
        RepoSort::Updated => rows.sort_by_key(|repo| Reverse(repo.updated_at)),
        RepoSort::Stars => rows.sort_by_key(|repo| Reverse(repo.stargazers_count)),
        RepoSort::Forks => rows.sort_by_key(|repo| Reverse(repo.forks_count)),
        RepoSort::Name => rows.sort_by_cached_key(|repo| repo.name.to_lowercase()),
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn repo(name: &str, private: bool, stars: u64, forks: u64, updated: &str) -> Repository {
        serde_json::from_value(json!({
            "id": stars * 100 + forks,
            "name": name,
            "full_name": format!("octocat/{name}"),
            "private": private,
            "html_url": format!("https://github.com/octocat/{name}"),
            "description": format!("{name} description"),
            "language": "Rust",
            "size": 10,
            "stargazers_count": stars,
            "forks_count": forks,
            "updated_at": updated,
        }))
        .expect("repository fixture")
    }

    fn fixtures() -> Vec<Repository> {
        vec![
            repo("beta", false, 5, 1, "2024-01-02T00:00:00Z"),
            repo("Alpha", true, 1, 9, "2024-03-01T00:00:00Z"),
            repo("gamma", false, 7, 0, "2023-12-31T00:00:00Z"),
        ]
    }

    fn names(rows: &[&Repository]) -> Vec<String> {
        rows.iter().map(|repo| repo.name.clone()).collect()
    }

    #[test]
    fn summary_counts_stars_forks_and_private() {
        let repos = fixtures();
        let summary = summarize(&visible(&repos, true));
        assert_eq!(
            summary,
            RepoSummary {
                repositories: 3,
                private_repositories: 1,
                stars: 13,
                forks: 10,
            }
        );
    }

    #[test]
    fn private_repositories_hidden_unless_enabled() {
        let repos = fixtures();
        assert_eq!(visible(&repos, false).len(), 2);
        assert_eq!(visible(&repos, true).len(), 3);
    }

    #[test]
    fn sorts_by_each_key() {
        let repos = fixtures();
        let all = visible(&repos, true);
        assert_eq!(
            names(&filter_and_sort(&all, "", RepoSort::Updated)),
            ["Alpha", "beta", "gamma"]
        );
        assert_eq!(
            names(&filter_and_sort(&all, "", RepoSort::Stars)),
            ["gamma", "beta", "Alpha"]
        );
        assert_eq!(
            names(&filter_and_sort(&all, "", RepoSort::Forks)),
            ["Alpha", "beta", "gamma"]
        );
        assert_eq!(
            names(&filter_and_sort(&all, "", RepoSort::Name)),
            ["Alpha", "beta", "gamma"]
        );
    }

    #[test]
    fn search_matches_name_or_description_case_insensitively() {
        let mut repos = fixtures();
        repos[2].description = Some("Telemetry DASHBOARD".into());
        repos[0].description = None;
        let all = visible(&repos, true);
        assert_eq!(names(&filter_and_sort(&all, "  dashboard ", RepoSort::Name)), ["gamma"]);
        assert_eq!(names(&filter_and_sort(&all, "ALP", RepoSort::Name)), ["Alpha"]);
        assert!(filter_and_sort(&all, "nothing", RepoSort::Name).is_empty());
    }
}
