use std::time::Duration;

use chrono::Utc;
use eframe::{
    App, CreationContext, Frame,
    egui::{self, Color32, Context, Layout, ThemePreference},
};
use egui_extras::{Column, TableBuilder};

use crate::{
    activity::{self, format_time_ago},
    config::Config,
    domain::{
        Activity, ActivityKind, LanguageBreakdown, RateLimitLevel, RateLimitResource,
        RateLimitStatus, Repository, Session, UserProfile,
    },
    github::{self, ApiContext},
    languages::{self, CHART_LANGUAGES, STAT_PANEL_LANGUAGES},
    preferences::PreferenceStore,
    repos::{self, RepoSort},
    search::SearchFilter,
    section::{LoadedSection, RefreshScheduler, Section},
    storage::{self, FileStore, KeyValueStore, MemoryStore},
};

pub const APP_NAME: &str = "Octodash";

const HEALTHY_COLOR: Color32 = Color32::from_rgb(46, 160, 67);

pub struct DashboardApp {
    config: Config,
    session: Session,
    token_form: TokenForm,
    preferences: PreferenceStore,
    storage_warning: Option<String>,
    theme: ThemeMode,
    user: LoadedSection<UserProfile>,
    repos: LoadedSection<Vec<Repository>>,
    rate_limit: LoadedSection<RateLimitStatus>,
    activity: LoadedSection<Vec<Activity>>,
    rate_limit_refresh: RefreshScheduler,
    repo_view: RepoView,
    feed_view: FeedView,
}

impl DashboardApp {
    pub fn new(cc: &CreationContext<'_>, config: Config) -> Self {
        let (store, storage_warning) = open_preference_store(&config);
        let preferences = PreferenceStore::load(store);
        let session = Session::new(config.github_token.clone().unwrap_or_default());

        let mut app = Self {
            rate_limit_refresh: RefreshScheduler::new(config.rate_limit_refresh),
            config,
            session,
            token_form: TokenForm::default(),
            preferences,
            storage_warning,
            theme: ThemeMode::default(),
            user: LoadedSection::default(),
            repos: LoadedSection::default(),
            rate_limit: LoadedSection::default(),
            activity: LoadedSection::default(),
            repo_view: RepoView::default(),
            feed_view: FeedView::default(),
        };

        app.theme.apply(&cc.egui_ctx);
        if !app.preferences.current().show_rate_limit {
            app.rate_limit_refresh.cancel();
        }
        app.refresh_all();
        app
    }

    fn api(&self) -> ApiContext {
        ApiContext {
            base_url: self.config.api_url.clone(),
            session: self.session.clone(),
        }
    }

    fn refresh_all(&mut self) {
        tracing::info!("refreshing all dashboard sections");
        self.start_user();
        self.start_repos();
        self.start_rate_limit();
        self.start_activity();
    }

    fn start_user(&mut self) {
        let api = self.api();
        self.user.start(move || {
            let client = github::build_client()?;
            github::fetch_user(&client, &api)
        });
    }

    fn start_repos(&mut self) {
        let api = self.api();
        let include_private = self.preferences.current().show_private_repos;
        self.repos.start(move || {
            let client = github::build_client()?;
            github::fetch_repositories(&client, &api, include_private)
        });
    }

    fn start_rate_limit(&mut self) {
        let api = self.api();
        self.rate_limit.start(move || {
            let client = github::build_client()?;
            github::fetch_rate_limit(&client, &api)
        });
        self.rate_limit_refresh.mark_triggered();
    }

    fn start_activity(&mut self) {
        let api = self.api();
        let known_login = self.user.state.data().map(|user| user.login.clone());
        let limit = self.config.activity_limit;
        let include_private = self.preferences.current().show_private_repos;
        self.activity.start(move || {
            let client = github::build_client()?;
            let login = match known_login {
                Some(login) => login,
                None => github::fetch_user(&client, &api)?.login,
            };
            let events = github::fetch_events(&client, &api, &login, limit)?;
            Ok(activity::normalize_events(
                &events,
                include_private,
                Utc::now(),
            ))
        });
    }

    fn poll_jobs(&mut self) {
        self.user.poll();
        self.repos.poll();
        self.rate_limit.poll();
        self.activity.poll();
    }

    fn maybe_refresh_rate_limit(&mut self) {
        if !self.preferences.current().show_rate_limit || self.rate_limit.state.is_loading() {
            return;
        }
        if self.rate_limit_refresh.should_trigger() {
            tracing::debug!("periodic rate limit refresh");
            self.start_rate_limit();
        }
    }

    fn apply_token(&mut self) {
        self.session = Session::new(self.token_form.token.as_str());
        self.token_form = TokenForm::default();
        self.refresh_all();
    }

    fn toggle_private_repos(&mut self) {
        if let Err(err) = self.preferences.toggle_private_repos() {
            self.storage_warning = Some(format!("Preference was not saved: {err}"));
        }
        self.start_repos();
        self.start_activity();
    }

    fn toggle_rate_limit(&mut self) {
        if let Err(err) = self.preferences.toggle_rate_limit() {
            self.storage_warning = Some(format!("Preference was not saved: {err}"));
        }
        if self.preferences.current().show_rate_limit {
            self.rate_limit_refresh.resume();
            self.start_rate_limit();
        } else {
            self.rate_limit_refresh.cancel();
        }
    }

    fn render_side_panel(&mut self, ui: &mut egui::Ui) {
        ui.heading("Session");
        ui.separator();

        if let Some(warning) = &self.storage_warning {
            ui.colored_label(ui.visuals().warn_fg_color, warning);
            ui.separator();
        }

        match (self.session.is_empty(), self.user.state.data()) {
            (true, _) => {
                ui.weak("No access token configured.");
            }
            (false, Some(user)) => {
                ui.label(format!("Signed in as {}", user.login));
            }
            (false, None) => {
                ui.weak("Token set; waiting for profile.");
            }
        }

        ui.label("Personal access token");
        ui.add(
            egui::TextEdit::singleline(&mut self.token_form.token)
                .password(true)
                .hint_text("ghp_..."),
        );
        let apply_enabled = !self.token_form.token.trim().is_empty();
        if ui
            .add_enabled(apply_enabled, egui::Button::new("Use token"))
            .clicked()
        {
            self.apply_token();
        }

        ui.separator();
        ui.heading("Preferences");

        let current = self.preferences.current();
        let mut show_private = current.show_private_repos;
        if ui
            .checkbox(&mut show_private, "Show private repositories")
            .changed()
        {
            self.toggle_private_repos();
        }
        let mut show_rate_limit = current.show_rate_limit;
        if ui
            .checkbox(&mut show_rate_limit, "Show API rate limits")
            .changed()
        {
            self.toggle_rate_limit();
        }

        let mut theme = self.theme;
        egui::ComboBox::from_label("Theme")
            .selected_text(theme.label())
            .show_ui(ui, |ui| {
                for mode in ThemeMode::ALL {
                    ui.selectable_value(&mut theme, mode, mode.label());
                }
            });
        if theme != self.theme {
            self.theme = theme;
            self.theme.apply(ui.ctx());
        }

        ui.separator();
        let busy = self.user.state.is_loading()
            || self.repos.state.is_loading()
            || self.activity.state.is_loading();
        if ui
            .add_enabled(!busy, egui::Button::new("Refresh all"))
            .clicked()
        {
            self.refresh_all();
        }
        if let Some(at) = self.repos.state.fetched_at() {
            ui.small(format!("Repositories synced {} UTC", at.format("%H:%M:%S")));
        }
    }

    fn render_dashboard(&mut self, ui: &mut egui::Ui) {
        let now = Utc::now();
        let show_private = self.preferences.current().show_private_repos;
        let show_rate_limit = self.preferences.current().show_rate_limit;

        egui::ScrollArea::vertical().show(ui, |area| {
            render_profile_card(area, &self.user.state, now);
            render_stats_card(area, &self.repos.state, show_private);
            if show_rate_limit {
                render_rate_limit_card(area, &self.rate_limit.state);
            }
            render_language_chart(area, &self.repos.state, show_private);
            render_repo_card(area, &self.repos.state, show_private, &mut self.repo_view, now);
            let login = self.user.state.data().map(|user| user.login.as_str());
            render_activity_card(
                area,
                &self.activity.state,
                &mut self.feed_view,
                self.config.activity_limit,
                login,
            );
        });
    }
}

impl App for DashboardApp {
    fn update(&mut self, ctx: &Context, _frame: &mut Frame) {
        self.poll_jobs();
        self.maybe_refresh_rate_limit();

        egui::SidePanel::left("session_panel")
            .default_width(240.0)
            .show(ctx, |ui| self.render_side_panel(ui));

        egui::CentralPanel::default().show(ctx, |ui| {
            self.render_dashboard(ui);
        });

        ctx.request_repaint_after(Duration::from_millis(500));
    }
}

impl Drop for DashboardApp {
    fn drop(&mut self) {
        if !self.rate_limit_refresh.is_cancelled() {
            self.rate_limit_refresh.cancel();
            tracing::info!("periodic rate limit refresh cancelled");
        }
    }
}

fn open_preference_store(config: &Config) -> (Box<dyn KeyValueStore>, Option<String>) {
    let opened = config
        .data_dir
        .clone()
        .map(Ok)
        .unwrap_or_else(storage::default_data_dir)
        .and_then(|dir| FileStore::initialize(&dir));
    match opened {
        Ok(store) => {
            tracing::info!(path = %store.path().display(), "using preference file");
            let store: Box<dyn KeyValueStore> = Box::new(store);
            (store, None)
        }
        Err(err) => {
            tracing::warn!(error = %err, "preference storage unavailable");
            let store: Box<dyn KeyValueStore> = Box::new(MemoryStore::default());
            let warning = format!(
                "Preference storage is unavailable; changes last for this session only ({err})."
            );
            (store, Some(warning))
        }
    }
}

// -----------------------------------------------------------------------------
// Cards
// -----------------------------------------------------------------------------

/// Error or loading line for a section. Returns `true` when there is data
/// to draw below it.
fn render_section_status<T>(ui: &mut egui::Ui, section: &Section<T>, what: &str) -> bool {
    if let Some(err) = section.error() {
        ui.colored_label(ui.visuals().error_fg_color, err);
    } else if section.is_loading() {
        ui.horizontal(|row| {
            row.spinner();
            row.label(format!("Loading {what}..."));
        });
    }
    section.data().is_some()
}

fn card(ui: &mut egui::Ui, title: &str, body: impl FnOnce(&mut egui::Ui)) {
    ui.group(|group| {
        group.set_width(group.available_width());
        group.heading(title);
        group.separator();
        body(group);
    });
    ui.add_space(12.0);
}

fn render_profile_card(
    ui: &mut egui::Ui,
    section: &Section<UserProfile>,
    now: chrono::DateTime<Utc>,
) {
    card(ui, "Profile", |ui| {
        if !render_section_status(ui, section, "profile") {
            return;
        }
        let Some(user) = section.data() else { return };
        ui.horizontal(|row| {
            row.hyperlink_to(user.display_name(), &user.html_url);
            row.weak(format!("@{}", user.login));
        });
        if let Some(bio) = user.bio.as_deref().filter(|bio| !bio.is_empty()) {
            ui.label(bio);
        }
        ui.horizontal_wrapped(|row| {
            for detail in [&user.company, &user.location, &user.blog]
                .into_iter()
                .flatten()
                .filter(|value| !value.is_empty())
            {
                row.small(detail);
                row.separator();
            }
            row.small(format!("Joined {}", format_time_ago(user.created_at, now)));
        });
        ui.horizontal(|row| {
            row.label(format!("{} followers", format_number(user.followers)));
            row.separator();
            row.label(format!("{} following", format_number(user.following)));
            row.separator();
            row.label(format!("{} public repos", format_number(user.public_repos)));
        });
    });
}

fn render_stats_card(ui: &mut egui::Ui, section: &Section<Vec<Repository>>, show_private: bool) {
    card(ui, "Statistics", |ui| {
        if !render_section_status(ui, section, "repositories") {
            return;
        }
        let Some(all) = section.data() else { return };
        let summary = repos::summarize(&repos::visible(all, show_private));

        ui.horizontal(|row| {
            row.strong(format_number(summary.repositories as u64));
            row.label("repositories");
            if summary.private_repositories > 0 {
                row.weak(format!("({} private)", summary.private_repositories));
            }
            row.separator();
            row.strong(format_number(summary.stars));
            row.label("stars");
            row.separator();
            row.strong(format_number(summary.forks));
            row.label("forks");
        });

        let top = aggregate_visible(all, show_private, STAT_PANEL_LANGUAGES);
        if top.is_empty() {
            ui.weak("No language data available.");
        } else {
            ui.add_space(4.0);
            ui.label("Top languages");
            draw_language_bars(ui, &top);
        }
    });
}

fn render_language_chart(
    ui: &mut egui::Ui,
    section: &Section<Vec<Repository>>,
    show_private: bool,
) {
    card(ui, "Languages", |ui| {
        let Some(all) = section.data() else {
            if section.is_loading() {
                ui.spinner();
            }
            return;
        };
        let breakdown = aggregate_visible(all, show_private, CHART_LANGUAGES);
        if breakdown.is_empty() {
            ui.weak("No language data available.");
            return;
        }
        egui::Grid::new("language_chart")
            .striped(true)
            .num_columns(3)
            .show(ui, |grid| {
                for entry in &breakdown {
                    grid.colored_label(language_color32(&entry.language), "■");
                    grid.label(&entry.language);
                    grid.label(format!(
                        "{}% · {} {} · {} KB",
                        entry.percentage,
                        entry.repositories,
                        if entry.repositories == 1 { "repo" } else { "repos" },
                        format_number(entry.size),
                    ));
                    grid.end_row();
                }
            });
    });
}

fn render_rate_limit_card(ui: &mut egui::Ui, section: &Section<RateLimitStatus>) {
    card(ui, "API rate limits", |ui| {
        if !render_section_status(ui, section, "rate limits") {
            return;
        }
        let Some(status) = section.data() else { return };
        draw_rate_limit_row(ui, "Core", &status.resources.core);
        if let Some(search) = &status.resources.search {
            draw_rate_limit_row(ui, "Search", search);
        }
        if let Some(graphql) = &status.resources.graphql {
            draw_rate_limit_row(ui, "GraphQL", graphql);
        }
    });
}

fn draw_rate_limit_row(ui: &mut egui::Ui, name: &str, resource: &RateLimitResource) {
    let color = match resource.level() {
        RateLimitLevel::Healthy => HEALTHY_COLOR,
        RateLimitLevel::Warning => ui.visuals().warn_fg_color,
        RateLimitLevel::Critical => ui.visuals().error_fg_color,
    };
    ui.horizontal(|row| {
        row.label(name);
        row.with_layout(Layout::right_to_left(egui::Align::Center), |lane| {
            if let Some(reset) = resource.reset_at() {
                lane.small(format!("resets {} UTC", reset.format("%H:%M")));
            }
        });
    });
    ui.add(
        egui::ProgressBar::new(f32::from(resource.percent_remaining()) / 100.0)
            .fill(color)
            .text(format!(
                "{} / {} remaining",
                format_number(resource.remaining),
                format_number(resource.limit)
            )),
    );
}

fn render_repo_card(
    ui: &mut egui::Ui,
    section: &Section<Vec<Repository>>,
    show_private: bool,
    view: &mut RepoView,
    now: chrono::DateTime<Utc>,
) {
    card(ui, "Repositories", |ui| {
        ui.horizontal(|row| {
            row.add(
                egui::TextEdit::singleline(&mut view.query)
                    .hint_text("Search repositories…")
                    .desired_width(200.0),
            );
            egui::ComboBox::from_label("Sort by")
                .selected_text(view.sort.label())
                .show_ui(row, |menu| {
                    for sort in RepoSort::ALL {
                        menu.selectable_value(&mut view.sort, sort, sort.label());
                    }
                });
        });

        let Some(all) = section.data() else {
            if section.is_loading() {
                ui.spinner();
            }
            return;
        };
        let visible = repos::visible(all, show_private);
        let rows = repos::filter_and_sort(&visible, &view.query, view.sort);
        if rows.is_empty() {
            ui.weak(if visible.is_empty() {
                "No repositories found."
            } else {
                "No matches for current search."
            });
            return;
        }
        draw_repo_table(ui, &rows, now);
    });
}

fn draw_repo_table(ui: &mut egui::Ui, rows: &[&Repository], now: chrono::DateTime<Utc>) {
    ui.push_id("repositories_table", |ui| {
        TableBuilder::new(ui)
            .striped(true)
            .column(Column::remainder().at_least(200.0))
            .column(Column::initial(100.0))
            .column(Column::initial(60.0))
            .column(Column::initial(60.0))
            .column(Column::initial(120.0))
            .header(20.0, |mut header| {
                for title in ["Repository", "Language", "Stars", "Forks", "Updated"] {
                    header.col(|ui| {
                        ui.strong(title);
                    });
                }
            })
            .body(|mut body| {
                for repo in rows {
                    body.row(36.0, |mut row| {
                        row.col(|ui| {
                            ui.vertical(|cell| {
                                cell.horizontal(|line| {
                                    line.hyperlink_to(&repo.name, &repo.html_url)
                                        .on_hover_text(&repo.full_name);
                                    if repo.private {
                                        line.small("private");
                                    }
                                    if repo.fork {
                                        line.small("fork");
                                    }
                                });
                                if let Some(description) = &repo.description {
                                    cell.small(description);
                                }
                            });
                        });
                        row.col(|ui| match &repo.language {
                            Some(language) => {
                                ui.colored_label(language_color32(language), language);
                            }
                            None => {
                                ui.weak("—");
                            }
                        });
                        row.col(|ui| {
                            ui.label(format_number(repo.stargazers_count));
                        });
                        row.col(|ui| {
                            ui.label(format_number(repo.forks_count));
                        });
                        row.col(|ui| {
                            ui.label(format_time_ago(repo.updated_at, now));
                        });
                    });
                }
            });
    });
}

fn render_activity_card(
    ui: &mut egui::Ui,
    section: &Section<Vec<Activity>>,
    view: &mut FeedView,
    limit: usize,
    login: Option<&str>,
) {
    card(ui, "Recent activity", |ui| {
        ui.horizontal(|row| {
            row.add(
                egui::TextEdit::singleline(&mut view.query)
                    .hint_text("Filter activity…")
                    .desired_width(200.0),
            );
            egui::ComboBox::from_label("Kind")
                .selected_text(view.kind.map_or("All", |kind| kind.label()))
                .show_ui(row, |menu| {
                    menu.selectable_value(&mut view.kind, None, "All");
                    for kind in ActivityKind::ALL {
                        menu.selectable_value(&mut view.kind, Some(kind), kind.label());
                    }
                });
        });

        if !render_section_status(ui, section, "activity") {
            return;
        }
        let Some(items) = section.data() else { return };
        let filter = SearchFilter::new(&view.query);
        let rows: Vec<&Activity> = items
            .iter()
            .filter(|item| view.kind.is_none_or(|kind| kind == item.kind))
            .filter(|item| filter.matches_any(&[&item.repo, &item.message]))
            .take(limit)
            .collect();

        if rows.is_empty() {
            ui.weak(if items.is_empty() {
                match login {
                    Some(login) => format!("No recent GitHub activity found for {login}."),
                    None => "No recent GitHub activity found.".to_owned(),
                }
            } else {
                "No matches for current filter.".to_owned()
            });
            return;
        }

        for item in rows {
            ui.push_id(&item.id, |ui| {
                ui.horizontal(|row| {
                    row.label(activity_icon(item.kind));
                    row.vertical(|cell| {
                        cell.hyperlink_to(&item.repo, &item.repo_url);
                        cell.hyperlink_to(&item.message, &item.url);
                        cell.weak(&item.time);
                    });
                });
            });
            ui.add_space(4.0);
        }
    });
}

fn activity_icon(kind: ActivityKind) -> &'static str {
    match kind {
        ActivityKind::Commit => "⏺",
        ActivityKind::Star => "★",
        ActivityKind::Fork => "⑂",
        ActivityKind::PullRequest => "⇄",
        ActivityKind::Issue => "⊙",
        ActivityKind::Comment => "✉",
        ActivityKind::Create => "+",
        ActivityKind::Unknown => "•",
    }
}

fn draw_language_bars(ui: &mut egui::Ui, entries: &[LanguageBreakdown]) {
    for entry in entries {
        ui.add(
            egui::ProgressBar::new(f32::from(entry.percentage) / 100.0)
                .fill(language_color32(&entry.language))
                .text(format!("{} {}%", entry.language, entry.percentage)),
        );
    }
}

fn aggregate_visible(
    all: &[Repository],
    show_private: bool,
    top_n: usize,
) -> Vec<LanguageBreakdown> {
    let visible = repos::visible(all, show_private);
    languages::aggregate_languages(
        visible
            .iter()
            .map(|repo| (repo.language.as_deref(), repo.size)),
        top_n,
    )
}

fn language_color32(language: &str) -> Color32 {
    let [r, g, b] = languages::language_color(language);
    Color32::from_rgb(r, g, b)
}

/// 1234567 -> "1,234,567"
fn format_number(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

// -----------------------------------------------------------------------------
// Supporting structs
// -----------------------------------------------------------------------------

#[derive(Default)]
struct TokenForm {
    token: String,
}

#[derive(Default)]
struct RepoView {
    query: String,
    sort: RepoSort,
}

#[derive(Default)]
struct FeedView {
    query: String,
    kind: Option<ActivityKind>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
enum ThemeMode {
    #[default]
    Light,
    Dark,
    System,
}

impl ThemeMode {
    const ALL: [ThemeMode; 3] = [ThemeMode::Light, ThemeMode::Dark, ThemeMode::System];

    fn label(&self) -> &'static str {
        match self {
            ThemeMode::Light => "Light",
            ThemeMode::Dark => "Dark",
            ThemeMode::System => "System",
        }
    }

    fn preference(&self) -> ThemePreference {
        match self {
            ThemeMode::Light => ThemePreference::Light,
            ThemeMode::Dark => ThemePreference::Dark,
            ThemeMode::System => ThemePreference::System,
        }
    }

    fn apply(&self, ctx: &Context) {
        ctx.set_theme(self.preference());
    }
}
