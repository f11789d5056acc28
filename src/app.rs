use chrono::Local;
use iced::widget::{column, container, stack};
use iced::{Element, Length, Subscription, Task, Theme};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::core::client::{GrabClient, HistoryBackend};
use crate::core::confirm::{ConfirmToken, CONFIRM_WINDOW};
use crate::core::controller::{load_history, Effect, FilterChange, ReconcileView};
use crate::core::files;
use crate::core::history::{GrabHistoryRow, RowKey};
use crate::core::notice::Notice;
use crate::core::recovery::{run_recovery, RecoveryOutcome};
use crate::core::report::render_report;
use crate::core::sync::{sync_notices, SyncResponse};
use crate::db::schema::{AppSettings, SettingKey};
use crate::db::{self, queries, DbConn};
use crate::theme as app_theme;
use crate::ui;

// ── Message enum ──

/// Results of async work carry the view epoch they were started under, so
/// answers for a disposed view are dropped.
#[derive(Debug, Clone)]
pub enum Message {
    // Init
    Loaded(Result<InitData, String>),

    // History
    Reload,
    AutoRefresh,
    HistoryLoaded(u64, Result<Vec<GrabHistoryRow>, String>),
    FilterChanged(FilterChange),

    // Recovery
    RecoverPressed(RowKey),
    ConfirmExpired(u64, RowKey, ConfirmToken),
    RecoverFinished(u64, RowKey, RecoveryOutcome),

    // Torrent download
    DownloadTorrent(String),
    TorrentSaved(Result<PathBuf, String>),

    // Sync
    SyncRequested,
    SyncFinished(u64, Result<SyncResponse, String>),

    // Export
    ExportRequested,
    ExportFinished(Result<PathBuf, String>),

    // Detail
    OpenDetail(RowKey),
    CloseDetail,
    CopyField(String),

    // Settings
    ToggleSettings,
    SettingChanged(SettingKey, String),
    SaveSettings,
    SettingsSaved(Result<(), String>),

    // Toast
    DismissToast(u64),
    TickToasts,

    // Keyboard
    KeyPressed(iced::keyboard::Key, iced::keyboard::Modifiers),

    Noop,
}

// ── Init data ──

#[derive(Debug, Clone)]
pub struct InitData {
    pub settings: HashMap<String, String>,
}

// ── App state ──

pub struct App {
    pub conn: DbConn,
    pub backend: Option<Arc<dyn HistoryBackend>>,

    // Reconciliation view
    pub view: ReconcileView,
    pub epoch: u64,
    pub syncing: bool,
    pub exporting: bool,

    // Settings
    pub settings: AppSettings,
    pub settings_raw: HashMap<String, String>,
    pub settings_draft: HashMap<String, String>,
    pub settings_open: bool,

    // Toast
    pub toasts: Vec<ui::toast::Toast>,
    pub next_toast_id: u64,
}

impl App {
    fn add_toast(&mut self, notice: Notice) {
        let id = self.next_toast_id;
        self.next_toast_id += 1;
        self.toasts.push(ui::toast::Toast::new(id, notice));
    }

    fn backend(&self) -> Result<Arc<dyn HistoryBackend>, String> {
        self.backend
            .clone()
            .ok_or_else(|| "Serveur non configuré".to_string())
    }

    /// Apply a settings map: typed view, env override, and a fresh client.
    fn install_settings(&mut self, raw: HashMap<String, String>) {
        let mut settings = AppSettings::from_map(&raw);
        if let Some(url) = db::server_url_override() {
            settings.server_url = url;
        }

        self.backend = match GrabClient::new(&settings.server_url, settings.session_token.clone()) {
            Ok(client) => {
                info!("Using grab server at {}", client.base_url());
                Some(Arc::new(client))
            }
            Err(e) => {
                warn!("Invalid server URL {:?}: {e}", settings.server_url);
                self.add_toast(Notice::error(e.to_string()));
                None
            }
        };
        self.settings = settings;
        self.settings_raw = raw;
    }

    /// Tear down the current view and start a new one against the current backend.
    fn recreate_view(&mut self) -> Task<Message> {
        self.view.dispose();
        self.epoch += 1;
        let (view, load) = ReconcileView::create();
        self.view = view;
        self.run_effect(load)
    }

    fn run_effects(&mut self, effects: Vec<Effect>) -> Task<Message> {
        let tasks: Vec<Task<Message>> = effects.into_iter().map(|e| self.run_effect(e)).collect();
        Task::batch(tasks)
    }

    fn run_effect(&mut self, effect: Effect) -> Task<Message> {
        let epoch = self.epoch;
        match effect {
            Effect::Load(query) => match self.backend() {
                Ok(backend) => Task::perform(load_history(backend, query), move |result| {
                    Message::HistoryLoaded(epoch, result)
                }),
                Err(e) => Task::done(Message::HistoryLoaded(epoch, Err(e))),
            },
            Effect::Recover { key, request } => match self.backend() {
                Ok(backend) => Task::perform(run_recovery(backend, request), move |outcome| {
                    Message::RecoverFinished(epoch, key, outcome)
                }),
                Err(e) => Task::done(Message::RecoverFinished(epoch, key, RecoveryOutcome::Error(e))),
            },
            Effect::ArmTimer { key, token } => Task::perform(
                async move {
                    tokio::time::sleep(CONFIRM_WINDOW).await;
                    (key, token)
                },
                move |(key, token)| Message::ConfirmExpired(epoch, key, token),
            ),
            Effect::Notify(notice) => {
                self.add_toast(notice);
                Task::none()
            }
        }
    }
}

impl App {
    pub fn new(conn: DbConn) -> (Self, Task<Message>) {
        let init_conn = conn.clone();
        let init_task = Task::perform(
            async move {
                tokio::task::spawn_blocking(move || -> Result<_, String> {
                    let settings: HashMap<String, String> = queries::fetch_settings(&init_conn)
                        .map_err(|e| e.to_string())?
                        .into_iter()
                        .map(|s| (s.key, s.value))
                        .collect();
                    Ok(InitData { settings })
                })
                .await
                .map_err(|e| format!("Init error: {e}"))?
            },
            Message::Loaded,
        );

        let app = App {
            conn,
            backend: None,
            view: ReconcileView::default(),
            epoch: 0,
            syncing: false,
            exporting: false,
            settings: AppSettings::from_map(&HashMap::new()),
            settings_raw: HashMap::new(),
            settings_draft: HashMap::new(),
            settings_open: false,
            toasts: Vec::new(),
            next_toast_id: 1,
        };

        (app, init_task)
    }

    pub fn title(&self) -> String {
        "GrabDesk".to_string()
    }

    pub fn theme(&self) -> Theme {
        Theme::Dark
    }

    pub fn subscription(&self) -> Subscription<Message> {
        let mut subs = vec![];

        // Toast auto-dismiss ticker
        if !self.toasts.is_empty() {
            subs.push(iced::time::every(Duration::from_millis(100)).map(|_| Message::TickToasts));
        }

        subs.push(iced::keyboard::listen().map(|event| match event {
            iced::keyboard::Event::KeyPressed { key, modifiers, .. } => {
                Message::KeyPressed(key, modifiers)
            }
            _ => Message::Noop,
        }));

        let interval = self.settings.refresh_interval_secs;
        if interval > 0 && self.backend.is_some() {
            subs.push(iced::time::every(Duration::from_secs(interval)).map(|_| Message::AutoRefresh));
        }

        Subscription::batch(subs)
    }

    pub fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::Loaded(Ok(data)) => {
                self.install_settings(data.settings);
                self.recreate_view()
            }
            Message::Loaded(Err(e)) => {
                self.add_toast(Notice::error(format!("Erreur de chargement: {e}")));
                Task::none()
            }

            // ── History ──
            Message::Reload => {
                let load = self.view.begin_load();
                self.run_effect(load)
            }
            Message::AutoRefresh => {
                if self.view.is_loading() {
                    debug!("Auto-refresh skipped, a load is in flight");
                    return Task::none();
                }
                let load = self.view.begin_load();
                self.run_effect(load)
            }
            Message::HistoryLoaded(epoch, result) => {
                if epoch == self.epoch {
                    self.view.apply_loaded(result);
                }
                Task::none()
            }
            Message::FilterChanged(change) => {
                let load = self.view.on_filter_change(change);
                self.run_effect(load)
            }

            // ── Recovery ──
            Message::RecoverPressed(key) => {
                let effects = self.view.activate_recover(key);
                self.run_effects(effects)
            }
            Message::ConfirmExpired(epoch, key, token) => {
                if epoch == self.epoch {
                    self.view.confirm_expired(&key, token);
                }
                Task::none()
            }
            Message::RecoverFinished(epoch, key, outcome) => {
                if epoch != self.epoch {
                    return Task::none();
                }
                let effects = self.view.finish_recovery(&key, outcome);
                self.run_effects(effects)
            }

            // ── Torrent download ──
            Message::DownloadTorrent(file) => {
                let backend = match self.backend() {
                    Ok(backend) => backend,
                    Err(e) => {
                        self.add_toast(Notice::error(e));
                        return Task::none();
                    }
                };
                let dir = self.settings.download_dir.clone();
                Task::perform(
                    async move {
                        let bytes = backend
                            .download_torrent(&file)
                            .await
                            .map_err(|e| e.to_string())?;
                        files::save_torrent(dir, file, bytes).await
                    },
                    Message::TorrentSaved,
                )
            }
            Message::TorrentSaved(Ok(path)) => {
                self.add_toast(Notice::success(format!("Torrent enregistré: {}", path.display())));
                Task::none()
            }
            Message::TorrentSaved(Err(e)) => {
                warn!("Torrent download failed: {e}");
                self.add_toast(Notice::error(format!("Téléchargement impossible: {e}")));
                Task::none()
            }

            // ── Sync ──
            Message::SyncRequested => {
                if self.syncing {
                    return Task::none();
                }
                let backend = match self.backend() {
                    Ok(backend) => backend,
                    Err(e) => {
                        self.add_toast(Notice::error(e));
                        return Task::none();
                    }
                };
                self.syncing = true;
                let epoch = self.epoch;
                Task::perform(
                    async move { backend.sync_history().await.map_err(|e| e.to_string()) },
                    move |result| Message::SyncFinished(epoch, result),
                )
            }
            Message::SyncFinished(epoch, result) => {
                self.syncing = false;
                for notice in sync_notices(&result) {
                    self.add_toast(notice);
                }
                if epoch != self.epoch {
                    return Task::none();
                }
                let load = self.view.begin_load();
                self.run_effect(load)
            }

            // ── Export ──
            Message::ExportRequested => {
                if self.exporting {
                    return Task::none();
                }
                self.exporting = true;
                let now = Local::now();
                let html = render_report(self.view.rows(), self.view.summary(), now);
                let stamp = now.format("%Y%m%d-%H%M%S").to_string();
                let dir = self.settings.download_dir.clone();
                Task::perform(files::write_report(dir, stamp, html), Message::ExportFinished)
            }
            Message::ExportFinished(result) => {
                self.exporting = false;
                match result {
                    Ok(path) => {
                        info!("History report written to {}", path.display());
                        self.add_toast(Notice::success(format!("Rapport exporté: {}", path.display())));
                    }
                    Err(e) => {
                        warn!("History report export failed: {e}");
                        self.add_toast(Notice::error(format!("Export impossible: {e}")));
                    }
                }
                Task::none()
            }

            // ── Detail ──
            Message::OpenDetail(key) => {
                if !self.view.open_detail(key) {
                    debug!("Detail requested for a row no longer cached");
                }
                Task::none()
            }
            Message::CloseDetail => {
                self.view.close_detail();
                Task::none()
            }
            Message::CopyField(value) => {
                self.add_toast(Notice::info("Copié dans le presse-papiers"));
                iced::clipboard::write(value)
            }

            // ── Settings ──
            Message::ToggleSettings => {
                self.settings_open = !self.settings_open;
                if self.settings_open {
                    self.settings_draft = self.settings_raw.clone();
                }
                Task::none()
            }
            Message::SettingChanged(key, value) => {
                self.settings_draft.insert(key.as_str().to_string(), value);
                Task::none()
            }
            Message::SaveSettings => {
                let conn = self.conn.clone();
                let draft = self.settings_draft.clone();

                Task::perform(
                    async move {
                        tokio::task::spawn_blocking(move || {
                            let pairs: Vec<(&str, &str)> = draft
                                .iter()
                                .map(|(k, v)| (k.as_str(), v.as_str()))
                                .collect();
                            queries::update_settings(&conn, &pairs)
                                .map_err(|e| format!("DB error: {e}"))
                        })
                        .await
                        .map_err(|e| format!("Task error: {e}"))?
                    },
                    Message::SettingsSaved,
                )
            }
            Message::SettingsSaved(Ok(())) => {
                let previous = self.settings.clone();
                self.install_settings(self.settings_draft.clone());
                self.settings_open = false;
                self.add_toast(Notice::success("Paramètres enregistrés"));

                let reconnect = previous.server_url != self.settings.server_url
                    || previous.session_token != self.settings.session_token;
                if reconnect {
                    info!("Server settings changed, reloading history");
                    self.recreate_view()
                } else {
                    Task::none()
                }
            }
            Message::SettingsSaved(Err(e)) => {
                self.add_toast(Notice::error(format!("Erreur d'enregistrement: {e}")));
                Task::none()
            }

            // ── Toast ──
            Message::DismissToast(id) => {
                self.toasts.retain(|t| t.id != id);
                Task::none()
            }
            Message::TickToasts => {
                self.toasts.retain(|t| !t.is_expired());
                Task::none()
            }

            // ── Keyboard ──
            Message::KeyPressed(key, modifiers) => {
                use iced::keyboard::Key;

                match key {
                    Key::Named(iced::keyboard::key::Named::Escape) => {
                        if self.view.detail_row().is_some() {
                            self.view.close_detail();
                        } else if self.settings_open {
                            self.settings_open = false;
                        }
                        Task::none()
                    }
                    // No character shortcuts while the settings modal is open or with a command modifier.
                    Key::Character(_) if self.settings_open || modifiers.command() => Task::none(),
                    Key::Character(c) => match c.as_str() {
                        "r" => self.update(Message::Reload),
                        "," => self.update(Message::ToggleSettings),
                        _ => Task::none(),
                    },
                    _ => Task::none(),
                }
            }

            Message::Noop => Task::none(),
        }
    }

    pub fn view(&self) -> Element<'_, Message> {
        let header = ui::header::header_bar(
            self.view.summary(),
            &self.settings.server_url,
            self.syncing,
            self.exporting,
        );

        let filters = ui::filters::filters_bar(
            self.view.filters(),
            self.view.options(),
            self.view.sort(),
            self.view.is_loading(),
        );

        let table = ui::history_table::history_table(&self.view);

        let base = container(
            column![header, filters, table]
                .width(Length::Fill)
                .height(Length::Fill),
        )
        .width(Length::Fill)
        .height(Length::Fill)
        .style(|_: &Theme| container::Style {
            background: Some(app_theme::BG_PRIMARY.into()),
            ..Default::default()
        });

        // Stack for overlays (modals, toasts)
        let mut layers: Vec<Element<'_, Message>> = vec![base.into()];

        if let Some(row) = self.view.detail_row() {
            layers.push(ui::detail_modal::detail_modal(row));
        }

        if self.settings_open {
            layers.push(ui::settings_modal::settings_modal(&self.settings_draft));
        }

        if !self.toasts.is_empty() {
            let toast_view = ui::toast::toast_container(&self.toasts);
            layers.push(
                container(toast_view)
                    .width(Length::Fill)
                    .height(Length::Fill)
                    .align_x(iced::alignment::Horizontal::Right)
                    .align_y(iced::alignment::Vertical::Bottom)
                    .into(),
            );
        }

        stack(layers)
            .width(Length::Fill)
            .height(Length::Fill)
            .into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_in_memory;

    fn app() -> App {
        let (app, _) = App::new(open_in_memory().unwrap());
        app
    }

    fn history_row(download_id: &str, instance: &str) -> GrabHistoryRow {
        GrabHistoryRow {
            download_id: Some(download_id.to_string()),
            instance: Some(instance.to_string()),
            indexer: Some("Torrent9".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_history_answer_for_disposed_view_is_dropped() {
        let mut app = app();
        let _ = app.recreate_view();
        let old_epoch = app.epoch;
        let _ = app.recreate_view();

        let _ = app.update(Message::HistoryLoaded(old_epoch, Ok(vec![history_row("A1", "radarr")])));
        assert!(app.view.rows().is_empty());
        assert!(app.view.is_loading());

        let _ = app.update(Message::HistoryLoaded(app.epoch, Ok(vec![history_row("A1", "radarr")])));
        assert_eq!(app.view.rows().len(), 1);
        assert!(!app.view.is_loading());
    }

    #[test]
    fn test_confirm_timer_from_disposed_view_is_ignored() {
        let mut app = app();
        let _ = app.recreate_view();
        let old_epoch = app.epoch;
        let _ = app.recreate_view();
        let _ = app.update(Message::HistoryLoaded(app.epoch, Ok(vec![history_row("A1", "radarr")])));

        let key = RowKey::new("A1", Some("radarr"));
        let effects = app.view.activate_recover(key.clone());
        let Some(Effect::ArmTimer { token, .. }) = effects.first().cloned() else {
            panic!("expected a timer");
        };

        let _ = app.update(Message::ConfirmExpired(old_epoch, key.clone(), token));
        assert_eq!(app.view.button_view(&key).label, "Confirmer");

        let _ = app.update(Message::ConfirmExpired(app.epoch, key.clone(), token));
        assert_eq!(app.view.button_view(&key).label, "Récupérer");
    }

    #[test]
    fn test_recovery_answer_from_disposed_view_is_ignored() {
        let mut app = app();
        let _ = app.recreate_view();
        let old_epoch = app.epoch;
        let _ = app.recreate_view();
        let _ = app.update(Message::HistoryLoaded(app.epoch, Ok(vec![history_row("A1", "radarr")])));

        let key = RowKey::new("A1", Some("radarr"));
        let _ = app.update(Message::RecoverPressed(key.clone()));
        let _ = app.update(Message::RecoverPressed(key.clone()));
        assert!(!app.view.button_view(&key).enabled);

        let outcome = RecoveryOutcome::Error("stale".into());
        let _ = app.update(Message::RecoverFinished(old_epoch, key.clone(), outcome.clone()));
        assert!(!app.view.button_view(&key).enabled);
        assert!(!app.view.is_loading());

        let _ = app.update(Message::RecoverFinished(app.epoch, key.clone(), outcome));
        assert!(app.view.button_view(&key).enabled);
        assert!(app.view.is_loading());
    }

    #[test]
    fn test_auto_refresh_skipped_while_loading() {
        let mut app = app();
        let _ = app.recreate_view();
        assert!(app.view.is_loading());

        let _ = app.update(Message::AutoRefresh);
        let _ = app.update(Message::HistoryLoaded(app.epoch, Ok(vec![])));
        assert!(!app.view.is_loading());

        let _ = app.update(Message::AutoRefresh);
        assert!(app.view.is_loading());
    }

    #[test]
    fn test_character_shortcuts_ignored_while_settings_open() {
        use iced::keyboard::{key::Named, Key, Modifiers};

        let mut app = app();
        let _ = app.update(Message::KeyPressed(Key::Character(",".into()), Modifiers::default()));
        assert!(app.settings_open);

        let _ = app.update(Message::KeyPressed(Key::Character(",".into()), Modifiers::default()));
        let _ = app.update(Message::KeyPressed(Key::Character("r".into()), Modifiers::default()));
        assert!(app.settings_open);
        assert!(!app.view.is_loading());

        let _ = app.update(Message::KeyPressed(Key::Named(Named::Escape), Modifiers::default()));
        assert!(!app.settings_open);
    }
}
