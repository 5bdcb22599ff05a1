use serde::Serialize;
use std::time::{Duration, Instant};
use tauri::{AppHandle, Emitter, Manager, WebviewUrl};
use tauri_plugin_updater::UpdaterExt;

use crate::{
    ui_shell::start_main_app, AppState, AVAILABLE_DWELL_SECS, DOWNLOADED_DWELL_SECS,
    FALLBACK_DWELL_SECS, SEARCHING_DWELL_SECS, UPDATER_PHASE_EVENT, UPDATER_PROGRESS_EVENT,
    UPDATER_WINDOW_LABEL,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum UpdatePhase {
    Searching,
    Available,
    Downloading,
    Downloaded,
    NoUpdates,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum UpdateEvent {
    UpdateFound,
    NoUpdate,
    DownloadStarted,
    DownloadFinished,
    Failed,
}

impl UpdatePhase {
    pub(crate) fn next(self, event: UpdateEvent) -> Option<UpdatePhase> {
        use UpdateEvent as E;
        use UpdatePhase as P;
        match (self, event) {
            (P::Searching, E::UpdateFound) => Some(P::Available),
            (P::Searching, E::NoUpdate) => Some(P::NoUpdates),
            (P::Available, E::DownloadStarted) => Some(P::Downloading),
            (P::Downloading, E::DownloadFinished) => Some(P::Downloaded),
            (P::Searching | P::Available | P::Downloading | P::Downloaded, E::Failed) => {
                Some(P::Error)
            }
            _ => None,
        }
    }

    /// Minimum time the phase stays on screen before the flow moves on.
    pub(crate) fn dwell(self) -> Duration {
        match self {
            UpdatePhase::Searching => Duration::from_secs(SEARCHING_DWELL_SECS),
            UpdatePhase::Available => Duration::from_secs(AVAILABLE_DWELL_SECS),
            UpdatePhase::Downloading => Duration::ZERO,
            UpdatePhase::Downloaded => Duration::from_secs(DOWNLOADED_DWELL_SECS),
            UpdatePhase::NoUpdates | UpdatePhase::Error => Duration::from_secs(FALLBACK_DWELL_SECS),
        }
    }

    pub(crate) fn falls_back_to_app(self) -> bool {
        matches!(self, UpdatePhase::NoUpdates | UpdatePhase::Error)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FallbackStep {
    StartMainApp,
    CloseUpdater,
}

/// The main window must exist before the updater window goes away, otherwise
/// the app is left without windows.
pub(crate) const FALLBACK_STEPS: [FallbackStep; 2] =
    [FallbackStep::StartMainApp, FallbackStep::CloseUpdater];

#[derive(Debug)]
pub(crate) struct UpdateFlow {
    phase: UpdatePhase,
    entered_at: Instant,
}

impl UpdateFlow {
    pub(crate) fn new() -> Self {
        Self {
            phase: UpdatePhase::Searching,
            entered_at: Instant::now(),
        }
    }

    pub(crate) fn phase(&self) -> UpdatePhase {
        self.phase
    }

    pub(crate) fn apply(&mut self, event: UpdateEvent) -> Result<UpdatePhase, String> {
        let next = self
            .phase
            .next(event)
            .ok_or_else(|| format!("Invalid update transition {:?} on {event:?}", self.phase))?;
        self.phase = next;
        self.entered_at = Instant::now();
        Ok(next)
    }

    pub(crate) fn remaining_dwell(&self) -> Duration {
        self.phase.dwell().saturating_sub(self.entered_at.elapsed())
    }
}

pub(crate) fn download_percent(downloaded: u64, total: Option<u64>) -> Option<f64> {
    match total {
        Some(total) if total > 0 => Some((downloaded as f64 / total as f64 * 100.0).min(100.0)),
        _ => None,
    }
}

pub(crate) fn current_phase(app: &AppHandle) -> Option<UpdatePhase> {
    app.state::<AppState>()
        .update_phase
        .lock()
        .ok()
        .and_then(|phase| *phase)
}

pub(crate) fn start_update_flow(app: &AppHandle) {
    let app = app.clone();
    tauri::async_runtime::spawn(async move {
        run_update_flow(app).await;
    });
}

async fn run_update_flow(app: AppHandle) {
    if let Err(error) = open_updater_window(&app) {
        log::error!("[updater] failed to open updater window: {error}");
        start_main_app(&app);
        return;
    }

    let mut flow = UpdateFlow::new();
    publish_phase(&app, flow.phase());

    if let Err(error) = drive_update(&app, &mut flow).await {
        log::warn!("[updater] {error}");
        match flow.apply(UpdateEvent::Failed) {
            Ok(phase) => publish_phase(&app, phase),
            Err(error) => log::error!("[updater] {error}"),
        }
    }

    if flow.phase().falls_back_to_app() {
        tokio::time::sleep(flow.remaining_dwell()).await;
        fall_back_to_main_app(&app);
    }
}

fn fall_back_to_main_app(app: &AppHandle) {
    for step in FALLBACK_STEPS {
        match step {
            FallbackStep::StartMainApp => start_main_app(app),
            FallbackStep::CloseUpdater => {
                if let Some(window) = app.get_webview_window(UPDATER_WINDOW_LABEL) {
                    let _ = window.close();
                }
            }
        }
    }
}

async fn drive_update(app: &AppHandle, flow: &mut UpdateFlow) -> Result<(), String> {
    let current_version = app.package_info().version.to_string();
    let check = app
        .updater_builder()
        .version_comparator(|current, release| release.version != current)
        .build()
        .map_err(|error| format!("Failed to build updater: {error}"))?
        .check()
        .await;
    tokio::time::sleep(flow.remaining_dwell()).await;

    let update = check.map_err(|error| format!("Update check failed: {error}"))?;
    let Some(update) = update else {
        log::info!("[updater] {current_version} is current");
        return transition(app, flow, UpdateEvent::NoUpdate);
    };
    log::info!(
        "[updater] update available: {current_version} -> {}",
        update.version
    );

    transition(app, flow, UpdateEvent::UpdateFound)?;
    tokio::time::sleep(flow.remaining_dwell()).await;

    transition(app, flow, UpdateEvent::DownloadStarted)?;
    let progress_app = app.clone();
    let mut downloaded: u64 = 0;
    let bytes = update
        .download(
            move |chunk_length, content_length| {
                downloaded = downloaded.saturating_add(chunk_length as u64);
                if let Some(percent) = download_percent(downloaded, content_length) {
                    let _ = progress_app.emit(UPDATER_PROGRESS_EVENT, percent);
                }
            },
            || log::info!("[updater] download finished"),
        )
        .await
        .map_err(|error| format!("Update download failed: {error}"))?;

    transition(app, flow, UpdateEvent::DownloadFinished)?;
    tokio::time::sleep(flow.remaining_dwell()).await;

    update
        .install(bytes)
        .map_err(|error| format!("Update install failed: {error}"))?;
    log::info!("[updater] installed {}, restarting", update.version);
    app.restart()
}

fn transition(app: &AppHandle, flow: &mut UpdateFlow, event: UpdateEvent) -> Result<(), String> {
    let phase = flow.apply(event)?;
    publish_phase(app, phase);
    Ok(())
}

fn publish_phase(app: &AppHandle, phase: UpdatePhase) {
    log::debug!("[updater] phase {phase:?}");
    if let Ok(mut current) = app.state::<AppState>().update_phase.lock() {
        *current = Some(phase);
    }
    let _ = app.emit(UPDATER_PHASE_EVENT, phase);
}

fn open_updater_window(app: &AppHandle) -> Result<(), String> {
    if app.get_webview_window(UPDATER_WINDOW_LABEL).is_some() {
        return Ok(());
    }
    tauri::WebviewWindowBuilder::new(
        app,
        UPDATER_WINDOW_LABEL,
        WebviewUrl::App("updater.html".into()),
    )
    .title("Kick App | Updater")
    .inner_size(500.0, 500.0)
    .resizable(false)
    .decorations(false)
    .center()
    .build()
    .map(|_| ())
    .map_err(|error| format!("Failed to create updater window: {error}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_path_runs_to_downloaded() {
        let mut flow = UpdateFlow::new();
        assert_eq!(flow.apply(UpdateEvent::UpdateFound), Ok(UpdatePhase::Available));
        assert_eq!(
            flow.apply(UpdateEvent::DownloadStarted),
            Ok(UpdatePhase::Downloading)
        );
        assert_eq!(
            flow.apply(UpdateEvent::DownloadFinished),
            Ok(UpdatePhase::Downloaded)
        );
        assert!(!flow.phase().falls_back_to_app());
    }

    #[test]
    fn no_update_falls_back() {
        let mut flow = UpdateFlow::new();
        assert_eq!(flow.apply(UpdateEvent::NoUpdate), Ok(UpdatePhase::NoUpdates));
        assert!(flow.phase().falls_back_to_app());
    }

    #[test]
    fn failure_from_any_active_phase_is_error() {
        for phase in [
            UpdatePhase::Searching,
            UpdatePhase::Available,
            UpdatePhase::Downloading,
            UpdatePhase::Downloaded,
        ] {
            assert_eq!(phase.next(UpdateEvent::Failed), Some(UpdatePhase::Error));
        }
        assert_eq!(UpdatePhase::Error.next(UpdateEvent::Failed), None);
    }

    #[test]
    fn download_cannot_start_before_update_is_found() {
        let mut flow = UpdateFlow::new();
        assert!(flow.apply(UpdateEvent::DownloadStarted).is_err());
        assert_eq!(flow.phase(), UpdatePhase::Searching);
    }

    #[test]
    fn fallback_creates_main_before_closing_updater() {
        assert_eq!(
            FALLBACK_STEPS,
            [FallbackStep::StartMainApp, FallbackStep::CloseUpdater]
        );
    }

    #[test]
    fn dwell_times_match_screens() {
        assert_eq!(UpdatePhase::Searching.dwell(), Duration::from_secs(3));
        assert_eq!(UpdatePhase::Available.dwell(), Duration::from_secs(10));
        assert_eq!(UpdatePhase::NoUpdates.dwell(), Duration::from_secs(4));
        assert_eq!(UpdatePhase::Error.dwell(), Duration::from_secs(4));
        assert_eq!(UpdatePhase::Downloaded.dwell(), Duration::from_secs(10));
    }

    #[test]
    fn remaining_dwell_never_exceeds_phase_dwell() {
        let flow = UpdateFlow::new();
        assert!(flow.remaining_dwell() <= UpdatePhase::Searching.dwell());
    }

    #[test]
    fn percent_requires_known_length() {
        assert_eq!(download_percent(50, Some(200)), Some(25.0));
        assert_eq!(download_percent(50, None), None);
        assert_eq!(download_percent(50, Some(0)), None);
        assert_eq!(download_percent(300, Some(200)), Some(100.0));
    }

    #[test]
    fn phase_serializes_for_updater_page() {
        assert_eq!(
            serde_json::to_string(&UpdatePhase::NoUpdates).expect("serializable"),
            "\"no_updates\""
        );
    }
}
