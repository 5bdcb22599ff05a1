use std::sync::{Arc, Mutex};
use tauri::{AppHandle, Manager, Runtime};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

use crate::{
    app_version,
    channel::fetch_channel_body,
    presence::{presence_from_body, PresencePayload, PresenceSink},
    session::{ChannelLookup, TitleOutcome},
    unix_now_secs, AppState, MAIN_WINDOW_LABEL,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum PresenceUpdate {
    Publish(PresencePayload),
    Clear,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum PresenceCommand {
    Connect,
    Update(PresenceUpdate),
}

/// Applies one update to the sink. Failures are logged and dropped.
pub(crate) fn deliver<S: PresenceSink + ?Sized>(sink: &mut S, update: &PresenceUpdate) {
    let result = match update {
        PresenceUpdate::Publish(payload) => sink.set_activity(payload),
        PresenceUpdate::Clear => sink.clear_activity(),
    };
    if let Err(error) = result {
        log::warn!("[presence] {error}");
    }
}

pub(crate) fn handle_title_changed<R: Runtime>(app: &AppHandle<R>, title: &str) -> Result<(), String> {
    let state = app.state::<AppState>();
    let outcome = state
        .session
        .lock()
        .map_err(|_| "Title session lock poisoned".to_string())?
        .on_title_changed(title);
    log::debug!("[watch] title changed to {title:?}: {outcome:?}");

    if let Some(window) = app.get_webview_window(MAIN_WINDOW_LABEL) {
        let _ = window.set_title(title);
    }
    if outcome == TitleOutcome::Cleared {
        send_presence_update(app, PresenceUpdate::Clear);
    }
    Ok(())
}

pub(crate) fn handle_request_observed<R: Runtime>(
    app: &AppHandle<R>,
    method: &str,
    url: &str,
) -> Result<(), String> {
    if let Some(lookup) = record_request(app, method, url)? {
        let app = app.clone();
        tauri::async_runtime::spawn(async move {
            lookup_and_publish(app, lookup).await;
        });
    }
    Ok(())
}

/// Runs the interceptor checks for one request and returns the lookup to
/// perform, if any.
pub(crate) fn record_request<R: Runtime>(
    app: &AppHandle<R>,
    method: &str,
    url: &str,
) -> Result<Option<ChannelLookup>, String> {
    let lookup = app
        .state::<AppState>()
        .session
        .lock()
        .map_err(|_| "Title session lock poisoned".to_string())?
        .observe_request(method, url);
    if let Some(lookup) = &lookup {
        log::info!(
            "[watch] channel request for {} (epoch {})",
            lookup.username,
            lookup.epoch
        );
    }
    Ok(lookup)
}

async fn lookup_and_publish<R: Runtime>(app: AppHandle<R>, lookup: ChannelLookup) {
    let http = app.state::<AppState>().http.clone();
    match fetch_channel_body(&http, &lookup.username).await {
        Ok(body) => publish_channel_body(&app, &lookup, &body),
        Err(error) => log::warn!("[watch] {error}"),
    }
}

pub(crate) fn publish_channel_body<R: Runtime>(app: &AppHandle<R>, lookup: &ChannelLookup, body: &str) {
    let started_at = unix_now_secs();
    let version = app_version(app);
    let Some(payload) = presence_from_body(body, &lookup.username, &version, started_at) else {
        return;
    };

    // In-flight lookups are not cancelled by navigation; a late result still
    // publishes.
    let current_epoch = app
        .state::<AppState>()
        .session
        .lock()
        .map(|session| session.epoch())
        .unwrap_or(lookup.epoch);
    if current_epoch != lookup.epoch {
        log::debug!(
            "[watch] publishing {} from epoch {} while page is at epoch {current_epoch}",
            lookup.username,
            lookup.epoch
        );
    }

    send_presence_update(app, PresenceUpdate::Publish(payload));
}

/// Starts the single blocking worker that owns Discord IPC. Commands are
/// applied in the order they were queued.
pub(crate) fn spawn_presence_worker<S>(sink: Arc<Mutex<S>>) -> UnboundedSender<PresenceCommand>
where
    S: PresenceSink + Send + 'static,
{
    let (tx, rx) = unbounded_channel();
    tauri::async_runtime::spawn_blocking(move || run_presence_worker(rx, &sink));
    tx
}

pub(crate) fn run_presence_worker<S: PresenceSink>(
    mut commands: UnboundedReceiver<PresenceCommand>,
    sink: &Mutex<S>,
) {
    while let Some(command) = commands.blocking_recv() {
        let Ok(mut presence) = sink.lock() else {
            log::error!("[presence] presence lock poisoned");
            return;
        };
        match command {
            PresenceCommand::Connect => {
                if let Err(error) = presence.connect() {
                    log::error!("[presence] {error}");
                }
            }
            PresenceCommand::Update(update) => deliver(&mut *presence, &update),
        }
    }
    log::debug!("[presence] worker stopped");
}

fn queue_presence<R: Runtime>(app: &AppHandle<R>, command: PresenceCommand) {
    if app.state::<AppState>().presence_tx.send(command).is_err() {
        log::warn!("[presence] worker is gone, dropping update");
    }
}

pub(crate) fn send_presence_update<R: Runtime>(app: &AppHandle<R>, update: PresenceUpdate) {
    queue_presence(app, PresenceCommand::Update(update));
}

pub(crate) fn connect_presence<R: Runtime>(app: &AppHandle<R>) {
    queue_presence(app, PresenceCommand::Connect);
}

/// Runs on the exit path, so it bypasses the queue and clears synchronously.
pub(crate) fn shutdown_presence<R: Runtime>(app: &AppHandle<R>) {
    let Some(state) = app.try_state::<AppState>() else {
        return;
    };
    let Ok(mut presence) = state.presence.lock() else {
        return;
    };
    if presence.is_connected() {
        deliver(&mut *presence, &PresenceUpdate::Clear);
    }
    presence.disconnect();
}
