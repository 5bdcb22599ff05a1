#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

mod bridge;
mod channel;
mod config;
mod consts;
mod core;
mod model;
mod presence;
mod session;
mod ui_shell;
mod updater;
mod watch;

use std::sync::{Arc, Mutex};
use tauri::{AppHandle, Manager};
use tauri_plugin_log::{Target, TargetKind};

pub(crate) use crate::consts::*;
pub(crate) use crate::core::{app_version, truncate_message, unix_now_secs};
pub(crate) use crate::model::AppState;

use crate::{
    channel::build_channel_client,
    config::AppConfig,
    presence::DiscordPresence,
    ui_shell::{handle_window_event, keeps_running, show_main_window, start_main_app},
    updater::{current_phase, start_update_flow, UpdatePhase},
    watch::{connect_presence, shutdown_presence, spawn_presence_worker},
};

#[tauri::command]
fn kick_title_changed(app: AppHandle, title: String) -> Result<(), String> {
    watch::handle_title_changed(&app, &title)
}

#[tauri::command]
fn kick_request_observed(app: AppHandle, method: String, url: String) -> Result<(), String> {
    watch::handle_request_observed(&app, &method, &url)
}

#[tauri::command]
fn updater_phase(app: AppHandle) -> Option<UpdatePhase> {
    current_phase(&app)
}

fn main() {
    let config = AppConfig::from_env();

    let log_plugin = tauri_plugin_log::Builder::default()
        .level(config.log_level)
        .clear_targets()
        .target(Target::new(TargetKind::Stdout))
        .target(Target::new(TargetKind::LogDir {
            file_name: Some(LOG_FILE_NAME.into()),
        }))
        .build();

    tauri::Builder::default()
        .plugin(tauri_plugin_single_instance::init(|app, _args, _cwd| {
            log::info!("second instance launched, focusing main window");
            show_main_window(app);
        }))
        .plugin(log_plugin)
        .plugin(tauri_plugin_updater::Builder::new().build())
        .invoke_handler(tauri::generate_handler![
            kick_title_changed,
            kick_request_observed,
            updater_phase
        ])
        .setup(move |app| {
            log::info!(
                "kick-app {} starting (pid={}, dev_mode={})",
                app_version(app.handle()),
                std::process::id(),
                config.dev_mode
            );

            let http = build_channel_client()?;
            let presence = Arc::new(Mutex::new(DiscordPresence::new(DISCORD_CLIENT_ID)));
            let presence_tx = spawn_presence_worker(presence.clone());
            app.manage(AppState::new(http, presence, presence_tx));
            connect_presence(app.handle());

            if config.dev_mode {
                log::info!("dev mode on, skipping update check");
                start_main_app(app.handle());
            } else {
                start_update_flow(app.handle());
            }
            Ok(())
        })
        .on_window_event(|window, event| handle_window_event(window, event))
        .build(tauri::generate_context!())
        .expect("error while building tauri application")
        .run(|app, event| match event {
            #[cfg(target_os = "macos")]
            tauri::RunEvent::Reopen { .. } => show_main_window(app),
            tauri::RunEvent::ExitRequested { api, code, .. } => {
                if keeps_running(app, code) {
                    api.prevent_exit();
                }
            }
            tauri::RunEvent::Exit => shutdown_presence(app),
            _ => {}
        });
}
