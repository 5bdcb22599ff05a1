use std::sync::atomic::Ordering;
use tauri::image::Image;
use tauri::menu::{Menu, MenuItem};
use tauri::tray::{MouseButton, MouseButtonState, TrayIconBuilder, TrayIconEvent};
use tauri::{AppHandle, Manager, Runtime, WebviewUrl, WindowEvent};

use crate::{
    bridge::page_bridge_script, watch::shutdown_presence, AppState, KICK_HOME_URL,
    MAIN_WINDOW_LABEL, TRAY_ID,
};

pub(crate) fn show_main_window<R: Runtime>(app: &AppHandle<R>) {
    if let Some(window) = app.get_webview_window(MAIN_WINDOW_LABEL) {
        let _ = window.show();
        let _ = window.unminimize();
        let _ = window.set_focus();
    }
}

pub(crate) fn handle_window_event<R: Runtime>(window: &tauri::Window<R>, event: &WindowEvent) {
    if window.label() != MAIN_WINDOW_LABEL {
        return;
    }
    if let WindowEvent::CloseRequested { api, .. } = event {
        let quitting = window
            .try_state::<AppState>()
            .map_or(false, |state| state.quitting.load(Ordering::SeqCst));
        if !quitting {
            api.prevent_close();
            let _ = window.hide();
        }
    }
}

/// Closing the last window (the updater handing over, or a hidden main
/// window) must not end the process. Only explicit exits and restarts do.
pub(crate) fn keeps_running<R: Runtime>(app: &AppHandle<R>, code: Option<i32>) -> bool {
    let quitting = app
        .try_state::<AppState>()
        .map_or(false, |state| state.quitting.load(Ordering::SeqCst));
    code.is_none() && !quitting
}

pub(crate) fn tray_icon() -> Option<Image<'static>> {
    Image::from_bytes(include_bytes!("../icons/tray.png"))
        .ok()
        .map(|icon| icon.to_owned())
}

/// Creates the main window and tray once; later calls just show the window.
pub(crate) fn start_main_app(app: &AppHandle) {
    if app.get_webview_window(MAIN_WINDOW_LABEL).is_some() {
        show_main_window(app);
        return;
    }
    if let Err(error) = create_main_window(app) {
        log::error!("[shell] {error}");
        return;
    }
    if app.tray_by_id(TRAY_ID).is_none() {
        if let Err(error) = create_tray(app) {
            log::error!("[shell] failed to create tray: {error}");
        }
    }
}

fn create_main_window(app: &AppHandle) -> Result<(), String> {
    let url = KICK_HOME_URL
        .parse::<tauri::Url>()
        .map_err(|error| format!("Invalid home URL {KICK_HOME_URL}: {error}"))?;
    tauri::WebviewWindowBuilder::new(app, MAIN_WINDOW_LABEL, WebviewUrl::External(url))
        .title("Kick App")
        .inner_size(800.0, 600.0)
        .theme(Some(tauri::Theme::Dark))
        .initialization_script(&page_bridge_script())
        .build()
        .map(|_| ())
        .map_err(|error| format!("Failed to create main window: {error}"))
}

fn create_tray(app: &AppHandle) -> Result<(), tauri::Error> {
    let show_item = MenuItem::with_id(app, "show", "Show", true, None::<&str>)?;
    let exit_item = MenuItem::with_id(app, "exit", "Exit", true, None::<&str>)?;
    let menu = Menu::with_items(app, &[&show_item, &exit_item])?;

    let mut tray_builder = TrayIconBuilder::with_id(TRAY_ID)
        .tooltip("Kick App")
        .menu(&menu)
        .show_menu_on_left_click(false)
        .on_tray_icon_event(|tray, event| {
            if let TrayIconEvent::Click {
                button: MouseButton::Left,
                button_state: MouseButtonState::Up,
                ..
            } = event
            {
                show_main_window(tray.app_handle());
            }
        })
        .on_menu_event(|app, event| match event.id().as_ref() {
            "show" => show_main_window(app),
            "exit" => exit_app(app),
            _ => {}
        });
    if let Some(icon) = tray_icon().or_else(|| app.default_window_icon().cloned()) {
        tray_builder = tray_builder.icon(icon);
    }
    tray_builder.build(app)?;
    Ok(())
}

pub(crate) fn exit_app(app: &AppHandle) {
    log::info!("[shell] exit requested");
    if let Some(state) = app.try_state::<AppState>() {
        state.quitting.store(true, Ordering::SeqCst);
    }
    shutdown_presence(app);
    app.exit(0);
}
