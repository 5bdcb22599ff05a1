use tauri::{AppHandle, Runtime};

pub(crate) fn truncate_message(input: &str, max_chars: usize) -> String {
    if input.chars().count() <= max_chars {
        return input.to_string();
    }

    let truncated: String = input.chars().take(max_chars.saturating_sub(3)).collect();
    format!("{truncated}...")
}

pub(crate) fn unix_now_secs() -> i64 {
    chrono::Utc::now().timestamp()
}

pub(crate) fn app_version<R: Runtime>(app: &AppHandle<R>) -> String {
    app.package_info().version.to_string()
}
