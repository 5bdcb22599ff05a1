pub(crate) const MAIN_WINDOW_LABEL: &str = "main";
pub(crate) const UPDATER_WINDOW_LABEL: &str = "updater";
pub(crate) const TRAY_ID: &str = "main-tray";

pub(crate) const KICK_HOME_URL: &str = "https://www.kick.com";
pub(crate) const KICK_CHANNEL_URL_BASE: &str = "https://kick.com";
pub(crate) const CHANNEL_API_PREFIX: &str = "https://kick.com/api/v2/channels/";
pub(crate) const CHANNEL_NOT_FOUND_MARKER: &str = "not found in kick.com`s database";
pub(crate) const TITLE_SEPARATOR: &str = " | ";
pub(crate) const CHANNEL_REQUEST_TIMEOUT_SECS: u64 = 10;

pub(crate) const DISCORD_CLIENT_ID: &str = "1112901248421732462";
pub(crate) const PRESENCE_TEXT_MIN_CHARS: usize = 2;
pub(crate) const PRESENCE_TEXT_MAX_CHARS: usize = 128;
pub(crate) const PRESENCE_SMALL_IMAGE_KEY: &str = "app_icon";
pub(crate) const WATCH_BUTTON_LABEL: &str = "Watch Here";
pub(crate) const DOWNLOAD_BUTTON_LABEL: &str = "Download Kick App";
pub(crate) const DOWNLOAD_URL: &str = "https://github.com/ipexadev/kick-app/releases/latest";

pub(crate) const SEARCHING_DWELL_SECS: u64 = 3;
pub(crate) const AVAILABLE_DWELL_SECS: u64 = 10;
pub(crate) const FALLBACK_DWELL_SECS: u64 = 4;
pub(crate) const DOWNLOADED_DWELL_SECS: u64 = 10;

pub(crate) const UPDATER_PHASE_EVENT: &str = "updater://phase";
pub(crate) const UPDATER_PROGRESS_EVENT: &str = "updater://progress";

pub(crate) const DEV_MODE_ENV: &str = "DEV_MODE";
pub(crate) const LOG_LEVEL_ENV: &str = "KICK_APP_LOG";
pub(crate) const LOG_FILE_NAME: &str = "kick-app";
