use discord_rich_presence::{activity, DiscordIpc, DiscordIpcClient};
use serde::Serialize;

use crate::{
    channel::{classify_channel_body, ChannelOutcome, LiveChannel},
    truncate_message, DOWNLOAD_BUTTON_LABEL, DOWNLOAD_URL, KICK_CHANNEL_URL_BASE,
    PRESENCE_SMALL_IMAGE_KEY, PRESENCE_TEXT_MAX_CHARS, PRESENCE_TEXT_MIN_CHARS, WATCH_BUTTON_LABEL,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct PresenceButton {
    pub(crate) label: String,
    pub(crate) url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PresencePayload {
    pub(crate) details: Option<String>,
    pub(crate) state: Option<String>,
    pub(crate) start_timestamp: i64,
    pub(crate) large_image_key: Option<String>,
    pub(crate) large_image_text: Option<String>,
    pub(crate) small_image_key: String,
    pub(crate) small_image_text: String,
    pub(crate) instance: bool,
    pub(crate) buttons: Vec<PresenceButton>,
}

/// Seam between the channel pipeline and the chat client's presence IPC.
pub(crate) trait PresenceSink {
    fn connect(&mut self) -> Result<(), String> {
        Ok(())
    }
    fn set_activity(&mut self, payload: &PresencePayload) -> Result<(), String>;
    fn clear_activity(&mut self) -> Result<(), String>;
}

/// Discord rejects `details`/`state` shorter than two characters, so those
/// are left out; long ones are cut to the field limit.
pub(crate) fn presence_text(text: Option<&str>) -> Option<String> {
    let text = text?;
    if text.chars().count() < PRESENCE_TEXT_MIN_CHARS {
        return None;
    }
    Some(truncate_message(text, PRESENCE_TEXT_MAX_CHARS))
}

pub(crate) fn project_presence(
    channel: &LiveChannel,
    username: &str,
    app_version: &str,
    started_at: i64,
) -> PresencePayload {
    PresencePayload {
        details: channel.session_title.clone(),
        state: channel.category.clone(),
        start_timestamp: started_at,
        large_image_key: channel.thumbnail_url.clone(),
        large_image_text: channel.display_name.clone(),
        small_image_key: PRESENCE_SMALL_IMAGE_KEY.to_string(),
        small_image_text: format!("Kick App {app_version}"),
        instance: false,
        buttons: vec![
            PresenceButton {
                label: WATCH_BUTTON_LABEL.to_string(),
                url: format!("{KICK_CHANNEL_URL_BASE}/{username}"),
            },
            PresenceButton {
                label: DOWNLOAD_BUTTON_LABEL.to_string(),
                url: DOWNLOAD_URL.to_string(),
            },
        ],
    }
}

/// Turns a fetched channel body into a presence update, or `None` when a
/// guard suppresses it.
pub(crate) fn presence_from_body(
    body: &str,
    username: &str,
    app_version: &str,
    started_at: i64,
) -> Option<PresencePayload> {
    match classify_channel_body(body) {
        ChannelOutcome::Live(channel) => Some(project_presence(
            &channel,
            username,
            app_version,
            started_at,
        )),
        ChannelOutcome::Malformed(reason) => {
            log::debug!("[presence] ignoring channel body for {username}: {reason}");
            None
        }
        ChannelOutcome::Empty | ChannelOutcome::NotFound | ChannelOutcome::Offline => None,
    }
}

pub(crate) struct DiscordPresence {
    client_id: String,
    client: Option<DiscordIpcClient>,
}

impl DiscordPresence {
    pub(crate) fn new(client_id: &str) -> Self {
        Self {
            client_id: client_id.to_string(),
            client: None,
        }
    }

    pub(crate) fn is_connected(&self) -> bool {
        self.client.is_some()
    }

    pub(crate) fn disconnect(&mut self) {
        if let Some(mut client) = self.client.take() {
            if let Err(error) = client.close() {
                log::warn!("[presence] failed to close Discord RPC: {error}");
            }
        }
    }

    fn client(&mut self) -> Result<&mut DiscordIpcClient, String> {
        self.connect()?;
        self.client
            .as_mut()
            .ok_or_else(|| "Discord RPC is not connected".to_string())
    }
}

impl PresenceSink for DiscordPresence {
    fn connect(&mut self) -> Result<(), String> {
        if self.client.is_some() {
            return Ok(());
        }
        let mut client = DiscordIpcClient::new(&self.client_id);
        client
            .connect()
            .map_err(|error| format!("Failed to connect to Discord: {error}"))?;
        log::info!("[presence] connected to Discord RPC");
        self.client = Some(client);
        Ok(())
    }

    fn set_activity(&mut self, payload: &PresencePayload) -> Result<(), String> {
        let details = presence_text(payload.details.as_deref());
        let state = presence_text(payload.state.as_deref());

        let mut assets = activity::Assets::new()
            .small_image(payload.small_image_key.as_str())
            .small_text(payload.small_image_text.as_str());
        if let Some(key) = payload.large_image_key.as_deref() {
            assets = assets.large_image(key);
        }
        if let Some(text) = payload.large_image_text.as_deref() {
            assets = assets.large_text(text);
        }

        let buttons = payload
            .buttons
            .iter()
            .map(|button| activity::Button::new(button.label.as_str(), button.url.as_str()))
            .collect::<Vec<_>>();

        let mut act = activity::Activity::new()
            .timestamps(activity::Timestamps::new().start(payload.start_timestamp))
            .assets(assets)
            .buttons(buttons);
        if let Some(details) = details.as_deref() {
            act = act.details(details);
        }
        if let Some(state) = state.as_deref() {
            act = act.state(state);
        }

        let result = self.client()?.set_activity(act);
        if let Err(error) = result {
            self.client = None;
            return Err(format!("Failed to set activity: {error}"));
        }
        Ok(())
    }

    fn clear_activity(&mut self) -> Result<(), String> {
        // Nothing to clear on a client that never connected.
        let Some(client) = self.client.as_mut() else {
            return Ok(());
        };
        if let Err(error) = client.clear_activity() {
            self.client = None;
            return Err(format!("Failed to clear activity: {error}"));
        }
        Ok(())
    }
}
