use std::sync::{atomic::AtomicBool, Arc, Mutex};
use tokio::sync::mpsc::UnboundedSender;

use crate::{
    presence::DiscordPresence, session::TitleSession, updater::UpdatePhase,
    watch::PresenceCommand,
};

pub(crate) struct AppState {
    pub(crate) http: reqwest::Client,
    pub(crate) session: Mutex<TitleSession>,
    /// Shared with the presence worker; only shutdown locks it directly.
    pub(crate) presence: Arc<Mutex<DiscordPresence>>,
    pub(crate) presence_tx: UnboundedSender<PresenceCommand>,
    pub(crate) update_phase: Mutex<Option<UpdatePhase>>,
    /// Set by the tray's Exit action so the main window really closes.
    pub(crate) quitting: AtomicBool,
}

impl AppState {
    pub(crate) fn new(
        http: reqwest::Client,
        presence: Arc<Mutex<DiscordPresence>>,
        presence_tx: UnboundedSender<PresenceCommand>,
    ) -> Self {
        Self {
            http,
            session: Mutex::new(TitleSession::default()),
            presence,
            presence_tx,
            update_phase: Mutex::new(None),
            quitting: AtomicBool::new(false),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};

    /// State with no worker attached; queued presence commands stay in the
    /// returned receiver.
    pub(crate) fn test_state() -> (AppState, UnboundedReceiver<PresenceCommand>) {
        let (tx, rx) = unbounded_channel();
        let presence = Arc::new(Mutex::new(DiscordPresence::new("test")));
        (AppState::new(reqwest::Client::new(), presence, tx), rx)
    }
}
