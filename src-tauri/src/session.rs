use regex::Regex;
use std::{collections::HashSet, sync::OnceLock};

use crate::{CHANNEL_API_PREFIX, TITLE_SEPARATOR};

static CHANNEL_SEGMENT_RE: OnceLock<Option<Regex>> = OnceLock::new();

/// Per-title interception state. A new epoch starts on every title change and
/// owns a fresh de-duplication set.
#[derive(Debug, Default)]
pub(crate) struct TitleSession {
    epoch: u64,
    armed: bool,
    seen: HashSet<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TitleOutcome {
    Armed,
    Cleared,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ChannelLookup {
    pub(crate) username: String,
    pub(crate) epoch: u64,
}

impl TitleSession {
    pub(crate) fn on_title_changed(&mut self, title: &str) -> TitleOutcome {
        self.epoch = self.epoch.wrapping_add(1);
        self.seen.clear();
        self.armed = is_channel_title(title);
        if self.armed {
            TitleOutcome::Armed
        } else {
            TitleOutcome::Cleared
        }
    }

    /// Returns a lookup only for the first matching request per username in
    /// the current epoch.
    pub(crate) fn observe_request(&mut self, method: &str, url: &str) -> Option<ChannelLookup> {
        if !self.armed {
            return None;
        }
        if method != "GET" || !url.starts_with(CHANNEL_API_PREFIX) {
            return None;
        }
        let username = extract_channel_username(url)?;
        if !self.seen.insert(username.clone()) {
            return None;
        }
        Some(ChannelLookup {
            username,
            epoch: self.epoch,
        })
    }

    pub(crate) fn epoch(&self) -> u64 {
        self.epoch
    }
}

pub(crate) fn is_channel_title(title: &str) -> bool {
    title.contains(TITLE_SEPARATOR)
}

pub(crate) fn extract_channel_username(url: &str) -> Option<String> {
    let re = CHANNEL_SEGMENT_RE
        .get_or_init(|| Regex::new(r"/channels/([^/?#]+)").ok())
        .as_ref()?;
    let segment = re.captures(url)?.get(1)?.as_str();
    if segment.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    Some(segment.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn armed_session() -> TitleSession {
        let mut session = TitleSession::default();
        assert_eq!(session.on_title_changed("xqc | Kick"), TitleOutcome::Armed);
        session
    }

    #[test]
    fn title_without_separator_clears_and_disarms() {
        let mut session = armed_session();
        assert_eq!(session.on_title_changed("Kick"), TitleOutcome::Cleared);
        assert_eq!(
            session.observe_request("GET", "https://kick.com/api/v2/channels/xqc"),
            None
        );
    }

    #[test]
    fn title_change_bumps_epoch() {
        let mut session = TitleSession::default();
        session.on_title_changed("Kick");
        session.on_title_changed("Browse | Kick");
        assert_eq!(session.epoch(), 2);
    }

    #[test]
    fn matching_request_yields_lookup() {
        let mut session = armed_session();
        let lookup = session.observe_request("GET", "https://kick.com/api/v2/channels/xqc/chatroom");
        assert_eq!(
            lookup,
            Some(ChannelLookup {
                username: "xqc".to_string(),
                epoch: 1
            })
        );
    }

    #[test]
    fn non_get_or_foreign_prefix_is_ignored() {
        let mut session = armed_session();
        assert_eq!(
            session.observe_request("POST", "https://kick.com/api/v2/channels/xqc"),
            None
        );
        assert_eq!(
            session.observe_request("GET", "https://kick.com/api/v1/channels/xqc"),
            None
        );
        assert_eq!(
            session.observe_request("GET", "https://www.kick.com/api/v2/channels/xqc"),
            None
        );
    }

    #[test]
    fn numeric_segment_is_ignored() {
        let mut session = armed_session();
        assert_eq!(
            session.observe_request("GET", "https://kick.com/api/v2/channels/12345/messages"),
            None
        );
    }

    #[test]
    fn username_is_fetched_once_per_epoch() {
        let mut session = armed_session();
        assert!(session
            .observe_request("GET", "https://kick.com/api/v2/channels/xqc")
            .is_some());
        assert!(session
            .observe_request("GET", "https://kick.com/api/v2/channels/xqc/chatroom")
            .is_none());
        assert!(session
            .observe_request("GET", "https://kick.com/api/v2/channels/trainwreckstv")
            .is_some());

        session.on_title_changed("xqc | Kick");
        let again = session.observe_request("GET", "https://kick.com/api/v2/channels/xqc");
        assert_eq!(again.map(|lookup| lookup.epoch), Some(2));
    }

    #[test]
    fn extract_stops_at_query() {
        assert_eq!(
            extract_channel_username("https://kick.com/api/v2/channels/xqc?foo=1"),
            Some("xqc".to_string())
        );
        assert_eq!(extract_channel_username("https://kick.com/api/v2/channels/"), None);
    }

    #[test]
    fn mixed_alphanumeric_segment_is_a_username() {
        assert_eq!(
            extract_channel_username("https://kick.com/api/v2/channels/user123"),
            Some("user123".to_string())
        );
    }
}
