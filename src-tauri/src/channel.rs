use serde::Deserialize;
use std::time::Duration;

use crate::{CHANNEL_API_PREFIX, CHANNEL_NOT_FOUND_MARKER, CHANNEL_REQUEST_TIMEOUT_SECS};

#[derive(Debug, Deserialize)]
pub(crate) struct ChannelWire {
    #[serde(default)]
    pub(crate) message: Option<serde_json::Value>,
    #[serde(default)]
    pub(crate) livestream: Option<LivestreamWire>,
    #[serde(default)]
    pub(crate) user: Option<ChannelUserWire>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LivestreamWire {
    #[serde(default)]
    pub(crate) session_title: Option<String>,
    #[serde(default)]
    pub(crate) categories: Vec<CategoryWire>,
    #[serde(default)]
    pub(crate) thumbnail: Option<ThumbnailWire>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CategoryWire {
    #[serde(default)]
    pub(crate) name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ThumbnailWire {
    #[serde(default)]
    pub(crate) url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChannelUserWire {
    #[serde(default)]
    pub(crate) username: Option<String>,
}

/// The fields of a live channel that feed a presence update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct LiveChannel {
    pub(crate) session_title: Option<String>,
    pub(crate) category: Option<String>,
    pub(crate) thumbnail_url: Option<String>,
    pub(crate) display_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ChannelOutcome {
    Live(LiveChannel),
    Empty,
    NotFound,
    Offline,
    Malformed(String),
}

pub(crate) fn build_channel_client() -> Result<reqwest::Client, String> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(CHANNEL_REQUEST_TIMEOUT_SECS))
        .build()
        .map_err(|error| format!("Failed to build HTTP client: {error}"))
}

pub(crate) fn channel_endpoint(username: &str) -> String {
    format!("{CHANNEL_API_PREFIX}{username}")
}

/// Fetches the raw channel body. The status code is not checked: unknown
/// channels answer with a JSON `message` that the guards handle.
pub(crate) async fn fetch_channel_body(
    client: &reqwest::Client,
    username: &str,
) -> Result<String, String> {
    let endpoint = channel_endpoint(username);
    let response = client
        .get(&endpoint)
        .send()
        .await
        .map_err(|error| format!("Channel request failed for {username}: {error}"))?;
    log::debug!(
        "[channel] GET {endpoint} -> HTTP {}",
        response.status().as_u16()
    );

    response
        .text()
        .await
        .map_err(|error| format!("Failed to read channel body for {username}: {error}"))
}

pub(crate) fn classify_channel_body(body: &str) -> ChannelOutcome {
    let parsed = match serde_json::from_str::<Option<ChannelWire>>(body) {
        Ok(parsed) => parsed,
        Err(error) => return ChannelOutcome::Malformed(format!("invalid JSON: {error}")),
    };
    let Some(channel) = parsed else {
        return ChannelOutcome::Empty;
    };

    let not_found = channel
        .message
        .as_ref()
        .and_then(|message| message.as_str())
        .map_or(false, |message| message.contains(CHANNEL_NOT_FOUND_MARKER));
    if not_found {
        return ChannelOutcome::NotFound;
    }

    let Some(livestream) = channel.livestream else {
        return ChannelOutcome::Offline;
    };
    let Some(category) = livestream.categories.into_iter().next() else {
        return ChannelOutcome::Malformed("livestream has no categories".to_string());
    };
    let Some(thumbnail) = livestream.thumbnail else {
        return ChannelOutcome::Malformed("livestream has no thumbnail".to_string());
    };
    let Some(user) = channel.user else {
        return ChannelOutcome::Malformed("channel has no user".to_string());
    };

    ChannelOutcome::Live(LiveChannel {
        session_title: livestream.session_title,
        category: category.name,
        thumbnail_url: thumbnail.url,
        display_name: user.username,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_body_is_empty() {
        assert_eq!(classify_channel_body("null"), ChannelOutcome::Empty);
    }

    #[test]
    fn invalid_json_is_malformed() {
        assert!(matches!(
            classify_channel_body("<html>502</html>"),
            ChannelOutcome::Malformed(_)
        ));
    }

    #[test]
    fn offline_channel_is_suppressed() {
        assert_eq!(
            classify_channel_body(r#"{"livestream": null}"#),
            ChannelOutcome::Offline
        );
        assert_eq!(classify_channel_body(r#"{"id": 7}"#), ChannelOutcome::Offline);
    }

    #[test]
    fn not_found_message_is_suppressed() {
        let body = r#"{"message":"channel not found in kick.com`s database", "livestream": null}"#;
        assert_eq!(classify_channel_body(body), ChannelOutcome::NotFound);
    }

    #[test]
    fn non_string_message_does_not_count_as_not_found() {
        assert_eq!(
            classify_channel_body(r#"{"message": 404, "livestream": null}"#),
            ChannelOutcome::Offline
        );
    }

    #[test]
    fn live_channel_fields_are_extracted() {
        let body = r#"{
            "message": null,
            "user": {"username": "xQc"},
            "livestream": {
                "session_title": "reacting",
                "categories": [{"name": "Just Chatting"}, {"name": "IRL"}],
                "thumbnail": {"url": "https://images.kick.com/video_thumbnails/x/720.webp"}
            }
        }"#;
        assert_eq!(
            classify_channel_body(body),
            ChannelOutcome::Live(LiveChannel {
                session_title: Some("reacting".to_string()),
                category: Some("Just Chatting".to_string()),
                thumbnail_url: Some(
                    "https://images.kick.com/video_thumbnails/x/720.webp".to_string()
                ),
                display_name: Some("xQc".to_string()),
            })
        );
    }

    #[test]
    fn missing_leaf_fields_still_count_as_live() {
        let absent = r#"{
            "user": {"username": "x"},
            "livestream": {"categories": [{"name": "IRL"}], "thumbnail": {"url": "u"}}
        }"#;
        assert_eq!(
            classify_channel_body(absent),
            ChannelOutcome::Live(LiveChannel {
                session_title: None,
                category: Some("IRL".to_string()),
                thumbnail_url: Some("u".to_string()),
                display_name: Some("x".to_string()),
            })
        );

        let nulls = r#"{
            "user": {"username": null},
            "livestream": {
                "session_title": null,
                "categories": [{"name": null}],
                "thumbnail": {"url": null}
            }
        }"#;
        assert_eq!(
            classify_channel_body(nulls),
            ChannelOutcome::Live(LiveChannel {
                session_title: None,
                category: None,
                thumbnail_url: None,
                display_name: None,
            })
        );
    }

    #[test]
    fn live_channel_without_categories_is_malformed() {
        let body = r#"{
            "user": {"username": "xqc"},
            "livestream": {"session_title": "t", "categories": [], "thumbnail": {"url": "u"}}
        }"#;
        assert!(matches!(
            classify_channel_body(body),
            ChannelOutcome::Malformed(_)
        ));
    }

    #[test]
    fn endpoint_is_parameterized_by_username() {
        assert_eq!(
            channel_endpoint("xqc"),
            "https://kick.com/api/v2/channels/xqc"
        );
    }
}
