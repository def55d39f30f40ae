//! Channel records from the internal system and from the connected-account feed.

use serde::{Deserialize, Deserializer, Serialize};

/// Which source(s) contributed a reconciled channel.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ChannelOrigin {
    /// Internal record with no live match
    #[default]
    System,
    /// Internal record overlaid with live data
    Merged,
    /// Live channel not yet imported into the system
    OauthOnly,
}

/// Reference to the team that owns a channel.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TeamRef {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// A channel as managed by the console.
///
/// Records listed by the system database deserialize straight into this type;
/// `origin` and `not_in_system` are then set by reconciliation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChannelRecord {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub youtube_channel_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub custom_url: Option<String>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub subscriber_count: Option<u64>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub view_count: Option<u64>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub video_count: Option<u64>,
    #[serde(default)]
    pub is_connected: bool,
    #[serde(default)]
    pub team: Option<TeamRef>,
    #[serde(default)]
    pub origin: ChannelOrigin,
    /// Set on live channels that an import action has not promoted yet.
    #[serde(default)]
    pub not_in_system: bool,
}

/// A channel as reported by the OAuth-connected account feed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ExternalChannelRecord {
    #[serde(default)]
    pub channel_id: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
    /// Internal id of an already-imported connection
    #[serde(default, rename = "_id")]
    pub internal_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub custom_url: Option<String>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub subscriber_count: Option<u64>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub view_count: Option<u64>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub video_count: Option<u64>,
}

impl ExternalChannelRecord {
    /// The external channel identity: `channelId`, falling back to `id`.
    pub fn identity(&self) -> Option<&str> {
        non_empty(self.channel_id.as_deref()).or_else(|| non_empty(self.id.as_deref()))
    }
}

pub(crate) fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

/// Counters arrive as numbers from the system and as decimal strings from the
/// platform feed. Anything unparseable is treated as absent.
fn lenient_count<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Number(n)) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64)),
        Some(serde_json::Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_origin_wire_names() {
        assert_eq!(
            serde_json::to_value(ChannelOrigin::OauthOnly).unwrap(),
            json!("oauth-only")
        );
        assert_eq!(
            serde_json::to_value(ChannelOrigin::Merged).unwrap(),
            json!("merged")
        );
    }

    #[test]
    fn test_system_record_defaults_to_system_origin() {
        let record: ChannelRecord = serde_json::from_value(json!({
            "id": "s1",
            "youtubeChannelId": "yt1",
            "name": "Old",
            "isConnected": false
        }))
        .unwrap();
        assert_eq!(record.origin, ChannelOrigin::System);
        assert!(!record.not_in_system);
        assert_eq!(record.subscriber_count, None);
    }

    #[test]
    fn test_counts_accept_strings_and_numbers() {
        let live: ExternalChannelRecord = serde_json::from_value(json!({
            "channelId": "yt1",
            "subscriberCount": "1200",
            "viewCount": 50,
            "videoCount": "n/a"
        }))
        .unwrap();
        assert_eq!(live.subscriber_count, Some(1200));
        assert_eq!(live.view_count, Some(50));
        assert_eq!(live.video_count, None);
    }

    #[test]
    fn test_identity_falls_back_to_id() {
        let live: ExternalChannelRecord =
            serde_json::from_value(json!({ "id": "yt2", "_id": "s9" })).unwrap();
        assert_eq!(live.identity(), Some("yt2"));
        assert_eq!(live.internal_id.as_deref(), Some("s9"));

        let blank = ExternalChannelRecord {
            channel_id: Some("  ".into()),
            ..Default::default()
        };
        assert_eq!(blank.identity(), None);
    }
}
