//! The channel list screen's data: both sources fetched together, reconciled,
//! and summarized.

use serde::Serialize;

use super::{reconcile, ChannelStats};
use crate::client::{ChannelScope, ConsoleApi};
use crate::errors::ConsoleError;
use crate::models::{ChannelRecord, ReportError};

/// Reconciled channel list with its totals.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelBoard {
    pub channels: Vec<ChannelRecord>,
    pub stats: ChannelStats,
    /// Live records dropped as unidentifiable
    pub dropped: usize,
    /// Set when the live feed failed and only system records are shown
    pub live_feed_error: Option<ReportError>,
}

impl ChannelBoard {
    fn new(
        channels: Vec<ChannelRecord>,
        dropped: usize,
        live_feed_error: Option<ReportError>,
    ) -> Self {
        Self {
            stats: ChannelStats::from_channels(&channels),
            channels,
            dropped,
            live_feed_error,
        }
    }
}

/// Fetch system and live channels concurrently and reconcile them.
///
/// Unauthorized from either source propagates. Any other live-feed failure
/// degrades to a system-only board.
pub async fn load_channel_board(
    api: &dyn ConsoleApi,
    scope: &ChannelScope,
) -> Result<ChannelBoard, ConsoleError> {
    let (system, live) = tokio::join!(
        api.list_channels(scope),
        api.list_connected_account_channels()
    );

    let system = system?;
    let (live, live_feed_error) = match live {
        Ok(live) => (live, None),
        Err(err @ ConsoleError::Unauthorized(_)) => return Err(err),
        Err(err) => {
            tracing::warn!(error = %err, "Live channel feed unavailable, showing system channels only");
            (Vec::new(), Some(ReportError::from(&err)))
        }
    };

    let result = reconcile(&system, &live);
    tracing::debug!(
        system = system.len(),
        live = live.len(),
        reconciled = result.channels.len(),
        dropped = result.dropped.len(),
        "Channels reconciled"
    );

    Ok(ChannelBoard::new(
        result.channels,
        result.dropped.len(),
        live_feed_error,
    ))
}
