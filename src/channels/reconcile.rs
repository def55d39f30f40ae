//! Merge internal channel records with the live connected-account feed.
//!
//! System records own identity and team assignment; live records own metrics
//! and display fields. Output order is stable across refreshes: system-derived
//! rows first in stored order, then live-only rows in feed order.

use std::collections::HashSet;

use serde::Serialize;
use uuid::Uuid;

use crate::errors::ConsoleError;
use crate::models::{non_empty, ChannelOrigin, ChannelRecord, ExternalChannelRecord};

/// Result of one reconciliation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    pub channels: Vec<ChannelRecord>,
    /// Live records that could not be identified
    pub dropped: Vec<ConsoleError>,
}

/// Reconcile `system` against `live`.
///
/// Deterministic: the same inputs always give the same output.
pub fn reconcile(system: &[ChannelRecord], live: &[ExternalChannelRecord]) -> Reconciliation {
    let mut dropped = Vec::new();

    let candidates: Vec<&ExternalChannelRecord> = live
        .iter()
        .enumerate()
        .filter_map(|(index, record)| {
            if record.identity().is_some() {
                return Some(record);
            }
            tracing::warn!(
                index,
                internal_id = record.internal_id.as_deref().unwrap_or(""),
                "Dropping live channel without channelId or id"
            );
            dropped.push(ConsoleError::MalformedRecord(format!(
                "Live channel at position {} has neither channelId nor id",
                index
            )));
            None
        })
        .collect();

    let mut consumed = vec![false; candidates.len()];
    let mut channels = Vec::with_capacity(system.len() + candidates.len());

    for record in system {
        match find_match(record, &candidates, &consumed) {
            Some(slot) => {
                consumed[slot] = true;
                channels.push(merge(record, candidates[slot]));
            }
            None => {
                let mut kept = record.clone();
                kept.origin = ChannelOrigin::System;
                kept.not_in_system = false;
                channels.push(kept);
            }
        }
    }

    let mut seen: HashSet<String> = channels
        .iter()
        .filter_map(|c| non_empty(c.youtube_channel_id.as_deref()).map(str::to_string))
        .collect();

    for (slot, live) in candidates.iter().enumerate() {
        if consumed[slot] {
            continue;
        }
        let Some(identity) = live.identity() else {
            continue;
        };
        if !seen.insert(identity.to_string()) {
            tracing::debug!(channel_id = identity, "Skipping duplicate live channel");
            continue;
        }
        channels.push(synthesize(live, identity));
    }

    Reconciliation { channels, dropped }
}

/// First unconsumed live record matching `system`, trying each rule in turn.
fn find_match(
    system: &ChannelRecord,
    candidates: &[&ExternalChannelRecord],
    consumed: &[bool],
) -> Option<usize> {
    let open = move || {
        candidates
            .iter()
            .enumerate()
            .filter(move |(slot, _)| !consumed[*slot])
    };

    if let Some(youtube_id) = non_empty(system.youtube_channel_id.as_deref()) {
        if let Some((slot, _)) =
            open().find(|(_, live)| non_empty(live.channel_id.as_deref()) == Some(youtube_id))
        {
            return Some(slot);
        }
        if let Some((slot, _)) =
            open().find(|(_, live)| non_empty(live.id.as_deref()) == Some(youtube_id))
        {
            return Some(slot);
        }
    }

    open()
        .find(|(_, live)| non_empty(live.internal_id.as_deref()) == Some(system.id.as_str()))
        .map(|(slot, _)| slot)
}

/// Overlay live display fields and metrics onto a system record.
fn merge(system: &ChannelRecord, live: &ExternalChannelRecord) -> ChannelRecord {
    ChannelRecord {
        id: system.id.clone(),
        youtube_channel_id: non_empty(system.youtube_channel_id.as_deref())
            .or_else(|| live.identity())
            .map(str::to_string),
        name: live.name.clone().or_else(|| system.name.clone()),
        thumbnail_url: live
            .thumbnail_url
            .clone()
            .or_else(|| system.thumbnail_url.clone()),
        custom_url: live.custom_url.clone().or_else(|| system.custom_url.clone()),
        subscriber_count: live.subscriber_count.or(system.subscriber_count),
        view_count: live.view_count.or(system.view_count),
        video_count: live.video_count.or(system.video_count),
        is_connected: true,
        team: system.team.clone(),
        origin: ChannelOrigin::Merged,
        not_in_system: false,
    }
}

/// Build a record for a live channel that has no system counterpart.
fn synthesize(live: &ExternalChannelRecord, identity: &str) -> ChannelRecord {
    ChannelRecord {
        id: synthesized_id(identity),
        youtube_channel_id: Some(identity.to_string()),
        name: live.name.clone(),
        thumbnail_url: live.thumbnail_url.clone(),
        custom_url: live.custom_url.clone(),
        subscriber_count: live.subscriber_count,
        view_count: live.view_count,
        video_count: live.video_count,
        is_connected: true,
        team: None,
        origin: ChannelOrigin::OauthOnly,
        not_in_system: true,
    }
}

/// Stable id derived from the external identity, so refetches keep row keys.
pub fn synthesized_id(identity: &str) -> String {
    Uuid::new_v5(&Uuid::NAMESPACE_URL, format!("youtube:{}", identity).as_bytes()).to_string()
}

/// Totals over a reconciled list.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ChannelStats {
    pub total: usize,
    pub connected: usize,
    pub disconnected: usize,
    pub subscribers: u64,
    pub views: u64,
    pub videos: u64,
}

impl ChannelStats {
    pub fn from_channels(channels: &[ChannelRecord]) -> Self {
        channels.iter().fold(Self::default(), |mut stats, channel| {
            stats.total += 1;
            if channel.is_connected {
                stats.connected += 1;
            } else {
                stats.disconnected += 1;
            }
            stats.subscribers = stats
                .subscribers
                .saturating_add(channel.subscriber_count.unwrap_or(0));
            stats.views = stats.views.saturating_add(channel.view_count.unwrap_or(0));
            stats.videos = stats.videos.saturating_add(channel.video_count.unwrap_or(0));
            stats
        })
    }
}
