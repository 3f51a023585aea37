//! Core data model for the timeline engine.
//!
//! `TimelineEvent` is the only durable entity; everything else here is
//! either owned by an event (`MediaAsset`) or derived on demand
//! (`MediaCluster`, `RenderNode`) and recomputed from scratch on every
//! query.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Decimal WGS84 coordinate pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

/// A single photo or video belonging to exactly one event at a time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaAsset {
    pub id: i64,
    /// Owning event.
    pub event_id: i64,
    pub captured_at: DateTime<Utc>,
    #[serde(default)]
    pub location: Option<GeoPoint>,
    /// Whether the capture metadata was fully parsed (timestamp, camera,
    /// orientation). Assets with partial metadata are deprioritized as
    /// key-asset candidates.
    #[serde(default)]
    pub exif_complete: bool,
    #[serde(default)]
    pub is_key_asset: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    /// A single photo moment.
    Photo,
    /// Rapid-fire capture run.
    Burst,
    /// A proximity-grouped set of photos.
    Collection,
    /// User-written entry without media.
    Note,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrivacyLevel {
    #[default]
    Private,
    Shared,
    Public,
}

/// A life event on the timeline. Created by media import or directly by
/// the user; mutated only through the editing operations in
/// [`crate::edit`] or by direct field edits upstream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineEvent {
    pub id: i64,
    pub owner_id: i64,
    #[serde(default)]
    pub context_id: Option<i64>,
    pub timestamp: DateTime<Utc>,
    pub kind: EventKind,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Capture-ordered media belonging to this event.
    #[serde(default)]
    pub assets: Vec<MediaAsset>,
    /// Other people present at the event, not including the owner.
    #[serde(default)]
    pub participant_ids: BTreeSet<i64>,
    #[serde(default)]
    pub location: Option<GeoPoint>,
    #[serde(default)]
    pub privacy: PrivacyLevel,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl TimelineEvent {
    /// The asset flagged as representative, if any.
    pub fn key_asset(&self) -> Option<&MediaAsset> {
        self.assets.iter().find(|a| a.is_key_asset)
    }

    /// Owner plus explicit participants.
    pub fn everyone(&self) -> BTreeSet<i64> {
        let mut ids = self.participant_ids.clone();
        ids.insert(self.owner_id);
        ids
    }
}

/// Transient grouping of assets produced by the clustering engine.
/// Converted into a `TimelineEvent` before leaving the engine.
#[derive(Debug, Clone)]
pub struct MediaCluster {
    /// Capture-ordered members.
    pub assets: Vec<MediaAsset>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// Centroid of the members that carry GPS data.
    pub center: Option<GeoPoint>,
    pub key_asset_id: i64,
    pub is_burst: bool,
}

/// What the zoom-tier aggregator hands to the layout engines: either a
/// standalone event or a collapsed bucket of them.
#[derive(Debug, Clone)]
pub enum RenderNode {
    Event(TimelineEvent),
    Cluster {
        /// Deterministic id (`"{tier}:{bucket_key}"`), stable across
        /// recomputation so callers can keep expanded-id sets.
        id: String,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        member_ids: Vec<i64>,
        count: usize,
    },
}

impl RenderNode {
    /// Position of the node on the time axis.
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            RenderNode::Event(e) => e.timestamp,
            RenderNode::Cluster { start, .. } => *start,
        }
    }

    pub fn label(&self) -> String {
        match self {
            RenderNode::Event(e) => e
                .title
                .clone()
                .unwrap_or_else(|| format!("{} assets", e.assets.len().max(1))),
            RenderNode::Cluster { count, .. } => format!("{} events", count),
        }
    }

    /// Ids of the events this node stands for.
    pub fn member_event_ids(&self) -> Vec<i64> {
        match self {
            RenderNode::Event(e) => vec![e.id],
            RenderNode::Cluster { member_ids, .. } => member_ids.clone(),
        }
    }
}

/// Monotonic id source for operations that create new events. The core
/// never talks to storage, so the caller seeds this with the next free
/// repository id and persists the mapping afterwards.
#[derive(Debug, Clone)]
pub struct IdAlloc {
    next: i64,
}

impl IdAlloc {
    pub fn new(next: i64) -> Self {
        Self { next }
    }

    pub fn next(&mut self) -> i64 {
        let id = self.next;
        self.next += 1;
        id
    }
}

/// Centroid of the assets that carry GPS coordinates, if any do.
pub fn gps_centroid(assets: &[MediaAsset]) -> Option<GeoPoint> {
    let located: Vec<GeoPoint> = assets.iter().filter_map(|a| a.location).collect();
    if located.is_empty() {
        return None;
    }
    let n = located.len() as f64;
    Some(GeoPoint {
        lat: located.iter().map(|p| p.lat).sum::<f64>() / n,
        lon: located.iter().map(|p| p.lon).sum::<f64>() / n,
    })
}
