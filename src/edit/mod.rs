//! Manual editing operations over the event/media partition.
//!
//! Split, merge, move, and key-asset reselection. Every operation is a
//! pure function: inputs are borrowed, fully-updated copies come back,
//! and persistence is the caller's concern. Validation happens up
//! front; an error means nothing changed. No asset is ever lost or
//! duplicated by any of these operations.

use std::collections::{BTreeMap, BTreeSet};

use thiserror::Error;
use tracing::debug;

use crate::cluster::select_key_asset;
use crate::model::{gps_centroid, EventKind, IdAlloc, MediaAsset, TimelineEvent};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EditError {
    #[error("event has fewer than two assets")]
    NotEnoughAssets,

    #[error("split needs at least two non-empty asset groups")]
    TooFewGroups,

    #[error("asset groups must not be empty")]
    EmptyGroup,

    #[error("asset groups do not partition the event's assets")]
    InvalidPartition,

    #[error("merge needs at least two events")]
    NotEnoughEvents,

    #[error("events belong to different owners")]
    MixedOwners,

    #[error("events belong to different contexts")]
    MixedContexts,

    #[error("event {0} is not part of the merge selection")]
    UnknownPrimary(i64),

    #[error("source and target are the same event")]
    SameEvent,

    #[error("asset {asset_id} does not belong to event {event_id}")]
    AssetNotInEvent { asset_id: i64, event_id: i64 },

    #[error("moving these assets would leave the source event empty")]
    WouldEmptySource,
}

/// Split one event into several, one per asset group.
///
/// The groups must partition the event's assets exactly: at least two
/// groups, none empty, no asset missing, duplicated, or foreign. Each
/// resulting event gets a fresh id and key asset; only the first group
/// keeps the original title and description.
pub fn split_event(
    event: &TimelineEvent,
    groups: &[Vec<i64>],
    ids: &mut IdAlloc,
) -> Result<Vec<TimelineEvent>, EditError> {
    if event.assets.len() < 2 {
        return Err(EditError::NotEnoughAssets);
    }
    if groups.len() < 2 {
        return Err(EditError::TooFewGroups);
    }
    if groups.iter().any(|g| g.is_empty()) {
        return Err(EditError::EmptyGroup);
    }

    let mut grouped: Vec<i64> = groups.iter().flatten().copied().collect();
    grouped.sort_unstable();
    let mut owned: Vec<i64> = event.assets.iter().map(|a| a.id).collect();
    owned.sort_unstable();
    if grouped != owned {
        return Err(EditError::InvalidPartition);
    }

    let by_id: BTreeMap<i64, &MediaAsset> =
        event.assets.iter().map(|a| (a.id, a)).collect();

    let mut results = Vec::with_capacity(groups.len());
    for (index, group) in groups.iter().enumerate() {
        let new_id = ids.next();
        let mut assets: Vec<MediaAsset> = group
            .iter()
            .map(|asset_id| MediaAsset {
                event_id: new_id,
                ..(*by_id[asset_id]).clone()
            })
            .collect();
        assets.sort_by_key(|a| (a.captured_at, a.id));
        rekey(&mut assets);

        let timestamp = assets.first().map(|a| a.captured_at).unwrap_or(event.timestamp);
        let location = gps_centroid(&assets).or(event.location);
        results.push(TimelineEvent {
            id: new_id,
            timestamp,
            kind: kind_for_size(assets.len()),
            title: if index == 0 { event.title.clone() } else { None },
            description: if index == 0 { event.description.clone() } else { None },
            location,
            assets,
            ..event.clone()
        });
    }

    debug!(event = event.id, parts = results.len(), "split event");
    Ok(results)
}

/// Merge several events into one.
///
/// All events must share owner and context. The primary (defaulting to
/// the earliest by timestamp) contributes timestamp and metadata; the
/// result combines every asset under a new id, unions participants and
/// tags, and folds titles and descriptions together.
pub fn merge_events(
    events: &[TimelineEvent],
    primary: Option<i64>,
    ids: &mut IdAlloc,
) -> Result<TimelineEvent, EditError> {
    if events.len() < 2 {
        return Err(EditError::NotEnoughEvents);
    }
    if events.iter().any(|e| e.owner_id != events[0].owner_id) {
        return Err(EditError::MixedOwners);
    }
    if events.iter().any(|e| e.context_id != events[0].context_id) {
        return Err(EditError::MixedContexts);
    }

    let primary = match primary {
        Some(id) => events
            .iter()
            .find(|e| e.id == id)
            .ok_or(EditError::UnknownPrimary(id))?,
        None => events
            .iter()
            .min_by_key(|e| (e.timestamp, e.id))
            .expect("at least two events"),
    };

    let new_id = ids.next();
    let mut assets: Vec<MediaAsset> = events
        .iter()
        .flat_map(|e| e.assets.iter())
        .map(|a| MediaAsset {
            event_id: new_id,
            ..a.clone()
        })
        .collect();
    assets.sort_by_key(|a| (a.captured_at, a.id));
    rekey(&mut assets);

    let mut participant_ids: BTreeSet<i64> = BTreeSet::new();
    let mut tags: Vec<String> = Vec::new();
    for event in events {
        participant_ids.extend(event.participant_ids.iter().copied());
        for tag in &event.tags {
            if !tags.contains(tag) {
                tags.push(tag.clone());
            }
        }
    }

    let merged = TimelineEvent {
        id: new_id,
        title: merge_titles(events),
        description: merge_descriptions(events),
        kind: kind_for_size(assets.len()),
        location: gps_centroid(&assets).or(primary.location),
        assets,
        participant_ids,
        tags,
        ..primary.clone()
    };

    debug!(merged = new_id, from = events.len(), "merged events");
    Ok(merged)
}

/// Move assets from one event to another within the same context.
///
/// The move must not empty the source; both resulting events get their
/// key asset reselected. Returns `(source, target)` fully updated.
pub fn move_assets(
    asset_ids: &[i64],
    source: &TimelineEvent,
    target: &TimelineEvent,
) -> Result<(TimelineEvent, TimelineEvent), EditError> {
    if source.id == target.id {
        return Err(EditError::SameEvent);
    }
    if source.context_id != target.context_id {
        return Err(EditError::MixedContexts);
    }
    for asset_id in asset_ids {
        if !source.assets.iter().any(|a| a.id == *asset_id) {
            return Err(EditError::AssetNotInEvent {
                asset_id: *asset_id,
                event_id: source.id,
            });
        }
    }
    if asset_ids.len() >= source.assets.len() {
        return Err(EditError::WouldEmptySource);
    }

    let moving: BTreeSet<i64> = asset_ids.iter().copied().collect();
    let mut new_source = source.clone();
    let mut new_target = target.clone();

    let (moved, kept): (Vec<MediaAsset>, Vec<MediaAsset>) = new_source
        .assets
        .drain(..)
        .partition(|a| moving.contains(&a.id));
    new_source.assets = kept;
    new_target.assets.extend(moved.into_iter().map(|a| MediaAsset {
        event_id: target.id,
        ..a
    }));
    new_target.assets.sort_by_key(|a| (a.captured_at, a.id));

    rekey(&mut new_source.assets);
    rekey(&mut new_target.assets);

    debug!(
        moved = asset_ids.len(),
        from = source.id,
        to = target.id,
        "moved assets"
    );
    Ok((new_source, new_target))
}

/// Make the given asset the event's key asset.
pub fn set_key_asset(event: &TimelineEvent, asset_id: i64) -> Result<TimelineEvent, EditError> {
    if !event.assets.iter().any(|a| a.id == asset_id) {
        return Err(EditError::AssetNotInEvent {
            asset_id,
            event_id: event.id,
        });
    }

    let mut updated = event.clone();
    for asset in &mut updated.assets {
        asset.is_key_asset = asset.id == asset_id;
    }
    Ok(updated)
}

/// Reselect the key asset over the current membership.
fn rekey(assets: &mut [MediaAsset]) {
    let key = select_key_asset(assets);
    for asset in assets {
        asset.is_key_asset = Some(asset.id) == key;
    }
}

fn kind_for_size(asset_count: usize) -> EventKind {
    if asset_count > 1 {
        EventKind::Collection
    } else {
        EventKind::Photo
    }
}

/// One title stays as-is, two distinct join with "&", more collapse to
/// a count.
fn merge_titles(events: &[TimelineEvent]) -> Option<String> {
    let mut titles: Vec<&str> = Vec::new();
    for event in events {
        if let Some(title) = event.title.as_deref() {
            if !title.is_empty() && !titles.contains(&title) {
                titles.push(title);
            }
        }
    }

    match titles.len() {
        0 => None,
        1 => Some(titles[0].to_string()),
        2 => Some(format!("{} & {}", titles[0], titles[1])),
        _ => Some(format!("{} moments", events.len())),
    }
}

fn merge_descriptions(events: &[TimelineEvent]) -> Option<String> {
    let parts: Vec<&str> = events
        .iter()
        .filter_map(|e| e.description.as_deref())
        .filter(|d| !d.is_empty())
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("\n\n"))
    }
}
