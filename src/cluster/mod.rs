//! Media clustering - group raw media records into moments.
//!
//! Two passes over the capture-time-sorted assets: burst detection
//! (rapid-fire runs) first, then greedy temporal/spatial proximity
//! clustering over whatever the burst pass left behind. Each resulting
//! cluster becomes one timeline event with a deterministically chosen
//! key asset.

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use crate::config::ClusteringConfig;
use crate::geometry::haversine_distance_m;
use crate::model::{
    gps_centroid, EventKind, IdAlloc, MediaAsset, MediaCluster, PrivacyLevel, TimelineEvent,
};

/// Result of a clustering run
#[derive(Debug, Clone)]
pub struct ClusteringOutcome {
    /// Intermediate clusters, ordered by start time.
    pub clusters: Vec<MediaCluster>,
    /// One synthesized event per cluster, same order.
    pub events: Vec<TimelineEvent>,
    /// How many of the clusters were bursts.
    pub bursts_found: usize,
    /// Total assets placed into clusters (always equals the input count).
    pub assets_clustered: usize,
}

/// Ownership and naming context for imported moments.
#[derive(Debug, Clone)]
pub struct ImportContext {
    pub owner_id: i64,
    pub context_id: Option<i64>,
    /// Human-readable place name for auto titles, when the caller
    /// already knows one. This engine never geocodes.
    pub location_name: Option<String>,
}

/// Group raw media into moments and synthesize one event per moment.
///
/// Input order is irrelevant; assets are sorted by capture time (id as
/// tie-break) before scanning. Empty input yields an empty outcome.
pub fn cluster_media(
    assets: Vec<MediaAsset>,
    config: &ClusteringConfig,
    import: &ImportContext,
    ids: &mut IdAlloc,
) -> ClusteringOutcome {
    let total = assets.len();
    if total == 0 {
        return ClusteringOutcome {
            clusters: Vec::new(),
            events: Vec::new(),
            bursts_found: 0,
            assets_clustered: 0,
        };
    }

    let mut sorted = assets;
    sorted.sort_by_key(|a| (a.captured_at, a.id));

    let (burst_runs, remainder) = detect_bursts(sorted, config);
    let proximity_runs = cluster_by_proximity(remainder, config);

    let bursts_found = burst_runs.len();
    let mut clusters: Vec<MediaCluster> = burst_runs
        .into_iter()
        .map(|run| build_cluster(run, true))
        .chain(proximity_runs.into_iter().map(|run| build_cluster(run, false)))
        .collect();
    clusters.sort_by_key(|c| (c.start, c.assets[0].id));

    let events: Vec<TimelineEvent> = clusters
        .iter()
        .map(|c| cluster_to_event(c, import, ids))
        .collect();

    debug!(
        clusters = clusters.len(),
        bursts = bursts_found,
        assets = total,
        "clustered media import"
    );

    ClusteringOutcome {
        clusters,
        events,
        bursts_found,
        assets_clustered: total,
    }
}

/// Scan for rapid-capture runs. A run stays open while each consecutive
/// gap is within the burst threshold; it closes when the gap is
/// exceeded (kept as a burst only if it reached the minimum size) or
/// when it hits the maximum size, in which case the next asset starts a
/// fresh run. Returns the burst runs and the assets left for proximity
/// clustering, both still in capture order.
fn detect_bursts(
    sorted: Vec<MediaAsset>,
    config: &ClusteringConfig,
) -> (Vec<Vec<MediaAsset>>, Vec<MediaAsset>) {
    let threshold = Duration::seconds(config.burst_threshold_seconds);
    let mut bursts = Vec::new();
    let mut remainder = Vec::new();
    let mut run: Vec<MediaAsset> = Vec::new();

    for asset in sorted {
        if let Some(last) = run.last() {
            let gap = asset.captured_at - last.captured_at;
            if gap <= threshold {
                run.push(asset);
                if run.len() >= config.max_burst_size {
                    bursts.push(std::mem::take(&mut run));
                }
                continue;
            }
            if run.len() >= config.min_burst_size {
                bursts.push(std::mem::take(&mut run));
            } else {
                remainder.append(&mut run);
            }
        }
        run.push(asset);
    }

    if run.len() >= config.min_burst_size {
        bursts.push(run);
    } else {
        remainder.append(&mut run);
    }

    (bursts, remainder)
}

/// Greedy proximity clustering over non-burst assets. An asset joins
/// the open cluster only while the total elapsed time from the
/// cluster's first asset stays within the temporal threshold and it is
/// within the spatial threshold of every geotagged member already in
/// the cluster. Assets without GPS only face the temporal constraint.
fn cluster_by_proximity(
    remainder: Vec<MediaAsset>,
    config: &ClusteringConfig,
) -> Vec<Vec<MediaAsset>> {
    let window = Duration::minutes(config.temporal_threshold_minutes);
    let mut clusters = Vec::new();
    let mut current: Vec<MediaAsset> = Vec::new();

    for asset in remainder {
        if current.is_empty() {
            current.push(asset);
            continue;
        }

        let elapsed = asset.captured_at - current[0].captured_at;
        let fits_time = elapsed <= window;
        let fits_space = match asset.location {
            Some(here) => current
                .iter()
                .filter_map(|member| member.location)
                .all(|there| haversine_distance_m(here, there) <= config.spatial_threshold_meters),
            None => true,
        };

        if fits_time && fits_space {
            current.push(asset);
        } else {
            clusters.push(std::mem::take(&mut current));
            current.push(asset);
        }
    }

    if !current.is_empty() {
        clusters.push(current);
    }

    clusters
}

/// `assets` is a non-empty run still in capture order.
fn build_cluster(mut assets: Vec<MediaAsset>, is_burst: bool) -> MediaCluster {
    let start = assets[0].captured_at;
    let end = assets[assets.len() - 1].captured_at;
    let center = gps_centroid(&assets);
    let key_asset_id = select_key_asset(&assets).unwrap_or_default();
    for asset in &mut assets {
        asset.is_key_asset = asset.id == key_asset_id;
    }

    MediaCluster {
        assets,
        start,
        end,
        center,
        key_asset_id,
        is_burst,
    }
}

/// Pick the representative asset for a group of media.
///
/// Preference order: assets with complete metadata and GPS, then assets
/// with complete metadata, then anything; within each class the asset
/// closest to the group's temporal midpoint wins, with the lower id as
/// the final tie-break. The same input always yields the same choice.
pub fn select_key_asset(assets: &[MediaAsset]) -> Option<i64> {
    let start = assets.iter().map(|a| a.captured_at).min()?;
    let end = assets.iter().map(|a| a.captured_at).max()?;
    let midpoint = start + (end - start) / 2;

    closest_to(midpoint, assets, |a| a.exif_complete && a.location.is_some())
        .or_else(|| closest_to(midpoint, assets, |a| a.exif_complete))
        .or_else(|| closest_to(midpoint, assets, |_| true))
}

fn closest_to(
    midpoint: DateTime<Utc>,
    assets: &[MediaAsset],
    keep: impl Fn(&MediaAsset) -> bool,
) -> Option<i64> {
    assets
        .iter()
        .filter(|a| keep(a))
        .min_by_key(|a| ((a.captured_at - midpoint).num_milliseconds().abs(), a.id))
        .map(|a| a.id)
}

fn cluster_to_event(
    cluster: &MediaCluster,
    import: &ImportContext,
    ids: &mut IdAlloc,
) -> TimelineEvent {
    let id = ids.next();
    let kind = if cluster.is_burst {
        EventKind::Burst
    } else if cluster.assets.len() > 1 {
        EventKind::Collection
    } else {
        EventKind::Photo
    };
    let (title, description) = describe_cluster(cluster, kind, import.location_name.as_deref());

    let assets: Vec<MediaAsset> = cluster
        .assets
        .iter()
        .map(|a| MediaAsset {
            event_id: id,
            ..a.clone()
        })
        .collect();

    TimelineEvent {
        id,
        owner_id: import.owner_id,
        context_id: import.context_id,
        timestamp: cluster.start,
        kind,
        title,
        description,
        assets,
        participant_ids: Default::default(),
        location: cluster.center,
        privacy: Default::default(),
        tags: Vec::new(),
    }
}

fn describe_cluster(
    cluster: &MediaCluster,
    kind: EventKind,
    location_name: Option<&str>,
) -> (Option<String>, Option<String>) {
    let n = cluster.assets.len();
    let span = format_duration(cluster.end - cluster.start);

    match kind {
        EventKind::Burst => (
            Some(format!("Burst of {} photos", n)),
            Some(format!("{} photos captured within {}", n, span)),
        ),
        EventKind::Collection => {
            let title = match location_name {
                Some(name) => format!("Photos at {}", name),
                None => format!("Collection of {} photos", n),
            };
            (Some(title), Some(format!("{} photos over {}", n, span)))
        }
        _ => (location_name.map(|name| format!("Photo at {}", name)), None),
    }
}

fn format_duration(d: Duration) -> String {
    let secs = d.num_seconds().max(1);
    if secs < 60 {
        count_noun(secs, "second")
    } else if secs < 3600 {
        count_noun(secs / 60, "minute")
    } else {
        count_noun(secs / 3600, "hour")
    }
}

fn count_noun(n: i64, unit: &str) -> String {
    if n == 1 {
        format!("1 {}", unit)
    } else {
        format!("{} {}s", n, unit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::GeoPoint;
    use chrono::TimeZone;
    use std::collections::BTreeSet;

    fn base_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 15, 9, 0, 0).unwrap()
    }

    fn asset(id: i64, offset_secs: i64, location: Option<(f64, f64)>) -> MediaAsset {
        MediaAsset {
            id,
            event_id: 0,
            captured_at: base_time() + Duration::seconds(offset_secs),
            location: location.map(|(lat, lon)| GeoPoint { lat, lon }),
            exif_complete: true,
            is_key_asset: false,
        }
    }

    fn import() -> ImportContext {
        ImportContext {
            owner_id: 1,
            context_id: None,
            location_name: None,
        }
    }

    fn run(assets: Vec<MediaAsset>, config: &ClusteringConfig) -> ClusteringOutcome {
        let mut ids = IdAlloc::new(1000);
        cluster_media(assets, config, &import(), &mut ids)
    }

    #[test]
    fn test_empty_input_is_empty_output() {
        let outcome = run(Vec::new(), &ClusteringConfig::default());
        assert!(outcome.clusters.is_empty());
        assert!(outcome.events.is_empty());
    }

    #[test]
    fn test_simple_burst() {
        // 5 photos 10s apart at the same spot form a single burst.
        let assets: Vec<MediaAsset> = (0..5)
            .map(|i| asset(i, i * 10, Some((48.85, 2.29))))
            .collect();
        let outcome = run(assets, &ClusteringConfig::default());

        assert_eq!(outcome.clusters.len(), 1);
        assert!(outcome.clusters[0].is_burst);
        assert_eq!(outcome.clusters[0].assets.len(), 5);
        assert_eq!(outcome.events[0].kind, EventKind::Burst);
    }

    #[test]
    fn test_burst_closed_by_gap() {
        // Gaps 5,5,5,40,5,5 with a 30s threshold: a burst of four, then
        // a run of three that also qualifies as a burst.
        let offsets = [0, 5, 10, 15, 55, 60, 65];
        let assets: Vec<MediaAsset> = offsets
            .iter()
            .enumerate()
            .map(|(i, &off)| asset(i as i64, off, None))
            .collect();
        let outcome = run(assets, &ClusteringConfig::default());

        assert_eq!(outcome.bursts_found, 2);
        assert_eq!(outcome.clusters[0].assets.len(), 4);
        assert_eq!(outcome.clusters[1].assets.len(), 3);
    }

    #[test]
    fn test_burst_closed_at_max_size() {
        let mut config = ClusteringConfig::default();
        config.max_burst_size = 4;
        let assets: Vec<MediaAsset> = (0..7).map(|i| asset(i, i * 5, None)).collect();
        let outcome = run(assets, &config);

        assert_eq!(outcome.bursts_found, 2);
        assert_eq!(outcome.clusters[0].assets.len(), 4);
        assert_eq!(outcome.clusters[1].assets.len(), 3);
    }

    #[test]
    fn test_short_run_falls_through_to_proximity() {
        // Two photos 5s apart are below the minimum burst size and end
        // up in one proximity cluster instead.
        let assets = vec![asset(1, 0, None), asset(2, 5, None)];
        let outcome = run(assets, &ClusteringConfig::default());

        assert_eq!(outcome.clusters.len(), 1);
        assert!(!outcome.clusters[0].is_burst);
        assert_eq!(outcome.events[0].kind, EventKind::Collection);
    }

    #[test]
    fn test_spatial_threshold_splits_clusters() {
        // Same hour; the first two ~200m apart, the third 10km away.
        let assets = vec![
            asset(1, 0, Some((48.85, 2.29))),
            asset(2, 600, Some((48.85, 2.293))),
            asset(3, 1200, Some((48.94, 2.29))),
        ];
        let outcome = run(assets, &ClusteringConfig::default());

        assert_eq!(outcome.clusters.len(), 2);
        assert_eq!(outcome.clusters[0].assets.len(), 2);
        assert_eq!(outcome.clusters[1].assets.len(), 1);
    }

    #[test]
    fn test_temporal_threshold_splits_clusters() {
        let config = ClusteringConfig::default();
        let beyond = (config.temporal_threshold_minutes + 1) * 60;
        let assets = vec![asset(1, 0, None), asset(2, beyond, None)];
        let outcome = run(assets, &config);

        assert_eq!(outcome.clusters.len(), 2);
    }

    #[test]
    fn test_partition_invariant() {
        // Mixed bursts, gaps, and locations: every input asset id must
        // appear in exactly one cluster.
        let assets = vec![
            asset(1, 0, Some((48.85, 2.29))),
            asset(2, 5, Some((48.85, 2.29))),
            asset(3, 10, Some((48.85, 2.29))),
            asset(4, 15, None),
            asset(5, 3600, Some((48.86, 2.30))),
            asset(6, 4000, None),
            asset(7, 90000, Some((40.71, -74.0))),
        ];
        let input_ids: BTreeSet<i64> = assets.iter().map(|a| a.id).collect();

        let outcome = run(assets, &ClusteringConfig::default());
        let mut seen = Vec::new();
        for cluster in &outcome.clusters {
            seen.extend(cluster.assets.iter().map(|a| a.id));
        }
        let unique: BTreeSet<i64> = seen.iter().copied().collect();

        assert_eq!(seen.len(), unique.len(), "no asset appears twice");
        assert_eq!(unique, input_ids, "no asset is lost");
    }

    #[test]
    fn test_key_asset_prefers_exif_and_gps() {
        let mut a = asset(1, 0, Some((48.85, 2.29)));
        a.exif_complete = false;
        let b = asset(2, 10, None); // exif only
        let c = asset(3, 20, Some((48.85, 2.29))); // exif + gps

        assert_eq!(select_key_asset(&[a, b, c]), Some(3));
    }

    #[test]
    fn test_key_asset_falls_back_to_midpoint() {
        let mut assets: Vec<MediaAsset> = (1..=5).map(|i| asset(i, (i - 1) * 100, None)).collect();
        for a in &mut assets {
            a.exif_complete = false;
            a.location = None;
        }
        // Midpoint of 0..400s is 200s, which is asset 3.
        assert_eq!(select_key_asset(&assets), Some(3));
    }

    #[test]
    fn test_key_asset_is_deterministic() {
        let assets = vec![
            asset(1, 0, Some((48.85, 2.29))),
            asset(2, 10, Some((48.85, 2.29))),
            asset(3, 20, Some((48.85, 2.29))),
        ];
        let first = select_key_asset(&assets);
        for _ in 0..10 {
            assert_eq!(select_key_asset(&assets), first);
        }
    }

    #[test]
    fn test_event_assets_reparented_and_keyed() {
        let assets: Vec<MediaAsset> = (0..5)
            .map(|i| asset(i, i * 10, Some((48.85, 2.29))))
            .collect();
        let outcome = run(assets, &ClusteringConfig::default());

        let event = &outcome.events[0];
        assert!(event.assets.iter().all(|a| a.event_id == event.id));
        assert_eq!(event.assets.iter().filter(|a| a.is_key_asset).count(), 1);
        assert!(event.location.is_some());
        assert!(event.title.as_deref().unwrap().starts_with("Burst of"));
    }

    #[test]
    fn test_location_name_used_in_titles() {
        let mut ids = IdAlloc::new(1);
        let ctx = ImportContext {
            owner_id: 1,
            context_id: Some(7),
            location_name: Some("Lisbon".to_string()),
        };
        let assets = vec![asset(1, 0, None), asset(2, 120, None)];
        let outcome = cluster_media(assets, &ClusteringConfig::default(), &ctx, &mut ids);

        assert_eq!(outcome.events[0].title.as_deref(), Some("Photos at Lisbon"));
        assert_eq!(outcome.events[0].context_id, Some(7));
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::seconds(45)), "45 seconds");
        assert_eq!(format_duration(Duration::seconds(60)), "1 minute");
        assert_eq!(format_duration(Duration::seconds(7200)), "2 hours");
    }
}
