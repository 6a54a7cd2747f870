//! Conversion from the daemon's raw status records to [`NormalizedTorrent`].

use deluge_rpc_types::{Label, NormalizedTorrent, TorrentState};

use crate::wire::RawTorrentStatus;

/// Filter values the daemon adds to the label filter that are not labels.
const PSEUDO_LABELS: &[&str] = &["All", ""];

/// Normalizes one raw status record. Pure: the same input always yields the same output.
pub fn normalize(id: &str, raw: &RawTorrentStatus) -> NormalizedTorrent {
    NormalizedTorrent {
        id: id.to_string(),
        name: raw.name.clone(),
        state: TorrentState::from_daemon(&raw.state),
        state_message: raw.message.clone(),
        progress: raw.progress,
        total_size: raw.total_size,
        total_selected: raw.total_wanted,
        total_downloaded: raw.total_done,
        total_uploaded: raw.total_uploaded,
        download_speed: raw.download_payload_rate,
        upload_speed: raw.upload_payload_rate,
        eta: raw.eta,
        ratio: raw.ratio,
        queue_position: raw.queue,
        save_path: raw.save_path.clone(),
        label: raw.label.clone(),
        connected_peers: raw.num_peers,
        total_peers: raw.total_peers,
        connected_seeds: raw.num_seeds,
        total_seeds: raw.total_seeds,
        // Progress alone decides: a recheck can report "Seeding" below 100%.
        is_completed: raw.progress == 100.0,
        date_added: raw.time_added,
        is_auto_managed: raw.is_auto_managed,
    }
}

/// Normalizes a batch, ordered by ascending queue position. Equal positions keep the input order.
pub fn normalize_all<I, K>(entries: I) -> Vec<NormalizedTorrent>
where
    I: IntoIterator<Item = (K, RawTorrentStatus)>,
    K: AsRef<str>,
{
    let mut torrents: Vec<_> = entries
        .into_iter()
        .map(|(id, raw)| normalize(id.as_ref(), &raw))
        .collect();
    torrents.sort_by_key(|torrent| torrent.queue_position);
    torrents
}

/// Extracts labels from the `"label"` filter of a torrent listing.
pub(crate) fn labels_from_filter(filter: &[(String, u64)]) -> Vec<Label> {
    filter
        .iter()
        .filter(|(name, _)| !PSEUDO_LABELS.contains(&name.as_str()))
        .map(|(name, count)| Label {
            name: name.clone(),
            count: *count,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::make_raw_status;

    #[test]
    fn paused_new_torrent() {
        let raw = make_raw_status("ubuntu-18.04.1-desktop-amd64.iso", "Paused", 1);
        let torrent = normalize("abc123", &raw);

        assert_eq!(torrent.id, "abc123");
        assert_eq!(torrent.name, "ubuntu-18.04.1-desktop-amd64.iso");
        assert_eq!(torrent.state, TorrentState::Paused);
        assert_eq!(torrent.state.token(), "paused");
        assert_eq!(torrent.state_message, "");
        assert!(!torrent.is_completed);
        assert_eq!(torrent.progress, 0.0);
        assert_eq!(torrent.ratio, -1.0);
        assert_eq!(torrent.total_size, 1_953_349_632);
        assert_eq!(torrent.total_selected, 1_953_349_632);
        assert_eq!(torrent.queue_position, 1);
        assert_eq!(torrent.save_path, "/downloads");
        assert_eq!(torrent.label, None);
        assert_eq!(torrent.connected_peers, 0);
        assert_eq!(torrent.total_seeds, 0);
        assert_eq!(torrent.download_speed, 0);
        assert_eq!(torrent.eta, 0);
    }

    #[test]
    fn completion_depends_only_on_progress() {
        let mut raw = make_raw_status("a", "Seeding", -1);
        raw.progress = 99.5;
        assert!(!normalize("a", &raw).is_completed);

        raw.state = "Paused".into();
        raw.progress = 100.0;
        assert!(normalize("a", &raw).is_completed);
    }

    #[test]
    fn units_and_renames_pass_through() {
        let mut raw = make_raw_status("a", "Downloading", 0);
        raw.download_payload_rate = 1_048_576;
        raw.upload_payload_rate = 2048;
        raw.total_done = 10;
        raw.total_uploaded = 5;
        raw.num_peers = 3;
        raw.total_peers = 40;
        raw.num_seeds = 2;
        raw.total_seeds = 100;
        raw.message = "OK".into();
        raw.label = Some("linux".into());

        let torrent = normalize("a", &raw);
        assert_eq!(torrent.download_speed, 1_048_576);
        assert_eq!(torrent.upload_speed, 2048);
        assert_eq!(torrent.total_downloaded, 10);
        assert_eq!(torrent.total_uploaded, 5);
        assert_eq!(torrent.connected_peers, 3);
        assert_eq!(torrent.total_peers, 40);
        assert_eq!(torrent.connected_seeds, 2);
        assert_eq!(torrent.total_seeds, 100);
        assert_eq!(torrent.state_message, "OK");
        assert_eq!(torrent.label.as_deref(), Some("linux"));

        raw.label = Some(String::new());
        assert_eq!(normalize("a", &raw).label.as_deref(), Some(""));

        raw.label = None;
        assert_eq!(normalize("a", &raw).label, None);
    }

    #[test]
    fn unknown_state_is_lowercased() {
        let raw = make_raw_status("a", "Superseeding", 0);
        let torrent = normalize("a", &raw);
        assert_eq!(
            torrent.state,
            TorrentState::Unrecognized("Superseeding".into())
        );
        assert_eq!(torrent.state.token(), "superseeding");
    }

    #[test]
    fn batch_is_ordered_by_queue_position_with_stable_ties() {
        let entries = vec![
            ("c", make_raw_status("c", "Queued", 2)),
            ("a", make_raw_status("a", "Downloading", 0)),
            ("s1", make_raw_status("s1", "Seeding", -1)),
            ("b", make_raw_status("b", "Queued", 2)),
            ("s2", make_raw_status("s2", "Seeding", -1)),
        ];

        let torrents = normalize_all(entries);
        let ids: Vec<_> = torrents.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, ["s1", "s2", "a", "c", "b"]);
    }

    #[test]
    fn empty_batch() {
        assert!(normalize_all(Vec::<(String, RawTorrentStatus)>::new()).is_empty());
    }

    #[test]
    fn label_filter_skips_pseudo_entries() {
        let filter = vec![
            ("All".to_string(), 3),
            (String::new(), 1),
            ("linux".to_string(), 2),
        ];
        assert_eq!(
            labels_from_filter(&filter),
            vec![Label {
                name: "linux".into(),
                count: 2
            }]
        );
    }
}
