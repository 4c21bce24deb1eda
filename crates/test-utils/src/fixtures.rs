//! GPS trace corpus fixtures.
//!
//! Corpora are laid out as short synthetic tracks around a fixed anchor so
//! every generated coordinate is distinct and easy to trace back to its
//! track.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use flate2::write::GzEncoder;
use flate2::Compression;

/// Anchor point (Berlin, Brandenburger Tor) as (lat, lon).
pub const ANCHOR: (f64, f64) = (52.516275, 13.377704);

/// Column header used by [`corpus_csv`]. `Timestamp` is an extra column the
/// loader is expected to ignore.
pub const CORPUS_HEADER: &str = "TrackID,Timestamp,Latitude,Longitude";

/// Coordinate of point `index` on track number `track`, as (lat, lon).
pub fn track_point(track: usize, index: usize) -> (f64, f64) {
    (
        ANCHOR.0 + track as f64 * 0.01,
        ANCHOR.1 + index as f64 * 0.0005,
    )
}

/// CSV text with one track per `(id, length)` entry, tracks in order.
pub fn corpus_csv(tracks: &[(&str, usize)]) -> String {
    let mut csv = String::from(CORPUS_HEADER);
    csv.push('\n');
    for (t, (id, len)) in tracks.iter().enumerate() {
        for i in 0..*len {
            let (lat, lon) = track_point(t, i);
            csv.push_str(&format!("{},{},{:.6},{:.6}\n", id, i, lat, lon));
        }
    }
    csv
}

/// Write `csv` to `dir/name`, gzip-compressing when `name` ends in `.gz`.
pub fn write_corpus(dir: &Path, name: &str, csv: &str) -> PathBuf {
    let path = dir.join(name);
    let file = File::create(&path).expect("create corpus fixture");
    if name.ends_with(".gz") {
        let mut encoder = GzEncoder::new(file, Compression::fast());
        encoder.write_all(csv.as_bytes()).expect("write corpus fixture");
        encoder.finish().expect("finish gzip stream");
    } else {
        let mut file = file;
        file.write_all(csv.as_bytes()).expect("write corpus fixture");
    }
    path
}

/// A temporary directory holding one corpus file. Keep the returned
/// `TempDir` alive for as long as the path is used.
pub fn temp_corpus(name: &str, tracks: &[(&str, usize)]) -> (tempfile::TempDir, PathBuf) {
    let dir = tempfile::tempdir().expect("create temp dir");
    let path = write_corpus(dir.path(), name, &corpus_csv(tracks));
    (dir, path)
}
