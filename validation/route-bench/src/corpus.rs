//! GPS trace corpus loading.
//!
//! The corpus is a CSV file (optionally gzip-compressed) with at least the
//! columns `Latitude`, `Longitude` and `TrackID`. Every row becomes one
//! [`GeoPoint`]; rows sharing a `TrackID` form a [`Track`] in file order.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use tracing::{debug, info};

use crate::error::CorpusError;

const LATITUDE: &str = "Latitude";
const LONGITUDE: &str = "Longitude";
const TRACK_ID: &str = "TrackID";

/// A single coordinate. Values are not range-checked.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// Points sharing a track identifier, in order of appearance.
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    pub id: String,
    pub points: Vec<GeoPoint>,
}

/// Immutable in-memory corpus of coordinates and tracks.
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    points: Vec<GeoPoint>,
    tracks: Vec<Track>,
    track_index: HashMap<String, usize>,
}

impl Corpus {
    /// Load a corpus from disk. Paths ending in `.gz` are decompressed and a
    /// leading `~/` is expanded to the home directory.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, CorpusError> {
        let path = expand_home(path.as_ref());
        let file = File::open(&path).map_err(|source| CorpusError::Open {
            path: path.clone(),
            source,
        })?;

        let reader: Box<dyn Read> = if path.extension().and_then(|e| e.to_str()) == Some("gz") {
            Box::new(GzDecoder::new(BufReader::new(file)))
        } else {
            Box::new(BufReader::new(file))
        };

        let corpus = Self::from_reader(reader)?;
        info!(
            path = %path.display(),
            points = corpus.points.len(),
            tracks = corpus.tracks.len(),
            "Loaded GPS trace corpus"
        );
        Ok(corpus)
    }

    /// Parse CSV data with a header row.
    pub fn from_reader(reader: impl Read) -> Result<Self, CorpusError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(reader);

        let headers = csv_reader.headers()?.clone();
        let column = |name: &'static str| {
            headers
                .iter()
                .position(|h| h == name)
                .ok_or(CorpusError::MissingColumn(name))
        };
        let lat_col = column(LATITUDE)?;
        let lon_col = column(LONGITUDE)?;
        let track_col = column(TRACK_ID)?;

        let mut corpus = Corpus::default();
        for record in csv_reader.records() {
            let record = record?;
            let line = record.position().map(|p| p.line()).unwrap_or(0);

            let field = |idx: usize, name: &str| {
                record.get(idx).ok_or_else(|| CorpusError::Parse {
                    line,
                    message: format!("missing {} field", name),
                })
            };
            let parse = |idx: usize, name: &str| -> Result<f64, CorpusError> {
                let raw = field(idx, name)?;
                raw.trim().parse::<f64>().map_err(|e| CorpusError::Parse {
                    line,
                    message: format!("invalid {} '{}': {}", name, raw, e),
                })
            };

            let point = GeoPoint::new(parse(lat_col, LATITUDE)?, parse(lon_col, LONGITUDE)?);
            let track_id = field(track_col, TRACK_ID)?;
            corpus.push(track_id, point);
        }

        debug!(points = corpus.points.len(), "Parsed corpus records");
        Ok(corpus)
    }

    /// Build a corpus from `(track_id, point)` pairs, in order.
    pub fn from_points<'a>(rows: impl IntoIterator<Item = (&'a str, GeoPoint)>) -> Self {
        let mut corpus = Corpus::default();
        for (track_id, point) in rows {
            corpus.push(track_id, point);
        }
        corpus
    }

    fn push(&mut self, track_id: &str, point: GeoPoint) {
        self.points.push(point);
        match self.track_index.get(track_id).copied() {
            Some(idx) => self.tracks[idx].points.push(point),
            None => {
                self.track_index.insert(track_id.to_string(), self.tracks.len());
                self.tracks.push(Track {
                    id: track_id.to_string(),
                    points: vec![point],
                });
            }
        }
    }

    /// All points in file order.
    pub fn points(&self) -> &[GeoPoint] {
        &self.points
    }

    /// Tracks in order of first appearance.
    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn track(&self, id: &str) -> Option<&Track> {
        self.track_index.get(id).map(|&idx| &self.tracks[idx])
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

fn expand_home(path: &Path) -> PathBuf {
    if let Ok(rest) = path.strip_prefix("~") {
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home).join(rest);
        }
    }
    path.to_path_buf()
}
