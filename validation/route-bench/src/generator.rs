//! Request target generation.
//!
//! Targets are a pure function of the RNG state and the corpus. Two runs
//! that seed [`BenchRng`] identically issue byte-identical request sequences,
//! which is what makes latencies from two service builds comparable.

use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

use rand::seq::{index, SliceRandom};
use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha12Rng;
use serde::{Deserialize, Serialize};

use crate::corpus::{Corpus, GeoPoint};
use crate::error::{GenerateError, UnknownKindError};

/// Seed used when none is configured.
pub const DEFAULT_SEED: u64 = 42;

const TABLE_POINTS: RangeInclusive<usize> = 3..=12;
const TRIP_POINTS: RangeInclusive<usize> = 2..=10;
const MATCH_POINTS: RangeInclusive<usize> = 50..=100;
/// Per-point search radius for match requests, in metres.
const MATCH_RADIUS: RangeInclusive<u32> = 10..=20;

/// The request shapes the harness can benchmark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BenchmarkKind {
    Route,
    Nearest,
    Table,
    Trip,
    Match,
}

impl BenchmarkKind {
    pub const ALL: [BenchmarkKind; 5] = [
        BenchmarkKind::Route,
        BenchmarkKind::Nearest,
        BenchmarkKind::Table,
        BenchmarkKind::Trip,
        BenchmarkKind::Match,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BenchmarkKind::Route => "route",
            BenchmarkKind::Nearest => "nearest",
            BenchmarkKind::Table => "table",
            BenchmarkKind::Trip => "trip",
            BenchmarkKind::Match => "match",
        }
    }
}

impl fmt::Display for BenchmarkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BenchmarkKind {
    type Err = UnknownKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BenchmarkKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| UnknownKindError(s.to_string()))
    }
}

/// Seeded random source shared by everything that draws request data.
///
/// This is passed explicitly rather than living in a global so that the
/// reseed checkpoints are visible at the call sites. The stream comes from
/// ChaCha12 directly rather than `StdRng`, whose algorithm may change
/// between rand releases.
#[derive(Debug, Clone)]
pub struct BenchRng {
    seed: u64,
    inner: ChaCha12Rng,
}

impl BenchRng {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            inner: ChaCha12Rng::seed_from_u64(seed),
        }
    }

    /// Restart the random sequence from `seed`.
    pub fn reseed(&mut self, seed: u64) {
        self.seed = seed;
        self.inner = ChaCha12Rng::seed_from_u64(seed);
    }

    /// The seed most recently applied.
    pub fn seed(&self) -> u64 {
        self.seed
    }
}

impl RngCore for BenchRng {
    fn next_u32(&mut self) -> u32 {
        self.inner.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.inner.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.inner.fill_bytes(dest)
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.inner.try_fill_bytes(dest)
    }
}

/// A generated request: kind, coordinates and per-point radii.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestTarget {
    pub kind: BenchmarkKind,
    pub coordinates: Vec<GeoPoint>,
    /// One entry per coordinate for match requests, empty otherwise.
    pub radiuses: Vec<u32>,
}

impl RequestTarget {
    /// Path and query, e.g. `/route/v1/driving/13.388860,52.517037;...?steps=true`.
    pub fn path(&self) -> String {
        let mut path = format!(
            "/{}/v1/driving/{}",
            self.kind,
            encode_coordinates(&self.coordinates)
        );
        let query = self.query();
        if !query.is_empty() {
            path.push('?');
            path.push_str(&query);
        }
        path
    }

    /// Full URL against `host`. A trailing slash on the host is ignored.
    pub fn url(&self, host: &str) -> String {
        format!("{}{}", host.trim_end_matches('/'), self.path())
    }

    fn query(&self) -> String {
        match self.kind {
            BenchmarkKind::Route => "overview=full&steps=true".to_string(),
            BenchmarkKind::Nearest | BenchmarkKind::Table => String::new(),
            BenchmarkKind::Trip => "steps=true".to_string(),
            BenchmarkKind::Match => {
                let radiuses: Vec<String> = self.radiuses.iter().map(|r| r.to_string()).collect();
                format!("steps=true&radiuses={}", radiuses.join(";"))
            }
        }
    }
}

impl fmt::Display for RequestTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

/// Semicolon-separated `lon,lat` pairs with 6 decimal digits.
pub fn encode_coordinates(points: &[GeoPoint]) -> String {
    points
        .iter()
        .map(|p| format!("{:.6},{:.6}", p.lon, p.lat))
        .collect::<Vec<_>>()
        .join(";")
}

/// Draw one request of `kind` from `corpus`.
///
/// Draw order is fixed per kind (point count, then points or track, then
/// radii) so that a given RNG state always yields the same target.
pub fn build_request(
    kind: BenchmarkKind,
    corpus: &Corpus,
    rng: &mut BenchRng,
) -> Result<RequestTarget, GenerateError> {
    let (coordinates, radiuses) = match kind {
        BenchmarkKind::Route => (sample_points(kind, corpus, rng, 2)?, Vec::new()),
        BenchmarkKind::Nearest => (sample_points(kind, corpus, rng, 1)?, Vec::new()),
        BenchmarkKind::Table => {
            let count = rng.gen_range(TABLE_POINTS);
            (sample_points(kind, corpus, rng, count)?, Vec::new())
        }
        BenchmarkKind::Trip => {
            let count = rng.gen_range(TRIP_POINTS);
            (sample_points(kind, corpus, rng, count)?, Vec::new())
        }
        BenchmarkKind::Match => {
            let count = rng.gen_range(MATCH_POINTS);
            let track = corpus.tracks().choose(rng).ok_or(GenerateError::NoTracks)?;
            let points: Vec<GeoPoint> = track.points.iter().take(count).copied().collect();
            let radiuses: Vec<u32> = points
                .iter()
                .map(|_| rng.gen_range(MATCH_RADIUS))
                .collect();
            (points, radiuses)
        }
    };

    Ok(RequestTarget {
        kind,
        coordinates,
        radiuses,
    })
}

/// Distinct corpus points, without replacement.
fn sample_points(
    kind: BenchmarkKind,
    corpus: &Corpus,
    rng: &mut BenchRng,
    count: usize,
) -> Result<Vec<GeoPoint>, GenerateError> {
    if corpus.len() < count {
        return Err(GenerateError::CorpusTooSmall {
            kind,
            needed: count,
            available: corpus.len(),
        });
    }
    let points = corpus.points();
    Ok(index::sample(rng, points.len(), count)
        .iter()
        .map(|i| points[i])
        .collect())
}

/// Produces successive targets of one kind from a borrowed corpus.
pub struct RequestGenerator<'a> {
    kind: BenchmarkKind,
    corpus: &'a Corpus,
    rng: BenchRng,
}

impl<'a> RequestGenerator<'a> {
    pub fn new(kind: BenchmarkKind, corpus: &'a Corpus, seed: u64) -> Self {
        Self {
            kind,
            corpus,
            rng: BenchRng::new(seed),
        }
    }

    pub fn kind(&self) -> BenchmarkKind {
        self.kind
    }

    pub fn next_target(&mut self) -> Result<RequestTarget, GenerateError> {
        build_request(self.kind, self.corpus, &mut self.rng)
    }

    pub fn reseed(&mut self, seed: u64) {
        self.rng.reseed(seed);
    }

    pub fn seed(&self) -> u64 {
        self.rng.seed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid_corpus(tracks: usize, points_per_track: usize) -> Corpus {
        let ids: Vec<String> = (0..tracks).map(|t| format!("track-{t}")).collect();
        let mut rows = Vec::new();
        for (t, id) in ids.iter().enumerate() {
            for p in 0..points_per_track {
                let point = GeoPoint::new(52.0 + t as f64 * 0.01, 13.0 + p as f64 * 0.001);
                rows.push((id.as_str(), point));
            }
        }
        Corpus::from_points(rows)
    }

    #[test]
    fn test_kind_names_round_trip() {
        for kind in BenchmarkKind::ALL {
            assert_eq!(kind.to_string().parse::<BenchmarkKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_unknown_kind() {
        let err = "isochrone".parse::<BenchmarkKind>().unwrap_err();
        assert_eq!(err, UnknownKindError("isochrone".to_string()));
        assert!("Route".parse::<BenchmarkKind>().is_err());
    }

    #[test]
    fn test_coordinate_encoding_is_lon_lat() {
        let points = [GeoPoint::new(52.517037, 13.388860), GeoPoint::new(-1.5, 2.25)];
        assert_eq!(
            encode_coordinates(&points),
            "13.388860,52.517037;2.250000,-1.500000"
        );
    }

    #[test]
    fn test_route_target_shape() {
        let corpus = grid_corpus(2, 10);
        let mut rng = BenchRng::new(DEFAULT_SEED);
        let target = build_request(BenchmarkKind::Route, &corpus, &mut rng).unwrap();

        assert_eq!(target.coordinates.len(), 2);
        assert_ne!(target.coordinates[0], target.coordinates[1]);
        let url = target.url("http://localhost:5000/");
        assert!(url.starts_with("http://localhost:5000/route/v1/driving/"));
        assert!(url.ends_with("?overview=full&steps=true"));
    }

    #[test]
    fn test_nearest_has_no_query() {
        let corpus = grid_corpus(1, 5);
        let mut rng = BenchRng::new(1);
        let target = build_request(BenchmarkKind::Nearest, &corpus, &mut rng).unwrap();
        assert_eq!(target.coordinates.len(), 1);
        assert!(!target.path().contains('?'));
        assert!(target.path().starts_with("/nearest/v1/driving/"));
    }

    #[test]
    fn test_table_arity_bounds() {
        let corpus = grid_corpus(3, 20);
        let mut rng = BenchRng::new(DEFAULT_SEED);
        for _ in 0..1000 {
            let target = build_request(BenchmarkKind::Table, &corpus, &mut rng).unwrap();
            assert!((3..=12).contains(&target.coordinates.len()));
            assert_eq!(target.path().matches(';').count(), target.coordinates.len() - 1);
        }
    }

    #[test]
    fn test_trip_arity_bounds() {
        let corpus = grid_corpus(3, 20);
        let mut rng = BenchRng::new(7);
        for _ in 0..1000 {
            let target = build_request(BenchmarkKind::Trip, &corpus, &mut rng).unwrap();
            assert!((2..=10).contains(&target.coordinates.len()));
            assert!(target.path().ends_with("?steps=true"));
        }
    }

    #[test]
    fn test_match_uses_prefix_of_single_track() {
        let corpus = grid_corpus(4, 150);
        let mut rng = BenchRng::new(DEFAULT_SEED);
        for _ in 0..1000 {
            let target = build_request(BenchmarkKind::Match, &corpus, &mut rng).unwrap();
            let n = target.coordinates.len();
            assert!((50..=100).contains(&n));
            assert_eq!(target.radiuses.len(), n);
            assert!(target.radiuses.iter().all(|r| (10..=20).contains(r)));

            let owner = corpus
                .tracks()
                .iter()
                .find(|t| t.points[..n] == target.coordinates[..]);
            assert!(owner.is_some(), "coordinates are not a track prefix");

            let query = target.path();
            let radiuses = query.split("radiuses=").nth(1).unwrap();
            assert_eq!(radiuses.split(';').count(), n);
        }
    }

    #[test]
    fn test_match_clamps_to_track_length() {
        let corpus = grid_corpus(2, 12);
        let mut rng = BenchRng::new(3);
        let target = build_request(BenchmarkKind::Match, &corpus, &mut rng).unwrap();
        assert_eq!(target.coordinates.len(), 12);
        assert_eq!(target.radiuses.len(), 12);
    }

    #[test]
    fn test_same_seed_same_sequence() {
        let corpus = grid_corpus(3, 120);
        for kind in BenchmarkKind::ALL {
            let mut a = RequestGenerator::new(kind, &corpus, DEFAULT_SEED);
            let mut b = RequestGenerator::new(kind, &corpus, DEFAULT_SEED);
            for _ in 0..50 {
                assert_eq!(a.next_target().unwrap().path(), b.next_target().unwrap().path());
            }
        }
    }

    #[test]
    fn test_reseed_restarts_sequence() {
        let corpus = grid_corpus(2, 30);
        let mut generator = RequestGenerator::new(BenchmarkKind::Table, &corpus, 9);
        let first: Vec<String> = (0..10).map(|_| generator.next_target().unwrap().path()).collect();
        generator.reseed(9);
        let second: Vec<String> = (0..10).map(|_| generator.next_target().unwrap().path()).collect();
        assert_eq!(first, second);
        assert_eq!(generator.seed(), 9);
    }

    #[test]
    fn test_stream_is_chacha12() {
        let mut rng = BenchRng::new(DEFAULT_SEED);
        let mut reference = ChaCha12Rng::seed_from_u64(DEFAULT_SEED);
        for _ in 0..32 {
            assert_eq!(rng.next_u64(), reference.next_u64());
        }

        rng.reseed(7);
        let mut reference = ChaCha12Rng::seed_from_u64(7);
        for _ in 0..32 {
            assert_eq!(rng.next_u32(), reference.next_u32());
        }
    }

    #[test]
    fn test_different_seeds_diverge() {
        let corpus = grid_corpus(2, 30);
        let mut a = RequestGenerator::new(BenchmarkKind::Table, &corpus, 1);
        let mut b = RequestGenerator::new(BenchmarkKind::Table, &corpus, 2);
        let a: Vec<String> = (0..10).map(|_| a.next_target().unwrap().path()).collect();
        let b: Vec<String> = (0..10).map(|_| b.next_target().unwrap().path()).collect();
        assert_ne!(a, b);
    }

    #[test]
    fn test_small_corpus_is_an_error() {
        let corpus = grid_corpus(1, 1);
        let mut rng = BenchRng::new(DEFAULT_SEED);
        let err = build_request(BenchmarkKind::Route, &corpus, &mut rng).unwrap_err();
        assert_eq!(
            err,
            GenerateError::CorpusTooSmall {
                kind: BenchmarkKind::Route,
                needed: 2,
                available: 1
            }
        );
    }

    #[test]
    fn test_match_without_tracks() {
        let corpus = Corpus::default();
        let mut rng = BenchRng::new(DEFAULT_SEED);
        let err = build_request(BenchmarkKind::Match, &corpus, &mut rng).unwrap_err();
        assert_eq!(err, GenerateError::NoTracks);
    }
}
