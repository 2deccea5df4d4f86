//! Whole-pipeline runs over in-process rank groups, checked against the
//! O(N²) reference.

use std::thread;

use planar_closest::algs::local::brute_force;
use planar_closest::algs::{MergeStrategy, SolveConfig, SolveReport, solve};
use planar_closest::comm::{Communicator, LocalComm};
use planar_closest::geometry::Point;
use proptest::prelude::*;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serial_test::serial;

fn run_pipeline(points: Vec<Point>, ranks: usize, config: SolveConfig) -> SolveReport {
    let mut root_points = Some(points);
    let handles: Vec<_> = LocalComm::group(ranks)
        .into_iter()
        .map(|comm| {
            let pts = if comm.rank() == 0 {
                root_points.take()
            } else {
                None
            };
            thread::spawn(move || solve(&comm, pts, &config).unwrap())
        })
        .collect();
    handles
        .into_iter()
        .filter_map(|h| h.join().unwrap())
        .next()
        .expect("the coordinator reports")
}

fn pts(raw: &[(f64, f64)]) -> Vec<Point> {
    raw.iter().map(|&(x, y)| Point::new(x, y)).collect()
}

fn random_points(n: usize, seed: u64) -> Vec<Point> {
    let mut rng = SmallRng::seed_from_u64(seed);
    (0..n)
        .map(|_| Point::new(rng.gen_range(-500.0..500.0), rng.gen_range(-500.0..500.0)))
        .collect()
}

#[test]
#[serial]
fn matches_brute_force_across_sizes_and_rank_counts() {
    for (n, seed) in [(2, 1u64), (3, 2), (7, 3), (16, 4), (40, 5), (100, 6)] {
        let points = random_points(n, seed);
        let expected = brute_force(&points);
        for ranks in 1..=5 {
            let report = run_pipeline(points.clone(), ranks, SolveConfig::default());
            assert!(
                (report.distance - expected).abs() < 1e-9,
                "n={n} ranks={ranks}: {} vs {expected}",
                report.distance
            );
        }
    }
}

#[test]
#[serial]
fn zone_local_answer_wins_when_no_boundary_pair_beats_it() {
    // Zones {(0,0),(0,1)} and {(5,5),(5,5.5)}: minima 1 and 0.5, and no
    // cross-boundary pair comes close.
    let points = pts(&[(0.0, 0.0), (0.0, 1.0), (5.0, 5.0), (5.0, 5.5)]);
    let report = run_pipeline(points, 2, SolveConfig::default());
    assert!((report.distance - 0.5).abs() < 1e-12);
}

#[test]
#[serial]
fn boundary_straddling_pair_is_found() {
    // Zones {(0,0),(1,0)} and {(1.1,0),(10,10)}: zone minima 1 and ~12.6,
    // but the pair (1,0)-(1.1,0) straddles the boundary at distance 0.1.
    let points = pts(&[(0.0, 0.0), (1.0, 0.0), (1.1, 0.0), (10.0, 10.0)]);
    let report = run_pipeline(points, 2, SolveConfig::default());
    assert!((report.distance - 0.1).abs() < 1e-12);
}

#[test]
#[serial]
fn engineered_pair_exactly_on_a_zone_cut() {
    // Six points over three ranks; the closest pair sits astride the cut
    // between the second and third zone.
    let points = pts(&[
        (0.0, 0.0),
        (2.0, 0.0),
        (4.0, 0.0),
        (4.05, 0.0),
        (8.0, 0.0),
        (10.0, 0.0),
    ]);
    let expected = brute_force(&points);
    let report = run_pipeline(points, 3, SolveConfig::default());
    assert!((report.distance - expected).abs() < 1e-12);
    assert!((report.distance - 0.05).abs() < 1e-12);
}

#[test]
#[serial]
fn fewer_than_two_points_reports_no_pair_on_every_rank_count() {
    for ranks in [1, 3] {
        for points in [vec![], vec![Point::new(1.0, 1.0)]] {
            let report = run_pipeline(points, ranks, SolveConfig::default());
            assert_eq!(report.distance, f64::INFINITY);
            assert!(!report.has_pair());
        }
    }
}

#[test]
#[serial]
fn result_is_idempotent_and_seed_independent() {
    let points = random_points(33, 9);
    let first = run_pipeline(points.clone(), 4, SolveConfig::default());
    let second = run_pipeline(points.clone(), 4, SolveConfig::default());
    assert_eq!(first.distance, second.distance);

    let reseeded = run_pipeline(
        points,
        4,
        SolveConfig {
            seed: 0xDEAD_BEEF,
            ..SolveConfig::default()
        },
    );
    assert_eq!(first.distance, reseeded.distance);
}

#[test]
#[serial]
fn merge_strategies_agree_on_the_final_distance() {
    let points = random_points(57, 12);
    let tree = run_pipeline(points.clone(), 4, SolveConfig::default());
    let kway = run_pipeline(
        points,
        4,
        SolveConfig {
            strategy: MergeStrategy::GatherKWay,
            ..SolveConfig::default()
        },
    );
    assert_eq!(tree.distance, kway.distance);
}

#[test]
#[serial]
fn duplicate_points_yield_distance_zero() {
    let points = pts(&[(3.0, 3.0), (7.0, 1.0), (3.0, 3.0), (9.0, 9.0)]);
    let report = run_pipeline(points, 2, SolveConfig::default());
    assert_eq!(report.distance, 0.0);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    #[serial]
    fn pipeline_never_disagrees_with_brute_force(
        raw in prop::collection::vec((-1000.0..1000.0f64, -1000.0..1000.0f64), 2..40),
        ranks in 1usize..5,
    ) {
        let points: Vec<Point> = raw.iter().map(|&(x, y)| Point::new(x, y)).collect();
        let expected = brute_force(&points);
        let report = run_pipeline(points, ranks, SolveConfig::default());
        prop_assert!((report.distance - expected).abs() <= 1e-9,
            "{} vs {expected}", report.distance);
    }
}
