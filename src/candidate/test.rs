use crate::candidate::*;
use crate::config::{ConfigError, ManualCandidates, MapperConfig, ModeParams};
use crate::diagnostics::{Counter, Diagnostics};
use crate::network::{LinkIx, LinkSpec, Mode, Network, NodeIx, Scan, SearchBounds};
use crate::schedule::{Schedule, StopFacility, StopOccurrence};
use crate::test_util::*;
use crate::Error;

use approx::assert_relative_eq;
use geo::Point;
use itertools::Itertools;
use std::sync::Arc;

fn bus_config() -> MapperConfig {
    MapperConfig::default()
        .with_threads(2)
        .with_search_radius(150.0)
        .with_mode("bus", ModeParams::new(["car", "bus"]))
}

fn build(network: &mut Network, schedule: &Schedule, config: MapperConfig) -> (CandidateStore, Arc<Diagnostics>) {
    let diagnostics = Arc::new(Diagnostics::new());
    let store = LinkCandidateBuilder::new(config, Arc::clone(&diagnostics))
        .build(network, schedule)
        .expect("candidates must build");

    (store, diagnostics)
}

fn occurrences(schedule: &Schedule) -> Vec<StopOccurrence> {
    schedule
        .routes()
        .flat_map(|(line, route)| route.occurrences(&line.id))
        .collect()
}

fn link_ids(network: &Network, candidates: &LinkCandidates) -> Vec<String> {
    candidates
        .links()
        .map(|link| network.link(link).id.clone())
        .collect()
}

fn ix(network: &Network, id: &str) -> LinkIx {
    network.link_ix(id).expect("link exists")
}

fn raw_set(network: &Network, point: &Point, links: &[&str]) -> RawSet {
    let hits = links
        .iter()
        .map(|id| {
            let link = ix(network, id);
            (link, network.link_distance(link, point))
        })
        .sorted_by(|(a, x), (b, y)| x.total_cmp(y).then(a.cmp(b)))
        .collect();

    RawSet::searched(network, hits)
}

/// A one-way chain `p0 -> p1 -> p2 -> p3 -> p4` between two junctions.
/// Two links enter `p0`, and two links leave `p4`.
fn chain_network() -> Network {
    let nodes = vec![
        node("p0", 0.0, 0.0),
        node("p1", 100.0, 0.0),
        node("p2", 200.0, 0.0),
        node("p3", 300.0, 0.0),
        node("p4", 400.0, 0.0),
        node("s1", 0.0, 100.0),
        node("s2", 0.0, -100.0),
        node("t1", 400.0, 100.0),
        node("t2", 400.0, -100.0),
    ];

    let links = [
        ("p0", "p1"),
        ("p1", "p2"),
        ("p2", "p3"),
        ("p3", "p4"),
        ("s1", "p0"),
        ("s2", "p0"),
        ("p4", "t1"),
        ("p4", "t2"),
    ]
    .into_iter()
    .map(|(from, to)| link(&format!("{from}{to}"), from, to))
    .collect();

    network(nodes, links)
}

#[test]
fn candidate_distance_is_segment_distance() {
    let mut network = grid();
    let centre = facility("centre", 150.0, 150.0);
    let schedule = schedule(vec![("l1", vec![route("r1", "bus", vec![stop(&centre, 0.0, 0.0)])])]);

    let config = bus_config().with_search_radius(80.0);
    let (store, _) = build(&mut network, &schedule, config);

    let occurrence = &occurrences(&schedule)[0];
    let candidates = store.get_candidates(occurrence).expect("stop has candidates");

    assert_eq!(candidates.len(), 24);
    for candidate in candidates {
        let expected = network.link_distance(candidate.link(), &Point::new(150.0, 150.0));
        assert_relative_eq!(candidate.distance(), expected);
    }
}

#[test]
fn priorities_span_closest_to_furthest() {
    let mut network = grid();
    let centre = facility("centre", 150.0, 150.0);
    let schedule = schedule(vec![("l1", vec![route("r1", "bus", vec![stop(&centre, 0.0, 0.0)])])]);

    let (store, _) = build(&mut network, &schedule, bus_config().with_search_radius(80.0));
    let candidates = store
        .get_candidates(&occurrences(&schedule)[0])
        .expect("stop has candidates");

    let max = candidates.iter().map(LinkCandidate::priority).fold(f64::MIN, f64::max);
    let min = candidates.iter().map(LinkCandidate::priority).fold(f64::MAX, f64::min);
    assert_relative_eq!(max, 1.0);
    assert_relative_eq!(min, 0.0);

    for candidate in candidates {
        if (candidate.distance() - 50.0).abs() < 1e-9 {
            assert_relative_eq!(candidate.priority(), 1.0);
        } else {
            assert_relative_eq!(candidate.distance(), 50.0f64.hypot(50.0));
            assert_relative_eq!(candidate.priority(), 0.0, epsilon = 1e-9);
        }
    }

    // Best first, by priority.
    assert!(candidates
        .as_slice()
        .windows(2)
        .all(|pair| pair[0].priority() >= pair[1].priority()));
}

#[test]
fn degenerate_sets_score_one() {
    let network = street();
    let occurrence = StopOccurrence::new("l", "r", stop(&facility("s", 150.0, 10.0), 0.0, 0.0));
    let position = Point::new(150.0, 10.0);

    let mut single = vec![LinkCandidate::new(&network, ix(&network, "ab"), &occurrence, position)];
    assign_priorities(&mut single);
    assert_relative_eq!(single[0].priority(), 1.0);

    let mut tied = ["bc", "cb"]
        .iter()
        .map(|id| LinkCandidate::new(&network, ix(&network, id), &occurrence, position))
        .collect::<Vec<_>>();
    assign_priorities(&mut tied);
    assert!(tied.iter().all(|candidate| candidate.priority() == 1.0));
}

#[test]
fn diagonal_opposite_pair_scores_as_a_tie() {
    let mut network = diagonal();
    let slope = facility("slope", 40.485, 13.23);
    let schedule = schedule(vec![("l1", vec![route("r1", "bus", vec![stop(&slope, 0.0, 0.0)])])]);

    let config = MapperConfig::default()
        .with_threads(1)
        .with_search_radius(100.0)
        .with_mode(
            "bus",
            ModeParams::new(["bus"])
                .max_candidate_count(1)
                .distance_tolerance_factor(1.0),
        );

    let (store, _) = build(&mut network, &schedule, config);
    let candidates = store
        .get_candidates(&occurrences(&schedule)[0])
        .expect("stop has candidates");

    // The stop lies to the right of a -> b, so `ab` leads.
    assert_eq!(link_ids(&network, candidates), vec!["ab", "ba"]);
    assert!(candidates.iter().all(|candidate| candidate.priority() == 1.0));
    assert!(candidates.best().is_some_and(LinkCandidate::stop_on_right));
}

#[test]
fn opposite_pair_is_kept_with_right_hand_side_first() {
    let mut network = network(
        vec![node("w", 20.0, 0.0), node("e", 80.0, 0.0)],
        vec![
            LinkSpec::new("east", "w", "e").modes(["bus"]),
            LinkSpec::new("west", "e", "w").modes(["bus"]),
        ],
    );

    let midline = facility("midline", 50.0, 5.0);
    let schedule = schedule(vec![("l1", vec![route("r1", "bus", vec![stop(&midline, 0.0, 0.0)])])]);

    let config = MapperConfig::default()
        .with_threads(1)
        .with_search_radius(50.0)
        .with_mode(
            "bus",
            ModeParams::new(["bus"])
                .max_candidate_count(1)
                .distance_tolerance_factor(1.5)
                .max_candidate_distance(50.0),
        );

    let (store, _) = build(&mut network, &schedule, config);
    let candidates = store
        .get_candidates(&occurrences(&schedule)[0])
        .expect("stop has candidates");

    assert_eq!(link_ids(&network, candidates), vec!["west", "east"]);
    for candidate in candidates {
        assert_relative_eq!(candidate.distance(), 5.0);
        assert_relative_eq!(candidate.priority(), 1.0);
        assert!(!candidate.is_loop_link());
    }

    let best = candidates.best().expect("set is never empty");
    assert!(best.stop_on_right());
    assert!(!candidates.as_slice()[1].stop_on_right());
}

#[test]
fn stop_without_nearby_links_gets_loop_link() {
    let mut network = street();
    let links_before = network.link_count();

    let remote = facility("remote", 200.0, 120.0);
    let schedule = schedule(vec![("l1", vec![route("r1", "bus", vec![stop(&remote, 0.0, 0.0)])])]);

    let config = MapperConfig::default()
        .with_threads(1)
        .with_search_radius(200.0)
        .with_mode("bus", ModeParams::new(["bus"]).max_candidate_distance(50.0));

    let (store, diagnostics) = build(&mut network, &schedule, config);
    let candidates = store
        .get_candidates(&occurrences(&schedule)[0])
        .expect("stop has candidates");

    assert_eq!(candidates.len(), 1);

    let candidate = candidates.best().expect("set is never empty");
    assert!(candidate.is_loop_link());
    assert_eq!(candidate.from_position(), Point::new(200.0, 120.0));
    assert_eq!(candidate.to_position(), Point::new(200.0, 120.0));
    assert_relative_eq!(candidate.priority(), 1.0);

    assert_eq!(network.link(candidate.link()).id, "pt_remote");
    assert_eq!(network.link_count(), links_before + 1);
    assert_eq!(diagnostics.count(Counter::EmptySearches), 1);
}

#[test]
fn loop_link_is_shared_by_facility() {
    let mut network = street();
    let links_before = network.link_count();

    let remote = facility("remote", 200.0, 500.0);
    let near = facility("near", 150.0, 10.0);

    let schedule = schedule(vec![
        (
            "l1",
            vec![route("r1", "bus", vec![stop(&near, 0.0, 0.0), stop(&remote, 60.0, 60.0)])],
        ),
        ("l2", vec![route("r2", "bus", vec![stop(&remote, 0.0, 0.0)])]),
    ]);

    let (store, diagnostics) = build(&mut network, &schedule, bus_config());

    let loops = occurrences(&schedule)
        .iter()
        .filter(|occurrence| occurrence.facility().id == "remote")
        .map(|occurrence| {
            store
                .get_candidates(occurrence)
                .and_then(LinkCandidates::best)
                .map(LinkCandidate::link)
                .expect("stop has candidates")
        })
        .collect::<Vec<_>>();

    assert_eq!(loops.len(), 2);
    assert_eq!(loops[0], loops[1]);
    assert_eq!(network.link_count(), links_before + 1);
    assert_eq!(diagnostics.count(Counter::LoopLinks), 1);
}

#[test]
fn single_file_chain_keeps_closest_member() {
    let network = chain_network();
    let point = Point::new(250.0, 20.0);

    let chain = single_file_chain(&network, ix(&network, "p0p1"));
    let mut members = chain.iter().map(|link| network.link(*link).id.as_str()).collect::<Vec<_>>();
    members.sort_unstable();
    assert_eq!(members, vec!["p0p1", "p1p2", "p2p3", "p3p4"]);

    let mut set = raw_set(&network, &point, &["p0p1", "p1p2", "p2p3", "p3p4", "p4t1"]);
    reduce_single_file(&network, &mut set);

    let kept = set.links().map(|link| network.link(link).id.as_str()).collect::<Vec<_>>();
    assert_eq!(kept, vec!["p2p3", "p4t1"]);
}

#[test]
fn single_file_reduction_is_per_direction() {
    let network = street();
    let point = Point::new(150.0, 10.0);

    let mut set = raw_set(&network, &point, &["ab", "ba", "bc", "cb", "cd", "dc", "de", "ed"]);
    reduce_single_file(&network, &mut set);

    let kept = set.links().map(|link| network.link(link).id.as_str()).collect::<Vec<_>>();
    assert_eq!(kept, vec!["bc", "cb"]);
}

#[test]
fn closed_ring_terminates() {
    let network = network(
        vec![
            node("r0", 0.0, 0.0),
            node("r1", 100.0, 0.0),
            node("r2", 100.0, 100.0),
            node("r3", 0.0, 100.0),
        ],
        vec![
            link("r0r1", "r0", "r1"),
            link("r1r2", "r1", "r2"),
            link("r2r3", "r2", "r3"),
            link("r3r0", "r3", "r0"),
        ],
    );

    assert_eq!(single_file_chain(&network, ix(&network, "r2r3")).len(), 4);

    let point = Point::new(50.0, -10.0);
    let mut set = raw_set(&network, &point, &["r0r1", "r1r2", "r2r3", "r3r0"]);
    reduce_single_file(&network, &mut set);

    assert_eq!(set.links().collect::<Vec<_>>(), vec![ix(&network, "r0r1")]);
}

#[test]
fn separation_is_idempotent() {
    let network = street();
    let bounds = SearchBounds {
        search_radius: 150.0,
        max_count: 10,
        tolerance_factor: 2.0,
        max_distance: 200.0,
    };

    let search = |x: f64, y: f64| {
        RawSet::searched(
            &network,
            network.find_closest_links_bounded(&Point::new(x, y), bounds, None),
        )
    };

    let mut previous = search(120.0, 10.0);
    let mut current = search(190.0, 30.0);

    separate(&network, &mut previous, &mut current).expect("sets are consistent");

    assert!(previous.links().all(|link| current.get(link).is_none()));
    assert!(previous.get(ix(&network, "bc")).is_some());
    assert!(current.get(ix(&network, "bc")).is_none());

    let (once_previous, once_current) = (previous.clone(), current.clone());
    separate(&network, &mut previous, &mut current).expect("sets are consistent");

    assert_eq!(previous, once_previous);
    assert_eq!(current, once_current);
}

#[test]
fn separation_rejects_inconsistent_links() {
    let network = street();
    let link = ix(&network, "bc");

    let entry = |from: u32, distance: f64| RawSet {
        entries: vec![RawCandidate {
            link,
            from: NodeIx(from),
            distance,
        }],
        preassigned: false,
    };

    let (mut previous, mut current) = (entry(1, 1.0), entry(2, 2.0));
    let result = separate(&network, &mut previous, &mut current);

    assert!(matches!(
        result,
        Err(CandidateError::SeparationMismatch { ref link, .. }) if link == "bc"
    ));
}

#[test]
fn preassigned_link_is_taken_from_previous_stop() {
    let mut network = street();

    let before = facility("before", 310.0, 5.0);
    let assigned = Arc::new(StopFacility::new("assigned", Some(Point::new(320.0, 40.0))).with_link_ref("cd"));

    let schedule = schedule(vec![(
        "l1",
        vec![route("r1", "bus", vec![stop(&before, 0.0, 0.0), stop(&assigned, 60.0, 60.0)])],
    )]);

    let (store, _) = build(&mut network, &schedule, bus_config());
    let stops = occurrences(&schedule);

    let previous = store.get_candidates(&stops[0]).expect("stop has candidates");
    let current = store.get_candidates(&stops[1]).expect("stop has candidates");

    let mut previous_ids = link_ids(&network, previous);
    previous_ids.sort_unstable();

    assert_eq!(previous_ids, vec!["de", "ed"]);
    assert_eq!(link_ids(&network, current), vec!["cd"]);
    assert_relative_eq!(current.as_slice()[0].distance(), 20.0f64.hypot(40.0));
}

#[test_log::test]
fn unknown_preassigned_link_falls_back_to_search() {
    let mut network = street();
    let misassigned = Arc::new(StopFacility::new("s", Some(Point::new(150.0, 10.0))).with_link_ref("nope"));
    let schedule = schedule(vec![("l1", vec![route("r1", "bus", vec![stop(&misassigned, 0.0, 0.0)])])]);

    let (store, diagnostics) = build(&mut network, &schedule, bus_config());
    let candidates = store
        .get_candidates(&occurrences(&schedule)[0])
        .expect("stop has candidates");

    assert_eq!(link_ids(&network, candidates).len(), 2);
    assert!(candidates.contains_link(ix(&network, "bc")));
    assert!(candidates.contains_link(ix(&network, "cb")));
    assert_eq!(
        diagnostics.occurrences("Stop facility s references unknown link nope, searching instead"),
        1
    );
}

#[test]
fn manual_candidates_are_appended() {
    let mut network = street();
    let s = facility("s", 150.0, 10.0);
    let schedule = schedule(vec![("l1", vec![route("r1", "bus", vec![stop(&s, 0.0, 0.0)])])]);

    let config = bus_config().with_manual_candidates(ManualCandidates::new("s", ["de", "missing"]));
    let (store, diagnostics) = build(&mut network, &schedule, config);

    let candidates = store
        .get_candidates(&occurrences(&schedule)[0])
        .expect("stop has candidates");

    let mut ids = link_ids(&network, candidates);
    ids.sort_unstable();
    assert_eq!(ids, vec!["bc", "cb", "de"]);
    assert!(candidates.iter().all(|candidate| candidate.priority() == 1.0));

    assert_eq!(diagnostics.count(Counter::OverridesSkipped), 1);
    assert_eq!(diagnostics.count(Counter::OverridesOverDistance), 1);
}

#[test]
fn manual_candidates_replace_within_mode() {
    let mut network = street();
    let s = facility("s", 150.0, 10.0);
    let schedule = schedule(vec![
        ("l1", vec![route("r1", "bus", vec![stop(&s, 0.0, 0.0)])]),
        ("l2", vec![route("r2", "tram", vec![stop(&s, 0.0, 0.0)])]),
    ]);

    let config = bus_config()
        .with_mode("tram", ModeParams::new(["car", "bus"]))
        .with_manual_candidates(ManualCandidates::new("s", ["ab"]).for_modes(["bus"]).replacing());

    let (store, _) = build(&mut network, &schedule, config);

    for occurrence in occurrences(&schedule) {
        let candidates = store.get_candidates(&occurrence).expect("stop has candidates");

        if &*occurrence.route_id == "r1" {
            assert_eq!(link_ids(&network, candidates), vec!["ab"]);
        } else {
            assert_eq!(candidates.len(), 2);
            assert!(!candidates.contains_link(ix(&network, "ab")));
        }
    }
}

#[test]
fn missing_coordinate_is_fatal() {
    let mut network = street();
    let nowhere = Arc::new(StopFacility::new("nowhere", None));
    let schedule = schedule(vec![("l1", vec![route("r1", "bus", vec![stop(&nowhere, 0.0, 0.0)])])]);

    let result = LinkCandidateBuilder::new(bus_config(), Arc::new(Diagnostics::new()))
        .build(&mut network, &schedule);

    assert!(matches!(
        result,
        Err(Error::Candidate(CandidateError::MissingCoordinate { ref facility, .. })) if facility == "nowhere"
    ));
}

#[test]
fn unconfigured_mode_is_served_by_loop_links() {
    let mut network = street();
    let s = facility("s", 150.0, 10.0);
    let schedule = schedule(vec![("l1", vec![route("r1", "ferry", vec![stop(&s, 0.0, 0.0)])])]);

    let (store, diagnostics) = build(&mut network, &schedule, bus_config());
    let candidates = store
        .get_candidates(&occurrences(&schedule)[0])
        .expect("stop has candidates");

    let candidate = candidates.best().expect("set is never empty");
    assert!(candidate.is_loop_link());
    assert_eq!(network.link(candidate.link()).modes, mode_set(&[Mode::ARTIFICIAL]));

    let report = diagnostics.report();
    assert!(report.warnings.iter().any(|(message, _)| message.contains("ferry")));
}

#[test]
fn artificial_mode_skips_search() {
    let mut network = street();
    let s = facility("s", 150.0, 10.0);
    let schedule = schedule(vec![("l1", vec![route("r1", "bus", vec![stop(&s, 0.0, 0.0)])])]);

    let config = bus_config().with_mode("bus", ModeParams::artificial());
    let (store, diagnostics) = build(&mut network, &schedule, config);

    let candidates = store
        .get_candidates(&occurrences(&schedule)[0])
        .expect("stop has candidates");

    assert_eq!(candidates.len(), 1);
    assert!(candidates.best().is_some_and(LinkCandidate::is_loop_link));
    assert_eq!(diagnostics.count(Counter::EmptySearches), 0);
}

#[test]
fn repeated_builds_are_identical() {
    let a = facility("a", 120.0, 130.0);
    let b = facility("b", 260.0, 210.0);
    let c = facility("c", 330.0, 90.0);

    let schedule = schedule(vec![(
        "l1",
        vec![
            route("r1", "bus", vec![stop(&a, 0.0, 0.0), stop(&b, 60.0, 60.0), stop(&c, 120.0, 120.0)]),
            route("r2", "bus", vec![stop(&c, 0.0, 0.0), stop(&b, 60.0, 60.0), stop(&a, 120.0, 120.0)]),
        ],
    )]);

    let run = || {
        let mut network = grid();
        let (store, _) = build(&mut network, &schedule, bus_config());

        occurrences(&schedule)
            .iter()
            .map(|occurrence| {
                let candidates = store.get_candidates(occurrence).expect("stop has candidates");
                link_ids(&network, candidates)
            })
            .collect::<Vec<_>>()
    };

    assert_eq!(run(), run());
}

#[test]
fn invalid_configuration_fails_the_build() {
    let mut network = street();
    let schedule = schedule(vec![(
        "l1",
        vec![route("r1", "bus", vec![stop(&facility("s", 150.0, 10.0), 0.0, 0.0)])],
    )]);

    let config = bus_config().with_mode(
        "bus",
        ModeParams::new(["car", "bus"]).distance_tolerance_factor(f64::NAN),
    );

    let result = LinkCandidateBuilder::new(config, Arc::new(Diagnostics::new())).build(&mut network, &schedule);
    assert!(matches!(
        result,
        Err(Error::Config(ConfigError::NegativeValue {
            name: "distance_tolerance_factor",
            ..
        }))
    ));
}
