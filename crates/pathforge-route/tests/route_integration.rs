// Integration tests for route graph path calculation

use pathforge_route::{CurveKind, RouteGraph, Vec3};

fn straight_graph() -> RouteGraph {
    let mut graph = RouteGraph::with_steps(0.25, 1.0);
    let a = graph.add_node(Vec3::new(0.0, 0.0, 0.0));
    let b = graph.add_node(Vec3::new(10.0, 0.0, 0.0));
    graph.connect(a, b, CurveKind::Straight).unwrap();
    graph
}

#[test]
fn test_straight_edge_resamples_to_unit_steps() {
    let graph = straight_graph();
    let path = graph.compute_full_path().unwrap();

    assert_eq!(path.len(), 11);
    for (i, sample) in path.iter().enumerate() {
        assert!((sample.position.x - i as f64).abs() < 1e-9);
        assert_eq!(sample.position.y, 0.0);
        assert_eq!(sample.position.z, 0.0);
        assert_eq!(sample.yaw, 0.0);
    }
}

#[test]
fn test_arc_edge_follows_circle_through_anchor() {
    let mut graph = RouteGraph::with_steps(0.1, 1.0);
    let a = graph.add_node(Vec3::new(0.0, 0.0, 0.0));
    let b = graph.add_node(Vec3::new(10.0, 0.0, 0.0));
    graph.connect(a, b, CurveKind::Arc).unwrap();
    graph.attach_anchor(a, b, Vec3::new(5.0, 0.0, 5.0)).unwrap();

    let center = Vec3::new(5.0, 0.0, 0.0);
    let dense = graph.compute_path(a, b).unwrap();
    for sample in &dense {
        assert!((sample.position.distance(center) - 5.0).abs() < 1e-9);
    }

    let path = graph.compute_full_path().unwrap();
    for sample in &path {
        assert!((sample.position.distance(center) - 5.0).abs() < 1e-3);
    }

    let middle = path[path.len() / 2].position;
    assert!(middle.distance(Vec3::new(5.0, 0.0, 5.0)) < 1.0);
    let closest = path
        .iter()
        .map(|s| s.position.distance(Vec3::new(5.0, 0.0, 5.0)))
        .fold(f64::INFINITY, f64::min);
    assert!(closest < 0.5);
}

#[test]
fn test_shared_node_tangent_is_continuous() {
    let mut graph = RouteGraph::new();
    let a = graph.add_node(Vec3::new(0.0, 0.0, 0.0));
    let b = graph.add_node(Vec3::new(10.0, 0.0, 0.0));
    let c = graph.add_node(Vec3::new(10.0, 0.0, 10.0));
    graph.connect(a, b, CurveKind::Straight).unwrap();
    graph.connect(b, c, CurveKind::Straight).unwrap();

    let from_first = graph.tangent_at(a, b, b).unwrap();
    let from_second = graph.tangent_at(b, c, b).unwrap();
    assert!((from_first - from_second).length() < 1e-9);
    assert!((from_first - Vec3::X).length() < 1e-9);
}

#[test]
fn test_shared_node_tangent_flips_for_same_end() {
    let mut graph = RouteGraph::new();
    let a = graph.add_node(Vec3::new(0.0, 0.0, 0.0));
    let b = graph.add_node(Vec3::new(10.0, 0.0, 0.0));
    let c = graph.add_node(Vec3::new(20.0, 0.0, 5.0));
    graph.connect(b, a, CurveKind::Straight).unwrap();
    graph.connect(b, c, CurveKind::SplineApprox).unwrap();

    let owner = graph.tangent_at(b, a, b).unwrap();
    let reuser = graph.tangent_at(b, c, b).unwrap();
    assert!((owner + reuser).length() < 1e-9);
}

#[test]
fn test_spline_joint_bends_toward_shared_tangent() {
    let mut graph = RouteGraph::with_steps(0.05, 1.0);
    let a = graph.add_node(Vec3::new(0.0, 0.0, 0.0));
    let b = graph.add_node(Vec3::new(10.0, 0.0, 0.0));
    let c = graph.add_node(Vec3::new(15.0, 0.0, 8.0));
    graph.connect(a, b, CurveKind::Straight).unwrap();
    graph.connect(b, c, CurveKind::SplineApprox).unwrap();

    let spline = graph.compute_path(b, c).unwrap();
    let chord_yaw = 8.0f64.atan2(5.0).to_degrees();
    assert!(spline[0].yaw > 0.0);
    assert!(spline[0].yaw < chord_yaw);
    assert_eq!(spline.last().unwrap().position, Vec3::new(15.0, 0.0, 8.0));
}

#[test]
fn test_collinear_anchor_matches_straight_edge() {
    let expected = straight_graph().compute_full_path().unwrap();

    for kind in [CurveKind::Arc, CurveKind::SplineApprox] {
        let mut graph = RouteGraph::with_steps(0.25, 1.0);
        let a = graph.add_node(Vec3::new(0.0, 0.0, 0.0));
        let b = graph.add_node(Vec3::new(10.0, 0.0, 0.0));
        graph.connect(a, b, kind).unwrap();
        graph.attach_anchor(a, b, Vec3::new(5.0, 0.0, 0.0)).unwrap();
        assert_eq!(graph.compute_full_path().unwrap(), expected, "{kind}");
    }
}

#[test]
fn test_full_path_walks_chain_in_order() {
    let mut graph = RouteGraph::with_steps(0.25, 1.0);
    let a = graph.add_node(Vec3::new(0.0, 0.0, 0.0));
    let b = graph.add_node(Vec3::new(10.0, 0.0, 0.0));
    let c = graph.add_node(Vec3::new(10.0, 0.0, 10.0));
    // Second edge inserted against travel direction.
    graph.connect(a, b, CurveKind::Straight).unwrap();
    graph.connect(c, b, CurveKind::Straight).unwrap();

    let path = graph.compute_full_path().unwrap();
    assert_eq!(path.len(), 21);
    assert_eq!(path.first().unwrap().position, Vec3::ZERO);
    assert!(path.last().unwrap().position.distance(Vec3::new(10.0, 0.0, 10.0)) < 1e-9);
    assert!((path.last().unwrap().yaw - 90.0).abs() < 1e-9);
}

#[test]
fn test_closed_loop_is_walked() {
    let mut graph = RouteGraph::with_steps(0.25, 1.0);
    let a = graph.add_node(Vec3::new(0.0, 0.0, 0.0));
    let b = graph.add_node(Vec3::new(4.0, 0.0, 0.0));
    let c = graph.add_node(Vec3::new(4.0, 0.0, 4.0));
    let d = graph.add_node(Vec3::new(0.0, 0.0, 4.0));
    graph.connect(a, b, CurveKind::Straight).unwrap();
    graph.connect(b, c, CurveKind::Straight).unwrap();
    graph.connect(c, d, CurveKind::Straight).unwrap();
    graph.connect(d, a, CurveKind::Straight).unwrap();

    let path = graph.compute_full_path().unwrap();
    assert_eq!(path.len(), 17);
    assert!(path.last().unwrap().position.distance(Vec3::ZERO) < 1e-9);
}

#[test]
fn test_sampling_step_change_recomputes_edges() {
    let mut graph = straight_graph();
    let (a, b) = {
        let edge = &graph.edges()[0];
        (edge.p1(), edge.p2())
    };
    assert_eq!(graph.compute_path(a, b).unwrap().len(), 41);

    graph.set_sampling_step(0.5);
    assert_eq!(graph.compute_path(a, b).unwrap().len(), 21);

    graph.set_resample_step(2.0);
    assert_eq!(graph.compute_full_path().unwrap().len(), 6);
}
