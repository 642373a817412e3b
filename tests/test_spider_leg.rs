use approx::assert_abs_diff_eq;
use itertools::Itertools;
use nalgebra::Vector3;
use tendril::{ChainIkSolver, FlatGround, GroundSnap, Pose, PoseArena, PoseProvider, SolverConfig};

/// A body with a single three-segment leg. Returns the tree and the index of the foot.
fn spider() -> (PoseArena, tendril::ArenaIndex) {
    let mut tree = PoseArena::new();
    let at = |x, y| Pose::from_position(Vector3::new(x, y, 0.0));

    let body = tree.set_root(at(0.0, 1.5), "body");
    let hip = tree.add(at(0.0, 1.0), "hip", body).unwrap();
    let knee = tree.add(at(0.6, 1.8), "knee", hip).unwrap();
    let ankle = tree.add(at(1.6, 1.8), "ankle", knee).unwrap();
    let foot = tree.add(at(2.2, 1.0), "foot", ankle).unwrap();
    (tree, foot)
}

#[test_log::test]
fn test_walk_cycle() {
    let (mut tree, foot) = spider();
    let ground = FlatGround { height: 0.0 };
    let snap = GroundSnap {
        probe_height: 10.0,
        sink_depth: 0.0,
    };

    let mut solver = ChainIkSolver::new(SolverConfig {
        chain_length: 3,
        iterations: 20,
        ..Default::default()
    })
    .unwrap();
    solver.bind_pole(Vector3::new(1.0, 5.0, 0.0));

    // Idle until a target is bound
    assert_eq!(solver.solve(&mut tree.chain(foot, 3).unwrap()), Ok(None));
    solver.bind_target(Pose::from_position(Vector3::new(2.0, 3.0, 0.0)));

    for step in 0..5 {
        // Move the target along the ground first, then solve
        let target = solver.target_mut().unwrap();
        target.position.x = 1.5 + 0.1 * step as f32;
        assert!(snap.snap(target, &ground));
        let goal = target.position;

        let mut view = tree.chain(foot, 3).unwrap();
        let info = solver.solve(&mut view).unwrap().unwrap();
        assert!(info.reachable);

        let positions = (0..view.len()).map(|i| view.pose(i).unwrap().position).collect_vec();
        assert_eq!(positions[0], Vector3::new(0.0, 1.0, 0.0));
        assert!((positions[3] - goal).norm() < 0.001, "step {step}: effector missed the target");
        for (from, to) in positions.iter().tuple_windows() {
            assert_abs_diff_eq!((to - from).norm(), 1.0, epsilon = 1e-4);
        }
        // Joints stay on the side of the pole (above the hip to foot line)
        let reach = goal - positions[0];
        for joint in &positions[1..3] {
            assert!(reach.cross(&(joint - positions[0])).z > 0.0);
        }
    }

    let chain = solver.chain().unwrap();
    assert_eq!(chain.segments().count(), 3);
    assert_abs_diff_eq!(chain.total_length(), 3.0, epsilon = 1e-5);
}

#[test]
fn test_plain_vector_provider() {
    let mut poses = (0..4)
        .map(|i| Pose::from_position(Vector3::new(i as f32, 0.0, 0.0)))
        .collect_vec();

    let mut solver = ChainIkSolver::new(SolverConfig::new(3)).unwrap();
    solver.bind_target(Pose::from_position(Vector3::new(3.5, 0.0, 0.0)));
    let info = solver.solve(&mut poses).unwrap().unwrap();

    assert!(!info.reachable);
    assert_abs_diff_eq!(poses[3].position, Vector3::new(3.0, 0.0, 0.0), epsilon = 1e-5);
}
