//! Integration tests for drape-contact.

use std::collections::HashSet;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use drape_contact::broad::{collect_pairs, traverse, CandidatePair};
use drape_contact::bvh::{BoundingVolumeTree, NodeId};
use drape_contact::config::CollisionConfig;
use drape_contact::narrow::{detect, CollisionPair, ContactSide, ContactSource};
use drape_contact::obstacle::Obstacle;
use drape_contact::orchestrator::{CollisionOrchestrator, CollisionPass, OrchestratorState};
use drape_contact::response::{normal_velocity, ContactResponse, ImpulseResponse, ResponseResult};
use drape_math::{triangle_proximity, Kdop, KdopType, Vec3};
use drape_mesh::generators::quad_grid;
use drape_mesh::{Face, Surface};
use drape_solver::config::ClothConfig;
use drape_solver::state::{ClothState, VertexFlags};
use drape_types::constants::ALMOST_ZERO;
use drape_types::DrapeError;

const EPS: f32 = 0.015;

fn triangle(a: Vec3, b: Vec3, c: Vec3) -> Surface {
    Surface::from_faces(vec![a, b, c], vec![Face::tri(0, 1, 2)]).unwrap()
}

/// Unit right triangle in the XZ plane at height `y`.
fn flat_triangle(y: f32) -> Surface {
    triangle(Vec3::new(0.0, y, 0.0), Vec3::new(0.0, y, 1.0), Vec3::new(1.0, y, 0.0))
}

/// `n` random small triangles inside a 2 m cube.
fn triangle_soup(rng: &mut StdRng, n: usize) -> Surface {
    let mut positions = Vec::with_capacity(3 * n);
    let mut faces = Vec::with_capacity(n);
    for f in 0..n {
        let center = Vec3::new(rng.gen_range(0.0..2.0), rng.gen_range(0.0..2.0), rng.gen_range(0.0..2.0));
        for _ in 0..3 {
            let jitter = Vec3::new(rng.gen_range(-0.1..0.1), rng.gen_range(-0.1..0.1), rng.gen_range(-0.1..0.1));
            positions.push(center + jitter);
        }
        let base = 3 * f as u32;
        faces.push(Face::tri(base, base + 1, base + 2));
    }
    Surface::from_faces(positions, faces).unwrap()
}

fn tight_leaf_bound(tree: &BoundingVolumeTree, face: &Face, snapshots: &[&[Vec3]]) -> Kdop {
    let mut bound = Kdop::EMPTY;
    for positions in snapshots {
        for c in face.corners() {
            bound.add_point(tree.kind(), positions[c as usize]);
        }
    }
    bound.inflate(tree.kind(), tree.epsilon());
    bound
}

/// Structural invariants every tree must satisfy after build and update.
fn check_tree(tree: &BoundingVolumeTree) {
    let nodes = tree.nodes();
    let kind = tree.kind();

    for (i, node) in nodes.iter().enumerate() {
        assert_eq!(node.traversed(), 0, "node {i} left a pending join");
        if node.is_leaf {
            assert_eq!(node.children_count, 0);
            continue;
        }
        let children: Vec<NodeId> = node.child_ids().collect();
        assert_eq!(children.len(), node.children_count as usize);
        assert!((2..=4).contains(&children.len()), "node {i} has {} children", children.len());
        for child in children {
            let c = &nodes[child.index()];
            assert_eq!(c.parent, Some(NodeId(i as u32)));
            assert!(node.bound.contains(kind, &c.bound), "node {i} does not contain child {child:?}");
        }
    }

    let leaves: Vec<NodeId> = tree.leaves().collect();
    assert_eq!(leaves.len(), tree.leaf_count());
    let distinct: HashSet<NodeId> = leaves.iter().copied().collect();
    assert_eq!(distinct.len(), leaves.len());

    let mut reachable = 0;
    let mut stack: Vec<NodeId> = tree.root().into_iter().collect();
    while let Some(id) = stack.pop() {
        let node = tree.node(id).expect("reachable node out of arena");
        if node.is_leaf {
            assert!(distinct.contains(&id));
            reachable += 1;
        }
        stack.extend(node.child_ids());
    }
    assert_eq!(reachable, tree.leaf_count());
    if let Some(root) = tree.root() {
        assert!(nodes[root.index()].parent.is_none());
    }
}

// ─── Bounding Volume Tree Tests ───────────────────────────────

#[test]
fn single_face_tree_is_a_root_leaf() {
    let surface = flat_triangle(0.0);
    let tree = BoundingVolumeTree::build_static(&surface.faces, &surface.positions, KdopType::Dop26, EPS).unwrap();
    let root = tree.root().unwrap();
    assert_eq!(root, NodeId(0));
    assert!(tree.node(root).unwrap().is_leaf);
    assert_eq!(tree.depth(), 1);
    assert_eq!(tree.nodes().len(), 1);
    check_tree(&tree);
}

#[test]
fn empty_tree_reports_nothing() {
    let tree = BoundingVolumeTree::build_static(&[], &[], KdopType::Dop6, EPS).unwrap();
    assert!(tree.root().is_none());
    assert_eq!(tree.leaves().count(), 0);
    assert!(!traverse(&tree, &tree, false, |_, _| panic!("no leaves")));
}

#[test]
fn build_satisfies_invariants_for_every_kdop() {
    let surface = quad_grid(13, 11, 2.0, 1.5);
    for kind in [KdopType::Dop6, KdopType::Dop8, KdopType::Dop14, KdopType::Dop18, KdopType::Dop26] {
        let tree = BoundingVolumeTree::build_static(&surface.faces, &surface.positions, kind, EPS).unwrap();
        check_tree(&tree);
        assert_eq!(tree.leaf_count(), 143);
        // Quad-tree over 143 leaves: at most ceil(log4(143)) + 1 levels.
        assert!(tree.depth() <= 5, "depth {}", tree.depth());
    }
}

#[test]
fn leaf_bounds_are_inflated_face_bounds() {
    let surface = quad_grid(4, 4, 1.0, 1.0);
    let tree = BoundingVolumeTree::build_static(&surface.faces, &surface.positions, KdopType::Dop14, EPS).unwrap();
    for (f, face) in surface.faces.iter().enumerate() {
        let expected = tight_leaf_bound(&tree, face, &[surface.positions.as_slice()]);
        assert_eq!(tree.nodes()[f].bound, expected);
    }
}

#[test]
fn bounds_hold_after_random_perturbations() {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    let surface = quad_grid(12, 9, 1.0, 1.0);
    let mut tree = BoundingVolumeTree::build_static(&surface.faces, &surface.positions, KdopType::Dop26, EPS).unwrap();
    let mut prev = surface.positions.clone();

    for step in 0..20 {
        let cur: Vec<Vec3> = prev
            .iter()
            .map(|p| *p + Vec3::new(rng.gen_range(-0.05..0.05), rng.gen_range(-0.05..0.05), rng.gen_range(-0.05..0.05)))
            .collect();
        let moving = step % 2 == 0;
        tree.set_parallel(step % 3 != 0);
        tree.update(&prev, &cur, moving).unwrap();
        check_tree(&tree);

        for (f, face) in surface.faces.iter().enumerate() {
            let snapshots = if moving {
                vec![prev.as_slice(), cur.as_slice()]
            } else {
                vec![cur.as_slice()]
            };
            assert_eq!(tree.nodes()[f].bound, tight_leaf_bound(&tree, face, &snapshots));
        }
        prev = cur;
    }
}

#[test]
fn internal_bounds_are_exact_child_unions() {
    let surface = quad_grid(7, 5, 1.0, 1.0);
    let mut tree = BoundingVolumeTree::build_static(&surface.faces, &surface.positions, KdopType::Dop18, EPS).unwrap();
    let lifted: Vec<Vec3> = surface.positions.iter().map(|p| *p + Vec3::new(0.1, 0.3, 0.0)).collect();

    for pass in 0..2 {
        if pass == 1 {
            tree.update(&surface.positions, &lifted, true).unwrap();
        }
        let kind = tree.kind();
        for node in tree.nodes().iter().filter(|n| !n.is_leaf) {
            let mut union = Kdop::EMPTY;
            for child in node.child_ids() {
                union.union_with(kind, &tree.nodes()[child.index()].bound);
            }
            assert_eq!(node.bound, union);
        }

        let mut all_leaves = Kdop::EMPTY;
        for leaf in tree.leaves() {
            all_leaves.union_with(kind, &tree.nodes()[leaf.index()].bound);
        }
        let root = tree.root().unwrap();
        assert_eq!(tree.nodes()[root.index()].bound, all_leaves);
    }
}

#[test]
fn moving_tree_bounds_the_sweep() {
    let surface = quad_grid(3, 3, 1.0, 1.0);
    let lifted: Vec<Vec3> = surface.positions.iter().map(|p| *p + Vec3::new(0.0, 0.5, 0.0)).collect();
    let tree = BoundingVolumeTree::build(&surface.faces, &surface.positions, &lifted, KdopType::Dop6, EPS).unwrap();
    let root = &tree.nodes()[tree.root().unwrap().index()];
    // y slab spans the whole sweep plus epsilon.
    assert!(root.bound.min[1] <= -EPS + 1e-6);
    assert!(root.bound.max[1] >= 0.5 + EPS - 1e-6);
}

#[test]
fn update_rejects_wrong_vertex_count() {
    let surface = quad_grid(2, 2, 1.0, 1.0);
    let mut tree = BoundingVolumeTree::build_static(&surface.faces, &surface.positions, KdopType::Dop26, EPS).unwrap();
    let short = &surface.positions[..4];
    assert!(matches!(
        tree.update(short, short, false),
        Err(DrapeError::TopologyMismatch { expected: 9, found: 4 })
    ));
}

#[test]
fn build_rejects_out_of_range_faces() {
    let faces = [Face::tri(0, 1, 7)];
    let positions = [Vec3::ZERO, Vec3::X, Vec3::Z];
    assert!(matches!(
        BoundingVolumeTree::build_static(&faces, &positions, KdopType::Dop26, EPS),
        Err(DrapeError::InvalidMesh(_))
    ));
}

#[test]
fn normal_cone_of_flat_sheet_is_closed() {
    let surface = quad_grid(6, 6, 1.0, 1.0);
    let tree = BoundingVolumeTree::build_static(&surface.faces, &surface.positions, KdopType::Dop26, EPS).unwrap();
    let root = &tree.nodes()[tree.root().unwrap().index()];
    assert!((root.normal - Vec3::Y).length() < 1e-5);
    assert!(root.alpha < 1e-2);
}

#[test]
fn rebuild_after_topology_change_drops_old_arena() {
    let big = quad_grid(6, 6, 1.0, 1.0);
    let mut tree = BoundingVolumeTree::build_static(&big.faces, &big.positions, KdopType::Dop26, EPS).unwrap();
    let old_nodes: Vec<NodeId> = (0..tree.nodes().len() as u32).map(NodeId).collect();

    let small = quad_grid(2, 2, 1.0, 1.0);
    tree.rebuild(&small.faces, &small.positions, &small.positions).unwrap();
    check_tree(&tree);
    assert_eq!(tree.leaf_count(), 4);
    assert_eq!(tree.vertex_count(), 9);

    // Old ids past the new arena resolve to nothing.
    let live = tree.nodes().len();
    assert!(live < old_nodes.len());
    for id in &old_nodes[live..] {
        assert!(tree.node(*id).is_none());
    }
    // Every reachable leaf names a face of the new surface.
    for leaf in tree.leaves() {
        assert!((tree.node(leaf).unwrap().face as usize) < small.face_count());
    }
    // Stale positions are refused.
    assert!(tree.update(&big.positions, &big.positions, false).is_err());
}

// ─── Broad Phase Tests ────────────────────────────────────────

#[test]
fn broad_phase_matches_brute_force() {
    let mut rng = StdRng::seed_from_u64(42);
    for (trial, kind) in [KdopType::Dop6, KdopType::Dop8, KdopType::Dop14, KdopType::Dop18, KdopType::Dop26]
        .into_iter()
        .cycle()
        .take(10)
        .enumerate()
    {
        let a = triangle_soup(&mut rng, 40 + trial * 7);
        let b = triangle_soup(&mut rng, 30 + trial * 5);
        let ta = BoundingVolumeTree::build_static(&a.faces, &a.positions, kind, EPS).unwrap();
        let tb = BoundingVolumeTree::build_static(&b.faces, &b.positions, kind, EPS).unwrap();

        let reported: HashSet<CandidatePair> = collect_pairs(&ta, &tb, false).into_iter().collect();

        let mut expected = HashSet::new();
        for i in 0..a.face_count() {
            for j in 0..b.face_count() {
                if ta.nodes()[i].bound.overlaps(kind, &tb.nodes()[j].bound) {
                    expected.insert(CandidatePair { face_a: i as u32, face_b: j as u32 });
                }
            }
        }
        assert_eq!(reported, expected, "trial {trial} with {kind:?}");

        // Every analytically touching pair is among the candidates.
        for i in 0..a.face_count() {
            for j in 0..b.face_count() {
                let fa = a.faces[i].v.map(|v| a.positions[v as usize]);
                let fb = b.faces[j].v.map(|v| b.positions[v as usize]);
                if triangle_proximity(fa, fb).distance <= EPS {
                    assert!(reported.contains(&CandidatePair { face_a: i as u32, face_b: j as u32 }));
                }
            }
        }
    }
}

#[test]
fn self_traversal_reports_each_pair_once() {
    let mut rng = StdRng::seed_from_u64(3);
    let soup = triangle_soup(&mut rng, 80);
    let tree = BoundingVolumeTree::build_static(&soup.faces, &soup.positions, KdopType::Dop26, EPS).unwrap();

    let pairs = collect_pairs(&tree, &tree, true);
    let distinct: HashSet<CandidatePair> = pairs.iter().copied().collect();
    assert_eq!(distinct.len(), pairs.len());
    for p in &pairs {
        assert!(p.face_a < p.face_b);
        assert!(tree.nodes()[p.face_a as usize]
            .bound
            .overlaps(tree.kind(), &tree.nodes()[p.face_b as usize].bound));
    }
}

#[test]
fn disjoint_trees_prune_at_root() {
    let a = quad_grid(4, 4, 1.0, 1.0);
    let mut b = quad_grid(4, 4, 1.0, 1.0);
    b.translate(Vec3::new(0.0, 1.0, 0.0));
    let ta = BoundingVolumeTree::build_static(&a.faces, &a.positions, KdopType::Dop26, EPS).unwrap();
    let tb = BoundingVolumeTree::build_static(&b.faces, &b.positions, KdopType::Dop26, EPS).unwrap();
    let mut calls = 0;
    assert!(!traverse(&ta, &tb, false, |_, _| calls += 1));
    assert_eq!(calls, 0);
}

// ─── Narrow Phase Tests ───────────────────────────────────────

fn contacts_between(a: &Surface, b: &Surface, source: ContactSource) -> Vec<CollisionPair> {
    let ta = BoundingVolumeTree::build_static(&a.faces, &a.positions, KdopType::Dop26, EPS).unwrap();
    let tb = BoundingVolumeTree::build_static(&b.faces, &b.positions, KdopType::Dop26, EPS).unwrap();
    let candidates = collect_pairs(&ta, &tb, false);
    detect(
        &candidates,
        ContactSide::new(&a.faces, &a.positions),
        ContactSide::new(&b.faces, &b.positions),
        source,
        EPS,
        true,
    )
}

#[test]
fn separated_triangles_make_no_contacts() {
    let cloth_surface = flat_triangle(2.0 * EPS);
    let floor = flat_triangle(0.0);
    let pairs = contacts_between(&cloth_surface, &floor, ContactSource::Obstacle(0));
    assert!(pairs.is_empty());

    let mut cloth = ClothState::bind(&cloth_surface, &ClothConfig::default()).unwrap();
    let obstacle = Obstacle::new(&floor, &CollisionConfig::default()).unwrap();
    let result = ImpulseResponse::new(50).resolve(&pairs, &mut cloth, &[obstacle]);
    assert_eq!(result.impulses, 0);
    assert!(!result.fired());
}

#[test]
fn close_triangles_make_a_contact_with_upward_normal() {
    let cloth_surface = flat_triangle(0.5 * EPS);
    let floor = flat_triangle(0.0);
    let pairs = contacts_between(&cloth_surface, &floor, ContactSource::Obstacle(0));
    assert_eq!(pairs.len(), 1);
    let pair = pairs[0];
    assert!((pair.distance - 0.5 * EPS).abs() < 1e-6);
    assert!((pair.normal - Vec3::Y).length() < 1e-5);
    assert!((pair.weights_a.iter().sum::<f32>() - 1.0).abs() < 1e-5);
    assert_eq!(pair.source, ContactSource::Obstacle(0));
}

#[test]
fn intersecting_triangles_fall_back_to_face_normal() {
    let floor = flat_triangle(0.0);
    // Tilted through the floor, centroid above it.
    let cloth_surface = triangle(
        Vec3::new(0.2, -0.05, 0.2),
        Vec3::new(0.2, 0.3, 0.4),
        Vec3::new(0.4, 0.3, 0.2),
    );
    let pairs = contacts_between(&cloth_surface, &floor, ContactSource::Obstacle(0));
    assert_eq!(pairs.len(), 1);
    let pair = pairs[0];
    assert!(pair.is_intersecting());
    assert!((pair.normal.length() - 1.0).abs() < 1e-5);
    assert!(pair.normal.y > 0.99);
}

#[test]
fn self_contacts_skip_adjacent_faces() {
    let sheet = quad_grid(3, 3, 1.0, 1.0);
    let tree = BoundingVolumeTree::build_static(&sheet.faces, &sheet.positions, KdopType::Dop26, EPS).unwrap();
    let candidates = collect_pairs(&tree, &tree, true);
    assert!(!candidates.is_empty());
    let side = ContactSide::new(&sheet.faces, &sheet.positions);
    // A flat sheet only touches itself through shared corners.
    let pairs = detect(&candidates, side, side, ContactSource::SelfCloth, EPS, false);
    assert!(pairs.is_empty());
}

// ─── Response Tests ───────────────────────────────────────────

#[test]
fn opposing_contact_stops_approach_within_iteration_cap() {
    let cloth_surface = flat_triangle(0.5 * EPS);
    let floor = flat_triangle(0.0);
    let pairs = contacts_between(&cloth_surface, &floor, ContactSource::Obstacle(0));

    let mut cloth = ClothState::bind(&cloth_surface, &ClothConfig::default()).unwrap();
    for v in &mut cloth.vertices {
        v.tv = Vec3::new(0.0, -1.0, 0.0);
    }
    let mut obstacle = Obstacle::new(&floor, &CollisionConfig::default()).unwrap();
    obstacle.translate(Vec3::Y);
    let obstacles = [obstacle];

    assert!(normal_velocity(&pairs[0], &cloth, &obstacles) < -1.9);
    let result = ImpulseResponse::new(50).resolve(&pairs, &mut cloth, &obstacles);
    assert!(result.fired());
    assert!(result.settled);
    assert!(result.iterations <= 50);
    for pair in &pairs {
        assert!(normal_velocity(pair, &cloth, &obstacles) >= -ALMOST_ZERO);
    }
    assert!(cloth.vertices.iter().all(|v| v.impulse_count == 0 && v.impulse == Vec3::ZERO));
}

#[test]
fn interpenetrating_contact_stops_approach_within_iteration_cap() {
    let floor = flat_triangle(0.0);
    // One corner dipped half an epsilon below the floor.
    let cloth_surface = triangle(
        Vec3::new(0.2, -0.5 * EPS, 0.2),
        Vec3::new(0.2, 0.3, 0.4),
        Vec3::new(0.4, 0.3, 0.2),
    );
    let pairs = contacts_between(&cloth_surface, &floor, ContactSource::Obstacle(0));
    assert_eq!(pairs.len(), 1);
    assert!(pairs[0].is_intersecting());
    assert!(pairs[0].normal.y > 0.99);

    let mut cloth = ClothState::bind(&cloth_surface, &ClothConfig::default()).unwrap();
    for v in &mut cloth.vertices {
        v.tv = Vec3::NEG_Y;
    }
    let mut obstacle = Obstacle::new(&floor, &CollisionConfig::default()).unwrap();
    obstacle.translate(Vec3::Y);
    let obstacles = [obstacle];

    assert!(normal_velocity(&pairs[0], &cloth, &obstacles) < -1.9);
    let result = ImpulseResponse::new(50).resolve(&pairs, &mut cloth, &obstacles);
    assert!(result.fired());
    assert!(result.settled);
    assert!(result.iterations <= 50);
    assert!(normal_velocity(&pairs[0], &cloth, &obstacles) >= -ALMOST_ZERO);
}

#[test]
fn self_contact_pushes_both_sides_apart() {
    let positions = vec![
        Vec3::new(0.0, 0.5 * EPS, 0.0),
        Vec3::new(0.0, 0.5 * EPS, 1.0),
        Vec3::new(1.0, 0.5 * EPS, 0.0),
        Vec3::new(0.0, 0.0, 0.0),
        Vec3::new(0.0, 0.0, 1.0),
        Vec3::new(1.0, 0.0, 0.0),
    ];
    let surface = Surface::from_faces(positions, vec![Face::tri(0, 1, 2), Face::tri(3, 4, 5)]).unwrap();
    let mut cloth = ClothState::bind(&surface, &ClothConfig::default()).unwrap();
    for (i, v) in cloth.vertices.iter_mut().enumerate() {
        v.tv = if i < 3 { Vec3::NEG_Y } else { Vec3::Y };
    }

    let tree = BoundingVolumeTree::build_static(&surface.faces, &surface.positions, KdopType::Dop26, EPS).unwrap();
    let candidates = collect_pairs(&tree, &tree, true);
    assert_eq!(candidates, vec![CandidatePair { face_a: 0, face_b: 1 }]);
    let side = ContactSide::new(&surface.faces, &surface.positions);
    let pairs = detect(&candidates, side, side, ContactSource::SelfCloth, EPS, true);
    assert_eq!(pairs.len(), 1);

    let result = ImpulseResponse::new(50).resolve(&pairs, &mut cloth, &[]);
    assert!(result.fired());
    assert!(result.iterations <= 50);
    assert!(normal_velocity(&pairs[0], &cloth, &[]) >= -ALMOST_ZERO);
    assert!(cloth.vertices.iter().any(|v| v.flags.contains(VertexFlags::COLLIDED)));
}

#[test]
fn pinned_vertices_take_no_impulse() {
    let cloth_surface = flat_triangle(0.5 * EPS);
    let floor = flat_triangle(0.0);
    let pairs = contacts_between(&cloth_surface, &floor, ContactSource::Obstacle(0));

    let mut cloth = ClothState::bind(&cloth_surface, &ClothConfig::default()).unwrap();
    for i in 0..3 {
        cloth.pin(i).unwrap();
        cloth.vertices[i].tv = Vec3::NEG_Y;
    }
    let obstacles = [Obstacle::new(&floor, &CollisionConfig::default()).unwrap()];
    let result = ImpulseResponse::new(50).resolve(&pairs, &mut cloth, &obstacles);
    assert_eq!(result.impulses, 0);
    assert!(cloth.vertices.iter().all(|v| v.tv == Vec3::NEG_Y));
}

#[test]
fn separating_contact_is_left_alone() {
    let cloth_surface = flat_triangle(0.5 * EPS);
    let floor = flat_triangle(0.0);
    let pairs = contacts_between(&cloth_surface, &floor, ContactSource::Obstacle(0));
    let mut cloth = ClothState::bind(&cloth_surface, &ClothConfig::default()).unwrap();
    for v in &mut cloth.vertices {
        v.tv = Vec3::Y;
    }
    let obstacles = [Obstacle::new(&floor, &CollisionConfig::default()).unwrap()];
    let result = ImpulseResponse::new(50).resolve(&pairs, &mut cloth, &obstacles);
    assert_eq!(result.iterations, 1);
    assert!(!result.fired());
}

// ─── Orchestrator Tests ───────────────────────────────────────

/// Cloth triangle above a smaller obstacle triangle under its middle.
fn cloth_over_pad(gap: f32) -> (ClothState, BoundingVolumeTree, Vec<Obstacle>) {
    let cloth_surface = triangle(
        Vec3::new(-1.0, gap, -1.0),
        Vec3::new(-1.0, gap, 2.0),
        Vec3::new(2.0, gap, -1.0),
    );
    let pad = triangle(Vec3::new(0.0, 0.0, 0.0), Vec3::new(0.0, 0.0, 0.2), Vec3::new(0.2, 0.0, 0.0));
    let config = CollisionConfig::default();
    let cloth = ClothState::bind(&cloth_surface, &ClothConfig::default()).unwrap();
    let tree = BoundingVolumeTree::build_static(&cloth_surface.faces, &cloth_surface.positions, config.kdop, config.epsilon)
        .unwrap();
    let obstacles = vec![Obstacle::new(&pad, &config).unwrap()];
    (cloth, tree, obstacles)
}

/// Stands in for the integrator: moves every vertex by `offset`.
fn integrate_by(cloth: &mut ClothState, offset: Vec3) {
    cloth.begin_frame();
    for v in &mut cloth.vertices {
        v.xold = v.x;
        v.x += offset;
    }
    cloth.load_tentative();
}

#[test]
fn separated_frame_commits_integrator_result() {
    let (mut cloth, mut tree, mut obstacles) = cloth_over_pad(2.0 * EPS);
    integrate_by(&mut cloth, Vec3::new(0.0, 0.001, 0.0));
    let expected = cloth.positions();

    let mut orchestrator = CollisionOrchestrator::new(CollisionConfig::default()).unwrap();
    let report = orchestrator.run(&mut cloth, &mut tree, &mut obstacles, 1, 5).unwrap();

    assert_eq!(report.total_pairs(), 0);
    assert_eq!(report.total_impulses(), 0);
    assert!(report.converged());
    assert_eq!(report.static_pass.rounds, 1);
    assert_eq!(report.moving_pass.rounds, 1);
    for (v, p) in cloth.vertices.iter().zip(&expected) {
        assert!((v.x - *p).length() < 1e-6);
    }
    assert!(cloth.cache_search(1));
    assert_eq!(orchestrator.state(), OrchestratorState::Idle);
}

#[test]
fn approaching_frame_is_slowed_by_contact() {
    let (mut cloth, mut tree, mut obstacles) = cloth_over_pad(0.5 * EPS);
    let drop = Vec3::new(0.0, -0.02, 0.0);
    integrate_by(&mut cloth, drop);

    let mut orchestrator = CollisionOrchestrator::new(CollisionConfig::default()).unwrap();
    let report = orchestrator.run(&mut cloth, &mut tree, &mut obstacles, 4, 5).unwrap();

    assert!(report.static_pass.pairs > 0);
    assert!(report.static_pass.impulses > 0);
    assert_eq!(report.rounds[0].pass, CollisionPass::Static);
    assert!(cloth.vertices.iter().all(|v| v.flags.contains(VertexFlags::COLLIDED)));
    // Some vertex ends the frame above where free fall would have put it.
    assert!(cloth.vertices.iter().any(|v| v.x.y > 0.5 * EPS + drop.y + 1e-4));
    assert!(cloth.cache_search(4));
}

#[test]
fn disabled_collision_still_commits() {
    let (mut cloth, mut tree, mut obstacles) = cloth_over_pad(0.5 * EPS);
    integrate_by(&mut cloth, Vec3::new(0.0, -0.02, 0.0));
    let expected = cloth.positions();

    let mut orchestrator = CollisionOrchestrator::new(CollisionConfig::disabled()).unwrap();
    let report = orchestrator.run(&mut cloth, &mut tree, &mut obstacles, 0, 5).unwrap();
    assert!(report.rounds.is_empty());
    assert!(report.converged());
    for (v, p) in cloth.vertices.iter().zip(&expected) {
        assert!((v.x - *p).length() < 1e-6);
    }
}

struct AlwaysFires;

impl ContactResponse for AlwaysFires {
    fn resolve(&self, _pairs: &[CollisionPair], _cloth: &mut ClothState, _obstacles: &[Obstacle]) -> ResponseResult {
        ResponseResult {
            iterations: 1,
            impulses: 1,
            settled: false,
        }
    }

    fn name(&self) -> &str {
        "always_fires"
    }
}

#[test]
fn round_cap_bounds_a_non_converging_frame() {
    let (mut cloth, mut tree, mut obstacles) = cloth_over_pad(0.5 * EPS);
    integrate_by(&mut cloth, Vec3::ZERO);

    let config = CollisionConfig {
        max_rounds: 3,
        ..Default::default()
    };
    let mut orchestrator = CollisionOrchestrator::new(config).unwrap().with_response(Box::new(AlwaysFires));
    assert_eq!(orchestrator.response_name(), "always_fires");
    let report = orchestrator.run(&mut cloth, &mut tree, &mut obstacles, 0, 5).unwrap();

    assert!(!report.converged());
    assert_eq!(report.static_pass.rounds, 3);
    assert_eq!(report.moving_pass.rounds, 3);
    assert_eq!(report.rounds.len(), 6);
    assert!(cloth.cache_search(0));
}

// ─── Config Tests ─────────────────────────────────────────────

#[test]
fn collision_config_validation() {
    assert!(CollisionConfig::default().validate().is_ok());
    let bad = CollisionConfig {
        epsilon: 0.0,
        ..Default::default()
    };
    assert!(matches!(bad.validate(), Err(DrapeError::InvalidConfig(_))));
    assert!(CollisionOrchestrator::new(bad).is_err());
}

#[test]
fn collision_config_serde() {
    let config: CollisionConfig = serde_json::from_str(r#"{"kdop": "Dop18", "self_collision": true}"#).unwrap();
    assert_eq!(config.kdop, KdopType::Dop18);
    assert!(config.self_collision);
    assert_eq!(config.max_rounds, 10);
    assert_eq!(config.impulse_iterations, 50);
}
