//! Integration tests for drape-mesh.

use drape_math::Vec3;
use drape_mesh::generators::{quad_grid, single_quad, triangle_grid, uv_sphere};
use drape_mesh::normals::{face_normal, vertex_normals};
use drape_mesh::topology::derive_edges;
use drape_mesh::{Face, Surface};

// ─── Surface Tests ────────────────────────────────────────────

fn make_single_triangle() -> Surface {
    Surface::from_faces(
        vec![Vec3::ZERO, Vec3::X, Vec3::Y],
        vec![Face::tri(0, 1, 2)],
    )
    .unwrap()
}

#[test]
fn basic_counts() {
    let surface = make_single_triangle();
    assert_eq!(surface.vertex_count(), 3);
    assert_eq!(surface.edge_count(), 3);
    assert_eq!(surface.face_count(), 1);
    assert_eq!(surface.triangle_count(), 1);
}

#[test]
fn validate_ok() {
    assert!(make_single_triangle().validate().is_ok());
}

#[test]
fn validate_catches_oob_face_index() {
    let mut surface = make_single_triangle();
    surface.faces[0].v[2] = 99;
    assert!(surface.validate().is_err());
}

#[test]
fn validate_catches_oob_edge_index() {
    let mut surface = make_single_triangle();
    surface.edges.push([0, 7]);
    assert!(surface.validate().is_err());
}

#[test]
fn validate_catches_repeated_corner() {
    let mut surface = make_single_triangle();
    surface.faces[0] = Face::quad(0, 1, 2, 1);
    assert!(surface.validate().is_err());
}

#[test]
fn validate_catches_self_edge() {
    let mut surface = make_single_triangle();
    surface.edges.push([2, 2]);
    assert!(surface.validate().is_err());
}

#[test]
fn translate_moves_every_vertex() {
    let mut surface = make_single_triangle();
    surface.translate(Vec3::new(0.0, 2.0, 0.0));
    assert_eq!(surface.position(1), Vec3::new(1.0, 2.0, 0.0));
}

#[test]
fn surface_serialization() {
    let surface = single_quad(1.0);
    let json = serde_json::to_string(&surface).unwrap();
    let recovered: Surface = serde_json::from_str(&json).unwrap();
    assert_eq!(recovered.faces, surface.faces);
    assert_eq!(recovered.positions, surface.positions);
}

// ─── Face Tests ───────────────────────────────────────────────

#[test]
fn quad_splits_into_two_triangles() {
    let face = Face::quad(0, 1, 2, 3);
    assert!(face.is_quad());
    assert_eq!(face.corner_count(), 4);
    assert_eq!(face.triangles(), ([0, 1, 2], Some([2, 3, 0])));
}

#[test]
fn triangle_has_no_second_half() {
    let face = Face::tri(4, 5, 6);
    assert_eq!(face.triangles(), ([4, 5, 6], None));
    assert_eq!(face.corners().collect::<Vec<_>>(), vec![4, 5, 6]);
}

#[test]
fn faces_sharing_vertices() {
    let a = Face::quad(0, 1, 2, 3);
    assert!(a.shares_vertex(&Face::tri(3, 7, 8)));
    assert!(!a.shares_vertex(&Face::tri(4, 7, 8)));
}

// ─── Topology Tests ───────────────────────────────────────────

#[test]
fn shared_edges_are_deduplicated() {
    let faces = vec![Face::tri(0, 1, 2), Face::tri(2, 1, 3)];
    let edges = derive_edges(&faces);
    assert_eq!(edges.len(), 5);
    assert!(edges.contains(&[1, 2]));
    assert!(edges.iter().all(|e| e[0] < e[1]));
}

#[test]
fn quad_diagonals_are_not_edges() {
    let edges = derive_edges(&[Face::quad(0, 1, 2, 3)]);
    assert_eq!(edges.len(), 4);
    assert!(!edges.contains(&[0, 2]));
    assert!(!edges.contains(&[1, 3]));
}

// ─── Generator Tests ──────────────────────────────────────────

#[test]
fn quad_grid_counts() {
    let surface = quad_grid(20, 20, 2.0, 2.0);
    assert_eq!(surface.vertex_count(), 441);
    assert_eq!(surface.face_count(), 400);
    assert_eq!(surface.edge_count(), 2 * 20 * 21);
    assert!(surface.validate().is_ok());
}

#[test]
fn single_quad_counts() {
    let surface = single_quad(1.0);
    assert_eq!(surface.vertex_count(), 4);
    assert_eq!(surface.edge_count(), 4);
    assert_eq!(surface.face_count(), 1);
}

#[test]
fn quad_grid_dimensions() {
    let surface = quad_grid(4, 4, 2.0, 2.0);
    assert!((surface.position(0) - Vec3::new(-1.0, 0.0, -1.0)).length() < 1e-6);
    assert!((surface.position(4) - Vec3::new(1.0, 0.0, -1.0)).length() < 1e-6);
}

#[test]
fn quad_grid_faces_point_up() {
    let surface = quad_grid(2, 2, 1.0, 1.0);
    for face in &surface.faces {
        let n = face_normal(face, &surface.positions);
        assert!((n - Vec3::Y).length() < 1e-5);
    }
}

#[test]
fn triangle_grid_doubles_faces() {
    let surface = triangle_grid(2, 3, 1.0, 1.0);
    assert_eq!(surface.face_count(), 12);
    assert!(surface.faces.iter().all(|f| !f.is_quad()));
    assert!(surface.validate().is_ok());
}

#[test]
fn uv_sphere_radius() {
    let center = Vec3::new(0.0, 1.0, 0.0);
    let surface = uv_sphere(center, 2.5, 8, 16);
    assert!(surface.validate().is_ok());
    for &p in &surface.positions {
        assert!(((p - center).length() - 2.5).abs() < 1e-4);
    }
}

#[test]
fn vertex_normals_of_flat_grid() {
    let surface = quad_grid(3, 3, 1.0, 1.0);
    let normals = vertex_normals(&surface.faces, &surface.positions);
    for n in normals {
        assert!((n - Vec3::Y).length() < 1e-5);
    }
}
