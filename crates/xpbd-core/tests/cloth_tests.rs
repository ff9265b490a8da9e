//! End-to-end cloth scenario: a pinned grid of particles draping under
//! gravity, solved through the full `PbdModel` predict/project/integrate
//! cycle with distance and dihedral constraints (spec §8's falling-cloth
//! scenario).

use glam::Vec3;
use xpbd_core::config::PbdConfig;
use xpbd_core::constraints::ConstraintKind;
use xpbd_core::mesh::{InMemoryMesh, Topology};
use xpbd_core::model::PbdModel;

/// Build a flat `w`×`h` grid of triangles in the XZ plane, spacing `s`.
fn grid_mesh(w: usize, h: usize, s: f32) -> InMemoryMesh {
    let mut positions = Vec::with_capacity(w * h);
    for row in 0..h {
        for col in 0..w {
            positions.push(Vec3::new(col as f32 * s, 0.0, row as f32 * s));
        }
    }
    let mut tris = Vec::new();
    for row in 0..h - 1 {
        for col in 0..w - 1 {
            let i0 = (row * w + col) as u32;
            let i1 = i0 + 1;
            let i2 = i0 + w as u32;
            let i3 = i2 + 1;
            tris.push([i0, i1, i2]);
            tris.push([i1, i3, i2]);
        }
    }
    InMemoryMesh::new(positions, Topology::Triangles(tris))
}

fn cloth_model(w: usize, h: usize) -> PbdModel {
    let mut config = PbdConfig::default();
    config.dt = 1.0 / 60.0;
    config.iterations = 6;
    config.gravity = Vec3::new(0.0, -9.81, 0.0);
    let mesh = grid_mesh(w, h, 0.1);
    let mut model = PbdModel::new(config);
    model.set_geometry(&mesh);
    model.initialize_constraints(ConstraintKind::Distance, 1.0).unwrap();
    model.initialize_constraints(ConstraintKind::Dihedral, 0.5).unwrap();
    model
}

#[test]
fn pinned_corners_survive_many_steps_without_nan() {
    let mut model = cloth_model(5, 5);
    // Pin the two top-row corners.
    model.state.pin(0).unwrap();
    model.state.pin(4).unwrap();

    for _ in 0..120 {
        model.predict();
        model.project_constraints(&mut []);
        model.integrate_velocity();
    }

    for p in &model.state.position {
        assert!(p.is_finite(), "cloth position diverged: {p:?}");
    }
    assert_eq!(model.state.position[0], Vec3::ZERO);
    assert_eq!(model.state.position[4], Vec3::new(0.4, 0.0, 0.0));
}

#[test]
fn unpinned_center_vertex_drops_under_gravity() {
    let mut model = cloth_model(5, 5);
    model.state.pin(0).unwrap();
    model.state.pin(4).unwrap();

    let initial_y = model.state.position[12].y;
    for _ in 0..30 {
        model.predict();
        model.project_constraints(&mut []);
        model.integrate_velocity();
    }
    let final_y = model.state.position[12].y;
    assert!(final_y < initial_y, "center vertex should drop: initial={initial_y}, final={final_y}");
}

#[test]
fn distance_constraints_keep_edges_near_rest_length() {
    let mut model = cloth_model(5, 5);
    model.state.pin(0).unwrap();
    model.state.pin(4).unwrap();

    for _ in 0..60 {
        model.predict();
        model.project_constraints(&mut []);
        model.integrate_velocity();
    }

    // Adjacent particles along a grid row were 0.1 apart at rest; high
    // stiffness (1.0) should keep them close to that even after draping.
    let d = (model.state.position[1] - model.state.position[0]).length();
    assert!((d - 0.1).abs() < 0.03, "edge stretched too far: {d}");
}

#[test]
fn zero_stiffness_distance_constraint_never_corrects() {
    // A two-particle "cloth" with stiffness 0: the constraint should have
    // zero effective stiffness and never pull the stretched pair back.
    let mesh = InMemoryMesh::new(
        vec![Vec3::ZERO, Vec3::new(1.0, 0.0, 0.0)],
        Topology::Edges(vec![[0, 1]]),
    );
    let mut config = PbdConfig::default();
    config.gravity = Vec3::ZERO;
    let mut model = PbdModel::new(config);
    model.set_geometry(&mesh);
    model.initialize_constraints(ConstraintKind::Distance, 0.0).unwrap();
    model.state.pin(0).unwrap();

    model.state.position[1] = Vec3::new(5.0, 0.0, 0.0);
    let before = model.state.position[1];
    model.project_constraints(&mut []);
    assert_eq!(model.state.position[1], before);
}
