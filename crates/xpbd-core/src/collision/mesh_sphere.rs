use super::{MaRecord, MeshCollider, Sphere};
use crate::state::StateStore;

/// Mesh-vs-sphere narrow phase, ported from
/// `examples/original_source/Base/Collision/CollisionDetection/imstkMeshToSphereCD.cpp`:
/// tests every mesh vertex against the sphere directly (no broad-phase
/// culling — the source does the same per-vertex linear scan).
pub fn detect(state: &StateStore, mesh: &MeshCollider, sphere: &Sphere) -> Vec<MaRecord> {
    let mut out = Vec::new();
    for (local, &global) in mesh.indices.iter().enumerate() {
        let p = state.position[global as usize];
        let to_center = sphere.center - p;
        let dist = to_center.length();
        if dist <= sphere.radius && dist > 0.0 {
            let direction = to_center / dist;
            let point_on_sphere = sphere.center - direction * sphere.radius;
            out.push(MaRecord {
                vertex: local as u32,
                correction: point_on_sphere - p,
            });
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::{InMemoryMesh, Topology};
    use glam::Vec3;

    #[test]
    fn vertex_inside_sphere_gets_pushed_out_correction() {
        let mut state = StateStore::new(1);
        state.set_initial_positions(&[Vec3::new(0.1, 0.0, 0.0)]);
        let mesh_obj = InMemoryMesh::new(vec![Vec3::new(0.1, 0.0, 0.0)], Topology::Triangles(vec![]));
        let indices = [0u32];
        let collider = MeshCollider::from_mesh(&mesh_obj, &indices);
        let sphere = Sphere { center: Vec3::ZERO, radius: 0.5 };
        let records = detect(&state, &collider, &sphere);
        assert_eq!(records.len(), 1);
        // Correction must point outward (away from center), landing the
        // vertex exactly on the sphere surface when applied.
        assert!((state.position[0] + records[0].correction - sphere.center).length() - sphere.radius < 1e-5);
        assert!(records[0].correction.x > 0.0);
    }

    #[test]
    fn vertex_outside_sphere_has_no_contact() {
        let mut state = StateStore::new(1);
        state.set_initial_positions(&[Vec3::new(5.0, 0.0, 0.0)]);
        let mesh_obj = InMemoryMesh::new(vec![Vec3::new(5.0, 0.0, 0.0)], Topology::Triangles(vec![]));
        let indices = [0u32];
        let collider = MeshCollider::from_mesh(&mesh_obj, &indices);
        let sphere = Sphere { center: Vec3::ZERO, radius: 0.5 };
        assert!(detect(&state, &collider, &sphere).is_empty());
    }
}
