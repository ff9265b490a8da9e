use super::{MaRecord, MeshCollider, Plane};
use crate::state::StateStore;

/// Mesh-vs-plane narrow phase, ported from
/// `examples/original_source/Base/Collision/CollisionDetection/imstkMeshToPlaneCD.cpp`:
/// a vertex is penetrating when its signed distance to the plane (along
/// the normal) is non-positive; the correction pushes it back out along
/// the normal by that distance.
pub fn detect(state: &StateStore, mesh: &MeshCollider, plane: &Plane) -> Vec<MaRecord> {
    let mut out = Vec::new();
    for (local, &global) in mesh.indices.iter().enumerate() {
        let p = state.position[global as usize];
        let pene_distance = (plane.point - p).dot(plane.normal);
        if pene_distance >= 0.0 {
            out.push(MaRecord {
                vertex: local as u32,
                correction: plane.normal * pene_distance,
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
    fn vertex_above_plane_has_no_contact() {
        let mut state = StateStore::new(1);
        state.set_initial_positions(&[Vec3::new(0.0, 1.0, 0.0)]);
        let mesh_obj = InMemoryMesh::new(vec![Vec3::new(0.0, 1.0, 0.0)], Topology::Triangles(vec![]));
        let indices = [0u32];
        let collider = MeshCollider::from_mesh(&mesh_obj, &indices);
        let plane = Plane { point: Vec3::ZERO, normal: Vec3::Y };
        assert!(detect(&state, &collider, &plane).is_empty());
    }

    #[test]
    fn vertex_below_plane_gets_pushed_up() {
        let mut state = StateStore::new(1);
        state.set_initial_positions(&[Vec3::new(0.0, -0.2, 0.0)]);
        let mesh_obj = InMemoryMesh::new(vec![Vec3::new(0.0, -0.2, 0.0)], Topology::Triangles(vec![]));
        let indices = [0u32];
        let collider = MeshCollider::from_mesh(&mesh_obj, &indices);
        let plane = Plane { point: Vec3::ZERO, normal: Vec3::Y };
        let records = detect(&state, &collider, &plane);
        assert_eq!(records.len(), 1);
        assert!((records[0].correction.y - 0.2).abs() < 1e-5);
    }
}
