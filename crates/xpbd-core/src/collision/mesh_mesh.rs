use glam::Vec3;

use super::{CollisionData, EeRecord, MeshCollider, TvRecord, VtRecord};
use crate::state::StateStore;

/// Axis-aligned bounding box, expanded by `proximity` on each side before
/// the overlap test — the broad-phase prune ahead of the narrow
/// triangle-triangle tests below.
#[derive(Clone, Copy)]
struct Aabb {
    min: Vec3,
    max: Vec3,
}

impl Aabb {
    fn from_triangle(verts: [Vec3; 3], margin: f32) -> Self {
        let min = verts[0].min(verts[1]).min(verts[2]) - Vec3::splat(margin);
        let max = verts[0].max(verts[1]).max(verts[2]) + Vec3::splat(margin);
        Aabb { min, max }
    }

    fn overlaps(&self, other: &Aabb) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
            && self.min.z <= other.max.z
            && self.max.z >= other.min.z
    }
}

/// Closest point on triangle `(a,b,c)` to `p`, returned as barycentric
/// coordinates `(u,v,w)` with `u*a + v*b + w*c == closest`. Standard
/// Ericson-style region test (`Real-Time Collision Detection`, §5.1.5).
fn closest_point_triangle(p: Vec3, a: Vec3, b: Vec3, c: Vec3) -> (Vec3, [f32; 3]) {
    let ab = b - a;
    let ac = c - a;
    let ap = p - a;

    let d1 = ab.dot(ap);
    let d2 = ac.dot(ap);
    if d1 <= 0.0 && d2 <= 0.0 {
        return (a, [1.0, 0.0, 0.0]);
    }

    let bp = p - b;
    let d3 = ab.dot(bp);
    let d4 = ac.dot(bp);
    if d3 >= 0.0 && d4 <= d3 {
        return (b, [0.0, 1.0, 0.0]);
    }

    let vc = d1 * d4 - d3 * d2;
    if vc <= 0.0 && d1 >= 0.0 && d3 <= 0.0 {
        let v = d1 / (d1 - d3);
        return (a + ab * v, [1.0 - v, v, 0.0]);
    }

    let cp = p - c;
    let d5 = ab.dot(cp);
    let d6 = ac.dot(cp);
    if d6 >= 0.0 && d5 <= d6 {
        return (c, [0.0, 0.0, 1.0]);
    }

    let vb = d5 * d2 - d1 * d6;
    if vb <= 0.0 && d2 >= 0.0 && d6 <= 0.0 {
        let w = d2 / (d2 - d6);
        return (a + ac * w, [1.0 - w, 0.0, w]);
    }

    let va = d3 * d6 - d5 * d4;
    if va <= 0.0 && (d4 - d3) >= 0.0 && (d5 - d6) >= 0.0 {
        let w = (d4 - d3) / ((d4 - d3) + (d5 - d6));
        return (b + (c - b) * w, [0.0, 1.0 - w, w]);
    }

    let denom = 1.0 / (va + vb + vc);
    let v = vb * denom;
    let w = vc * denom;
    (a + ab * v + ac * w, [1.0 - v - w, v, w])
}

/// Closest points between segments `(p1,p2)` and `(p3,p4)`, returned as
/// the interpolation parameters `(s,t) ∈ [0,1]²`. Standard clamped
/// closest-point-between-segments routine (Ericson §5.1.9).
fn closest_points_segments(p1: Vec3, p2: Vec3, p3: Vec3, p4: Vec3) -> (f32, f32) {
    let d1 = p2 - p1;
    let d2 = p4 - p3;
    let r = p1 - p3;
    let a = d1.length_squared();
    let e = d2.length_squared();
    let f = d2.dot(r);

    if a <= 1e-10 && e <= 1e-10 {
        return (0.0, 0.0);
    }
    if a <= 1e-10 {
        return (0.0, (f / e).clamp(0.0, 1.0));
    }
    let c = d1.dot(r);
    if e <= 1e-10 {
        return ((-c / a).clamp(0.0, 1.0), 0.0);
    }

    let b = d1.dot(d2);
    let denom = a * e - b * b;
    let s = if denom.abs() > 1e-10 {
        ((b * f - c * e) / denom).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let t_raw = (b * s + f) / e;
    let t = t_raw.clamp(0.0, 1.0);
    let s = if t != t_raw {
        ((b * t - c) / a).clamp(0.0, 1.0)
    } else {
        s
    };
    (s, t)
}

/// Mesh-vs-mesh narrow phase: AABB-pruned direct triangle-triangle sweep
/// generating vertex-triangle, triangle-vertex, and edge-edge records.
/// Substitutes for the external BVH + continuous-collision library
/// `examples/original_source/Base/Collision/CollisionDetection/imstkMeshToMeshCD.cpp`
/// links against (not available in this crate's dependency stack — see
/// SPEC_FULL.md §1 and DESIGN.md). Discrete, not continuous: reports
/// proximity within `proximity`, not a time-of-impact.
pub fn detect(state: &StateStore, a: &MeshCollider, b: &MeshCollider, proximity: f32) -> CollisionData {
    let mut data = CollisionData::default();

    let tri_verts = |mesh: &MeshCollider, tri: [u32; 3]| -> [Vec3; 3] {
        [
            mesh.position(state, tri[0]),
            mesh.position(state, tri[1]),
            mesh.position(state, tri[2]),
        ]
    };

    for tri_a in a.triangles {
        let va = tri_verts(a, *tri_a);
        let aabb_a = Aabb::from_triangle(va, proximity);

        for tri_b in b.triangles {
            let vb = tri_verts(b, *tri_b);
            let aabb_b = Aabb::from_triangle(vb, proximity);
            if !aabb_a.overlaps(&aabb_b) {
                continue;
            }

            // Vertex-triangle: each vertex of A against triangle B.
            for &va_idx in tri_a {
                let p = a.position(state, va_idx);
                let (closest, bary) = closest_point_triangle(p, vb[0], vb[1], vb[2]);
                if (p - closest).length() < proximity {
                    data.vt.push(VtRecord {
                        vertex: va_idx,
                        tri: *tri_b,
                        tri_bary: bary,
                    });
                }
            }
            // Triangle-vertex: each vertex of B against triangle A.
            for &vb_idx in tri_b {
                let p = b.position(state, vb_idx);
                let (closest, bary) = closest_point_triangle(p, va[0], va[1], va[2]);
                if (p - closest).length() < proximity {
                    data.tv.push(TvRecord {
                        tri: *tri_a,
                        tri_bary: bary,
                        vertex: vb_idx,
                    });
                }
            }
            // Edge-edge: all 3x3 edge pairs between the two triangles.
            for ea in 0..3 {
                let (a0, a1) = (tri_a[ea], tri_a[(ea + 1) % 3]);
                let (pa0, pa1) = (a.position(state, a0), a.position(state, a1));
                for eb in 0..3 {
                    let (b0, b1) = (tri_b[eb], tri_b[(eb + 1) % 3]);
                    let (pb0, pb1) = (b.position(state, b0), b.position(state, b1));
                    let (s, t) = closest_points_segments(pa0, pa1, pb0, pb1);
                    let closest_a = pa0 + (pa1 - pa0) * s;
                    let closest_b = pb0 + (pb1 - pb0) * t;
                    if (closest_a - closest_b).length() < proximity {
                        data.ee.push(EeRecord {
                            edge_a: [a0, a1],
                            t_a: s,
                            edge_b: [b0, b1],
                            t_b: t,
                        });
                    }
                }
            }
        }
    }

    data
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::{InMemoryMesh, Mesh, Topology};
    use glam::Vec3;

    fn unit_triangle_mesh(offset: Vec3) -> (InMemoryMesh, [u32; 3]) {
        let verts = vec![
            offset + Vec3::new(0.0, 0.0, 0.0),
            offset + Vec3::new(1.0, 0.0, 0.0),
            offset + Vec3::new(0.0, 1.0, 0.0),
        ];
        (InMemoryMesh::new(verts, Topology::Triangles(vec![[0, 1, 2]])), [0, 1, 2])
    }

    #[test]
    fn coincident_triangles_report_vertex_triangle_contacts() {
        let mut state = StateStore::new(6);
        let (mesh_a, _) = unit_triangle_mesh(Vec3::ZERO);
        let (mesh_b, _) = unit_triangle_mesh(Vec3::new(0.0, 0.0, 0.001));
        state.set_initial_positions(
            &mesh_a
                .vertex_positions()
                .iter()
                .chain(mesh_b.vertex_positions().iter())
                .copied()
                .collect::<Vec<_>>(),
        );
        let indices_a = [0u32, 1, 2];
        let indices_b = [3u32, 4, 5];
        let collider_a = MeshCollider::from_mesh(&mesh_a, &indices_a);
        let collider_b = MeshCollider::from_mesh(&mesh_b, &indices_b);
        let data = detect(&state, &collider_a, &collider_b, 0.01);
        assert!(!data.is_empty());
    }

    #[test]
    fn distant_triangles_have_no_contact() {
        let mut state = StateStore::new(6);
        let (mesh_a, _) = unit_triangle_mesh(Vec3::ZERO);
        let (mesh_b, _) = unit_triangle_mesh(Vec3::new(100.0, 0.0, 0.0));
        state.set_initial_positions(
            &mesh_a
                .vertex_positions()
                .iter()
                .chain(mesh_b.vertex_positions().iter())
                .copied()
                .collect::<Vec<_>>(),
        );
        let indices_a = [0u32, 1, 2];
        let indices_b = [3u32, 4, 5];
        let collider_a = MeshCollider::from_mesh(&mesh_a, &indices_a);
        let collider_b = MeshCollider::from_mesh(&mesh_b, &indices_b);
        let data = detect(&state, &collider_a, &collider_b, 0.01);
        assert!(data.is_empty());
    }
}
