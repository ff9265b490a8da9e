use std::collections::HashMap;

use glam::Vec3;

use crate::collision::Plane;
use crate::constraints::EPSILON;
use crate::error::{PhysicsError, Result};
use crate::mesh::{InMemoryMesh, Topology, Tri};
use crate::state::StateStore;

/// Which side of the cutting plane a vertex (or, post-split, a triangle)
/// falls on (spec §4.D: "classify each vertex as {positive, negative,
/// on-surface} by the signed distance with tolerance ε").
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Side {
    Positive,
    Negative,
    OnSurface,
}

fn classify(signed_dist: f32, epsilon: f32) -> Side {
    if signed_dist > epsilon {
        Side::Positive
    } else if signed_dist < -epsilon {
        Side::Negative
    } else {
        Side::OnSurface
    }
}

/// Outcome of a full mesh cut (spec §4.D final paragraph): two index sets
/// the PBD model uses to incrementally patch its constraint list rather
/// than rebuilding the whole body — vertices whose existing constraints no
/// longer describe valid topology, and vertices (old or newly created)
/// whose constraints must be (re)built from scratch.
#[derive(Default, Clone, Debug)]
pub struct CutReport {
    pub removed_constraint_vertices: Vec<u32>,
    pub added_constraint_vertices: Vec<u32>,
}

fn edge_key(a: u32, b: u32) -> (u32, u32) {
    (a.min(b), a.max(b))
}

fn replace_vertex(tri: &mut Tri, from: u32, to: u32) {
    for v in tri.iter_mut() {
        if *v == from {
            *v = to;
        }
    }
}

/// Cuts every triangle of `mesh` crossed by `plane` (spec §4.D): classifies
/// vertices by signed distance, splits each crossed edge exactly once at
/// its interpolated intersection (shared between adjacent triangles via
/// `edge_key` so the cut line stays continuous before duplication),
/// rewires each crossed triangle into its cut-case replacement, then
/// duplicates every cut-line vertex whose incident triangles fall into
/// both a positive-side and a negative-side group — letting the two
/// halves separate.
///
/// Non-triangle topology, or a plane that crosses no triangle, returns a
/// report with both index sets empty.
pub fn cut_mesh(mesh: &mut InMemoryMesh, state: &mut StateStore, plane: Plane, epsilon: f32) -> Result<CutReport> {
    let tris = mesh
        .topology()
        .as_triangles()
        .ok_or(PhysicsError::WrongTopology {
            kind: crate::constraints::ConstraintKind::Area,
        })?
        .to_vec();

    let sides: Vec<Side> = (0..state.count())
        .map(|i| classify((state.position[i] - plane.point).dot(plane.normal), epsilon))
        .collect();

    let mut edge_cuts: HashMap<(u32, u32), u32> = HashMap::new();
    let mut new_tris: Vec<Tri> = Vec::with_capacity(tris.len());
    let mut tri_side: Vec<Side> = Vec::with_capacity(tris.len());
    let mut cut_line_vertices: Vec<u32> = Vec::new();
    let mut any_cut = false;

    let cut_edge = |mesh: &mut InMemoryMesh, state: &mut StateStore, edge_cuts: &mut HashMap<(u32, u32), u32>, a: u32, b: u32| -> u32 {
        let key = edge_key(a, b);
        if let Some(&existing) = edge_cuts.get(&key) {
            return existing;
        }
        let da = (state.position[a as usize] - plane.point).dot(plane.normal);
        let db = (state.position[b as usize] - plane.point).dot(plane.normal);
        let t = da / (da - db);
        let pos = state.position[a as usize].lerp(state.position[b as usize], t);
        let new_idx = mesh.push_vertex(pos);
        let state_idx = append_particle(state, pos, a, b, t);
        debug_assert_eq!(new_idx, state_idx, "mesh and particle arenas must stay in lockstep");
        edge_cuts.insert(key, new_idx);
        new_idx
    };

    for tri in &tris {
        let s = [sides[tri[0] as usize], sides[tri[1] as usize], sides[tri[2] as usize]];
        let on_count = s.iter().filter(|&&x| x == Side::OnSurface).count();
        let has_positive = s.contains(&Side::Positive);
        let has_negative = s.contains(&Side::Negative);

        if on_count == 0 && (!has_positive || !has_negative) {
            // All on the same side: no cut.
            new_tris.push(*tri);
            tri_side.push(if has_positive { Side::Positive } else { Side::Negative });
            continue;
        }

        if on_count == 0 {
            // EDGE_EDGE: two real signs present, 2-vs-1 split.
            any_cut = true;
            let apex = (0..3).find(|&i| s[i] != s[(i + 1) % 3] && s[i] != s[(i + 2) % 3]).unwrap_or(0);
            let base1 = (apex + 1) % 3;
            let base2 = (apex + 2) % 3;
            let (v_apex, v_base1, v_base2) = (tri[apex], tri[base1], tri[base2]);
            let na = cut_edge(mesh, state, &mut edge_cuts, v_apex, v_base1);
            let nb = cut_edge(mesh, state, &mut edge_cuts, v_base2, v_apex);
            cut_line_vertices.push(na);
            cut_line_vertices.push(nb);

            new_tris.push([v_apex, na, nb]);
            tri_side.push(s[apex]);
            new_tris.push([na, v_base1, v_base2]);
            tri_side.push(s[base1]);
            new_tris.push([na, v_base2, nb]);
            tri_side.push(s[base1]);
            continue;
        }

        if on_count == 1 && has_positive && has_negative {
            // EDGE_VERT: one vertex already on the surface, the opposite
            // edge crosses it once.
            any_cut = true;
            let idx_on = (0..3).find(|&i| s[i] == Side::OnSurface).unwrap();
            let i0 = (idx_on + 1) % 3;
            let i1 = (idx_on + 2) % 3;
            let (v_on, v0, v1) = (tri[idx_on], tri[i0], tri[i1]);
            cut_line_vertices.push(v_on);
            let nc = cut_edge(mesh, state, &mut edge_cuts, v0, v1);
            cut_line_vertices.push(nc);

            new_tris.push([v_on, v0, nc]);
            tri_side.push(s[i0]);
            new_tris.push([v_on, nc, v1]);
            tri_side.push(s[i1]);
            continue;
        }

        if on_count == 2 {
            // VERT_VERT: the shared edge of the two on-surface vertices
            // already lies on the cutting surface. No retriangulation, but
            // both endpoints are cut-path candidates for duplication.
            any_cut = true;
            for &v in tri {
                if sides[v as usize] == Side::OnSurface {
                    cut_line_vertices.push(v);
                }
            }
            new_tris.push(*tri);
            tri_side.push(if has_positive { Side::Positive } else { Side::Negative });
            continue;
        }

        // All three on-surface: the whole triangle lies in the cutting
        // plane. Degenerate for this operator's purposes; left untouched.
        new_tris.push(*tri);
        tri_side.push(Side::Positive);
    }

    if !any_cut {
        return Ok(CutReport::default());
    }

    // Duplicate every cut-line vertex whose incident triangles split into
    // a positive-side group and a negative-side group.
    cut_line_vertices.sort_unstable();
    cut_line_vertices.dedup();

    let mut report = CutReport::default();
    for &v in &cut_line_vertices {
        let incident: Vec<usize> = new_tris
            .iter()
            .enumerate()
            .filter(|(_, t)| t.contains(&v))
            .map(|(i, _)| i)
            .collect();
        let positive_group: Vec<usize> = incident.iter().copied().filter(|&i| tri_side[i] == Side::Positive).collect();
        let negative_group: Vec<usize> = incident.iter().copied().filter(|&i| tri_side[i] == Side::Negative).collect();

        if positive_group.is_empty() || negative_group.is_empty() {
            // Still a boundary/tip vertex of the cut, not a separating one.
            report.added_constraint_vertices.push(v);
            continue;
        }

        let pos = state.position[v as usize];
        let dup = mesh.push_vertex(pos);
        let dup_state = append_particle(state, pos, v, v, 0.0);
        debug_assert_eq!(dup, dup_state);

        for &tri_idx in &negative_group {
            replace_vertex(&mut new_tris[tri_idx], v, dup);
        }

        report.removed_constraint_vertices.push(v);
        report.added_constraint_vertices.push(v);
        report.added_constraint_vertices.push(dup);
    }

    *mesh.topology_mut() = Topology::Triangles(new_tris);
    Ok(report)
}

/// Splits triangle `tri_index` of `mesh` along the edge `(v_a, v_b)` at
/// interpolation parameter `t ∈ (0,1)`, inserting a new vertex and particle
/// at the cut point and replacing the one triangle with two (spec §4.D:
/// the mesh cutting operator). The opposite vertex (whichever of the
/// triangle's three is not `v_a`/`v_b`) is shared by both new triangles.
///
/// The new particle's mass and velocity are linearly interpolated from
/// `v_a`/`v_b` and both new triangles keep referencing the *same* new
/// vertex — topological separation (actually duplicating the vertex so
/// the two sides of a cut can move apart) is left to the caller, which
/// knows whether this is a full separating cut or a partial score.
pub fn split_triangle(
    mesh: &mut InMemoryMesh,
    state: &mut StateStore,
    tri_index: usize,
    v_a: u32,
    v_b: u32,
    t: f32,
) -> Result<u32> {
    let tri = {
        let tris = mesh
            .topology()
            .as_triangles()
            .ok_or(PhysicsError::WrongTopology {
                kind: crate::constraints::ConstraintKind::Area,
            })?;
        *tris
            .get(tri_index)
            .ok_or(PhysicsError::InvalidIndex { index: tri_index, count: tris.len() })?
    };

    if !tri.contains(&v_a) || !tri.contains(&v_b) {
        return Err(PhysicsError::InvalidIndex {
            index: tri_index,
            count: mesh.topology().as_triangles().map_or(0, |t| t.len()),
        });
    }
    let opposite = *tri.iter().find(|&&v| v != v_a && v != v_b).unwrap();

    let pa = state.position[v_a as usize];
    let pb = state.position[v_b as usize];
    if (pa - pb).length() < EPSILON {
        return Err(PhysicsError::DegenerateGeometry {
            kind: crate::constraints::ConstraintKind::Area,
            reason: "cut edge has zero length",
        });
    }
    let cut_point = pa.lerp(pb, t);

    let new_mesh_idx = mesh.push_vertex(cut_point);
    let new_state_idx = append_particle(state, cut_point, v_a, v_b, t);
    debug_assert_eq!(new_mesh_idx, new_state_idx, "mesh and particle arenas must stay in lockstep");

    if let Topology::Triangles(tris) = mesh.topology_mut() {
        tris[tri_index] = [opposite, v_a, new_mesh_idx];
        tris.push([opposite, new_mesh_idx, v_b]);
    }

    Ok(new_mesh_idx)
}

fn append_particle(state: &mut StateStore, pos: Vec3, v_a: u32, v_b: u32, t: f32) -> u32 {
    let idx = state.count();
    state.resize(idx + 1);
    state.position[idx] = pos;
    state.previous[idx] = pos;
    state.initial[idx] = pos;
    state.velocity[idx] = state.velocity[v_a as usize].lerp(state.velocity[v_b as usize], t);
    let mass = state.mass[v_a as usize].lerp(state.mass[v_b as usize], t);
    let _ = state.set_particle_mass(mass, idx);
    idx as u32
}

trait LerpScalar {
    fn lerp(self, other: Self, t: f32) -> Self;
}

impl LerpScalar for f32 {
    fn lerp(self, other: Self, t: f32) -> Self {
        self + (other - self) * t
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::Mesh;

    #[test]
    fn splitting_triangle_adds_one_triangle_and_one_vertex() {
        let mut mesh = InMemoryMesh::new(
            vec![Vec3::ZERO, Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.0, 1.0, 0.0)],
            Topology::Triangles(vec![[0, 1, 2]]),
        );
        let mut state = StateStore::new(3);
        state.set_initial_positions(mesh.vertex_positions());
        state.set_uniform_mass(1.0);

        let new_idx = split_triangle(&mut mesh, &mut state, 0, 0, 1, 0.5).unwrap();
        assert_eq!(new_idx, 3);
        assert_eq!(mesh.vertex_positions().len(), 4);
        assert_eq!(mesh.topology().as_triangles().unwrap().len(), 2);
        assert_eq!(state.count(), 4);
    }

    #[test]
    fn cutting_unrelated_edge_fails() {
        let mut mesh = InMemoryMesh::new(
            vec![Vec3::ZERO, Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.0, 1.0, 0.0), Vec3::new(2.0, 2.0, 2.0)],
            Topology::Triangles(vec![[0, 1, 2]]),
        );
        let mut state = StateStore::new(4);
        state.set_initial_positions(mesh.vertex_positions());
        let err = split_triangle(&mut mesh, &mut state, 0, 0, 3, 0.5).unwrap_err();
        assert!(matches!(err, PhysicsError::InvalidIndex { .. }));
    }
}
