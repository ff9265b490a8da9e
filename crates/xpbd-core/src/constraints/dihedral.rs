use glam::Vec3;

use crate::constraints::{effective_stiffness, ConstraintKind, EPSILON};
use crate::error::{PhysicsError, Result};
use crate::state::StateStore;

/// Dihedral (bending) constraint between two triangles sharing edge (k,l),
/// with opposite vertices i and j (spec §4.B):
///
/// ```text
///     i
///    / \
///   k---l
///    \ /
///     j
/// ```
///
/// Rest angle θ₀ is computed via `atan2` (not `acos`) to preserve sign;
/// gradients follow Bridson's formulation, grounded on
/// `examples/4RH1T3CT0R7-GPU-particles-web/physics/crates/xpbd-core/src/constraints/bending.rs`.
pub struct DihedralConstraint {
    pub i: u32,
    pub j: u32,
    pub k: u32,
    pub l: u32,
    pub rest_angle: f32,
    pub effective_stiffness: f32,
}

/// Signed dihedral angle between triangles (k,i,l) and (k,l,j) sharing edge
/// (k,l). Returns `None` if either face area or the shared edge length is
/// below ε (spec §4.B: "Skip if either face area or shared-edge length is
/// below ε").
fn dihedral_angle(pk: Vec3, pl: Vec3, pi: Vec3, pj: Vec3) -> Option<(f32, Vec3, Vec3, Vec3)> {
    let e = pl - pk;
    let e_len = e.length();
    if e_len < EPSILON {
        return None;
    }
    let e_norm = e / e_len;

    let n1 = (pi - pk).cross(pi - pl);
    let n2 = (pj - pl).cross(pj - pk);
    let n1_len = n1.length();
    let n2_len = n2.length();
    if n1_len < EPSILON || n2_len < EPSILON {
        return None;
    }
    let n1u = n1 / n1_len;
    let n2u = n2 / n2_len;

    let cos_angle = n1u.dot(n2u).clamp(-1.0, 1.0);
    let sin_angle = n1u.cross(n2u).dot(e_norm);
    let angle = sin_angle.atan2(cos_angle);
    Some((angle, e, n1, n2))
}

impl DihedralConstraint {
    pub fn init(
        state: &StateStore,
        i: u32,
        j: u32,
        k: u32,
        l: u32,
        stiffness: f32,
        iters: u32,
    ) -> Result<Self> {
        let (pi, pj, pk, pl) = (
            state.initial[i as usize],
            state.initial[j as usize],
            state.initial[k as usize],
            state.initial[l as usize],
        );
        let (rest_angle, ..) = dihedral_angle(pk, pl, pi, pj).ok_or(PhysicsError::DegenerateGeometry {
            kind: ConstraintKind::Dihedral,
            reason: "degenerate face or shared edge at rest",
        })?;
        Ok(Self {
            i,
            j,
            k,
            l,
            rest_angle,
            effective_stiffness: effective_stiffness(stiffness, iters),
        })
    }

    pub fn solve_position(&mut self, state: &mut StateStore) -> bool {
        let (ii, jj, kk, ll) = (
            self.i as usize,
            self.j as usize,
            self.k as usize,
            self.l as usize,
        );
        let (pi, pj, pk, pl) = (
            state.position[ii],
            state.position[jj],
            state.position[kk],
            state.position[ll],
        );

        let Some((angle, e, n1, n2)) = dihedral_angle(pk, pl, pi, pj) else {
            return false;
        };
        let angle_error = angle - self.rest_angle;
        if angle_error.abs() < EPSILON {
            return false;
        }

        let (w_i, w_j, w_k, w_l) = (
            state.inv_mass[ii],
            state.inv_mass[jj],
            state.inv_mass[kk],
            state.inv_mass[ll],
        );
        if w_i + w_j + w_k + w_l < EPSILON {
            return false;
        }

        let e_len = e.length();
        let e_len_sq = e_len * e_len;
        let n1_len_sq = n1.length_squared();
        let n2_len_sq = n2.length_squared();
        if n1_len_sq < EPSILON || n2_len_sq < EPSILON {
            return false;
        }

        // Analytical gradients (Bridson et al.): opposite vertices first,
        // then the shared-edge vertices via a cotangent-weighted blend.
        let grad_i = n1 * (-e_len / n1_len_sq);
        let grad_j = n2 * (-e_len / n2_len_sq);

        let t_k = (pi - pk).dot(e) / e_len_sq;
        let t_l = (pj - pk).dot(e) / e_len_sq;
        let grad_k = grad_i * -(1.0 - t_k) + grad_j * -(1.0 - t_l);
        let grad_l = grad_i * -t_k + grad_j * -t_l;

        let denom = w_i * grad_i.length_squared()
            + w_j * grad_j.length_squared()
            + w_k * grad_k.length_squared()
            + w_l * grad_l.length_squared();
        if denom < EPSILON {
            return false;
        }

        let lambda = self.effective_stiffness * angle_error / denom;

        if w_i > 0.0 {
            state.position[ii] -= grad_i * (w_i * lambda);
        }
        if w_j > 0.0 {
            state.position[jj] -= grad_j * (w_j * lambda);
        }
        if w_k > 0.0 {
            state.position[kk] -= grad_k * (w_k * lambda);
        }
        if w_l > 0.0 {
            state.position[ll] -= grad_l * (w_l * lambda);
        }
        true
    }
}
