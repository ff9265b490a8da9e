use glam::Vec3;

use crate::constraints::{effective_stiffness, ConstraintKind, EPSILON};
use crate::error::{PhysicsError, Result};
use crate::state::StateStore;

/// Area constraint over a triangle (i,j,k) (spec §4.B):
/// C = ½‖(xⱼ−xᵢ)×(xₖ−xᵢ)‖ − A₀.
pub struct AreaConstraint {
    pub i: u32,
    pub j: u32,
    pub k: u32,
    pub rest_area: f32,
    pub effective_stiffness: f32,
}

impl AreaConstraint {
    pub fn init(
        state: &StateStore,
        i: u32,
        j: u32,
        k: u32,
        stiffness: f32,
        iters: u32,
    ) -> Result<Self> {
        let (p_i, p_j, p_k) = (
            state.initial[i as usize],
            state.initial[j as usize],
            state.initial[k as usize],
        );
        let cross = (p_j - p_i).cross(p_k - p_i);
        let rest_area = 0.5 * cross.length();
        if rest_area < EPSILON {
            return Err(PhysicsError::DegenerateGeometry {
                kind: ConstraintKind::Area,
                reason: "zero-area triangle",
            });
        }
        Ok(Self {
            i,
            j,
            k,
            rest_area,
            effective_stiffness: effective_stiffness(stiffness, iters),
        })
    }

    pub fn solve_position(&mut self, state: &mut StateStore) -> bool {
        let (i, j, k) = (self.i as usize, self.j as usize, self.k as usize);
        let (w_i, w_j, w_k) = (state.inv_mass[i], state.inv_mass[j], state.inv_mass[k]);
        if w_i + w_j + w_k < EPSILON {
            return false;
        }

        let (p_i, p_j, p_k) = (state.position[i], state.position[j], state.position[k]);
        let e1 = p_j - p_i;
        let e2 = p_k - p_i;
        let cross = e1.cross(e2);
        let cross_len = cross.length();
        if cross_len < EPSILON {
            return false;
        }
        let area = 0.5 * cross_len;
        let n = cross / cross_len; // recovered normal, per spec §4.B

        // Gradients: dA/dxi = -½ n×(xk-xj), and cyclically for j, k.
        let grad_i = n.cross(p_k - p_j) * 0.5;
        let grad_j = n.cross(p_i - p_k) * 0.5;
        let grad_k = n.cross(p_j - p_i) * 0.5;

        let denom = w_i * grad_i.length_squared()
            + w_j * grad_j.length_squared()
            + w_k * grad_k.length_squared();
        if denom < EPSILON {
            return false;
        }

        let c = area - self.rest_area;
        let lambda = self.effective_stiffness * c / denom;

        apply(state, i, w_i, grad_i, lambda);
        apply(state, j, w_j, grad_j, lambda);
        apply(state, k, w_k, grad_k, lambda);
        true
    }
}

#[inline]
fn apply(state: &mut StateStore, idx: usize, w: f32, grad: Vec3, lambda: f32) {
    if w > 0.0 {
        state.position[idx] -= grad * (w * lambda);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn degenerate_triangle_fails_init() {
        let mut state = StateStore::new(3);
        state.set_initial_positions(&[Vec3::ZERO, Vec3::ZERO, Vec3::ZERO]);
        let err = AreaConstraint::init(&state, 0, 1, 2, 0.9, 4).unwrap_err();
        assert!(matches!(err, PhysicsError::DegenerateGeometry { .. }));
    }

    #[test]
    fn rest_configuration_is_near_noop() {
        let mut state = StateStore::new(3);
        state.set_initial_positions(&[
            Vec3::ZERO,
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        ]);
        let mut c = AreaConstraint::init(&state, 0, 1, 2, 0.9, 5).unwrap();
        let before = state.position[1];
        c.solve_position(&mut state);
        assert!((state.position[1] - before).length() < 1e-5);
    }
}
