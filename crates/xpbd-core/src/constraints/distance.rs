use crate::constraints::{effective_stiffness, ConstraintKind, EPSILON};
use crate::error::{PhysicsError, Result};
use crate::state::StateStore;

/// Distance constraint for mesh edges (spec §4.B): C = ‖xᵢ−xⱼ‖ − L₀.
pub struct DistanceConstraint {
    pub i: u32,
    pub j: u32,
    pub rest_length: f32,
    pub effective_stiffness: f32,
}

impl DistanceConstraint {
    /// `stiffness` is the raw [0,1] stiffness; `iters` is the solver's
    /// configured iteration count used to derive the effective stiffness.
    pub fn init(state: &StateStore, i: u32, j: u32, stiffness: f32, iters: u32) -> Result<Self> {
        let p_i = state.initial[i as usize];
        let p_j = state.initial[j as usize];
        let rest_length = (p_i - p_j).length();
        if rest_length < EPSILON {
            return Err(PhysicsError::DegenerateGeometry {
                kind: ConstraintKind::Distance,
                reason: "coincident particles",
            });
        }
        Ok(Self {
            i,
            j,
            rest_length,
            effective_stiffness: effective_stiffness(stiffness, iters),
        })
    }

    pub fn solve_position(&mut self, state: &mut StateStore) -> bool {
        let i = self.i as usize;
        let j = self.j as usize;
        let w_i = state.inv_mass[i];
        let w_j = state.inv_mass[j];
        if w_i + w_j < EPSILON {
            return false;
        }

        let diff = state.position[i] - state.position[j];
        let dist = diff.length();
        if dist < EPSILON {
            return false;
        }
        let n = diff / dist;
        let c = dist - self.rest_length;

        let lambda = self.effective_stiffness * c / (w_i + w_j);
        state.position[i] -= n * (w_i * lambda);
        state.position[j] += n * (w_j * lambda);
        true
    }
}
