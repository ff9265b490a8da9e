use crate::constraints::{effective_stiffness, ConstraintKind, EPSILON};
use crate::error::{PhysicsError, Result};
use crate::state::StateStore;

/// Volume constraint over a tetrahedron (i,j,k,l) (spec §4.B):
/// C = ⅙(xⱼ−xᵢ)·((xₖ−xᵢ)×(xₗ−xᵢ)) − V₀.
///
/// Grounded on `examples/original_source/Base/Constraint/imstkPbdVolumeConstraint.cpp`.
/// That source tests `im1 > 0` twice (once where it should test `im2`);
/// spec §9 calls this out explicitly as a transcription bug, so the guard
/// below tests each particle's own inverse mass.
pub struct VolumeConstraint {
    pub i: u32,
    pub j: u32,
    pub k: u32,
    pub l: u32,
    pub rest_volume: f32,
    pub effective_stiffness: f32,
}

impl VolumeConstraint {
    pub fn init(
        state: &StateStore,
        i: u32,
        j: u32,
        k: u32,
        l: u32,
        stiffness: f32,
        iters: u32,
    ) -> Result<Self> {
        let (p0, p1, p2, p3) = (
            state.initial[i as usize],
            state.initial[j as usize],
            state.initial[k as usize],
            state.initial[l as usize],
        );
        let rest_volume = (1.0 / 6.0) * (p1 - p0).cross(p2 - p0).dot(p3 - p0);
        if rest_volume.abs() < EPSILON {
            return Err(PhysicsError::DegenerateGeometry {
                kind: ConstraintKind::Volume,
                reason: "zero-volume tetrahedron",
            });
        }
        Ok(Self {
            i,
            j,
            k,
            l,
            rest_volume,
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
        let (x1, x2, x3, x4) = (
            state.position[ii],
            state.position[jj],
            state.position[kk],
            state.position[ll],
        );
        let (w1, w2, w3, w4) = (
            state.inv_mass[ii],
            state.inv_mass[jj],
            state.inv_mass[kk],
            state.inv_mass[ll],
        );
        if w1 + w2 + w3 + w4 < EPSILON {
            return false;
        }

        let one_sixth = 1.0 / 6.0;
        let grad1 = (x2 - x3).cross(x4 - x2) * one_sixth;
        let grad2 = (x3 - x1).cross(x4 - x1) * one_sixth;
        let grad3 = (x4 - x1).cross(x2 - x1) * one_sixth;
        let grad4 = (x2 - x1).cross(x3 - x1) * one_sixth;

        let volume = grad4.dot(x4 - x1);

        let denom = w1 * grad1.length_squared()
            + w2 * grad2.length_squared()
            + w3 * grad3.length_squared()
            + w4 * grad4.length_squared();
        if denom < EPSILON {
            return false;
        }

        let lambda = (volume - self.rest_volume) / denom * self.effective_stiffness;

        if w1 > 0.0 {
            state.position[ii] -= grad1 * (w1 * lambda);
        }
        if w2 > 0.0 {
            state.position[jj] -= grad2 * (w2 * lambda);
        }
        if w3 > 0.0 {
            state.position[kk] -= grad3 * (w3 * lambda);
        }
        if w4 > 0.0 {
            state.position[ll] -= grad4 * (w4 * lambda);
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn zero_volume_tet_fails_init() {
        let mut state = StateStore::new(4);
        state.set_initial_positions(&[
            Vec3::ZERO,
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::ZERO,
        ]);
        let err = VolumeConstraint::init(&state, 0, 1, 2, 3, 0.9, 5).unwrap_err();
        assert!(matches!(err, PhysicsError::DegenerateGeometry { .. }));
    }

    #[test]
    fn guard_checks_own_inverse_mass_not_particle1() {
        // Pin particle 1 (index j). If the volume-constraint guard still
        // carried the source's copy-paste bug (testing `im1` for both the
        // i and j branches) this would move particle j anyway.
        let mut state = StateStore::new(4);
        state.set_initial_positions(&[
            Vec3::ZERO,
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(0.0, 0.0, 1.0),
        ]);
        let mut c = VolumeConstraint::init(&state, 0, 1, 2, 3, 1.0, 1).unwrap();
        state.pin(1).unwrap();
        state.position[3] = Vec3::new(0.0, 0.0, 2.0); // perturb volume
        let before_j = state.position[1];
        c.solve_position(&mut state);
        assert_eq!(state.position[1], before_j);
    }
}
