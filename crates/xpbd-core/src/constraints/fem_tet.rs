use glam::{Mat3, Vec3};

use crate::constraints::fem::first_piola_kirchhoff;
use crate::constraints::{ConstraintKind, EPSILON};
use crate::error::{PhysicsError, Result};
use crate::materials::MaterialType;
use crate::state::StateStore;

/// FEM tetrahedral element constraint (spec §4.B): strain-energy density
/// `Psi(F)` evaluated from the deformation gradient `F = Ds * Dm⁻¹`, where
/// `Dm` is the rest-shape matrix and `Ds` the current shape matrix of edges
/// (x1-x0, x2-x0, x3-x0).
///
/// Grounded on `examples/original_source/Base/Constraint/imstkPbdFETetConstraint.cpp`;
/// stress evaluation delegates to [`first_piola_kirchhoff`].
pub struct FemTetConstraint {
    pub indices: [u32; 4],
    pub dm_inv: Mat3,
    pub rest_volume: f32,
    pub material: MaterialType,
    pub mu: f32,
    pub lambda: f32,
}

impl FemTetConstraint {
    pub fn init(
        state: &StateStore,
        indices: [u32; 4],
        material: MaterialType,
        mu: f32,
        lambda: f32,
    ) -> Result<Self> {
        let p: Vec<Vec3> = indices.iter().map(|&i| state.initial[i as usize]).collect();
        let dm = Mat3::from_cols(p[1] - p[0], p[2] - p[0], p[3] - p[0]);
        let det = dm.determinant();
        let rest_volume = det.abs() / 6.0;
        if rest_volume < EPSILON {
            return Err(PhysicsError::DegenerateGeometry {
                kind: ConstraintKind::FemTet,
                reason: "zero-volume rest tetrahedron",
            });
        }
        Ok(Self {
            indices,
            dm_inv: dm.inverse(),
            rest_volume,
            material,
            mu,
            lambda,
        })
    }

    pub fn solve_position(&mut self, state: &mut StateStore) -> bool {
        let idx: [usize; 4] = self.indices.map(|i| i as usize);
        let w: Vec<f32> = idx.iter().map(|&i| state.inv_mass[i]).collect();
        if w.iter().sum::<f32>() < EPSILON {
            return false;
        }

        let x: Vec<Vec3> = idx.iter().map(|&i| state.position[i]).collect();
        let ds = Mat3::from_cols(x[1] - x[0], x[2] - x[0], x[3] - x[0]);
        let f = ds * self.dm_inv;

        let (p_stress, c_density) = first_piola_kirchhoff(f, self.material, self.mu, self.lambda);
        if c_density.abs() < EPSILON {
            return false;
        }

        // H columns are the per-particle force gradients for particles
        // 1,2,3; particle 0's gradient balances them (sum of internal
        // forces over the element is zero).
        let h = p_stress * self.dm_inv.transpose() * self.rest_volume;
        let grad1 = h.col(0);
        let grad2 = h.col(1);
        let grad3 = h.col(2);
        let grad0 = -(grad1 + grad2 + grad3);
        let grads = [grad0, grad1, grad2, grad3];

        let denom: f32 = (0..4).map(|k| w[k] * grads[k].length_squared()).sum();
        if denom < EPSILON {
            return false;
        }

        let c = c_density * self.rest_volume;
        let s = c / denom;

        for k in 0..4 {
            if w[k] > 0.0 {
                state.position[idx[k]] -= grads[k] * (w[k] * s);
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn degenerate_tet_fails_init() {
        let mut state = StateStore::new(4);
        state.set_initial_positions(&[
            Vec3::ZERO,
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(2.0, 0.0, 0.0),
            Vec3::new(3.0, 0.0, 0.0),
        ]);
        let err =
            FemTetConstraint::init(&state, [0, 1, 2, 3], MaterialType::StVK, 1.0e5, 5.0e4)
                .unwrap_err();
        assert!(matches!(err, PhysicsError::DegenerateGeometry { .. }));
    }

    #[test]
    fn rest_configuration_is_near_noop_for_all_materials() {
        for material in [
            MaterialType::StVK,
            MaterialType::Corotation,
            MaterialType::NeoHookean,
        ] {
            let mut state = StateStore::new(4);
            state.set_initial_positions(&[
                Vec3::ZERO,
                Vec3::new(1.0, 0.0, 0.0),
                Vec3::new(0.0, 1.0, 0.0),
                Vec3::new(0.0, 0.0, 1.0),
            ]);
            let mut c =
                FemTetConstraint::init(&state, [0, 1, 2, 3], material, 1.0e5, 5.0e4).unwrap();
            let before = state.position[1];
            c.solve_position(&mut state);
            assert!(
                (state.position[1] - before).length() < 1e-3,
                "{material:?} moved rest-shape particle"
            );
        }
    }
}
