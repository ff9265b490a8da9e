use std::f32::consts::PI;

use glam::Vec3;
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use tracing::warn;

use crate::constraints::{ConstraintKind, EPSILON};
use crate::error::{PhysicsError, Result};
use crate::state::StateStore;

/// Constant-density (PBF-style) constraint over a group of particles
/// (spec §4.B), solved as a single global constraint rather than one
/// instance per particle pair.
///
/// Grounded on
/// `examples/original_source/Base/Constraint/PbdConstraints/imstkPbdConstantDensityConstraint.cpp`:
/// neighbor search is brute-force O(n²) and recomputed every
/// `solve_position` call (the source does not cache neighbors across
/// solver iterations), capped at `max_num_neighbors` per particle.
/// Poly6/Spiky kernel coefficients are precomputed once at `init` from the
/// kernel radius `max_dist` (spec §4.B).
pub struct ConstantDensityConstraint {
    indices: Vec<u32>,
    max_dist: f32,
    rest_density: f32,
    max_num_neighbors: usize,
    relaxation: f32,
    poly6_coeff: f32,
    spiky_coeff: f32,
}

impl ConstantDensityConstraint {
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn init(
        indices: Vec<u32>,
        max_dist: f32,
        rest_density: f32,
        max_num_neighbors: usize,
        relaxation: f32,
    ) -> Result<Self> {
        if max_dist < EPSILON {
            return Err(PhysicsError::DegenerateGeometry {
                kind: ConstraintKind::ConstantDensity,
                reason: "zero density kernel radius",
            });
        }
        let poly6_coeff = 315.0 / (64.0 * PI * max_dist.powi(9));
        let spiky_coeff = 15.0 / (PI * max_dist.powi(6));
        Ok(Self {
            indices,
            max_dist,
            rest_density,
            max_num_neighbors,
            relaxation,
            poly6_coeff,
            spiky_coeff,
        })
    }

    fn w_poly6(&self, r_len: f32) -> f32 {
        if r_len > self.max_dist || r_len == 0.0 {
            0.0
        } else {
            self.poly6_coeff * (self.max_dist * self.max_dist - r_len * r_len).powi(3)
        }
    }

    fn grad_spiky(&self, r: Vec3, r_len: f32) -> Vec3 {
        if r_len > self.max_dist || r_len == 0.0 {
            Vec3::ZERO
        } else {
            r * (self.spiky_coeff * -3.0 * (self.max_dist - r_len) * (self.max_dist - r_len))
        }
    }

    /// Brute-force neighbors of particle `a` within `max_dist`, capped at
    /// `max_num_neighbors` (spec §4.B: "when neighbor count exceeds K the
    /// extras are dropped with a warning" — `BudgetExceeded`, non-fatal).
    fn neighbors_of(&self, a: usize, positions: &[Vec3]) -> Vec<usize> {
        let mut found = Vec::new();
        for b in 0..positions.len() {
            if a == b {
                continue;
            }
            if found.len() >= self.max_num_neighbors {
                warn!(particle = a, "constant density neighbor count reached max");
                break;
            }
            if (positions[a] - positions[b]).length() < self.max_dist {
                found.push(b);
            }
        }
        found
    }

    /// Data-parallel when the `parallel` feature is enabled (spec §5:
    /// "neighbor-accumulation loops in the constant-density constraint may
    /// be data-parallel"); each particle's neighbor list, density, and
    /// lambda depend only on read-only state, so the per-particle passes
    /// are embarrassingly parallel over `rayon`.
    pub fn solve_position(&mut self, state: &mut StateStore) -> bool {
        let n = self.indices.len();
        if n == 0 {
            return false;
        }
        let positions: Vec<Vec3> = self.indices.iter().map(|&i| state.position[i as usize]).collect();

        #[cfg(feature = "parallel")]
        let neighbors: Vec<Vec<usize>> = (0..n).into_par_iter().map(|a| self.neighbors_of(a, &positions)).collect();
        #[cfg(not(feature = "parallel"))]
        let neighbors: Vec<Vec<usize>> = (0..n).map(|a| self.neighbors_of(a, &positions)).collect();

        let density_at = |a: usize| -> f32 {
            neighbors[a]
                .iter()
                .map(|&b| self.w_poly6((positions[a] - positions[b]).length()))
                .sum()
        };
        #[cfg(feature = "parallel")]
        let densities: Vec<f32> = (0..n).into_par_iter().map(density_at).collect();
        #[cfg(not(feature = "parallel"))]
        let densities: Vec<f32> = (0..n).map(density_at).collect();

        let lambda_at = |a: usize| -> f32 {
            let c = densities[a] / self.rest_density - 1.0;
            let grad_sum: f32 = neighbors[a]
                .iter()
                .map(|&b| {
                    let r = positions[a] - positions[b];
                    self.grad_spiky(r, r.length()).length_squared() / self.rest_density
                })
                .sum();
            -c / (grad_sum + self.relaxation)
        };
        #[cfg(feature = "parallel")]
        let lambdas: Vec<f32> = (0..n).into_par_iter().map(lambda_at).collect();
        #[cfg(not(feature = "parallel"))]
        let lambdas: Vec<f32> = (0..n).map(lambda_at).collect();

        for a in 0..n {
            let idx = self.indices[a] as usize;
            if state.inv_mass[idx] <= 0.0 {
                continue;
            }
            let mut delta = Vec3::ZERO;
            for &b in &neighbors[a] {
                let r = positions[a] - positions[b];
                let grad = self.grad_spiky(r, r.length());
                delta += grad * (lambdas[a] + lambdas[b]);
            }
            state.position[idx] += delta / self.rest_density;
        }
        true
    }
}
