//! Component A: State & Mass Store (spec §3, §4.A).

use glam::Vec3;

use crate::error::{PhysicsError, Result};

/// Three position snapshots plus velocity/acceleration/mass, addressed by
/// particle index (spec §3). Initial positions are set once at
/// construction and never mutated; current positions are mutated during
/// prediction and projection; previous positions are written only at the
/// start of prediction.
pub struct StateStore {
    count: usize,
    /// Current position xᵢ, mutated during prediction/projection.
    pub position: Vec<Vec3>,
    /// Previous position x⁻ᵢ, written only at the start of `predict()`.
    pub previous: Vec<Vec3>,
    /// Rest/initial position x⁰ᵢ, fixed after construction.
    pub initial: Vec<Vec3>,
    /// Velocity vᵢ.
    pub velocity: Vec<Vec3>,
    /// Acceleration aᵢ (external forces accumulated per step).
    pub acceleration: Vec<Vec3>,
    /// Mass mᵢ ≥ 0.
    pub mass: Vec<f32>,
    /// Inverse mass wᵢ = 1/mᵢ, or 0 for a pinned (infinite-mass) particle.
    pub inv_mass: Vec<f32>,
}

impl StateStore {
    pub fn new(count: usize) -> Self {
        Self {
            count,
            position: vec![Vec3::ZERO; count],
            previous: vec![Vec3::ZERO; count],
            initial: vec![Vec3::ZERO; count],
            velocity: vec![Vec3::ZERO; count],
            acceleration: vec![Vec3::ZERO; count],
            mass: vec![1.0; count],
            inv_mass: vec![1.0; count],
        }
    }

    pub fn count(&self) -> usize {
        self.count
    }

    fn check_index(&self, i: usize) -> Result<()> {
        if i >= self.count {
            Err(PhysicsError::InvalidIndex {
                index: i,
                count: self.count,
            })
        } else {
            Ok(())
        }
    }

    /// Resize the store to `n` particles. Existing data beyond the new
    /// count is dropped; new slots start at identity/zero state.
    pub fn resize(&mut self, n: usize) {
        self.count = n;
        self.position.resize(n, Vec3::ZERO);
        self.previous.resize(n, Vec3::ZERO);
        self.initial.resize(n, Vec3::ZERO);
        self.velocity.resize(n, Vec3::ZERO);
        self.acceleration.resize(n, Vec3::ZERO);
        self.mass.resize(n, 1.0);
        self.inv_mass.resize(n, 1.0);
    }

    /// Set every particle to the same mass `m` (`m > 0`).
    pub fn set_uniform_mass(&mut self, m: f32) {
        for i in 0..self.count {
            self.mass[i] = m;
            self.inv_mass[i] = if m > 0.0 { 1.0 / m } else { 0.0 };
        }
    }

    /// Set the mass of a single particle.
    pub fn set_particle_mass(&mut self, m: f32, i: usize) -> Result<()> {
        self.check_index(i)?;
        self.mass[i] = m;
        self.inv_mass[i] = if m > 0.0 { 1.0 / m } else { 0.0 };
        Ok(())
    }

    /// Pin a particle: wᵢ = 0, infinite mass, immovable during projection.
    pub fn pin(&mut self, i: usize) -> Result<()> {
        self.check_index(i)?;
        self.inv_mass[i] = 0.0;
        Ok(())
    }

    pub fn is_pinned(&self, i: usize) -> bool {
        self.inv_mass[i] == 0.0
    }

    /// Copy vertex positions from `src` into all three snapshots and resize
    /// to `src.len()`. Called by `setGeometry` / mesh replacement.
    pub fn set_initial_positions(&mut self, src: &[Vec3]) {
        self.resize(src.len());
        self.initial.copy_from_slice(src);
        self.position.copy_from_slice(src);
        self.previous.copy_from_slice(src);
    }

    /// Write current positions into the previous snapshot. Called at the
    /// start of `predict()`.
    pub fn swap_current_into_previous(&mut self) {
        self.previous.copy_from_slice(&self.position);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pin_sets_inv_mass_zero() {
        let mut s = StateStore::new(4);
        s.pin(1).unwrap();
        assert_eq!(s.inv_mass[1], 0.0);
        assert!(s.is_pinned(1));
    }

    #[test]
    fn invalid_index_errors() {
        let mut s = StateStore::new(2);
        assert!(matches!(
            s.pin(5),
            Err(PhysicsError::InvalidIndex { index: 5, count: 2 })
        ));
    }

    #[test]
    fn uniform_mass_sets_inverse() {
        let mut s = StateStore::new(3);
        s.set_uniform_mass(2.0);
        assert_eq!(s.inv_mass[0], 0.5);
    }

    #[test]
    fn zero_mass_is_infinite_mass() {
        let mut s = StateStore::new(1);
        s.set_particle_mass(0.0, 0).unwrap();
        assert_eq!(s.inv_mass[0], 0.0);
    }
}
