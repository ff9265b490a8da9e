use glam::Vec3;

use crate::materials::MaterialType;

/// Configuration for a [`crate::model::PbdModel`], recognized at
/// construction per spec §6.
pub struct PbdConfig {
    /// Simulation time step in seconds.
    pub dt: f32,
    /// Gravitational acceleration.
    pub gravity: Vec3,
    /// Solver iterations per step (N_iter in spec §3/§4.C).
    pub iterations: u32,
    /// Linear damping coefficient in [0,1], applied in `integrateVelocity`.
    pub linear_damping: f32,
    /// Angular damping coefficient in [0,1]. Reserved: the core has no
    /// angular degrees of freedom (particles only), kept for parity with
    /// the option bag spec §6 defines.
    pub angular_damping: f32,
    /// Stiffness in [0,1] used for synthesized contact constraints.
    /// Default 1.0 per spec §9 (the source never sets a default).
    pub contact_stiffness: f32,
    /// Collision proximity margin in meters.
    pub proximity: f32,
    /// Reserved, currently ignored (spec §6).
    pub do_partitioning: bool,
    /// FEM material model for FEM-tet / FEM-hex constraints.
    pub material: MaterialType,
    /// Young's modulus E (> 0).
    pub youngs_modulus: f32,
    /// Poisson ratio ν, in (-1, 0.5).
    pub poisson_ratio: f32,
    /// Maximum interaction distance for density-constraint neighbors (h).
    pub density_max_dist: f32,
    /// Rest density ρ₀ for the constant-density constraint.
    pub density_rest_density: f32,
    /// Maximum neighbor count K before truncation (BudgetExceeded).
    pub density_max_neighbors: u32,
    /// Relaxation parameter ε_relax for the density constraint.
    pub density_relaxation: f32,
    /// Stiffness in [0,1] for distance constraints the cutting operator
    /// rebuilds over newly separated/duplicated vertices (spec §4.D final
    /// paragraph).
    pub cut_distance_stiffness: f32,
    /// Stiffness in [0,1] for dihedral constraints rebuilt the same way.
    pub cut_dihedral_stiffness: f32,
    /// Vertex-classification tolerance for the cutting operator's
    /// signed-distance test.
    pub cut_epsilon: f32,
}

impl Default for PbdConfig {
    fn default() -> Self {
        Self {
            dt: 1.0 / 60.0,
            gravity: Vec3::new(0.0, -9.81, 0.0),
            iterations: 4,
            linear_damping: 0.01,
            angular_damping: 0.01,
            contact_stiffness: 1.0,
            proximity: 0.01,
            do_partitioning: false,
            material: MaterialType::StVK,
            youngs_modulus: 1.0e5,
            poisson_ratio: 0.3,
            density_max_dist: 0.1,
            density_rest_density: 1000.0,
            density_max_neighbors: 64,
            density_relaxation: 600.0,
            cut_distance_stiffness: 1.0,
            cut_dihedral_stiffness: 1.0,
            cut_epsilon: 1.0e-4,
        }
    }
}

impl PbdConfig {
    /// Derive the Lamé pair (μ, λ) from `youngs_modulus` and `poisson_ratio`,
    /// per spec §3: μ = E / (2(1+ν)), λ = Eν / ((1-2ν)(1+ν)).
    pub fn lame(&self) -> (f32, f32) {
        let e = self.youngs_modulus;
        let nu = self.poisson_ratio;
        let mu = e / (2.0 * (1.0 + nu));
        let lambda = e * nu / ((1.0 - 2.0 * nu) * (1.0 + nu));
        (mu, lambda)
    }
}
