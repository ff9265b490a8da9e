//! Component B: Constraint Library (spec §3, §4.B).
//!
//! Deep inheritance (`Constraint -> PbdConstraint -> {Distance, Area, ...}`)
//! collapses to a tagged variant with a small method table, per the design
//! note in spec §9 — mirroring the `ConstraintEnum` pattern this pack's
//! other physics crate uses for its two-body constraints
//! (`orbital-simulations-experimental/physics/src/constraint.rs`), widened
//! here to the 1..8 particle indices this spec's constraint kinds need.

pub mod area;
pub mod contact;
pub mod density;
pub mod dihedral;
pub mod distance;
pub mod fem;
pub mod fem_hex;
pub mod fem_tet;
pub mod volume;

pub use area::AreaConstraint;
pub use contact::ContactConstraint;
pub use density::ConstantDensityConstraint;
pub use dihedral::DihedralConstraint;
pub use distance::DistanceConstraint;
pub use fem_hex::FemHexConstraint;
pub use fem_tet::FemTetConstraint;
pub use volume::VolumeConstraint;

use std::collections::HashSet;

use crate::state::StateStore;

/// Tags the variant of a [`PbdConstraint`], used in error messages and for
/// dispatch in `PbdModel::initialize_constraints`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ConstraintKind {
    Distance,
    Area,
    Dihedral,
    Volume,
    FemTet,
    FemHex,
    ConstantDensity,
    Contact,
}

/// Maps a raw stiffness `k ∈ [0,1]` to the effective per-iteration
/// stiffness `1 - (1-k)^(1/iters)`, per spec §3. `iters` is the solver's
/// configured iteration count; stiffness is computed once at constraint
/// construction so the iterative PBD solve converges to the requested
/// overall stiffness regardless of `iters`.
pub fn effective_stiffness(k: f32, iters: u32) -> f32 {
    let iters = iters.max(1) as f32;
    1.0 - (1.0 - k).powf(1.0 / iters)
}

/// One constraint of any kind, holding its own particle indices, rest
/// scalars, and effective stiffness. Iteration over a `Vec<PbdConstraint>`
/// is a predictable indirect call via `match` with good branch locality,
/// per spec §9.
pub enum PbdConstraint {
    Distance(DistanceConstraint),
    Area(AreaConstraint),
    Dihedral(DihedralConstraint),
    Volume(VolumeConstraint),
    FemTet(FemTetConstraint),
    FemHex(FemHexConstraint),
    ConstantDensity(ConstantDensityConstraint),
    Contact(ContactConstraint),
}

impl PbdConstraint {
    pub fn kind(&self) -> ConstraintKind {
        match self {
            PbdConstraint::Distance(_) => ConstraintKind::Distance,
            PbdConstraint::Area(_) => ConstraintKind::Area,
            PbdConstraint::Dihedral(_) => ConstraintKind::Dihedral,
            PbdConstraint::Volume(_) => ConstraintKind::Volume,
            PbdConstraint::FemTet(_) => ConstraintKind::FemTet,
            PbdConstraint::FemHex(_) => ConstraintKind::FemHex,
            PbdConstraint::ConstantDensity(_) => ConstraintKind::ConstantDensity,
            PbdConstraint::Contact(_) => ConstraintKind::Contact,
        }
    }

    /// Reads current positions and inverse masses, writes corrections back
    /// in place (true Gauss-Seidel — the next constraint in the list sees
    /// this one's effect). Returns `false` without mutation if the
    /// constraint is degenerate at the current step; pinned particles
    /// never move (spec §4.B).
    pub fn solve_position(&mut self, state: &mut StateStore) -> bool {
        match self {
            PbdConstraint::Distance(c) => c.solve_position(state),
            PbdConstraint::Area(c) => c.solve_position(state),
            PbdConstraint::Dihedral(c) => c.solve_position(state),
            PbdConstraint::Volume(c) => c.solve_position(state),
            PbdConstraint::FemTet(c) => c.solve_position(state),
            PbdConstraint::FemHex(c) => c.solve_position(state),
            PbdConstraint::ConstantDensity(c) => c.solve_position(state),
            PbdConstraint::Contact(c) => c.solve_position(state),
        }
    }

    /// Whether any particle this constraint reads/writes is in `vertices`
    /// (used by `PbdModel::apply_cut` to drop constraints a cut invalidated
    /// without rebuilding the whole body). Contact constraints are
    /// scratch-only and never persistent, so they never match.
    pub fn touches_any(&self, vertices: &HashSet<u32>) -> bool {
        match self {
            PbdConstraint::Distance(c) => vertices.contains(&c.i) || vertices.contains(&c.j),
            PbdConstraint::Area(c) => [c.i, c.j, c.k].iter().any(|v| vertices.contains(v)),
            PbdConstraint::Dihedral(c) => [c.i, c.j, c.k, c.l].iter().any(|v| vertices.contains(v)),
            PbdConstraint::Volume(c) => [c.i, c.j, c.k, c.l].iter().any(|v| vertices.contains(v)),
            PbdConstraint::FemTet(c) => c.indices.iter().any(|v| vertices.contains(v)),
            PbdConstraint::FemHex(c) => c.indices.iter().any(|v| vertices.contains(v)),
            PbdConstraint::ConstantDensity(c) => c.indices().iter().any(|v| vertices.contains(v)),
            PbdConstraint::Contact(_) => false,
        }
    }
}

/// Degeneracy epsilon shared across constraint initialization, per spec §4.B
/// ("DegenerateGeometry when rest measure below ε = 1e-6").
pub const EPSILON: f32 = 1e-6;
