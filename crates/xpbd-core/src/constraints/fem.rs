//! Shared first Piola-Kirchhoff stress evaluation for FEM-tet and FEM-hex.
//!
//! Grounded on `examples/original_source/Base/Constraint/imstkPbdFETetConstraint.cpp`,
//! generalized from Eigen's `Mat3d`/`JacobiSVD` to `glam::Mat3` with the
//! rotation `R` in the Corotation branch obtained by the iterative polar
//! decomposition already used in this pack for shape matching (see
//! `examples/4RH1T3CT0R7-GPU-particles-web/physics/crates/xpbd-core/src/constraints/shape_matching.rs`),
//! rather than a full SVD crate (see SPEC_FULL.md §1 and DESIGN.md).

use glam::Mat3;

use crate::materials::MaterialType;

/// Evaluate the first Piola-Kirchhoff stress `P(F)` and the strain-energy
/// constraint value `C` for a deformation gradient `F`, per spec §4.B.
pub fn first_piola_kirchhoff(f: Mat3, material: MaterialType, mu: f32, lambda: f32) -> (Mat3, f32) {
    match material {
        MaterialType::Linear => (Mat3::ZERO, 0.0),

        MaterialType::StVK => {
            let ft_f = f.transpose() * f;
            let e = (ft_f - Mat3::IDENTITY) * 0.5;
            let tr_e = e.trace();
            let p = f * (e * (2.0 * mu) + Mat3::IDENTITY * (lambda * tr_e));
            let c = mu * frobenius_norm_sq(e) + 0.5 * lambda * tr_e * tr_e;
            (p, c)
        }

        MaterialType::Corotation => {
            let r = polar_decomposition_rotation(f);
            let j = f.determinant();
            let inv_ft = f.inverse().transpose();
            let f_minus_r = f - r;
            let p = f_minus_r * (2.0 * mu) + inv_ft * (lambda * (j - 1.0) * j);
            let c = mu * frobenius_norm_sq(f_minus_r) + 0.5 * lambda * (j - 1.0) * (j - 1.0);
            (p, c)
        }

        MaterialType::NeoHookean => {
            let j = f.determinant();
            let inv_ft = f.inverse().transpose();
            let log_j = j.ln();
            let p = (f - inv_ft) * mu + inv_ft * (lambda * log_j);
            let c = 0.5 * mu * (frobenius_norm_sq(f) - 3.0) - mu * log_j
                + 0.5 * lambda * log_j * log_j;
            (p, c)
        }
    }
}

/// Squared Frobenius norm `sum(m[i][j]^2)`.
fn frobenius_norm_sq(m: Mat3) -> f32 {
    m.col(0).length_squared() + m.col(1).length_squared() + m.col(2).length_squared()
}

/// Extract the rotational factor `R` of the polar decomposition
/// `F = R S` (`S` symmetric positive semi-definite) via the fixed-point
/// iteration `Rₖ₊₁ = ½(Rₖ + Rₖ⁻ᵀ)`. Used in place of a full SVD: for
/// Corotation we only need `R` (the same `R = UVᵀ` a full SVD would give)
/// and `J = det(F)` (obtained directly, without ever forming `Σ`).
/// Returns identity if `F` is singular partway through the iteration.
pub fn polar_decomposition_rotation(f: Mat3) -> Mat3 {
    let mut r = f;
    for _ in 0..16 {
        let det = r.determinant();
        if det.abs() < 1e-10 {
            return Mat3::IDENTITY;
        }
        let r_inv_t = r.inverse().transpose();
        r = (r + r_inv_t) * 0.5;
    }
    r
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mat3_close(a: Mat3, b: Mat3, eps: f32) -> bool {
        a.to_cols_array()
            .iter()
            .zip(b.to_cols_array().iter())
            .all(|(x, y)| (x - y).abs() < eps)
    }

    #[test]
    fn identity_deformation_gives_zero_stress_and_energy() {
        for material in [
            MaterialType::StVK,
            MaterialType::Corotation,
            MaterialType::NeoHookean,
        ] {
            let (p, c) = first_piola_kirchhoff(Mat3::IDENTITY, material, 1.0e5, 5.0e4);
            assert!(mat3_close(p, Mat3::ZERO, 1e-3), "{material:?}: P = {p:?}");
            assert!(c.abs() < 1e-3, "{material:?}: C = {c}");
        }
    }

    #[test]
    fn polar_decomposition_of_rotation_is_itself() {
        let r = Mat3::from_rotation_y(0.7);
        let extracted = polar_decomposition_rotation(r);
        assert!(mat3_close(extracted, r, 1e-4));
    }
}
