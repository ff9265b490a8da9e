//! FEM constitutive models and the Lamé-constant derivation they share.
//!
//! Reference: spec §3/§4.B. `lame_from_young_poisson` converts the
//! engineer-facing (E, ν) pair into the (μ, λ) pair every FEM constraint
//! reads at solve time. `MaterialType` selects which stress response
//! `FemTetConstraint`/`FemHexConstraint` evaluate.

/// Constitutive model for FEM-tet / FEM-hex constraints.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MaterialType {
    /// Reserved placeholder for a future small-strain branch; currently a
    /// no-op at solve time, per spec §4.B.
    Linear,
    /// Saint Venant-Kirchhoff: E = ½(FᵀF - I), P = F(2μE + λ tr(E)I).
    StVK,
    /// Corotational linear elasticity: P = 2μ(F-R) + λ(J-1)JF⁻ᵀ.
    Corotation,
    /// Neo-Hookean: P = μ(F - F⁻ᵀ) + λ log(J) F⁻ᵀ.
    NeoHookean,
}

/// Derive the Lamé pair (μ, λ) from Young's modulus `e` and Poisson ratio
/// `nu`, per spec §3: μ = E / (2(1+ν)), λ = Eν / ((1-2ν)(1+ν)).
///
/// As ν → 0.5, λ diverges (near-incompressible limit); callers that need
/// numerical care near that pole should clamp `nu` below 0.5 themselves.
/// This function does not clamp — it is a pure algebraic mapping.
pub fn lame_from_young_poisson(e: f32, nu: f32) -> (f32, f32) {
    let mu = e / (2.0 * (1.0 + nu));
    let lambda = e * nu / ((1.0 - 2.0 * nu) * (1.0 + nu));
    (mu, lambda)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lame_matches_known_steel_like_values() {
        // E = 200 GPa, nu = 0.3 is a commonly tabulated reference point.
        let (mu, lambda) = lame_from_young_poisson(200.0e9, 0.3);
        assert!((mu - 76.923e9).abs() / 76.923e9 < 1e-3);
        assert!((lambda - 115.385e9).abs() / 115.385e9 < 1e-3);
    }

    #[test]
    fn lame_lambda_grows_without_bound_near_half() {
        let (_, lambda_far) = lame_from_young_poisson(1.0e5, 0.3);
        let (_, lambda_near) = lame_from_young_poisson(1.0e5, 0.499);
        assert!(lambda_near.abs() > lambda_far.abs() * 10.0);
        assert!(lambda_near.is_finite());
    }
}
