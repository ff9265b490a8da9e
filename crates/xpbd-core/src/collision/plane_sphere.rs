use super::{PdRecord, Plane, Sphere};

/// Plane-vs-sphere narrow phase, generalizing
/// `examples/original_source/Base/Collision/CollisionDetection/imstkSphereToSphereCD.cpp`
/// to an infinite-radius "sphere" (a plane): penetration depth is the
/// signed distance of the sphere center below the plane.
pub fn detect(plane: &Plane, sphere: &Sphere) -> Option<PdRecord> {
    let signed_dist = (sphere.center - plane.point).dot(plane.normal);
    let depth = sphere.radius - signed_dist;
    if depth <= 0.0 {
        return None;
    }
    let point = sphere.center - plane.normal * signed_dist;
    Some(PdRecord {
        point,
        direction: plane.normal,
        depth,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn resting_sphere_has_no_contact() {
        let plane = Plane { point: Vec3::ZERO, normal: Vec3::Y };
        let sphere = Sphere { center: Vec3::new(0.0, 1.0, 0.0), radius: 0.5 };
        assert!(detect(&plane, &sphere).is_none());
    }

    #[test]
    fn penetrating_sphere_reports_depth() {
        let plane = Plane { point: Vec3::ZERO, normal: Vec3::Y };
        let sphere = Sphere { center: Vec3::new(0.0, 0.3, 0.0), radius: 0.5 };
        let r = detect(&plane, &sphere).unwrap();
        assert!((r.depth - 0.2).abs() < 1e-5);
        assert_eq!(r.direction, Vec3::Y);
    }
}
