use super::{CollisionData, PdRecord, Sphere};

/// Sphere-vs-sphere narrow phase, ported from
/// `examples/original_source/Base/Collision/CollisionDetection/imstkSphereToSphereCD.cpp`:
/// one `PDColData` record per side, each carrying its own surface contact
/// point and outward-pointing direction.
pub fn detect(a: &Sphere, b: &Sphere) -> CollisionData {
    let mut data = CollisionData::default();
    let dir_b_to_a_raw = a.center - b.center;
    let d = dir_b_to_a_raw.length();
    let depth = a.radius + b.radius - d;
    if depth <= 0.0 || d <= 0.0 {
        return data;
    }
    let dir_b_to_a = dir_b_to_a_raw / d;
    let point_a = a.center - dir_b_to_a * a.radius;
    let point_b = b.center + dir_b_to_a * b.radius;
    data.pd.push(PdRecord {
        point: point_a,
        direction: dir_b_to_a,
        depth,
    });
    data.pd.push(PdRecord {
        point: point_b,
        direction: -dir_b_to_a,
        depth,
    });
    data
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn separated_spheres_have_no_contact() {
        let a = Sphere { center: Vec3::ZERO, radius: 0.5 };
        let b = Sphere { center: Vec3::new(3.0, 0.0, 0.0), radius: 0.5 };
        assert!(detect(&a, &b).is_empty());
    }

    #[test]
    fn overlapping_spheres_report_two_opposed_records() {
        let a = Sphere { center: Vec3::ZERO, radius: 0.6 };
        let b = Sphere { center: Vec3::new(1.0, 0.0, 0.0), radius: 0.6 };
        let data = detect(&a, &b);
        assert_eq!(data.pd.len(), 2);
        assert!((data.pd[0].depth - 0.2).abs() < 1e-5);
        assert_eq!(data.pd[0].direction, -data.pd[1].direction);
    }
}
