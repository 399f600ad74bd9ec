//! Math utilities
//!
//! Re-exports from glam and the triangle measures used by the area reducers.

pub use glam::{DVec2, DVec3, Mat4, Quat, Vec2, Vec3};

/// Area of a 3D triangle
pub fn triangle_area_3d(a: DVec3, b: DVec3, c: DVec3) -> f64 {
    0.5 * (b - a).cross(c - a).length()
}

/// Area of a 2D triangle, orientation discarded
pub fn triangle_area_2d(a: DVec2, b: DVec2, c: DVec2) -> f64 {
    let ab = b - a;
    let ac = c - a;
    0.5 * (ab.x * ac.y - ab.y * ac.x).abs()
}

/// Resolve a flat index triple, or `None` if any index is out of range
pub fn triangle_indices(triangle: &[u32], len: usize) -> Option<[usize; 3]> {
    let [i0, i1, i2] = [triangle[0] as usize, triangle[1] as usize, triangle[2] as usize];
    if i0 < len && i1 < len && i2 < len {
        Some([i0, i1, i2])
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_triangle_area_3d() {
        let area = triangle_area_3d(DVec3::ZERO, DVec3::X * 2.0, DVec3::Y * 2.0);
        assert!((area - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_triangle_area_2d_orientation() {
        let a = DVec2::ZERO;
        let b = DVec2::new(1.0, 0.0);
        let c = DVec2::new(0.0, 1.0);
        assert_eq!(triangle_area_2d(a, b, c), 0.5);
        assert_eq!(triangle_area_2d(a, c, b), 0.5);
    }

    #[test]
    fn test_triangle_indices_bounds() {
        assert_eq!(triangle_indices(&[0, 1, 2], 3), Some([0, 1, 2]));
        assert_eq!(triangle_indices(&[0, 1, 3], 3), None);
    }
}
