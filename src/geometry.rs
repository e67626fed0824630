//! Geometric primitives over pose landmarks
//!
//! Pure, side-effect-free helpers shared by all validators: joint angles,
//! distances, segment alignment, and multi-frame pose stability. Borderline
//! inputs (zero-length vectors, floating-point drift past the acos domain)
//! are clamped before the operation so every function returns a defined
//! value instead of NaN.

use crate::types::{Frame, Landmark, KEY_LANDMARKS};

/// Magnitudes below this are treated as degenerate
const EPSILON: f64 = 1e-9;

/// Angle in degrees at `vertex` between the vectors vertex->a and vertex->c.
///
/// Returns a value in 0-180. Degenerate inputs (either vector near zero
/// length) yield 0.
pub fn joint_angle(a: &Landmark, vertex: &Landmark, c: &Landmark) -> f64 {
    let v1 = (a.x - vertex.x, a.y - vertex.y, a.z - vertex.z);
    let v2 = (c.x - vertex.x, c.y - vertex.y, c.z - vertex.z);

    let dot = v1.0 * v2.0 + v1.1 * v2.1 + v1.2 * v2.2;
    let mag1 = (v1.0 * v1.0 + v1.1 * v1.1 + v1.2 * v1.2).sqrt();
    let mag2 = (v2.0 * v2.0 + v2.1 * v2.1 + v2.2 * v2.2).sqrt();

    if mag1 < EPSILON || mag2 < EPSILON {
        return 0.0;
    }

    // Clamp before acos: accumulated drift can push the cosine past [-1, 1]
    let cos_angle = (dot / (mag1 * mag2)).clamp(-1.0, 1.0);
    cos_angle.acos().to_degrees()
}

/// Euclidean distance between two landmarks in normalized 3D space
pub fn distance(a: &Landmark, b: &Landmark) -> f64 {
    let dx = a.x - b.x;
    let dy = a.y - b.y;
    let dz = a.z - b.z;
    (dx * dx + dy * dy + dz * dz).sqrt()
}

/// Perpendicular distance from `point` to the segment `seg_start`..`seg_end`.
///
/// The projection scalar is clamped to [0, 1], so the distance is measured
/// to the nearest point on the segment rather than the infinite line. A
/// zero-length segment degrades to point-to-point distance.
pub fn point_to_line_distance(point: &Landmark, seg_start: &Landmark, seg_end: &Landmark) -> f64 {
    let seg = (
        seg_end.x - seg_start.x,
        seg_end.y - seg_start.y,
        seg_end.z - seg_start.z,
    );
    let len_sq = seg.0 * seg.0 + seg.1 * seg.1 + seg.2 * seg.2;

    if len_sq < EPSILON {
        return distance(point, seg_start);
    }

    let to_point = (
        point.x - seg_start.x,
        point.y - seg_start.y,
        point.z - seg_start.z,
    );
    let t = ((to_point.0 * seg.0 + to_point.1 * seg.1 + to_point.2 * seg.2) / len_sq)
        .clamp(0.0, 1.0);

    let nearest = Landmark::new(
        seg_start.x + t * seg.0,
        seg_start.y + t * seg.1,
        seg_start.z + t * seg.2,
    );
    distance(point, &nearest)
}

/// True iff every interior point lies within `threshold` of the line through
/// the first and last point. Fewer than three points are trivially aligned.
pub fn are_aligned(points: &[&Landmark], threshold: f64) -> bool {
    if points.len() < 3 {
        return true;
    }
    let first = points[0];
    let last = points[points.len() - 1];
    points[1..points.len() - 1]
        .iter()
        .all(|p| point_to_line_distance(p, first, last) <= threshold)
}

/// Graded colinearity: 1.0 for a perfect line, falling off linearly as the
/// worst interior deviation approaches `tolerance`.
pub fn alignment_score(points: &[&Landmark], tolerance: f64) -> f64 {
    if points.len() < 3 || tolerance <= 0.0 {
        return 1.0;
    }
    let first = points[0];
    let last = points[points.len() - 1];
    let max_deviation = points[1..points.len() - 1]
        .iter()
        .map(|p| point_to_line_distance(p, first, last))
        .fold(0.0_f64, f64::max);

    (1.0 - max_deviation / tolerance).clamp(0.0, 1.0)
}

/// Stability of the key-landmark subset across recent frames.
///
/// Mean per-frame displacement is mapped to a 0-1 score; 0.1 of normalized
/// displacement per frame (or more) scores 0. Fewer than two usable frames
/// score 0.
pub fn pose_stability(history: &[Frame]) -> f64 {
    if history.len() < 2 {
        return 0.0;
    }

    let mut total_displacement = 0.0;
    let mut samples = 0u32;

    for pair in history.windows(2) {
        for &index in KEY_LANDMARKS.iter() {
            if let (Some(prev), Some(curr)) = (pair[0].landmark(index), pair[1].landmark(index)) {
                total_displacement += distance(prev, curr);
                samples += 1;
            }
        }
    }

    if samples == 0 {
        return 0.0;
    }

    let mean_displacement = total_displacement / f64::from(samples);
    (1.0 - mean_displacement * 10.0).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lm(x: f64, y: f64) -> Landmark {
        Landmark::new(x, y, 0.0)
    }

    fn make_frame(timestamp: u64, offset: f64) -> Frame {
        let mut landmarks = vec![Landmark::new(0.0, 0.0, 0.0); 33];
        for &index in KEY_LANDMARKS.iter() {
            landmarks[index] = lm(0.5 + offset, 0.5);
        }
        Frame {
            landmarks,
            confidence: 0.9,
            timestamp,
        }
    }

    #[test]
    fn test_right_angle() {
        let angle = joint_angle(&lm(0.0, 1.0), &lm(0.0, 0.0), &lm(1.0, 0.0));
        assert!((angle - 90.0).abs() < 1e-6);
    }

    #[test]
    fn test_straight_angle() {
        let angle = joint_angle(&lm(0.0, 0.5), &lm(0.5, 0.5), &lm(1.0, 0.5));
        assert!((angle - 180.0).abs() < 1e-6);
    }

    #[test]
    fn test_degenerate_angle_is_zero() {
        let vertex = lm(0.5, 0.5);
        assert_eq!(joint_angle(&vertex, &vertex, &lm(1.0, 0.5)), 0.0);
    }

    #[test]
    fn test_distance() {
        let d = distance(&lm(0.0, 0.0), &lm(3.0, 4.0));
        assert!((d - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_point_to_line_perpendicular() {
        let d = point_to_line_distance(&lm(0.5, 1.0), &lm(0.0, 0.0), &lm(1.0, 0.0));
        assert!((d - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_point_to_line_clamps_to_segment() {
        // Point beyond the segment end: distance goes to the endpoint, not
        // the infinite line
        let d = point_to_line_distance(&lm(2.0, 0.0), &lm(0.0, 0.0), &lm(1.0, 0.0));
        assert!((d - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_point_to_line_zero_length_segment() {
        let d = point_to_line_distance(&lm(1.0, 0.0), &lm(0.0, 0.0), &lm(0.0, 0.0));
        assert!((d - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_collinear_points_always_aligned() {
        let a = lm(0.1, 0.1);
        let b = lm(0.5, 0.5);
        let c = lm(0.9, 0.9);
        assert!(are_aligned(&[&a, &b, &c], 1e-12));
        assert!(are_aligned(&[&a, &b, &c], 0.5));
    }

    #[test]
    fn test_misaligned_points() {
        let a = lm(0.0, 0.0);
        let b = lm(0.5, 0.3);
        let c = lm(1.0, 0.0);
        assert!(!are_aligned(&[&a, &b, &c], 0.1));
        assert!(are_aligned(&[&a, &b, &c], 0.4));
    }

    #[test]
    fn test_alignment_score_falloff() {
        let a = lm(0.0, 0.0);
        let c = lm(1.0, 0.0);

        let on_line = lm(0.5, 0.0);
        assert!((alignment_score(&[&a, &on_line, &c], 0.1) - 1.0).abs() < 1e-9);

        let halfway_off = lm(0.5, 0.05);
        assert!((alignment_score(&[&a, &halfway_off, &c], 0.1) - 0.5).abs() < 1e-9);

        let far_off = lm(0.5, 0.2);
        assert_eq!(alignment_score(&[&a, &far_off, &c], 0.1), 0.0);
    }

    #[test]
    fn test_stability_perfectly_still() {
        let history = vec![make_frame(0, 0.0), make_frame(33, 0.0), make_frame(66, 0.0)];
        assert!((pose_stability(&history) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_stability_penalizes_motion() {
        // 0.05 displacement per frame maps to a score of 0.5
        let history = vec![make_frame(0, 0.0), make_frame(33, 0.05)];
        assert!((pose_stability(&history) - 0.5).abs() < 1e-9);

        // Large motion saturates at 0
        let history = vec![make_frame(0, 0.0), make_frame(33, 0.5)];
        assert_eq!(pose_stability(&history), 0.0);
    }

    #[test]
    fn test_stability_needs_two_frames() {
        assert_eq!(pose_stability(&[]), 0.0);
        assert_eq!(pose_stability(&[make_frame(0, 0.0)]), 0.0);
    }
}
