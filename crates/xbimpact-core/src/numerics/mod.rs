//! Planar geometry helpers shared by the mesh index and the distance classifier.
//!
//! Coordinates are projected metres in the run's working CRS; nothing here is
//! geodesic.

pub type Point2 = [f64; 2];

pub fn squared_distance2(lhs: Point2, rhs: Point2) -> f64 {
    let dx = lhs[0] - rhs[0];
    let dy = lhs[1] - rhs[1];
    dx * dx + dy * dy
}

pub fn distance2(lhs: Point2, rhs: Point2) -> f64 {
    squared_distance2(lhs, rhs).sqrt()
}

/// Distance from `point` to the closed segment `start..end`.
pub fn point_segment_distance(point: Point2, start: Point2, end: Point2) -> f64 {
    let seg = [end[0] - start[0], end[1] - start[1]];
    let length_sq = seg[0] * seg[0] + seg[1] * seg[1];
    if length_sq == 0.0 {
        return distance2(point, start);
    }

    let t = (((point[0] - start[0]) * seg[0] + (point[1] - start[1]) * seg[1]) / length_sq)
        .clamp(0.0, 1.0);
    let projection = [start[0] + t * seg[0], start[1] + t * seg[1]];
    distance2(point, projection)
}

fn orientation(a: Point2, b: Point2, c: Point2) -> f64 {
    (b[0] - a[0]) * (c[1] - a[1]) - (b[1] - a[1]) * (c[0] - a[0])
}

fn within_box(a: Point2, b: Point2, p: Point2) -> bool {
    p[0] >= a[0].min(b[0])
        && p[0] <= a[0].max(b[0])
        && p[1] >= a[1].min(b[1])
        && p[1] <= a[1].max(b[1])
}

pub fn segments_intersect(a0: Point2, a1: Point2, b0: Point2, b1: Point2) -> bool {
    let d1 = orientation(b0, b1, a0);
    let d2 = orientation(b0, b1, a1);
    let d3 = orientation(a0, a1, b0);
    let d4 = orientation(a0, a1, b1);

    if ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
        && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
    {
        return true;
    }

    (d1 == 0.0 && within_box(b0, b1, a0))
        || (d2 == 0.0 && within_box(b0, b1, a1))
        || (d3 == 0.0 && within_box(a0, a1, b0))
        || (d4 == 0.0 && within_box(a0, a1, b1))
}

pub fn segment_segment_distance(a0: Point2, a1: Point2, b0: Point2, b1: Point2) -> f64 {
    if segments_intersect(a0, a1, b0, b1) {
        return 0.0;
    }

    point_segment_distance(a0, b0, b1)
        .min(point_segment_distance(a1, b0, b1))
        .min(point_segment_distance(b0, a0, a1))
        .min(point_segment_distance(b1, a0, a1))
}

pub fn deterministic_argsort(values: &[f64]) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..values.len()).collect();
    indices.sort_unstable_by(|lhs, rhs| {
        values[*lhs]
            .total_cmp(&values[*rhs])
            .then_with(|| lhs.cmp(rhs))
    });
    indices
}

#[cfg(test)]
mod tests {
    use super::{
        deterministic_argsort, distance2, point_segment_distance, segment_segment_distance,
        segments_intersect,
    };

    #[test]
    fn point_segment_distance_projects_onto_interior() {
        let distance = point_segment_distance([5.0, 3.0], [0.0, 0.0], [10.0, 0.0]);
        assert!((distance - 3.0).abs() < 1.0e-12);
    }

    #[test]
    fn point_segment_distance_clamps_to_endpoints() {
        let distance = point_segment_distance([13.0, 4.0], [0.0, 0.0], [10.0, 0.0]);
        assert!((distance - 5.0).abs() < 1.0e-12);

        let degenerate = point_segment_distance([3.0, 4.0], [0.0, 0.0], [0.0, 0.0]);
        assert!((degenerate - 5.0).abs() < 1.0e-12);
    }

    #[test]
    fn crossing_segments_have_zero_distance() {
        assert!(segments_intersect(
            [0.0, 0.0],
            [2.0, 2.0],
            [0.0, 2.0],
            [2.0, 0.0]
        ));
        assert_eq!(
            segment_segment_distance([0.0, 0.0], [2.0, 2.0], [0.0, 2.0], [2.0, 0.0]),
            0.0
        );
    }

    #[test]
    fn parallel_segments_measure_gap() {
        let distance = segment_segment_distance([0.0, 0.0], [4.0, 0.0], [1.0, 2.5], [3.0, 2.5]);
        assert!((distance - 2.5).abs() < 1.0e-12);
        assert!((distance2([0.0, 0.0], [3.0, 4.0]) - 5.0).abs() < 1.0e-12);
    }

    #[test]
    fn argsort_breaks_ties_by_input_position() {
        let order = deterministic_argsort(&[3.0, 1.0, 3.0, -2.0]);
        assert_eq!(order, vec![3, 1, 0, 2]);
    }
}
