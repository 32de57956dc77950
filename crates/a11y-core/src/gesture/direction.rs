//! Swipe direction classification and compound-path splitting.

use std::f64::consts::FRAC_1_SQRT_2;
use std::fmt;

use crate::domain::geometry::Point;

const COS_TIE_EPSILON: f64 = 1e-9;

/// The eight compass directions, in screen orientation (`Up` is toward `y = 0`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SwipeDirection {
    Up,
    UpRight,
    Right,
    DownRight,
    Down,
    DownLeft,
    Left,
    UpLeft,
}

impl SwipeDirection {
    pub const ALL: [SwipeDirection; 8] = [
        SwipeDirection::Up,
        SwipeDirection::UpRight,
        SwipeDirection::Right,
        SwipeDirection::DownRight,
        SwipeDirection::Down,
        SwipeDirection::DownLeft,
        SwipeDirection::Left,
        SwipeDirection::UpLeft,
    ];

    pub fn unit_vector(self) -> Point {
        let d = FRAC_1_SQRT_2;
        match self {
            SwipeDirection::Up => Point::new(0.0, -1.0),
            SwipeDirection::UpRight => Point::new(d, -d),
            SwipeDirection::Right => Point::new(1.0, 0.0),
            SwipeDirection::DownRight => Point::new(d, d),
            SwipeDirection::Down => Point::new(0.0, 1.0),
            SwipeDirection::DownLeft => Point::new(-d, d),
            SwipeDirection::Left => Point::new(-1.0, 0.0),
            SwipeDirection::UpLeft => Point::new(-d, -d),
        }
    }

    pub fn is_cardinal(self) -> bool {
        matches!(
            self,
            SwipeDirection::Up | SwipeDirection::Right | SwipeDirection::Down | SwipeDirection::Left
        )
    }

    /// The compass direction with the largest cosine to `v`.
    ///
    /// A vector exactly between a cardinal and a diagonal direction resolves
    /// to the cardinal one, which is the axis with the larger component.
    /// Returns `None` for the zero vector.
    pub fn from_vector(v: Point) -> Option<SwipeDirection> {
        let unit = v.normalized()?;
        let mut best = SwipeDirection::Up;
        let mut best_cos = f64::NEG_INFINITY;
        for dir in SwipeDirection::ALL {
            let cos = unit.dot(dir.unit_vector());
            let wins_tie = (cos - best_cos).abs() <= COS_TIE_EPSILON && dir.is_cardinal();
            if cos > best_cos + COS_TIE_EPSILON || wins_tie {
                best = dir;
                best_cos = cos;
            }
        }
        Some(best)
    }
}

impl fmt::Display for SwipeDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SwipeDirection::Up => "up",
            SwipeDirection::UpRight => "up-right",
            SwipeDirection::Right => "right",
            SwipeDirection::DownRight => "down-right",
            SwipeDirection::Down => "down",
            SwipeDirection::DownLeft => "down-left",
            SwipeDirection::Left => "left",
            SwipeDirection::UpLeft => "up-left",
        })
    }
}

pub(crate) fn path_length(points: &[Point]) -> f64 {
    points.windows(2).map(|w| w[0].distance_to(w[1])).sum()
}

/// `|net displacement| / path length`; 1.0 for a straight path.
pub(crate) fn directionality(points: &[Point]) -> f64 {
    let length = path_length(points);
    if length <= f64::EPSILON {
        return 1.0;
    }
    let net = points[points.len() - 1] - points[0];
    net.length() / length
}

/// Splits `points` into straight legs and appends their directions to `legs`.
///
/// A piece that is straight enough becomes one leg. Otherwise it is cut at its
/// sharpest corner, the interior sample farthest from the chord joining the
/// piece's ends, and both halves are processed the same way. Consecutive legs
/// with the same direction merge. Returns `false` as soon as more than
/// `max_legs` legs would be needed.
pub(crate) fn split_into_legs(
    points: &[Point],
    min_directionality: f64,
    max_legs: usize,
    legs: &mut Vec<SwipeDirection>,
) -> bool {
    if points.len() < 2 {
        return true;
    }
    if directionality(points) >= min_directionality || points.len() < 3 {
        let net = points[points.len() - 1] - points[0];
        if let Some(dir) = SwipeDirection::from_vector(net) {
            if legs.last() != Some(&dir) {
                legs.push(dir);
            }
        }
        return legs.len() <= max_legs;
    }
    let corner = corner_index(points);
    split_into_legs(&points[..=corner], min_directionality, max_legs, legs)
        && split_into_legs(&points[corner..], min_directionality, max_legs, legs)
}

/// Index of the interior point farthest from the first→last chord. When the
/// path closes on itself the farthest point from the start is used instead.
fn corner_index(points: &[Point]) -> usize {
    let first = points[0];
    let last = points[points.len() - 1];
    let chord = last - first;
    let chord_len = chord.length();

    let distance = |p: Point| -> f64 {
        if chord_len <= f64::EPSILON {
            first.distance_to(p)
        } else {
            let rel = p - first;
            (rel.x * chord.y - rel.y * chord.x).abs() / chord_len
        }
    };

    let mut best = 1;
    let mut best_dist = f64::NEG_INFINITY;
    for (i, p) in points.iter().enumerate().take(points.len() - 1).skip(1) {
        let d = distance(*p);
        if d > best_dist {
            best = i;
            best_dist = d;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_vector_picks_nearest_compass_direction() {
        assert_eq!(SwipeDirection::from_vector(Point::new(10.0, 1.0)), Some(SwipeDirection::Right));
        assert_eq!(SwipeDirection::from_vector(Point::new(-5.0, -5.2)), Some(SwipeDirection::UpLeft));
        assert_eq!(SwipeDirection::from_vector(Point::new(0.0, 30.0)), Some(SwipeDirection::Down));
        assert_eq!(SwipeDirection::from_vector(Point::ZERO), None);
    }

    #[test]
    fn test_exact_boundary_prefers_cardinal_axis() {
        // Arrange: exactly 22.5° above the +x axis
        let angle = std::f64::consts::PI / 8.0;
        let v = Point::new(angle.cos(), -angle.sin());

        // Act / Assert
        assert_eq!(SwipeDirection::from_vector(v), Some(SwipeDirection::Right));
    }

    #[test]
    fn test_split_l_shape_into_two_legs() {
        // Arrange
        let points: Vec<Point> = (0..=10)
            .map(|i| Point::new(i as f64 * 10.0, 0.0))
            .chain((1..=10).map(|i| Point::new(100.0, i as f64 * 10.0)))
            .collect();
        let mut legs = Vec::new();

        // Act
        let ok = split_into_legs(&points, 0.9, 2, &mut legs);

        // Assert
        assert!(ok);
        assert_eq!(legs, vec![SwipeDirection::Right, SwipeDirection::Down]);
    }

    #[test]
    fn test_zigzag_exceeds_leg_budget() {
        let points = vec![
            Point::new(0.0, 0.0),
            Point::new(100.0, 0.0),
            Point::new(100.0, 100.0),
            Point::new(0.0, 100.0),
            Point::new(0.0, 200.0),
        ];
        let mut legs = Vec::new();

        assert!(!split_into_legs(&points, 0.9, 2, &mut legs));
    }

    #[test]
    fn test_directionality_of_straight_path_is_one() {
        let points = vec![Point::new(0.0, 0.0), Point::new(5.0, 5.0), Point::new(10.0, 10.0)];
        assert!((directionality(&points) - 1.0).abs() < 1e-9);
    }
}
