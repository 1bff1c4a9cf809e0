//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::Float;

/// Wrap an angle in degrees into the range [-180, 180).
///
/// This gives the shortest signed rotation equivalent to `angle_deg`.
pub fn wrap_deg<T>(angle_deg: T) -> T
where
    T: Float,
{
    let half_turn = T::from(180.0).unwrap();
    let full_turn = T::from(360.0).unwrap();

    rem_euclid(angle_deg + half_turn, full_turn) - half_turn
}

/// Get the signed shortest rotation from `from_deg` to `to_deg` in degrees.
///
/// Positive results are anticlockwise rotations.
pub fn ang_dist_deg<T>(from_deg: T, to_deg: T) -> T
where
    T: Float,
{
    wrap_deg(to_deg - from_deg)
}

/// Calculates the least nonnegative remainder of `lhs (mod rhs)`.
///
/// This function is taken from the std library as num is missing it.
pub fn rem_euclid<T>(lhs: T, rhs: T) -> T
where
    T: Float,
{
    let r = lhs % rhs;
    if r < T::zero() {
        r + rhs.abs()
    } else {
        r
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_wrap_deg() {
        assert_eq!(wrap_deg(0f64), 0f64);
        assert_eq!(wrap_deg(190f64), -170f64);
        assert_eq!(wrap_deg(-190f64), 170f64);
        assert_eq!(wrap_deg(540f64), -180f64);
        assert_eq!(wrap_deg(90f64), 90f64);
    }

    #[test]
    fn test_ang_dist_deg() {
        assert_eq!(ang_dist_deg(350f64, 10f64), 20f64);
        assert_eq!(ang_dist_deg(10f64, 350f64), -20f64);
        assert_eq!(ang_dist_deg(-90f64, 0f64), 90f64);
    }
}
