use nalgebra::{Point2, Vector2};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Nonlinear plane transforms used to reshape fractal point clouds.
///
/// Each variation is a pure map on the plane, written in terms of
/// `r = sqrt(x^2 + y^2)` and `theta = atan2(y, x)`. `Spherical` has a pole
/// at the origin; evaluating it there yields non-finite coordinates, the
/// same surface-as-NaN policy the ODE models follow near their
/// singularities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Variation {
    Linear,
    Sinusoidal,
    Spherical,
    Swirl,
    Polar,
    Handkerchief,
    Heart,
    Disc,
    Diamond,
    Exponential,
}

impl Variation {
    pub fn apply(&self, p: Point2<f64>) -> Point2<f64> {
        let (x, y) = (p.x, p.y);
        let r2 = x * x + y * y;
        let r = r2.sqrt();
        let theta = y.atan2(x);
        match self {
            Variation::Linear => p,
            Variation::Sinusoidal => Point2::new(x.sin(), y.sin()),
            Variation::Spherical => Point2::new(x / r2, y / r2),
            Variation::Swirl => Point2::new(
                x * r2.sin() - y * r2.cos(),
                x * r2.cos() + y * r2.sin(),
            ),
            Variation::Polar => Point2::new(theta / PI, r - 1.0),
            Variation::Handkerchief => {
                Point2::new(r * (theta + r).sin(), r * (theta - r).cos())
            }
            Variation::Heart => {
                Point2::new(r * (theta * r).sin(), -(r * (theta * r).cos()))
            }
            Variation::Disc => Point2::new(
                theta / PI * (PI * r).sin(),
                theta / PI * (PI * r).cos(),
            ),
            Variation::Diamond => Point2::new(theta.sin() * r.cos(), theta.cos() * r.sin()),
            Variation::Exponential => {
                let e = (x - 1.0).exp();
                Point2::new(e * (PI * y).cos(), e * (PI * y).sin())
            }
        }
    }

    /// Applies the variation to a whole point cloud.
    pub fn map(&self, points: &[Point2<f64>]) -> Vec<Point2<f64>> {
        points.iter().map(|&p| self.apply(p)).collect()
    }
}

/// Weighted linear combination of variation images.
///
/// The two-term case `[(w, Linear), (1 - w, target)]` reproduces the gradual
/// morph from the untransformed cloud toward a target variation.
pub fn blend(components: &[(f64, Variation)], p: Point2<f64>) -> Point2<f64> {
    let mut acc = Vector2::zeros();
    for (weight, variation) in components {
        acc += variation.apply(p).coords * *weight;
    }
    Point2::from(acc)
}

/// Rescales a point cloud by its largest coordinate magnitude so it fits the
/// unit square. A cloud of all zeros is left untouched.
pub fn rescale(points: &mut [Point2<f64>]) {
    let mut max = 0.0_f64;
    for p in points.iter() {
        max = max.max(p.x.abs()).max(p.y.abs());
    }
    if max > 0.0 {
        for p in points.iter_mut() {
            p.coords /= max;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{blend, rescale, Variation};
    use nalgebra::Point2;
    use std::f64::consts::{FRAC_PI_2, PI};

    fn close(p: Point2<f64>, x: f64, y: f64) -> bool {
        (p.x - x).abs() < 1e-12 && (p.y - y).abs() < 1e-12
    }

    #[test]
    fn linear_is_the_identity() {
        let p = Point2::new(0.3, -1.7);
        assert_eq!(Variation::Linear.apply(p), p);
    }

    #[test]
    fn sinusoidal_folds_into_the_unit_square() {
        assert!(close(
            Variation::Sinusoidal.apply(Point2::new(FRAC_PI_2, 0.0)),
            1.0,
            0.0
        ));
        for p in Variation::Sinusoidal.map(&[
            Point2::new(5.0, -3.0),
            Point2::new(-20.0, 40.0),
        ]) {
            assert!(p.x.abs() <= 1.0 && p.y.abs() <= 1.0);
        }
    }

    #[test]
    fn spherical_fixes_the_unit_circle() {
        let p = Point2::new(0.6, 0.8);
        assert!(close(Variation::Spherical.apply(p), 0.6, 0.8));
    }

    #[test]
    fn spherical_pole_surfaces_as_non_finite() {
        let q = Variation::Spherical.apply(Point2::origin());
        assert!(!q.x.is_finite());
    }

    #[test]
    fn swirl_fixes_the_origin() {
        assert_eq!(Variation::Swirl.apply(Point2::origin()), Point2::origin());
    }

    #[test]
    fn polar_maps_the_unit_circle_onto_the_axis() {
        assert!(close(Variation::Polar.apply(Point2::new(1.0, 0.0)), 0.0, 0.0));
        assert!(close(Variation::Polar.apply(Point2::new(0.0, 1.0)), 0.5, 0.0));
    }

    #[test]
    fn handkerchief_and_diamond_match_hand_values() {
        // At (1, 0): r = 1, theta = 0.
        assert!(close(
            Variation::Handkerchief.apply(Point2::new(1.0, 0.0)),
            1.0_f64.sin(),
            1.0_f64.cos()
        ));
        assert!(close(
            Variation::Diamond.apply(Point2::new(1.0, 0.0)),
            0.0,
            1.0_f64.sin()
        ));
    }

    #[test]
    fn heart_points_up_at_the_top_of_the_circle() {
        // At (0, 1): r = 1, theta = pi/2.
        let q = Variation::Heart.apply(Point2::new(0.0, 1.0));
        assert!((q.x - 1.0).abs() < 1e-12);
        assert!(q.y.abs() < 1e-12);
    }

    #[test]
    fn exponential_wraps_the_horizontal_line() {
        let q = Variation::Exponential.apply(Point2::new(1.0, 1.0));
        assert!((q.x - (PI).cos()).abs() < 1e-12);
        assert!((q.y - (PI).sin()).abs() < 1e-12);
    }

    #[test]
    fn blend_interpolates_between_variations() {
        let p = Point2::new(FRAC_PI_2, 0.0);
        assert_eq!(
            blend(&[(0.25, Variation::Linear), (0.75, Variation::Linear)], p),
            p
        );
        let q = blend(
            &[(0.5, Variation::Linear), (0.5, Variation::Sinusoidal)],
            p,
        );
        assert!((q.x - 0.5 * (FRAC_PI_2 + 1.0)).abs() < 1e-12);
        assert!(q.y.abs() < 1e-12);
    }

    #[test]
    fn rescale_normalizes_by_the_largest_coordinate() {
        let mut points = vec![Point2::new(2.0, -4.0), Point2::new(1.0, 1.0)];
        rescale(&mut points);
        assert_eq!(points[0], Point2::new(0.5, -1.0));
        assert_eq!(points[1], Point2::new(0.25, 0.25));
    }
}
