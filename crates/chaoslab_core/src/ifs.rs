use nalgebra::{Matrix2, Point2, Vector2};
use rand::Rng;

use crate::error::{Error, Result};

/// Planar affine map `p -> A*p + b`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AffineTransform {
    matrix: Matrix2<f64>,
    translation: Vector2<f64>,
}

impl AffineTransform {
    /// Builds the map from the six classic IFS coefficients:
    /// `A = [[a, b], [c, d]]`, `b = (e, f)`.
    pub fn new(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Self {
        Self {
            matrix: Matrix2::new(a, b, c, d),
            translation: Vector2::new(e, f),
        }
    }

    pub fn apply(&self, p: Point2<f64>) -> Point2<f64> {
        self.matrix * p + self.translation
    }
}

/// Iterated function system: a weighted chaos game over a fixed set of
/// affine contractions.
///
/// Each iteration draws a map with probability proportional to its weight
/// and applies it to the current point. Randomness is caller-owned (see
/// [`crate::rng::seeded`]).
#[derive(Debug, Clone)]
pub struct IteratedFunctionSystem {
    maps: Vec<AffineTransform>,
    /// Cumulative selection probabilities; the last entry is exactly 1.
    cumulative: Vec<f64>,
}

impl IteratedFunctionSystem {
    /// Weights need not sum to one; they are normalized. Each must be a
    /// positive finite number and there must be one per map.
    pub fn new(maps: Vec<AffineTransform>, weights: &[f64]) -> Result<Self> {
        if maps.is_empty() {
            return Err(Error::InvalidArgument(
                "an IFS needs at least one map".to_string(),
            ));
        }
        if weights.len() != maps.len() {
            return Err(Error::InvalidArgument(format!(
                "{} maps but {} weights",
                maps.len(),
                weights.len()
            )));
        }
        if weights.iter().any(|w| !(w.is_finite() && *w > 0.0)) {
            return Err(Error::InvalidArgument(
                "every map weight must be positive and finite".to_string(),
            ));
        }
        let total: f64 = weights.iter().sum();
        let mut acc = 0.0;
        let mut cumulative: Vec<f64> = weights
            .iter()
            .map(|w| {
                acc += w / total;
                acc
            })
            .collect();
        // Pin the tail so a uniform draw of 0.999... cannot fall off the end.
        *cumulative.last_mut().expect("maps is non-empty") = 1.0;
        Ok(Self { maps, cumulative })
    }

    /// The four-map Barnsley fern with the classic weights
    /// (0.01, 0.85, 0.07, 0.07).
    pub fn barnsley_fern() -> Self {
        Self {
            maps: vec![
                AffineTransform::new(0.0, 0.0, 0.0, 0.16, 0.0, 0.0),
                AffineTransform::new(0.85, 0.04, -0.04, 0.85, 0.0, 1.6),
                AffineTransform::new(0.20, -0.26, 0.23, 0.22, 0.0, 1.6),
                AffineTransform::new(-0.15, 0.28, 0.26, 0.24, 0.0, 0.44),
            ],
            cumulative: vec![0.01, 0.86, 0.93, 1.0],
        }
    }

    pub fn maps(&self) -> &[AffineTransform] {
        &self.maps
    }

    fn choose<R: Rng>(&self, rng: &mut R) -> &AffineTransform {
        let draw = rng.gen::<f64>();
        let idx = self
            .cumulative
            .iter()
            .position(|&c| draw < c)
            .unwrap_or(self.maps.len() - 1);
        &self.maps[idx]
    }

    /// Runs the weighted chaos game from the origin and returns `steps`
    /// points, the seed point included as the first sample.
    pub fn iterate<R: Rng>(&self, steps: usize, rng: &mut R) -> Vec<Point2<f64>> {
        let mut points = Vec::with_capacity(steps);
        let mut p = Point2::origin();
        for _ in 0..steps {
            points.push(p);
            p = self.choose(rng).apply(p);
        }
        points
    }
}
