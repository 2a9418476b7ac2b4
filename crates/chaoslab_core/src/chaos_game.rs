use nalgebra::{Point2, Vector2};
use rand::Rng;

use crate::error::{Error, Result};

/// Iterations discarded before sampling starts, so the reported points have
/// already contracted onto the attractor.
const BURN_IN: usize = 5;

/// Chaos game on a regular n-gon inscribed in the unit circle.
///
/// Every iteration moves the current point a fixed fraction of the way
/// toward a uniformly chosen corner: `X <- r*X + (1 - r)*C`. The generator
/// is stateless between calls; randomness comes from the caller-owned source
/// (see [`crate::rng::seeded`]), which makes runs reproducible.
#[derive(Debug, Clone)]
pub struct ChaosGame {
    ratio: f64,
    corners: Vec<Point2<f64>>,
}

impl ChaosGame {
    /// `ratio` is the contraction factor in `(0, 1)`; `corners >= 3` picks
    /// the polygon. Corner k sits at `(sin(2*pi*k/n), cos(2*pi*k/n))`, so
    /// corner 0 is at the top and the polygon winds clockwise.
    pub fn new(ratio: f64, corners: usize) -> Result<Self> {
        if !(ratio > 0.0 && ratio < 1.0) {
            return Err(Error::InvalidArgument(format!(
                "contraction ratio must lie in (0, 1), got {ratio}"
            )));
        }
        if corners < 3 {
            return Err(Error::InvalidArgument(format!(
                "a chaos game needs at least 3 corners, got {corners}"
            )));
        }
        let angle = 2.0 * std::f64::consts::PI / corners as f64;
        let corners = (0..corners)
            .map(|k| {
                let a = angle * k as f64;
                Point2::new(a.sin(), a.cos())
            })
            .collect();
        Ok(Self { ratio, corners })
    }

    pub fn ratio(&self) -> f64 {
        self.ratio
    }

    pub fn corners(&self) -> &[Point2<f64>] {
        &self.corners
    }

    /// Random convex combination of the corners (flat Dirichlet weights via
    /// normalized exponential draws), guaranteed to start inside the hull.
    fn starting_point<R: Rng>(&self, rng: &mut R) -> Point2<f64> {
        let weights: Vec<f64> = (0..self.corners.len())
            .map(|_| -(1.0 - rng.gen::<f64>()).ln())
            .collect();
        let total: f64 = weights.iter().sum();
        let mut p = Vector2::zeros();
        for (w, corner) in weights.iter().zip(&self.corners) {
            p += corner.coords * (w / total);
        }
        Point2::from(p)
    }

    fn contract(&self, p: Point2<f64>, corner: usize) -> Point2<f64> {
        Point2::from(p.coords * self.ratio + self.corners[corner].coords * (1.0 - self.ratio))
    }

    /// Plays the game for `steps` iterations after burn-in and returns the
    /// visited points.
    pub fn iterate<R: Rng>(&self, steps: usize, rng: &mut R) -> Vec<Point2<f64>> {
        let mut p = self.starting_point(rng);
        for _ in 0..BURN_IN {
            p = self.contract(p, rng.gen_range(0..self.corners.len()));
        }
        let mut points = Vec::with_capacity(steps);
        for _ in 0..steps {
            p = self.contract(p, rng.gen_range(0..self.corners.len()));
            points.push(p);
        }
        points
    }

    /// Like [`ChaosGame::iterate`], additionally returning a color weight per
    /// point: the running average of the chosen corner indices, which paints
    /// each sub-polygon of the attractor a distinct shade.
    pub fn iterate_colored<R: Rng>(
        &self,
        steps: usize,
        rng: &mut R,
    ) -> (Vec<Point2<f64>>, Vec<f64>) {
        let mut p = self.starting_point(rng);
        for _ in 0..BURN_IN {
            p = self.contract(p, rng.gen_range(0..self.corners.len()));
        }
        let mut points = Vec::with_capacity(steps);
        let mut colors = Vec::with_capacity(steps);
        let mut color = 0.0;
        for _ in 0..steps {
            let corner = rng.gen_range(0..self.corners.len());
            p = self.contract(p, corner);
            color = (color + corner as f64) / 2.0;
            points.push(p);
            colors.push(color);
        }
        (points, colors)
    }
}
