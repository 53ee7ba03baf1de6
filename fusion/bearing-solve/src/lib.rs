//! Closest-point-to-N-lines triangulation.
//!
//! Given two or more camera bearings (an origin and a world-space direction
//! each), finds the point minimizing the sum of squared perpendicular
//! distances to all of the bearing lines, following the same
//! cost-function-plus-derivative-free-solver shape this codebase already
//! uses for camera calibration refinement.

use argmin::core::{CostFunction, Error as ArgminError, Executor};
use argmin::solver::neldermead::NelderMead;
use thiserror::Error;
use vecmath::Vec3;

/// One camera's contribution: a ray from `origin` in `direction`.
///
/// `direction` need not be unit length — the perpendicular-distance
/// projection normalizes by `d . d`.
#[derive(Debug, Clone, Copy)]
pub struct CameraResult {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl CameraResult {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self { origin, direction }
    }
}

#[derive(Debug, Error)]
pub enum SolveError {
    #[error("at least 2 valid (non-zero-direction) bearings are required, got {0}")]
    InsufficientLines(usize),

    #[error("optimizer did not converge: {0}")]
    NonConvergence(String),
}

/// Squared perpendicular distance from `point` to the line through `origin`
/// in `direction`.
pub fn squared_distance_to_line(point: [f64; 3], origin: Vec3, direction: Vec3) -> f64 {
    let p = Vec3::from_cartesian(point[0], point[1], point[2]);
    let v = p - origin;
    let dd = direction.dot(&direction);
    let proj_scale = v.dot(&direction) / dd;
    let proj = Vec3::from_cartesian(
        direction.x() * proj_scale,
        direction.y() * proj_scale,
        direction.z() * proj_scale,
    );
    let d = v - proj;
    d.dot(&d)
}

struct TriangulationProblem {
    lines: Vec<CameraResult>,
}

impl CostFunction for TriangulationProblem {
    type Param = Vec<f64>;
    type Output = f64;

    fn cost(&self, param: &Self::Param) -> Result<Self::Output, ArgminError> {
        let point = [param[0], param[1], param[2]];
        let sum: f64 = self
            .lines
            .iter()
            .map(|l| squared_distance_to_line(point, l.origin, l.direction))
            .sum();
        Ok(sum)
    }
}

fn initial_simplex() -> Vec<Vec<f64>> {
    const SPAN: f64 = 5.0;
    vec![
        vec![0.0, 0.0, 0.0],
        vec![SPAN, 0.0, 0.0],
        vec![0.0, SPAN, 0.0],
        vec![0.0, 0.0, SPAN],
    ]
}

/// Solve for the point minimizing the sum of squared perpendicular distances
/// to `lines`. Returns the point plus `accuracy`, the mean over lines of the
/// (unsquared) perpendicular distance.
///
/// Lines with a (near) zero-length direction are dropped before solving, per
/// the numerical requirement that they must never be allowed to produce NaN.
pub fn solve(lines: &[CameraResult]) -> Result<(Vec3, f64), SolveError> {
    let valid: Vec<CameraResult> = lines
        .iter()
        .copied()
        .filter(|l| !l.direction.is_zero_length())
        .collect();

    if valid.len() < 2 {
        return Err(SolveError::InsufficientLines(valid.len()));
    }

    let problem = TriangulationProblem {
        lines: valid.clone(),
    };
    let solver: NelderMead<Vec<f64>, f64> = NelderMead::new(initial_simplex());

    let result = Executor::new(problem, solver)
        .configure(|state| state.max_iters(1000))
        .run()
        .map_err(|e| {
            tracing::warn!(error = %e, "triangulation solver did not converge");
            SolveError::NonConvergence(e.to_string())
        })?;

    let best = result.state.best_param.ok_or_else(|| {
        tracing::warn!("triangulation solver produced no best parameter");
        SolveError::NonConvergence("no best parameter found".to_string())
    })?;

    let point = Vec3::from_cartesian(best[0], best[1], best[2]);

    let accuracy = valid
        .iter()
        .map(|l| squared_distance_to_line([point.x(), point.y(), point.z()], l.origin, l.direction).sqrt())
        .sum::<f64>()
        / valid.len() as f64;

    Ok((point, accuracy))
}
