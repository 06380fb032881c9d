//! Binary classification over reading vectors.
//!
//! The forecaster only needs a linear decision boundary, so the seam is a
//! small trait and the default implementation is L2-regularised logistic
//! regression fitted with damped Newton steps.

use nalgebra::{Matrix4, Vector4};
use statrs::function::logistic::logistic;

/// Number of features per sample (one per channel).
pub const FEATURES: usize = 3;

/// A feature vector: the three channel readings of one observation.
pub type FeatureVector = [f64; FEATURES];

/// Weights followed by the intercept.
type Params = Vector4<f64>;

/// Errors that can occur while fitting a classifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FitError {
    /// No training samples were given
    Empty,
    /// Feature and label counts differ
    LengthMismatch { features: usize, labels: usize },
    /// Every label has the same value
    SingleClass,
    /// The Newton system could not be solved
    Singular,
}

impl std::fmt::Display for FitError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FitError::Empty => write!(f, "no training samples"),
            FitError::LengthMismatch { features, labels } => {
                write!(f, "{features} feature vectors but {labels} labels")
            }
            FitError::SingleClass => write!(f, "training labels contain a single class"),
            FitError::Singular => write!(f, "singular system while fitting"),
        }
    }
}

impl std::error::Error for FitError {}

/// A classifier with a linear decision boundary over reading vectors.
pub trait BinaryClassifier {
    /// Fit from scratch, discarding any previous fit.
    fn fit(&mut self, features: &[FeatureVector], labels: &[bool]) -> Result<(), FitError>;

    /// Predict the class of one sample. `None` until fitted.
    fn predict(&self, features: &FeatureVector) -> Option<bool>;
}

/// L2-regularised logistic regression with an unpenalised intercept.
#[derive(Debug, Clone)]
pub struct LogisticRegression {
    /// Inverse regularisation strength
    c: f64,
    max_iter: usize,
    tolerance: f64,
    coefficients: Option<(FeatureVector, f64)>,
}

impl Default for LogisticRegression {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl LogisticRegression {
    /// Create an unfitted model with inverse regularisation strength `c`.
    pub fn new(c: f64) -> Self {
        Self {
            c,
            max_iter: 100,
            tolerance: 1e-8,
            coefficients: None,
        }
    }

    /// Fitted weights and intercept.
    pub fn coefficients(&self) -> Option<(FeatureVector, f64)> {
        self.coefficients
    }

    /// Probability of the positive class.
    pub fn predict_proba(&self, features: &FeatureVector) -> Option<f64> {
        self.decision(features).map(logistic)
    }

    fn decision(&self, features: &FeatureVector) -> Option<f64> {
        let (w, b) = self.coefficients?;
        Some(dot(&w, features) + b)
    }

    /// Penalised negative log-likelihood.
    fn objective(&self, theta: &Params, x: &[FeatureVector], y: &[bool]) -> f64 {
        let penalty = 0.5 * theta.fixed_rows::<FEATURES>(0).norm_squared();
        let loss: f64 = x
            .iter()
            .zip(y)
            .map(|(xi, &yi)| {
                let z = theta.dot(&augment(xi));
                softplus(z) - if yi { z } else { 0.0 }
            })
            .sum();
        penalty + self.c * loss
    }
}

impl BinaryClassifier for LogisticRegression {
    fn fit(&mut self, features: &[FeatureVector], labels: &[bool]) -> Result<(), FitError> {
        self.coefficients = None;

        if features.len() != labels.len() {
            return Err(FitError::LengthMismatch {
                features: features.len(),
                labels: labels.len(),
            });
        }
        if features.is_empty() {
            return Err(FitError::Empty);
        }
        if labels.iter().all(|&l| l == labels[0]) {
            return Err(FitError::SingleClass);
        }

        let mut theta = Params::zeros();

        for iteration in 0..self.max_iter {
            let mut grad = Params::new(theta[0], theta[1], theta[2], 0.0);
            // Tiny intercept term keeps the system definite when predictions saturate
            let mut hess = Matrix4::from_diagonal(&Vector4::new(1.0, 1.0, 1.0, 1e-12));

            for (xi, &yi) in features.iter().zip(labels) {
                let aug = augment(xi);
                let p = logistic(theta.dot(&aug));
                let residual = self.c * (p - if yi { 1.0 } else { 0.0 });
                let weight = self.c * p * (1.0 - p);
                grad += aug * residual;
                hess += (aug * aug.transpose()) * weight;
            }

            if grad.amax() < self.tolerance {
                tracing::trace!(iteration, "logistic regression converged");
                break;
            }

            let step = newton_step(hess, &grad).ok_or(FitError::Singular)?;

            // Backtracking line search on the objective
            let current = self.objective(&theta, features, labels);
            let slope = grad.dot(&step);
            let mut t = 1.0;
            let mut next = theta;
            for _ in 0..30 {
                next = theta - step * t;
                if self.objective(&next, features, labels) <= current - 1e-4 * t * slope {
                    break;
                }
                t *= 0.5;
            }
            theta = next;
        }

        self.coefficients = Some(split(&theta));
        Ok(())
    }

    fn predict(&self, features: &FeatureVector) -> Option<bool> {
        self.decision(features).map(|z| z > 0.0)
    }
}

fn dot(a: &FeatureVector, b: &FeatureVector) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

fn split(theta: &Params) -> (FeatureVector, f64) {
    ([theta[0], theta[1], theta[2]], theta[FEATURES])
}

fn augment(x: &FeatureVector) -> Params {
    Params::new(x[0], x[1], x[2], 1.0)
}

/// `ln(1 + e^z)` without overflow.
fn softplus(z: f64) -> f64 {
    if z > 0.0 {
        z + (-z).exp().ln_1p()
    } else {
        z.exp().ln_1p()
    }
}

/// Solve `hess * step = grad`. The penalised Hessian is symmetric positive
/// definite, so Cholesky normally succeeds; LU covers the near-singular case.
fn newton_step(hess: Matrix4<f64>, grad: &Params) -> Option<Params> {
    let step = match hess.cholesky() {
        Some(chol) => chol.solve(grad),
        None => hess.lu().solve(grad)?,
    };
    step.iter().all(|v| v.is_finite()).then_some(step)
}
