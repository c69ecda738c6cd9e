//! Regression strategies used by the forecaster
//!
//! [`Regressor`] fits a model to a feature matrix; the returned
//! [`FittedModel`] predicts single rows and reports its coefficient of
//! determination. [`OrdinaryLeastSquares`] is the default strategy.

use crate::error::{Error, Result};

/// Strategy that fits a model to training data
pub trait Regressor: Send + Sync {
    /// Short identifier used in logs
    fn name(&self) -> &'static str;

    /// Fit on `x` (one row per sample, equal widths) against targets `y`
    fn fit(&self, x: &[Vec<f64>], y: &[f64]) -> Result<Box<dyn FittedModel>>;
}

/// A trained model
pub trait FittedModel: Send + Sync {
    fn predict(&self, row: &[f64]) -> f64;

    /// Coefficient of determination (R²) on `x`/`y`; may be negative
    fn score(&self, x: &[Vec<f64>], y: &[f64]) -> f64 {
        r_squared(y, &x.iter().map(|row| self.predict(row)).collect::<Vec<_>>())
    }
}

/// R² of `predicted` against `actual`
///
/// A constant target has no variance to explain: R² is 1.0 when it is
/// reproduced exactly and 0.0 otherwise.
pub fn r_squared(actual: &[f64], predicted: &[f64]) -> f64 {
    if actual.is_empty() || actual.len() != predicted.len() {
        return 0.0;
    }
    let mean = actual.iter().sum::<f64>() / actual.len() as f64;
    let ss_tot: f64 = actual.iter().map(|y| (y - mean).powi(2)).sum();
    let ss_res: f64 = actual
        .iter()
        .zip(predicted)
        .map(|(y, p)| (y - p).powi(2))
        .sum();

    let scale = actual.iter().map(|y| y * y).sum::<f64>().max(1.0);
    if ss_tot <= f64::EPSILON * scale {
        return if ss_res <= 1e-9 * scale { 1.0 } else { 0.0 };
    }
    1.0 - ss_res / ss_tot
}

/// Ordinary least squares with an intercept
#[derive(Debug, Clone, Copy, Default)]
pub struct OrdinaryLeastSquares;

/// Linear model `intercept + Σ coefficients[j] * row[j]`
#[derive(Debug, Clone, PartialEq)]
pub struct LinearModel {
    pub intercept: f64,
    pub coefficients: Vec<f64>,
}

impl FittedModel for LinearModel {
    fn predict(&self, row: &[f64]) -> f64 {
        self.intercept
            + self
                .coefficients
                .iter()
                .zip(row)
                .map(|(b, x)| b * x)
                .sum::<f64>()
    }
}

impl OrdinaryLeastSquares {
    /// Fit and return the concrete linear model
    pub fn fit_linear(&self, x: &[Vec<f64>], y: &[f64]) -> Result<LinearModel> {
        let width = validate_training_data(x, y)?;
        let n = x.len() as f64;

        let x_mean: Vec<f64> = (0..width)
            .map(|j| x.iter().map(|row| row[j]).sum::<f64>() / n)
            .collect();
        let y_mean = y.iter().sum::<f64>() / n;

        // Normal equations on centred data: (XᵀX) β = Xᵀy
        let mut augmented = vec![vec![0.0; width + 1]; width];
        for (row, target) in x.iter().zip(y) {
            let centred: Vec<f64> = row.iter().zip(&x_mean).map(|(v, m)| v - m).collect();
            let dy = target - y_mean;
            for i in 0..width {
                for j in 0..width {
                    augmented[i][j] += centred[i] * centred[j];
                }
                augmented[i][width] += centred[i] * dy;
            }
        }

        let coefficients = solve_least_squares(augmented, width);
        let intercept = y_mean
            - coefficients
                .iter()
                .zip(&x_mean)
                .map(|(b, m)| b * m)
                .sum::<f64>();

        if !intercept.is_finite() || coefficients.iter().any(|b| !b.is_finite()) {
            return Err(Error::Computation(
                "regression produced non-finite coefficients".into(),
            ));
        }

        Ok(LinearModel {
            intercept,
            coefficients,
        })
    }
}

impl Regressor for OrdinaryLeastSquares {
    fn name(&self) -> &'static str {
        "ols"
    }

    fn fit(&self, x: &[Vec<f64>], y: &[f64]) -> Result<Box<dyn FittedModel>> {
        Ok(Box::new(self.fit_linear(x, y)?))
    }
}

fn validate_training_data(x: &[Vec<f64>], y: &[f64]) -> Result<usize> {
    if x.is_empty() {
        return Err(Error::Computation("no training samples".into()));
    }
    if x.len() != y.len() {
        return Err(Error::Computation(format!(
            "{} feature rows but {} targets",
            x.len(),
            y.len()
        )));
    }
    let width = x[0].len();
    if x.iter().any(|row| row.len() != width) {
        return Err(Error::Computation("feature rows differ in width".into()));
    }
    if x.iter().flatten().chain(y).any(|v| !v.is_finite()) {
        return Err(Error::Computation("training data is not finite".into()));
    }
    Ok(width)
}

/// Gauss-Jordan elimination with partial pivoting on `[A | b]`
///
/// Columns without a usable pivot are free variables and get coefficient 0,
/// which still yields a least-squares solution for the symmetric system.
fn solve_least_squares(mut m: Vec<Vec<f64>>, width: usize) -> Vec<f64> {
    let max_diag = (0..width).map(|i| m[i][i].abs()).fold(0.0, f64::max);
    let tolerance = max_diag * 1e-9;

    let mut pivot_row_of = vec![None; width];
    let mut row = 0;
    for col in 0..width {
        if row >= width {
            break;
        }
        let Some(best) = (row..width).max_by(|&a, &b| m[a][col].abs().total_cmp(&m[b][col].abs()))
        else {
            break;
        };
        if m[best][col].abs() <= tolerance {
            continue;
        }
        m.swap(row, best);

        let pivot = m[row][col];
        for v in m[row].iter_mut() {
            *v /= pivot;
        }
        for other in 0..width {
            if other != row {
                let factor = m[other][col];
                if factor != 0.0 {
                    for k in col..=width {
                        let delta = factor * m[row][k];
                        m[other][k] -= delta;
                    }
                }
            }
        }
        pivot_row_of[col] = Some(row);
        row += 1;
    }

    pivot_row_of
        .iter()
        .map(|p| p.map(|r| m[r][width]).unwrap_or(0.0))
        .collect()
}
