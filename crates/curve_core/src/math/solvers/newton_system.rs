//! Multivariate Newton solver for square nonlinear systems.
//!
//! Solves `r(x) = 0` for `r: ℝⁿ → ℝⁿ` given an analytic Jacobian, using a
//! dense LU solve per step and optional step halving.
//!
//! The iteration is an explicit state machine ([`NewtonState`]) so callers
//! can drive it step by step (for logging or diagnostics) through
//! [`NewtonIteration`], or run it to completion with
//! [`NewtonSystemSolver::solve`].
//!
//! Numerical failure is not an error: it is reported as
//! [`ConvergenceResult::Failed`]. Errors raised by the system itself while
//! evaluating residuals or the Jacobian are propagated unchanged.

use nalgebra::{DMatrix, DVector};

use super::NewtonSystemConfig;
use crate::math::linalg::lu_solve;
use crate::types::SolverError;

/// A square nonlinear system with an analytic Jacobian.
pub trait NonlinearSystem {
    /// Error raised while evaluating the system.
    type Error;

    /// Number of unknowns, which equals the number of residuals.
    fn dimension(&self) -> usize;

    /// Residual vector at `x`.
    fn residuals(&self, x: &[f64]) -> Result<Vec<f64>, Self::Error>;

    /// Jacobian `∂r_i/∂x_j` at `x`, one row per residual.
    fn jacobian(&self, x: &[f64]) -> Result<DMatrix<f64>, Self::Error>;
}

/// Lifecycle of a Newton iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NewtonState {
    /// Holds the starting guess; nothing evaluated yet.
    Initialized,
    /// Evaluating at the parameters produced by `iteration` steps.
    Iterating {
        /// Number of Newton steps taken so far
        iteration: usize,
    },
    /// Terminated successfully.
    Converged,
    /// Terminated without a solution.
    Failed,
}

impl NewtonState {
    /// Returns `true` for `Converged` and `Failed`.
    pub fn is_terminal(&self) -> bool {
        matches!(self, NewtonState::Converged | NewtonState::Failed)
    }
}

/// Why a Newton iteration failed.
#[derive(Debug, Clone, PartialEq)]
pub enum FailureReason {
    /// The iteration cap was reached.
    MaxIterationsExceeded,
    /// The Jacobian could not be factorised.
    SingularJacobian {
        /// Smallest over largest absolute LU pivot
        pivot_ratio: f64,
    },
    /// A residual evaluated to NaN or infinity.
    NonFiniteResidual {
        /// Index of the first offending residual
        index: usize,
    },
    /// No point along the damped Newton step could be evaluated.
    InvalidStep,
    /// The system returned vectors or matrices of the wrong size.
    DimensionMismatch {
        /// Expected dimension
        expected: usize,
        /// Actual dimension
        actual: usize,
    },
}

impl FailureReason {
    /// Converts to the equivalent [`SolverError`].
    pub fn to_solver_error(&self, iterations: usize) -> SolverError {
        match self {
            FailureReason::MaxIterationsExceeded => SolverError::MaxIterationsExceeded { iterations },
            FailureReason::SingularJacobian { pivot_ratio } => SolverError::SingularMatrix {
                pivot_ratio: *pivot_ratio,
            },
            FailureReason::NonFiniteResidual { index } => {
                SolverError::NumericalInstability(format!("non-finite residual at index {}", index))
            }
            FailureReason::InvalidStep => {
                SolverError::NumericalInstability("no evaluable point along the Newton step".to_string())
            }
            FailureReason::DimensionMismatch { expected, actual } => {
                SolverError::DimensionMismatch {
                    expected: *expected,
                    actual: *actual,
                }
            }
        }
    }
}

/// A converged solution.
#[derive(Debug, Clone, PartialEq)]
pub struct NewtonSolution {
    /// Solution vector.
    pub parameters: Vec<f64>,
    /// Residuals at the solution.
    pub residuals: Vec<f64>,
    /// Jacobian evaluated at the solution.
    pub jacobian: DMatrix<f64>,
    /// Number of Newton steps taken.
    pub iterations: usize,
}

impl NewtonSolution {
    /// Largest absolute residual at the solution.
    pub fn max_residual(&self) -> f64 {
        max_abs(&self.residuals)
    }
}

/// A failed iteration with the last parameters reached.
#[derive(Debug, Clone, PartialEq)]
pub struct NewtonFailure {
    /// Failure cause.
    pub reason: FailureReason,
    /// Number of Newton steps taken before failing.
    pub iterations: usize,
    /// Parameters at the point of failure.
    pub parameters: Vec<f64>,
    /// Largest absolute residual at the point of failure (NaN if unknown).
    pub max_residual: f64,
}

/// Outcome of a Newton solve.
#[derive(Debug, Clone, PartialEq)]
pub enum ConvergenceResult {
    /// The residuals were driven within tolerance.
    Converged(NewtonSolution),
    /// The iteration stopped without a solution.
    Failed(NewtonFailure),
}

impl ConvergenceResult {
    /// Returns `true` if converged.
    pub fn is_converged(&self) -> bool {
        matches!(self, ConvergenceResult::Converged(_))
    }

    /// Converts into a `Result`, mapping failure to [`SolverError`].
    pub fn into_result(self) -> Result<NewtonSolution, SolverError> {
        match self {
            ConvergenceResult::Converged(solution) => Ok(solution),
            ConvergenceResult::Failed(failure) => {
                Err(failure.reason.to_solver_error(failure.iterations))
            }
        }
    }
}

/// Step-by-step Newton iteration over a borrowed system.
///
/// # Example
///
/// ```
/// use curve_core::math::solvers::{NewtonIteration, NewtonState, NewtonSystemConfig, NonlinearSystem};
/// use nalgebra::DMatrix;
///
/// // x² = 4, y = x + 1
/// struct Quadratic;
/// impl NonlinearSystem for Quadratic {
///     type Error = ();
///     fn dimension(&self) -> usize { 2 }
///     fn residuals(&self, x: &[f64]) -> Result<Vec<f64>, ()> {
///         Ok(vec![x[0] * x[0] - 4.0, x[1] - x[0] - 1.0])
///     }
///     fn jacobian(&self, x: &[f64]) -> Result<DMatrix<f64>, ()> {
///         Ok(DMatrix::from_row_slice(2, 2, &[2.0 * x[0], 0.0, -1.0, 1.0]))
///     }
/// }
///
/// let mut iteration = NewtonIteration::new(&Quadratic, vec![1.0, 0.0], NewtonSystemConfig::default());
/// while !iteration.state().is_terminal() {
///     iteration.step().unwrap();
/// }
/// assert_eq!(iteration.state(), NewtonState::Converged);
/// let solution = iteration.into_outcome().unwrap().into_result().unwrap();
/// assert!((solution.parameters[0] - 2.0).abs() < 1e-9);
/// assert!((solution.parameters[1] - 3.0).abs() < 1e-9);
/// ```
pub struct NewtonIteration<'a, S: NonlinearSystem> {
    system: &'a S,
    config: NewtonSystemConfig,
    state: NewtonState,
    parameters: Vec<f64>,
    last_relative_step: Option<f64>,
    last_max_residual: f64,
    outcome: Option<ConvergenceResult>,
}

impl<'a, S: NonlinearSystem> NewtonIteration<'a, S> {
    /// Creates an iteration holding the starting guess.
    pub fn new(system: &'a S, initial: Vec<f64>, config: NewtonSystemConfig) -> Self {
        Self {
            system,
            config,
            state: NewtonState::Initialized,
            parameters: initial,
            last_relative_step: None,
            last_max_residual: f64::NAN,
            outcome: None,
        }
    }

    /// Current state.
    #[inline]
    pub fn state(&self) -> NewtonState {
        self.state
    }

    /// Current parameter vector.
    pub fn parameters(&self) -> &[f64] {
        &self.parameters
    }

    /// Largest absolute residual seen at the most recent evaluation.
    pub fn last_max_residual(&self) -> f64 {
        self.last_max_residual
    }

    /// Relative size of the most recent step, if a step was taken.
    pub fn last_relative_step(&self) -> Option<f64> {
        self.last_relative_step
    }

    /// Terminal outcome, available once the state is terminal.
    pub fn into_outcome(self) -> Option<ConvergenceResult> {
        self.outcome
    }

    /// Advances the state machine by one transition.
    ///
    /// `Initialized` validates the guess and moves to `Iterating` (or
    /// straight to `Converged` for an empty system). Each `Iterating`
    /// transition evaluates residuals and Jacobian, tests convergence and
    /// otherwise takes one Newton step. Terminal states are left unchanged.
    ///
    /// # Errors
    ///
    /// Propagates errors raised by the system's evaluation.
    pub fn step(&mut self) -> Result<NewtonState, S::Error> {
        match self.state {
            NewtonState::Initialized => self.start(),
            NewtonState::Iterating { iteration } => self.advance(iteration)?,
            NewtonState::Converged | NewtonState::Failed => {}
        }
        Ok(self.state)
    }

    fn start(&mut self) {
        let n = self.system.dimension();
        if self.parameters.len() != n {
            self.fail(
                FailureReason::DimensionMismatch {
                    expected: n,
                    actual: self.parameters.len(),
                },
                0,
            );
        } else if n == 0 {
            self.last_max_residual = 0.0;
            self.converge(Vec::new(), DMatrix::zeros(0, 0), 0);
        } else {
            self.state = NewtonState::Iterating { iteration: 0 };
        }
    }

    fn advance(&mut self, iteration: usize) -> Result<(), S::Error> {
        let n = self.parameters.len();
        let residuals = self.system.residuals(&self.parameters)?;
        if residuals.len() != n {
            self.fail(
                FailureReason::DimensionMismatch {
                    expected: n,
                    actual: residuals.len(),
                },
                iteration,
            );
            return Ok(());
        }
        if let Some(index) = residuals.iter().position(|r| !r.is_finite()) {
            self.fail(FailureReason::NonFiniteResidual { index }, iteration);
            return Ok(());
        }

        let jacobian = self.system.jacobian(&self.parameters)?;
        if jacobian.nrows() != n || jacobian.ncols() != n {
            self.fail(
                FailureReason::DimensionMismatch {
                    expected: n,
                    actual: if jacobian.nrows() != n {
                        jacobian.nrows()
                    } else {
                        jacobian.ncols()
                    },
                },
                iteration,
            );
            return Ok(());
        }

        let max_residual = max_abs(&residuals);
        self.last_max_residual = max_residual;
        let small_step = self
            .last_relative_step
            .is_some_and(|step| step < self.config.relative_tolerance);
        if max_residual < self.config.absolute_tolerance || small_step {
            self.converge(residuals, jacobian, iteration);
            return Ok(());
        }
        if iteration >= self.config.max_iterations {
            self.fail(FailureReason::MaxIterationsExceeded, iteration);
            return Ok(());
        }

        let rhs = -DVector::from_vec(residuals);
        let delta = match lu_solve(&jacobian, &rhs, self.config.min_pivot_ratio) {
            Ok(delta) => delta,
            Err(SolverError::SingularMatrix { pivot_ratio }) => {
                self.fail(FailureReason::SingularJacobian { pivot_ratio }, iteration);
                return Ok(());
            }
            Err(_) => {
                self.fail(
                    FailureReason::DimensionMismatch {
                        expected: n,
                        actual: rhs.len(),
                    },
                    iteration,
                );
                return Ok(());
            }
        };

        let scale = if self.config.damping {
            match self.damping_factor(delta.as_slice(), max_residual) {
                Some(scale) => scale,
                None => {
                    self.fail(FailureReason::InvalidStep, iteration);
                    return Ok(());
                }
            }
        } else {
            1.0
        };

        let mut step_norm_sq = 0.0;
        let mut x_norm_sq = 0.0;
        for (x, d) in self.parameters.iter_mut().zip(delta.iter()) {
            let step = scale * d;
            *x += step;
            step_norm_sq += step * step;
            x_norm_sq += *x * *x;
        }
        let x_norm = x_norm_sq.sqrt();
        let step_norm = step_norm_sq.sqrt();
        self.last_relative_step = Some(if x_norm > 0.0 {
            step_norm / x_norm
        } else {
            step_norm
        });
        self.state = NewtonState::Iterating {
            iteration: iteration + 1,
        };
        Ok(())
    }

    /// Largest step fraction among 1, 1/2, 1/4, ... that reduces `max|r|`.
    ///
    /// When no fraction improves, falls back to the largest fraction whose
    /// residuals evaluate to finite values, leaving the iteration cap to
    /// catch divergence. `None` if no trial point evaluates at all.
    fn damping_factor(&self, delta: &[f64], current: f64) -> Option<f64> {
        let mut scale = 1.0;
        let mut fallback = None;
        let mut trial = vec![0.0; delta.len()];
        for _ in 0..=self.config.max_step_halvings {
            for ((t, x), d) in trial.iter_mut().zip(&self.parameters).zip(delta) {
                *t = x + scale * d;
            }
            if let Ok(r) = self.system.residuals(&trial) {
                if r.iter().all(|v| v.is_finite()) {
                    if max_abs(&r) < current {
                        return Some(scale);
                    }
                    fallback.get_or_insert(scale);
                }
            }
            scale *= 0.5;
        }
        fallback
    }

    fn converge(&mut self, residuals: Vec<f64>, jacobian: DMatrix<f64>, iterations: usize) {
        self.state = NewtonState::Converged;
        self.outcome = Some(ConvergenceResult::Converged(NewtonSolution {
            parameters: self.parameters.clone(),
            residuals,
            jacobian,
            iterations,
        }));
    }

    fn fail(&mut self, reason: FailureReason, iterations: usize) {
        self.state = NewtonState::Failed;
        self.outcome = Some(ConvergenceResult::Failed(NewtonFailure {
            reason,
            iterations,
            parameters: self.parameters.clone(),
            max_residual: self.last_max_residual,
        }));
    }
}

/// Damped Newton solver for square nonlinear systems.
///
/// # Example
///
/// ```
/// use curve_core::math::solvers::{NewtonSystemConfig, NewtonSystemSolver, NonlinearSystem};
/// use nalgebra::DMatrix;
///
/// struct Linear;
/// impl NonlinearSystem for Linear {
///     type Error = ();
///     fn dimension(&self) -> usize { 1 }
///     fn residuals(&self, x: &[f64]) -> Result<Vec<f64>, ()> { Ok(vec![3.0 * x[0] - 6.0]) }
///     fn jacobian(&self, _x: &[f64]) -> Result<DMatrix<f64>, ()> {
///         Ok(DMatrix::from_element(1, 1, 3.0))
///     }
/// }
///
/// let solver = NewtonSystemSolver::new(NewtonSystemConfig::default());
/// let result = solver.solve(&Linear, vec![0.0]).unwrap();
/// assert!(result.is_converged());
/// ```
#[derive(Debug, Clone, Default)]
pub struct NewtonSystemSolver {
    config: NewtonSystemConfig,
}

impl NewtonSystemSolver {
    /// Create a solver with the given configuration.
    pub fn new(config: NewtonSystemConfig) -> Self {
        Self { config }
    }

    /// Returns the solver configuration.
    pub fn config(&self) -> &NewtonSystemConfig {
        &self.config
    }

    /// Runs the iteration from `initial` to a terminal state.
    ///
    /// # Errors
    ///
    /// Propagates errors raised by the system's evaluation. Numerical
    /// failure is returned as `Ok(ConvergenceResult::Failed(..))`.
    pub fn solve<S: NonlinearSystem>(
        &self,
        system: &S,
        initial: Vec<f64>,
    ) -> Result<ConvergenceResult, S::Error> {
        let mut iteration = NewtonIteration::new(system, initial, self.config);
        while !iteration.state().is_terminal() {
            iteration.step()?;
        }
        let max_residual = iteration.last_max_residual();
        Ok(iteration.into_outcome().unwrap_or_else(|| {
            ConvergenceResult::Failed(NewtonFailure {
                reason: FailureReason::MaxIterationsExceeded,
                iterations: 0,
                parameters: Vec::new(),
                max_residual,
            })
        }))
    }
}

fn max_abs(values: &[f64]) -> f64 {
    values.iter().fold(0.0_f64, |acc, v| acc.max(v.abs()))
}
