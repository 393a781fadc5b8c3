//! Nonlinear conjugate gradient — argmin's solver driven through the
//! ascent-to-cost bridge.
//!
//! Purpose
//! -------
//! Maximize a flat objective with argmin's `NonlinearConjugateGradient`
//! (More–Thuente line search, Polak–Ribière or Fletcher–Reeves beta) while
//! keeping this crate's stopping rules and evaluation accounting.
//!
//! Key behaviors
//! -------------
//! - The objective is exposed to argmin as `cost = −fitness` through
//!   [`ArgMinAdapter`]; results are negated back before they leave here.
//! - A private solver wrapper decides termination at the top of every
//!   iteration, in this order: max-abs gradient ≤ `gradient_tolerance`,
//!   value checker on successive costs, cost evaluations ≥ `max_evaluations`.
//! - A failure inside one argmin iteration (for example a search direction
//!   that is not a descent direction for the cost) stops the run with the
//!   last accepted point instead of discarding the progress made so far.
//!
//! Invariants & assumptions
//! ------------------------
//! - Before argmin sees the problem the start is checked: an impossible
//!   fitness fails with `ImpossibleStartingPoint` before any gradient is
//!   evaluated, and a max-abs gradient ≤ 1e-16 fails with `FlatGradient`.
//!   These two evaluations are not counted against the budget.
//! - The budget counts argmin cost evaluations. It is checked between
//!   iterations, so the last line search may finish past it.
//!
//! Conventions
//! -----------
//! - Powell restarts: the direction falls back to steepest ascent when
//!   successive gradients lose orthogonality (`|gₖᵀgₖ₋₁| ≥ 0.1·‖gₖ‖²`).
//! - With the `obs_slog` feature and `verbose = true`, argmin's terminal
//!   slog observer reports every iteration.
use std::str::FromStr;

use argmin::{
    core::{
        Executor, IterState, OptimizationResult, Problem, Solver, State, TerminationReason,
        TerminationStatus, KV,
    },
    solver::{
        conjugategradient::{
            beta::{FletcherReeves, PolakRibiere},
            NonlinearConjugateGradient,
        },
        linesearch::MoreThuenteLineSearch,
    },
};
use log::{debug, info, warn};

use crate::optimization::{
    algorithms::{
        convergence::ValueChecker,
        outcome::{FlatOutcome, Termination},
        GradientOptimizationAlgorithm,
    },
    errors::{OptError, OptResult},
    oracle::{ArgMinAdapter, FlatObjective, IMPOSSIBLE_COST},
    types::{Cost, Fitness, Grad, MoreThuenteLS, NcgMoreThuente, Theta, DEFAULT_MAX_EVALUATIONS},
    validation::{
        verify_max_evaluations, verify_positive, verify_start_fitness, verify_start_gradient,
    },
};

type CgState = IterState<Theta, Grad, (), (), (), Cost>;

const LINE_SEARCH_FTOL: f64 = 1e-4;
const LINE_SEARCH_GTOL: f64 = 0.1;
const RESTART_ORTHOGONALITY: f64 = 0.1;

/// Beta update formula for the search direction.
///
/// Parsing is case-insensitive and ignores `_`, `-` and spaces:
/// `"PolakRibiere"`, `"polak_ribiere"`, `"FLETCHER-REEVES"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UpdateFormula {
    #[default]
    PolakRibiere,
    FletcherReeves,
}

impl FromStr for UpdateFormula {
    type Err = OptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String =
            s.chars().filter(|c| !matches!(c, '_' | '-' | ' ')).collect::<String>().to_lowercase();
        match key.as_str() {
            "polakribiere" => Ok(UpdateFormula::PolakRibiere),
            "fletcherreeves" => Ok(UpdateFormula::FletcherReeves),
            _ => Err(OptError::InvalidUpdateFormula {
                name: s.to_string(),
                reason: "Valid options are case insensitive 'PolakRibiere' or 'FletcherReeves'.",
            }),
        }
    }
}

/// Conjugate-gradient configuration.
///
/// Default: `max_evaluations = 10_000`, `relative_threshold =
/// absolute_threshold = 1e-8`, `gradient_tolerance = 1e-10`, Polak–Ribière,
/// quiet.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConjugateGradientConfig {
    pub max_evaluations: usize,
    pub relative_threshold: f64,
    pub absolute_threshold: f64,
    pub gradient_tolerance: f64,
    pub update_formula: UpdateFormula,
    pub verbose: bool,
}

impl Default for ConjugateGradientConfig {
    fn default() -> Self {
        Self {
            max_evaluations: DEFAULT_MAX_EVALUATIONS,
            relative_threshold: 1e-8,
            absolute_threshold: 1e-8,
            gradient_tolerance: 1e-10,
            update_formula: UpdateFormula::default(),
            verbose: false,
        }
    }
}

/// Validated conjugate-gradient optimizer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConjugateGradient {
    config: ConjugateGradientConfig,
    value_checker: ValueChecker,
}

impl ConjugateGradient {
    /// # Errors
    /// - [`OptError::InvalidMaxEvaluations`] if `max_evaluations == 0`.
    /// - [`OptError::InvalidHyperparameter`] if a threshold or the gradient
    ///   tolerance is not finite and positive.
    pub fn new(config: ConjugateGradientConfig) -> OptResult<Self> {
        verify_max_evaluations(config.max_evaluations)?;
        verify_positive("gradient_tolerance", config.gradient_tolerance)?;
        let value_checker = ValueChecker::new(config.relative_threshold, config.absolute_threshold)?;
        Ok(Self { config, value_checker })
    }

    pub fn config(&self) -> &ConjugateGradientConfig {
        &self.config
    }

    fn run<'a, O, B>(
        &self, problem: ArgMinAdapter<'a, O>, start: Theta, beta: B,
    ) -> OptResult<FlatOutcome>
    where
        O: FlatObjective + ?Sized,
        NcgMoreThuente<B>: Solver<ArgMinAdapter<'a, O>, CgState>,
    {
        let line_search: MoreThuenteLS =
            MoreThuenteLineSearch::new().with_c(LINE_SEARCH_FTOL, LINE_SEARCH_GTOL)?;
        let ncg = NonlinearConjugateGradient::new(line_search, beta)
            .restart_orthogonality(RESTART_ORTHOGONALITY);
        let solver = StoppingRules::new(ncg, &self.config, self.value_checker);

        #[allow(unused_mut)]
        let mut executor = Executor::new(problem, solver).configure(|state| state.param(start));
        #[cfg(feature = "obs_slog")]
        if self.config.verbose {
            let observer = argmin_observer_slog::SlogLogger::term_noblock();
            executor = executor.add_observer(observer, argmin::core::observers::ObserverMode::Always);
        }

        let OptimizationResult { solver, mut state, .. } = executor.run()?;
        let termination = solver.stop.unwrap_or_else(|| match state.get_termination_reason() {
            Some(reason) => Termination::Stopped { reason: reason.text().to_string() },
            None => Termination::Stopped { reason: "not terminated".to_string() },
        });
        let evaluations = cost_count(&state) as usize;
        let iterations = state.get_iter() as usize;
        let best_cost = state.get_best_cost();
        if !(best_cost < IMPOSSIBLE_COST) {
            return Err(OptError::NonFiniteFitness { value: f64::NEG_INFINITY });
        }
        let point = state.take_best_param().ok_or(OptError::MissingThetaHat)?;
        let fitness: Fitness = -best_cost;

        info!("conjugate gradient: {termination} after {iterations} iterations, fitness = {fitness:.6}");
        Ok(FlatOutcome::new(point, fitness, termination, iterations, evaluations)?
            .with_trace(solver.trace))
    }
}

impl Default for ConjugateGradient {
    fn default() -> Self {
        Self { config: ConjugateGradientConfig::default(), value_checker: ValueChecker::default() }
    }
}

impl GradientOptimizationAlgorithm for ConjugateGradient {
    fn name(&self) -> &'static str {
        match self.config.update_formula {
            UpdateFormula::PolakRibiere => "Conjugate gradient (Polak-Ribiere)",
            UpdateFormula::FletcherReeves => "Conjugate gradient (Fletcher-Reeves)",
        }
    }

    fn optimize<O: FlatObjective + ?Sized>(
        &self, objective: &O, start: Theta,
    ) -> OptResult<FlatOutcome> {
        verify_start_fitness(objective.fitness(&start)?)?;
        verify_start_gradient(&objective.gradient(&start)?)?;
        let problem = ArgMinAdapter::new(objective);
        match self.config.update_formula {
            UpdateFormula::PolakRibiere => self.run(problem, start, PolakRibiere::new()),
            UpdateFormula::FletcherReeves => self.run(problem, start, FletcherReeves::new()),
        }
    }
}

// ---- Stopping rules ----

/// Wraps an argmin solver and applies this crate's termination rules.
struct StoppingRules<S> {
    inner: S,
    gradient_tolerance: f64,
    value_checker: ValueChecker,
    max_evaluations: u64,
    stop: Option<Termination>,
    trace: Vec<Fitness>,
}

impl<S> StoppingRules<S> {
    fn new(inner: S, config: &ConjugateGradientConfig, value_checker: ValueChecker) -> Self {
        Self {
            inner,
            gradient_tolerance: config.gradient_tolerance,
            value_checker,
            max_evaluations: config.max_evaluations as u64,
            stop: None,
            trace: Vec::new(),
        }
    }

    fn check(&self, state: &CgState) -> Option<Termination> {
        if let Some(g) = state.get_gradient() {
            let max_abs = g.iter().fold(0.0_f64, |acc, x| acc.max(x.abs()));
            if max_abs <= self.gradient_tolerance {
                return Some(Termination::GradientTolerance);
            }
        }
        let (prev, cur) = (state.get_prev_cost(), state.get_cost());
        if prev.is_finite() && cur.is_finite() && self.value_checker.has_converged(prev, cur) {
            return Some(Termination::ValueTolerance);
        }
        if cost_count(state) >= self.max_evaluations {
            return Some(Termination::EvaluationBudgetExhausted);
        }
        None
    }
}

impl<O, S> Solver<O, CgState> for StoppingRules<S>
where
    S: Solver<O, CgState>,
{
    const NAME: &'static str = "Nonlinear Conjugate Gradient";

    fn init(
        &mut self, problem: &mut Problem<O>, state: CgState,
    ) -> Result<(CgState, Option<KV>), argmin::core::Error> {
        let (state, kv) = self.inner.init(problem, state)?;
        self.trace.push(-state.get_cost());
        Ok((state, kv))
    }

    fn next_iter(
        &mut self, problem: &mut Problem<O>, state: CgState,
    ) -> Result<(CgState, Option<KV>), argmin::core::Error> {
        let fallback = state.clone();
        match self.inner.next_iter(problem, state) {
            Ok((state, kv)) => {
                let fitness = -state.get_cost();
                debug!("conjugate gradient: iteration {}, fitness = {fitness:.6e}", state.get_iter() + 1);
                self.trace.push(fitness);
                Ok((state, kv))
            }
            // Oracle errors propagate; argmin's own failures end the run.
            Err(err) => match err.downcast::<OptError>() {
                Ok(oracle_err) => Err(oracle_err.into()),
                Err(err) => {
                    warn!("conjugate gradient: iteration failed ({err}); keeping last accepted point");
                    self.stop = Some(Termination::Stopped { reason: err.to_string() });
                    Ok((fallback, None))
                }
            },
        }
    }

    fn terminate(&mut self, state: &CgState) -> TerminationStatus {
        if self.stop.is_none() {
            self.stop = self.check(state);
        }
        match &self.stop {
            Some(termination) => {
                TerminationStatus::Terminated(TerminationReason::SolverExit(termination.to_string()))
            }
            None => <S as Solver<O, CgState>>::terminate(&mut self.inner, state),
        }
    }
}

fn cost_count(state: &CgState) -> u64 {
    state.get_func_counts().get("cost_count").copied().unwrap_or(0)
}
