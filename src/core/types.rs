use super::errors::OptError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ===== ENUMS =====

/// Search strategy used by the optimizer driver
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Method {
    /// Unconstrained quasi-Newton search on the penalized objective
    #[default]
    #[serde(rename = "penalty+unconstrained")]
    PenaltyUnconstrained,
    /// Projected quasi-Newton search that never leaves the bounds
    #[serde(rename = "bounded")]
    Bounded,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PenaltyUnconstrained => "penalty+unconstrained",
            Self::Bounded => "bounded",
        }
    }

    /// Whether the penalty term takes part in the search objective
    pub fn uses_penalty(&self) -> bool {
        matches!(self, Self::PenaltyUnconstrained)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = OptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "penalty+unconstrained" | "penalty" => Ok(Self::PenaltyUnconstrained),
            "bounded" => Ok(Self::Bounded),
            _ => Err(OptError::UnknownMethod(s.to_string())),
        }
    }
}

/// Quasi-Newton engine that drives the search
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Engine {
    /// Built-in dense BFGS with Armijo backtracking (supports both methods)
    #[default]
    #[serde(rename = "native-bfgs")]
    NativeBfgs,
    /// argmin L-BFGS with More-Thuente line search (penalty method only)
    #[serde(rename = "argmin-lbfgs")]
    ArgminLbfgs,
}

impl Engine {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NativeBfgs => "native-bfgs",
            Self::ArgminLbfgs => "argmin-lbfgs",
        }
    }
}

impl fmt::Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Engine {
    type Err = OptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "native-bfgs" | "bfgs" => Ok(Self::NativeBfgs),
            "argmin-lbfgs" | "lbfgs" => Ok(Self::ArgminLbfgs),
            _ => Err(OptError::UnknownEngine(s.to_string())),
        }
    }
}

/// How a run ended
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", content = "reason")]
pub enum TerminalState {
    Converged,
    MaxIterationsReached,
    Failed(String),
}

impl TerminalState {
    /// Converged and MaxIterationsReached both count as completed runs
    pub fn is_completed(&self) -> bool {
        !matches!(self, Self::Failed(_))
    }

    pub fn is_converged(&self) -> bool {
        matches!(self, Self::Converged)
    }
}

impl fmt::Display for TerminalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Converged => f.write_str("Converged"),
            Self::MaxIterationsReached => f.write_str("MaxIterationsReached"),
            Self::Failed(reason) => write!(f, "Failed ({reason})"),
        }
    }
}

/// The four decision variables, in vector order
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Variable {
    Substrate,
    Biomass,
    TemperatureGain,
    PhGain,
}

impl Variable {
    pub const ALL: [Variable; 4] = [
        Self::Substrate,
        Self::Biomass,
        Self::TemperatureGain,
        Self::PhGain,
    ];

    pub fn index(self) -> usize {
        match self {
            Self::Substrate => 0,
            Self::Biomass => 1,
            Self::TemperatureGain => 2,
            Self::PhGain => 3,
        }
    }

    /// Model symbol (`C_p`, `X_0`, `k_E`, `k_pH`)
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Substrate => "C_p",
            Self::Biomass => "X_0",
            Self::TemperatureGain => "k_E",
            Self::PhGain => "k_pH",
        }
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for Variable {
    type Err = OptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "c_p" | "substrate" => Ok(Self::Substrate),
            "x_0" | "biomass" => Ok(Self::Biomass),
            "k_e" | "temperature_gain" => Ok(Self::TemperatureGain),
            "k_ph" | "ph_gain" => Ok(Self::PhGain),
            _ => Err(OptError::UnknownVariable(s.to_string())),
        }
    }
}

// ===== CORE DATA TYPES =====

/// Physical, biological and economic constants of the process model.
///
/// Supplied once per run and never mutated by the optimizer. Field names
/// follow the model notation: `k_s` is the Monod saturation constant,
/// `c_inhib` the substrate inhibition constant, `alpha_r` the biomass
/// response rate.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParameterSet {
    pub k_s: f64,
    pub c_inhib: f64,
    pub price: f64,
    pub alpha_r: f64,

    // Material cost
    pub a1: f64,
    pub a2: f64,
    pub b1: f64,
    pub b2: f64,
    pub c1: f64,

    // Operational cost
    pub d1: f64,
    pub d2: f64,
    pub d3: f64,
    pub e1: f64,
    pub e2: f64,

    // Synergy
    pub gamma1: f64,
    pub gamma2: f64,
}

impl ParameterSet {
    /// Reference baseline: `K_s=1, C_inhib=5, Price=10, alpha_R=1`, every
    /// cost coefficient 0.1, no synergy.
    pub fn baseline() -> Self {
        Self {
            k_s: 1.0,
            c_inhib: 5.0,
            price: 10.0,
            alpha_r: 1.0,
            a1: 0.1,
            a2: 0.1,
            b1: 0.1,
            b2: 0.1,
            c1: 0.1,
            d1: 0.1,
            d2: 0.1,
            d3: 0.1,
            e1: 0.1,
            e2: 0.1,
            gamma1: 0.0,
            gamma2: 0.0,
        }
    }

    /// All coefficients with their names, for validation and display
    pub fn named_values(&self) -> [(&'static str, f64); 16] {
        [
            ("k_s", self.k_s),
            ("c_inhib", self.c_inhib),
            ("price", self.price),
            ("alpha_r", self.alpha_r),
            ("a1", self.a1),
            ("a2", self.a2),
            ("b1", self.b1),
            ("b2", self.b2),
            ("c1", self.c1),
            ("d1", self.d1),
            ("d2", self.d2),
            ("d3", self.d3),
            ("e1", self.e1),
            ("e2", self.e2),
            ("gamma1", self.gamma1),
            ("gamma2", self.gamma2),
        ]
    }
}

impl Default for ParameterSet {
    fn default() -> Self {
        Self::baseline()
    }
}

/// Operating point `(C_p, X_0, k_E, k_pH)`
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecisionVector {
    pub substrate: f64,
    pub biomass: f64,
    pub temperature_gain: f64,
    pub ph_gain: f64,
}

impl DecisionVector {
    pub const fn new(substrate: f64, biomass: f64, temperature_gain: f64, ph_gain: f64) -> Self {
        Self {
            substrate,
            biomass,
            temperature_gain,
            ph_gain,
        }
    }

    pub const fn from_array(values: [f64; 4]) -> Self {
        Self::new(values[0], values[1], values[2], values[3])
    }

    /// Build from a solver parameter slice; `None` unless it has exactly 4 entries
    pub fn from_slice(values: &[f64]) -> Option<Self> {
        let values: [f64; 4] = values.try_into().ok()?;
        Some(Self::from_array(values))
    }

    pub fn to_array(&self) -> [f64; 4] {
        [
            self.substrate,
            self.biomass,
            self.temperature_gain,
            self.ph_gain,
        ]
    }

    pub fn get(&self, variable: Variable) -> f64 {
        self.to_array()[variable.index()]
    }

    /// Copy with one component replaced
    pub fn with(&self, variable: Variable, value: f64) -> Self {
        let mut values = self.to_array();
        values[variable.index()] = value;
        Self::from_array(values)
    }

    pub fn is_finite(&self) -> bool {
        self.to_array().iter().all(|v| v.is_finite())
    }
}

impl Default for DecisionVector {
    fn default() -> Self {
        Self::new(1.0, 1.0, 0.1, 0.1)
    }
}

impl fmt::Display for DecisionVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "(C_p={:.6}, X_0={:.6}, k_E={:.6}, k_pH={:.6})",
            self.substrate, self.biomass, self.temperature_gain, self.ph_gain
        )
    }
}

/// Box limits `(lower, upper)` for each decision variable
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Bounds {
    pub substrate: (f64, f64),
    pub biomass: (f64, f64),
    pub temperature_gain: (f64, f64),
    pub ph_gain: (f64, f64),
}

impl Bounds {
    /// Same `[lower, upper]` interval on every variable
    pub const fn uniform(lower: f64, upper: f64) -> Self {
        Self {
            substrate: (lower, upper),
            biomass: (lower, upper),
            temperature_gain: (lower, upper),
            ph_gain: (lower, upper),
        }
    }

    pub fn pairs(&self) -> [(f64, f64); 4] {
        [
            self.substrate,
            self.biomass,
            self.temperature_gain,
            self.ph_gain,
        ]
    }

    pub fn get(&self, variable: Variable) -> (f64, f64) {
        self.pairs()[variable.index()]
    }

    /// Inclusive containment check
    pub fn contains(&self, v: &DecisionVector) -> bool {
        v.to_array()
            .iter()
            .zip(self.pairs().iter())
            .all(|(&x, &(lo, hi))| x >= lo && x <= hi)
    }

    pub fn clamp(&self, v: &DecisionVector) -> DecisionVector {
        let mut values = v.to_array();
        super::constraints::clamp_to_bounds(&mut values, &self.pairs());
        DecisionVector::from_array(values)
    }
}

impl Default for Bounds {
    fn default() -> Self {
        Self::uniform(0.0, 10.0)
    }
}

// ===== EVALUATION =====

/// The four multiplicative revenue factors
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RevenueFactors {
    pub saturation: f64,
    pub biomass: f64,
    pub inhibition: f64,
    pub synergy: f64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CostBreakdown {
    pub material: f64,
    pub operational: f64,
}

/// Everything the objective evaluator computes for one decision vector
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub revenue: f64,
    pub cost: f64,
    /// Bound-violation penalty
    pub penalty: f64,
    /// Quadratic guard for `C_p < 0` or `X_0 < 0`
    pub domain_penalty: f64,
    /// `-(revenue - cost) + penalty + domain_penalty`
    pub objective: f64,
    pub factors: RevenueFactors,
    pub costs: CostBreakdown,
}

impl EvaluationResult {
    pub fn profit(&self) -> f64 {
        self.revenue - self.cost
    }
}

// ===== CONFIGURATION =====

/// Optimizer driver settings
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerConfig {
    pub method: Method,
    pub engine: Engine,
    pub max_iterations: u32,
    pub tolerance: f64,
    pub penalty_coefficient: f64,
    /// Keep every iterate in the report
    pub record_history: bool,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            method: Method::PenaltyUnconstrained,
            engine: Engine::NativeBfgs,
            max_iterations: 500,
            tolerance: 1e-6,
            penalty_coefficient: 1e3,
            record_history: true,
        }
    }
}

impl OptimizerConfig {
    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    pub fn with_engine(mut self, engine: Engine) -> Self {
        self.engine = engine;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: u32) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn with_penalty_coefficient(mut self, penalty_coefficient: f64) -> Self {
        self.penalty_coefficient = penalty_coefficient;
        self
    }

    /// Coefficient the search objective uses; zero for the bounded method
    pub fn search_penalty(&self) -> f64 {
        if self.method.uses_penalty() {
            self.penalty_coefficient
        } else {
            0.0
        }
    }
}

// ===== OUTPUT =====

/// One recorded iterate
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IterationRecord {
    pub iteration: u32,
    pub params: DecisionVector,
    pub objective: f64,
}

/// Final, read-only result of one optimizer run
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OptimizationReport {
    /// Best point, clamped into the bounds
    pub decision: DecisionVector,
    /// Best point as the solver left it
    pub unclamped: DecisionVector,
    pub state: TerminalState,
    pub method: Method,
    pub engine: Engine,
    pub iterations: u32,
    pub cost_evals: usize,
    pub grad_evals: usize,
    /// Evaluation at `decision`
    pub evaluation: EvaluationResult,
    pub profit: f64,
    /// Signed distance by which each pre-clamp value left its bound
    pub violations: [f64; 4],
    /// Last search objective reported by the solver (pre-clamp)
    pub solver_objective: f64,
    pub history: Vec<IterationRecord>,
}

impl OptimizationReport {
    pub fn converged(&self) -> bool {
        self.state.is_converged()
    }

    pub fn violation(&self, variable: Variable) -> f64 {
        self.violations[variable.index()]
    }

    pub fn required_clamping(&self) -> bool {
        self.violations.iter().any(|&v| v != 0.0)
    }
}

impl fmt::Display for OptimizationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "=".repeat(72);
        writeln!(f, "{rule}")?;
        writeln!(f, "OPTIMIZATION REPORT")?;
        writeln!(f, "{rule}")?;
        writeln!(f, "Status:      {}", self.state)?;
        writeln!(f, "Method:      {} ({})", self.method, self.engine)?;
        writeln!(
            f,
            "Iterations:  {} (cost evals {}, grad evals {})",
            self.iterations, self.cost_evals, self.grad_evals
        )?;

        writeln!(f, "\nOptimal operating point:")?;
        for variable in Variable::ALL {
            writeln!(
                f,
                "  {:<6} = {:>14.6}   violation {:>12.4e}",
                variable.symbol(),
                self.decision.get(variable),
                self.violation(variable)
            )?;
        }

        let factors = &self.evaluation.factors;
        writeln!(f, "\nRevenue:     {:>14.6}", self.evaluation.revenue)?;
        writeln!(f, "  saturation  {:>14.6}", factors.saturation)?;
        writeln!(f, "  biomass     {:>14.6}", factors.biomass)?;
        writeln!(f, "  inhibition  {:>14.6}", factors.inhibition)?;
        writeln!(f, "  synergy     {:>14.6}", factors.synergy)?;
        writeln!(f, "Cost:        {:>14.6}", self.evaluation.cost)?;
        writeln!(f, "  material    {:>14.6}", self.evaluation.costs.material)?;
        writeln!(f, "  operational {:>14.6}", self.evaluation.costs.operational)?;
        writeln!(f, "Penalty:     {:>14.6e}", self.evaluation.penalty)?;
        writeln!(f, "Profit:      {:>14.6}", self.profit)?;
        write!(f, "{rule}")
    }
}
