pub mod callback;
pub mod problem;
pub mod solvers;

pub use callback::RunCallback;
pub use problem::ProfitProblem;
pub use solvers::{BfgsOptimizer, LbfgsOptimizer, select_solver};
pub use solvers::{NoCallback, OptimizationCallback, Problem, Solver, SolverResult};
