mod branch;
mod problem;
mod simplex;
mod solution;

pub use problem::{Constraint, ConstraintOp, LpProblem, Objective, ProblemError, Variable, VariableKind};
pub use simplex::Solver;
pub use solution::{Solution, SolutionStatus};
