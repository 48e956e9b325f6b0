use netopt_solver::{LpProblem, Solution, SolutionStatus, Solver};

use crate::error::SolverStatusError;
use crate::model::Formulation;

/// An LP/MILP engine. Takes the problem by reference and must leave it untouched.
pub trait Oracle {
    fn solve_problem(&self, problem: &LpProblem) -> Solution;
}

impl Oracle for Solver {
    fn solve_problem(&self, problem: &LpProblem) -> Solution {
        self.solve(problem)
    }
}

/// Solve a formulation. Only a proven optimum yields a solution; every other
/// terminal status comes back as the error value, with no partial values.
pub fn solve<O: Oracle + ?Sized>(oracle: &O, formulation: &Formulation) -> Result<Solution, SolverStatusError> {
    let solution = oracle.solve_problem(&formulation.problem);
    log::info!(
        "solver finished with status {} after {} nodes",
        solution.status,
        solution.nodes_explored
    );

    if !solution.is_optimal() {
        return Err(SolverStatusError(solution.status));
    }
    if solution.values.len() != formulation.problem.num_variables() {
        log::error!(
            "solver returned {} values for {} variables",
            solution.values.len(),
            formulation.problem.num_variables()
        );
        return Err(SolverStatusError(SolutionStatus::Error));
    }
    Ok(solution)
}
