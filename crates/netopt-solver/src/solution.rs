use std::fmt;

/// The result of solving an LP/MILP problem
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Solution {
    /// Solution status
    pub status: SolutionStatus,
    /// Optimal values for each variable (empty unless optimal)
    pub values: Vec<f64>,
    /// Optimal objective value
    pub objective_value: f64,
    /// Branch-and-bound nodes explored (1 for a pure LP)
    pub nodes_explored: usize,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolutionStatus {
    /// An optimal solution was found
    Optimal,
    /// The problem is infeasible (no solution exists)
    Infeasible,
    /// The problem is unbounded
    Unbounded,
    /// An iteration or node limit stopped the search before optimality was proven
    NotSolved,
    /// Solver encountered an error
    Error,
}

impl SolutionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SolutionStatus::Optimal => "Optimal",
            SolutionStatus::Infeasible => "Infeasible",
            SolutionStatus::Unbounded => "Unbounded",
            SolutionStatus::NotSolved => "Not Solved",
            SolutionStatus::Error => "Error",
        }
    }
}

impl fmt::Display for SolutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Solution {
    pub fn optimal(values: Vec<f64>, objective_value: f64, nodes_explored: usize) -> Self {
        Self {
            status: SolutionStatus::Optimal,
            values,
            objective_value,
            nodes_explored,
        }
    }

    pub fn infeasible() -> Self {
        Self::terminated(SolutionStatus::Infeasible, f64::INFINITY)
    }

    pub fn unbounded() -> Self {
        Self::terminated(SolutionStatus::Unbounded, f64::NEG_INFINITY)
    }

    pub fn not_solved() -> Self {
        Self::terminated(SolutionStatus::NotSolved, f64::NAN)
    }

    pub fn error() -> Self {
        Self::terminated(SolutionStatus::Error, f64::NAN)
    }

    fn terminated(status: SolutionStatus, objective_value: f64) -> Self {
        Self {
            status,
            values: Vec::new(),
            objective_value,
            nodes_explored: 0,
        }
    }

    pub fn is_optimal(&self) -> bool {
        self.status == SolutionStatus::Optimal
    }

    pub(crate) fn with_nodes(mut self, nodes_explored: usize) -> Self {
        self.nodes_explored = nodes_explored;
        self
    }
}
