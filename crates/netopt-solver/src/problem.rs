use thiserror::Error;

/// Errors found while validating a problem before it is handed to the solver
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProblemError {
    #[error("Constraint {constraint} references variable index {index} but the problem has {count} variables")]
    UnknownVariable {
        constraint: String,
        index: usize,
        count: usize,
    },
    #[error("Objective has {found} coefficients but the problem has {expected} variables")]
    ObjectiveLength { expected: usize, found: usize },
    #[error("Non-finite coefficient in {0}")]
    NonFinite(String),
}

/// Domain of a decision variable. Every variable is implicitly non-negative.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableKind {
    /// Any value >= 0
    Continuous,
    /// Either 0 or 1
    Binary,
}

#[derive(Debug, Clone)]
pub struct Variable {
    pub name: String,
    pub kind: VariableKind,
}

/// Represents a mixed-integer linear programming problem
#[derive(Debug, Clone)]
pub struct LpProblem {
    /// Decision variables, addressed by position
    pub variables: Vec<Variable>,
    /// Objective function coefficients (costs)
    pub objective: Objective,
    /// Constraints
    pub constraints: Vec<Constraint>,
}

#[derive(Debug, Clone)]
pub struct Objective {
    /// Coefficient for each variable
    pub coefficients: Vec<f64>,
    /// Whether to minimize or maximize
    pub minimize: bool,
}

#[derive(Debug, Clone)]
pub struct Constraint {
    /// Name/label for the constraint (for diagnostics)
    pub name: String,
    /// Sparse left-hand side as (variable index, coefficient)
    pub terms: Vec<(usize, f64)>,
    /// Comparison operator
    pub op: ConstraintOp,
    /// Right-hand side value
    pub rhs: f64,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintOp {
    /// Less than or equal (<=)
    Le,
    /// Greater than or equal (>=)
    Ge,
    /// Equal (=)
    Eq,
}

impl Constraint {
    /// Evaluate the left-hand side at the given point
    pub fn lhs(&self, values: &[f64]) -> f64 {
        self.terms
            .iter()
            .map(|&(j, coef)| coef * values.get(j).copied().unwrap_or(0.0))
            .sum()
    }

    /// Whether the point satisfies this constraint within `tolerance`
    pub fn is_satisfied(&self, values: &[f64], tolerance: f64) -> bool {
        let lhs = self.lhs(values);
        match self.op {
            ConstraintOp::Le => lhs <= self.rhs + tolerance,
            ConstraintOp::Ge => lhs >= self.rhs - tolerance,
            ConstraintOp::Eq => (lhs - self.rhs).abs() <= tolerance,
        }
    }

    /// Like [`Constraint::is_satisfied`], with the tolerance scaled by this
    /// row's own magnitude: the larger of |rhs| and the summed |coef * x|
    pub fn is_satisfied_relative(&self, values: &[f64], tolerance: f64) -> bool {
        let magnitude: f64 = self
            .terms
            .iter()
            .map(|&(j, coef)| (coef * values.get(j).copied().unwrap_or(0.0)).abs())
            .sum();
        self.is_satisfied(values, tolerance * (1.0 + magnitude.max(self.rhs.abs())))
    }
}

impl Default for LpProblem {
    fn default() -> Self {
        Self::new()
    }
}

impl LpProblem {
    pub fn new() -> Self {
        Self {
            variables: Vec::new(),
            objective: Objective {
                coefficients: Vec::new(),
                minimize: true,
            },
            constraints: Vec::new(),
        }
    }

    /// Add a variable and return its index. Its objective coefficient starts at zero.
    pub fn add_variable(&mut self, name: impl Into<String>, kind: VariableKind) -> usize {
        self.variables.push(Variable {
            name: name.into(),
            kind,
        });
        self.objective.coefficients.push(0.0);
        self.variables.len() - 1
    }

    pub fn set_objective(&mut self, coefficients: Vec<f64>, minimize: bool) {
        self.objective = Objective { coefficients, minimize };
    }

    pub fn add_constraint(
        &mut self,
        name: impl Into<String>,
        terms: Vec<(usize, f64)>,
        op: ConstraintOp,
        rhs: f64,
    ) {
        self.constraints.push(Constraint {
            name: name.into(),
            terms,
            op,
            rhs,
        });
    }

    /// Pin a variable to a single value
    pub fn fix_variable(&mut self, name: impl Into<String>, index: usize, value: f64) {
        self.add_constraint(name, vec![(index, 1.0)], ConstraintOp::Eq, value);
    }

    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }

    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    pub fn num_binaries(&self) -> usize {
        self.variables
            .iter()
            .filter(|v| v.kind == VariableKind::Binary)
            .count()
    }

    /// Objective value at the given point
    pub fn objective_value(&self, values: &[f64]) -> f64 {
        self.objective
            .coefficients
            .iter()
            .zip(values)
            .map(|(c, x)| c * x)
            .sum()
    }

    /// First constraint the point violates, each row judged at its own scale
    pub fn first_violation(&self, values: &[f64], tolerance: f64) -> Option<&Constraint> {
        self.constraints
            .iter()
            .find(|c| !c.is_satisfied_relative(values, tolerance))
    }

    /// Check that every index is in range and every number is finite
    pub fn validate(&self) -> Result<(), ProblemError> {
        let count = self.num_variables();
        if self.objective.coefficients.len() != count {
            return Err(ProblemError::ObjectiveLength {
                expected: count,
                found: self.objective.coefficients.len(),
            });
        }
        if self.objective.coefficients.iter().any(|c| !c.is_finite()) {
            return Err(ProblemError::NonFinite("objective".to_string()));
        }
        for c in &self.constraints {
            if !c.rhs.is_finite() {
                return Err(ProblemError::NonFinite(c.name.clone()));
            }
            for &(index, coef) in &c.terms {
                if index >= count {
                    return Err(ProblemError::UnknownVariable {
                        constraint: c.name.clone(),
                        index,
                        count,
                    });
                }
                if !coef.is_finite() {
                    return Err(ProblemError::NonFinite(c.name.clone()));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_variable_extends_objective() {
        let mut problem = LpProblem::new();
        let x = problem.add_variable("x", VariableKind::Continuous);
        let y = problem.add_variable("y", VariableKind::Binary);
        assert_eq!((x, y), (0, 1));
        assert_eq!(problem.objective.coefficients, vec![0.0, 0.0]);
        assert_eq!(problem.num_binaries(), 1);
        assert!(problem.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_out_of_range_term() {
        let mut problem = LpProblem::new();
        problem.add_variable("x", VariableKind::Continuous);
        problem.add_constraint("bad", vec![(3, 1.0)], ConstraintOp::Le, 1.0);
        assert_eq!(
            problem.validate(),
            Err(ProblemError::UnknownVariable {
                constraint: "bad".to_string(),
                index: 3,
                count: 1,
            })
        );
    }

    #[test]
    fn test_validate_rejects_nan() {
        let mut problem = LpProblem::new();
        let x = problem.add_variable("x", VariableKind::Continuous);
        problem.add_constraint("nan", vec![(x, f64::NAN)], ConstraintOp::Ge, 0.0);
        assert!(matches!(problem.validate(), Err(ProblemError::NonFinite(_))));
    }

    #[test]
    fn test_constraint_satisfaction() {
        let c = Constraint {
            name: "sum".to_string(),
            terms: vec![(0, 1.0), (1, 2.0)],
            op: ConstraintOp::Eq,
            rhs: 5.0,
        };
        assert!(c.is_satisfied(&[1.0, 2.0], 1e-9));
        assert!(!c.is_satisfied(&[1.0, 1.0], 1e-9));
    }

    #[test]
    fn test_violation_is_judged_per_row() {
        let mut problem = LpProblem::new();
        let x = problem.add_variable("x", VariableKind::Continuous);
        let y = problem.add_variable("y", VariableKind::Continuous);
        problem.add_constraint("cap", vec![(x, 1.0)], ConstraintOp::Le, 1000.0);
        problem.add_constraint("big", vec![(y, 1.0)], ConstraintOp::Ge, 1e7);

        // Half a unit over a 1000 cap must not hide behind the 1e7 row
        let over = [1000.5, 1e7];
        assert_eq!(problem.first_violation(&over, 1e-6).map(|c| c.name.as_str()), Some("cap"));

        let noisy = [1000.0 + 1e-8, 1e7 - 1.0];
        assert!(problem.first_violation(&noisy, 1e-6).is_none());
    }
}
