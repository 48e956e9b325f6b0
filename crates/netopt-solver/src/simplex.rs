use crate::problem::{Constraint, ConstraintOp, LpProblem};

/// Simplex solver with branch-and-bound over binary variables
#[derive(Debug, Clone)]
pub struct Solver {
    /// Maximum simplex pivots per LP relaxation
    pub(crate) max_iterations: usize,
    /// Maximum branch-and-bound nodes before giving up
    pub(crate) max_nodes: usize,
    /// Tolerance for floating point comparisons
    pub(crate) tolerance: f64,
    /// Distance from 0/1 under which a binary counts as integral
    pub(crate) integrality_tolerance: f64,
}

impl Default for Solver {
    fn default() -> Self {
        Self {
            max_iterations: 50_000,
            max_nodes: 10_000,
            tolerance: 1e-9,
            integrality_tolerance: 1e-6,
        }
    }
}

/// Outcome of a single LP relaxation
#[derive(Debug, Clone)]
pub(crate) enum LpOutcome {
    Optimal { values: Vec<f64>, objective: f64 },
    Infeasible,
    Unbounded,
    IterationLimit,
}

enum SimplexResult {
    Optimal,
    Unbounded,
    IterationLimit,
}

// Phase 1 residual above this (relative to the largest single rhs) means infeasible
const FEASIBILITY_TOLERANCE: f64 = 1e-7;

/// Per-row slack allowed when a relaxation's point is checked against its rows
pub(crate) const ROW_TOLERANCE: f64 = 1e-6;

impl Solver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max;
        self
    }

    pub fn with_max_nodes(mut self, max: usize) -> Self {
        self.max_nodes = max;
        self
    }

    /// Solve the continuous relaxation of `problem` with `extra` rows appended,
    /// using the two-phase simplex method and Bland's rule.
    pub(crate) fn solve_relaxation(&self, problem: &LpProblem, extra: &[Constraint]) -> LpOutcome {
        let rows: Vec<&Constraint> = problem.constraints.iter().chain(extra).collect();
        let n_vars = problem.num_variables();

        // The tableau always minimizes
        let costs: Vec<f64> = problem
            .objective
            .coefficients
            .iter()
            .map(|&c| if problem.objective.minimize { c } else { -c })
            .collect();

        let mut tableau = Tableau::build(n_vars, &rows);

        if tableau.n_artificial > 0 {
            let rhs_scale = rows.iter().map(|c| c.rhs.abs()).fold(0.0, f64::max);
            match self.phase1(&mut tableau) {
                SimplexResult::Optimal => {}
                SimplexResult::Unbounded => return LpOutcome::Infeasible,
                SimplexResult::IterationLimit => return LpOutcome::IterationLimit,
            }
            if tableau.objective_value() > FEASIBILITY_TOLERANCE * (1.0 + rhs_scale) {
                return LpOutcome::Infeasible;
            }
            self.drive_out_artificials(&mut tableau);
        }

        tableau.set_objective(&costs);
        let limit = tableau.artificial_start();
        let result = self.iterate(&mut tableau, limit);
        if let SimplexResult::IterationLimit = result {
            return LpOutcome::IterationLimit;
        }

        let values = tableau.values();
        // A residual under the phase 1 cutoff can still leave a small row unmet
        if let Some(c) = rows.iter().find(|c| !c.is_satisfied_relative(&values, ROW_TOLERANCE)) {
            log::debug!("relaxation point violates {} by {:.6}", c.name, c.lhs(&values) - c.rhs);
            return LpOutcome::Infeasible;
        }
        if let SimplexResult::Unbounded = result {
            return LpOutcome::Unbounded;
        }
        let objective = problem.objective_value(&values);
        LpOutcome::Optimal { values, objective }
    }

    fn phase1(&self, tableau: &mut Tableau) -> SimplexResult {
        // Minimize the sum of artificial variables
        let obj = tableau.objective_row();
        let width = tableau.width();
        let art_start = tableau.artificial_start();

        tableau.data[obj] = vec![0.0; width];
        for j in art_start..(art_start + tableau.n_artificial) {
            tableau.data[obj][j] = 1.0;
        }

        // Price out the basic artificials
        for i in 0..obj {
            if tableau.basic_vars[i] >= art_start {
                for j in 0..width {
                    tableau.data[obj][j] -= tableau.data[i][j];
                }
            }
        }

        self.iterate(tableau, width - 1)
    }

    /// Pivot zero-valued artificials out of the basis where a structural column allows it.
    /// Rows where none does are redundant and keep their artificial at zero.
    fn drive_out_artificials(&self, tableau: &mut Tableau) {
        let art_start = tableau.artificial_start();
        for i in 0..tableau.objective_row() {
            if tableau.basic_vars[i] < art_start {
                continue;
            }
            if let Some(col) = (0..art_start).find(|&j| tableau.data[i][j].abs() > self.tolerance) {
                tableau.pivot(i, col);
            }
        }
    }

    /// Run simplex pivots over columns `0..limit` until no reduced cost is negative
    fn iterate(&self, tableau: &mut Tableau, limit: usize) -> SimplexResult {
        let obj = tableau.objective_row();
        for _ in 0..self.max_iterations {
            // Bland's rule: lowest improving index, so degenerate pivots cannot cycle
            let Some(col) = (0..limit).find(|&j| tableau.data[obj][j] < -self.tolerance) else {
                return SimplexResult::Optimal;
            };
            let Some(row) = self.find_pivot_row(tableau, col) else {
                return SimplexResult::Unbounded;
            };
            tableau.pivot(row, col);
        }
        log::warn!("simplex stopped after {} iterations", self.max_iterations);
        SimplexResult::IterationLimit
    }

    fn find_pivot_row(&self, tableau: &Tableau, col: usize) -> Option<usize> {
        let rhs_col = tableau.width() - 1;

        let mut best: Option<(usize, f64)> = None;
        for i in 0..tableau.objective_row() {
            let val = tableau.data[i][col];
            if val <= self.tolerance {
                continue;
            }
            let ratio = tableau.data[i][rhs_col].max(0.0) / val;
            best = match best {
                None => Some((i, ratio)),
                Some((r, min)) => {
                    if ratio < min - self.tolerance
                        || (ratio <= min + self.tolerance && tableau.basic_vars[i] < tableau.basic_vars[r])
                    {
                        Some((i, ratio))
                    } else {
                        Some((r, min))
                    }
                }
            };
        }

        best.map(|(row, _)| row)
    }
}

/// Dense simplex tableau. The last row holds reduced costs and the negated objective.
struct Tableau {
    data: Vec<Vec<f64>>,
    basic_vars: Vec<usize>,
    n_vars: usize,
    n_slack: usize,
    n_artificial: usize,
}

impl Tableau {
    fn build(n_vars: usize, rows: &[&Constraint]) -> Self {
        // Keep every rhs non-negative by flipping rows, which swaps <= and >=
        let normalized: Vec<(f64, ConstraintOp)> = rows
            .iter()
            .map(|c| {
                if c.rhs < 0.0 {
                    let op = match c.op {
                        ConstraintOp::Le => ConstraintOp::Ge,
                        ConstraintOp::Ge => ConstraintOp::Le,
                        ConstraintOp::Eq => ConstraintOp::Eq,
                    };
                    (-1.0, op)
                } else {
                    (1.0, c.op)
                }
            })
            .collect();

        let n_slack = normalized.iter().filter(|(_, op)| *op != ConstraintOp::Eq).count();
        let n_artificial = normalized.iter().filter(|(_, op)| *op != ConstraintOp::Le).count();
        let width = n_vars + n_slack + n_artificial + 1;

        let mut tableau = Tableau {
            data: vec![vec![0.0; width]; rows.len() + 1],
            basic_vars: vec![0; rows.len()],
            n_vars,
            n_slack,
            n_artificial,
        };

        let mut slack_idx = n_vars;
        let mut artificial_idx = n_vars + n_slack;

        for (i, (c, &(sign, op))) in rows.iter().zip(&normalized).enumerate() {
            for &(j, coef) in &c.terms {
                tableau.data[i][j] += sign * coef;
            }
            tableau.data[i][width - 1] = sign * c.rhs;

            match op {
                ConstraintOp::Le => {
                    tableau.data[i][slack_idx] = 1.0;
                    tableau.basic_vars[i] = slack_idx;
                    slack_idx += 1;
                }
                ConstraintOp::Ge => {
                    tableau.data[i][slack_idx] = -1.0; // surplus
                    slack_idx += 1;
                    tableau.data[i][artificial_idx] = 1.0;
                    tableau.basic_vars[i] = artificial_idx;
                    artificial_idx += 1;
                }
                ConstraintOp::Eq => {
                    tableau.data[i][artificial_idx] = 1.0;
                    tableau.basic_vars[i] = artificial_idx;
                    artificial_idx += 1;
                }
            }
        }

        tableau
    }

    fn width(&self) -> usize {
        self.data[0].len()
    }

    fn objective_row(&self) -> usize {
        self.data.len() - 1
    }

    fn artificial_start(&self) -> usize {
        self.n_vars + self.n_slack
    }

    fn objective_value(&self) -> f64 {
        -self.data[self.objective_row()][self.width() - 1]
    }

    /// Load `costs` for the structural columns and price out the current basis
    fn set_objective(&mut self, costs: &[f64]) {
        let obj = self.objective_row();
        let width = self.width();

        self.data[obj] = vec![0.0; width];
        self.data[obj][..self.n_vars].copy_from_slice(&costs[..self.n_vars]);

        for i in 0..obj {
            let basic = self.basic_vars[i];
            if basic >= self.n_vars {
                continue;
            }
            let cost = costs[basic];
            if cost != 0.0 {
                for j in 0..width {
                    self.data[obj][j] -= cost * self.data[i][j];
                }
            }
        }
    }

    fn pivot(&mut self, row: usize, col: usize) {
        let n_rows = self.data.len();
        let n_cols = self.width();

        self.basic_vars[row] = col;

        let pivot_val = self.data[row][col];
        for j in 0..n_cols {
            self.data[row][j] /= pivot_val;
        }

        let pivot_row = self.data[row].clone();
        for i in 0..n_rows {
            if i == row {
                continue;
            }
            let factor = self.data[i][col];
            if factor == 0.0 {
                continue;
            }
            for (cell, p) in self.data[i].iter_mut().zip(&pivot_row) {
                *cell -= factor * p;
            }
        }
    }

    fn values(&self) -> Vec<f64> {
        let rhs_col = self.width() - 1;
        let mut values = vec![0.0; self.n_vars];
        for (i, &basic) in self.basic_vars.iter().enumerate() {
            if basic < self.n_vars {
                values[basic] = self.data[i][rhs_col].max(0.0);
            }
        }
        values
    }
}
