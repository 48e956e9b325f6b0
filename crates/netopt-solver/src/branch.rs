use crate::problem::{Constraint, ConstraintOp, LpProblem, VariableKind};
use crate::simplex::{LpOutcome, ROW_TOLERANCE, Solver};
use crate::solution::Solution;

/// Best integral point found so far, scored so that lower is better
struct Incumbent {
    values: Vec<f64>,
    score: f64,
}

impl Solver {
    /// Solve the problem, branching depth-first on binary variables until
    /// every binary is integral. A pure LP is solved in a single node.
    pub fn solve(&self, problem: &LpProblem) -> Solution {
        if let Err(e) = problem.validate() {
            log::error!("rejecting malformed problem: {}", e);
            return Solution::error();
        }

        let sense = if problem.objective.minimize { 1.0 } else { -1.0 };

        let binaries: Vec<usize> = problem
            .variables
            .iter()
            .enumerate()
            .filter(|(_, v)| v.kind == VariableKind::Binary)
            .map(|(j, _)| j)
            .collect();

        let upper_bounds: Vec<Constraint> = binaries
            .iter()
            .map(|&j| Constraint {
                name: format!("{}_ub", problem.variables[j].name),
                terms: vec![(j, 1.0)],
                op: ConstraintOp::Le,
                rhs: 1.0,
            })
            .collect();

        // Each stack entry is the set of branching fixings that defines a node
        let mut stack: Vec<Vec<Constraint>> = vec![Vec::new()];
        let mut incumbent: Option<Incumbent> = None;
        let mut nodes = 0;
        let mut hit_limit = false;

        while let Some(fixings) = stack.pop() {
            if nodes >= self.max_nodes {
                hit_limit = true;
                break;
            }
            nodes += 1;

            let mut extra = upper_bounds.clone();
            extra.extend(fixings.iter().cloned());

            let (values, objective) = match self.solve_relaxation(problem, &extra) {
                LpOutcome::Optimal { values, objective } => (values, objective),
                LpOutcome::Infeasible => {
                    log::trace!("node {} infeasible", nodes);
                    continue;
                }
                LpOutcome::Unbounded => {
                    // Binaries are bounded, so an unbounded node means the continuous part is
                    return Solution::unbounded().with_nodes(nodes);
                }
                LpOutcome::IterationLimit => {
                    hit_limit = true;
                    continue;
                }
            };

            let score = sense * objective;
            if let Some(best) = &incumbent {
                if score >= best.score - self.tolerance * (1.0 + best.score.abs()) {
                    log::trace!("node {} pruned by bound {:.6}", nodes, score);
                    continue;
                }
            }

            match self.most_fractional(&binaries, &values) {
                None => {
                    log::trace!("node {} integral with objective {:.6}", nodes, objective);
                    let mut values = values;
                    for &j in &binaries {
                        values[j] = values[j].round();
                    }
                    incumbent = Some(Incumbent { values, score });
                }
                Some(j) => {
                    let name = &problem.variables[j].name;
                    let near = values[j].round();
                    let far = 1.0 - near;
                    // Push the far branch first so the rounding direction is explored next
                    for target in [far, near] {
                        let mut child = fixings.clone();
                        child.push(Constraint {
                            name: format!("branch_{}_{}", name, target),
                            terms: vec![(j, 1.0)],
                            op: ConstraintOp::Eq,
                            rhs: target,
                        });
                        stack.push(child);
                    }
                }
            }
        }

        log::debug!("branch-and-bound explored {} nodes", nodes);

        match incumbent {
            Some(_) if hit_limit => {
                log::warn!("search limit reached after {} nodes; optimality not proven", nodes);
                Solution::not_solved().with_nodes(nodes)
            }
            Some(best) => {
                if let Some(c) = problem.first_violation(&best.values, ROW_TOLERANCE) {
                    log::error!("incumbent violates {} (lhs {:.6}, rhs {:.6})", c.name, c.lhs(&best.values), c.rhs);
                    return Solution::error().with_nodes(nodes);
                }
                let objective = problem.objective_value(&best.values);
                Solution::optimal(best.values, objective, nodes)
            }
            None if hit_limit => Solution::not_solved().with_nodes(nodes),
            None => Solution::infeasible().with_nodes(nodes),
        }
    }

    fn most_fractional(&self, binaries: &[usize], values: &[f64]) -> Option<usize> {
        binaries
            .iter()
            .map(|&j| (j, (values[j] - values[j].round()).abs()))
            .filter(|&(_, frac)| frac > self.integrality_tolerance)
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(j, _)| j)
    }
}
