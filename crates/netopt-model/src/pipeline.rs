use netopt_solver::Solver;

use crate::config::ScenarioConfig;
use crate::error::PipelineError;
use crate::extract::{NetworkPlan, extract};
use crate::lanes::LaneTable;
use crate::model::build;
use crate::network::Network;
use crate::solve::{Oracle, solve};

/// Prepare lanes, build, solve with the bundled solver, and extract
pub fn optimize(network: &Network, config: &ScenarioConfig) -> Result<NetworkPlan, PipelineError> {
    optimize_with(&Solver::new(), network, config)
}

/// Same as [`optimize`] with a caller-supplied solver
pub fn optimize_with<O: Oracle + ?Sized>(
    oracle: &O,
    network: &Network,
    config: &ScenarioConfig,
) -> Result<NetworkPlan, PipelineError> {
    let lanes = LaneTable::build(&network.nodes, &network.lanes)?;
    let formulation = build(&network.nodes, &network.demand, &lanes, &network.products, config)?;
    let solution = solve(oracle, &formulation)?;
    Ok(extract(&formulation, &solution))
}
