use std::collections::BTreeMap;

use netopt_solver::Solution;

use crate::costs::CostBreakdown;
use crate::model::{Formulation, StockKey};

/// Values at or below this are solver noise and are not reported
pub const FLOW_EPSILON: f64 = 1e-6;

/// A binary above this counts as 1
pub const OPEN_THRESHOLD: f64 = 0.5;

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct FlowRecord {
    #[cfg_attr(feature = "serde", serde(rename = "From"))]
    pub from: String,
    #[cfg_attr(feature = "serde", serde(rename = "To"))]
    pub to: String,
    #[cfg_attr(feature = "serde", serde(rename = "Product"))]
    pub product: String,
    #[cfg_attr(feature = "serde", serde(rename = "Period"))]
    pub period: u32,
    #[cfg_attr(feature = "serde", serde(rename = "FlowLbs"))]
    pub lbs: f64,
}

/// Production or ending inventory at a node
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct StockRecord {
    #[cfg_attr(feature = "serde", serde(rename = "Node"))]
    pub node: String,
    #[cfg_attr(feature = "serde", serde(rename = "Product"))]
    pub product: String,
    #[cfg_attr(feature = "serde", serde(rename = "Period"))]
    pub period: u32,
    #[cfg_attr(feature = "serde", serde(rename = "Lbs"))]
    pub lbs: f64,
}

/// Solved network design
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct NetworkPlan {
    /// Total cost
    pub objective: f64,
    pub open_dc: Vec<String>,
    pub flow: Vec<FlowRecord>,
    pub production: Vec<StockRecord>,
    pub inventory: Vec<StockRecord>,
    pub costs: CostBreakdown,
}

impl NetworkPlan {
    /// Total lbs of `product` arriving at `node` in `period`
    pub fn inbound(&self, node: &str, product: &str, period: u32) -> f64 {
        self.flow
            .iter()
            .filter(|f| f.to == node && f.product == product && f.period == period)
            .map(|f| f.lbs)
            .sum()
    }

    /// Total lbs of `product` leaving `node` in `period`
    pub fn outbound(&self, node: &str, product: &str, period: u32) -> f64 {
        self.flow
            .iter()
            .filter(|f| f.from == node && f.product == product && f.period == period)
            .map(|f| f.lbs)
            .sum()
    }

    /// Whether any reported flow starts or ends at `node`
    pub fn touches(&self, node: &str) -> bool {
        self.flow.iter().any(|f| f.from == node || f.to == node)
    }
}

/// Turn solved variable values into a plan. Pure: the same inputs always give
/// the same plan.
pub fn extract(formulation: &Formulation, solution: &Solution) -> NetworkPlan {
    let value = |var: usize| solution.values.get(var).copied().unwrap_or(0.0);

    let flow: Vec<FlowRecord> = formulation
        .variables
        .flow
        .iter()
        .filter(|&(_, &var)| value(var) > FLOW_EPSILON)
        .map(|((from, to, product, period), &var)| FlowRecord {
            from: from.clone(),
            to: to.clone(),
            product: product.clone(),
            period: *period,
            lbs: value(var),
        })
        .collect();

    let stock = |group: &BTreeMap<StockKey, usize>| -> Vec<StockRecord> {
        group
            .iter()
            .filter(|&(_, &var)| value(var) > FLOW_EPSILON)
            .map(|((node, product, period), &var)| StockRecord {
                node: node.clone(),
                product: product.clone(),
                period: *period,
                lbs: value(var),
            })
            .collect()
    };

    let open_dc: Vec<String> = formulation
        .variables
        .open
        .iter()
        .filter(|&(_, &var)| value(var) > OPEN_THRESHOLD)
        .map(|(id, _)| id.clone())
        .collect();

    for id in formulation.variables.open.keys() {
        if !open_dc.contains(id) && flow.iter().any(|f| &f.from == id || &f.to == id) {
            log::warn!("flow routes through DC {} although it is not opened", id);
        }
    }

    NetworkPlan {
        objective: formulation.problem.objective_value(&solution.values),
        open_dc,
        production: stock(&formulation.variables.make),
        inventory: stock(&formulation.variables.inventory),
        flow,
        costs: formulation.costs.breakdown(&solution.values),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScenarioConfig;
    use crate::costs::CostComponent;
    use crate::lanes::LaneTable;
    use crate::model::build;
    use crate::network::{DemandRecord, Lane, Node, NodeRole, Product};

    fn formulation() -> Formulation {
        let nodes = vec![
            Node::new("P1", NodeRole::Plant, 30.0, -90.0),
            Node::new("D1", NodeRole::DistributionCenter, 30.5, -90.0).with_fixed_cost(100.0),
            Node::new("D2", NodeRole::DistributionCenter, 30.5, -90.5).with_fixed_cost(100.0),
            Node::new("C1", NodeRole::Customer, 31.0, -90.0),
        ];
        let lanes = vec![
            Lane::new("P1", "D1", 0.01, 1.0),
            Lane::new("P1", "D2", 0.01, 1.0),
            Lane::new("D1", "C1", 0.01, 1.0),
            Lane::new("D2", "C1", 0.01, 1.0),
        ];
        let table = LaneTable::build(&nodes, &lanes).unwrap();
        build(
            &nodes,
            &[DemandRecord::new("C1", "Widget", 1, 50.0)],
            &table,
            &[Product::new("Widget")],
            &ScenarioConfig::default(),
        )
        .unwrap()
    }

    fn flow_var(f: &Formulation, from: &str, to: &str) -> usize {
        f.variables.flow[&(from.to_string(), to.to_string(), "Widget".to_string(), 1)]
    }

    /// Hand-made solution: 50 lbs via D1, noise on the D2 lanes
    fn solution(f: &Formulation) -> Solution {
        let mut values = vec![0.0; f.problem.num_variables()];
        values[flow_var(f, "P1", "D1")] = 50.0;
        values[flow_var(f, "D1", "C1")] = 50.0;
        values[flow_var(f, "P1", "D2")] = 1e-6;
        values[flow_var(f, "D2", "C1")] = 5e-7;
        values[f.variables.open["D1"]] = 0.9999999;
        values[f.variables.open["D2"]] = 0.4;
        values[f.variables.make[&("P1".to_string(), "Widget".to_string(), 1)]] = 50.0;
        let objective = f.problem.objective_value(&values);
        Solution::optimal(values, objective, 1)
    }

    #[test]
    fn test_negligible_flows_are_dropped() {
        let f = formulation();
        let plan = extract(&f, &solution(&f));

        assert_eq!(plan.flow.len(), 2);
        assert!(plan.flow.iter().all(|r| r.lbs > FLOW_EPSILON));
        assert!(!plan.touches("D2"));
        assert_eq!(plan.inbound("C1", "Widget", 1), 50.0);
        assert_eq!(plan.outbound("P1", "Widget", 1), 50.0);
        assert_eq!(plan.production.len(), 1);
        assert!(plan.inventory.is_empty());
    }

    #[test]
    fn test_open_dc_uses_half_threshold() {
        let f = formulation();
        let plan = extract(&f, &solution(&f));
        assert_eq!(plan.open_dc, vec!["D1".to_string()]);
    }

    #[test]
    fn test_objective_and_breakdown_agree() {
        let f = formulation();
        let s = solution(&f);
        let plan = extract(&f, &s);

        assert!((plan.objective - s.objective_value).abs() < 1e-9);
        assert!((plan.costs.total() - plan.objective).abs() < 1e-9);
        assert!(plan.costs.get(CostComponent::Fixed) > 100.0);
    }

    #[test]
    fn test_extract_is_idempotent() {
        let f = formulation();
        let s = solution(&f);
        assert_eq!(extract(&f, &s), extract(&f, &s));
    }
}
