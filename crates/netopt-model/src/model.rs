use std::collections::{BTreeMap, HashMap, HashSet};

use netopt_solver::{ConstraintOp, LpProblem, VariableKind};

use crate::config::ScenarioConfig;
use crate::costs::{CostComponent, CostTerms};
use crate::error::{BuildError, DataError};
use crate::lanes::{LaneTable, RoutedLane};
use crate::network::{DemandRecord, Node, NodeRole, Product};

/// (from, to, product, period)
pub type FlowKey = (String, String, String, u32);

/// (node, product, period)
pub type StockKey = (String, String, u32);

/// Handles to every decision variable, by group
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VariableGroups {
    /// Binary per DC: whether it is operated
    pub open: BTreeMap<String, usize>,
    /// Quantity shipped on a lane
    pub flow: BTreeMap<FlowKey, usize>,
    /// Quantity produced at a plant
    pub make: BTreeMap<StockKey, usize>,
    /// End-of-period inventory at a plant or DC
    pub inventory: BTreeMap<StockKey, usize>,
}

impl VariableGroups {
    /// Group names as they appear in reports: `open` per DC, `flow` per
    /// (lane, product, period), `make` and `inv` per (node, product, period)
    pub const NAMES: [&'static str; 4] = ["open", "flow", "make", "inv"];

    /// Variable indices of the named group, for any name in [`Self::NAMES`]
    pub fn group(&self, name: &str) -> Option<Vec<usize>> {
        match name {
            "open" => Some(self.open.values().copied().collect()),
            "flow" => Some(self.flow.values().copied().collect()),
            "make" => Some(self.make.values().copied().collect()),
            "inv" => Some(self.inventory.values().copied().collect()),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.open.len() + self.flow.len() + self.make.len() + self.inventory.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A built network design MILP, ready to hand to a solver
#[derive(Debug, Clone)]
pub struct Formulation {
    pub problem: LpProblem,
    pub variables: VariableGroups,
    /// Objective split into named components
    pub costs: CostTerms,
    /// Sorted distinct demand periods
    pub periods: Vec<u32>,
}

/// Build the network design MILP for one scenario.
///
/// All inputs are checked before any variable is created; a bad table or
/// scenario parameter yields an error and no formulation.
pub fn build(
    nodes: &[Node],
    demand: &[DemandRecord],
    lanes: &LaneTable,
    products: &[Product],
    config: &ScenarioConfig,
) -> Result<Formulation, BuildError> {
    validate_inputs(nodes, demand, lanes, products)?;
    config.validate(nodes)?;

    let mut builder = ModelBuilder::new(nodes, demand, lanes, products, config);
    builder.add_variables();
    builder.add_costs();
    builder.add_shutdown();
    builder.add_capacity();
    builder.add_demand();
    builder.add_service_time();
    builder.add_mass_balance();
    builder.add_bom();
    builder.add_safety_stock();

    let formulation = builder.finish();
    log::debug!(
        "built formulation: {} variables ({} binary), {} constraints, {} periods",
        formulation.problem.num_variables(),
        formulation.problem.num_binaries(),
        formulation.problem.num_constraints(),
        formulation.periods.len()
    );
    Ok(formulation)
}

fn validate_inputs(
    nodes: &[Node],
    demand: &[DemandRecord],
    lanes: &LaneTable,
    products: &[Product],
) -> Result<(), DataError> {
    let mut node_roles: HashMap<&str, NodeRole> = HashMap::new();
    for node in nodes {
        if node_roles.insert(&node.id, node.role).is_some() {
            return Err(DataError::DuplicateNode(node.id.clone()));
        }
    }

    let mut product_ids: HashSet<&str> = HashSet::new();
    for product in products {
        if !product_ids.insert(&product.id) {
            return Err(DataError::DuplicateProduct(product.id.clone()));
        }
    }

    for product in products {
        let Some(parent) = &product.bom_parent else {
            continue;
        };
        let invalid = |reason: &str| DataError::InvalidBom {
            product: product.id.clone(),
            reason: reason.to_string(),
        };
        if !product_ids.contains(parent.as_str()) {
            return Err(invalid(&format!("unknown parent product {}", parent)));
        }
        if parent == &product.id {
            return Err(invalid("product lists itself as parent"));
        }
        match product.bom_ratio {
            Some(ratio) if ratio.is_finite() && ratio > 0.0 => {}
            _ => return Err(invalid("input ratio must be positive")),
        }
    }

    for record in demand {
        if node_roles.get(record.customer.as_str()) != Some(&NodeRole::Customer) {
            return Err(DataError::UnknownCustomer(record.customer.clone()));
        }
        if !product_ids.contains(record.product.as_str()) {
            return Err(DataError::UnknownProduct(record.product.clone()));
        }
        if !(record.quantity.is_finite() && record.quantity >= 0.0) {
            return Err(DataError::NegativeDemand {
                customer: record.customer.clone(),
                product: record.product.clone(),
                period: record.period,
                quantity: record.quantity,
            });
        }
    }

    for routed in lanes.iter() {
        let lane = &routed.lane;
        let missing = |column| DataError::MissingLaneRate {
            from: lane.from.clone(),
            to: lane.to.clone(),
            column,
        };
        if !lane.cost_per_lb_mi.is_some_and(f64::is_finite) {
            return Err(missing("Cost_per_lb_mi"));
        }
        if !lane.transit_days.is_some_and(f64::is_finite) {
            return Err(missing("TransitDays"));
        }
    }

    Ok(())
}

fn facilities(nodes: &[Node]) -> impl Iterator<Item = (usize, &Node)> {
    nodes.iter().enumerate().filter(|(_, n)| n.role.is_facility())
}

/// Working state while the formulation is assembled. Variables of one entity
/// are laid out contiguously as `start + product * periods + period`.
struct ModelBuilder<'a> {
    nodes: &'a [Node],
    demand: &'a [DemandRecord],
    lanes: Vec<&'a RoutedLane>,
    products: &'a [Product],
    config: &'a ScenarioConfig,
    periods: Vec<u32>,
    product_pos: HashMap<&'a str, usize>,
    period_pos: HashMap<u32, usize>,
    inbound: HashMap<&'a str, Vec<usize>>,
    outbound: HashMap<&'a str, Vec<usize>>,
    problem: LpProblem,
    variables: VariableGroups,
    costs: CostTerms,
    open_var: Vec<Option<usize>>,
    flow_start: Vec<usize>,
    make_start: Vec<Option<usize>>,
    inv_start: Vec<Option<usize>>,
}

impl<'a> ModelBuilder<'a> {
    fn new(
        nodes: &'a [Node],
        demand: &'a [DemandRecord],
        lanes: &'a LaneTable,
        products: &'a [Product],
        config: &'a ScenarioConfig,
    ) -> Self {
        let mut periods: Vec<u32> = demand.iter().map(|d| d.period).collect();
        periods.sort_unstable();
        periods.dedup();

        let lanes: Vec<&RoutedLane> = lanes.iter().collect();
        let mut inbound: HashMap<&str, Vec<usize>> = HashMap::new();
        let mut outbound: HashMap<&str, Vec<usize>> = HashMap::new();
        for (l, routed) in lanes.iter().copied().enumerate() {
            inbound.entry(routed.lane.to.as_str()).or_default().push(l);
            outbound.entry(routed.lane.from.as_str()).or_default().push(l);
        }

        Self {
            nodes,
            demand,
            products,
            config,
            product_pos: products.iter().enumerate().map(|(i, p)| (p.id.as_str(), i)).collect(),
            period_pos: periods.iter().enumerate().map(|(i, &t)| (t, i)).collect(),
            periods,
            lanes,
            inbound,
            outbound,
            problem: LpProblem::new(),
            variables: VariableGroups::default(),
            costs: CostTerms::new(),
            open_var: vec![None; nodes.len()],
            flow_start: Vec::new(),
            make_start: vec![None; nodes.len()],
            inv_start: vec![None; nodes.len()],
        }
    }

    fn slot(&self, product: usize, period: usize) -> usize {
        product * self.periods.len() + period
    }

    fn flow(&self, lane: usize, product: usize, period: usize) -> usize {
        self.flow_start[lane] + self.slot(product, period)
    }

    fn lanes_into(&self, node: &str) -> &[usize] {
        self.inbound.get(node).map(Vec::as_slice).unwrap_or(&[])
    }

    fn lanes_out_of(&self, node: &str) -> &[usize] {
        self.outbound.get(node).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Add one continuous variable per (product, period) for an entity
    fn add_block(&mut self, prefix: &str, entity: &str) -> Vec<(String, u32, usize)> {
        let products = self.products;
        let mut block = Vec::with_capacity(products.len() * self.periods.len());
        for product in products {
            for &period in &self.periods {
                let var = self.problem.add_variable(
                    format!("{}_{}_{}_{}", prefix, entity, product.id, period),
                    VariableKind::Continuous,
                );
                block.push((product.id.clone(), period, var));
            }
        }
        block
    }

    fn add_variables(&mut self) {
        let nodes = self.nodes;
        for (k, node) in nodes.iter().enumerate() {
            if node.role == NodeRole::DistributionCenter {
                let var = self
                    .problem
                    .add_variable(format!("Open_{}", node.id), VariableKind::Binary);
                self.open_var[k] = Some(var);
                self.variables.open.insert(node.id.clone(), var);
            }
        }

        let lanes = self.lanes.clone();
        for lane in lanes.iter().map(|r| &r.lane) {
            let (from, to) = (lane.from.clone(), lane.to.clone());
            let entity = format!("{}_{}", from, to);
            let block = self.add_block("F", &entity);
            self.flow_start.push(block.first().map_or(self.problem.num_variables(), |b| b.2));
            for (product, period, var) in block {
                self.variables
                    .flow
                    .insert((from.clone(), to.clone(), product, period), var);
            }
        }

        for (k, node) in nodes.iter().enumerate() {
            if node.role == NodeRole::Plant {
                let block = self.add_block("Make", &node.id);
                self.make_start[k] = block.first().map(|b| b.2);
                for (product, period, var) in block {
                    self.variables.make.insert((node.id.clone(), product, period), var);
                }
            }
        }

        for (k, node) in facilities(nodes) {
            let block = self.add_block("Inv", &node.id);
            self.inv_start[k] = block.first().map(|b| b.2);
            for (product, period, var) in block {
                self.variables.inventory.insert((node.id.clone(), product, period), var);
            }
        }
    }

    fn add_costs(&mut self) {
        let slots = self.products.len() * self.periods.len();

        let nodes = self.nodes;
        for (k, node) in nodes.iter().enumerate() {
            if let Some(open) = self.open_var[k] {
                self.costs.add(CostComponent::Fixed, open, node.fixed_cost());
            }
            if let Some(start) = self.make_start[k] {
                for s in 0..slots {
                    self.costs.add(CostComponent::Production, start + s, node.var_cost());
                }
            }
            if let Some(start) = self.inv_start[k] {
                for s in 0..slots {
                    self.costs.add(CostComponent::Holding, start + s, node.var_cost());
                }
            }
        }

        let carbon_per_lb = self.config.carbon_price_per_lb();
        let lanes = self.lanes.clone();
        for (l, routed) in lanes.iter().enumerate() {
            let lane = &routed.lane;
            let transport = lane.cost_per_lb_mi.unwrap_or(0.0) * routed.distance_mi;
            let carbon = lane.co2_per_lb_mi() * routed.distance_mi * carbon_per_lb;
            for s in 0..slots {
                let var = self.flow_start[l] + s;
                self.costs.add(CostComponent::Transport, var, transport);
                self.costs.add(CostComponent::Duty, var, lane.duty_rate());
                self.costs.add(CostComponent::Carbon, var, carbon);
            }
        }
    }

    fn add_shutdown(&mut self) {
        let slots = self.products.len() * self.periods.len();
        let (nodes, config) = (self.nodes, self.config);

        for (k, node) in nodes.iter().enumerate() {
            if !config.is_closed(&node.id) {
                continue;
            }
            if let Some(open) = self.open_var[k] {
                self.problem.fix_variable(format!("shutdown_{}", node.id), open, 0.0);
            }
        }

        for l in 0..self.lanes.len() {
            let lane = &self.lanes[l].lane;
            if !config.closed_nodes.iter().any(|id| lane.touches(id)) {
                continue;
            }
            for s in 0..slots {
                let var = self.flow_start[l] + s;
                let name = format!("shutdown_{}", self.problem.variables[var].name);
                self.problem.fix_variable(name, var, 0.0);
            }
        }
    }

    fn add_capacity(&mut self) {
        for (_, node) in facilities(self.nodes) {
            let Some(capacity) = node.capacity() else {
                continue;
            };
            for t in 0..self.periods.len() {
                let terms: Vec<(usize, f64)> = self
                    .lanes_into(&node.id)
                    .iter()
                    .flat_map(|&l| (0..self.products.len()).map(move |p| (l, p)))
                    .map(|(l, p)| (self.flow(l, p, t), 1.0))
                    .collect();
                self.problem.add_constraint(
                    format!("cap_{}_{}", node.id, self.periods[t]),
                    terms,
                    ConstraintOp::Le,
                    capacity,
                );
            }
        }
    }

    /// Demand records resolved to (record, product position, period position)
    fn demand_slots(&self) -> Vec<(&'a DemandRecord, usize, usize)> {
        self.demand
            .iter()
            .filter_map(|d| {
                let p = *self.product_pos.get(d.product.as_str())?;
                let t = *self.period_pos.get(&d.period)?;
                Some((d, p, t))
            })
            .collect()
    }

    fn add_demand(&mut self) {
        for (d, p, t) in self.demand_slots() {
            let terms: Vec<(usize, f64)> = self
                .lanes_into(&d.customer)
                .iter()
                .map(|&l| (self.flow(l, p, t), 1.0))
                .collect();
            self.problem.add_constraint(
                format!("demand_{}_{}_{}", d.customer, d.product, d.period),
                terms,
                ConstraintOp::Ge,
                d.quantity,
            );
        }
    }

    fn add_service_time(&mut self) {
        for (d, p, t) in self.demand_slots() {
            let terms: Vec<(usize, f64)> = self
                .lanes_into(&d.customer)
                .iter()
                .map(|&l| (self.flow(l, p, t), self.lanes[l].lane.transit_days.unwrap_or(0.0)))
                .collect();
            self.problem.add_constraint(
                format!("service_{}_{}_{}", d.customer, d.product, d.period),
                terms,
                ConstraintOp::Le,
                d.quantity * self.config.service_days,
            );
        }
    }

    /// inbound + previous inventory + production = outbound + ending inventory
    ///
    /// Production is supply: with it on the outbound side a plant could never ship.
    fn add_mass_balance(&mut self) {
        let products = self.products;
        for (k, node) in facilities(self.nodes) {
            let Some(inv) = self.inv_start[k] else {
                continue;
            };
            for (p, product) in products.iter().enumerate() {
                for t in 0..self.periods.len() {
                    let mut terms: Vec<(usize, f64)> = Vec::new();
                    terms.extend(self.lanes_into(&node.id).iter().map(|&l| (self.flow(l, p, t), 1.0)));
                    terms.extend(self.lanes_out_of(&node.id).iter().map(|&l| (self.flow(l, p, t), -1.0)));
                    if t > 0 {
                        terms.push((inv + self.slot(p, t - 1), 1.0));
                    }
                    if let Some(make) = self.make_start[k] {
                        terms.push((make + self.slot(p, t), 1.0));
                    }
                    terms.push((inv + self.slot(p, t), -1.0));

                    self.problem.add_constraint(
                        format!("balance_{}_{}_{}", node.id, product.id, self.periods[t]),
                        terms,
                        ConstraintOp::Eq,
                        0.0,
                    );
                }
            }
        }
    }

    /// ratio * parent production >= child production, per plant and period
    fn add_bom(&mut self) {
        let (nodes, products) = (self.nodes, self.products);
        for (child, product) in products.iter().enumerate() {
            let (Some(parent_id), Some(ratio)) = (&product.bom_parent, product.bom_ratio) else {
                continue;
            };
            let Some(&parent) = self.product_pos.get(parent_id.as_str()) else {
                continue;
            };
            for (k, plant) in nodes.iter().enumerate() {
                let Some(make) = self.make_start[k] else {
                    continue;
                };
                for t in 0..self.periods.len() {
                    self.problem.add_constraint(
                        format!("bom_{}_{}_{}", plant.id, product.id, self.periods[t]),
                        vec![(make + self.slot(parent, t), ratio), (make + self.slot(child, t), -1.0)],
                        ConstraintOp::Ge,
                        0.0,
                    );
                }
            }
        }
    }

    /// DC ending inventory >= fraction * outbound flow
    fn add_safety_stock(&mut self) {
        let fraction = self.config.safety_stock;
        if fraction <= 0.0 {
            return;
        }
        let products = self.products;
        for (k, node) in facilities(self.nodes) {
            if node.role != NodeRole::DistributionCenter {
                continue;
            }
            let Some(inv) = self.inv_start[k] else {
                continue;
            };
            for (p, product) in products.iter().enumerate() {
                for t in 0..self.periods.len() {
                    let mut terms = vec![(inv + self.slot(p, t), 1.0)];
                    terms.extend(
                        self.lanes_out_of(&node.id)
                            .iter()
                            .map(|&l| (self.flow(l, p, t), -fraction)),
                    );
                    self.problem.add_constraint(
                        format!("safety_{}_{}_{}", node.id, product.id, self.periods[t]),
                        terms,
                        ConstraintOp::Ge,
                        0.0,
                    );
                }
            }
        }
    }

    fn finish(mut self) -> Formulation {
        let coefficients = self.costs.coefficients(self.problem.num_variables());
        self.problem.set_objective(coefficients, true);
        Formulation {
            problem: self.problem,
            variables: self.variables,
            costs: self.costs,
            periods: self.periods,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ScenarioError;
    use crate::network::Lane;

    struct Fixture {
        nodes: Vec<Node>,
        lanes: Vec<Lane>,
        demand: Vec<DemandRecord>,
        products: Vec<Product>,
    }

    impl Fixture {
        fn small() -> Self {
            Self {
                nodes: vec![
                    Node::new("P1", NodeRole::Plant, 30.0, -90.0).with_var_cost(0.5),
                    Node::new("D1", NodeRole::DistributionCenter, 31.0, -90.0)
                        .with_fixed_cost(5000.0)
                        .with_var_cost(0.1)
                        .with_capacity(800.0),
                    Node::new("C1", NodeRole::Customer, 32.0, -90.0),
                ],
                lanes: vec![
                    Lane::new("P1", "D1", 0.01, 2.0).with_duty_rate(0.05),
                    Lane::new("D1", "C1", 0.02, 1.0).with_co2(0.001),
                ],
                demand: vec![
                    DemandRecord::new("C1", "Widget", 2, 300.0),
                    DemandRecord::new("C1", "Widget", 1, 200.0),
                ],
                products: vec![Product::new("Widget"), Product::new("Gadget")],
            }
        }

        fn build(&self, config: &ScenarioConfig) -> Result<Formulation, BuildError> {
            let table = LaneTable::build(&self.nodes, &self.lanes)?;
            build(&self.nodes, &self.demand, &table, &self.products, config)
        }
    }

    fn constraint<'f>(f: &'f Formulation, name: &str) -> &'f netopt_solver::Constraint {
        f.problem
            .constraints
            .iter()
            .find(|c| c.name == name)
            .unwrap_or_else(|| panic!("no constraint named {}", name))
    }

    #[test]
    fn test_variable_groups() {
        let f = Fixture::small().build(&ScenarioConfig::default()).unwrap();

        assert_eq!(f.periods, vec![1, 2]);
        assert_eq!(f.variables.open.len(), 1);
        // 2 lanes x 2 products x 2 periods
        assert_eq!(f.variables.flow.len(), 8);
        // 1 plant x 2 x 2
        assert_eq!(f.variables.make.len(), 4);
        // plant + DC
        assert_eq!(f.variables.inventory.len(), 8);
        assert_eq!(f.variables.len(), f.problem.num_variables());
        assert_eq!(f.problem.num_binaries(), 1);

        let open = f.variables.open["D1"];
        assert_eq!(f.problem.variables[open].name, "Open_D1");
        let flow = f.variables.flow[&("P1".to_string(), "D1".to_string(), "Gadget".to_string(), 2)];
        assert_eq!(f.problem.variables[flow].name, "F_P1_D1_Gadget_2");

        for name in VariableGroups::NAMES {
            assert!(f.variables.group(name).is_some());
        }
        assert!(f.variables.group("bogus").is_none());
    }

    #[test]
    fn test_objective_terms() {
        let fixture = Fixture::small();
        let config = ScenarioConfig::default().with_carbon_price(2204.62);
        let f = fixture.build(&config).unwrap();
        let table = LaneTable::build(&fixture.nodes, &fixture.lanes).unwrap();
        let p1_d1 = table.get("P1", "D1").unwrap().distance_mi;
        let d1_c1 = table.get("D1", "C1").unwrap().distance_mi;

        let key = |from: &str, to: &str| (from.to_string(), to.to_string(), "Widget".to_string(), 1);
        let inbound = f.variables.flow[&key("P1", "D1")];
        let outbound = f.variables.flow[&key("D1", "C1")];
        let open = f.variables.open["D1"];
        let make = f.variables.make[&("P1".to_string(), "Widget".to_string(), 1)];
        let held = f.variables.inventory[&("D1".to_string(), "Widget".to_string(), 1)];

        let coef = &f.problem.objective.coefficients;
        assert!(f.problem.objective.minimize);
        assert!((coef[inbound] - (0.01 * p1_d1 + 0.05)).abs() < 1e-9);
        // $1/lb of CO2 at this carbon price
        assert!((coef[outbound] - (0.02 * d1_c1 + 0.001 * d1_c1)).abs() < 1e-9);
        assert_eq!(coef[open], 5000.0);
        assert_eq!(coef[make], 0.5);
        assert_eq!(coef[held], 0.1);

        let mut values = vec![0.0; f.problem.num_variables()];
        values[outbound] = 100.0;
        let breakdown = f.costs.breakdown(&values);
        assert!((breakdown.get(CostComponent::Transport) - 2.0 * d1_c1).abs() < 1e-9);
        assert!((breakdown.get(CostComponent::Carbon) - 0.1 * d1_c1).abs() < 1e-9);
        assert_eq!(breakdown.get(CostComponent::Duty), 0.0);
    }

    #[test]
    fn test_capacity_covers_all_products() {
        let f = Fixture::small().build(&ScenarioConfig::default()).unwrap();
        let cap = constraint(&f, "cap_D1_1");
        assert_eq!(cap.op, ConstraintOp::Le);
        assert_eq!(cap.rhs, 800.0);
        assert_eq!(cap.terms.len(), 2);
        // Nodes without capacity get no row
        assert!(f.problem.constraints.iter().all(|c| !c.name.starts_with("cap_P1")));
    }

    #[test]
    fn test_demand_and_service_rows() {
        let f = Fixture::small().build(&ScenarioConfig::default().with_service_days(3.0)).unwrap();

        let demand = constraint(&f, "demand_C1_Widget_2");
        assert_eq!(demand.op, ConstraintOp::Ge);
        assert_eq!(demand.rhs, 300.0);

        let service = constraint(&f, "service_C1_Widget_2");
        assert_eq!(service.op, ConstraintOp::Le);
        assert_eq!(service.rhs, 900.0);
        assert_eq!(service.terms.len(), 1);
        assert_eq!(service.terms[0].1, 1.0);
    }

    #[test]
    fn test_mass_balance_links_periods() {
        let f = Fixture::small().build(&ScenarioConfig::default()).unwrap();

        let first = constraint(&f, "balance_D1_Widget_1");
        // inbound, outbound, ending inventory
        assert_eq!(first.terms.len(), 3);
        let later = constraint(&f, "balance_D1_Widget_2");
        assert_eq!(later.terms.len(), 4);
        let prev = f.variables.inventory[&("D1".to_string(), "Widget".to_string(), 1)];
        assert!(later.terms.contains(&(prev, 1.0)));

        let plant = constraint(&f, "balance_P1_Widget_1");
        let make = f.variables.make[&("P1".to_string(), "Widget".to_string(), 1)];
        assert!(plant.terms.contains(&(make, 1.0)));
    }

    #[test]
    fn test_shutdown_fixes_open_and_flows() {
        let f = Fixture::small()
            .build(&ScenarioConfig::default().with_closed_node("D1"))
            .unwrap();

        let open = constraint(&f, "shutdown_D1");
        assert_eq!(open.op, ConstraintOp::Eq);
        assert_eq!(open.rhs, 0.0);
        let fixed = f
            .problem
            .constraints
            .iter()
            .filter(|c| c.name.starts_with("shutdown_F_"))
            .count();
        // Both lanes touch D1: 2 lanes x 2 products x 2 periods
        assert_eq!(fixed, 8);
    }

    #[test]
    fn test_shutdown_fixes_each_flow_once() {
        let config = ScenarioConfig::default().with_closed_node("P1").with_closed_node("C1");
        let f = Fixture::small().build(&config).unwrap();

        let names: Vec<&str> = f
            .problem
            .constraints
            .iter()
            .filter(|c| c.name.starts_with("shutdown_"))
            .map(|c| c.name.as_str())
            .collect();
        // P1 and C1 carry no opening decision; each lane touches one closed node
        assert_eq!(names.len(), 8);
        let unique: HashSet<&str> = names.iter().copied().collect();
        assert_eq!(unique.len(), names.len());
        assert!(!names.contains(&"shutdown_D1"));
    }

    #[test]
    fn test_bom_rows() {
        let mut fixture = Fixture::small();
        fixture.products = vec![Product::new("Resin"), Product::new("Widget").with_bom("Resin", 0.5)];
        let f = fixture.build(&ScenarioConfig::default()).unwrap();

        let bom = constraint(&f, "bom_P1_Widget_1");
        let parent = f.variables.make[&("P1".to_string(), "Resin".to_string(), 1)];
        let child = f.variables.make[&("P1".to_string(), "Widget".to_string(), 1)];
        assert_eq!(bom.op, ConstraintOp::Ge);
        assert_eq!(bom.terms, vec![(parent, 0.5), (child, -1.0)]);
    }

    #[test]
    fn test_safety_stock_rows_only_when_requested() {
        let fixture = Fixture::small();
        let plain = fixture.build(&ScenarioConfig::default()).unwrap();
        assert!(plain.problem.constraints.iter().all(|c| !c.name.starts_with("safety_")));

        let buffered = fixture.build(&ScenarioConfig::default().with_safety_stock(0.1)).unwrap();
        let row = constraint(&buffered, "safety_D1_Widget_1");
        assert_eq!(row.op, ConstraintOp::Ge);
        assert_eq!(row.terms.len(), 2);
        assert_eq!(row.terms[1].1, -0.1);
    }

    #[test]
    fn test_rejects_unknown_demand_targets() {
        let mut fixture = Fixture::small();
        fixture.demand.push(DemandRecord::new("C9", "Widget", 1, 10.0));
        assert_eq!(
            fixture.build(&ScenarioConfig::default()).unwrap_err(),
            BuildError::Data(DataError::UnknownCustomer("C9".to_string()))
        );

        let mut fixture = Fixture::small();
        // A DC is not a customer
        fixture.demand.push(DemandRecord::new("D1", "Widget", 1, 10.0));
        assert!(matches!(
            fixture.build(&ScenarioConfig::default()),
            Err(BuildError::Data(DataError::UnknownCustomer(_)))
        ));

        let mut fixture = Fixture::small();
        fixture.demand.push(DemandRecord::new("C1", "Gizmo", 1, 10.0));
        assert_eq!(
            fixture.build(&ScenarioConfig::default()).unwrap_err(),
            BuildError::Data(DataError::UnknownProduct("Gizmo".to_string()))
        );
    }

    #[test]
    fn test_rejects_negative_demand() {
        let mut fixture = Fixture::small();
        fixture.demand.push(DemandRecord::new("C1", "Widget", 3, -1.0));
        assert!(matches!(
            fixture.build(&ScenarioConfig::default()),
            Err(BuildError::Data(DataError::NegativeDemand { .. }))
        ));
    }

    #[test]
    fn test_rejects_lane_without_rate() {
        let mut fixture = Fixture::small();
        fixture.lanes[1].cost_per_lb_mi = None;
        assert_eq!(
            fixture.build(&ScenarioConfig::default()).unwrap_err(),
            BuildError::Data(DataError::MissingLaneRate {
                from: "D1".to_string(),
                to: "C1".to_string(),
                column: "Cost_per_lb_mi",
            })
        );

        let mut fixture = Fixture::small();
        fixture.lanes[0].transit_days = None;
        assert!(matches!(
            fixture.build(&ScenarioConfig::default()),
            Err(BuildError::Data(DataError::MissingLaneRate { column: "TransitDays", .. }))
        ));
    }

    #[test]
    fn test_rejects_invalid_bom() {
        let mut fixture = Fixture::small();
        fixture.products = vec![Product::new("Widget").with_bom("Resin", 0.5)];
        assert!(matches!(
            fixture.build(&ScenarioConfig::default()),
            Err(BuildError::Data(DataError::InvalidBom { .. }))
        ));

        let mut fixture = Fixture::small();
        fixture.products = vec![Product::new("Resin"), Product::new("Widget").with_bom("Resin", 0.0)];
        assert!(matches!(
            fixture.build(&ScenarioConfig::default()),
            Err(BuildError::Data(DataError::InvalidBom { .. }))
        ));
    }

    #[test]
    fn test_rejects_duplicates() {
        let mut fixture = Fixture::small();
        fixture.nodes.push(Node::new("C1", NodeRole::Customer, 0.0, 0.0));
        assert_eq!(
            fixture.build(&ScenarioConfig::default()).unwrap_err(),
            BuildError::Data(DataError::DuplicateNode("C1".to_string()))
        );

        let mut fixture = Fixture::small();
        fixture.products.push(Product::new("Widget"));
        assert_eq!(
            fixture.build(&ScenarioConfig::default()).unwrap_err(),
            BuildError::Data(DataError::DuplicateProduct("Widget".to_string()))
        );
    }

    #[test]
    fn test_rejects_bad_scenario() {
        let fixture = Fixture::small();
        assert_eq!(
            fixture.build(&ScenarioConfig::default().with_service_days(0.0)).unwrap_err(),
            BuildError::Scenario(ScenarioError::InvalidServiceDays(0.0))
        );
        assert_eq!(
            fixture.build(&ScenarioConfig::default().with_closed_node("X")).unwrap_err(),
            BuildError::Scenario(ScenarioError::UnknownClosedNode("X".to_string()))
        );
    }
}
