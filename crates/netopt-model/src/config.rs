use std::collections::BTreeSet;

use crate::error::ScenarioError;
use crate::network::Node;

/// Pounds in a metric ton, for converting carbon prices quoted per ton
pub const LBS_PER_TON: f64 = 2204.62;

/// Parameters of one scenario run
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioConfig {
    /// Upper bound on demand-weighted transit days into each customer
    pub service_days: f64,
    /// $ per metric ton of CO2
    pub carbon_price: f64,
    /// Minimum DC ending inventory as a fraction of that period's outbound flow
    pub safety_stock: f64,
    /// Nodes that may not ship or receive anything
    pub closed_nodes: BTreeSet<String>,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            service_days: 7.0,
            carbon_price: 0.0,
            safety_stock: 0.0,
            closed_nodes: BTreeSet::new(),
        }
    }
}

impl ScenarioConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_service_days(mut self, days: f64) -> Self {
        self.service_days = days;
        self
    }

    pub fn with_carbon_price(mut self, price: f64) -> Self {
        self.carbon_price = price;
        self
    }

    pub fn with_safety_stock(mut self, fraction: f64) -> Self {
        self.safety_stock = fraction;
        self
    }

    pub fn with_closed_node(mut self, id: impl Into<String>) -> Self {
        self.closed_nodes.insert(id.into());
        self
    }

    pub fn is_closed(&self, id: &str) -> bool {
        self.closed_nodes.contains(id)
    }

    /// Carbon cost per lb of CO2
    pub fn carbon_price_per_lb(&self) -> f64 {
        self.carbon_price / LBS_PER_TON
    }

    pub fn validate(&self, nodes: &[Node]) -> Result<(), ScenarioError> {
        if !(self.service_days.is_finite() && self.service_days > 0.0) {
            return Err(ScenarioError::InvalidServiceDays(self.service_days));
        }
        if !(self.carbon_price.is_finite() && self.carbon_price >= 0.0) {
            return Err(ScenarioError::InvalidCarbonPrice(self.carbon_price));
        }
        if !(0.0..=1.0).contains(&self.safety_stock) {
            return Err(ScenarioError::InvalidSafetyStock(self.safety_stock));
        }
        if let Some(unknown) = self
            .closed_nodes
            .iter()
            .find(|id| !nodes.iter().any(|n| &n.id == *id))
        {
            return Err(ScenarioError::UnknownClosedNode(unknown.clone()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::NodeRole;

    #[test]
    fn test_defaults_are_valid() {
        let config = ScenarioConfig::default();
        assert_eq!(config.service_days, 7.0);
        assert!(config.validate(&[]).is_ok());
    }

    #[test]
    fn test_rejects_non_positive_service_days() {
        for days in [0.0, -3.0, f64::NAN] {
            let config = ScenarioConfig::new().with_service_days(days);
            assert!(matches!(
                config.validate(&[]),
                Err(ScenarioError::InvalidServiceDays(_))
            ));
        }
    }

    #[test]
    fn test_rejects_negative_carbon_price() {
        let config = ScenarioConfig::new().with_carbon_price(-1.0);
        assert_eq!(config.validate(&[]), Err(ScenarioError::InvalidCarbonPrice(-1.0)));
    }

    #[test]
    fn test_rejects_safety_stock_out_of_range() {
        let config = ScenarioConfig::new().with_safety_stock(1.5);
        assert_eq!(config.validate(&[]), Err(ScenarioError::InvalidSafetyStock(1.5)));
    }

    #[test]
    fn test_closed_node_must_exist() {
        let nodes = vec![Node::new("D1", NodeRole::DistributionCenter, 0.0, 0.0)];
        let ok = ScenarioConfig::new().with_closed_node("D1");
        assert!(ok.validate(&nodes).is_ok());
        assert!(ok.is_closed("D1"));

        let bad = ScenarioConfig::new().with_closed_node("D9");
        assert_eq!(
            bad.validate(&nodes),
            Err(ScenarioError::UnknownClosedNode("D9".to_string()))
        );
    }

    #[test]
    fn test_carbon_price_per_lb() {
        let config = ScenarioConfig::new().with_carbon_price(LBS_PER_TON);
        assert!((config.carbon_price_per_lb() - 1.0).abs() < 1e-12);
    }
}
