/// Role a node plays in the network. Each node has exactly one.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NodeRole {
    Supplier,
    Plant,
    #[cfg_attr(feature = "serde", serde(rename = "DC", alias = "DistributionCenter"))]
    DistributionCenter,
    Customer,
}

impl NodeRole {
    /// Plants and DCs hold inventory and take part in mass balance
    pub fn is_facility(&self) -> bool {
        matches!(self, NodeRole::Plant | NodeRole::DistributionCenter)
    }
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    #[cfg_attr(feature = "serde", serde(rename = "NodeID"))]
    pub id: String,
    #[cfg_attr(feature = "serde", serde(rename = "Type"))]
    pub role: NodeRole,
    #[cfg_attr(feature = "serde", serde(rename = "Latitude"))]
    pub latitude: f64,
    #[cfg_attr(feature = "serde", serde(rename = "Longitude"))]
    pub longitude: f64,
    #[cfg_attr(feature = "serde", serde(rename = "FixedCost", default))]
    pub fixed_cost: Option<f64>,
    /// Per-lb cost applied to production at plants and to held inventory
    #[cfg_attr(feature = "serde", serde(rename = "VarCost_per_lb", default))]
    pub var_cost: Option<f64>,
    /// Inbound lbs per period
    #[cfg_attr(feature = "serde", serde(rename = "Cap_Lbs_Per_Period", default))]
    pub capacity: Option<f64>,
}

impl Node {
    pub fn new(id: impl Into<String>, role: NodeRole, latitude: f64, longitude: f64) -> Self {
        Self {
            id: id.into(),
            role,
            latitude,
            longitude,
            fixed_cost: None,
            var_cost: None,
            capacity: None,
        }
    }

    pub fn with_fixed_cost(mut self, cost: f64) -> Self {
        self.fixed_cost = Some(cost);
        self
    }

    pub fn with_var_cost(mut self, cost: f64) -> Self {
        self.var_cost = Some(cost);
        self
    }

    pub fn with_capacity(mut self, capacity: f64) -> Self {
        self.capacity = Some(capacity);
        self
    }

    /// Fixed opening cost; zero when not given or when the role has no opening decision
    pub fn fixed_cost(&self) -> f64 {
        match self.role {
            NodeRole::DistributionCenter => self.fixed_cost.unwrap_or(0.0),
            _ => 0.0,
        }
    }

    pub fn var_cost(&self) -> f64 {
        self.var_cost.unwrap_or(0.0)
    }

    /// Capacity only binds plants and DCs
    pub fn capacity(&self) -> Option<f64> {
        if self.role.is_facility() {
            self.capacity
        } else {
            None
        }
    }
}

/// A directed lane as it arrives from the lane table, before distance is attached
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Lane {
    #[cfg_attr(feature = "serde", serde(rename = "FromNode"))]
    pub from: String,
    #[cfg_attr(feature = "serde", serde(rename = "ToNode"))]
    pub to: String,
    /// $ per lb per road mile
    #[cfg_attr(feature = "serde", serde(rename = "Cost_per_lb_mi", default))]
    pub cost_per_lb_mi: Option<f64>,
    /// $ per lb shipped
    #[cfg_attr(feature = "serde", serde(rename = "DutyRate", default))]
    pub duty_rate: Option<f64>,
    /// lb CO2 per lb per road mile
    #[cfg_attr(feature = "serde", serde(rename = "CO2_per_lb_mi", default))]
    pub co2_per_lb_mi: Option<f64>,
    #[cfg_attr(feature = "serde", serde(rename = "TransitDays", default))]
    pub transit_days: Option<f64>,
}

impl Lane {
    pub fn new(from: impl Into<String>, to: impl Into<String>, cost_per_lb_mi: f64, transit_days: f64) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            cost_per_lb_mi: Some(cost_per_lb_mi),
            duty_rate: None,
            co2_per_lb_mi: None,
            transit_days: Some(transit_days),
        }
    }

    pub fn with_duty_rate(mut self, rate: f64) -> Self {
        self.duty_rate = Some(rate);
        self
    }

    pub fn with_co2(mut self, per_lb_mi: f64) -> Self {
        self.co2_per_lb_mi = Some(per_lb_mi);
        self
    }

    pub fn duty_rate(&self) -> f64 {
        self.duty_rate.unwrap_or(0.0)
    }

    pub fn co2_per_lb_mi(&self) -> f64 {
        self.co2_per_lb_mi.unwrap_or(0.0)
    }

    pub fn key(&self) -> (String, String) {
        (self.from.clone(), self.to.clone())
    }

    pub fn touches(&self, node: &str) -> bool {
        self.from == node || self.to == node
    }
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    #[cfg_attr(feature = "serde", serde(rename = "ProductID"))]
    pub id: String,
    /// Parent product whose production bounds this one
    #[cfg_attr(feature = "serde", serde(rename = "BOM_Component", default))]
    pub bom_parent: Option<String>,
    #[cfg_attr(feature = "serde", serde(rename = "InputLB_per_OutputLB", default))]
    pub bom_ratio: Option<f64>,
}

impl Product {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            bom_parent: None,
            bom_ratio: None,
        }
    }

    pub fn with_bom(mut self, parent: impl Into<String>, ratio: f64) -> Self {
        self.bom_parent = Some(parent.into());
        self.bom_ratio = Some(ratio);
        self
    }
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct DemandRecord {
    #[cfg_attr(feature = "serde", serde(rename = "CustomerID"))]
    pub customer: String,
    #[cfg_attr(feature = "serde", serde(rename = "ProductID"))]
    pub product: String,
    #[cfg_attr(feature = "serde", serde(rename = "Period"))]
    pub period: u32,
    #[cfg_attr(feature = "serde", serde(rename = "DemandLbs"))]
    pub quantity: f64,
}

impl DemandRecord {
    pub fn new(customer: impl Into<String>, product: impl Into<String>, period: u32, quantity: f64) -> Self {
        Self {
            customer: customer.into(),
            product: product.into(),
            period,
            quantity,
        }
    }
}

/// The four input tables of one scenario
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Network {
    pub nodes: Vec<Node>,
    pub lanes: Vec<Lane>,
    pub demand: Vec<DemandRecord>,
    pub products: Vec<Product>,
}

impl Network {
    pub fn count_role(&self, role: NodeRole) -> usize {
        self.nodes.iter().filter(|n| n.role == role).count()
    }
}
