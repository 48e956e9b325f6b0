pub mod config;
pub mod costs;
pub mod distance;
pub mod error;
pub mod extract;
pub mod lanes;
pub mod model;
pub mod network;
pub mod pipeline;
pub mod solve;

pub use config::ScenarioConfig;
pub use costs::{CostBreakdown, CostComponent, CostTerms};
pub use distance::{ROAD_FACTOR, haversine, road_distance};
pub use error::{BuildError, DataError, PipelineError, ScenarioError, SolverStatusError};
pub use extract::{FLOW_EPSILON, FlowRecord, NetworkPlan, OPEN_THRESHOLD, StockRecord, extract};
pub use lanes::{LaneTable, RoutedLane};
pub use model::{FlowKey, Formulation, StockKey, VariableGroups, build};
pub use network::{DemandRecord, Lane, Network, Node, NodeRole, Product};
pub use pipeline::{optimize, optimize_with};
pub use solve::{Oracle, solve};
