use netopt_solver::SolutionStatus;
use thiserror::Error;

/// Problems with the input tables
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DataError {
    #[error("Lane {from} -> {to} references unknown node {node}")]
    MissingNodeReference { from: String, to: String, node: String },
    #[error("Duplicate lane {from} -> {to}")]
    DuplicateLane { from: String, to: String },
    #[error("Duplicate node: {0}")]
    DuplicateNode(String),
    #[error("Duplicate product: {0}")]
    DuplicateProduct(String),
    #[error("Demand references unknown customer: {0}")]
    UnknownCustomer(String),
    #[error("Demand references unknown product: {0}")]
    UnknownProduct(String),
    #[error("Negative demand {quantity} for {customer}/{product} in period {period}")]
    NegativeDemand {
        customer: String,
        product: String,
        period: u32,
        quantity: f64,
    },
    #[error("Lane {from} -> {to} is missing {column}")]
    MissingLaneRate {
        from: String,
        to: String,
        column: &'static str,
    },
    #[error("Invalid bill of materials for {product}: {reason}")]
    InvalidBom { product: String, reason: String },
}

/// Problems with the scenario parameters
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScenarioError {
    #[error("Service days must be positive, got {0}")]
    InvalidServiceDays(f64),
    #[error("Carbon price must be a non-negative number, got {0}")]
    InvalidCarbonPrice(f64),
    #[error("Safety stock fraction must be within [0, 1], got {0}")]
    InvalidSafetyStock(f64),
    #[error("Closed node is not in the node table: {0}")]
    UnknownClosedNode(String),
}

/// Any reason a scenario cannot be turned into a formulation. Raised before
/// the solver is ever invoked.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BuildError {
    #[error(transparent)]
    Data(#[from] DataError),
    #[error(transparent)]
    Scenario(#[from] ScenarioError),
}

/// A solve that ended without a proven optimum. Carries the status verbatim.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Solver ended with status: {0}")]
pub struct SolverStatusError(pub SolutionStatus);

/// Failure of the full load-build-solve pipeline
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
    #[error(transparent)]
    Build(#[from] BuildError),
    #[error(transparent)]
    Solver(#[from] SolverStatusError),
}

impl From<DataError> for PipelineError {
    fn from(e: DataError) -> Self {
        PipelineError::Build(e.into())
    }
}

impl PipelineError {
    /// Terminal solver status, if the pipeline got as far as solving
    pub fn status(&self) -> Option<SolutionStatus> {
        match self {
            PipelineError::Solver(SolverStatusError(status)) => Some(*status),
            PipelineError::Build(_) => None,
        }
    }
}
