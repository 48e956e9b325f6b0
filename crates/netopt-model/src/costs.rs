use std::collections::BTreeMap;
use std::fmt;

/// Named parts of the objective
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CostComponent {
    Production,
    Fixed,
    Holding,
    Transport,
    Duty,
    Carbon,
}

impl CostComponent {
    pub const ALL: [CostComponent; 6] = [
        CostComponent::Production,
        CostComponent::Fixed,
        CostComponent::Holding,
        CostComponent::Transport,
        CostComponent::Duty,
        CostComponent::Carbon,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CostComponent::Production => "production",
            CostComponent::Fixed => "fixed",
            CostComponent::Holding => "holding",
            CostComponent::Transport => "transport",
            CostComponent::Duty => "duty",
            CostComponent::Carbon => "carbon",
        }
    }
}

impl fmt::Display for CostComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Objective accumulated per component as sparse (variable, coefficient) terms.
/// Each component can be evaluated on its own against a solution.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CostTerms {
    terms: BTreeMap<CostComponent, Vec<(usize, f64)>>,
}

impl CostTerms {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `coefficient * var` to a component. Zero coefficients are dropped.
    pub fn add(&mut self, component: CostComponent, var: usize, coefficient: f64) {
        if coefficient != 0.0 {
            self.terms.entry(component).or_default().push((var, coefficient));
        }
    }

    pub fn terms(&self, component: CostComponent) -> &[(usize, f64)] {
        self.terms.get(&component).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Dense objective vector summing every component
    pub fn coefficients(&self, num_variables: usize) -> Vec<f64> {
        let mut coefficients = vec![0.0; num_variables];
        for &(var, coef) in self.terms.values().flatten() {
            coefficients[var] += coef;
        }
        coefficients
    }

    pub fn evaluate(&self, component: CostComponent, values: &[f64]) -> f64 {
        self.terms(component)
            .iter()
            .map(|&(var, coef)| coef * values.get(var).copied().unwrap_or(0.0))
            .sum()
    }

    pub fn breakdown(&self, values: &[f64]) -> CostBreakdown {
        CostBreakdown {
            components: CostComponent::ALL
                .iter()
                .map(|&c| (c, self.evaluate(c, values)))
                .collect(),
        }
    }
}

/// Realized cost of each component
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CostBreakdown {
    pub components: BTreeMap<CostComponent, f64>,
}

impl CostBreakdown {
    pub fn get(&self, component: CostComponent) -> f64 {
        self.components.get(&component).copied().unwrap_or(0.0)
    }

    pub fn total(&self) -> f64 {
        self.components.values().sum()
    }
}
