use std::collections::{BTreeMap, HashMap};

use crate::distance::road_distance;
use crate::error::DataError;
use crate::network::{Lane, Node};

/// A lane with its road distance attached
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct RoutedLane {
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub lane: Lane,
    #[cfg_attr(feature = "serde", serde(rename = "Dist_mi"))]
    pub distance_mi: f64,
}

/// Lanes keyed by (origin, destination), iterated in key order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LaneTable {
    lanes: BTreeMap<(String, String), RoutedLane>,
}

impl LaneTable {
    /// Attach road distance to every lane.
    ///
    /// Fails on a lane whose endpoint is not in `nodes` or on a repeated
    /// (origin, destination) pair.
    pub fn build(nodes: &[Node], lanes: &[Lane]) -> Result<Self, DataError> {
        let coords: HashMap<&str, (f64, f64)> = nodes
            .iter()
            .map(|n| (n.id.as_str(), (n.longitude, n.latitude)))
            .collect();

        let lookup = |lane: &Lane, id: &str| {
            coords.get(id).copied().ok_or_else(|| DataError::MissingNodeReference {
                from: lane.from.clone(),
                to: lane.to.clone(),
                node: id.to_string(),
            })
        };

        let mut table = BTreeMap::new();
        for lane in lanes {
            let (lon1, lat1) = lookup(lane, &lane.from)?;
            let (lon2, lat2) = lookup(lane, &lane.to)?;

            let routed = RoutedLane {
                lane: lane.clone(),
                distance_mi: road_distance(lon1, lat1, lon2, lat2),
            };
            if table.insert(lane.key(), routed).is_some() {
                return Err(DataError::DuplicateLane {
                    from: lane.from.clone(),
                    to: lane.to.clone(),
                });
            }
        }

        log::debug!("prepared {} lanes", table.len());
        Ok(Self { lanes: table })
    }

    pub fn get(&self, from: &str, to: &str) -> Option<&RoutedLane> {
        self.lanes.get(&(from.to_string(), to.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &RoutedLane> {
        self.lanes.values()
    }

    /// Lanes ending at `node`
    pub fn inbound<'a>(&'a self, node: &'a str) -> impl Iterator<Item = &'a RoutedLane> + 'a {
        self.iter().filter(move |l| l.lane.to == node)
    }

    /// Lanes starting at `node`
    pub fn outbound<'a>(&'a self, node: &'a str) -> impl Iterator<Item = &'a RoutedLane> + 'a {
        self.iter().filter(move |l| l.lane.from == node)
    }

    pub fn len(&self) -> usize {
        self.lanes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lanes.is_empty()
    }
}
