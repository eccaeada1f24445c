//! River map data

use crate::error::{NavigationError, Result};
use rio_math::Vec2;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Kind of place a node represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeType {
    Start,
    Settlement,
    Junction,
    Landmark,
    Destination,
    Waypoint,
}

/// Segment difficulty rating
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Difficulty {
    #[default]
    Easy,
    Medium,
    Hard,
    Extreme,
}

/// Landscape a segment flows through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Biome {
    #[default]
    RiverMain,
    RiverTributary,
    Rapids,
    JungleDeep,
    Floodplain,
    Delta,
}

/// A place on the river
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapNode {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    /// Position on the overview map
    #[serde(default)]
    pub coordinates: Vec2,
    /// Era this node is limited to, if any
    #[serde(default)]
    pub era_restriction: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub has_settlement: bool,
    #[serde(default)]
    pub has_trade: bool,
}

/// A directed stretch of river between two nodes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiverSegment {
    pub id: String,
    pub from: String,
    pub to: String,
    /// Length in distance units
    pub distance: f32,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(default)]
    pub biome: Biome,
    /// Current strength
    #[serde(default)]
    pub current_speed: f32,
    /// Current direction in screen space (downstream is `+y`)
    #[serde(default = "downstream")]
    pub current_direction: Vec2,
    #[serde(default)]
    pub hazards: Vec<String>,
}

fn downstream() -> Vec2 {
    Vec2::Y
}

impl RiverSegment {
    /// Current direction scaled by speed
    pub fn flow(&self) -> Vec2 {
        self.current_direction * self.current_speed
    }
}

/// The directed river graph
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MapGraph {
    #[serde(default)]
    pub name: String,
    pub nodes: Vec<MapNode>,
    pub segments: Vec<RiverSegment>,
}

impl MapGraph {
    pub fn new(nodes: Vec<MapNode>, segments: Vec<RiverSegment>) -> Self {
        Self {
            name: String::new(),
            nodes,
            segments,
        }
    }

    pub fn node(&self, id: &str) -> Option<&MapNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn segment(&self, id: &str) -> Option<&RiverSegment> {
        self.segments.iter().find(|s| s.id == id)
    }

    /// Segments leaving `node_id`, in declaration order
    pub fn outgoing(&self, node_id: &str) -> Vec<&RiverSegment> {
        self.segments.iter().filter(|s| s.from == node_id).collect()
    }

    /// Segments arriving at `node_id`, in declaration order
    pub fn incoming(&self, node_id: &str) -> Vec<&RiverSegment> {
        self.segments.iter().filter(|s| s.to == node_id).collect()
    }

    /// The directed segment from `from` to `to`, if one exists
    pub fn segment_between(&self, from: &str, to: &str) -> Option<&RiverSegment> {
        self.segments.iter().find(|s| s.from == from && s.to == to)
    }

    /// A node is a fork iff more than one segment departs from it
    pub fn is_fork(&self, node_id: &str) -> bool {
        self.segments.iter().filter(|s| s.from == node_id).count() > 1
    }

    /// Reject duplicate ids, dangling endpoints and non-positive lengths.
    pub fn validate(&self) -> Result<()> {
        let mut node_ids = HashSet::new();
        for node in &self.nodes {
            if !node_ids.insert(node.id.as_str()) {
                return Err(NavigationError::InvalidMap(format!("duplicate node {}", node.id)));
            }
        }

        let mut segment_ids = HashSet::new();
        for segment in &self.segments {
            if !segment_ids.insert(segment.id.as_str()) {
                return Err(NavigationError::InvalidMap(format!(
                    "duplicate segment {}",
                    segment.id
                )));
            }
            for end in [&segment.from, &segment.to] {
                if !node_ids.contains(end.as_str()) {
                    return Err(NavigationError::InvalidMap(format!(
                        "segment {} references unknown node {}",
                        segment.id, end
                    )));
                }
            }
            if segment.distance.is_nan() || segment.distance <= 0.0 {
                return Err(NavigationError::InvalidMap(format!(
                    "segment {} has non-positive distance",
                    segment.id
                )));
            }
        }

        Ok(())
    }
}
