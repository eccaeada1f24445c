//! Navigation state machine

use crate::error::{NavigationError, Result};
use crate::map::{MapGraph, MapNode, RiverSegment};
use crate::state::{ForkChoice, ForkDirection, NavigationState};
use rio_math::Vec2;

/// Remaining distance on a segment at which the fork ahead is published
pub const FORK_DECISION_DISTANCE: f32 = 200.0;

/// What changed during one [`NavigationManager::update`] call
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NavigationUpdate {
    /// Node reached during this update
    pub arrived_at: Option<String>,
    /// A fork list was published during this update
    pub fork_published: bool,
}

/// Walks the river graph.
///
/// Owns the graph and a single [`NavigationState`]. Distance is fed in by the
/// caller every tick; arrival and fork publication are reported in the
/// returned [`NavigationUpdate`] rather than polled.
#[derive(Debug, Clone)]
pub struct NavigationManager {
    graph: MapGraph,
    state: NavigationState,
    upcoming_fork: Option<Vec<ForkChoice>>,
    /// Fork choice made before reaching the fork node
    decided: Option<ForkChoice>,
    /// The node ahead was already examined on this approach
    fork_checked: bool,
    fork_lookahead: f32,
}

impl NavigationManager {
    /// Create a manager positioned at `start_node_id`
    pub fn new(graph: MapGraph, start_node_id: &str) -> Result<Self> {
        graph.validate()?;
        if graph.node(start_node_id).is_none() {
            return Err(NavigationError::UnknownNode(start_node_id.to_string()));
        }

        Ok(Self {
            graph,
            state: NavigationState::at_node(start_node_id),
            upcoming_fork: None,
            decided: None,
            fork_checked: false,
            fork_lookahead: FORK_DECISION_DISTANCE,
        })
    }

    /// Override the fork look-ahead distance
    pub fn with_fork_lookahead(mut self, distance: f32) -> Self {
        self.fork_lookahead = distance.max(0.0);
        self
    }

    /// Start traveling along the segment from the current node to `node_id`.
    ///
    /// Mid-travel this restarts from the current node on the new segment.
    pub fn set_target(&mut self, node_id: &str) -> Result<()> {
        if self.graph.node(node_id).is_none() {
            log::error!("Target node not found: {}", node_id);
            return Err(NavigationError::UnknownNode(node_id.to_string()));
        }
        let Some(segment) = self.graph.segment_between(&self.state.current_node_id, node_id) else {
            log::error!("No direct segment from {} to {}", self.state.current_node_id, node_id);
            return Err(NavigationError::Unreachable {
                from: self.state.current_node_id.clone(),
                to: node_id.to_string(),
            });
        };

        if let Some(previous) = &self.state.target_node_id {
            log::info!("Retargeting from {} to {}", previous, node_id);
        }
        self.state.target_node_id = Some(node_id.to_string());
        self.state.current_segment_id = Some(segment.id.clone());
        self.state.distance_on_segment = 0.0;
        self.state.total_segment_length = segment.distance;
        self.state.progress_percent = 0.0;
        self.upcoming_fork = None;
        self.decided = None;
        self.fork_checked = false;

        log::info!(
            "Traveling from {} to {} ({} units)",
            self.state.current_node_id,
            node_id,
            segment.distance
        );
        Ok(())
    }

    /// Feed distance traveled since the last call.
    pub fn update(&mut self, distance: f32) -> NavigationUpdate {
        let mut result = NavigationUpdate::default();
        let Some(target) = self.state.target_node_id.clone() else {
            return result;
        };
        if distance.is_nan() || distance <= 0.0 {
            return result;
        }

        self.state.distance_on_segment += distance;
        self.state.progress_percent =
            self.state.distance_on_segment / self.state.total_segment_length * 100.0;

        if self.state.distance_on_segment >= self.state.total_segment_length {
            self.arrive(&target);
            result.arrived_at = Some(target);
            return result;
        }

        if !self.fork_checked && self.state.remaining() <= self.fork_lookahead {
            self.fork_checked = true;
            result.fork_published = self.publish_fork(&target);
        }

        result
    }

    fn arrive(&mut self, node_id: &str) {
        log::info!("Arrived at node: {}", node_id);
        self.state = NavigationState::at_node(node_id);
        self.upcoming_fork = None;
        self.fork_checked = false;
    }

    /// Publish the choices leaving `node_id` if it is a fork.
    fn publish_fork(&mut self, node_id: &str) -> bool {
        let outgoing = self.graph.outgoing(node_id);
        if outgoing.len() <= 1 {
            return false;
        }

        let choices: Vec<ForkChoice> = outgoing
            .iter()
            .take(3)
            .enumerate()
            .map(|(index, segment)| {
                let direction = ForkDirection::for_index(index);
                let name = self
                    .graph
                    .node(&segment.to)
                    .map(|n| n.name.as_str())
                    .unwrap_or(segment.to.as_str());
                ForkChoice {
                    segment_id: segment.id.clone(),
                    to_node_id: segment.to.clone(),
                    direction,
                    description: format!("{}: {}", direction, name),
                }
            })
            .collect();

        log::info!("Fork detected at {} with {} choices", node_id, choices.len());
        self.upcoming_fork = Some(choices);
        true
    }

    /// Take one branch of the pending fork.
    ///
    /// At the fork node the traveller departs immediately; while still
    /// approaching, the choice is held and used on [`depart`](Self::depart).
    pub fn choose_fork(&mut self, segment_id: &str) -> Result<()> {
        let Some(fork) = &self.upcoming_fork else {
            log::warn!("No fork to choose from");
            return Err(NavigationError::NoPendingFork);
        };
        let Some(choice) = fork.iter().find(|c| c.segment_id == segment_id).cloned() else {
            log::error!("Invalid fork choice: {}", segment_id);
            return Err(NavigationError::InvalidForkChoice(segment_id.to_string()));
        };

        if self.state.is_traveling() {
            log::info!("Fork choice queued: {}", choice.description);
            self.upcoming_fork = None;
            self.decided = Some(choice);
            return Ok(());
        }

        self.set_target(&choice.to_node_id)?;
        self.upcoming_fork = None;
        Ok(())
    }

    /// Take the first branch of the pending fork
    pub fn auto_choose_fork(&mut self) -> Option<ForkChoice> {
        let first = self.upcoming_fork.as_ref()?.first()?.clone();
        self.choose_fork(&first.segment_id).ok()?;
        Some(first)
    }

    /// Leave the current node: along the queued fork choice, or the only
    /// outgoing segment. Returns the new target.
    pub fn depart(&mut self) -> Result<String> {
        if let Some(target) = &self.state.target_node_id {
            return Err(NavigationError::AlreadyTraveling(target.clone()));
        }

        if let Some(choice) = self.decided.clone() {
            self.set_target(&choice.to_node_id)?;
            return Ok(choice.to_node_id);
        }

        let current = self.state.current_node_id.clone();
        let mut destinations: Vec<String> = self
            .graph
            .outgoing(&current)
            .iter()
            .map(|s| s.to.clone())
            .collect();

        match destinations.len() {
            0 => Err(NavigationError::EndOfRiver(current)),
            1 => {
                let next = destinations.remove(0);
                self.set_target(&next)?;
                Ok(next)
            }
            _ => {
                if self.upcoming_fork.is_none() {
                    self.publish_fork(&current);
                }
                Err(NavigationError::ForkUndecided(current))
            }
        }
    }

    /// Current of the active segment scaled by its speed; zero at a node
    pub fn current_flow(&self) -> Vec2 {
        self.current_segment().map(RiverSegment::flow).unwrap_or(Vec2::ZERO)
    }

    /// Pending fork choices, identical on every call until consumed
    pub fn upcoming_fork(&self) -> Option<&[ForkChoice]> {
        self.upcoming_fork.as_deref()
    }

    /// Fork choice queued for the node ahead
    pub fn pending_choice(&self) -> Option<&ForkChoice> {
        self.decided.as_ref()
    }

    pub fn state(&self) -> &NavigationState {
        &self.state
    }

    pub fn graph(&self) -> &MapGraph {
        &self.graph
    }

    pub fn is_traveling(&self) -> bool {
        self.state.is_traveling()
    }

    pub fn node(&self, id: &str) -> Option<&MapNode> {
        self.graph.node(id)
    }

    pub fn segment(&self, id: &str) -> Option<&RiverSegment> {
        self.graph.segment(id)
    }

    pub fn current_segment(&self) -> Option<&RiverSegment> {
        self.state
            .current_segment_id
            .as_deref()
            .and_then(|id| self.graph.segment(id))
    }

    pub fn outgoing_segments(&self, node_id: &str) -> Vec<&RiverSegment> {
        self.graph.outgoing(node_id)
    }

    pub fn incoming_segments(&self, node_id: &str) -> Vec<&RiverSegment> {
        self.graph.incoming(node_id)
    }

    /// The node last reached (the origin while traveling)
    pub fn current_node(&self) -> Option<&MapNode> {
        self.graph.node(&self.state.current_node_id)
    }

    pub fn target_node(&self) -> Option<&MapNode> {
        self.state
            .target_node_id
            .as_deref()
            .and_then(|id| self.graph.node(id))
    }

    /// Stopped at a node that hosts a settlement
    pub fn is_at_settlement(&self) -> bool {
        !self.is_traveling() && self.current_node().map(|n| n.has_settlement).unwrap_or(false)
    }

    pub fn nodes(&self) -> &[MapNode] {
        &self.graph.nodes
    }

    pub fn segments(&self) -> &[RiverSegment] {
        &self.graph.segments
    }
}
