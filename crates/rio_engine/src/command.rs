//! Commands from the input layer, applied at the start of the next tick

use crossbeam_channel::Sender;
use rio_math::Vec2;

/// A deferred request against the simulation
#[derive(Debug, Clone, PartialEq)]
pub enum EngineCommand {
    /// Set a player's thrust/turn intents; values are clamped to `[-1, 1]`
    Steer { entity_id: String, thrust: f32, turn: f32 },
    /// Push a body for one tick
    ApplyForce { entity_id: String, force: Vec2 },
    /// Overwrite a body's velocity
    SetVelocity { entity_id: String, velocity: Vec2 },
    /// Remove an entity and its body
    Despawn { entity_id: String },
}

/// Cloneable handle for queueing commands from outside the engine
#[derive(Debug, Clone)]
pub struct CommandSender(pub(crate) Sender<EngineCommand>);

impl CommandSender {
    /// Queue a command. Returns false once the engine has been dropped.
    pub fn send(&self, command: EngineCommand) -> bool {
        self.0.send(command).is_ok()
    }

    /// Convenience for steering intents
    pub fn steer(&self, entity_id: impl Into<String>, thrust: f32, turn: f32) -> bool {
        self.send(EngineCommand::Steer {
            entity_id: entity_id.into(),
            thrust,
            turn,
        })
    }
}
