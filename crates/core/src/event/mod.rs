use std::fmt;

use crate::{Beat, Result, SceneManager};

/// Custom event body. Runs with full access to the manager.
pub type ActionFn = Box<dyn FnMut(&mut SceneManager) -> Result<()>>;

/// What an [`Event`] does when its beat arrives.
pub enum EventAction {
    /// Replace the base layer, starting the scene at the given beat.
    SwapScene { scene: String, at: Beat },
    /// Push the scene as an overlay, starting it at the given beat.
    LayerScene { scene: String, at: Beat },
    /// Drop the first active occurrence of the scene.
    RemoveScene { scene: String },
    Custom(ActionFn),
}

impl fmt::Debug for EventAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventAction::SwapScene { scene, at } => f
                .debug_struct("SwapScene")
                .field("scene", scene)
                .field("at", at)
                .finish(),
            EventAction::LayerScene { scene, at } => f
                .debug_struct("LayerScene")
                .field("scene", scene)
                .field("at", at)
                .finish(),
            EventAction::RemoveScene { scene } => {
                f.debug_struct("RemoveScene").field("scene", scene).finish()
            }
            EventAction::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// One-shot action bound to a global beat.
#[derive(Debug)]
pub struct Event {
    beat: Beat,
    action: EventAction,
}

impl Event {
    /// Event running an arbitrary action against the manager.
    pub fn new<F>(beat: Beat, action: F) -> Self
    where
        F: FnMut(&mut SceneManager) -> Result<()> + 'static,
    {
        Self {
            beat,
            action: EventAction::Custom(Box::new(action)),
        }
    }

    /// Replaces the base layer with `scene`, started at `at`.
    pub fn swap_scene(beat: Beat, scene: impl Into<String>, at: Beat) -> Self {
        Self {
            beat,
            action: EventAction::SwapScene {
                scene: scene.into(),
                at,
            },
        }
    }

    /// Adds `scene` as an overlay, started at `at`.
    pub fn layer_scene(beat: Beat, scene: impl Into<String>, at: Beat) -> Self {
        Self {
            beat,
            action: EventAction::LayerScene {
                scene: scene.into(),
                at,
            },
        }
    }

    pub fn remove_scene(beat: Beat, scene: impl Into<String>) -> Self {
        Self {
            beat,
            action: EventAction::RemoveScene {
                scene: scene.into(),
            },
        }
    }

    pub fn beat(&self) -> Beat {
        self.beat
    }

    pub fn action(&self) -> &EventAction {
        &self.action
    }

    pub(crate) fn fire(&mut self, manager: &mut SceneManager) -> Result<()> {
        tracing::debug!(beat = self.beat, action = ?self.action, "firing event");
        match &mut self.action {
            EventAction::SwapScene { scene, at } => manager.start_scene(scene, *at),
            EventAction::LayerScene { scene, at } => manager.add_scene(scene, *at),
            EventAction::RemoveScene { scene } => manager.remove_scene(scene),
            EventAction::Custom(action) => action(manager),
        }
    }
}
