use std::collections::HashMap;
use std::sync::Arc;

use log::{debug, warn};

use crate::blocks::{BlockId, BlockRegistry, BlockTable};
use crate::error::InputError;
use crate::host::WorldMutation;

pub const MIN_ZOOM: f32 = 0.0;
pub const MAX_ZOOM: f32 = 10.0;

// Player actions the world script responds to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputAction {
    Fire,
    AltFire,
    PlaceDirt,
    PlaceStone,
    PlaceGrass,
}

impl InputAction {
    pub const ALL: [InputAction; 5] = [
        InputAction::Fire,
        InputAction::AltFire,
        InputAction::PlaceDirt,
        InputAction::PlaceStone,
        InputAction::PlaceGrass,
    ];

    pub fn name(self) -> &'static str {
        match self {
            InputAction::Fire => "fire",
            InputAction::AltFire => "alt-fire",
            InputAction::PlaceDirt => "place-dirt",
            InputAction::PlaceStone => "place-stone",
            InputAction::PlaceGrass => "place-grass",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.name() == name)
    }
}

// Key and button codes mapped to actions.
// Codes follow DOM naming: "KeyE", "Digit1", "Mouse1".
#[derive(Debug, Clone)]
pub struct KeyBindings {
    bindings: HashMap<String, InputAction>,
}

impl KeyBindings {
    pub fn empty() -> Self {
        Self {
            bindings: HashMap::new(),
        }
    }

    // A code triggers one action; binding it again replaces the old one
    pub fn bind(&mut self, action: InputAction, code: impl Into<String>) {
        self.bindings.insert(code.into(), action);
    }

    pub fn unbind(&mut self, code: &str) -> Option<InputAction> {
        self.bindings.remove(code)
    }

    pub fn action_for(&self, code: &str) -> Option<InputAction> {
        self.bindings.get(code).copied()
    }
}

impl Default for KeyBindings {
    fn default() -> Self {
        let mut bindings = Self::empty();
        bindings.bind(InputAction::Fire, "Mouse1");
        bindings.bind(InputAction::AltFire, "Mouse3");
        bindings.bind(InputAction::AltFire, "KeyE");
        bindings.bind(InputAction::PlaceDirt, "Digit1");
        bindings.bind(InputAction::PlaceStone, "Digit2");
        bindings.bind(InputAction::PlaceGrass, "Digit3");
        bindings
    }
}

// Per-player state the input handlers read and update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerSession {
    pub selected: BlockId,
    pub zoom_distance: f32,
}

impl PlayerSession {
    pub fn new(selected: BlockId) -> Self {
        Self {
            selected,
            zoom_distance: MAX_ZOOM,
        }
    }

    // One zoom step per tick with scroll, in the direction of the scroll
    pub fn apply_scroll(&mut self, scroll_y: f32) {
        if scroll_y == 0.0 || scroll_y.is_nan() {
            return;
        }
        let step = if scroll_y > 0.0 { 1.0 } else { -1.0 };
        self.zoom_distance = (self.zoom_distance + step).clamp(MIN_ZOOM, MAX_ZOOM);
    }
}

// The block under the cursor and the empty cell in front of the hit face.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetedBlock {
    pub position: [i32; 3],
    pub adjacent: [i32; 3],
}

// A block change that was applied to the world.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockEdit {
    pub id: BlockId,
    pub position: [i32; 3],
}

// Turns input actions into selection changes and world edits.
pub struct InputHandler {
    blocks: BlockTable,
    registry: Arc<BlockRegistry>,
}

impl InputHandler {
    pub fn new(blocks: BlockTable, registry: Arc<BlockRegistry>) -> Self {
        Self { blocks, registry }
    }

    pub fn registry(&self) -> &BlockRegistry {
        &self.registry
    }

    // Apply one action.
    // Returns the edit when the world accepted it; selection changes and
    // actions without a target return None.
    pub fn handle<W>(
        &self,
        action: InputAction,
        session: &mut PlayerSession,
        target: Option<&TargetedBlock>,
        world: &mut W,
    ) -> Result<Option<BlockEdit>, InputError>
    where
        W: WorldMutation + ?Sized,
    {
        let selection = match action {
            InputAction::PlaceDirt => Some(self.blocks.dirt),
            InputAction::PlaceStone => Some(self.blocks.stone),
            InputAction::PlaceGrass => Some(self.blocks.grass),
            InputAction::Fire | InputAction::AltFire => None,
        };
        if let Some(id) = selection {
            session.selected = id;
            debug!("selected: {}", self.registry.name(id).unwrap_or("unknown"));
            return Ok(None);
        }

        let edit = match action {
            InputAction::Fire => match target {
                Some(t) => BlockEdit {
                    id: BlockId::EMPTY,
                    position: t.position,
                },
                None => return Ok(None),
            },
            _ => match target {
                Some(t) => {
                    if !self.registry.contains(session.selected) {
                        return Err(InputError::UnknownBlock(session.selected));
                    }
                    BlockEdit {
                        id: session.selected,
                        position: t.adjacent,
                    }
                }
                None => return Ok(None),
            },
        };

        if world.set_block(edit.id, edit.position) {
            Ok(Some(edit))
        } else {
            warn!("{} at {:?} ignored: voxel not loaded", action.name(), edit.position);
            Ok(None)
        }
    }
}
