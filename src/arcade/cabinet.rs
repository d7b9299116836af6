//=========================================================================
// Cabinet Environment
//
// The host environment every arcade mode sees through `StateCx::env`.
//
// Responsibilities:
// - Own the input channels and this frame's triggered actions
// - Hold the cabinet configuration (scene name, scene type, load options)
// - Delegate scene loading to the external SceneLoader collaborator
//
//=========================================================================

//=== External Crates =====================================================

use log::{debug, trace};
use serde::Deserialize;

//=== Internal Modules ====================================================

use super::{ArcadeMode, EditMode, ARCADE, EDIT_CONTENT, EDIT_POSITIONS, QUIT, VR};
use crate::core::input::{ChannelGroup, InputChannels};
use crate::core::state::{LoadConfig, LoadTask, TaskError};

//=== Configuration =======================================================

/// Which play mode a loaded scene runs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum SceneType {
    Normal,
    Cylinder,
    VrFps,
    VrCylinder,
}

impl SceneType {
    /// Root mode entered once the scene has loaded.
    pub fn mode(self) -> ArcadeMode {
        match self {
            SceneType::Normal => ArcadeMode::Normal,
            SceneType::Cylinder => ArcadeMode::Cylinder,
            SceneType::VrFps => ArcadeMode::VrFps,
            SceneType::VrCylinder => ArcadeMode::VrCylinder,
        }
    }
}

/// Cabinet settings supplied by the host.
///
/// A missing `scene_type` is not an error: the loader falls back to Idle.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct CabinetConfig {
    pub scene_type: Option<SceneType>,
    pub scene_name: String,
    pub load: LoadConfig,
}

impl Default for CabinetConfig {
    fn default() -> Self {
        Self {
            scene_type: None,
            scene_name: "arcade".to_string(),
            load: LoadConfig::default(),
        }
    }
}

//=== Collaborators =======================================================

/// Starts loading a scene in the background.
pub trait SceneLoader {
    fn start_loading(&mut self, scene_name: &str) -> Result<Box<dyn LoadTask>, TaskError>;
}

//=== CabinetAction =======================================================

/// Logical inputs the modes react to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CabinetAction {
    Quit,
    Start,
    Back,
    EditContent,
    EditPositions,
    Select,
    Nudge,
    Recenter,
}

impl CabinetAction {
    /// Channel group that must be enabled for the action to count.
    pub fn channel(self) -> ChannelGroup {
        match self {
            CabinetAction::Quit => QUIT,
            CabinetAction::Start
            | CabinetAction::Back
            | CabinetAction::EditContent
            | CabinetAction::EditPositions => ARCADE,
            CabinetAction::Select => EDIT_CONTENT,
            CabinetAction::Nudge => EDIT_POSITIONS,
            CabinetAction::Recenter => VR,
        }
    }
}

//=== Counters ============================================================

/// Side effects of the modes, observable by the host.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CabinetCounters {
    pub content_edits: u32,
    pub nudge_offset: f32,
    pub recenters: u32,
}

//=== Cabinet =============================================================

pub struct Cabinet {
    pub input: InputChannels,
    pub config: CabinetConfig,
    pub counters: CabinetCounters,
    edit_mode: Option<EditMode>,
    loader: Box<dyn SceneLoader>,
    actions: Vec<CabinetAction>,
}

impl Cabinet {
    /// Creates the environment and registers every channel group. Only
    /// `QUIT` starts enabled.
    pub fn new<L>(config: CabinetConfig, loader: L) -> Self
    where
        L: SceneLoader + 'static,
    {
        let mut input = InputChannels::new();
        input.register_global(QUIT);
        for group in [ARCADE, EDIT_CONTENT, EDIT_POSITIONS, VR] {
            input.register(group);
        }

        Self {
            input,
            config,
            counters: CabinetCounters::default(),
            edit_mode: None,
            loader: Box::new(loader),
            actions: Vec::with_capacity(8),
        }
    }

    //--- Actions ----------------------------------------------------------

    /// Records an action for the current frame.
    pub fn press(&mut self, action: CabinetAction) {
        trace!("Pressed {:?}", action);
        if !self.actions.contains(&action) {
            self.actions.push(action);
        }
    }

    /// True if `action` was pressed this frame and its channel is live.
    pub fn triggered(&self, action: CabinetAction) -> bool {
        self.actions.contains(&action) && self.input.is_enabled(action.channel())
    }

    /// Forgets this frame's actions.
    pub fn clear_actions(&mut self) {
        self.actions.clear();
    }

    //--- Loading ----------------------------------------------------------

    pub fn start_loading(&mut self) -> Result<Box<dyn LoadTask>, TaskError> {
        debug!("Requesting scene '{}'", self.config.scene_name);
        self.loader.start_loading(&self.config.scene_name)
    }

    //--- Edit Mode --------------------------------------------------------

    /// Current edit sub-mode while Normal is active.
    pub fn edit_mode(&self) -> Option<EditMode> {
        self.edit_mode
    }

    pub(super) fn set_edit_mode(&mut self, mode: Option<EditMode>) {
        self.edit_mode = mode;
    }
}

impl AsMut<InputChannels> for Cabinet {
    fn as_mut(&mut self) -> &mut InputChannels {
        &mut self.input
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
