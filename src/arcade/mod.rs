//=========================================================================
// Arcade Cabinet Modes
//=========================================================================
//
// The cabinet front-end's mode graph built on the state core.
//
// Architecture:
//   ArcadeSession
//     ├─ Context<ArcadeMode, Cabinet>      (root machine)
//     │    └─ Normal ─ SubContext<EditMode> (edit machine)
//     ├─ Cabinet                            (input, config, loader, actions)
//     └─ FrameDriver
//
// Input channel groups:
//   QUIT            global, always live
//   ARCADE          Idle, Normal, play modes
//   EDIT_CONTENT    EditContent
//   EDIT_POSITIONS  EditPositions
//   VR              VrFps, VrCylinder
//
//=========================================================================

//=== Module Declarations =================================================

mod cabinet;
mod modes;
mod session;

//=== Internal Dependencies ===============================================

use crate::core::input::ChannelGroup;
use crate::core::state::{AsyncLoad, BuildError, Context, ProgressSink, StateKey};

//=== Public API ==========================================================

pub use cabinet::{Cabinet, CabinetAction, CabinetConfig, CabinetCounters, SceneLoader, SceneType};
pub use modes::{
    edit_context, BrowseMode, EditContentMode, EditPositionsMode, IdleMode, NormalMode, PlayMode,
    NUDGE_RATE,
};
pub use session::ArcadeSession;

//=== Channel Groups ======================================================

pub const QUIT: ChannelGroup = ChannelGroup::new("quit");
pub const ARCADE: ChannelGroup = ChannelGroup::new("arcade");
pub const EDIT_CONTENT: ChannelGroup = ChannelGroup::new("edit_content");
pub const EDIT_POSITIONS: ChannelGroup = ChannelGroup::new("edit_positions");
pub const VR: ChannelGroup = ChannelGroup::new("vr");

//=== State Keys ==========================================================

/// Root cabinet modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArcadeMode {
    Idle,
    Loading,
    Normal,
    Cylinder,
    VrFps,
    VrCylinder,
}

impl StateKey for ArcadeMode {}

/// Sub-modes of [`ArcadeMode::Normal`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EditMode {
    Browse,
    EditContent,
    EditPositions,
}

impl StateKey for EditMode {}

//=== Root Machine ========================================================

/// Builds the root mode machine. Idle is both initial and default state.
///
/// VR modes are constructed on first use.
pub fn arcade_context<P>(config: &CabinetConfig, sink: P) -> Result<Context<ArcadeMode, Cabinet>, BuildError>
where
    P: ProgressSink + 'static,
{
    let loading = AsyncLoad::new(
        ArcadeMode::Idle,
        |cabinet: &mut Cabinet| cabinet.start_loading(),
        |cabinet: &Cabinet| cabinet.config.scene_type.map(SceneType::mode),
        sink,
    )
    .with_config(config.load.clone())
    .with_candidates([
        ArcadeMode::Normal,
        ArcadeMode::Cylinder,
        ArcadeMode::VrFps,
        ArcadeMode::VrCylinder,
    ]);

    Context::builder(ArcadeMode::Idle)
        .named("arcade")
        .state(ArcadeMode::Idle, IdleMode)
        .state(ArcadeMode::Loading, loading)
        .state(ArcadeMode::Normal, NormalMode::new())
        .state(ArcadeMode::Cylinder, PlayMode::flat())
        .lazy_state(ArcadeMode::VrFps, Vec::new(), PlayMode::vr)
        .lazy_state(ArcadeMode::VrCylinder, Vec::new(), PlayMode::vr)
        .build()
}
