//=========================================================================
// Cabinet Modes
//
// Concrete states of the cabinet's root and edit machines.
//
// Root:   Idle ──Start──> Loading ──scene type──> Normal | Cylinder | VrFps | VrCylinder
//                            └──no scene type / failure──> Idle
// Edit:   Browse ──> EditContent | EditPositions ──Back──> Browse
//         Browse ──Back──> (yield) Normal returns to its previous root mode
//
//=========================================================================

//=== External Crates =====================================================

use log::{debug, error, info};

//=== Internal Modules ====================================================

use super::{ArcadeMode, Cabinet, CabinetAction, EditMode, ARCADE, EDIT_CONTENT, EDIT_POSITIONS, VR};
use crate::core::input::InputChannels;
use crate::core::state::{ContextBuilder, State, StateCx, SubContext, SubTick};

/// Offset units per second while Nudge is held in EditPositions.
pub const NUDGE_RATE: f32 = 0.5;

//=== Idle ================================================================

/// Attract screen; waits for Start.
pub struct IdleMode;

impl State<ArcadeMode, Cabinet> for IdleMode {
    fn on_enter(&mut self, _cx: &mut StateCx<'_, ArcadeMode, Cabinet>) {
        info!("Cabinet idle");
    }

    fn on_update(&mut self, cx: &mut StateCx<'_, ArcadeMode, Cabinet>, _dt: f32) {
        if cx.env.triggered(CabinetAction::Start) {
            cx.transition_to(ArcadeMode::Loading);
        }
    }

    fn enable_input(&mut self, input: &mut InputChannels) {
        input.enable(ARCADE);
    }

    fn disable_input(&mut self, input: &mut InputChannels) {
        input.disable(ARCADE);
    }

    fn targets(&self) -> Vec<ArcadeMode> {
        vec![ArcadeMode::Loading]
    }
}

//=== Normal ==============================================================

/// Desktop play mode. Owns the edit machine for its active lifetime.
pub struct NormalMode {
    edit: SubContext<EditMode, Cabinet>,
}

impl NormalMode {
    pub fn new() -> Self {
        Self {
            edit: SubContext::new(edit_context),
        }
    }

    fn forward(&mut self, tick: SubTick, cx: &mut StateCx<'_, ArcadeMode, Cabinet>) {
        cx.env.set_edit_mode(self.edit.current());
        if tick == SubTick::Yielded {
            debug!("Edit machine yielded, leaving Normal");
            cx.transition_to_previous();
        }
    }
}

impl Default for NormalMode {
    fn default() -> Self {
        Self::new()
    }
}

impl State<ArcadeMode, Cabinet> for NormalMode {
    fn on_enter(&mut self, cx: &mut StateCx<'_, ArcadeMode, Cabinet>) {
        if let Err(e) = self.edit.open(&mut *cx.env) {
            error!("Edit machine failed to build: {}", e);
            cx.transition_to_previous();
        }
        cx.env.set_edit_mode(self.edit.current());
    }

    fn on_update(&mut self, cx: &mut StateCx<'_, ArcadeMode, Cabinet>, dt: f32) {
        let tick = self.edit.update(&mut *cx.env, dt);
        self.forward(tick, cx);
    }

    fn on_fixed_update(&mut self, cx: &mut StateCx<'_, ArcadeMode, Cabinet>, dt: f32) {
        let tick = self.edit.fixed_update(&mut *cx.env, dt);
        self.forward(tick, cx);
    }

    fn on_exit(&mut self, cx: &mut StateCx<'_, ArcadeMode, Cabinet>) {
        self.edit.close(&mut *cx.env);
        cx.env.set_edit_mode(None);
    }

    fn enable_input(&mut self, input: &mut InputChannels) {
        input.enable(ARCADE);
    }

    fn disable_input(&mut self, input: &mut InputChannels) {
        input.disable(ARCADE);
    }
}

//=== Cylinder / VR =======================================================

/// Play modes without an edit machine. VR variants also own the VR group.
pub struct PlayMode {
    vr: bool,
}

impl PlayMode {
    pub fn flat() -> Self {
        Self { vr: false }
    }

    pub fn vr() -> Self {
        Self { vr: true }
    }
}

impl State<ArcadeMode, Cabinet> for PlayMode {
    fn on_enter(&mut self, cx: &mut StateCx<'_, ArcadeMode, Cabinet>) {
        info!("Entered {:?}", cx.current());
    }

    fn on_update(&mut self, cx: &mut StateCx<'_, ArcadeMode, Cabinet>, _dt: f32) {
        if cx.env.triggered(CabinetAction::Recenter) {
            cx.env.counters.recenters += 1;
        }
        if cx.env.triggered(CabinetAction::Back) {
            cx.transition_to_previous();
        }
    }

    fn enable_input(&mut self, input: &mut InputChannels) {
        input.enable(ARCADE);
        if self.vr {
            input.enable(VR);
        }
    }

    fn disable_input(&mut self, input: &mut InputChannels) {
        if self.vr {
            input.disable(VR);
        }
        input.disable(ARCADE);
    }
}

//=== Edit Machine ========================================================

/// State table of the edit machine owned by [`NormalMode`].
pub fn edit_context() -> ContextBuilder<EditMode, Cabinet> {
    ContextBuilder::new(EditMode::Browse)
        .named("edit")
        .state(EditMode::Browse, BrowseMode)
        .state(EditMode::EditContent, EditContentMode)
        .state(EditMode::EditPositions, EditPositionsMode)
}

/// Plain navigation inside Normal.
pub struct BrowseMode;

impl State<EditMode, Cabinet> for BrowseMode {
    fn on_update(&mut self, cx: &mut StateCx<'_, EditMode, Cabinet>, _dt: f32) {
        if cx.env.triggered(CabinetAction::Back) {
            cx.yield_to_parent();
        } else if cx.env.triggered(CabinetAction::EditContent) {
            cx.transition_to(EditMode::EditContent);
        } else if cx.env.triggered(CabinetAction::EditPositions) {
            cx.transition_to(EditMode::EditPositions);
        }
    }

    fn targets(&self) -> Vec<EditMode> {
        vec![EditMode::EditContent, EditMode::EditPositions]
    }
}

pub struct EditContentMode;

impl State<EditMode, Cabinet> for EditContentMode {
    fn on_update(&mut self, cx: &mut StateCx<'_, EditMode, Cabinet>, _dt: f32) {
        if cx.env.triggered(CabinetAction::Select) {
            cx.env.counters.content_edits += 1;
        }
        if cx.env.triggered(CabinetAction::Back) {
            cx.transition_to_previous();
        }
    }

    fn enable_input(&mut self, input: &mut InputChannels) {
        input.enable(EDIT_CONTENT);
    }

    fn disable_input(&mut self, input: &mut InputChannels) {
        input.disable(EDIT_CONTENT);
    }
}

/// Moves cabinet props; continuous, so it works on the fixed step.
pub struct EditPositionsMode;

impl State<EditMode, Cabinet> for EditPositionsMode {
    fn on_update(&mut self, cx: &mut StateCx<'_, EditMode, Cabinet>, _dt: f32) {
        if cx.env.triggered(CabinetAction::Back) {
            cx.transition_to_previous();
        }
    }

    fn on_fixed_update(&mut self, cx: &mut StateCx<'_, EditMode, Cabinet>, dt: f32) {
        if cx.env.triggered(CabinetAction::Nudge) {
            cx.env.counters.nudge_offset += NUDGE_RATE * dt;
        }
    }

    fn enable_input(&mut self, input: &mut InputChannels) {
        input.enable(EDIT_POSITIONS);
    }

    fn disable_input(&mut self, input: &mut InputChannels) {
        input.disable(EDIT_POSITIONS);
    }
}
