//=========================================================================
// Arcade Session
//
// Bundles the root mode machine, the cabinet environment and a frame
// driver behind one per-frame call.
//
// Each tick:
//  1. Runs fixed steps and the frame update through the FrameDriver
//  2. Handles the global Quit action
//  3. Clears this frame's actions
//
//=========================================================================

//=== External Crates =====================================================

use log::info;

//=== Internal Modules ====================================================

use super::{arcade_context, ArcadeMode, Cabinet, CabinetAction, CabinetConfig, EditMode, SceneLoader};
use crate::core::state::{BuildError, Context, LogProgress, ProgressSink};
use crate::driver::{FrameDriver, FrameReport};

//=== ArcadeSession =======================================================

pub struct ArcadeSession {
    context: Context<ArcadeMode, Cabinet>,
    cabinet: Cabinet,
    driver: FrameDriver,
    quitting: bool,
}

impl ArcadeSession {
    /// Builds a session that reports load progress through the log.
    pub fn new<L>(config: CabinetConfig, loader: L) -> Result<Self, BuildError>
    where
        L: SceneLoader + 'static,
    {
        Self::with_progress(config, loader, LogProgress)
    }

    pub fn with_progress<L, P>(config: CabinetConfig, loader: L, sink: P) -> Result<Self, BuildError>
    where
        L: SceneLoader + 'static,
        P: ProgressSink + 'static,
    {
        let mut context = arcade_context(&config, sink)?;
        context.on_transition(|event| {
            info!("Mode {:?} -> {:?} ({:?})", event.from, event.to, event.kind);
        });

        Ok(Self {
            context,
            cabinet: Cabinet::new(config, loader),
            driver: FrameDriver::default(),
            quitting: false,
        })
    }

    /// Replaces the default frame driver.
    pub fn with_driver(mut self, driver: FrameDriver) -> Self {
        self.driver = driver;
        self
    }

    //--- Lifecycle --------------------------------------------------------

    /// Enters Idle.
    pub fn start(&mut self) {
        self.context.start(&mut self.cabinet);
    }

    /// Queues an action for the next tick.
    pub fn press(&mut self, action: CabinetAction) {
        self.cabinet.press(action);
    }

    pub fn tick(&mut self, dt: f32) -> FrameReport {
        let report = self.driver.frame(&mut self.context, &mut self.cabinet, dt);

        if self.cabinet.triggered(CabinetAction::Quit) && !self.quitting {
            info!("Quit requested");
            self.context.shutdown(&mut self.cabinet);
            self.quitting = true;
        }

        self.cabinet.clear_actions();
        report
    }

    //--- Queries ----------------------------------------------------------

    pub fn mode(&self) -> Option<ArcadeMode> {
        self.context.current()
    }

    pub fn edit_mode(&self) -> Option<EditMode> {
        self.cabinet.edit_mode()
    }

    pub fn is_quitting(&self) -> bool {
        self.quitting
    }

    pub fn cabinet(&self) -> &Cabinet {
        &self.cabinet
    }

    pub fn cabinet_mut(&mut self) -> &mut Cabinet {
        &mut self.cabinet
    }

    pub fn context(&self) -> &Context<ArcadeMode, Cabinet> {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut Context<ArcadeMode, Cabinet> {
        &mut self.context
    }
}
