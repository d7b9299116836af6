//=========================================================================
// Arcade Modes: Library Root
//
// Frame-driven hierarchical state machines for an arcade-cabinet
// front-end.
//
// Responsibilities:
// - Expose the state core (`Context`, `State`, `SubContext`, `AsyncLoad`)
// - Provide a frame driver that ticks a root Context
// - Ship the cabinet's own mode graph (`arcade`) built on the core
//
// Typical usage:
// ```no_run
// use arcade_modes::arcade::{ArcadeSession, CabinetAction, CabinetConfig};
//
// let mut session = ArcadeSession::new(CabinetConfig::default(), my_scene_loader)?;
// session.start();
// session.press(CabinetAction::Start);
// while !session.is_quitting() {
//     session.tick(1.0 / 60.0);
// }
// ```
//
//=========================================================================

//--- Public Modules ------------------------------------------------------
//
// `core` holds the state machine framework, input channels and worker
// tasks. `driver` ticks a root Context once per host frame. `arcade` is
// the cabinet mode graph.
//
pub mod arcade;
pub mod core;
pub mod driver;
pub mod prelude;

//--- Public Exports ------------------------------------------------------

pub use driver::{FrameDriver, FrameDriverBuilder, FrameReport};
