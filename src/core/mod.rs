//=========================================================================
// Core Systems
//
// The state machine framework and the collaborators it talks to.
//
// Responsibilities:
// - `state`: Context, State, SubContext, AsyncLoad and their plumbing
// - `input`: channel groups toggled by states
// - `task`: background workers polled as load tasks
//
// Notes:
// Nothing in here spawns threads on its own or holds global state. The
// only threads are the ones a caller starts through `WorkerTask::spawn`.
//
//=========================================================================

pub mod input;
pub mod state;
pub mod task;

//=== Public Exports ======================================================

pub use input::{ChannelGroup, InputChannels};
pub use state::{Context, ContextBuilder, State, StateCx, StateKey, SubContext};
pub use task::{ProgressReporter, WorkerTask};
