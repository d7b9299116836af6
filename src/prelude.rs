//=========================================================================
// Prelude
//=========================================================================
//
// Convenience module that re-exports commonly used types and traits.
//
// Usage:
//   use arcade_modes::prelude::*;
//
//=========================================================================

//=== Public API ==========================================================

// Frame driver
pub use crate::driver::{FrameDriver, FrameDriverBuilder, FrameReport};

// State core
pub use crate::core::state::{
    BuildError, Context, ContextBuilder, ContextConfig, History, State, StateCx, StateKey,
    SubContext, SubTick, TransitionEvent, TransitionKind, TransitionRequest,
};

// Async loading
pub use crate::core::state::{AsyncLoad, LoadConfig, LoadPhase, LoadTask, LogProgress, ProgressSink, TaskError};
pub use crate::core::task::{ProgressReporter, WorkerTask};

// Input channels
pub use crate::core::input::{ChannelGroup, InputChannels};
