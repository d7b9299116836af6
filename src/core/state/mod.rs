//=========================================================================
// State System
//=========================================================================
//
// Frame-driven hierarchical state machines.
//
// Architecture:
//   Context
//     ├─ slots: HashMap<K, Box<dyn State>>   (built once, reused)
//     ├─ current: Option<K>
//     ├─ history: History<K>                 (bounded)
//     └─ queue: TransitionQueue<K>           (requests from states)
//
// Flow:
//   update(dt) → State::on_update(cx) → cx.transition_to(..) → queue
//              → settle() → on_exit → history → on_enter → observers
//
// A State may own a SubContext and forward its ticks into it; the
// nested machine hands control back through `yield_to_parent`.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::fmt::Debug;
use std::hash::Hash;

//=== Internal Dependencies ===============================================

use crate::core::input::InputChannels;

//=== Module Declarations =================================================

mod async_load;
mod builder;
mod config;
mod context;
mod error;
mod history;
mod sub_context;
mod transition_queue;

//=== Public API ==========================================================

pub use async_load::{AsyncLoad, LoadPhase, LoadTask, LogProgress, ProgressSink};
pub use builder::ContextBuilder;
pub use config::{ContextConfig, LoadConfig};
pub use context::{Context, TransitionEvent, TransitionKind};
pub use error::{BuildError, TaskError};
pub use history::History;
pub use sub_context::{SubContext, SubTick};
pub use transition_queue::{TransitionQueue, TransitionRequest};

//=== State Key Trait =====================================================

/// Marker trait for state identifiers.
///
/// Keys uniquely identify states in a Context's registry and are what the
/// history stack records. Typically implemented by application enums.
pub trait StateKey: Clone + Copy + Eq + Hash + Debug + Send + 'static {}

//=== State Trait =========================================================

/// A unit of behavior with an enter/update/exit lifecycle and ownership of
/// a set of input channels while it is current.
///
/// Only `on_update` is required:
///
/// ```rust
/// # use arcade_modes::prelude::*;
/// # #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// # enum Mode { Attract, Play }
/// # impl StateKey for Mode {}
/// struct Attract;
///
/// impl<E> State<Mode, E> for Attract {
///     fn on_update(&mut self, cx: &mut StateCx<'_, Mode, E>, _dt: f32) {
///         cx.transition_to(Mode::Play);
///     }
/// }
/// ```
///
/// The Context guarantees that a state is never ticked before `on_enter`
/// has returned nor after `on_exit` has started, that `enable_input` runs
/// right after `on_enter` and `disable_input` right before `on_exit`.
pub trait State<K: StateKey, E> {
    /// Called once when the state becomes current.
    ///
    /// Reset transient fields here so the state behaves the same on every
    /// activation. Missing preconditions should be answered with a
    /// transition, not a panic.
    fn on_enter(&mut self, _cx: &mut StateCx<'_, K, E>) {}

    /// Called once per frame while current.
    fn on_update(&mut self, cx: &mut StateCx<'_, K, E>, dt: f32);

    /// Called once per fixed step while current.
    fn on_fixed_update(&mut self, _cx: &mut StateCx<'_, K, E>, _dt: f32) {}

    /// Called once when the state stops being current.
    ///
    /// Must release whatever `on_enter` acquired.
    fn on_exit(&mut self, _cx: &mut StateCx<'_, K, E>) {}

    /// Turns on the input channels this state owns.
    fn enable_input(&mut self, _input: &mut InputChannels) {}

    /// Turns off the input channels this state owns.
    fn disable_input(&mut self, _input: &mut InputChannels) {}

    /// Keys this state may request. Checked against the registry when the
    /// Context is built.
    fn targets(&self) -> Vec<K> {
        Vec::new()
    }
}

//=== State Callback Handle ===============================================

/// Handle passed to every lifecycle callback.
///
/// Gives the state access to the host environment and lets it queue
/// transitions on its owning Context. It is a borrow, not a reference the
/// state can keep: states never extend the Context's lifetime.
pub struct StateCx<'a, K: StateKey, E> {
    /// Host environment (input channels, collaborators, frame data).
    pub env: &'a mut E,
    queue: &'a mut TransitionQueue<K>,
    current: K,
}

impl<'a, K: StateKey, E> StateCx<'a, K, E> {
    pub(crate) fn new(env: &'a mut E, queue: &'a mut TransitionQueue<K>, current: K) -> Self {
        Self {
            env,
            queue,
            current,
        }
    }

    /// Key of the state this callback belongs to.
    pub fn current(&self) -> K {
        self.current
    }

    /// Queues a transition that records the current state in history.
    pub fn transition_to(&mut self, target: K) {
        self.queue.push(TransitionRequest::push(target));
    }

    /// Queues a transition that leaves history untouched.
    pub fn replace_with(&mut self, target: K) {
        self.queue.push(TransitionRequest::replace(target));
    }

    /// Queues a return to the most recent history entry.
    pub fn transition_to_previous(&mut self) {
        self.queue.push(TransitionRequest::Previous);
    }

    /// Asks the parent state (if this machine is a SubContext) to take over.
    pub fn yield_to_parent(&mut self) {
        self.queue.request_yield();
    }

    /// Number of requests queued so far and not yet applied.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }
}
