//=========================================================================
// Sub Context
//=========================================================================
//
// A Context nested inside one parent state's active lifetime.
//
// Lifecycle:
//   parent.on_enter  → open()    builds + starts the nested machine
//   parent.on_update → update()  forwards the tick, reports yields
//   parent.on_exit   → close()   exits the nested state, drops the machine
//
// The nested machine knows nothing about the parent's state graph: a
// nested state calls `yield_to_parent()` and the parent decides what that
// means for its own Context.
//
//=========================================================================

//=== External Dependencies ===============================================

use log::{debug, warn};

//=== Internal Dependencies ===============================================

use super::{BuildError, Context, ContextBuilder, StateKey};
use crate::core::input::InputChannels;

//=== SubTick =============================================================

/// Outcome of forwarding a tick into a [`SubContext`].
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubTick {
    /// The nested machine handled the tick.
    Running,

    /// A nested state asked the parent to take over.
    Yielded,

    /// Nothing is open; the tick was not forwarded.
    Closed,
}

type ContextFactory<K, E> = Box<dyn FnMut() -> ContextBuilder<K, E>>;

//=== SubContext ==========================================================

/// Nested state machine owned by a parent state.
///
/// ```rust
/// # use arcade_modes::prelude::*;
/// # #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// # enum Edit { Browse }
/// # impl StateKey for Edit {}
/// struct Browse;
/// impl State<Edit, InputChannels> for Browse {
///     fn on_update(&mut self, cx: &mut StateCx<'_, Edit, InputChannels>, _dt: f32) {
///         cx.yield_to_parent();
///     }
/// }
///
/// let mut input = InputChannels::new();
/// let mut edit = SubContext::new(|| Context::builder(Edit::Browse).state(Edit::Browse, Browse));
///
/// edit.open(&mut input).unwrap();
/// assert_eq!(edit.update(&mut input, 0.016), SubTick::Yielded);
/// edit.close(&mut input);
/// assert!(!edit.is_open());
/// ```
pub struct SubContext<K: StateKey, E> {
    factory: ContextFactory<K, E>,
    active: Option<Context<K, E>>,
}

impl<K: StateKey, E> SubContext<K, E> {
    /// Creates a closed sub-context. `factory` describes the nested state
    /// table and runs on every `open`.
    pub fn new<F>(factory: F) -> Self
    where
        F: FnMut() -> ContextBuilder<K, E> + 'static,
    {
        Self {
            factory: Box::new(factory),
            active: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.active.is_some()
    }

    /// Current nested state, `None` while closed.
    pub fn current(&self) -> Option<K> {
        self.active.as_ref().and_then(Context::current)
    }

    pub fn context(&self) -> Option<&Context<K, E>> {
        self.active.as_ref()
    }

    pub fn context_mut(&mut self) -> Option<&mut Context<K, E>> {
        self.active.as_mut()
    }
}

impl<K: StateKey, E: AsMut<InputChannels>> SubContext<K, E> {
    //--- Lifecycle --------------------------------------------------------

    /// Builds and starts the nested machine. Opening twice is a no-op.
    pub fn open(&mut self, env: &mut E) -> Result<(), BuildError> {
        if self.is_open() {
            warn!("Sub-context already open, ignoring open");
            return Ok(());
        }

        let mut context = (self.factory)().build()?;
        context.mark_nested();
        debug!("[{}] Opening sub-context", context.name());
        context.start(env);
        self.active = Some(context);
        Ok(())
    }

    /// Exits the nested state and drops the machine.
    pub fn close(&mut self, env: &mut E) {
        if let Some(mut context) = self.active.take() {
            context.shutdown(env);
            debug!("[{}] Sub-context closed", context.name());
        }
    }

    //--- Update Loop ------------------------------------------------------

    /// Forwards the frame tick to the nested machine.
    pub fn update(&mut self, env: &mut E, dt: f32) -> SubTick {
        match self.active.as_mut() {
            Some(context) => {
                context.update(env, dt);
                Self::tick_result(context)
            }
            None => SubTick::Closed,
        }
    }

    /// Forwards the fixed-step tick to the nested machine.
    pub fn fixed_update(&mut self, env: &mut E, dt: f32) -> SubTick {
        match self.active.as_mut() {
            Some(context) => {
                context.fixed_update(env, dt);
                Self::tick_result(context)
            }
            None => SubTick::Closed,
        }
    }

    /// Drives a transition inside the nested machine from the parent.
    pub fn transition_to(&mut self, target: K, env: &mut E) -> SubTick {
        match self.active.as_mut() {
            Some(context) => {
                context.transition_to(target, env);
                Self::tick_result(context)
            }
            None => {
                warn!("Sub-context closed, dropping transition to {:?}", target);
                SubTick::Closed
            }
        }
    }

    fn tick_result(context: &mut Context<K, E>) -> SubTick {
        if context.take_yield() {
            debug!("[{}] Yielded to parent", context.name());
            SubTick::Yielded
        } else {
            SubTick::Running
        }
    }
}

impl<K: StateKey, E> Drop for SubContext<K, E> {
    fn drop(&mut self) {
        if let Some(context) = &self.active {
            warn!(
                "[{}] Sub-context dropped while open in {:?}; parent on_exit should close it",
                context.name(),
                context.current()
            );
        }
    }
}

//=== Tests ===============================================================
