//=========================================================================
// Context
//=========================================================================
//
// Owns the current state, the bounded history stack and the registry of
// state instances for one mode hierarchy.
//
// States are registered once and referenced by key; the same instance is
// reused on every activation. Transition requests are queued and applied
// by `settle()` after the callback that issued them has returned, so a
// transition always completes (exit → history → enter → observers) before
// the next one begins.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::collections::HashMap;

use log::{debug, error, info, warn};

//=== Internal Dependencies ===============================================

use super::{
    ContextBuilder, History, State, StateCx, StateKey, TransitionQueue, TransitionRequest,
};
use crate::core::input::InputChannels;

//=== Transition Event ====================================================

/// How a settled transition came about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransitionKind {
    /// The initial state was entered by `start`.
    Start,

    /// Forward transition; the outgoing state was pushed onto history.
    Push,

    /// Forward transition without touching history.
    Replace,

    /// Return to the most recent history entry.
    Back,

    /// Routed to the default state (empty history or unregistered target).
    Fallback,

    /// The current state was exited and entered again.
    Reenter,
}

/// Raised exactly once per settled transition, after the new state's
/// `on_enter` has returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionEvent<K: StateKey> {
    pub from: Option<K>,
    pub to: K,
    pub kind: TransitionKind,
}

type Observer<K> = Box<dyn FnMut(&TransitionEvent<K>)>;
type StateFactory<K, E> = Box<dyn FnOnce() -> Box<dyn State<K, E>>>;

//=== Registry Slot =======================================================

/// A registered state, either built or waiting for its first activation.
pub(super) struct Slot<K: StateKey, E> {
    state: Option<Box<dyn State<K, E>>>,
    factory: Option<StateFactory<K, E>>,
    declared: Vec<K>,
}

impl<K: StateKey, E> Slot<K, E> {
    pub(super) fn built(state: Box<dyn State<K, E>>) -> Self {
        Self {
            state: Some(state),
            factory: None,
            declared: Vec::new(),
        }
    }

    /// A state built on first activation. `declared` stands in for its
    /// `targets()` until then.
    pub(super) fn deferred(declared: Vec<K>, factory: StateFactory<K, E>) -> Self {
        Self {
            state: None,
            factory: Some(factory),
            declared,
        }
    }

    pub(super) fn is_built(&self) -> bool {
        self.state.is_some()
    }

    /// Targets declared by the state, or at registration while deferred.
    pub(super) fn declared_targets(&self) -> Vec<K> {
        match &self.state {
            Some(state) => state.targets(),
            None => self.declared.clone(),
        }
    }

    /// Returns the state, constructing it on first use.
    fn get(&mut self) -> Option<&mut (dyn State<K, E> + 'static)> {
        if self.state.is_none() {
            if let Some(factory) = self.factory.take() {
                self.state = Some(factory());
            }
        }
        self.state.as_deref_mut()
    }
}

fn channels<E: AsMut<InputChannels>>(env: &mut E) -> &mut InputChannels {
    env.as_mut()
}

//=== Context =============================================================

/// A state machine for one logical mode hierarchy.
///
/// Build with [`ContextBuilder`], call [`Context::start`] once, then drive
/// it with [`Context::update`] and [`Context::fixed_update`] every frame.
///
/// ```rust
/// # use arcade_modes::prelude::*;
/// #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// enum Mode { Idle, Play }
/// impl StateKey for Mode {}
///
/// struct Idle;
/// impl State<Mode, InputChannels> for Idle {
///     fn on_update(&mut self, _cx: &mut StateCx<'_, Mode, InputChannels>, _dt: f32) {}
/// }
///
/// struct Play;
/// impl State<Mode, InputChannels> for Play {
///     fn on_update(&mut self, cx: &mut StateCx<'_, Mode, InputChannels>, _dt: f32) {
///         cx.transition_to_previous();
///     }
/// }
///
/// let mut input = InputChannels::new();
/// let mut context = Context::builder(Mode::Idle)
///     .state(Mode::Idle, Idle)
///     .state(Mode::Play, Play)
///     .build()
///     .unwrap();
///
/// context.start(&mut input);
/// context.transition_to(Mode::Play, &mut input);
/// assert_eq!(context.history().to_vec(), vec![Mode::Idle]);
///
/// context.update(&mut input, 0.016);
/// assert_eq!(context.current(), Some(Mode::Idle));
/// assert!(context.history().is_empty());
/// ```
pub struct Context<K: StateKey, E> {
    name: &'static str,
    slots: HashMap<K, Slot<K, E>>,
    current: Option<K>,
    initial: K,
    default: K,
    history: History<K>,
    queue: TransitionQueue<K>,
    max_settle_passes: usize,
    nested: bool,
    transition_count: u64,
    observers: Vec<Observer<K>>,
}

impl<K: StateKey, E> Context<K, E> {
    //--- Construction -----------------------------------------------------

    /// Starts a builder whose machine enters `initial` on start.
    pub fn builder(initial: K) -> ContextBuilder<K, E> {
        ContextBuilder::new(initial)
    }

    pub(super) fn from_parts(
        name: &'static str,
        slots: HashMap<K, Slot<K, E>>,
        initial: K,
        default: K,
        history_capacity: usize,
        max_settle_passes: usize,
    ) -> Self {
        Self {
            name,
            slots,
            current: None,
            initial,
            default,
            history: History::with_capacity(history_capacity),
            queue: TransitionQueue::new(),
            max_settle_passes,
            nested: false,
            transition_count: 0,
            observers: Vec::new(),
        }
    }

    pub(super) fn mark_nested(&mut self) {
        self.nested = true;
    }

    /// Registers a callback raised after every settled transition.
    pub fn on_transition<F>(&mut self, observer: F)
    where
        F: FnMut(&TransitionEvent<K>) + 'static,
    {
        self.observers.push(Box::new(observer));
    }

    //--- Introspection ----------------------------------------------------

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Key of the active state, `None` before `start` or after `shutdown`.
    pub fn current(&self) -> Option<K> {
        self.current
    }

    pub fn is_started(&self) -> bool {
        self.current.is_some()
    }

    pub fn history(&self) -> &History<K> {
        &self.history
    }

    pub fn initial_state(&self) -> K {
        self.initial
    }

    /// State entered when back-navigation finds the history empty.
    pub fn default_state(&self) -> K {
        self.default
    }

    pub fn is_registered(&self, key: K) -> bool {
        self.slots.contains_key(&key)
    }

    /// Whether the state behind `key` has been constructed yet.
    pub fn is_built(&self, key: K) -> bool {
        self.slots.get(&key).is_some_and(Slot::is_built)
    }

    /// Requests queued but not yet applied.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Number of settled transitions, including the start.
    pub fn transition_count(&self) -> u64 {
        self.transition_count
    }

    /// Returns and resets the "yield to parent" flag raised by a state.
    pub fn take_yield(&mut self) -> bool {
        self.queue.take_yield()
    }
}

impl<K: StateKey, E: AsMut<InputChannels>> Context<K, E> {
    //--- Lifecycle --------------------------------------------------------

    /// Enters the initial state and applies anything queued before start.
    pub fn start(&mut self, env: &mut E) {
        if let Some(current) = self.current {
            warn!("[{}] Context already started in {:?}, ignoring start", self.name, current);
            return;
        }

        info!("[{}] Starting with initial state {:?}", self.name, self.initial);
        self.switch(self.initial, TransitionKind::Start, env);
        self.settle(env);
    }

    /// Exits the current state and clears history and pending requests.
    ///
    /// The context can be started again afterwards.
    pub fn shutdown(&mut self, env: &mut E) {
        let Some(key) = self.current else {
            return;
        };

        info!("[{}] Shutting down from {:?}", self.name, key);

        if let Some(state) = self.slots.get_mut(&key).and_then(|s| s.get()) {
            state.disable_input(channels(env));
            let mut cx = StateCx::new(env, &mut self.queue, key);
            state.on_exit(&mut cx);
        }
        self.current = None;

        if !self.queue.is_empty() {
            debug!("[{}] Discarding {} pending request(s)", self.name, self.queue.len());
        }
        self.queue.clear();
        self.history.clear();
    }

    //--- Update Loop ------------------------------------------------------

    /// Forwards the frame tick to the current state, then settles.
    pub fn update(&mut self, env: &mut E, dt: f32) {
        let Some(key) = self.current else {
            return;
        };

        if let Some(state) = self.slots.get_mut(&key).and_then(|s| s.get()) {
            let mut cx = StateCx::new(env, &mut self.queue, key);
            state.on_update(&mut cx, dt);
        }

        self.settle(env);
    }

    /// Forwards the fixed-step tick to the current state, then settles.
    pub fn fixed_update(&mut self, env: &mut E, dt: f32) {
        let Some(key) = self.current else {
            return;
        };

        if let Some(state) = self.slots.get_mut(&key).and_then(|s| s.get()) {
            let mut cx = StateCx::new(env, &mut self.queue, key);
            state.on_fixed_update(&mut cx, dt);
        }

        self.settle(env);
    }

    //--- Transition API ---------------------------------------------------

    /// Switches to `target`, pushing the current state onto history.
    pub fn transition_to(&mut self, target: K, env: &mut E) {
        self.request(TransitionRequest::push(target), env);
    }

    /// Switches to `target` without recording the current state.
    pub fn replace_with(&mut self, target: K, env: &mut E) {
        self.request(TransitionRequest::replace(target), env);
    }

    /// Returns to the most recent history entry, or the default state
    /// when history is empty.
    pub fn transition_to_previous(&mut self, env: &mut E) {
        self.request(TransitionRequest::Previous, env);
    }

    /// Queues `request` and settles. Before `start` the request waits in
    /// the queue and is applied right after the initial state is entered.
    pub fn request(&mut self, request: TransitionRequest<K>, env: &mut E) {
        self.queue.push(request);
        if self.current.is_none() {
            debug!("[{}] Not started, deferring {:?}", self.name, request);
            return;
        }
        self.settle(env);
    }

    //--- Internal Helpers -------------------------------------------------

    /// Applies queued requests in FIFO order until the queue is empty or
    /// the pass limit is reached. Requests issued by on_exit/on_enter land
    /// at the back of the queue and are picked up by a later pass.
    fn settle(&mut self, env: &mut E) {
        if !self.nested && self.queue.take_yield() {
            warn!("[{}] yield_to_parent on a root context has no parent, ignored", self.name);
        }

        if self.current.is_none() {
            return;
        }

        let mut applied = 0;
        while let Some(request) = self.queue.pop() {
            if applied == self.max_settle_passes {
                self.queue.push_front(request);
                warn!(
                    "[{}] {} request(s) deferred to next tick after {} passes",
                    self.name,
                    self.queue.len(),
                    applied
                );
                break;
            }
            self.apply(request, env);
            applied += 1;
        }
    }

    fn apply(&mut self, request: TransitionRequest<K>, env: &mut E) {
        match request {
            TransitionRequest::To { target, push_history } => {
                if !self.slots.contains_key(&target) {
                    error!(
                        "[{}] Transition to unregistered state {:?}, falling back to {:?}",
                        self.name, target, self.default
                    );
                    self.fall_back(env);
                    return;
                }

                let kind = if self.current == Some(target) {
                    TransitionKind::Reenter
                } else if push_history {
                    TransitionKind::Push
                } else {
                    TransitionKind::Replace
                };
                self.switch(target, kind, env);
            }
            TransitionRequest::Previous => match self.history.pop() {
                Some(previous) => self.switch(previous, TransitionKind::Back, env),
                None => {
                    debug!("[{}] History empty, returning to default", self.name);
                    self.fall_back(env);
                }
            },
        }
    }

    fn fall_back(&mut self, env: &mut E) {
        if self.current == Some(self.default) {
            debug!("[{}] Already in default state {:?}", self.name, self.default);
            return;
        }
        self.switch(self.default, TransitionKind::Fallback, env);
    }

    fn switch(&mut self, target: K, kind: TransitionKind, env: &mut E) {
        let from = self.current;

        // Leave the outgoing state
        if let Some(from_key) = from {
            if let Some(state) = self.slots.get_mut(&from_key).and_then(|s| s.get()) {
                state.disable_input(channels(env));
                let mut cx = StateCx::new(env, &mut self.queue, from_key);
                state.on_exit(&mut cx);
            }
            self.current = None;

            if kind == TransitionKind::Push {
                if let Some(evicted) = self.history.push(from_key) {
                    debug!("[{}] History full, evicted {:?}", self.name, evicted);
                }
            }
        }

        // The active state never appears in history
        if self.history.remove(target) > 0 {
            debug!("[{}] Dropped stale history entries for {:?}", self.name, target);
        }

        // Enter the incoming state
        self.current = Some(target);
        if !self.is_built(target) {
            let declared = self
                .slots
                .get_mut(&target)
                .and_then(|s| s.get())
                .map(|s| s.targets())
                .unwrap_or_default();
            debug!("[{}] Constructed state {:?} on first activation", self.name, target);
            for key in declared {
                if !self.slots.contains_key(&key) {
                    error!(
                        "[{}] State {:?} declares unregistered target {:?}",
                        self.name, target, key
                    );
                }
            }
        }
        match self.slots.get_mut(&target).and_then(|s| s.get()) {
            Some(state) => {
                let mut cx = StateCx::new(env, &mut self.queue, target);
                state.on_enter(&mut cx);
                state.enable_input(channels(env));
            }
            None => error!("[{}] State {:?} has no instance", self.name, target),
        }

        debug!("[{}] {:?} -> {:?} ({:?})", self.name, from, target, kind);
        self.transition_count += 1;

        let event = TransitionEvent {
            from,
            to: target,
            kind,
        };
        for observer in &mut self.observers {
            observer(&event);
        }
    }
}

//=== Tests ===============================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::input::ChannelGroup;
    use crate::core::state::BuildError;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Clone, Copy, Eq, PartialEq, Hash, Debug)]
    enum Mode {
        Idle,
        Ready,
        Edit,
        Bounce,
        Ghost,
    }

    impl StateKey for Mode {}

    //--- Test Environment -------------------------------------------------

    #[derive(Default)]
    struct Env {
        input: InputChannels,
        log: Vec<String>,
    }

    impl AsMut<InputChannels> for Env {
        fn as_mut(&mut self) -> &mut InputChannels {
            &mut self.input
        }
    }

    /// Logs every lifecycle call and optionally issues a request from
    /// on_enter or on_exit.
    struct Tracer {
        key: Mode,
        channel: ChannelGroup,
        on_enter_request: Option<TransitionRequest<Mode>>,
        on_exit_request: Option<TransitionRequest<Mode>>,
        on_update_request: Option<TransitionRequest<Mode>>,
    }

    impl Tracer {
        fn new(key: Mode, channel: &'static str) -> Self {
            Self {
                key,
                channel: ChannelGroup::new(channel),
                on_enter_request: None,
                on_exit_request: None,
                on_update_request: None,
            }
        }

        fn issue(cx: &mut StateCx<'_, Mode, Env>, request: Option<TransitionRequest<Mode>>) {
            match request {
                Some(TransitionRequest::To { target, push_history: true }) => cx.transition_to(target),
                Some(TransitionRequest::To { target, push_history: false }) => cx.replace_with(target),
                Some(TransitionRequest::Previous) => cx.transition_to_previous(),
                None => {}
            }
        }
    }

    impl State<Mode, Env> for Tracer {
        fn on_enter(&mut self, cx: &mut StateCx<'_, Mode, Env>) {
            cx.env.log.push(format!("enter {:?}", self.key));
            Self::issue(cx, self.on_enter_request.take());
        }

        fn on_update(&mut self, cx: &mut StateCx<'_, Mode, Env>, _dt: f32) {
            cx.env.log.push(format!("update {:?}", self.key));
            Self::issue(cx, self.on_update_request);
        }

        fn on_fixed_update(&mut self, cx: &mut StateCx<'_, Mode, Env>, _dt: f32) {
            cx.env.log.push(format!("fixed {:?}", self.key));
        }

        fn on_exit(&mut self, cx: &mut StateCx<'_, Mode, Env>) {
            cx.env.log.push(format!("exit {:?}", self.key));
            Self::issue(cx, self.on_exit_request.take());
        }

        fn enable_input(&mut self, input: &mut InputChannels) {
            input.enable(self.channel);
        }

        fn disable_input(&mut self, input: &mut InputChannels) {
            input.disable(self.channel);
        }
    }

    fn standard() -> ContextBuilder<Mode, Env> {
        Context::builder(Mode::Idle)
            .named("test")
            .state(Mode::Idle, Tracer::new(Mode::Idle, "idle"))
            .state(Mode::Ready, Tracer::new(Mode::Ready, "ready"))
            .state(Mode::Edit, Tracer::new(Mode::Edit, "edit"))
    }

    fn started(builder: ContextBuilder<Mode, Env>) -> (Context<Mode, Env>, Env) {
        let mut env = Env::default();
        let mut context = builder.build().unwrap();
        context.start(&mut env);
        env.log.clear();
        (context, env)
    }

    //--- Start & Tick -----------------------------------------------------

    #[test]
    fn update_before_start_is_noop() {
        let mut env = Env::default();
        let mut context = standard().build().unwrap();

        context.update(&mut env, 0.1);
        context.fixed_update(&mut env, 0.1);

        assert_eq!(context.current(), None);
        assert!(env.log.is_empty());
    }

    #[test]
    fn start_enters_initial_and_enables_input() {
        let mut env = Env::default();
        let mut context = standard().build().unwrap();
        context.start(&mut env);

        assert_eq!(context.current(), Some(Mode::Idle));
        assert_eq!(env.log, vec!["enter Idle"]);
        assert!(env.input.is_enabled(ChannelGroup::new("idle")));
        assert!(context.history().is_empty());
        assert_eq!(context.transition_count(), 1);
    }

    #[test]
    fn second_start_is_ignored() {
        let (mut context, mut env) = started(standard());
        context.start(&mut env);

        assert!(env.log.is_empty());
        assert_eq!(context.transition_count(), 1);
    }

    #[test]
    fn ticks_reach_only_current_state() {
        let (mut context, mut env) = started(standard());
        context.update(&mut env, 0.016);
        context.fixed_update(&mut env, 0.02);

        assert_eq!(env.log, vec!["update Idle", "fixed Idle"]);
    }

    //--- Ordering ---------------------------------------------------------

    #[test]
    fn exit_completes_before_enter() {
        let (mut context, mut env) = started(standard());
        context.transition_to(Mode::Ready, &mut env);

        assert_eq!(env.log, vec!["exit Idle", "enter Ready"]);
        assert_eq!(context.current(), Some(Mode::Ready));
    }

    #[test]
    fn input_ownership_moves_with_current_state() {
        let (mut context, mut env) = started(standard());
        context.transition_to(Mode::Edit, &mut env);

        assert!(!env.input.is_enabled(ChannelGroup::new("idle")));
        assert!(env.input.is_enabled(ChannelGroup::new("edit")));
        assert_eq!(env.input.exclusive_owner_count(), 1);
    }

    //--- History ----------------------------------------------------------

    #[test]
    fn back_returns_without_repushing() {
        let (mut context, mut env) = started(standard());
        context.transition_to(Mode::Ready, &mut env);
        context.transition_to_previous(&mut env);

        assert_eq!(context.current(), Some(Mode::Idle));
        assert!(context.history().is_empty());
    }

    #[test]
    fn edit_then_back_restores_history() {
        let (mut context, mut env) = started(standard());
        context.transition_to(Mode::Ready, &mut env);
        let before = context.history().to_vec();

        context.transition_to(Mode::Edit, &mut env);
        context.transition_to_previous(&mut env);

        assert_eq!(context.current(), Some(Mode::Ready));
        assert_eq!(context.history().to_vec(), before);
        assert_eq!(before, vec![Mode::Idle]);
    }

    #[test]
    fn empty_history_falls_back_to_default() {
        let builder = standard().default_state(Mode::Ready);
        let (mut context, mut env) = started(builder);

        context.transition_to_previous(&mut env);
        assert_eq!(context.current(), Some(Mode::Ready));

        // Already at default: nothing happens
        env.log.clear();
        context.transition_to_previous(&mut env);
        assert_eq!(context.current(), Some(Mode::Ready));
        assert!(env.log.is_empty());
    }

    #[test]
    fn replace_does_not_touch_history() {
        let (mut context, mut env) = started(standard());
        context.replace_with(Mode::Ready, &mut env);

        assert_eq!(context.current(), Some(Mode::Ready));
        assert!(context.history().is_empty());
    }

    #[test]
    fn history_never_holds_current_state() {
        let (mut context, mut env) = started(standard());
        context.transition_to(Mode::Ready, &mut env);
        context.transition_to(Mode::Edit, &mut env);
        context.transition_to(Mode::Idle, &mut env);

        assert_eq!(context.history().to_vec(), vec![Mode::Ready, Mode::Edit]);
        assert!(!context.history().contains(Mode::Idle));
    }

    #[test]
    fn history_is_bounded() {
        let (mut context, mut env) = started(standard().history_capacity(2));
        context.transition_to(Mode::Ready, &mut env);
        context.transition_to(Mode::Edit, &mut env);
        context.transition_to(Mode::Ready, &mut env);

        assert!(context.history().len() <= 2);
        assert_eq!(context.history().to_vec(), vec![Mode::Edit]);
    }

    #[test]
    fn self_transition_reenters_without_history() {
        let (mut context, mut env) = started(standard());
        context.transition_to(Mode::Idle, &mut env);

        assert_eq!(env.log, vec!["exit Idle", "enter Idle"]);
        assert!(context.history().is_empty());
    }

    //--- Re-entrancy ------------------------------------------------------

    #[test]
    fn request_from_on_enter_applies_after_settling() {
        let mut bounce = Tracer::new(Mode::Bounce, "bounce");
        bounce.on_enter_request = Some(TransitionRequest::push(Mode::Edit));
        let (mut context, mut env) = started(standard().state(Mode::Bounce, bounce));

        context.transition_to(Mode::Bounce, &mut env);

        assert_eq!(
            env.log,
            vec!["exit Idle", "enter Bounce", "exit Bounce", "enter Edit"]
        );
        assert_eq!(context.current(), Some(Mode::Edit));
        assert_eq!(context.history().to_vec(), vec![Mode::Idle, Mode::Bounce]);
    }

    #[test]
    fn request_from_on_exit_is_queued_behind_current() {
        let mut idle = Tracer::new(Mode::Idle, "idle");
        idle.on_exit_request = Some(TransitionRequest::replace(Mode::Edit));
        let builder = Context::builder(Mode::Idle)
            .state(Mode::Idle, idle)
            .state(Mode::Ready, Tracer::new(Mode::Ready, "ready"))
            .state(Mode::Edit, Tracer::new(Mode::Edit, "edit"));
        let (mut context, mut env) = started(builder);

        context.transition_to(Mode::Ready, &mut env);

        assert_eq!(
            env.log,
            vec!["exit Idle", "enter Ready", "exit Ready", "enter Edit"]
        );
        assert_eq!(context.current(), Some(Mode::Edit));
    }

    #[test]
    fn update_requests_apply_after_the_tick() {
        let mut idle = Tracer::new(Mode::Idle, "idle");
        idle.on_update_request = Some(TransitionRequest::push(Mode::Ready));
        let builder = Context::builder(Mode::Idle)
            .state(Mode::Idle, idle)
            .state(Mode::Ready, Tracer::new(Mode::Ready, "ready"));
        let (mut context, mut env) = started(builder);

        context.update(&mut env, 0.016);

        assert_eq!(env.log, vec!["update Idle", "exit Idle", "enter Ready"]);
        assert_eq!(context.pending(), 0);
    }

    #[test]
    fn settle_limit_defers_remaining_requests() {
        let mut ready = Tracer::new(Mode::Ready, "ready");
        ready.on_enter_request = Some(TransitionRequest::replace(Mode::Edit));
        let builder = Context::builder(Mode::Idle)
            .state(Mode::Idle, Tracer::new(Mode::Idle, "idle"))
            .state(Mode::Ready, ready)
            .state(Mode::Edit, Tracer::new(Mode::Edit, "edit"))
            .max_settle_passes(1);
        let (mut context, mut env) = started(builder);

        context.transition_to(Mode::Ready, &mut env);
        assert_eq!(context.current(), Some(Mode::Ready));
        assert_eq!(context.pending(), 1);

        context.update(&mut env, 0.016);
        assert_eq!(context.current(), Some(Mode::Edit));
        assert_eq!(context.pending(), 0);
        assert_eq!(
            env.log,
            vec!["exit Idle", "enter Ready", "update Ready", "exit Ready", "enter Edit"]
        );
    }

    #[test]
    fn requests_from_one_callback_apply_in_order() {
        struct Chain;

        impl State<Mode, Env> for Chain {
            fn on_update(&mut self, cx: &mut StateCx<'_, Mode, Env>, _dt: f32) {
                cx.transition_to(Mode::Ready);
                cx.replace_with(Mode::Edit);
                let pending = cx.pending();
                cx.env.log.push(format!("queued {}", pending));
            }
        }

        let builder = Context::builder(Mode::Idle)
            .state(Mode::Idle, Chain)
            .state(Mode::Ready, Tracer::new(Mode::Ready, "ready"))
            .state(Mode::Edit, Tracer::new(Mode::Edit, "edit"));
        let (mut context, mut env) = started(builder);

        context.update(&mut env, 0.016);

        assert_eq!(
            env.log,
            vec!["queued 2", "enter Ready", "exit Ready", "enter Edit"]
        );
        assert_eq!(context.current(), Some(Mode::Edit));
        assert_eq!(context.history().to_vec(), vec![Mode::Idle]);
    }

    #[test]
    fn requests_before_start_run_after_initial_enter() {
        let mut env = Env::default();
        let mut context = standard().build().unwrap();

        context.transition_to(Mode::Edit, &mut env);
        assert_eq!(context.current(), None);
        assert_eq!(context.pending(), 1);

        context.start(&mut env);
        assert_eq!(env.log, vec!["enter Idle", "exit Idle", "enter Edit"]);
        assert_eq!(context.history().to_vec(), vec![Mode::Idle]);
    }

    //--- Fallbacks & Observers --------------------------------------------

    #[test]
    fn unregistered_target_falls_back_to_default() {
        let mut ready = Tracer::new(Mode::Ready, "ready");
        ready.on_update_request = Some(TransitionRequest::push(Mode::Ghost));
        let builder = Context::builder(Mode::Ready)
            .state(Mode::Idle, Tracer::new(Mode::Idle, "idle"))
            .state(Mode::Ready, ready)
            .default_state(Mode::Idle);
        let (mut context, mut env) = started(builder);

        context.update(&mut env, 0.016);

        assert_eq!(context.current(), Some(Mode::Idle));
    }

    #[test]
    fn observers_see_each_settled_transition_once() {
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&events);

        let mut env = Env::default();
        let mut context = standard().build().unwrap();
        context.on_transition(move |e| sink.borrow_mut().push(*e));

        context.start(&mut env);
        context.transition_to(Mode::Ready, &mut env);
        context.replace_with(Mode::Edit, &mut env);
        context.transition_to_previous(&mut env);
        context.transition_to_previous(&mut env);

        let kinds: Vec<_> = events.borrow().iter().map(|e| (e.from, e.to, e.kind)).collect();
        assert_eq!(
            kinds,
            vec![
                (None, Mode::Idle, TransitionKind::Start),
                (Some(Mode::Idle), Mode::Ready, TransitionKind::Push),
                (Some(Mode::Ready), Mode::Edit, TransitionKind::Replace),
                (Some(Mode::Edit), Mode::Idle, TransitionKind::Back),
            ]
        );
    }

    #[test]
    fn lazy_state_is_built_once_on_first_entry() {
        let builds = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&builds);
        let builder = standard().lazy_state(Mode::Bounce, [], move || {
            *counter.borrow_mut() += 1;
            Tracer::new(Mode::Bounce, "bounce")
        });
        let (mut context, mut env) = started(builder);
        assert!(!context.is_built(Mode::Bounce));

        context.transition_to(Mode::Bounce, &mut env);
        context.transition_to_previous(&mut env);
        context.transition_to(Mode::Bounce, &mut env);

        assert!(context.is_built(Mode::Bounce));
        assert_eq!(*builds.borrow(), 1);
    }

    #[test]
    fn shutdown_exits_and_clears() {
        let (mut context, mut env) = started(standard());
        context.transition_to(Mode::Ready, &mut env);
        env.log.clear();

        context.shutdown(&mut env);

        assert_eq!(env.log, vec!["exit Ready"]);
        assert_eq!(context.current(), None);
        assert!(context.history().is_empty());
        assert_eq!(env.input.exclusive_owner_count(), 0);
    }

    #[test]
    fn duplicate_registration_fails_before_any_tick() {
        let result = standard().state(Mode::Ready, Tracer::new(Mode::Ready, "again")).build();
        assert_eq!(
            result.err(),
            Some(BuildError::DuplicateState { key: "Ready".to_string() })
        );
    }
}
