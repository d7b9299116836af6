//=========================================================================
// Async Load State
//=========================================================================
//
// A State that starts a cooperative background task on entry and
// replaces itself with a follow-on state once the task reports 100%.
//
// Phases:
//   Idle ──on_enter──> Loading ──complete──> Ready ──on_exit──> Idle
//                         │
//                         └──on_exit / timeout / missing config──> Idle
//
// The frame thread never blocks: every tick polls the task once, reports
// progress to the status sink and returns. Leaving the state while it is
// Loading cancels the task; anything the task reports afterwards is
// discarded because the phase is no longer Loading.
//
//=========================================================================

//=== External Dependencies ===============================================

use log::{debug, error, info, warn};

//=== Internal Dependencies ===============================================

use super::{LoadConfig, State, StateCx, StateKey, TaskError};

//=== Collaborator Traits =================================================

/// Cooperative unit of work polled once per tick.
pub trait LoadTask {
    /// Progress in percent. Values at or above 100 mean complete.
    fn percent_complete(&mut self) -> f32;

    /// Polls once. Callers that also need the percentage should read
    /// `percent_complete` instead of calling both.
    fn is_complete(&mut self) -> bool {
        self.percent_complete() >= 100.0
    }

    /// Asks the work to stop. Later progress must not be delivered.
    fn cancel(&mut self);
}

/// UI collaborator that shows loading progress.
pub trait ProgressSink {
    fn init_status_bar(&mut self, text: &str);
    fn update_status_bar(&mut self, percent: f32);
}

/// Sink that reports progress through the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogProgress;

impl ProgressSink for LogProgress {
    fn init_status_bar(&mut self, text: &str) {
        info!("{}", text);
    }

    fn update_status_bar(&mut self, percent: f32) {
        debug!("Loading {:.0}%", percent);
    }
}

//=== LoadPhase ===========================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadPhase {
    #[default]
    Idle,
    Loading,
    Ready,
}

type TaskStarter<E> = Box<dyn FnMut(&mut E) -> Result<Box<dyn LoadTask>, TaskError>>;
type NextResolver<K, E> = Box<dyn FnMut(&E) -> Option<K>>;

//=== AsyncLoad ===========================================================

/// Loading state that hands over to a configured follow-on state.
///
/// The follow-on key is resolved once, on entry, from the host
/// environment. When nothing is configured, the task fails to start or the
/// timeout expires, the state replaces itself with `fallback`.
///
/// Completion uses a replace transition: the loader never appears in
/// history, so "back" from the loaded mode skips it.
pub struct AsyncLoad<K: StateKey, E> {
    config: LoadConfig,
    start: TaskStarter<E>,
    resolve_next: NextResolver<K, E>,
    fallback: K,
    candidates: Vec<K>,
    sink: Box<dyn ProgressSink>,
    phase: LoadPhase,
    task: Option<Box<dyn LoadTask>>,
    next: Option<K>,
    elapsed: f32,
}

impl<K: StateKey, E> AsyncLoad<K, E> {
    //--- Construction -----------------------------------------------------

    /// Creates a loader.
    ///
    /// - `fallback`: entered when loading cannot finish
    /// - `start`: starts the task from the environment
    /// - `resolve_next`: picks the follow-on state from configuration
    /// - `sink`: progress display
    pub fn new<S, R, P>(fallback: K, start: S, resolve_next: R, sink: P) -> Self
    where
        S: FnMut(&mut E) -> Result<Box<dyn LoadTask>, TaskError> + 'static,
        R: FnMut(&E) -> Option<K> + 'static,
        P: ProgressSink + 'static,
    {
        Self {
            config: LoadConfig::default(),
            start: Box::new(start),
            resolve_next: Box::new(resolve_next),
            fallback,
            candidates: Vec::new(),
            sink: Box::new(sink),
            phase: LoadPhase::Idle,
            task: None,
            next: None,
            elapsed: 0.0,
        }
    }

    /// Replaces the tunables. A non-positive timeout disables the timeout.
    pub fn with_config(mut self, mut config: LoadConfig) -> Self {
        if let Some(secs) = config.timeout_secs.filter(|secs| *secs <= 0.0) {
            warn!("Ignoring non-positive load timeout {}", secs);
            config.timeout_secs = None;
        }
        self.config = config;
        self
    }

    pub fn with_status_text(mut self, text: impl Into<String>) -> Self {
        self.config.status_text = text.into();
        self
    }

    /// Gives up after `secs` seconds of Loading.
    ///
    /// # Panics
    ///
    /// Panics if `secs <= 0.0`.
    pub fn with_timeout(mut self, secs: f32) -> Self {
        assert!(secs > 0.0, "Load timeout must be positive, got {}", secs);
        self.config.timeout_secs = Some(secs);
        self
    }

    /// Follow-on states `resolve_next` may return; validated by the builder.
    pub fn with_candidates(mut self, candidates: impl IntoIterator<Item = K>) -> Self {
        self.candidates = candidates.into_iter().collect();
        self
    }

    //--- Queries ----------------------------------------------------------

    pub fn phase(&self) -> LoadPhase {
        self.phase
    }

    /// Seconds spent in the current Loading phase.
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn next_state(&self) -> Option<K> {
        self.next
    }

    //--- Internal Helpers -------------------------------------------------

    fn abandon(&mut self, cx: &mut StateCx<'_, K, E>, reason: &str) {
        warn!("Load abandoned ({}), falling back to {:?}", reason, self.fallback);
        if let Some(mut task) = self.task.take() {
            task.cancel();
        }
        self.phase = LoadPhase::Idle;
        cx.replace_with(self.fallback);
    }
}

impl<K: StateKey, E> State<K, E> for AsyncLoad<K, E> {
    fn on_enter(&mut self, cx: &mut StateCx<'_, K, E>) {
        self.phase = LoadPhase::Loading;
        self.elapsed = 0.0;
        self.task = None;
        self.next = (self.resolve_next)(&*cx.env);

        let Some(next) = self.next else {
            warn!("No follow-on state configured for {:?}", cx.current());
            return;
        };

        debug!("Loading towards {:?}", next);
        self.sink.init_status_bar(&self.config.status_text);
        match (self.start)(&mut *cx.env) {
            Ok(task) => self.task = Some(task),
            Err(e) => error!("Could not start load task: {}", e),
        }
    }

    fn on_update(&mut self, cx: &mut StateCx<'_, K, E>, dt: f32) {
        if self.phase != LoadPhase::Loading {
            return;
        }

        let Some(next) = self.next else {
            self.abandon(cx, "no follow-on state");
            return;
        };
        let Some(task) = self.task.as_mut() else {
            self.abandon(cx, "task not running");
            return;
        };

        // One poll per tick; a worker may finish between two reads
        let percent = task.percent_complete();
        if percent >= 100.0 {
            self.task = None;
            self.phase = LoadPhase::Ready;
            info!("Load complete after {:.2}s, entering {:?}", self.elapsed, next);
            cx.replace_with(next);
            return;
        }

        self.sink.update_status_bar(percent.max(0.0));

        self.elapsed += dt;
        if let Some(limit) = self.config.timeout_secs {
            if self.elapsed >= limit {
                self.abandon(cx, "timed out");
            }
        }
    }

    fn on_exit(&mut self, _cx: &mut StateCx<'_, K, E>) {
        if self.phase == LoadPhase::Loading {
            if let Some(mut task) = self.task.take() {
                debug!("Leaving while loading, cancelling task");
                task.cancel();
            }
        }
        self.task = None;
        self.next = None;
        self.phase = LoadPhase::Idle;
    }

    fn targets(&self) -> Vec<K> {
        let mut targets = self.candidates.clone();
        targets.push(self.fallback);
        targets
    }
}

//=== Tests ===============================================================
