//=========================================================================
// Frame Driver
//
// Drives a root Context from the host's frame loop.
//
// Architecture:
// ```text
//     FrameDriverBuilder ──build()──> FrameDriver ──frame(dt)──> Context
//         │                               │
//         ├─ with_fixed_rate()            ├─ fixed_update × N  (accumulator)
//         ├─ with_max_fixed_steps()       └─ update × 1
//         └─ with_frame_rate()
// ```
//
// Notes:
// Everything runs on the caller's thread. `frame` is the whole per-frame
// contract; `run_until` is a convenience loop with real-time pacing for
// hosts that have no loop of their own.
//
//=========================================================================

//=== Standard Library Imports ============================================

use std::thread;
use std::time::{Duration, Instant};

//=== External Crates =====================================================

use log::{info, warn};

//=== Internal Modules ====================================================

use crate::core::input::InputChannels;
use crate::core::state::{Context, StateKey};

//=== FrameDriverBuilder ==================================================

/// Builder for a [`FrameDriver`].
///
/// # Default Values
///
/// - **Fixed rate**: 60.0 fixed steps per second
/// - **Max fixed steps**: 5 per frame
/// - **Frame rate**: 60.0 (only used by [`FrameDriver::run_until`])
///
/// # Examples
///
/// ```
/// use arcade_modes::prelude::*;
///
/// let driver = FrameDriverBuilder::new()
///     .with_fixed_rate(120.0)
///     .with_max_fixed_steps(8)
///     .build();
/// assert_eq!(driver.max_fixed_steps(), 8);
/// ```
#[derive(Debug, Clone)]
pub struct FrameDriverBuilder {
    fixed_rate: f64,
    max_fixed_steps: usize,
    frame_rate: f64,
}

impl FrameDriverBuilder {
    pub fn new() -> Self {
        Self {
            fixed_rate: 60.0,
            max_fixed_steps: 5,
            frame_rate: 60.0,
        }
    }

    /// Sets how many fixed steps run per simulated second.
    ///
    /// # Panics
    ///
    /// Panics if `rate <= 0.0`.
    pub fn with_fixed_rate(mut self, rate: f64) -> Self {
        assert!(rate > 0.0, "Fixed rate must be positive, got {}", rate);
        self.fixed_rate = rate;
        self
    }

    /// Caps fixed steps per frame. Surplus accumulated time is dropped so a
    /// long stall does not turn into a burst of catch-up steps.
    ///
    /// # Panics
    ///
    /// Panics if `steps == 0`.
    pub fn with_max_fixed_steps(mut self, steps: usize) -> Self {
        assert!(steps > 0, "Max fixed steps must be positive");
        self.max_fixed_steps = steps;
        self
    }

    /// Target frames per second for [`FrameDriver::run_until`].
    ///
    /// # Panics
    ///
    /// Panics if `fps <= 0.0`.
    pub fn with_frame_rate(mut self, fps: f64) -> Self {
        assert!(fps > 0.0, "Frame rate must be positive, got {}", fps);
        self.frame_rate = fps;
        self
    }

    pub fn build(self) -> FrameDriver {
        info!(
            "Building frame driver (fixed rate: {}, max steps: {}, frame rate: {})",
            self.fixed_rate, self.max_fixed_steps, self.frame_rate
        );

        FrameDriver {
            fixed_dt: 1.0 / self.fixed_rate,
            max_fixed_steps: self.max_fixed_steps,
            frame_duration: Duration::from_secs_f64(1.0 / self.frame_rate),
            accumulator: 0.0,
            frames: 0,
        }
    }
}

impl Default for FrameDriverBuilder {
    fn default() -> Self {
        Self::new()
    }
}

//=== FrameReport =========================================================

/// What a single [`FrameDriver::frame`] call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameReport {
    /// Fixed steps forwarded to the context.
    pub fixed_steps: usize,

    /// Whole fixed steps discarded because the per-frame cap was reached.
    pub dropped_steps: usize,
}

//=== FrameDriver =========================================================

/// Per-frame tick source for a root [`Context`].
#[derive(Debug)]
pub struct FrameDriver {
    fixed_dt: f64,
    max_fixed_steps: usize,
    frame_duration: Duration,
    accumulator: f64,
    frames: u64,
}

impl FrameDriver {
    pub fn builder() -> FrameDriverBuilder {
        FrameDriverBuilder::new()
    }

    /// Seconds per fixed step.
    pub fn fixed_dt(&self) -> f64 {
        self.fixed_dt
    }

    pub fn max_fixed_steps(&self) -> usize {
        self.max_fixed_steps
    }

    /// Simulated time not yet consumed by a fixed step.
    pub fn accumulator(&self) -> f64 {
        self.accumulator
    }

    /// Frames driven so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    //--- frame() ----------------------------------------------------------
    //
    // One host frame:
    //  1. Adds dt to the accumulator
    //  2. Runs whole fixed steps, at most max_fixed_steps
    //  3. Drops surplus whole steps
    //  4. Runs one variable update with the real dt
    //
    pub fn frame<K, E>(&mut self, context: &mut Context<K, E>, env: &mut E, dt: f32) -> FrameReport
    where
        K: StateKey,
        E: AsMut<InputChannels>,
    {
        self.frames += 1;
        self.accumulator += f64::from(dt.max(0.0));

        let mut report = FrameReport::default();
        while self.accumulator >= self.fixed_dt && report.fixed_steps < self.max_fixed_steps {
            context.fixed_update(env, self.fixed_dt as f32);
            self.accumulator -= self.fixed_dt;
            report.fixed_steps += 1;
        }

        if self.accumulator >= self.fixed_dt {
            let surplus = (self.accumulator / self.fixed_dt).floor();
            self.accumulator -= surplus * self.fixed_dt;
            report.dropped_steps = surplus as usize;
            warn!(
                "Frame {} fell behind, dropped {} fixed step(s)",
                self.frames, report.dropped_steps
            );
        }

        context.update(env, dt);
        report
    }

    //--- run_until() ------------------------------------------------------
    //
    // Real-time loop: starts the context if needed, then frames at the
    // configured rate until `stop` returns true. Returns the frame count.
    //
    pub fn run_until<K, E, F>(&mut self, context: &mut Context<K, E>, env: &mut E, mut stop: F) -> u64
    where
        K: StateKey,
        E: AsMut<InputChannels>,
        F: FnMut(&Context<K, E>, &E) -> bool,
    {
        if !context.is_started() {
            context.start(env);
        }

        info!("[{}] Frame loop running", context.name());

        let mut ran = 0;
        let mut last = Instant::now();
        while !stop(&*context, &*env) {
            let frame_start = Instant::now();
            let dt = frame_start.duration_since(last).as_secs_f32();
            last = frame_start;

            self.frame(context, env, dt);
            ran += 1;

            let elapsed = frame_start.elapsed();
            if elapsed < self.frame_duration {
                thread::sleep(self.frame_duration - elapsed);
            }
        }

        info!("[{}] Frame loop stopped after {} frame(s)", context.name(), ran);
        ran
    }
}

impl Default for FrameDriver {
    fn default() -> Self {
        FrameDriverBuilder::new().build()
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::state::{State, StateCx};

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    enum Mode {
        Idle,
        Done,
    }

    impl StateKey for Mode {}

    #[derive(Default)]
    struct Env {
        input: InputChannels,
        fixed: usize,
        updates: usize,
    }

    impl AsMut<InputChannels> for Env {
        fn as_mut(&mut self) -> &mut InputChannels {
            &mut self.input
        }
    }

    struct Counter {
        finish_after: usize,
    }

    impl State<Mode, Env> for Counter {
        fn on_update(&mut self, cx: &mut StateCx<'_, Mode, Env>, _dt: f32) {
            cx.env.updates += 1;
            if cx.env.updates == self.finish_after {
                cx.transition_to(Mode::Done);
            }
        }

        fn on_fixed_update(&mut self, cx: &mut StateCx<'_, Mode, Env>, _dt: f32) {
            cx.env.fixed += 1;
        }
    }

    struct Done;

    impl State<Mode, Env> for Done {
        fn on_update(&mut self, _cx: &mut StateCx<'_, Mode, Env>, _dt: f32) {}
    }

    fn context(finish_after: usize) -> Context<Mode, Env> {
        Context::builder(Mode::Idle)
            .state(Mode::Idle, Counter { finish_after })
            .state(Mode::Done, Done)
            .build()
            .unwrap()
    }

    //=====================================================================
    // FrameDriverBuilder Tests
    //=====================================================================

    #[test]
    fn builder_defaults() {
        let builder = FrameDriverBuilder::new();
        assert_eq!(builder.fixed_rate, 60.0);
        assert_eq!(builder.max_fixed_steps, 5);
        assert_eq!(builder.frame_rate, 60.0);
    }

    #[test]
    fn builder_with_fixed_rate() {
        let driver = FrameDriverBuilder::new().with_fixed_rate(4.0).build();
        assert_eq!(driver.fixed_dt(), 0.25);
    }

    #[test]
    #[should_panic(expected = "Fixed rate must be positive")]
    fn builder_with_fixed_rate_panics_on_zero() {
        FrameDriverBuilder::new().with_fixed_rate(0.0);
    }

    #[test]
    #[should_panic(expected = "Fixed rate must be positive")]
    fn builder_with_fixed_rate_panics_on_negative() {
        FrameDriverBuilder::new().with_fixed_rate(-60.0);
    }

    #[test]
    #[should_panic(expected = "Max fixed steps must be positive")]
    fn builder_with_max_fixed_steps_panics_on_zero() {
        FrameDriverBuilder::new().with_max_fixed_steps(0);
    }

    #[test]
    #[should_panic(expected = "Frame rate must be positive")]
    fn builder_with_frame_rate_panics_on_zero() {
        FrameDriverBuilder::new().with_frame_rate(0.0);
    }

    //=====================================================================
    // FrameDriver Tests
    //=====================================================================

    #[test]
    fn frame_before_start_is_a_no_op() {
        let mut driver = FrameDriverBuilder::new().with_fixed_rate(4.0).build();
        let mut ctx = context(100);
        let mut env = Env::default();

        let report = driver.frame(&mut ctx, &mut env, 0.5);

        assert_eq!(report.fixed_steps, 2);
        assert_eq!(env.fixed, 0);
        assert_eq!(env.updates, 0);
    }

    #[test]
    fn fixed_steps_follow_accumulated_time() {
        let mut driver = FrameDriverBuilder::new().with_fixed_rate(4.0).build();
        let mut ctx = context(100);
        let mut env = Env::default();
        ctx.start(&mut env);

        assert_eq!(driver.frame(&mut ctx, &mut env, 0.5).fixed_steps, 2);
        assert_eq!(driver.frame(&mut ctx, &mut env, 0.125).fixed_steps, 0);
        assert_eq!(driver.frame(&mut ctx, &mut env, 0.125).fixed_steps, 1);

        assert_eq!(env.fixed, 3);
        assert_eq!(env.updates, 3);
        assert_eq!(driver.accumulator(), 0.0);
        assert_eq!(driver.frames(), 3);
    }

    #[test]
    fn surplus_steps_are_dropped() {
        let mut driver = FrameDriverBuilder::new()
            .with_fixed_rate(4.0)
            .with_max_fixed_steps(2)
            .build();
        let mut ctx = context(100);
        let mut env = Env::default();
        ctx.start(&mut env);

        let report = driver.frame(&mut ctx, &mut env, 1.5);

        assert_eq!(
            report,
            FrameReport {
                fixed_steps: 2,
                dropped_steps: 4,
            }
        );
        assert_eq!(env.fixed, 2);
        assert_eq!(driver.accumulator(), 0.0);
    }

    #[test]
    fn negative_dt_adds_no_time() {
        let mut driver = FrameDriverBuilder::new().with_fixed_rate(4.0).build();
        let mut ctx = context(100);
        let mut env = Env::default();
        ctx.start(&mut env);

        let report = driver.frame(&mut ctx, &mut env, -1.0);

        assert_eq!(report.fixed_steps, 0);
        assert_eq!(driver.accumulator(), 0.0);
    }

    #[test]
    fn run_until_starts_and_stops() {
        let mut driver = FrameDriverBuilder::new().with_frame_rate(1000.0).build();
        let mut ctx = context(3);
        let mut env = Env::default();

        let frames = driver.run_until(&mut ctx, &mut env, |ctx, _| {
            ctx.current() == Some(Mode::Done)
        });

        assert_eq!(frames, 3);
        assert_eq!(env.updates, 3);
        assert_eq!(ctx.history().to_vec(), vec![Mode::Idle]);
    }
}
