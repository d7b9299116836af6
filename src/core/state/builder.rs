//=========================================================================
// Context Builder
//=========================================================================
//
// Collects the state table for a Context and validates it before any
// tick runs: duplicate keys, unknown initial/default states and declared
// targets that point outside the table are rejected here instead of
// surfacing at transition time.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::collections::HashMap;

use log::debug;

//=== Internal Dependencies ===============================================

use super::context::Slot;
use super::{BuildError, Context, ContextConfig, State, StateKey};

//=== ContextBuilder ======================================================

/// Builder for a [`Context`].
///
/// # Default Values
///
/// - **name**: `"context"` (used as the log prefix)
/// - **default state**: the initial state
/// - **config**: [`ContextConfig::default`]
pub struct ContextBuilder<K: StateKey, E> {
    name: &'static str,
    initial: K,
    default: Option<K>,
    config: ContextConfig,
    entries: Vec<(K, Slot<K, E>)>,
}

impl<K: StateKey, E> ContextBuilder<K, E> {
    /// Creates a builder whose context enters `initial` on start.
    pub fn new(initial: K) -> Self {
        Self {
            name: "context",
            initial,
            default: None,
            config: ContextConfig::default(),
            entries: Vec::new(),
        }
    }

    /// Names the context in log output.
    pub fn named(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }

    /// Registers a state instance under `key`.
    pub fn state<S>(self, key: K, state: S) -> Self
    where
        S: State<K, E> + 'static,
    {
        self.boxed_state(key, Box::new(state))
    }

    /// Registers an already boxed state under `key`.
    pub fn boxed_state(mut self, key: K, state: Box<dyn State<K, E>>) -> Self {
        self.entries.push((key, Slot::built(state)));
        self
    }

    /// Registers a state that is constructed on its first activation and
    /// reused afterwards.
    ///
    /// `targets` lists the keys the state may request. They are validated
    /// by [`build`](Self::build) like any built state's `targets()`.
    pub fn lazy_state<S, F, T>(mut self, key: K, targets: T, factory: F) -> Self
    where
        S: State<K, E> + 'static,
        F: FnOnce() -> S + 'static,
        T: IntoIterator<Item = K>,
    {
        let factory = Box::new(move || Box::new(factory()) as Box<dyn State<K, E>>);
        self.entries
            .push((key, Slot::deferred(targets.into_iter().collect(), factory)));
        self
    }

    /// State entered by back-navigation on an empty history and by
    /// requests for unregistered keys.
    pub fn default_state(mut self, key: K) -> Self {
        self.default = Some(key);
        self
    }

    pub fn history_capacity(mut self, capacity: usize) -> Self {
        self.config.history_capacity = capacity;
        self
    }

    pub fn max_settle_passes(mut self, passes: usize) -> Self {
        self.config.max_settle_passes = passes;
        self
    }

    /// Replaces all tunables at once.
    pub fn with_config(mut self, config: ContextConfig) -> Self {
        self.config = config;
        self
    }

    /// Validates the state table and builds the context.
    pub fn build(self) -> Result<Context<K, E>, BuildError> {
        if self.entries.is_empty() {
            return Err(BuildError::NoStates);
        }
        if self.config.history_capacity == 0 {
            return Err(BuildError::ZeroHistoryCapacity);
        }
        if self.config.max_settle_passes == 0 {
            return Err(BuildError::ZeroSettlePasses);
        }

        let mut order = Vec::with_capacity(self.entries.len());
        let mut slots = HashMap::with_capacity(self.entries.len());
        for (key, slot) in self.entries {
            if slots.insert(key, slot).is_some() {
                return Err(BuildError::DuplicateState {
                    key: format!("{:?}", key),
                });
            }
            order.push(key);
        }

        if !slots.contains_key(&self.initial) {
            return Err(BuildError::UnregisteredInitial {
                key: format!("{:?}", self.initial),
            });
        }

        let default = self.default.unwrap_or(self.initial);
        if !slots.contains_key(&default) {
            return Err(BuildError::UnregisteredDefault {
                key: format!("{:?}", default),
            });
        }

        // Registration order keeps the reported offender deterministic
        for from in &order {
            let declared = slots.get(from).map(Slot::declared_targets).unwrap_or_default();
            if let Some(to) = declared.into_iter().find(|to| !slots.contains_key(to)) {
                return Err(BuildError::UnregisteredTarget {
                    from: format!("{:?}", from),
                    to: format!("{:?}", to),
                });
            }
        }

        debug!(
            "[{}] Built context with {} state(s), initial {:?}, default {:?}",
            self.name,
            slots.len(),
            self.initial,
            default
        );

        Ok(Context::from_parts(
            self.name,
            slots,
            self.initial,
            default,
            self.config.history_capacity,
            self.config.max_settle_passes,
        ))
    }
}

//=== Tests ===============================================================
