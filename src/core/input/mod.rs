//=========================================================================
// Input Channels
//
// Named channel groups that states switch on and off while they are
// current.
//
// Responsibilities:
// - Register channel groups (per-state groups and always-on globals)
// - Toggle groups on enable_input / disable_input
// - Answer "is this channel live?" for whoever dispatches actions
//
// Notes:
// Exclusive ownership (one state's groups live at a time) is not enforced
// with locks. It follows from the Context calling disable_input on the
// outgoing state before enable_input on the incoming one.
//
//=========================================================================

//=== External Crates =====================================================

use std::collections::HashMap;
use std::fmt;

use log::{debug, warn};

//=== ChannelGroup ========================================================

/// Identifies a group of input channels.
///
/// Define groups as constants:
/// ```
/// # use arcade_modes::prelude::*;
/// const QUIT: ChannelGroup = ChannelGroup::new("quit");
/// const EDIT: ChannelGroup = ChannelGroup::new("edit");
/// assert_ne!(QUIT, EDIT);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChannelGroup(&'static str);

impl ChannelGroup {
    #[inline]
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    #[inline]
    pub const fn name(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for ChannelGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

//=== ChannelState ========================================================

#[derive(Debug, Clone, Copy, Default)]
struct ChannelState {
    enabled: bool,
    global: bool,
}

//=== InputChannels =======================================================

/// Registry of channel groups and their enabled flags.
#[derive(Debug, Default)]
pub struct InputChannels {
    groups: HashMap<ChannelGroup, ChannelState>,
}

impl InputChannels {
    pub fn new() -> Self {
        Self::default()
    }

    //--- Registration -----------------------------------------------------

    /// Registers a group that starts disabled.
    pub fn register(&mut self, group: ChannelGroup) {
        self.groups.entry(group).or_default();
    }

    /// Registers a group that is always enabled (e.g. "quit").
    pub fn register_global(&mut self, group: ChannelGroup) {
        self.groups.insert(
            group,
            ChannelState {
                enabled: true,
                global: true,
            },
        );
    }

    //--- Toggling ---------------------------------------------------------

    /// Enables `group`, registering it on first use.
    pub fn enable(&mut self, group: ChannelGroup) {
        let state = self.groups.entry(group).or_default();
        if !state.enabled {
            debug!("Input channel '{}' enabled", group);
        }
        state.enabled = true;
    }

    /// Disables `group`. Global groups stay enabled.
    pub fn disable(&mut self, group: ChannelGroup) {
        match self.groups.get_mut(&group) {
            Some(state) if state.global => {
                warn!("Ignoring request to disable global input channel '{}'", group);
            }
            Some(state) => {
                if state.enabled {
                    debug!("Input channel '{}' disabled", group);
                }
                state.enabled = false;
            }
            None => debug!("Input channel '{}' not registered, nothing to disable", group),
        }
    }

    //--- Queries ----------------------------------------------------------

    pub fn is_enabled(&self, group: ChannelGroup) -> bool {
        self.groups.get(&group).is_some_and(|s| s.enabled)
    }

    pub fn is_global(&self, group: ChannelGroup) -> bool {
        self.groups.get(&group).is_some_and(|s| s.global)
    }

    /// Enabled groups, sorted by name.
    pub fn enabled_groups(&self) -> Vec<ChannelGroup> {
        let mut groups: Vec<_> = self
            .groups
            .iter()
            .filter(|(_, s)| s.enabled)
            .map(|(g, _)| *g)
            .collect();
        groups.sort();
        groups
    }

    /// Number of enabled groups that are not global.
    pub fn exclusive_owner_count(&self) -> usize {
        self.groups
            .values()
            .filter(|s| s.enabled && !s.global)
            .count()
    }
}

impl AsMut<InputChannels> for InputChannels {
    fn as_mut(&mut self) -> &mut InputChannels {
        self
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
