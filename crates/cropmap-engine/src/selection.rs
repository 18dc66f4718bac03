//! Selection state machine: nothing focused, one location focused, one
//! sub-group within it drilled into.

/// How the side panel groups a focused location's records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GroupingMode {
    #[default]
    None,
    Crop,
    Brand,
}

/// The crop or brand drilled into within a focused location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Subgroup {
    Crop(String),
    Brand(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SelectionState {
    #[default]
    Idle,
    LocationFocused {
        location_name: String,
        grouping: GroupingMode,
    },
    SubgroupFocused {
        location_name: String,
        grouping: GroupingMode,
        subgroup: Subgroup,
    },
}

/// The machine plus its focus epoch.
///
/// The epoch increments every time the focused location changes (including
/// to nothing), so an async result tagged with an older epoch identifies
/// itself as superseded and is discarded on arrival instead of clobbering
/// the current focus.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    state: SelectionState,
    epoch: u64,
}

impl Selection {
    #[must_use]
    pub fn state(&self) -> &SelectionState {
        &self.state
    }

    #[must_use]
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    #[must_use]
    pub fn focused_location(&self) -> Option<&str> {
        match &self.state {
            SelectionState::Idle => None,
            SelectionState::LocationFocused { location_name, .. }
            | SelectionState::SubgroupFocused { location_name, .. } => Some(location_name),
        }
    }

    #[must_use]
    pub fn grouping(&self) -> GroupingMode {
        match &self.state {
            SelectionState::Idle => GroupingMode::default(),
            SelectionState::LocationFocused { grouping, .. }
            | SelectionState::SubgroupFocused { grouping, .. } => *grouping,
        }
    }

    /// Focus a location, from any state. The panel grouping mode is sticky
    /// across focuses. Returns the new epoch for tagging side-effect
    /// fetches.
    pub fn focus_location(&mut self, location_name: &str) -> u64 {
        self.state = SelectionState::LocationFocused {
            location_name: location_name.to_string(),
            grouping: self.grouping(),
        };
        self.epoch += 1;
        self.epoch
    }

    /// Drill into a crop or brand. Only legal from `LocationFocused`;
    /// returns whether the transition happened.
    pub fn drill(&mut self, subgroup: Subgroup) -> bool {
        match &self.state {
            SelectionState::LocationFocused {
                location_name,
                grouping,
            } => {
                self.state = SelectionState::SubgroupFocused {
                    location_name: location_name.clone(),
                    grouping: *grouping,
                    subgroup,
                };
                true
            }
            _ => false,
        }
    }

    /// Return from a drilled sub-group to the location focus. Returns
    /// whether the transition happened.
    pub fn back(&mut self) -> bool {
        match &self.state {
            SelectionState::SubgroupFocused {
                location_name,
                grouping,
                ..
            } => {
                self.state = SelectionState::LocationFocused {
                    location_name: location_name.clone(),
                    grouping: *grouping,
                };
                true
            }
            _ => false,
        }
    }

    /// Explicit close or background click: back to `Idle` from anywhere.
    pub fn close(&mut self) {
        if !matches!(self.state, SelectionState::Idle) {
            self.epoch += 1;
        }
        self.state = SelectionState::Idle;
    }

    /// Change the panel grouping mode. While focused this clears the
    /// drilled sub-group (it belonged to the previous grouping) but keeps
    /// the location focus.
    pub fn set_grouping(&mut self, mode: GroupingMode) {
        match &self.state {
            SelectionState::Idle => {}
            SelectionState::LocationFocused { location_name, .. }
            | SelectionState::SubgroupFocused { location_name, .. } => {
                self.state = SelectionState::LocationFocused {
                    location_name: location_name.clone(),
                    grouping: mode,
                };
            }
        }
    }

    /// Drop a drilled sub-group, keeping the location focus. Applied when
    /// the active filter set changes.
    pub fn clear_subgroup(&mut self) {
        if let SelectionState::SubgroupFocused {
            location_name,
            grouping,
            ..
        } = &self.state
        {
            self.state = SelectionState::LocationFocused {
                location_name: location_name.clone(),
                grouping: *grouping,
            };
        }
    }

    /// Reset to `Idle` if the focused location no longer exists in the
    /// derived groups. Applied after every recompute of the point set.
    pub fn retain_if<F>(&mut self, exists: F)
    where
        F: Fn(&str) -> bool,
    {
        if let Some(location) = self.focused_location() {
            if !exists(location) {
                self.close();
            }
        }
    }
}
