//! Stream handles and the primary/secondary role mapping.

use std::fmt;

/// One of the two pipeline slots. Both exist for the lifetime of the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamHandle {
    A,
    B,
}

impl StreamHandle {
    /// The other slot
    pub fn other(self) -> Self {
        match self {
            StreamHandle::A => StreamHandle::B,
            StreamHandle::B => StreamHandle::A,
        }
    }

    /// Array index of the slot
    pub fn index(self) -> usize {
        match self {
            StreamHandle::A => 0,
            StreamHandle::B => 1,
        }
    }
}

impl fmt::Display for StreamHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamHandle::A => write!(f, "A"),
            StreamHandle::B => write!(f, "B"),
        }
    }
}

/// Primary drives the logical clock; secondary follows it through the offset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamRole {
    Primary,
    Secondary,
}

impl fmt::Display for StreamRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamRole::Primary => write!(f, "primary"),
            StreamRole::Secondary => write!(f, "secondary"),
        }
    }
}

/// Bijective mapping of roles onto handles.
///
/// Only the primary handle is stored; the secondary is always its complement,
/// so both roles can never point at the same pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleRegistry {
    primary: StreamHandle,
}

impl RoleRegistry {
    /// A starts as primary, B as secondary
    pub fn new() -> Self {
        Self {
            primary: StreamHandle::A,
        }
    }

    pub fn primary(&self) -> StreamHandle {
        self.primary
    }

    pub fn secondary(&self) -> StreamHandle {
        self.primary.other()
    }

    /// Handle currently bound to a role
    pub fn handle(&self, role: StreamRole) -> StreamHandle {
        match role {
            StreamRole::Primary => self.primary(),
            StreamRole::Secondary => self.secondary(),
        }
    }

    /// Role currently held by a handle
    pub fn role_of(&self, handle: StreamHandle) -> StreamRole {
        if handle == self.primary {
            StreamRole::Primary
        } else {
            StreamRole::Secondary
        }
    }

    /// Exchange the labels. Touches no pipeline.
    pub fn swap(&mut self) {
        self.primary = self.primary.other();
    }
}

impl Default for RoleRegistry {
    fn default() -> Self {
        Self::new()
    }
}
