//! Qubit and classical bit types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Index of a qubit within a circuit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct QubitId(pub u32);

impl fmt::Display for QubitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "q{}", self.0)
    }
}

impl From<u32> for QubitId {
    fn from(id: u32) -> Self {
        QubitId(id)
    }
}

/// Index of a classical bit within a circuit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClbitId(pub u32);

impl fmt::Display for ClbitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "c{}", self.0)
    }
}

impl From<u32> for ClbitId {
    fn from(id: u32) -> Self {
        ClbitId(id)
    }
}

/// Where a bit was declared: `q[3]` is register `q`, offset 3.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterSlot {
    pub register: String,
    pub offset: u32,
}

/// A qubit and, if it came from a named register, its slot there.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Qubit {
    pub id: QubitId,
    pub slot: Option<RegisterSlot>,
}

impl Qubit {
    pub fn new(id: QubitId) -> Self {
        Self { id, slot: None }
    }

    pub fn in_register(id: QubitId, register: impl Into<String>, offset: u32) -> Self {
        Self {
            id,
            slot: Some(RegisterSlot {
                register: register.into(),
                offset,
            }),
        }
    }

    /// Wire label: `name[offset]` for register members, `q<id>` otherwise.
    pub fn label(&self) -> String {
        match &self.slot {
            Some(slot) => format!("{}[{}]", slot.register, slot.offset),
            None => self.id.to_string(),
        }
    }
}

/// A classical bit and, if it came from a named register, its slot there.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Clbit {
    pub id: ClbitId,
    pub slot: Option<RegisterSlot>,
}

impl Clbit {
    pub fn new(id: ClbitId) -> Self {
        Self { id, slot: None }
    }

    pub fn in_register(id: ClbitId, register: impl Into<String>, offset: u32) -> Self {
        Self {
            id,
            slot: Some(RegisterSlot {
                register: register.into(),
                offset,
            }),
        }
    }

    pub fn register(&self) -> Option<&str> {
        self.slot.as_ref().map(|slot| slot.register.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qubit_labels() {
        assert_eq!(Qubit::new(QubitId(0)).label(), "q0");
        assert_eq!(Qubit::in_register(QubitId(3), "anc", 1).label(), "anc[1]");
    }

    #[test]
    fn test_clbit_register() {
        assert_eq!(Clbit::new(ClbitId(2)).register(), None);
        assert_eq!(Clbit::in_register(ClbitId(0), "out", 0).register(), Some("out"));
    }
}
