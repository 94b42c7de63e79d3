use serde::Serialize;
use std::fmt;

use crate::solver::SolveStatus;

// Type aliases for clarity
pub type RoomName = String;
pub type GroupName = String;
pub type Slot = String;

pub const DEFAULT_DELTA: f64 = 0.20;
pub const DEFAULT_LAMBDA: f64 = 1.0;

/// Represents a physical room with a given capacity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Room {
    pub name: RoomName,
    pub capacity: u32,
}

/// Represents an academic group that needs a room for one slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    pub name: GroupName,
    pub size: u32,
}

/// Tuning knobs of the utilisation penalty.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Parameters {
    /// Fraction of a room's capacity that may stay empty without penalty.
    pub delta: f64,
    /// Weight of one penalised empty seat against one seated student.
    pub lambda_penalty: f64,
}

impl Default for Parameters {
    fn default() -> Self {
        Self {
            delta: DEFAULT_DELTA,
            lambda_penalty: DEFAULT_LAMBDA,
        }
    }
}

/// A sanitised problem instance. Only `validation` builds these from
/// untrusted input; tests build them directly.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedInstance {
    pub rooms: Vec<Room>,
    pub groups: Vec<Group>,
    pub slots: Vec<Slot>,
    pub parameters: Parameters,
}

#[cfg(test)]
impl ValidatedInstance {
    /// Instance with default parameters from `(name, capacity)` rooms and
    /// `(name, size)` groups.
    pub fn from_tables(rooms: &[(&str, u32)], groups: &[(&str, u32)], slots: &[&str]) -> Self {
        Self {
            rooms: rooms
                .iter()
                .map(|&(name, capacity)| Room { name: name.into(), capacity })
                .collect(),
            groups: groups
                .iter()
                .map(|&(name, size)| Group { name: name.into(), size })
                .collect(),
            slots: slots.iter().map(|s| s.to_string()).collect(),
            parameters: Parameters::default(),
        }
    }
}

/// Represents a single group placed in a room during a slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Assignment {
    pub group: GroupName,
    pub room: RoomName,
    pub slot: Slot,
}

impl fmt::Display for Assignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {} -> {}", self.group, self.room, self.slot)
    }
}

/// Decoded outcome of one solve, before it is put on the wire.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputModel {
    pub status: SolveStatus,
    pub objective_value: Option<f64>,
    pub assignments: Vec<Assignment>,
}

/// The final output of the service.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SolveResponse {
    pub estado: SolveStatus,
    pub valor_objetivo: Option<f64>,
    pub resultados: Vec<String>,
}

impl From<OutputModel> for SolveResponse {
    fn from(output: OutputModel) -> Self {
        Self {
            estado: output.status,
            valor_objetivo: output.objective_value,
            resultados: output
                .assignments
                .iter()
                .map(ToString::to_string)
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assignment_renders_with_arrows() {
        let a = Assignment {
            group: "G1".into(),
            room: "A".into(),
            slot: "T1".into(),
        };
        assert_eq!(a.to_string(), "G1 -> A -> T1");
    }

    #[test]
    fn response_keeps_schema_when_not_optimal() {
        let response = SolveResponse::from(OutputModel {
            status: SolveStatus::Infeasible,
            objective_value: None,
            assignments: Vec::new(),
        });
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "estado": "Infeasible",
                "valor_objetivo": null,
                "resultados": []
            })
        );
    }
}
