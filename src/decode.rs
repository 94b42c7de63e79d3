use crate::data::{Assignment, OutputModel, ValidatedInstance};
use crate::model::Triple;
use crate::solver::{SolveResult, SolveStatus};
use log::debug;

/// A binary is taken as selected only above this value; fractional residue
/// below it is dropped, not rounded up.
pub const SELECTION_THRESHOLD: f64 = 0.99;

/// Turns a solver result back into named assignments, in triple order.
pub fn decode(instance: &ValidatedInstance, triples: &[Triple], result: &SolveResult) -> OutputModel {
    if result.status != SolveStatus::Optimal {
        return OutputModel {
            status: result.status,
            objective_value: None,
            assignments: Vec::new(),
        };
    }

    let assignments: Vec<Assignment> = triples
        .iter()
        .zip(&result.values.assigned)
        .filter(|&(_, &value)| value > SELECTION_THRESHOLD)
        .map(|(t, _)| Assignment {
            group: instance.groups[t.group].name.clone(),
            room: instance.rooms[t.room].name.clone(),
            slot: instance.slots[t.slot].clone(),
        })
        .collect();
    debug!(
        "Decoded {} assignments for {} groups.",
        assignments.len(),
        instance.groups.len()
    );

    OutputModel {
        status: SolveStatus::Optimal,
        objective_value: result.objective_value,
        assignments,
    }
}
