use crate::data::ValidatedInstance;
use crate::error::ModelError;
use good_lp::variable;
use good_lp::{Constraint, Expression, ProblemVariables, Variable, constraint};
use itertools::iproduct;
use log::{debug, info, trace, warn};

/// A (group, room, slot) combination the group fits into, by index into
/// the instance's vectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Triple {
    pub group: usize,
    pub room: usize,
    pub slot: usize,
}

/// A maximisation MILP ready to hand to a `SolverAdapter`.
///
/// Variables live in an arena: triple `i` owns `assigned[i]` (binary) and
/// `penalty[i]` (continuous, >= 0). Triples are enumerated group-major,
/// then room, then slot, and that order is what the decoder reports in.
pub struct Problem {
    pub(crate) variables: ProblemVariables,
    pub(crate) objective: Expression,
    pub(crate) constraints: Vec<Constraint>,
    pub(crate) triples: Vec<Triple>,
    pub(crate) assigned: Vec<Variable>,
    pub(crate) penalty: Vec<Variable>,
    /// Groups with no admissible room: their unique-assignment row is `0 == 1`.
    pub(crate) unplaceable_groups: Vec<usize>,
}

impl Problem {
    pub fn triples(&self) -> &[Triple] {
        &self.triples
    }

    pub fn variable_count(&self) -> usize {
        self.assigned.len() + self.penalty.len()
    }

    pub fn constraint_count(&self) -> usize {
        self.constraints.len()
    }

    pub fn unplaceable_groups(&self) -> &[usize] {
        &self.unplaceable_groups
    }
}

/// Builds the room assignment model with infeasible triples pruned from the
/// variable domain.
pub fn build(instance: &ValidatedInstance) -> Result<Problem, ModelError> {
    if instance.rooms.is_empty() {
        return Err(ModelError::EmptyRooms);
    }
    if instance.groups.is_empty() {
        return Err(ModelError::EmptyGroups);
    }
    if instance.slots.is_empty() {
        return Err(ModelError::EmptySlots);
    }

    let rooms = &instance.rooms;
    let groups = &instance.groups;
    let params = instance.parameters;

    info!(
        "Setting up MILP model with {} groups, {} rooms, and {} slots...",
        groups.len(),
        rooms.len(),
        instance.slots.len()
    );

    // capacity admissibility is enforced here, by never creating the variable
    let triples: Vec<Triple> = iproduct!(0..groups.len(), 0..rooms.len(), 0..instance.slots.len())
        .filter(|&(g, r, _)| groups[g].size <= rooms[r].capacity)
        .map(|(group, room, slot)| Triple { group, room, slot })
        .collect();
    trace!(
        "Generated {} admissible triples out of a theoretical maximum of {}.",
        triples.len(),
        groups.len() * rooms.len() * instance.slots.len()
    );

    let mut variables = ProblemVariables::new();
    let assigned = variables.add_vector(variable().binary(), triples.len());
    let penalty = variables.add_vector(variable().min(0), triples.len());

    let seated: Expression = triples
        .iter()
        .zip(&assigned)
        .map(|(t, &x)| f64::from(groups[t.group].size) * x)
        .sum();
    let total_penalty: Expression = penalty.iter().copied().sum();
    let objective = seated - params.lambda_penalty * total_penalty;
    debug!(
        "Objective: seated students minus {} x penalty.",
        params.lambda_penalty
    );

    let mut constraints = Vec::new();

    info!("Adding 'group assigned once' constraints...");
    let mut per_group: Vec<Expression> = vec![Expression::from(0.0); groups.len()];
    let mut options = vec![0usize; groups.len()];
    for (t, &x) in triples.iter().zip(&assigned) {
        per_group[t.group] += x;
        options[t.group] += 1;
    }
    let mut unplaceable_groups = Vec::new();
    for (g, assigned_once) in per_group.into_iter().enumerate() {
        if options[g] == 0 {
            warn!(
                "Group '{}' (size {}) fits in no room; the model is infeasible.",
                groups[g].name, groups[g].size
            );
            unplaceable_groups.push(g);
        }
        constraints.push(constraint!(assigned_once == 1));
    }

    info!("Adding 'no room overlap' constraints...");
    let slot_count = instance.slots.len();
    let mut per_room_slot: Vec<Expression> = vec![Expression::from(0.0); rooms.len() * slot_count];
    for (t, &x) in triples.iter().zip(&assigned) {
        per_room_slot[t.room * slot_count + t.slot] += x;
    }
    for room_occupied in per_room_slot {
        constraints.push(constraint!(room_occupied <= 1));
    }

    info!("Adding penalty linearisation constraints...");
    for ((t, &x), &u) in triples.iter().zip(&assigned).zip(&penalty) {
        let excess = excess_capacity(rooms[t.room].capacity, groups[t.group].size, params.delta);
        constraints.push(constraint!(u >= excess * x));
    }

    Ok(Problem {
        variables,
        objective,
        constraints,
        triples,
        assigned,
        penalty,
        unplaceable_groups,
    })
}

/// Empty seats beyond the tolerated fraction `delta` of `capacity`. Negative
/// when the group fills the room within tolerance.
pub fn excess_capacity(capacity: u32, size: u32, delta: f64) -> f64 {
    let capacity = f64::from(capacity);
    capacity - f64::from(size) - delta * capacity
}
