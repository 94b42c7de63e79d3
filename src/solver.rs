use crate::error::SolverError;
use crate::model::Problem;
use good_lp::{ResolutionError, Solution, SolutionStatus, SolverModel, default_solver};
use log::{info, warn};
use serde::Serialize;
use std::fmt;
use std::time::{Duration, Instant};

/// Terminal state of one solve. Anything but `Optimal` carries no values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SolveStatus {
    Optimal,
    Infeasible,
    Unbounded,
    #[serde(rename = "Not Solved")]
    NotSolved,
}

impl fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SolveStatus::Optimal => "Optimal",
            SolveStatus::Infeasible => "Infeasible",
            SolveStatus::Unbounded => "Unbounded",
            SolveStatus::NotSolved => "Not Solved",
        };
        f.write_str(name)
    }
}

/// Variable values indexed by triple id, see [`Problem`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VariableValues {
    pub assigned: Vec<f64>,
    pub penalty: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SolveResult {
    pub status: SolveStatus,
    pub objective_value: Option<f64>,
    pub values: VariableValues,
}

impl SolveResult {
    /// A result without values, for every status but `Optimal`.
    pub fn terminal(status: SolveStatus) -> Self {
        Self {
            status,
            objective_value: None,
            values: VariableValues::default(),
        }
    }
}

/// Anything able to solve a [`Problem`].
///
/// Reporting `Infeasible`/`Unbounded`/`NotSolved` is a successful call;
/// `Err` is reserved for the solver itself breaking down.
pub trait SolverAdapter: Send + Sync {
    fn solve(&self, problem: Problem) -> Result<SolveResult, SolverError>;
}

/// Solves with HiGHS, single-threaded and seeded so identical instances
/// take identical paths.
#[derive(Debug, Clone, Default)]
pub struct HighsAdapter {
    time_limit: Option<Duration>,
    log_to_console: bool,
}

impl HighsAdapter {
    pub fn new(time_limit: Option<Duration>, log_to_console: bool) -> Self {
        Self {
            time_limit,
            log_to_console,
        }
    }
}

impl SolverAdapter for HighsAdapter {
    fn solve(&self, problem: Problem) -> Result<SolveResult, SolverError> {
        // an empty `== 1` row can never hold
        if let Some(&group) = problem.unplaceable_groups().first() {
            info!(
                "Group #{} has no admissible room; reporting infeasible without solving.",
                group
            );
            return Ok(SolveResult::terminal(SolveStatus::Infeasible));
        }

        let start_time = Instant::now();
        let Problem {
            variables,
            objective,
            constraints,
            assigned,
            penalty,
            ..
        } = problem;

        let mut model = variables
            .maximise(objective.clone())
            .using(default_solver)
            .set_option("threads", 1) // limit to 1 thread for reproducibility
            .set_option("random_seed", 1234) //set seed for reproducibility
            .set_option("log_to_console", self.log_to_console);
        if let Some(limit) = self.time_limit {
            model = model.set_option("time_limit", limit.as_secs_f64());
        }
        for c in constraints {
            model.add_constraint(c);
        }

        info!("Starting MILP solver...");
        let outcome = model.solve();
        let hit_time_limit = self
            .time_limit
            .is_some_and(|limit| start_time.elapsed() >= limit);
        let status = classify(
            outcome.as_ref().map(|solution| solution.status()),
            hit_time_limit,
        )?;
        let result = match outcome {
            Ok(solution) if status == SolveStatus::Optimal => SolveResult {
                status,
                objective_value: Some(objective.eval_with(&solution)),
                values: VariableValues {
                    assigned: assigned.iter().map(|&v| solution.value(v)).collect(),
                    penalty: penalty.iter().map(|&v| solution.value(v)).collect(),
                },
            },
            _ => SolveResult::terminal(status),
        };
        info!(
            "Solver finished with status {} in {:.2?}",
            result.status,
            start_time.elapsed()
        );
        Ok(result)
    }
}

/// Maps what HiGHS returned onto a terminal status. `hit_time_limit` is set
/// when the configured time limit had elapsed by the time HiGHS returned.
fn classify(
    outcome: Result<SolutionStatus, &ResolutionError>,
    hit_time_limit: bool,
) -> Result<SolveStatus, SolverError> {
    match outcome {
        // HiGHS proved optimality within its relative gap tolerance; good_lp
        // flags any non-zero remaining gap as GapLimit
        Ok(SolutionStatus::Optimal | SolutionStatus::GapLimit) => Ok(SolveStatus::Optimal),
        Ok(other) => {
            warn!("Solver stopped early ({:?}); discarding incumbent.", other);
            Ok(SolveStatus::NotSolved)
        }
        Err(ResolutionError::Infeasible) => Ok(SolveStatus::Infeasible),
        Err(ResolutionError::Unbounded) => Ok(SolveStatus::Unbounded),
        // time limit reached before any feasible point was found
        Err(ResolutionError::Other("NoSolutionFound")) if hit_time_limit => {
            warn!("Solver hit its time limit without a feasible assignment.");
            Ok(SolveStatus::NotSolved)
        }
        Err(e) => Err(SolverError::Backend(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::ValidatedInstance;
    use crate::model;

    fn solve(instance: &ValidatedInstance) -> SolveResult {
        let problem = model::build(instance).unwrap();
        HighsAdapter::default().solve(problem).unwrap()
    }

    #[test]
    fn optimal_result_carries_values_per_triple() {
        let instance = ValidatedInstance::from_tables(&[("A", 30), ("B", 20)], &[("G1", 25), ("G2", 18)], &["T1"]);
        let result = solve(&instance);

        assert_eq!(result.status, SolveStatus::Optimal);
        assert!((result.objective_value.unwrap() - 43.0).abs() < 1e-6);
        // triples: (G1,A), (G2,A), (G2,B)
        assert_eq!(result.values.assigned.len(), 3);
        assert_eq!(result.values.penalty.len(), 3);
        assert!(result.values.assigned[0] > 0.99);
        assert!(result.values.assigned[1] < 0.01);
        assert!(result.values.assigned[2] > 0.99);
    }

    #[test]
    fn group_larger_than_every_room_is_infeasible() {
        let instance = ValidatedInstance::from_tables(&[("A", 10)], &[("G", 15)], &["T1"]);
        let result = solve(&instance);
        assert_eq!(result, SolveResult::terminal(SolveStatus::Infeasible));
    }

    #[test]
    fn too_many_groups_for_the_slots_is_infeasible() {
        let instance = ValidatedInstance::from_tables(&[("A", 30)], &[("G1", 10), ("G2", 10)], &["T1"]);
        let result = solve(&instance);
        assert_eq!(result.status, SolveStatus::Infeasible);
        assert_eq!(result.objective_value, None);
        assert!(result.values.assigned.is_empty());
    }

    #[test]
    fn penalty_reflects_excess_capacity() {
        let mut instance = ValidatedInstance::from_tables(&[("Hall", 100)], &[("G", 10)], &["T1"]);
        instance.parameters.lambda_penalty = 0.5;
        let result = solve(&instance);

        // 100 - 10 - 20 = 70 penalised seats
        assert_eq!(result.status, SolveStatus::Optimal);
        assert!((result.values.penalty[0] - 70.0).abs() < 1e-6);
        assert!((result.objective_value.unwrap() - (10.0 - 0.5 * 70.0)).abs() < 1e-6);
    }

    #[test]
    fn status_wire_names() {
        assert_eq!(serde_json::to_value(SolveStatus::NotSolved).unwrap(), "Not Solved");
        assert_eq!(SolveStatus::Optimal.to_string(), "Optimal");
    }

    #[test]
    fn gap_flagged_optimum_counts_as_optimal() {
        assert_eq!(
            classify(Ok(SolutionStatus::GapLimit), false).unwrap(),
            SolveStatus::Optimal
        );
        assert_eq!(
            classify(Ok(SolutionStatus::Optimal), false).unwrap(),
            SolveStatus::Optimal
        );
        assert_eq!(
            classify(Ok(SolutionStatus::TimeLimit), true).unwrap(),
            SolveStatus::NotSolved
        );
    }

    #[test]
    fn time_limit_without_solution_is_not_solved() {
        let no_solution = ResolutionError::Other("NoSolutionFound");
        assert_eq!(
            classify(Err(&no_solution), true).unwrap(),
            SolveStatus::NotSolved
        );
        // same error with time to spare means HiGHS broke down
        assert!(matches!(
            classify(Err(&no_solution), false),
            Err(SolverError::Backend(_))
        ));
    }

    #[test]
    fn infeasible_and_unbounded_are_statuses() {
        assert_eq!(
            classify(Err(&ResolutionError::Infeasible), false).unwrap(),
            SolveStatus::Infeasible
        );
        assert_eq!(
            classify(Err(&ResolutionError::Unbounded), false).unwrap(),
            SolveStatus::Unbounded
        );
        assert!(classify(Err(&ResolutionError::Other("LoadError")), false).is_err());
    }
}
