use crate::data::{OutputModel, ValidatedInstance};
use crate::decode::decode;
use crate::error::{Result, SolverError};
use crate::model;
use crate::solver::{SolveStatus, SolverAdapter};
use log::{debug, warn};
use std::sync::Arc;
use std::time::Duration;

/// One build-solve-decode cycle on request-local data.
pub fn run(instance: &ValidatedInstance, adapter: &dyn SolverAdapter) -> Result<OutputModel> {
    let problem = model::build(instance)?;
    debug!(
        "Model has {} variables and {} constraints.",
        problem.variable_count(),
        problem.constraint_count()
    );
    let triples = problem.triples().to_vec();
    let result = adapter.solve(problem)?;
    Ok(decode(instance, &triples, &result))
}

/// Runs [`run`] on the blocking pool. Past `timeout` the request is answered
/// with `NotSolved`; the worker is left to finish on its own.
pub async fn run_bounded(
    instance: ValidatedInstance,
    adapter: Arc<dyn SolverAdapter>,
    timeout: Duration,
) -> Result<OutputModel> {
    let worker = tokio::task::spawn_blocking(move || run(&instance, adapter.as_ref()));
    match tokio::time::timeout(timeout, worker).await {
        Ok(Ok(output)) => output,
        Ok(Err(e)) => Err(SolverError::Worker(e.to_string()).into()),
        Err(_) => {
            warn!("Solve exceeded {:?}; reporting not solved.", timeout);
            Ok(OutputModel {
                status: SolveStatus::NotSolved,
                objective_value: None,
                assignments: Vec::new(),
            })
        }
    }
}
