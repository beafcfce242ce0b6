use super::*;

/// Records how far a migration got, one entry per finished step.
#[derive(Debug, Default)]
pub struct StepLedger {
    pub completed: Vec<MigrationStepRecord>,
    pub failed_step: Option<String>,
}

impl StepLedger {
    /// Runs `action`, which returns its value and the number of affected rows.
    pub fn run_step<T, F>(&mut self, step: &str, action: F) -> Result<T>
    where
        F: FnOnce() -> Result<(T, usize)>,
    {
        info!(step, "migration step started");
        match action() {
            Ok((value, affected_rows)) => {
                info!(step, affected_rows, "migration step completed");
                self.completed.push(MigrationStepRecord {
                    step: step.to_string(),
                    affected_rows,
                });
                Ok(value)
            }
            Err(err) => {
                error!(
                    step,
                    completed_steps = self.completed.len(),
                    error = %err,
                    "migration step failed"
                );
                self.failed_step = Some(step.to_string());
                Err(err.context(format!("migration step {step} failed")))
            }
        }
    }

    pub fn last_completed(&self) -> Option<&str> {
        self.completed.last().map(|record| record.step.as_str())
    }
}
