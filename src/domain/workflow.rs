//! The fixed step sequence of a seeding run and its progress tracking.

use super::Locations;
use std::time::{Duration, Instant};

/// One stage of the seeding sequence, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SeedStep {
    ValidateParameters,
    CreateBareRepository,
    Upload,
    Clone,
    SeedCommit,
}

impl SeedStep {
    /// All steps in the order they run
    pub const ALL: [SeedStep; 5] = [
        Self::ValidateParameters,
        Self::CreateBareRepository,
        Self::Upload,
        Self::Clone,
        Self::SeedCommit,
    ];

    /// 1-based position shown to the operator
    pub fn number(&self) -> usize {
        match self {
            Self::ValidateParameters => 1,
            Self::CreateBareRepository => 2,
            Self::Upload => 3,
            Self::Clone => 4,
            Self::SeedCommit => 5,
        }
    }

    /// Get the display name for this step
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::ValidateParameters => "validating parameters",
            Self::CreateBareRepository => "creating a bare repository in a temporary directory",
            Self::Upload => "uploading the repository to the remote location",
            Self::Clone => "cloning the repository from the remote location",
            Self::SeedCommit => "creating, committing, and pushing a seed file",
        }
    }
}

impl std::fmt::Display for SeedStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Step {} - {}", self.number(), self.display_name())
    }
}

/// Execution state of a step
#[derive(Debug, Clone, Default)]
pub enum StepState {
    /// Not reached yet
    #[default]
    Pending,
    /// Currently running
    Running { started_at: Instant },
    /// Finished successfully
    Completed { duration: Duration },
    /// Aborted the run
    Failed { error: String },
}

impl StepState {
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }

    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running { .. })
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }

    /// Short marker for log summaries
    pub fn indicator(&self) -> &'static str {
        match self {
            Self::Pending => "-",
            Self::Running { .. } => "~",
            Self::Completed { .. } => "ok",
            Self::Failed { .. } => "FAILED",
        }
    }
}

/// Progress of a whole run
#[derive(Debug, Clone)]
pub struct SeedReport {
    /// Locations computed in step 1
    pub locations: Locations,
    steps: Vec<(SeedStep, StepState)>,
}

impl SeedReport {
    /// Create a report with every step pending
    pub fn new(locations: Locations) -> Self {
        Self {
            locations,
            steps: SeedStep::ALL
                .iter()
                .map(|step| (*step, StepState::Pending))
                .collect(),
        }
    }

    fn state_mut(&mut self, step: SeedStep) -> &mut StepState {
        let index = step.number() - 1;
        &mut self.steps[index].1
    }

    /// State of a single step
    pub fn state(&self, step: SeedStep) -> &StepState {
        &self.steps[step.number() - 1].1
    }

    /// Mark a step as running
    pub fn start(&mut self, step: SeedStep) {
        *self.state_mut(step) = StepState::Running {
            started_at: Instant::now(),
        };
    }

    /// Mark a running step as completed
    pub fn complete(&mut self, step: SeedStep) {
        let state = self.state_mut(step);
        if let StepState::Running { started_at } = *state {
            *state = StepState::Completed {
                duration: started_at.elapsed(),
            };
        }
    }

    /// Mark a step as failed
    pub fn fail(&mut self, step: SeedStep, error: String) {
        *self.state_mut(step) = StepState::Failed { error };
    }

    /// True when every step completed
    pub fn is_complete(&self) -> bool {
        self.steps.iter().all(|(_, state)| state.is_completed())
    }

    /// The step that aborted the run, if any
    pub fn failed_step(&self) -> Option<SeedStep> {
        self.steps
            .iter()
            .find(|(_, state)| state.is_failed())
            .map(|(step, _)| *step)
    }

    /// The step currently running, if any
    pub fn running_step(&self) -> Option<SeedStep> {
        self.steps
            .iter()
            .find(|(_, state)| state.is_running())
            .map(|(step, _)| *step)
    }

    /// One line per step, e.g. `ok Step 1 - validating parameters`
    pub fn summary(&self) -> String {
        self.steps
            .iter()
            .map(|(step, state)| format!("{} {}", state.indicator(), step))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
