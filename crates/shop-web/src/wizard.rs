//! Onboarding wizard state
//!
//! A bounded step counter: it starts at step 1, moves forward one step per
//! advance and becomes `Completed` after the last step. Advancing a
//! completed wizard does nothing.

/// Number of onboarding steps
pub const TOTAL_STEPS: u8 = 3;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WizardState {
    /// `1..=TOTAL_STEPS`
    InProgress { step: u8 },
    Completed,
}

impl Default for WizardState {
    fn default() -> Self {
        Self::new()
    }
}

impl WizardState {
    pub const fn new() -> Self {
        Self::InProgress { step: 1 }
    }

    #[must_use]
    pub const fn advance(self) -> Self {
        match self {
            Self::InProgress { step } if step < TOTAL_STEPS => Self::InProgress { step: step + 1 },
            _ => Self::Completed,
        }
    }

    /// Step shown to the user; a completed wizard stays on the last step
    pub const fn current_step(self) -> u8 {
        match self {
            Self::InProgress { step } => step,
            Self::Completed => TOTAL_STEPS,
        }
    }

    pub const fn is_last_step(self) -> bool {
        matches!(self, Self::InProgress { step } if step == TOTAL_STEPS)
    }

    pub const fn is_complete(self) -> bool {
        matches!(self, Self::Completed)
    }

    pub fn label(self) -> String {
        format!("Step {} of {}", self.current_step(), TOTAL_STEPS)
    }
}
