//! User actions and the dialog state each of them moves through.
//!
//! An action is `Idle` until submitted, `Submitting` while the transaction
//! is built, signed and sent, and then `Success` or `Failed` until the user
//! closes it. There are no retries.

use std::future::Future;

use serde::Serialize;
use tracing::{error, info};

use crate::error::Error;

pub use self::{
    borrow::{add_trustline, borrow, check_borrow, check_trustline},
    lend::{check_deposit, check_withdraw, deposit, withdraw},
    repay::{check_repay, check_repay_all, repay, repay_all},
};

pub mod borrow;
pub mod lend;
pub mod repay;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "data", rename_all = "snake_case")]
pub enum FlowState<T> {
    Idle,
    Submitting,
    Success(T),
    Failed(String),
}

impl<T> FlowState<T> {
    fn name(&self) -> &'static str {
        match self {
            FlowState::Idle => "idle",
            FlowState::Submitting => "submitting",
            FlowState::Success(_) => "success",
            FlowState::Failed(_) => "failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionFlow<T> {
    state: FlowState<T>,
}

impl<T> Default for ActionFlow<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ActionFlow<T> {
    pub fn new() -> Self {
        ActionFlow {
            state: FlowState::Idle,
        }
    }

    pub fn state(&self) -> &FlowState<T> {
        &self.state
    }

    pub fn into_state(self) -> FlowState<T> {
        self.state
    }

    fn invalid(&self, to: &str) -> Error {
        Error::InvalidTransition(format!("{} -> {}", self.state.name(), to))
    }

    pub fn start(&mut self) -> Result<(), Error> {
        match self.state {
            FlowState::Idle => {
                self.state = FlowState::Submitting;
                Ok(())
            },
            _ => Err(self.invalid("submitting")),
        }
    }

    pub fn succeed(&mut self, value: T) -> Result<(), Error> {
        match self.state {
            FlowState::Submitting => {
                self.state = FlowState::Success(value);
                Ok(())
            },
            _ => Err(self.invalid("success")),
        }
    }

    pub fn fail(&mut self, message: String) -> Result<(), Error> {
        match self.state {
            FlowState::Submitting => {
                self.state = FlowState::Failed(message);
                Ok(())
            },
            _ => Err(self.invalid("failed")),
        }
    }

    /// Dismisses the outcome, back to `Idle`.
    pub fn close(&mut self) -> Result<(), Error> {
        match self.state {
            FlowState::Success(_) | FlowState::Failed(_) => {
                self.state = FlowState::Idle;
                Ok(())
            },
            _ => Err(self.invalid("idle")),
        }
    }

    /// Submits `action` and records how it ended. Only an invalid
    /// transition is returned as an error, the action's own error ends up
    /// in `FlowState::Failed`.
    pub async fn run<F>(&mut self, action: F) -> Result<&FlowState<T>, Error>
    where
        F: Future<Output = Result<T, Error>>,
    {
        self.start()?;

        match action.await {
            Ok(value) => self.succeed(value)?,
            Err(err) => {
                error!("Action failed: {}", err);
                self.fail(err.to_string())?;
            },
        }

        Ok(&self.state)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BorrowStage {
    Trustline,
    Borrow,
}

/// Borrowing an asset the wallet has no trustline for takes two steps:
/// the trustline first, then the loan itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BorrowFlow {
    stage: BorrowStage,
    pub flow: ActionFlow<String>,
}

impl BorrowFlow {
    pub fn new(has_trustline: bool) -> Self {
        BorrowFlow {
            stage: if has_trustline {
                BorrowStage::Borrow
            } else {
                BorrowStage::Trustline
            },
            flow: ActionFlow::new(),
        }
    }

    pub fn stage(&self) -> BorrowStage {
        self.stage
    }

    /// Moves on after the trustline was created.
    pub fn continue_to_borrow(&mut self) -> Result<(), Error> {
        match (self.stage, self.flow.state()) {
            (BorrowStage::Trustline, FlowState::Success(_)) => {
                self.flow.close()?;
                self.stage = BorrowStage::Borrow;
                info!("Trustline ready, continuing to borrow");
                Ok(())
            },
            _ => Err(Error::InvalidTransition(format!(
                "{:?} {} -> borrow",
                self.stage,
                self.flow.state().name()
            ))),
        }
    }
}
