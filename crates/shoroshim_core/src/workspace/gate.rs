//! Save gate: the "is it safe to leave" protocol run before every navigation.
//!
//! # Responsibility
//! - Decide whether the active editing state may be abandoned, prompting the
//!   user and saving when needed.
//!
//! # Invariants
//! - Steps are explicit states; `next_step` is a pure transition function.
//! - The driver suspends only while awaiting the prompt or the save.
//! - Each run reaches exactly one `GateOutcome`; nothing resolves twice.
//! - Every blocked outcome leaves the subject's edits untouched.

use crate::model::person::PersonValidationError;
use crate::prompt::{ConfirmationPrompt, PromptChoice, PromptOptions};
use crate::store::{SaveResponse, StoreError};
use async_trait::async_trait;
use log::{debug, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub const SAVE_PROMPT_TITLE: &str = "Save Person Details";

/// Editing state the gate inspects and acts on.
#[async_trait(?Send)]
pub trait GateSubject {
    /// Whether edits differ from the last loaded snapshot.
    fn needs_saving(&self) -> bool;
    /// Local validation failures of the current edits.
    fn validation_errors(&self) -> Vec<PersonValidationError>;
    /// Name shown in the save confirmation.
    fn pending_display_name(&self) -> String;
    /// Drops every edit, restoring the snapshot.
    fn discard_edits(&self);
    /// Persists the current edits.
    async fn save(&self) -> Result<SaveResponse, StoreError>;
}

/// Protocol state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateStep {
    CheckDirty,
    Validate,
    ConfirmDiscard { errors: Vec<PersonValidationError> },
    ConfirmSave { display_name: String },
    Save,
    Done(GateOutcome),
}

/// Input that drives one transition of the protocol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateEvent {
    Dirty(bool),
    Validated(Vec<PersonValidationError>),
    Answered(PromptChoice),
    Saved(SaveResponse),
    SaveRejected(String),
}

/// Terminal result of one gate run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateOutcome {
    /// Nothing to save.
    Clean,
    /// Edits persisted.
    Saved(SaveResponse),
    /// User chose not to keep the edits.
    Discarded,
    /// User cancelled; edits retained.
    Cancelled,
    /// Save returned `success=false` or was rejected; edits retained.
    SaveFailed(String),
}

impl GateOutcome {
    /// Whether navigation may proceed.
    pub fn allowed(&self) -> bool {
        matches!(self, Self::Clean | Self::Saved(_) | Self::Discarded)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Clean => "clean",
            Self::Saved(_) => "saved",
            Self::Discarded => "discarded",
            Self::Cancelled => "cancelled",
            Self::SaveFailed(_) => "save_failed",
        }
    }
}

/// Protocol violations. These are programmer errors and propagate.
#[derive(Debug)]
pub enum GateError {
    /// Prompt resolved with an option it was not offered.
    UnexpectedChoice {
        offered: PromptOptions,
        choice: PromptChoice,
    },
    /// Event does not belong to the current step.
    UnexpectedEvent { step: GateStep, event: GateEvent },
    /// Store reported a contract violation during save.
    Store(StoreError),
}

impl Display for GateError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnexpectedChoice { offered, choice } => {
                write!(f, "prompt answered `{choice}` which {offered:?} does not offer")
            }
            Self::UnexpectedEvent { step, event } => {
                write!(f, "save gate received {event:?} while at {step:?}")
            }
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for GateError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            _ => None,
        }
    }
}

/// Pure transition function of the gate.
pub fn next_step(step: GateStep, event: GateEvent) -> Result<GateStep, GateError> {
    match (step, event) {
        (GateStep::CheckDirty, GateEvent::Dirty(false)) => Ok(GateStep::Done(GateOutcome::Clean)),
        (GateStep::CheckDirty, GateEvent::Dirty(true)) => Ok(GateStep::Validate),
        (GateStep::Validate, GateEvent::Validated(errors)) => {
            if errors.is_empty() {
                // Display name is filled in by the driver, which owns the subject.
                Ok(GateStep::ConfirmSave {
                    display_name: String::new(),
                })
            } else {
                Ok(GateStep::ConfirmDiscard { errors })
            }
        }
        (GateStep::ConfirmDiscard { .. }, GateEvent::Answered(choice)) => match choice {
            PromptChoice::Yes => Ok(GateStep::Done(GateOutcome::Discarded)),
            PromptChoice::Cancel => Ok(GateStep::Done(GateOutcome::Cancelled)),
            PromptChoice::No => Err(GateError::UnexpectedChoice {
                offered: PromptOptions::YesCancel,
                choice,
            }),
        },
        (GateStep::ConfirmSave { .. }, GateEvent::Answered(choice)) => match choice {
            PromptChoice::Yes => Ok(GateStep::Save),
            PromptChoice::No => Ok(GateStep::Done(GateOutcome::Discarded)),
            PromptChoice::Cancel => Ok(GateStep::Done(GateOutcome::Cancelled)),
        },
        (GateStep::Save, GateEvent::Saved(response)) => {
            if response.success {
                Ok(GateStep::Done(GateOutcome::Saved(response)))
            } else {
                let message = response
                    .error_message
                    .unwrap_or_else(|| "unknown error".to_string());
                Ok(GateStep::Done(GateOutcome::SaveFailed(message)))
            }
        }
        (GateStep::Save, GateEvent::SaveRejected(message)) => {
            Ok(GateStep::Done(GateOutcome::SaveFailed(message)))
        }
        (step, event) => Err(GateError::UnexpectedEvent { step, event }),
    }
}

/// Runs the gate to completion against `subject`.
pub async fn run_save_gate(
    subject: &dyn GateSubject,
    prompt: &dyn ConfirmationPrompt,
) -> Result<GateOutcome, GateError> {
    let mut step = GateStep::CheckDirty;
    loop {
        debug!("event=save_gate module=workspace step={step:?}");
        let event = match &step {
            GateStep::Done(outcome) => {
                if matches!(outcome, GateOutcome::Discarded) {
                    subject.discard_edits();
                }
                return Ok(outcome.clone());
            }
            GateStep::CheckDirty => GateEvent::Dirty(subject.needs_saving()),
            GateStep::Validate => GateEvent::Validated(subject.validation_errors()),
            GateStep::ConfirmDiscard { errors } => {
                let choice = prompt
                    .ask(
                        SAVE_PROMPT_TITLE,
                        &discard_prompt_body(errors),
                        PromptOptions::YesCancel,
                    )
                    .await;
                ensure_offered(PromptOptions::YesCancel, choice)?;
                GateEvent::Answered(choice)
            }
            GateStep::ConfirmSave { display_name } => {
                let choice = prompt
                    .ask(
                        SAVE_PROMPT_TITLE,
                        &format!("Do you want to save the details for {display_name}?"),
                        PromptOptions::YesNoCancel,
                    )
                    .await;
                ensure_offered(PromptOptions::YesNoCancel, choice)?;
                GateEvent::Answered(choice)
            }
            GateStep::Save => match subject.save().await {
                Ok(response) => GateEvent::Saved(response),
                Err(err) if err.is_contract_violation() => return Err(GateError::Store(err)),
                Err(err) => GateEvent::SaveRejected(err.to_string()),
            },
        };

        step = match next_step(step, event)? {
            GateStep::ConfirmSave { .. } => GateStep::ConfirmSave {
                display_name: subject.pending_display_name(),
            },
            GateStep::Done(GateOutcome::SaveFailed(message)) => {
                warn!("event=save_gate module=workspace status=save_failed");
                prompt
                    .notify(SAVE_PROMPT_TITLE, &format!("Could not save person: {message}"))
                    .await;
                GateStep::Done(GateOutcome::SaveFailed(message))
            }
            other => other,
        };
    }
}

fn ensure_offered(options: PromptOptions, choice: PromptChoice) -> Result<(), GateError> {
    if options.offers(choice) {
        Ok(())
    } else {
        Err(GateError::UnexpectedChoice {
            offered: options,
            choice,
        })
    }
}

/// Body of the discard-or-cancel prompt listing every validation error.
pub fn discard_prompt_body(errors: &[PersonValidationError]) -> String {
    let mut body = String::from("Cannot save due to the following error(s):\n");
    for err in errors {
        body.push_str("- ");
        body.push_str(&err.to_string());
        body.push('\n');
    }
    body.push_str("Discard and continue?");
    body
}

#[cfg(test)]
mod tests {
    use super::{next_step, GateError, GateEvent, GateOutcome, GateStep};
    use crate::model::person::PersonValidationError;
    use crate::prompt::PromptChoice;
    use crate::store::SaveResponse;

    #[test]
    fn clean_subject_finishes_immediately() {
        let step = next_step(GateStep::CheckDirty, GateEvent::Dirty(false)).expect("transition");
        assert_eq!(step, GateStep::Done(GateOutcome::Clean));
    }

    #[test]
    fn invalid_edits_route_to_discard_prompt() {
        let step = next_step(
            GateStep::Validate,
            GateEvent::Validated(vec![PersonValidationError::BlankDisplayName]),
        )
        .expect("transition");
        assert!(matches!(step, GateStep::ConfirmDiscard { errors } if errors.len() == 1));
    }

    #[test]
    fn discard_prompt_rejects_no() {
        let err = next_step(
            GateStep::ConfirmDiscard { errors: vec![] },
            GateEvent::Answered(PromptChoice::No),
        )
        .expect_err("No is not offered");
        assert!(matches!(err, GateError::UnexpectedChoice { .. }));
    }

    #[test]
    fn unsuccessful_save_response_blocks() {
        let step = next_step(
            GateStep::Save,
            GateEvent::Saved(SaveResponse::failure("duplicate")),
        )
        .expect("transition");
        assert_eq!(
            step,
            GateStep::Done(GateOutcome::SaveFailed("duplicate".to_string()))
        );
        if let GateStep::Done(outcome) = step {
            assert!(!outcome.allowed());
        }
    }

    #[test]
    fn out_of_order_event_is_a_protocol_error() {
        let err = next_step(GateStep::CheckDirty, GateEvent::Answered(PromptChoice::Yes))
            .expect_err("prompt answer before dirty check");
        assert!(matches!(err, GateError::UnexpectedEvent { .. }));
    }
}
