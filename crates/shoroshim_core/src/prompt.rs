//! Modal confirmation boundary.
//!
//! Presentation is owned by the caller; core only sees the offered options and
//! the single choice that comes back.

use async_trait::async_trait;
use std::fmt::{Display, Formatter};

/// Option set offered by one prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptOptions {
    YesNoCancel,
    YesCancel,
}

impl PromptOptions {
    /// Whether `choice` is one of the offered options.
    pub fn offers(self, choice: PromptChoice) -> bool {
        match self {
            Self::YesNoCancel => true,
            Self::YesCancel => choice != PromptChoice::No,
        }
    }
}

/// The user's answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptChoice {
    Yes,
    No,
    Cancel,
}

impl Display for PromptChoice {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Yes => write!(f, "yes"),
            Self::No => write!(f, "no"),
            Self::Cancel => write!(f, "cancel"),
        }
    }
}

/// Yes/No/Cancel modal plus blocking notifications.
#[async_trait(?Send)]
pub trait ConfirmationPrompt {
    /// Resolves exactly once with one of `options`.
    async fn ask(&self, title: &str, body: &str, options: PromptOptions) -> PromptChoice;

    /// Shows a blocking message and resolves once it is dismissed.
    async fn notify(&self, title: &str, message: &str);
}
