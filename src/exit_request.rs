//! The exit-request protocol: ask the user what to do about unsaved changes in a
//! panel before leaving it.

use std::fmt;

use crate::trackable::Trackable;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExitVerdict {
    /// Leave the panel after committing its changes.
    AllowAndSave,
    /// Leave the panel and drop its unsaved state.
    AllowWithoutSave,
    /// Stay on the panel.
    Deny,
}

impl ExitVerdict {
    pub fn allows_exit(self) -> bool {
        !matches!(self, ExitVerdict::Deny)
    }
}

impl fmt::Display for ExitVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ExitVerdict::AllowAndSave => "allow and save",
            ExitVerdict::AllowWithoutSave => "allow without save",
            ExitVerdict::Deny => "deny",
        };
        write!(f, "{}", s)
    }
}

/// What the user picked in the prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PromptChoice {
    Save,
    Discard,
    Cancel,
}

impl PromptChoice {
    pub const ALL: [PromptChoice; 3] = [PromptChoice::Save, PromptChoice::Discard, PromptChoice::Cancel];

    pub fn button_label(self) -> &'static str {
        match self {
            PromptChoice::Save => "Save",
            PromptChoice::Discard => "Discard",
            PromptChoice::Cancel => "Cancel",
        }
    }
}

/// Dismissal (`None`) and cancel both deny.
impl From<Option<PromptChoice>> for ExitVerdict {
    fn from(choice: Option<PromptChoice>) -> Self {
        match choice {
            Some(PromptChoice::Save) => ExitVerdict::AllowAndSave,
            Some(PromptChoice::Discard) => ExitVerdict::AllowWithoutSave,
            Some(PromptChoice::Cancel) | None => ExitVerdict::Deny,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExitRequest {
    label: String,
}

impl ExitRequest {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
        }
    }

    pub fn for_panel(panel: &dyn Trackable) -> Self {
        Self::new(panel.label())
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn title(&self) -> String {
        format!("Save {}", self.label)
    }

    pub fn body(&self) -> String {
        format!(
            "You have unsaved changes in {}. Do you wish to save?",
            self.label
        )
    }
}

/// Presents an [`ExitRequest`] and blocks until the user answers.
///
/// `None` means the prompt was dismissed without an explicit choice.
pub trait ExitPrompt {
    fn ask(&self, request: &ExitRequest) -> Option<PromptChoice>;
}

impl<F> ExitPrompt for F
where
    F: Fn(&ExitRequest) -> Option<PromptChoice>,
{
    fn ask(&self, request: &ExitRequest) -> Option<PromptChoice> {
        self(request)
    }
}

/// Run the protocol for `panel` and reduce the answer to a verdict.
pub fn request_exit(prompt: &dyn ExitPrompt, panel: &dyn Trackable) -> ExitVerdict {
    let request = ExitRequest::for_panel(panel);
    let choice = prompt.ask(&request);
    let verdict = ExitVerdict::from(choice);
    tracing::debug!(label = %request.label(), ?choice, %verdict, "exit request resolved");
    verdict
}
