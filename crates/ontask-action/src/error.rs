//! Pipeline error types.

use ontask_formula::EvalError;
use ontask_storage::StorageError;
use ontask_template::RenderError;

/// Errors raised while evaluating an action.
#[derive(Debug, thiserror::Error)]
pub enum ActionError {
    /// The action body failed to parse or render. No partial results are
    /// returned.
    #[error("Syntax error detected in the action text. {0}")]
    TextSyntax(String),

    /// The extra text (e.g. the email subject) failed to parse or render.
    #[error("Syntax error detected in the subject. {0}")]
    SubjectSyntax(String),

    /// The operation does not apply to this kind of action.
    #[error("incorrect type of action: {0}")]
    IncorrectActionType(String),

    /// A condition could not be evaluated (missing variable, bad type...).
    #[error("condition {condition}: {source}")]
    Formula {
        condition: String,
        #[source]
        source: EvalError,
    },

    /// Context preparation failed (key collision, reserved name).
    #[error(transparent)]
    Render(RenderError),

    /// An input action names a column the row does not have.
    #[error("column {0} is not in the row")]
    MissingColumn(String),

    #[error(transparent)]
    Storage(#[from] StorageError),

    /// The workflow metadata violates a naming or structure rule.
    #[error("validation error: {0}")]
    Validation(String),
}

/// Convenience alias used throughout the action crate.
pub type Result<T> = std::result::Result<T, ActionError>;

impl ActionError {
    pub(crate) fn formula(condition: &str, source: EvalError) -> Self {
        Self::Formula {
            condition: condition.to_owned(),
            source,
        }
    }

    /// Returns `true` for the two template syntax variants.
    pub fn is_syntax(&self) -> bool {
        matches!(self, Self::TextSyntax(_) | Self::SubjectSyntax(_))
    }
}
