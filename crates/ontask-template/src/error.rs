//! Rendering error types.

/// Errors raised while preparing or executing a template.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RenderError {
    /// Two context keys translate to the same identifier.
    #[error("variable names {first:?} and {second:?} collide as {translated}")]
    Collision {
        first: String,
        second: String,
        translated: String,
    },

    /// The context already binds a name the renderer injects itself.
    #[error("name {0} is reserved")]
    ReservedName(String),

    /// The template text does not parse.
    #[error("{0}")]
    Syntax(String),

    /// The template parsed but failed while rendering.
    #[error("{0}")]
    Execution(String),
}

/// Convenience alias used throughout the template crate.
pub type Result<T> = std::result::Result<T, RenderError>;

impl RenderError {
    /// Returns `true` if this is a [`RenderError::Syntax`].
    pub fn is_syntax(&self) -> bool {
        matches!(self, Self::Syntax(_))
    }
}

impl From<minijinja::Error> for RenderError {
    fn from(err: minijinja::Error) -> Self {
        let message = match err.detail() {
            Some(detail) => format!("{} (line {})", detail, err.line().unwrap_or_default()),
            None => err.to_string(),
        };
        match err.kind() {
            minijinja::ErrorKind::SyntaxError => Self::Syntax(message),
            _ => Self::Execution(message),
        }
    }
}
