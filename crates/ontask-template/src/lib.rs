//! Template rendering for OnTask actions.
//!
//! Column, attribute and condition names are free text ("first name",
//! "score (%)", "2nd attempt"), but template variables must be identifiers.
//! [`translate`] maps every name to an identifier-safe form, and
//! [`render_template`] applies the same mapping to both the variable
//! references in the template and the keys of the context before handing
//! them to minijinja.

pub mod error;
pub mod render;
pub mod scan;
pub mod translate;

pub use error::{RenderError, Result};
pub use render::{
    render_action_template, render_syntax_error, render_template, RenderOptions,
    ACTION_CONTEXT_VAR, VIZ_NUMBER_CONTEXT_VAR,
};
pub use scan::{rename_template_variable, template_variables};
pub use translate::{translate, translate_context_keys};
