//! Core types for the OnTask personalization engine.
//!
//! This crate holds the scalar [`Value`] model shared by formula evaluation,
//! template rendering and tabular storage, together with [`Row`],
//! [`Context`] and [`Column`].

pub mod column;
pub mod row;
pub mod value;

pub use column::Column;
pub use row::{Context, Row};
pub use value::{ParseValueTypeError, Value, ValueType};
