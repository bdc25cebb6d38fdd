//! Error taxonomy.
//!
//! Stream errors travel through the `Err` type parameter of each observable,
//! so a pipeline chooses its own error type. The types here cover what the
//! engine itself can report: invalid operator configuration (raised
//! synchronously while building a pipeline), an empty sequence where a value
//! was required, and a ready-made [`RxError`] for pipelines that do not want
//! to define their own.

use thiserror::Error;

/// An operator or subject was configured with values it cannot work with.
///
/// Always returned at construction time, never delivered through `error`.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
  #[error("unknown {family} strategy `{tag}`")]
  UnknownStrategy { family: &'static str, tag: String },

  #[error("`{operator}` requires a count greater than zero")]
  ZeroCount { operator: &'static str },

  #[error("`{operator}` requires a non-zero duration")]
  ZeroDuration { operator: &'static str },

  #[error("`{strategy}` strategy needs a {missing}")]
  MissingArgument { strategy: &'static str, missing: &'static str },
}

impl ConfigError {
  /// Short, stable label for logs.
  pub fn as_label(&self) -> &'static str {
    match self {
      ConfigError::UnknownStrategy { .. } => "config_unknown_strategy",
      ConfigError::ZeroCount { .. } => "config_zero_count",
      ConfigError::ZeroDuration { .. } => "config_zero_duration",
      ConfigError::MissingArgument { .. } => "config_missing_argument",
    }
  }
}

/// A source completed without producing the value an operator needed.
#[derive(Error, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[error("sequence completed without emitting a value")]
pub struct EmptyError;

impl From<EmptyError> for String {
  fn from(e: EmptyError) -> Self { e.to_string() }
}

impl From<EmptyError> for &'static str {
  fn from(_: EmptyError) -> Self { "sequence completed without emitting a value" }
}

/// General purpose stream error.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RxError {
  /// The producer of a stream failed.
  #[error("source failed: {0}")]
  Source(String),

  /// A user function inside an operator failed.
  #[error("operator failed: {0}")]
  Operator(String),

  #[error(transparent)]
  Config(#[from] ConfigError),

  /// A scheduler or executor could not provide the resource a stream needed.
  #[error("resource unavailable: {0}")]
  Resource(String),

  #[error(transparent)]
  Empty(#[from] EmptyError),
}

impl RxError {
  pub fn as_label(&self) -> &'static str {
    match self {
      RxError::Source(_) => "source",
      RxError::Operator(_) => "operator",
      RxError::Config(c) => c.as_label(),
      RxError::Resource(_) => "resource",
      RxError::Empty(_) => "empty",
    }
  }
}

impl From<futures::task::SpawnError> for RxError {
  fn from(e: futures::task::SpawnError) -> Self { RxError::Resource(e.to_string()) }
}
