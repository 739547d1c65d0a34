use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExpressionError {
    #[error("invalid visibility condition: {0}")]
    InvalidCondition(String),

    #[error("condition must reference one of $state, $item or $index")]
    MissingSubject,
}
