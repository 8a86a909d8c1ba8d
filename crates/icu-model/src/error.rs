use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ModelError {
    #[error("invalid subject identifier: {0:?}")]
    InvalidSubjectId(String),
    #[error("invalid stay identifier: {0:?}")]
    InvalidStayId(String),
    #[error("signal dictionary is empty")]
    EmptySignalDictionary,
    #[error("signal name for item {code} is blank")]
    BlankSignalName { code: i64 },
    #[error("signal name {name:?} is used by items {first} and {second}")]
    DuplicateSignalName { name: String, first: i64, second: i64 },
    #[error("invalid item code {0:?}")]
    InvalidItemCode(String),
    #[error("window length must be positive, got {0} hours")]
    InvalidWindow(f64),
}

pub type Result<T> = std::result::Result<T, ModelError>;
