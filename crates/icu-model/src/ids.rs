#![deny(unsafe_code)]

use std::fmt;

use crate::ModelError;

/// Canonical subject identifier.
///
/// Raw tables may carry the same subject as `Int64` in one file and as
/// `Float64` or text in another; every loader renders the value through the
/// same canonical text form before wrapping it, so equality is textual.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct SubjectId(String);

impl SubjectId {
    pub fn new(value: impl Into<String>) -> Result<Self, ModelError> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ModelError::InvalidSubjectId(value));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SubjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Canonical ICU stay identifier.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct StayId(String);

impl StayId {
    pub fn new(value: impl Into<String>) -> Result<Self, ModelError> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ModelError::InvalidStayId(value));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StayId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_trimmed() {
        let subject = SubjectId::new(" 10001 ").unwrap();
        assert_eq!(subject.as_str(), "10001");
        assert_eq!(subject.to_string(), "10001");
    }

    #[test]
    fn blank_ids_are_rejected() {
        assert!(matches!(
            SubjectId::new("  "),
            Err(ModelError::InvalidSubjectId(_))
        ));
        assert!(matches!(StayId::new(""), Err(ModelError::InvalidStayId(_))));
    }
}
