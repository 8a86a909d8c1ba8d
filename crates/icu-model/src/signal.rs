//! Item dictionary: instrument code to canonical signal name.
//!
//! Every configured signal produces exactly two output columns,
//! `<name>_mean` and `<name>_max`, in ascending code order.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};

/// Default MIMIC-IV chart item ids for the common ICU vitals.
pub const DEFAULT_VITAL_ITEMS: [(i64, &str); 5] = [
    (220045, "HeartRate"),
    (220179, "SystolicBP"),
    (220180, "DiastolicBP"),
    (220277, "SpO2"),
    (223761, "Temperature"),
];

/// A named physiological quantity bound to one instrument code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signal {
    pub code: i64,
    pub name: String,
}

impl Signal {
    /// Output column holding the window mean.
    pub fn mean_column(&self) -> String {
        mean_column(&self.name)
    }

    /// Output column holding the window maximum.
    pub fn max_column(&self) -> String {
        max_column(&self.name)
    }
}

pub fn mean_column(name: &str) -> String {
    format!("{name}_mean")
}

pub fn max_column(name: &str) -> String {
    format!("{name}_max")
}

/// One-code-to-one-name mapping of the signals to aggregate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignalDictionary {
    by_code: BTreeMap<i64, String>,
}

impl SignalDictionary {
    /// Build a dictionary, rejecting blank or duplicate names.
    pub fn new(entries: impl IntoIterator<Item = (i64, String)>) -> Result<Self> {
        let mut by_code = BTreeMap::new();
        let mut seen: BTreeMap<String, i64> = BTreeMap::new();
        for (code, name) in entries {
            let name = name.trim().to_string();
            if name.is_empty() {
                return Err(ModelError::BlankSignalName { code });
            }
            if let Some(&first) = seen.get(&name)
                && first != code
            {
                return Err(ModelError::DuplicateSignalName {
                    name,
                    first,
                    second: code,
                });
            }
            seen.insert(name.clone(), code);
            by_code.insert(code, name);
        }
        if by_code.is_empty() {
            return Err(ModelError::EmptySignalDictionary);
        }
        Ok(Self { by_code })
    }

    /// Build a dictionary from text keys, as found in configuration files.
    pub fn from_text_entries<'a>(
        entries: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Result<Self> {
        let mut parsed = Vec::new();
        for (code, name) in entries {
            parsed.push((parse_item_code(code)?, name.to_string()));
        }
        Self::new(parsed)
    }

    pub fn name(&self, code: i64) -> Option<&str> {
        self.by_code.get(&code).map(String::as_str)
    }

    pub fn contains(&self, code: i64) -> bool {
        self.by_code.contains_key(&code)
    }

    pub fn len(&self) -> usize {
        self.by_code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_code.is_empty()
    }

    /// `(code, name)` pairs in ascending code order.
    pub fn iter(&self) -> impl Iterator<Item = (i64, &str)> + '_ {
        self.by_code.iter().map(|(code, name)| (*code, name.as_str()))
    }

    pub fn codes(&self) -> impl Iterator<Item = i64> + '_ {
        self.by_code.keys().copied()
    }

    /// Signals in ascending code order.
    pub fn signals(&self) -> Vec<Signal> {
        self.by_code
            .iter()
            .map(|(code, name)| Signal {
                code: *code,
                name: name.clone(),
            })
            .collect()
    }

    /// All per-signal statistic columns, mean before max for each signal.
    pub fn feature_columns(&self) -> Vec<String> {
        self.by_code
            .values()
            .flat_map(|name| [mean_column(name), max_column(name)])
            .collect()
    }
}

impl Default for SignalDictionary {
    fn default() -> Self {
        Self {
            by_code: DEFAULT_VITAL_ITEMS
                .iter()
                .map(|(code, name)| (*code, (*name).to_string()))
                .collect(),
        }
    }
}

/// Parse an instrument code written as text.
pub fn parse_item_code(value: &str) -> Result<i64> {
    value
        .trim()
        .parse::<i64>()
        .map_err(|_| ModelError::InvalidItemCode(value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_dictionary_has_vitals_in_code_order() {
        let dict = SignalDictionary::default();
        assert_eq!(dict.len(), 5);
        assert_eq!(dict.name(220045), Some("HeartRate"));
        assert_eq!(dict.name(223761), Some("Temperature"));
        assert_eq!(dict.codes().nth(1), Some(220179));
        assert_eq!(
            &dict.feature_columns()[..4],
            &["HeartRate_mean", "HeartRate_max", "SystolicBP_mean", "SystolicBP_max"]
        );
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let result = SignalDictionary::new(vec![
            (1, "HeartRate".to_string()),
            (2, "HeartRate".to_string()),
        ]);
        assert_eq!(
            result,
            Err(ModelError::DuplicateSignalName {
                name: "HeartRate".to_string(),
                first: 1,
                second: 2,
            })
        );
    }

    #[test]
    fn empty_and_blank_entries_are_rejected() {
        assert_eq!(
            SignalDictionary::new(Vec::new()),
            Err(ModelError::EmptySignalDictionary)
        );
        assert_eq!(
            SignalDictionary::new(vec![(7, "  ".to_string())]),
            Err(ModelError::BlankSignalName { code: 7 })
        );
    }

    #[test]
    fn text_entries_parse_codes() {
        let dict = SignalDictionary::from_text_entries([("220045", "HR"), (" 220277 ", "SpO2")])
            .unwrap();
        assert_eq!(dict.name(220045), Some("HR"));
        assert!(dict.contains(220277));
        assert_eq!(
            SignalDictionary::from_text_entries([("hr", "HR")]),
            Err(ModelError::InvalidItemCode("hr".to_string()))
        );
    }
}
