//! Participants, income distributions and class weights from TOML
//!
//! ```toml
//! [[participants]]
//! name = "Alice"
//! persona = "A pragmatic nurse who has worked night shifts for twenty years."
//! model = "gpt-4o-mini"
//! temperature = 0.7
//!
//! [[distributions]]
//! id = "d1"
//! name = "Distribution 1"
//! incomes = { high = 32000, medium_high = 27000, medium = 24000, medium_low = 13000, low = 12000 }
//!
//! [class_weights]
//! medium = 0.4
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileParticipantConfig {
    pub name: String,
    #[serde(default)]
    pub persona: String,
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileDistributionConfig {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    /// Income class name (`high`, `medium_high`, ...) to dollars
    pub incomes: BTreeMap<String, i64>,
}
