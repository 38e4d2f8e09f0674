use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct EmergencyCommand {
    /// Written on a piece of paper under the main boss's keyboard
    /// @tag example:"endgame" validate:"required"
    #[serde(rename = "confirmation_code")]
    pub confirmation_code: String,
    /// @tag json:"timeout" description:"Time in seconds until execution" example:"3" validate:"min=3,required"
    pub timeout: u32,
    #[serde(skip)]
    pub received_at: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CancelCommand {
    pub reason: Option<String>,
    pub severity: Severity,
}

#[derive(Debug, Serialize, Deserialize)]
pub enum Severity {
    Low,
    #[serde(rename = "CRITICAL")]
    Critical,
}
