use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::InvalidTaskId;

/// Identifier the service assigns to a background training job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TaskId(String);

impl TaskId {
    pub fn parse(raw: impl Into<String>) -> Result<Self, InvalidTaskId> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            return Err(InvalidTaskId);
        }
        Ok(Self(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for TaskId {
    type Error = InvalidTaskId;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<TaskId> for String {
    fn from(value: TaskId) -> Self {
        value.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Coarse availability of the remote service as reported by `/status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceState {
    Online,
    Offline,
    #[default]
    Unknown,
}

impl ServiceState {
    pub const ONLINE_STATUS: &'static str = "Online";

    pub fn from_status_text(status: Option<&str>) -> Self {
        match status.map(str::trim) {
            None | Some("") => Self::Unknown,
            Some(Self::ONLINE_STATUS) => Self::Online,
            Some(_) => Self::Offline,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActiveTab {
    #[default]
    Dashboard,
    Predict,
    Retrain,
}

impl ActiveTab {
    pub fn title(self) -> &'static str {
        match self {
            Self::Dashboard => "Dashboard",
            Self::Predict => "Predict",
            Self::Retrain => "Retrain Model",
        }
    }
}
