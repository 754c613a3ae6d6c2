//! The two agent frameworks every pattern is implemented with.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Agent framework a pattern implementation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Framework {
    /// Cloud agent development kit.
    Adk,
    /// Crew-based agent framework.
    #[serde(rename = "crewai")]
    CrewAi,
}

impl Framework {
    /// Both frameworks, in report order.
    pub const ALL: [Framework; 2] = [Framework::Adk, Framework::CrewAi];

    /// Lowercase identifier used in file names and JSON.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Adk => "adk",
            Self::CrewAi => "crewai",
        }
    }

    /// Display label used in tables.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Adk => "ADK",
            Self::CrewAi => "CrewAI",
        }
    }

    /// Infer the framework from a catalog directory name such as
    /// `adk-examples` or `crewai-examples`.
    pub fn from_dir_name(name: &str) -> Option<Self> {
        let lower = name.to_ascii_lowercase();
        if lower.starts_with("crewai") {
            Some(Self::CrewAi)
        } else if lower.starts_with("adk") {
            Some(Self::Adk)
        } else {
            None
        }
    }
}

impl std::fmt::Display for Framework {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Framework {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "adk" => Ok(Self::Adk),
            "crewai" | "crew" => Ok(Self::CrewAi),
            other => Err(format!("unknown framework '{other}' (expected adk or crewai)")),
        }
    }
}
