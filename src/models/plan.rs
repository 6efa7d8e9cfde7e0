use serde::{Deserialize, Serialize};
use std::fmt;

/// Account plan. `Pro` is what the "simulate pro" switch turns on.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    #[default]
    Free,
    Pro,
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Plan::Free => write!(f, "Free"),
            Plan::Pro => write!(f, "Pro"),
        }
    }
}

/// What a plan unlocks.
#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub custom_style: bool,
    pub svg_export: bool,
}

impl Plan {
    pub fn from_flag(pro: bool) -> Self {
        if pro { Plan::Pro } else { Plan::Free }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Plan::Free => "free",
            Plan::Pro => "pro",
        }
    }

    pub fn is_pro(&self) -> bool {
        matches!(self, Plan::Pro)
    }

    pub fn capabilities(&self) -> Capabilities {
        Capabilities {
            custom_style: self.is_pro(),
            svg_export: self.is_pro(),
        }
    }
}
