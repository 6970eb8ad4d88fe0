use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::workflows::underwriting::domain::Underwriter;

/// How an underwriter's specialty list is compared against a submission's industry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpecialtyMatch {
    /// Industry substring match, plus `technology` and `healthcare` specialties
    /// matching any industry.
    #[default]
    Permissive,
    /// Industry substring match only.
    Strict,
}

impl SpecialtyMatch {
    pub const fn label(self) -> &'static str {
        match self {
            SpecialtyMatch::Permissive => "permissive",
            SpecialtyMatch::Strict => "strict",
        }
    }

    pub fn matches(self, industry: &str, specialty: &str) -> bool {
        let industry = industry.to_lowercase();
        let specialty = specialty.to_lowercase();
        if industry.contains(&specialty) {
            return true;
        }
        match self {
            SpecialtyMatch::Permissive => {
                specialty.contains("technology") || specialty.contains("healthcare")
            }
            SpecialtyMatch::Strict => false,
        }
    }

    /// First underwriter in roster order with any matching specialty.
    pub fn first_match<'a>(
        self,
        industry: &str,
        roster: &'a [Underwriter],
    ) -> Option<&'a Underwriter> {
        roster.iter().find(|underwriter| {
            underwriter
                .specialty
                .iter()
                .any(|specialty| self.matches(industry, specialty))
        })
    }
}

impl fmt::Display for SpecialtyMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for SpecialtyMatch {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "permissive" | "loose" => Ok(SpecialtyMatch::Permissive),
            "strict" => Ok(SpecialtyMatch::Strict),
            other => Err(format!("unknown specialty match mode '{other}'")),
        }
    }
}
