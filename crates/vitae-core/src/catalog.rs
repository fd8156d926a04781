//! Static credit package catalog and feature cost table.
//!
//! Both are configuration data fixed at process start: the catalog is what a
//! user can buy, the cost table is what a feature invocation charges. Neither
//! is user-mutable.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Credit cost of one CV generation.
pub const COST_CV_GENERATION: i64 = 10;

/// Credit cost of one simulated interview session.
pub const COST_INTERVIEW_SESSION: i64 = 30;

/// A purchasable credit package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditPackage {
    /// Catalog identifier, referenced by checkout requests.
    pub id: &'static str,

    /// Display name.
    pub name: &'static str,

    /// Credit quantity this package grants.
    pub credits: i64,

    /// Price in cents of the settlement currency.
    pub price_cents: i64,
}

/// The static package catalog.
pub const PACKAGES: &[CreditPackage] = &[
    CreditPackage {
        id: "starter",
        name: "Starter",
        credits: 50,
        price_cents: 9900,
    },
    CreditPackage {
        id: "standard",
        name: "Standard",
        credits: 120,
        price_cents: 19900,
    },
    CreditPackage {
        id: "pro",
        name: "Pro",
        credits: 300,
        price_cents: 39900,
    },
];

/// Look up a package by its catalog identifier.
#[must_use]
pub fn find_package(id: &str) -> Option<&'static CreditPackage> {
    PACKAGES.iter().find(|p| p.id == id)
}

/// A paid feature gated by the credit ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    /// AI-assisted CV generation.
    CvGeneration,

    /// A simulated interview session.
    InterviewSession,
}

impl Feature {
    /// Credit cost of one invocation of this feature.
    #[must_use]
    pub const fn credit_cost(self) -> i64 {
        match self {
            Self::CvGeneration => COST_CV_GENERATION,
            Self::InterviewSession => COST_INTERVIEW_SESSION,
        }
    }

    /// Display name for ledger descriptions.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::CvGeneration => "CV generation",
            Self::InterviewSession => "Interview session",
        }
    }

    /// All gated features, for rendering the cost table.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::CvGeneration, Self::InterviewSession]
    }
}

impl FromStr for Feature {
    type Err = UnknownFeature;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cv_generation" => Ok(Self::CvGeneration),
            "interview_session" => Ok(Self::InterviewSession),
            _ => Err(UnknownFeature(s.to_string())),
        }
    }
}

/// Error returned when parsing an unknown feature name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown feature: {0}")]
pub struct UnknownFeature(pub String);
