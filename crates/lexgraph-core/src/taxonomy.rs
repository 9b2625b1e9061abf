//! Relation taxonomy for statute knowledge graphs
//!
//! A closed vocabulary of relation labels the relation extractor is asked
//! to draw from. Labels are not enforced on [`crate::GraphTriplet`].

use serde::{Deserialize, Serialize};

/// Group a relation label belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationCategory {
    /// Hierarchy and cross-references between provisions
    Structural,
    /// Precedence, exceptions, legal basis
    Logical,
    /// Duties, prohibitions, permissions, definitions
    Obligation,
    /// Penalties and liability
    Sanction,
    /// Competent authorities and procedures
    Procedural,
}

impl RelationCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Structural => "structural",
            Self::Logical => "logical",
            Self::Obligation => "obligation",
            Self::Sanction => "sanction",
            Self::Procedural => "procedural",
        }
    }
}

impl std::fmt::Display for RelationCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Relation types recognized in statute text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RelationType {
    // Structure and reference
    ParentArticle,          // 장-절-조-항-호 hierarchy
    RefersTo,               // plain citation
    AppliesMutatisMutandis, // 준용
    DelegatesTo,            // delegation to decrees/rules

    // Logic and precedence
    ExceptionTo,
    Supersedes,
    BasedOn,

    // Obligation and action
    Defines,
    Requires,
    Prohibits,
    Allows,

    // Sanction and liability
    PunishableFor, // criminal penalty
    FineFor,       // administrative fine (과태료)
    ResponsibleFor,

    // Actor and procedure
    HasAuthority,
    AppliesTo,
    FollowsProcedure,
}

impl RelationType {
    /// Every label, in prompt order
    pub const ALL: [RelationType; 17] = [
        Self::ParentArticle,
        Self::RefersTo,
        Self::AppliesMutatisMutandis,
        Self::DelegatesTo,
        Self::ExceptionTo,
        Self::Supersedes,
        Self::BasedOn,
        Self::Defines,
        Self::Requires,
        Self::Prohibits,
        Self::Allows,
        Self::PunishableFor,
        Self::FineFor,
        Self::ResponsibleFor,
        Self::HasAuthority,
        Self::AppliesTo,
        Self::FollowsProcedure,
    ];

    /// Get the canonical label
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ParentArticle => "parent-article",
            Self::RefersTo => "refers-to",
            Self::AppliesMutatisMutandis => "applies-mutatis-mutandis",
            Self::DelegatesTo => "delegates-to",
            Self::ExceptionTo => "exception-to",
            Self::Supersedes => "supersedes",
            Self::BasedOn => "based-on",
            Self::Defines => "defines",
            Self::Requires => "requires",
            Self::Prohibits => "prohibits",
            Self::Allows => "allows",
            Self::PunishableFor => "punishable-for",
            Self::FineFor => "fine-for",
            Self::ResponsibleFor => "responsible-for",
            Self::HasAuthority => "has-authority",
            Self::AppliesTo => "applies-to",
            Self::FollowsProcedure => "follows-procedure",
        }
    }

    /// Korean statutory label
    pub fn korean_label(&self) -> &'static str {
        match self {
            Self::ParentArticle => "상위조항",
            Self::RefersTo => "참조함",
            Self::AppliesMutatisMutandis => "준용함",
            Self::DelegatesTo => "위임함",
            Self::ExceptionTo => "예외로함",
            Self::Supersedes => "우선함",
            Self::BasedOn => "근거함",
            Self::Defines => "정의함",
            Self::Requires => "요구함",
            Self::Prohibits => "금지함",
            Self::Allows => "허용함",
            Self::PunishableFor => "처벌대상임",
            Self::FineFor => "과태료대상임",
            Self::ResponsibleFor => "책임이있음",
            Self::HasAuthority => "권한을가짐",
            Self::AppliesTo => "적용대상임",
            Self::FollowsProcedure => "절차를따름",
        }
    }

    pub fn category(&self) -> RelationCategory {
        match self {
            Self::ParentArticle | Self::RefersTo | Self::AppliesMutatisMutandis | Self::DelegatesTo => {
                RelationCategory::Structural
            }
            Self::ExceptionTo | Self::Supersedes | Self::BasedOn => RelationCategory::Logical,
            Self::Defines | Self::Requires | Self::Prohibits | Self::Allows => {
                RelationCategory::Obligation
            }
            Self::PunishableFor | Self::FineFor | Self::ResponsibleFor => RelationCategory::Sanction,
            Self::HasAuthority | Self::AppliesTo | Self::FollowsProcedure => {
                RelationCategory::Procedural
            }
        }
    }

    /// Parse either the canonical or the Korean label
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        Self::ALL.into_iter().find(|r| {
            r.as_str().eq_ignore_ascii_case(s)
                || r.korean_label() == s
                || r.as_str().replace('-', "_").eq_ignore_ascii_case(s)
        })
    }
}

impl std::fmt::Display for RelationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
