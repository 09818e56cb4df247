//! Match method and prior-link transition vocabulary.

/// How a candidate pair was generated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchMethod {
    /// NHS/CHI/HSC number equality
    NationalId,
    /// Incoming prior registry id equals the registry record's id
    RegistryId,
    /// Incoming external id equals the registry record's stored
    /// external id
    ExternalId,
    /// Date of birth, surname and forename all agree
    ExactDemographic,
    /// Date of birth, postcode and one name agree
    RelaxedDemographic,
    /// Demographic join over first-token variants of compound names
    CompoundName,
    /// Demographic join with an edit-distance close name standing in
    FuzzyName,
}

impl MatchMethod {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NationalId => "national_id",
            Self::RegistryId => "registry_id",
            Self::ExternalId => "external_id",
            Self::ExactDemographic => "exact_demographic",
            Self::RelaxedDemographic => "relaxed_demographic",
            Self::CompoundName => "compound_name",
            Self::FuzzyName => "fuzzy_name",
        }
    }
}

/// Relationship between this run's match outcome and the prior stored
/// link carried on the extract row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transition {
    /// No prior link and no match this run
    NoPriorNoMatch,
    /// No prior link, matched this run
    NewMatch,
    /// Prior link exists but nothing matched this run
    UsedToMatch,
    /// Prior link confirmed by this run
    SameMatch,
    /// Matched a different registry record than the prior link
    DifferentMatch,
}

impl Transition {
    /// Numeric code kept for the matched-output column; the two
    /// no-prior cases share code 0 as the downstream consumers expect
    #[must_use]
    pub const fn legacy_code(self) -> u8 {
        match self {
            Self::NoPriorNoMatch | Self::NewMatch => 0,
            Self::SameMatch => 1,
            Self::DifferentMatch => 2,
            Self::UsedToMatch => 3,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NoPriorNoMatch => "NO_MATCH",
            Self::NewMatch => "NEW_MATCH",
            Self::UsedToMatch => "USED_TO_MATCH",
            Self::SameMatch => "SAME_MATCH",
            Self::DifferentMatch => "DIFFERENT_MATCH",
        }
    }
}
