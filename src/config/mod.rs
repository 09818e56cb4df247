//! Configuration for the linkage run.

use chrono::NaiveDate;

/// Default death-date cutoff for the paediatric cohort
pub const PAEDS_DEATH_CUTOFF: NaiveDate = match NaiveDate::from_ymd_opt(1900, 1, 1) {
    Some(date) => date,
    None => panic!("invalid default cutoff"),
};

/// Configuration for a linkage run
#[derive(Debug, Clone)]
pub struct LinkageConfig {
    /// Whether the fuzzy-name stage runs over residual unmatched records
    pub fuzzy_enabled: bool,
    /// Maximum Levenshtein distance for a close-name candidate
    pub fuzzy_max_distance: usize,
    /// Maximum close-name candidates kept per name
    pub fuzzy_candidate_cap: usize,
    /// Number of transplant slots carried per extract row
    pub transplant_slots: usize,
    /// Deceased paediatric cohort patients who died before this date
    /// are not loaded for matching
    pub paeds_death_cutoff: NaiveDate,
    /// Apply staged inserts/updates to the store (dry run when false)
    pub commit: bool,
}

impl Default for LinkageConfig {
    fn default() -> Self {
        Self {
            fuzzy_enabled: true,
            fuzzy_max_distance: 2,
            fuzzy_candidate_cap: 5,
            transplant_slots: 6,
            paeds_death_cutoff: PAEDS_DEATH_CUTOFF,
            commit: false,
        }
    }
}

/// Builder for `LinkageConfig`
#[derive(Debug, Default)]
pub struct LinkageConfigBuilder {
    config: LinkageConfig,
}

impl LinkageConfigBuilder {
    /// Create a new builder with default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable the fuzzy-name stage
    #[must_use]
    pub const fn with_fuzzy(mut self, enabled: bool) -> Self {
        self.config.fuzzy_enabled = enabled;
        self
    }

    /// Set the maximum edit distance for close-name selection
    #[must_use]
    pub const fn with_fuzzy_max_distance(mut self, distance: usize) -> Self {
        self.config.fuzzy_max_distance = distance;
        self
    }

    /// Set the close-name candidate cap per name
    #[must_use]
    pub const fn with_fuzzy_candidate_cap(mut self, cap: usize) -> Self {
        self.config.fuzzy_candidate_cap = cap;
        self
    }

    /// Set the number of transplant slots per extract row
    #[must_use]
    pub const fn with_transplant_slots(mut self, slots: usize) -> Self {
        self.config.transplant_slots = slots;
        self
    }

    /// Set the death-date cutoff for the paediatric cohort
    #[must_use]
    pub const fn with_paeds_death_cutoff(mut self, cutoff: NaiveDate) -> Self {
        self.config.paeds_death_cutoff = cutoff;
        self
    }

    /// Apply staged writes to the store instead of a dry run
    #[must_use]
    pub const fn with_commit(mut self, commit: bool) -> Self {
        self.config.commit = commit;
        self
    }

    /// Build the final configuration
    #[must_use]
    pub fn build(self) -> LinkageConfig {
        self.config
    }
}
