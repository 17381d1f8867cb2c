// 🏆 Competition Entity - Closing date + team/individual mode
//
// Registrations are open until the closing date (inclusive). The closing
// date can be pushed back but never brought forward.
//
// Enrolled candidates are not stored here: the registry keeps one edge per
// enrollment, see `Registry::candidates_of`.

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

use crate::entities::CandidateKind;
use crate::error::{RegistryError, Result};

/// Today's date on the local calendar
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Competition {
    name: String,

    /// None = registrations never close
    closing_date: Option<NaiveDate>,

    /// true = teams only, false = individuals only
    team_only: bool,
}

impl Competition {
    pub(crate) fn new(name: String, closing_date: Option<NaiveDate>, team_only: bool) -> Self {
        Competition {
            name,
            closing_date,
            team_only,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn closing_date(&self) -> Option<NaiveDate> {
        self.closing_date
    }

    pub fn is_team_only(&self) -> bool {
        self.team_only
    }

    /// Kind of candidate this competition is meant for
    pub fn required_kind(&self) -> CandidateKind {
        if self.team_only {
            CandidateKind::Team
        } else {
            CandidateKind::Individual
        }
    }

    pub fn accepts(&self, kind: CandidateKind) -> bool {
        self.required_kind() == kind
    }

    /// Move the closing date.
    ///
    /// Fails with `InvalidDate` when `closing_date` is earlier than the
    /// current one; the stored date is left unchanged in that case.
    pub fn set_closing_date(&mut self, closing_date: NaiveDate) -> Result<()> {
        if let Some(current) = self.closing_date {
            if closing_date < current {
                return Err(RegistryError::InvalidDate {
                    competition: self.name.clone(),
                    current,
                    requested: closing_date,
                });
            }
        }

        self.closing_date = Some(closing_date);
        Ok(())
    }

    pub fn is_open(&self) -> bool {
        self.is_open_at(today())
    }

    /// Open through and including the closing day
    pub fn is_open_at(&self, today: NaiveDate) -> bool {
        match self.closing_date {
            None => true,
            Some(closing) => closing >= today,
        }
    }

    /// True while `today` is strictly before the closing date.
    /// Competitions without a closing date have no deadline to be before.
    pub fn is_before_deadline(&self, today: NaiveDate) -> bool {
        self.closing_date.map_or(false, |closing| today < closing)
    }
}

impl Ord for Competition {
    fn cmp(&self, other: &Self) -> Ordering {
        self.name.cmp(&other.name)
    }
}

impl PartialOrd for Competition {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Competition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

// ============================================================================
// TESTS
// ============================================================================
