//! Academic calendar: the single "current period" marker.
//!
//! Exactly one period may be current at a time. [`AcademicCalendar::set_current`]
//! clears and sets in one operation; the anomaly tolerance in
//! [`AcademicCalendar::current`] only exists for data imported from elsewhere.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use unipay_core::AcademicTerm;

use crate::error::{OrgError, OrgResult};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodConfig {
    pub term: AcademicTerm,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub is_current: bool,
}

#[derive(Debug, Default)]
pub struct AcademicCalendar {
    periods: Vec<PeriodConfig>,
}

impl AcademicCalendar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_period(
        &mut self,
        term: AcademicTerm,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> OrgResult<()> {
        if self.periods.iter().any(|p| p.term == term) {
            return Err(OrgError::DuplicatePeriod);
        }
        self.periods.push(PeriodConfig {
            term,
            start_date,
            end_date,
            is_current: false,
        });
        Ok(())
    }

    /// Mark `term` as the current period, unsetting every other row in the
    /// same operation.
    pub fn set_current(&mut self, term: &AcademicTerm) -> OrgResult<()> {
        if !self.periods.iter().any(|p| &p.term == term) {
            return Err(OrgError::UnknownPeriod);
        }
        for period in &mut self.periods {
            period.is_current = &period.term == term;
        }
        Ok(())
    }

    /// The current period, if any. If more than one row is flagged (a data
    /// anomaly from imported state), the one with the latest start date wins
    /// so resolution stays deterministic.
    pub fn current(&self) -> Option<&PeriodConfig> {
        self.periods
            .iter()
            .filter(|p| p.is_current)
            .max_by_key(|p| p.start_date)
    }

    pub fn current_term(&self) -> OrgResult<&AcademicTerm> {
        self.current()
            .map(|p| &p.term)
            .ok_or(OrgError::NoCurrentPeriod)
    }

    pub fn periods(&self) -> &[PeriodConfig] {
        &self.periods
    }

    #[cfg(test)]
    pub(crate) fn force_current_flag(&mut self, term: &AcademicTerm) {
        for period in &mut self.periods {
            if &period.term == term {
                period.is_current = true;
            }
        }
    }
}
