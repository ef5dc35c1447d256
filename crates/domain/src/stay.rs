//! Validated check-in/check-out date range and the overlap rule.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// A validated stay: check-in strictly before check-out.
///
/// Owns the date-overlap rule used to count booked rooms. The comparison is
/// inclusive on both ends: a stay checking out on the day another checks in
/// still counts as overlapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StayRange {
    check_in_date: NaiveDate,
    check_out_date: NaiveDate,
}

impl StayRange {
    /// Creates a stay range, rejecting check-in on or after check-out.
    pub fn new(check_in_date: NaiveDate, check_out_date: NaiveDate) -> Result<Self, DomainError> {
        if check_in_date >= check_out_date {
            return Err(DomainError::InvalidStayRange {
                check_in: check_in_date,
                check_out: check_out_date,
            });
        }
        Ok(Self {
            check_in_date,
            check_out_date,
        })
    }

    /// Returns the check-in date.
    pub fn check_in(&self) -> NaiveDate {
        self.check_in_date
    }

    /// Returns the check-out date.
    pub fn check_out(&self) -> NaiveDate {
        self.check_out_date
    }

    /// Returns the number of nights in the stay.
    pub fn nights(&self) -> i64 {
        (self.check_out_date - self.check_in_date).num_days()
    }

    /// Returns true when the two stays overlap.
    ///
    /// Rule: `existing.check_in <= requested.check_out AND
    /// existing.check_out >= requested.check_in`.
    pub fn overlaps(&self, other: &StayRange) -> bool {
        self.check_in_date <= other.check_out_date && self.check_out_date >= other.check_in_date
    }
}

impl std::fmt::Display for StayRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {})", self.check_in_date, self.check_out_date)
    }
}
