use crate::domain::models::Recurrence;
use chrono::{Days, Months, NaiveDate};

/// Upper bound on generated occurrences, one year of weekly repeats.
pub const MAX_OCCURRENCES: usize = 52;

/// Expands a recurrence into its occurrence dates between `start` and `end`
/// inclusive.
///
/// `Recurrence::None` always yields `[start]`. An inverted range yields no
/// dates. Monthly occurrences are offset from `start` and clamped to the last
/// day of shorter months, so Jan 31 repeats as Feb 28, Mar 31, Apr 30.
pub fn build_recurring_dates(start: NaiveDate, end: NaiveDate, recurrence: Recurrence) -> Vec<NaiveDate> {
    if recurrence == Recurrence::None {
        return vec![start];
    }

    let mut dates = Vec::new();
    for index in 0..MAX_OCCURRENCES as u32 {
        let Some(date) = nth_occurrence(start, recurrence, index) else {
            break;
        };
        if date > end {
            break;
        }
        dates.push(date);
    }
    dates
}

fn nth_occurrence(start: NaiveDate, recurrence: Recurrence, index: u32) -> Option<NaiveDate> {
    match recurrence {
        Recurrence::None => (index == 0).then_some(start),
        Recurrence::Daily => start.checked_add_days(Days::new(u64::from(index))),
        Recurrence::Weekly => start.checked_add_days(Days::new(u64::from(index) * 7)),
        Recurrence::Monthly => start.checked_add_months(Months::new(index)),
    }
}
