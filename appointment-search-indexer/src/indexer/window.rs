//! Display window of a form.
//!
//! The window is the date range the front office shows for a form: from
//! today (or the validity start, when later) to the Sunday closing the last
//! displayed week, clipped to the validity end.

use chrono::{Datelike, Days, Duration, NaiveDate, NaiveDateTime};

use appointment_search_shared::{Form, Slot};

/// Inclusive date range of the slots displayed for `form`.
///
/// Returns `None` when the validity end is before the window start. An end
/// past the calendar range saturates to `NaiveDate::MAX`.
pub fn display_window(form: &Form, today: NaiveDate) -> Option<(NaiveDate, NaiveDate)> {
    let start = match form.date_start_validity {
        Some(validity_start) if validity_start > today => validity_start,
        _ => today,
    };

    let days_to_sunday = u64::from(7 - start.weekday().number_from_monday());
    let weeks = u64::from(form.nb_weeks_to_display.max(1).unsigned_abs()) - 1;
    let mut end = start
        .checked_add_days(Days::new(days_to_sunday + weeks * 7))
        .unwrap_or(NaiveDate::MAX);
    if let Some(validity_end) = form.date_end_validity {
        end = end.min(validity_end);
    }

    (end >= start).then_some((start, end))
}

/// Drop the slots starting too soon to be booked.
///
/// With a minimum notice of `h` hours, only slots starting strictly after
/// `now + h` are kept. A notice of 0 keeps every slot, a notice reaching
/// past the calendar range keeps none.
pub fn filter_min_notice(form: &Form, slots: Vec<Slot>, now: NaiveDateTime) -> Vec<Slot> {
    if form.min_time_before_appointment == 0 {
        return slots;
    }
    let Some(threshold) =
        now.checked_add_signed(Duration::hours(i64::from(form.min_time_before_appointment)))
    else {
        return Vec::new();
    };
    slots
        .into_iter()
        .filter(|slot| slot.starting_date_time > threshold)
        .collect()
}

/// Whether the date range `[start, end]` overlaps the display window.
pub fn is_period_valid_to_index(
    form: &Form,
    start: NaiveDate,
    end: NaiveDate,
    today: NaiveDate,
) -> bool {
    match display_window(form, today) {
        Some((window_start, window_end)) => start <= window_end && end >= window_start,
        None => false,
    }
}
