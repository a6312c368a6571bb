//! Consecutive available slots.
//!
//! Slots chain when the next slot starts exactly when the previous one ends.
//! The slot list of a form is unordered, so successors and predecessors are
//! found by scanning it.

use appointment_search_shared::Slot;

/// Index of the slot starting when `current` ends.
///
/// When several slots match, the one with the lowest persisted id wins
/// (unpersisted slots last), then the first in list order.
fn successor(current: &Slot, all_slots: &[Slot], visited: &[bool]) -> Option<usize> {
    all_slots
        .iter()
        .enumerate()
        .filter(|(i, s)| !visited[*i] && s.starting_date_time == current.ending_date_time)
        .min_by_key(|(_, s)| (s.id_slot.is_none(), s.id_slot))
        .map(|(i, _)| i)
}

/// Number of consecutive available slots starting at `slot`.
///
/// Counts `slot` itself, then follows successors while they are open and
/// have remaining places. A slot without remaining places counts 0.
///
/// # Example
///
/// ```
/// use appointment_search_indexer::mapper::consecutive_count;
/// use appointment_search_shared::Slot;
/// use chrono::NaiveDate;
///
/// let day = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
/// let at = |h| day.and_hms_opt(h, 0, 0).unwrap();
/// let slots = vec![
///     Slot::new(1, at(6), at(7), 2, 2),
///     Slot::new(1, at(7), at(8), 1, 2),
///     Slot::new(1, at(8), at(9), 0, 2),
/// ];
/// assert_eq!(consecutive_count(&slots[0], &slots), 2);
/// ```
pub fn consecutive_count(slot: &Slot, all_slots: &[Slot]) -> u32 {
    if !slot.has_remaining_places() {
        return 0;
    }

    let mut visited = vec![false; all_slots.len()];
    // The seed may be part of the list; never walk back onto it.
    if let Some(seed) = all_slots.iter().position(|s| s.same_slot(slot)) {
        visited[seed] = true;
    }

    let mut count = 1;
    let mut current = slot;
    while let Some(next) = successor(current, all_slots, &visited) {
        let next_slot = &all_slots[next];
        if !next_slot.is_available() {
            break;
        }
        visited[next] = true;
        count += 1;
        current = next_slot;
    }
    count
}

/// Slots whose consecutive count depends on `slot`.
///
/// Walks predecessors (slots ending when the current one starts). A
/// predecessor with remaining places is affected; the walk goes past it only
/// when it is open and has remaining places, since a full or closed slot cuts
/// every chain running through it.
pub fn affected_predecessors<'a>(slot: &Slot, all_slots: &'a [Slot]) -> Vec<&'a Slot> {
    let mut visited = vec![false; all_slots.len()];
    if let Some(seed) = all_slots.iter().position(|s| s.same_slot(slot)) {
        visited[seed] = true;
    }

    let mut affected = Vec::new();
    let mut frontier = vec![slot];
    while let Some(current) = frontier.pop() {
        for (i, candidate) in all_slots.iter().enumerate() {
            if visited[i] || candidate.ending_date_time != current.starting_date_time {
                continue;
            }
            visited[i] = true;
            if candidate.has_remaining_places() {
                affected.push(candidate);
            }
            if candidate.is_available() {
                frontier.push(candidate);
            }
        }
    }
    affected
}
