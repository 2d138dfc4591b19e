//! Seat availability parsing.
//!
//! The backend reports availability as one string of comma-separated seat
//! numbers (`"1, 2, 3"`). Parsed sets are sorted and free of duplicates.

use crate::types::SeatNumber;
use std::num::ParseIntError;

/// Parse the backend's availability string. An empty string means no seats.
///
/// # Errors
///
/// Returns the first entry that is not a seat number.
pub fn parse_available_seats(raw: &str) -> Result<Vec<SeatNumber>, ParseIntError> {
    let mut seats = raw
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| entry.parse().map(SeatNumber))
        .collect::<Result<Vec<_>, _>>()?;
    seats.sort_unstable();
    seats.dedup();
    Ok(seats)
}

/// Add the seat an edited ticket already holds, keeping the set sorted.
#[must_use]
pub fn with_held_seat(mut seats: Vec<SeatNumber>, held: SeatNumber) -> Vec<SeatNumber> {
    if let Err(position) = seats.binary_search(&held) {
        seats.insert(position, held);
    }
    seats
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Test code can use unwrap
mod tests {
    use super::*;

    fn seats(numbers: &[u32]) -> Vec<SeatNumber> {
        numbers.iter().copied().map(SeatNumber).collect()
    }

    #[test]
    fn parses_comma_space_list() {
        assert_eq!(parse_available_seats("1, 2, 3").unwrap(), seats(&[1, 2, 3]));
    }

    #[test]
    fn tolerates_spacing_and_order() {
        assert_eq!(
            parse_available_seats("12,3 ,  7, 3").unwrap(),
            seats(&[3, 7, 12])
        );
    }

    #[test]
    fn empty_string_is_no_seats() {
        assert!(parse_available_seats("").unwrap().is_empty());
        assert!(parse_available_seats("  ").unwrap().is_empty());
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(parse_available_seats("1, two, 3").is_err());
    }

    #[test]
    fn held_seat_is_always_present() {
        assert_eq!(
            with_held_seat(seats(&[1, 5, 9]), SeatNumber(4)),
            seats(&[1, 4, 5, 9])
        );
        assert_eq!(with_held_seat(seats(&[1, 4]), SeatNumber(4)), seats(&[1, 4]));
        assert_eq!(with_held_seat(Vec::new(), SeatNumber(2)), seats(&[2]));
    }
}
