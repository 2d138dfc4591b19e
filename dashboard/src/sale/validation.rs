//! Passenger form validation.

use crate::types::Passenger;
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::LazyLock;

#[allow(clippy::expect_used)] // Static pattern, checked by tests
static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\S+@\S+\.\S+$").expect("email pattern compiles"));

#[allow(clippy::expect_used)] // Static pattern, checked by tests
static PHONE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[+]?[0-9]{8,15}$").expect("phone pattern compiles"));

/// A field of the passenger form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, serde::Deserialize)]
pub enum PassengerField {
    /// Given name
    #[serde(rename = "passenger_name")]
    Name,
    /// Family name
    #[serde(rename = "passenger_surname")]
    Surname,
    /// Email
    #[serde(rename = "passenger_email")]
    Email,
    /// Phone
    #[serde(rename = "passenger_phone")]
    Phone,
}

impl PassengerField {
    /// The field's value in `passenger`.
    #[must_use]
    pub fn value(self, passenger: &Passenger) -> &str {
        match self {
            Self::Name => &passenger.passenger_name,
            Self::Surname => &passenger.passenger_surname,
            Self::Email => &passenger.passenger_email,
            Self::Phone => &passenger.passenger_phone,
        }
    }

    /// Mutable access to the field in `passenger`.
    pub fn value_mut(self, passenger: &mut Passenger) -> &mut String {
        match self {
            Self::Name => &mut passenger.passenger_name,
            Self::Surname => &mut passenger.passenger_surname,
            Self::Email => &mut passenger.passenger_email,
            Self::Phone => &mut passenger.passenger_phone,
        }
    }
}

/// Errors of one passenger form, keyed by field.
pub type PassengerErrors = BTreeMap<PassengerField, &'static str>;

/// Validate one passenger. Empty result means valid.
#[must_use]
pub fn validate_passenger(passenger: &Passenger) -> PassengerErrors {
    let mut errors = PassengerErrors::new();

    if passenger.passenger_name.trim().is_empty() {
        errors.insert(PassengerField::Name, "Name is required");
    }
    if passenger.passenger_surname.trim().is_empty() {
        errors.insert(PassengerField::Surname, "Surname is required");
    }
    if passenger.passenger_email.trim().is_empty() {
        errors.insert(PassengerField::Email, "Email is required");
    } else if !EMAIL.is_match(&passenger.passenger_email) {
        errors.insert(PassengerField::Email, "Invalid email format");
    }
    if !passenger.passenger_phone.is_empty() && !PHONE.is_match(&passenger.passenger_phone) {
        errors.insert(PassengerField::Phone, "Invalid phone number format");
    }

    errors
}

/// Validate every passenger; only failing indices appear in the result.
#[must_use]
pub fn validate_passengers(passengers: &[Passenger]) -> BTreeMap<usize, PassengerErrors> {
    passengers
        .iter()
        .enumerate()
        .filter_map(|(index, passenger)| {
            let errors = validate_passenger(passenger);
            (!errors.is_empty()).then_some((index, errors))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> Passenger {
        Passenger {
            passenger_name: "Giorgi".into(),
            passenger_surname: "Kapanadze".into(),
            passenger_email: "giorgi@example.ge".into(),
            passenger_phone: String::new(),
        }
    }

    #[test]
    fn valid_passenger_has_no_errors() {
        assert!(validate_passenger(&valid()).is_empty());
        let with_phone = Passenger {
            passenger_phone: "+995599123456".into(),
            ..valid()
        };
        assert!(validate_passenger(&with_phone).is_empty());
    }

    #[test]
    fn blank_form_reports_required_fields() {
        let errors = validate_passenger(&Passenger::default());
        assert_eq!(errors.get(&PassengerField::Name), Some(&"Name is required"));
        assert_eq!(errors.get(&PassengerField::Surname), Some(&"Surname is required"));
        assert_eq!(errors.get(&PassengerField::Email), Some(&"Email is required"));
        assert!(!errors.contains_key(&PassengerField::Phone));
    }

    #[test]
    fn whitespace_only_name_is_missing() {
        let passenger = Passenger {
            passenger_name: "   ".into(),
            ..valid()
        };
        assert_eq!(
            validate_passenger(&passenger).get(&PassengerField::Name),
            Some(&"Name is required")
        );
    }

    #[test]
    fn malformed_email_and_phone() {
        let passenger = Passenger {
            passenger_email: "not-an-email".into(),
            passenger_phone: "12-34".into(),
            ..valid()
        };
        let errors = validate_passenger(&passenger);
        assert_eq!(errors.get(&PassengerField::Email), Some(&"Invalid email format"));
        assert_eq!(
            errors.get(&PassengerField::Phone),
            Some(&"Invalid phone number format")
        );
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn phone_length_bounds() {
        for (phone, ok) in [
            ("1234567", false),
            ("12345678", true),
            ("+123456789012345", true),
            ("1234567890123456", false),
        ] {
            let passenger = Passenger {
                passenger_phone: phone.into(),
                ..valid()
            };
            assert_eq!(validate_passenger(&passenger).is_empty(), ok, "{phone}");
        }
    }

    #[test]
    fn only_failing_indices_reported() {
        let bad = Passenger {
            passenger_email: "nope".into(),
            ..valid()
        };
        let errors = validate_passengers(&[valid(), bad, valid()]);
        assert_eq!(errors.keys().copied().collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn field_wire_names() {
        assert_eq!(
            serde_json::to_value(PassengerField::Email).ok(),
            Some(serde_json::json!("passenger_email"))
        );
    }
}
