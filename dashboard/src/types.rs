//! Domain types shared by the access gate, the API client and the sale workflow.
//!
//! Backend entities deserialize leniently (`#[serde(default)]` on optional
//! fields) because the REST API omits nulls inconsistently between endpoints.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Backend identifier.
pub type Id = u64;

// ============================================================================
// Roles and principals
// ============================================================================

/// Dashboard role. Closed set: every match over it is exhaustive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Full back-office access.
    Admin,
    /// Sells tickets and manages customers.
    SalesAgent,
    /// Scans and validates tickets.
    Driver,
    /// End customer; has no dashboard pages.
    Customer,
}

impl Role {
    /// All roles, in menu order.
    pub const ALL: [Self; 4] = [Self::Admin, Self::SalesAgent, Self::Driver, Self::Customer];

    /// Wire name of the role.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::SalesAgent => "salesagent",
            Self::Driver => "driver",
            Self::Customer => "customer",
        }
    }

    /// Parse a role claim. Unknown names yield `None`, which the gate treats as deny.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        raw.parse().ok()
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a role name is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Self::Admin),
            "salesagent" => Ok(Self::SalesAgent),
            "driver" => Ok(Self::Driver),
            "customer" => Ok(Self::Customer),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

/// The authenticated actor behind a dashboard request.
///
/// `role` is fixed for the session's lifetime; `token` is the only credential
/// forwarded to the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    /// Backend user id.
    pub id: Id,
    /// Sign-in email.
    pub email: String,
    /// Given name.
    #[serde(default)]
    pub first_name: String,
    /// Family name.
    #[serde(default)]
    pub last_name: String,
    /// Role claim; `None` when the claim was missing or unrecognised.
    pub role: Option<Role>,
    /// Backend bearer token.
    #[serde(skip_serializing)]
    pub token: String,
}

// ============================================================================
// Seats and passengers
// ============================================================================

/// A seat on a bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SeatNumber(pub u32);

impl fmt::Display for SeatNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Passenger details collected for one seat.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Passenger {
    /// Given name (required).
    pub passenger_name: String,
    /// Family name (required).
    pub passenger_surname: String,
    /// Contact email (required).
    pub passenger_email: String,
    /// Contact phone (optional).
    pub passenger_phone: String,
}

/// Ticket language printed on the PDF.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// Georgian.
    #[default]
    Ka,
    /// English.
    En,
}

/// Payment methods used when the backend does not provide a list.
pub const DEFAULT_PAYMENT_METHODS: [&str; 3] = ["cash", "card", "bank_transfer"];

/// Payment method preselected in a fresh sale.
pub const DEFAULT_PAYMENT_METHOD: &str = "cash";

/// Default payment methods as owned strings.
#[must_use]
pub fn default_payment_methods() -> Vec<String> {
    DEFAULT_PAYMENT_METHODS.iter().map(ToString::to_string).collect()
}

/// One atomic "sell N tickets" request.
///
/// Built only through [`SaleRequest::new`], which keeps
/// `ticket_count == seat_numbers.len() == passengers.len()` and orders the
/// seats ascending with their passengers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleRequest {
    /// Number of tickets sold.
    pub ticket_count: usize,
    /// Schedule being sold.
    pub schedule_id: Id,
    /// Travel date.
    pub schedule_date: NaiveDate,
    /// Seats, ascending.
    pub seat_numbers: Vec<SeatNumber>,
    /// Passengers aligned by index with `seat_numbers`.
    pub passengers: Vec<Passenger>,
    /// Chosen payment method.
    pub payment_method: String,
    /// Ticket language.
    pub language: Language,
}

impl SaleRequest {
    /// Pair seats with passengers, sort by seat and build the request.
    ///
    /// Returns `None` when there are no seats or the two lists differ in length.
    #[must_use]
    pub fn new(
        schedule_id: Id,
        schedule_date: NaiveDate,
        seats: &[SeatNumber],
        passengers: &[Passenger],
        payment_method: impl Into<String>,
        language: Language,
    ) -> Option<Self> {
        if seats.is_empty() || seats.len() != passengers.len() {
            return None;
        }

        let mut pairs: Vec<(SeatNumber, Passenger)> = seats
            .iter()
            .copied()
            .zip(passengers.iter().cloned())
            .collect();
        pairs.sort_by_key(|(seat, _)| *seat);
        let (seat_numbers, passengers): (Vec<_>, Vec<_>) = pairs.into_iter().unzip();

        Some(Self {
            ticket_count: seat_numbers.len(),
            schedule_id,
            schedule_date,
            seat_numbers,
            passengers,
            payment_method: payment_method.into(),
            language,
        })
    }
}

/// Backend confirmation of a sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleConfirmation {
    /// Tickets the request asked for.
    pub ticket_count: usize,
    /// Raw confirmation body.
    pub body: serde_json::Value,
}

// ============================================================================
// Backend entities
// ============================================================================

/// A route between two cities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Destination {
    /// Identifier.
    pub id: Id,
    /// Departure city.
    pub leaves_from: String,
    /// Arrival city.
    pub arrives_to: String,
    /// Intermediate stops.
    #[serde(default)]
    pub bus_stops: Vec<String>,
    /// Ticket price.
    #[serde(default)]
    pub price: f64,
}

/// Destination as entered in the admin form; stops are comma-separated text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DestinationForm {
    /// Departure city.
    pub leaves_from: String,
    /// Arrival city.
    pub arrives_to: String,
    /// Stops as typed, e.g. `"Gori, Kutaisi"`.
    #[serde(default)]
    pub bus_stops: String,
    /// Ticket price.
    pub price: f64,
}

/// Wire payload for creating or updating a destination.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DestinationPayload {
    /// Departure city.
    pub leaves_from: String,
    /// Arrival city.
    pub arrives_to: String,
    /// Trimmed, non-empty stops.
    pub bus_stops: Vec<String>,
    /// Ticket price.
    pub price: f64,
}

impl From<DestinationForm> for DestinationPayload {
    fn from(form: DestinationForm) -> Self {
        Self {
            leaves_from: form.leaves_from.trim().to_string(),
            arrives_to: form.arrives_to.trim().to_string(),
            bus_stops: split_bus_stops(&form.bus_stops),
            price: form.price,
        }
    }
}

/// Split a comma-separated stop list, trimming and dropping blanks.
#[must_use]
pub fn split_bus_stops(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|stop| !stop.is_empty())
        .map(ToString::to_string)
        .collect()
}

/// A recurring departure on a destination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    /// Identifier.
    pub id: Id,
    /// Destination served.
    pub destination_id: Id,
    /// Departure time of day.
    pub leave_time: String,
    /// Arrival time of day.
    pub arrive_time: String,
    /// Embedded destination, when the endpoint includes it.
    #[serde(default)]
    pub destination: Option<Destination>,
}

/// Schedule create/update payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleForm {
    /// Destination served.
    pub destination_id: Id,
    /// Departure time of day.
    pub leave_time: String,
    /// Arrival time of day.
    pub arrive_time: String,
}

/// Ticket/customer status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    /// Identifier.
    pub id: Id,
    /// English name.
    pub name: String,
    /// Georgian name.
    #[serde(default)]
    pub name_ka: String,
    /// Display colour, e.g. `#19B393`.
    #[serde(default)]
    pub color: String,
}

/// Status create/update payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusForm {
    /// English name.
    pub name: String,
    /// Georgian name.
    pub name_ka: String,
    /// Display colour.
    pub color: String,
}

/// A dashboard or backend user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Identifier.
    pub id: Id,
    /// Email.
    pub email: String,
    /// Given name.
    #[serde(default)]
    pub first_name: String,
    /// Family name.
    #[serde(default)]
    pub last_name: String,
    /// Role name as stored by the backend.
    #[serde(default)]
    pub role: String,
    /// Whether the account may sign in.
    #[serde(default)]
    pub is_active: bool,
    /// Phone number.
    #[serde(default)]
    pub phone_number: Option<String>,
    /// Status id.
    #[serde(default)]
    pub status_id: Option<Id>,
}

/// User create/update payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserForm {
    /// Email.
    pub email: String,
    /// New password; omitted on update to keep the current one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Role.
    pub role: Role,
    /// Phone number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
}

/// A customer as seen by sales agents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    /// Identifier.
    pub id: Id,
    /// Email.
    pub email: String,
    /// When the email was verified.
    #[serde(default)]
    pub email_verified_at: Option<String>,
    /// Given name.
    #[serde(default)]
    pub first_name: String,
    /// Family name.
    #[serde(default)]
    pub last_name: String,
    /// Phone number.
    #[serde(default)]
    pub phone_number: Option<String>,
    /// Status id.
    #[serde(default)]
    pub status_id: Option<Id>,
}

impl Customer {
    /// Whether the customer confirmed their email.
    #[must_use]
    pub const fn is_email_verified(&self) -> bool {
        self.email_verified_at.is_some()
    }
}

/// A sold ticket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    /// Identifier.
    pub id: Id,
    /// Seat.
    pub seat_number: SeatNumber,
    /// Schedule.
    pub schedule_id: Id,
    /// Travel date as sent by the backend (date or timestamp).
    pub schedule_date: String,
    /// Passenger given name.
    #[serde(default)]
    pub passenger_name: String,
    /// Passenger family name.
    #[serde(default)]
    pub passenger_surname: String,
    /// Passenger email.
    #[serde(default)]
    pub passenger_email: String,
    /// Passenger phone.
    #[serde(default)]
    pub passenger_phone: Option<String>,
    /// Agent or customer who bought it.
    #[serde(default)]
    pub purchaser_id: Option<Id>,
    /// Assigned driver.
    #[serde(default)]
    pub driver_id: Option<Id>,
    /// QR hash, written by the backend.
    #[serde(default)]
    pub ticket_hash: Option<String>,
    /// Set once when a driver validates the ticket.
    #[serde(default)]
    pub validated_at: Option<String>,
    /// Payment method.
    #[serde(default)]
    pub payment_method: Option<String>,
    /// Ticket language.
    #[serde(default)]
    pub language: Option<String>,
    /// Price paid.
    #[serde(default)]
    pub price: Option<f64>,
    /// Status label.
    #[serde(default)]
    pub status: Option<String>,
    /// Embedded schedule.
    #[serde(default)]
    pub schedule: Option<Schedule>,
}

impl Ticket {
    /// Calendar day of travel, parsed from the leading `YYYY-MM-DD`.
    #[must_use]
    pub fn travel_date(&self) -> Option<NaiveDate> {
        let day = self.schedule_date.get(..10)?;
        NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
    }

    /// Whether a driver already validated this ticket.
    #[must_use]
    pub const fn is_validated(&self) -> bool {
        self.validated_at.is_some()
    }
}

/// Single-ticket create/update payload used by the admin ticket table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketForm {
    /// Schedule.
    pub schedule_id: Id,
    /// Seat.
    pub seat_number: SeatNumber,
    /// Travel date.
    pub schedule_date: NaiveDate,
    /// Passenger details.
    #[serde(flatten)]
    pub passenger: Passenger,
    /// Purchaser.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purchaser_id: Option<Id>,
    /// Driver.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub driver_id: Option<Id>,
    /// Payment method.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<String>,
}

/// Result of a driver's QR scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResponse {
    /// Whether the ticket was accepted.
    pub success: bool,
    /// Backend message.
    #[serde(default)]
    pub message: String,
    /// The validated ticket.
    #[serde(default)]
    pub ticket: Option<Ticket>,
}
