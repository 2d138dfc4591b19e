//! Driver endpoints and the trip-date filter of the QR scanner page.

use super::ApiError;
use super::client::{ApiClient, ErrorMessage};
use crate::types::{Ticket, ValidationResponse};
use chrono::{Days, NaiveDate};
use reqwest::Method;
use serde::{Deserialize, Serialize};

/// Which travel dates the scanner page shows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateFilter {
    /// Travelling today
    #[default]
    Today,
    /// Travelling tomorrow
    Tomorrow,
    /// Travelling in the next seven days, today included
    Week,
    /// Everything
    All,
}

impl ApiClient {
    /// Tickets assigned to the signed-in driver.
    ///
    /// # Errors
    ///
    /// Any [`ApiError`].
    pub async fn driver_tickets(&self) -> Result<Vec<Ticket>, ApiError> {
        self.get_json("/driver/tickets", ErrorMessage::Fixed("Failed to load tickets"))
            .await
    }

    /// Validate a scanned ticket hash.
    ///
    /// # Errors
    ///
    /// A rejection carries the backend's message verbatim.
    #[tracing::instrument(skip(self))]
    pub async fn validate_ticket(&self, hash: &str) -> Result<ValidationResponse, ApiError> {
        let builder = self
            .request(Method::POST, "/tickets/validate")?
            .query(&[("hash", hash)]);
        let response = self.execute(builder).await?;
        let response = super::client::ensure_success(
            response,
            ErrorMessage::FromBody("Ticket validation failed"),
        )
        .await?;
        super::client::decode(response).await
    }
}

/// Tickets that were already scanned, most recent scan first.
#[must_use]
pub fn scan_history(tickets: &[Ticket]) -> Vec<Ticket> {
    let mut scanned: Vec<Ticket> = tickets.iter().filter(|t| t.is_validated()).cloned().collect();
    // ISO-8601 timestamps order lexicographically.
    scanned.sort_by(|a, b| b.validated_at.cmp(&a.validated_at));
    scanned
}

/// Keep tickets whose travel day matches `filter`, relative to `today`.
///
/// Tickets with an unparseable date only survive [`DateFilter::All`].
#[must_use]
pub fn filter_by_date(tickets: Vec<Ticket>, filter: DateFilter, today: NaiveDate) -> Vec<Ticket> {
    if filter == DateFilter::All {
        return tickets;
    }

    let tomorrow = today.checked_add_days(Days::new(1));
    let week_end = today.checked_add_days(Days::new(7));

    tickets
        .into_iter()
        .filter(|ticket| {
            let Some(day) = ticket.travel_date() else {
                return false;
            };
            match filter {
                DateFilter::Today => day == today,
                DateFilter::Tomorrow => Some(day) == tomorrow,
                DateFilter::Week => day >= today && week_end.is_some_and(|end| day <= end),
                DateFilter::All => true,
            }
        })
        .collect()
}
