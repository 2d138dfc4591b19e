//! Sales agent endpoints: availability, selling, payment methods, reports.

use super::ApiError;
use super::client::{ApiClient, ErrorMessage};
use crate::sale::seats::{parse_available_seats, with_held_seat};
use crate::types::{Id, SaleConfirmation, SaleRequest, SeatNumber, Ticket, default_payment_methods};
use chrono::NaiveDate;
use futures::future::BoxFuture;
use reqwest::Method;
use serde::Deserialize;

#[derive(Deserialize)]
struct AvailableSeatsBody {
    #[serde(default)]
    available_seats: Option<String>,
}

impl ApiClient {
    /// Seats still free on `schedule_id` for `date`, ascending.
    ///
    /// # Errors
    ///
    /// Any [`ApiError`]; a malformed seat list is [`ApiError::Decode`].
    #[tracing::instrument(skip(self), level = "debug")]
    pub async fn available_seats(
        &self,
        schedule_id: Id,
        date: NaiveDate,
    ) -> Result<Vec<SeatNumber>, ApiError> {
        let path = format!(
            "/schedules/available-seats?schedule_id={schedule_id}&schedule_date={}",
            date.format("%Y-%m-%d")
        );
        let body: AvailableSeatsBody = self
            .get_json(&path, ErrorMessage::Fixed("Failed to fetch available seats"))
            .await?;

        parse_available_seats(body.available_seats.as_deref().unwrap_or_default())
            .map_err(|e| ApiError::Decode(format!("available_seats: {e}")))
    }

    /// Availability when editing a ticket: `held_seat` is always included.
    ///
    /// # Errors
    ///
    /// Same as [`ApiClient::available_seats`].
    pub async fn available_seats_for_edit(
        &self,
        schedule_id: Id,
        date: NaiveDate,
        held_seat: SeatNumber,
    ) -> Result<Vec<SeatNumber>, ApiError> {
        let seats = self.available_seats(schedule_id, date).await?;
        Ok(with_held_seat(seats, held_seat))
    }

    /// Submit one atomic multi-ticket sale.
    ///
    /// # Errors
    ///
    /// On rejection the backend's `message` is returned verbatim in
    /// [`ApiError::Status`].
    #[tracing::instrument(
        skip(self, request),
        fields(schedule_id = request.schedule_id, tickets = request.ticket_count)
    )]
    pub async fn sell_tickets(&self, request: &SaleRequest) -> Result<SaleConfirmation, ApiError> {
        let body: serde_json::Value = self
            .send_json(
                Method::POST,
                "/tickets/sell",
                request,
                ErrorMessage::FromBody("Failed to sell tickets"),
            )
            .await?;

        tracing::info!("Tickets sold");
        Ok(SaleConfirmation {
            ticket_count: request.ticket_count,
            body,
        })
    }

    /// Payment methods offered by the backend.
    ///
    /// Any failure other than an ended session yields the default list.
    ///
    /// # Errors
    ///
    /// Only [`ApiError::SessionExpired`] and [`ApiError::NotAuthenticated`].
    pub async fn payment_methods(&self) -> Result<Vec<String>, ApiError> {
        match self
            .get_json::<Vec<String>>("/payment-methods", ErrorMessage::Fixed("No payment methods"))
            .await
        {
            Ok(methods) if !methods.is_empty() => Ok(methods),
            Ok(_) => Ok(default_payment_methods()),
            Err(e) if e.is_session_ended() => Err(e),
            Err(e) => {
                tracing::debug!(error = %e, "Using default payment methods");
                Ok(default_payment_methods())
            },
        }
    }

    /// Tickets sold by the signed-in agent.
    ///
    /// # Errors
    ///
    /// Any [`ApiError`].
    pub async fn agent_tickets(&self) -> Result<Vec<Ticket>, ApiError> {
        self.get_json(
            "/salesagent/tickets",
            ErrorMessage::Fixed("Failed to fetch sales agent tickets"),
        )
        .await
    }

    /// Cancel a ticket the agent sold.
    ///
    /// # Errors
    ///
    /// Any [`ApiError`].
    pub async fn cancel_ticket(&self, ticket_id: Id) -> Result<(), ApiError> {
        let builder = self.request(Method::POST, &format!("/tickets/{ticket_id}/cancel"))?;
        self.send_empty(builder, ErrorMessage::Fixed("Failed to cancel ticket"))
            .await
    }

    /// Agent sales report for an inclusive date range.
    ///
    /// # Errors
    ///
    /// Any [`ApiError`].
    pub async fn sales_report(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<serde_json::Value, ApiError> {
        let path = format!(
            "/salesagent/reports?start_date={}&end_date={}",
            start.format("%Y-%m-%d"),
            end.format("%Y-%m-%d")
        );
        self.get_json(&path, ErrorMessage::Fixed("Failed to generate sales report"))
            .await
    }
}

/// The backend operations the sale workflow depends on.
///
/// Futures are `'static` so they can be returned from a reducer as effects.
pub trait SalesApi: Send + Sync {
    /// See [`ApiClient::available_seats`].
    fn available_seats(
        &self,
        schedule_id: Id,
        date: NaiveDate,
    ) -> BoxFuture<'static, Result<Vec<SeatNumber>, ApiError>>;

    /// See [`ApiClient::sell_tickets`].
    fn sell_tickets(
        &self,
        request: SaleRequest,
    ) -> BoxFuture<'static, Result<SaleConfirmation, ApiError>>;

    /// See [`ApiClient::payment_methods`].
    fn payment_methods(&self) -> BoxFuture<'static, Result<Vec<String>, ApiError>>;
}

impl SalesApi for ApiClient {
    fn available_seats(
        &self,
        schedule_id: Id,
        date: NaiveDate,
    ) -> BoxFuture<'static, Result<Vec<SeatNumber>, ApiError>> {
        let client = self.clone();
        Box::pin(async move { client.available_seats(schedule_id, date).await })
    }

    fn sell_tickets(
        &self,
        request: SaleRequest,
    ) -> BoxFuture<'static, Result<SaleConfirmation, ApiError>> {
        let client = self.clone();
        Box::pin(async move { client.sell_tickets(&request).await })
    }

    fn payment_methods(&self) -> BoxFuture<'static, Result<Vec<String>, ApiError>> {
        let client = self.clone();
        Box::pin(async move { client.payment_methods().await })
    }
}
