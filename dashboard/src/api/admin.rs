//! Back-office CRUD, revenue, Excel exports and ticket PDFs.
//!
//! The five admin tables share one shape (list, create, update, delete), so
//! they are expressed once through [`Resource`].

use super::ApiError;
use super::client::{ApiClient, ErrorMessage, path_segment};
use crate::types::{
    Destination, DestinationForm, DestinationPayload, Id, Role, Schedule, ScheduleForm, Status, StatusForm,
    Ticket, TicketForm, User, UserForm,
};
use reqwest::Method;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt;
use std::str::FromStr;

/// A backend collection managed from the admin pages.
pub trait Resource {
    /// Collection path used for create, update and delete.
    const PATH: &'static str;
    /// Path the collection is listed from, when it differs from [`Self::PATH`].
    const LIST_PATH: &'static str = Self::PATH;
    /// Human-readable name for messages.
    const NAME: &'static str;
    /// Entity returned by the backend.
    type Item: DeserializeOwned + Send;
    /// Payload sent on create and update.
    type Form: Serialize + Send + Sync;
    /// What the admin form submits; converted to [`Self::Form`].
    type Input: DeserializeOwned + Into<Self::Form> + Send;
}

/// `/destinations`
#[derive(Debug, Clone, Copy)]
pub struct Destinations;

impl Resource for Destinations {
    const PATH: &'static str = "/destinations";
    const NAME: &'static str = "Destination";
    type Item = Destination;
    type Form = DestinationPayload;
    type Input = DestinationForm;
}

/// `/schedules`
#[derive(Debug, Clone, Copy)]
pub struct Schedules;

impl Resource for Schedules {
    const PATH: &'static str = "/schedules";
    const NAME: &'static str = "Schedule";
    type Item = Schedule;
    type Form = ScheduleForm;
    type Input = ScheduleForm;
}

/// `/statuses`
#[derive(Debug, Clone, Copy)]
pub struct Statuses;

impl Resource for Statuses {
    const PATH: &'static str = "/statuses";
    const NAME: &'static str = "Status";
    type Item = Status;
    type Form = StatusForm;
    type Input = StatusForm;
}

/// `/users`
#[derive(Debug, Clone, Copy)]
pub struct Users;

impl Resource for Users {
    const PATH: &'static str = "/users";
    const NAME: &'static str = "User";
    type Item = User;
    type Form = UserForm;
    type Input = UserForm;
}

/// `/tickets`, listed through `/alltickets`
#[derive(Debug, Clone, Copy)]
pub struct Tickets;

impl Resource for Tickets {
    const PATH: &'static str = "/tickets";
    const LIST_PATH: &'static str = "/alltickets";
    const NAME: &'static str = "Ticket";
    type Item = Ticket;
    type Form = TicketForm;
    type Input = TicketForm;
}

/// Workbooks offered by `GET /excel/{kind}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExcelExport {
    /// All users
    Users,
    /// All tickets
    Tickets,
    /// All schedules
    Schedules,
    /// All destinations
    Destinations,
    /// Payment transactions
    Transactions,
}

impl ExcelExport {
    /// Path segment and download file stem.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Users => "users",
            Self::Tickets => "tickets",
            Self::Schedules => "schedules",
            Self::Destinations => "destinations",
            Self::Transactions => "transactions",
        }
    }
}

impl fmt::Display for ExcelExport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExcelExport {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "users" => Ok(Self::Users),
            "tickets" => Ok(Self::Tickets),
            "schedules" => Ok(Self::Schedules),
            "destinations" => Ok(Self::Destinations),
            "transactions" => Ok(Self::Transactions),
            other => Err(format!("unknown export: {other}")),
        }
    }
}

impl ApiClient {
    /// List a collection.
    ///
    /// # Errors
    ///
    /// Any [`ApiError`].
    pub async fn list<R: Resource>(&self) -> Result<Vec<R::Item>, ApiError> {
        self.get_json(R::LIST_PATH, ErrorMessage::Fixed("Failed to load data"))
            .await
    }

    /// Create an entry.
    ///
    /// # Errors
    ///
    /// Backend validation messages are surfaced verbatim.
    pub async fn create<R: Resource>(&self, form: &R::Form) -> Result<R::Item, ApiError> {
        tracing::info!(resource = R::NAME, "Creating");
        self.send_json(
            Method::POST,
            R::PATH,
            form,
            ErrorMessage::FromBody("Failed to save"),
        )
        .await
    }

    /// Update an entry.
    ///
    /// # Errors
    ///
    /// Backend validation messages are surfaced verbatim.
    pub async fn update<R: Resource>(&self, id: Id, form: &R::Form) -> Result<R::Item, ApiError> {
        tracing::info!(resource = R::NAME, id, "Updating");
        self.send_json(
            Method::PUT,
            &format!("{}/{id}", R::PATH),
            form,
            ErrorMessage::FromBody("Failed to save"),
        )
        .await
    }

    /// Delete an entry.
    ///
    /// # Errors
    ///
    /// Any [`ApiError`].
    pub async fn delete<R: Resource>(&self, id: Id) -> Result<(), ApiError> {
        tracing::info!(resource = R::NAME, id, "Deleting");
        let builder = self.request(Method::DELETE, &format!("{}/{id}", R::PATH))?;
        self.send_empty(builder, ErrorMessage::Fixed("Failed to delete"))
            .await
    }

    /// Users with one role, e.g. the drivers offered in the ticket form.
    ///
    /// # Errors
    ///
    /// Any [`ApiError`].
    pub async fn users_by_role(&self, role: Role) -> Result<Vec<User>, ApiError> {
        self.get_json(
            &format!("/users?role={role}"),
            ErrorMessage::Fixed("Failed to load users"),
        )
        .await
    }

    /// Activate or deactivate a user.
    ///
    /// # Errors
    ///
    /// Any [`ApiError`].
    pub async fn toggle_user_status(&self, id: Id) -> Result<(), ApiError> {
        let builder = self.request(Method::PUT, &format!("/users/{id}/toggle-status"))?;
        self.send_empty(builder, ErrorMessage::Fixed("Failed to update user status"))
            .await
    }

    /// Sum of destination prices over all tickets.
    ///
    /// # Errors
    ///
    /// Any [`ApiError`] from listing tickets.
    pub async fn total_revenue(&self) -> Result<f64, ApiError> {
        Ok(revenue(&self.list::<Tickets>().await?))
    }

    /// Raw `.xlsx` bytes.
    ///
    /// # Errors
    ///
    /// Any [`ApiError`].
    pub async fn excel_export(&self, kind: ExcelExport) -> Result<Vec<u8>, ApiError> {
        self.get_bytes(
            &format!("/excel/{kind}"),
            ErrorMessage::Fixed("Failed to download data"),
        )
        .await
    }

    /// Ticket PDF bytes by ticket hash.
    ///
    /// # Errors
    ///
    /// [`ApiError::InvalidInput`] for a hash that is not a plain token,
    /// without calling the backend; otherwise any [`ApiError`].
    pub async fn download_ticket(&self, hash: &str) -> Result<Vec<u8>, ApiError> {
        let hash = path_segment(hash, "Invalid ticket code")?;
        self.get_bytes(
            &format!("/tickets/download/{hash}"),
            ErrorMessage::Fixed("Failed to download ticket"),
        )
        .await
    }
}

/// Revenue over `tickets`: each ticket counts its destination's price.
/// Tickets without an embedded destination contribute nothing.
#[must_use]
pub fn revenue(tickets: &[Ticket]) -> f64 {
    tickets
        .iter()
        .filter_map(|ticket| ticket.schedule.as_ref()?.destination.as_ref())
        .map(|destination| destination.price)
        .sum()
}
