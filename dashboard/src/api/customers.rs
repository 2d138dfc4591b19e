//! Customer endpoints used by sales agents.

use super::ApiError;
use super::client::{ApiClient, ErrorMessage};
use crate::types::{Customer, Id, Ticket};
use reqwest::Method;
use serde::Serialize;

#[derive(Serialize)]
struct StatusUpdate {
    status_id: Id,
}

impl ApiClient {
    /// All customers.
    ///
    /// # Errors
    ///
    /// Any [`ApiError`].
    pub async fn customers(&self) -> Result<Vec<Customer>, ApiError> {
        self.get_json("/customers", ErrorMessage::Fixed("Failed to load customers"))
            .await
    }

    /// One customer.
    ///
    /// # Errors
    ///
    /// Any [`ApiError`].
    pub async fn customer(&self, id: Id) -> Result<Customer, ApiError> {
        self.get_json(
            &format!("/customers/{id}"),
            ErrorMessage::Fixed("Failed to load customer"),
        )
        .await
    }

    /// Tickets bought by a customer.
    ///
    /// # Errors
    ///
    /// Any [`ApiError`].
    pub async fn customer_tickets(&self, id: Id) -> Result<Vec<Ticket>, ApiError> {
        self.get_json(
            &format!("/customers/{id}/tickets"),
            ErrorMessage::Fixed("Failed to load customer tickets"),
        )
        .await
    }

    /// Assign a status to a customer.
    ///
    /// # Errors
    ///
    /// Any [`ApiError`].
    pub async fn update_customer_status(&self, id: Id, status_id: Id) -> Result<(), ApiError> {
        let builder = self
            .request(Method::PUT, &format!("/customers/{id}/status"))?
            .json(&StatusUpdate { status_id });
        self.send_empty(builder, ErrorMessage::Fixed("Failed to update customer status"))
            .await
    }
}
