use crate::charges::RecurringCharge;
use crate::error::MockError;
use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// `{"recurring_application_charge": {...}}`
#[derive(Debug, Serialize)]
pub struct ChargeEnvelope {
    pub recurring_application_charge: RecurringCharge,
}

impl ChargeEnvelope {
    pub fn new(charge: RecurringCharge) -> Self {
        Self {
            recurring_application_charge: charge,
        }
    }

    /// Same envelope, answered with 201 Created
    pub fn created(self) -> CreatedResponse<Self> {
        CreatedResponse { data: self }
    }
}

impl IntoResponse for ChargeEnvelope {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

/// `{"recurring_application_charges": [...]}`
#[derive(Debug, Serialize)]
pub struct ChargeListEnvelope {
    pub recurring_application_charges: Vec<RecurringCharge>,
}

impl IntoResponse for ChargeListEnvelope {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

/// 201 Created response
#[derive(Debug, Serialize)]
pub struct CreatedResponse<T: Serialize> {
    pub data: T,
}

impl<T: Serialize> IntoResponse for CreatedResponse<T> {
    fn into_response(self) -> Response {
        (StatusCode::CREATED, Json(self.data)).into_response()
    }
}

/// `{"message": "..."}` with 200 OK
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl IntoResponse for MessageResponse {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

/// 302 Found redirect
///
/// axum's `Redirect` only offers 303/307/308; the platform answers the
/// confirmation page with a plain 302.
#[derive(Debug, Clone)]
pub struct Found {
    location: HeaderValue,
}

impl Found {
    pub fn to(location: &str) -> Result<Self, MockError> {
        let location = HeaderValue::try_from(location).map_err(|_| {
            MockError::invalid_field("return_url", "is not a valid redirect target")
        })?;
        Ok(Self { location })
    }
}

impl IntoResponse for Found {
    fn into_response(self) -> Response {
        (StatusCode::FOUND, [(header::LOCATION, self.location)]).into_response()
    }
}

/// Convenience type alias for handler results
pub type JsonResponse<T> = Result<T, MockError>;
