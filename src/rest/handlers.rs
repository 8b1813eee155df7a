use crate::app::AppContext;
use crate::charges::{NewCharge, RecurringCharge};
use crate::error::{MockError, Result};
use crate::http::{
    ChargeEnvelope, ChargeId, ChargeListEnvelope, CreatedResponse, JsonResponse, MessageResponse,
    RequestOrigin, Tenant,
};
use axum::{
    body::Bytes,
    extract::{Query, State},
};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;

const CAPPED_AMOUNT_PARAM: &str = "recurring_application_charge[capped_amount]";

#[derive(Debug, Deserialize)]
struct CreateChargeRequest {
    recurring_application_charge: NewCharge,
}

/// GET …/recurring_application_charges.json
pub async fn list_charges(
    State(ctx): State<AppContext>,
    tenant: Tenant,
) -> JsonResponse<ChargeListEnvelope> {
    let charges = ctx.charges.list(tenant.as_deref()).await?;
    Ok(ChargeListEnvelope {
        recurring_application_charges: charges,
    })
}

/// POST …/recurring_application_charges.json
pub async fn create_charge(
    State(ctx): State<AppContext>,
    tenant: Tenant,
    RequestOrigin(origin): RequestOrigin,
    body: Bytes,
) -> JsonResponse<CreatedResponse<ChargeEnvelope>> {
    let request: CreateChargeRequest = serde_json::from_slice(&body)?;
    let charge = ctx
        .charges
        .create(tenant.as_deref(), &origin, request.recurring_application_charge)
        .await?;
    Ok(ChargeEnvelope::new(charge).created())
}

/// GET …/recurring_application_charges/{id}.json
pub async fn get_charge(
    State(ctx): State<AppContext>,
    tenant: Tenant,
    ChargeId(id): ChargeId,
) -> JsonResponse<ChargeEnvelope> {
    let charge = ctx.charges.get(tenant.as_deref(), id).await?;
    Ok(ChargeEnvelope::new(charge))
}

/// PUT …/recurring_application_charges/{id}/customize.json
pub async fn customize_charge(
    State(ctx): State<AppContext>,
    tenant: Tenant,
    ChargeId(id): ChargeId,
    Query(params): Query<HashMap<String, String>>,
    body: Bytes,
) -> JsonResponse<ChargeEnvelope> {
    let amount = capped_amount_from(&params, &body)?;
    let charge: RecurringCharge = ctx
        .charges
        .update_capped_amount(tenant.as_deref(), id, amount)
        .await?;
    Ok(ChargeEnvelope::new(charge))
}

/// DELETE …/recurring_application_charges/{id}.json
pub async fn delete_charge(
    State(ctx): State<AppContext>,
    tenant: Tenant,
    ChargeId(id): ChargeId,
) -> JsonResponse<MessageResponse> {
    ctx.charges.delete(tenant.as_deref(), id).await?;
    Ok(MessageResponse::new("Charge deleted"))
}

/// Read the new capped amount from the query string or a JSON body.
///
/// The platform sends `recurring_application_charge[capped_amount]=…` as a
/// query parameter; a JSON body may carry it enveloped or flat.
fn capped_amount_from(params: &HashMap<String, String>, body: &[u8]) -> Result<String> {
    if let Some(amount) = params
        .get(CAPPED_AMOUNT_PARAM)
        .or_else(|| params.get("capped_amount"))
    {
        return Ok(amount.clone());
    }

    if !body.iter().all(u8::is_ascii_whitespace) {
        let json: Value = serde_json::from_slice(body)?;
        let value = json
            .get("recurring_application_charge")
            .and_then(|charge| charge.get("capped_amount"))
            .or_else(|| json.get("capped_amount"));
        match value {
            Some(Value::String(s)) => return Ok(s.clone()),
            Some(Value::Number(n)) => return Ok(n.to_string()),
            Some(Value::Null) | None => {}
            Some(_) => {
                return Err(MockError::invalid_field(
                    "capped_amount",
                    "must be a string or number",
                ));
            }
        }
    }

    Err(MockError::invalid_field("capped_amount", "can't be blank"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capped_amount_from_query() {
        let mut params = HashMap::new();
        params.insert(CAPPED_AMOUNT_PARAM.to_string(), "200".to_string());
        assert_eq!(capped_amount_from(&params, b"").unwrap(), "200");
    }

    #[test]
    fn test_capped_amount_from_body() {
        let params = HashMap::new();
        assert_eq!(
            capped_amount_from(&params, br#"{"recurring_application_charge":{"capped_amount":"300"}}"#)
                .unwrap(),
            "300"
        );
        assert_eq!(capped_amount_from(&params, br#"{"capped_amount":150}"#).unwrap(), "150");
    }

    #[test]
    fn test_capped_amount_missing() {
        let err = capped_amount_from(&HashMap::new(), b"  ").unwrap_err();
        assert!(matches!(err, MockError::Validation { field: Some(f), .. } if f == "capped_amount"));
        assert!(capped_amount_from(&HashMap::new(), b"{}").is_err());
        assert!(capped_amount_from(&HashMap::new(), br#"{"capped_amount":[1]}"#).is_err());
    }
}
