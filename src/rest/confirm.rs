//! The merchant-facing confirmation page
//!
//! `GET /confirm/{id}` renders a page with accept/decline links;
//! `?action=accept|decline` records the decision and redirects back to the app.

use crate::app::AppContext;
use crate::charges::{ConfirmAction, Confirmation, RecurringCharge, format_amount};
use crate::http::{ChargeId, Found};
use axum::{
    extract::{Query, State},
    response::{Html, IntoResponse, Response},
};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct ConfirmQuery {
    action: Option<String>,
}

pub async fn confirm_charge(
    State(ctx): State<AppContext>,
    ChargeId(id): ChargeId,
    Query(query): Query<ConfirmQuery>,
) -> Result<Response, crate::error::MockError> {
    let action = ConfirmAction::from_param(query.action.as_deref());
    match ctx.charges.confirm(id, action).await? {
        Confirmation::Decided(charge) => Ok(Found::to(&charge.return_url)?.into_response()),
        Confirmation::Pending(charge) => Ok(Html(render_page(&charge)).into_response()),
    }
}

fn render_page(charge: &RecurringCharge) -> String {
    let trial = if charge.trial_days > 0 {
        format!(
            "<p>Free trial: {} days (ends {})</p>",
            charge.trial_days,
            charge.trial_ends_on.format("%Y-%m-%d")
        )
    } else {
        String::new()
    };

    format!(
        r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"><title>Approve subscription</title></head>
<body>
<h1>{name}</h1>
<p>Price: {price} {currency} every 30 days</p>
{trial}<p>Status: {status}</p>
<p><a href="/confirm/{id}?action=accept">Approve</a> <a href="/confirm/{id}?action=decline">Decline</a></p>
</body>
</html>
"#,
        name = escape_html(&charge.name),
        price = format_amount(charge.price),
        currency = escape_html(&charge.currency),
        trial = trial,
        status = charge.status,
        id = charge.id,
    )
}

fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<b>"Pro" & 'Plus'</b>"#),
            "&lt;b&gt;&quot;Pro&quot; &amp; &#39;Plus&#39;&lt;/b&gt;"
        );
    }
}
