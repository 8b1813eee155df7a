//! GraphQL input and output types for app subscriptions

use super::scalars::{Decimal, Url};
use crate::charges::{NewCharge, RecurringCharge, ReplacementBehavior};
use crate::error::MockError;
use async_graphql::{Enum, ID, InputObject, Object, SimpleObject};
use chrono::{DateTime, SecondsFormat, Utc};

/// Id reported for the one app installation the mock knows about
pub const APP_INSTALLATION_ID: &str = "gid://shopify/AppInstallation/811826315597";

const SUBSCRIPTION_GID_PREFIX: &str = "gid://shopify/AppSubscription/";

pub fn subscription_gid(id: i64) -> String {
    format!("{}{}", SUBSCRIPTION_GID_PREFIX, id)
}

/// Parse `gid://shopify/AppSubscription/{n}`
pub fn parse_subscription_gid(gid: &str) -> Result<i64, MockError> {
    gid.strip_prefix(SUBSCRIPTION_GID_PREFIX)
        .and_then(|n| n.parse::<i64>().ok())
        .ok_or_else(|| {
            MockError::invalid_field("id", format!("'{}' is not an AppSubscription id", gid))
        })
}

fn timestamp(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Secs, true)
}

#[derive(Enum, Copy, Clone, Debug, Eq, PartialEq)]
pub enum AppSubscriptionReplacementBehavior {
    Standard,
    ApplyOnNextBillingCycle,
    ApplyImmediately,
}

impl From<AppSubscriptionReplacementBehavior> for ReplacementBehavior {
    fn from(value: AppSubscriptionReplacementBehavior) -> Self {
        match value {
            AppSubscriptionReplacementBehavior::Standard => Self::Standard,
            AppSubscriptionReplacementBehavior::ApplyOnNextBillingCycle => {
                Self::ApplyOnNextBillingCycle
            }
            AppSubscriptionReplacementBehavior::ApplyImmediately => Self::ApplyImmediately,
        }
    }
}

#[derive(InputObject, Debug, Clone)]
pub struct PriceInput {
    pub amount: Decimal,
    pub currency_code: String,
}

#[derive(InputObject, Debug, Clone)]
pub struct AppRecurringPricingDetailsInput {
    pub price: PriceInput,
    pub interval: Option<String>,
}

#[derive(InputObject, Debug, Clone)]
pub struct PlanInput {
    pub app_recurring_pricing_details: AppRecurringPricingDetailsInput,
}

#[derive(InputObject, Debug, Clone)]
pub struct AppSubscriptionLineItemInput {
    pub plan: PlanInput,
}

/// Arguments of `appSubscriptionCreate`
#[derive(Debug, Clone)]
pub struct SubscriptionInput {
    pub name: String,
    pub return_url: Url,
    pub test: Option<bool>,
    pub trial_days: Option<i32>,
    pub line_items: Vec<AppSubscriptionLineItemInput>,
    pub replacement_behavior: Option<AppSubscriptionReplacementBehavior>,
}

impl TryFrom<SubscriptionInput> for NewCharge {
    type Error = MockError;

    /// Price and currency come from the first line item.
    fn try_from(input: SubscriptionInput) -> Result<Self, Self::Error> {
        let item = input
            .line_items
            .into_iter()
            .next()
            .ok_or_else(|| MockError::invalid_field("lineItems", "must contain at least one item"))?;
        let price = item.plan.app_recurring_pricing_details.price;

        let trial_days = match input.trial_days {
            Some(days) => Some(
                u32::try_from(days)
                    .map_err(|_| MockError::invalid_field("trialDays", "must be 0 or greater"))?,
            ),
            None => None,
        };

        Ok(NewCharge {
            name: input.name,
            price: Some(price.amount.0),
            currency: Some(price.currency_code),
            return_url: input.return_url.0,
            trial_days,
            capped_amount: None,
            terms: None,
            test: input.test,
            replacement_behavior: input.replacement_behavior.map(Into::into),
        })
    }
}

#[derive(SimpleObject, Debug, Clone)]
pub struct MoneyV2 {
    pub amount: Decimal,
    pub currency_code: String,
}

#[derive(Enum, Copy, Clone, Debug, Eq, PartialEq)]
pub enum AppPricingInterval {
    #[graphql(name = "EVERY_30_DAYS")]
    Every30Days,
    #[graphql(name = "ANNUAL")]
    Annual,
}

#[derive(SimpleObject, Debug, Clone)]
pub struct AppRecurringPricing {
    pub price: MoneyV2,
    pub interval: AppPricingInterval,
}

#[derive(SimpleObject, Debug, Clone)]
pub struct AppPlan {
    pub pricing_details: AppRecurringPricing,
}

#[derive(SimpleObject, Debug, Clone)]
pub struct AppSubscriptionLineItem {
    pub id: ID,
    pub plan: AppPlan,
}

/// A charge seen through the GraphQL API
pub struct AppSubscription(pub RecurringCharge);

#[Object]
impl AppSubscription {
    async fn id(&self) -> ID {
        ID(subscription_gid(self.0.id))
    }

    async fn name(&self) -> &str {
        &self.0.name
    }

    /// `PENDING`, `ACTIVE` or `DECLINED`
    async fn status(&self) -> String {
        self.0.status.as_str().to_uppercase()
    }

    async fn created_at(&self) -> String {
        timestamp(&self.0.created_at)
    }

    async fn current_period_end(&self) -> String {
        timestamp(&self.0.trial_ends_on)
    }

    async fn trial_days(&self) -> u32 {
        self.0.trial_days
    }

    async fn test(&self) -> bool {
        self.0.test.unwrap_or(false)
    }

    async fn return_url(&self) -> Url {
        Url(self.0.return_url.clone())
    }

    async fn line_items(&self) -> Vec<AppSubscriptionLineItem> {
        vec![AppSubscriptionLineItem {
            id: ID(format!(
                "gid://shopify/AppSubscriptionLineItem/{}?v=1&index=0",
                self.0.id
            )),
            plan: AppPlan {
                pricing_details: AppRecurringPricing {
                    price: MoneyV2 {
                        amount: Decimal(self.0.price),
                        currency_code: self.0.currency.clone(),
                    },
                    interval: AppPricingInterval::Every30Days,
                },
            },
        }]
    }
}

pub struct AppInstallation {
    pub subscription: Option<RecurringCharge>,
}

#[Object]
impl AppInstallation {
    async fn id(&self) -> ID {
        ID(APP_INSTALLATION_ID.to_string())
    }

    /// Zero or one subscription: the store's most recent charge
    async fn active_subscriptions(&self) -> Vec<AppSubscription> {
        self.subscription
            .iter()
            .cloned()
            .map(AppSubscription)
            .collect()
    }
}

#[derive(SimpleObject, Debug, Clone)]
pub struct UserError {
    pub field: Option<Vec<String>>,
    pub message: String,
}

#[derive(SimpleObject)]
pub struct AppSubscriptionCreatePayload {
    pub confirmation_url: Option<Url>,
    pub app_subscription: Option<AppSubscription>,
    pub user_errors: Vec<UserError>,
}
