use super::scalars::Url;
use super::types::{
    AppInstallation, AppSubscription, AppSubscriptionCreatePayload, AppSubscriptionLineItemInput,
    AppSubscriptionReplacementBehavior, SubscriptionInput, parse_subscription_gid,
};
use crate::charges::{ChargeService, NewCharge, Origin};
use crate::http::Tenant;
use async_graphql::{
    Context, EmptySubscription, ErrorExtensions, ID, Object, Result, Schema,
};

pub type ChargeSchema = Schema<QueryRoot, MutationRoot, EmptySubscription>;

pub fn build_schema() -> ChargeSchema {
    Schema::build(QueryRoot, MutationRoot, EmptySubscription).finish()
}

/// Per-request data attached to every GraphQL execution
#[derive(Clone)]
pub struct RequestScope {
    pub charges: ChargeService,
    pub tenant: Tenant,
    pub origin: Origin,
}

pub struct QueryRoot;

#[Object]
impl QueryRoot {
    /// The calling store's installation of this app
    async fn current_app_installation(&self, ctx: &Context<'_>) -> Result<AppInstallation> {
        let scope = ctx.data::<RequestScope>()?;
        let subscription = match scope.tenant.as_deref() {
            Some(store) => scope
                .charges
                .current_for_store(store)
                .await
                .map_err(|e| e.extend())?,
            None => None,
        };
        Ok(AppInstallation { subscription })
    }

    /// Look up a subscription by global id, across all stores
    async fn node(&self, ctx: &Context<'_>, id: ID) -> Result<AppSubscription> {
        let scope = ctx.data::<RequestScope>()?;
        let id = parse_subscription_gid(&id).map_err(|e| e.extend())?;
        let charge = scope.charges.get(None, id).await.map_err(|e| e.extend())?;
        Ok(AppSubscription(charge))
    }
}

pub struct MutationRoot;

#[Object]
impl MutationRoot {
    #[allow(clippy::too_many_arguments)]
    async fn app_subscription_create(
        &self,
        ctx: &Context<'_>,
        name: String,
        return_url: Url,
        test: Option<bool>,
        trial_days: Option<i32>,
        line_items: Vec<AppSubscriptionLineItemInput>,
        replacement_behavior: Option<AppSubscriptionReplacementBehavior>,
    ) -> Result<AppSubscriptionCreatePayload> {
        let scope = ctx.data::<RequestScope>()?;
        let input = NewCharge::try_from(SubscriptionInput {
            name,
            return_url,
            test,
            trial_days,
            line_items,
            replacement_behavior,
        })
        .map_err(|e| e.extend())?;

        let charge = scope
            .charges
            .create(scope.tenant.as_deref(), &scope.origin, input)
            .await
            .map_err(|e| e.extend())?;

        Ok(AppSubscriptionCreatePayload {
            confirmation_url: Some(Url(charge.confirmation_url.clone())),
            app_subscription: Some(AppSubscription(charge)),
            user_errors: Vec::new(),
        })
    }
}
