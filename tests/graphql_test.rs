use charge_mock::testing::{self, test_app};
use serde_json::{Value, json};

const GRAPHQL: &str = "/admin/api/2024-01/graphql.json";

const CREATE: &str = r#"
mutation Create($name: String!, $returnUrl: URL!, $trialDays: Int, $lineItems: [AppSubscriptionLineItemInput!]!) {
  appSubscriptionCreate(name: $name, returnUrl: $returnUrl, test: true, trialDays: $trialDays, lineItems: $lineItems) {
    confirmationUrl
    appSubscription { id name status trialDays test returnUrl lineItems { plan { pricingDetails { interval price { amount currencyCode } } } } }
    userErrors { field message }
  }
}
"#;

const CURRENT: &str = r#"
query {
  currentAppInstallation {
    id
    activeSubscriptions { id name status }
  }
}
"#;

const NODE: &str = r#"
query Node($id: ID!) {
  node(id: $id) { id name status currentPeriodEnd }
}
"#;

fn pro_plan(amount: Value) -> Value {
    json!({
        "name": "Pro Plan",
        "returnUrl": "https://app.test/billing/done",
        "trialDays": 7,
        "lineItems": [{
            "plan": {
                "appRecurringPricingDetails": {
                    "price": { "amount": amount, "currencyCode": "USD" }
                }
            }
        }]
    })
}

async fn create_subscription(app: axum::Router, token: Option<&str>) -> Value {
    let mut scenario = testing::graphql(app, GRAPHQL, CREATE, pro_plan(json!(9.99)));
    if let Some(token) = token {
        scenario = scenario.access_token(token);
    }
    let body: Value = scenario.execute().await.assert_ok().json().await;
    assert!(body.get("errors").is_none(), "unexpected errors: {}", body);
    body["data"]["appSubscriptionCreate"].clone()
}

#[tokio::test]
async fn test_app_subscription_create() {
    let app = test_app();

    let body: Value = testing::graphql(app, GRAPHQL, CREATE, pro_plan(json!(9.99)))
        .header("host", "mock.test")
        .execute()
        .await
        .assert_ok()
        .assert_json()
        .json()
        .await;

    let payload = &body["data"]["appSubscriptionCreate"];
    let subscription = &payload["appSubscription"];
    let gid = subscription["id"].as_str().unwrap();
    let id = gid.strip_prefix("gid://shopify/AppSubscription/").unwrap();

    assert_eq!(subscription["name"], "Pro Plan");
    assert_eq!(subscription["status"], "PENDING");
    assert_eq!(subscription["trialDays"], 7);
    assert_eq!(subscription["test"], true);
    assert_eq!(subscription["returnUrl"], "https://app.test/billing/done");
    assert_eq!(payload["confirmationUrl"], format!("http://mock.test/confirm/{}", id));
    assert_eq!(payload["userErrors"], json!([]));

    let pricing = &subscription["lineItems"][0]["plan"]["pricingDetails"];
    assert_eq!(pricing["interval"], "EVERY_30_DAYS");
    assert_eq!(pricing["price"], json!({"amount": "9.99", "currencyCode": "USD"}));

    assert_eq!(body["extensions"]["cost"]["requestedQueryCost"], 10);
    assert_eq!(body["extensions"]["cost"]["actualQueryCost"], 10);
}

#[tokio::test]
async fn test_created_subscription_is_visible_over_rest() {
    let app = test_app();
    let payload = create_subscription(app.clone(), None).await;
    let gid = payload["appSubscription"]["id"].as_str().unwrap();
    let id = gid.rsplit('/').next().unwrap();

    testing::get(
        app,
        &format!("/admin/api/2024-01/recurring_application_charges/{}.json", id),
    )
    .execute()
    .await
    .assert_ok()
    .assert_json_path("recurring_application_charge.price", json!(9.99))
    .await
    .assert_json_path("recurring_application_charge.status", json!("pending"))
    .await;
}

#[tokio::test]
async fn test_amount_accepts_numeric_string() {
    let app = test_app();

    testing::graphql(app, GRAPHQL, CREATE, pro_plan(json!("4.50")))
        .execute()
        .await
        .assert_ok()
        .assert_json_path(
            "data.appSubscriptionCreate.appSubscription.lineItems.0.plan.pricingDetails.price.amount",
            json!("4.50"),
        )
        .await;
}

#[tokio::test]
async fn test_current_app_installation_scoped_by_token() {
    let app = test_app();
    create_subscription(app.clone(), Some("shop-a")).await;
    let latest = create_subscription(app.clone(), Some("shop-a")).await;
    create_subscription(app.clone(), Some("shop-b")).await;

    let body: Value = testing::graphql(app.clone(), GRAPHQL, CURRENT, json!({}))
        .access_token("shop-a")
        .execute()
        .await
        .assert_ok()
        .json()
        .await;

    let installation = &body["data"]["currentAppInstallation"];
    assert_eq!(installation["id"], "gid://shopify/AppInstallation/811826315597");
    let subscriptions = installation["activeSubscriptions"].as_array().unwrap();
    assert_eq!(subscriptions.len(), 1);
    assert_eq!(subscriptions[0]["id"], latest["appSubscription"]["id"]);
    assert_eq!(subscriptions[0]["status"], "PENDING");

    // no token, no installation subscriptions
    testing::graphql(app, GRAPHQL, CURRENT, json!({}))
        .execute()
        .await
        .assert_ok()
        .assert_json_path("data.currentAppInstallation.activeSubscriptions", json!([]))
        .await;
}

#[tokio::test]
async fn test_store_prefixed_graphql_route() {
    let app = test_app();
    let uri = "/shop-a/admin/api/2024-01/graphql.json";

    testing::graphql(app.clone(), uri, CREATE, pro_plan(json!(9.99)))
        .execute()
        .await
        .assert_ok();

    testing::graphql(app, uri, CURRENT, json!({}))
        .execute()
        .await
        .assert_ok()
        .assert_json_path(
            "data.currentAppInstallation.activeSubscriptions.0.name",
            json!("Pro Plan"),
        )
        .await;
}

#[tokio::test]
async fn test_node_reflects_confirmation() {
    let app = test_app();
    let payload = create_subscription(app.clone(), None).await;
    let gid = payload["appSubscription"]["id"].clone();
    let id = gid.as_str().unwrap().rsplit('/').next().unwrap().to_string();

    testing::graphql(app.clone(), GRAPHQL, NODE, json!({ "id": gid }))
        .execute()
        .await
        .assert_json_path("data.node.status", json!("PENDING"))
        .await;

    testing::get(app.clone(), &format!("/confirm/{}?action=accept", id))
        .execute()
        .await
        .assert_redirect("https://app.test/billing/done");

    let body: Value = testing::graphql(app, GRAPHQL, NODE, json!({ "id": gid }))
        .execute()
        .await
        .assert_ok()
        .json()
        .await;
    assert_eq!(body["data"]["node"]["id"], gid);
    assert_eq!(body["data"]["node"]["status"], "ACTIVE");
    assert!(body["data"]["node"]["currentPeriodEnd"].as_str().unwrap().ends_with('Z'));
}

#[tokio::test]
async fn test_node_errors() {
    let app = test_app();

    testing::graphql(app.clone(), GRAPHQL, NODE, json!({ "id": "not-a-gid" }))
        .execute()
        .await
        .assert_ok()
        .assert_json_path("errors.0.extensions.code", json!("VALIDATION_ERROR"))
        .await;

    testing::graphql(
        app,
        GRAPHQL,
        NODE,
        json!({ "id": "gid://shopify/AppSubscription/424242" }),
    )
    .execute()
    .await
    .assert_ok()
    .assert_json_path("errors.0.extensions.code", json!("NOT_FOUND"))
    .await
    .assert_json_path("errors.0.message", json!("Not Found"))
    .await;
}

#[tokio::test]
async fn test_invalid_input_is_validation_error() {
    let app = test_app();

    let mut empty_items = pro_plan(json!(9.99));
    empty_items["lineItems"] = json!([]);
    testing::graphql(app.clone(), GRAPHQL, CREATE, empty_items)
        .execute()
        .await
        .assert_json_path("errors.0.extensions.code", json!("VALIDATION_ERROR"))
        .await;

    testing::graphql(app.clone(), GRAPHQL, CREATE, pro_plan(json!("cheap")))
        .execute()
        .await
        .assert_json_path("errors.0.extensions.code", json!("VALIDATION_ERROR"))
        .await;

    let mut blank_name = pro_plan(json!(9.99));
    blank_name["name"] = json!("  ");
    testing::graphql(app.clone(), GRAPHQL, CREATE, blank_name)
        .execute()
        .await
        .assert_json_path("errors.0.extensions.code", json!("VALIDATION_ERROR"))
        .await;

    // nothing was stored
    testing::get(app, "/admin/api/2024-01/recurring_application_charges.json")
        .execute()
        .await
        .assert_json_path("recurring_application_charges", json!([]))
        .await;
}

#[tokio::test]
async fn test_malformed_body_is_bad_request() {
    let app = test_app();

    testing::post(app.clone(), GRAPHQL)
        .text_body("{not json")
        .execute()
        .await
        .assert_bad_request()
        .assert_json_path("errors.0.extensions.code", json!("VALIDATION_ERROR"))
        .await
        .assert_json_path("extensions.cost.requestedQueryCost", json!(10))
        .await;

    testing::graphql(app, GRAPHQL, "query { nope }", json!({}))
        .execute()
        .await
        .assert_ok()
        .assert_json_path("errors.0.extensions.code", json!("VALIDATION_ERROR"))
        .await;
}

#[tokio::test]
async fn test_plain_graphql_route() {
    let app = test_app();

    testing::graphql(app, "/graphql", CURRENT, json!({}))
        .execute()
        .await
        .assert_ok()
        .assert_json_path("extensions.cost.actualQueryCost", json!(10))
        .await;
}

#[tokio::test]
async fn test_unrepresentable_trial_is_validation_error() {
    let app = test_app();
    let mut variables = pro_plan(json!(9.99));
    variables["trialDays"] = json!(2_000_000_000);

    testing::graphql(app.clone(), GRAPHQL, CREATE, variables)
        .execute()
        .await
        .assert_ok()
        .assert_json_path("errors.0.extensions.code", json!("VALIDATION_ERROR"))
        .await;

    testing::get(app, "/admin/api/2024-01/recurring_application_charges.json")
        .execute()
        .await
        .assert_json_path("recurring_application_charges", json!([]))
        .await;
}
