use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use fleet_routing::config::EnvironmentConfig;
use fleet_routing::create_app;
use fleet_routing::database::MemoryDatabase;
use fleet_routing::state::AppState;
use fleet_routing::utils::jwt::{generate_token, JwtConfig};

const TEST_SECRET: &str = "integration-test-secret";

struct TestApp {
    router: Router,
    token: String,
}

struct TestResponse {
    status: StatusCode,
    body: Value,
}

fn test_config() -> EnvironmentConfig {
    EnvironmentConfig {
        environment: "test".to_string(),
        port: 0,
        host: "127.0.0.1".to_string(),
        jwt_secret: TEST_SECRET.to_string(),
        jwt_expiration: 3600,
        cors_origins: Vec::new(),
        database_url: None,
    }
}

fn create_test_app() -> TestApp {
    let state = AppState::new(Arc::new(MemoryDatabase::new()), test_config());
    let token = generate_token(
        "tester",
        &JwtConfig {
            secret: TEST_SECRET.to_string(),
            expiration: 3600,
        },
    )
    .unwrap();

    TestApp {
        router: create_app(state),
        token,
    }
}

impl TestApp {
    async fn send(&self, method: Method, uri: &str, body: Option<Value>, auth: bool) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if auth {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", self.token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        TestResponse { status, body }
    }

    async fn get(&self, uri: &str) -> TestResponse {
        self.send(Method::GET, uri, None, true).await
    }

    async fn post(&self, uri: &str, body: Value) -> TestResponse {
        self.send(Method::POST, uri, Some(body), true).await
    }

    async fn put(&self, uri: &str, body: Value) -> TestResponse {
        self.send(Method::PUT, uri, Some(body), true).await
    }

    async fn patch(&self, uri: &str, body: Value) -> TestResponse {
        self.send(Method::PATCH, uri, Some(body), true).await
    }

    async fn delete(&self, uri: &str) -> TestResponse {
        self.send(Method::DELETE, uri, None, true).await
    }

    async fn create_node(&self, code: &str) -> i64 {
        let response = self
            .post(
                "/api/nodes",
                json!({
                    "code": code,
                    "name": format!("Terminal {}", code),
                    "latitude": 19.4326,
                    "longitude": -99.1332
                }),
            )
            .await;
        assert_eq!(response.status, StatusCode::OK, "{}", response.body);
        response.body["data"]["id"].as_i64().unwrap()
    }

    async fn create_pathway(&self, code: &str, origin: i64, destination: i64) -> i64 {
        let response = self
            .post(
                "/api/pathways",
                json!({
                    "originNodeId": origin,
                    "destinationNodeId": destination,
                    "name": format!("Pathway {}", code),
                    "code": code
                }),
            )
            .await;
        assert_eq!(response.status, StatusCode::OK, "{}", response.body);
        response.body["data"]["id"].as_i64().unwrap()
    }

    async fn create_option(&self, pathway_id: i64, body: Value) -> Value {
        let response = self
            .post(&format!("/api/pathways/{}/options", pathway_id), body)
            .await;
        assert_eq!(response.status, StatusCode::OK, "{}", response.body);
        response.body["data"].clone()
    }

    async fn create_route(&self, code: &str, origin: i64, destination: i64, legs: Value) -> TestResponse {
        self.post(
            "/api/routes",
            json!({
                "name": format!("Ruta {}", code),
                "code": code,
                "buslineId": 1,
                "serviceTypeId": 1,
                "originNodeId": origin,
                "destinationNodeId": destination,
                "legs": legs
            }),
        )
        .await
    }
}

/// Red mínima: ORIG -> MID -> DEST con una opción por pathway
struct Network {
    orig: i64,
    mid: i64,
    dest: i64,
    first_pathway: i64,
    first_option: i64,
    second_pathway: i64,
    second_option: i64,
}

async fn seed_network(app: &TestApp) -> Network {
    let orig = app.create_node("ORIG").await;
    let mid = app.create_node("MID").await;
    let dest = app.create_node("DEST").await;

    let first_pathway = app.create_pathway("ORIG-MID", orig, mid).await;
    let first_option = app
        .create_option(
            first_pathway,
            json!({ "name": "Autopista", "distanceKm": "120.5", "typicalTimeMin": 90 }),
        )
        .await["id"]
        .as_i64()
        .unwrap();

    let second_pathway = app.create_pathway("MID-DEST", mid, dest).await;
    let second_option = app
        .create_option(
            second_pathway,
            json!({ "name": "Libre", "distanceKm": "60", "typicalTimeMin": 60 }),
        )
        .await["id"]
        .as_i64()
        .unwrap();

    Network {
        orig,
        mid,
        dest,
        first_pathway,
        first_option,
        second_pathway,
        second_option,
    }
}

fn selection(pathway_id: i64, option_id: i64) -> Value {
    json!({ "pathwayId": pathway_id, "pathwayOptionId": option_id })
}

fn field_codes(body: &Value) -> Vec<(String, String)> {
    body["details"]["fields"]
        .as_array()
        .map(|fields| {
            fields
                .iter()
                .map(|f| {
                    (
                        f["field"].as_str().unwrap_or_default().to_string(),
                        f["code"].as_str().unwrap_or_default().to_string(),
                    )
                })
                .collect()
        })
        .unwrap_or_default()
}

#[tokio::test]
async fn test_health_check_is_public() {
    let app = create_test_app();
    let response = app.send(Method::GET, "/health", None, false).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "ok");
}

#[tokio::test]
async fn test_api_requires_bearer_token() {
    let app = create_test_app();

    let response = app.send(Method::GET, "/api/nodes/1", None, false).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.body["code"], "UNAUTHENTICATED");

    let forged = generate_token(
        "intruder",
        &JwtConfig {
            secret: "another-secret".to_string(),
            expiration: 3600,
        },
    )
    .unwrap();
    let request = Request::builder()
        .uri("/api/nodes/get-nodes")
        .method(Method::POST)
        .header(header::AUTHORIZATION, format!("Bearer {}", forged))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{}"))
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_not_found_reports_entity_and_id() {
    let app = create_test_app();
    let response = app.get("/api/routes/999").await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.body["code"], "NOT_FOUND");
    assert_eq!(response.body["details"]["entity"], "Route");
    assert_eq!(response.body["details"]["id"], 999);
}

#[tokio::test]
async fn test_node_code_reusable_after_soft_delete() {
    let app = create_test_app();
    let id = app.create_node("TNO").await;

    let duplicate = app
        .post(
            "/api/nodes",
            json!({ "code": "tno", "name": "Otra", "latitude": 1.0, "longitude": 1.0 }),
        )
        .await;
    assert_eq!(duplicate.status, StatusCode::BAD_REQUEST);
    assert_eq!(duplicate.body["code"], "VALIDATION_ERROR");
    assert!(field_codes(&duplicate.body).contains(&("code".to_string(), "duplicate".to_string())));

    let deleted = app.delete(&format!("/api/nodes/{}", id)).await;
    assert_eq!(deleted.status, StatusCode::OK);
    assert_eq!(app.get(&format!("/api/nodes/{}", id)).await.status, StatusCode::NOT_FOUND);

    let retry = app.create_node("TNO").await;
    assert_ne!(retry, id);
}

#[tokio::test]
async fn test_node_coordinates_out_of_range() {
    let app = create_test_app();
    let response = app
        .post(
            "/api/nodes",
            json!({ "code": "BAD", "name": "Fuera", "latitude": 95.0, "longitude": 200.0 }),
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    let fields = field_codes(&response.body);
    assert!(fields.iter().any(|(field, _)| field == "latitude"));
}

#[tokio::test]
async fn test_node_pagination() {
    let app = create_test_app();
    for code in ["N1", "N2", "N3"] {
        app.create_node(code).await;
    }

    let response = app
        .post(
            "/api/nodes/get-nodes/paginated",
            json!({ "page": 2, "pageSize": 2, "orderBy": [{ "field": "code" }] }),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"].as_array().unwrap().len(), 1);
    assert_eq!(response.body["data"][0]["code"], "N3");
    assert_eq!(response.body["pagination"]["totalCount"], 3);
    assert_eq!(response.body["pagination"]["totalPages"], 2);
    assert_eq!(response.body["pagination"]["hasNextPage"], false);
    assert_eq!(response.body["pagination"]["hasPreviousPage"], true);

    let invalid = app
        .post("/api/nodes/get-nodes/paginated", json!({ "pageSize": 500 }))
        .await;
    assert_eq!(invalid.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_pathway_rejects_same_origin_and_destination() {
    let app = create_test_app();
    let node = app.create_node("SOLO").await;

    let response = app
        .post(
            "/api/pathways",
            json!({ "originNodeId": node, "destinationNodeId": node, "name": "Loop", "code": "LOOP" }),
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(field_codes(&response.body)
        .contains(&("destinationNodeId".to_string(), "same_as_origin".to_string())));
}

#[tokio::test]
async fn test_first_option_is_default_and_speed_is_derived() {
    let app = create_test_app();
    let network = seed_network(&app).await;

    let detail = app
        .get(&format!("/api/pathways/{}", network.first_pathway))
        .await;
    assert_eq!(detail.status, StatusCode::OK);
    let option = &detail.body["options"][0];
    assert_eq!(option["isDefault"], true);
    assert_eq!(option["distanceKm"], "120.5");
    assert_eq!(option["avgSpeedKmh"], "80.33");

    let second = app
        .create_option(
            network.first_pathway,
            json!({ "name": "Costera", "distanceKm": "150", "typicalTimeMin": 120, "isDefault": true }),
        )
        .await;
    assert_eq!(second["isDefault"], true);

    let first = app
        .get(&format!(
            "/api/pathways/{}/options/{}",
            network.first_pathway, network.first_option
        ))
        .await;
    assert_eq!(first.body["isDefault"], false);
}

#[tokio::test]
async fn test_pass_through_option_requires_time() {
    let app = create_test_app();
    let network = seed_network(&app).await;

    let missing = app
        .post(
            &format!("/api/pathways/{}/options", network.first_pathway),
            json!({ "name": "Directo", "distanceKm": "100", "typicalTimeMin": 60, "isPassThrough": true }),
        )
        .await;
    assert_eq!(missing.status, StatusCode::BAD_REQUEST);
    assert!(field_codes(&missing.body)
        .contains(&("passThroughTimeMin".to_string(), "required".to_string())));

    let ignored = app
        .create_option(
            network.first_pathway,
            json!({ "name": "Parada", "distanceKm": "100", "typicalTimeMin": 60, "passThroughTimeMin": 5 }),
        )
        .await;
    assert_eq!(ignored["isPassThrough"], false);
    assert!(ignored["passThroughTimeMin"].is_null());

    let kept = app
        .create_option(
            network.first_pathway,
            json!({
                "name": "Sin parada",
                "distanceKm": "100",
                "typicalTimeMin": 60,
                "isPassThrough": true,
                "passThroughTimeMin": 10
            }),
        )
        .await;
    assert_eq!(kept["passThroughTimeMin"], 10);
}

#[tokio::test]
async fn test_route_end_to_end_positions_are_dense() {
    let app = create_test_app();
    let network = seed_network(&app).await;

    let created = app
        .create_route(
            "R-ORIG-DEST",
            network.orig,
            network.dest,
            json!([
                selection(network.first_pathway, network.first_option),
                selection(network.second_pathway, network.second_option)
            ]),
        )
        .await;
    assert_eq!(created.status, StatusCode::OK, "{}", created.body);
    let route = &created.body["data"];
    assert_eq!(route["compositionState"], "composed");

    let legs = route["legs"].as_array().unwrap();
    assert_eq!(legs.len(), 2);
    let positions: Vec<i64> = legs.iter().map(|l| l["position"].as_i64().unwrap()).collect();
    assert_eq!(positions, vec![1, 2]);
    assert_eq!(legs[0]["originNodeId"], network.orig);
    assert_eq!(legs[0]["destinationNodeId"], network.mid);
    assert_eq!(legs[1]["originNodeId"], network.mid);
    assert_eq!(legs[1]["destinationNodeId"], network.dest);
    assert_eq!(legs[1]["sequence"], 2);

    let route_id = route["id"].as_i64().unwrap();
    let fetched = app.get(&format!("/api/routes/{}/legs", route_id)).await;
    assert_eq!(fetched.status, StatusCode::OK);
    assert_eq!(fetched.body.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_tolls_produce_derived_legs() {
    let app = create_test_app();
    let network = seed_network(&app).await;
    let toll = app.create_node("CASETA").await;

    let tolls = app
        .put(
            &format!(
                "/api/pathways/{}/options/{}/tolls",
                network.first_pathway, network.first_option
            ),
            json!({ "tolls": [{ "nodeId": toll, "passTimeMin": 3, "distance": "45.2" }] }),
        )
        .await;
    assert_eq!(tolls.status, StatusCode::OK, "{}", tolls.body);
    assert_eq!(tolls.body["data"][0]["distance"], "45.2");

    let created = app
        .create_route(
            "R-CASETA",
            network.orig,
            network.dest,
            json!([
                selection(network.first_pathway, network.first_option),
                selection(network.second_pathway, network.second_option)
            ]),
        )
        .await;
    assert_eq!(created.status, StatusCode::OK, "{}", created.body);

    let legs = created.body["data"]["legs"].as_array().unwrap().clone();
    assert_eq!(legs.len(), 3);
    let summary: Vec<(i64, bool, i64)> = legs
        .iter()
        .map(|l| {
            (
                l["position"].as_i64().unwrap(),
                l["isDerived"].as_bool().unwrap(),
                l["sequence"].as_i64().unwrap(),
            )
        })
        .collect();
    assert_eq!(summary, vec![(1, false, 1), (2, true, 1), (3, false, 2)]);
    assert_eq!(legs[1]["originNodeId"], network.orig);
    assert_eq!(legs[1]["destinationNodeId"], toll);
}

#[tokio::test]
async fn test_route_selection_errors_are_indexed() {
    let app = create_test_app();
    let network = seed_network(&app).await;

    let response = app
        .create_route(
            "R-BAD",
            network.orig,
            network.dest,
            json!([
                selection(network.first_pathway, network.second_option),
                selection(999, network.second_option)
            ]),
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    let fields = field_codes(&response.body);
    assert!(fields.contains(&("legs[0].pathwayOptionId".to_string(), "mismatch".to_string())));
    assert!(fields.contains(&("legs[1].pathwayId".to_string(), "not_found".to_string())));

    let routes = app.post("/api/routes/get-routes", json!({})).await;
    assert_eq!(routes.body.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_recompose_is_idempotent_and_clear_returns_to_draft() {
    let app = create_test_app();
    let network = seed_network(&app).await;

    let created = app
        .create_route("R-DRAFT", network.orig, network.dest, json!([]))
        .await;
    assert_eq!(created.status, StatusCode::OK);
    assert_eq!(created.body["data"]["compositionState"], "draft");
    let route_id = created.body["data"]["id"].as_i64().unwrap();

    let activate = app
        .patch(&format!("/api/routes/{}", route_id), json!({ "active": true }))
        .await;
    assert_eq!(activate.status, StatusCode::BAD_REQUEST);

    let body = json!({
        "legs": [
            selection(network.first_pathway, network.first_option),
            selection(network.second_pathway, network.second_option)
        ]
    });
    let first = app.put(&format!("/api/routes/{}/legs", route_id), body.clone()).await;
    let second = app.put(&format!("/api/routes/{}/legs", route_id), body).await;
    assert_eq!(first.status, StatusCode::OK);
    assert_eq!(second.status, StatusCode::OK);

    let positions = |response: &TestResponse| -> Vec<(i64, i64)> {
        response.body["data"]["legs"]
            .as_array()
            .unwrap()
            .iter()
            .map(|l| (l["position"].as_i64().unwrap(), l["pathwayId"].as_i64().unwrap()))
            .collect()
    };
    assert_eq!(positions(&first), positions(&second));

    let cleared = app.delete(&format!("/api/routes/{}/legs", route_id)).await;
    assert_eq!(cleared.status, StatusCode::OK);
    assert_eq!(cleared.body["data"]["compositionState"], "draft");

    let legs = app.get(&format!("/api/routes/{}/legs", route_id)).await;
    assert_eq!(legs.body.as_array().unwrap().len(), 0);

    let empty = app
        .put(&format!("/api/routes/{}/legs", route_id), json!({ "legs": [] }))
        .await;
    assert_eq!(empty.status, StatusCode::BAD_REQUEST);
    assert!(field_codes(&empty.body).contains(&("legs".to_string(), "required".to_string())));
}

#[tokio::test]
async fn test_active_route_cannot_be_cleared() {
    let app = create_test_app();
    let network = seed_network(&app).await;

    let created = app
        .post(
            "/api/routes",
            json!({
                "name": "Ruta activa",
                "code": "R-ACTIVE",
                "buslineId": 1,
                "serviceTypeId": 1,
                "originNodeId": network.orig,
                "destinationNodeId": network.mid,
                "active": true,
                "legs": [selection(network.first_pathway, network.first_option)]
            }),
        )
        .await;
    assert_eq!(created.status, StatusCode::OK, "{}", created.body);
    let route_id = created.body["data"]["id"].as_i64().unwrap();

    let cleared = app.delete(&format!("/api/routes/{}/legs", route_id)).await;
    assert_eq!(cleared.status, StatusCode::CONFLICT);
    assert_eq!(cleared.body["code"], "CONFLICT");
}

#[tokio::test]
async fn test_active_legs_block_option_and_pathway_removal() {
    let app = create_test_app();
    let network = seed_network(&app).await;

    let created = app
        .create_route(
            "R-USES",
            network.orig,
            network.mid,
            json!([selection(network.first_pathway, network.first_option)]),
        )
        .await;
    let route_id = created.body["data"]["id"].as_i64().unwrap();

    let impact = app
        .get(&format!(
            "/api/pathways/{}/options/{}/active-legs",
            network.first_pathway, network.first_option
        ))
        .await;
    assert_eq!(impact.status, StatusCode::OK);
    assert_eq!(impact.body["routeIds"], json!([route_id]));
    assert_eq!(impact.body["legs"].as_array().unwrap().len(), 1);

    let unused = app
        .get(&format!(
            "/api/pathways/{}/options/{}/active-legs",
            network.second_pathway, network.second_option
        ))
        .await;
    assert_eq!(unused.body["legs"].as_array().unwrap().len(), 0);

    let deactivate = app
        .patch(
            &format!(
                "/api/pathways/{}/options/{}",
                network.first_pathway, network.first_option
            ),
            json!({ "active": false }),
        )
        .await;
    assert_eq!(deactivate.status, StatusCode::CONFLICT);

    let delete_pathway = app
        .delete(&format!("/api/pathways/{}", network.first_pathway))
        .await;
    assert_eq!(delete_pathway.status, StatusCode::CONFLICT);

    let delete_route = app.delete(&format!("/api/routes/{}", route_id)).await;
    assert_eq!(delete_route.status, StatusCode::OK);

    let after = app
        .get(&format!(
            "/api/pathways/{}/options/{}/active-legs",
            network.first_pathway, network.first_option
        ))
        .await;
    assert_eq!(after.body["legs"].as_array().unwrap().len(), 0);

    let delete_pathway = app
        .delete(&format!("/api/pathways/{}", network.first_pathway))
        .await;
    assert_eq!(delete_pathway.status, StatusCode::OK);
}

#[tokio::test]
async fn test_node_in_use_cannot_be_deleted() {
    let app = create_test_app();
    let network = seed_network(&app).await;

    let response = app.delete(&format!("/api/nodes/{}", network.mid)).await;
    assert_eq!(response.status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_pathway_activation_requires_options() {
    let app = create_test_app();
    let a = app.create_node("A").await;
    let b = app.create_node("B").await;
    let pathway = app.create_pathway("A-B", a, b).await;

    let early = app
        .patch(&format!("/api/pathways/{}", pathway), json!({ "active": true }))
        .await;
    assert_eq!(early.status, StatusCode::BAD_REQUEST);
    assert!(field_codes(&early.body).contains(&("active".to_string(), "requires_options".to_string())));

    app.create_option(pathway, json!({ "name": "Unica", "distanceKm": "10", "typicalTimeMin": 15 }))
        .await;
    let activated = app
        .patch(&format!("/api/pathways/{}", pathway), json!({ "active": true }))
        .await;
    assert_eq!(activated.status, StatusCode::OK);
    assert_eq!(activated.body["data"]["active"], true);
}

#[tokio::test]
async fn test_toll_node_cannot_be_deleted() {
    let app = create_test_app();
    let network = seed_network(&app).await;
    let toll = app.create_node("CASETA").await;

    let tolls = app
        .put(
            &format!(
                "/api/pathways/{}/options/{}/tolls",
                network.first_pathway, network.first_option
            ),
            json!({ "tolls": [{ "nodeId": toll, "passTimeMin": 3, "distance": "45.2" }] }),
        )
        .await;
    assert_eq!(tolls.status, StatusCode::OK, "{}", tolls.body);

    let deleted = app.delete(&format!("/api/nodes/{}", toll)).await;
    assert_eq!(deleted.status, StatusCode::CONFLICT);
    assert_eq!(deleted.body["code"], "CONFLICT");
    assert_eq!(app.get(&format!("/api/nodes/{}", toll)).await.status, StatusCode::OK);

    let cleared = app
        .put(
            &format!(
                "/api/pathways/{}/options/{}/tolls",
                network.first_pathway, network.first_option
            ),
            json!({ "tolls": [] }),
        )
        .await;
    assert_eq!(cleared.status, StatusCode::OK);
    let deleted = app.delete(&format!("/api/nodes/{}", toll)).await;
    assert_eq!(deleted.status, StatusCode::OK);
}

#[tokio::test]
async fn test_tolls_locked_while_option_in_use() {
    let app = create_test_app();
    let network = seed_network(&app).await;
    let toll = app.create_node("CASETA").await;

    let created = app
        .create_route(
            "R-LOCKED",
            network.orig,
            network.mid,
            json!([selection(network.first_pathway, network.first_option)]),
        )
        .await;
    assert_eq!(created.status, StatusCode::OK, "{}", created.body);
    let route_id = created.body["data"]["id"].as_i64().unwrap();

    let tolls_uri = format!(
        "/api/pathways/{}/options/{}/tolls",
        network.first_pathway, network.first_option
    );
    let body = json!({ "tolls": [{ "nodeId": toll, "passTimeMin": 3, "distance": "45.2" }] });

    let refused = app.put(&tolls_uri, body.clone()).await;
    assert_eq!(refused.status, StatusCode::CONFLICT);
    let legs = app.get(&format!("/api/routes/{}/legs", route_id)).await;
    assert_eq!(legs.body.as_array().unwrap().len(), 1);
    let current = app.get(&tolls_uri).await;
    assert_eq!(current.body.as_array().unwrap().len(), 0);

    let removed = app.delete(&format!("/api/routes/{}", route_id)).await;
    assert_eq!(removed.status, StatusCode::OK);
    let accepted = app.put(&tolls_uri, body).await;
    assert_eq!(accepted.status, StatusCode::OK);
}

#[tokio::test]
async fn test_pathway_code_reusable_after_soft_delete() {
    let app = create_test_app();
    let a = app.create_node("A").await;
    let b = app.create_node("B").await;
    let first = app.create_pathway("NORTE", a, b).await;

    let duplicate = app
        .post(
            "/api/pathways",
            json!({ "originNodeId": b, "destinationNodeId": a, "name": "Regreso", "code": "norte" }),
        )
        .await;
    assert_eq!(duplicate.status, StatusCode::BAD_REQUEST);
    assert!(field_codes(&duplicate.body).contains(&("code".to_string(), "duplicate".to_string())));

    let deleted = app.delete(&format!("/api/pathways/{}", first)).await;
    assert_eq!(deleted.status, StatusCode::OK);

    let retry = app
        .post(
            "/api/pathways",
            json!({ "originNodeId": b, "destinationNodeId": a, "name": "Regreso", "code": "norte" }),
        )
        .await;
    assert_eq!(retry.status, StatusCode::OK, "{}", retry.body);
    assert_eq!(retry.body["data"]["code"], "NORTE");
    assert_ne!(retry.body["data"]["id"], first);
}

#[tokio::test]
async fn test_route_code_reusable_after_soft_delete() {
    let app = create_test_app();
    let a = app.create_node("A").await;
    let b = app.create_node("B").await;

    let first = app.create_route("R-100", a, b, json!([])).await;
    assert_eq!(first.status, StatusCode::OK);
    let first_id = first.body["data"]["id"].as_i64().unwrap();

    let duplicate = app.create_route("r-100", a, b, json!([])).await;
    assert_eq!(duplicate.status, StatusCode::BAD_REQUEST);
    assert!(field_codes(&duplicate.body).contains(&("code".to_string(), "duplicate".to_string())));

    assert_eq!(app.delete(&format!("/api/routes/{}", first_id)).await.status, StatusCode::OK);
    let retry = app.create_route("r-100", a, b, json!([])).await;
    assert_eq!(retry.status, StatusCode::OK);
    assert_eq!(retry.body["data"]["code"], "R-100");
}

#[tokio::test]
async fn test_deleting_default_option_promotes_next() {
    let app = create_test_app();
    let network = seed_network(&app).await;
    let second = app
        .create_option(
            network.first_pathway,
            json!({ "name": "Costera", "distanceKm": "150", "typicalTimeMin": 120 }),
        )
        .await;
    assert_eq!(second["isDefault"], false);

    let deleted = app
        .delete(&format!(
            "/api/pathways/{}/options/{}",
            network.first_pathway, network.first_option
        ))
        .await;
    assert_eq!(deleted.status, StatusCode::OK);

    let detail = app
        .get(&format!("/api/pathways/{}", network.first_pathway))
        .await;
    let options = detail.body["options"].as_array().unwrap();
    assert_eq!(options.len(), 1);
    assert_eq!(options[0]["id"], second["id"]);
    assert_eq!(options[0]["isDefault"], true);
}

#[tokio::test]
async fn test_inactive_option_cannot_be_composed() {
    let app = create_test_app();
    let network = seed_network(&app).await;
    let inactive = app
        .create_option(
            network.first_pathway,
            json!({ "name": "Cerrada", "distanceKm": "90", "typicalTimeMin": 70, "active": false }),
        )
        .await["id"]
        .as_i64()
        .unwrap();

    let response = app
        .create_route(
            "R-CERRADA",
            network.orig,
            network.mid,
            json!([selection(network.first_pathway, inactive)]),
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(field_codes(&response.body)
        .contains(&("legs[0].pathwayOptionId".to_string(), "inactive".to_string())));
}
