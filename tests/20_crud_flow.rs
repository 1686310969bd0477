//! Database-backed CRUD flows. These run against DATABASE_URL and skip
//! cleanly when it is not set.

mod common;

use axum::http::StatusCode;
use serde_json::{json, Value};
use uuid::Uuid;

fn marker() -> String {
    Uuid::new_v4().simple().to_string()
}

#[tokio::test]
async fn skill_lifecycle_end_to_end() -> anyhow::Result<()> {
    let Some(state) = common::db_state().await else {
        eprintln!("skipping: DATABASE_URL not set");
        return Ok(());
    };
    let router = portfolio_api::app(state);

    let name = format!("Rust-{}", marker());

    // create: defaults substituted, 201
    let (status, _, body) = common::send(
        router.clone(),
        common::json_request(
            "POST",
            "/api/skills",
            json!({ "name": name, "icon": "SiRust", "category": "Backend" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["data"]["level"], json!("Intermediate"));
    let id = body["data"]["id"].as_str().unwrap().to_string();
    let created_at = body["data"]["createdAt"].as_str().unwrap().to_string();

    // duplicate (name, category) pair is rejected
    let (status, _, body) = common::send(
        router.clone(),
        common::json_request(
            "POST",
            "/api/skills",
            json!({ "name": name, "icon": "SiRust", "category": "Backend" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("already exists"));

    // update refreshes updatedAt
    let (status, _, body) = common::send(
        router.clone(),
        common::json_request(
            "PUT",
            &format!("/api/skills/{}", id),
            json!({ "level": "Expert" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["level"], json!("Expert"));
    assert_eq!(body["data"]["createdAt"], json!(created_at));
    assert_ne!(body["data"]["updatedAt"], body["data"]["createdAt"]);

    // delete returns the empty payload, then the id is gone
    let (status, _, body) = common::send(
        router.clone(),
        common::empty_request("DELETE", &format!("/api/skills/{}", id)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], json!({}));

    let (status, _, _) = common::send(
        router.clone(),
        common::empty_request("DELETE", &format!("/api/skills/{}", id)),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, _, body) = common::send(router.clone(), common::empty_request("GET", "/api/skills")).await;
    let listed = body["data"].as_array().unwrap();
    assert!(listed.iter().all(|doc| doc["id"] != json!(id)));

    Ok(())
}

#[tokio::test]
async fn put_with_unknown_id_never_creates() -> anyhow::Result<()> {
    let Some(state) = common::db_state().await else {
        eprintln!("skipping: DATABASE_URL not set");
        return Ok(());
    };
    let router = portfolio_api::app(state);

    let ghost = Uuid::new_v4().to_string();
    let (status, _, _) = common::send(
        router.clone(),
        common::json_request(
            "PUT",
            &format!("/api/projects/{}", ghost),
            json!({ "title": "Ghost", "description": "should not appear" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, _, body) = common::send(router.clone(), common::empty_request("GET", "/api/projects")).await;
    let listed = body["data"].as_array().unwrap();
    assert!(listed.iter().all(|doc| doc["id"] != json!(ghost)));

    Ok(())
}

#[tokio::test]
async fn duplicate_categories_leave_one_document() -> anyhow::Result<()> {
    let Some(state) = common::db_state().await else {
        eprintln!("skipping: DATABASE_URL not set");
        return Ok(());
    };
    let router = portfolio_api::app(state);

    let name = format!("Tools-{}", marker());
    let payload = json!({ "name": name, "type": "skill", "color": "#10B981" });

    let (status, _, _) = common::send(
        router.clone(),
        common::json_request("POST", "/api/categories", payload.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _, body) = common::send(
        router.clone(),
        common::json_request("POST", "/api/categories", payload),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("already exists"));

    // the ?type= filter includes the document under its own type only
    let (_, _, body) = common::send(
        router.clone(),
        common::empty_request("GET", "/api/categories?type=skill"),
    )
    .await;
    let matches = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|doc| doc["name"] == json!(name))
        .count();
    assert_eq!(matches, 1);

    let (_, _, body) = common::send(
        router.clone(),
        common::empty_request("GET", "/api/categories?type=project"),
    )
    .await;
    assert!(body["data"]
        .as_array()
        .unwrap()
        .iter()
        .all(|doc| doc["name"] != json!(name)));

    Ok(())
}

#[tokio::test]
async fn journey_lists_by_year_then_order_descending() -> anyhow::Result<()> {
    let Some(state) = common::db_state().await else {
        eprintln!("skipping: DATABASE_URL not set");
        return Ok(());
    };
    let router = portfolio_api::app(state);

    let company = format!("Acme-{}", marker());
    for year in ["2020", "2022", "2021"] {
        let (status, _, _) = common::send(
            router.clone(),
            common::json_request(
                "POST",
                "/api/journey",
                json!({ "title": "Engineer", "company": company, "year": year }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (_, _, body) = common::send(router.clone(), common::empty_request("GET", "/api/journey")).await;
    let years: Vec<Value> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|doc| doc["company"] == json!(company))
        .map(|doc| doc["year"].clone())
        .collect();
    assert_eq!(years, vec![json!("2022"), json!("2021"), json!("2020")]);

    Ok(())
}

#[tokio::test]
async fn about_singleton_is_created_once() -> anyhow::Result<()> {
    let Some(state) = common::db_state().await else {
        eprintln!("skipping: DATABASE_URL not set");
        return Ok(());
    };
    sqlx::query("TRUNCATE \"about\"")
        .execute(state.store.pool())
        .await?;
    let router = portfolio_api::app(state);

    let (status, _, body) = common::send(router.clone(), common::empty_request("GET", "/api/about")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["title"], json!("About Me"));
    let id = body["data"]["id"].clone();

    // second read returns the same document, no duplicate creation
    let (_, _, body) = common::send(router.clone(), common::empty_request("GET", "/api/about")).await;
    assert_eq!(body["data"]["id"], id);

    // PUT upserts in place
    let (status, _, body) = common::send(
        router.clone(),
        common::json_request("PUT", "/api/about", json!({ "content": "Hello there" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["id"], id);
    assert_eq!(body["data"]["content"], json!("Hello there"));

    Ok(())
}
