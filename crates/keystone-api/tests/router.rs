use std::future::Future;

use anyhow::{Context, Result};
use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode};
use keystone_api::{ApiServer, ApiState};
use keystone_data::{ADMINISTRATOR, Database, NewUser};
use keystone_test_support::start_postgres;
use serde_json::Value;
use tower::ServiceExt;

async fn with_router<F, Fut>(test: F) -> Result<()>
where
    F: FnOnce(Router, Database) -> Fut,
    Fut: Future<Output = Result<()>>,
{
    let postgres = match start_postgres() {
        Ok(postgres) => postgres,
        Err(err) => {
            eprintln!("skipping router tests: {err:#}");
            return Ok(());
        }
    };
    let database = Database::connect(postgres.connection_string(), 2).await?;
    database.create_all().await?;
    database.insert_roles().await?;
    let router = ApiServer::new(ApiState::shared(database.clone()))?.into_router();

    let result = test(router, database.clone()).await;

    database.close().await;
    drop(postgres);
    result
}

async fn get_json(router: Router, uri: &str) -> Result<(StatusCode, Value)> {
    let response = router
        .oneshot(Request::get(uri).body(Body::empty())?)
        .await?;
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await?;
    Ok((status, serde_json::from_slice(&body)?))
}

#[tokio::test]
async fn health_reports_database_ok() -> Result<()> {
    with_router(|router, _| async move {
        let (status, body) = get_json(router, "/health").await?;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["database"], "ok");
        Ok(())
    })
    .await
}

#[tokio::test]
async fn roles_are_listed_in_seed_order() -> Result<()> {
    with_router(|router, _| async move {
        let (status, body) = get_json(router, "/api/v1/roles").await?;
        assert_eq!(status, StatusCode::OK);
        let names: Vec<_> = body
            .as_array()
            .context("roles should be an array")?
            .iter()
            .filter_map(|role| role["name"].as_str())
            .collect();
        assert_eq!(names, ["User", "Moderator", ADMINISTRATOR]);
        Ok(())
    })
    .await
}

#[tokio::test]
async fn user_lookup_hides_password_hash() -> Result<()> {
    with_router(|router, db| async move {
        let admin = db
            .find_role_by_name(ADMINISTRATOR)
            .await?
            .context("administrator role missing")?;
        db.create_user(NewUser {
            email: "a@x.com",
            username: "admin",
            password: "secret",
            confirmed: true,
            role_id: Some(admin.id),
        })
        .await?;

        let (status, body) = get_json(router.clone(), "/api/v1/users/admin").await?;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["username"], "admin");
        assert_eq!(body["role_name"], ADMINISTRATOR);
        assert_eq!(body["confirmed"], true);
        assert!(body.get("password_hash").is_none());

        let (status, body) = get_json(router, "/api/v1/users/ghost").await?;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["status"], 404);
        Ok(())
    })
    .await
}
