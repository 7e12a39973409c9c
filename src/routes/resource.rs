/**
 * Resource Routes
 * Generic list/get/create/update/delete handlers shared by every entity
 */
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};

use crate::db::Resource;
use crate::error::{ApiError, ApiResult};
use crate::routes::auth::AdminSession;
use crate::routes::{parse_id, SuccessResponse, Valid};
use crate::state::AppState;

fn store_error<R: Resource>(err: crate::db::StoreError) -> ApiError {
    ApiError::from_store(err, R::LABEL)
}

// ============================================================================
// Public reads
// ============================================================================

/// GET /api/{entity}
pub async fn list<R: Resource>(State(state): State<AppState>) -> ApiResult<Json<Vec<R>>> {
    let rows = R::repository(state.store())
        .list()
        .await
        .map_err(store_error::<R>)?;
    Ok(Json(rows))
}

/// GET /api/{entity}/{id}
pub async fn get_one<R: Resource>(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<R>> {
    let id = parse_id(&id, R::LABEL)?;
    let row = R::repository(state.store())
        .get(id)
        .await
        .map_err(store_error::<R>)?;
    Ok(Json(row))
}

// ============================================================================
// Admin
// ============================================================================

pub async fn admin_list<R: Resource>(
    _session: AdminSession,
    state: State<AppState>,
) -> ApiResult<Json<Vec<R>>> {
    list::<R>(state).await
}

pub async fn admin_get<R: Resource>(
    _session: AdminSession,
    state: State<AppState>,
    id: Path<String>,
) -> ApiResult<Json<R>> {
    get_one::<R>(state, id).await
}

pub async fn create<R: Resource>(
    session: AdminSession,
    State(state): State<AppState>,
    Valid(input): Valid<R::Input>,
) -> ApiResult<(StatusCode, Json<R>)> {
    let created = R::repository(state.store())
        .create(input)
        .await
        .map_err(store_error::<R>)?;

    tracing::info!(resource = R::LABEL, id = %created.id(), admin_id = %session.id, "Created");
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn update<R: Resource>(
    session: AdminSession,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Valid(patch): Valid<R::Patch>,
) -> ApiResult<Json<R>> {
    let id = parse_id(&id, R::LABEL)?;
    let updated = R::repository(state.store())
        .update(id, patch)
        .await
        .map_err(store_error::<R>)?;

    tracing::info!(resource = R::LABEL, %id, admin_id = %session.id, "Updated");
    Ok(Json(updated))
}

pub async fn delete<R: Resource>(
    session: AdminSession,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<SuccessResponse>> {
    let id = parse_id(&id, R::LABEL)?;
    R::repository(state.store())
        .delete(id)
        .await
        .map_err(store_error::<R>)?;

    tracing::info!(resource = R::LABEL, %id, admin_id = %session.id, "Deleted");
    Ok(SuccessResponse::ok())
}

// ============================================================================
// Routers
// ============================================================================

fn item_path(base: &str) -> String {
    format!("{base}/{{id}}")
}

/// `GET base` and `GET base/{id}` without a guard.
pub fn public_routes<R: Resource>(base: &str) -> Router<AppState> {
    Router::new()
        .route(base, get(list::<R>))
        .route(&item_path(base), get(get_one::<R>))
}

/// Full admin CRUD: `GET/POST base`, `GET/PUT/DELETE base/{id}`.
pub fn admin_routes<R: Resource>(base: &str) -> Router<AppState> {
    Router::new()
        .route(base, get(admin_list::<R>).post(create::<R>))
        .route(
            &item_path(base),
            get(admin_get::<R>).put(update::<R>).delete(delete::<R>),
        )
}

#[cfg(test)]
mod tests {
    use crate::state::AppState;
    use crate::test_support::{admin_token, send, test_state};
    use axum::http::{Method, StatusCode};
    use serde_json::{json, Value};

    fn work_body(title: &str) -> Value {
        json!({
            "title": title,
            "description": "Full catalogue with cart and checkout",
            "price": "from 150 000",
            "images": ["https://cdn.example.com/shop.jpg"],
            "clientName": "Electro LLC",
            "clientReview": "Delivered on time and works great",
            "category": "E-commerce",
        })
    }

    fn portfolio_body(title: &str, order: i64) -> Value {
        let mut body = work_body(title);
        let map = body.as_object_mut().unwrap();
        map.remove("price");
        map.insert("order".to_string(), json!(order));
        body
    }

    fn blog_body() -> Value {
        json!({
            "title": "How to brief a studio",
            "content": "A good brief saves weeks: the problem, the audience, the pages and the budget.",
            "excerpt": "Five questions to answer first",
            "image": "https://cdn.example.com/brief.jpg",
            "published": true,
        })
    }

    fn social_body() -> Value {
        json!({ "name": "Telegram", "url": "https://t.me/studio", "icon": "telegram", "order": 4 })
    }

    fn application_body() -> Value {
        json!({
            "fullName": "Ivan Petrov",
            "email": "ivan@example.com",
            "phone": "+79991234567",
            "telegram": "@ivan",
            "projectType": "Landing page",
            "projectProblem": "We have no online presence",
            "targetAudience": "Local families",
            "budget": "100-300k",
            "deadline": "1 month",
            "description": "A one-page site for our bakery with a menu",
            "additionalInfo": "Prefer warm colours",
        })
    }

    fn order_body(work_id: Option<&str>) -> Value {
        json!({
            "name": "Ivan",
            "email": "ivan@example.com",
            "phone": "+79991234567",
            "telegram": "@ivan",
            "message": "I want one like this",
            "workId": work_id,
        })
    }

    fn admin_body() -> Value {
        json!({ "email": "editor@example.com", "password": "editor-pass", "name": "Editor" })
    }

    /// Every submitted field must come back unchanged.
    fn assert_submitted_fields(entity: &str, submitted: &Value, record: &Value) {
        for (field, value) in submitted.as_object().unwrap() {
            assert_eq!(&record[field], value, "{entity}.{field}");
        }
    }

    async fn create(app: &axum::Router, token: Option<&str>, path: &str, body: Value) -> Value {
        let (status, created) = send(app, Method::POST, path, token, Some(body)).await;
        assert_eq!(status, StatusCode::CREATED, "POST {path}: {created}");
        created
    }

    /// Everything the store holds, serialized.
    async fn snapshot(state: &AppState) -> Value {
        let store = state.store();
        json!({
            "works": store.works().list().await.unwrap(),
            "portfolio": store.portfolio().list().await.unwrap(),
            "blog": store.blog().list().await.unwrap(),
            "socials": store.socials().list().await.unwrap(),
            "applications": store.applications().list().await.unwrap(),
            "orders": store.orders().list().await.unwrap(),
            "admins": store.admins().list().await.unwrap(),
        })
    }

    #[tokio::test]
    async fn test_every_entity_reads_back_what_was_created() {
        let (state, _) = test_state();
        let token = admin_token(&state).await;
        let app = crate::create_app(state);

        let work = create(&app, Some(&token), "/api/admin/works", work_body("Online store")).await;
        let work_id = work["id"].as_str().unwrap().to_string();

        let cases = [
            ("Work", Some(token.as_str()), "/api/admin/works", "/api/works", work_body("Online store")),
            ("PortfolioItem", Some(token.as_str()), "/api/admin/portfolio", "/api/portfolio", portfolio_body("Bakery", 2)),
            ("BlogPost", Some(token.as_str()), "/api/admin/blog", "/api/blog", blog_body()),
            ("Social", Some(token.as_str()), "/api/admin/socials", "/api/admin/socials", social_body()),
            ("Application", None, "/api/applications", "/api/admin/applications", application_body()),
            ("Order", None, "/api/orders", "/api/admin/orders", order_body(Some(work_id.as_str()))),
        ];

        for (entity, create_token, create_path, read_base, body) in cases {
            let created = create(&app, create_token, create_path, body.clone()).await;
            assert_submitted_fields(entity, &body, &created);

            let id = created["id"].as_str().unwrap();
            let (status, fetched) =
                send(&app, Method::GET, &format!("{read_base}/{id}"), Some(&token), None).await;
            assert_eq!(status, StatusCode::OK, "{entity}");
            assert_eq!(fetched, created, "{entity}");
        }

        let mut submitted = admin_body();
        let admin = create(&app, Some(&token), "/api/admin/admins", submitted.clone()).await;
        submitted.as_object_mut().unwrap().remove("password");
        assert_submitted_fields("Admin", &submitted, &admin);
        assert!(admin.get("password").is_none());

        let (status, admins) = send(&app, Method::GET, "/api/admin/admins", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        let listed = admins
            .as_array()
            .unwrap()
            .iter()
            .find(|a| a["id"] == admin["id"])
            .unwrap();
        assert_eq!(listed, &admin);
    }

    #[tokio::test]
    async fn test_mutations_without_session_change_nothing() {
        let (state, _) = test_state();
        let token = admin_token(&state).await;
        let app = crate::create_app(state.clone());

        let work = create(&app, Some(&token), "/api/admin/works", work_body("Online store")).await;
        let item = create(&app, Some(&token), "/api/admin/portfolio", portfolio_body("Bakery", 1)).await;
        let post = create(&app, Some(&token), "/api/admin/blog", blog_body()).await;
        let social = create(&app, Some(&token), "/api/admin/socials", social_body()).await;
        let application = create(&app, None, "/api/applications", application_body()).await;
        let order = create(&app, None, "/api/orders", order_body(None)).await;
        let editor = create(&app, Some(&token), "/api/admin/admins", admin_body()).await;

        let at = |base: &str, record: &Value| format!("{base}/{}", record["id"].as_str().unwrap());
        let requests: Vec<(Method, String, Option<Value>)> = vec![
            (Method::POST, "/api/admin/works".to_string(), Some(work_body("Intruder"))),
            (Method::PUT, at("/api/admin/works", &work), Some(work_body("Intruder"))),
            (Method::DELETE, at("/api/admin/works", &work), None),
            (Method::POST, "/api/admin/portfolio".to_string(), Some(portfolio_body("Intruder", 0))),
            (Method::PUT, at("/api/admin/portfolio", &item), Some(portfolio_body("Intruder", 0))),
            (Method::DELETE, at("/api/admin/portfolio", &item), None),
            (Method::POST, "/api/admin/blog".to_string(), Some(blog_body())),
            (Method::PUT, at("/api/admin/blog", &post), Some(blog_body())),
            (Method::DELETE, at("/api/admin/blog", &post), None),
            (Method::POST, "/api/admin/socials".to_string(), Some(social_body())),
            (Method::PUT, at("/api/admin/socials", &social), Some(social_body())),
            (Method::DELETE, at("/api/admin/socials", &social), None),
            (Method::PATCH, at("/api/admin/applications", &application), Some(json!({ "status": "completed" }))),
            (Method::DELETE, at("/api/admin/applications", &application), None),
            (Method::PUT, at("/api/admin/orders", &order), Some(order_body(None))),
            (Method::DELETE, at("/api/admin/orders", &order), None),
            (Method::POST, "/api/admin/admins".to_string(), Some(json!({ "email": "intruder@example.com", "password": "intruder-pass", "name": "Intruder" }))),
            (Method::DELETE, at("/api/admin/admins", &editor), None),
        ];

        let before = snapshot(&state).await;
        for (method, uri, body) in requests {
            for bad_token in [None, Some("garbage")] {
                let (status, response) =
                    send(&app, method.clone(), &uri, bad_token, body.clone()).await;
                assert_eq!(status, StatusCode::UNAUTHORIZED, "{method} {uri}");
                assert!(response.get("fields").is_none(), "{method} {uri}");
            }
        }
        assert_eq!(snapshot(&state).await, before);
    }

    #[tokio::test]
    async fn test_admin_routes_require_session_before_validation() {
        let (state, _) = test_state();
        let app = crate::create_app(state.clone());

        let (status, body) =
            send(&app, Method::POST, "/api/admin/works", None, Some(json!({}))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body.get("fields").is_none());
        assert!(state.store().works().list().await.unwrap().is_empty());

        let (status, _) = send(
            &app,
            Method::DELETE,
            &format!("/api/admin/works/{}", uuid::Uuid::new_v4()),
            Some("garbage"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_work_crud_lifecycle() {
        let (state, _) = test_state();
        let token = admin_token(&state).await;
        let app = crate::create_app(state);

        let (status, created) = send(
            &app,
            Method::POST,
            "/api/admin/works",
            Some(&token),
            Some(work_body("Online store")),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["featured"], false);
        assert_eq!(created["videos"], json!([]));
        let id = created["id"].as_str().unwrap().to_string();

        let (status, fetched) = send(&app, Method::GET, &format!("/api/works/{id}"), None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched, created);

        let mut replacement = work_body("Online store v2");
        replacement["featured"] = json!(true);
        let (status, updated) = send(
            &app,
            Method::PUT,
            &format!("/api/admin/works/{id}"),
            Some(&token),
            Some(replacement),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["title"], "Online store v2");
        assert_eq!(updated["featured"], true);
        assert_eq!(updated["createdAt"], created["createdAt"]);

        let (status, body) = send(
            &app,
            Method::DELETE,
            &format!("/api/admin/works/{id}"),
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "success": true }));

        let (status, body) = send(&app, Method::GET, &format!("/api/works/{id}"), None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Work not found");
    }

    #[tokio::test]
    async fn test_create_with_invalid_body_reports_fields() {
        let (state, _) = test_state();
        let token = admin_token(&state).await;
        let app = crate::create_app(state.clone());

        let mut body = work_body("Online store");
        body["images"] = json!([]);
        body["siteUrl"] = json!("not a url");
        let (status, body) =
            send(&app, Method::POST, "/api/admin/works", Some(&token), Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["fields"].get("images").is_some());
        assert!(body["fields"].get("siteUrl").is_some());
        assert!(state.store().works().list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_or_malformed_id_is_not_found() {
        let (state, _) = test_state();
        let token = admin_token(&state).await;
        let app = crate::create_app(state);

        let (status, _) = send(&app, Method::GET, "/api/portfolio/not-a-uuid", None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(
            &app,
            Method::PUT,
            &format!("/api/admin/portfolio/{}", uuid::Uuid::new_v4()),
            Some(&token),
            Some(portfolio_body("Missing", 0)),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_portfolio_is_listed_by_order() {
        let (state, _) = test_state();
        let token = admin_token(&state).await;
        let app = crate::create_app(state);

        for (title, order) in [("Third", 3), ("First", 1), ("Second", 2)] {
            let (status, _) = send(
                &app,
                Method::POST,
                "/api/admin/portfolio",
                Some(&token),
                Some(portfolio_body(title, order)),
            )
            .await;
            assert_eq!(status, StatusCode::CREATED);
        }

        let (status, body) = send(&app, Method::GET, "/api/portfolio", None, None).await;
        assert_eq!(status, StatusCode::OK);
        let titles: Vec<_> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|item| item["title"].as_str().unwrap())
            .collect();
        assert_eq!(titles, vec!["First", "Second", "Third"]);
    }
}
