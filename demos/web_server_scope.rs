use axum::{extract::Path, routing::get, Json, Router};
use ferrous_locator::{
    axum_integration::RequestServices, Locator, LocatorError, ScopeLayer, TracingObserver,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

// ===== Domain Types =====

#[derive(Debug)]
struct User {
    id: String,
    name: String,
}

struct UserRepository {
    users: HashMap<String, User>,
}

impl UserRepository {
    fn new() -> Self {
        let users = [("1", "Alice"), ("2", "Bob"), ("3", "Charlie")]
            .into_iter()
            .map(|(id, name)| {
                (
                    id.to_string(),
                    User {
                        id: id.to_string(),
                        name: name.to_string(),
                    },
                )
            })
            .collect();
        Self { users }
    }
}

#[derive(Debug)]
struct RequestContext {
    request_id: String,
    caller: Option<String>,
}

// ===== Handlers =====

async fn get_user(
    services: RequestServices,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, LocatorError> {
    let repo = services.resolve_as::<UserRepository>("users")?;
    let ctx = services.resolve_scoped_as::<RequestContext>("request")?;

    Ok(Json(serde_json::json!({
        "request_id": ctx.request_id,
        "caller": ctx.caller,
        "user": repo.users.get(&id).map(|u| u.name.clone()),
    })))
}

async fn list_users(services: RequestServices) -> Result<Json<Vec<String>>, LocatorError> {
    let repo = services.resolve_as::<UserRepository>("users")?;
    let mut names: Vec<String> = repo.users.values().map(|u| format!("{}:{}", u.id, u.name)).collect();
    names.sort();
    Ok(Json(names))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")))
        .init();

    let next_request = Arc::new(AtomicU64::new(1));

    let mut locator = Locator::new();
    locator.add_observer(TracingObserver::new());
    locator.add_singleton("users", |_| UserRepository::new());
    locator.add_scoped("request", move |parts, _| RequestContext {
        request_id: format!("req-{}", next_request.fetch_add(1, Ordering::Relaxed)),
        caller: parts
            .headers
            .get("x-caller")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
    });

    let report = locator.prewarm_singletons();
    if !report.is_ready() {
        return Err(format!("startup failed: {:?}", report.failures).into());
    }

    let locator = Arc::new(locator);
    let app = Router::new()
        .route("/users", get(list_users))
        .route("/users/:id", get(get_user))
        .layer(ScopeLayer::new(locator));

    let listener = TcpListener::bind("127.0.0.1:3000").await?;
    tracing::info!("listening on http://127.0.0.1:3000 (try: curl -H 'x-caller: me' localhost:3000/users/1)");
    axum::serve(listener, app).await?;
    Ok(())
}
