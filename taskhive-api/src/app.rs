/// Application state and router builder
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use taskhive_api::{app::{build_router, AppState}, config::Config};
/// use taskhive_shared::db::pool::create_pool;
/// use taskhive_shared::redis::{RedisClient, RedisConfig};
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = create_pool(config.pool_config()).await?;
/// let redis = RedisClient::new(RedisConfig::new(config.redis.url.clone())).await?;
/// let state = AppState::new(pool, config, Arc::new(redis));
/// let app = build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{
    config::Config,
    middleware::{auth::require_auth, security::SecurityHeadersLayer},
    routes,
};
use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use taskhive_shared::{
    auth::{
        credentials::CredentialStore,
        revocation::{Denylist, RevocationCache},
    },
    services::{AccountService, MembershipEngine, TaskStore},
};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state, cloned into every handler
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Arc<Config>,
    pub credentials: CredentialStore,
    pub revocations: RevocationCache,
    pub memberships: MembershipEngine,
    pub tasks: TaskStore,
    pub accounts: AccountService,
}

impl AppState {
    /// Wires every service onto one pool and one denylist
    pub fn new(db: PgPool, config: Config, denylist: Arc<dyn Denylist>) -> Self {
        let revocations = RevocationCache::new(denylist);
        let credentials = CredentialStore::new(db.clone(), config.token_settings(), revocations.clone());

        Self {
            memberships: MembershipEngine::new(db.clone()),
            tasks: TaskStore::new(db.clone()),
            accounts: AccountService::new(db.clone()),
            credentials,
            revocations,
            config: Arc::new(config),
            db,
        }
    }
}

fn cors_layer(config: &Config) -> CorsLayer {
    if config.api.cors_origins.iter().any(|origin| origin == "*") {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = config
        .api
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
        .max_age(std::time::Duration::from_secs(3600))
}

/// Builds the complete router
///
/// ```text
/// /health                              GET
/// /api/users/signup                    POST
/// /api/auth/{login,refresh}            POST
/// /api/auth/logout                     POST   (auth)
/// /api/auth/validate-token             GET    (auth)
/// /api/groups                          GET POST          (auth)
/// /api/groups/:id                      GET PUT           (auth)
/// /api/groups/:id/leave                POST              (auth)
/// /api/groups/:id/members              GET               (auth)
/// /api/invites                         GET               (auth)
/// /api/invites/send                    POST              (auth)
/// /api/invites/:group_id/{accept,decline} POST           (auth)
/// /api/tasks                           GET POST          (auth)
/// /api/tasks/group/:group_id           GET               (auth)
/// /api/tasks/:id                       GET PUT DELETE    (auth)
/// ```
pub fn build_router(state: AppState) -> Router {
    let auth_layer = axum::middleware::from_fn_with_state(state.clone(), require_auth);

    let public_auth_routes = Router::new()
        .route("/login", post(routes::auth::login))
        .route("/refresh", post(routes::auth::refresh));

    let session_routes = Router::new()
        .route("/logout", post(routes::auth::logout))
        .route("/validate-token", get(routes::auth::validate_token))
        .route_layer(auth_layer.clone());

    let user_routes = Router::new().route("/signup", post(routes::users::signup));

    let group_routes = Router::new()
        .route("/", get(routes::groups::list_groups).post(routes::groups::create_group))
        .route("/:id", get(routes::groups::get_group).put(routes::groups::update_group))
        .route("/:id/leave", post(routes::groups::leave_group))
        .route("/:id/members", get(routes::groups::list_members))
        .route_layer(auth_layer.clone());

    let invite_routes = Router::new()
        .route("/", get(routes::invites::list_invitations))
        .route("/send", post(routes::invites::send_invitation))
        .route("/:group_id/accept", post(routes::invites::accept_invitation))
        .route("/:group_id/decline", post(routes::invites::decline_invitation))
        .route_layer(auth_layer.clone());

    let task_routes = Router::new()
        .route("/", get(routes::tasks::list_tasks).post(routes::tasks::create_task))
        .route("/group/:group_id", get(routes::tasks::list_group_tasks))
        .route(
            "/:id",
            get(routes::tasks::get_task)
                .put(routes::tasks::update_task)
                .delete(routes::tasks::delete_task),
        )
        .route_layer(auth_layer);

    let api_routes = Router::new()
        .nest("/auth", public_auth_routes.merge(session_routes))
        .nest("/users", user_routes)
        .nest("/groups", group_routes)
        .nest("/invites", invite_routes)
        .nest("/tasks", task_routes);

    Router::new()
        .route("/health", get(routes::health::health_check))
        .nest("/api", api_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors_layer(&state.config))
        .layer(SecurityHeadersLayer::new(state.config.api.production))
        .with_state(state)
}
