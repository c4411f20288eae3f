//! HTTP route handlers.

use std::sync::Arc;

use axum::{
    extract::State,
    http::HeaderMap,
    routing::{get, post},
    Json, Router,
};
use tower_http::cors::CorsLayer;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use crate::agents::TaskAgent;
use crate::config::Config;
use crate::llm::{LlmGateway, ProviderGateway};
use crate::task::AgentState;

use super::session::{session_id, SessionStore, SharedAgentState, SESSION_HEADER};
use super::types::*;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub agent: TaskAgent,
    pub sessions: SessionStore,
}

impl AppState {
    pub fn new(config: Config, llm: Arc<dyn LlmGateway>) -> Self {
        Self {
            sessions: SessionStore::new(config.max_sessions),
            agent: TaskAgent::new(llm),
            config,
        }
    }

    async fn session(&self, id: &str) -> Result<SharedAgentState, ApiError> {
        self.sessions.get(id).await.ok_or_else(ApiError::no_plan)
    }
}

/// A session state snapshot with the session id echoed back.
type StateReply = ([(&'static str, String); 1], Json<AgentState>);

fn reply(session: String, state: &AgentState) -> StateReply {
    ([(SESSION_HEADER, session)], Json(state.clone()))
}

/// Start the HTTP server.
pub async fn serve(config: Config) -> anyhow::Result<()> {
    let gateway = ProviderGateway::new(&config.llm)?;
    let addr = format!("{}:{}", config.host, config.port);
    let state = Arc::new(AppState::new(config, Arc::new(gateway)));

    let app = router(Arc::clone(&state));

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(
        "Server listening on {} (default provider: {}, up to {} sessions)",
        addr,
        state.config.default_provider,
        state.sessions.max_sessions()
    );

    let shutdown_state = Arc::clone(&state);
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal(shutdown_state).await;
        })
        .await?;

    Ok(())
}

/// Build the application router.
pub fn router(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .route("/api/health", get(health))
        .route("/api/state", get(get_state))
        .route("/api/plan", post(plan))
        .route("/api/execute", post(execute_all))
        .route("/api/execute_task", post(execute_task))
        .route("/api/regenerate_task", post(regenerate_task))
        .route("/api/update_task", post(update_task))
        .route("/api/cancel_task", post(cancel_task));

    let static_dir = &state.config.static_dir;
    let app = if static_dir.is_dir() {
        api.route_service("/", ServeFile::new(static_dir.join("index.html")))
            .nest_service("/static", ServeDir::new(static_dir))
    } else {
        tracing::warn!(
            "Static directory {} not found; serving the API only",
            static_dir.display()
        );
        api
    };

    app.layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Wait for SIGTERM/SIGINT.
async fn shutdown_signal(state: Arc<AppState>) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    let used = state.agent.gateway().quota().map(|q| q.used()).unwrap_or(0);
    tracing::info!(
        "Shutdown signal received; dropping {} session(s), {} metered call(s) used",
        state.sessions.len().await,
        used
    );
}

/// Health check endpoint.
async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let quota = state.agent.gateway().quota();
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        default_provider: state.config.default_provider,
        llm_calls_used: quota.map(|q| q.used()).unwrap_or(0),
        llm_calls_limit: quota.map(|q| q.limit()),
    })
}

/// Current state of the caller's session.
async fn get_state(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<StateReply, ApiError> {
    let id = session_id(&headers);
    let shared = state.session(&id).await?;
    let current = shared.lock().await;
    Ok(reply(id, &current))
}

/// Plan a goal, replacing the session's state. Auto mode also runs the plan.
async fn plan(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<PlanRequest>,
) -> Result<StateReply, ApiError> {
    if req.goal.trim().is_empty() {
        return Err(ApiError::bad_request("Goal cannot be empty."));
    }

    let id = session_id(&headers);
    let provider = req.provider.unwrap_or(state.config.default_provider);
    tracing::info!(
        "Session '{}': planning with {} in {:?} mode",
        id,
        provider,
        req.mode
    );

    let planned = state
        .agent
        .start(&req.goal, req.mode, provider)
        .await
        .map_err(log_failure)?;

    let shared = state.sessions.replace(&id, planned).await;
    let current = shared.lock().await;
    Ok(reply(id, &current))
}

/// Execute every pending task of the session's plan.
async fn execute_all(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<StateReply, ApiError> {
    let id = session_id(&headers);
    let shared = state.session(&id).await?;
    let mut current = shared.lock().await;

    state
        .agent
        .run_all(&mut current)
        .await
        .map_err(log_failure)?;
    Ok(reply(id, &current))
}

/// Execute a single pending task.
async fn execute_task(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<TaskIdRequest>,
) -> Result<StateReply, ApiError> {
    let id = session_id(&headers);
    let shared = state.session(&id).await?;
    let mut current = shared.lock().await;

    if current.tasks().is_empty() {
        return Err(ApiError::bad_request("No tasks in current plan."));
    }
    current.task(req.task_id)?.ensure_pending("executed")?;

    state
        .agent
        .execute(&mut current, req.task_id)
        .await
        .map_err(log_failure)?;
    Ok(reply(id, &current))
}

/// Rewrite a task's title and description with the model.
async fn regenerate_task(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<TaskIdRequest>,
) -> Result<StateReply, ApiError> {
    let id = session_id(&headers);
    let shared = state.session(&id).await?;
    let mut current = shared.lock().await;

    state
        .agent
        .regenerate(&mut current, req.task_id)
        .await
        .map_err(log_failure)?;
    Ok(reply(id, &current))
}

/// Edit a task's wording without calling the model.
async fn update_task(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<UpdateTaskRequest>,
) -> Result<StateReply, ApiError> {
    let id = session_id(&headers);
    let shared = state.session(&id).await?;
    let mut current = shared.lock().await;

    current
        .task_mut(req.task_id)?
        .update_fields(req.title.trim(), req.description.trim())?;
    Ok(reply(id, &current))
}

/// Cancel a pending task so it is never executed.
async fn cancel_task(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<TaskIdRequest>,
) -> Result<StateReply, ApiError> {
    let id = session_id(&headers);
    let shared = state.session(&id).await?;
    let mut current = shared.lock().await;

    current.cancel(req.task_id)?;
    Ok(reply(id, &current))
}

fn log_failure(e: crate::agents::AgentError) -> ApiError {
    let err = ApiError::from(e);
    if err.status.is_server_error() {
        tracing::error!("Request failed: {}", err.detail);
    } else {
        tracing::warn!("Request rejected ({}): {}", err.status, err.detail);
    }
    err
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::testing::ScriptedGateway;
    use crate::llm::{LlmError, MockClient, Provider};
    use crate::task::{Mode, TaskId, TaskStatus};
    use axum::http::StatusCode;

    fn app_with(llm: ScriptedGateway) -> Arc<AppState> {
        Arc::new(AppState::new(Config::new(Provider::Mock), Arc::new(llm)))
    }

    fn mock_app() -> Arc<AppState> {
        app_with(ScriptedGateway::with_client(MockClient::new()))
    }

    fn session(id: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(SESSION_HEADER, id.parse().unwrap());
        headers
    }

    fn plan_request(goal: &str, mode: Mode) -> Json<PlanRequest> {
        Json(PlanRequest {
            goal: goal.to_string(),
            mode,
            provider: None,
        })
    }

    fn task_request(id: u32) -> Json<TaskIdRequest> {
        Json(TaskIdRequest {
            task_id: TaskId::new(id),
        })
    }

    fn body(reply: StateReply) -> AgentState {
        reply.1 .0
    }

    #[tokio::test]
    async fn health_reports_default_provider() {
        let Json(resp) = health(State(mock_app())).await;
        assert_eq!(resp.status, "ok");
        assert_eq!(resp.default_provider, Provider::Mock);
        assert_eq!(resp.llm_calls_used, 0);
        assert!(resp.llm_calls_limit.is_none());
    }

    #[tokio::test]
    async fn state_before_plan_is_rejected() {
        let err = get_state(State(mock_app()), HeaderMap::new())
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.detail, "No plan found. Call /api/plan first.");
    }

    #[tokio::test]
    async fn blank_goal_is_rejected_without_a_call() {
        let app = app_with(ScriptedGateway::new(Vec::<&str>::new()));
        let err = plan(State(app), HeaderMap::new(), plan_request("  ", Mode::Confirm))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.detail, "Goal cannot be empty.");
    }

    #[tokio::test]
    async fn plan_then_execute_one_task() {
        let app = mock_app();
        let planned = plan(
            State(Arc::clone(&app)),
            session("s1"),
            plan_request("Write a blog post", Mode::Confirm),
        )
        .await
        .unwrap();
        assert_eq!(planned.0[0].1, "s1");
        assert_eq!(body(planned).count(TaskStatus::Pending), 3);

        let executed = execute_task(State(Arc::clone(&app)), session("s1"), task_request(1))
            .await
            .unwrap();
        let executed = body(executed);
        assert_eq!(executed.tasks()[0].status(), TaskStatus::Done);
        assert_eq!(executed.history().len(), 1);

        let err = execute_task(State(Arc::clone(&app)), session("s1"), task_request(1))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.detail, "Only pending tasks can be executed.");

        let err = execute_task(State(app), session("s1"), task_request(9))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn sessions_are_isolated() {
        let app = mock_app();
        plan(
            State(Arc::clone(&app)),
            session("a"),
            plan_request("Goal A", Mode::Confirm),
        )
        .await
        .unwrap();

        let err = get_state(State(Arc::clone(&app)), session("b"))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);

        let a = body(get_state(State(app), session("a")).await.unwrap());
        assert_eq!(a.goal(), "Goal A");
    }

    #[tokio::test]
    async fn oldest_session_is_evicted_at_capacity() {
        let mut config = Config::new(Provider::Mock);
        config.max_sessions = 2;
        let app = Arc::new(AppState::new(
            config,
            Arc::new(ScriptedGateway::with_client(MockClient::new())),
        ));

        for id in ["one", "two", "three"] {
            plan(
                State(Arc::clone(&app)),
                session(id),
                plan_request("Some goal", Mode::Confirm),
            )
            .await
            .unwrap();
        }

        assert_eq!(app.sessions.len().await, 2);
        let err = get_state(State(Arc::clone(&app)), session("one"))
            .await
            .unwrap_err();
        assert_eq!(err.detail, "No plan found. Call /api/plan first.");
        assert!(get_state(State(app), session("three")).await.is_ok());
    }

    #[tokio::test]
    async fn auto_mode_plan_returns_finished_state() {
        let app = mock_app();
        let state = body(
            plan(State(app), HeaderMap::new(), plan_request("Tidy the garage", Mode::Auto))
                .await
                .unwrap(),
        );
        assert!(state.is_finished());
        assert_eq!(state.history().len(), 3);
    }

    #[tokio::test]
    async fn cancel_update_and_execute_all() {
        let app = mock_app();
        plan(
            State(Arc::clone(&app)),
            HeaderMap::new(),
            plan_request("Move house", Mode::Confirm),
        )
        .await
        .unwrap();

        cancel_task(State(Arc::clone(&app)), HeaderMap::new(), task_request(2))
            .await
            .unwrap();
        let err = cancel_task(State(Arc::clone(&app)), HeaderMap::new(), task_request(2))
            .await
            .unwrap_err();
        assert_eq!(err.detail, "Only pending tasks can be cancelled.");

        let updated = body(
            update_task(
                State(Arc::clone(&app)),
                HeaderMap::new(),
                Json(UpdateTaskRequest {
                    task_id: TaskId::new(3),
                    title: " Book movers ".to_string(),
                    description: "Get three quotes".to_string(),
                }),
            )
            .await
            .unwrap(),
        );
        assert_eq!(updated.tasks()[2].title(), "Book movers");

        let err = update_task(
            State(Arc::clone(&app)),
            HeaderMap::new(),
            Json(UpdateTaskRequest {
                task_id: TaskId::new(3),
                title: "  ".to_string(),
                description: String::new(),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);

        let done = body(
            execute_all(State(app), HeaderMap::new())
                .await
                .unwrap(),
        );
        assert_eq!(done.tasks()[1].status(), TaskStatus::Cancelled);
        assert_eq!(done.count(TaskStatus::Done), 2);
        assert!(done.is_finished());
    }

    #[tokio::test]
    async fn regenerate_failure_is_server_error() {
        let app = app_with(ScriptedGateway::new([
            r#"{"tasks":[{"title":"Draft","description":"d"}]}"#,
            "no json here",
        ]));
        plan(
            State(Arc::clone(&app)),
            HeaderMap::new(),
            plan_request("Write", Mode::Confirm),
        )
        .await
        .unwrap();

        let err = regenerate_task(State(Arc::clone(&app)), HeaderMap::new(), task_request(1))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);

        let state = body(get_state(State(app), HeaderMap::new()).await.unwrap());
        assert_eq!(state.tasks()[0].title(), "Draft");
    }

    #[tokio::test]
    async fn quota_exhaustion_maps_to_429() {
        let app = app_with(ScriptedGateway::from_results([Err(
            LlmError::quota_exceeded(1000),
        )]));
        let err = plan(State(app), HeaderMap::new(), plan_request("Anything", Mode::Confirm))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(
            err.detail,
            "Demo LLM usage limit reached (1000 calls). Please try again later."
        );
    }
}
