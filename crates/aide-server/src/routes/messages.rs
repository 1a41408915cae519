use crate::activity::{Activity, ExpectedReplies};
use crate::state::AppState;
use aide::agent::{Agent, Reply, FALLBACK_MESSAGE};
use aide::graph::GraphAdapter;
use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    routing::post,
    Json, Router,
};

/// The SSO token the channel forwards with the activity
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = value
        .strip_prefix("Bearer ")
        .or_else(|| value.strip_prefix("bearer "))?
        .trim();
    (!token.is_empty()).then_some(token)
}

fn fallback(activity: &Activity) -> Json<ExpectedReplies> {
    Json(ExpectedReplies::single(
        activity.reply_with(Reply::Text(FALLBACK_MESSAGE.to_string())),
    ))
}

async fn handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(activity): Json<Activity>,
) -> Result<Json<ExpectedReplies>, StatusCode> {
    if !activity.is_message() {
        tracing::debug!(activity_type = %activity.activity_type, "ignoring activity");
        return Ok(Json(ExpectedReplies::default()));
    }

    let sso_token = bearer_token(&headers).ok_or(StatusCode::UNAUTHORIZED)?;

    let credential = match state.credentials.exchange(sso_token).await {
        Ok(credential) => credential,
        Err(e) => {
            tracing::warn!(error = %e, "on-behalf-of exchange failed");
            return Ok(fallback(&activity));
        }
    };

    let adapter =
        match GraphAdapter::connect(&state.graph.endpoint, credential, state.graph.time_zone.as_str())
        {
            Ok(adapter) => adapter,
            Err(e) => {
                tracing::error!(error = %e, "could not create the graph client");
                return Ok(fallback(&activity));
            }
        };

    let agent = Agent::new(state.provider.clone()).with_max_function_calls(state.max_function_calls);
    let turn = agent.reply(&adapter, &activity.user_text()).await;
    tracing::info!(
        outcome = ?turn.outcome,
        function_calls = turn.function_calls,
        "turn finished"
    );

    Ok(Json(ExpectedReplies::single(
        activity.reply_with(turn.reply()),
    )))
}

// Configure routes for this module
pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/api/messages", post(handler))
        .with_state(state)
}
