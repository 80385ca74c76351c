use std::sync::Arc;

use {
    serde::{Deserialize, de::DeserializeOwned},
    serde_json::{Value, json},
    tracing::{debug, warn},
    tradepost_protocol::{
        Event, Identity, Product, RequestFrame, ResponseFrame, Route, RouteError,
    },
};

use crate::{ConnId, auth, broadcast, state::GatewayState};

// ── Dispatch ─────────────────────────────────────────────────────────────────

/// What a dispatched request produces for the originating connection.
#[derive(Debug)]
pub enum Outcome {
    /// A direct reply to the caller.
    Reply(ResponseFrame),
    /// Fire-and-forget: the broadcast was the observable effect.
    Silent,
}

/// Resolve, authorize, and run one decoded request.
///
/// Authorization runs before the handler, so a denied request mutates
/// nothing. Unknown (route, method) pairs are answered 404; handler errors
/// are answered with their mapped status. Fire-and-forget routes reply only
/// on failure.
pub async fn dispatch(state: &Arc<GatewayState>, conn_id: ConnId, frame: RequestFrame) -> Outcome {
    let Some(route) = Route::resolve(&frame.route, &frame.method) else {
        warn!(route = %frame.route, method = %frame.method, %conn_id, "unknown route");
        return Outcome::Reply(RouteError::NotFound.into());
    };

    if let Err(err) = auth::authorize(route.policy(), frame.user.as_ref()) {
        warn!(?route, %conn_id, status = err.status(), "auth denied");
        return Outcome::Reply(err.into());
    }

    debug!(?route, %conn_id, "dispatching");
    let result = match route {
        Route::Register => register(state, frame.body).await,
        Route::Login => login(state, frame.body).await,
        Route::ListProducts => list_products(state).await,
        Route::AddProduct => add_product(state, frame.body).await,
        Route::PostChat => post_chat(state, frame.user, frame.body).await,
        Route::ConnectionCount => connection_count(state).await,
        Route::ViewProduct => view_product(state, conn_id, frame.body).await,
    };

    match result {
        Ok(outcome) => outcome,
        Err(err) => {
            warn!(?route, %conn_id, status = err.status(), error = %err, "route error");
            Outcome::Reply(err.into())
        },
    }
}

// ── Typed bodies ─────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct CredentialsBody {
    email: String,
    password: String,
}

#[derive(Debug, Deserialize)]
struct ChatBody {
    message: String,
}

#[derive(Debug, Deserialize)]
struct ViewBody {
    #[serde(rename = "productId")]
    product_id: u64,
}

/// Decode the optional body into the route's expected shape. A missing or
/// mistyped body is a recoverable 400, like any other malformed input.
fn parse_body<T: DeserializeOwned>(body: Option<Value>) -> Result<T, RouteError> {
    let body = body.ok_or_else(|| RouteError::Protocol("Invalid body".into()))?;
    serde_json::from_value(body).map_err(|_| RouteError::Protocol("Invalid body".into()))
}

// ── Handlers ─────────────────────────────────────────────────────────────────

async fn register(state: &Arc<GatewayState>, body: Option<Value>) -> Result<Outcome, RouteError> {
    let creds: CredentialsBody = parse_body(body)?;
    // Role comes from the reserved-email rule, never from the client.
    let role = auth::derive_role(&creds.email, &state.admin_email);

    let mut inner = state.write().await;
    inner
        .store
        .create_user(&creds.email, &creds.password, role)
        .map_err(|e| RouteError::Conflict(e.to_string()))?;

    Ok(Outcome::Reply(ResponseFrame::ok(json!({
        "message": "User registered",
        "role": role.as_str(),
    }))))
}

async fn login(state: &Arc<GatewayState>, body: Option<Value>) -> Result<Outcome, RouteError> {
    let creds: CredentialsBody = parse_body(body)?;

    let inner = state.read().await;
    let user = inner
        .store
        .verify_credentials(&creds.email, &creds.password)
        .ok_or_else(|| RouteError::Auth("Invalid credentials".into()))?;

    Ok(Outcome::Reply(ResponseFrame::ok(json!({
        "message": format!("{} logged in", user.role.as_str()),
        "role": user.role.as_str(),
    }))))
}

async fn list_products(state: &Arc<GatewayState>) -> Result<Outcome, RouteError> {
    let inner = state.read().await;
    Ok(Outcome::Reply(ResponseFrame::ok(json!({
        "products": inner.store.list_products(),
    }))))
}

async fn add_product(state: &Arc<GatewayState>, body: Option<Value>) -> Result<Outcome, RouteError> {
    let product: Product = parse_body(body)?;

    let mut inner = state.write().await;
    inner.store.add_product(product);

    Ok(Outcome::Reply(ResponseFrame::ok(json!({
        "message": "Product added",
    }))))
}

async fn connection_count(state: &Arc<GatewayState>) -> Result<Outcome, RouteError> {
    let inner = state.read().await;
    Ok(Outcome::Reply(ResponseFrame::ok(json!({
        "connections": inner.clients.len(),
    }))))
}

async fn post_chat(
    state: &Arc<GatewayState>,
    user: Option<Identity>,
    body: Option<Value>,
) -> Result<Outcome, RouteError> {
    // authorize() already required an identity for this route.
    let user = user.ok_or_else(|| RouteError::Auth("Unauthorized".into()))?;
    let chat: ChatBody = parse_body(body)?;

    // Append and snapshot in one critical section so broadcast order
    // matches history order; send after the lock is dropped.
    let (event, recipients) = {
        let mut inner = state.write().await;
        let msg = inner.store.append_chat(&user, &chat.message);
        let event = Event::Chat {
            user: msg.user,
            message: msg.message,
            ts: msg.ts,
        };
        (event, inner.recipients_all())
    };
    broadcast::deliver(&recipients, &event);

    Ok(Outcome::Silent)
}

async fn view_product(
    state: &Arc<GatewayState>,
    conn_id: ConnId,
    body: Option<Value>,
) -> Result<Outcome, RouteError> {
    let view: ViewBody = parse_body(body)?;

    let (event, recipients) = {
        let mut inner = state.write().await;
        let count = inner.store.add_viewer(view.product_id, conn_id);
        let event = Event::ProductViewCount {
            product_id: view.product_id,
            count,
        };
        (event, inner.recipients_viewing(view.product_id))
    };
    broadcast::deliver(&recipients, &event);

    Ok(Outcome::Silent)
}
