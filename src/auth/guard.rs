use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{MatchedPath, Request, State},
    http::{header::AUTHORIZATION, Method},
    middleware::Next,
    response::Response,
};
use tracing::{debug, warn};

use super::{
    claims::{Principal, Role},
    strategy::{Authenticator, Credentials},
};
use crate::error::AppError;

/// Roles allowed on one route. An empty `roles` slice means any
/// authenticated caller.
#[derive(Debug, Clone)]
pub struct RouteRule {
    pub method: Method,
    pub path: &'static str,
    pub roles: &'static [Role],
}

impl RouteRule {
    pub fn new(method: Method, path: &'static str, roles: &'static [Role]) -> Self {
        Self { method, path, roles }
    }
}

#[derive(Debug, Default)]
pub struct RoutePolicy {
    rules: HashMap<&'static str, HashMap<Method, &'static [Role]>>,
}

impl RoutePolicy {
    pub fn from_rules(rules: impl IntoIterator<Item = RouteRule>) -> Self {
        let mut map: HashMap<&'static str, HashMap<Method, &'static [Role]>> = HashMap::new();
        for r in rules {
            map.entry(r.path).or_default().insert(r.method, r.roles);
        }
        Self { rules: map }
    }

    pub fn required_roles(&self, method: &Method, path: &str) -> Option<&'static [Role]> {
        self.rules.get(path)?.get(method).copied()
    }
}

/// Decides whether `principal` may use a route requiring `required`.
pub fn check_roles(principal: Option<&Principal>, required: &[Role]) -> Result<(), AppError> {
    if required.is_empty() {
        return Ok(());
    }
    let Some(principal) = principal else {
        return Err(AppError::forbidden());
    };
    if required.contains(&principal.role) {
        Ok(())
    } else {
        Err(AppError::forbidden())
    }
}

#[derive(Clone)]
pub struct GuardState {
    pub auth: Authenticator,
    pub policy: Arc<RoutePolicy>,
}

pub fn bearer_token(req: &Request) -> Option<&str> {
    let header = req.headers().get(AUTHORIZATION)?.to_str().ok()?;
    header
        .strip_prefix("Bearer ")
        .or_else(|| header.strip_prefix("bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Token validation followed by the role check, in that order, for every
/// protected route. On success the [`Principal`] is stored in the request
/// extensions.
pub async fn authorize(
    State(guard): State<GuardState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let Some(token) = bearer_token(&req).map(str::to_owned) else {
        warn!(uri = %req.uri(), "missing bearer token");
        return Err(AppError::Unauthorized("Unauthorized".into()));
    };
    let principal = guard.auth.authenticate(Credentials::Bearer(token)).await?;

    let path = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_owned())
        .unwrap_or_else(|| req.uri().path().to_owned());
    let Some(required) = guard.policy.required_roles(req.method(), &path) else {
        warn!(method = %req.method(), %path, "route has no policy entry");
        return Err(AppError::forbidden());
    };

    if let Err(e) = check_roles(Some(&principal), required) {
        warn!(user_id = principal.id, role = ?principal.role, %path, "role check failed");
        return Err(e);
    }

    debug!(user_id = principal.id, %path, "request authorized");
    req.extensions_mut().insert(principal);
    Ok(next.run(req).await)
}
