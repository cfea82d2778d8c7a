use axum::{
    extract::{Request, State},
    http::Method,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::auth::Principal;
use crate::error::ApiError;
use crate::state::AppState;

/// What a route demands of the caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Access {
    Public,
    Authenticated,
    Authority(String),
}

/// Outcome of evaluating the policy for one request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    /// No principal on a protected route
    Unauthorized,
    /// Principal present but lacking the required authority
    Forbidden,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    /// `*`: exactly one segment
    Any,
    /// trailing `**`: zero or more segments
    Rest,
}

/// Route pattern such as `/api/products/*` or `/error/**`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    segments: Vec<Segment>,
}

fn split_path(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

impl PathPattern {
    pub fn parse(pattern: &str) -> Self {
        let segments = split_path(pattern)
            .map(|s| match s {
                "*" => Segment::Any,
                "**" => Segment::Rest,
                literal => Segment::Literal(literal.to_string()),
            })
            .collect();
        Self { segments }
    }

    pub fn matches(&self, path: &str) -> bool {
        let parts: Vec<&str> = split_path(path).collect();
        let mut i = 0;

        for segment in &self.segments {
            match segment {
                Segment::Rest => return true,
                Segment::Any => {
                    if i >= parts.len() {
                        return false;
                    }
                }
                Segment::Literal(literal) => {
                    if parts.get(i) != Some(&literal.as_str()) {
                        return false;
                    }
                }
            }
            i += 1;
        }

        i == parts.len()
    }
}

#[derive(Debug, Clone)]
struct Rule {
    method: Option<Method>,
    pattern: PathPattern,
    access: Access,
}

/// Ordered allow/deny table consulted after the authentication gate.
/// The first matching rule wins; unmatched requests fall back to `default`.
#[derive(Debug, Clone)]
pub struct AccessPolicy {
    rules: Vec<Rule>,
    default: Access,
}

impl AccessPolicy {
    pub fn new(default: Access) -> Self {
        Self { rules: Vec::new(), default }
    }

    pub fn rule(mut self, method: Option<Method>, pattern: &str, access: Access) -> Self {
        self.rules.push(Rule {
            method,
            pattern: PathPattern::parse(pattern),
            access,
        });
        self
    }

    pub fn permit(self, method: Option<Method>, pattern: &str) -> Self {
        self.rule(method, pattern, Access::Public)
    }

    pub fn require_authority(self, method: Method, pattern: &str, authority: &str) -> Self {
        self.rule(Some(method), pattern, Access::Authority(authority.to_string()))
    }

    /// Routing rules of the marketplace API.
    pub fn marketplace() -> Self {
        Self::new(Access::Authenticated)
            // CORS preflight never carries credentials
            .permit(Some(Method::OPTIONS), "/**")
            .permit(Some(Method::GET), "/")
            .permit(Some(Method::GET), "/health")
            .permit(Some(Method::POST), "/auth/register")
            .permit(Some(Method::POST), "/auth/login")
            .permit(None, "/error/**")
            .require_authority(Method::POST, "/api/categories", "ROLE_ADMIN")
            .require_authority(Method::DELETE, "/api/categories/*", "ROLE_ADMIN")
    }

    pub fn access_for(&self, method: &Method, path: &str) -> &Access {
        self.rules
            .iter()
            .find(|rule| {
                rule.method.as_ref().map_or(true, |m| m == method) && rule.pattern.matches(path)
            })
            .map(|rule| &rule.access)
            .unwrap_or(&self.default)
    }

    pub fn decide(&self, method: &Method, path: &str, principal: Option<&Principal>) -> Decision {
        match (self.access_for(method, path), principal) {
            (Access::Public, _) => Decision::Allow,
            (_, None) => Decision::Unauthorized,
            (Access::Authenticated, Some(_)) => Decision::Allow,
            (Access::Authority(authority), Some(principal)) => {
                if principal.has_authority(authority) {
                    Decision::Allow
                } else {
                    Decision::Forbidden
                }
            }
        }
    }
}

/// Authorization middleware. Runs after [`super::auth::authenticate`] and
/// rejects requests the policy does not allow before any handler runs.
pub async fn authorize(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let decision = state.policy.decide(
        request.method(),
        request.uri().path(),
        request.extensions().get::<Principal>(),
    );

    match decision {
        Decision::Allow => next.run(request).await,
        Decision::Unauthorized => {
            tracing::debug!("{} {} requires authentication", request.method(), request.uri().path());
            ApiError::unauthorized("Authentication required").into_response()
        }
        Decision::Forbidden => ApiError::forbidden("Access denied").into_response(),
    }
}
