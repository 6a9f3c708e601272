//! Axum authorization middleware that enforces checker decisions on requests.
//!
//! An upstream identity layer verifies credentials and inserts an
//! [`AuthSubject`] into the request extensions. These layers read it, ask the
//! [`Checker`], and either forward the request or answer 401/403. Denial
//! bodies only ever carry the sanitized message.

use axum::{
    body::Body,
    extract::{FromRequestParts, Request},
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use futures::future::BoxFuture;
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::{Layer, Service};
use tracing::warn_span;

use super::checker::Checker;
use super::error::DenyError;
use super::models::{Action, AuthSubject, AuthType, Resource, Role};
use crate::error::GatekeeperError;

// ═══════════════════════════════════════════════════════════════════════════════
// RBAC Context (extracted in handlers)
// ═══════════════════════════════════════════════════════════════════════════════

/// What the middleware verified, for downstream handlers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RbacContext {
    pub auth_type: AuthType,
    /// The (resource, action) pair that was authorized, if any.
    pub checked_access: Option<(Resource, Action)>,
    /// The minimum role that was required, if any.
    pub checked_role: Option<Role>,
}

/// Axum extractor for `RbacContext`.
#[axum::async_trait]
impl<S> FromRequestParts<S> for RbacContext
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<RbacContext>()
            .cloned()
            .ok_or_else(|| {
                let body = serde_json::json!({
                    "success": false,
                    "error": {
                        "code": "MISSING_RBAC_CONTEXT",
                        "message": "Authorization context not available. Ensure RBAC middleware is applied.",
                    }
                });
                (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
            })
    }
}

/// Which check a layer performs.
#[derive(Debug, Clone)]
enum Requirement {
    Access { resource: Resource, action: Action },
    Role(Role),
}

impl Requirement {
    fn check(&self, checker: &Checker, subject: Option<&AuthSubject>) -> Result<(), DenyError> {
        match self {
            Self::Access { resource, action } => checker.authorize(subject, resource, action),
            Self::Role(min_role) => checker.require_role(subject, min_role),
        }
    }

    fn context(&self, auth_type: AuthType) -> RbacContext {
        match self {
            Self::Access { resource, action } => RbacContext {
                auth_type,
                checked_access: Some((resource.clone(), action.clone())),
                checked_role: None,
            },
            Self::Role(role) => RbacContext {
                auth_type,
                checked_access: None,
                checked_role: Some(role.clone()),
            },
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tower Layers
// ═══════════════════════════════════════════════════════════════════════════════

/// Layer requiring `authorize(subject, resource, action)` to succeed.
///
/// # Example
///
/// ```rust,ignore
/// use gatekeeper_core::rbac::{Checker, Preset, RequireAccessLayer};
///
/// let checker = Arc::new(Preset::FileManagement.checker());
///
/// let app = Router::new()
///     .route("/files/:id", delete(delete_file))
///     .layer(RequireAccessLayer::new(checker.clone(), "file", "delete"));
/// ```
#[derive(Clone)]
pub struct RequireAccessLayer {
    checker: Arc<Checker>,
    requirement: Requirement,
}

impl RequireAccessLayer {
    pub fn new(
        checker: Arc<Checker>,
        resource: impl Into<Resource>,
        action: impl Into<Action>,
    ) -> Self {
        Self {
            checker,
            requirement: Requirement::Access {
                resource: resource.into(),
                action: action.into(),
            },
        }
    }
}

impl<S> Layer<S> for RequireAccessLayer {
    type Service = RbacService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RbacService {
            inner,
            checker: self.checker.clone(),
            requirement: self.requirement.clone(),
        }
    }
}

/// Layer requiring a JWT subject at or above `min_role`.
#[derive(Clone)]
pub struct RequireRoleLayer {
    checker: Arc<Checker>,
    requirement: Requirement,
}

impl RequireRoleLayer {
    pub fn new(checker: Arc<Checker>, min_role: impl Into<Role>) -> Self {
        Self {
            checker,
            requirement: Requirement::Role(min_role.into()),
        }
    }
}

impl<S> Layer<S> for RequireRoleLayer {
    type Service = RbacService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RbacService {
            inner,
            checker: self.checker.clone(),
            requirement: self.requirement.clone(),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tower Service
// ═══════════════════════════════════════════════════════════════════════════════

/// Service that enforces one requirement per request.
#[derive(Clone)]
pub struct RbacService<S> {
    inner: S,
    checker: Arc<Checker>,
    requirement: Requirement,
}

impl<S> Service<Request<Body>> for RbacService<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut request: Request<Body>) -> Self::Future {
        let checker = self.checker.clone();
        let requirement = self.requirement.clone();
        let mut inner = self.inner.clone();

        Box::pin(async move {
            let subject = request.extensions().get::<AuthSubject>().cloned();

            if let Err(denial) = requirement.check(&checker, subject.as_ref()) {
                let span = warn_span!(
                    "rbac",
                    method = %request.method(),
                    path = %request.uri().path()
                );
                return Ok(span.in_scope(|| GatekeeperError::from(denial).into_response()));
            }

            // A successful check implies a subject was present.
            if let Some(subject) = subject {
                request
                    .extensions_mut()
                    .insert(requirement.context(subject.auth_type()));
            }

            inner.call(request).await
        })
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rbac::models::PolicyConfig;
    use axum::{routing::get, Router};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tower::ServiceExt;
    use tracing_subscriber::layer::SubscriberExt;

    /// Counts `WARN` events seen by the subscriber.
    #[derive(Clone, Default)]
    struct WarnCounter(Arc<AtomicUsize>);

    impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for WarnCounter {
        fn on_event(
            &self,
            event: &tracing::Event<'_>,
            _ctx: tracing_subscriber::layer::Context<'_, S>,
        ) {
            if *event.metadata().level() == tracing::Level::WARN {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }
    }

    fn checker() -> Arc<Checker> {
        let config = PolicyConfig::builder()
            .role("admin", 2)
            .role("viewer", 1)
            .permissions(["read", "write"])
            .resources(["document"])
            .actions(["read", "write"])
            .grant("admin", "document", ["read", "write"])
            .grant("viewer", "document", ["read"])
            .map_permission("read", "read")
            .map_permission("write", "write")
            .api_key_scope(["document"]);
        Arc::new(Checker::new(config).unwrap())
    }

    async fn handler(ctx: RbacContext) -> String {
        format!("{:?}", ctx.auth_type)
    }

    fn request(subject: Option<AuthSubject>) -> Request<Body> {
        let mut request = Request::builder().uri("/doc").body(Body::empty()).unwrap();
        if let Some(subject) = subject {
            request.extensions_mut().insert(subject);
        }
        request
    }

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_access_granted_injects_context() {
        let app = Router::new()
            .route("/doc", get(handler))
            .layer(RequireAccessLayer::new(checker(), "document", "write"));

        let response = app
            .oneshot(request(Some(AuthSubject::jwt("admin"))))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "Jwt");
    }

    #[tokio::test]
    async fn test_access_denied_is_forbidden_and_sanitized() {
        let app = Router::new()
            .route("/doc", get(handler))
            .layer(RequireAccessLayer::new(checker(), "document", "write"));

        let response = app
            .oneshot(request(Some(AuthSubject::jwt("viewer"))))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let body = body_text(response).await;
        assert!(body.contains("FORBIDDEN"));
        assert!(!body.contains("viewer"));
        assert!(!body.contains("document"));
    }

    #[tokio::test]
    async fn test_denial_is_logged_once() {
        let counter = WarnCounter::default();
        let subscriber = tracing_subscriber::registry().with(counter.clone());
        let _guard = tracing::subscriber::set_default(subscriber);

        let app = Router::new()
            .route("/doc", get(handler))
            .layer(RequireAccessLayer::new(checker(), "document", "write"));

        let response = app
            .oneshot(request(Some(AuthSubject::jwt("viewer"))))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(counter.0.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_missing_subject_is_unauthorized() {
        let app = Router::new()
            .route("/doc", get(handler))
            .layer(RequireAccessLayer::new(checker(), "document", "read"));

        let response = app.oneshot(request(None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_api_key_subject() {
        let app = Router::new()
            .route("/doc", get(handler))
            .layer(RequireAccessLayer::new(checker(), "document", "read"));

        let response = app
            .oneshot(request(Some(AuthSubject::api_key(["read"]))))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "ApiKey");
    }

    #[tokio::test]
    async fn test_require_role_layer() {
        let app = Router::new()
            .route("/doc", get(handler))
            .layer(RequireRoleLayer::new(checker(), "admin"));

        let ok = app
            .clone()
            .oneshot(request(Some(AuthSubject::jwt("admin"))))
            .await
            .unwrap();
        assert_eq!(ok.status(), StatusCode::OK);

        let below = app
            .clone()
            .oneshot(request(Some(AuthSubject::jwt("viewer"))))
            .await
            .unwrap();
        assert_eq!(below.status(), StatusCode::FORBIDDEN);

        let key = app
            .oneshot(request(Some(AuthSubject::api_key(["read", "write"]))))
            .await
            .unwrap();
        assert_eq!(key.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_requirement_context() {
        let ctx = Requirement::Role(Role::new("admin")).context(AuthType::Jwt);
        assert_eq!(ctx.checked_role, Some(Role::new("admin")));
        assert!(ctx.checked_access.is_none());
    }
}
