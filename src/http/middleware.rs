//! Rewrite middleware.
//!
//! # Responsibilities
//! - Dispatch every request against the current rule snapshot
//! - Rewrite: replace the URI path and query, then call the inner service
//! - Redirect: answer directly with `Location`, inner service not called
//! - Pass: call the inner service with the request untouched
//!
//! # Design Decisions
//! - Must wrap the whole axum `Router` (not `Router::layer`) so the
//!   rewritten URI is what gets routed
//! - A target that is not a valid URI or header value is logged and the
//!   request passes through unchanged; requests never fail here

use std::sync::Arc;
use std::task::{Context, Poll};

use axum::http::{header, uri::PathAndQuery, HeaderValue, Request, Response, StatusCode, Uri};
use futures_util::future::{self, Either, Ready};
use tower::{Layer, Service};

use crate::observability::metrics;
use crate::rules::{dispatch, Outcome, RuleStore};

/// URI the request had before a rewrite, stored in request extensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewrittenFrom(pub Uri);

/// Layer applying rewrite rules from a shared store.
#[derive(Debug, Clone)]
pub struct RewriteLayer {
    store: Arc<RuleStore>,
}

impl RewriteLayer {
    pub fn new(store: Arc<RuleStore>) -> Self {
        Self { store }
    }
}

impl<S> Layer<S> for RewriteLayer {
    type Service = RewriteService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RewriteService {
            inner,
            store: self.store.clone(),
        }
    }
}

/// Service produced by [`RewriteLayer`].
#[derive(Debug, Clone)]
pub struct RewriteService<S> {
    inner: S,
    store: Arc<RuleStore>,
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for RewriteService<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>>,
    ResBody: Default,
{
    type Response = Response<ResBody>;
    type Error = S::Error;
    type Future = Either<Ready<Result<Self::Response, Self::Error>>, S::Future>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<ReqBody>) -> Self::Future {
        let rules = self.store.list();
        let outcome = dispatch(&rules, &req, self.store.logger());
        metrics::record_outcome(&outcome);

        match outcome {
            Outcome::Pass => {}
            Outcome::Rewrite { url } => match rewritten_uri(req.uri(), &url) {
                Ok(uri) => {
                    tracing::debug!(from = %req.uri(), to = %uri, "Request rewritten");
                    let original = std::mem::replace(req.uri_mut(), uri);
                    req.extensions_mut().insert(RewrittenFrom(original));
                }
                Err(e) => {
                    tracing::error!(target_url = %url, error = %e, "Rewrite target is not a valid URI, passing through");
                }
            },
            Outcome::Redirect { status, location } => match HeaderValue::from_str(&location) {
                Ok(value) => {
                    tracing::debug!(from = %req.uri(), location = %location, status = status.as_u16(), "Redirecting");
                    return Either::Left(future::ready(Ok(redirect_response(status, value))));
                }
                Err(e) => {
                    tracing::error!(location = %location, error = %e, "Redirect target is not a valid header value, passing through");
                }
            },
        }

        Either::Right(self.inner.call(req))
    }
}

/// Keep scheme and authority, replace path and query.
fn rewritten_uri(original: &Uri, target: &str) -> Result<Uri, axum::http::Error> {
    let path_and_query: PathAndQuery = target.parse()?;
    let mut parts = original.clone().into_parts();
    parts.path_and_query = Some(path_and_query);
    Ok(Uri::from_parts(parts)?)
}

fn redirect_response<B: Default>(status: StatusCode, location: HeaderValue) -> Response<B> {
    let mut response = Response::new(B::default());
    *response.status_mut() = status;
    response.headers_mut().insert(header::LOCATION, location);
    response
}
