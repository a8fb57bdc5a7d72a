/// Security headers middleware
///
/// Adds security-related HTTP headers to every response:
///
/// - `X-Content-Type-Options: nosniff`: no MIME sniffing
/// - `X-Frame-Options: DENY`: no framing (clickjacking)
/// - `Referrer-Policy: strict-origin-when-cross-origin`
/// - `Strict-Transport-Security`: production only, requires HTTPS
///
/// # Example
///
/// ```no_run
/// use axum::Router;
/// use cinevault_api::middleware::security::SecurityHeadersLayer;
///
/// let app: Router = Router::new().layer(SecurityHeadersLayer::new(true));
/// ```

use axum::{extract::Request, response::Response};
use std::task::{Context, Poll};
use tower::{Layer, Service};

/// Security headers middleware layer
#[derive(Clone)]
pub struct SecurityHeadersLayer {
    /// Whether to send HSTS (production with HTTPS only)
    enable_hsts: bool,
}

impl SecurityHeadersLayer {
    pub fn new(enable_hsts: bool) -> Self {
        Self { enable_hsts }
    }
}

impl<S> Layer<S> for SecurityHeadersLayer {
    type Service = SecurityHeadersMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        SecurityHeadersMiddleware {
            inner,
            enable_hsts: self.enable_hsts,
        }
    }
}

/// Security headers middleware service
#[derive(Clone)]
pub struct SecurityHeadersMiddleware<S> {
    inner: S,
    enable_hsts: bool,
}

impl<S> Service<Request> for SecurityHeadersMiddleware<S>
where
    S: Service<Request, Response = Response> + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request) -> Self::Future {
        let future = self.inner.call(request);
        let enable_hsts = self.enable_hsts;

        Box::pin(async move {
            let mut response = future.await?;
            let headers = response.headers_mut();

            headers.insert("X-Content-Type-Options", "nosniff".parse().unwrap());
            headers.insert("X-Frame-Options", "DENY".parse().unwrap());
            headers.insert(
                "Referrer-Policy",
                "strict-origin-when-cross-origin".parse().unwrap(),
            );

            if enable_hsts {
                headers.insert(
                    "Strict-Transport-Security",
                    "max-age=31536000; includeSubDomains".parse().unwrap(),
                );
            }

            Ok(response)
        })
    }
}
