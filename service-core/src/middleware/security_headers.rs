use axum::{extract::Request, http::header, middleware::Next, response::IntoResponse};

/// Page policy: same-origin assets plus the Razorpay checkout widget.
const PAGE_CSP: &str = "default-src 'self'; \
     script-src 'self' 'unsafe-inline' https://checkout.razorpay.com; \
     style-src 'self' 'unsafe-inline'; \
     img-src 'self' data:; \
     frame-src https://api.razorpay.com https://checkout.razorpay.com; \
     connect-src 'self' https://lumberjack.razorpay.com";

const API_CSP: &str = "default-src 'none'; frame-ancestors 'none'";

pub async fn security_headers_middleware(req: Request, next: Next) -> impl IntoResponse {
    let path = req.uri().path();
    let is_json_route = path.starts_with("/api/") || path.starts_with("/actions/");

    let mut response = next.run(req).await;
    let headers = response.headers_mut();

    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        header::HeaderValue::from_static("nosniff"),
    );
    headers.insert(
        header::STRICT_TRANSPORT_SECURITY,
        header::HeaderValue::from_static("max-age=31536000; includeSubDomains"),
    );
    headers.insert(
        header::REFERRER_POLICY,
        header::HeaderValue::from_static("strict-origin-when-cross-origin"),
    );
    headers.insert(
        header::X_FRAME_OPTIONS,
        header::HeaderValue::from_static("DENY"),
    );

    let csp = if is_json_route { API_CSP } else { PAGE_CSP };
    headers.insert(
        header::CONTENT_SECURITY_POLICY,
        header::HeaderValue::from_static(csp),
    );

    response
}
