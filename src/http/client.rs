//! HTTP client with scope enforcement, rate limiting, and cookie support

use anyhow::Result;
use reqwest::{header, redirect::Policy, Client};

use crate::core::rate_limit::RateLimiter;
use crate::core::scope::Scope;
use crate::http::request::HttpRequest;
use crate::http::response::HttpResponse;
use crate::http::Transport;

pub struct HttpClient {
    client: Client,
    scope: Scope,
    limiter: RateLimiter,
    cookies: Option<String>,
    default_headers: Vec<(String, String)>,
}

impl HttpClient {
    pub fn new(scope: Scope, limiter: RateLimiter) -> Result<Self> {
        Self::with_auth(scope, limiter, None, Vec::new())
    }

    /// Client carrying cookies and extra headers for authenticated scanning.
    pub fn with_auth(
        scope: Scope,
        limiter: RateLimiter,
        cookies: Option<String>,
        default_headers: Vec<(String, String)>,
    ) -> Result<Self> {
        // Redirects stay disabled: the oracles compare the immediate
        // response, and a redirect target may be out of scope.
        let client = Client::builder()
            .danger_accept_invalid_certs(true)
            .redirect(Policy::none())
            .build()?;

        Ok(Self {
            client,
            scope,
            limiter,
            cookies,
            default_headers,
        })
    }
}

impl Transport for HttpClient {
    async fn send(&self, req: &HttpRequest) -> Result<HttpResponse> {
        self.limiter.wait().await;

        if !self.scope.is_in_scope(&req.url) {
            anyhow::bail!("blocked out-of-scope request: {}", req.url);
        }

        let mut request = self.client.request(req.method.clone(), req.url.clone());

        for (key, value) in req.headers.iter().chain(self.default_headers.iter()) {
            if let (Ok(name), Ok(value)) = (
                header::HeaderName::from_bytes(key.as_bytes()),
                header::HeaderValue::from_str(value),
            ) {
                request = request.header(name, value);
            }
        }

        if let Some(ref cookies) = self.cookies {
            request = request.header(header::COOKIE, cookies);
        }

        if let Some(ref body) = req.body {
            request = request.body(body.clone());
        }

        let response = request.send().await?;
        let status = response.status().as_u16();
        let body = response.bytes().await.unwrap_or_default();

        Ok(HttpResponse::new(status, body.to_vec()))
    }
}
