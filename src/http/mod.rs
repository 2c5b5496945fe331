pub mod client;
pub mod request;
pub mod response;

pub use client::HttpClient;
pub use request::HttpRequest;
pub use response::HttpResponse;

/// Sends one (possibly mutated) request and returns the response.
///
/// The engine is written against this seam so the detection logic can be
/// exercised with scripted responses; the production implementation is
/// [`HttpClient`]. Implementations must not follow redirects.
#[allow(async_fn_in_trait)]
pub trait Transport {
    async fn send(&self, request: &HttpRequest) -> anyhow::Result<HttpResponse>;
}
