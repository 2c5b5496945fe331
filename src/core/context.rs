//! Global context shared by every parameter scan

use url::Url;

use crate::core::cancel::CancelFlag;
use crate::core::kb::KnowledgeBase;
use crate::core::policy::BudgetPolicy;
use crate::core::tech::TechSet;
use crate::sqli::dialects::DialectCatalog;

/// Known login page URLs, used to raise an additional authentication bypass
/// finding when an injectable parameter lives on one of them.
#[derive(Debug, Default)]
pub struct AuthRegistry {
    login_urls: Vec<Url>,
}

impl AuthRegistry {
    pub fn new(login_urls: Vec<Url>) -> Self {
        Self { login_urls }
    }

    /// Matches on scheme, host, port and path. Method, query parameters and
    /// fragments may legitimately differ between the login page and the
    /// request under test.
    pub fn is_login_url(&self, url: &Url) -> bool {
        self.login_urls.iter().any(|login| {
            login.scheme() == url.scheme()
                && login.host_str() == url.host_str()
                && login.port_or_known_default() == url.port_or_known_default()
                && login.path() == url.path()
        })
    }
}

/// Everything a parameter scan needs besides the transport: the budget
/// policy, the technology scope, the compiled fingerprint catalog, the
/// shared knowledge base, the cancellation flag, and the login registry.
pub struct ScanContext {
    pub policy: BudgetPolicy,
    pub techs: TechSet,
    pub catalog: DialectCatalog,
    pub kb: KnowledgeBase,
    pub cancel: CancelFlag,
    pub auth: AuthRegistry,
}
