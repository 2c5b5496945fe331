//! Scan scope enforcement: probes never leave the target host

use url::Url;

#[derive(Debug, Clone)]
pub struct Scope {
    host: String,
}

impl Scope {
    pub fn new(target: &Url) -> anyhow::Result<Self> {
        let host = target
            .host_str()
            .ok_or_else(|| anyhow::anyhow!("target URL has no host: {target}"))?;
        Ok(Self {
            host: host.to_string(),
        })
    }

    pub fn is_in_scope(&self, url: &Url) -> bool {
        url.host_str().is_some_and(|h| h == self.host)
    }
}
