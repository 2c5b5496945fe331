use reqwest::Method;
use url::Url;

#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: Url,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl HttpRequest {
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn get(url: Url) -> Self {
        Self::new(Method::GET, url)
    }

    /// The logical (decoded) value of a query parameter.
    pub fn param_value(&self, name: &str) -> Option<String> {
        self.url
            .query_pairs()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.into_owned())
    }

    /// Returns a request identical to this one except that the named query
    /// parameter carries `value`. The parameter is appended if it was not
    /// present. Encoding is handled here; callers only ever deal in logical
    /// values.
    pub fn with_param(&self, name: &str, value: &str) -> HttpRequest {
        let mut pairs: Vec<(String, String)> = self
            .url
            .query_pairs()
            .map(|(k, v)| {
                if k == name {
                    (k.into_owned(), value.to_string())
                } else {
                    (k.into_owned(), v.into_owned())
                }
            })
            .collect();
        if !pairs.iter().any(|(k, _)| k == name) {
            pairs.push((name.to_string(), value.to_string()));
        }

        let mut url = self.url.clone();
        url.query_pairs_mut().clear();
        for (k, v) in &pairs {
            url.query_pairs_mut().append_pair(k, v);
        }

        HttpRequest {
            method: self.method.clone(),
            url,
            headers: self.headers.clone(),
            body: self.body.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_param_replaces_only_the_named_parameter() {
        let req = HttpRequest::get(Url::parse("http://example.com/s?id=5&page=2").unwrap());
        let mutated = req.with_param("id", "5' OR '1'='1");
        assert_eq!(mutated.param_value("id").as_deref(), Some("5' OR '1'='1"));
        assert_eq!(mutated.param_value("page").as_deref(), Some("2"));
        // the original request is untouched
        assert_eq!(req.param_value("id").as_deref(), Some("5"));
    }

    #[test]
    fn with_param_appends_a_missing_parameter() {
        let req = HttpRequest::get(Url::parse("http://example.com/s").unwrap());
        let mutated = req.with_param("q", "x y");
        assert_eq!(mutated.param_value("q").as_deref(), Some("x y"));
    }
}
