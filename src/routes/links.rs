// ABOUTME: Absolute URL construction for hyperlinks in API responses
// ABOUTME: Combines the request host, script prefix, and media prefix into client-facing links
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Coderr

use http::header::HOST;
use http::{HeaderMap, Uri};
use url::Url;

use crate::config::ServerConfig;
use crate::errors::{AppError, AppResult};

/// Scheme used for generated links
const SCHEME: &str = "http";

/// Host used when the request carries none (only reachable in tests)
const FALLBACK_HOST: &str = "localhost";

/// Builds absolute links relative to the current request
#[derive(Debug, Clone)]
pub struct Links {
    origin: String,
    script_name: String,
    media_url: String,
}

impl Links {
    /// Links for a request with `headers`
    #[must_use]
    pub fn for_request(config: &ServerConfig, headers: &HeaderMap) -> Self {
        let host = headers
            .get(HOST)
            .and_then(|h| h.to_str().ok())
            .filter(|h| !h.is_empty())
            .unwrap_or(FALLBACK_HOST);
        Self {
            origin: format!("{SCHEME}://{host}"),
            script_name: config.urls.force_script_name.clone(),
            media_url: config.urls.media_url.clone(),
        }
    }

    /// Absolute URL of an application path such as `/api/offers/`
    #[must_use]
    pub fn absolute(&self, path: &str) -> String {
        format!("{}{}{path}", self.origin, self.script_name)
    }

    /// Hyperlink to a package
    #[must_use]
    pub fn offer_detail(&self, detail_id: i64) -> String {
        self.absolute(&format!("/api/offerdetails/{detail_id}/"))
    }

    /// Absolute URL of a stored media path; absolute URLs pass through
    #[must_use]
    pub fn media(&self, stored: &str) -> String {
        if stored.starts_with("http://") || stored.starts_with("https://") {
            return stored.to_owned();
        }
        let relative = stored.trim_start_matches('/');
        if self.media_url.starts_with("http://") || self.media_url.starts_with("https://") {
            format!("{}{relative}", self.media_url)
        } else {
            self.absolute(&format!("{}{relative}", self.media_url))
        }
    }

    /// Optional media field rendering; empty paths render as `null`
    #[must_use]
    pub fn media_opt(&self, stored: Option<&str>) -> Option<String> {
        stored.filter(|s| !s.is_empty()).map(|s| self.media(s))
    }

    /// Absolute URL of the current request in canonical trailing-slash form
    ///
    /// # Errors
    ///
    /// Returns an internal error if the host header produces an unparseable URL
    pub fn request_url(&self, uri: &Uri) -> AppResult<Url> {
        let path = uri.path();
        let path = if path.ends_with('/') {
            path.to_owned()
        } else {
            format!("{path}/")
        };
        let mut raw = self.absolute(&path);
        if let Some(query) = uri.query() {
            raw.push('?');
            raw.push_str(query);
        }
        Url::parse(&raw).map_err(|e| AppError::internal(format!("Invalid request URL {raw}: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;

    fn links(script_name: &str, media_url: &str) -> Links {
        let mut config = ServerConfig::for_testing();
        config.urls.force_script_name = script_name.to_owned();
        config.urls.media_url = media_url.to_owned();
        let mut headers = HeaderMap::new();
        headers.insert(HOST, HeaderValue::from_static("testserver"));
        Links::for_request(&config, &headers)
    }

    #[test]
    fn test_offer_detail_link() {
        assert_eq!(
            links("", "/media/").offer_detail(7),
            "http://testserver/api/offerdetails/7/"
        );
        assert_eq!(
            links("/coderr", "/media/").offer_detail(7),
            "http://testserver/coderr/api/offerdetails/7/"
        );
    }

    #[test]
    fn test_media_links() {
        let l = links("", "/media/");
        assert_eq!(l.media("profiles/a.png"), "http://testserver/media/profiles/a.png");
        assert_eq!(l.media("https://cdn.example/a.png"), "https://cdn.example/a.png");
        assert_eq!(l.media_opt(Some("")), None);
        assert_eq!(
            links("", "https://cdn.example/m/").media("a.png"),
            "https://cdn.example/m/a.png"
        );
    }

    #[test]
    fn test_request_url_gets_trailing_slash() {
        let uri: Uri = "/api/offers?page=2".parse().unwrap();
        let url = links("", "/media/").request_url(&uri).unwrap();
        assert_eq!(url.as_str(), "http://testserver/api/offers/?page=2");
    }
}
