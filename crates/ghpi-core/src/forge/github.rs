use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ghpi_schema::Digest;
use reqwest::header::{ACCEPT, HeaderMap, LINK, RETRY_AFTER};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use sha2::{Digest as _, Sha256};

use super::retry::RetryPolicy;
use super::traits::{Asset, Forge, Release};
use crate::error::ForgeError;
use crate::repo::Repository;

/// Public GitHub REST endpoint.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

const API_VERSION: &str = "2022-11-28";
const PER_PAGE: u32 = 100;

/// Build the HTTP client used for all forge traffic.
pub fn build_client(timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(crate::USER_AGENT)
        .timeout(timeout)
        .build()
}

#[derive(Debug, Deserialize)]
struct ReleasePayload {
    id: u64,
    tag_name: String,
    #[serde(default)]
    draft: bool,
    #[serde(default)]
    prerelease: bool,
}

#[derive(Debug, Deserialize)]
struct AssetPayload {
    name: String,
    browser_download_url: String,
    #[serde(default)]
    size: u64,
    #[serde(default)]
    updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    uploader: Option<UploaderPayload>,
    #[serde(default)]
    digest: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UploaderPayload {
    login: String,
}

/// [`Forge`] backed by the GitHub REST API (v3).
#[derive(Debug, Clone)]
pub struct GitHubForge {
    client: Client,
    api_url: String,
    token: Option<String>,
    retry: RetryPolicy,
}

impl GitHubForge {
    pub fn new(client: Client, token: Option<String>) -> Self {
        Self {
            client,
            api_url: DEFAULT_API_URL.to_string(),
            token,
            retry: RetryPolicy::default(),
        }
    }

    /// Point the adapter at another API root (GitHub Enterprise, test servers).
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    fn get(&self, url: &str) -> RequestBuilder {
        let req = self.client.get(url);
        match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    async fn fetch_page(
        &self,
        url: &str,
    ) -> Result<(Vec<serde_json::Value>, Option<String>), ForgeError> {
        tracing::debug!("GET {url}");
        let resp = self
            .get(url)
            .header(ACCEPT, "application/vnd.github+json")
            .header("X-GitHub-Api-Version", API_VERSION)
            .send()
            .await?;
        let resp = check_status(url, resp)?;
        let next = next_link(resp.headers());
        let body = resp.text().await?;
        let items = serde_json::from_str(&body).map_err(|e| ForgeError::Decode {
            url: url.to_string(),
            message: e.to_string(),
        })?;
        Ok((items, next))
    }

    /// Follow `Link: rel="next"` until exhausted. Items that fail to decode
    /// are dropped individually.
    async fn get_paginated<T: DeserializeOwned>(
        &self,
        first: String,
        what: &str,
    ) -> Result<Vec<T>, ForgeError> {
        let mut out = Vec::new();
        let mut next = Some(first);
        while let Some(url) = next.take() {
            let (items, following) = self.retry.run(&url, || self.fetch_page(&url)).await?;
            for item in items {
                match serde_json::from_value::<T>(item) {
                    Ok(value) => out.push(value),
                    Err(e) => tracing::warn!("{url}: skipping malformed {what}: {e}"),
                }
            }
            next = following;
        }
        Ok(out)
    }

    /// Download sends no credentials, since `url` may point anywhere.
    async fn hash_download(&self, url: &str) -> Result<Digest, ForgeError> {
        tracing::debug!("hashing {url}");
        let resp = self
            .client
            .get(url)
            .header(ACCEPT, "application/octet-stream")
            .send()
            .await?;
        let mut resp = check_status(url, resp)?;
        let mut hasher = Sha256::new();
        while let Some(chunk) = resp.chunk().await? {
            hasher.update(&chunk);
        }
        Digest::sha256(&hex::encode(hasher.finalize())).map_err(|e| ForgeError::Decode {
            url: url.to_string(),
            message: e.to_string(),
        })
    }
}

#[async_trait]
impl Forge for GitHubForge {
    async fn list_releases(&self, repo: &Repository) -> Result<Vec<Release>, ForgeError> {
        let url = format!(
            "{}/repos/{}/{}/releases?per_page={PER_PAGE}",
            self.api_url,
            repo.owner(),
            repo.name()
        );
        let releases: Vec<ReleasePayload> = self.get_paginated(url, "release").await?;
        Ok(releases
            .into_iter()
            .map(|r| Release {
                id: r.id,
                tag_name: r.tag_name,
                draft: r.draft,
                prerelease: r.prerelease,
            })
            .collect())
    }

    async fn list_assets(
        &self,
        repo: &Repository,
        release: &Release,
    ) -> Result<Vec<Asset>, ForgeError> {
        let url = format!(
            "{}/repos/{}/{}/releases/{}/assets?per_page={PER_PAGE}",
            self.api_url,
            repo.owner(),
            repo.name(),
            release.id
        );
        let assets: Vec<AssetPayload> = self.get_paginated(url, "asset").await?;
        Ok(assets
            .into_iter()
            .map(|a| Asset {
                filename: a.name,
                download_url: a.browser_download_url,
                size: a.size,
                uploaded_at: a.updated_at,
                uploader: a.uploader.map(|u| u.login),
                digest: a.digest,
            })
            .collect())
    }

    async fn sha256(&self, asset: &Asset) -> Result<Digest, ForgeError> {
        let url = asset.download_url.as_str();
        self.retry.run(url, || self.hash_download(url)).await
    }
}

fn check_status(url: &str, resp: Response) -> Result<Response, ForgeError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let headers = resp.headers();
    let exhausted = header_str(headers, "x-ratelimit-remaining") == Some("0");
    let limited = status == StatusCode::TOO_MANY_REQUESTS
        || (status == StatusCode::FORBIDDEN && (exhausted || headers.contains_key(RETRY_AFTER)));
    if limited {
        return Err(ForgeError::RateLimited {
            url: url.to_string(),
            retry_after: rate_limit_delay(headers),
        });
    }
    Err(ForgeError::Status {
        url: url.to_string(),
        status,
    })
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok()).map(str::trim)
}

/// `retry-after` seconds, else time until `x-ratelimit-reset`.
fn rate_limit_delay(headers: &HeaderMap) -> Option<Duration> {
    let secs = |name: &str| header_str(headers, name).and_then(|v| v.parse::<i64>().ok());
    let wait = match secs(RETRY_AFTER.as_str()) {
        Some(wait) => wait,
        None => secs("x-ratelimit-reset")? - Utc::now().timestamp(),
    };
    Some(Duration::from_secs(u64::try_from(wait).unwrap_or(0)))
}

/// Extract the `rel="next"` target from an RFC 8288 `Link` header.
fn next_link(headers: &HeaderMap) -> Option<String> {
    let link = headers.get(LINK)?.to_str().ok()?;
    link.split(',').find_map(|part| {
        let (target, params) = part.split_once(';')?;
        let is_next = params
            .split(';')
            .any(|p| matches!(p.trim(), "rel=\"next\"" | "rel=next"));
        if !is_next {
            return None;
        }
        let target = target.trim().strip_prefix('<')?.strip_suffix('>')?;
        Some(target.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use reqwest::header::HeaderValue;

    const EMPTY_SHA256: &str = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

    fn forge(server: &Server, max_attempts: u32) -> GitHubForge {
        GitHubForge::new(Client::new(), Some("test-token".to_string()))
            .with_api_url(format!("{}/", server.url()))
            .with_retry(RetryPolicy {
                max_attempts,
                base_delay: Duration::ZERO,
                max_delay: Duration::ZERO,
            })
    }

    fn repo() -> Repository {
        Repository::new("octo", "tools")
    }

    fn release(id: u64) -> Release {
        Release {
            id,
            tag_name: "v1.0".to_string(),
            draft: false,
            prerelease: false,
        }
    }

    #[test]
    fn test_next_link() {
        let mut headers = HeaderMap::new();
        headers.insert(
            LINK,
            HeaderValue::from_static(
                "<https://api.github.com/x?page=2>; rel=\"next\", <https://api.github.com/x?page=5>; rel=\"last\"",
            ),
        );
        assert_eq!(
            next_link(&headers).as_deref(),
            Some("https://api.github.com/x?page=2")
        );

        headers.insert(
            LINK,
            HeaderValue::from_static("<https://api.github.com/x?page=1>; rel=\"prev\""),
        );
        assert_eq!(next_link(&headers), None);
        assert_eq!(next_link(&HeaderMap::new()), None);
    }

    #[test]
    fn test_rate_limit_delay_prefers_retry_after() {
        let mut headers = HeaderMap::new();
        headers.insert(RETRY_AFTER, HeaderValue::from_static("12"));
        headers.insert("x-ratelimit-reset", HeaderValue::from_static("0"));
        assert_eq!(rate_limit_delay(&headers), Some(Duration::from_secs(12)));

        let mut headers = HeaderMap::new();
        headers.insert("x-ratelimit-reset", HeaderValue::from_static("0"));
        assert_eq!(rate_limit_delay(&headers), Some(Duration::ZERO));
        assert_eq!(rate_limit_delay(&HeaderMap::new()), None);
    }

    #[tokio::test]
    async fn test_list_releases_follows_pagination() {
        let mut server = Server::new_async().await;
        let page2 = format!("{}/repos/octo/tools/releases?per_page=100&page=2", server.url());

        let first = server
            .mock("GET", "/repos/octo/tools/releases")
            .match_query(Matcher::Exact("per_page=100".to_string()))
            .match_header("authorization", "Bearer test-token")
            .match_header("x-github-api-version", API_VERSION)
            .with_status(200)
            .with_header("link", &format!("<{page2}>; rel=\"next\""))
            .with_body(r#"[{"id": 2, "tag_name": "v2.0", "draft": false, "prerelease": true}]"#)
            .create_async()
            .await;
        let second = server
            .mock("GET", "/repos/octo/tools/releases")
            .match_query(Matcher::Exact("per_page=100&page=2".to_string()))
            .with_status(200)
            .with_body(r#"[{"id": 1, "tag_name": "v1.0"}, {"tag_name": "no-id"}]"#)
            .create_async()
            .await;

        let releases = forge(&server, 1).list_releases(&repo()).await.unwrap();
        assert_eq!(releases.len(), 2);
        assert_eq!(releases[0].tag_name, "v2.0");
        assert!(releases[0].prerelease);
        assert_eq!(releases[1].id, 1);
        assert!(!releases[1].draft);

        first.assert_async().await;
        second.assert_async().await;
    }

    #[tokio::test]
    async fn test_list_assets_maps_fields() {
        let mut server = Server::new_async().await;
        let body = format!(
            r#"[{{
                "name": "tools-1.0-py3-none-any.whl",
                "browser_download_url": "https://github.com/octo/tools/releases/download/v1.0/tools-1.0-py3-none-any.whl",
                "size": 2048,
                "updated_at": "2024-05-01T12:00:00Z",
                "uploader": {{"login": "octocat"}},
                "digest": "sha256:{EMPTY_SHA256}"
            }}, {{
                "name": "tools-1.0.tar.gz",
                "browser_download_url": "https://github.com/octo/tools/releases/download/v1.0/tools-1.0.tar.gz",
                "uploader": null,
                "digest": null
            }}]"#
        );
        let mock = server
            .mock("GET", "/repos/octo/tools/releases/42/assets")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(body)
            .create_async()
            .await;

        let assets = forge(&server, 1)
            .list_assets(&repo(), &release(42))
            .await
            .unwrap();
        mock.assert_async().await;

        assert_eq!(assets.len(), 2);
        assert_eq!(assets[0].filename, "tools-1.0-py3-none-any.whl");
        assert_eq!(assets[0].size, 2048);
        assert_eq!(assets[0].uploader.as_deref(), Some("octocat"));
        assert_eq!(
            assets[0].uploaded_at.map(|t| t.to_rfc3339()).as_deref(),
            Some("2024-05-01T12:00:00+00:00")
        );
        assert_eq!(
            assets[0].digest.as_deref(),
            Some(format!("sha256:{EMPTY_SHA256}").as_str())
        );
        assert_eq!(assets[1].uploader, None);
        assert_eq!(assets[1].digest, None);
        assert_eq!(assets[1].size, 0);
    }

    #[tokio::test]
    async fn test_server_errors_are_retried() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/repos/octo/tools/releases")
            .match_query(Matcher::Any)
            .with_status(502)
            .expect(3)
            .create_async()
            .await;

        let err = forge(&server, 3).list_releases(&repo()).await.unwrap_err();
        assert!(matches!(err, ForgeError::Status { status, .. } if status == StatusCode::BAD_GATEWAY));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_not_found_is_not_retried() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/repos/octo/tools/releases")
            .match_query(Matcher::Any)
            .with_status(404)
            .with_body(r#"{"message": "Not Found"}"#)
            .expect(1)
            .create_async()
            .await;

        let err = forge(&server, 4).list_releases(&repo()).await.unwrap_err();
        assert!(matches!(err, ForgeError::Status { status, .. } if status == StatusCode::NOT_FOUND));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_rate_limit_is_detected() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/repos/octo/tools/releases")
            .match_query(Matcher::Any)
            .with_status(403)
            .with_header("x-ratelimit-remaining", "0")
            .with_header("x-ratelimit-reset", "0")
            .expect(2)
            .create_async()
            .await;

        let err = forge(&server, 2).list_releases(&repo()).await.unwrap_err();
        assert!(matches!(err, ForgeError::RateLimited { .. }));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_plain_forbidden_is_permanent() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/repos/octo/tools/releases")
            .match_query(Matcher::Any)
            .with_status(403)
            .with_header("x-ratelimit-remaining", "4999")
            .expect(1)
            .create_async()
            .await;

        let err = forge(&server, 3).list_releases(&repo()).await.unwrap_err();
        assert!(matches!(err, ForgeError::Status { .. }));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_malformed_body_is_a_decode_error() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/repos/octo/tools/releases")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body("{\"not\": \"a list\"}")
            .create_async()
            .await;

        let err = forge(&server, 3).list_releases(&repo()).await.unwrap_err();
        assert!(matches!(err, ForgeError::Decode { .. }));
    }

    #[tokio::test]
    async fn test_sha256_streams_download_without_credentials() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/download/tools-1.0.tar.gz")
            .match_header("authorization", Matcher::Missing)
            .with_status(200)
            .with_body("hello")
            .create_async()
            .await;

        let asset = Asset {
            filename: "tools-1.0.tar.gz".to_string(),
            download_url: format!("{}/download/tools-1.0.tar.gz", server.url()),
            size: 5,
            uploaded_at: None,
            uploader: None,
            digest: None,
        };
        let digest = forge(&server, 1).sha256(&asset).await.unwrap();
        assert_eq!(
            digest.hex(),
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
        mock.assert_async().await;
    }
}
