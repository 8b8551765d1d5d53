use std::borrow::Cow;

use reqwest::Client as ReqwestClient;
use url::Url;

use crate::Result;

/// Production API host.
pub const API_HOST: &str = "api.dropbox.com";
/// Production content host, serving file uploads and downloads.
pub const CONTENT_HOST: &str = "api-content.dropbox.com";
/// Host of the page a user visits to authorize a request token.
pub const WWW_HOST: &str = "www.dropbox.com";
/// API version segment prefixed to every path.
pub const VERSION_PREFIX: &str = "/1";

const SCHEME: &str = "https://";

/// Where and how a [`Session`](crate::Session) talks to the service.
///
/// Every value has a production default; overriding the hosts is mainly
/// useful for pointing the client at a test server.
#[derive(Debug, Clone)]
pub struct Config {
    api_prefix: Cow<'static, str>,
    content_prefix: Cow<'static, str>,
    www_prefix: Cow<'static, str>,
    http_client: ReqwestClient,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            api_prefix: Cow::Owned(format!("{}{}{}", SCHEME, API_HOST, VERSION_PREFIX)),
            content_prefix: Cow::Owned(format!("{}{}{}", SCHEME, CONTENT_HOST, VERSION_PREFIX)),
            www_prefix: Cow::Owned(format!("{}{}{}", SCHEME, WWW_HOST, VERSION_PREFIX)),
            http_client: ReqwestClient::new(),
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Default::default()
    }

    /// set the API base, version segment included (e.g. `https://api.dropbox.com/1`)
    pub fn api_prefix<T>(self, prefix: T) -> Self
    where
        T: Into<Cow<'static, str>>,
    {
        Config {
            api_prefix: prefix.into(),
            ..self
        }
    }

    /// set the content base, version segment included
    pub fn content_prefix<T>(self, prefix: T) -> Self
    where
        T: Into<Cow<'static, str>>,
    {
        Config {
            content_prefix: prefix.into(),
            ..self
        }
    }

    /// set the authorization page base, version segment included
    pub fn www_prefix<T>(self, prefix: T) -> Self
    where
        T: Into<Cow<'static, str>>,
    {
        Config {
            www_prefix: prefix.into(),
            ..self
        }
    }

    /// Points all three bases at one server, e.g. a local mock.
    pub fn base_url<T>(self, base: T) -> Self
    where
        T: AsRef<str>,
    {
        let prefix = format!(
            "{}{}",
            base.as_ref().trim_end_matches('/'),
            VERSION_PREFIX
        );
        Config {
            api_prefix: Cow::Owned(prefix.clone()),
            content_prefix: Cow::Owned(prefix.clone()),
            www_prefix: Cow::Owned(prefix),
            ..self
        }
    }

    /// Use the given `reqwest::Client`. Timeouts, proxies and TLS settings
    /// are taken from it as is.
    pub fn http_client(self, client: ReqwestClient) -> Self {
        Config {
            http_client: client,
            ..self
        }
    }

    pub(crate) fn client(&self) -> &ReqwestClient {
        &self.http_client
    }

    pub(crate) fn api_url(&self, endpoint: &str) -> Result<Url> {
        join(&self.api_prefix, endpoint)
    }

    pub(crate) fn content_url(&self, endpoint: &str) -> Result<Url> {
        join(&self.content_prefix, endpoint)
    }

    pub(crate) fn www_url(&self, endpoint: &str) -> Result<Url> {
        join(&self.www_prefix, endpoint)
    }

    pub(crate) fn request_token_url(&self) -> Result<Url> {
        self.api_url("oauth/request_token")
    }

    pub(crate) fn authorize_url(&self) -> Result<Url> {
        self.www_url("oauth/authorize")
    }

    pub(crate) fn access_token_url(&self) -> Result<Url> {
        self.api_url("oauth/access_token")
    }
}

fn join(prefix: &str, endpoint: &str) -> Result<Url> {
    let url = Url::parse(&format!(
        "{}/{}",
        prefix.trim_end_matches('/'),
        endpoint.trim_start_matches('/')
    ))?;
    Ok(url)
}
