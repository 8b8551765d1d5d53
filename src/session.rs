use std::fmt;

use http::Method;
use log::debug;
use oauth1_request::HmacSha1;
use reqwest::StatusCode;
use url::Url;

use crate::decode::api_error;
use crate::token_reader::TokenReader;
use crate::transport::send;
use crate::{
    Config, Credentials, OAuthParameters, Params, Result, Secrets, Signer, StateError,
    OAUTH_CALLBACK_KEY, OAUTH_TOKEN_KEY,
};

const LOCALE_KEY: &str = "locale";

/// Where a [`Session`] is in the OAuth 1.0a flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Neither a request token nor an access token is held.
    Unauthenticated,
    /// A request token waits for the user to authorize it.
    RequestPending,
    /// An access token is held; API calls can be signed.
    Authorized,
}

/// An OAuth 1.0a connection to the service: the application's consumer
/// credentials plus the request and access tokens obtained for a user.
///
/// Operations changing the tokens take `&mut self`. Sharing one session
/// between tasks means wrapping it in a lock of the caller's choice.
#[derive(Clone)]
pub struct Session {
    consumer: Credentials,
    request_token: Option<Credentials>,
    access_token: Option<Credentials>,
    locale: Option<String>,
    config: Config,
    oauth: OAuthParameters<'static, HmacSha1>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("consumer", &self.consumer)
            .field("state", &self.state())
            .field("locale", &self.locale)
            .field("config", &self.config)
            .finish()
    }
}

impl Session {
    /// Creates a session for the application identified by the consumer
    /// key and secret, talking to the production service.
    pub fn new<TKey, TSecret>(consumer_key: TKey, consumer_secret: TSecret) -> Self
    where
        TKey: Into<String>,
        TSecret: Into<String>,
    {
        Session::with_config(consumer_key, consumer_secret, Config::default())
    }

    pub fn with_config<TKey, TSecret>(
        consumer_key: TKey,
        consumer_secret: TSecret,
        config: Config,
    ) -> Self
    where
        TKey: Into<String>,
        TSecret: Into<String>,
    {
        Session {
            consumer: Credentials::new(consumer_key, consumer_secret),
            request_token: None,
            access_token: None,
            locale: None,
            config,
            oauth: OAuthParameters::new(),
        }
    }

    /// Starts authorized with access credentials saved from an earlier run.
    pub fn with_access_token(self, access_token: Credentials) -> Self {
        Session {
            access_token: Some(access_token),
            ..self
        }
    }

    /// Sends `locale` with every call whose response text is localized.
    pub fn with_locale<T>(self, locale: T) -> Self
    where
        T: Into<String>,
    {
        Session {
            locale: Some(locale.into()),
            ..self
        }
    }

    /// Overrides the protocol parameters used for signing. Fixing the nonce
    /// and timestamp makes signatures reproducible.
    pub fn with_oauth_parameters(self, oauth: OAuthParameters<'static, HmacSha1>) -> Self {
        Session { oauth, ..self }
    }

    pub fn set_locale(&mut self, locale: Option<String>) {
        self.locale = locale;
    }

    pub fn locale(&self) -> Option<&str> {
        self.locale.as_deref()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn consumer(&self) -> &Credentials {
        &self.consumer
    }

    pub fn request_token(&self) -> Option<&Credentials> {
        self.request_token.as_ref()
    }

    pub fn access_token(&self) -> Option<&Credentials> {
        self.access_token.as_ref()
    }

    pub fn state(&self) -> SessionState {
        match (&self.request_token, &self.access_token) {
            (_, Some(_)) => SessionState::Authorized,
            (Some(_), None) => SessionState::RequestPending,
            (None, None) => SessionState::Unauthenticated,
        }
    }

    /// Whether an access token is held.
    ///
    /// The user may have revoked it on the server side, so `true` does not
    /// guarantee the next call succeeds.
    pub fn is_authorized(&self) -> bool {
        self.access_token.is_some()
    }

    /// Drops both tokens; the whole authorization flow has to run again.
    pub fn reset(&mut self) {
        debug!("session reset");
        self.request_token = None;
        self.access_token = None;
    }

    /// Fetches a request token unless one is already held, and returns it.
    pub async fn obtain_request_token(&mut self) -> Result<Credentials> {
        if let Some(ref token) = self.request_token {
            return Ok(token.clone());
        }
        let url = self.config.request_token_url()?;
        let token = self.token_request(url, None, self.oauth.clone()).await?;
        debug!("obtained request token");
        self.request_token = Some(token.clone());
        Ok(token)
    }

    /// The page where the user authorizes this session's request token,
    /// fetching the token first if needed. With a `callback` the user is sent
    /// back there afterwards.
    pub async fn build_authorization_url(&mut self, callback: Option<&str>) -> Result<Url> {
        let request_token = self.obtain_request_token().await?;
        let mut params = self.make_params(true);
        if let Some(callback) = callback.filter(|c| !c.is_empty()) {
            params.insert(OAUTH_CALLBACK_KEY.to_string(), callback.to_string());
        }
        params.insert(
            OAUTH_TOKEN_KEY.to_string(),
            request_token.token().to_string(),
        );

        let mut url = self.config.authorize_url()?;
        url.query_pairs_mut().extend_pairs(params.iter());
        Ok(url)
    }

    /// Exchanges an authorized request token for an access token, which is
    /// stored and returned.
    ///
    /// The request token does not need to be held by this session, which
    /// suits web applications receiving it back on their callback URL along
    /// with the `verifier`.
    pub async fn exchange_for_access_token(
        &mut self,
        request_token: &Credentials,
        verifier: Option<&str>,
    ) -> Result<Credentials> {
        let url = self.config.access_token_url()?;
        let oauth = match verifier.filter(|v| !v.is_empty()) {
            Some(verifier) => self.oauth.clone().verifier(verifier.to_string()),
            None => self.oauth.clone(),
        };
        let token = self.token_request(url, Some(request_token), oauth).await?;
        debug!("session authorized");
        self.access_token = Some(token.clone());
        Ok(token)
    }

    /// Exchanges the held request token for an access token. Returns the
    /// current access token without a request if already authorized.
    pub async fn complete_access_token(&mut self) -> Result<Credentials> {
        if let Some(ref token) = self.access_token {
            return Ok(token.clone());
        }
        let request_token = self
            .request_token
            .clone()
            .ok_or(StateError::NoRequestToken)?;
        self.exchange_for_access_token(&request_token, None).await
    }

    /// Adds the OAuth parameters, signature included, for a call made with
    /// the access token.
    pub fn sign_request(&self, method: &Method, url: &Url, params: &mut Params) -> Result<()> {
        let access_token = self
            .access_token
            .as_ref()
            .ok_or(StateError::NotAuthorized)?;
        let secrets = Secrets::new(&self.consumer).token(access_token);
        Signer::new(&secrets, self.oauth.clone()).sign(method, url, params);
        Ok(())
    }

    pub(crate) fn make_params(&self, locale: bool) -> Params {
        let mut params = Params::new();
        if locale {
            if let Some(ref l) = self.locale {
                if !l.is_empty() {
                    params.insert(LOCALE_KEY.to_string(), l.clone());
                }
            }
        }
        params
    }

    /// Posts to a token endpoint signed with the consumer credentials and
    /// `token`, then reads the returned pair.
    async fn token_request(
        &self,
        url: Url,
        token: Option<&Credentials>,
        oauth: OAuthParameters<'static, HmacSha1>,
    ) -> Result<Credentials> {
        let secrets = match token {
            Some(token) => Secrets::new(&self.consumer).token(token),
            None => Secrets::new(&self.consumer),
        };
        let mut params = Params::new();
        Signer::new(&secrets, oauth).sign(&Method::POST, &url, &mut params);

        debug!("POST {}", url);
        let response = send(self.config.client().post(url).form(&params)).await?;
        let status = response.status();
        if status != StatusCode::OK {
            let body = response.bytes().await?;
            return Err(api_error(status, &body).into());
        }
        Ok(response.parse_oauth_token().await?.into_credentials())
    }
}
