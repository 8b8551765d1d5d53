use std::fmt;

use serde::{Deserialize, Serialize};

/// A token/secret pair of the OAuth 1.0a protocol.
///
/// The same type holds the consumer (application) key pair, the short-lived
/// request token and the long-lived access token. Values are never changed in
/// place: replacing credentials means storing a new pair.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Credentials {
    token: String,
    secret: String,
}

impl Credentials {
    pub fn new<TKey, TSecret>(token: TKey, secret: TSecret) -> Self
    where
        TKey: Into<String>,
        TSecret: Into<String>,
    {
        Credentials {
            token: token.into(),
            secret: secret.into(),
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn secret(&self) -> &str {
        &self.secret
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("token", &self.token)
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

pub trait SecretsProvider {
    fn get_consumer_key_pair<'a>(&'a self) -> (&'a str, &'a str);

    fn get_token_pair_option<'a>(&'a self) -> Option<(&'a str, &'a str)>;

    fn get_token_option_pair<'a>(&'a self) -> (Option<&'a str>, Option<&'a str>) {
        self.get_token_pair_option()
            .map(|s| (Some(s.0), Some(s.1)))
            .unwrap_or_else(|| (None, None))
    }
}

/// Borrowed view of the consumer credentials and, optionally, a token pair
/// used for one signing operation.
#[derive(Debug, Clone, Copy)]
pub struct Secrets<'a> {
    consumer: &'a Credentials,
    token: Option<&'a Credentials>,
}

impl<'a> Secrets<'a> {
    pub fn new(consumer: &'a Credentials) -> Self {
        Secrets {
            consumer,
            token: None,
        }
    }

    pub fn token(self, token: &'a Credentials) -> Self {
        Secrets {
            token: Some(token),
            ..self
        }
    }
}

impl SecretsProvider for Secrets<'_> {
    fn get_consumer_key_pair<'a>(&'a self) -> (&'a str, &'a str) {
        (self.consumer.token(), self.consumer.secret())
    }

    fn get_token_pair_option<'a>(&'a self) -> Option<(&'a str, &'a str)> {
        self.token.map(|t| (t.token(), t.secret()))
    }
}
