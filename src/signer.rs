use std::borrow::Cow;
use std::collections::BTreeMap;

use crate::{SecretsProvider, OAUTH_KEY_PREFIX};
use http::Method;
use oauth1_request::signature_method::SignatureMethod;
use oauth1_request::signer::Signer as OAuthSigner;
use oauth1_request::{HmacSha1, Options};
use percent_encoding::percent_decode_str;
use url::Url;

const AUTHORIZATION_SCHEME: &str = "OAuth ";

/// Request parameters, kept sorted by key.
///
/// Setting a key twice replaces the earlier value, so optional parameters
/// that were never set take no part in the signature.
pub type Params = BTreeMap<String, String>;

#[derive(Debug, Clone)]
pub struct Signer<'a, TSecretsProvider, TSignatureMethod>
where
    TSecretsProvider: SecretsProvider,
    TSignatureMethod: SignatureMethod + Clone,
{
    secrets: &'a TSecretsProvider,
    parameters: OAuthParameters<'a, TSignatureMethod>,
}

impl<'a, TSecretsProvider, TSignatureMethod> Signer<'a, TSecretsProvider, TSignatureMethod>
where
    TSecretsProvider: SecretsProvider,
    TSignatureMethod: SignatureMethod + Clone,
{
    pub fn new(
        secrets: &'a TSecretsProvider,
        parameters: OAuthParameters<'a, TSignatureMethod>,
    ) -> Self {
        Signer {
            secrets,
            parameters,
        }
    }

    /// Signs the request and writes the `oauth_*` protocol parameters,
    /// `oauth_signature` included, into `params`.
    ///
    /// `url` must not carry a query; every request parameter is expected in
    /// `params`. `oauth_*` entries already present are replaced.
    pub fn sign(&self, method: &Method, url: &Url, params: &mut Params) {
        let authorization = self.authorization_header(method, url, params);
        for (key, value) in parse_authorization(&authorization) {
            if key.starts_with(OAUTH_KEY_PREFIX) {
                params.insert(key, value);
            }
        }
    }

    /// Generates the value of the `Authorization` header for the request.
    pub fn authorization_header(&self, method: &Method, url: &Url, params: &Params) -> String {
        let (consumer_key, consumer_secret) = self.secrets.get_consumer_key_pair();
        let (token, token_secret) = self.secrets.get_token_option_pair();
        // build oauth option
        let options = self.parameters.build_options(token);

        // divide items by the position "oauth_*" parameters take in sorted order
        let (before_oauth, after_oauth): (Vec<_>, Vec<_>) = params
            .iter()
            .filter(|(k, _)| !k.starts_with(OAUTH_KEY_PREFIX))
            .partition(|(k, _)| k.as_str() < OAUTH_KEY_PREFIX);

        // Step 0. instantiate sign generator
        let sig_method = self.parameters.signature_method.clone();
        let mut signer = if *method == Method::POST {
            OAuthSigner::form_with_signature_method(
                sig_method,
                method.as_str(),
                url.clone(),
                consumer_secret,
                token_secret,
            )
        } else {
            OAuthSigner::with_signature_method(
                sig_method,
                method.as_str(),
                url.clone(),
                consumer_secret,
                token_secret,
            )
        };

        // Step 1. key [a ~ oauth_)
        for (key, value) in before_oauth {
            signer.parameter(key, value);
        }
        // Step 2. add oauth_* parameters
        let mut signer = signer.oauth_parameters(consumer_key, &options);
        // Step 3. key (oauth_ ~ z]
        for (key, value) in after_oauth {
            signer.parameter(key, value);
        }

        signer.finish().authorization
    }
}

/// Splits `OAuth k1="v1",k2="v2"` into decoded key-value pairs.
fn parse_authorization(header: &str) -> Vec<(String, String)> {
    header
        .strip_prefix(AUTHORIZATION_SCHEME)
        .unwrap_or(header)
        .split(',')
        .filter_map(|item| {
            let mut kv = item.trim().splitn(2, '=');
            match (kv.next(), kv.next()) {
                (Some(k), Some(v)) => Some((
                    k.to_string(),
                    percent_decode_str(v.trim_matches('"'))
                        .decode_utf8_lossy()
                        .into_owned(),
                )),
                _ => None,
            }
        })
        .collect()
}

/// Protocol parameters of one signing operation.
///
/// Nonce and timestamp are generated when unset; fixing both makes the
/// signature deterministic.
#[derive(Debug, Clone)]
pub struct OAuthParameters<'a, TSignatureMethod>
where
    TSignatureMethod: SignatureMethod + Clone,
{
    callback: Option<Cow<'a, str>>,
    nonce: Option<Cow<'a, str>>,
    signature_method: TSignatureMethod,
    timestamp: Option<u64>,
    verifier: Option<Cow<'a, str>>,
    version: bool,
}

impl Default for OAuthParameters<'static, HmacSha1> {
    fn default() -> Self {
        OAuthParameters {
            callback: None,
            nonce: None,
            signature_method: HmacSha1,
            timestamp: None,
            verifier: None,
            version: false,
        }
    }
}

impl<'a> OAuthParameters<'a, HmacSha1> {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn callback<T>(self, callback: T) -> Self
    where
        T: Into<Cow<'a, str>>,
    {
        OAuthParameters {
            callback: Some(callback.into()),
            ..self
        }
    }

    /// set the oauth_nonce value
    pub fn nonce<T>(self, nonce: T) -> Self
    where
        T: Into<Cow<'a, str>>,
    {
        OAuthParameters {
            nonce: Some(nonce.into()),
            ..self
        }
    }

    /// set the oauth_timestamp value
    pub fn timestamp<T>(self, timestamp: T) -> Self
    where
        T: Into<u64>,
    {
        OAuthParameters {
            timestamp: Some(timestamp.into()),
            ..self
        }
    }

    /// set the oauth_verifier value
    pub fn verifier<T>(self, verifier: T) -> Self
    where
        T: Into<Cow<'a, str>>,
    {
        OAuthParameters {
            verifier: Some(verifier.into()),
            ..self
        }
    }

    /// set the oauth_version value (boolean)
    ///
    /// # Note
    /// When the version has value `true`, oauth_version will be set with "1.0".
    /// Otherwise, oauth_version will not be included in your request.
    pub fn version<T>(self, version: T) -> Self
    where
        T: Into<bool>,
    {
        OAuthParameters {
            version: version.into(),
            ..self
        }
    }
}

impl<'a, T> OAuthParameters<'a, T>
where
    T: SignatureMethod + Clone,
{
    fn build_options<'b>(&'b self, token: Option<&'b str>) -> Options<'b> {
        let mut opt = Options::new();

        // NOTE: items must be added by alphabetical order

        if let Some(ref callback) = self.callback {
            opt.callback(callback.as_ref());
        }
        if let Some(ref nonce) = self.nonce {
            opt.nonce(nonce.as_ref());
        }
        if let Some(timestamp) = self.timestamp {
            opt.timestamp(timestamp);
        }
        if let Some(token) = token {
            opt.token(token);
        }
        if let Some(ref verifier) = self.verifier {
            opt.verifier(verifier.as_ref());
        }
        opt.version(self.version);

        opt
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Credentials, Secrets, OAUTH_SIGNATURE_KEY};

    fn params(pairs: &[(&str, &str)]) -> Params {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn sign_post_without_token() {
        // https://tools.ietf.org/html/rfc5849
        let url = Url::parse("https://photos.example.net/initiate").unwrap();
        let consumer = Credentials::new("dpf43f3p2l4k3l03", "kd94hf93k423kf44");
        let secrets = Secrets::new(&consumer);
        let oauth = OAuthParameters::new()
            .nonce("wIjqoS")
            .timestamp(137_131_200u64)
            .callback("http://printer.example.com/ready");

        let mut p = Params::new();
        Signer::new(&secrets, oauth).sign(&Method::POST, &url, &mut p);

        assert_eq!(p[OAUTH_SIGNATURE_KEY], "74KNZJeDHnMBp0EMJ9ZHt/XKycU=");
        assert_eq!(p["oauth_consumer_key"], "dpf43f3p2l4k3l03");
        assert_eq!(p["oauth_callback"], "http://printer.example.com/ready");
        assert_eq!(p["oauth_signature_method"], "HMAC-SHA1");
        assert!(!p.contains_key("oauth_token"));
    }

    #[test]
    fn sign_get_with_token() {
        // https://tools.ietf.org/html/rfc5849
        let url = Url::parse("http://photos.example.net/photos").unwrap();
        let consumer = Credentials::new("dpf43f3p2l4k3l03", "kd94hf93k423kf44");
        let token = Credentials::new("nnch734d00sl2jdk", "pfkkdhi9sl3r4s00");
        let secrets = Secrets::new(&consumer).token(&token);
        let oauth = OAuthParameters::new()
            .nonce("chapoH")
            .timestamp(137_131_202u64);

        let mut p = params(&[("file", "vacation.jpg"), ("size", "original")]);
        Signer::new(&secrets, oauth).sign(&Method::GET, &url, &mut p);

        assert_eq!(p[OAUTH_SIGNATURE_KEY], "MdpQcU8iPSUjWoN/UDMsK2sui9I=");
        assert_eq!(p["oauth_token"], "nnch734d00sl2jdk");
        assert_eq!(p["oauth_nonce"], "chapoH");
        assert_eq!(p["oauth_timestamp"], "137131202");
        assert_eq!(p["file"], "vacation.jpg");
        assert!(!p.contains_key("oauth_version"));
    }

    #[test]
    fn sign_post_body() {
        // https://developer.twitter.com/ja/docs/basics/authentication/guides/creating-a-signature
        let url = Url::parse("https://api.twitter.com/1.1/statuses/update.json").unwrap();
        let consumer = Credentials::new(
            "xvz1evFS4wEEPTGEFPHBog",
            "kAcSOqF21Fu85e7zjz7ZN2U4ZRhfV3WpwPAoE3Z7kBw",
        );
        let token = Credentials::new(
            "370773112-GmHxMAgYyLbNEtIKZeRNFsMKPR9EyMZeS9weJAEb",
            "LswwdoUaIvS8ltyTt5jkRh4J50vUPVVHtR2YPi5kE",
        );
        let secrets = Secrets::new(&consumer).token(&token);
        let oauth = OAuthParameters::new()
            .nonce("kYjzVBB8Y0ZFabxSWbWovY3uYSQ2pTgmZeNu2VS4cg")
            .timestamp(1_318_622_958u64)
            .version(true);

        let mut p = params(&[
            ("include_entities", "true"),
            (
                "status",
                "Hello Ladies + Gentlemen, a signed OAuth request!",
            ),
        ]);
        Signer::new(&secrets, oauth).sign(&Method::POST, &url, &mut p);

        assert_eq!(p[OAUTH_SIGNATURE_KEY], "hCtSmYh+iHYCEqBWrE7C7hYmtUk=");
        assert_eq!(p["oauth_version"], "1.0");
    }

    #[test]
    fn signing_is_deterministic() {
        let url = Url::parse("https://api.dropbox.com/1/metadata/dropbox/a").unwrap();
        let consumer = Credentials::new("key", "secret");
        let token = Credentials::new("token", "token-secret");
        let secrets = Secrets::new(&consumer).token(&token);
        let signer = Signer::new(
            &secrets,
            OAuthParameters::new().nonce("n0nce").timestamp(1_400_000_000u64),
        );

        let mut first = params(&[("list", "false"), ("locale", "en")]);
        let mut second = first.clone();
        signer.sign(&Method::GET, &url, &mut first);
        signer.sign(&Method::GET, &url, &mut second);
        assert_eq!(first, second);

        // signing again ignores the protocol parameters written the first time
        let before = first["oauth_signature"].clone();
        signer.sign(&Method::GET, &url, &mut first);
        assert_eq!(first["oauth_signature"], before);
    }

    #[test]
    fn signature_depends_on_parameters() {
        let url = Url::parse("https://api.dropbox.com/1/delta").unwrap();
        let consumer = Credentials::new("key", "secret");
        let token = Credentials::new("token", "token-secret");
        let secrets = Secrets::new(&consumer).token(&token);
        let signer = Signer::new(
            &secrets,
            OAuthParameters::new().nonce("n0nce").timestamp(1_400_000_000u64),
        );

        let mut without_cursor = Params::new();
        let mut with_cursor = params(&[("cursor", "AAA")]);
        signer.sign(&Method::POST, &url, &mut without_cursor);
        signer.sign(&Method::POST, &url, &mut with_cursor);
        assert_ne!(
            without_cursor["oauth_signature"],
            with_cursor["oauth_signature"]
        );
    }

    #[test]
    fn parse_authorization_header() {
        let parsed = parse_authorization(
            "OAuth oauth_consumer_key=\"key\",oauth_signature=\"MdpQcU8iPSUjWoN%2FUDMsK2sui9I%3D\"",
        );
        assert_eq!(
            parsed,
            vec![
                ("oauth_consumer_key".to_string(), "key".to_string()),
                (
                    "oauth_signature".to_string(),
                    "MdpQcU8iPSUjWoN/UDMsK2sui9I=".to_string()
                ),
            ]
        );
    }
}
