/*!
dropbox-oauth1: a Dropbox API v1 client on top of reqwest ♡ oauth1-request.

# Overview

Every call is signed with OAuth 1.0a (HMAC-SHA1). A [`Session`] holds the
application's consumer credentials and walks through the token flow; a
[`Client`] built from an authorized session exposes the REST endpoints.

# How to use

## Acquiring an access token

```no_run
use std::io;
use dropbox_oauth1::{AccessRoot, Client, Session};

# async fn run() -> dropbox_oauth1::Result<()> {
let mut session = Session::new("[APP_KEY]", "[APP_SECRET]");

// step 1. send the user to the authorization page
let url = session.build_authorization_url(None).await?;
println!("please access to: {}", url);

// step 2. wait until the user has allowed the app
let mut line = String::new();
io::stdin().read_line(&mut line).ok();

// step 3. trade the request token for an access token, keep it for later runs
let access = session.complete_access_token().await?;
println!("token: {}", access.token());

let client = Client::new(session, AccessRoot::Dropbox);
println!("{:#?}", client.account_info().await?);
# Ok(())
# }
```

## Listing changes

```no_run
use dropbox_oauth1::{AccessRoot, Client, Credentials, Session};

# async fn run() -> dropbox_oauth1::Result<()> {
let session = Session::new("[APP_KEY]", "[APP_SECRET]")
    .with_access_token(Credentials::new("[ACCESS_TOKEN]", "[TOKEN_SECRET]"));
let client = Client::new(session, AccessRoot::Sandbox);

let mut cursor: Option<String> = None;
loop {
    let delta = client.delta(cursor.as_deref()).await?;
    for entry in &delta.entries {
        match entry.metadata {
            Some(ref meta) => println!("changed: {} ({} bytes)", entry.path, meta.bytes),
            None => println!("deleted: {}", entry.path),
        }
    }
    cursor = Some(delta.cursor);
    if !delta.has_more {
        break;
    }
}
# Ok(())
# }
```
*/
mod client;
mod config;
mod decode;
mod error;
mod fileops;
mod secrets;
mod session;
mod signer;
mod token_reader;
mod transport;
mod types;

// exposed to external program
pub use client::{AccessRoot, Client, Download, MetadataOptions, MetadataResponse};
pub use config::{Config, API_HOST, CONTENT_HOST, VERSION_PREFIX, WWW_HOST};
pub use decode::METADATA_HEADER;
pub use error::{
    ApiError, AuthorizationError, DecodeError, Error, Result, StateError, TokenReaderError,
    TokenReaderResult,
};
pub use fileops::CopySource;
pub use secrets::{Credentials, Secrets, SecretsProvider};
pub use session::{Session, SessionState};
pub use signer::{OAuthParameters, Params, Signer};
pub use token_reader::{TokenReader, TokenResponse};
pub use types::{
    AccountInfo, ChunkedUpload, CopyRef, Delta, Entry, Metadata, QuotaInfo, Share, Timestamp,
    TIMESTAMP_FORMAT,
};

// exposed constant variables
/// Represents `oauth_callback`.
pub const OAUTH_CALLBACK_KEY: &str = "oauth_callback";
/// Represents `oauth_signature`.
pub const OAUTH_SIGNATURE_KEY: &str = "oauth_signature";
/// Represents `oauth_token`.
pub const OAUTH_TOKEN_KEY: &str = "oauth_token";
/// Represents `oauth_verifier`.
pub const OAUTH_VERIFIER_KEY: &str = "oauth_verifier";

// crate-private constant variables
pub(crate) const OAUTH_KEY_PREFIX: &str = "oauth_";
