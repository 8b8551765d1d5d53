use http::Method;
use log::{debug, warn};
use percent_encoding::percent_decode_str;
use reqwest::header::CONTENT_LENGTH;
use reqwest::{Body, RequestBuilder, Response, StatusCode};
use url::Url;

use crate::{AuthorizationError, Params, Result, Session};

const EXPIRED_TOKEN_CAUSE: &str = "bad or expired token";

/// Signs `params` with the session's access token and sends them as the
/// query of a `GET`.
pub(crate) async fn get(session: &Session, url: Url, mut params: Params) -> Result<Response> {
    session.sign_request(&Method::GET, &url, &mut params)?;
    debug!("GET {}", url);
    send(session.config().client().get(url).query(&params)).await
}

/// Signs `params` and sends them as an urlencoded `POST` body.
pub(crate) async fn post_form(session: &Session, url: Url, mut params: Params) -> Result<Response> {
    session.sign_request(&Method::POST, &url, &mut params)?;
    debug!("POST {}", url);
    send(session.config().client().post(url).form(&params)).await
}

/// Signs `params` into the query and uploads `body`.
///
/// A positive `content_length` is sent as `Content-Length`, so a streamed
/// body of known size goes out without chunked encoding.
pub(crate) async fn put(
    session: &Session,
    url: Url,
    mut params: Params,
    body: Body,
    content_length: u64,
) -> Result<Response> {
    session.sign_request(&Method::PUT, &url, &mut params)?;
    debug!("PUT {} ({} bytes)", url, content_length);
    let mut request = session
        .config()
        .client()
        .put(url)
        .query(&params)
        .body(body);
    if content_length > 0 {
        request = request.header(CONTENT_LENGTH, content_length.to_string());
    }
    send(request).await
}

/// Sends the request and turns `401 Unauthorized` into an
/// [`AuthorizationError`]. Any other response is returned for decoding.
pub(crate) async fn send(request: RequestBuilder) -> Result<Response> {
    let response = request.send().await?;
    if response.status() == StatusCode::UNAUTHORIZED {
        let context = request_context(response.url());
        warn!("request to {} was not authorized", context);
        drain(response).await;
        return Err(AuthorizationError {
            context,
            cause: Some(EXPIRED_TOKEN_CAUSE.to_string()),
        }
        .into());
    }
    Ok(response)
}

/// Reads the remaining body so the connection goes back to the pool.
pub(crate) async fn drain(response: Response) {
    if let Err(e) = response.bytes().await {
        debug!("failed to drain response body: {}", e);
    }
}

/// The request path without its leading version segment:
/// `/1/metadata/dropbox/a b` becomes `metadata/dropbox/a b`.
fn request_context(url: &Url) -> String {
    let path = percent_decode_str(url.path()).decode_utf8_lossy();
    let path = path.trim_start_matches('/');
    match path.find('/') {
        Some(i) => path[i + 1..].to_string(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_strips_version() {
        let url = Url::parse("https://api.dropbox.com/1/account/info").unwrap();
        assert_eq!(request_context(&url), "account/info");

        let url = Url::parse("https://api-content.dropbox.com/1/files/dropbox/a%20b.txt?rev=1").unwrap();
        assert_eq!(request_context(&url), "files/dropbox/a b.txt");

        let url = Url::parse("https://api.dropbox.com/1").unwrap();
        assert_eq!(request_context(&url), "");
    }
}
