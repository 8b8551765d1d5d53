use log::debug;
use reqwest::header::HeaderMap;
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;

use crate::{ApiError, DecodeError, Metadata, Result};

/// Header carrying the metadata of a downloaded file.
pub const METADATA_HEADER: &str = "x-dropbox-metadata";

/// Reads the whole body and decodes it as `T` on `200 OK`, or as an
/// [`ApiError`] carrying the status code otherwise.
pub(crate) async fn parse_json<T>(response: Response) -> Result<T>
where
    T: DeserializeOwned,
{
    let status = response.status();
    let body = response.bytes().await?;
    decode_body(status, &body)
}

pub(crate) fn decode_body<T>(status: StatusCode, body: &[u8]) -> Result<T>
where
    T: DeserializeOwned,
{
    if status == StatusCode::OK {
        return Ok(serde_json::from_slice(body).map_err(DecodeError::from)?);
    }
    Err(api_error(status, body).into())
}

/// Builds the error for a non-success response. The status code survives
/// even if the body is empty or not the expected `{"error": ...}` shape.
pub(crate) fn api_error(status: StatusCode, body: &[u8]) -> ApiError {
    let code = status.as_u16();
    let text = String::from_utf8_lossy(body);
    let text = text.trim();
    if text.is_empty() {
        return ApiError::new(code, "");
    }
    match serde_json::from_str::<ApiError>(text) {
        Ok(mut err) => {
            err.code = code;
            err
        }
        Err(e) => {
            debug!("error body of {} is not json: {}", code, e);
            ApiError::new(code, text)
        }
    }
}

/// Metadata sent alongside a download. A missing header is not an error.
pub(crate) fn metadata_from_headers(headers: &HeaderMap) -> Result<Option<Metadata>> {
    match headers.get(METADATA_HEADER) {
        None => Ok(None),
        Some(value) => {
            let text = value.to_str().map_err(DecodeError::from)?;
            if text.is_empty() {
                return Ok(None);
            }
            let meta = serde_json::from_str(text).map_err(DecodeError::from)?;
            Ok(Some(meta))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CopyRef, Error};
    use reqwest::header::HeaderValue;

    #[test]
    fn decode_success() {
        let body = br#"{"copy_ref": "z1X6ATl6aWtzOGq0c3g5Ng", "expires": "Fri, 31 Jan 2042 21:01:05 +0000"}"#;
        let r: CopyRef = decode_body(StatusCode::OK, body).unwrap();
        assert_eq!(r.copy_ref, "z1X6ATl6aWtzOGq0c3g5Ng");
        assert_eq!(r.expires.to_string(), "Fri, 31 Jan 2042 21:01:05 +0000");
    }

    #[test]
    fn decode_api_error() {
        let body = br#"{"error": "Path '/x' not found"}"#;
        match decode_body::<CopyRef>(StatusCode::NOT_FOUND, body) {
            Err(Error::Api(e)) => {
                assert_eq!(e.code, 404);
                assert_eq!(e.message, "Path '/x' not found");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn empty_error_body_keeps_status() {
        match decode_body::<CopyRef>(StatusCode::NOT_MODIFIED, b"") {
            Err(Error::Api(e)) => assert_eq!(e, ApiError::new(304, "")),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn unparsable_error_body_keeps_status() {
        let e = api_error(StatusCode::BAD_GATEWAY, b"<html>bad gateway</html>");
        assert_eq!(e.code, 502);
        assert_eq!(e.message, "<html>bad gateway</html>");
    }

    #[test]
    fn malformed_success_body_is_decode_error() {
        match decode_body::<CopyRef>(StatusCode::OK, b"{\"copy_ref\": ") {
            Err(Error::Decode(DecodeError::Json(_))) => {}
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn metadata_header() {
        let mut headers = HeaderMap::new();
        assert_eq!(metadata_from_headers(&headers).unwrap(), None);

        headers.insert(
            METADATA_HEADER,
            HeaderValue::from_static(r#"{"path": "/Photos/flower.jpg", "bytes": 2453963, "rev": "38af1b183490"}"#),
        );
        let meta = metadata_from_headers(&headers).unwrap().unwrap();
        assert_eq!(meta.path, "/Photos/flower.jpg");
        assert_eq!(meta.bytes, 2_453_963);

        headers.insert(METADATA_HEADER, HeaderValue::from_static("{not json"));
        assert!(matches!(
            metadata_from_headers(&headers),
            Err(Error::Decode(_))
        ));
    }
}
