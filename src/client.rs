use bytes::Bytes;
use log::debug;
use reqwest::{Body, Response, StatusCode};
use url::Url;

use crate::decode::{api_error, metadata_from_headers, parse_json};
use crate::transport::{drain, get, post_form, put};
use crate::{
    AccountInfo, ChunkedUpload, CopyRef, Credentials, Delta, Error, Metadata, Params, Result,
    Session, Share, StateError,
};

/// The namespace paths are resolved in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessRoot {
    /// The user's whole Dropbox.
    Dropbox,
    /// The application's own folder.
    Sandbox,
}

impl AccessRoot {
    /// Alias of [`AccessRoot::Sandbox`].
    pub const APP_FOLDER: AccessRoot = AccessRoot::Sandbox;

    pub fn as_str(&self) -> &'static str {
        match self {
            AccessRoot::Dropbox => "dropbox",
            AccessRoot::Sandbox => "sandbox",
        }
    }
}

/// Client of the REST API, working on behalf of an authorized [`Session`].
#[derive(Debug, Clone)]
pub struct Client {
    session: Session,
    root: AccessRoot,
}

impl Client {
    /// Creates a client from an authorized session.
    ///
    /// # Panics
    ///
    /// Panics when the session holds no access token. Use
    /// [`Client::try_new`] to get an error instead.
    pub fn new(session: Session, root: AccessRoot) -> Self {
        match Client::try_new(session, root) {
            Ok(client) => client,
            Err(_) => panic!("Session Not Authorized!"),
        }
    }

    pub fn try_new(session: Session, root: AccessRoot) -> Result<Self> {
        if !session.is_authorized() {
            return Err(StateError::NotAuthorized.into());
        }
        Ok(Client { session, root })
    }

    pub fn root(&self) -> AccessRoot {
        self.root
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    pub fn into_session(self) -> Session {
        self.session
    }

    pub fn is_authorized(&self) -> bool {
        self.session.is_authorized()
    }

    pub fn access_token(&self) -> Option<&Credentials> {
        self.session.access_token()
    }

    pub fn locale(&self) -> Option<&str> {
        self.session.locale()
    }

    /// Drops the session's tokens. Every following call fails with
    /// [`StateError::NotAuthorized`] until a new access token is obtained.
    pub fn reset(&mut self) {
        self.session.reset()
    }

    /// Resolves `path` under the access root, e.g. `/dropbox/Photos/a.jpg`.
    ///
    /// `.` and `..` segments are collapsed and can never lead above the root.
    pub fn file_path(&self, path: &str) -> String {
        match clean_path(path).as_str() {
            "/" => format!("/{}", self.root.as_str()),
            cleaned => format!("/{}{}", self.root.as_str(), cleaned),
        }
    }

    pub(crate) fn params(&self, locale: bool) -> Params {
        self.session.make_params(locale)
    }

    pub(crate) fn api_url(&self, endpoint: &str) -> Result<Url> {
        self.session.config().api_url(endpoint)
    }

    fn api_file_url(&self, endpoint: &str, path: &str) -> Result<Url> {
        self.rooted(self.session.config().api_url(endpoint)?, path)
    }

    fn content_file_url(&self, endpoint: &str, path: &str) -> Result<Url> {
        self.rooted(self.session.config().content_url(endpoint)?, path)
    }

    fn rooted(&self, mut url: Url, path: &str) -> Result<Url> {
        url.path_segments_mut()
            .map_err(|_| Error::Url(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .pop_if_empty()
            .push(self.root.as_str())
            .extend(clean_segments(path));
        Ok(url)
    }

    /// Information about the user's account.
    pub async fn account_info(&self) -> Result<AccountInfo> {
        let url = self.api_url("account/info")?;
        parse_json(get(&self.session, url, self.params(true)).await?).await
    }

    /// Downloads a file, the latest revision unless `rev` is given.
    pub async fn get_file(&self, path: &str, rev: Option<&str>) -> Result<Download> {
        let url = self.content_file_url("files", path)?;
        let mut params = self.params(false);
        set_opt(&mut params, "rev", rev);
        self.file_access(url, params).await
    }

    /// Downloads a thumbnail of an image file. `format` is `jpeg` or `png`,
    /// `size` one of the server's size names such as `s` or `xl`.
    pub async fn thumbnail(
        &self,
        path: &str,
        format: Option<&str>,
        size: Option<&str>,
    ) -> Result<Download> {
        let url = self.content_file_url("thumbnails", path)?;
        let mut params = self.params(false);
        set_opt(&mut params, "format", format);
        set_opt(&mut params, "size", size);
        self.file_access(url, params).await
    }

    /// Uploads `body` as the content of the file at `path`.
    ///
    /// `size` is the body length in bytes; pass 0 when unknown. With
    /// `overwrite` unset a conflicting upload is renamed by the server.
    pub async fn put_file<B>(
        &self,
        path: &str,
        overwrite: bool,
        parent_rev: Option<&str>,
        body: B,
        size: u64,
    ) -> Result<Metadata>
    where
        B: Into<Body>,
    {
        let url = self.content_file_url("files_put", path)?;
        let mut params = self.params(true);
        if overwrite {
            set(&mut params, "overwrite", "true");
        }
        set_opt(&mut params, "parent_rev", parent_rev);
        parse_json(put(&self.session, url, params, body.into(), size).await?).await
    }

    /// Metadata of a file or folder.
    ///
    /// When [`MetadataOptions::hash`] matches the folder's current hash the
    /// server answers `304 Not Modified`, reported as
    /// [`MetadataResponse::Unmodified`].
    pub async fn metadata(&self, path: &str, options: &MetadataOptions) -> Result<MetadataResponse> {
        let url = self.api_file_url("metadata", path)?;
        let mut params = self.params(true);
        if let Some(limit) = options.file_limit.filter(|l| *l > 0) {
            set(&mut params, "file_limit", limit.to_string());
        }
        set_opt(&mut params, "hash", options.hash.as_deref());
        if !options.list {
            set(&mut params, "list", "false");
        }
        if options.include_deleted {
            set(&mut params, "include_deleted", "true");
        }
        set_opt(&mut params, "rev", options.rev.as_deref());

        match parse_json(get(&self.session, url, params).await?).await {
            Ok(meta) => Ok(MetadataResponse::Metadata(meta)),
            Err(Error::Api(e)) if e.code == StatusCode::NOT_MODIFIED.as_u16() => {
                debug!("metadata of {} not modified", path);
                Ok(MetadataResponse::Unmodified)
            }
            Err(e) => Err(e),
        }
    }

    /// Files and folders under `path` whose names contain `query`.
    pub async fn search(
        &self,
        path: &str,
        query: &str,
        file_limit: Option<u32>,
        include_deleted: bool,
    ) -> Result<Vec<Metadata>> {
        let url = self.api_file_url("search", path)?;
        let mut params = self.params(true);
        set(&mut params, "query", query);
        if let Some(limit) = file_limit.filter(|l| *l > 0) {
            set(&mut params, "file_limit", limit.to_string());
        }
        if include_deleted {
            set(&mut params, "include_deleted", "true");
        }
        parse_json(get(&self.session, url, params).await?).await
    }

    /// Changes since `cursor`, or since the account was created without one.
    pub async fn delta(&self, cursor: Option<&str>) -> Result<Delta> {
        let url = self.api_url("delta")?;
        let mut params = self.params(true);
        set_opt(&mut params, "cursor", cursor);
        parse_json(post_form(&self.session, url, params).await?).await
    }

    /// A short-lived direct link for streaming the file.
    pub async fn media(&self, path: &str) -> Result<Share> {
        let url = self.api_file_url("media", path)?;
        parse_json(post_form(&self.session, url, self.params(true)).await?).await
    }

    /// A long-lived shareable link, shortened if `short_url` is set.
    pub async fn shares(&self, path: &str, short_url: bool) -> Result<Share> {
        let url = self.api_file_url("shares", path)?;
        let mut params = self.params(true);
        if short_url {
            set(&mut params, "short_url", "true");
        }
        parse_json(post_form(&self.session, url, params).await?).await
    }

    /// Metadata of earlier revisions, at most `rev_limit` of them.
    pub async fn revisions(&self, path: &str, rev_limit: Option<u32>) -> Result<Vec<Metadata>> {
        let url = self.api_file_url("revisions", path)?;
        let mut params = self.params(true);
        if let Some(limit) = rev_limit.filter(|l| *l > 0) {
            set(&mut params, "rev_limit", limit.to_string());
        }
        parse_json(get(&self.session, url, params).await?).await
    }

    /// Restores the file at `path` to revision `rev`.
    pub async fn restore(&self, path: &str, rev: &str) -> Result<Metadata> {
        let url = self.api_file_url("restore", path)?;
        let mut params = self.params(true);
        set(&mut params, "rev", rev);
        parse_json(get(&self.session, url, params).await?).await
    }

    /// A reference other accounts can copy the file from.
    pub async fn copy_ref(&self, path: &str) -> Result<CopyRef> {
        let url = self.api_file_url("copy_ref", path)?;
        parse_json(get(&self.session, url, self.params(false)).await?).await
    }

    /// Uploads one chunk. Pass no `upload_id` for the first chunk; later
    /// chunks send the id and offset returned by the previous call.
    ///
    /// When `offset` is not what the server expects it fails with
    /// [`Error::UploadOffsetMismatch`], which holds the state to resume from.
    pub async fn chunked_upload<B>(
        &self,
        upload_id: Option<&str>,
        offset: u64,
        body: B,
        size: u64,
    ) -> Result<ChunkedUpload>
    where
        B: Into<Body>,
    {
        let url = self.session.config().content_url("chunked_upload")?;
        let mut params = self.params(false);
        if let Some(id) = upload_id.filter(|id| !id.is_empty()) {
            set(&mut params, "upload_id", id);
            set(&mut params, "offset", offset.to_string());
        }

        let response = put(&self.session, url, params, body.into(), size).await?;
        let status = response.status();
        if status == StatusCode::BAD_REQUEST {
            let body = response.bytes().await?;
            let error = api_error(status, &body);
            return Err(match resume_state(&body) {
                Some(state) => {
                    debug!("chunk rejected, server expects offset {}", state.offset);
                    Error::UploadOffsetMismatch { state, error }
                }
                None => error.into(),
            });
        }
        parse_json(response).await
    }

    /// Turns the chunks uploaded under `upload_id` into the file at `path`.
    pub async fn commit_chunked_upload(
        &self,
        path: &str,
        overwrite: bool,
        parent_rev: Option<&str>,
        upload_id: &str,
    ) -> Result<Metadata> {
        let url = self.content_file_url("commit_chunked_upload", path)?;
        let mut params = self.params(true);
        set(&mut params, "overwrite", overwrite.to_string());
        set_opt(&mut params, "parent_rev", parent_rev);
        set(&mut params, "upload_id", upload_id);
        parse_json(post_form(&self.session, url, params).await?).await
    }

    async fn file_access(&self, url: Url, params: Params) -> Result<Download> {
        let response = get(&self.session, url, params).await?;
        let status = response.status();
        if status != StatusCode::OK {
            let body = response.bytes().await?;
            return Err(api_error(status, &body).into());
        }
        match metadata_from_headers(response.headers()) {
            Ok(metadata) => Ok(Download { metadata, response }),
            Err(e) => {
                drain(response).await;
                Err(e)
            }
        }
    }
}

/// Options of [`Client::metadata`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataOptions {
    file_limit: Option<u32>,
    hash: Option<String>,
    list: bool,
    include_deleted: bool,
    rev: Option<String>,
}

impl Default for MetadataOptions {
    fn default() -> Self {
        MetadataOptions {
            file_limit: None,
            hash: None,
            list: true,
            include_deleted: false,
            rev: None,
        }
    }
}

impl MetadataOptions {
    pub fn new() -> Self {
        Default::default()
    }

    /// fail when a folder holds more entries than `limit`
    pub fn file_limit(self, limit: u32) -> Self {
        MetadataOptions {
            file_limit: Some(limit),
            ..self
        }
    }

    /// hash of a previous listing, to detect that nothing changed
    pub fn hash<T: Into<String>>(self, hash: T) -> Self {
        MetadataOptions {
            hash: Some(hash.into()),
            ..self
        }
    }

    /// include folder contents (default: true)
    pub fn list(self, list: bool) -> Self {
        MetadataOptions { list, ..self }
    }

    pub fn include_deleted(self, include_deleted: bool) -> Self {
        MetadataOptions {
            include_deleted,
            ..self
        }
    }

    pub fn rev<T: Into<String>>(self, rev: T) -> Self {
        MetadataOptions {
            rev: Some(rev.into()),
            ..self
        }
    }
}

/// Result of [`Client::metadata`].
#[derive(Debug, Clone, PartialEq)]
pub enum MetadataResponse {
    Metadata(Metadata),
    /// The listing hash sent along still matches.
    Unmodified,
}

impl MetadataResponse {
    pub fn is_unmodified(&self) -> bool {
        matches!(self, MetadataResponse::Unmodified)
    }

    pub fn into_metadata(self) -> Option<Metadata> {
        match self {
            MetadataResponse::Metadata(meta) => Some(meta),
            MetadataResponse::Unmodified => None,
        }
    }
}

/// A file being downloaded. The content is read from the open response,
/// at the pace the caller pulls it.
#[derive(Debug)]
pub struct Download {
    metadata: Option<Metadata>,
    response: Response,
}

impl Download {
    /// Metadata sent by the server with the content, if any.
    pub fn metadata(&self) -> Option<&Metadata> {
        self.metadata.as_ref()
    }

    pub fn content_length(&self) -> Option<u64> {
        self.response.content_length()
    }

    /// The next chunk of content, `None` once the body is exhausted.
    pub async fn chunk(&mut self) -> Result<Option<Bytes>> {
        Ok(self.response.chunk().await?)
    }

    /// Reads the rest of the content.
    pub async fn bytes(self) -> Result<Bytes> {
        Ok(self.response.bytes().await?)
    }

    pub fn into_response(self) -> Response {
        self.response
    }
}

fn set<V: Into<String>>(params: &mut Params, key: &str, value: V) {
    params.insert(key.to_string(), value.into());
}

fn set_opt(params: &mut Params, key: &str, value: Option<&str>) {
    if let Some(value) = value.filter(|v| !v.is_empty()) {
        set(params, key, value);
    }
}

/// The upload state in a rejected chunk's body. Only a body naming an
/// `offset` tells where to resume.
fn resume_state(body: &[u8]) -> Option<ChunkedUpload> {
    let value: serde_json::Value = serde_json::from_slice(body).ok()?;
    value.get("offset")?;
    serde_json::from_value(value).ok()
}

/// `path` cleaned as an absolute path: `../../a/./b` becomes `/a/b`.
pub(crate) fn clean_path(path: &str) -> String {
    let segments = clean_segments(path);
    if segments.is_empty() {
        return "/".to_string();
    }
    let mut cleaned = String::new();
    for segment in segments {
        cleaned.push('/');
        cleaned.push_str(segment);
    }
    cleaned
}

/// Path segments with `.` and `..` resolved against `/`.
fn clean_segments(path: &str) -> Vec<&str> {
    let mut segments = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }
    segments
}
