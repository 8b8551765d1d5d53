use crate::client::clean_path;
use crate::decode::parse_json;
use crate::transport::post_form;
use crate::{Client, Metadata, Params, Result};

/// Where [`Client::copy`] takes the file from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CopySource<'a> {
    /// A path in the same account.
    Path(&'a str),
    /// A reference obtained with [`Client::copy_ref`], possibly by another
    /// account.
    CopyRef(&'a str),
}

// File operations take paths relative to the root, which is sent as a
// parameter instead of being part of the URL. Paths are cleaned the same way
// as rooted URLs.
impl Client {
    fn fileops_params(&self) -> Params {
        let mut params = self.params(true);
        params.insert("root".to_string(), self.root().as_str().to_string());
        params
    }

    /// Copies a file or folder to `to_path`.
    pub async fn copy(&self, to_path: &str, from: CopySource<'_>) -> Result<Metadata> {
        let url = self.api_url("fileops/copy")?;
        let mut params = self.fileops_params();
        params.insert("to_path".to_string(), clean_path(to_path));
        match from {
            CopySource::Path(p) => params.insert("from_path".to_string(), clean_path(p)),
            CopySource::CopyRef(r) => params.insert("from_copy_ref".to_string(), r.to_string()),
        };
        parse_json(post_form(self.session(), url, params).await?).await
    }

    pub async fn create_folder(&self, path: &str) -> Result<Metadata> {
        let url = self.api_url("fileops/create_folder")?;
        let mut params = self.fileops_params();
        params.insert("path".to_string(), clean_path(path));
        parse_json(post_form(self.session(), url, params).await?).await
    }

    /// Deletes a file or folder; the returned metadata has `is_deleted` set.
    pub async fn delete(&self, path: &str) -> Result<Metadata> {
        let url = self.api_url("fileops/delete")?;
        let mut params = self.fileops_params();
        params.insert("path".to_string(), clean_path(path));
        parse_json(post_form(self.session(), url, params).await?).await
    }

    /// Moves or renames a file or folder.
    pub async fn move_to(&self, from_path: &str, to_path: &str) -> Result<Metadata> {
        let url = self.api_url("fileops/move")?;
        let mut params = self.fileops_params();
        params.insert("from_path".to_string(), clean_path(from_path));
        params.insert("to_path".to_string(), clean_path(to_path));
        parse_json(post_form(self.session(), url, params).await?).await
    }
}
