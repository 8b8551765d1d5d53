use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, FixedOffset};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::DecodeError;

/// Wire format of every timestamp the API returns, e.g.
/// `Sat, 21 Aug 2010 22:31:20 +0000`.
pub const TIMESTAMP_FORMAT: &str = "%a, %d %b %Y %H:%M:%S %z";

/// A point in time in the API's RFC 1123 style with a numeric zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Timestamp(DateTime<FixedOffset>);

impl Timestamp {
    pub fn new(time: DateTime<FixedOffset>) -> Self {
        Timestamp(time)
    }

    pub fn parse(s: &str) -> Result<Self, DecodeError> {
        DateTime::parse_from_str(s, TIMESTAMP_FORMAT)
            .map(Timestamp)
            .map_err(|e| DecodeError::Timestamp(s.to_string(), e))
    }

    pub fn as_datetime(&self) -> &DateTime<FixedOffset> {
        &self.0
    }

    pub fn into_datetime(self) -> DateTime<FixedOffset> {
        self.0
    }
}

impl From<DateTime<FixedOffset>> for Timestamp {
    fn from(time: DateTime<FixedOffset>) -> Self {
        Timestamp(time)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(TIMESTAMP_FORMAT))
    }
}

impl FromStr for Timestamp {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Timestamp::parse(s)
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Timestamp::parse(&s).map_err(de::Error::custom)
    }
}

/// Metadata of a file or folder.
///
/// Folders listed with their contents carry the children in `contents`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Metadata {
    /// Human readable size, e.g. `225.4KB`.
    pub size: String,
    pub hash: String,
    pub rev: String,
    pub thumb_exists: bool,
    pub bytes: u64,
    pub modified: Option<Timestamp>,
    pub client_mtime: Option<Timestamp>,
    pub path: String,
    pub is_dir: bool,
    pub is_deleted: bool,
    pub icon: String,
    pub root: String,
    pub mime_type: String,
    pub revision: u64,
    pub contents: Vec<Metadata>,
}

/// One change of a delta: the path and its new metadata, `None` when the
/// path was deleted.
///
/// On the wire an entry is the two-element array `[path, metadata|null]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "(String, Option<Metadata>)", into = "(String, Option<Metadata>)")]
pub struct Entry {
    pub path: String,
    pub metadata: Option<Metadata>,
}

impl Entry {
    pub fn is_deletion(&self) -> bool {
        self.metadata.is_none()
    }
}

impl From<(String, Option<Metadata>)> for Entry {
    fn from((path, metadata): (String, Option<Metadata>)) -> Self {
        Entry { path, metadata }
    }
}

impl From<Entry> for (String, Option<Metadata>) {
    fn from(entry: Entry) -> Self {
        (entry.path, entry.metadata)
    }
}

/// A page of changes. When `reset` is set, everything cached from earlier
/// pages must be discarded before applying `entries`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Delta {
    pub entries: Vec<Entry>,
    pub reset: bool,
    /// Pass to the next delta call to resume from this page.
    pub cursor: String,
    pub has_more: bool,
}

/// A link to a file reachable without authentication.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Share {
    pub url: String,
    pub expires: Timestamp,
}

/// A reference that lets another account copy a file without transferring
/// its content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CopyRef {
    pub copy_ref: String,
    pub expires: Timestamp,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccountInfo {
    pub referral_link: String,
    pub display_name: String,
    pub uid: u64,
    pub country: String,
    pub quota_info: QuotaInfo,
}

/// Storage usage in bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuotaInfo {
    pub shared: u64,
    pub quota: u64,
    pub normal: u64,
}

/// State of a chunked upload session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkedUpload {
    pub upload_id: String,
    /// Number of bytes the server has received so far.
    pub offset: u64,
    pub expires: Option<Timestamp>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn file(path: &str) -> Metadata {
        Metadata {
            size: "225.4KB".to_string(),
            rev: "35e97029684fe".to_string(),
            bytes: 230_783,
            path: path.to_string(),
            root: "dropbox".to_string(),
            mime_type: "application/pdf".to_string(),
            revision: 220_823,
            modified: Some(Timestamp::parse("Tue, 19 Jul 2011 21:55:38 +0000").unwrap()),
            ..Default::default()
        }
    }

    #[test]
    fn timestamp_round_trip() {
        let zones = [0, -7 * 3600, 5 * 3600 + 1800];
        for offset in zones.iter() {
            let tz = FixedOffset::east_opt(*offset).unwrap();
            let time = tz.with_ymd_and_hms(2006, 1, 2, 15, 4, 5).unwrap();
            let ts = Timestamp::new(time);
            let back: Timestamp = ts.to_string().parse().unwrap();
            assert_eq!(back, ts);
            assert_eq!(back.as_datetime().offset(), time.offset());
        }
    }

    #[test]
    fn timestamp_format() {
        let tz = FixedOffset::west_opt(7 * 3600).unwrap();
        let ts = Timestamp::new(tz.with_ymd_and_hms(2006, 1, 2, 15, 4, 5).unwrap());
        assert_eq!(ts.to_string(), "Mon, 02 Jan 2006 15:04:05 -0700");
        assert_eq!(
            serde_json::to_string(&ts).unwrap(),
            "\"Mon, 02 Jan 2006 15:04:05 -0700\""
        );
    }

    #[test]
    fn timestamp_rejects_other_formats() {
        assert!(Timestamp::parse("2006-01-02T15:04:05Z").is_err());
        assert!(Timestamp::parse("Mon, 02 Jan 2006 15:04:05 GMT").is_err());
        let share = serde_json::from_str::<Share>(
            r#"{"url": "https://db.tt/c0mFuu1Y", "expires": "tomorrow"}"#,
        );
        assert!(share.is_err());
    }

    #[test]
    fn entry_decodes_from_array() {
        let delta: Delta = serde_json::from_str(
            r#"{
                "entries": [
                    ["/a.txt", {"path": "/a.txt", "bytes": 3, "rev": "1f"}],
                    ["/gone", null]
                ],
                "reset": true,
                "cursor": "AAEb",
                "has_more": false
            }"#,
        )
        .unwrap();
        assert!(delta.reset);
        assert_eq!(delta.cursor, "AAEb");
        assert_eq!(delta.entries.len(), 2);
        assert_eq!(delta.entries[0].path, "/a.txt");
        assert_eq!(delta.entries[0].metadata.as_ref().unwrap().bytes, 3);
        assert!(delta.entries[1].is_deletion());
    }

    #[test]
    fn entry_round_trip() {
        let entries = vec![
            Entry {
                path: "/docs/report.pdf".to_string(),
                metadata: Some(file("/docs/report.pdf")),
            },
            Entry {
                path: "/docs/old.pdf".to_string(),
                metadata: None,
            },
        ];
        for entry in entries {
            let json = serde_json::to_string(&entry).unwrap();
            assert!(json.starts_with("[\""));
            let back: Entry = serde_json::from_str(&json).unwrap();
            assert_eq!(back, entry);
        }
        assert_eq!(
            serde_json::to_string(&Entry {
                path: "/x".to_string(),
                metadata: None
            })
            .unwrap(),
            r#"["/x",null]"#
        );
    }

    #[test]
    fn metadata_with_contents() {
        let meta: Metadata = serde_json::from_str(
            r#"{
                "size": "0 bytes",
                "hash": "37eb1ba1849d4b0fb0b28caf7ef3af52",
                "bytes": 0,
                "thumb_exists": false,
                "rev": "714f029684fe",
                "modified": "Wed, 27 Apr 2011 22:18:51 +0000",
                "path": "/Photos",
                "is_dir": true,
                "icon": "folder",
                "root": "dropbox",
                "contents": [
                    {
                        "size": "2.3 MB",
                        "rev": "38af1b183490",
                        "thumb_exists": true,
                        "bytes": 2453963,
                        "modified": "Mon, 07 Apr 2014 23:13:16 +0000",
                        "client_mtime": "Thu, 29 Aug 2013 01:12:02 +0000",
                        "path": "/Photos/flower.jpg",
                        "is_dir": false,
                        "icon": "page_white_picture",
                        "root": "dropbox",
                        "mime_type": "image/jpeg",
                        "revision": 14511
                    }
                ],
                "revision": 29007
            }"#,
        )
        .unwrap();
        assert!(meta.is_dir);
        assert_eq!(meta.hash, "37eb1ba1849d4b0fb0b28caf7ef3af52");
        assert_eq!(meta.contents.len(), 1);
        let child = &meta.contents[0];
        assert_eq!(child.bytes, 2_453_963);
        assert_eq!(child.mime_type, "image/jpeg");
        assert_eq!(
            child.client_mtime.unwrap().to_string(),
            "Thu, 29 Aug 2013 01:12:02 +0000"
        );
    }

    #[test]
    fn account_info() {
        let info: AccountInfo = serde_json::from_str(
            r#"{
                "referral_link": "https://www.dropbox.com/referrals/r1a2n3d4m5s6t7",
                "display_name": "John P. User",
                "uid": 12345678,
                "country": "US",
                "quota_info": {"shared": 253738410565, "quota": 107374182400000, "normal": 680031877871}
            }"#,
        )
        .unwrap();
        assert_eq!(info.uid, 12_345_678);
        assert_eq!(info.quota_info.quota, 107_374_182_400_000);
    }
}
