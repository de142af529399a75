//! Cookie mirror of the consent record, readable without scripting.

use anyhow::{Context, Result, anyhow, bail};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SameSite {
    #[default]
    Strict,
}

impl SameSite {
    pub fn as_str(self) -> &'static str {
        match self {
            SameSite::Strict => "Strict",
        }
    }
}

/// A cookie to be written; `value` is stored unencoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cookie {
    pub name: String,
    pub value: String,
    pub max_age_secs: i64,
    pub path: String,
    pub same_site: SameSite,
}

impl Cookie {
    /// Root-path, `SameSite=Strict` cookie living `max_age_days`.
    pub fn persistent(name: impl Into<String>, value: impl Into<String>, max_age_days: u32) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            max_age_secs: i64::from(max_age_days) * 24 * 60 * 60,
            path: "/".to_string(),
            same_site: SameSite::Strict,
        }
    }

    /// Expired cookie that deletes `name` at the root path.
    pub fn removal(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: String::new(),
            max_age_secs: 0,
            path: "/".to_string(),
            same_site: SameSite::Strict,
        }
    }

    /// Render as a `Set-Cookie` header value.
    pub fn to_header(&self) -> String {
        format!(
            "{}={}; Max-Age={}; Path={}; SameSite={}",
            self.name,
            encode_value(&self.value),
            self.max_age_secs,
            self.path,
            self.same_site.as_str()
        )
    }
}

/// Where cookies live outside a browser.
pub trait CookieJar: Send {
    /// Decoded value of a live cookie.
    fn get(&self, name: &str) -> Result<Option<String>>;
    fn set(&mut self, cookie: &Cookie) -> Result<()>;
    fn remove(&mut self, name: &str) -> Result<()>;
}

/// Percent-encode like `encodeURIComponent`.
pub fn encode_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for byte in value.bytes() {
        let unreserved = byte.is_ascii_alphanumeric()
            || matches!(byte, b'-' | b'_' | b'.' | b'!' | b'~' | b'*' | b'\'' | b'(' | b')');
        if unreserved {
            out.push(byte as char);
        } else {
            out.push_str(&format!("%{byte:02X}"));
        }
    }
    out
}

/// Reverse of [`encode_value`].
pub fn decode_value(value: &str) -> Result<String> {
    let bytes = value.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut idx = 0;
    while idx < bytes.len() {
        if bytes[idx] == b'%' {
            let hex = value
                .get(idx + 1..idx + 3)
                .ok_or_else(|| anyhow!("truncated escape at byte {idx}"))?;
            let byte = u8::from_str_radix(hex, 16)
                .with_context(|| format!("invalid escape %{hex}"))?;
            out.push(byte);
            idx += 3;
        } else {
            out.push(bytes[idx]);
            idx += 1;
        }
    }
    String::from_utf8(out).context("cookie value is not UTF-8")
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredCookie {
    /// Encoded, as it would travel in a header.
    value: String,
    path: String,
    same_site: SameSite,
    expires_at: DateTime<Utc>,
}

/// Jar persisted as a JSON map in one file.
#[derive(Debug, Clone)]
pub struct FileCookieJar {
    path: PathBuf,
}

impl FileCookieJar {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, StoredCookie>> {
        let data = match fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(err) => {
                return Err(err)
                    .with_context(|| format!("reading cookie jar {}", self.path.display()));
            }
        };
        serde_json::from_str(&data)
            .with_context(|| format!("decoding cookie jar {}", self.path.display()))
    }

    fn write_all(&self, cookies: &BTreeMap<String, StoredCookie>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating cookie directory {}", parent.display()))?;
        }
        let contents = serde_json::to_string_pretty(cookies).context("encoding cookie jar")?;
        fs::write(&self.path, contents)
            .with_context(|| format!("writing cookie jar {}", self.path.display()))
    }
}

impl CookieJar for FileCookieJar {
    fn get(&self, name: &str) -> Result<Option<String>> {
        let cookies = self.read_all()?;
        match cookies.get(name) {
            Some(cookie) if cookie.expires_at > Utc::now() => decode_value(&cookie.value).map(Some),
            _ => Ok(None),
        }
    }

    fn set(&mut self, cookie: &Cookie) -> Result<()> {
        if cookie.name.trim().is_empty() {
            bail!("cookie name must not be empty");
        }
        // A bad existing jar is replaced rather than blocking the write.
        let mut cookies = self.read_all().unwrap_or_default();
        if cookie.max_age_secs <= 0 {
            cookies.remove(&cookie.name);
        } else {
            cookies.insert(
                cookie.name.clone(),
                StoredCookie {
                    value: encode_value(&cookie.value),
                    path: cookie.path.clone(),
                    same_site: cookie.same_site,
                    expires_at: Utc::now() + Duration::seconds(cookie.max_age_secs),
                },
            );
        }
        self.write_all(&cookies)
    }

    fn remove(&mut self, name: &str) -> Result<()> {
        let (mut cookies, unreadable) = match self.read_all() {
            Ok(cookies) => (cookies, false),
            Err(err) => {
                warn!("Replacing unreadable cookie jar: {err:#}");
                (BTreeMap::new(), true)
            }
        };
        if cookies.remove(name).is_some() || unreadable {
            self.write_all(&cookies)?;
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
struct MemoryJarInner {
    cookies: BTreeMap<String, Cookie>,
    headers: Vec<String>,
}

/// In-process jar; clones share state and keep every emitted header.
#[derive(Debug, Clone, Default)]
pub struct MemoryCookieJar {
    inner: Arc<Mutex<MemoryJarInner>>,
}

impl MemoryCookieJar {
    pub fn new() -> Self {
        Self::default()
    }

    /// `Set-Cookie` header values emitted so far, oldest first.
    pub fn headers(&self) -> Vec<String> {
        self.inner
            .lock()
            .map(|inner| inner.headers.clone())
            .unwrap_or_default()
    }

    /// Seed a cookie whose raw value was written by another client.
    pub fn insert_raw(&self, name: &str, encoded_value: &str) {
        if let Ok(mut inner) = self.inner.lock() {
            let mut cookie = Cookie::persistent(name, String::new(), 1);
            cookie.value = decode_value(encoded_value).unwrap_or_else(|_| encoded_value.to_string());
            inner.cookies.insert(name.to_string(), cookie);
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, MemoryJarInner>> {
        self.inner
            .lock()
            .map_err(|_| anyhow!("cookie jar lock poisoned"))
    }
}

impl CookieJar for MemoryCookieJar {
    fn get(&self, name: &str) -> Result<Option<String>> {
        Ok(self.lock()?.cookies.get(name).map(|cookie| cookie.value.clone()))
    }

    fn set(&mut self, cookie: &Cookie) -> Result<()> {
        let mut inner = self.lock()?;
        inner.headers.push(cookie.to_header());
        if cookie.max_age_secs <= 0 {
            inner.cookies.remove(&cookie.name);
        } else {
            inner.cookies.insert(cookie.name.clone(), cookie.clone());
        }
        Ok(())
    }

    fn remove(&mut self, name: &str) -> Result<()> {
        self.set(&Cookie::removal(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encoding_matches_encode_uri_component() {
        assert_eq!(
            encode_value(r#"{"accepted":true}"#),
            "%7B%22accepted%22%3Atrue%7D"
        );
        assert_eq!(encode_value("a b,c;d"), "a%20b%2Cc%3Bd");
        assert_eq!(encode_value("keep-_.!~*'()"), "keep-_.!~*'()");
    }

    #[test]
    fn decoding_reverses_encoding() {
        let raw = r#"{"timestamp":"2024-01-01T00:00:00Z","note":"café"}"#;
        assert_eq!(decode_value(&encode_value(raw)).expect("decode"), raw);
        assert!(decode_value("%7").is_err());
        assert!(decode_value("%zz").is_err());
    }

    #[test]
    fn header_carries_expiry_and_same_site() {
        let cookie = Cookie::persistent("portfolio-cookie-consent", "{}", 365);
        assert_eq!(
            cookie.to_header(),
            "portfolio-cookie-consent=%7B%7D; Max-Age=31536000; Path=/; SameSite=Strict"
        );
        assert!(Cookie::removal("x").to_header().contains("Max-Age=0"));
    }

    #[test]
    fn file_jar_round_trips_and_removes() {
        let dir = tempfile::tempdir().expect("temp dir");
        let mut jar = FileCookieJar::new(dir.path().join("cookies.json"));

        assert_eq!(jar.get("consent").expect("empty jar"), None);
        jar.set(&Cookie::persistent("consent", "{\"a\":1}", 365))
            .expect("set cookie");
        assert_eq!(
            jar.get("consent").expect("get cookie").as_deref(),
            Some("{\"a\":1}")
        );

        jar.remove("consent").expect("remove cookie");
        assert_eq!(jar.get("consent").expect("after removal"), None);
    }

    #[test]
    fn file_jar_treats_zero_max_age_as_deletion() {
        let dir = tempfile::tempdir().expect("temp dir");
        let mut jar = FileCookieJar::new(dir.path().join("cookies.json"));
        jar.set(&Cookie::persistent("consent", "1", 1)).expect("set");
        jar.set(&Cookie::removal("consent")).expect("expire");
        assert_eq!(jar.get("consent").expect("get"), None);
    }

    #[test]
    fn file_jar_removal_replaces_corrupt_jar() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("cookies.json");
        fs::write(&path, "{not json").expect("write corrupt jar");
        let mut jar = FileCookieJar::new(&path);

        jar.remove("consent").expect("remove survives corrupt jar");
        assert_eq!(jar.get("consent").expect("jar readable again"), None);

        fs::write(&path, "[]").expect("write corrupt jar");
        jar.set(&Cookie::persistent("consent", "1", 1)).expect("set");
        jar.remove("consent").expect("remove");
        assert_eq!(jar.get("consent").expect("get"), None);
    }

    #[test]
    fn memory_jar_records_headers() {
        let jar = MemoryCookieJar::new();
        let mut writer = jar.clone();
        writer.set(&Cookie::persistent("c", "v", 1)).expect("set");
        writer.remove("c").expect("remove");

        let headers = jar.headers();
        assert_eq!(headers.len(), 2);
        assert!(headers[1].starts_with("c=; Max-Age=0"));
        assert_eq!(jar.get("c").expect("get"), None);
    }
}
