//! # External Source Provider
//!
//! Materializes the external repositories generation reads from: the API
//! definition corpus and, for Rust and Dart, a handful of auxiliary corpora.
//!
//! A [`Source`] either points at a local checkout (`dir`), which is used as
//! is, or pins a `commit` together with the SHA-256 of its GitHub archive.
//! Pinned sources are downloaded once, verified, extracted and kept in the
//! [`SourceCache`]. A hash mismatch is fatal and never populates the cache.

use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::time::Duration;

use flate2::read::GzDecoder;
use log::{debug, info};
use sha2::{Digest, Sha256};

use crate::cache::{CacheKey, SourceCache};
use crate::config::{Source, Sources};
use crate::defaults::GOOGLEAPIS_REPO;
use crate::error::{Error, Result};
use crate::language;

pub const DISCOVERY_REPO: &str = "googleapis/discovery-artifact-manager";
pub const SHOWCASE_REPO: &str = "googleapis/gapic-showcase";
pub const PROTOBUF_REPO: &str = "protocolbuffers/protobuf";
pub const CONFORMANCE_REPO: &str = "protocolbuffers/protobuf";

/// Downloads archive bytes - allows mocking in tests
pub trait ArchiveFetcher: Send + Sync {
    fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

/// Fetches archives over HTTPS.
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("clientgen/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(600))
            .build()
            .map_err(|e| Error::Network {
                url: String::new(),
                message: e.to_string(),
            })?;
        Ok(Self { client })
    }
}

impl ArchiveFetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let network = |e: reqwest::Error| Error::Network {
            url: url.to_string(),
            message: e.to_string(),
        };
        let response = self
            .client
            .get(url)
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(network)?;
        let bytes = response.bytes().map_err(network)?;
        Ok(bytes.to_vec())
    }
}

/// Local paths of every corpus a generation run may read.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceBundle {
    pub googleapis: PathBuf,
    pub discovery: Option<PathBuf>,
    pub showcase: Option<PathBuf>,
    pub protobuf: Option<PathBuf>,
    pub conformance: Option<PathBuf>,
}

impl SourceBundle {
    /// A bundle with only the primary corpus.
    pub fn with_googleapis(googleapis: PathBuf) -> Self {
        Self {
            googleapis,
            ..Default::default()
        }
    }
}

/// URL of the GitHub archive of `repo` at `commit`
pub fn archive_url(repo: &str, commit: &str) -> String {
    format!("https://github.com/{}/archive/{}.tar.gz", repo, commit)
}

/// Hex-encoded SHA-256 of `bytes`
pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

pub struct SourceProvider {
    cache: SourceCache,
    fetcher: Box<dyn ArchiveFetcher>,
}

impl SourceProvider {
    /// Create a provider that downloads over HTTPS into `cache_root`.
    pub fn new(cache_root: PathBuf) -> Result<Self> {
        Ok(Self::with_fetcher(cache_root, Box::new(HttpFetcher::new()?)))
    }

    /// Create a provider with a custom fetcher.
    pub fn with_fetcher(cache_root: PathBuf, fetcher: Box<dyn ArchiveFetcher>) -> Self {
        Self {
            cache: SourceCache::new(cache_root),
            fetcher,
        }
    }

    /// Return a local directory holding `source`.
    pub fn load(&self, repo: &str, source: &Source) -> Result<PathBuf> {
        if !source.dir.is_empty() {
            debug!("Using local directory {} for {}", source.dir, repo);
            return Ok(PathBuf::from(&source.dir));
        }
        if source.commit.is_empty() {
            return Err(Error::Config {
                message: format!("source {} must set either dir or commit", repo),
            });
        }
        if source.sha256.is_empty() {
            return Err(Error::Config {
                message: format!("source {} at {} has no sha256", repo, source.commit),
            });
        }

        let key = CacheKey::new(repo, &source.commit);
        let root = match self.cache.get(&key) {
            Some(path) => {
                debug!("Cache hit for {}@{}", repo, source.commit);
                path
            }
            None => self.download(&key, &source.sha256)?,
        };
        if source.subpath.is_empty() {
            Ok(root)
        } else {
            Ok(root.join(&source.subpath))
        }
    }

    fn download(&self, key: &CacheKey, expected: &str) -> Result<PathBuf> {
        let url = archive_url(&key.repo, &key.commit);
        info!("Downloading {}", url);
        let bytes = self.fetcher.fetch(&url)?;

        let actual = sha256_hex(&bytes);
        if !actual.eq_ignore_ascii_case(expected) {
            return Err(Error::Integrity {
                repo: key.repo.clone(),
                expected: expected.to_string(),
                actual,
            });
        }

        let staging = self.cache.staging_dir()?;
        tar::Archive::new(GzDecoder::new(Cursor::new(bytes))).unpack(staging.path())?;
        let top = single_top_level_dir(staging.path())?;
        self.cache.insert(key, &top)
    }

    /// Load the corpora needed to generate `language`.
    pub fn load_bundle(&self, language: &str, sources: &Sources) -> Result<SourceBundle> {
        let googleapis = sources.googleapis.as_ref().ok_or_else(|| Error::Config {
            message: "sources.googleapis is required for generation".to_string(),
        })?;
        let mut bundle = SourceBundle::with_googleapis(self.load(GOOGLEAPIS_REPO, googleapis)?);

        if language == language::RUST || language == language::DART {
            let optional = |repo: &str, source: &Option<Source>| -> Result<Option<PathBuf>> {
                source.as_ref().map(|s| self.load(repo, s)).transpose()
            };
            bundle.discovery = optional(DISCOVERY_REPO, &sources.discovery)?;
            bundle.showcase = optional(SHOWCASE_REPO, &sources.showcase)?;
            bundle.protobuf = optional(PROTOBUF_REPO, &sources.protobuf)?;
            bundle.conformance = optional(CONFORMANCE_REPO, &sources.conformance)?;
        }
        Ok(bundle)
    }
}

fn single_top_level_dir(dir: &Path) -> Result<PathBuf> {
    let mut dirs = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            dirs.push(entry.path());
        }
    }
    match dirs.len() {
        1 => Ok(dirs.remove(0)),
        n => Err(Error::Cache {
            message: format!(
                "expected one top-level directory in archive, found {}",
                n
            ),
        }),
    }
}
