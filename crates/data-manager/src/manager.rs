//! DataManager: fetches the dataset resources, caches raw payloads and
//! publishes parsed snapshots into the stores.
//!
//! Loads are independent per chain. A failed fetch or parse is logged and
//! degrades only its own segment to empty; nothing here is fatal.

use crate::data_store::{
    CoordinateSnapshot, CoordinateStore, LoadTicket, ProposalStore, VotingPatternStore,
    VotingTable,
};
use crate::parser::{parse_coordinates, parse_proposals, parse_voting_patterns, ParseReport};
use futures::future::join_all;
use govmap_config::DataConfig;
use govmap_shared::{ChainId, GovMapError, GovMapResult, ProposalSet};
use lru::LruCache;
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Where dataset resources are read from
#[derive(Debug, Clone)]
pub enum DataSource {
    Url(String),
    Directory(PathBuf),
    Memory(Arc<HashMap<String, Vec<u8>>>),
}

impl DataSource {
    /// HTTP(S) bases become [`DataSource::Url`], anything else a directory.
    /// In the browser every base is a URL.
    pub fn from_base(base: &str) -> Self {
        let is_url = base.starts_with("http://") || base.starts_with("https://");
        if is_url || cfg!(target_arch = "wasm32") {
            DataSource::Url(base.trim_end_matches('/').to_string())
        } else {
            DataSource::Directory(PathBuf::from(base))
        }
    }

    pub fn memory<K, V>(resources: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Vec<u8>>,
    {
        DataSource::Memory(Arc::new(
            resources
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        ))
    }

    async fn fetch(&self, resource: &str) -> GovMapResult<Vec<u8>> {
        match self {
            DataSource::Url(base) => {
                let url = format!("{}/{}", base, resource.trim_start_matches('/'));
                let response = reqwest::get(&url).await.map_err(|e| GovMapError::Network {
                    message: format!("{e} (URL: {url})"),
                })?;
                if response.status() == reqwest::StatusCode::NOT_FOUND {
                    return Err(GovMapError::DataNotFound {
                        resource: resource.to_string(),
                    });
                }
                let response = response
                    .error_for_status()
                    .map_err(|e| GovMapError::DataFetch {
                        resource: resource.to_string(),
                        message: e.to_string(),
                    })?;
                let bytes = response.bytes().await.map_err(|e| GovMapError::DataFetch {
                    resource: resource.to_string(),
                    message: e.to_string(),
                })?;
                Ok(bytes.to_vec())
            }
            DataSource::Directory(root) => {
                let path = root.join(resource);
                std::fs::read(&path).map_err(|e| match e.kind() {
                    std::io::ErrorKind::NotFound => GovMapError::DataNotFound {
                        resource: resource.to_string(),
                    },
                    _ => GovMapError::DataFetch {
                        resource: resource.to_string(),
                        message: format!("{e} ({})", path.display()),
                    },
                })
            }
            DataSource::Memory(resources) => {
                resources
                    .get(resource)
                    .cloned()
                    .ok_or_else(|| GovMapError::DataNotFound {
                        resource: resource.to_string(),
                    })
            }
        }
    }
}

/// Statistics for the DataManager
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DataManagerStats {
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub failed_loads: u64,
    pub dropped_records: u64,
    pub stale_discards: u64,
}

/// Result of loading one segment
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SegmentOutcome {
    pub resource: String,
    pub records: usize,
    pub dropped: usize,
    /// Set when the segment degraded to empty
    pub error: Option<GovMapError>,
    /// False when a newer load superseded this one
    pub committed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChainLoadOutcome {
    pub chain: ChainId,
    pub proposals: SegmentOutcome,
    pub voting_patterns: SegmentOutcome,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadReport {
    pub coordinates: SegmentOutcome,
    pub chains: Vec<ChainLoadOutcome>,
}

impl LoadReport {
    pub fn failures(&self) -> usize {
        let chain_failures = self
            .chains
            .iter()
            .flat_map(|c| [&c.proposals, &c.voting_patterns])
            .filter(|s| s.error.is_some())
            .count();
        chain_failures + usize::from(self.coordinates.error.is_some())
    }
}

/// Owner of the three stores and their loading pipeline
pub struct DataManager {
    source: DataSource,
    config: DataConfig,
    cache: Mutex<LruCache<String, Arc<Vec<u8>>>>,
    coordinates: CoordinateStore,
    voting_patterns: VotingPatternStore,
    proposals: ProposalStore,
    revision: AtomicU64,
    stats: RwLock<DataManagerStats>,
}

impl std::fmt::Debug for DataManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataManager")
            .field("source", &self.source)
            .field("revision", &self.revision())
            .field("cached", &self.cache.lock().len())
            .finish()
    }
}

impl DataManager {
    pub fn new(config: DataConfig) -> Self {
        let source = DataSource::from_base(&config.base_url);
        Self::with_source(config, source)
    }

    pub fn with_source(config: DataConfig, source: DataSource) -> Self {
        let capacity = NonZeroUsize::new(config.cache_entries).unwrap_or(NonZeroUsize::MIN);
        Self {
            source,
            config,
            cache: Mutex::new(LruCache::new(capacity)),
            coordinates: CoordinateStore::new(),
            voting_patterns: VotingPatternStore::new(),
            proposals: ProposalStore::new(),
            revision: AtomicU64::new(0),
            stats: RwLock::new(DataManagerStats::default()),
        }
    }

    pub fn config(&self) -> &DataConfig {
        &self.config
    }

    /// Bumped on every snapshot replacement
    pub fn revision(&self) -> u64 {
        self.revision.load(Ordering::Acquire)
    }

    pub fn stats(&self) -> DataManagerStats {
        self.stats.read().clone()
    }

    pub fn coordinates(&self) -> Arc<CoordinateSnapshot> {
        self.coordinates.snapshot()
    }

    pub fn proposal_store(&self) -> &ProposalStore {
        &self.proposals
    }

    /// Proposal set of `chain`, empty if not loaded
    pub fn proposals(&self, chain: &str) -> Arc<ProposalSet> {
        self.proposals.get(chain).unwrap_or_default()
    }

    /// Voting table of `chain`, empty if not loaded
    pub fn voting_table(&self, chain: &str) -> Arc<VotingTable> {
        self.voting_patterns.get(chain).unwrap_or_default()
    }

    /// Chains known from the configuration or the coordinate dataset
    pub fn chains(&self) -> Vec<ChainId> {
        let mut chains: Vec<ChainId> = self.config.chains.clone();
        chains.extend(self.coordinates().chain_ids().cloned());
        chains.sort();
        chains.dedup();
        chains
    }

    pub fn insert_coordinates(&self, snapshot: CoordinateSnapshot) {
        self.coordinates.insert(snapshot);
        self.bump_revision();
    }

    pub fn insert_proposals(&self, chain: &str, proposals: ProposalSet) {
        self.proposals.insert(chain, proposals);
        self.bump_revision();
    }

    pub fn insert_voting_table(&self, chain: &str, table: VotingTable) {
        self.voting_patterns.insert(chain, table);
        self.bump_revision();
    }

    pub fn clear_cache(&self) {
        self.cache.lock().clear();
    }

    /// Load the coordinate dataset and every configured chain in parallel
    pub async fn load_all(&self) -> LoadReport {
        let chains = self.config.chains.clone();
        let (coordinates, chains) = futures::join!(
            self.load_coordinates(),
            join_all(chains.iter().map(|chain| self.load_chain(chain)))
        );
        let report = LoadReport {
            coordinates,
            chains,
        };
        log::info!(
            "Loaded {} chain(s), {} degraded segment(s), revision {}",
            report.chains.len(),
            report.failures(),
            self.revision()
        );
        report
    }

    pub async fn load_coordinates(&self) -> SegmentOutcome {
        let ticket = self.coordinates.issue_ticket();
        let resource = self.config.coordinates_path.clone();
        let (snapshot, mut outcome) = self
            .load_segment(&resource, parse_coordinates, |s: &CoordinateSnapshot| {
                s.global.len() + s.chains.values().map(Vec::len).sum::<usize>()
            })
            .await;
        outcome.committed = self.coordinates.commit(&ticket, snapshot);
        self.after_commit(&ticket, outcome)
    }

    /// Load proposals and voting patterns of one chain concurrently
    pub async fn load_chain(&self, chain: &str) -> ChainLoadOutcome {
        let proposal_ticket = self.proposals.issue_ticket(chain);
        let votes_ticket = self.voting_patterns.issue_ticket(chain);
        let proposal_resource = self.config.proposals_resource(chain);
        let votes_resource = self.config.voting_patterns_resource(chain);

        let ((proposals, mut proposal_outcome), (table, mut votes_outcome)) = futures::join!(
            self.load_segment(&proposal_resource, parse_proposals, ProposalSet::len),
            self.load_segment(&votes_resource, parse_voting_patterns, VotingTable::len)
        );

        proposal_outcome.committed = self.proposals.commit(&proposal_ticket, proposals);
        votes_outcome.committed = self.voting_patterns.commit(&votes_ticket, table);

        ChainLoadOutcome {
            chain: chain.to_string(),
            proposals: self.after_commit(&proposal_ticket, proposal_outcome),
            voting_patterns: self.after_commit(&votes_ticket, votes_outcome),
        }
    }

    fn after_commit(&self, ticket: &LoadTicket, outcome: SegmentOutcome) -> SegmentOutcome {
        if outcome.committed {
            self.bump_revision();
        } else {
            self.stats.write().stale_discards += 1;
            log::debug!("Load of {} for {} was superseded", outcome.resource, ticket.chain);
        }
        outcome
    }

    /// Fetch and parse one resource, degrading to the empty value on failure
    async fn load_segment<T: Default>(
        &self,
        resource: &str,
        parse: fn(&str, &[u8]) -> GovMapResult<ParseReport<T>>,
        count: fn(&T) -> usize,
    ) -> (T, SegmentOutcome) {
        let parsed = match self.fetch_resource(resource).await {
            Ok(bytes) => parse(resource, &bytes),
            Err(e) => Err(e),
        };

        match parsed {
            Ok(report) => {
                if report.dropped > 0 {
                    self.stats.write().dropped_records += report.dropped as u64;
                    log::warn!("Dropped {} malformed record(s) from {resource}", report.dropped);
                }
                let outcome = SegmentOutcome {
                    resource: resource.to_string(),
                    records: count(&report.value),
                    dropped: report.dropped,
                    error: None,
                    committed: false,
                };
                (report.value, outcome)
            }
            Err(error) => {
                self.stats.write().failed_loads += 1;
                log::warn!("Failed to load {resource}, using empty data: {error}");
                let outcome = SegmentOutcome {
                    resource: resource.to_string(),
                    records: 0,
                    dropped: 0,
                    error: Some(error),
                    committed: false,
                };
                (T::default(), outcome)
            }
        }
    }

    /// Raw payload of `resource`, served from the LRU cache when present
    pub async fn fetch_resource(&self, resource: &str) -> GovMapResult<Arc<Vec<u8>>> {
        if let Some(bytes) = self.cache.lock().get(resource).cloned() {
            self.stats.write().cache_hits += 1;
            return Ok(bytes);
        }
        self.stats.write().cache_misses += 1;

        let bytes = Arc::new(self.source.fetch(resource).await?);
        self.cache.lock().put(resource.to_string(), bytes.clone());
        Ok(bytes)
    }

    fn bump_revision(&self) {
        self.revision.fetch_add(1, Ordering::AcqRel);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_source_from_base() {
        assert!(matches!(
            DataSource::from_base("https://example.com/data/"),
            DataSource::Url(url) if url == "https://example.com/data"
        ));
        assert!(matches!(
            DataSource::from_base("./data"),
            DataSource::Directory(path) if path == PathBuf::from("./data")
        ));
    }

    #[tokio::test]
    async fn test_missing_memory_resource() {
        let manager = DataManager::with_source(
            DataConfig::default(),
            DataSource::memory(Vec::<(String, Vec<u8>)>::new()),
        );
        let err = manager.fetch_resource("coordinates.json").await.unwrap_err();
        assert!(matches!(err, GovMapError::DataNotFound { .. }));
        assert_eq!(manager.stats().cache_misses, 1);
    }

    #[tokio::test]
    async fn test_payloads_are_cached() {
        let source = DataSource::memory([("proposals/cosmos.json", b"{}".to_vec())]);
        let manager = DataManager::with_source(DataConfig::default(), source);

        manager.fetch_resource("proposals/cosmos.json").await.unwrap();
        manager.fetch_resource("proposals/cosmos.json").await.unwrap();

        let stats = manager.stats();
        assert_eq!(stats.cache_hits, 1);
        assert_eq!(stats.cache_misses, 1);
    }

    #[test]
    fn test_inserts_bump_revision() {
        let manager = DataManager::new(DataConfig::default());
        assert_eq!(manager.revision(), 0);
        manager.insert_proposals("cosmos", ProposalSet::default());
        manager.insert_voting_table("cosmos", VotingTable::default());
        assert_eq!(manager.revision(), 2);
        assert!(manager.proposals("juno").is_empty());
    }
}
