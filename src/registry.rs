//! Simulated agent table loaded from CSV.
//!
//! Rows are `ip,if_count,delay_ms` after a header line. Loading is best
//! effort: short rows are skipped and unparseable numbers become zero.

use std::{
    collections::BTreeMap,
    fs::File,
    io::Read,
    net::IpAddr,
    path::{Path, PathBuf},
};

use thiserror::Error;

/// Largest interface count a simulated device may have; larger values are clamped.
pub const MAX_IF_COUNT: u32 = 10_000;

/// Per-agent behaviour.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub struct AgentConfig {
    /// Number of interfaces exposed in the IF-MIB tables.
    pub if_count: u32,
    /// Negative: drop every request. Zero: answer immediately. Positive: answer after this many ms.
    pub delay_ms: i64,
}

impl AgentConfig {
    /// True when the agent simulates a dead device.
    pub fn is_failing(&self) -> bool {
        self.delay_ms < 0
    }
}

/// Errors that abort loading the agent table.
#[derive(Error, Debug)]
pub enum ConfigLoadError {
    #[error("Cannot open agent table {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Cannot read agent table: {0}")]
    Read(#[from] csv::Error),
}

/// Immutable mapping from agent key (IP address text) to its configuration.
#[derive(Debug, Default, Clone)]
pub struct AgentRegistry {
    agents: BTreeMap<String, AgentConfig>,
}

impl AgentRegistry {
    /// Loads the agent table from a CSV file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigLoadError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| ConfigLoadError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_reader(file)
    }

    /// Loads the agent table from any CSV source. The first row is always a header.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, ConfigLoadError> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut agents = BTreeMap::new();

        for (line, result) in rdr.records().enumerate() {
            let record = match result {
                Ok(record) => record,
                Err(e) if e.is_io_error() => return Err(e.into()),
                Err(e) => {
                    log::warn!("Skipping unreadable agent row {}: {}", line + 2, e);
                    continue;
                }
            };

            if record.len() < 3 {
                log::debug!("Skipping short agent row {}: {:?}", line + 2, record);
                continue;
            }

            let key = canonical_key(&record[0]);
            let mut if_count = parse_or_zero(&record[1]).max(0);
            if if_count > i64::from(MAX_IF_COUNT) {
                log::warn!(
                    "[{}] Interface count {} exceeds {}, clamping",
                    key,
                    if_count,
                    MAX_IF_COUNT
                );
                if_count = i64::from(MAX_IF_COUNT);
            }
            let config = AgentConfig {
                if_count: if_count as u32,
                delay_ms: parse_or_zero(&record[2]),
            };

            if agents.insert(key.clone(), config).is_some() {
                log::warn!("Duplicate agent {} in table, later row wins", key);
            }
        }

        Ok(AgentRegistry { agents })
    }

    /// Builds a registry directly from entries.
    pub fn from_entries<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, AgentConfig)>,
        K: Into<String>,
    {
        AgentRegistry {
            agents: entries
                .into_iter()
                .map(|(k, v)| {
                    let key: String = k.into();
                    (canonical_key(&key), v)
                })
                .collect(),
        }
    }

    /// Returns the configuration for `key`, `None` when the key is not simulated.
    pub fn lookup(&self, key: &str) -> Option<&AgentConfig> {
        self.agents.get(key)
    }

    /// Iterates over all agents in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &AgentConfig)> {
        self.agents.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}

/// IP addresses are keyed by their canonical text, which is what lookups use.
fn canonical_key(raw: &str) -> String {
    match raw.parse::<IpAddr>() {
        Ok(ip) => ip.to_string(),
        Err(_) => raw.to_string(),
    }
}

fn parse_or_zero(field: &str) -> i64 {
    field.parse().unwrap_or(0)
}
