use serde::{Deserialize, Serialize};

/// One recorded observation of a pool: the user's imputed token holdings
/// and both tokens' USD prices at sample time.
///
/// Field names are serde-renamed so the CSV header row is exactly
/// `timestamp,token0Balance,token1Balance,token0Price,token1Price`.
/// Immutable once written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Seconds since epoch; strictly increasing within one pool's history.
    pub timestamp: i64,
    #[serde(rename = "token0Balance")]
    pub token0_balance: f64,
    #[serde(rename = "token1Balance")]
    pub token1_balance: f64,
    #[serde(rename = "token0Price")]
    pub token0_price: f64,
    #[serde(rename = "token1Price")]
    pub token1_price: f64,
}

/// Ordered sequence of snapshots for one pool, in append = chronological
/// order. Prior rows are never rewritten or deleted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct History {
    snapshots: Vec<Snapshot>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshots(snapshots: Vec<Snapshot>) -> Self {
        Self { snapshots }
    }

    pub fn push(&mut self, snapshot: Snapshot) {
        self.snapshots.push(snapshot);
    }

    pub fn last(&self) -> Option<&Snapshot> {
        self.snapshots.last()
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Snapshot> {
        self.snapshots.iter()
    }
}
