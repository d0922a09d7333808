//! Institutional investor flow.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Daily net buy/sell (in shares) of the three institutional investor groups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstitutionalFlow {
    pub symbol: String,
    pub date: NaiveDate,
    /// Foreign investors net buy
    pub foreign_net: i64,
    /// Investment trusts net buy
    pub trust_net: i64,
    /// Dealers net buy
    pub dealer_net: i64,
}

impl InstitutionalFlow {
    pub fn total_net(&self) -> i64 {
        self.foreign_net + self.trust_net + self.dealer_net
    }

    /// Number of groups that were net buyers.
    pub fn buyers(&self) -> usize {
        [self.foreign_net, self.trust_net, self.dealer_net]
            .iter()
            .filter(|v| **v > 0)
            .count()
    }
}
