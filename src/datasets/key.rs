//! Benchmark dataset identifiers

use crate::error::{FraudBenchError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One of the eight fraud-domain benchmark datasets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatasetKey {
    /// Fake job postings
    FakeJob,
    /// Vehicle loan defaults
    VehicleLoan,
    /// Malicious URLs
    MalUrl,
    /// IEEE-CIS card-not-present transactions
    IeeeCis,
    /// Credit-card fraud
    CcFraud,
    /// E-commerce fraud
    FraudEcom,
    /// Twitter bot accounts
    TwitterBot,
    /// IP blocklist
    IpBlock,
}

impl DatasetKey {
    pub const ALL: [DatasetKey; 8] = [
        DatasetKey::FakeJob,
        DatasetKey::VehicleLoan,
        DatasetKey::MalUrl,
        DatasetKey::IeeeCis,
        DatasetKey::CcFraud,
        DatasetKey::FraudEcom,
        DatasetKey::TwitterBot,
        DatasetKey::IpBlock,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DatasetKey::FakeJob => "fakejob",
            DatasetKey::VehicleLoan => "vehicleloan",
            DatasetKey::MalUrl => "malurl",
            DatasetKey::IeeeCis => "ieeecis",
            DatasetKey::CcFraud => "ccfraud",
            DatasetKey::FraudEcom => "fraudecom",
            DatasetKey::TwitterBot => "twitterbot",
            DatasetKey::IpBlock => "ipblock",
        }
    }

    /// Short human description, used by `fraud-bench list`
    pub fn description(&self) -> &'static str {
        match self {
            DatasetKey::FakeJob => "fraudulent job postings",
            DatasetKey::VehicleLoan => "vehicle loan default",
            DatasetKey::MalUrl => "malicious URLs",
            DatasetKey::IeeeCis => "IEEE-CIS e-commerce transactions",
            DatasetKey::CcFraud => "credit-card transactions",
            DatasetKey::FraudEcom => "e-commerce purchases",
            DatasetKey::TwitterBot => "twitter bot accounts",
            DatasetKey::IpBlock => "IP blocklisting",
        }
    }
}

impl fmt::Display for DatasetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DatasetKey {
    type Err = FraudBenchError;

    fn from_str(s: &str) -> Result<Self> {
        let lower = s.trim().to_lowercase();
        DatasetKey::ALL
            .iter()
            .copied()
            .find(|k| k.as_str() == lower)
            .ok_or_else(|| FraudBenchError::UnknownDataset(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_all_keys() {
        for key in DatasetKey::ALL {
            assert_eq!(key.as_str().parse::<DatasetKey>().unwrap(), key);
        }
        assert_eq!("IEEECIS".parse::<DatasetKey>().unwrap(), DatasetKey::IeeeCis);
    }

    #[test]
    fn test_unknown_key() {
        let err = "paysim".parse::<DatasetKey>().unwrap_err();
        assert!(matches!(err, FraudBenchError::UnknownDataset(ref k) if k == "paysim"));
    }

    #[test]
    fn test_serde_lowercase() {
        let json = serde_json::to_string(&DatasetKey::TwitterBot).unwrap();
        assert_eq!(json, "\"twitterbot\"");
        let key: DatasetKey = serde_json::from_str("\"malurl\"").unwrap();
        assert_eq!(key, DatasetKey::MalUrl);
    }
}
