use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

/// Storage backend types
///
/// Defined in core because backend selection is part of configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    S3,
    Local,
}

impl FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "s3" => Ok(StorageBackend::S3),
            "local" => Ok(StorageBackend::Local),
            _ => Err(anyhow::anyhow!("Invalid storage backend: {}", s)),
        }
    }
}

impl Display for StorageBackend {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            StorageBackend::S3 => write!(f, "s3"),
            StorageBackend::Local => write!(f, "local"),
        }
    }
}

/// Where scan verdicts come from: a bucket scanner that publishes verdict
/// documents next to the scanned object, or a ClamAV daemon scanning on demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanSourceKind {
    Sidecar,
    Clamav,
}

impl FromStr for ScanSourceKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sidecar" => Ok(ScanSourceKind::Sidecar),
            "clamav" => Ok(ScanSourceKind::Clamav),
            _ => Err(anyhow::anyhow!("Invalid scan source: {}", s)),
        }
    }
}

impl Display for ScanSourceKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            ScanSourceKind::Sidecar => write!(f, "sidecar"),
            ScanSourceKind::Clamav => write!(f, "clamav"),
        }
    }
}

/// Notification delivery backend types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotifyBackend {
    Api,
    Smtp,
}

impl FromStr for NotifyBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "api" => Ok(NotifyBackend::Api),
            "smtp" => Ok(NotifyBackend::Smtp),
            _ => Err(anyhow::anyhow!("Invalid notify backend: {}", s)),
        }
    }
}

impl Display for NotifyBackend {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            NotifyBackend::Api => write!(f, "api"),
            NotifyBackend::Smtp => write!(f, "smtp"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_round_trips() {
        assert_eq!("s3".parse::<StorageBackend>().unwrap(), StorageBackend::S3);
        assert_eq!(StorageBackend::Local.to_string(), "local");
        assert_eq!(
            "clamav".parse::<ScanSourceKind>().unwrap(),
            ScanSourceKind::Clamav
        );
        assert_eq!("smtp".parse::<NotifyBackend>().unwrap(), NotifyBackend::Smtp);
        assert!("nfs".parse::<StorageBackend>().is_err());
    }
}
