use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackupKind {
    Auto,
    Manual,
}

impl BackupKind {
    pub fn as_str(self) -> &'static str {
        match self {
            BackupKind::Auto => "auto",
            BackupKind::Manual => "manual",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupVersion {
    #[serde(rename = "type")]
    pub kind: BackupKind,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    #[serde(alias = "key")]
    pub storage_key: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupMetadata {
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub last_manual_backup: Option<OffsetDateTime>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub last_auto_backup: Option<OffsetDateTime>,
    #[serde(default)]
    pub backup_versions: Vec<BackupVersion>,
}

impl BackupMetadata {
    pub fn count(&self, kind: BackupKind) -> usize {
        self.backup_versions
            .iter()
            .filter(|version| version.kind == kind)
            .count()
    }

    pub fn find(&self, storage_key: &str) -> Option<&BackupVersion> {
        self.backup_versions
            .iter()
            .find(|version| version.storage_key == storage_key)
    }
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::{BackupKind, BackupMetadata};

    #[test]
    fn reads_legacy_key_field_and_null_timestamps() {
        let raw = r#"{
            "lastManualBackup": null,
            "lastAutoBackup": "2024-01-05T10:00:00.000Z",
            "backupVersions": [
                {
                    "type": "auto",
                    "timestamp": "2024-01-05T10:00:00.000Z",
                    "key": "auto_backup_2024-01-05T10:00:00.000Z"
                }
            ]
        }"#;
        let metadata: BackupMetadata = serde_json::from_str(raw).expect("metadata should parse");
        assert!(metadata.last_manual_backup.is_none());
        assert_eq!(
            metadata.last_auto_backup,
            Some(datetime!(2024-01-05 10:00 UTC))
        );
        assert_eq!(metadata.count(BackupKind::Auto), 1);
        assert!(metadata
            .find("auto_backup_2024-01-05T10:00:00.000Z")
            .is_some());

        let value = serde_json::to_value(&metadata).expect("metadata should serialize");
        assert_eq!(value["backupVersions"][0]["type"], "auto");
        assert!(value["backupVersions"][0].get("storageKey").is_some());
    }

    #[test]
    fn empty_document_is_default() {
        let metadata: BackupMetadata = serde_json::from_str("{}").expect("empty parses");
        assert_eq!(metadata, BackupMetadata::default());
    }
}
