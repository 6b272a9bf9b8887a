//! Prompt data loading.
//!
//! Prompt text for the recommendation endpoint lives in a JSON file so it can
//! be updated without a release. A missing path, missing file, or malformed
//! file never fails startup: the built-in data is used and a warning logged.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Prompt material for the recommendation endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptData {
    pub version: String,
    /// ISO 8601 timestamp of the last edit.
    pub updated_at: String,
    /// Product catalog in Markdown.
    pub catalog: String,
    pub system_prompt: String,
    pub selection_criteria: String,
    pub response_guidelines: String,
}

impl PromptData {
    /// Prompt data compiled into the binary.
    pub fn builtin() -> Self {
        Self {
            version: "builtin".to_string(),
            updated_at: "2025-01-01T00:00:00.000Z".to_string(),
            catalog: "\
### 主食
- **チキン＆ライス**（ベーシックシリーズ）: 高たんぱく、消化にやさしい
- **ライトサーモン**（ウェイトケアシリーズ）: 低脂肪、L-カルニチン配合

### おやつ
- **かつおぶしスティック**（おやつシリーズ）: 1本あたり低カロリー

### ケアフード
- **ユリナリーケア**（ケアシリーズ）: ミネラルバランスに配慮
- **デンタルケア**（ケアシリーズ）: 噛むことで歯垢を落とす形状"
                .to_string(),
            system_prompt: "あなたは猫のフードアドバイザーです。以下の商品カタログの中から、猫の情報に合う商品を提案してください。"
                .to_string(),
            selection_criteria: "\
- 健康上のお悩みがある場合はケアフードを優先する
- 体型が「ちょいおデブ」「おデブちゃん」の場合は低脂肪の商品を選ぶ
- 苦手な食材を含む商品は選ばない"
                .to_string(),
            response_guidelines: "\
- summary にはこの猫の特徴と食事のポイントを2-3文でまとめる
- 各商品の reason には、この猫に合う理由を具体的に書く
- notes には、獣医師への相談を促す注意事項を書く"
                .to_string(),
        }
    }
}

/// Loads [`PromptData`] from an optional JSON file.
#[derive(Debug, Clone, Default)]
pub struct PromptStore {
    path: Option<PathBuf>,
}

impl PromptStore {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Reads the configured file, falling back to [`PromptData::builtin`].
    pub async fn load(&self) -> PromptData {
        let Some(path) = &self.path else {
            tracing::warn!("Prompt data path not configured, using built-in prompt data");
            return PromptData::builtin();
        };

        let text = match tokio::fs::read_to_string(path).await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "Prompt data file unavailable, using built-in prompt data"
                );
                return PromptData::builtin();
            }
        };

        match serde_json::from_str::<PromptData>(&text) {
            Ok(data) => {
                tracing::info!(
                    path = %path.display(),
                    version = %data.version,
                    updated_at = %data.updated_at,
                    "Loaded prompt data"
                );
                data
            }
            Err(e) => {
                tracing::error!(path = %path.display(), error = %e, "Failed to parse prompt data");
                tracing::warn!("Using built-in prompt data");
                PromptData::builtin()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn test_unset_path_uses_builtin() {
        let data = PromptStore::default().load().await;
        assert_eq!(data, PromptData::builtin());
    }

    #[tokio::test]
    async fn test_missing_file_uses_builtin() {
        let dir = tempfile::tempdir().unwrap();
        let store = PromptStore::new(Some(dir.path().join("absent.json")));

        assert_eq!(store.load().await.version, "builtin");
    }

    #[tokio::test]
    async fn test_malformed_file_uses_builtin() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{{\"version\": \"1.0\"").unwrap();

        let store = PromptStore::new(Some(file.path().to_path_buf()));

        assert_eq!(store.load().await.version, "builtin");
    }

    #[tokio::test]
    async fn test_loads_file() {
        let mut file = NamedTempFile::new().unwrap();
        let mut data = PromptData::builtin();
        data.version = "2.1.0".to_string();
        data.catalog = "- 特製カリカリ".to_string();
        file.write_all(serde_json::to_string(&data).unwrap().as_bytes()).unwrap();

        let loaded = PromptStore::new(Some(file.path().to_path_buf())).load().await;

        assert_eq!(loaded.version, "2.1.0");
        assert_eq!(loaded.catalog, "- 特製カリカリ");
    }
}
