//! Test fixtures.
//!
//! Loaders for the JSON files under `src/fixtures/`: recorded Gemini
//! responses (`content/`), Gemini error bodies (`errors/`), a sample cat
//! (`cats/`), and prompt data (`prompts/`).

use std::path::PathBuf;

use crate::domain::CatInfo;

/// Get the path to a fixture file.
pub fn fixture_path(relative_path: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("src")
        .join("fixtures")
        .join(relative_path)
}

/// Load a fixture file as a string.
pub fn load_fixture(relative_path: &str) -> String {
    std::fs::read_to_string(fixture_path(relative_path))
        .unwrap_or_else(|e| panic!("Failed to load fixture {}: {}", relative_path, e))
}

/// Load a JSON fixture and parse it.
pub fn load_json_fixture<T: serde::de::DeserializeOwned>(relative_path: &str) -> T {
    let content = load_fixture(relative_path);
    serde_json::from_str(&content)
        .unwrap_or_else(|e| panic!("Failed to parse JSON fixture {}: {}", relative_path, e))
}

/// みーちゃん, the cat used across tests.
pub fn sample_cat() -> CatInfo {
    load_json_fixture("cats/mii_chan.json")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompts::PromptData;
    use crate::types::GenerateContentResponse;

    #[test]
    fn test_fixture_path() {
        let path = fixture_path("content/success_response.json");
        assert!(path.to_string_lossy().contains("fixtures"));
        assert!(path.to_string_lossy().contains("content"));
    }

    #[test]
    fn test_content_fixtures_parse() {
        let success: GenerateContentResponse = load_json_fixture("content/success_response.json");
        let empty: GenerateContentResponse = load_json_fixture("content/empty_response.json");

        assert!(success.text().unwrap().starts_with("みーちゃんちゃん"));
        assert!(empty.text().map_or(true, |text| text.is_empty()));
    }

    #[test]
    fn test_sample_cat_is_valid() {
        let cat = sample_cat();
        assert_eq!(cat.name, "みーちゃん");
        assert!(cat.validate().is_ok());
    }

    #[test]
    fn test_prompt_data_fixture() {
        let data: PromptData = load_json_fixture("prompts/prompt_data.json");
        assert_eq!(data.version, "1.2.0");
    }
}
