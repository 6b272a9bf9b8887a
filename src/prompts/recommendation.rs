//! Product recommendation prompt and its response schema.

use once_cell::sync::Lazy;
use serde_json::{json, Value};

use super::diagnosis::cat_profile_section;
use super::store::PromptData;
use crate::domain::{CatInfo, MAX_RECOMMENDATIONS};

static RECOMMENDATION_SCHEMA: Lazy<Value> = Lazy::new(|| {
    json!({
        "type": "object",
        "properties": {
            "summary": {
                "type": "string",
                "description": "この猫の特徴と食事のポイントをまとめた診断サマリ"
            },
            "recommendations": {
                "type": "array",
                "maxItems": MAX_RECOMMENDATIONS,
                "items": {
                    "type": "object",
                    "properties": {
                        "name": {"type": "string", "description": "商品名"},
                        "category": {"type": "string", "description": "主食/おやつ/ケアフード"},
                        "series": {"type": "string", "description": "シリーズ名"},
                        "reason": {"type": "string", "description": "この猫に推奨する理由"},
                        "features": {
                            "type": "array",
                            "items": {"type": "string"},
                            "description": "商品の特徴（2-3項目）"
                        }
                    },
                    "required": ["name", "category", "series", "reason", "features"]
                }
            },
            "notes": {"type": "string", "description": "注意事項・免責"}
        },
        "required": ["summary", "recommendations", "notes"]
    })
});

/// JSON schema the model output must follow; deserializes into
/// [`RecommendationResult`](crate::domain::RecommendationResult).
pub fn recommendation_schema() -> &'static Value {
    &RECOMMENDATION_SCHEMA
}

/// Builds the recommendation prompt from the loaded prompt data.
pub fn build_recommendation_prompt(data: &PromptData, cat: &CatInfo) -> String {
    format!(
        "{system}

## 商品カタログ

{catalog}

## 商品選定基準

{criteria}

{profile}

## 回答ガイドライン

{guidelines}

推奨商品は最大{max}つまでとしてください。",
        system = data.system_prompt.trim(),
        catalog = data.catalog.trim(),
        criteria = data.selection_criteria.trim(),
        profile = cat_profile_section(cat),
        guidelines = data.response_guidelines.trim(),
        max = MAX_RECOMMENDATIONS,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RecommendationResult;
    use crate::fixtures::sample_cat;

    #[test]
    fn test_prompt_sections_in_order() {
        let data = PromptData {
            version: "test".to_string(),
            updated_at: "2024-05-01T00:00:00Z".to_string(),
            catalog: "- チキン缶".to_string(),
            system_prompt: "あなたはフードアドバイザーです。".to_string(),
            selection_criteria: "体型を優先".to_string(),
            response_guidelines: "やさしく".to_string(),
        };

        let prompt = build_recommendation_prompt(&data, &sample_cat());

        let system = prompt.find("あなたはフードアドバイザーです。").unwrap();
        let catalog = prompt.find("- チキン缶").unwrap();
        let profile = prompt.find("- **名前**: みーちゃん").unwrap();
        let guidelines = prompt.find("やさしく").unwrap();
        assert!(system < catalog && catalog < profile && profile < guidelines);
        assert!(prompt.ends_with("推奨商品は最大3つまでとしてください。"));
    }

    #[test]
    fn test_schema_requires_result_fields() {
        let schema = recommendation_schema();

        assert_eq!(schema["required"], json!(["summary", "recommendations", "notes"]));
        assert_eq!(schema["properties"]["recommendations"]["maxItems"], 3);
    }

    #[test]
    fn test_schema_shaped_value_deserializes() {
        let value = json!({
            "summary": "s",
            "recommendations": [{
                "name": "n", "category": "主食", "series": "x", "reason": "r", "features": ["a"]
            }],
            "notes": "n"
        });
        let result: RecommendationResult = serde_json::from_value(value).unwrap();
        assert_eq!(result.recommendations.len(), 1);
    }
}
