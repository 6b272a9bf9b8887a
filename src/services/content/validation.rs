//! Local checks run before a generate content request leaves the process.

use crate::error::{GeminiError, GeminiResult, RequestError, ValidationDetail};
use crate::types::{GenerateContentRequest, GenerationConfig, Part};

/// Validate a generate content request.
pub fn validate_generate_request(request: &GenerateContentRequest) -> GeminiResult<()> {
    let mut details = Vec::new();

    if request.contents.is_empty() {
        details.push(detail("contents", "Contents array cannot be empty"));
    }

    for (idx, content) in request.contents.iter().enumerate() {
        if content.parts.is_empty() {
            details.push(detail(
                &format!("contents[{}].parts", idx),
                "Content must have at least one part",
            ));
        }

        for (part_idx, part) in content.parts.iter().enumerate() {
            if let Part::Text { text, .. } = part {
                if text.trim().is_empty() {
                    details.push(detail(
                        &format!("contents[{}].parts[{}].text", idx, part_idx),
                        "Text cannot be empty",
                    ));
                }
            }
        }
    }

    if let Some(config) = &request.generation_config {
        details.extend(validate_generation_config(config));
    }

    if !details.is_empty() {
        return Err(GeminiError::Request(RequestError::ValidationError {
            message: "Invalid generate content request".to_string(),
            details,
        }));
    }

    Ok(())
}

/// Validate generation configuration, returning one detail per violation.
pub fn validate_generation_config(config: &GenerationConfig) -> Vec<ValidationDetail> {
    let mut details = Vec::new();

    if let Some(temp) = config.temperature {
        if !(0.0..=2.0).contains(&temp) {
            details.push(detail(
                "generation_config.temperature",
                "Temperature must be between 0.0 and 2.0",
            ));
        }
    }

    if let Some(top_p) = config.top_p {
        if !(0.0..=1.0).contains(&top_p) {
            details.push(detail("generation_config.top_p", "top_p must be between 0.0 and 1.0"));
        }
    }

    if let Some(max_tokens) = config.max_output_tokens {
        if max_tokens < 1 {
            details.push(detail(
                "generation_config.max_output_tokens",
                "max_output_tokens must be >= 1",
            ));
        }
    }

    if config.response_schema.is_some() && config.response_json_schema.is_some() {
        details.push(detail(
            "generation_config.response_json_schema",
            "response_schema and response_json_schema are mutually exclusive",
        ));
    }

    let wants_schema = config.response_schema.is_some() || config.response_json_schema.is_some();
    if wants_schema && config.response_mime_type.as_deref() != Some("application/json") {
        details.push(detail(
            "generation_config.response_mime_type",
            "A response schema requires response_mime_type application/json",
        ));
    }

    details
}

fn detail(field: &str, description: &str) -> ValidationDetail {
    ValidationDetail {
        field: field.to_string(),
        description: description.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Content;
    use serde_json::json;

    #[test]
    fn test_valid_request() {
        let request = GenerateContentRequest::from_prompt("hello", GenerationConfig::default());
        assert!(validate_generate_request(&request).is_ok());
    }

    #[test]
    fn test_empty_prompt_is_rejected() {
        let request = GenerateContentRequest::from_prompt("   ", GenerationConfig::default());

        match validate_generate_request(&request) {
            Err(GeminiError::Request(RequestError::ValidationError { details, .. })) => {
                assert_eq!(details[0].field, "contents[0].parts[0].text");
            }
            other => panic!("Expected ValidationError, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_parts() {
        let request = GenerateContentRequest {
            contents: vec![Content { role: None, parts: vec![] }],
            system_instruction: None,
            generation_config: None,
        };
        assert!(validate_generate_request(&request).is_err());
    }

    #[test]
    fn test_schema_requires_json_mime_type() {
        let config = GenerationConfig {
            response_json_schema: Some(json!({"type": "object"})),
            ..Default::default()
        };
        let details = validate_generation_config(&config);

        assert_eq!(details.len(), 1);
        assert_eq!(details[0].field, "generation_config.response_mime_type");
    }

    #[test]
    fn test_out_of_range_sampling() {
        let config = GenerationConfig {
            temperature: Some(3.0),
            top_p: Some(1.5),
            max_output_tokens: Some(0),
            ..Default::default()
        };
        assert_eq!(validate_generation_config(&config).len(), 3);
    }
}
