//! Endpoint paths for the Gemini API.

/// Base path for models endpoints.
pub const MODELS: &str = "/models";

/// Path of the `generateContent` method for `model`.
///
/// ```
/// use cat_advisor::transport::endpoints;
///
/// let path = endpoints::generate_content("gemini-2.5-flash");
/// assert_eq!(path, "/models/gemini-2.5-flash:generateContent");
/// ```
pub fn generate_content(model: &str) -> String {
    let model = model.trim_start_matches("models/");
    format!("{}/{}:generateContent", MODELS, model)
}
