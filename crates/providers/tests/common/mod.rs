use bestiary_providers::ProviderConfig;

pub const TEXT_KEY: &str = "sk-text-test";
pub const IMAGE_KEY: &str = "sd-image-test";
pub const FALLBACK_KEY: &str = "sk-fallback-test";

/// Provider configuration pointing every endpoint at a mock server.
pub fn test_config(base_url: &str) -> ProviderConfig {
    ProviderConfig {
        text_api_url: format!("{base_url}/v1/completions"),
        text_api_key: TEXT_KEY.to_string(),
        text_model: "test-model".to_string(),
        image_api_url: format!("{base_url}/api/v3/text2img"),
        image_api_key: IMAGE_KEY.to_string(),
        fallback_image_api_url: format!("{base_url}/v1/images/generations"),
        fallback_image_api_key: FALLBACK_KEY.to_string(),
        request_timeout_secs: 5,
    }
}
