// Google Translate, free `translate_a/single` endpoint.
// GET with query parameters; the answer is a nested array where each
// translated sentence sits at [0][i][0].

use async_trait::async_trait;
use serde_json::Value;
use url::Url;

use crate::config::GOOGLE_FREE_ENDPOINT;
use crate::error::TranslateError;
use crate::http::HttpClient;
use crate::service::TranslationProvider;

pub struct GoogleService<C> {
    client: C,
    endpoint: String,
}

impl<C: HttpClient> GoogleService<C> {
    pub fn new(client: C) -> Self {
        Self::with_endpoint(client, GOOGLE_FREE_ENDPOINT)
    }

    pub fn with_endpoint(client: C, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }

    pub fn request_url(
        &self,
        text: &str,
        source_lang: &str,
        target_lang: &str,
    ) -> Result<Url, TranslateError> {
        let url = Url::parse_with_params(
            &self.endpoint,
            &[
                ("client", "gtx"),
                ("sl", source_lang),
                ("tl", target_lang),
                ("dt", "t"),
                ("q", text),
            ],
        )?;
        Ok(url)
    }
}

#[async_trait(?Send)]
impl<C: HttpClient> TranslationProvider for GoogleService<C> {
    fn service_name(&self) -> &str {
        "google"
    }

    async fn translate(
        &self,
        text: &str,
        source_lang: &str,
        target_lang: &str,
    ) -> Result<String, TranslateError> {
        let url = self.request_url(text, source_lang, target_lang)?;
        let response = self.client.get(url.as_str()).await?;
        if !response.is_success() {
            return Err(TranslateError::Status(response.status));
        }
        parse_google_json_response(&response.body)
    }
}

/// Joins the translated sentence segments in order.
pub fn parse_google_json_response(response: &str) -> Result<String, TranslateError> {
    let json: Value = serde_json::from_str(response)
        .map_err(|e| TranslateError::MalformedResponse(format!("JSON parse error: {}", e)))?;

    let segments = json
        .get(0)
        .and_then(Value::as_array)
        .ok_or_else(|| TranslateError::MalformedResponse("missing segment array".to_string()))?;

    let translated: String = segments
        .iter()
        .filter_map(|segment| segment.get(0).and_then(Value::as_str))
        .collect();

    if translated.is_empty() {
        return Err(TranslateError::MalformedResponse(
            "no translated segments".to_string(),
        ));
    }
    Ok(translated)
}
