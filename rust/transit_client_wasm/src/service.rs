// Translation provider seam

use async_trait::async_trait;

use crate::error::TranslateError;

#[async_trait(?Send)]
pub trait TranslationProvider {
    fn service_name(&self) -> &str;

    /// One outbound request for one piece of text.
    async fn translate(
        &self,
        text: &str,
        source_lang: &str,
        target_lang: &str,
    ) -> Result<String, TranslateError>;
}
