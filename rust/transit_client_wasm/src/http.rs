// Minimal GET client seam over the browser `fetch` API.

use async_trait::async_trait;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Request, RequestInit, RequestMode, Response};

use crate::error::HttpError;
use crate::utils::js_message;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[async_trait(?Send)]
pub trait HttpClient {
    async fn get(&self, url: &str) -> Result<HttpResponse, HttpError>;
}

pub struct FetchClient;

#[async_trait(?Send)]
impl HttpClient for FetchClient {
    async fn get(&self, url: &str) -> Result<HttpResponse, HttpError> {
        let mut init = RequestInit::new();
        init.method("GET");
        init.mode(RequestMode::Cors);

        let request = Request::new_with_str_and_init(url, &init)
            .map_err(|e| HttpError::Request(js_message(&e)))?;
        let window = web_sys::window().ok_or_else(|| HttpError::Request("no window".to_string()))?;

        let value = JsFuture::from(window.fetch_with_request(&request))
            .await
            .map_err(|e| HttpError::Network(js_message(&e)))?;
        let response: Response = value
            .dyn_into()
            .map_err(|_| HttpError::Network("fetch did not resolve to a Response".to_string()))?;

        let status = response.status();
        let text = response.text().map_err(|e| HttpError::Body(js_message(&e)))?;
        let body = JsFuture::from(text)
            .await
            .map_err(|e| HttpError::Body(js_message(&e)))?
            .as_string()
            .unwrap_or_default();

        Ok(HttpResponse { status, body })
    }
}
