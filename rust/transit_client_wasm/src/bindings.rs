// wasm-bindgen exports used by the page scripts.

use std::rc::Rc;

use js_sys::{Function, Promise};
use log::warn;
use serde::{de::DeserializeOwned, Serialize};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::future_to_promise;

use crate::config::{LiveConfig, PollerConfig, TranslatorConfig};
use crate::google::GoogleService;
use crate::http::FetchClient;
use crate::live::browser::{BrowserConnector, WindowScheduler};
use crate::live::{HttpLocationSource, LiveConnection, LocationPoller};
use crate::logging;
use crate::session::{DriverAssignment, Session};
use crate::storage::browser_store;
use crate::translator::Translator;

fn to_js_error(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

// `undefined`/`null` mean "all defaults".
fn config_from_js<T: DeserializeOwned + Default>(value: JsValue) -> Result<T, JsValue> {
    if value.is_undefined() || value.is_null() {
        return Ok(T::default());
    }
    serde_wasm_bindgen::from_value(value).map_err(to_js_error)
}

// Plain objects rather than `Map`s for nested JSON values.
fn to_js<T: Serialize + ?Sized>(value: &T) -> Result<JsValue, JsValue> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(to_js_error)
}

fn call_js(callback: &Function, arg: &JsValue) {
    if let Err(err) = callback.call1(&JsValue::NULL, arg) {
        warn!("js callback threw: {:?}", err);
    }
}

#[wasm_bindgen(js_name = initLogging)]
pub fn init_logging(level: Option<String>) {
    logging::init(logging::parse_level(level.as_deref().unwrap_or("info")));
}

#[wasm_bindgen]
pub struct WasmTranslator {
    inner: Rc<Translator>,
}

#[wasm_bindgen]
impl WasmTranslator {
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> Result<WasmTranslator, JsValue> {
        let config: TranslatorConfig = config_from_js(config)?;
        config.validate().map_err(to_js_error)?;
        let provider = GoogleService::with_endpoint(FetchClient, config.endpoint.clone());
        let translator = Translator::new(&config, Box::new(provider), browser_store());
        Ok(WasmTranslator {
            inner: Rc::new(translator),
        })
    }

    /// Resolves to the translation, or to `text` itself when translation fails.
    pub fn translate(&self, text: String, target_lang: Option<String>) -> Promise {
        let translator = self.inner.clone();
        future_to_promise(async move {
            let translated = match target_lang {
                Some(lang) => translator.translate(&text, &lang).await,
                None => translator.translate_active(&text).await,
            };
            Ok(JsValue::from_str(&translated))
        })
    }

    #[wasm_bindgen(js_name = translateBatch)]
    pub fn translate_batch(
        &self,
        texts: JsValue,
        target_lang: Option<String>,
    ) -> Result<Promise, JsValue> {
        let texts: Vec<String> = serde_wasm_bindgen::from_value(texts).map_err(to_js_error)?;
        let translator = self.inner.clone();
        Ok(future_to_promise(async move {
            let lang = target_lang.unwrap_or_else(|| translator.language());
            let translated = translator.translate_batch(&texts, &lang).await;
            to_js(&translated)
        }))
    }

    #[wasm_bindgen(js_name = setLanguage)]
    pub fn set_language(&self, code: String) {
        self.inner.set_language(&code);
    }

    pub fn language(&self) -> String {
        self.inner.language()
    }

    #[wasm_bindgen(js_name = clearCache)]
    pub fn clear_cache(&self) {
        self.inner.clear_cache();
    }

    #[wasm_bindgen(js_name = cacheSize)]
    pub fn cache_size(&self) -> usize {
        self.inner.cache_len()
    }
}

#[wasm_bindgen]
pub struct WasmLiveConnection {
    inner: LiveConnection,
}

#[wasm_bindgen]
impl WasmLiveConnection {
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> Result<WasmLiveConnection, JsValue> {
        let config: LiveConfig = config_from_js(config)?;
        config.validate().map_err(to_js_error)?;
        Ok(WasmLiveConnection {
            inner: LiveConnection::new(&config, BrowserConnector, WindowScheduler),
        })
    }

    pub fn connect(&self) {
        self.inner.connect();
    }

    pub fn disconnect(&self) {
        self.inner.disconnect();
    }

    /// False when the message was dropped (not connected).
    pub fn send(&self, message: JsValue) -> Result<bool, JsValue> {
        let message: serde_json::Value =
            serde_wasm_bindgen::from_value(message).map_err(to_js_error)?;
        Ok(self.inner.send(&message))
    }

    pub fn state(&self) -> String {
        self.inner.state().as_str().to_string()
    }

    #[wasm_bindgen(js_name = attemptsMade)]
    pub fn attempts_made(&self) -> u32 {
        self.inner.attempts_made()
    }

    /// Latest dispatched message, or `null`.
    pub fn latest(&self) -> Result<JsValue, JsValue> {
        match self.inner.latest() {
            Some(message) => to_js(&message),
            None => Ok(JsValue::NULL),
        }
    }

    #[wasm_bindgen(js_name = onEvent)]
    pub fn on_event(&self, callback: Function) {
        self.inner.subscribe(move |message| match to_js(message) {
            Ok(value) => call_js(&callback, &value),
            Err(err) => warn!("live message not converted for js: {:?}", err),
        });
    }

    #[wasm_bindgen(js_name = onStateChange)]
    pub fn on_state_change(&self, callback: Function) {
        self.inner.on_state_change(move |state| {
            call_js(&callback, &JsValue::from_str(state.as_str()));
        });
    }
}

#[wasm_bindgen]
pub struct WasmLocationPoller {
    inner: LocationPoller,
}

#[wasm_bindgen]
impl WasmLocationPoller {
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> Result<WasmLocationPoller, JsValue> {
        let config: PollerConfig = config_from_js(config)?;
        config.validate().map_err(to_js_error)?;
        let source = HttpLocationSource::new(FetchClient, config.url.clone());
        Ok(WasmLocationPoller {
            inner: LocationPoller::new(&config, source, WindowScheduler),
        })
    }

    pub fn start(&self) {
        self.inner.start();
    }

    pub fn stop(&self) {
        self.inner.stop();
    }

    #[wasm_bindgen(js_name = isRunning)]
    pub fn is_running(&self) -> bool {
        self.inner.is_running()
    }

    #[wasm_bindgen(js_name = onLocation)]
    pub fn on_location(&self, callback: Function) {
        self.inner.subscribe(move |message| match to_js(message) {
            Ok(value) => call_js(&callback, &value),
            Err(err) => warn!("bus location not converted for js: {:?}", err),
        });
    }
}

#[wasm_bindgen]
pub struct WasmSession {
    inner: Session,
}

#[wasm_bindgen]
impl WasmSession {
    #[wasm_bindgen(constructor)]
    pub fn new() -> WasmSession {
        WasmSession {
            inner: Session::new(browser_store()),
        }
    }

    pub fn language(&self) -> Option<String> {
        self.inner.language()
    }

    #[wasm_bindgen(js_name = driverAssignment)]
    pub fn driver_assignment(&self) -> Result<JsValue, JsValue> {
        match self.inner.driver_assignment() {
            Some(assignment) => to_js(&assignment),
            None => Ok(JsValue::NULL),
        }
    }

    #[wasm_bindgen(js_name = setDriverAssignment)]
    pub fn set_driver_assignment(&self, assignment: JsValue) -> Result<(), JsValue> {
        let assignment: DriverAssignment =
            serde_wasm_bindgen::from_value(assignment).map_err(to_js_error)?;
        self.inner
            .set_driver_assignment(&assignment)
            .map_err(to_js_error)
    }

    #[wasm_bindgen(js_name = clearDriverAssignment)]
    pub fn clear_driver_assignment(&self) -> Result<(), JsValue> {
        self.inner.clear_driver_assignment().map_err(to_js_error)
    }
}

impl Default for WasmSession {
    fn default() -> Self {
        Self::new()
    }
}
