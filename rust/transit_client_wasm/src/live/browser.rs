// web-sys backed WebSocket connector and window timers.

use log::{debug, warn};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys::{CloseEvent, Event, MessageEvent, WebSocket};

use crate::error::LiveError;
use crate::live::connection::SocketEvents;
use crate::live::transport::{Connector, LocalTask, Scheduler, Socket, TimerId};
use crate::utils::js_message;

pub struct BrowserConnector;

impl Connector for BrowserConnector {
    fn open(&self, url: &str, events: SocketEvents) -> Result<Box<dyn Socket>, LiveError> {
        let ws = WebSocket::new(url).map_err(|e| LiveError::Open {
            url: url.to_string(),
            reason: js_message(&e),
        })?;

        let on_open = {
            let events = events.clone();
            Closure::<dyn FnMut(Event)>::new(move |_: Event| events.opened())
        };
        let on_message = {
            let events = events.clone();
            Closure::<dyn FnMut(MessageEvent)>::new(move |event: MessageEvent| {
                match event.data().as_string() {
                    Some(text) => events.message(&text),
                    None => warn!("ignoring non-text live frame"),
                }
            })
        };
        let on_close = {
            let events = events.clone();
            Closure::<dyn FnMut(CloseEvent)>::new(move |event: CloseEvent| {
                debug!(
                    "live socket closed: code={} clean={} reason={:?}",
                    event.code(),
                    event.was_clean(),
                    event.reason()
                );
                events.closed();
            })
        };
        let on_error = Closure::<dyn FnMut(Event)>::new(move |event: Event| {
            events.errored(&event.type_());
        });

        ws.set_onopen(Some(on_open.as_ref().unchecked_ref()));
        ws.set_onmessage(Some(on_message.as_ref().unchecked_ref()));
        ws.set_onclose(Some(on_close.as_ref().unchecked_ref()));
        ws.set_onerror(Some(on_error.as_ref().unchecked_ref()));

        Ok(Box::new(BrowserSocket {
            ws,
            handlers: Some(SocketHandlers {
                _on_open: on_open,
                _on_message: on_message,
                _on_close: on_close,
                _on_error: on_error,
            }),
        }))
    }
}

struct SocketHandlers {
    _on_open: Closure<dyn FnMut(Event)>,
    _on_message: Closure<dyn FnMut(MessageEvent)>,
    _on_close: Closure<dyn FnMut(CloseEvent)>,
    _on_error: Closure<dyn FnMut(Event)>,
}

struct BrowserSocket {
    ws: WebSocket,
    handlers: Option<SocketHandlers>,
}

impl Socket for BrowserSocket {
    fn send_text(&self, text: &str) -> Result<(), LiveError> {
        self.ws
            .send_with_str(text)
            .map_err(|e| LiveError::Send(js_message(&e)))
    }

    fn close(&self) {
        if let Err(e) = self.ws.close() {
            debug!("live socket close failed: {}", js_message(&e));
        }
    }

    fn is_open(&self) -> bool {
        self.ws.ready_state() == WebSocket::OPEN
    }
}

impl Drop for BrowserSocket {
    fn drop(&mut self) {
        self.ws.set_onopen(None);
        self.ws.set_onmessage(None);
        self.ws.set_onclose(None);
        self.ws.set_onerror(None);
        let ready_state = self.ws.ready_state();
        if ready_state == WebSocket::CONNECTING || ready_state == WebSocket::OPEN {
            Socket::close(self);
        }
        // The socket is usually dropped from inside one of these callbacks;
        // release them on the next tick instead of mid-call.
        if let Some(handlers) = self.handlers.take() {
            wasm_bindgen_futures::spawn_local(async move {
                drop(handlers);
            });
        }
    }
}

pub struct WindowScheduler;

impl Scheduler for WindowScheduler {
    fn schedule(&self, delay_ms: u32, task: Box<dyn FnOnce()>) -> Result<TimerId, LiveError> {
        let window = web_sys::window().ok_or_else(|| LiveError::Timer("no window".to_string()))?;
        // Frees itself after running. A cancelled timer leaks its closure.
        let callback = Closure::once_into_js(move || task());
        let timeout = i32::try_from(delay_ms).unwrap_or(i32::MAX);
        let handle = window
            .set_timeout_with_callback_and_timeout_and_arguments_0(callback.unchecked_ref(), timeout)
            .map_err(|e| LiveError::Timer(js_message(&e)))?;
        Ok(TimerId(handle as u64))
    }

    fn cancel(&self, id: TimerId) {
        if let Some(window) = web_sys::window() {
            window.clear_timeout_with_handle(id.0 as i32);
        }
    }

    fn spawn(&self, task: LocalTask) {
        wasm_bindgen_futures::spawn_local(task);
    }
}
