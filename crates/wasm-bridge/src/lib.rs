//! WASM bridge for the GovMap dashboard
//! Exposes a [`Dashboard`] handle to JavaScript; every call is forwarded to a
//! [`DashboardSession`] held in thread-local storage.

use std::fmt::Display;
use std::sync::Once;

use govmap_config::{ConfigFormat, ConfigParser, DashboardConfig};
use govmap_integration::{
    dispatch_json, query_json, Action, DashboardSession, DispatchSummary, IntegrationError,
};
use govmap_renderer::instance_bytes;
use govmap_shared::errors::ErrorResponse;
use govmap_shared::events::{
    ElementState, MouseButton, MouseScrollDelta, PhysicalPosition, TouchPhase, WindowEvent,
};
use govmap_shared::GovMapError;
use uuid::Uuid;
use wasm_bindgen::prelude::*;

pub mod instance_manager;

use instance_manager::InstanceManager;

static INIT: Once = Once::new();

fn init_runtime() {
    INIT.call_once(|| {
        console_error_panic_hook::set_once();
        let _ = console_log::init_with_level(log::Level::Info);
    });
}

/// Errors cross the boundary as [`ErrorResponse`] JSON
fn to_js(error: impl Into<GovMapError>, operation: &str) -> JsValue {
    let response = ErrorResponse::new(error.into()).with_context("Dashboard", operation);
    JsValue::from_str(&response.to_json())
}

fn internal(error: impl Display, operation: &str) -> JsValue {
    to_js(
        GovMapError::Internal {
            message: error.to_string(),
        },
        operation,
    )
}

#[cfg(target_arch = "wasm32")]
fn now_ms() -> f64 {
    js_sys::Date::now()
}

#[cfg(not(target_arch = "wasm32"))]
fn now_ms() -> f64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map_or(0.0, |d| d.as_secs_f64() * 1000.0)
}

fn summary_json(summary: &DispatchSummary, operation: &str) -> Result<String, JsValue> {
    serde_json::to_string(summary).map_err(|e| internal(e, operation))
}

#[wasm_bindgen]
pub struct Dashboard {
    instance_id: Uuid,
}

#[wasm_bindgen]
impl Dashboard {
    /// Create a dashboard from an optional JSON configuration
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: Option<String>) -> Result<Dashboard, JsValue> {
        init_runtime();
        let config = match config_json {
            Some(json) => ConfigParser::parse_string(&json, ConfigFormat::Json)
                .map_err(|e| to_js(IntegrationError::from(e), "new"))?,
            None => DashboardConfig::default(),
        };
        let session = DashboardSession::new(config).map_err(|e| to_js(e, "new"))?;
        let instance_id = InstanceManager::create_instance(session);
        log::info!("Dashboard {instance_id} created");
        Ok(Dashboard { instance_id })
    }

    /// Fetch every dataset; resolves to the JSON load report
    #[wasm_bindgen]
    pub async fn load(&self) -> Result<String, JsValue> {
        let data = InstanceManager::with_instance(&self.instance_id, |instance| {
            instance.session.data()
        })
        .ok_or_else(|| self.not_found("load"))?;

        let report = data.load_all().await;
        if report.failures() > 0 {
            log::warn!("{} dataset segment(s) failed to load", report.failures());
        }
        serde_json::to_string(&report).map_err(|e| internal(e, "load"))
    }

    /// Apply a JSON-encoded action; returns the JSON dispatch summary
    #[wasm_bindgen]
    pub fn dispatch(&self, action_json: &str) -> Result<String, JsValue> {
        let now = now_ms();
        InstanceManager::with_instance_mut(&self.instance_id, |instance| {
            dispatch_json(&mut instance.session, action_json, now)
                .map_err(|e| to_js(e, "dispatch"))
        })
        .ok_or_else(|| self.not_found("dispatch"))?
        .and_then(|summary| summary_json(&summary, "dispatch"))
    }

    /// Answer a JSON-encoded view request
    #[wasm_bindgen]
    pub fn query(&self, request_json: &str) -> Result<String, JsValue> {
        let now = now_ms();
        InstanceManager::with_instance_mut(&self.instance_id, |instance| {
            query_json(&mut instance.session, request_json, now).map_err(|e| to_js(e, "query"))
        })
        .ok_or_else(|| self.not_found("query"))?
    }

    /// Node instance records of the current frame, ready for upload
    #[wasm_bindgen]
    pub fn instance_buffer(&self) -> Result<js_sys::Uint8Array, JsValue> {
        let now = now_ms();
        InstanceManager::with_instance_mut(&self.instance_id, |instance| {
            let records = instance.session.frame(now).instances();
            js_sys::Uint8Array::from(instance_bytes(&records))
        })
        .ok_or_else(|| self.not_found("instance_buffer"))
    }

    /// Replace the configuration; returns the changed section names as JSON
    #[wasm_bindgen]
    pub fn update_config(&self, config_json: &str) -> Result<String, JsValue> {
        let config = ConfigParser::parse_string(config_json, ConfigFormat::Json)
            .map_err(|e| to_js(IntegrationError::from(e), "update_config"))?;
        let changed = InstanceManager::with_instance_mut(&self.instance_id, |instance| {
            instance
                .session
                .update_config(config)
                .map_err(|e| to_js(e, "update_config"))
        })
        .ok_or_else(|| self.not_found("update_config"))??;
        serde_json::to_string(&changed).map_err(|e| internal(e, "update_config"))
    }

    #[wasm_bindgen]
    pub fn resize(&self, width: f64, height: f64) -> Result<String, JsValue> {
        log::info!("Resizing dashboard to: {width}x{height}");
        self.apply(Action::Resize { width, height }, "resize")
    }

    /// Advance viewport transitions; call once per animation frame
    #[wasm_bindgen]
    pub fn tick(&self) -> Result<String, JsValue> {
        self.apply(Action::Tick, "tick")
    }

    #[wasm_bindgen]
    pub fn handle_mouse_wheel(&self, delta_y: f64) -> Result<String, JsValue> {
        let event = WindowEvent::MouseWheel {
            delta: MouseScrollDelta::PixelDelta(PhysicalPosition::new(0.0, delta_y)),
            phase: TouchPhase::Moved,
        };
        self.apply(Action::Pointer(event), "handle_mouse_wheel")
    }

    #[wasm_bindgen]
    pub fn handle_mouse_move(&self, x: f64, y: f64) -> Result<String, JsValue> {
        let event = WindowEvent::CursorMoved {
            position: PhysicalPosition::new(x, y),
        };
        self.apply(Action::Pointer(event), "handle_mouse_move")
    }

    #[wasm_bindgen]
    pub fn handle_mouse_click(&self, pressed: bool) -> Result<String, JsValue> {
        let event = WindowEvent::MouseInput {
            state: if pressed {
                ElementState::Pressed
            } else {
                ElementState::Released
            },
            button: MouseButton::Left,
        };
        self.apply(Action::Pointer(event), "handle_mouse_click")
    }

    #[wasm_bindgen]
    pub fn handle_pinch(&self, scale: f64, x: f64, y: f64, ended: bool) -> Result<String, JsValue> {
        let event = WindowEvent::PinchZoom {
            scale,
            center: PhysicalPosition::new(x, y),
            phase: if ended {
                TouchPhase::Ended
            } else {
                TouchPhase::Moved
            },
        };
        self.apply(Action::Pointer(event), "handle_pinch")
    }

    /// Release the session; the handle is unusable afterwards
    #[wasm_bindgen]
    pub fn destroy(&self) {
        if InstanceManager::remove_instance(&self.instance_id).is_some() {
            log::info!("Dashboard {} destroyed", self.instance_id);
        }
    }
}

impl Dashboard {
    fn not_found(&self, operation: &str) -> JsValue {
        to_js(
            GovMapError::InstanceNotFound {
                id: self.instance_id.to_string(),
            },
            operation,
        )
    }

    fn apply(&self, action: Action, operation: &str) -> Result<String, JsValue> {
        let now = now_ms();
        let summary = InstanceManager::with_instance_mut(&self.instance_id, |instance| {
            DispatchSummary::from(instance.session.dispatch(action, now))
        })
        .ok_or_else(|| self.not_found(operation))?;
        summary_json(&summary, operation)
    }
}
