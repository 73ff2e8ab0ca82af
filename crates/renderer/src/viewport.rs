//! Zoom/pan transform of the map container
//!
//! Unit-square content is mapped onto the container (`x * width`,
//! `y * height`) and then through `screen = content * scale + translate`.

use govmap_config::ViewportConfig;
use govmap_shared::events::{
    ElementState, MouseButton, MouseScrollDelta, PhysicalPosition, TouchPhase, WindowEvent,
};
use serde::Serialize;

/// Pointer travel below which a press/release pair counts as a click
const CLICK_SLOP_PX: f64 = 3.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Transform {
    pub scale: f64,
    pub tx: f64,
    pub ty: f64,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Transform = Transform {
        scale: 1.0,
        tx: 0.0,
        ty: 0.0,
    };

    pub fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        (x * self.scale + self.tx, y * self.scale + self.ty)
    }

    pub fn invert(&self, x: f64, y: f64) -> (f64, f64) {
        ((x - self.tx) / self.scale, (y - self.ty) / self.scale)
    }

    fn lerp(&self, to: &Transform, t: f64) -> Transform {
        Transform {
            scale: self.scale + (to.scale - self.scale) * t,
            tx: self.tx + (to.tx - self.tx) * t,
            ty: self.ty + (to.ty - self.ty) * t,
        }
    }
}

/// Offset bounds for content larger (or smaller) than its container by `slack`
fn clamp_offset(offset: f64, slack: f64) -> f64 {
    if slack >= 0.0 {
        offset.clamp(-slack, 0.0)
    } else {
        offset.clamp(0.0, -slack)
    }
}

pub fn ease_cubic_in_out(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Transition {
    from: Transform,
    to: Transform,
    start_ms: f64,
    duration_ms: f64,
}

impl Transition {
    fn progress(&self, now_ms: f64) -> f64 {
        if self.duration_ms <= 0.0 {
            1.0
        } else {
            ((now_ms - self.start_ms) / self.duration_ms).clamp(0.0, 1.0)
        }
    }

    fn at(&self, now_ms: f64) -> Transform {
        self.from.lerp(&self.to, ease_cubic_in_out(self.progress(now_ms)))
    }
}

/// What handling one pointer event produced
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ViewportResponse {
    pub transform_changed: bool,
    /// Set on a left press/release without dragging
    pub click: Option<PhysicalPosition>,
    /// Cursor position after a move, for hover hit-testing
    pub hover: Option<PhysicalPosition>,
}

#[derive(Debug, Clone)]
pub struct Viewport {
    config: ViewportConfig,
    width: f64,
    height: f64,
    transform: Transform,
    transition: Option<Transition>,
    cursor: PhysicalPosition,
    drag: Option<(PhysicalPosition, Transform)>,
    dragged: bool,
}

impl Viewport {
    pub fn new(width: f64, height: f64, config: ViewportConfig) -> Self {
        Self {
            config,
            width: width.max(1.0),
            height: height.max(1.0),
            transform: Transform::IDENTITY,
            transition: None,
            cursor: PhysicalPosition::new(-1.0, -1.0),
            drag: None,
            dragged: false,
        }
    }

    pub fn size(&self) -> (f64, f64) {
        (self.width, self.height)
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        self.width = width.max(1.0);
        self.height = height.max(1.0);
        self.transform = self.clamp(self.transform);
    }

    pub fn set_config(&mut self, config: ViewportConfig) {
        self.config = config;
        self.transform = self.clamp(self.transform);
    }

    /// Transform at `now_ms`, interpolated while a reset is running
    pub fn transform_at(&self, now_ms: f64) -> Transform {
        match &self.transition {
            Some(transition) => transition.at(now_ms),
            None => self.transform,
        }
    }

    pub fn is_transitioning(&self, now_ms: f64) -> bool {
        self.transition.is_some_and(|t| t.progress(now_ms) < 1.0)
    }

    /// Finish a reset whose time has elapsed
    pub fn tick(&mut self, now_ms: f64) {
        if let Some(transition) = self.transition {
            if transition.progress(now_ms) >= 1.0 {
                self.transform = transition.to;
                self.transition = None;
            }
        }
    }

    /// Animate back to identity
    pub fn reset(&mut self, now_ms: f64) {
        let from = self.transform_at(now_ms);
        self.transition = Some(Transition {
            from,
            to: Transform::IDENTITY,
            start_ms: now_ms,
            duration_ms: self.config.reset_transition_ms,
        });
        self.transform = Transform::IDENTITY;
        log::debug!("Viewport reset from scale {:.2}", from.scale);
    }

    /// Freeze a running reset at its current value
    fn settle(&mut self, now_ms: f64) {
        if let Some(transition) = self.transition.take() {
            self.transform = transition.at(now_ms);
        }
    }

    /// Unit-square point to container pixels
    pub fn unit_to_screen(&self, x: f64, y: f64, now_ms: f64) -> (f64, f64) {
        self.transform_at(now_ms).apply(x * self.width, y * self.height)
    }

    /// Container pixel to unit-square point
    pub fn screen_to_unit(&self, x: f64, y: f64, now_ms: f64) -> (f64, f64) {
        let (cx, cy) = self.transform_at(now_ms).invert(x, y);
        (cx / self.width, cy / self.height)
    }

    /// Clamp scale to the zoom limits and translation so the content edge
    /// stays within `(scaled - container) / 2` of the centred position
    fn clamp(&self, t: Transform) -> Transform {
        let scale = t.scale.clamp(self.config.min_zoom, self.config.max_zoom);
        Transform {
            scale,
            tx: clamp_offset(t.tx, self.width * scale - self.width),
            ty: clamp_offset(t.ty, self.height * scale - self.height),
        }
    }

    /// Zoom by `factor` keeping the content point under `anchor` fixed
    pub fn zoom_at(&mut self, factor: f64, anchor: PhysicalPosition, now_ms: f64) -> bool {
        self.settle(now_ms);
        let current = self.transform;
        let scale = (current.scale * factor).clamp(self.config.min_zoom, self.config.max_zoom);
        let (cx, cy) = current.invert(anchor.x, anchor.y);
        let next = self.clamp(Transform {
            scale,
            tx: anchor.x - cx * scale,
            ty: anchor.y - cy * scale,
        });
        self.transform = next;
        next != current
    }

    pub fn pan_by(&mut self, dx: f64, dy: f64, now_ms: f64) -> bool {
        self.settle(now_ms);
        let current = self.transform;
        self.transform = self.clamp(Transform {
            tx: current.tx + dx,
            ty: current.ty + dy,
            ..current
        });
        self.transform != current
    }

    pub fn handle_event(&mut self, event: &WindowEvent, now_ms: f64) -> ViewportResponse {
        let mut response = ViewportResponse::default();
        match *event {
            WindowEvent::MouseWheel { delta, .. } => {
                let MouseScrollDelta::PixelDelta(delta) = delta;
                let factor = 2f64.powf(-delta.y * self.config.wheel_factor);
                response.transform_changed = self.zoom_at(factor, self.cursor, now_ms);
            }
            WindowEvent::PinchZoom {
                scale,
                center,
                phase,
            } => {
                if phase != TouchPhase::Ended && scale.is_finite() && scale > 0.0 {
                    response.transform_changed = self.zoom_at(scale, center, now_ms);
                }
            }
            WindowEvent::CursorMoved { position } => {
                self.cursor = position;
                match self.drag {
                    Some((origin, start)) => {
                        let (dx, dy) = (position.x - origin.x, position.y - origin.y);
                        if dx.hypot(dy) > CLICK_SLOP_PX {
                            self.dragged = true;
                        }
                        if self.dragged {
                            let next = self.clamp(Transform {
                                tx: start.tx + dx,
                                ty: start.ty + dy,
                                ..start
                            });
                            response.transform_changed = next != self.transform;
                            self.transform = next;
                        }
                    }
                    None => response.hover = Some(position),
                }
            }
            WindowEvent::MouseInput {
                state: ElementState::Pressed,
                button: MouseButton::Left,
            } => {
                self.settle(now_ms);
                self.drag = Some((self.cursor, self.transform));
                self.dragged = false;
            }
            WindowEvent::MouseInput {
                state: ElementState::Released,
                button: MouseButton::Left,
            } => {
                if self.drag.take().is_some() && !self.dragged {
                    response.click = Some(self.cursor);
                }
                self.dragged = false;
            }
            WindowEvent::MouseInput { .. } => {}
        }
        response
    }
}
