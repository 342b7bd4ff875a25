//! Picture-in-picture overlay geometry.
//!
//! The overlay rectangle is kept fully inside the host area and never smaller
//! than the minimum size. Every drag or resize step is clamped, not just the
//! end of the gesture.

use egui::{pos2, vec2, CursorIcon, Pos2, Rect, Vec2};

use crate::config::OverlayConfig;

/// Overlay rectangle in host coordinates (pixels)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayGeometry {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub visible: bool,
}

impl OverlayGeometry {
    pub fn rect(&self) -> Rect {
        Rect::from_min_size(pos2(self.x, self.y), vec2(self.width, self.height))
    }

    pub fn contains(&self, pos: Pos2) -> bool {
        self.rect().contains(pos)
    }

    /// Check the bounds invariant against a host size, to within float rounding
    pub fn fits(&self, host: Vec2, min_size: f32) -> bool {
        const EPS: f32 = 1e-3;
        let min_w = min_size.min(host.x);
        let min_h = min_size.min(host.y);
        self.x >= 0.0
            && self.y >= 0.0
            && self.x + self.width <= host.x + EPS
            && self.y + self.height <= host.y + EPS
            && self.width >= min_w - EPS
            && self.height >= min_h - EPS
    }
}

/// Edge or corner grabbed for a resize
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeHandle {
    Top,
    Bottom,
    Left,
    Right,
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl ResizeHandle {
    pub fn moves_left(self) -> bool {
        matches!(self, Self::Left | Self::TopLeft | Self::BottomLeft)
    }

    pub fn moves_right(self) -> bool {
        matches!(self, Self::Right | Self::TopRight | Self::BottomRight)
    }

    pub fn moves_top(self) -> bool {
        matches!(self, Self::Top | Self::TopLeft | Self::TopRight)
    }

    pub fn moves_bottom(self) -> bool {
        matches!(self, Self::Bottom | Self::BottomLeft | Self::BottomRight)
    }

    /// Pointer shape to show while hovering this handle
    pub fn cursor(self) -> CursorIcon {
        match self {
            Self::TopLeft | Self::BottomRight => CursorIcon::ResizeNwSe,
            Self::TopRight | Self::BottomLeft => CursorIcon::ResizeNeSw,
            Self::Top | Self::Bottom => CursorIcon::ResizeVertical,
            Self::Left | Self::Right => CursorIcon::ResizeHorizontal,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Gesture {
    Drag {
        origin: OverlayGeometry,
        start: Pos2,
    },
    Resize {
        handle: ResizeHandle,
        origin: OverlayGeometry,
        start: Pos2,
    },
}

/// Owns the overlay rectangle and applies pointer gestures to it
#[derive(Debug, Clone)]
pub struct OverlayManager {
    geometry: OverlayGeometry,
    host: Vec2,
    min_size: f32,
    grip_margin: f32,
    gesture: Option<Gesture>,
}

impl OverlayManager {
    pub fn new(geometry: OverlayGeometry, host: Vec2, min_size: f32, grip_margin: f32) -> Self {
        let mut manager = Self {
            geometry,
            host: sanitize_host(host),
            min_size: min_size.max(1.0),
            grip_margin: grip_margin.max(0.0),
            gesture: None,
        };
        manager.clamp();
        manager
    }

    pub fn from_config(config: &OverlayConfig, host: Vec2) -> Self {
        let geometry = OverlayGeometry {
            x: config.x,
            y: config.y,
            width: config.width,
            height: config.height,
            visible: config.visible,
        };
        Self::new(geometry, host, config.min_size, config.grip_margin)
    }

    pub fn geometry(&self) -> OverlayGeometry {
        self.geometry
    }

    pub fn host_size(&self) -> Vec2 {
        self.host
    }

    pub fn min_size(&self) -> f32 {
        self.min_size
    }

    pub fn is_visible(&self) -> bool {
        self.geometry.visible
    }

    /// Flip visibility. Position and size are remembered.
    pub fn toggle_visible(&mut self) -> bool {
        self.set_visible(!self.geometry.visible);
        self.geometry.visible
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.geometry.visible = visible;
        if !visible {
            self.gesture = None;
        }
    }

    /// The host window changed size; pull the overlay back inside at once
    pub fn set_host_size(&mut self, width: f32, height: f32) {
        self.host = sanitize_host(vec2(width, height));
        self.clamp();
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.gesture, Some(Gesture::Drag { .. }))
    }

    pub fn is_resizing(&self) -> bool {
        matches!(self.gesture, Some(Gesture::Resize { .. }))
    }

    pub fn begin_drag(&mut self, pointer: Pos2) {
        self.gesture = Some(Gesture::Drag {
            origin: self.geometry,
            start: pointer,
        });
    }

    /// Translate by the pointer delta since the drag started
    pub fn drag_to(&mut self, pointer: Pos2) {
        let Some(Gesture::Drag { origin, start }) = self.gesture else {
            return;
        };
        if !is_finite(pointer) {
            return;
        }
        let delta = pointer - start;
        self.geometry.x = origin.x + delta.x;
        self.geometry.y = origin.y + delta.y;
        self.clamp();
    }

    pub fn begin_resize(&mut self, handle: ResizeHandle, pointer: Pos2) {
        self.gesture = Some(Gesture::Resize {
            handle,
            origin: self.geometry,
            start: pointer,
        });
    }

    /// Move the grabbed edges by the pointer delta; the opposite edges stay put
    pub fn resize_to(&mut self, pointer: Pos2) {
        let Some(Gesture::Resize { handle, origin, start }) = self.gesture else {
            return;
        };
        if !is_finite(pointer) {
            return;
        }
        let delta = pointer - start;
        let min_w = self.min_size.min(self.host.x);
        let min_h = self.min_size.min(self.host.y);

        let mut left = origin.x;
        let mut right = origin.x + origin.width;
        let mut top = origin.y;
        let mut bottom = origin.y + origin.height;

        if handle.moves_left() {
            left = (left + delta.x).max(0.0).min(right - min_w);
        }
        if handle.moves_right() {
            right = (right + delta.x).min(self.host.x).max(left + min_w);
        }
        if handle.moves_top() {
            top = (top + delta.y).max(0.0).min(bottom - min_h);
        }
        if handle.moves_bottom() {
            bottom = (bottom + delta.y).min(self.host.y).max(top + min_h);
        }

        self.geometry.x = left;
        self.geometry.y = top;
        self.geometry.width = right - left;
        self.geometry.height = bottom - top;
        self.clamp();
    }

    pub fn end_gesture(&mut self) {
        self.gesture = None;
    }

    /// Edge or corner under the pointer, if it lies in the grip band of a visible overlay
    pub fn handle_at(&self, pointer: Pos2) -> Option<ResizeHandle> {
        if !self.geometry.visible || !self.geometry.contains(pointer) {
            return None;
        }
        let local = pointer - pos2(self.geometry.x, self.geometry.y);
        let m = self.grip_margin;
        let on_left = local.x < m;
        let on_right = local.x > self.geometry.width - m;
        let on_top = local.y < m;
        let on_bottom = local.y > self.geometry.height - m;

        match (on_top, on_bottom, on_left, on_right) {
            (true, _, true, _) => Some(ResizeHandle::TopLeft),
            (true, _, _, true) => Some(ResizeHandle::TopRight),
            (_, true, true, _) => Some(ResizeHandle::BottomLeft),
            (_, true, _, true) => Some(ResizeHandle::BottomRight),
            (true, _, _, _) => Some(ResizeHandle::Top),
            (_, true, _, _) => Some(ResizeHandle::Bottom),
            (_, _, true, _) => Some(ResizeHandle::Left),
            (_, _, _, true) => Some(ResizeHandle::Right),
            _ => None,
        }
    }

    /// Cursor for hover feedback
    pub fn hover_cursor(&self, pointer: Pos2) -> CursorIcon {
        match self.handle_at(pointer) {
            Some(handle) => handle.cursor(),
            None if self.geometry.visible && self.geometry.contains(pointer) => CursorIcon::Grab,
            None => CursorIcon::Default,
        }
    }

    /// Start a resize on the grip band, a drag elsewhere inside the overlay.
    /// Returns false when the press does not hit a visible overlay.
    pub fn pointer_pressed(&mut self, pointer: Pos2) -> bool {
        if !self.geometry.visible || !self.geometry.contains(pointer) {
            return false;
        }
        match self.handle_at(pointer) {
            Some(handle) => self.begin_resize(handle, pointer),
            None => self.begin_drag(pointer),
        }
        true
    }

    pub fn pointer_moved(&mut self, pointer: Pos2) {
        match self.gesture {
            Some(Gesture::Drag { .. }) => self.drag_to(pointer),
            Some(Gesture::Resize { .. }) => self.resize_to(pointer),
            None => {}
        }
    }

    pub fn pointer_released(&mut self) {
        self.end_gesture();
    }

    /// Enforce the bounds invariant
    fn clamp(&mut self) {
        let min_w = self.min_size.min(self.host.x);
        let min_h = self.min_size.min(self.host.y);
        let g = &mut self.geometry;

        g.width = finite_or(g.width, min_w).max(min_w).min(self.host.x);
        g.height = finite_or(g.height, min_h).max(min_h).min(self.host.y);
        g.x = finite_or(g.x, 0.0).max(0.0).min(self.host.x - g.width);
        g.y = finite_or(g.y, 0.0).max(0.0).min(self.host.y - g.height);
    }
}

fn sanitize_host(host: Vec2) -> Vec2 {
    vec2(finite_or(host.x, 0.0).max(0.0), finite_or(host.y, 0.0).max(0.0))
}

fn finite_or(value: f32, fallback: f32) -> f32 {
    if value.is_finite() {
        value
    } else {
        fallback
    }
}

fn is_finite(pos: Pos2) -> bool {
    pos.x.is_finite() && pos.y.is_finite()
}
