//! The retained tree node: frame, transform, visibility, recognizers, and
//! parent/child linkage, plus hit-testing and coordinate conversion.

use crate::boundary::{DisplayList, DrawMetrics, LayerContent};
use crate::recognizer::{Recognizer, RecognizerKindTag};
use layerkit_foundation::{Matrix, Point, Rect, Scalar, Size, Vector};
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

/// Insets extending (or, if negative, shrinking) a layer's effective touch
/// region beyond its frame.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TouchAreaExtension {
    pub left: Scalar,
    pub top: Scalar,
    pub right: Scalar,
    pub bottom: Scalar,
}

/// Anything that a layer needs from the tree it is (transitively) attached
/// to: requesting layout/redraw, scheduling deferred events, and allocating
/// stable layer ids. `LayerRoot` is the only implementor.
pub trait LayerHost {
    fn request_layout(&self);
    fn set_child_needs_display(&self);
    fn request_focus(&self);
    fn allocate_layer_id(&self) -> u64;
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BoxShadow {
    pub dx: Scalar,
    pub dy: Scalar,
    pub blur_radius: Scalar,
    pub color: u32,
}

pub(crate) struct LayerData {
    id: Option<u64>,
    frame: Rect,
    translation: Vector,
    scale_x: Scalar,
    scale_y: Scalar,
    rotation: Scalar,
    /// Fractional anchor within the layer's own frame (0,0 = top-left,
    /// 0.5,0.5 = center), used as the pivot for scale/rotation.
    anchor: Point,
    visible: bool,
    clips_to_bounds: bool,
    opacity: Scalar,
    background_color: Option<u32>,
    border_radius: Scalar,
    box_shadow: Option<BoxShadow>,
    border_width: Scalar,
    border_color: Option<u32>,
    mask_layer: Option<Layer>,
    intrinsic_size: Option<Size>,
    children: Vec<Layer>,
    parent: Option<Weak<RefCell<LayerData>>>,
    touch_enabled: bool,
    touch_area_extension: TouchAreaExtension,
    accessibility_id: Option<String>,
    recognizers: Vec<Rc<RefCell<Recognizer>>>,
    parent_change_listener: Option<Box<dyn FnMut(Option<Layer>)>>,
    host: Option<Weak<dyn LayerHost>>,
    needs_layout: bool,
    content: Option<Box<dyn LayerContent>>,
}

impl std::fmt::Debug for LayerData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LayerData")
            .field("id", &self.id)
            .field("frame", &self.frame)
            .field("children", &self.children.len())
            .finish()
    }
}

/// A mutable tree node participating in drawing, hit-testing and gesture
/// routing. Cheaply cloneable (an `Rc` handle); children are owned strongly,
/// the parent link is weak, avoiding a reference cycle.
/// Weak back-reference from a recognizer (or any external observer) to the
/// layer it is attached to.
pub type WeakLayer = Weak<RefCell<LayerData>>;

#[derive(Clone)]
pub struct Layer(Rc<RefCell<LayerData>>);

impl PartialEq for Layer {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl std::fmt::Debug for Layer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.borrow().fmt(f)
    }
}

impl Default for Layer {
    fn default() -> Self {
        Self::new()
    }
}

impl Layer {
    pub fn new() -> Self {
        Layer(Rc::new(RefCell::new(LayerData {
            id: None,
            frame: Rect::make_empty(),
            translation: Vector::ZERO,
            scale_x: 1.0,
            scale_y: 1.0,
            rotation: 0.0,
            anchor: Point::new(0.5, 0.5),
            visible: true,
            clips_to_bounds: false,
            opacity: 1.0,
            background_color: None,
            border_radius: 0.0,
            box_shadow: None,
            border_width: 0.0,
            border_color: None,
            mask_layer: None,
            intrinsic_size: None,
            children: Vec::new(),
            parent: None,
            touch_enabled: true,
            touch_area_extension: TouchAreaExtension::default(),
            accessibility_id: None,
            recognizers: Vec::new(),
            parent_change_listener: None,
            host: None,
            needs_layout: true,
            content: None,
        })))
    }

    pub fn id(&self) -> Option<u64> {
        self.0.borrow().id
    }

    pub fn set_content(&self, content: Box<dyn LayerContent>) {
        self.0.borrow_mut().content = Some(content);
    }

    pub fn set_parent_change_listener(&self, listener: Box<dyn FnMut(Option<Layer>)>) {
        self.0.borrow_mut().parent_change_listener = Some(listener);
    }

    // --- Frame & transform -------------------------------------------------

    pub fn frame(&self) -> Rect {
        self.0.borrow().frame
    }

    pub fn set_frame(&self, frame: Rect) {
        let mut data = self.0.borrow_mut();
        if data.frame != frame {
            data.frame = frame;
            data.needs_layout = true;
        }
    }

    pub fn set_translation(&self, translation: Vector) {
        self.0.borrow_mut().translation = translation;
    }

    pub fn set_scale(&self, scale_x: Scalar, scale_y: Scalar) {
        let mut data = self.0.borrow_mut();
        data.scale_x = scale_x;
        data.scale_y = scale_y;
    }

    pub fn set_rotation(&self, radians: Scalar) {
        self.0.borrow_mut().rotation = radians;
    }

    pub fn set_anchor(&self, anchor: Point) {
        self.0.borrow_mut().anchor = anchor;
    }

    pub fn set_visible(&self, visible: bool) {
        self.0.borrow_mut().visible = visible;
    }

    pub fn visible(&self) -> bool {
        self.0.borrow().visible
    }

    pub fn set_clips_to_bounds(&self, clips: bool) {
        self.0.borrow_mut().clips_to_bounds = clips;
    }

    pub fn set_opacity(&self, opacity: Scalar) {
        self.0.borrow_mut().opacity = opacity;
    }

    pub fn set_background_color(&self, color: Option<u32>) {
        self.0.borrow_mut().background_color = color;
    }

    pub fn set_border_radius(&self, radius: Scalar) {
        self.0.borrow_mut().border_radius = radius;
    }

    pub fn set_box_shadow(&self, shadow: Option<BoxShadow>) {
        self.0.borrow_mut().box_shadow = shadow;
    }

    pub fn set_border(&self, width: Scalar, color: Option<u32>) {
        let mut data = self.0.borrow_mut();
        data.border_width = width;
        data.border_color = color;
    }

    pub fn set_mask_layer(&self, mask: Option<Layer>) {
        self.0.borrow_mut().mask_layer = mask;
    }

    pub fn set_intrinsic_size(&self, size: Option<Size>) {
        self.0.borrow_mut().intrinsic_size = size;
    }

    pub fn set_touch_enabled(&self, enabled: bool) {
        self.0.borrow_mut().touch_enabled = enabled;
    }

    pub fn touch_enabled(&self) -> bool {
        self.0.borrow().touch_enabled
    }

    pub fn set_touch_area_extension(&self, extension: TouchAreaExtension) {
        self.0.borrow_mut().touch_area_extension = extension;
    }

    pub fn set_accessibility_id(&self, id: Option<String>) {
        self.0.borrow_mut().accessibility_id = id;
    }

    /// The affine transform mapping this layer's local coordinates (origin
    /// at the frame's top-left) into its parent's coordinate space.
    pub fn to_parent(&self) -> Matrix {
        let data = self.0.borrow();
        let anchor_point = Point::new(
            data.frame.left + data.anchor.x * data.frame.width(),
            data.frame.top + data.anchor.y * data.frame.height(),
        );
        let origin = Matrix::translation(data.frame.left, data.frame.top);
        let extra = Matrix::from_components(
            data.translation,
            data.scale_x,
            data.scale_y,
            data.rotation,
            Point::new(anchor_point.x - data.frame.left, anchor_point.y - data.frame.top),
        );
        origin.concat(&extra)
    }

    /// The affine transform mapping this layer's local coordinates all the
    /// way up into the root's coordinate space.
    pub fn absolute_transform(&self) -> Matrix {
        match self.parent() {
            Some(parent) => parent.absolute_transform().concat(&self.to_parent()),
            None => self.to_parent(),
        }
    }

    /// The axis-aligned bounding box of this layer's own frame transformed
    /// by `to_parent()`.
    pub fn visual_frame(&self) -> Rect {
        bounding_box(&self.to_parent(), self.local_rect())
    }

    /// The axis-aligned bounding box of this layer's own frame transformed
    /// all the way up into root space.
    pub fn absolute_visual_frame(&self) -> Rect {
        bounding_box(&self.absolute_transform(), self.local_rect())
    }

    fn local_rect(&self) -> Rect {
        let f = self.frame();
        Rect::make_xywh(0.0, 0.0, f.width(), f.height())
    }

    pub fn convert_point_from_parent(&self, point: Point) -> Point {
        self.to_parent().invert().unwrap_or_else(Matrix::identity).apply(point)
    }

    pub fn convert_point_to_parent(&self, point: Point) -> Point {
        self.to_parent().apply(point)
    }

    /// Converts `point`, given in `self`'s local space, into `descendant`'s
    /// local space. Returns `None` if `descendant` is not reachable from
    /// `self` through parent links, or if any transform on the path is
    /// singular.
    pub fn convert_point_to_layer(&self, point: Point, descendant: &Layer) -> Option<Point> {
        let mut chain = Vec::new();
        let mut cur = descendant.clone();
        loop {
            if cur == *self {
                break;
            }
            chain.push(cur.clone());
            cur = cur.parent()?;
        }

        let mut matrix = Matrix::identity();
        for layer in chain.iter().rev() {
            matrix = matrix.concat(&layer.to_parent());
        }
        let inverse = matrix.invert()?;
        Some(inverse.apply(point))
    }

    // --- Tree structure ------------------------------------------------

    pub fn parent(&self) -> Option<Layer> {
        self.0
            .borrow()
            .parent
            .as_ref()
            .and_then(|w| w.upgrade())
            .map(Layer)
    }

    pub fn children(&self) -> Vec<Layer> {
        self.0.borrow().children.clone()
    }

    pub fn child_count(&self) -> usize {
        self.0.borrow().children.len()
    }

    /// Adds `child` as the new topmost child.
    pub fn add_child(&self, child: &Layer) {
        if let Some(old_parent) = child.parent() {
            old_parent.remove_child(child);
        }
        self.0.borrow_mut().children.push(child.clone());
        child.set_parent(Some(self.clone()));
        self.0.borrow_mut().needs_layout = true;
    }

    pub fn remove_child(&self, child: &Layer) {
        let mut data = self.0.borrow_mut();
        if let Some(pos) = data.children.iter().position(|c| c == child) {
            data.children.remove(pos);
            drop(data);
            child.set_parent(None);
            self.0.borrow_mut().needs_layout = true;
        }
    }

    fn set_parent(&self, parent: Option<Layer>) {
        self.0.borrow_mut().parent = parent.as_ref().map(|p| Rc::downgrade(&p.0));
        let host = parent.as_ref().and_then(|p| p.0.borrow().host.clone());
        self.propagate_host(host);
        if let Some(listener) = self.0.borrow_mut().parent_change_listener.as_mut() {
            listener(parent);
        }
    }

    /// Called on the content layer by `LayerRoot::set_content_layer`, and
    /// recursively on every descendant so ids can be allocated and
    /// layout/display requests can reach the owning root.
    pub fn set_host(&self, host: Option<Weak<dyn LayerHost>>) {
        self.propagate_host(host);
    }

    fn propagate_host(&self, host: Option<Weak<dyn LayerHost>>) {
        {
            let mut data = self.0.borrow_mut();
            data.host = host.clone();
            if data.id.is_none() {
                if let Some(h) = host.as_ref().and_then(|w| w.upgrade()) {
                    data.id = Some(h.allocate_layer_id());
                }
            }
        }
        for child in self.children() {
            child.propagate_host(host.clone());
        }
    }

    fn host(&self) -> Option<Rc<dyn LayerHost>> {
        self.0.borrow().host.as_ref().and_then(|w| w.upgrade())
    }

    pub fn on_parent_changed(&self, parent: Option<Layer>) {
        self.set_parent(parent);
    }

    // --- Hit testing -----------------------------------------------------

    /// `point` is in this layer's parent's coordinate space.
    pub fn hit_test(&self, point_in_parent: Point) -> bool {
        if !self.visible() || !self.touch_enabled() {
            return false;
        }
        let local = self.convert_point_from_parent(point_in_parent);
        let data = self.0.borrow();
        let base = Rect::make_xywh(0.0, 0.0, data.frame.width(), data.frame.height());
        let ext = data.touch_area_extension;
        let area = base.inset(ext.left, ext.top, ext.right, ext.bottom);
        area.contains(local)
    }

    // --- Layout ------------------------------------------------------------

    pub fn size_that_fits(&self, max_size: Size) -> Size {
        self.0.borrow().intrinsic_size.unwrap_or(max_size)
    }

    pub fn needs_layout(&self) -> bool {
        self.0.borrow().needs_layout
    }

    pub fn layout_if_needed(&self) {
        let needs = { self.0.borrow().needs_layout };
        if needs {
            self.0.borrow_mut().needs_layout = false;
            for child in self.children() {
                child.layout_if_needed();
            }
        }
    }

    pub fn request_layout(&self) {
        self.0.borrow_mut().needs_layout = true;
        if let Some(host) = self.host() {
            host.request_layout();
        }
    }

    pub fn set_needs_display(&self) {
        if let Some(host) = self.host() {
            host.set_child_needs_display();
        }
    }

    // --- Recognizers ---------------------------------------------------

    pub fn add_gesture_recognizer(&self, recognizer: Rc<RefCell<Recognizer>>) {
        recognizer.borrow_mut().set_layer(Some(self.downgrade()));
        self.0.borrow_mut().recognizers.push(recognizer);
    }

    pub fn remove_gesture_recognizer(&self, recognizer: &Rc<RefCell<Recognizer>>) {
        let mut data = self.0.borrow_mut();
        if let Some(pos) = data.recognizers.iter().position(|r| Rc::ptr_eq(r, recognizer)) {
            data.recognizers.remove(pos);
        }
    }

    pub fn recognizers(&self) -> Vec<Rc<RefCell<Recognizer>>> {
        self.0.borrow().recognizers.clone()
    }

    pub fn index_of_gesture_recognizer_of_type(&self, kind: RecognizerKindTag) -> Option<usize> {
        self.0
            .borrow()
            .recognizers
            .iter()
            .position(|r| r.borrow().kind_tag() == kind)
    }

    /// A weak handle usable as a recognizer's `layer` back-reference.
    pub fn downgrade(&self) -> Weak<RefCell<LayerData>> {
        Rc::downgrade(&self.0)
    }

    pub fn upgrade(weak: &Weak<RefCell<LayerData>>) -> Option<Layer> {
        weak.upgrade().map(Layer)
    }

    // --- Drawing -------------------------------------------------------

    pub fn draw(&self, display_list: &mut DisplayList, metrics: &mut DrawMetrics) {
        if !self.visible() || self.0.borrow().opacity <= 0.0 {
            return;
        }
        metrics.visited_layers += 1;
        let id = self.id().unwrap_or(0);
        let drew_content = {
            let data = self.0.borrow();
            if let Some(content) = data.content.as_ref() {
                content.draw(id, display_list);
                true
            } else {
                false
            }
        };
        if !drew_content {
            metrics.draw_cache_miss += 1;
        }
        display_list.record_layer(id, self.visual_frame());
        for child in self.children() {
            child.draw(display_list, metrics);
        }
    }
}

fn bounding_box(matrix: &Matrix, rect: Rect) -> Rect {
    let corners = [
        Point::new(rect.left, rect.top),
        Point::new(rect.right, rect.top),
        Point::new(rect.right, rect.bottom),
        Point::new(rect.left, rect.bottom),
    ];
    let mut left = Scalar::INFINITY;
    let mut top = Scalar::INFINITY;
    let mut right = Scalar::NEG_INFINITY;
    let mut bottom = Scalar::NEG_INFINITY;
    for corner in corners {
        let p = matrix.apply(corner);
        left = left.min(p.x);
        top = top.min(p.y);
        right = right.max(p.x);
        bottom = bottom.max(p.y);
    }
    Rect {
        left,
        top,
        right,
        bottom,
    }
}

#[cfg(test)]
#[path = "tests/layer_tests.rs"]
mod tests;
