use super::*;
use crate::boundary::{DisplayList, DrawMetrics, LayerContent};
use layerkit_foundation::{Point, Rect, Size, TimePoint, Vector};
use std::cell::Cell;
use std::rc::Rc;

struct CountingHost {
    layout_requests: Cell<u32>,
    display_requests: Cell<u32>,
    next_id: Cell<u64>,
}

impl CountingHost {
    fn new() -> Rc<Self> {
        Rc::new(Self {
            layout_requests: Cell::new(0),
            display_requests: Cell::new(0),
            next_id: Cell::new(1),
        })
    }
}

impl LayerHost for CountingHost {
    fn request_layout(&self) {
        self.layout_requests.set(self.layout_requests.get() + 1);
    }

    fn set_child_needs_display(&self) {
        self.display_requests.set(self.display_requests.get() + 1);
    }

    fn request_focus(&self) {}

    fn allocate_layer_id(&self) -> u64 {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        id
    }
}

struct RecordingContent;

impl LayerContent for RecordingContent {
    fn draw(&self, _layer_id: u64, _display_list: &mut DisplayList) {}
}

#[test]
fn add_child_reparents_and_marks_layout_dirty() {
    let parent_a = Layer::new();
    let parent_b = Layer::new();
    let child = Layer::new();

    parent_a.add_child(&child);
    assert_eq!(child.parent(), Some(parent_a.clone()));
    assert_eq!(parent_a.child_count(), 1);

    parent_b.add_child(&child);
    assert_eq!(child.parent(), Some(parent_b.clone()));
    assert_eq!(parent_a.child_count(), 0);
    assert_eq!(parent_b.child_count(), 1);
}

#[test]
fn remove_child_clears_parent_link() {
    let parent = Layer::new();
    let child = Layer::new();
    parent.add_child(&child);
    parent.remove_child(&child);
    assert_eq!(child.parent(), None);
    assert_eq!(parent.child_count(), 0);
}

#[test]
fn set_frame_only_marks_layout_dirty_on_change() {
    let layer = Layer::new();
    layer.layout_if_needed();
    assert!(!layer.needs_layout());

    layer.set_frame(layer.frame());
    assert!(!layer.needs_layout(), "setting an identical frame should not dirty layout");

    layer.set_frame(Rect::make_xywh(0.0, 0.0, 100.0, 100.0));
    assert!(layer.needs_layout());
}

#[test]
fn host_propagates_to_children_added_later() {
    let host = CountingHost::new();
    let root = Layer::new();
    let weak: std::rc::Weak<dyn LayerHost> = Rc::downgrade(&host);
    root.set_host(Some(weak));
    assert!(root.id().is_some());

    let child = Layer::new();
    assert!(child.id().is_none());
    root.add_child(&child);
    assert!(child.id().is_some(), "adding a child to a hosted layer should allocate its id");
}

#[test]
fn request_layout_notifies_host() {
    let host = CountingHost::new();
    let layer = Layer::new();
    let weak: std::rc::Weak<dyn LayerHost> = Rc::downgrade(&host);
    layer.set_host(Some(weak));

    layer.request_layout();
    assert_eq!(host.layout_requests.get(), 1);
}

#[test]
fn set_needs_display_notifies_host() {
    let host = CountingHost::new();
    let layer = Layer::new();
    let weak: std::rc::Weak<dyn LayerHost> = Rc::downgrade(&host);
    layer.set_host(Some(weak));

    layer.set_needs_display();
    assert_eq!(host.display_requests.get(), 1);
}

#[test]
fn hit_test_respects_visibility_and_touch_enabled() {
    let layer = Layer::new();
    layer.set_frame(Rect::make_xywh(0.0, 0.0, 100.0, 100.0));
    assert!(layer.hit_test(Point::new(50.0, 50.0)));

    layer.set_visible(false);
    assert!(!layer.hit_test(Point::new(50.0, 50.0)));
    layer.set_visible(true);

    layer.set_touch_enabled(false);
    assert!(!layer.hit_test(Point::new(50.0, 50.0)));
}

#[test]
fn touch_area_extension_grows_hit_region() {
    let layer = Layer::new();
    layer.set_frame(Rect::make_xywh(0.0, 0.0, 100.0, 100.0));
    assert!(!layer.hit_test(Point::new(-5.0, 50.0)));

    layer.set_touch_area_extension(TouchAreaExtension {
        left: 10.0,
        top: 0.0,
        right: 0.0,
        bottom: 0.0,
    });
    assert!(layer.hit_test(Point::new(-5.0, 50.0)));
}

#[test]
fn convert_point_to_layer_walks_the_ancestor_chain() {
    let root = Layer::new();
    let child = Layer::new();
    let grandchild = Layer::new();

    root.set_frame(Rect::make_xywh(0.0, 0.0, 200.0, 200.0));
    child.set_frame(Rect::make_xywh(10.0, 10.0, 100.0, 100.0));
    grandchild.set_frame(Rect::make_xywh(5.0, 5.0, 50.0, 50.0));

    root.add_child(&child);
    child.add_child(&grandchild);

    let point_in_root = Point::new(20.0, 20.0);
    let point_in_grandchild = root.convert_point_to_layer(point_in_root, &grandchild).unwrap();
    // root -> child subtracts (10,10); child -> grandchild subtracts (5,5).
    assert!((point_in_grandchild.x - 5.0).abs() < 1e-9);
    assert!((point_in_grandchild.y - 5.0).abs() < 1e-9);
}

#[test]
fn convert_point_to_layer_is_none_for_unrelated_layers() {
    let root = Layer::new();
    let other_root = Layer::new();
    let stray = Layer::new();
    other_root.add_child(&stray);

    assert!(root.convert_point_to_layer(Point::ZERO, &stray).is_none());
}

#[test]
fn to_parent_applies_translation_scale_and_rotation_about_the_anchor() {
    let layer = Layer::new();
    layer.set_frame(Rect::make_xywh(0.0, 0.0, 10.0, 10.0));
    layer.set_anchor(Point::new(0.0, 0.0));
    layer.set_scale(2.0, 2.0);
    layer.set_translation(Vector::new(5.0, 0.0));

    let transformed = layer.to_parent().apply(Point::new(1.0, 0.0));
    assert!((transformed.x - 7.0).abs() < 1e-9);
}

#[test]
fn draw_records_every_visible_descendant_and_counts_cache_misses() {
    let root = Layer::new();
    root.set_frame(Rect::make_xywh(0.0, 0.0, 50.0, 50.0));
    let content_child = Layer::new();
    content_child.set_content(Box::new(RecordingContent));
    let bare_child = Layer::new();
    let hidden_child = Layer::new();
    hidden_child.set_visible(false);

    root.add_child(&content_child);
    root.add_child(&bare_child);
    root.add_child(&hidden_child);

    let mut display_list = DisplayList::new(Size::new(50.0, 50.0), TimePoint::from_seconds(0.0));
    let mut metrics = DrawMetrics::default();
    root.draw(&mut display_list, &mut metrics);

    assert_eq!(metrics.visited_layers, 3, "hidden child should not be visited");
    assert_eq!(metrics.draw_cache_miss, 2, "root and bare_child lack content");
    assert_eq!(display_list.records().len(), 3);
}
