//! Layer tree, touch dispatcher and gesture recognizer family for the
//! layerkit interactive runtime.

pub mod boundary;
pub mod dispatcher;
pub mod error;
pub mod layer;
pub mod recognizer;
pub mod root;
pub mod touch_event;

pub use boundary::{
    best_font_match, score_font_style, AlphaType, Bitmap, BitmapError, BitmapFactory, BitmapInfo, Compositor,
    CompositorPlane, CompositorPlaneList, ColorType, DisplayList, DrawMetrics, DrawableSurfaceCanvas, FamilyId,
    FontManager, FontSlant, FontStyle, FontWeight, FontWidth, LayerContent, LayerRecord, SinglePlaneCompositor,
    TypefaceRegistry,
};
pub use dispatcher::{GestureTypes, TouchDispatcher};
pub use error::DispatchError;
pub use layer::{BoxShadow, Layer, LayerHost, TouchAreaExtension, WeakLayer};
pub use recognizer::{
    DragData, LongPressData, MoveEvent, MoveListener, PinchData, PinchEvent, PinchListener, Recognizer,
    RecognizerKind, RecognizerKindTag, RecognizerState, RotateData, RotateEvent, RotateListener, ScrollData, TapData,
    TapListener, TouchData, TouchSlotListener, WheelData, WheelListener,
};
pub use root::{ContentLayerSizingMode, LayerRoot, LayerRootListener, RootResources};
pub use touch_event::{EventSource, PointerLocations, TouchEvent, TouchEventType};
