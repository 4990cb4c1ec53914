//! Browser bindings: DOM view, `requestAnimationFrame` scheduler, fetch and
//! image decoding, and the `mount` entry point.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Once;

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::{spawn_local, JsFuture};
use web_sys::{
    CssStyleDeclaration, Document, Element, Event, EventTarget, HtmlElement, HtmlImageElement, HtmlInputElement,
    PointerEvent, Response, Window,
};

use crate::animation::{FrameRequest, FrameScheduler};
use crate::config::ViewerConfig;
use crate::loader::FrameSource;
use crate::player::{boot, EventBacklog, Player, PlayerEvent};
use crate::pointer::{CaptureCommand, GestureGeometry, PointerInput, PointerKind};
use crate::style::{lens_background, StyleCommands, StyleProperty};
use crate::sync::FrameView;
use crate::zoom::{Point, Rect};
use crate::{resolve_frame_url, FrameId, FrameImage, ManifestError};

type WebPlayer = Player<HtmlImageElement, HtmlFrameView, RafScheduler>;

/// The mounted player plus the events waiting for it.
#[derive(Default)]
struct Shared {
    player: RefCell<Option<WebPlayer>>,
    backlog: EventBacklog,
}

type PlayerSlot = Rc<Shared>;

fn js_error(value: &JsValue) -> String {
    value.as_string().unwrap_or_else(|| format!("{value:?}"))
}

/// Current monotonic time, on the same clock as animation frame timestamps.
fn now_ms() -> f64 {
    web_sys::window()
        .and_then(|window| window.performance())
        .map(|performance| performance.now())
        .unwrap_or(0.0)
}

/// Element ids the viewer looks up under the document.
#[derive(Clone, Debug)]
pub struct DomIds {
    pub status: String,
    pub player: String,
    pub container: String,
    pub image: String,
    pub lens: String,
    pub scrubber: String,
    pub play: String,
    pub prev: String,
    pub next: String,
    pub label: String,
}

impl Default for DomIds {
    fn default() -> Self {
        Self {
            status: "loop-status".into(),
            player: "loop-player".into(),
            container: "loop-container".into(),
            image: "loop-image".into(),
            lens: "loop-lens".into(),
            scrubber: "loop-scrubber".into(),
            play: "loop-play".into(),
            prev: "loop-prev".into(),
            next: "loop-next".into(),
            label: "loop-label".into(),
        }
    }
}

fn element<T: JsCast>(document: &Document, id: &str) -> Result<T, JsValue> {
    document
        .get_element_by_id(id)
        .ok_or_else(|| JsValue::from_str(&format!("Missing element #{id}")))?
        .dyn_into::<T>()
        .map_err(|_| JsValue::from_str(&format!("Element #{id} has an unexpected type")))
}

fn apply_property(style: &CssStyleDeclaration, property: &StyleProperty) {
    let result = match property {
        StyleProperty::Set { name, value } => style.set_property(name, value),
        StyleProperty::Remove(name) => style.remove_property(name).map(|_| ()),
    };
    if let Err(e) = result {
        log::warn!("style update {property:?} failed: {}", js_error(&e));
    }
}

fn rect_of(element: &Element) -> Rect {
    let rect = element.get_bounding_client_rect();
    Rect::new(rect.left(), rect.top(), rect.width(), rect.height())
}

/// DOM implementation of [`FrameView`].
pub struct HtmlFrameView {
    status: HtmlElement,
    player: HtmlElement,
    container: HtmlElement,
    image: HtmlImageElement,
    lens: HtmlElement,
    scrubber: HtmlInputElement,
    label: Option<HtmlElement>,
}

impl HtmlFrameView {
    pub fn from_document(document: &Document, ids: &DomIds) -> Result<Self, JsValue> {
        Ok(Self {
            status: element(document, &ids.status)?,
            player: element(document, &ids.player)?,
            container: element(document, &ids.container)?,
            image: element(document, &ids.image)?,
            lens: element(document, &ids.lens)?,
            scrubber: element(document, &ids.scrubber)?,
            label: element(document, &ids.label).ok(),
        })
    }

    /// Geometry snapshot for a new gesture.
    pub fn gesture_geometry(&self) -> GestureGeometry {
        GestureGeometry {
            image: rect_of(&self.image),
            container: rect_of(&self.container),
        }
    }
}

impl FrameView<HtmlImageElement> for HtmlFrameView {
    fn set_status(&mut self, message: &str) {
        self.status.set_text_content(Some(message));
    }

    fn reveal(&mut self, frame_count: usize) {
        self.status.set_hidden(true);
        self.scrubber.set_min("0");
        self.scrubber.set_max(&frame_count.saturating_sub(1).to_string());
        self.player.set_hidden(false);
    }

    fn set_scrubber_value(&mut self, index: usize) {
        self.scrubber.set_value(&index.to_string());
    }

    fn show_frame(&mut self, image: &FrameImage<HtmlImageElement>) {
        self.image.set_src(&image.handle().src());
    }

    fn set_lens_source(&mut self, image: &FrameImage<HtmlImageElement>) {
        apply_property(&self.lens.style(), &lens_background(&image.handle().src()));
    }

    fn apply_style(&mut self, commands: &StyleCommands) {
        let image_style = self.image.style();
        for property in &commands.image {
            apply_property(&image_style, property);
        }
        let lens_style = self.lens.style();
        for property in &commands.lens {
            apply_property(&lens_style, property);
        }
    }

    fn apply_capture(&mut self, command: CaptureCommand) {
        let result = match command {
            CaptureCommand::Acquire { pointer_id } => self.container.set_pointer_capture(pointer_id),
            CaptureCommand::Release { pointer_id } => self.container.release_pointer_capture(pointer_id),
        };
        if let Err(e) = result {
            log::warn!("{command:?} failed: {}", js_error(&e));
        }
    }

    fn set_frame_label(&mut self, label: Option<&str>) {
        if let Some(element) = &self.label {
            element.set_text_content(label);
        }
    }
}

/// [`FrameScheduler`] backed by `requestAnimationFrame`.
pub struct RafScheduler {
    window: Window,
    callback: Closure<dyn FnMut(f64)>,
}

impl RafScheduler {
    pub fn new(window: Window, callback: Closure<dyn FnMut(f64)>) -> Self {
        Self { window, callback }
    }
}

impl FrameScheduler for RafScheduler {
    fn request_frame(&mut self) -> Option<FrameRequest> {
        match self.window.request_animation_frame(self.callback.as_ref().unchecked_ref()) {
            Ok(id) => Some(FrameRequest(id)),
            Err(e) => {
                log::error!("requestAnimationFrame failed: {}", js_error(&e));
                None
            }
        }
    }

    fn cancel_frame(&mut self, request: FrameRequest) {
        if let Err(e) = self.window.cancel_animation_frame(request.0) {
            log::warn!("cancelAnimationFrame failed: {}", js_error(&e));
        }
    }
}

/// [`FrameSource`] using `fetch` for the manifest and `<img>` decoding for frames.
pub struct HtmlImageSource {
    base_url: String,
}

impl HtmlImageSource {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }
}

impl FrameSource for HtmlImageSource {
    type Handle = HtmlImageElement;

    async fn fetch_manifest(&self, path: &str) -> Result<Vec<u8>, ManifestError> {
        let window = web_sys::window().ok_or_else(|| ManifestError::Fetch("No window available".into()))?;
        let response: Response = JsFuture::from(window.fetch_with_str(path))
            .await
            .map_err(|e| ManifestError::Fetch(js_error(&e)))?
            .dyn_into()
            .map_err(|_| ManifestError::Fetch("Unexpected fetch result".into()))?;

        if !response.ok() {
            return Err(ManifestError::Fetch(format!("HTTP {} for {path}", response.status())));
        }

        let text = response.text().map_err(|e| ManifestError::Fetch(js_error(&e)))?;
        let body = JsFuture::from(text)
            .await
            .map_err(|e| ManifestError::Fetch(js_error(&e)))?;
        body.as_string()
            .map(String::into_bytes)
            .ok_or_else(|| ManifestError::Decode("Response body is not text".into()))
    }

    async fn load_image(&self, id: &FrameId) -> Result<FrameImage<HtmlImageElement>, String> {
        let image = HtmlImageElement::new().map_err(|e| js_error(&e))?;
        let url = resolve_frame_url(&self.base_url, id);

        // Handlers go in before `src` so a cached image cannot finish first.
        let decoded = js_sys::Promise::new(&mut |resolve, reject| {
            image.set_onload(Some(&resolve));
            image.set_onerror(Some(&reject));
        });
        image.set_src(&url);

        let result = JsFuture::from(decoded).await;
        image.set_onload(None);
        image.set_onerror(None);
        result.map_err(|_| format!("could not decode {url}"))?;

        let (width, height) = (image.natural_width(), image.natural_height());
        Ok(FrameImage::new(image, width, height))
    }
}

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        console_error_panic_hook::set_once();
        wasm_logger::init(wasm_logger::Config::default());
    });
}

/// Queue an event and, unless a dispatch further up the stack holds the
/// player, run everything queued so far.
fn dispatch(slot: &PlayerSlot, event: PlayerEvent) {
    slot.backlog.push(event);
    let Ok(mut guard) = slot.player.try_borrow_mut() else {
        log::debug!("player busy, {} events queued", slot.backlog.len());
        return;
    };
    match guard.as_mut() {
        Some(player) => {
            slot.backlog.deliver_to(player);
        }
        None => slot.backlog.clear(),
    }
}

fn listen(target: &EventTarget, name: &str, handler: impl FnMut(Event) + 'static) -> Result<(), JsValue> {
    let closure = Closure::<dyn FnMut(Event)>::new(handler);
    target.add_event_listener_with_callback(name, closure.as_ref().unchecked_ref())?;
    closure.forget();
    Ok(())
}

fn pointer_input(event: &Event) -> Option<PointerInput> {
    let event = event.dyn_ref::<PointerEvent>()?;
    Some(PointerInput {
        pointer_id: event.pointer_id(),
        kind: PointerKind::from_dom(&event.pointer_type()),
        is_primary: event.is_primary(),
        position: Point::new(event.client_x() as f64, event.client_y() as f64),
    })
}

fn attach_controls(document: &Document, ids: &DomIds, slot: &PlayerSlot) -> Result<(), JsValue> {
    let play: EventTarget = element(document, &ids.play)?;
    let prev: EventTarget = element(document, &ids.prev)?;
    let next: EventTarget = element(document, &ids.next)?;
    let scrubber: HtmlInputElement = element(document, &ids.scrubber)?;
    let container: EventTarget = element(document, &ids.container)?;

    let s = slot.clone();
    listen(&play, "click", move |_| dispatch(&s, PlayerEvent::TogglePlay { now_ms: now_ms() }))?;
    let s = slot.clone();
    listen(&prev, "click", move |_| dispatch(&s, PlayerEvent::StepPrev))?;
    let s = slot.clone();
    listen(&next, "click", move |_| dispatch(&s, PlayerEvent::StepNext))?;

    let s = slot.clone();
    let input = scrubber.clone();
    listen(&scrubber, "input", move |_| match input.value().parse::<usize>() {
        Ok(index) => dispatch(&s, PlayerEvent::Seek(index)),
        Err(_) => log::warn!("scrubber value {:?} is not an index", input.value()),
    })?;

    let s = slot.clone();
    listen(&container, "pointerdown", move |event| {
        let Some(input) = pointer_input(&event) else { return };
        let geometry = match s.player.try_borrow() {
            Ok(guard) => match guard.as_ref() {
                Some(player) => player.view().gesture_geometry(),
                None => return,
            },
            Err(_) => return,
        };
        dispatch(&s, PlayerEvent::PointerDown { input, geometry });
    })?;

    let pointer_events: [(&str, fn(PointerInput) -> PlayerEvent); 4] = [
        ("pointermove", PlayerEvent::PointerMove),
        ("pointerup", PlayerEvent::PointerUp),
        ("pointercancel", PlayerEvent::PointerCancel),
        ("pointerleave", PlayerEvent::PointerLeave),
    ];
    for (name, make_event) in pointer_events {
        let s = slot.clone();
        listen(&container, name, move |event| {
            if let Some(input) = pointer_input(&event) {
                dispatch(&s, make_event(input));
            }
        })?;
    }
    Ok(())
}

/// Mount the viewer on the element with id `root_id`.
///
/// The root's `data-manifest` attribute overrides the manifest path and an
/// optional `data-config` attribute holds a JSON [`ViewerConfig`]. Loading
/// runs in the background; failures are shown in the status element.
#[wasm_bindgen]
pub fn mount(root_id: &str) -> Result<(), JsValue> {
    init_logging();

    let window = web_sys::window().ok_or("No window available")?;
    let document = window.document().ok_or("No document available")?;
    let root: HtmlElement = element(&document, root_id)?;

    let dataset = root.dataset();
    let mut config = match dataset.get("config") {
        Some(json) => ViewerConfig::from_json_str(&json).map_err(|e| JsValue::from_str(&e.to_string()))?,
        None => ViewerConfig::default(),
    };
    if let Some(path) = dataset.get("manifest") {
        config.manifest_path = path;
    }

    let ids = DomIds::default();
    let view = HtmlFrameView::from_document(&document, &ids)?;

    let slot: PlayerSlot = Rc::new(Shared::default());
    let tick_slot = slot.clone();
    let on_frame = Closure::<dyn FnMut(f64)>::new(move |timestamp: f64| {
        dispatch(&tick_slot, PlayerEvent::AnimationFrame { now_ms: timestamp });
    });
    let scheduler = RafScheduler::new(window, on_frame);

    spawn_local(async move {
        let source = HtmlImageSource::new(config.base_url.clone());
        match boot(&source, &config, view, scheduler, now_ms).await {
            Ok(Some(player)) => {
                *slot.player.borrow_mut() = Some(player);
                if let Err(e) = attach_controls(&document, &ids, &slot) {
                    log::error!("could not attach controls: {}", js_error(&e));
                }
            }
            Ok(None) => log::warn!("no frames to play"),
            Err(e) => log::error!("viewer failed to load: {e}"),
        }
    });

    Ok(())
}
