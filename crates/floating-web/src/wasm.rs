#![forbid(unsafe_code)]

//! DOM bindings: element handles, the `FloatingUIDOM` engine, auto-update
//! tracking, a spawner for the browser's microtask queue, and style output.

use floating_core::{
    ComputePositionConfig, FloatingElement, FloatingError, FloatingStyles, Middleware,
    PositionEngine, PositionFuture, Result,
};
use floating_runtime::{Cleanup, FloatingOptions, FloatingState, Updater};
use futures::future::{self, FutureExt};
use futures::task::{LocalFutureObj, LocalSpawn, SpawnError};
use js_sys::{Array, Function, JSON, Promise, Reflect};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Element, HtmlElement};

use crate::convert::{self, AutoUpdateOptions, GLOBAL_NAMESPACE};

/// A DOM element, compared by identity.
#[derive(Debug, Clone)]
pub struct DomElement(Element);

impl DomElement {
    #[must_use]
    pub fn new(element: Element) -> Self {
        Self(element)
    }

    #[must_use]
    pub fn element(&self) -> &Element {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> Element {
        self.0
    }
}

impl From<Element> for DomElement {
    fn from(element: Element) -> Self {
        Self(element)
    }
}

impl PartialEq for DomElement {
    fn eq(&self, other: &Self) -> bool {
        let a: &JsValue = self.0.as_ref();
        let b: &JsValue = other.0.as_ref();
        a == b
    }
}

impl FloatingElement for DomElement {
    fn device_pixel_ratio(&self) -> Option<f64> {
        self.0
            .owner_document()
            .and_then(|document| document.default_view())
            .map(|window| window.device_pixel_ratio())
    }
}

fn js_message(value: &JsValue) -> String {
    if let Some(error) = value.dyn_ref::<js_sys::Error>() {
        return String::from(error.message());
    }
    value.as_string().unwrap_or_else(|| format!("{value:?}"))
}

fn js_error(value: JsValue) -> FloatingError {
    FloatingError::js(js_message(&value))
}

fn lookup_namespace() -> Result<JsValue> {
    let namespace =
        Reflect::get(&js_sys::global(), &JsValue::from_str(GLOBAL_NAMESPACE)).map_err(js_error)?;
    if namespace.is_undefined() || namespace.is_null() {
        return Err(FloatingError::MissingGlobal {
            name: GLOBAL_NAMESPACE.to_string(),
        });
    }
    Ok(namespace)
}

fn export(namespace: &JsValue, name: &str) -> Result<Function> {
    Reflect::get(namespace, &JsValue::from_str(name))
        .map_err(js_error)?
        .dyn_into::<Function>()
        .map_err(|_| FloatingError::MissingGlobal {
            name: convert::export_name(name),
        })
}

fn to_js(value: &serde_json::Value) -> Result<JsValue> {
    JSON::parse(&value.to_string()).map_err(js_error)
}

fn arrow_element(middleware: &Middleware) -> Option<&Element> {
    middleware
        .payload::<DomElement>()
        .map(DomElement::element)
        .or_else(|| middleware.payload::<Element>())
}

/// Build the engine-side middleware object by calling its factory.
///
/// Values the JSON options cannot express are patched in afterwards: the
/// arrow element, and the shift limiter built by `limitShift`.
fn middleware_to_js(namespace: &JsValue, middleware: &Middleware) -> Result<JsValue> {
    let factory = export(namespace, middleware.name())?;
    let options = to_js(middleware.options())?;
    if let Some(element) = arrow_element(middleware) {
        let element: &JsValue = element.as_ref();
        Reflect::set(&options, &JsValue::from_str("element"), element).map_err(js_error)?;
    }
    if let Some(limiter) = middleware.limiter() {
        let limit_shift = export(namespace, "limitShift")?;
        let limiter = limit_shift
            .call1(&JsValue::NULL, &to_js(&convert::limit_shift_options(&limiter))?)
            .map_err(js_error)?;
        Reflect::set(&options, &JsValue::from_str("limiter"), &limiter).map_err(js_error)?;
    }
    factory.call1(&JsValue::NULL, &options).map_err(js_error)
}

/// Engine backed by `FloatingUIDOM.computePosition`.
#[derive(Debug, Clone)]
pub struct DomEngine {
    namespace: JsValue,
}

impl DomEngine {
    /// Use the global `FloatingUIDOM` object.
    pub fn from_global() -> Result<Self> {
        Ok(Self {
            namespace: lookup_namespace()?,
        })
    }

    /// Use an explicitly supplied engine module object.
    #[must_use]
    pub fn with_namespace(namespace: JsValue) -> Self {
        Self { namespace }
    }

    /// [`auto_update`] against this engine's module instead of the global.
    #[must_use]
    pub fn auto_update(
        &self,
        options: AutoUpdateOptions,
    ) -> impl Fn(&DomElement, &DomElement, Updater) -> Cleanup + 'static {
        tracker(Some(self.namespace.clone()), options)
    }

    fn start(
        &self,
        reference: &DomElement,
        floating: &DomElement,
        config: &ComputePositionConfig,
    ) -> Result<JsFuture> {
        let compute = export(&self.namespace, "computePosition")?;
        let middleware = Array::new();
        for step in &config.middleware {
            middleware.push(&middleware_to_js(&self.namespace, step)?);
        }
        let options = to_js(&convert::call_options(config))?;
        Reflect::set(&options, &JsValue::from_str("middleware"), &middleware).map_err(js_error)?;

        let promise = compute
            .call3(&JsValue::NULL, reference.element(), floating.element(), &options)
            .map_err(js_error)?
            .dyn_into::<Promise>()
            .map_err(js_error)?;
        Ok(JsFuture::from(promise))
    }
}

impl PositionEngine<DomElement, DomElement> for DomEngine {
    fn compute_position(
        &self,
        reference: &DomElement,
        floating: &DomElement,
        config: ComputePositionConfig,
    ) -> PositionFuture {
        match self.start(reference, floating, &config) {
            Ok(pending) => async move {
                let value = pending.await.map_err(js_error)?;
                let text = JSON::stringify(&value).map_err(js_error)?;
                convert::parse_return(&String::from(text))
            }
            .boxed_local(),
            Err(err) => future::ready(Err(err)).boxed_local(),
        }
    }
}

fn start_auto_update(
    namespace: &JsValue,
    reference: &DomElement,
    floating: &DomElement,
    updater: Updater,
    options: &AutoUpdateOptions,
) -> Result<Cleanup> {
    let auto_update = export(namespace, "autoUpdate")?;
    let callback = Closure::<dyn FnMut()>::new(move || updater.update());
    let args = Array::new();
    args.push(reference.element());
    args.push(floating.element());
    args.push(callback.as_ref());
    args.push(&to_js(&options.to_json())?);
    let stop = auto_update
        .apply(&JsValue::NULL, &args)
        .map_err(js_error)?
        .dyn_into::<Function>()
        .map_err(js_error)?;
    Ok(Box::new(move || {
        if let Err(_err) = stop.call0(&JsValue::NULL) {
            #[cfg(feature = "tracing")]
            tracing::warn!(
                message = "floating.auto_update.cleanup_failed",
                error = %js_message(&_err)
            );
        }
        drop(callback);
    }))
}

/// Tracking callback for
/// [`FloatingOptions::while_elements_mounted`](floating_runtime::FloatingOptions::while_elements_mounted)
/// that re-positions on scroll, resize and layout shift through
/// `FloatingUIDOM.autoUpdate`.
///
/// When the engine is unavailable the position is computed once and nothing
/// is tracked.
pub fn auto_update(
    options: AutoUpdateOptions,
) -> impl Fn(&DomElement, &DomElement, Updater) -> Cleanup + 'static {
    tracker(None, options)
}

fn tracker(
    namespace: Option<JsValue>,
    options: AutoUpdateOptions,
) -> impl Fn(&DomElement, &DomElement, Updater) -> Cleanup + 'static {
    move |reference: &DomElement, floating: &DomElement, updater: Updater| -> Cleanup {
        let started = match &namespace {
            Some(namespace) => Ok(namespace.clone()),
            None => lookup_namespace(),
        }
        .and_then(|namespace| {
            start_auto_update(&namespace, reference, floating, updater.clone(), &options)
        });
        match started {
            Ok(cleanup) => cleanup,
            Err(_err) => {
                #[cfg(feature = "tracing")]
                tracing::warn!(message = "floating.auto_update.failed", error = %_err);
                updater.update();
                Box::new(|| {})
            }
        }
    }
}

/// Runs futures on the browser's microtask queue.
#[derive(Debug, Clone, Copy, Default)]
pub struct WasmSpawner;

impl LocalSpawn for WasmSpawner {
    fn spawn_local_obj(
        &self,
        future: LocalFutureObj<'static, ()>,
    ) -> std::result::Result<(), SpawnError> {
        wasm_bindgen_futures::spawn_local(future);
        Ok(())
    }
}

/// Write `styles` onto the element's inline style, removing the transform
/// properties when the record has none.
pub fn apply_styles(element: &DomElement, styles: &FloatingStyles) -> Result<()> {
    let Some(html) = element.element().dyn_ref::<HtmlElement>() else {
        return Err(FloatingError::js("floating element is not an HTMLElement"));
    };
    let style = html.style();
    for (name, value) in styles.declarations() {
        style.set_property(name, value).map_err(js_error)?;
    }
    if styles.transform.is_none() {
        style.remove_property("transform").map_err(js_error)?;
    }
    if styles.will_change.is_none() {
        style.remove_property("will-change").map_err(js_error)?;
    }
    Ok(())
}

/// A controller wired to the global engine and the browser's task queue.
pub fn dom_floating_state(
    options: FloatingOptions<DomElement, DomElement>,
) -> Result<FloatingState<DomElement, DomElement>> {
    Ok(FloatingState::new(
        DomEngine::from_global()?,
        WasmSpawner,
        options,
    ))
}
