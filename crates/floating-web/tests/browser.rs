#![cfg(target_arch = "wasm32")]

use floating_core::{
    ComputePositionConfig, FloatingElement, FloatingError, FloatingStyles, LimitShift,
    Middleware, Padding, Placement, PositionEngine, Strategy,
};
use floating_web::{AutoUpdateOptions, DomElement, DomEngine, apply_styles, dom_floating_state};
use floating_runtime::{FloatingOptions, Updater};
use wasm_bindgen::JsCast;
use wasm_bindgen_test::{wasm_bindgen_test, wasm_bindgen_test_configure};
use web_sys::HtmlElement;

wasm_bindgen_test_configure!(run_in_browser);

fn div() -> DomElement {
    let document = web_sys::window()
        .and_then(|w| w.document())
        .expect("browser document");
    DomElement::new(document.create_element("div").expect("create div"))
}

#[wasm_bindgen_test]
fn elements_compare_by_identity() {
    let a = div();
    let b = div();
    assert_eq!(a, a.clone());
    assert_ne!(a, b);
}

#[wasm_bindgen_test]
fn device_pixel_ratio_comes_from_the_window() {
    let el = div();
    let expected = web_sys::window().map(|w| w.device_pixel_ratio());
    assert_eq!(el.device_pixel_ratio(), expected);
}

#[wasm_bindgen_test]
fn styles_are_written_and_stale_transform_removed() {
    let el = div();
    let transformed = FloatingStyles::compute(Strategy::Fixed, 10.0, 20.0, true, Some(2.0));
    apply_styles(&el, &transformed).expect("apply transform styles");
    let style = el
        .element()
        .dyn_ref::<HtmlElement>()
        .expect("div is an HTMLElement")
        .style();
    assert_eq!(style.get_property_value("position").ok().as_deref(), Some("fixed"));
    assert_eq!(
        style.get_property_value("will-change").ok().as_deref(),
        Some("transform")
    );

    let offset = FloatingStyles::compute(Strategy::Absolute, 10.0, 20.0, false, Some(1.0));
    apply_styles(&el, &offset).expect("apply offset styles");
    assert_eq!(style.get_property_value("left").ok().as_deref(), Some("10px"));
    assert_eq!(style.get_property_value("transform").ok().as_deref(), Some(""));
    assert_eq!(style.get_property_value("will-change").ok().as_deref(), Some(""));
}

#[wasm_bindgen_test]
fn missing_engine_global_is_reported() {
    // The test page does not load the engine bundle.
    assert!(matches!(
        DomEngine::from_global(),
        Err(FloatingError::MissingGlobal { .. })
    ));
    assert!(dom_floating_state(FloatingOptions::new()).is_err());
}

/// Engine module stand-in: `shift` and `limitShift` echo their options, and
/// `computePosition` reports the middleware objects it received.
fn echo_namespace() -> wasm_bindgen::JsValue {
    let namespace = js_sys::Object::new();
    let set = |name: &str, function: js_sys::Function| {
        js_sys::Reflect::set(&namespace, &wasm_bindgen::JsValue::from_str(name), &function)
            .expect("set export");
    };
    set("shift", js_sys::Function::new_with_args("o", "return o"));
    set(
        "limitShift",
        js_sys::Function::new_with_args("o", "return { limitedBy: o.offset, crossAxis: o.crossAxis }"),
    );
    set(
        "computePosition",
        js_sys::Function::new_with_args(
            "r, f, o",
            "return Promise.resolve({ x: 1, y: 2, placement: o.placement, strategy: o.strategy, \
             middlewareData: { shiftOptions: o.middleware[0] } })",
        ),
    );
    namespace.into()
}

#[wasm_bindgen_test]
async fn shift_limiter_is_built_by_limit_shift() {
    let engine = DomEngine::with_namespace(echo_namespace());
    let config = ComputePositionConfig {
        placement: Placement::Top,
        strategy: Strategy::Absolute,
        middleware: vec![Middleware::shift_limited(
            Padding::All(4.0),
            LimitShift::new().offset(10.0).cross_axis(true),
        )],
    };
    let result = engine
        .compute_position(&div(), &div(), config)
        .await
        .expect("stub engine resolves");
    assert_eq!(result.placement, Placement::Top);
    let shift = result
        .middleware_data
        .get("shiftOptions")
        .expect("shift options echoed");
    assert_eq!(shift["padding"], 4.0);
    assert_eq!(shift["limiter"]["limitedBy"], 10.0);
    assert_eq!(shift["limiter"]["crossAxis"], true);
}

#[wasm_bindgen_test]
fn throwing_unsubscribe_does_not_escape_cleanup() {
    let namespace = js_sys::Object::new();
    let auto_update = js_sys::Function::new_with_args(
        "r, f, update, o",
        "globalThis.__floatingStops = 0; \
         return function () { globalThis.__floatingStops += 1; throw new Error('already gone'); }",
    );
    js_sys::Reflect::set(
        &namespace,
        &wasm_bindgen::JsValue::from_str("autoUpdate"),
        &auto_update,
    )
    .expect("set autoUpdate");
    let engine = DomEngine::with_namespace(namespace.into());

    let track = engine.auto_update(AutoUpdateOptions::default());
    let cleanup = track(&div(), &div(), Updater::detached());
    cleanup();

    let stops = js_sys::Reflect::get(
        &js_sys::global(),
        &wasm_bindgen::JsValue::from_str("__floatingStops"),
    )
    .expect("read counter");
    assert_eq!(stops.as_f64(), Some(1.0));
}
