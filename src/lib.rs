#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

//! Warps planar vector geometry so that chosen source points land on chosen
//! target points.
//!
//! The number of correspondence pairs picks the transform: a translation, a
//! similarity, an exact affine map, or a piecewise affine "bend" over a
//! Delaunay mesh of the pair sources. [`bender::Bender`] runs one of these
//! over a layer of features; [`WasmBender`] exposes the same run to JavaScript.

pub mod bender;
pub mod geom;
pub mod pairs;
pub mod transform;

use std::fmt;

use serde::Serialize;
use wasm_bindgen::JsError;
use wasm_bindgen::prelude::*;

use bender::{Feature, RunOptions};
use pairs::PairLine;
use transform::{BendPreview, Capabilities, TransformKind};

cfg_if::cfg_if! {
    if #[cfg(all(feature = "console_error_panic_hook", target_arch = "wasm32"))] {
        #[wasm_bindgen(start)]
        pub fn initialize() {
            console_error_panic_hook::set_once();
            init_logger();
        }
    } else {
        #[wasm_bindgen(start)]
        pub fn initialize() {
            init_logger();
        }
    }
}

#[cfg(feature = "debug_logs")]
fn init_logger() {
    use log::LevelFilter;
    use wasm_bindgen_console_logger::DEFAULT_LOGGER;
    // A second call finds the logger already set; keep the first one.
    if log::set_logger(&DEFAULT_LOGGER).is_ok() {
        log::set_max_level(LevelFilter::Debug);
    }
}

#[cfg(not(feature = "debug_logs"))]
fn init_logger() {}

#[cfg(all(feature = "parallel", target_arch = "wasm32"))]
#[wasm_bindgen]
pub async fn initialize_parallel(worker_count: Option<u32>) -> Result<(), JsError> {
    let threads = worker_count
        .map(|count| count.max(1) as usize)
        .or_else(|| {
            std::thread::available_parallelism()
                .map(|value| value.get())
                .ok()
        })
        .unwrap_or(1);

    wasm_bindgen_rayon::init_thread_pool(threads)
        .await
        .map_err(|err| JsError::new(&format!("could not start the rayon thread pool: {err}")))
}

#[macro_export]
macro_rules! debug_log {
    ($($t:tt)*) => {{
        #[cfg(feature = "debug_logs")]
        {
            #[cfg(target_arch = "wasm32")]
            {
                ::web_sys::console::log_1(&::wasm_bindgen::JsValue::from_str(&format!($($t)*)));
            }
            #[cfg(not(target_arch = "wasm32"))]
            {
                println!("{}", format!($($t)*));
            }
        }
    }};
}

/// What a run hands back to the shell.
#[derive(Debug, Serialize)]
struct BendOutput {
    kind: TransformKind,
    features: Vec<Feature>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pins: Option<Vec<PairLine>>,
}

/// Public entry point for JavaScript consumers.
///
/// Built once per pairs layer; `bend` may then be called for any number of
/// feature layers.
#[wasm_bindgen(js_name = Bender)]
pub struct WasmBender {
    inner: bender::Bender,
    pair_lines: Vec<PairLine>,
}

#[wasm_bindgen(js_class = Bender)]
impl WasmBender {
    /// `pairs` is an array of pair lines, `options` an optional run options
    /// object; missing fields take their defaults.
    #[wasm_bindgen(constructor)]
    pub fn new(pairs: JsValue, options: JsValue) -> Result<WasmBender, JsValue> {
        let pair_lines: Vec<PairLine> =
            serde_wasm_bindgen::from_value(pairs).map_err(to_js_error)?;
        let options = parse_options(options)?;
        Self::from_parts(pair_lines, options)
    }

    /// The transform kind the pairs select, as a lowercase name.
    #[wasm_bindgen]
    pub fn kind(&self) -> String {
        self.inner.kind().name().to_owned()
    }

    /// Hull, expanded hull and mesh triangles for drawing. Empty unless the
    /// kind is `bend`.
    #[wasm_bindgen]
    pub fn preview(&self) -> Result<JsValue, JsValue> {
        let preview: BendPreview = self.inner.preview();
        serde_wasm_bindgen::to_value(&preview).map_err(to_js_error)
    }

    /// Bends an array of features and returns `{ kind, features, pins? }`.
    #[wasm_bindgen]
    pub fn bend(&self, features: JsValue) -> Result<JsValue, JsValue> {
        let features: Vec<Feature> =
            serde_wasm_bindgen::from_value(features).map_err(to_js_error)?;
        let output = self.run(&features);
        serde_wasm_bindgen::to_value(&output).map_err(to_js_error)
    }

    /// The pair lines after the run, collapsed to pins when requested.
    #[wasm_bindgen]
    pub fn pins(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(&self.inner.pins(&self.pair_lines)).map_err(to_js_error)
    }
}

impl WasmBender {
    fn from_parts(pair_lines: Vec<PairLine>, options: RunOptions) -> Result<Self, JsValue> {
        let inner =
            bender::Bender::new(&pair_lines, options, &Capabilities::probe()).map_err(to_js_error)?;
        debug_log!("bender ready: {} ({} pairs)", inner.kind(), inner.pairs().len());
        Ok(Self { inner, pair_lines })
    }

    fn run(&self, features: &[Feature]) -> BendOutput {
        let mut report = |done: usize, total: usize| {
            if done == total || done % 1000 == 0 {
                debug_log!("bent {done}/{total} features");
            }
        };
        let features = self.inner.bend_features(features, Some(&mut report));
        BendOutput {
            kind: self.inner.kind(),
            features,
            pins: self
                .inner
                .options()
                .pairs_to_pins
                .then(|| self.inner.pins(&self.pair_lines)),
        }
    }
}

/// Reports the kind `pairs` would select without building a transformer.
#[wasm_bindgen(js_name = determineKind)]
pub fn determine_kind(pairs: JsValue, options: JsValue) -> Result<String, JsValue> {
    let pair_lines: Vec<PairLine> = serde_wasm_bindgen::from_value(pairs).map_err(to_js_error)?;
    let options = parse_options(options)?;
    let kind = bender::determine_kind(&pair_lines, &options, &Capabilities::probe())
        .map_err(to_js_error)?;
    Ok(kind.name().to_owned())
}

/// Triangulation support of this build, as `{ status, ... }`.
#[wasm_bindgen]
pub fn capabilities() -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(&Capabilities::probe()).map_err(to_js_error)
}

fn parse_options(options: JsValue) -> Result<RunOptions, JsValue> {
    if options.is_undefined() || options.is_null() {
        return Ok(RunOptions::default());
    }
    serde_wasm_bindgen::from_value(options).map_err(to_js_error)
}

fn to_js_error<E: fmt::Display>(error: E) -> JsValue {
    js_error(&error.to_string())
}

fn js_error(message: &str) -> JsValue {
    #[cfg(target_arch = "wasm32")]
    {
        JsError::new(message).into()
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        let _ = message;
        JsValue::NULL
    }
}
