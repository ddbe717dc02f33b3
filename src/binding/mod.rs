//! Script Binding Layer
//!
//! Exposes an [`AlprFacade`] to rhai scripts as the static module `alpr`:
//!
//! ```text
//! alpr::initialize("us", "/etc/openalpr/openalpr.conf", "/usr/share/openalpr/runtime_data");
//! alpr::set_top_n(7);
//! let json = alpr::recognize_file("car.jpg");   // JSON text
//! let map  = alpr::recognize_array(image_blob); // object map
//! alpr::dispose();
//! ```
//!
//! Failures are raised as runtime errors carrying `#{ kind, message }`, with
//! `kind` one of `"TypeError"`, `"NotInitialized"` or `"EngineError"`. Calls
//! with too few or too many arguments raise `"TypeError"`.
//!
//! `alpr::get_version()` depends on the backend: the simulated engine reports
//! `mock-<crate version>`, while the libopenalpr C API has no version query,
//! so on the `openalpr` backend it always raises an `"EngineError"`.

mod args;
mod error;

pub use error::{error_kind, BindingError, UsageError};

use rhai::{Dynamic, Engine, EvalAltResult, Module};
use std::path::Path;
use std::sync::Arc;

use crate::engine::EngineOptions;
use crate::facade::AlprFacade;

/// Name the module is registered under
pub const MODULE_NAME: &str = "alpr";

type FnResult<T> = Result<T, Box<EvalAltResult>>;

/// Register the `alpr` module on a script engine
pub fn register(engine: &mut Engine, facade: Arc<AlprFacade>) {
    engine.register_static_module(MODULE_NAME, build_module(facade).into());
}

/// Build the `alpr` module without registering it
pub fn build_module(facade: Arc<AlprFacade>) -> Module {
    let mut module = Module::new();

    register_arity_stubs(&mut module, "initialize", 3);
    let f = Arc::clone(&facade);
    module.set_native_fn(
        "initialize",
        move |region: Dynamic, config_file: Dynamic, runtime_dir: Dynamic| -> FnResult<()> {
            let region = args::string("initialize", 1, region)?;
            let config_file = args::string("initialize", 2, config_file)?;
            let runtime_dir = args::string("initialize", 3, runtime_dir)?;
            f.initialize(&EngineOptions::new(region, config_file, runtime_dir))?;
            Ok(())
        },
    );

    register_arity_stubs(&mut module, "dispose", 0);
    let f = Arc::clone(&facade);
    module.set_native_fn("dispose", move || -> FnResult<()> {
        f.dispose();
        Ok(())
    });

    register_arity_stubs(&mut module, "is_loaded", 0);
    let f = Arc::clone(&facade);
    module.set_native_fn("is_loaded", move || -> FnResult<bool> { Ok(f.is_loaded()) });

    register_arity_stubs(&mut module, "recognize_file", 1);
    let f = Arc::clone(&facade);
    module.set_native_fn("recognize_file", move |path: Dynamic| -> FnResult<String> {
        let path = args::string("recognize_file", 1, path)?;
        let results = f.recognize_file(Path::new(&path))?;
        results
            .to_json()
            .map_err(|e| BindingError::Engine(e.into()).into())
    });

    register_arity_stubs(&mut module, "recognize_array", 1);
    let f = Arc::clone(&facade);
    module.set_native_fn("recognize_array", move |buffer: Dynamic| -> FnResult<Dynamic> {
        let buffer = args::blob("recognize_array", 1, buffer)?;
        let results = f.recognize_bytes(&buffer)?;
        rhai::serde::to_dynamic(&results)
    });

    register_arity_stubs(&mut module, "set_default_region", 1);
    let f = Arc::clone(&facade);
    module.set_native_fn("set_default_region", move |region: Dynamic| -> FnResult<()> {
        let region = args::string("set_default_region", 1, region)?;
        f.set_default_region(&region)?;
        Ok(())
    });

    register_arity_stubs(&mut module, "set_detect_region", 1);
    let f = Arc::clone(&facade);
    module.set_native_fn("set_detect_region", move |detect: Dynamic| -> FnResult<()> {
        let detect = args::boolean("set_detect_region", 1, &detect)?;
        f.set_detect_region(detect)?;
        Ok(())
    });

    register_arity_stubs(&mut module, "set_top_n", 1);
    let f = Arc::clone(&facade);
    module.set_native_fn("set_top_n", move |top_n: Dynamic| -> FnResult<()> {
        let top_n = args::top_n("set_top_n", 1, &top_n)?;
        f.set_top_n(top_n)?;
        Ok(())
    });

    // Backends without a version query (libopenalpr) raise an EngineError here.
    register_arity_stubs(&mut module, "get_version", 0);
    let f = facade;
    module.set_native_fn("get_version", move || -> FnResult<String> { Ok(f.version()?) });

    module
}

/// Highest arity that gets a wrong-argument-count overload
const MAX_STUB_ARITY: usize = 5;

/// Register overloads for every arity up to [`MAX_STUB_ARITY`] other than
/// `expected`, so short and long calls raise the wrong-argument-count error
/// instead of rhai's "function not found".
fn register_arity_stubs(module: &mut Module, function: &'static str, expected: usize) {
    let count_error = move |actual: usize| -> Box<EvalAltResult> {
        UsageError::ArgumentCount {
            function,
            expected,
            actual,
        }
        .into()
    };

    if expected != 0 {
        module.set_native_fn(function, move || -> FnResult<()> { Err(count_error(0)) });
    }
    if expected != 1 {
        module.set_native_fn(function, move |_: Dynamic| -> FnResult<()> { Err(count_error(1)) });
    }
    if expected != 2 {
        module.set_native_fn(function, move |_: Dynamic, _: Dynamic| -> FnResult<()> {
            Err(count_error(2))
        });
    }
    if expected != 3 {
        module.set_native_fn(
            function,
            move |_: Dynamic, _: Dynamic, _: Dynamic| -> FnResult<()> { Err(count_error(3)) },
        );
    }
    if expected != 4 {
        module.set_native_fn(
            function,
            move |_: Dynamic, _: Dynamic, _: Dynamic, _: Dynamic| -> FnResult<()> {
                Err(count_error(4))
            },
        );
    }
    if expected != MAX_STUB_ARITY {
        module.set_native_fn(
            function,
            move |_: Dynamic, _: Dynamic, _: Dynamic, _: Dynamic, _: Dynamic| -> FnResult<()> {
                Err(count_error(MAX_STUB_ARITY))
            },
        );
    }
}
