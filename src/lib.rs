//! webtop - a desktop operating system simulation for the browser
//!
//! The heart of the crate is the virtual shell: a small interpreter for a
//! shell-like command language with variable expansion, aliases, pipelines,
//! conditional chaining, background execution, and a set of built-in
//! commands. The shell talks to an in-memory virtual filesystem and to
//! per-window terminal sessions owned by the surrounding UI.
//!
//! Layout:
//! - `shell`: parser, expansion, interpreter, command registry, builtins
//! - `vfs`: filesystem collaborator (trait + in-memory implementation)
//! - `jobs`: cooperative executor for fire-and-forget background commands
//! - `clock`: millisecond clock abstraction (injectable for tests)
//! - `web`: wasm-bindgen surface for the browser UI (wasm32 only)

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

pub mod clock;
pub mod jobs;
pub mod shell;
pub mod vfs;

#[cfg(target_arch = "wasm32")]
pub mod web;

/// Console logging helper
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = console)]
    pub fn log(s: &str);
}

/// Log to browser console (WASM)
#[cfg(target_arch = "wasm32")]
#[macro_export]
macro_rules! console_log {
    ($($t:tt)*) => {
        $crate::log(&format!($($t)*))
    };
}

/// Log to stderr (native)
#[cfg(not(target_arch = "wasm32"))]
#[macro_export]
macro_rules! console_log {
    ($($t:tt)*) => {
        eprintln!($($t)*)
    };
}

/// Initialize panic hook for better error messages in browser console
#[cfg(target_arch = "wasm32")]
fn init_panic_hook() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// WASM entry point. The page constructs a [`web::WebShell`] afterwards.
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn main() {
    init_panic_hook();
    console_log!("[webtop] shell core ready");
}
