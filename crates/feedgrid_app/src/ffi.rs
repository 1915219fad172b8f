//! C-compatible embedding boundary.
//!
//! Lifecycle: `feedgrid_init` or `feedgrid_init_with_config` produce an
//! opaque handle, `feedgrid_run` blocks until the user quits,
//! `feedgrid_shutdown` frees the handle. Every entry point traps
//! panics; an internal fault surfaces as `Panic` (or a null handle
//! from init), never as an unwind into the caller.
//!
//! # Safety
//!
//! Handles must come from an init function and must not be used after
//! `feedgrid_shutdown`. `feedgrid_run` must not be called concurrently
//! on the same handle. String arguments must be null-terminated UTF-8,
//! or null where documented.

use std::any::Any;
use std::ffi::{CStr, CString};
use std::os::raw::{c_char, c_int};
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::ptr;

use feedgrid_core::ConfigError;

use crate::engine::{DashEngine, InitError, RunError};

/// Opaque to C callers; they only ever hold a pointer to it.
pub struct FeedgridHandle {
    engine: DashEngine,
    last_error: Option<CString>,
}

/// Result codes returned across the boundary.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedgridResult {
    Success = 0,
    InvalidHandle = 1,
    InvalidConfigPath = 2,
    ConfigLoadError = 3,
    RuntimeError = 4,
    AppError = 5,
    Panic = 6,
}

impl FeedgridResult {
    pub fn from_init_error(err: &InitError) -> Self {
        match err {
            InitError::Config(ConfigError::Read { .. }) => FeedgridResult::InvalidConfigPath,
            InitError::Config(_) => FeedgridResult::ConfigLoadError,
            InitError::FetchPool(_) => FeedgridResult::RuntimeError,
        }
    }

    pub fn from_run_error(err: &RunError) -> Self {
        match err {
            RunError::ShutDown => FeedgridResult::InvalidHandle,
            RunError::Terminal(_) => FeedgridResult::RuntimeError,
            RunError::Io(_) => FeedgridResult::AppError,
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unexpected internal fault".to_string()
    }
}

fn into_handle(engine: Result<DashEngine, InitError>) -> *mut FeedgridHandle {
    match engine {
        Ok(engine) => Box::into_raw(Box::new(FeedgridHandle {
            engine,
            last_error: None,
        })),
        Err(err) => {
            log::error!("init failed: {err}");
            ptr::null_mut()
        }
    }
}

/// Create an engine from a config file path, or from the built-in
/// default dashboard when `config_path` is null. Returns null on any
/// failure, including a panic during init.
///
/// # Safety
///
/// `config_path`, when non-null, must point at a null-terminated
/// string that stays valid for the duration of the call.
#[no_mangle]
pub unsafe extern "C" fn feedgrid_init(config_path: *const c_char) -> *mut FeedgridHandle {
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        let path = if config_path.is_null() {
            None
        } else {
            match CStr::from_ptr(config_path).to_str() {
                Ok(text) => Some(PathBuf::from(text)),
                Err(_) => return ptr::null_mut(),
            }
        };
        into_handle(DashEngine::from_path(path.as_deref()))
    }));
    outcome.unwrap_or(ptr::null_mut())
}

/// Create an engine from config text instead of a file. Returns null
/// on any failure.
///
/// # Safety
///
/// `config_toml` must be null or a valid null-terminated string.
#[no_mangle]
pub unsafe extern "C" fn feedgrid_init_with_config(
    config_toml: *const c_char,
) -> *mut FeedgridHandle {
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        if config_toml.is_null() {
            return ptr::null_mut();
        }
        let Ok(text) = CStr::from_ptr(config_toml).to_str() else {
            return ptr::null_mut();
        };
        into_handle(DashEngine::from_toml_str(text))
    }));
    outcome.unwrap_or(ptr::null_mut())
}

/// Run the dashboard. Blocks the calling thread until the user quits
/// or the run fails. The handle stays valid afterwards regardless of
/// the result; only `feedgrid_shutdown` releases it.
///
/// # Safety
///
/// `handle` must be null or a live handle from an init function, and
/// must not be running on another thread.
#[no_mangle]
pub unsafe extern "C" fn feedgrid_run(handle: *mut FeedgridHandle) -> FeedgridResult {
    if handle.is_null() {
        return FeedgridResult::InvalidHandle;
    }
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| (*handle).engine.run()));
    // The handle itself stays intact across an unwind; only the run
    // was abandoned.
    let handle = &mut *handle;
    match outcome {
        Ok(Ok(())) => {
            handle.last_error = None;
            FeedgridResult::Success
        }
        Ok(Err(err)) => {
            handle.last_error = CString::new(err.to_string()).ok();
            FeedgridResult::from_run_error(&err)
        }
        Err(payload) => {
            let message = panic_message(&*payload);
            log::error!("run panicked: {message}");
            handle.last_error = CString::new(message).ok();
            FeedgridResult::Panic
        }
    }
}

/// Destroy the handle, releasing widgets and the fetch pool. Null is
/// ignored. The pointer must not be used again afterwards.
///
/// # Safety
///
/// `handle` must be null or a live handle from an init function.
#[no_mangle]
pub unsafe extern "C" fn feedgrid_shutdown(handle: *mut FeedgridHandle) {
    if handle.is_null() {
        return;
    }
    let _ = panic::catch_unwind(AssertUnwindSafe(|| {
        let mut handle = Box::from_raw(handle);
        handle.engine.shutdown();
    }));
}

/// Message for the most recent failed `feedgrid_run` on this handle,
/// or null when the last run succeeded. The pointer is owned by the
/// handle and valid until the next `feedgrid_run` or shutdown.
///
/// # Safety
///
/// `handle` must be null or a live handle from an init function.
#[no_mangle]
pub unsafe extern "C" fn feedgrid_get_last_error(handle: *const FeedgridHandle) -> *const c_char {
    if handle.is_null() {
        return ptr::null();
    }
    match &(*handle).last_error {
        Some(message) => message.as_ptr(),
        None => ptr::null(),
    }
}

/// Crate version as a static null-terminated string.
#[no_mangle]
pub extern "C" fn feedgrid_version() -> *const c_char {
    static VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), "\0");
    VERSION.as_ptr() as *const c_char
}

/// Capability probe: 1 when the named feature is compiled in, 0 when
/// it is recognized but absent, -1 for unknown names (and null).
///
/// # Safety
///
/// `feature` must be null or a valid null-terminated string.
#[no_mangle]
pub unsafe extern "C" fn feedgrid_has_feature(feature: *const c_char) -> c_int {
    if feature.is_null() {
        return -1;
    }
    let Ok(name) = CStr::from_ptr(feature).to_str() else {
        return -1;
    };
    match name {
        "ffi" | "news" => 1,
        "metrics" => 0,
        _ => -1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_is_package_version() {
        let version = unsafe { CStr::from_ptr(feedgrid_version()) };
        assert_eq!(version.to_str().unwrap(), env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn shutdown_ignores_null() {
        unsafe { feedgrid_shutdown(ptr::null_mut()) };
    }

    #[test]
    fn run_rejects_null_handle() {
        let code = unsafe { feedgrid_run(ptr::null_mut()) };
        assert_eq!(code, FeedgridResult::InvalidHandle);
    }

    #[test]
    fn last_error_on_null_handle_is_null() {
        let message = unsafe { feedgrid_get_last_error(ptr::null()) };
        assert!(message.is_null());
    }

    #[test]
    fn init_with_invalid_config_returns_null() {
        let toml = CString::new("this is not toml [").unwrap();
        let handle = unsafe { feedgrid_init_with_config(toml.as_ptr()) };
        assert!(handle.is_null());
    }

    #[test]
    fn init_with_null_config_text_returns_null() {
        let handle = unsafe { feedgrid_init_with_config(ptr::null()) };
        assert!(handle.is_null());
    }

    #[test]
    fn init_run_later_lifecycle() {
        let toml = CString::new(
            r#"
            [general]
            refresh_interval_secs = 60

            [[widgets]]
            type = "news"
            title = "Top"
            position = { row = 0, col = 0 }
            "#,
        )
        .unwrap();
        let handle = unsafe { feedgrid_init_with_config(toml.as_ptr()) };
        assert!(!handle.is_null());
        let message = unsafe { feedgrid_get_last_error(handle) };
        assert!(message.is_null());
        unsafe { feedgrid_shutdown(handle) };
    }

    #[test]
    fn init_with_nonexistent_path_returns_null() {
        let path = CString::new("/definitely/not/a/config.toml").unwrap();
        let handle = unsafe { feedgrid_init(path.as_ptr()) };
        assert!(handle.is_null());
    }

    #[test]
    fn feature_probe() {
        let ffi = CString::new("ffi").unwrap();
        let metrics = CString::new("metrics").unwrap();
        let bogus = CString::new("bogus").unwrap();
        unsafe {
            assert_eq!(feedgrid_has_feature(ffi.as_ptr()), 1);
            assert_eq!(feedgrid_has_feature(metrics.as_ptr()), 0);
            assert_eq!(feedgrid_has_feature(bogus.as_ptr()), -1);
            assert_eq!(feedgrid_has_feature(ptr::null()), -1);
        }
    }
}
