//! FFI bindings for VizAI Activity
//!
//! This module provides C-compatible functions for calling the aggregator from the
//! dashboard shell. All functions use C strings (null-terminated) and return
//! allocated memory that must be freed by the caller using `vizai_free_string`.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use crate::activity::pipeline::activity_to_report;
use crate::config::ReportConfig;
use crate::format::format_ms;

thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

fn set_last_error(msg: &str) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg).ok();
    });
}

fn clear_last_error() {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = None;
    });
}

unsafe fn cstr_to_string(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    CStr::from_ptr(ptr).to_str().ok().map(|s| s.to_string())
}

fn string_to_cstr(s: &str) -> *mut c_char {
    match CString::new(s) {
        Ok(cstr) => cstr.into_raw(),
        Err(_) => ptr::null_mut(),
    }
}

/// Build a daily report from activity JSON.
///
/// # Safety
/// - `records_json` and `day` must be valid null-terminated C strings.
/// - `config_json` may be NULL (defaults) or a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `vizai_free_string`.
/// - Returns NULL on error; call `vizai_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn vizai_daily_report(
    records_json: *const c_char,
    day: *const c_char,
    config_json: *const c_char,
) -> *mut c_char {
    clear_last_error();

    let records_str = match cstr_to_string(records_json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid records string pointer");
            return ptr::null_mut();
        }
    };

    let day_str = match cstr_to_string(day) {
        Some(s) => s,
        None => {
            set_last_error("Invalid day string pointer");
            return ptr::null_mut();
        }
    };

    let config = if config_json.is_null() {
        ReportConfig::default()
    } else {
        let parsed = cstr_to_string(config_json)
            .ok_or_else(|| "Invalid config string pointer".to_string())
            .and_then(|s| ReportConfig::from_json(&s).map_err(|e| e.to_string()));
        match parsed {
            Ok(config) => config,
            Err(msg) => {
                set_last_error(&msg);
                return ptr::null_mut();
            }
        }
    };

    match activity_to_report(&records_str, &day_str, &config) {
        Ok(report) => string_to_cstr(&report),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Format a millisecond duration as `H:MM` or `M:SS`.
///
/// # Safety
/// - Returns a newly allocated string that must be freed with `vizai_free_string`.
#[no_mangle]
pub unsafe extern "C" fn vizai_format_ms(ms: f64) -> *mut c_char {
    string_to_cstr(&format_ms(ms))
}

/// Free a string returned by VizAI functions.
///
/// # Safety
/// - `ptr` must be a valid pointer returned by a VizAI function, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn vizai_free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        drop(CString::from_raw(ptr));
    }
}

/// Get the last error message.
///
/// # Safety
/// - The returned pointer is valid until the next VizAI call on this thread.
/// - Do NOT free the returned pointer.
/// - Returns NULL if no error occurred.
#[no_mangle]
pub unsafe extern "C" fn vizai_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match &*e.borrow() {
        Some(cstr) => cstr.as_ptr(),
        None => ptr::null(),
    })
}

/// Get the library version.
///
/// # Safety
/// - Returns a pointer to a static string. Do NOT free.
#[no_mangle]
pub unsafe extern "C" fn vizai_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records() -> CString {
        CString::new(
            r#"[{"id":"1","behavior":"Resting","start":"2024-01-15T03:00:00Z","end":"2024-01-15T05:00:00Z"}]"#,
        )
        .unwrap()
    }

    #[test]
    fn test_ffi_daily_report() {
        let day = CString::new("2024-01-15").unwrap();

        unsafe {
            let result = vizai_daily_report(records().as_ptr(), day.as_ptr(), ptr::null());
            assert!(!result.is_null());

            let result_str = CStr::from_ptr(result).to_str().unwrap();
            let payload: serde_json::Value = serde_json::from_str(result_str).unwrap();
            assert_eq!(payload["behaviors"][0]["total_duration"], "2:00");

            vizai_free_string(result);
        }
    }

    #[test]
    fn test_ffi_config_json() {
        let day = CString::new("2024-01-15").unwrap();
        let config = CString::new(r#"{"top_n": 1}"#).unwrap();

        unsafe {
            let result = vizai_daily_report(records().as_ptr(), day.as_ptr(), config.as_ptr());
            assert!(!result.is_null());

            let payload: serde_json::Value =
                serde_json::from_str(CStr::from_ptr(result).to_str().unwrap()).unwrap();
            assert_eq!(payload["peaks"]["by_duration"].as_array().unwrap().len(), 1);

            vizai_free_string(result);
        }
    }

    #[test]
    fn test_ffi_error_handling() {
        let bad_day = CString::new("not a day").unwrap();

        unsafe {
            let result = vizai_daily_report(records().as_ptr(), bad_day.as_ptr(), ptr::null());
            assert!(result.is_null());

            let error = vizai_last_error();
            assert!(!error.is_null());
            let error_str = CStr::from_ptr(error).to_str().unwrap();
            assert!(error_str.contains("Date parse error"));
        }
    }

    #[test]
    fn test_ffi_format_ms() {
        unsafe {
            let formatted = vizai_format_ms(3_661_000.0);
            assert_eq!(CStr::from_ptr(formatted).to_str().unwrap(), "1:01");
            vizai_free_string(formatted);

            let version = vizai_version();
            assert!(!CStr::from_ptr(version).to_str().unwrap().is_empty());
        }
    }
}
