//! FFI bindings for Tourcast Survey
//!
//! This module provides C-compatible functions for calling the codec from the
//! survey host application. All functions use C strings (null-terminated) and
//! return allocated memory that must be freed by the caller using
//! `tourcast_free_string`.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use crate::encoder::UnknownLabelPolicy;
use crate::pipeline::{predictions_to_places, response_to_features, SurveyProcessor};

// Thread-local storage for the last error message
thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

/// Set the last error message
fn set_last_error(msg: &str) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg).ok();
    });
}

/// Clear the last error message
fn clear_last_error() {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = None;
    });
}

/// Helper to convert C string to Rust string
unsafe fn cstr_to_string(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    CStr::from_ptr(ptr).to_str().ok().map(|s| s.to_string())
}

/// Helper to convert Rust string to C string (caller must free)
fn string_to_cstr(s: &str) -> *mut c_char {
    match CString::new(s) {
        Ok(cstr) => cstr.into_raw(),
        Err(_) => ptr::null_mut(),
    }
}

/// Helper to convert a Vec<String> to a JSON array string
fn vec_to_json_array(vec: Vec<String>) -> String {
    // Each string is already valid JSON, so we join them as array elements
    let elements: Vec<&str> = vec.iter().map(|s| s.as_str()).collect();
    format!("[{}]", elements.join(","))
}

// ============================================================================
// Stateless API
// ============================================================================

/// Encode one survey.response.v1 envelope and return survey.features.v1 JSON.
///
/// # Safety
/// - `json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `tourcast_free_string`.
/// - Returns NULL on error; call `tourcast_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn tourcast_response_to_features(json: *const c_char) -> *mut c_char {
    clear_last_error();

    let json_str = match cstr_to_string(json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid JSON string pointer");
            return ptr::null_mut();
        }
    };

    match response_to_features(&json_str) {
        Ok(envelope) => string_to_cstr(&envelope),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Decode a prediction response and return ranked places JSON.
///
/// # Safety
/// - `json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `tourcast_free_string`.
/// - Returns NULL on error; call `tourcast_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn tourcast_predictions_to_places(json: *const c_char) -> *mut c_char {
    clear_last_error();

    let json_str = match cstr_to_string(json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid JSON string pointer");
            return ptr::null_mut();
        }
    };

    match predictions_to_places(&json_str) {
        Ok(places) => string_to_cstr(&places),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

// ============================================================================
// Stateful Processor API
// ============================================================================

/// Opaque handle to a SurveyProcessor
pub struct TourcastProcessorHandle {
    processor: SurveyProcessor<'static>,
}

/// Create a new SurveyProcessor with the given unknown-label policy.
///
/// Policy values: 0 = substitute defaults, 1 = reject unknown labels.
///
/// # Safety
/// - Returns a pointer to a newly allocated SurveyProcessor.
/// - Must be freed with `tourcast_processor_free`.
/// - Returns NULL on error.
#[no_mangle]
pub unsafe extern "C" fn tourcast_processor_new(policy: i32) -> *mut TourcastProcessorHandle {
    clear_last_error();

    let policy = match policy {
        0 => UnknownLabelPolicy::Default,
        1 => UnknownLabelPolicy::Reject,
        other => {
            set_last_error(&format!("Unknown policy value: {}", other));
            return ptr::null_mut();
        }
    };

    let processor = SurveyProcessor::new().with_policy(policy);
    let handle = Box::new(TourcastProcessorHandle { processor });
    Box::into_raw(handle)
}

/// Free a SurveyProcessor.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `tourcast_processor_new`.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn tourcast_processor_free(processor: *mut TourcastProcessorHandle) {
    if !processor.is_null() {
        drop(Box::from_raw(processor));
    }
}

/// Encode one survey envelope with a stateful processor.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `tourcast_processor_new`.
/// - `json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `tourcast_free_string`.
/// - Returns NULL on error; call `tourcast_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn tourcast_processor_process_response(
    processor: *mut TourcastProcessorHandle,
    json: *const c_char,
) -> *mut c_char {
    clear_last_error();

    if processor.is_null() {
        set_last_error("Null processor pointer");
        return ptr::null_mut();
    }

    let handle = &*processor;

    let json_str = match cstr_to_string(json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid JSON string pointer");
            return ptr::null_mut();
        }
    };

    match handle.processor.process_response(&json_str) {
        Ok(envelope) => string_to_cstr(&envelope),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Encode a batch payload (JSON array or NDJSON) with a stateful processor.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `tourcast_processor_new`.
/// - `payload` must be a valid null-terminated C string.
/// - Returns a newly allocated JSON array string that must be freed with
///   `tourcast_free_string`.
/// - Returns NULL on error; call `tourcast_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn tourcast_processor_process_batch(
    processor: *mut TourcastProcessorHandle,
    payload: *const c_char,
) -> *mut c_char {
    clear_last_error();

    if processor.is_null() {
        set_last_error("Null processor pointer");
        return ptr::null_mut();
    }

    let handle = &*processor;

    let payload_str = match cstr_to_string(payload) {
        Some(s) => s,
        None => {
            set_last_error("Invalid payload string pointer");
            return ptr::null_mut();
        }
    };

    match handle.processor.process_batch(&payload_str) {
        Ok(envelopes) => {
            let result = vec_to_json_array(envelopes);
            string_to_cstr(&result)
        }
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Decode a prediction response with a stateful processor.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `tourcast_processor_new`.
/// - `json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `tourcast_free_string`.
/// - Returns NULL on error; call `tourcast_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn tourcast_processor_decode_predictions(
    processor: *mut TourcastProcessorHandle,
    json: *const c_char,
) -> *mut c_char {
    clear_last_error();

    if processor.is_null() {
        set_last_error("Null processor pointer");
        return ptr::null_mut();
    }

    let handle = &*processor;

    let json_str = match cstr_to_string(json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid JSON string pointer");
            return ptr::null_mut();
        }
    };

    match handle.processor.decode_predictions(&json_str) {
        Ok(places) => string_to_cstr(&places),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

// ============================================================================
// Memory Management
// ============================================================================

/// Free a string returned by Tourcast functions.
///
/// # Safety
/// - `ptr` must be a valid pointer returned by a Tourcast function, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn tourcast_free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        drop(CString::from_raw(ptr));
    }
}

// ============================================================================
// Error Handling
// ============================================================================

/// Get the last error message.
///
/// # Safety
/// - Returns a pointer to a thread-local error string.
/// - The returned pointer is valid until the next Tourcast function call on this thread.
/// - Do NOT free the returned pointer.
/// - Returns NULL if no error occurred.
#[no_mangle]
pub unsafe extern "C" fn tourcast_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match &*e.borrow() {
        Some(cstr) => cstr.as_ptr(),
        None => ptr::null(),
    })
}

// ============================================================================
// Version Information
// ============================================================================

/// Get the Tourcast Survey library version.
///
/// # Safety
/// - Returns a pointer to a static string. Do NOT free.
#[no_mangle]
pub unsafe extern "C" fn tourcast_version() -> *const c_char {
    // Use a static CString to avoid allocation
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CString;

    fn sample_response_json() -> CString {
        CString::new(
            r#"{
            "schema_version": "survey.response.v1",
            "submitted_at": "2024-06-01T09:30:00Z",
            "channel": "kiosk",
            "answers": ["서울", "남성", "20대", "혼자", "쇼핑;캠핑", "1박2일", "자가용", "10~30만원"]
        }"#,
        )
        .unwrap()
    }

    fn sample_prediction_json() -> CString {
        CString::new(
            r#"[
            {"place_name": "경복궁", "address": "서울 종로구", "score": 0.82, "type": 2},
            {"place_name": "한강공원", "address": "서울 영등포구", "score": 0.91, "type": 7}
        ]"#,
        )
        .unwrap()
    }

    #[test]
    fn test_ffi_response_to_features() {
        let json = sample_response_json();

        unsafe {
            let result = tourcast_response_to_features(json.as_ptr());
            assert!(!result.is_null());

            let result_str = CStr::from_ptr(result).to_str().unwrap();
            assert!(result_str.contains("feature_version"));
            assert!(result_str.contains("LOTNO_ADDR"));

            tourcast_free_string(result);
        }
    }

    #[test]
    fn test_ffi_predictions_to_places() {
        let json = sample_prediction_json();

        unsafe {
            let result = tourcast_predictions_to_places(json.as_ptr());
            assert!(!result.is_null());

            let result_str = CStr::from_ptr(result).to_str().unwrap();
            assert!(result_str.starts_with('['));
            assert!(result_str.contains("산책로"));

            tourcast_free_string(result);
        }
    }

    #[test]
    fn test_ffi_processor_lifecycle() {
        unsafe {
            let processor = tourcast_processor_new(0);
            assert!(!processor.is_null());

            let json = sample_response_json();
            let result = tourcast_processor_process_response(processor, json.as_ptr());
            assert!(!result.is_null());
            tourcast_free_string(result);

            let predictions = sample_prediction_json();
            let decoded = tourcast_processor_decode_predictions(processor, predictions.as_ptr());
            assert!(!decoded.is_null());
            tourcast_free_string(decoded);

            tourcast_processor_free(processor);
        }
    }

    #[test]
    fn test_ffi_processor_batch() {
        unsafe {
            let processor = tourcast_processor_new(0);

            let ndjson = CString::new(
                r#"{"schema_version":"survey.response.v1","submitted_at":"2024-06-01T09:30:00Z","answers":["서울","남성"]}
{"schema_version":"survey.response.v1","submitted_at":"2024-06-01T09:31:00Z","answers":["부산","여성"]}"#,
            )
            .unwrap();

            let result = tourcast_processor_process_batch(processor, ndjson.as_ptr());
            assert!(!result.is_null());

            let result_str = CStr::from_ptr(result).to_str().unwrap();
            let parsed: serde_json::Value = serde_json::from_str(result_str).unwrap();
            assert_eq!(parsed.as_array().unwrap().len(), 2);

            tourcast_free_string(result);
            tourcast_processor_free(processor);
        }
    }

    #[test]
    fn test_ffi_reject_policy() {
        unsafe {
            let processor = tourcast_processor_new(1);
            assert!(!processor.is_null());

            let json = CString::new(
                r#"{"schema_version":"survey.response.v1","submitted_at":"2024-06-01T09:30:00Z","answers":["서울","외계인"]}"#,
            )
            .unwrap();

            let result = tourcast_processor_process_response(processor, json.as_ptr());
            assert!(result.is_null());

            let error = tourcast_last_error();
            assert!(!error.is_null());
            let error_str = CStr::from_ptr(error).to_str().unwrap();
            assert!(error_str.contains("gender"));

            tourcast_processor_free(processor);
        }
    }

    #[test]
    fn test_ffi_error_handling() {
        unsafe {
            let invalid_json = CString::new("not json").unwrap();
            let result = tourcast_response_to_features(invalid_json.as_ptr());
            assert!(result.is_null());

            let error = tourcast_last_error();
            assert!(!error.is_null());

            let error_str = CStr::from_ptr(error).to_str().unwrap();
            assert!(!error_str.is_empty());
        }
    }

    #[test]
    fn test_ffi_invalid_policy() {
        unsafe {
            let processor = tourcast_processor_new(7);
            assert!(processor.is_null());

            let error = tourcast_last_error();
            assert!(!error.is_null());
        }
    }

    #[test]
    fn test_ffi_version() {
        unsafe {
            let version = tourcast_version();
            assert!(!version.is_null());

            let version_str = CStr::from_ptr(version).to_str().unwrap();
            assert!(!version_str.is_empty());
        }
    }
}
