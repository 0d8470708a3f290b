//! FFI interface for embedding the extractor in a host process
//!
//! Results cross the boundary as JSON so the host needs no knowledge of the
//! record layout. The FFI path never geocodes.

use std::ffi::{c_char, CStr, CString};
use std::ptr;
use std::sync::OnceLock;

use serde::Serialize;

use crate::{ExtractorConfig, ListingExtractor};

/// Result struct returned to the host
/// Both pointers are owned by Rust and must be freed via free_listing_result
#[repr(C)]
pub struct ListingResultFFI {
    /// JSON-serialized extraction (null-terminated)
    pub json_ptr: *mut c_char,
    /// Error message if extraction failed (null-terminated), or null on success
    pub error_ptr: *mut c_char,
}

fn extractor() -> &'static ListingExtractor {
    static EXTRACTOR: OnceLock<ListingExtractor> = OnceLock::new();
    EXTRACTOR.get_or_init(|| ListingExtractor::new(ExtractorConfig::default()))
}

/// Extract one listing from an HTML page.
///
/// # Arguments
/// * `html_ptr` - Pointer to the page bytes (need not be UTF-8 or null-terminated)
/// * `html_len` - Length of the page in bytes
/// * `file_name` - Originating file name (null-terminated), recorded as `source_file`
///
/// # Returns
/// ListingResultFFI with json_ptr set to `{"record": .., "provenance": .., "geocode": ..}`
/// on success, or error_ptr set when the arguments are unusable
///
/// # Safety
/// - `html_ptr` must point to valid memory of at least `html_len` bytes, or be null
/// - `file_name` must be a valid null-terminated C string
/// - Caller must free the result via `free_listing_result`
#[no_mangle]
pub unsafe extern "C" fn extract_listing_from_html(
    html_ptr: *const c_char,
    html_len: usize,
    file_name: *const c_char,
) -> ListingResultFFI {
    let html: &[u8] = if html_ptr.is_null() || html_len == 0 {
        &[]
    } else {
        std::slice::from_raw_parts(html_ptr as *const u8, html_len)
    };

    let file_name = if file_name.is_null() {
        return make_error_result("File name is null");
    } else {
        match CStr::from_ptr(file_name).to_str() {
            Ok(s) => s,
            Err(_) => return make_error_result("Invalid UTF-8 in file name"),
        }
    };

    match extractor().extract(html, file_name) {
        Ok(extraction) => make_json_result(&extraction),
        Err(e) => make_error_result(&e.to_string()),
    }
}

/// Free a ListingResultFFI returned by extract_listing_from_html
///
/// # Safety
/// - `result` must have been returned by `extract_listing_from_html`
/// - Must only be called once per result
#[no_mangle]
pub unsafe extern "C" fn free_listing_result(result: ListingResultFFI) {
    if !result.json_ptr.is_null() {
        drop(CString::from_raw(result.json_ptr));
    }
    if !result.error_ptr.is_null() {
        drop(CString::from_raw(result.error_ptr));
    }
}

fn make_json_result<T: Serialize>(value: &T) -> ListingResultFFI {
    match serde_json::to_string(value) {
        Ok(json) => match CString::new(json) {
            Ok(cstr) => ListingResultFFI {
                json_ptr: cstr.into_raw(),
                error_ptr: ptr::null_mut(),
            },
            Err(_) => make_error_result("Result JSON contains null bytes"),
        },
        Err(e) => make_error_result(&format!("Failed to serialize result: {}", e)),
    }
}

fn make_error_result(msg: &str) -> ListingResultFFI {
    // Interior NULs would truncate the message on the C side
    let cleaned = msg.replace('\0', " ");
    ListingResultFFI {
        json_ptr: ptr::null_mut(),
        error_ptr: CString::new(cleaned)
            .map(CString::into_raw)
            .unwrap_or(ptr::null_mut()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    unsafe fn json_of(result: &ListingResultFFI) -> serde_json::Value {
        assert!(result.error_ptr.is_null());
        let text = CStr::from_ptr(result.json_ptr).to_str().unwrap();
        serde_json::from_str(text).unwrap()
    }

    #[test]
    fn test_extract_listing_ffi() {
        let html = r#"<html><head>
            <meta property="og:title" content="123 Main St - $425,000">
            </head><body><p>3 beds, 2 baths</p></body></html>"#;
        let name = CString::new("main-st.html").unwrap();

        unsafe {
            let result = extract_listing_from_html(
                html.as_ptr() as *const c_char,
                html.len(),
                name.as_ptr(),
            );
            let json = json_of(&result);
            assert_eq!(json["record"]["price"], 425000.0);
            assert_eq!(json["record"]["bedrooms"], 3);
            assert_eq!(json["record"]["source_file"], "main-st.html");
            assert_eq!(json["geocode"], "disabled");
            free_listing_result(result);
        }
    }

    #[test]
    fn test_null_html_gives_empty_record() {
        let name = CString::new("empty.html").unwrap();
        unsafe {
            let result = extract_listing_from_html(ptr::null(), 0, name.as_ptr());
            let json = json_of(&result);
            assert_eq!(json["record"]["source_file"], "empty.html");
            assert!(json["record"]["address"].is_null());
            free_listing_result(result);
        }
    }

    #[test]
    fn test_null_file_name_is_an_error() {
        unsafe {
            let result = extract_listing_from_html(ptr::null(), 0, ptr::null());
            assert!(result.json_ptr.is_null());
            let msg = CStr::from_ptr(result.error_ptr).to_str().unwrap();
            assert_eq!(msg, "File name is null");
            free_listing_result(result);
        }
    }
}
