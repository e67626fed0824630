//! FFI bindings for the repform engine
//!
//! C-compatible functions for embedding the engine from other languages.
//! Sessions are opaque heap handles; frames and results cross the boundary
//! as JSON C strings. Returned strings are allocated here and must be freed
//! with `repform_free_string`.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use crate::schema::FrameAdapter;
use crate::session::SessionProcessor;
use crate::types::{ExerciseKind, Frame};

// Thread-local storage for the last error message
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

/// Helper to convert a C string to a Rust string
unsafe fn cstr_to_string(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    CStr::from_ptr(ptr).to_str().ok().map(|s| s.to_string())
}

/// Helper to convert a Rust string to a C string (caller must free)
fn string_to_cstr(s: &str) -> *mut c_char {
    match CString::new(s) {
        Ok(cstr) => cstr.into_raw(),
        Err(_) => ptr::null_mut(),
    }
}

/// Create a validation session for the named exercise
/// ("push_up", "chin_up", or "plank").
///
/// # Safety
/// - `exercise` must be a valid null-terminated C string.
/// - Returns an opaque handle that must be freed with `repform_session_free`.
/// - Returns NULL on error; call `repform_last_error` for the message.
#[no_mangle]
pub unsafe extern "C" fn repform_session_new(exercise: *const c_char) -> *mut SessionProcessor {
    clear_last_error();

    let name = match cstr_to_string(exercise) {
        Some(s) => s,
        None => {
            set_last_error("Invalid exercise string pointer");
            return ptr::null_mut();
        }
    };

    match ExerciseKind::parse(&name) {
        Some(kind) => Box::into_raw(Box::new(SessionProcessor::new(kind))),
        None => {
            set_last_error(&format!("Unsupported exercise: {}", name));
            ptr::null_mut()
        }
    }
}

/// Score one frame (JSON, pose.frame.v1) and return the validation result
/// as JSON.
///
/// # Safety
/// - `session` must be a handle from `repform_session_new` that has not
///   been freed.
/// - `frame_json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with
///   `repform_free_string`; NULL on error.
#[no_mangle]
pub unsafe extern "C" fn repform_session_validate(
    session: *mut SessionProcessor,
    frame_json: *const c_char,
) -> *mut c_char {
    clear_last_error();

    let Some(processor) = session.as_mut() else {
        set_last_error("Null session handle");
        return ptr::null_mut();
    };

    let json = match cstr_to_string(frame_json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid frame string pointer");
            return ptr::null_mut();
        }
    };

    let frame: Frame = match serde_json::from_str(&json) {
        Ok(f) => f,
        Err(e) => {
            set_last_error(&format!("Failed to parse frame: {}", e));
            return ptr::null_mut();
        }
    };
    if let Err(e) = FrameAdapter::validate(&frame) {
        set_last_error(&e.to_string());
        return ptr::null_mut();
    }

    let result = processor.process(&frame);
    match serde_json::to_string(&result) {
        Ok(s) => string_to_cstr(&s),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Repetitions counted so far, or -1 for a null handle.
///
/// # Safety
/// - `session` must be a live handle from `repform_session_new`, or NULL.
#[no_mangle]
pub unsafe extern "C" fn repform_session_rep_count(session: *const SessionProcessor) -> i64 {
    match session.as_ref() {
        Some(processor) => i64::from(processor.rep_count()),
        None => -1,
    }
}

/// Reset the session to its initial state.
///
/// # Safety
/// - `session` must be a live handle from `repform_session_new`, or NULL
///   (a no-op).
#[no_mangle]
pub unsafe extern "C" fn repform_session_reset(session: *mut SessionProcessor) {
    if let Some(processor) = session.as_mut() {
        processor.reset();
    }
}

/// Encode the session so far as summary JSON
/// (repform.session_summary.v1).
///
/// # Safety
/// - `session` must be a live handle from `repform_session_new`.
/// - Returns a newly allocated string that must be freed with
///   `repform_free_string`; NULL on error.
#[no_mangle]
pub unsafe extern "C" fn repform_session_summary(
    session: *const SessionProcessor,
) -> *mut c_char {
    clear_last_error();

    let Some(processor) = session.as_ref() else {
        set_last_error("Null session handle");
        return ptr::null_mut();
    };

    match processor.summary_json() {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Free a session handle.
///
/// # Safety
/// - `session` must be a handle from `repform_session_new`, freed at most
///   once. NULL is a no-op.
#[no_mangle]
pub unsafe extern "C" fn repform_session_free(session: *mut SessionProcessor) {
    if !session.is_null() {
        drop(Box::from_raw(session));
    }
}

/// Get the last error message, or NULL if none.
///
/// # Safety
/// - Returns a newly allocated string that must be freed with
///   `repform_free_string`.
#[no_mangle]
pub unsafe extern "C" fn repform_last_error() -> *mut c_char {
    LAST_ERROR.with(|e| match e.borrow().as_ref() {
        Some(msg) => match msg.to_str() {
            Ok(s) => string_to_cstr(s),
            Err(_) => ptr::null_mut(),
        },
        None => ptr::null_mut(),
    })
}

/// Free a string returned by this library.
///
/// # Safety
/// - `s` must be a string returned by a repform function, freed at most
///   once. NULL is a no-op.
#[no_mangle]
pub unsafe extern "C" fn repform_free_string(s: *mut c_char) {
    if !s.is_null() {
        drop(CString::from_raw(s));
    }
}
