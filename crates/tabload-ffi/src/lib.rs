//! C FFI bindings for tabload-core
//!
//! This crate provides a C-compatible API for loading a file or folder into a
//! combined table and reading the result back.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::path::PathBuf;
use std::ptr;

use tabload_core::{ColumnConsistency, DataLoader, LoaderConfig, Table};

thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

fn set_last_error(message: String) {
    // Paths may carry interior NULs
    let message = CString::new(message.replace('\0', "\u{FFFD}")).unwrap_or_default();
    LAST_ERROR.with(|slot| *slot.borrow_mut() = Some(message));
}

/// Opaque handle to a loaded table
pub struct FfiTable {
    inner: Table,
}

/// Load a file or folder into one table
///
/// `consistency` is one of "error", "warning" or "ignore"; null means "error".
///
/// # Safety
/// - `path` must be a valid C string
/// - `consistency` must be a valid C string or null
/// - Returns null on error; the message is available from `tl_last_error`
#[no_mangle]
pub unsafe extern "C" fn tl_load(
    path: *const c_char,
    include_subfolders: bool,
    verbose: bool,
    consistency: *const c_char,
) -> *mut FfiTable {
    if path.is_null() {
        set_last_error("path is null".to_string());
        return ptr::null_mut();
    }

    let path = match CStr::from_ptr(path).to_str() {
        Ok(s) => PathBuf::from(s),
        Err(e) => {
            set_last_error(format!("path is not valid UTF-8: {}", e));
            return ptr::null_mut();
        }
    };

    let policy = if consistency.is_null() {
        Ok(ColumnConsistency::Error)
    } else {
        match CStr::from_ptr(consistency).to_str() {
            Ok(s) => s.parse::<ColumnConsistency>(),
            Err(_) => Err(tabload_core::Error::InvalidConsistency(
                "<invalid UTF-8>".to_string(),
            )),
        }
    };

    let config = match policy {
        Ok(policy) => LoaderConfig::new(path)
            .include_subfolders(include_subfolders)
            .verbose(verbose)
            .column_consistency(policy),
        Err(e) => {
            set_last_error(e.to_string());
            return ptr::null_mut();
        }
    };

    match DataLoader::new(config).load() {
        Ok(table) => Box::into_raw(Box::new(FfiTable { inner: table })),
        Err(e) => {
            set_last_error(e.to_string());
            ptr::null_mut()
        }
    }
}

/// Message of the last failed `tl_load` on this thread
///
/// # Safety
/// - Returns null if nothing has failed yet
/// - Caller must free the returned string with `tl_free_string`
#[no_mangle]
pub unsafe extern "C" fn tl_last_error() -> *mut c_char {
    LAST_ERROR.with(|slot| {
        slot.borrow()
            .as_ref()
            .map(|s| s.clone().into_raw())
            .unwrap_or(ptr::null_mut())
    })
}

/// Free a table
///
/// # Safety
/// - `table` must be a valid pointer returned by `tl_load` or null
#[no_mangle]
pub unsafe extern "C" fn tl_free_table(table: *mut FfiTable) {
    if !table.is_null() {
        drop(Box::from_raw(table));
    }
}

/// Get the row count of a table
///
/// # Safety
/// - `table` must be a valid pointer returned by `tl_load`
#[no_mangle]
pub unsafe extern "C" fn tl_table_row_count(table: *const FfiTable) -> usize {
    if table.is_null() {
        return 0;
    }
    (*table).inner.row_count()
}

/// Get the column count of a table
///
/// # Safety
/// - `table` must be a valid pointer returned by `tl_load`
#[no_mangle]
pub unsafe extern "C" fn tl_table_col_count(table: *const FfiTable) -> usize {
    if table.is_null() {
        return 0;
    }
    (*table).inner.column_count()
}

/// Get a column name by index
///
/// # Safety
/// - `table` must be a valid pointer returned by `tl_load`
/// - Returns null if index is out of bounds
/// - Caller must free the returned string with `tl_free_string`
#[no_mangle]
pub unsafe extern "C" fn tl_table_col_name(table: *const FfiTable, index: usize) -> *mut c_char {
    if table.is_null() {
        return ptr::null_mut();
    }

    (&(*table)
        .inner
        .columns)
        .get(index)
        .and_then(|c| CString::new(c.name.as_str()).ok())
        .map(|s| s.into_raw())
        .unwrap_or(ptr::null_mut())
}

/// Get a cell value as a string
///
/// # Safety
/// - `table` must be a valid pointer returned by `tl_load`
/// - Returns null if row or col is out of bounds
/// - Caller must free the returned string with `tl_free_string`
#[no_mangle]
pub unsafe extern "C" fn tl_table_cell(table: *const FfiTable, row: usize, col: usize) -> *mut c_char {
    if table.is_null() {
        return ptr::null_mut();
    }

    (&(*table)
        .inner
        .rows)
        .get(row)
        .and_then(|r| r.get(col))
        .and_then(|c| CString::new(c.to_string_value()).ok())
        .map(|s| s.into_raw())
        .unwrap_or(ptr::null_mut())
}

/// Get the file a row was loaded from
///
/// # Safety
/// - `table` must be a valid pointer returned by `tl_load`
/// - Returns null if row is out of bounds
/// - Caller must free the returned string with `tl_free_string`
#[no_mangle]
pub unsafe extern "C" fn tl_table_row_source(table: *const FfiTable, row: usize) -> *mut c_char {
    if table.is_null() {
        return ptr::null_mut();
    }

    (*table)
        .inner
        .row_source(row)
        .and_then(|p| p.to_str())
        .and_then(|s| CString::new(s).ok())
        .map(|s| s.into_raw())
        .unwrap_or(ptr::null_mut())
}

/// Serialize the whole table to JSON
///
/// # Safety
/// - `table` must be a valid pointer returned by `tl_load`
/// - Caller must free the returned string with `tl_free_string`
#[no_mangle]
pub unsafe extern "C" fn tl_table_to_json(table: *const FfiTable) -> *mut c_char {
    if table.is_null() {
        return ptr::null_mut();
    }

    serde_json::to_string(&(*table).inner)
        .ok()
        .and_then(|s| CString::new(s).ok())
        .map(|s| s.into_raw())
        .unwrap_or(ptr::null_mut())
}

/// Free a string returned by other FFI functions
///
/// # Safety
/// - `s` must be a valid pointer returned by a tl_* function or null
#[no_mangle]
pub unsafe extern "C" fn tl_free_string(s: *mut c_char) {
    if !s.is_null() {
        drop(CString::from_raw(s));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    unsafe fn take_string(s: *mut c_char) -> Option<String> {
        if s.is_null() {
            return None;
        }
        let value = CStr::from_ptr(s).to_string_lossy().into_owned();
        tl_free_string(s);
        Some(value)
    }

    #[test]
    fn test_load_and_read_back() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.csv"), "id,name\n1,ann\n").unwrap();
        fs::write(dir.path().join("b.csv"), "id,name\n2,bob\n").unwrap();
        let path = CString::new(dir.path().to_str().unwrap()).unwrap();

        unsafe {
            let table = tl_load(path.as_ptr(), false, false, ptr::null());
            assert!(!table.is_null());

            assert_eq!(tl_table_row_count(table), 2);
            assert_eq!(tl_table_col_count(table), 2);
            assert_eq!(take_string(tl_table_col_name(table, 1)).as_deref(), Some("name"));
            assert_eq!(take_string(tl_table_cell(table, 1, 1)).as_deref(), Some("bob"));
            assert!(take_string(tl_table_cell(table, 5, 0)).is_none());
            assert!(take_string(tl_table_row_source(table, 1))
                .unwrap()
                .ends_with("b.csv"));
            assert!(take_string(tl_table_to_json(table)).unwrap().contains("\"ann\""));

            tl_free_table(table);
        }
    }

    #[test]
    fn test_last_error_keeps_message_with_nul() {
        set_last_error("bad\0path".to_string());

        unsafe {
            assert_eq!(
                take_string(tl_last_error()).as_deref(),
                Some("bad\u{FFFD}path")
            );
        }
    }

    #[test]
    fn test_load_error_sets_last_error() {
        let path = CString::new("/does/not/exist").unwrap();
        let policy = CString::new("strict").unwrap();

        unsafe {
            assert!(tl_load(path.as_ptr(), false, false, policy.as_ptr()).is_null());
            assert!(take_string(tl_last_error()).unwrap().contains("strict"));

            assert!(tl_load(path.as_ptr(), false, false, ptr::null()).is_null());
            assert!(take_string(tl_last_error())
                .unwrap()
                .contains("neither a file nor a directory"));
        }
    }
}
