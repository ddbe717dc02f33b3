//! OpenALPR backend
//!
//! Drives the system `libopenalpr` through its C API. Results come back as
//! JSON text owned by the library and are parsed into [`AlprResults`].

use std::ffi::{CStr, CString};
use std::os::raw::{c_char, c_int, c_longlong, c_uchar};
use std::path::Path;

use tracing::debug;

use super::{image_dimensions, AlprEngine, EngineError, EngineOptions};
use crate::results::AlprResults;

#[repr(C)]
struct OpenAlprHandle {
    _private: [u8; 0],
}

#[repr(C)]
#[derive(Clone, Copy)]
struct CRegionOfInterest {
    x: c_int,
    y: c_int,
    width: c_int,
    height: c_int,
}

#[link(name = "openalpr")]
extern "C" {
    fn openalpr_init(
        country: *const c_char,
        config_file: *const c_char,
        runtime_dir: *const c_char,
    ) -> *mut OpenAlprHandle;

    fn openalpr_is_loaded(instance: *mut OpenAlprHandle) -> c_int;

    fn openalpr_set_default_region(instance: *mut OpenAlprHandle, region: *const c_char);

    fn openalpr_set_detect_region(instance: *mut OpenAlprHandle, detect_region: c_int);

    fn openalpr_set_topn(instance: *mut OpenAlprHandle, top_n: c_int);

    fn openalpr_recognize_encodedimage(
        instance: *mut OpenAlprHandle,
        bytes: *mut c_uchar,
        len: c_longlong,
        roi: CRegionOfInterest,
    ) -> *mut c_char;

    fn openalpr_free_response_string(response: *mut c_char);

    fn openalpr_cleanup(instance: *mut OpenAlprHandle);
}

/// Response string owned by libopenalpr, released on drop
struct OwnedResponse {
    raw: *mut c_char,
}

impl OwnedResponse {
    fn to_str(&self) -> Result<&str, EngineError> {
        unsafe { CStr::from_ptr(self.raw) }
            .to_str()
            .map_err(|e| EngineError::backend(format!("response is not valid UTF-8: {e}")))
    }
}

impl Drop for OwnedResponse {
    fn drop(&mut self) {
        unsafe { openalpr_free_response_string(self.raw) };
    }
}

/// Native engine instance
pub struct OpenAlprEngine {
    handle: *mut OpenAlprHandle,
}

// The handle is only touched through `&self`/`&mut self`, and the facade
// serializes every call behind its lock.
unsafe impl Send for OpenAlprEngine {}

fn c_string(value: &str, what: &str) -> Result<CString, EngineError> {
    CString::new(value).map_err(|_| EngineError::construction(format!("{what} contains a NUL byte")))
}

fn c_path(path: &Path, what: &str) -> Result<CString, EngineError> {
    let text = path
        .to_str()
        .ok_or_else(|| EngineError::construction(format!("{what} is not valid UTF-8: {path:?}")))?;
    c_string(text, what)
}

impl OpenAlprEngine {
    pub fn new(options: &EngineOptions) -> Result<Self, EngineError> {
        let country = c_string(&options.region, "region")?;
        let config_file = c_path(&options.config_file, "configuration file path")?;
        let runtime_dir = c_path(&options.runtime_dir, "runtime data directory")?;

        let handle =
            unsafe { openalpr_init(country.as_ptr(), config_file.as_ptr(), runtime_dir.as_ptr()) };
        if handle.is_null() {
            return Err(EngineError::construction("openalpr_init returned a null instance"));
        }

        debug!(region = %options.region, "libopenalpr instance created");
        Ok(Self { handle })
    }
}

impl Drop for OpenAlprEngine {
    fn drop(&mut self) {
        unsafe { openalpr_cleanup(self.handle) };
        debug!("libopenalpr instance released");
    }
}

impl AlprEngine for OpenAlprEngine {
    fn name(&self) -> &'static str {
        "openalpr"
    }

    fn is_loaded(&self) -> bool {
        unsafe { openalpr_is_loaded(self.handle) != 0 }
    }

    fn recognize_bytes(&mut self, bytes: &[u8]) -> Result<AlprResults, EngineError> {
        if !self.is_loaded() {
            return Err(EngineError::NotLoaded);
        }

        let (width, height) = image_dimensions(bytes)?;
        let dimension = |value: u32| {
            c_int::try_from(value).map_err(|_| EngineError::Decode {
                len: bytes.len(),
                message: format!("image dimension {value} does not fit a C int"),
            })
        };
        let roi = CRegionOfInterest {
            x: 0,
            y: 0,
            width: dimension(width)?,
            height: dimension(height)?,
        };
        let len = c_longlong::try_from(bytes.len())
            .map_err(|_| EngineError::backend("image buffer too large"))?;

        // The C signature takes a mutable pointer but only reads the buffer.
        let raw = unsafe {
            openalpr_recognize_encodedimage(self.handle, bytes.as_ptr() as *mut c_uchar, len, roi)
        };
        if raw.is_null() {
            return Err(EngineError::backend("openalpr returned no response"));
        }

        let response = OwnedResponse { raw };
        Ok(AlprResults::from_json(response.to_str()?)?)
    }

    fn set_default_region(&mut self, region: &str) -> Result<(), EngineError> {
        let region = CString::new(region)
            .map_err(|_| EngineError::backend("default region contains a NUL byte"))?;
        unsafe { openalpr_set_default_region(self.handle, region.as_ptr()) };
        Ok(())
    }

    fn set_detect_region(&mut self, detect: bool) -> Result<(), EngineError> {
        unsafe { openalpr_set_detect_region(self.handle, c_int::from(detect)) };
        Ok(())
    }

    fn set_top_n(&mut self, top_n: u32) -> Result<(), EngineError> {
        let top_n = c_int::try_from(top_n)
            .map_err(|_| EngineError::backend(format!("top-N {top_n} does not fit a C int")))?;
        unsafe { openalpr_set_topn(self.handle, top_n) };
        Ok(())
    }

    /// The C API exposes no version query, so this always fails.
    fn version(&self) -> Result<String, EngineError> {
        Err(EngineError::Unsupported {
            backend: "openalpr",
            operation: "version query",
        })
    }
}
