//! Builder invocation with panic containment.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use crate::error::{BoxError, LocatorError, LocatorResult};

/// Runs a builder, turning both `Err` and panics into a `LocatorError`.
pub(crate) fn invoke_builder<T, F>(name: &str, f: F) -> LocatorResult<T>
where
    F: FnOnce() -> Result<T, BoxError>,
{
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(source)) => Err(LocatorError::builder(name, source)),
        Err(payload) => Err(LocatorError::BuilderPanicked {
            name: name.to_string(),
            message: panic_message(payload.as_ref()),
        }),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
