//! Internal implementation details.

mod panic_guard;

pub(crate) use panic_guard::invoke_builder;
