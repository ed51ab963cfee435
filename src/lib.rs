//! Bridge worker: exposes a reflective object system to a driver process over stdio.

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod handle;
pub mod object_table;
pub mod output;
pub mod runtime;
pub mod wire;

pub mod prelude {
    pub use crate::config::Config;
    pub use crate::dispatcher::Dispatcher;
    pub use crate::error::{DispatchError, WireError};
    pub use crate::handle::{resolve_type_ref, resolve_value, NULL_HANDLE};
    pub use crate::object_table::ObjectTable;
    pub use crate::output::{OutputInterceptor, PrintSink};
    pub use crate::runtime::{BuiltinType, Class, Method, Value};
    pub use crate::wire::{Command, ResultTag};
}
