//! Default value functions for serde deserialization.
//!
//! These functions forward to constants defined in `hopgate_core::defaults`.

use hopgate_core::defaults;

/// Generate default value functions that forward to hopgate_core::defaults constants.
macro_rules! default_fns {
    ($($fn_name:ident => $const_name:ident : $ty:ty),* $(,)?) => {
        $(
            pub(crate) fn $fn_name() -> $ty {
                defaults::$const_name
            }
        )*
    };
}

default_fns! {
    default_relay_buffer_size   => DEFAULT_RELAY_BUFFER_SIZE: usize,
    default_report_proxy_errors => DEFAULT_REPORT_PROXY_ERRORS: bool,
}

pub(crate) fn default_listen() -> String {
    defaults::DEFAULT_LISTEN.to_string()
}
