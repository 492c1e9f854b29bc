//! ---
//! ems_section: "03-persistence-logging"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Context-stamping tracing macros for the DECODER tools."
//! ems_version: "v0.1.0"
//! ems_owner: "tbd"
//! ---
//! Logging macros that stamp events with a [`LogContext`](crate::LogContext).

#[doc(hidden)]
#[macro_export]
macro_rules! __decoder_event {
    ($level:expr, context = $ctx:expr, $($arg:tt)+) => {{
        let ctx = &$ctx;
        tracing::event!(
            $level,
            building = ctx.building.unwrap_or_default(),
            sensor = ctx.sensor.unwrap_or(""),
            check = ctx.check.unwrap_or(""),
            principal = ctx.principal.unwrap_or(""),
            message = %format_args!($($arg)+)
        );
    }};
    ($level:expr, $($arg:tt)+) => {{
        $crate::__decoder_event!($level, context = $crate::LogContext::default(), $($arg)+)
    }};
}

/// Emit an informational log enriched with request context.
#[macro_export]
macro_rules! decoder_info {
    ($($arg:tt)+) => {
        $crate::__decoder_event!(tracing::Level::INFO, $($arg)+)
    };
}

/// Emit a debug log enriched with request context.
#[macro_export]
macro_rules! decoder_debug {
    ($($arg:tt)+) => {
        $crate::__decoder_event!(tracing::Level::DEBUG, $($arg)+)
    };
}

/// Emit a warning enriched with request context.
#[macro_export]
macro_rules! decoder_warn {
    ($($arg:tt)+) => {
        $crate::__decoder_event!(tracing::Level::WARN, $($arg)+)
    };
}

/// Emit an error log enriched with request context.
#[macro_export]
macro_rules! decoder_error {
    ($($arg:tt)+) => {
        $crate::__decoder_event!(tracing::Level::ERROR, $($arg)+)
    };
}
