#[macro_export]
macro_rules! tagged_event {
    ($level:ident, $logtag:path, $($arg:tt)*) => {{
        let event_tag: u64 = $logtag.into();
        $crate::tracing::event!($crate::tracing::Level::$level, event_tag, $($arg)*)
    }}
}

#[macro_export]
macro_rules! alarm {
    ($($arg:tt)*) => {{
        $crate::tracing::error!(alarm = true, $($arg)*);
    }};
}

#[macro_export]
macro_rules! admin_debug {
    ($($arg:tt)*) => { $crate::tagged_event!(DEBUG, $crate::EventTag::AdminDebug, $($arg)*) }
}

#[macro_export]
macro_rules! admin_error {
    ($($arg:tt)*) => { $crate::tagged_event!(ERROR, $crate::EventTag::AdminError, $($arg)*) }
}

#[macro_export]
macro_rules! admin_warn {
    ($($arg:tt)*) => { $crate::tagged_event!(WARN, $crate::EventTag::AdminWarn, $($arg)*) }
}

#[macro_export]
macro_rules! admin_info {
    ($($arg:tt)*) => { $crate::tagged_event!(INFO, $crate::EventTag::AdminInfo, $($arg)*) }
}

#[macro_export]
macro_rules! request_error {
    ($($arg:tt)*) => { $crate::tagged_event!(ERROR, $crate::EventTag::RequestError, $($arg)*) }
}

#[macro_export]
macro_rules! request_warn {
    ($($arg:tt)*) => { $crate::tagged_event!(WARN, $crate::EventTag::RequestWarn, $($arg)*) }
}

#[macro_export]
macro_rules! request_info {
    ($($arg:tt)*) => { $crate::tagged_event!(INFO, $crate::EventTag::RequestInfo, $($arg)*) }
}

#[macro_export]
macro_rules! request_trace {
    ($($arg:tt)*) => { $crate::tagged_event!(TRACE, $crate::EventTag::RequestTrace, $($arg)*) }
}

#[macro_export]
macro_rules! security_critical {
    ($($arg:tt)*) => { $crate::tagged_event!(INFO, $crate::EventTag::SecurityCritical, $($arg)*) }
}

#[macro_export]
macro_rules! security_debug {
    ($($arg:tt)*) => { $crate::tagged_event!(DEBUG, $crate::EventTag::SecurityDebug, $($arg)*) }
}

#[macro_export]
macro_rules! security_info {
    ($($arg:tt)*) => { $crate::tagged_event!(INFO, $crate::EventTag::SecurityInfo, $($arg)*) }
}

#[macro_export]
macro_rules! security_access {
    ($($arg:tt)*) => { $crate::tagged_event!(INFO, $crate::EventTag::SecurityAccess, $($arg)*) }
}

#[macro_export]
macro_rules! security_error {
    ($($arg:tt)*) => { $crate::tagged_event!(ERROR, $crate::EventTag::SecurityError, $($arg)*) }
}

#[macro_export]
macro_rules! perf_trace {
    ($($arg:tt)*) => { $crate::tagged_event!(TRACE, $crate::EventTag::PerfTrace, $($arg)*) }
}
