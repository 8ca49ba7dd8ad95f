pub fn set_panic_hook() {
    // Panics show up as readable messages in the browser console.
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

pub fn init_logging() {
    if console_log::init_with_level(log::Level::Debug).is_err() {
        log::debug!("Logger already initialised");
    }
}
