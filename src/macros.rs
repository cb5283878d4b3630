/// Helper macro for locking the state of an engine object
///
/// A poisoned lock is entered anyway; object state is plain data.
///
/// ```rust, ignore
///  let mut settings = lock!(match_context);
///  settings.match_limit = 42;
/// ```
macro_rules! lock {
    ($lock:expr) => {
        $lock
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    };
}
