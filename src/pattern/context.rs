//! Compile and match contexts.
//!
//! Contexts carry the settings that do not fit into option bits: resource ceilings, the newline
//! convention, the callout handler and the JIT stack. A context may be reused across calls but
//! not shared between threads that match concurrently.

use std::sync::Arc;

use super::jit::JitAssignment;
use crate::{
    backend::same_backend,
    callout::CalloutRegistration,
    config::{CompileLimits, MatchLimits, Newline},
    error::check,
    resource::{CompileContextKind, MatchContextKind, NativeResource},
    Backend, Handle, JitStack, Result,
};

/// Settings applied when compiling.
#[derive(Debug)]
pub struct CompileContext {
    resource: NativeResource<CompileContextKind>,
}

impl CompileContext {
    /// Allocates a compile context with default settings.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Allocation`] if the engine could not allocate it.
    pub fn new(backend: &Arc<dyn Backend>) -> Result<Self> {
        Ok(CompileContext {
            resource: NativeResource::create(backend, |b| b.compile_context_create())?,
        })
    }

    /// Applies every setting of `limits`.
    ///
    /// # Errors
    ///
    /// Returns the first failure of the individual setters.
    pub fn apply_limits(&self, limits: &CompileLimits) -> Result<()> {
        self.set_max_pattern_length(limits.max_pattern_length)?;
        self.set_parens_nest_limit(limits.parens_nest_limit)?;
        self.set_newline(limits.newline)
    }

    /// Sets the maximum pattern length in UTF-8 bytes.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Released`] after disposal or [`crate::Error::Native`].
    pub fn set_max_pattern_length(&self, length: usize) -> Result<()> {
        let handle = self.handle()?;
        check(self.backend().set_max_pattern_length(handle, length)).map(drop)
    }

    /// Sets the maximum parenthesis nesting depth.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Released`] after disposal or [`crate::Error::Native`].
    pub fn set_parens_nest_limit(&self, limit: u32) -> Result<()> {
        let handle = self.handle()?;
        check(self.backend().set_parens_nest_limit(handle, limit)).map(drop)
    }

    /// Sets the newline convention.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Released`] after disposal or [`crate::Error::Native`].
    pub fn set_newline(&self, newline: Newline) -> Result<()> {
        let handle = self.handle()?;
        check(self.backend().set_newline(handle, newline.code())).map(drop)
    }

    /// The native handle.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Released`] after disposal.
    pub fn handle(&self) -> Result<Handle> {
        self.resource.handle()
    }

    /// The backend owning the context.
    pub fn backend(&self) -> &Arc<dyn Backend> {
        self.resource.backend()
    }

    /// Releases the context now.
    pub fn dispose(&self) {
        self.resource.dispose();
    }

    /// Returns `true` once released.
    pub fn is_released(&self) -> bool {
        self.resource.is_released()
    }
}

/// Settings applied when matching: limits, callout handler and JIT stack.
///
/// The context owns its callout registration and JIT stack reference. Both are kept alive until
/// the native context has been released, on either disposal path.
pub struct MatchContext {
    resource: NativeResource<MatchContextKind>,
    callout: Option<CalloutRegistration>,
    jit_stack: Option<JitAssignment>,
}

impl MatchContext {
    /// Allocates a match context with default settings.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Allocation`] if the engine could not allocate it.
    pub fn new(backend: &Arc<dyn Backend>) -> Result<Self> {
        Ok(MatchContext {
            resource: NativeResource::create(backend, |b| b.match_context_create())?,
            callout: None,
            jit_stack: None,
        })
    }

    /// Applies every setting of `limits`.
    ///
    /// # Errors
    ///
    /// Returns the first failure of the individual setters.
    pub fn apply_limits(&self, limits: &MatchLimits) -> Result<()> {
        self.set_match_limit(limits.match_limit)?;
        self.set_depth_limit(limits.depth_limit)?;
        self.set_heap_limit(limits.heap_limit_kib)?;
        self.set_offset_limit(limits.offset_limit)
    }

    /// Sets the match step limit.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Released`] after disposal or [`crate::Error::Native`].
    pub fn set_match_limit(&self, limit: u32) -> Result<()> {
        let handle = self.handle()?;
        check(self.backend().set_match_limit(handle, limit)).map(drop)
    }

    /// Sets the depth limit.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Released`] after disposal or [`crate::Error::Native`].
    pub fn set_depth_limit(&self, limit: u32) -> Result<()> {
        let handle = self.handle()?;
        check(self.backend().set_depth_limit(handle, limit)).map(drop)
    }

    /// Sets the heap limit in KiB.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Released`] after disposal or [`crate::Error::Native`].
    pub fn set_heap_limit(&self, limit_kib: u32) -> Result<()> {
        let handle = self.handle()?;
        check(self.backend().set_heap_limit(handle, limit_kib)).map(drop)
    }

    /// Sets or clears the offset limit. Patterns matched with a limit set must be compiled with
    /// [`crate::CompileOptions::USE_OFFSET_LIMIT`].
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Released`] after disposal or [`crate::Error::Native`].
    pub fn set_offset_limit(&self, limit: Option<usize>) -> Result<()> {
        let handle = self.handle()?;
        check(self.backend().set_offset_limit(handle, limit)).map(drop)
    }

    /// Installs, replaces or clears (`None`) the callout handler.
    ///
    /// The engine is detached from the previous handler and the previous registration is
    /// released before the new one is installed.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Released`] after disposal or [`crate::Error::Native`]. On error
    /// the context is left without a handler.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use nativeregex::{backend::default_backend, CalloutRegistration, MatchContext};
    ///
    /// let backend = default_backend();
    /// let mut context = MatchContext::new(&backend)?;
    /// context.set_callout(Some(CalloutRegistration::new(|callout| {
    ///     if callout.number() == 1 { 1 } else { 0 }
    /// })))?;
    /// context.set_callout(None)?;
    /// # Ok::<(), nativeregex::Error>(())
    /// ```
    pub fn set_callout(&mut self, registration: Option<CalloutRegistration>) -> Result<()> {
        let handle = self.handle()?;

        // SAFETY: clearing installs no data pointer.
        check(unsafe {
            self.backend()
                .set_callout(handle, None, std::ptr::null_mut())
        })?;
        drop(self.callout.take());

        if let Some(registration) = registration {
            // SAFETY: the registration is owned by this context and outlives the native context
            // on both disposal paths; the handler is `Send + Sync`.
            check(unsafe {
                self.backend().set_callout(
                    handle,
                    Some(registration.entry()),
                    registration.data(),
                )
            })?;
            self.callout = Some(registration);
        }
        Ok(())
    }

    /// Native identity of the installed callout registration, if any.
    pub fn callout_handle(&self) -> Option<Handle> {
        self.callout.as_ref().map(CalloutRegistration::handle)
    }

    /// Assigns a JIT stack, or restores the default with `None`.
    ///
    /// # Errors
    ///
    /// - [`crate::Error::InvalidArgument`] if the stack belongs to another backend
    /// - [`crate::Error::Released`] if the context or the stack was disposed
    /// - [`crate::Error::Native`] if the engine refuses the assignment
    pub fn assign_jit_stack(&mut self, stack: Option<Arc<JitStack>>) -> Result<()> {
        let handle = self.handle()?;
        let assignment = match stack {
            Some(stack) => {
                if !same_backend(stack.backend(), self.backend()) {
                    return Err(invalid_argument!(
                        "JIT stack belongs to a different backend"
                    ));
                }
                Some(JitAssignment::new(stack)?)
            }
            None => None,
        };
        let stack_handle = match &assignment {
            Some(assignment) => assignment.stack().handle()?,
            None => Handle::NULL,
        };

        check(self.backend().jit_stack_assign(handle, stack_handle))?;
        self.jit_stack = assignment;
        Ok(())
    }

    /// The assigned JIT stack, if any.
    pub fn jit_stack(&self) -> Option<&Arc<JitStack>> {
        self.jit_stack.as_ref().map(JitAssignment::stack)
    }

    /// The native handle.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Released`] after disposal.
    pub fn handle(&self) -> Result<Handle> {
        self.resource.handle()
    }

    /// The backend owning the context.
    pub fn backend(&self) -> &Arc<dyn Backend> {
        self.resource.backend()
    }

    /// Releases the context now, then its callout registration and JIT stack reference.
    pub fn dispose(&mut self) {
        self.resource.dispose();
        self.callout = None;
        self.jit_stack = None;
    }

    /// Returns `true` once released.
    pub fn is_released(&self) -> bool {
        self.resource.is_released()
    }
}

impl Drop for MatchContext {
    fn drop(&mut self) {
        if let Some(callout) = self.callout.take() {
            self.resource.keep_alive(Box::new(callout));
        }
        if let Some(stack) = self.jit_stack.take() {
            self.resource.keep_alive(Box::new(stack));
        }
    }
}

impl std::fmt::Debug for MatchContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MatchContext")
            .field("resource", &self.resource)
            .field("callout", &self.callout)
            .field("jit_stack", &self.jit_stack)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{test::backend, AutomataBackend, CleanupScheduler, Error};

    #[test]
    fn limits_apply_and_release_fails_fast() {
        let backend = backend();
        let context = CompileContext::new(&backend).unwrap();
        context
            .apply_limits(&CompileLimits::new().with_newline(Newline::CrLf))
            .unwrap();
        context.dispose();
        assert!(matches!(
            context.set_newline(Newline::Lf),
            Err(Error::Released("compile context"))
        ));

        let mut mctx = MatchContext::new(&backend).unwrap();
        mctx.apply_limits(&MatchLimits::strict()).unwrap();
        mctx.dispose();
        mctx.dispose();
        assert!(mctx.set_callout(None).is_err());
    }

    #[test]
    fn replacing_a_callout_releases_the_previous_one() {
        let backend = backend();
        let mut mctx = MatchContext::new(&backend).unwrap();

        let first = Arc::new(());
        let witness = Arc::clone(&first);
        mctx.set_callout(Some(CalloutRegistration::new(move |_| {
            let _ = &witness;
            0
        })))
        .unwrap();
        assert_eq!(Arc::strong_count(&first), 2);
        let first_handle = mctx.callout_handle().unwrap();

        mctx.set_callout(Some(CalloutRegistration::new(|_| 0))).unwrap();
        assert_eq!(Arc::strong_count(&first), 1);
        assert_ne!(mctx.callout_handle(), Some(first_handle));

        mctx.set_callout(None).unwrap();
        assert_eq!(mctx.callout_handle(), None);
    }

    #[test]
    fn registration_outlives_the_native_context() {
        let automata = Arc::new(AutomataBackend::new());
        let backend: Arc<dyn Backend> = automata.clone();
        let mut mctx = MatchContext::new(&backend).unwrap();

        let witness = Arc::new(());
        let held = Arc::clone(&witness);
        mctx.set_callout(Some(CalloutRegistration::new(move |_| {
            let _ = &held;
            0
        })))
        .unwrap();

        drop(mctx);
        CleanupScheduler::global().flush();
        assert_eq!(automata.live_objects(), 0);
        assert_eq!(Arc::strong_count(&witness), 1);
    }

    #[test]
    fn jit_stack_must_share_the_backend() {
        let backend = backend();
        let foreign: Arc<dyn Backend> = Arc::new(AutomataBackend::new());
        let stack = Arc::new(JitStack::new(&foreign, 1024, 4096).unwrap());

        let mut mctx = MatchContext::new(&backend).unwrap();
        assert!(matches!(
            mctx.assign_jit_stack(Some(Arc::clone(&stack))),
            Err(Error::InvalidArgument { .. })
        ));

        let local = Arc::new(JitStack::new(&backend, 1024, 4096).unwrap());
        mctx.assign_jit_stack(Some(Arc::clone(&local))).unwrap();
        assert_eq!(Arc::strong_count(&local), 2);
        mctx.assign_jit_stack(None).unwrap();
        assert_eq!(Arc::strong_count(&local), 1);
    }

    #[test]
    fn assigned_jit_stack_outlives_disposal_requests() {
        let backend = backend();
        let stack = Arc::new(JitStack::new(&backend, 1024, 4096).unwrap());

        let mut first = MatchContext::new(&backend).unwrap();
        let mut second = MatchContext::new(&backend).unwrap();
        first.assign_jit_stack(Some(Arc::clone(&stack))).unwrap();
        second.assign_jit_stack(Some(Arc::clone(&stack))).unwrap();
        assert!(Arc::ptr_eq(first.jit_stack().unwrap(), &stack));

        assert!(matches!(stack.dispose(), Err(Error::InvalidArgument { .. })));
        assert!(!stack.is_released());

        first.dispose();
        assert_eq!(stack.assignments(), 1);
        drop(second);
        CleanupScheduler::global().flush();
        assert_eq!(stack.assignments(), 0);

        stack.dispose().unwrap();
        let mut third = MatchContext::new(&backend).unwrap();
        assert!(matches!(
            third.assign_jit_stack(Some(Arc::clone(&stack))),
            Err(Error::Released(_))
        ));
        assert!(third.jit_stack().is_none());
    }
}
