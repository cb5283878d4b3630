use std::sync::{Arc, Mutex};

use crate::{
    resource::{JitStackKind, NativeResource},
    Backend, Handle, Result,
};

/// A native stack for JIT-compiled matching.
///
/// Assign it to a [`crate::MatchContext`] with [`crate::MatchContext::assign_jit_stack`]; the
/// context keeps a reference so the stack outlives every context it is assigned to, and the
/// stack cannot be disposed while any context still uses it.
#[derive(Debug)]
pub struct JitStack {
    resource: NativeResource<JitStackKind>,
    start_size: usize,
    max_size: usize,
    assignments: Mutex<usize>,
}

impl JitStack {
    /// Allocates a JIT stack growing from `start_size` up to `max_size` bytes.
    ///
    /// # Errors
    ///
    /// - [`crate::Error::InvalidArgument`] unless `0 < start_size <= max_size`
    /// - [`crate::Error::Allocation`] if the engine could not allocate the stack
    pub fn new(backend: &Arc<dyn Backend>, start_size: usize, max_size: usize) -> Result<Self> {
        if start_size == 0 {
            return Err(invalid_argument!("JIT stack start size must be positive"));
        }
        if start_size > max_size {
            return Err(invalid_argument!(
                "JIT stack start size {} exceeds its maximum {}",
                start_size,
                max_size
            ));
        }

        let resource =
            NativeResource::create(backend, |b| b.jit_stack_create(start_size, max_size))?;
        Ok(JitStack {
            resource,
            start_size,
            max_size,
            assignments: Mutex::new(0),
        })
    }

    /// Initial size in bytes.
    pub fn start_size(&self) -> usize {
        self.start_size
    }

    /// Maximum size in bytes.
    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// The native handle.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Released`] after disposal.
    pub fn handle(&self) -> Result<Handle> {
        self.resource.handle()
    }

    /// The backend owning the stack.
    pub fn backend(&self) -> &Arc<dyn Backend> {
        self.resource.backend()
    }

    /// Number of match contexts the stack is currently assigned to.
    pub fn assignments(&self) -> usize {
        *lock!(self.assignments)
    }

    /// Releases the stack now. Disposing a released stack is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidArgument`] while the stack is assigned to a match context;
    /// the stack stays usable.
    pub fn dispose(&self) -> Result<()> {
        let assignments = lock!(self.assignments);
        if *assignments > 0 {
            return Err(invalid_argument!(
                "JIT stack is assigned to {} match context(s)",
                *assignments
            ));
        }
        self.resource.dispose();
        Ok(())
    }

    /// Returns `true` once released.
    pub fn is_released(&self) -> bool {
        self.resource.is_released()
    }
}

/// A JIT stack held by a match context. Disposal of the stack is refused until this is dropped.
#[derive(Debug)]
pub(crate) struct JitAssignment(Arc<JitStack>);

impl JitAssignment {
    /// Fails with [`crate::Error::Released`] if the stack was already disposed.
    pub(crate) fn new(stack: Arc<JitStack>) -> Result<Self> {
        {
            let mut assignments = lock!(stack.assignments);
            stack.resource.handle()?;
            *assignments += 1;
        }
        Ok(JitAssignment(stack))
    }

    pub(crate) fn stack(&self) -> &Arc<JitStack> {
        &self.0
    }
}

impl Drop for JitAssignment {
    fn drop(&mut self) {
        let mut assignments = lock!(self.0.assignments);
        *assignments = assignments.saturating_sub(1);
    }
}
