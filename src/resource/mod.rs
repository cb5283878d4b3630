//! Ownership of native handles.
//!
//! [`NativeResource`] owns exactly one [`Handle`] together with the [`Backend`] that produced it
//! and guarantees that the native object is released exactly once. The lifecycle is
//! *Active → Released*; a resource whose allocation failed is never constructed.
//!
//! # Disposal paths
//!
//! - [`NativeResource::dispose`] releases synchronously on the calling thread. Calling it again
//!   is a no-op.
//! - Dropping an undisposed resource hands its cleanup record to the [`CleanupScheduler`], which
//!   releases it on its background thread.
//!
//! Both paths go through the same cleanup record, so they can race without releasing twice.
//!
//! # Resource kinds
//!
//! Each native object type is a zero-sized [`ResourceKind`] naming its release entry point:
//! [`CodeKind`], [`MatchDataKind`], [`CompileContextKind`], [`MatchContextKind`] and
//! [`JitStackKind`].

pub mod scheduler;

use std::{
    marker::PhantomData,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex, PoisonError,
    },
};

pub use scheduler::{CleanupScheduler, CleanupToken, KeepAlive};

use crate::{Backend, Error, Handle, Result};

/// A type of native object and how to release it.
pub trait ResourceKind: 'static {
    /// Human-readable name used in errors and logs.
    const NAME: &'static str;

    /// Releases one native object of this kind.
    fn release(backend: &dyn Backend, handle: Handle) -> i32;
}

/// Compiled pattern.
pub struct CodeKind;

impl ResourceKind for CodeKind {
    const NAME: &'static str = "compiled pattern";

    fn release(backend: &dyn Backend, handle: Handle) -> i32 {
        backend.code_free(handle)
    }
}

/// Match data.
pub struct MatchDataKind;

impl ResourceKind for MatchDataKind {
    const NAME: &'static str = "match data";

    fn release(backend: &dyn Backend, handle: Handle) -> i32 {
        backend.match_data_free(handle)
    }
}

/// Compile context.
pub struct CompileContextKind;

impl ResourceKind for CompileContextKind {
    const NAME: &'static str = "compile context";

    fn release(backend: &dyn Backend, handle: Handle) -> i32 {
        backend.compile_context_free(handle)
    }
}

/// Match context.
pub struct MatchContextKind;

impl ResourceKind for MatchContextKind {
    const NAME: &'static str = "match context";

    fn release(backend: &dyn Backend, handle: Handle) -> i32 {
        backend.match_context_free(handle)
    }
}

/// JIT stack.
pub struct JitStackKind;

impl ResourceKind for JitStackKind {
    const NAME: &'static str = "JIT stack";

    fn release(backend: &dyn Backend, handle: Handle) -> i32 {
        backend.jit_stack_free(handle)
    }
}

/// Exclusive owner of one native object.
pub struct NativeResource<K: ResourceKind> {
    backend: Arc<dyn Backend>,
    handle: Handle,
    token: CleanupToken,
    released: AtomicBool,
    keep_alive: Mutex<Vec<KeepAlive>>,
    _kind: PhantomData<fn() -> K>,
}

impl<K: ResourceKind> NativeResource<K> {
    /// Allocates a native object through `alloc` and takes ownership of it.
    ///
    /// Callers validate their arguments before calling this; `alloc` is the native call itself.
    /// Exactly one cleanup record is registered before this returns successfully.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Allocation`] if `alloc` returned the null handle. Nothing is registered
    /// in that case.
    pub fn create<F>(backend: &Arc<dyn Backend>, alloc: F) -> Result<Self>
    where
        F: FnOnce(&dyn Backend) -> Handle,
    {
        let handle = alloc(backend.as_ref());
        if handle.is_null() {
            return Err(Error::Allocation(K::NAME));
        }

        let release_backend = Arc::clone(backend);
        let token = CleanupScheduler::global().register(
            K::NAME,
            Box::new(move || K::release(release_backend.as_ref(), handle)),
        );

        Ok(NativeResource {
            backend: Arc::clone(backend),
            handle,
            token,
            released: AtomicBool::new(false),
            keep_alive: Mutex::new(Vec::new()),
            _kind: PhantomData,
        })
    }

    /// The owned handle.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Released`] after [`NativeResource::dispose`].
    pub fn handle(&self) -> Result<Handle> {
        if self.released.load(Ordering::Acquire) {
            Err(Error::Released(K::NAME))
        } else {
            Ok(self.handle)
        }
    }

    /// The backend that owns the native object.
    pub fn backend(&self) -> &Arc<dyn Backend> {
        &self.backend
    }

    /// Returns `true` once the resource has been disposed.
    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::Acquire)
    }

    /// The cleanup record of this resource.
    pub fn token(&self) -> CleanupToken {
        self.token
    }

    /// Releases the native object now. Safe to call more than once.
    pub fn dispose(&self) {
        if !self.released.swap(true, Ordering::AcqRel) {
            CleanupScheduler::global().release_now(self.token);
        }
    }

    /// Keeps `item` alive until after the native object has been released, whichever disposal
    /// path runs.
    pub(crate) fn keep_alive(&self, item: KeepAlive) {
        lock!(self.keep_alive).push(item);
    }
}

impl<K: ResourceKind> Drop for NativeResource<K> {
    fn drop(&mut self) {
        let keep_alive = std::mem::take(
            self.keep_alive
                .get_mut()
                .unwrap_or_else(PoisonError::into_inner),
        );
        if !*self.released.get_mut() {
            CleanupScheduler::global().release_later(self.token, keep_alive);
        }
    }
}

impl<K: ResourceKind> std::fmt::Debug for NativeResource<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NativeResource")
            .field("kind", &K::NAME)
            .field("handle", &self.handle)
            .field("released", &self.is_released())
            .finish()
    }
}
