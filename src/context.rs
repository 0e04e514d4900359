use crate::core::Error;
use futures::FutureExt;
use std::future::Future;

/// The device, queue and backend mip generation runs on.
#[derive(Debug, Clone, Copy)]
pub struct GraphicsContext<'a> {
    device: &'a wgpu::Device,
    queue: &'a wgpu::Queue,
    backend: wgpu::Backend,
}

impl<'a> GraphicsContext<'a> {
    pub fn new(device: &'a wgpu::Device, queue: &'a wgpu::Queue, backend: wgpu::Backend) -> Self {
        Self {
            device,
            queue,
            backend,
        }
    }

    /// Creates a context for a device requested from `adapter`.
    pub fn from_adapter(
        adapter: &wgpu::Adapter,
        device: &'a wgpu::Device,
        queue: &'a wgpu::Queue,
    ) -> Self {
        Self::new(device, queue, adapter.get_info().backend)
    }

    pub fn device(&self) -> &'a wgpu::Device {
        self.device
    }

    pub fn queue(&self) -> &'a wgpu::Queue {
        self.queue
    }

    pub fn backend(&self) -> wgpu::Backend {
        self.backend
    }

    /// Opens a scope that captures validation and out-of-memory errors
    /// reported by the device until it is left or dropped.
    pub fn enter(&self) -> ContextScope<'a> {
        self.device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        ContextScope {
            device: self.device,
            open: true,
        }
    }
}

/// Error scopes pushed by [`GraphicsContext::enter`].
///
/// Dropping an open scope pops it and logs whatever it captured.
#[must_use = "a scope reports device errors when it is left"]
#[derive(Debug)]
pub struct ContextScope<'a> {
    device: &'a wgpu::Device,
    open: bool,
}

impl<'a> ContextScope<'a> {
    /// Closes the scope, returning the first error the device reported.
    pub fn leave(self) -> Result<(), Error> {
        match self.close() {
            Some(error) => Err(Error::Device(error.to_string())),
            None => Ok(()),
        }
    }

    pub(crate) fn close(mut self) -> Option<wgpu::Error> {
        self.open = false;
        pop_scopes(self.device)
    }
}

impl<'a> Drop for ContextScope<'a> {
    fn drop(&mut self) {
        if self.open {
            if let Some(error) = pop_scopes(self.device) {
                log::warn!("[ContextScope::drop] discarding device error: {}", error);
            }
        }
    }
}

fn pop_scopes(device: &wgpu::Device) -> Option<wgpu::Error> {
    // popped in reverse push order
    let validation = scope_result(device.pop_error_scope());
    let out_of_memory = scope_result(device.pop_error_scope());
    validation.or(out_of_memory)
}

/// Native devices resolve popped scopes immediately, so the result is taken
/// without blocking. A caller may already be running inside an executor.
fn scope_result(popped: impl Future<Output = Option<wgpu::Error>>) -> Option<wgpu::Error> {
    popped.now_or_never().unwrap_or_else(|| {
        log::warn!("[ContextScope] device did not report the scope result, assuming no error");
        None
    })
}
