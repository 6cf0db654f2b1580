//! Growable GPU buffers for geometry that changes at runtime.
//!
//! Buffers grow by 2x when data exceeds capacity and never shrink (GPU
//! buffers cannot be resized in place).

use std::marker::PhantomData;

/// Smallest allocation, in bytes.
const MIN_CAPACITY: usize = 64;

/// A typed GPU buffer that reallocates when a write exceeds capacity.
///
/// Tracks item count rather than byte length.
pub struct TypedBuffer<T> {
    buffer: wgpu::Buffer,
    capacity: usize,
    count: usize,
    usage: wgpu::BufferUsages,
    label: String,
    _marker: PhantomData<T>,
}

impl<T: bytemuck::Pod> TypedBuffer<T> {
    /// Buffer initialized from `data`.
    pub fn with_data(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        label: &str,
        data: &[T],
        usage: wgpu::BufferUsages,
    ) -> Self {
        let bytes: &[u8] = bytemuck::cast_slice(data);
        let capacity = bytes.len().max(MIN_CAPACITY);
        let buffer = Self::allocate(device, label, capacity, usage);
        if !bytes.is_empty() {
            queue.write_buffer(&buffer, 0, bytes);
        }
        Self {
            buffer,
            capacity,
            count: data.len(),
            usage,
            label: label.to_owned(),
            _marker: PhantomData,
        }
    }

    /// Replace the contents, growing if necessary.
    ///
    /// Returns `true` if the buffer was reallocated.
    pub fn write(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, data: &[T]) -> bool {
        let bytes: &[u8] = bytemuck::cast_slice(data);
        let needed = bytes.len();

        let reallocated = needed > self.capacity;
        if reallocated {
            let new_capacity = (needed * 2).max(self.capacity + 1024);
            self.buffer = Self::allocate(device, &self.label, new_capacity, self.usage);
            self.capacity = new_capacity;
            log::debug!("{}: grew to {new_capacity} bytes", self.label);
        }

        if needed > 0 {
            queue.write_buffer(&self.buffer, 0, bytes);
        }
        self.count = data.len();
        reallocated
    }

    fn allocate(
        device: &wgpu::Device,
        label: &str,
        capacity: usize,
        usage: wgpu::BufferUsages,
    ) -> wgpu::Buffer {
        device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size: capacity as u64,
            usage: usage | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }

    /// Slice covering the written items.
    pub fn slice(&self) -> wgpu::BufferSlice<'_> {
        self.buffer
            .slice(..(self.count * size_of::<T>()) as u64)
    }

    /// Number of items written.
    pub fn count(&self) -> usize {
        self.count
    }

    /// Whether nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}
