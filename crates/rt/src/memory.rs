use std::{
    ffi::{c_char, c_void},
    marker::PhantomData,
    mem::size_of,
    ops::Range,
};

use sandcall_ir::{Limits, MAX_PAGES, PAGE_SHIFT, PAGE_SIZE};

use crate::error::HostError;

/// Checks `[offset, offset + len)` against a buffer of `size` bytes.
///
/// Every pointer handed to native code is derived from a range produced
/// here. `(size, 0)` is a valid empty range.
#[inline]
fn bounds(size: usize, offset: u32, len: usize) -> Result<Range<usize>, HostError> {
    let start = offset as usize;
    let oob = || HostError::OutOfBounds {
        offset: offset as u64,
        len: len as u64,
        size: size as u64,
    };

    let end = start.checked_add(len).ok_or_else(oob)?;
    if end > size {
        return Err(oob());
    }
    Ok(start..end)
}

/// A sandbox's linear memory.
#[derive(Debug)]
pub struct MemoryRegion {
    max_len: usize,
    storage: Vec<u8>,
}

impl MemoryRegion {
    pub fn new(limits: Limits) -> Self {
        let page_count = limits.min().min(MAX_PAGES) as usize;
        let max_page_count = limits.max().unwrap_or(MAX_PAGES).min(MAX_PAGES) as usize;

        MemoryRegion {
            storage: vec![0u8; page_count << PAGE_SHIFT],
            max_len: max_page_count.max(page_count) << PAGE_SHIFT,
        }
    }

    /// A fixed-size memory of `len` bytes that cannot grow.
    pub fn with_len(len: usize) -> Self {
        MemoryRegion {
            storage: vec![0u8; len],
            max_len: len,
        }
    }

    pub fn len(&self) -> usize {
        self.storage.len()
    }

    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }

    pub fn max_len(&self) -> usize {
        self.max_len
    }

    pub fn page_count(&self) -> usize {
        self.storage.len() >> PAGE_SHIFT
    }

    pub fn as_slice(&self) -> &[u8] {
        self.storage.as_slice()
    }

    /// Grows by `page_count` pages, returning the previous page count, or
    /// `None` if the maximum would be exceeded. Growth may move the buffer.
    pub fn grow(&mut self, page_count: usize) -> Option<usize> {
        let old_page_count = self.page_count();
        let new_len = page_count
            .checked_mul(PAGE_SIZE)
            .and_then(|delta| self.storage.len().checked_add(delta))?;

        if new_len > self.max_len {
            return None;
        }

        self.storage.resize(new_len, 0);
        Some(old_page_count)
    }

    #[inline]
    pub fn translate(&self, offset: u32, len: usize) -> Result<Range<usize>, HostError> {
        bounds(self.storage.len(), offset, len)
    }

    pub fn read(&self, offset: u32, len: usize) -> Result<&[u8], HostError> {
        let range = self.translate(offset, len)?;
        Ok(&self.storage[range])
    }

    pub fn write(&mut self, offset: u32, data: &[u8]) -> Result<(), HostError> {
        let range = self.translate(offset, data.len())?;
        self.storage[range].copy_from_slice(data);
        Ok(())
    }

    pub fn fill(&mut self, val: u8, offset: u32, count: usize) -> Result<(), HostError> {
        let range = self.translate(offset, count)?;
        self.storage[range].fill(val);
        Ok(())
    }

    #[inline]
    pub fn load<const U: usize>(&self, offset: u32) -> Result<[u8; U], HostError> {
        let range = self.translate(offset, U)?;
        let mut out = [0u8; U];
        out.copy_from_slice(&self.storage[range]);
        Ok(out)
    }

    #[inline]
    pub fn store<const U: usize>(&mut self, offset: u32, value: &[u8; U]) -> Result<(), HostError> {
        self.write(offset, value.as_slice())
    }

    /// Borrows the memory for the duration of one host call.
    pub fn view(&mut self) -> MemoryView<'_> {
        MemoryView {
            base: self.storage.as_mut_ptr(),
            size: self.storage.len(),
            _marker: PhantomData,
        }
    }
}

/// Scalar types that may be viewed in place inside linear memory.
pub trait Element: Copy + sealed::Sealed {}

impl Element for u8 {}
impl Element for i8 {}
impl Element for i32 {}
impl Element for u32 {}
impl Element for i64 {}
impl Element for f32 {}
impl Element for f64 {}

mod sealed {
    pub trait Sealed {}
    impl Sealed for u8 {}
    impl Sealed for i8 {}
    impl Sealed for i32 {}
    impl Sealed for u32 {}
    impl Sealed for i64 {}
    impl Sealed for f32 {}
    impl Sealed for f64 {}
}

/// Exclusive access to one linear memory for the span of a single host
/// call. Regions translated through a view share its lifetime, so none of
/// them can survive a `grow`.
#[derive(Debug)]
pub struct MemoryView<'m> {
    base: *mut u8,
    size: usize,
    _marker: PhantomData<&'m mut [u8]>,
}

impl<'m> MemoryView<'m> {
    pub fn size(&self) -> usize {
        self.size
    }

    /// Raw pointer to `[offset, offset + len)`.
    pub fn translate(&self, offset: u32, len: usize) -> Result<*mut u8, HostError> {
        let range = bounds(self.size, offset, len)?;
        log::trace!("translate offset={offset} len={len}");

        // SAFETY: `range.start <= self.size`, so the result stays within (or
        // one past the end of) the allocation.
        Ok(unsafe { self.base.add(range.start) })
    }

    /// `count` elements of `T` starting at `offset`.
    pub fn array<T: Element>(&self, offset: u32, count: usize) -> Result<Region<'m, T>, HostError> {
        let len = count
            .checked_mul(size_of::<T>())
            .ok_or(HostError::InvalidExtent {
                offset,
                what: "array",
            })?;

        let ptr = self.translate(offset, len)?;
        Ok(Region {
            ptr: ptr.cast(),
            len: count,
            _marker: PhantomData,
        })
    }

    /// A NUL-terminated string starting at `offset`. The terminator must lie
    /// inside memory and is included in the returned region.
    pub fn cstr(&self, offset: u32) -> Result<Region<'m, u8>, HostError> {
        let range = bounds(self.size, offset, 0)?;

        // SAFETY: `range.start..self.size` is in bounds; the slice is dropped
        // before any other access through this view.
        let tail = unsafe {
            std::slice::from_raw_parts(self.base.add(range.start), self.size - range.start)
        };
        let Some(nul) = tail.iter().position(|byte| *byte == 0) else {
            return Err(HostError::OutOfBounds {
                offset: offset as u64,
                len: tail.len() as u64 + 1,
                size: self.size as u64,
            });
        };

        self.array::<u8>(offset, nul + 1)
    }

    /// Opaque pointer with no extent; valid for any `offset <= size`.
    pub fn opaque(&self, offset: u32) -> Result<*mut c_void, HostError> {
        self.translate(offset, 0).map(|ptr| ptr.cast())
    }

    /// A tensor described by a data offset, a rank and the offset of a
    /// `rank`-long dims array. The data extent is the product of the dims.
    pub fn tensor<T: Element>(&self, data: u32, ndim: u32, dims: u32) -> Result<Tensor<'m, T>, HostError> {
        let dims = self.array::<i32>(dims, ndim as usize)?;

        let mut count: usize = 1;
        for dim in dims.iter() {
            let dim = usize::try_from(dim).map_err(|_| HostError::InvalidExtent {
                offset: data,
                what: "tensor with a negative dimension",
            })?;
            count = count.checked_mul(dim).ok_or(HostError::InvalidExtent {
                offset: data,
                what: "tensor",
            })?;
        }

        Ok(Tensor {
            data: self.array::<T>(data, count)?,
            ndim: ndim as i32,
            dims,
        })
    }
}

/// A bounds-checked run of `T` inside linear memory. Reads and writes are
/// unaligned: sandbox offsets carry no alignment guarantee.
#[derive(Debug)]
pub struct Region<'m, T> {
    ptr: *mut T,
    len: usize,
    _marker: PhantomData<&'m mut [T]>,
}

impl<'m, T: Element> Region<'m, T> {
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn as_ptr(&self) -> *const T {
        self.ptr
    }

    pub fn as_mut_ptr(&self) -> *mut T {
        self.ptr
    }

    pub fn get(&self, idx: usize) -> Option<T> {
        if idx >= self.len {
            return None;
        }
        // SAFETY: idx < len and the region was bounds-checked on creation.
        Some(unsafe { self.ptr.add(idx).read_unaligned() })
    }

    pub fn set(&self, idx: usize, value: T) -> Option<()> {
        if idx >= self.len {
            return None;
        }
        // SAFETY: see `get`.
        unsafe { self.ptr.add(idx).write_unaligned(value) };
        Some(())
    }

    pub fn iter(&self) -> impl Iterator<Item = T> + '_ {
        (0..self.len).filter_map(|idx| self.get(idx))
    }

    pub fn to_vec(&self) -> Vec<T> {
        self.iter().collect()
    }

    pub fn as_c_str_ptr(&self) -> *const c_char {
        self.ptr.cast()
    }
}

#[derive(Debug)]
pub struct Tensor<'m, T> {
    pub data: Region<'m, T>,
    pub ndim: i32,
    pub dims: Region<'m, i32>,
}

impl<'m, T: Element> Tensor<'m, T> {
    pub fn shape(&self) -> Vec<i32> {
        self.dims.to_vec()
    }
}
