use std::sync::Arc;

/// An encoded map image exactly as the renderer delivered it.
///
/// Pixel decoding happens in the drawing leaf; here the bytes are only moved
/// between snapshots. Cloning shares the buffer, so buffer identity survives
/// the current/last swap.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Bitmap {
    data: Arc<[u8]>,
}

impl Bitmap {
    pub fn new(data: impl Into<Arc<[u8]>>) -> Self {
        Self { data: data.into() }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// True when both handles refer to the same underlying buffer.
    pub fn same_buffer(&self, other: &Bitmap) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }
}
