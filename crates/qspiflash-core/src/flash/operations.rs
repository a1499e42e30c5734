//! Page splitting for program operations

/// Iterator over `(address, chunk)` pairs that never cross a page boundary
///
/// The first chunk runs up to the end of the page containing `addr`; every
/// following chunk is at most one page.
#[derive(Debug, Clone)]
pub struct PageChunks<'a> {
    addr: u32,
    data: &'a [u8],
    page_size: u32,
}

impl<'a> PageChunks<'a> {
    /// Split `data` written at `addr` into page-bounded chunks
    ///
    /// `page_size` must be nonzero.
    pub fn new(addr: u32, data: &'a [u8], page_size: u32) -> Self {
        debug_assert!(page_size > 0);
        Self {
            addr,
            data,
            page_size,
        }
    }
}

impl<'a> Iterator for PageChunks<'a> {
    type Item = (u32, &'a [u8]);

    fn next(&mut self) -> Option<Self::Item> {
        if self.data.is_empty() || self.page_size == 0 {
            return None;
        }

        let page_offset = self.addr % self.page_size;
        let bytes_to_page_end = (self.page_size - page_offset) as usize;
        let chunk_size = core::cmp::min(bytes_to_page_end, self.data.len());

        let (chunk, rest) = self.data.split_at(chunk_size);
        let addr = self.addr;
        self.addr = self.addr.wrapping_add(chunk_size as u32);
        self.data = rest;
        Some((addr, chunk))
    }
}
