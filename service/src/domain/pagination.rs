use serde::Serialize;

/// A 1-based page number and a page size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    number: u64,
    size: u32,
}

impl PageRequest {
    /// Pages are numbered from 1, anything lower has no page.
    pub fn new(number: i64, size: u32) -> Option<Self> {
        if number < 1 || size == 0 {
            return None;
        }
        let number = u64::try_from(number).ok()?;
        Some(Self { number, size })
    }

    pub fn number(&self) -> u64 {
        self.number
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn offset(&self) -> u64 {
        (self.number - 1).saturating_mul(u64::from(self.size))
    }
}

/// One slice of a sorted collection plus what templates need to draw
/// navigation. A page past the end is empty, not an error.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub number: u64,
    pub size: u32,
    pub total_items: u64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, request: PageRequest, total_items: u64) -> Self {
        Self {
            items,
            number: request.number,
            size: request.size,
            total_items,
        }
    }

    /// at least one, even for an empty collection
    pub fn page_count(&self) -> u64 {
        self.total_items.div_ceil(u64::from(self.size)).max(1)
    }

    pub fn has_previous(&self) -> bool {
        self.number > 1
    }

    pub fn has_next(&self) -> bool {
        self.number < self.page_count()
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            number: self.number,
            size: self.size,
            total_items: self.total_items,
        }
    }
}
