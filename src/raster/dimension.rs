/// Identifies one row, column or band of a cube.
///
/// The same physical row can have three numbers: its position in the
/// original dataset, its position in the file it was loaded from, and its
/// position in the currently active (possibly subset) cube. Caches work in
/// active numbers; file readers work in on-disk numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct DimensionDescriptor {
    pub original_number: u32,
    pub on_disk_number: u32,
    pub active_number: u32,
}

impl DimensionDescriptor {
    /// A descriptor whose three numbers agree.
    pub fn new(number: u32) -> Self {
        Self {
            original_number: number,
            on_disk_number: number,
            active_number: number,
        }
    }

    pub fn with_on_disk_number(mut self, number: u32) -> Self {
        self.on_disk_number = number;
        self
    }

    pub fn with_original_number(mut self, number: u32) -> Self {
        self.original_number = number;
        self
    }

    /// The descriptor `count` positions further along, in every numbering.
    pub fn offset_by(self, count: u32) -> Self {
        Self {
            original_number: self.original_number + count,
            on_disk_number: self.on_disk_number + count,
            active_number: self.active_number + count,
        }
    }
}

impl From<u32> for DimensionDescriptor {
    fn from(number: u32) -> Self {
        Self::new(number)
    }
}
