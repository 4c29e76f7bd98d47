// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

/// A cell width usable for dense storage. Saturates rather than wrapping on
/// overflow, matching the dense-cell behavior of `Counter::saturating_add`.
pub trait Cell: Copy + Default + Into<u64> {
    fn saturating_add_u64(self, by: u64) -> Self;
    fn from_u64_saturating(value: u64) -> Self;
}

impl Cell for u32 {
    fn saturating_add_u64(self, by: u64) -> Self {
        (u64::from(self).saturating_add(by)).min(u64::from(u32::MAX)) as u32
    }

    fn from_u64_saturating(value: u64) -> Self {
        value.min(u64::from(u32::MAX)) as u32
    }
}

impl Cell for u64 {
    fn saturating_add_u64(self, by: u64) -> Self {
        self.saturating_add(by)
    }

    fn from_u64_saturating(value: u64) -> Self {
        value
    }
}

/// A flat, fixed-width array of counts. The simplest and fastest of the
/// three [`super::Counts`] representations; appropriate whenever most
/// cells are expected to be non-zero.
#[derive(Clone, Debug)]
pub struct DenseStore<T> {
    cells: Vec<T>,
}

impl<T: Cell> DenseStore<T> {
    pub fn new(length: usize) -> Self {
        Self {
            cells: vec![T::default(); length],
        }
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn get(&self, index: usize) -> u64 {
        self.cells[index].into()
    }

    pub fn add(&mut self, index: usize, by: u64) {
        self.cells[index] = self.cells[index].saturating_add_u64(by);
    }

    pub fn set(&mut self, index: usize, value: u64) {
        self.cells[index] = T::from_u64_saturating(value);
    }

    pub fn clear(&mut self) {
        for cell in self.cells.iter_mut() {
            *cell = T::default();
        }
    }

    pub fn resize(&mut self, new_length: usize) {
        self.cells.resize(new_length, T::default());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn u32_saturates_instead_of_wrapping() {
        let mut store = DenseStore::<u32>::new(1);
        store.add(0, u64::from(u32::MAX));
        store.add(0, 10);
        assert_eq!(store.get(0), u64::from(u32::MAX));
    }
}
