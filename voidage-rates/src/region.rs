use crate::ConfigurationError;

/// Assignment of grid cells to regions.
///
/// Every cell belongs to exactly one region and region indices are
/// contiguous from zero: each region in `0..num_regions` owns at least one
/// cell. The per-region cell lists are built once at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionMapping {
    cell_regions: Vec<usize>,
    region_cells: Vec<Vec<usize>>,
}

impl RegionMapping {
    /// Creates a mapping from one region index per cell.
    ///
    /// The number of regions is one more than the largest index.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigurationError`] if `cell_regions` is empty or some
    /// index below the largest one owns no cell.
    pub fn new(cell_regions: Vec<usize>) -> Result<Self, ConfigurationError> {
        let num_regions = cell_regions
            .iter()
            .max()
            .map(|&max| max + 1)
            .ok_or(ConfigurationError::EmptyRegionDefinition)?;

        Self::with_num_regions(cell_regions, num_regions)
    }

    /// Creates a mapping with an explicit region count.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigurationError`] if `cell_regions` is empty, an index
    /// is not below `num_regions`, or a region owns no cell.
    pub fn with_num_regions(
        cell_regions: Vec<usize>,
        num_regions: usize,
    ) -> Result<Self, ConfigurationError> {
        if cell_regions.is_empty() {
            return Err(ConfigurationError::EmptyRegionDefinition);
        }

        let mut region_cells = vec![Vec::new(); num_regions];
        for (cell, &region) in cell_regions.iter().enumerate() {
            let cells = region_cells.get_mut(region).ok_or(
                ConfigurationError::RegionIndexOutOfRange {
                    cell,
                    region,
                    num_regions,
                },
            )?;
            cells.push(cell);
        }

        if let Some(region) = region_cells.iter().position(Vec::is_empty) {
            return Err(ConfigurationError::EmptyRegion { region });
        }

        Ok(Self {
            cell_regions,
            region_cells,
        })
    }

    /// Creates a mapping that places all `num_cells` cells in region 0.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::EmptyRegionDefinition`] if `num_cells` is zero.
    pub fn single(num_cells: usize) -> Result<Self, ConfigurationError> {
        Self::new(vec![0; num_cells])
    }

    #[must_use]
    pub fn num_cells(&self) -> usize {
        self.cell_regions.len()
    }

    #[must_use]
    pub fn num_regions(&self) -> usize {
        self.region_cells.len()
    }

    /// Returns the region of `cell`, if the cell exists.
    #[must_use]
    pub fn region(&self, cell: usize) -> Option<usize> {
        self.cell_regions.get(cell).copied()
    }

    /// Returns the cells of `region` in ascending order, if the region exists.
    #[must_use]
    pub fn cells(&self, region: usize) -> Option<&[usize]> {
        self.region_cells.get(region).map(Vec::as_slice)
    }

    /// Iterates over `(region, cells)` pairs.
    pub fn regions(&self) -> impl Iterator<Item = (usize, &[usize])> {
        self.region_cells
            .iter()
            .enumerate()
            .map(|(region, cells)| (region, cells.as_slice()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_cell_lists() {
        let mapping = RegionMapping::new(vec![1, 0, 1, 2, 0]).unwrap();

        assert_eq!(mapping.num_cells(), 5);
        assert_eq!(mapping.num_regions(), 3);
        assert_eq!(mapping.cells(0), Some(&[1, 4][..]));
        assert_eq!(mapping.cells(1), Some(&[0, 2][..]));
        assert_eq!(mapping.cells(2), Some(&[3][..]));
        assert_eq!(mapping.cells(3), None);
        assert_eq!(mapping.region(3), Some(2));
        assert_eq!(mapping.region(5), None);
    }

    #[test]
    fn single_region() {
        let mapping = RegionMapping::single(1).unwrap();

        assert_eq!(mapping.num_regions(), 1);
        assert_eq!(mapping.cells(0), Some(&[0][..]));
    }

    #[test]
    fn rejects_gaps_and_out_of_range_indices() {
        assert_eq!(
            RegionMapping::new(vec![0, 2]),
            Err(ConfigurationError::EmptyRegion { region: 1 })
        );
        assert_eq!(
            RegionMapping::with_num_regions(vec![0, 1, 2], 2),
            Err(ConfigurationError::RegionIndexOutOfRange {
                cell: 2,
                region: 2,
                num_regions: 2,
            })
        );
        assert_eq!(
            RegionMapping::new(Vec::new()),
            Err(ConfigurationError::EmptyRegionDefinition)
        );
    }
}
