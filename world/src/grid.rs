//! Dense occupancy grid storing at most one entity per cell.

use gridsiege_core::{CellCoord, EntityId, GridConfig, GridView, Occupant, PlacementError};

/// Row-major occupancy table kept in lockstep with the entity arena.
#[derive(Clone, Debug)]
pub(crate) struct OccupancyGrid {
    config: GridConfig,
    cells: Vec<Option<Occupant>>,
}

impl OccupancyGrid {
    pub(crate) fn new(config: GridConfig) -> Self {
        Self {
            config,
            cells: vec![None; config.cell_count()],
        }
    }

    pub(crate) fn view(&self) -> GridView<'_> {
        GridView::new(&self.cells, self.config)
    }

    pub(crate) fn occupant(&self, cell: CellCoord) -> Option<Occupant> {
        self.config
            .index(cell)
            .and_then(|index| self.cells.get(index).copied().flatten())
    }

    /// Checks whether a new entity could be placed `margin` cells inside the
    /// playable area.
    pub(crate) fn can_place(&self, cell: CellCoord, margin: u32) -> Result<(), PlacementError> {
        if !self.config.is_playable(cell) || !self.config.is_within_margin(cell, margin) {
            return Err(PlacementError::OutOfBounds);
        }
        if self.occupant(cell).is_some() {
            return Err(PlacementError::Occupied);
        }
        Ok(())
    }

    /// Stores the occupant in an empty cell.
    pub(crate) fn occupy(&mut self, cell: CellCoord, occupant: Occupant) -> bool {
        match self.slot_mut(cell) {
            Some(slot) if slot.is_none() => {
                *slot = Some(occupant);
                true
            }
            _ => false,
        }
    }

    /// Clears the cell only if it still holds the provided entity.
    pub(crate) fn vacate(&mut self, cell: CellCoord, id: EntityId) -> bool {
        match self.slot_mut(cell) {
            Some(slot) if slot.is_some_and(|occupant| occupant.id == id) => {
                *slot = None;
                true
            }
            _ => false,
        }
    }

    /// Moves an occupant between cells, refusing when the destination is not free.
    pub(crate) fn relocate(&mut self, id: EntityId, from: CellCoord, to: CellCoord) -> bool {
        let Some(occupant) = self.occupant(from).filter(|occupant| occupant.id == id) else {
            return false;
        };
        if !self.view().is_empty_for_move(to) {
            return false;
        }
        let _ = self.vacate(from, id);
        self.occupy(to, occupant)
    }

    pub(crate) fn occupied(&self) -> impl Iterator<Item = (usize, Occupant)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.map(|occupant| (index, occupant)))
    }

    fn slot_mut(&mut self, cell: CellCoord) -> Option<&mut Option<Occupant>> {
        let index = self.config.index(cell)?;
        self.cells.get_mut(index)
    }
}
