use thiserror::Error;

use crate::catalog::{CatalogState, MapLayout};
use crate::filter::{FilterOutcome, filter_seeds};
use crate::landmark::{CoordinateId, LandmarkType, MapType, Nightlord};
use crate::store::LandmarkStore;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("select a nightlord and a map type before marking landmarks")]
    SelectionIncomplete,
    #[error("coordinate {0} is not part of the selected map")]
    UnknownCoordinate(CoordinateId),
}

/// Token taken before async work; the work commits only while it is still current.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Generation(u64);

impl Generation {
    fn next(self) -> Self {
        Generation(self.0.wrapping_add(1))
    }

    pub fn value(self) -> u64 {
        self.0
    }
}

/// One recognition session: the selection, the user's marks and the generation counter.
///
/// Every effective mutation advances the generation, so anything started
/// against an older state (a delayed composite, an image fetch) can tell it
/// has been superseded.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    nightlord: Option<Nightlord>,
    map_type: Option<MapType>,
    marks: LandmarkStore,
    generation: Generation,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn nightlord(&self) -> Option<Nightlord> {
        self.nightlord
    }

    pub fn map_type(&self) -> Option<MapType> {
        self.map_type
    }

    pub fn marks(&self) -> &LandmarkStore {
        &self.marks
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn is_current(&self, token: Generation) -> bool {
        self.generation == token
    }

    pub fn selection(&self) -> Result<(Nightlord, MapType), SessionError> {
        match (self.nightlord, self.map_type) {
            (Some(nightlord), Some(map_type)) => Ok((nightlord, map_type)),
            _ => Err(SessionError::SelectionIncomplete),
        }
    }

    /// Changing the nightlord clears all marks. Reselecting the same one is a no-op.
    pub fn select_nightlord(&mut self, nightlord: Nightlord) -> bool {
        if self.nightlord == Some(nightlord) {
            return false;
        }
        self.nightlord = Some(nightlord);
        self.clear_marks();
        true
    }

    pub fn select_map_type(&mut self, map_type: MapType) -> bool {
        if self.map_type == Some(map_type) {
            return false;
        }
        self.map_type = Some(map_type);
        self.clear_marks();
        true
    }

    /// Drops every mark and invalidates in-flight work. The selection is kept.
    pub fn reset(&mut self) {
        self.clear_marks();
    }

    pub fn mark(
        &mut self,
        layout: &MapLayout,
        coordinate: CoordinateId,
        mark: LandmarkType,
    ) -> Result<bool, SessionError> {
        self.check_mark_target(layout, coordinate)?;
        let changed = self.marks.set(coordinate, mark);
        if changed {
            self.generation = self.generation.next();
        }
        Ok(changed)
    }

    /// Left-click behaviour: church ⇄ unmarked.
    pub fn toggle_church(
        &mut self,
        layout: &MapLayout,
        coordinate: CoordinateId,
    ) -> Result<LandmarkType, SessionError> {
        self.check_mark_target(layout, coordinate)?;
        let next = self.marks.toggle_church(coordinate);
        self.generation = self.generation.next();
        Ok(next)
    }

    /// Recompute candidates from scratch against the current marks.
    pub fn candidates<'a>(&self, catalog: &'a CatalogState) -> FilterOutcome<'a> {
        let Ok((nightlord, map_type)) = self.selection() else {
            return FilterOutcome::NotReady;
        };
        let Some(layout) = catalog.layout(map_type) else {
            return FilterOutcome::NotReady;
        };
        let base = catalog.seeds_for(nightlord, map_type);
        let survivors = filter_seeds(&base, layout, &self.marks);
        FilterOutcome::classify(&base, survivors)
    }

    fn check_mark_target(
        &self,
        layout: &MapLayout,
        coordinate: CoordinateId,
    ) -> Result<(), SessionError> {
        self.selection()?;
        if !layout.contains(coordinate) {
            return Err(SessionError::UnknownCoordinate(coordinate));
        }
        Ok(())
    }

    fn clear_marks(&mut self) {
        self.marks.clear();
        self.generation = self.generation.next();
    }
}
