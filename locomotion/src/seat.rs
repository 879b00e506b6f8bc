/*!
Seats (enterable objects) and the nearest-match search used to approach them.

A seat owns a world pose and, relative to it, one seat point and any number of entry
points. Avatars attached to a seat store their pose relative to the seat as well, so a
seat may move while occupied.
*/

use std::collections::BTreeMap;

use crate::{
    avatar::AvatarId,
    error::SeatError,
    physics::{Iso, Vec3},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SeatId(pub u32);

/// Which "enter" action finds the seat.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SeatKind {
    Primary,
    Passenger,
}

#[derive(Clone, Debug)]
pub struct Seat {
    pub kind: SeatKind,
    /// World pose of the seat object.
    pub pose: Iso,
    /// Where a seated avatar sits, relative to `pose`.
    pub seat_point: Iso,
    /// Where avatars walk to before sitting down and stand after leaving, relative to `pose`.
    pub entry_points: Vec<Iso>,
    /// Velocity handed to an avatar that leaves the seat.
    pub linear_velocity: Vec3,
    occupant: Option<AvatarId>,
}

impl Seat {
    pub fn new(kind: SeatKind, pose: Iso, seat_point: Iso, entry_points: Vec<Iso>) -> Self {
        Self {
            kind,
            pose,
            seat_point,
            entry_points,
            linear_velocity: Vec3::zeros(),
            occupant: None,
        }
    }

    #[inline]
    pub fn occupant(&self) -> Option<AvatarId> {
        self.occupant
    }

    #[inline]
    pub fn is_free(&self) -> bool {
        self.occupant.is_none()
    }

    pub fn world_seat_point(&self) -> Iso {
        self.pose * self.seat_point
    }

    pub fn world_entry_point(&self, index: usize) -> Option<Iso> {
        self.entry_points.get(index).map(|local| self.pose * local)
    }
}

/// Tracks the closest candidate seen so far, optionally within a cutoff distance.
#[derive(Clone, Debug)]
pub struct ClosestObjectFinder<T> {
    reference: Vec3,
    max_distance: f32,
    closest: Option<(T, f32)>,
}

impl<T> ClosestObjectFinder<T> {
    pub fn new(reference: Vec3, max_distance: Option<f32>) -> Self {
        Self {
            reference,
            max_distance: max_distance.unwrap_or(f32::INFINITY),
            closest: None,
        }
    }

    pub fn consider(&mut self, object: T, position: &Vec3) {
        let distance = (position - self.reference).norm();
        let closer = self.closest.as_ref().is_none_or(|(_, best)| distance < *best);
        if distance < self.max_distance && closer {
            self.closest = Some((object, distance));
        }
    }

    pub fn closest(&self) -> Option<&T> {
        self.closest.as_ref().map(|(object, _)| object)
    }

    pub fn into_closest(self) -> Option<T> {
        self.closest.map(|(object, _)| object)
    }
}

/// Seat chosen by [`SeatRegistry::find_nearest`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SeatTarget {
    pub seat: SeatId,
    pub entry_point: usize,
}

#[derive(Clone, Debug, Default)]
pub struct SeatRegistry {
    seats: BTreeMap<SeatId, Seat>,
    next_id: u32,
}

impl SeatRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, seat: Seat) -> SeatId {
        let id = SeatId(self.next_id);
        self.next_id += 1;
        self.seats.insert(id, seat);
        id
    }

    pub fn remove(&mut self, id: SeatId) -> Option<Seat> {
        self.seats.remove(&id)
    }

    pub fn get(&self, id: SeatId) -> Option<&Seat> {
        self.seats.get(&id)
    }

    pub fn get_mut(&mut self, id: SeatId) -> Option<&mut Seat> {
        self.seats.get_mut(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (SeatId, &Seat)> {
        self.seats.iter().map(|(id, seat)| (*id, seat))
    }

    pub fn len(&self) -> usize {
        self.seats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seats.is_empty()
    }

    /// Two-stage nearest match: the closest free seat of `kind` within `max_distance` of
    /// `position`, then that seat's closest entry point.
    pub fn find_nearest(
        &self,
        position: &Vec3,
        kind: SeatKind,
        max_distance: f32,
    ) -> Option<SeatTarget> {
        let mut seat_finder = ClosestObjectFinder::new(*position, Some(max_distance));
        for (id, seat) in self.iter().filter(|(_, s)| s.kind == kind && s.is_free()) {
            seat_finder.consider(id, &seat.world_seat_point().translation.vector);
        }
        let seat_id = seat_finder.into_closest()?;
        let seat = self.get(seat_id)?;

        let mut entry_finder = ClosestObjectFinder::new(*position, None);
        for index in 0..seat.entry_points.len() {
            if let Some(point) = seat.world_entry_point(index) {
                entry_finder.consider(index, &point.translation.vector);
            }
        }
        entry_finder.into_closest().map(|entry_point| SeatTarget {
            seat: seat_id,
            entry_point,
        })
    }

    pub fn occupy(&mut self, id: SeatId, avatar: AvatarId) -> Result<(), SeatError> {
        let seat = self.seats.get_mut(&id).ok_or(SeatError::UnknownSeat(id))?;
        match seat.occupant {
            Some(by) if by != avatar => Err(SeatError::Occupied { seat: id, by }),
            _ => {
                seat.occupant = Some(avatar);
                Ok(())
            }
        }
    }

    /// Clear the occupant if it is `avatar`. Returns whether anything changed.
    pub fn release(&mut self, id: SeatId, avatar: AvatarId) -> Result<bool, SeatError> {
        let seat = self.seats.get_mut(&id).ok_or(SeatError::UnknownSeat(id))?;
        if seat.occupant == Some(avatar) {
            seat.occupant = None;
            return Ok(true);
        }
        Ok(false)
    }
}
