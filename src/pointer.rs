//! Live set of pointer contacts (mouse, pen, touch) feeding the hero shader.

use crate::coords::{PagePoint, Projection, SurfacePoint};

/// Identifier the browser assigns to a contact for its whole duration.
pub type ContactId = i32;

/// One input event, already stripped down to what the tracker needs.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum PointerInput {
    Start { id: ContactId, page: PagePoint },
    Move { id: ContactId, page: PagePoint, movement: (f64, f64) },
    End { id: ContactId },
    Leave { id: ContactId },
    /// Plain `mousemove`, used only while no contact is down.
    LegacyMove { page: PagePoint },
}

/// Tracks every active contact in surface space.
///
/// Contacts are kept in insertion order; the first one is the primary pointer.
/// Movement deltas accumulate for the tracker's lifetime and are never reset.
/// The shader consumes the sum as a continuously growing offset.
#[derive(Debug, Clone)]
pub struct PointerTracker {
    projection: Projection,
    contacts: Vec<(ContactId, SurfacePoint)>,
    movement: [f64; 2],
    fallback: SurfacePoint,
    active: bool,
}

impl PointerTracker {
    pub fn new(scale: f64, surface_height: f64) -> Self {
        Self {
            projection: Projection::new(scale, surface_height),
            contacts: Vec::new(),
            movement: [0.0, 0.0],
            fallback: SurfacePoint::zero(),
            active: false,
        }
    }

    /// Applies events in delivery order; the last write per contact wins.
    pub fn apply(&mut self, input: PointerInput) {
        match input {
            PointerInput::Start { id, page } => self.on_contact_start(id, page),
            PointerInput::Move { id, page, movement } => {
                self.on_contact_move(id, page, movement.0, movement.1)
            }
            PointerInput::End { id } => self.on_contact_end(id),
            PointerInput::Leave { id } => self.on_contact_leave(id),
            PointerInput::LegacyMove { page } => self.on_legacy_move(page),
        }
    }

    pub fn on_contact_start(&mut self, id: ContactId, page: PagePoint) {
        self.active = true;
        let point = self.project(page);
        self.upsert(id, point);
        log::trace!("contact {id} started at {point:?}");
    }

    pub fn on_contact_move(&mut self, id: ContactId, page: PagePoint, movement_x: f64, movement_y: f64) {
        if !self.active {
            return;
        }
        let point = self.project(page);
        // Kept in surface space like every other stored point; a move needs a
        // live contact, so this is overwritten on the last release anyway.
        self.fallback = point;
        self.upsert(id, point);
        self.movement[0] += movement_x;
        self.movement[1] += movement_y;
    }

    pub fn on_contact_end(&mut self, id: ContactId) {
        self.release(id);
    }

    pub fn on_contact_leave(&mut self, id: ContactId) {
        self.release(id);
    }

    /// Single-pointer `mousemove`: only records where the cursor is while no
    /// structured contact is down.
    pub fn on_legacy_move(&mut self, page: PagePoint) {
        if self.contacts.is_empty() {
            self.fallback = self.project(page);
        }
    }

    fn release(&mut self, id: ContactId) {
        if let [(_, last)] = self.contacts.as_slice() {
            self.fallback = *last;
        }
        self.contacts.retain(|(contact, _)| *contact != id);
        self.active = !self.contacts.is_empty();
        log::trace!("contact {id} released, {} remaining", self.contacts.len());
    }

    fn upsert(&mut self, id: ContactId, point: SurfacePoint) {
        match self.contacts.iter_mut().find(|(contact, _)| *contact == id) {
            Some((_, slot)) => *slot = point,
            None => self.contacts.push((id, point)),
        }
    }

    /// Maps a page position with the scale and height in effect right now.
    pub fn project(&self, page: PagePoint) -> SurfacePoint {
        self.projection.project(page)
    }

    /// All contacts as `[x0, y0, x1, y1, ..]`, or `[0, 0]` when none are down.
    pub fn projected_coordinates(&self) -> Vec<f32> {
        if self.contacts.is_empty() {
            return vec![0.0, 0.0];
        }
        self.contacts
            .iter()
            .flat_map(|(_, point)| point.to_array())
            .collect()
    }

    pub fn primary_coordinate(&self) -> SurfacePoint {
        self.contacts
            .first()
            .map(|(_, point)| *point)
            .unwrap_or(self.fallback)
    }

    pub fn coordinate(&self, id: ContactId) -> Option<SurfacePoint> {
        self.contacts
            .iter()
            .find(|(contact, _)| *contact == id)
            .map(|(_, point)| *point)
    }

    pub fn contact_count(&self) -> usize {
        self.contacts.len()
    }

    pub fn cumulative_movement(&self) -> [f64; 2] {
        self.movement
    }

    pub fn fallback(&self) -> SurfacePoint {
        self.fallback
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn scale(&self) -> f64 {
        self.projection.scale
    }

    pub fn update_scale(&mut self, scale: f64) {
        self.projection.scale = scale;
    }

    pub fn update_surface_height(&mut self, surface_height: f64) {
        self.projection.surface_height = surface_height;
    }
}
