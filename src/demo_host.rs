//! Headless stand-in for the host application used by the demo binary.
//!
//! Keeps a tiny world of placed entities and a camera, and logs every call
//! it receives instead of drawing anything.

use padbridge::host::{EntityId, EntityRef, PlacementHost, Point, PointerHost, Size};
use padbridge::HostError;
use tracing::{debug, info};

const ENTITY_SIZE: f32 = 48.0;
const MAP_SIZE: (i32, i32) = (4096, 4096);

pub struct DemoHost {
    viewport: Size,
    origin: (i32, i32),
    entities: Vec<(EntityId, Point)>,
    next_id: u64,
    pub exit_requested: bool,
}

impl DemoHost {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            viewport: Size::new(width, height),
            origin: (0, 0),
            entities: Vec::new(),
            next_id: 1,
            exit_requested: false,
        }
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    fn to_world(&self, at: Point) -> Point {
        Point::new(at.x + self.origin.0 as f32, at.y + self.origin.1 as f32)
    }

    fn hit(&self, at: Point) -> Option<EntityRef> {
        let world = self.to_world(at);
        self.entities
            .iter()
            .find(|(_, corner)| {
                world.x >= corner.x
                    && world.x < corner.x + ENTITY_SIZE
                    && world.y >= corner.y
                    && world.y < corner.y + ENTITY_SIZE
            })
            .map(|(id, _)| EntityRef {
                id: *id,
                extent: Size::new(ENTITY_SIZE, ENTITY_SIZE),
            })
    }
}

impl PointerHost for DemoHost {
    fn hover_pointer(&mut self, at: Point) {
        debug!("pointer hover at ({:.1}, {:.1})", at.x, at.y);
    }

    fn pan_viewport(&mut self, dx: i32, dy: i32) -> (i32, i32) {
        let x = (self.origin.0 + dx).clamp(0, MAP_SIZE.0);
        let y = (self.origin.1 + dy).clamp(0, MAP_SIZE.1);
        let applied = (x - self.origin.0, y - self.origin.1);
        self.origin = (x, y);
        applied
    }

    fn viewport_origin(&self) -> (i32, i32) {
        self.origin
    }

    fn viewport_size(&self) -> Size {
        self.viewport
    }

    fn display_scale(&self) -> f32 {
        1.0
    }

    fn preview_extent(&self) -> Option<Size> {
        Some(Size::new(ENTITY_SIZE, ENTITY_SIZE))
    }
}

impl PlacementHost for DemoHost {
    fn attempt_placement(&mut self, at: Point) -> Result<(), HostError> {
        if self.hit(at).is_some() {
            return Err(HostError::Rejected("tile occupied".to_string()));
        }
        let id = EntityId(self.next_id);
        self.next_id += 1;
        let world = self.to_world(at);
        self.entities.push((id, world));
        info!("Placed {} at world ({:.1}, {:.1})", id, world.x, world.y);
        Ok(())
    }

    fn select_entity_at(&mut self, at: Point) -> Option<EntityRef> {
        let found = self.hit(at);
        info!("Select at ({:.1}, {:.1}): {:?}", at.x, at.y, found.map(|e| e.id));
        found
    }

    fn entity_at(&self, at: Point) -> Option<EntityRef> {
        self.hit(at)
    }

    fn entity_exists(&self, id: EntityId) -> bool {
        self.entities.iter().any(|(e, _)| *e == id)
    }

    fn reanchor_preview(&mut self, id: EntityId, at: Point) -> Result<(), HostError> {
        info!("Preview of {} re-anchored to ({:.1}, {:.1})", id, at.x, at.y);
        Ok(())
    }

    fn confirm_move(&mut self, id: EntityId, at: Point) -> Result<(), HostError> {
        let world = self.to_world(at);
        let entity = self
            .entities
            .iter_mut()
            .find(|(e, _)| *e == id)
            .ok_or(HostError::EntityGone(id.0))?;
        entity.1 = world;
        info!("Moved {} to world ({:.1}, {:.1})", id, world.x, world.y);
        Ok(())
    }

    fn confirm_demolish(&mut self, id: EntityId) -> Result<(), HostError> {
        let before = self.entities.len();
        self.entities.retain(|(e, _)| *e != id);
        if self.entities.len() == before {
            return Err(HostError::EntityGone(id.0));
        }
        info!("Demolished {}", id);
        Ok(())
    }

    fn exit_placement(&mut self) {
        info!("Leaving placement screen");
        self.exit_requested = true;
    }
}
