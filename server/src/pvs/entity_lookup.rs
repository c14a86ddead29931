use std::collections::HashMap;

use vantage_shared::{Box2, Entity, EntityManager, MapId, Vec2};

/// Spatial queries the PVS relies on
pub trait SpatialQuery {
    /// Entities near `origin`. Range is checked against the square of
    /// half-extent `range`, not a circle.
    fn entities_in_range(&self, map: MapId, origin: Vec2, range: f32) -> Vec<Entity>;

    /// Entities whose position lies inside `area`
    fn entities_intersecting(&self, map: MapId, area: &Box2) -> Vec<Entity>;
}

type Cell = (MapId, i32, i32);

/// Uniform grid over world positions, rebuilt from the entity store each
/// tick. Entities in nullspace are never indexed.
pub struct EntityLookup {
    cell_size: f32,
    cells: HashMap<Cell, Vec<(Entity, Vec2)>>,
}

impl EntityLookup {
    pub fn new(cell_size: f32) -> Self {
        let cell_size = if cell_size.is_finite() && cell_size > 0.0 {
            cell_size
        } else {
            1.0
        };
        Self {
            cell_size,
            cells: HashMap::new(),
        }
    }

    pub fn rebuild(&mut self, entities: &EntityManager) {
        for cell in self.cells.values_mut() {
            cell.clear();
        }
        for entity in entities.entities() {
            let map = entities.map(&entity);
            if map == MapId::NULLSPACE {
                continue;
            }
            let Some(position) = entities.world_position(&entity) else {
                continue;
            };
            let cell = self.cell_of(map, position);
            self.cells.entry(cell).or_default().push((entity, position));
        }
        self.cells.retain(|_, cell| !cell.is_empty());
    }

    pub fn len(&self) -> usize {
        self.cells.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    fn cell_of(&self, map: MapId, position: Vec2) -> Cell {
        let scaled = position / self.cell_size;
        (map, scaled.x.floor() as i32, scaled.y.floor() as i32)
    }
}

impl SpatialQuery for EntityLookup {
    fn entities_in_range(&self, map: MapId, origin: Vec2, range: f32) -> Vec<Entity> {
        self.entities_intersecting(map, &Box2::centered(origin, range))
    }

    fn entities_intersecting(&self, map: MapId, area: &Box2) -> Vec<Entity> {
        if map == MapId::NULLSPACE {
            return Vec::new();
        }
        let (_, min_x, min_y) = self.cell_of(map, area.min);
        let (_, max_x, max_y) = self.cell_of(map, area.max);

        let mut output = Vec::new();
        let spanned = (i64::from(max_x) - i64::from(min_x) + 1) * (i64::from(max_y) - i64::from(min_y) + 1);
        if spanned > self.cells.len() as i64 {
            for ((cell_map, _, _), cell) in &self.cells {
                if *cell_map != map {
                    continue;
                }
                output.extend(
                    cell.iter()
                        .filter(|(_, position)| area.contains(*position))
                        .map(|(entity, _)| *entity),
                );
            }
            return output;
        }

        for x in min_x..=max_x {
            for y in min_y..=max_y {
                let Some(cell) = self.cells.get(&(map, x, y)) else {
                    continue;
                };
                output.extend(
                    cell.iter()
                        .filter(|(_, position)| area.contains(*position))
                        .map(|(entity, _)| *entity),
                );
            }
        }
        output
    }
}
