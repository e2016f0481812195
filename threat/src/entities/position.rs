use shipyard::Component;

#[derive(Copy, Clone, Component, Debug, PartialEq)]
pub struct WorldPosition {
    pub map: u32,
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub o: f32,
}

impl WorldPosition {
    pub fn new(map: u32, x: f32, y: f32, z: f32) -> Self {
        Self { map, x, y, z, o: 0. }
    }

    // Returns None for positions on different maps
    pub fn distance_to(&self, other: &WorldPosition, is_3d: bool) -> Option<f32> {
        if self.map != other.map {
            return None;
        }

        let dist_x = self.x - other.x;
        let dist_y = self.y - other.y;

        if is_3d {
            let dist_z = self.z - other.z;

            Some((dist_x * dist_x + dist_y * dist_y + dist_z * dist_z).sqrt())
        } else {
            Some((dist_x * dist_x + dist_y * dist_y).sqrt())
        }
    }
}
