use shipyard::Component;

use crate::entities::object_guid::ObjectGuid;

#[derive(Component)]
pub struct Guid(pub ObjectGuid);
