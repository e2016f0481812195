pub mod object_guid;
pub mod position;
