pub mod combat_context;
pub mod components;
pub mod resources;
pub mod systems;
