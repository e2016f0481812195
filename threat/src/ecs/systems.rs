pub mod combat;
