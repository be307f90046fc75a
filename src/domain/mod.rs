pub mod anim;
pub mod curve;
pub mod entity;
pub mod map;
pub mod physics;
pub mod rules;
pub mod tile;
