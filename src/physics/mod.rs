pub mod aabb3d;
pub mod ensemble;
pub mod field;
pub mod force;
pub mod integrators;
pub mod ions;
pub mod math;
pub mod modifiers;
pub mod particle;
pub mod random;
