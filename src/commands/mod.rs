pub mod index;
pub mod interactive;
pub mod model;
pub mod notes;
pub mod search;
pub mod tags;
