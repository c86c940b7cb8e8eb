pub mod checker;
pub mod config;
pub mod demo;
pub mod detector;
pub mod frames;
pub mod geom;
pub mod grid;
pub mod helix;
pub mod intersection;
pub mod intersector;
pub mod io;
pub mod mask;
pub mod material;
pub mod registry;
pub mod scan;
pub mod settings;
pub mod store;
