pub mod architecture;
pub mod graph;
