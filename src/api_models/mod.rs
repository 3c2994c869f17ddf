pub mod heatmap;
pub mod market;
pub mod probability;
pub mod timing;
