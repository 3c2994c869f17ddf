pub mod bucketing;
pub mod color_scale;
pub mod descriptive;
pub mod heatmap;
pub mod probability;
pub mod prompt;
pub mod query_cache;
pub mod statistic;
pub mod timing;
