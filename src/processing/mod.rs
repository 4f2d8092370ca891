pub mod axis_transform;
pub mod histogram;
pub mod normalize;
pub mod rank_cache;
pub mod statistics;
