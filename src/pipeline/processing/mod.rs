// Pipeline processing: normalization of raw exports and quality checks

pub mod normalize;
pub mod quality_gate;
