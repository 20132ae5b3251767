/// Risk model and rainfall analysis for the flood risk service.
///
/// Submodules:
/// - `labeling`  : deterministic ground-truth labels for training rows.
/// - `split`     : seeded, stratified train/test split.
/// - `tree`      : CART decision tree over the five reading features.
/// - `risk_model`: lazily trained, train-once classifier state.
/// - `rainfall`  : trailing 24h rain-rate sum via a store range query.

pub mod labeling;
pub mod rainfall;
pub mod risk_model;
pub mod split;
pub mod tree;
