//! Proptest strategies for bddrun property tests.

pub mod strategies;

pub use strategies::{
    strategy_feature_text, strategy_known_label, strategy_scenario, strategy_scenario_title,
    strategy_status_code, strategy_tag, strategy_tag_set,
};
