//! Score Mapper: categorical judgements to percentages.
//!
//! Total over any input: unknown, blank or misspelt labels score 0.

pub fn map_approach(value: &str) -> u8 {
    match value.trim().to_lowercase().as_str() {
        "high" => 100,
        "medium" => 66,
        "low" => 33,
        _ => 0,
    }
}

pub fn map_key_consideration(value: &str) -> u8 {
    match value.trim().to_lowercase().as_str() {
        "correct" => 100,
        "partially correct" => 66,
        "incorrect" => 0,
        _ => 0,
    }
}
