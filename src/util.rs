use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

pub fn format_latency(latency_ms: u32) -> String {
    if latency_ms >= 1000 {
        format!("{:.1} s", latency_ms as f32 / 1000.0)
    } else {
        format!("{latency_ms} ms")
    }
}

/// Percentages come in as 0..=100.
pub fn format_percent(value: f32) -> String {
    format!("{:.0}%", value.clamp(0.0, 100.0))
}

pub fn stable_pair(id: &str) -> (f32, f32) {
    let mut hasher = DefaultHasher::new();
    id.hash(&mut hasher);
    let hash = hasher.finish();

    let x = ((hash & 0xffff_ffff) as f64 / u32::MAX as f64) as f32;
    let y = (((hash >> 32) & 0xffff_ffff) as f64 / u32::MAX as f64) as f32;
    ((x * 2.0) - 1.0, (y * 2.0) - 1.0)
}
