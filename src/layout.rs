use std::f32::consts::TAU;

use eframe::egui::{Vec2, vec2};

use crate::util::stable_pair;

/// Places nodes without an explicit position around the pinned ones.
///
/// Pinned entries come back unchanged. Free nodes start next to their pinned
/// neighbors (or on a ring around the pinned centroid) and then relax under
/// pairwise repulsion and edge springs. Output only depends on the inputs.
pub fn force_layout(
    node_ids: &[String],
    pinned: &[Option<Vec2>],
    edges: &[(usize, usize)],
    spacing: f32,
    iterations: usize,
) -> Vec<Vec2> {
    let n = node_ids.len();
    if n == 0 {
        return Vec::new();
    }

    let is_pinned = |index: usize| pinned.get(index).copied().flatten().is_some();
    let free_count = (0..n).filter(|&index| !is_pinned(index)).count();

    let pinned_points = pinned.iter().flatten().copied().collect::<Vec<_>>();
    let centroid = if pinned_points.is_empty() {
        Vec2::ZERO
    } else {
        pinned_points.iter().copied().fold(Vec2::ZERO, |acc, p| acc + p) / pinned_points.len() as f32
    };
    let extent = pinned_points
        .iter()
        .map(|point| (*point - centroid).length())
        .fold(0.0_f32, f32::max);
    let ring_radius = extent + spacing * (1.0 + (free_count as f32).sqrt());

    let mut free_seen = 0usize;
    let mut positions = node_ids
        .iter()
        .enumerate()
        .map(|(index, id)| {
            if let Some(point) = pinned.get(index).copied().flatten() {
                return point;
            }

            let (jx, jy) = stable_pair(id);
            let jitter = vec2(jx, jy) * spacing * 0.35;

            let anchors = edges
                .iter()
                .filter_map(|&(from, to)| match (from == index, to == index) {
                    (true, false) => pinned.get(to).copied().flatten(),
                    (false, true) => pinned.get(from).copied().flatten(),
                    _ => None,
                })
                .collect::<Vec<_>>();

            let start = if anchors.is_empty() {
                let angle = (free_seen as f32 / free_count.max(1) as f32) * TAU;
                centroid + vec2(angle.cos(), angle.sin()) * ring_radius
            } else {
                let mean = anchors.iter().copied().fold(Vec2::ZERO, |acc, p| acc + p)
                    / anchors.len() as f32;
                let outward = (mean - centroid).normalized();
                let outward = if outward.is_finite() && outward != Vec2::ZERO {
                    outward
                } else {
                    vec2(1.0, 0.0)
                };
                mean + outward * spacing
            };
            free_seen += 1;
            start + jitter
        })
        .collect::<Vec<_>>();

    if free_count == 0 {
        return positions;
    }

    let k = spacing.max(24.0);
    let mut temperature = (k * 0.8).max(40.0);

    for _ in 0..iterations {
        let mut disp = vec![Vec2::ZERO; n];

        for i in 0..n {
            for j in (i + 1)..n {
                let delta = positions[i] - positions[j];
                let distance = delta.length().max(0.5);
                let direction = delta / distance;

                let force = (k * k) / distance;
                disp[i] += direction * force;
                disp[j] -= direction * force;

                if distance < k {
                    let overlap_push = (k - distance) * 2.4;
                    disp[i] += direction * overlap_push;
                    disp[j] -= direction * overlap_push;
                }
            }
        }

        for &(from, to) in edges {
            if from >= n || to >= n || from == to {
                continue;
            }

            let delta = positions[from] - positions[to];
            let distance = delta.length().max(0.5);
            let direction = delta / distance;
            let force = (distance - k) * 0.18;

            disp[from] -= direction * force;
            disp[to] += direction * force;
        }

        for i in 0..n {
            if is_pinned(i) {
                continue;
            }
            let d = disp[i];
            let length = d.length();
            if length > 0.0 {
                positions[i] += d / length * length.min(temperature) * 0.92;
            }
        }

        temperature *= 0.965;
        if temperature < 0.55 {
            break;
        }
    }

    positions
}
