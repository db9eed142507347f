use std::time::Duration;

use eframe::egui::{
    self, Align2, Color32, CornerRadius, FontId, Painter, Pos2, Rect, Sense, Shape, Stroke,
    StrokeKind, Ui, vec2,
};

use crate::system::{HealthStatus, Layer, SystemNode, TraceStatus};
use crate::util::format_percent;
use crate::zoom::{ExpandedFootprint, ExpansionPhase, ViewportHost};

use super::super::overlay::OverlayAction;
use super::super::render_utils::{
    CARD_BORDER, CARD_FILL, DRAFT, FOCUS_GLOW, SELECTED, TEXT_STRONG, TEXT_WEAK, blend_color,
    dashed_rect, dim_color, draw_background, edge_visible, health_color, kind_accent,
    parse_hex_color, rect_exit_point, trace_color, with_opacity,
};
use super::super::{RenderNode, ViewModel};
use super::build::{CARD_PADDING, CardLine, LINE_HEIGHT, TITLE_HEIGHT, dimmed_in_layer, layer_lines};
use super::chrome::chrome_contains;

const FIT_DURATION: Duration = Duration::from_millis(450);
const CUE_SCALE: f32 = 1.05;
const SUPPRESSED_OPACITY: f32 = 0.06;
const DIMMED_OPACITY: f32 = 0.45;
const MIN_READABLE_FONT: f32 = 4.5;

struct CardStyle {
    opacity: f32,
    border: Stroke,
    glow: Option<Color32>,
    dashed: bool,
}

fn phase_rank(phase: ExpansionPhase) -> u8 {
    match phase {
        ExpansionPhase::Suppressed => 0,
        ExpansionPhase::Idle => 1,
        ExpansionPhase::Cued => 2,
        ExpansionPhase::Expanded | ExpansionPhase::ExitCue => 3,
    }
}

fn alert_color(node: &SystemNode, layer: Layer) -> Option<Color32> {
    match layer {
        Layer::Tracing => node
            .tracing
            .as_ref()
            .filter(|tracing| tracing.status == TraceStatus::Error)
            .map(|tracing| trace_color(tracing.status)),
        Layer::Platform => node
            .platform
            .as_ref()
            .filter(|platform| platform.health == HealthStatus::Critical)
            .map(|platform| health_color(platform.health)),
        Layer::Building => None,
    }
}

fn card_style(
    node: &SystemNode,
    layer: Layer,
    phase: ExpansionPhase,
    selection_mix: f32,
    pulse: f32,
) -> CardStyle {
    let base_border = alert_color(node, layer).unwrap_or(CARD_BORDER);
    let mut style = CardStyle {
        opacity: if dimmed_in_layer(node, layer) {
            DIMMED_OPACITY
        } else {
            1.0
        },
        border: Stroke::new(
            1.0 + selection_mix * 1.2,
            blend_color(base_border, SELECTED, selection_mix),
        ),
        glow: None,
        dashed: node.is_draft(),
    };

    match phase {
        ExpansionPhase::Idle => {}
        ExpansionPhase::Cued | ExpansionPhase::Expanded => {
            style.glow = Some(FOCUS_GLOW);
            style.opacity = 1.0;
        }
        ExpansionPhase::ExitCue => {
            style.glow = Some(with_opacity(FOCUS_GLOW, 0.35 + 0.65 * pulse));
            style.opacity = 1.0;
        }
        ExpansionPhase::Suppressed => style.opacity = SUPPRESSED_OPACITY,
    }
    if style.dashed {
        style.border.color = blend_color(DRAFT, SELECTED, selection_mix);
    }
    style
}

fn paint_card(
    painter: &Painter,
    rect: Rect,
    node: &SystemNode,
    layer: Layer,
    zoom: f32,
    expanded: bool,
    style: &CardStyle,
) {
    let rounding = CornerRadius::same((10.0 * zoom).clamp(2.0, 20.0) as u8);
    let opacity = style.opacity;

    if let Some(glow) = style.glow {
        painter.rect_filled(
            rect.expand(5.0 * zoom.sqrt()),
            rounding,
            with_opacity(glow, 0.22 * opacity),
        );
    }

    let fill = if opacity < 1.0 {
        dim_color(CARD_FILL, 0.5 + 0.5 * opacity)
    } else {
        CARD_FILL
    };
    painter.rect_filled(rect, rounding, with_opacity(fill, opacity));
    if style.dashed {
        dashed_rect(
            painter,
            rect,
            Stroke::new(style.border.width, with_opacity(style.border.color, opacity)),
            8.0 * zoom.sqrt(),
        );
    } else {
        painter.rect_stroke(
            rect,
            rounding,
            Stroke::new(style.border.width, with_opacity(style.border.color, opacity)),
            StrokeKind::Inside,
        );
    }

    let accent = kind_accent(node.kind);
    let stripe = Rect::from_min_size(rect.min, vec2((4.0 * zoom).max(1.5), rect.height()));
    painter.rect_filled(stripe, rounding, with_opacity(accent, opacity));

    let font = 13.0 * zoom;
    if font < MIN_READABLE_FONT {
        return;
    }

    let left = rect.left() + CARD_PADDING * zoom;
    let mut y = rect.top() + CARD_PADDING * zoom;
    painter.text(
        Pos2::new(left, y),
        Align2::LEFT_TOP,
        &node.label,
        FontId::proportional(15.0 * zoom),
        with_opacity(TEXT_STRONG, opacity),
    );
    if let Some(team) = &node.team {
        let color = parse_hex_color(&team.color).unwrap_or(TEXT_WEAK);
        painter.text(
            Pos2::new(rect.right() - CARD_PADDING * zoom, y),
            Align2::RIGHT_TOP,
            &team.name,
            FontId::proportional(11.0 * zoom),
            with_opacity(color, opacity),
        );
    }
    y += TITLE_HEIGHT * zoom;

    painter.text(
        Pos2::new(left, y),
        Align2::LEFT_TOP,
        node.kind.label(),
        FontId::proportional(11.0 * zoom),
        with_opacity(accent, opacity),
    );
    y += LINE_HEIGHT * zoom;

    if !node.description.is_empty() {
        painter.text(
            Pos2::new(left, y),
            Align2::LEFT_TOP,
            &node.description,
            FontId::proportional(11.0 * zoom),
            with_opacity(TEXT_WEAK, opacity),
        );
        y += LINE_HEIGHT * zoom;
    }

    let inner_width = rect.width() - 2.0 * CARD_PADDING * zoom;
    for line in layer_lines(node, layer) {
        match line {
            CardLine::Text { text, color } => {
                painter.text(
                    Pos2::new(left, y),
                    Align2::LEFT_TOP,
                    text,
                    FontId::proportional(11.5 * zoom),
                    with_opacity(color, opacity),
                );
            }
            CardLine::Usage { cpu, memory } => {
                let half = inner_width / 2.0;
                for (index, (label, value)) in [("cpu", cpu), ("mem", memory)].into_iter().enumerate() {
                    let x = left + index as f32 * half;
                    painter.text(
                        Pos2::new(x, y),
                        Align2::LEFT_TOP,
                        format!("{label} {}", format_percent(value)),
                        FontId::proportional(10.5 * zoom),
                        with_opacity(TEXT_WEAK, opacity),
                    );
                    let track = Rect::from_min_size(
                        Pos2::new(x + 58.0 * zoom, y + 4.0 * zoom),
                        vec2((half - 66.0 * zoom).max(0.0), 6.0 * zoom),
                    );
                    let fill = Rect::from_min_size(
                        track.min,
                        vec2(track.width() * (value / 100.0).clamp(0.0, 1.0), track.height()),
                    );
                    painter.rect_filled(track, 2.0, with_opacity(CARD_BORDER, opacity));
                    painter.rect_filled(fill, 2.0, with_opacity(accent, opacity));
                }
            }
        }
        y += LINE_HEIGHT * zoom;
    }

    if !node.has_features() {
        return;
    }
    if !expanded {
        painter.text(
            Pos2::new(left, y),
            Align2::LEFT_TOP,
            format!("{} features  ·  zoom in to explore", node.features.len()),
            FontId::proportional(10.5 * zoom),
            with_opacity(TEXT_WEAK, opacity),
        );
        return;
    }

    let chip_width = (inner_width - 6.0 * zoom) / 2.0;
    let chip_height = 18.0 * zoom;
    for (index, feature) in node.features.iter().enumerate() {
        let column = (index % 2) as f32;
        let row = (index / 2) as f32;
        let chip = Rect::from_min_size(
            Pos2::new(left + column * (chip_width + 6.0 * zoom), y + row * (chip_height + 4.0 * zoom)),
            vec2(chip_width, chip_height),
        );
        if chip.bottom() > rect.bottom() {
            break;
        }
        let color = health_color(feature.status);
        painter.rect_filled(chip, 4.0, with_opacity(blend_color(CARD_FILL, color, 0.15), opacity));
        painter.circle_filled(
            Pos2::new(chip.left() + 7.0 * zoom, chip.center().y),
            3.0 * zoom,
            with_opacity(color, opacity),
        );
        painter.text(
            Pos2::new(chip.left() + 14.0 * zoom, chip.center().y),
            Align2::LEFT_CENTER,
            &feature.name,
            FontId::proportional(10.0 * zoom),
            with_opacity(TEXT_STRONG, opacity),
        );
    }
}

fn paint_arrow(painter: &Painter, from: Pos2, tip: Pos2, size: f32, color: Color32) {
    let direction = (tip - from).normalized();
    if !direction.is_finite() {
        return;
    }
    let normal = direction.rot90();
    let base = tip - direction * size;
    painter.add(Shape::convex_polygon(
        vec![tip, base + normal * size * 0.5, base - normal * size * 0.5],
        color,
        Stroke::NONE,
    ));
}

impl ViewModel {
    fn node_screen_rect(&self, node: &RenderNode, phase: ExpansionPhase) -> Rect {
        let world = if phase.holds_lock() {
            Rect::from_min_size(node.world_pos, ExpandedFootprint::DEFAULT.size(Some(node.size)))
        } else {
            Rect::from_min_size(node.world_pos, node.size)
        };
        let rect = self.canvas.world_rect_to_screen(world);
        if phase == ExpansionPhase::Cued {
            Rect::from_center_size(rect.center(), rect.size() * CUE_SCALE)
        } else {
            rect
        }
    }

    fn layout_nodes(&self) -> Vec<(usize, Rect, ExpansionPhase)> {
        let Some(cache) = self.graph_cache.as_ref() else {
            return Vec::new();
        };
        let zoom = self.canvas_zoom();
        let mut placed = cache
            .nodes
            .iter()
            .enumerate()
            .map(|(index, node)| {
                let phase = self.expansion.phase(&node.id, &self.interaction, zoom);
                (index, self.node_screen_rect(node, phase), phase)
            })
            .collect::<Vec<_>>();
        placed.sort_by_key(|(_, _, phase)| phase_rank(*phase));
        placed
    }

    pub(in crate::app) fn draw_graph(&mut self, ui: &mut Ui) {
        if self.graph_dirty {
            self.rebuild_render_graph();
        }

        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        let frame_delta_seconds = ui
            .ctx()
            .input(|input| input.stable_dt)
            .clamp(1.0 / 240.0, 1.0 / 20.0);
        self.canvas.begin_frame(rect, frame_delta_seconds);

        if self.needs_fit {
            if let Some(bounds) = self.graph_bounds() {
                self.canvas.fit(bounds, FIT_DURATION);
            }
            self.needs_fit = false;
        }

        let backdrop_animating = self.backdrop.advance(frame_delta_seconds);
        self.publish_due_angles();
        self.handle_graph_zoom(ui, rect);
        self.handle_graph_pan(&response);

        let before = self.layout_nodes();
        let hover_rects = before
            .iter()
            .map(|(index, rect, _)| (*index, *rect))
            .collect::<Vec<_>>();
        let pointer = response
            .hover_pos()
            .filter(|pointer| !chrome_contains(rect, *pointer));
        let hovered = self.hovered_node(pointer, &hover_rects);
        self.apply_hover(hovered.clone());
        self.sync_expansion();

        let placed = self.layout_nodes();
        let painter = ui.painter_at(rect);
        draw_background(&painter, rect, self.canvas.viewport(), self.backdrop.color());

        let Some(cache) = self.graph_cache.as_ref() else {
            ui.label("The system graph has no nodes in this layer.");
            return;
        };

        if hovered.is_some() {
            ui.output_mut(|output| output.cursor_icon = egui::CursorIcon::PointingHand);
        }

        let zoom = self.canvas_zoom();
        let zoom_sqrt = zoom.sqrt();
        let mut screen_rects = vec![Rect::NOTHING; cache.nodes.len()];
        for (index, node_rect, _) in &placed {
            screen_rects[*index] = *node_rect;
        }

        let focused = self.interaction.expanded();
        for edge in &cache.edges {
            let (Some(source), Some(target)) =
                (screen_rects.get(edge.source), screen_rects.get(edge.target))
            else {
                continue;
            };
            let start = rect_exit_point(*source, target.center());
            let end = rect_exit_point(*target, source.center());
            if !edge_visible(rect, start, end, 4.0) {
                continue;
            }

            let touches_focus = focused.is_some_and(|id| {
                cache.nodes[edge.source].id == id || cache.nodes[edge.target].id == id
            });
            let mut opacity = if focused.is_some() && !touches_focus {
                SUPPRESSED_OPACITY
            } else {
                0.85
            };
            let mut color = match (self.layer, edge.status) {
                (Layer::Tracing, Some(status)) => trace_color(status),
                _ => Color32::from_gray(110),
            };
            if self.layer == Layer::Tracing && edge.status.is_none() {
                opacity *= DIMMED_OPACITY;
            }
            if edge.is_draft {
                color = DRAFT;
            }

            let stroke = Stroke::new((1.4 * zoom_sqrt).clamp(0.6, 3.2), with_opacity(color, opacity));
            if edge.is_draft {
                painter.extend(Shape::dashed_line(&[start, end], stroke, 7.0 * zoom_sqrt, 5.0 * zoom_sqrt));
            } else {
                painter.line_segment([start, end], stroke);
            }
            paint_arrow(&painter, start, end, (8.0 * zoom_sqrt).clamp(4.0, 14.0), stroke.color);
        }

        let time = ui.input(|input| input.time) as f32;
        let pulse = 0.5 + 0.5 * (time * 4.0).sin();
        let mut selection_animating = false;
        let mut pulsing = false;
        for (index, node_rect, phase) in &placed {
            if !rect.intersects(*node_rect) {
                continue;
            }
            let render_node = &cache.nodes[*index];
            let Some(node) = self.graph.node(&render_node.id) else {
                continue;
            };

            let selection_mix = ui.ctx().animate_bool(
                ui.make_persistent_id(("node-selection", render_node.id.as_str())),
                self.interaction.selected() == Some(render_node.id.as_str()),
            );
            if selection_mix > 0.0 && selection_mix < 1.0 {
                selection_animating = true;
            }
            pulsing |= *phase == ExpansionPhase::ExitCue;

            let style = card_style(node, self.layer, *phase, selection_mix, pulse);
            paint_card(&painter, *node_rect, node, self.layer, zoom, phase.holds_lock(), &style);
        }

        if let Some(id) = hovered.as_deref()
            && let Some(node) = self.graph.node(id)
        {
            let mut panel_text = format!("{}  |  {}", node.label, node.kind.label());
            if let Some(line) = layer_lines(node, self.layer).into_iter().find_map(|line| match line {
                CardLine::Text { text, .. } => Some(text),
                CardLine::Usage { .. } => None,
            }) {
                panel_text.push_str(&format!("  |  {line}"));
            }
            painter.text(
                rect.left_top() + vec2(10.0, 10.0),
                Align2::LEFT_TOP,
                panel_text,
                FontId::proportional(13.0),
                Color32::from_gray(240),
            );
        }

        if response.clicked_by(egui::PointerButton::Primary) {
            self.apply_graph_selection(hovered);
        }

        self.draw_minimap(ui, rect);
        self.draw_zoom_controls(ui, rect);

        let overlay_animating = self.show_overlay(ui.ctx(), frame_delta_seconds);
        if selection_animating
            || pulsing
            || overlay_animating
            || backdrop_animating
            || self.needs_fit
            || self.canvas.is_animating()
        {
            ui.ctx().request_repaint();
        }
    }

    fn show_overlay(&mut self, ctx: &egui::Context, dt_secs: f32) -> bool {
        let Some(overlay) = self.overlay.as_mut() else {
            return false;
        };
        overlay.follow(&self.neighbor_angles);
        let animating = overlay.advance(dt_secs);
        let action = overlay.show(ctx, self.canvas.rect(), &self.graph, self.layer);

        if overlay.is_finished() {
            log::debug!("focus overlay for {} closed", overlay.node_id());
            self.overlay = None;
            return false;
        }
        if action == OverlayAction::Close {
            self.exit_focus();
            if let Some(overlay) = self.overlay.as_mut() {
                overlay.close();
            }
        }
        animating || self.overlay.as_ref().is_some_and(|overlay| overlay.is_closing())
    }
}
