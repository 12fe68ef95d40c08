use crate::params::{Color, ControlDomain, ControlId, ParamValue, ParamValues};
use crate::scene::{EntityId, ScenePhase};

const MATERIAL_SECTION: &[ControlId] = &ControlId::MATERIAL_SCALARS;
const ANIMATION_SECTION: &[ControlId] = &[
    ControlId::SpeedX,
    ControlId::SpeedY,
    ControlId::SpeedZ,
    ControlId::RotationSpeed,
];
const LOOSE_CONTROLS: &[ControlId] = &[
    ControlId::ScaleBase,
    ControlId::TextMaterialType,
    ControlId::TextColor,
    ControlId::ShapeColor,
];
const AMBIENT_SECTION: &[ControlId] = &[
    ControlId::AmbientLightColor,
    ControlId::AmbientLightIntensity,
];

/// Read-only facts shown under the controls.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PanelStatus {
    pub phase: ScenePhase,
    pub shapes: usize,
    pub draws: usize,
    pub held: Option<EntityId>,
    pub assets_in_flight: usize,
}

impl PanelStatus {
    pub fn line(&self) -> String {
        let phase = match self.phase {
            ScenePhase::AssetsPending => "loading",
            ScenePhase::Populated => "ready",
        };
        let mut line = format!("{phase} | {} shapes | {} draws", self.shapes, self.draws);
        if let Some(held) = self.held {
            line.push_str(&format!(" | dragging #{}", held.raw()));
        }
        if self.assets_in_flight > 0 {
            line.push_str(&format!(" | {} assets loading", self.assets_in_flight));
        }
        line
    }
}

/// Control panel window. Widgets edit copies of the current values; any
/// change is returned to the caller instead of being written anywhere.
pub struct ControlPanel {
    open: bool,
}

impl Default for ControlPanel {
    fn default() -> Self {
        Self::new()
    }
}

impl ControlPanel {
    pub fn new() -> Self {
        Self { open: true }
    }

    pub fn show(
        &mut self,
        ctx: &egui::Context,
        values: &ParamValues,
        status: &PanelStatus,
    ) -> Vec<(ControlId, ParamValue)> {
        let mut edits = Vec::new();
        egui::Window::new("Controls")
            .open(&mut self.open)
            .default_width(280.0)
            .resizable(false)
            .show(ctx, |ui| {
                egui::CollapsingHeader::new("Material Parameters")
                    .default_open(true)
                    .show(ui, |ui| {
                        control_rows(ui, MATERIAL_SECTION, values, &mut edits);
                    });
                egui::CollapsingHeader::new("Animation Speed")
                    .default_open(true)
                    .show(ui, |ui| {
                        control_rows(ui, ANIMATION_SECTION, values, &mut edits);
                    });
                control_rows(ui, LOOSE_CONTROLS, values, &mut edits);
                egui::CollapsingHeader::new("Ambient Light").show(ui, |ui| {
                    control_rows(ui, AMBIENT_SECTION, values, &mut edits);
                });
                ui.separator();
                ui.small(status.line());
            });
        edits
    }
}

fn control_rows(
    ui: &mut egui::Ui,
    controls: &[ControlId],
    values: &ParamValues,
    edits: &mut Vec<(ControlId, ParamValue)>,
) {
    for &control in controls {
        if let Some(value) = control_widget(ui, control, values.get(control)) {
            edits.push((control, value));
        }
    }
}

/// Draw one control. Returns the new value when the user changed it.
fn control_widget(ui: &mut egui::Ui, control: ControlId, current: ParamValue) -> Option<ParamValue> {
    match (control.domain(), current) {
        (ControlDomain::Range { min, max, step }, ParamValue::Scalar(mut value)) => {
            let decimals = if step < 0.001 { 4 } else { 2 };
            let response = ui.add(
                egui::Slider::new(&mut value, min..=max)
                    .step_by(step as f64)
                    .fixed_decimals(decimals)
                    .text(control.label()),
            );
            response.changed().then_some(ParamValue::Scalar(value))
        }
        (ControlDomain::AtLeast { min }, ParamValue::Scalar(mut value)) => {
            ui.horizontal(|ui| {
                let response = ui.add(
                    egui::DragValue::new(&mut value)
                        .range(min..=f32::MAX)
                        .speed(0.01),
                );
                ui.label(control.label());
                response.changed().then_some(ParamValue::Scalar(value))
            })
            .inner
        }
        (ControlDomain::Options(options), ParamValue::Choice(current)) => {
            let mut selected = current;
            egui::ComboBox::from_label(control.label())
                .selected_text(selected)
                .show_ui(ui, |ui| {
                    for option in options {
                        ui.selectable_value(&mut selected, *option, *option);
                    }
                });
            (selected != current).then_some(ParamValue::Choice(selected))
        }
        (ControlDomain::Color, ParamValue::Color(color)) => {
            let mut rgb = color.to_rgb8();
            ui.horizontal(|ui| {
                let response = ui.color_edit_button_srgb(&mut rgb);
                ui.label(control.label());
                response
                    .changed()
                    .then(|| ParamValue::Color(Color::from_rgb8(rgb)))
            })
            .inner
        }
        (domain, value) => {
            log::warn!("{} holds {:?}, which does not fit {:?}", control, value, domain);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_control_has_a_widget() {
        let mut seen: Vec<ControlId> = [
            MATERIAL_SECTION,
            ANIMATION_SECTION,
            LOOSE_CONTROLS,
            AMBIENT_SECTION,
        ]
        .concat();
        seen.sort();
        assert_eq!(seen, ControlId::ALL.to_vec());
    }

    #[test]
    fn untouched_panel_reports_no_edits() {
        let ctx = egui::Context::default();
        let mut panel = ControlPanel::new();
        let values = ParamValues::default();
        let status = PanelStatus {
            phase: ScenePhase::Populated,
            shapes: 120,
            draws: 124,
            held: None,
            assets_in_flight: 0,
        };
        let mut edits = Vec::new();
        for _ in 0..2 {
            let _ = ctx.run(egui::RawInput::default(), |ctx| {
                edits.extend(panel.show(ctx, &values, &status));
            });
        }
        assert!(edits.is_empty());
    }

    #[test]
    fn status_line_mentions_drag_and_loading() {
        let status = PanelStatus {
            phase: ScenePhase::AssetsPending,
            shapes: 0,
            draws: 0,
            held: None,
            assets_in_flight: 3,
        };
        assert_eq!(status.line(), "loading | 0 shapes | 0 draws | 3 assets loading");
    }
}
