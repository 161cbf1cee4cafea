use crate::client_config::ProjectionConfig;
use crate::reconcile::VehicleRecord;
use crate::vehicle_kind::VehicleKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Emphasis {
    None,
    Glow,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DisplayAttributes {
    pub z_index: u8,
    pub emphasis: Emphasis,
    pub scale: f32,
    pub glyph: &'static str,
    pub label: &'static str,
    pub siren: bool,
    pub dimmed: bool,
}

struct KindStyle {
    glyph: &'static str,
    label: &'static str,
}

fn kind_style(kind: VehicleKind) -> KindStyle {
    let (glyph, label) = match kind {
        VehicleKind::Car => ("🚗", "car"),
        VehicleKind::Bike => ("🚲", "bike"),
        VehicleKind::Bus => ("🚌", "bus"),
        VehicleKind::Truck => ("🚚", "truck"),
        VehicleKind::Ambulance => ("🚑", "ambulance"),
        VehicleKind::Fire => ("🚒", "fire"),
        VehicleKind::Police => ("🚓", "police"),
        VehicleKind::Unspecified => ("🚙", "vehicle"),
        VehicleKind::Unknown => ("❓", "unknown"),
    };
    KindStyle { glyph, label }
}

/// Derives display attributes from reconciled records.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderProjector {
    elevated_priority: u32,
    base_layer: u8,
    elevated_layer: u8,
    heavy_scale: f32,
}

impl RenderProjector {
    pub fn from_config(config: &ProjectionConfig) -> Self {
        Self {
            elevated_priority: config.elevated_priority(),
            base_layer: config.base_layer(),
            elevated_layer: config.elevated_layer(),
            heavy_scale: config.heavy_scale(),
        }
    }

    pub fn project(&self, record: &VehicleRecord) -> DisplayAttributes {
        let style = kind_style(record.kind);
        let elevated = record.priority >= self.elevated_priority;
        DisplayAttributes {
            z_index: if elevated {
                self.elevated_layer
            } else {
                self.base_layer
            },
            emphasis: if elevated { Emphasis::Glow } else { Emphasis::None },
            scale: if record.kind.is_heavy() {
                self.heavy_scale
            } else {
                1.0
            },
            glyph: style.glyph,
            label: style.label,
            siren: record.kind.is_emergency(),
            dimmed: record.stopped,
        }
    }

    /// Projects every record and orders them for painting, lowest layer first.
    /// Records sharing a layer keep their input order.
    pub fn paint_order<'a>(
        &self,
        records: &'a [VehicleRecord],
    ) -> Vec<(&'a VehicleRecord, DisplayAttributes)> {
        let mut projected: Vec<_> = records
            .iter()
            .map(|record| (record, self.project(record)))
            .collect();
        projected.sort_by_key(|(_, attributes)| attributes.z_index);
        projected
    }
}

impl Default for RenderProjector {
    fn default() -> Self {
        Self::from_config(&ProjectionConfig::default())
    }
}
