use serde::{Deserialize, Serialize};
use std::fmt;

/// ECU whose auxiliary (frame 669) layout is emulated
///
/// Resolved once from configuration; the record store and the encoder both
/// follow the store's variant, so a run never mixes layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EcuVariant {
    /// Hondata S300: flex frequency, duty, ethanol content
    #[serde(rename = "variantA", alias = "s300")]
    S300,
    /// Hondata KPro: flex frequency, ethanol content, fuel temperature
    #[default]
    #[serde(rename = "variantB", alias = "kpro")]
    KPro,
}

impl fmt::Display for EcuVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EcuVariant::S300 => write!(f, "s300"),
            EcuVariant::KPro => write!(f, "kpro"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Misc {
    /// Logger sample rate in Hz
    pub hertz: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Engine {
    pub rpm: u16,
    pub speed: u16,
    pub gear: u8,
    pub voltage: u8,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Thermal {
    pub intake_temp: u16,
    pub coolant_temp: u16,
    /// Malfunction indicator lamp
    pub mil: u8,
    /// Vehicle theft system
    pub vts: u8,
    pub closed_loop: u8,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Load {
    pub throttle: u16,
    pub manifold_pressure: u16,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Timing {
    pub injector: u16,
    pub ignition: u16,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FuelRatio {
    pub lambda: u16,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Knock {
    pub level: u16,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Camshaft {
    pub target_angle: f64,
    pub actual_angle: f64,
}

/// Four analog input channels
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnalogBank {
    pub channels: [u16; 4],
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct S300Auxiliary {
    pub frequency: u8,
    pub duty: u8,
    pub content: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KProAuxiliary {
    pub frequency: u8,
    pub ethanol_content: u8,
    pub fuel_temperature: u16,
}

/// One auxiliary record, shaped by the ECU variant
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AuxiliaryRecord {
    S300(S300Auxiliary),
    KPro(KProAuxiliary),
}

impl AuxiliaryRecord {
    /// Zero-valued record for a variant
    pub fn zero(variant: EcuVariant) -> Self {
        match variant {
            EcuVariant::S300 => AuxiliaryRecord::S300(S300Auxiliary::default()),
            EcuVariant::KPro => AuxiliaryRecord::KPro(KProAuxiliary::default()),
        }
    }

    pub fn variant(&self) -> EcuVariant {
        match self {
            AuxiliaryRecord::S300(_) => EcuVariant::S300,
            AuxiliaryRecord::KPro(_) => EcuVariant::KPro,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GpsPosition {
    pub latitude: f64,
    pub longitude: f64,
}

/// Every category's record for one sample index
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TelemetryRow {
    pub misc: Misc,
    pub engine: Engine,
    pub thermal: Thermal,
    pub load: Load,
    pub timing: Timing,
    pub fuel_ratio: FuelRatio,
    pub knock: Knock,
    pub camshaft: Camshaft,
    pub analog_a: AnalogBank,
    pub analog_b: AnalogBank,
    pub auxiliary: AuxiliaryRecord,
    pub gps: GpsPosition,
}

impl TelemetryRow {
    /// The zero-valued row used as the pre-roll sentinel
    pub fn sentinel(variant: EcuVariant) -> Self {
        Self {
            misc: Misc::default(),
            engine: Engine::default(),
            thermal: Thermal::default(),
            load: Load::default(),
            timing: Timing::default(),
            fuel_ratio: FuelRatio::default(),
            knock: Knock::default(),
            camshaft: Camshaft::default(),
            analog_a: AnalogBank::default(),
            analog_b: AnalogBank::default(),
            auxiliary: AuxiliaryRecord::zero(variant),
            gps: GpsPosition::default(),
        }
    }
}
