use crate::core::records::{
    AnalogBank, AuxiliaryRecord, Camshaft, EcuVariant, Engine, FuelRatio, GpsPosition,
    KProAuxiliary, Knock, Load, Misc, S300Auxiliary, TelemetryRow, Thermal, Timing,
};
use crate::input::convert::{CellKind, CellValue};

/// Number of leading rows (headers and exporter metadata) in every datalog
pub const HEADER_ROWS: usize = 3;

/// A telemetry field fed by one datalog column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    SampleRate,
    Rpm,
    Speed,
    Gear,
    Voltage,
    IntakeTemp,
    CoolantTemp,
    Mil,
    Vts,
    ClosedLoop,
    Throttle,
    ManifoldPressure,
    Injector,
    Ignition,
    Lambda,
    Knock,
    TargetCamAngle,
    ActualCamAngle,
    Analog0,
    Analog1,
    Analog2,
    Analog3,
    Analog4,
    Analog5,
    Analog6,
    Analog7,
    FlexFrequency,
    FlexDuty,
    FlexContent,
    EthanolContent,
    FuelTemperature,
    Latitude,
    Longitude,
}

impl Field {
    pub const COUNT: usize = Field::Longitude as usize + 1;

    /// Category and field name used in diagnostics
    pub fn label(&self) -> &'static str {
        match self {
            Field::SampleRate => "misc - sample rate",
            Field::Rpm => "engine - rpm",
            Field::Speed => "engine - speed",
            Field::Gear => "engine - gear",
            Field::Voltage => "engine - voltage",
            Field::IntakeTemp => "thermal - intake temp",
            Field::CoolantTemp => "thermal - coolant temp",
            Field::Mil => "thermal - mil",
            Field::Vts => "thermal - vts",
            Field::ClosedLoop => "thermal - closed loop",
            Field::Throttle => "load - throttle",
            Field::ManifoldPressure => "load - manifold pressure",
            Field::Injector => "timing - injector",
            Field::Ignition => "timing - ignition",
            Field::Lambda => "fuel ratio - lambda",
            Field::Knock => "knock - level",
            Field::TargetCamAngle => "camshaft - target angle",
            Field::ActualCamAngle => "camshaft - actual angle",
            Field::Analog0 => "analog a - channel 0",
            Field::Analog1 => "analog a - channel 1",
            Field::Analog2 => "analog a - channel 2",
            Field::Analog3 => "analog a - channel 3",
            Field::Analog4 => "analog b - channel 4",
            Field::Analog5 => "analog b - channel 5",
            Field::Analog6 => "analog b - channel 6",
            Field::Analog7 => "analog b - channel 7",
            Field::FlexFrequency => "auxiliary - frequency",
            Field::FlexDuty => "auxiliary - duty",
            Field::FlexContent => "auxiliary - content",
            Field::EthanolContent => "auxiliary - ethanol content",
            Field::FuelTemperature => "auxiliary - fuel temperature",
            Field::Latitude => "gps - latitude",
            Field::Longitude => "gps - longitude",
        }
    }
}

/// One column of the datalog contract
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnSpec {
    pub index: usize,
    pub kind: CellKind,
    pub field: Field,
}

const fn col(index: usize, kind: CellKind, field: Field) -> ColumnSpec {
    ColumnSpec { index, kind, field }
}

/// Columns shared by both ECU variants
const COMMON_COLUMNS: [ColumnSpec; 26] = [
    col(0, CellKind::F64, Field::SampleRate),
    col(1, CellKind::U16, Field::Rpm),
    col(2, CellKind::U16, Field::Speed),
    col(3, CellKind::U8, Field::Gear),
    // Exported as volts with a fraction, e.g. "13.8"
    col(4, CellKind::F64, Field::Voltage),
    col(5, CellKind::U16, Field::IntakeTemp),
    col(6, CellKind::U16, Field::CoolantTemp),
    col(7, CellKind::U8, Field::Mil),
    col(8, CellKind::U8, Field::Vts),
    col(9, CellKind::U8, Field::ClosedLoop),
    col(10, CellKind::U16, Field::Throttle),
    col(11, CellKind::U16, Field::ManifoldPressure),
    col(12, CellKind::U16, Field::Injector),
    col(13, CellKind::U16, Field::Ignition),
    col(14, CellKind::F64, Field::Lambda),
    col(15, CellKind::U16, Field::Knock),
    col(16, CellKind::F64, Field::TargetCamAngle),
    col(17, CellKind::F64, Field::ActualCamAngle),
    col(18, CellKind::U16, Field::Analog0),
    col(19, CellKind::U16, Field::Analog1),
    col(20, CellKind::U16, Field::Analog2),
    col(21, CellKind::U16, Field::Analog3),
    col(22, CellKind::U16, Field::Analog4),
    col(23, CellKind::U16, Field::Analog5),
    col(24, CellKind::U16, Field::Analog6),
    col(25, CellKind::U16, Field::Analog7),
];

const S300_COLUMNS: [ColumnSpec; 3] = [
    col(26, CellKind::U8, Field::FlexFrequency),
    col(27, CellKind::U8, Field::FlexDuty),
    col(28, CellKind::F64, Field::FlexContent),
];

const KPRO_COLUMNS: [ColumnSpec; 3] = [
    col(26, CellKind::U8, Field::FlexFrequency),
    col(27, CellKind::U8, Field::EthanolContent),
    col(28, CellKind::U16, Field::FuelTemperature),
];

const GPS_COLUMNS: [ColumnSpec; 2] = [
    col(29, CellKind::F64, Field::Latitude),
    col(30, CellKind::F64, Field::Longitude),
];

/// Ordered column layout of a datalog export
///
/// The exporter's column order is not self-describing, so the layout is fixed
/// here per ECU variant, with the two GPS columns optional.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatalogSchema {
    variant: EcuVariant,
    columns: Vec<ColumnSpec>,
}

impl DatalogSchema {
    pub fn new(variant: EcuVariant, gps: bool) -> Self {
        let mut columns = COMMON_COLUMNS.to_vec();
        match variant {
            EcuVariant::S300 => columns.extend_from_slice(&S300_COLUMNS),
            EcuVariant::KPro => columns.extend_from_slice(&KPRO_COLUMNS),
        }
        if gps {
            columns.extend_from_slice(&GPS_COLUMNS);
        }
        Self { variant, columns }
    }

    pub fn variant(&self) -> EcuVariant {
        self.variant
    }

    pub fn columns(&self) -> &[ColumnSpec] {
        &self.columns
    }

    /// Minimum number of cells a data row must have
    pub fn required_columns(&self) -> usize {
        self.columns.iter().map(|c| c.index + 1).max().unwrap_or(0)
    }
}

/// Converted cells of one row, addressed by field
#[derive(Debug, Clone)]
pub struct RowValues {
    values: [CellValue; Field::COUNT],
}

impl Default for RowValues {
    fn default() -> Self {
        Self {
            values: [CellValue::U8(0); Field::COUNT],
        }
    }
}

impl RowValues {
    pub fn set(&mut self, field: Field, value: CellValue) {
        self.values[field as usize] = value;
    }

    pub fn get(&self, field: Field) -> CellValue {
        self.values[field as usize]
    }

    fn u8(&self, field: Field) -> u8 {
        self.get(field).as_u8()
    }

    fn u16(&self, field: Field) -> u16 {
        self.get(field).as_u16()
    }

    fn f64(&self, field: Field) -> f64 {
        self.get(field).as_f64()
    }

    /// Assemble the typed records for one sample
    ///
    /// Fields absent from the schema (GPS when disabled) stay zero.
    pub fn into_row(self, variant: EcuVariant) -> TelemetryRow {
        let auxiliary = match variant {
            EcuVariant::S300 => AuxiliaryRecord::S300(S300Auxiliary {
                frequency: self.u8(Field::FlexFrequency),
                duty: self.u8(Field::FlexDuty),
                content: self.f64(Field::FlexContent),
            }),
            EcuVariant::KPro => AuxiliaryRecord::KPro(KProAuxiliary {
                frequency: self.u8(Field::FlexFrequency),
                ethanol_content: self.u8(Field::EthanolContent),
                fuel_temperature: self.u16(Field::FuelTemperature),
            }),
        };

        TelemetryRow {
            misc: Misc {
                hertz: self.f64(Field::SampleRate),
            },
            engine: Engine {
                rpm: self.u16(Field::Rpm),
                speed: self.u16(Field::Speed),
                gear: self.u8(Field::Gear),
                voltage: self.u8(Field::Voltage),
            },
            thermal: Thermal {
                intake_temp: self.u16(Field::IntakeTemp),
                coolant_temp: self.u16(Field::CoolantTemp),
                mil: self.u8(Field::Mil),
                vts: self.u8(Field::Vts),
                closed_loop: self.u8(Field::ClosedLoop),
            },
            load: Load {
                throttle: self.u16(Field::Throttle),
                manifold_pressure: self.u16(Field::ManifoldPressure),
            },
            timing: Timing {
                injector: self.u16(Field::Injector),
                ignition: self.u16(Field::Ignition),
            },
            fuel_ratio: FuelRatio {
                lambda: self.u16(Field::Lambda),
            },
            knock: Knock {
                level: self.u16(Field::Knock),
            },
            camshaft: Camshaft {
                target_angle: self.f64(Field::TargetCamAngle),
                actual_angle: self.f64(Field::ActualCamAngle),
            },
            analog_a: AnalogBank {
                channels: [
                    self.u16(Field::Analog0),
                    self.u16(Field::Analog1),
                    self.u16(Field::Analog2),
                    self.u16(Field::Analog3),
                ],
            },
            analog_b: AnalogBank {
                channels: [
                    self.u16(Field::Analog4),
                    self.u16(Field::Analog5),
                    self.u16(Field::Analog6),
                    self.u16(Field::Analog7),
                ],
            },
            auxiliary,
            gps: GpsPosition {
                latitude: self.f64(Field::Latitude),
                longitude: self.f64(Field::Longitude),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_columns() {
        assert_eq!(DatalogSchema::new(EcuVariant::KPro, false).required_columns(), 29);
        assert_eq!(DatalogSchema::new(EcuVariant::S300, true).required_columns(), 31);
    }

    #[test]
    fn test_columns_are_contiguous_and_ordered() {
        let schema = DatalogSchema::new(EcuVariant::S300, true);
        for (i, column) in schema.columns().iter().enumerate() {
            assert_eq!(column.index, i);
        }
    }

    #[test]
    fn test_variant_columns() {
        let s300 = DatalogSchema::new(EcuVariant::S300, false);
        let kpro = DatalogSchema::new(EcuVariant::KPro, false);
        assert_eq!(s300.columns()[28].field, Field::FlexContent);
        assert_eq!(s300.columns()[28].kind, CellKind::F64);
        assert_eq!(kpro.columns()[28].field, Field::FuelTemperature);
        assert_eq!(kpro.columns()[28].kind, CellKind::U16);
    }

    #[test]
    fn test_into_row_narrows_float_columns() {
        let mut values = RowValues::default();
        values.set(Field::Voltage, CellValue::F64(13.8));
        values.set(Field::Lambda, CellValue::F64(1.02));
        values.set(Field::Rpm, CellValue::U16(5000));

        let row = values.into_row(EcuVariant::KPro);
        assert_eq!(row.engine.voltage, 13);
        assert_eq!(row.fuel_ratio.lambda, 1);
        assert_eq!(row.engine.rpm, 5000);
        assert!(matches!(row.auxiliary, AuxiliaryRecord::KPro(_)));
    }
}
