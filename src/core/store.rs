use crate::core::records::{
    AnalogBank, AuxiliaryRecord, Camshaft, EcuVariant, Engine, FuelRatio, GpsPosition,
    KProAuxiliary, Knock, Load, Misc, S300Auxiliary, TelemetryRow, Thermal, Timing,
};
use thiserror::Error;

/// Number of category sequences kept by the store
#[cfg(test)]
pub const CATEGORY_COUNT: usize = 12;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum StoreError {
    #[error("Auxiliary record is {found} but the store holds {expected} records")]
    VariantMismatch {
        expected: EcuVariant,
        found: EcuVariant,
    },
}

/// Auxiliary sequence, one layout per run
#[derive(Debug, Clone)]
pub enum AuxiliarySeries {
    S300(Vec<S300Auxiliary>),
    KPro(Vec<KProAuxiliary>),
}

impl AuxiliarySeries {
    fn starting_with(record: AuxiliaryRecord) -> Self {
        match record {
            AuxiliaryRecord::S300(aux) => AuxiliarySeries::S300(vec![aux]),
            AuxiliaryRecord::KPro(aux) => AuxiliarySeries::KPro(vec![aux]),
        }
    }

    pub fn variant(&self) -> EcuVariant {
        match self {
            AuxiliarySeries::S300(_) => EcuVariant::S300,
            AuxiliarySeries::KPro(_) => EcuVariant::KPro,
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        match self {
            AuxiliarySeries::S300(v) => v.len(),
            AuxiliarySeries::KPro(v) => v.len(),
        }
    }

    fn get(&self, index: usize) -> Option<AuxiliaryRecord> {
        match self {
            AuxiliarySeries::S300(v) => v.get(index).copied().map(AuxiliaryRecord::S300),
            AuxiliarySeries::KPro(v) => v.get(index).copied().map(AuxiliaryRecord::KPro),
        }
    }
}

/// Per-category telemetry sequences
///
/// Every sequence starts with a zero-valued sentinel at index 0 and grows in
/// lock-step, one record per loaded datalog row. The loader owns the store
/// while filling it; playback only borrows it.
#[derive(Debug, Clone)]
pub struct RecordStore {
    misc: Vec<Misc>,
    engine: Vec<Engine>,
    thermal: Vec<Thermal>,
    load: Vec<Load>,
    timing: Vec<Timing>,
    fuel_ratio: Vec<FuelRatio>,
    knock: Vec<Knock>,
    camshaft: Vec<Camshaft>,
    analog_a: Vec<AnalogBank>,
    analog_b: Vec<AnalogBank>,
    auxiliary: AuxiliarySeries,
    gps: Vec<GpsPosition>,
}

impl RecordStore {
    /// Create a store holding only the sentinel records
    pub fn new(variant: EcuVariant) -> Self {
        let sentinel = TelemetryRow::sentinel(variant);
        Self {
            misc: vec![sentinel.misc],
            engine: vec![sentinel.engine],
            thermal: vec![sentinel.thermal],
            load: vec![sentinel.load],
            timing: vec![sentinel.timing],
            fuel_ratio: vec![sentinel.fuel_ratio],
            knock: vec![sentinel.knock],
            camshaft: vec![sentinel.camshaft],
            analog_a: vec![sentinel.analog_a],
            analog_b: vec![sentinel.analog_b],
            auxiliary: AuxiliarySeries::starting_with(sentinel.auxiliary),
            gps: vec![sentinel.gps],
        }
    }

    /// Append one row to every sequence, returning its index
    pub fn push(&mut self, row: TelemetryRow) -> Result<usize, StoreError> {
        // Checked before touching any sequence so a rejected row leaves lengths equal
        match (&mut self.auxiliary, row.auxiliary) {
            (AuxiliarySeries::S300(v), AuxiliaryRecord::S300(aux)) => v.push(aux),
            (AuxiliarySeries::KPro(v), AuxiliaryRecord::KPro(aux)) => v.push(aux),
            (series, aux) => {
                return Err(StoreError::VariantMismatch {
                    expected: series.variant(),
                    found: aux.variant(),
                })
            }
        }

        self.misc.push(row.misc);
        self.engine.push(row.engine);
        self.thermal.push(row.thermal);
        self.load.push(row.load);
        self.timing.push(row.timing);
        self.fuel_ratio.push(row.fuel_ratio);
        self.knock.push(row.knock);
        self.camshaft.push(row.camshaft);
        self.analog_a.push(row.analog_a);
        self.analog_b.push(row.analog_b);
        self.gps.push(row.gps);

        Ok(self.engine.len() - 1)
    }

    /// Length of every sequence, sentinel included
    pub fn len(&self) -> usize {
        self.engine.len()
    }

    /// Number of loaded data rows (sentinel excluded)
    pub fn rows(&self) -> usize {
        self.len() - 1
    }

    /// True when only the sentinel is present
    pub fn is_empty(&self) -> bool {
        self.rows() == 0
    }

    /// Logger sample rate recorded on the first data row
    pub fn sample_rate(&self) -> Option<f64> {
        self.misc.get(1).map(|m| m.hertz)
    }

    /// Lengths of all category sequences
    #[cfg(test)]
    pub fn category_lengths(&self) -> [usize; CATEGORY_COUNT] {
        [
            self.misc.len(),
            self.engine.len(),
            self.thermal.len(),
            self.load.len(),
            self.timing.len(),
            self.fuel_ratio.len(),
            self.knock.len(),
            self.camshaft.len(),
            self.analog_a.len(),
            self.analog_b.len(),
            self.auxiliary.len(),
            self.gps.len(),
        ]
    }

    /// Gather every category's record at `index`
    pub fn sample(&self, index: usize) -> Option<TelemetryRow> {
        Some(TelemetryRow {
            misc: *self.misc.get(index)?,
            engine: *self.engine.get(index)?,
            thermal: *self.thermal.get(index)?,
            load: *self.load.get(index)?,
            timing: *self.timing.get(index)?,
            fuel_ratio: *self.fuel_ratio.get(index)?,
            knock: *self.knock.get(index)?,
            camshaft: *self.camshaft.get(index)?,
            analog_a: *self.analog_a.get(index)?,
            analog_b: *self.analog_b.get(index)?,
            auxiliary: self.auxiliary.get(index)?,
            gps: *self.gps.get(index)?,
        })
    }

    #[cfg(test)]
    pub fn engine(&self) -> &[Engine] {
        &self.engine
    }
}
