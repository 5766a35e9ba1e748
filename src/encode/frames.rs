use crate::core::message::MAX_DLC;
use crate::core::records::{
    AnalogBank, AuxiliaryRecord, Camshaft, Engine, FuelRatio, GpsPosition, Knock, Load,
    TelemetryRow, Thermal, Timing,
};
use crate::core::{CanMessage, RecordStore};
use crate::input::convert::truncate_wrapping_u16;
use thiserror::Error;
use tracing::trace;

pub const ENGINE_FRAME_ID: u32 = 660;
pub const THERMAL_FRAME_ID: u32 = 661;
pub const LOAD_FRAME_ID: u32 = 662;
pub const TIMING_FRAME_ID: u32 = 663;
pub const FUEL_RATIO_FRAME_ID: u32 = 664;
pub const KNOCK_FRAME_ID: u32 = 665;
pub const CAMSHAFT_FRAME_ID: u32 = 666;
pub const ANALOG_A_FRAME_ID: u32 = 667;
pub const ANALOG_B_FRAME_ID: u32 = 668;
pub const AUXILIARY_FRAME_ID: u32 = 669;
/// Lap-timer GPS frame; above 0x7FF so it goes out as an extended frame
pub const GPS_FRAME_ID: u32 = 6969;

/// Frames sent every tick without GPS
pub const ECU_FRAME_COUNT: usize = 10;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum EncodeError {
    #[error("Sample index {index} is outside the datalog (length {len})")]
    IndexOutOfRange { index: usize, len: usize },
}

/// Big-endian payload writer for one frame
struct PayloadWriter {
    data: [u8; MAX_DLC],
    len: usize,
}

impl PayloadWriter {
    fn new() -> Self {
        Self {
            data: [0; MAX_DLC],
            len: 0,
        }
    }

    fn u8(mut self, value: u8) -> Self {
        self.data[self.len] = value;
        self.len += 1;
        self
    }

    fn u16(mut self, value: u16) -> Self {
        self.data[self.len..self.len + 2].copy_from_slice(&value.to_be_bytes());
        self.len += 2;
        self
    }

    /// IEEE-754 single precision bit pattern
    fn f32(mut self, value: f32) -> Self {
        self.data[self.len..self.len + 4].copy_from_slice(&value.to_bits().to_be_bytes());
        self.len += 4;
        self
    }

    /// Declare a longer length than written; the tail stays zero
    fn declare(mut self, len: usize) -> Self {
        self.len = self.len.max(len.min(MAX_DLC));
        self
    }

    fn finish(self, id: u32) -> CanMessage {
        CanMessage::new(id, self.len as u8, self.data)
    }
}

fn engine_frame(engine: &Engine) -> CanMessage {
    PayloadWriter::new()
        .u16(engine.rpm)
        .u16(engine.speed)
        .u8(engine.gear)
        .u8(engine.voltage)
        .finish(ENGINE_FRAME_ID)
}

fn thermal_frame(thermal: &Thermal) -> CanMessage {
    PayloadWriter::new()
        .u16(thermal.intake_temp)
        .u16(thermal.coolant_temp)
        .u8(thermal.mil)
        .u8(thermal.vts)
        .u8(thermal.closed_loop)
        .finish(THERMAL_FRAME_ID)
}

fn load_frame(load: &Load) -> CanMessage {
    PayloadWriter::new()
        .u16(load.throttle)
        .u16(load.manifold_pressure)
        .finish(LOAD_FRAME_ID)
}

fn timing_frame(timing: &Timing) -> CanMessage {
    PayloadWriter::new()
        .u16(timing.injector)
        .u16(timing.ignition)
        .finish(TIMING_FRAME_ID)
}

fn fuel_ratio_frame(fuel_ratio: &FuelRatio) -> CanMessage {
    PayloadWriter::new()
        .u16(fuel_ratio.lambda)
        .finish(FUEL_RATIO_FRAME_ID)
}

fn knock_frame(knock: &Knock) -> CanMessage {
    PayloadWriter::new().u16(knock.level).finish(KNOCK_FRAME_ID)
}

fn camshaft_frame(camshaft: &Camshaft) -> CanMessage {
    PayloadWriter::new()
        .u16(truncate_wrapping_u16(camshaft.target_angle))
        .u16(truncate_wrapping_u16(camshaft.actual_angle))
        .finish(CAMSHAFT_FRAME_ID)
}

fn analog_frame(id: u32, bank: &AnalogBank) -> CanMessage {
    bank.channels
        .iter()
        .fold(PayloadWriter::new(), |w, &channel| w.u16(channel))
        .finish(id)
}

fn auxiliary_frame(auxiliary: &AuxiliaryRecord) -> CanMessage {
    let writer = match auxiliary {
        AuxiliaryRecord::S300(aux) => PayloadWriter::new()
            .u8(aux.frequency)
            .u8(aux.duty)
            .u16(truncate_wrapping_u16(aux.content)),
        AuxiliaryRecord::KPro(aux) => PayloadWriter::new()
            .u8(aux.frequency)
            .u8(aux.ethanol_content)
            .u16(aux.fuel_temperature),
    };
    // Receivers expect a full-width 669 frame for both layouts
    writer.declare(MAX_DLC).finish(AUXILIARY_FRAME_ID)
}

fn gps_frame(gps: &GpsPosition) -> CanMessage {
    PayloadWriter::new()
        .f32(gps.latitude as f32)
        .f32(gps.longitude as f32)
        .finish(GPS_FRAME_ID)
}

/// Encode one sample into its frames, in broadcast order
pub fn encode_row(row: &TelemetryRow, gps: bool) -> Vec<CanMessage> {
    let mut frames = Vec::with_capacity(ECU_FRAME_COUNT + 1);
    frames.push(engine_frame(&row.engine));
    frames.push(thermal_frame(&row.thermal));
    frames.push(load_frame(&row.load));
    frames.push(timing_frame(&row.timing));
    frames.push(fuel_ratio_frame(&row.fuel_ratio));
    frames.push(knock_frame(&row.knock));
    frames.push(camshaft_frame(&row.camshaft));
    frames.push(analog_frame(ANALOG_A_FRAME_ID, &row.analog_a));
    frames.push(analog_frame(ANALOG_B_FRAME_ID, &row.analog_b));
    frames.push(auxiliary_frame(&row.auxiliary));
    if gps {
        frames.push(gps_frame(&row.gps));
    }
    frames
}

/// Turns record store samples into ECU broadcast frames
pub struct FrameEncoder<'a> {
    store: &'a RecordStore,
    gps: bool,
}

impl<'a> FrameEncoder<'a> {
    pub fn new(store: &'a RecordStore, gps: bool) -> Self {
        Self { store, gps }
    }

    /// Number of frames produced per sample
    pub fn frame_count(&self) -> usize {
        if self.gps {
            ECU_FRAME_COUNT + 1
        } else {
            ECU_FRAME_COUNT
        }
    }

    /// Encode the sample at `index`
    pub fn encode(&self, index: usize) -> Result<Vec<CanMessage>, EncodeError> {
        let row = self.store.sample(index).ok_or(EncodeError::IndexOutOfRange {
            index,
            len: self.store.len(),
        })?;

        let frames = encode_row(&row, self.gps);
        for frame in &frames {
            trace!(index, id = frame.id, len = frame.len, data = %frame.hex_data(), "Encoded frame");
        }
        Ok(frames)
    }
}
