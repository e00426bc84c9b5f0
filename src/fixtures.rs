//! Frame builder shared by the unit tests.

use crate::decoder::layout;

pub struct FrameBuilder {
    pub company_id: u16,
    pub frame_type: u8,
    pub device_type: u8,
    pub identifier: [u8; 6],
    pub hardware_version: u8,
    pub firmware_version: [u8; 3],
    pub status: u8,
    pub current_motion: u16,
    pub previous_motion: u16,
    pub acceleration: [i8; 3],
    pub idle_battery: u16,
    pub stress_battery: u16,
    pub temperature: i16,
    pub tx_power: i8,
    pub channel: u8,
}

impl Default for FrameBuilder {
    /// A Dog nearable, AA:BB:CC:DD:EE:FF, lying flat, still, running its app.
    fn default() -> Self {
        FrameBuilder {
            company_id: 0x015D,
            frame_type: 0x01,
            device_type: 1,
            identifier: [0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF],
            hardware_version: 0x32,
            firmware_version: [1, 2, 3],
            status: layout::STATUS_APP | (1 << layout::STATUS_ORIENTATION_SHIFT),
            // 5 minutes
            current_motion: 0x4005,
            // 2 hours
            previous_motion: 0x8002,
            acceleration: [1, -2, 64],
            idle_battery: 3012,
            stress_battery: 2950,
            // 23 °C
            temperature: 368,
            tx_power: -59,
            channel: 37,
        }
    }
}

impl FrameBuilder {
    pub fn build(&self) -> Vec<u8> {
        let mut frame = Vec::with_capacity(layout::FRAME_LEN);
        frame.extend_from_slice(&self.company_id.to_le_bytes());
        frame.push(self.frame_type);
        frame.push(self.device_type);
        frame.extend_from_slice(&self.identifier);
        frame.push(self.hardware_version);
        frame.extend_from_slice(&self.firmware_version);
        frame.push(self.status);
        frame.extend_from_slice(&self.current_motion.to_le_bytes());
        frame.extend_from_slice(&self.previous_motion.to_le_bytes());
        frame.extend(self.acceleration.iter().map(|&a| a as u8));
        frame.extend_from_slice(&self.idle_battery.to_le_bytes());
        frame.extend_from_slice(&self.stress_battery.to_le_bytes());
        frame.extend_from_slice(&self.temperature.to_le_bytes());
        frame.push(self.tx_power as u8);
        frame.push(self.channel);
        debug_assert_eq!(frame.len(), layout::FRAME_LEN);
        frame
    }

    /// Lowercase hex, as found in capture files.
    pub fn hex(&self) -> String {
        self.build().iter().map(|b| format!("{:02x}", b)).collect()
    }
}
