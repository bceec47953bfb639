//! Typed command/response exchanges with the controller.

use embedded_hal_async::delay::DelayNs;

use crate::err::{BusError, ProtocolError, TransportError};
use crate::op::*;
use crate::report::REPORT_FRAME_LEN;
use crate::transport::{Bus, Transport};

/// The eKTF2K message catalog on top of a [`Bus`].
pub struct Catalog<T, D> {
    bus: Bus<T, D>,
}

impl<T: Transport, D: DelayNs> Catalog<T, D> {
    /// Creates a new `Catalog`.
    pub fn new(bus: Bus<T, D>) -> Self {
        Self { bus }
    }

    /// Receives the 4-byte frame the controller sends once after reset.
    pub async fn receive_hello(&mut self) -> Result<[u8; 4], TransportError<T::Error>> {
        let mut frame = [0u8; COMMAND_FRAME_LEN];
        self.bus.receive(&mut frame).await?;
        Ok(frame)
    }

    /// Receives one unsolicited report frame.
    pub async fn receive_report(
        &mut self,
        frame: &mut [u8; REPORT_FRAME_LEN],
    ) -> Result<(), TransportError<T::Error>> {
        self.bus.receive(frame).await
    }

    /// Sends a broadcast data message such as a soft reset.
    pub async fn send_data(
        &mut self,
        message: DataMessage,
    ) -> Result<(), TransportError<T::Error>> {
        log::debug!("ektf2k::send_data {message:?}");
        self.bus.send(&message.frame()).await
    }

    /// Reads the firmware version.
    pub async fn firmware_version(&mut self) -> Result<FirmwareVersion, BusError<T::Error>> {
        let resp = self
            .query(FirmwareVersion::request_frame(), Command::FwVer)
            .await?;
        Ok(FirmwareVersion::from(&resp))
    }

    /// Reads the sensor width in raw units.
    pub async fn width(&mut self) -> Result<u16, BusError<T::Error>> {
        self.dimension(Command::Width).await
    }

    /// Reads the sensor height in raw units.
    pub async fn height(&mut self) -> Result<u16, BusError<T::Error>> {
        self.dimension(Command::Height).await
    }

    /// Selects sleep or normal sensing mode. Write only, no response.
    pub async fn set_power_state(
        &mut self,
        state: PowerState,
    ) -> Result<(), TransportError<T::Error>> {
        log::trace!("ektf2k::set_power_state {state:?}");
        self.bus.send(state.write_frame().bytes()).await
    }

    /// Reads back the sensing mode.
    pub async fn power_state(&mut self) -> Result<PowerState, BusError<T::Error>> {
        let resp = self.exchange(PowerState::request_frame()).await?;
        Ok(PowerState::from(&resp))
    }

    /// Turns report streaming on or off. Write only, no response.
    pub async fn set_packet_state(
        &mut self,
        state: PacketState,
    ) -> Result<(), TransportError<T::Error>> {
        log::trace!("ektf2k::set_packet_state {state:?}");
        self.bus.send(state.write_frame().bytes()).await
    }

    /// Reads back the streaming state.
    pub async fn packet_state(&mut self) -> Result<PacketState, BusError<T::Error>> {
        let resp = self.exchange(PacketState::request_frame()).await?;
        Ok(PacketState::from(&resp))
    }

    /// Asks whether a finger rests on the panel.
    pub async fn finger_state(&mut self) -> Result<FingerState, BusError<T::Error>> {
        let resp = self.exchange(FingerState::request_frame()).await?;
        Ok(FingerState::from(&resp))
    }

    /// Waits `ms` milliseconds.
    pub async fn delay_ms(&mut self, ms: u32) {
        self.bus.delay_ms(ms).await;
    }

    /// Releases the underlying bus.
    pub fn release(self) -> Bus<T, D> {
        self.bus
    }

    async fn exchange(&mut self, frame: CommandFrame) -> Result<[u8; 4], BusError<T::Error>> {
        let mut buffer: [u8; COMMAND_FRAME_LEN] = frame.into();
        self.bus.transact(&mut buffer).await?;
        log::trace!("ektf2k::exchange {:02x?} -> {buffer:02x?}", frame.bytes());
        Ok(buffer)
    }

    async fn query(
        &mut self,
        frame: CommandFrame,
        command: Command,
    ) -> Result<[u8; 4], BusError<T::Error>> {
        let resp = self.exchange(frame).await?;
        if resp[1] != command as u8 {
            log::warn!(
                "ektf2k::query {command:?} answered with command {:#04x}",
                resp[1]
            );
            return Err(ProtocolError::CommandMismatch {
                expected: command as u8,
                actual: resp[1],
            }
            .into());
        }
        Ok(resp)
    }

    async fn dimension(&mut self, command: Command) -> Result<u16, BusError<T::Error>> {
        let resp = self.query(dimension_request(command), command).await?;
        match decode_dimension(&resp) {
            0 => Err(ProtocolError::ZeroDimension(command).into()),
            value => Ok(value),
        }
    }
}
