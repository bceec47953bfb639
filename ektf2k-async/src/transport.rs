//! Length-exact send/receive primitives and the solicited transaction.

use core::fmt::Debug;

use embedded_hal_async::delay::DelayNs;
use embedded_hal_async::i2c::{I2c, SevenBitAddress};

use crate::err::{BusError, ProtocolError, TransportError};
use crate::op::Marker;

/// Time the controller needs between a request and its response.
pub const SETTLE_MS: u32 = 10;

/// A raw two-wire channel that reports how many bytes it moved.
#[allow(async_fn_in_trait)]
pub trait Transport {
    /// Error reported by the underlying bus.
    type Error: Debug;

    /// Writes `bytes`, returning the number of bytes transmitted.
    async fn send(&mut self, bytes: &[u8]) -> Result<usize, Self::Error>;

    /// Fills `buffer`, returning the number of bytes received.
    async fn receive(&mut self, buffer: &mut [u8]) -> Result<usize, Self::Error>;
}

/// [`Transport`] over an `embedded-hal-async` I2C bus at a fixed address.
///
/// A completed I2C transfer always moves the whole buffer, so the reported
/// count is the buffer length.
pub struct I2cTransport<I2cType> {
    i2c: I2cType,
    address: SevenBitAddress,
}

impl<I2cType: I2c<SevenBitAddress>> I2cTransport<I2cType> {
    /// Creates a new `I2cTransport`.
    ///
    /// # Arguments
    ///
    /// * `i2c` - An I2C peripheral that implements `embedded-hal-async::i2c::I2c`.
    /// * `address` - The controller's bus address, usually `ctp_twi_addr` from the board config.
    pub fn new(i2c: I2cType, address: SevenBitAddress) -> Self {
        Self { i2c, address }
    }

    /// Releases the I2C peripheral.
    pub fn release(self) -> I2cType {
        self.i2c
    }
}

impl<I2cType: I2c<SevenBitAddress>> Transport for I2cTransport<I2cType> {
    type Error = I2cType::Error;

    async fn send(&mut self, bytes: &[u8]) -> Result<usize, Self::Error> {
        self.i2c.write(self.address, bytes).await?;
        Ok(bytes.len())
    }

    async fn receive(&mut self, buffer: &mut [u8]) -> Result<usize, Self::Error> {
        self.i2c.read(self.address, buffer).await?;
        Ok(buffer.len())
    }
}

/// The bus seen by the protocol layers: a [`Transport`] plus the delay used
/// for settle times.
///
/// No operation retries. A failure is reported exactly once.
pub struct Bus<T, D> {
    transport: T,
    delay: D,
}

impl<T: Transport, D: DelayNs> Bus<T, D> {
    /// Creates a new `Bus`.
    pub fn new(transport: T, delay: D) -> Self {
        Self { transport, delay }
    }

    /// Sends `bytes`, failing unless every byte went out.
    pub async fn send(&mut self, bytes: &[u8]) -> Result<(), TransportError<T::Error>> {
        let actual = self.transport.send(bytes).await.map_err(|err| {
            log::warn!("ektf2k::send bus error: {err:?}");
            TransportError::Bus(err)
        })?;
        if actual != bytes.len() {
            log::warn!(
                "ektf2k::send number of sent bytes ({actual}) doesn't match {}",
                bytes.len()
            );
            return Err(TransportError::ShortWrite {
                expected: bytes.len(),
                actual,
            });
        }
        Ok(())
    }

    /// Fills `buffer`, failing unless every byte arrived.
    pub async fn receive(&mut self, buffer: &mut [u8]) -> Result<(), TransportError<T::Error>> {
        let expected = buffer.len();
        let actual = self.transport.receive(buffer).await.map_err(|err| {
            log::warn!("ektf2k::receive bus error: {err:?}");
            TransportError::Bus(err)
        })?;
        if actual != expected {
            log::warn!(
                "ektf2k::receive number of received bytes ({actual}) doesn't match {expected}"
            );
            return Err(TransportError::ShortRead { expected, actual });
        }
        Ok(())
    }

    /// Sends `buffer`, waits [`SETTLE_MS`] and reads the same number of
    /// bytes back into it. The reply must start with the response marker.
    pub async fn transact(&mut self, buffer: &mut [u8]) -> Result<(), BusError<T::Error>> {
        self.send(buffer).await?;
        self.delay.delay_ms(SETTLE_MS).await;
        self.receive(buffer).await?;

        match buffer.first() {
            Some(&marker) if marker == Marker::Response as u8 => Ok(()),
            other => {
                let marker = other.copied().unwrap_or_default();
                log::warn!("ektf2k::transact not a valid response: {marker:#04x}");
                Err(ProtocolError::NotAResponse(marker).into())
            }
        }
    }

    /// Waits `ms` milliseconds.
    pub async fn delay_ms(&mut self, ms: u32) {
        self.delay.delay_ms(ms).await;
    }

    /// Releases the transport and the delay provider.
    pub fn release(self) -> (T, D) {
        (self.transport, self.delay)
    }
}
