//! Device lifecycle: attach, suspend, resume and detach.
//!
//! All device state sits behind a single `embassy-sync` mutex. Lifecycle
//! transitions hold it for their whole command sequence and the interrupt
//! dispatcher holds it while it reads a frame, so the two never interleave
//! on the bus.

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::mutex::Mutex;
use embedded_hal_async::delay::DelayNs;

use crate::conf::{BoardConfig, ConfigStore};
use crate::ctp::Catalog;
use crate::err::*;
use crate::gpio::{CtpGpio, CtpPin, IrqMode, PinHandle};
use crate::input::{Capabilities, InputSink};
use crate::op::{DataMessage, FingerState, FirmwareVersion, PacketState, PowerState};
use crate::transport::{Bus, Transport};

/// Each half of the reset pulse.
pub const RESET_PULSE_MS: u32 = 15;

/// Gap between attach-time info queries.
pub const QUERY_GAP_MS: u32 = 10;

/// Wait between a resume write and its read-back.
pub const READBACK_MS: u32 = 10;

/// Lifecycle state of a device instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// Constructed, nothing acquired.
    Cold,
    /// Pins acquired, reset pulse in progress.
    Reset,
    /// Waiting for the post-reset hello frame.
    AwaitHello,
    /// Reading firmware version and sensor size.
    QueryInfo,
    /// Registered with the host, interrupts flowing.
    Ready,
    /// Interrupts masked, sensor asleep.
    Suspended,
    /// Everything released. Terminal.
    Detached,
}

/// Checks the post-reset hello frame.
pub fn check_hello(frame: &[u8; 4]) -> Result<(), SoftWarning> {
    if frame.iter().all(|b| *b == DataMessage::Hello as u8) {
        Ok(())
    } else {
        Err(SoftWarning::HelloMismatch(*frame))
    }
}

/// A copy of what the driver knows about the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionInfo {
    /// Firmware version read at attach.
    pub firmware_version: FirmwareVersion,
    /// Sensor width in raw units.
    pub width: u16,
    /// Sensor height in raw units.
    pub height: u16,
    /// Last known sensing mode.
    pub power_on: bool,
    /// Last known streaming state.
    pub streaming_on: bool,
}

/// Per-device session: the bus, the board configuration and the chip info.
pub(crate) struct DeviceSession<T, D> {
    pub(crate) ctp: Catalog<T, D>,
    pub(crate) config: BoardConfig,
    pub(crate) info: SessionInfo,
}

#[derive(Default)]
struct Pins {
    reset: Option<PinHandle>,
    wakeup: Option<PinHandle>,
    interrupt: Option<PinHandle>,
}

pub(crate) struct Inner<T, D, G, I> {
    pub(crate) session: DeviceSession<T, D>,
    pub(crate) gpio: G,
    pub(crate) input: I,
    pub(crate) state: State,
    pins: Pins,
    irq_enabled: bool,
    registered: bool,
}

/// Driver for one eKTF2K controller.
///
/// Every method takes `&self`, so the driver can be shared between the task
/// that services the interrupt line and the one that handles power events.
pub struct Ektf2k<M: RawMutex, T, D, G, I> {
    pub(crate) inner: Mutex<M, Inner<T, D, G, I>>,
}

type AttachResult<T, G, I> = Result<
    Warnings,
    InitError<<T as Transport>::Error, <G as CtpGpio>::Error, <I as InputSink>::Error>,
>;

impl<M, T, D, G, I> Ektf2k<M, T, D, G, I>
where
    M: RawMutex,
    T: Transport,
    D: DelayNs,
    G: CtpGpio,
    I: InputSink,
{
    /// Creates a new driver in the `Cold` state.
    ///
    /// # Arguments
    ///
    /// * `config` - The board configuration, owned by the device from now on.
    /// * `transport` - The two-wire channel to the controller.
    /// * `delay` - A delay provider that implements `DelayNs`.
    /// * `gpio` - The platform's pin and interrupt adapter.
    /// * `input` - The host input subsystem.
    pub fn new(config: BoardConfig, transport: T, delay: D, gpio: G, input: I) -> Self {
        let session = DeviceSession {
            ctp: Catalog::new(Bus::new(transport, delay)),
            config,
            info: SessionInfo::default(),
        };
        Self {
            inner: Mutex::new(Inner {
                session,
                gpio,
                input,
                state: State::Cold,
                pins: Pins::default(),
                irq_enabled: false,
                registered: false,
            }),
        }
    }

    /// Loads the board configuration and creates the driver.
    ///
    /// `transport` receives the loaded configuration so it can pick the bus
    /// address. Nothing is created when the configuration is unusable.
    pub fn from_store(
        store: &impl ConfigStore,
        transport: impl FnOnce(&BoardConfig) -> T,
        delay: D,
        gpio: G,
        input: I,
    ) -> Result<Self, ConfigError> {
        let config = BoardConfig::load(store)?;
        let transport = transport(&config);
        Ok(Self::new(config, transport, delay, gpio, input))
    }

    /// The current lifecycle state.
    pub async fn state(&self) -> State {
        self.inner.lock().await.state
    }

    /// A copy of the chip info.
    pub async fn session_info(&self) -> SessionInfo {
        self.inner.lock().await.session.info
    }

    /// The board configuration.
    pub async fn config(&self) -> BoardConfig {
        self.inner.lock().await.session.config.clone()
    }

    /// Brings the controller from `Cold` to `Ready`.
    ///
    /// Hello mismatches are returned as warnings. Any other failure releases
    /// what was acquired and leaves the device `Detached`.
    pub async fn attach(&self) -> AttachResult<T, G, I> {
        let mut inner = self.inner.lock().await;
        if inner.state != State::Cold {
            return Err(InitError::State(inner.state));
        }

        log::debug!("ektf2k::attach start");
        match inner.attach().await {
            Ok(warnings) => {
                log::debug!("ektf2k::attach done");
                Ok(warnings)
            }
            Err(err) => {
                log::error!("ektf2k::attach failed in {:?}: {err:?}", inner.state);
                inner.release();
                inner.state = State::Detached;
                Err(err)
            }
        }
    }

    /// Masks interrupts, stops streaming and puts the sensor to sleep.
    ///
    /// Every step is best effort: failures come back as warnings and the
    /// device still ends up `Suspended`.
    pub async fn enter_suspend(&self) -> Result<Warnings, StateError> {
        let mut inner = self.inner.lock().await;
        if inner.state != State::Ready {
            return Err(StateError(inner.state));
        }
        log::info!("ektf2k::enter_suspend");

        let mut warnings = Warnings::new();
        inner.set_irq(false);

        let session = &mut inner.session;
        match session.ctp.set_packet_state(PacketState::Off).await {
            Ok(()) => session.info.streaming_on = false,
            Err(_) => warn(&mut warnings, SoftWarning::SuspendStep(SuspendStep::StreamingOff)),
        }
        match session.ctp.set_power_state(PowerState::Sleep).await {
            Ok(()) => session.info.power_on = false,
            Err(_) => warn(&mut warnings, SoftWarning::SuspendStep(SuspendStep::PowerOff)),
        }

        inner.state = State::Suspended;
        Ok(warnings)
    }

    /// Wakes the sensor, restarts streaming, verifies both and unmasks
    /// interrupts.
    pub async fn leave_suspend(&self) -> Result<Warnings, StateError> {
        let mut inner = self.inner.lock().await;
        if inner.state != State::Suspended {
            return Err(StateError(inner.state));
        }
        log::info!("ektf2k::leave_suspend");

        let mut warnings = Warnings::new();
        let session = &mut inner.session;

        match session.ctp.set_power_state(PowerState::Normal).await {
            Ok(()) => session.info.power_on = true,
            Err(_) => warn(&mut warnings, SoftWarning::SuspendStep(SuspendStep::PowerOn)),
        }
        session.ctp.delay_ms(READBACK_MS).await;
        match session.ctp.power_state().await {
            Ok(PowerState::Normal) => session.info.power_on = true,
            Ok(PowerState::Sleep) => {
                session.info.power_on = false;
                warn(&mut warnings, SoftWarning::PowerReadback);
            }
            Err(_) => warn(&mut warnings, SoftWarning::PowerReadback),
        }

        match session.ctp.set_packet_state(PacketState::On).await {
            Ok(()) => session.info.streaming_on = true,
            Err(_) => warn(&mut warnings, SoftWarning::SuspendStep(SuspendStep::StreamingOn)),
        }
        session.ctp.delay_ms(READBACK_MS).await;
        match session.ctp.packet_state().await {
            Ok(PacketState::On) => session.info.streaming_on = true,
            Ok(PacketState::Off) => {
                session.info.streaming_on = false;
                warn(&mut warnings, SoftWarning::StreamingReadback);
            }
            Err(_) => warn(&mut warnings, SoftWarning::StreamingReadback),
        }

        inner.set_irq(true);
        inner.state = State::Ready;
        Ok(warnings)
    }

    /// Releases the interrupt, the host registration and the pins.
    ///
    /// Safe to call in any state and more than once. An interrupt being
    /// serviced finishes first.
    pub async fn detach(&self) {
        let mut inner = self.inner.lock().await;
        if inner.state == State::Detached {
            return;
        }
        log::info!("ektf2k::detach from {:?}", inner.state);
        inner.release();
        inner.state = State::Detached;
    }

    /// Detaches if needed and hands back the bus, the delay provider and the
    /// collaborators.
    pub fn release(self) -> (T, D, G, I) {
        let mut inner = self.inner.into_inner();
        if inner.state != State::Detached {
            log::info!("ektf2k::release from {:?}", inner.state);
            inner.release();
        }
        let Inner {
            session,
            gpio,
            input,
            ..
        } = inner;
        let (transport, delay) = session.ctp.release().release();
        (transport, delay, gpio, input)
    }

    /// Asks the controller whether a finger rests on the panel.
    pub async fn finger_present(&self) -> Result<bool, DeviceError<T::Error>> {
        let mut inner = self.inner.lock().await;
        inner.require_awake()?;
        let state = inner.session.ctp.finger_state().await?;
        Ok(state == FingerState::On)
    }

    /// Reads the sensing mode from the controller.
    pub async fn power_state(&self) -> Result<PowerState, DeviceError<T::Error>> {
        let mut inner = self.inner.lock().await;
        inner.require_awake()?;
        Ok(inner.session.ctp.power_state().await?)
    }

    /// Reads the streaming state from the controller.
    pub async fn streaming_state(&self) -> Result<PacketState, DeviceError<T::Error>> {
        let mut inner = self.inner.lock().await;
        inner.require_awake()?;
        Ok(inner.session.ctp.packet_state().await?)
    }

    /// Sends a soft reset data message.
    pub async fn soft_reset(&self) -> Result<(), DeviceError<T::Error>> {
        self.send_data(DataMessage::Reset).await
    }

    /// Asks the controller to recalibrate.
    pub async fn recalibrate(&self) -> Result<(), DeviceError<T::Error>> {
        self.send_data(DataMessage::Calib).await
    }

    /// Asks the controller to send its last report again.
    pub async fn repeat_report(&self) -> Result<(), DeviceError<T::Error>> {
        self.send_data(DataMessage::Repeat).await
    }

    async fn send_data(&self, message: DataMessage) -> Result<(), DeviceError<T::Error>> {
        let mut inner = self.inner.lock().await;
        if inner.state != State::Ready {
            return Err(DeviceError::State(inner.state));
        }
        Ok(inner.session.ctp.send_data(message).await?)
    }
}

impl<T, D, G, I> Inner<T, D, G, I>
where
    T: Transport,
    D: DelayNs,
    G: CtpGpio,
    I: InputSink,
{
    async fn attach(&mut self) -> AttachResult<T, G, I> {
        let mut warnings = Warnings::new();

        self.pins.reset = self.optional_pin(CtpPin::Reset);
        self.pins.wakeup = self.optional_pin(CtpPin::Wakeup);
        let irq = self
            .gpio
            .request_pin(CtpPin::Interrupt)
            .map_err(InitError::InterruptPin)?;
        self.pins.interrupt = Some(irq);
        self.gpio
            .configure_interrupt(irq, IrqMode::LowLevel)
            .map_err(InitError::InterruptPin)?;
        // Drop anything latched before the reset.
        self.gpio.read_and_ack_interrupt();

        self.state = State::Reset;
        self.pulse_reset().await;

        self.state = State::AwaitHello;
        match self.session.ctp.receive_hello().await {
            Ok(frame) => {
                if let Err(warning) = check_hello(&frame) {
                    warn(&mut warnings, warning);
                }
            }
            Err(_) => warn(&mut warnings, SoftWarning::HelloUnreadable),
        }
        self.session.ctp.delay_ms(QUERY_GAP_MS).await;

        self.state = State::QueryInfo;
        self.query_info().await?;

        let orientation = self.session.config.orientation;
        self.input
            .register(&Capabilities::new(
                orientation.screen_max_x,
                orientation.screen_max_y,
            ))
            .map_err(InitError::Input)?;
        self.registered = true;

        self.session.info.power_on = true;
        self.session.info.streaming_on = true;
        self.set_irq(true);
        self.state = State::Ready;
        Ok(warnings)
    }

    async fn query_info(&mut self) -> Result<(), InitError<T::Error, G::Error, I::Error>> {
        let ctp = &mut self.session.ctp;
        let firmware_version = ctp.firmware_version().await.map_err(|source| InitError::Query {
            query: Query::FirmwareVersion,
            source,
        })?;
        ctp.delay_ms(QUERY_GAP_MS).await;
        let width = ctp.width().await.map_err(|source| InitError::Query {
            query: Query::Width,
            source,
        })?;
        ctp.delay_ms(QUERY_GAP_MS).await;
        let height = ctp.height().await.map_err(|source| InitError::Query {
            query: Query::Height,
            source,
        })?;

        log::info!(
            "ektf2k::attach version {:x}, width {width}, height {height}",
            firmware_version.0
        );
        let info = &mut self.session.info;
        info.firmware_version = firmware_version;
        info.width = width;
        info.height = height;
        Ok(())
    }

    fn optional_pin(&mut self, pin: CtpPin) -> Option<PinHandle> {
        match self.gpio.request_pin(pin) {
            Ok(handle) => Some(handle),
            Err(err) => {
                log::error!("ektf2k::attach failed to get {} GPIO: {err:?}", pin.name());
                None
            }
        }
    }

    async fn pulse_reset(&mut self) {
        let Some(reset) = self.pins.reset else {
            return;
        };
        if let Err(err) = self.gpio.set_level(reset, false) {
            log::error!("ektf2k::reset failed to set GPIO to 0: {err:?}");
        }
        self.session.ctp.delay_ms(RESET_PULSE_MS).await;
        if let Err(err) = self.gpio.set_level(reset, true) {
            log::error!("ektf2k::reset failed to set GPIO to 1: {err:?}");
        }
        self.session.ctp.delay_ms(RESET_PULSE_MS).await;
    }

    fn set_irq(&mut self, enabled: bool) {
        self.gpio.set_interrupt_enabled(enabled);
        self.irq_enabled = enabled;
    }

    fn require_awake(&self) -> Result<(), StateError> {
        match self.state {
            State::Ready | State::Suspended => Ok(()),
            other => Err(StateError(other)),
        }
    }

    fn release(&mut self) {
        if self.irq_enabled {
            self.set_irq(false);
        }
        if self.registered {
            self.input.unregister();
            self.registered = false;
        }
        for handle in [
            self.pins.interrupt.take(),
            self.pins.reset.take(),
            self.pins.wakeup.take(),
        ]
        .into_iter()
        .flatten()
        {
            self.gpio.release_pin(handle);
        }
    }
}
