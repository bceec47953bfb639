//! A simulated eKTF2K and recording collaborators.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use embassy_sync::blocking_mutex::raw::NoopRawMutex;
use embedded_hal_async::delay::DelayNs;
use ektf2k_async::conf::BoardConfig;
use ektf2k_async::coords::Orientation;
use ektf2k_async::gpio::{CtpGpio, CtpPin, IrqMode, PinHandle};
use ektf2k_async::input::{Capabilities, InputEvent, InputSink};
use ektf2k_async::transport::Transport;
use ektf2k_async::Ektf2k;

/// Everything the collaborators saw, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum Trace {
    Sent(Vec<u8>),
    Received(usize),
    Delay(u32),
    Request(CtpPin),
    Release(PinHandle),
    Level(bool),
    IrqMode(IrqMode),
    IrqEnabled(bool),
    Ack,
    Register(Capabilities),
    Unregister,
    Input(InputEvent),
}

pub type Log = Rc<RefCell<Vec<Trace>>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimBusError;

/// Scripted failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// The next send goes through unchanged.
    Pass,
    /// The next send transmits this many bytes.
    ShortSend(usize),
    /// The next receive fails on the bus.
    ReceiveError,
    /// The next send fails on the bus.
    SendError,
}

pub struct ChipState {
    pub firmware: [u8; 2],
    pub width: u16,
    pub height: u16,
    pub power_on: bool,
    pub streaming_on: bool,
    /// Ignore power writes, so the read-back disagrees.
    pub stuck_asleep: bool,
    pub finger: bool,
    pub outbox: VecDeque<Vec<u8>>,
    pub faults: VecDeque<Fault>,
    /// Reply marker override for the next solicited response.
    pub bad_marker: Option<u8>,
    /// Yield to the executor inside every bus operation.
    pub yielding: bool,
}

impl Default for ChipState {
    fn default() -> Self {
        Self {
            firmware: [0x01, 0xF0],
            width: 0x700,
            height: 0x400,
            power_on: true,
            streaming_on: true,
            stuck_asleep: false,
            finger: false,
            // The hello frame sent after reset.
            outbox: VecDeque::from([vec![0x55; 4]]),
            faults: VecDeque::new(),
            bad_marker: None,
            yielding: false,
        }
    }
}

/// The controller as seen through its two-wire interface.
pub struct SimChip {
    pub state: Rc<RefCell<ChipState>>,
    pub log: Log,
}

fn pack_dimension(command: u8, value: u16) -> Vec<u8> {
    vec![
        0x52,
        command,
        (value & 0xFF) as u8,
        ((value >> 4) & 0xF0) as u8,
    ]
}

impl SimChip {
    fn answer(&self, frame: &[u8]) {
        let mut state = self.state.borrow_mut();
        let reply = match (frame[0], frame[1]) {
            (0x53, 0x00) => Some(vec![0x52, 0x00, state.firmware[0], state.firmware[1]]),
            (0x53, 0x63) => Some(pack_dimension(0x63, state.width)),
            (0x53, 0x60) => Some(pack_dimension(0x60, state.height)),
            (0x53, 0x50) => Some(vec![
                0x52,
                0x50 | if state.power_on { 0x08 } else { 0x00 },
                0x00,
                0x01,
            ]),
            (0x53, 0x8E) => Some(vec![
                0x52,
                0x8E,
                if state.streaming_on { 0x00 } else { 0x01 },
                0x01,
            ]),
            (0x53, 0x51) => Some(vec![0x52, 0x51, state.finger as u8, 0x01]),
            (0x54, command) if command & !0x08 == 0x50 => {
                if !state.stuck_asleep {
                    state.power_on = command & 0x08 != 0;
                }
                None
            }
            (0x54, 0x8E) => {
                state.streaming_on = frame[2] == 0x00;
                None
            }
            _ => None,
        };
        if let Some(mut reply) = reply {
            if let Some(marker) = state.bad_marker.take() {
                reply[0] = marker;
            }
            state.outbox.push_back(reply);
        }
    }
}

impl Transport for SimChip {
    type Error = SimBusError;

    async fn send(&mut self, bytes: &[u8]) -> Result<usize, Self::Error> {
        if self.state.borrow().yielding {
            embassy_futures::yield_now().await;
        }
        self.log.borrow_mut().push(Trace::Sent(bytes.to_vec()));
        let fault = self.state.borrow_mut().faults.pop_front();
        match fault {
            Some(Fault::ShortSend(count)) => return Ok(count),
            Some(Fault::SendError) => return Err(SimBusError),
            Some(Fault::ReceiveError) => self
                .state
                .borrow_mut()
                .faults
                .push_front(Fault::ReceiveError),
            Some(Fault::Pass) | None => {}
        }
        self.answer(bytes);
        Ok(bytes.len())
    }

    async fn receive(&mut self, buffer: &mut [u8]) -> Result<usize, Self::Error> {
        if self.state.borrow().yielding {
            embassy_futures::yield_now().await;
        }
        self.log.borrow_mut().push(Trace::Received(buffer.len()));
        let mut state = self.state.borrow_mut();
        if state.faults.front() == Some(&Fault::ReceiveError) {
            state.faults.pop_front();
            return Err(SimBusError);
        }
        let Some(frame) = state.outbox.pop_front() else {
            return Err(SimBusError);
        };
        let count = frame.len().min(buffer.len());
        buffer[..count].copy_from_slice(&frame[..count]);
        Ok(count)
    }
}

/// Records delays and optionally yields to the executor.
pub struct SimDelay {
    pub log: Log,
    pub yielding: bool,
}

impl DelayNs for SimDelay {
    async fn delay_ns(&mut self, _ns: u32) {}

    async fn delay_ms(&mut self, ms: u32) {
        self.log.borrow_mut().push(Trace::Delay(ms));
        if self.yielding {
            embassy_futures::yield_now().await;
        }
    }
}

#[derive(Default)]
pub struct GpioState {
    pub missing: Vec<CtpPin>,
    pub fail_irq_mode: bool,
    pub irq_enabled: bool,
    pub claimed: Vec<PinHandle>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimGpioError;

pub struct SimGpio {
    pub state: Rc<RefCell<GpioState>>,
    pub log: Log,
}

impl CtpGpio for SimGpio {
    type Error = SimGpioError;

    fn request_pin(&mut self, pin: CtpPin) -> Result<PinHandle, Self::Error> {
        self.log.borrow_mut().push(Trace::Request(pin));
        let mut state = self.state.borrow_mut();
        if state.missing.contains(&pin) {
            return Err(SimGpioError);
        }
        let handle = PinHandle(pin as u32 + 1);
        state.claimed.push(handle);
        Ok(handle)
    }

    fn release_pin(&mut self, handle: PinHandle) {
        self.log.borrow_mut().push(Trace::Release(handle));
        self.state.borrow_mut().claimed.retain(|h| *h != handle);
    }

    fn set_level(&mut self, _handle: PinHandle, high: bool) -> Result<(), Self::Error> {
        self.log.borrow_mut().push(Trace::Level(high));
        Ok(())
    }

    fn configure_interrupt(
        &mut self,
        _handle: PinHandle,
        mode: IrqMode,
    ) -> Result<(), Self::Error> {
        self.log.borrow_mut().push(Trace::IrqMode(mode));
        if self.state.borrow().fail_irq_mode {
            return Err(SimGpioError);
        }
        Ok(())
    }

    fn set_interrupt_enabled(&mut self, enabled: bool) {
        self.log.borrow_mut().push(Trace::IrqEnabled(enabled));
        self.state.borrow_mut().irq_enabled = enabled;
    }

    fn read_and_ack_interrupt(&mut self) -> bool {
        self.log.borrow_mut().push(Trace::Ack);
        true
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimInputError;

pub struct SimInput {
    pub refuse: bool,
    pub log: Log,
}

impl InputSink for SimInput {
    type Error = SimInputError;

    fn register(&mut self, capabilities: &Capabilities) -> Result<(), Self::Error> {
        if self.refuse {
            return Err(SimInputError);
        }
        self.log.borrow_mut().push(Trace::Register(*capabilities));
        Ok(())
    }

    fn unregister(&mut self) {
        self.log.borrow_mut().push(Trace::Unregister);
    }

    fn report_touch(&mut self, down: bool) {
        self.log.borrow_mut().push(Trace::Input(InputEvent::Touch(down)));
    }

    fn report_position(&mut self, x: u16, y: u16) {
        self.log
            .borrow_mut()
            .push(Trace::Input(InputEvent::Position { x, y }));
    }

    fn report_pressure(&mut self, pressure: u8) {
        self.log
            .borrow_mut()
            .push(Trace::Input(InputEvent::Pressure(pressure)));
    }

    fn mt_sync(&mut self) {
        self.log.borrow_mut().push(Trace::Input(InputEvent::ContactEnd));
    }

    fn sync(&mut self) {
        self.log.borrow_mut().push(Trace::Input(InputEvent::Sync));
    }
}

pub type Driver = Ektf2k<NoopRawMutex, SimChip, SimDelay, SimGpio, SimInput>;

/// A driver wired to a fresh simulated chip, plus handles into the doubles.
pub struct Rig {
    pub driver: Driver,
    pub chip: Rc<RefCell<ChipState>>,
    pub gpio: Rc<RefCell<GpioState>>,
    pub log: Log,
}

pub fn orientation() -> Orientation {
    Orientation {
        screen_max_x: 800,
        screen_max_y: 480,
        revert_x: false,
        revert_y: false,
        exchange_xy: false,
    }
}

pub fn config(orientation: Orientation) -> BoardConfig {
    let mut name = heapless::String::new();
    name.push_str("ekt3632").unwrap();
    BoardConfig {
        name,
        twi_id: 1,
        twi_addr: 0x15,
        orientation,
    }
}

pub struct RigBuilder {
    pub chip: ChipState,
    pub gpio: GpioState,
    pub refuse_input: bool,
    pub yielding: bool,
    pub orientation: Orientation,
}

impl RigBuilder {
    pub fn new() -> Self {
        Self {
            chip: ChipState::default(),
            gpio: GpioState::default(),
            refuse_input: false,
            yielding: false,
            orientation: orientation(),
        }
    }

    pub fn build(self) -> Rig {
        let log: Log = Rc::default();
        let mut chip = self.chip;
        chip.yielding = self.yielding;
        let chip = Rc::new(RefCell::new(chip));
        let gpio = Rc::new(RefCell::new(self.gpio));
        let driver = Ektf2k::new(
            config(self.orientation),
            SimChip {
                state: chip.clone(),
                log: log.clone(),
            },
            SimDelay {
                log: log.clone(),
                yielding: self.yielding,
            },
            SimGpio {
                state: gpio.clone(),
                log: log.clone(),
            },
            SimInput {
                refuse: self.refuse_input,
                log: log.clone(),
            },
        );
        Rig {
            driver,
            chip,
            gpio,
            log,
        }
    }
}

impl Rig {
    pub fn attached() -> Self {
        let rig = RigBuilder::new().build();
        embassy_futures::block_on(rig.driver.attach()).unwrap();
        rig.clear();
        rig
    }

    pub fn clear(&self) {
        self.log.borrow_mut().clear();
    }

    pub fn trace(&self) -> Vec<Trace> {
        self.log.borrow().clone()
    }

    pub fn sent(&self) -> Vec<Vec<u8>> {
        self.log
            .borrow()
            .iter()
            .filter_map(|t| match t {
                Trace::Sent(bytes) => Some(bytes.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn events(&self) -> Vec<InputEvent> {
        self.log
            .borrow()
            .iter()
            .filter_map(|t| match t {
                Trace::Input(event) => Some(*event),
                _ => None,
            })
            .collect()
    }

    /// Queues an unsolicited frame, padded to the report length.
    pub fn push_frame(&self, bytes: &[u8]) {
        let mut frame = vec![0u8; 25];
        frame[..bytes.len()].copy_from_slice(bytes);
        self.chip.borrow_mut().outbox.push_back(frame);
    }
}
