//! Per-interrupt handling of unsolicited frames.

use embassy_sync::blocking_mutex::raw::RawMutex;
use embedded_hal_async::delay::DelayNs;
use embedded_hal_async::digital::Wait;

use crate::device::{Ektf2k, Inner, State};
use crate::gpio::CtpGpio;
use crate::input::InputSink;
use crate::report::{decode_report, Opcode, TouchFrameReport, REPORT_FRAME_LEN, VAL_NOISY};
use crate::transport::Transport;

/// What one interrupt turned out to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// A touch report; `contacts` positions were emitted.
    Report {
        /// Number of contacts forwarded to the host.
        contacts: u8,
    },
    /// A noise environment notification.
    Noise {
        /// `true` when the controller considers the environment noisy.
        noisy: bool,
    },
    /// A calibration notification.
    Calibration,
    /// An unsolicited hello.
    Hello,
    /// A frame with an unknown opcode.
    Ignored(u8),
    /// The frame could not be read. Nothing was emitted.
    Dropped,
    /// The device is not `Ready`; the interrupt was not serviced.
    Inactive,
}

impl<M, T, D, G, I> Ektf2k<M, T, D, G, I>
where
    M: RawMutex,
    T: Transport,
    D: DelayNs,
    G: CtpGpio,
    I: InputSink,
{
    /// Services one interrupt: acknowledges the line, reads one frame and
    /// acts on it.
    ///
    /// Bus failures end this invocation only; the next interrupt starts
    /// fresh.
    pub async fn handle_interrupt(&self) -> Dispatch {
        let mut inner = self.inner.lock().await;
        if inner.state != State::Ready {
            log::trace!("ektf2k::irq ignored in {:?}", inner.state);
            return Dispatch::Inactive;
        }
        inner.gpio.read_and_ack_interrupt();

        let mut frame = [0u8; REPORT_FRAME_LEN];
        if let Err(err) = inner.session.ctp.receive_report(&mut frame).await {
            log::debug!("ektf2k::irq dropping frame: {err:?}");
            return Dispatch::Dropped;
        }

        match Opcode::try_from(frame[0]) {
            Ok(Opcode::Report) => {
                let report = decode_report(&frame);
                log::trace!("ektf2k::irq {report:?}");
                let contacts = inner.emit(&report);
                Dispatch::Report { contacts }
            }
            Ok(Opcode::Noise) => {
                let noisy = frame[1] == VAL_NOISY;
                if noisy {
                    log::info!("ektf2k::irq noise message: environment is noisy");
                } else {
                    log::info!("ektf2k::irq noise message: environment is normal");
                }
                Dispatch::Noise { noisy }
            }
            Ok(Opcode::Calib) => {
                log::info!("ektf2k::irq calibration message");
                Dispatch::Calibration
            }
            Ok(Opcode::Hello) => {
                log::info!("ektf2k::irq hello message");
                Dispatch::Hello
            }
            Err(opcode) => {
                log::trace!("ektf2k::irq unknown opcode {opcode:#04x}");
                Dispatch::Ignored(opcode)
            }
        }
    }

    /// Waits for the controller to pull the interrupt line low, then
    /// services it.
    pub async fn wait_and_handle<W: Wait>(&self, irq: &mut W) -> Result<Dispatch, W::Error> {
        irq.wait_for_low().await?;
        Ok(self.handle_interrupt().await)
    }

    /// Services interrupts forever. Returns only if the line itself fails.
    pub async fn run<W: Wait>(&self, irq: &mut W) -> W::Error {
        loop {
            if let Err(err) = self.wait_and_handle(irq).await {
                log::warn!("ektf2k::run interrupt line failed: {err:?}");
                return err;
            }
        }
    }
}

impl<T, D, G, I> Inner<T, D, G, I>
where
    I: InputSink,
{
    /// Forwards a report to the host and returns the number of contacts.
    fn emit(&mut self, report: &TouchFrameReport) -> u8 {
        let mut contacts = 0;
        if report.is_release() {
            self.input.report_touch(false);
            self.input.mt_sync();
        } else {
            let orientation = self.session.config.orientation;
            let info = self.session.info;
            for point in report.present() {
                let (x, y) = orientation.normalize(point.x, point.y, info.width, info.height);
                self.input.report_touch(true);
                self.input.report_position(x, y);
                self.input.report_pressure(1);
                self.input.mt_sync();
                contacts += 1;
            }
        }
        self.input.sync();
        contacts
    }
}
