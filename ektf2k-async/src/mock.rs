//! Scripted bus and delay doubles for unit tests.

use std::collections::VecDeque;
use std::vec::Vec;

use embedded_hal_async::delay::DelayNs;

use crate::transport::Transport;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockBusError;

/// One expected bus operation.
#[derive(Debug, Clone)]
pub enum Exchange {
    /// Expect exactly these bytes to be sent.
    Send(Vec<u8>),
    /// Accept a send but report only this many bytes as transmitted.
    SendShort(usize),
    SendFail,
    /// Answer a receive with these bytes.
    Receive(Vec<u8>),
    /// Report only this many bytes as received.
    ReceiveShort(usize),
    ReceiveFail,
}

pub struct ScriptedTransport {
    script: VecDeque<Exchange>,
}

impl ScriptedTransport {
    pub fn new(script: Vec<Exchange>) -> Self {
        Self {
            script: script.into(),
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.script.is_empty()
    }
}

impl Transport for ScriptedTransport {
    type Error = MockBusError;

    async fn send(&mut self, bytes: &[u8]) -> Result<usize, Self::Error> {
        match self.script.pop_front() {
            Some(Exchange::Send(expected)) => {
                assert_eq!(bytes, expected.as_slice(), "unexpected frame sent");
                Ok(bytes.len())
            }
            Some(Exchange::SendShort(count)) => Ok(count),
            Some(Exchange::SendFail) => Err(MockBusError),
            other => panic!("send of {bytes:02x?} while expecting {other:?}"),
        }
    }

    async fn receive(&mut self, buffer: &mut [u8]) -> Result<usize, Self::Error> {
        match self.script.pop_front() {
            Some(Exchange::Receive(data)) => {
                assert_eq!(data.len(), buffer.len(), "scripted reply has wrong length");
                buffer.copy_from_slice(&data);
                Ok(buffer.len())
            }
            Some(Exchange::ReceiveShort(count)) => Ok(count),
            Some(Exchange::ReceiveFail) => Err(MockBusError),
            other => panic!("receive of {} bytes while expecting {other:?}", buffer.len()),
        }
    }
}

/// Records every millisecond delay instead of waiting.
#[derive(Default)]
pub struct TraceDelay {
    ms: Vec<u32>,
}

impl TraceDelay {
    pub fn millis(&self) -> Vec<u32> {
        self.ms.clone()
    }
}

impl DelayNs for TraceDelay {
    async fn delay_ns(&mut self, _ns: u32) {}

    async fn delay_ms(&mut self, ms: u32) {
        self.ms.push(ms);
    }
}
