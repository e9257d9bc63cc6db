//! Serial port channel (115200 8N1, DTR/RTS held low).

use std::io::{self, Read, Write};
use std::time::Duration;

use serialport::{ClearBuffer, DataBits, FlowControl, Parity, SerialPort, StopBits};
use tracing::debug;

use crate::conn::{Channel, DEFAULT_TIMEOUT};

/// Controller UART speed.
pub const BAUD_RATE: u32 = 115_200;

/// A [`Channel`] backed by a local serial port.
pub struct SerialChannel {
    port_name: String,
    timeout: Duration,
    port: Option<Box<dyn SerialPort>>,
}

impl SerialChannel {
    /// Create a closed channel for `port_name` (e.g. `/dev/ttyUSB0`, `COM3`).
    pub fn new(port_name: impl Into<String>) -> Self {
        Self {
            port_name: port_name.into(),
            timeout: DEFAULT_TIMEOUT,
            port: None,
        }
    }

    pub fn port_name(&self) -> &str {
        &self.port_name
    }

    fn port(&mut self) -> io::Result<&mut Box<dyn SerialPort>> {
        self.port
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "serial port not open"))
    }
}

impl Channel for SerialChannel {
    fn open(&mut self) -> io::Result<()> {
        if self.port_name.is_empty() {
            return Err(io::Error::new(io::ErrorKind::InvalidInput, "no serial port configured"));
        }
        debug!(port = %self.port_name, baud = BAUD_RATE, "opening serial port");
        let mut port = serialport::new(&self.port_name, BAUD_RATE)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(self.timeout)
            .open()?;
        // The controller resets on DTR.
        port.write_data_terminal_ready(false)?;
        port.write_request_to_send(false)?;
        self.port = Some(port);
        Ok(())
    }

    fn close(&mut self) -> io::Result<()> {
        if let Some(port) = self.port.take() {
            debug!(port = %self.port_name, "closing serial port");
            drop(port);
        }
        Ok(())
    }

    fn set_timeout(&mut self, timeout: Duration) -> io::Result<()> {
        self.timeout = timeout;
        if let Some(port) = self.port.as_mut() {
            port.set_timeout(timeout)?;
        }
        Ok(())
    }

    fn clear_buffers(&mut self) -> io::Result<()> {
        self.port()?.clear(ClearBuffer::All)?;
        Ok(())
    }

    fn send(&mut self, bytes: &[u8]) -> io::Result<()> {
        let port = self.port()?;
        port.write_all(bytes)?;
        port.flush()
    }

    fn receive(&mut self, count: usize) -> io::Result<Vec<u8>> {
        let mut buf = vec![0u8; count];
        match self.port()?.read_exact(&mut buf) {
            Ok(()) => Ok(buf),
            // A read of zero bytes under a timeout means the device went quiet.
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                Err(io::Error::new(io::ErrorKind::TimedOut, e))
            }
            Err(e) => Err(e),
        }
    }
}

/// Names of serial ports present on this machine.
pub fn available_ports() -> io::Result<Vec<String>> {
    Ok(serialport::available_ports()?
        .into_iter()
        .map(|p| p.port_name)
        .collect())
}
