use anyhow::{anyhow, Context, Result};
use std::io::{self, Read, Write};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, SyncSender};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{debug, error, trace, warn};

use crate::config::Config;

/// Byte stream to the display.
///
/// Besides writing messages, a link can hand back whatever the device has
/// sent in reply so far, without blocking.
pub trait Link: Write + Send {
    fn pending_reply(&mut self) -> io::Result<Vec<u8>> {
        Ok(Vec::new())
    }
}

impl Link for Box<dyn serialport::SerialPort> {
    fn pending_reply(&mut self) -> io::Result<Vec<u8>> {
        let available = self.bytes_to_read()? as usize;
        if available == 0 {
            return Ok(Vec::new());
        }
        let mut buf = vec![0u8; available];
        let n = self.read(&mut buf)?;
        buf.truncate(n);
        Ok(buf)
    }
}

/// Ordered message writer with a dedicated worker thread.
///
/// Messages are written one at a time, each flushed before the next is
/// taken, in exactly the order they were sent. Nothing is ever dropped:
/// `send` blocks while the worker is busy.
pub struct Output {
    name: String,
    sender: Option<SyncSender<Vec<u8>>>,
    messages_sent: Arc<AtomicU64>,
    worker_handle: Option<thread::JoinHandle<Result<()>>>,
}

impl Output {
    /// Open the configured serial port and start the writer
    pub fn open(config: &Config) -> Result<Self> {
        let port = Self::open_serial_port(&config.device.port, config.device.baud_rate)?;

        debug!(
            port = %config.device.port,
            baud_rate = config.device.baud_rate,
            "opened serial port"
        );

        Ok(Self::with_link(
            config.device.port.clone(),
            port,
            Duration::from_millis(config.message_interval_ms),
        ))
    }

    /// Start a writer over any link
    pub fn with_link<L>(name: String, link: L, interval: Duration) -> Self
    where
        L: Link + 'static,
    {
        // Capacity 1: one message queued while the previous one drains
        let (sender, receiver) = mpsc::sync_channel::<Vec<u8>>(1);
        let messages_sent = Arc::new(AtomicU64::new(0));

        let worker_name = name.clone();
        let worker_messages_sent = Arc::clone(&messages_sent);
        let worker_handle = thread::spawn(move || {
            worker_thread(link, receiver, worker_name, interval, worker_messages_sent)
        });

        Output {
            name,
            sender: Some(sender),
            messages_sent,
            worker_handle: Some(worker_handle),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Queue a message, blocking until the worker can take it
    pub fn send(&mut self, message: Vec<u8>) -> Result<()> {
        let sender = self
            .sender
            .as_ref()
            .ok_or_else(|| anyhow!("output {} is closed", self.name))?;

        if sender.send(message).is_err() {
            // Worker exited early; surface the reason it stopped
            self.finish()?;
            anyhow::bail!("output {} is disconnected", self.name);
        }
        Ok(())
    }

    pub fn messages_sent(&self) -> u64 {
        self.messages_sent.load(Ordering::Relaxed)
    }

    /// Wait for every queued message to be written and stop the worker
    pub fn finish(&mut self) -> Result<()> {
        self.sender.take();

        match self.worker_handle.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| anyhow!("writer thread for {} panicked", self.name))?,
            None => Ok(()),
        }
    }

    fn open_serial_port(name: &str, baud_rate: u32) -> Result<Box<dyn serialport::SerialPort>> {
        let mut port = serialport::new(name, baud_rate)
            .data_bits(serialport::DataBits::Eight)
            .parity(serialport::Parity::None)
            .stop_bits(serialport::StopBits::One)
            .flow_control(serialport::FlowControl::None)
            .open()
            .context(format!("Failed to open serial port {}", name))?;

        port.set_timeout(Duration::from_millis(1000))
            .context("Failed to set serial port timeout")?;

        if let Err(e) = port.write_data_terminal_ready(true) {
            warn!(port = name, "failed to set DTR: {}", e);
        }

        // Allow the link to settle before the first message
        thread::sleep(Duration::from_millis(100));

        Ok(port)
    }
}

impl Drop for Output {
    fn drop(&mut self) {
        if let Err(e) = self.finish() {
            error!(port = %self.name, "output stopped with error: {:#}", e);
        }
    }
}

/// Space-separated lowercase hex
pub fn hex_dump(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Worker thread function - takes messages in order, writes and drains each
fn worker_thread<L: Link>(
    mut link: L,
    receiver: Receiver<Vec<u8>>,
    name: String,
    interval: Duration,
    messages_sent: Arc<AtomicU64>,
) -> Result<()> {
    for message in receiver {
        trace!(port = %name, bytes = message.len(), "sending {}", hex_dump(&message));

        let result = link
            .write_all(&message)
            .and_then(|_| link.flush())
            .with_context(|| format!("Serial error on {}", name));

        if let Err(e) = result {
            error!(port = %name, "{:#}, output is now disconnected", e);
            return Err(e);
        }

        messages_sent.fetch_add(1, Ordering::Relaxed);

        match link.pending_reply() {
            Ok(reply) if !reply.is_empty() => {
                trace!(port = %name, bytes = reply.len(), "received {}", hex_dump(&reply));
            }
            Ok(_) => {}
            Err(e) => debug!(port = %name, "could not read device reply: {}", e),
        }

        if !interval.is_zero() {
            thread::sleep(interval);
        }
    }

    debug!(port = %name, sent = messages_sent.load(Ordering::Relaxed), "writer finished");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex;

    #[derive(Clone, Default)]
    struct SharedBuffer {
        written: Arc<Mutex<Vec<u8>>>,
        reply_polls: Arc<AtomicUsize>,
    }

    impl Link for SharedBuffer {
        fn pending_reply(&mut self) -> io::Result<Vec<u8>> {
            self.reply_polls.fetch_add(1, Ordering::Relaxed);
            Ok(vec![0x01, 0x02])
        }
    }

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.written.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    struct BrokenPipe;

    impl Link for BrokenPipe {}

    impl Write for BrokenPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "link lost"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_messages_written_in_order() {
        let buffer = SharedBuffer::default();
        let mut output = Output::with_link("test".into(), buffer.clone(), Duration::ZERO);

        for i in 0..10u8 {
            output.send(vec![i, i, i]).unwrap();
        }
        output.finish().unwrap();

        let expected: Vec<u8> = (0..10u8).flat_map(|i| [i, i, i]).collect();
        assert_eq!(*buffer.written.lock().unwrap(), expected);
        assert_eq!(output.messages_sent(), 10);
        // the device is polled for a reply after every message
        assert_eq!(buffer.reply_polls.load(Ordering::Relaxed), 10);
    }

    #[test]
    fn test_write_error_is_reported() {
        let mut output = Output::with_link("broken".into(), BrokenPipe, Duration::ZERO);

        // The first send is accepted into the queue; the failure surfaces
        // either on a later send or when finishing.
        let mut failed = false;
        for _ in 0..3 {
            if output.send(vec![1, 2, 3]).is_err() {
                failed = true;
                break;
            }
        }
        if !failed {
            failed = output.finish().is_err();
        }
        assert!(failed);
        assert_eq!(output.messages_sent(), 0);
    }

    #[test]
    fn test_send_after_finish_fails() {
        let mut output = Output::with_link("closed".into(), SharedBuffer::default(), Duration::ZERO);
        output.finish().unwrap();
        assert!(output.send(vec![0]).is_err());
    }

    #[test]
    fn test_hex_dump() {
        assert_eq!(hex_dump(&[0x01, 0xdc, 0x02]), "01 dc 02");
    }
}
