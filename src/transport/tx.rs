//! Transmit-side framing.

use crate::acquisition::Settle;
use crate::config;

/// Something that can send one packet of at most `config::usb::BULK_PACKET_SIZE` bytes.
pub trait PacketWriter {
    type Error;

    /// Send `packet`, returning how many bytes were accepted.
    /// Must not block: a full endpoint is reported as an error.
    fn write_packet(&mut self, packet: &[u8]) -> Result<usize, Self::Error>;
}

/// Send `bytes` as a sequence of `config::usb::TX_FRAME_LEN`-byte frames.
///
/// Stops at the first frame which is not fully accepted,
/// and returns the number of bytes sent up to that point.
pub fn send_frames<W: PacketWriter>(writer: &mut W, bytes: &[u8]) -> usize {
    let mut sent = 0;
    for frame in bytes.chunks(config::usb::TX_FRAME_LEN) {
        match writer.write_packet(frame) {
            Ok(n) if n == frame.len() => sent += n,
            Ok(n) => {
                sent += n;
                break;
            }
            Err(_) => break,
        }
    }
    sent
}

/// Offer the unsent rest of `bytes` to `send` until all of it is accepted,
/// settling for `config::usb::TX_RETRY_INTERVAL` between attempts.
///
/// Gives up after `config::usb::TX_ATTEMPTS` attempts, returning how many bytes were accepted.
pub fn send_with_retry<S, F>(bytes: &[u8], settle: &mut S, mut send: F) -> usize
where
    S: Settle,
    F: FnMut(&[u8]) -> usize,
{
    let mut sent = 0;
    for attempt in 0..config::usb::TX_ATTEMPTS {
        if attempt > 0 {
            settle.settle(config::usb::TX_RETRY_INTERVAL);
        }
        sent += send(&bytes[sent..]);
        if sent == bytes.len() {
            break;
        }
    }
    sent
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::SimDelay;

    const FRAME: usize = config::usb::TX_FRAME_LEN;

    /// Accepts `capacity` packets, then reports a full endpoint.
    struct Endpoint {
        frames: std::vec::Vec<std::vec::Vec<u8>>,
        capacity: usize,
    }

    impl Endpoint {
        fn new(capacity: usize) -> Self {
            Self {
                frames: vec![],
                capacity,
            }
        }
    }

    impl PacketWriter for Endpoint {
        type Error = ();

        fn write_packet(&mut self, packet: &[u8]) -> Result<usize, ()> {
            assert!(packet.len() <= usize::from(config::usb::BULK_PACKET_SIZE));
            if self.frames.len() == self.capacity {
                return Err(());
            }
            self.frames.push(packet.to_vec());
            Ok(packet.len())
        }
    }

    #[test]
    fn splits_into_frames() {
        let data: std::vec::Vec<u8> = (0..200).map(|i| i as u8).collect();
        let mut ep = Endpoint::new(usize::MAX);
        assert_eq!(send_frames(&mut ep, &data), 200);
        assert_eq!(ep.frames.len(), (200 + FRAME - 1) / FRAME);
        assert!(ep.frames[..3].iter().all(|f| f.len() == FRAME));
        assert_eq!(ep.frames[3].len(), 200 - 3 * FRAME);
        assert_eq!(ep.frames.concat(), data);
    }

    #[test]
    fn exact_multiple_needs_no_extra_frame() {
        let mut ep = Endpoint::new(usize::MAX);
        assert_eq!(send_frames(&mut ep, &[7; 2 * FRAME]), 2 * FRAME);
        assert_eq!(ep.frames.len(), 2);
    }

    #[test]
    fn failed_frame_reports_partial_progress() {
        for k in 1..=4 {
            let mut ep = Endpoint::new(k - 1);
            assert_eq!(send_frames(&mut ep, &[1; 4 * FRAME + 10]), (k - 1) * FRAME);
        }
    }

    #[test]
    fn short_write_stops_sending() {
        struct Half(usize);
        impl PacketWriter for Half {
            type Error = ();
            fn write_packet(&mut self, packet: &[u8]) -> Result<usize, ()> {
                self.0 += 1;
                Ok(packet.len() / 2)
            }
        }

        let mut w = Half(0);
        assert_eq!(send_frames(&mut w, &[0; 3 * FRAME]), FRAME / 2);
        assert_eq!(w.0, 1);
    }

    #[test]
    fn empty_input_sends_nothing() {
        let mut ep = Endpoint::new(usize::MAX);
        assert_eq!(send_frames(&mut ep, &[]), 0);
        assert!(ep.frames.is_empty());
    }

    #[test]
    fn retry_resumes_where_the_last_attempt_stopped() {
        let mut delay = SimDelay::default();
        let mut offered = std::vec::Vec::new();
        let mut budgets = [0, 3, 0, usize::MAX].into_iter();

        let sent = send_with_retry(b"0123456789", &mut delay, |rest: &[u8]| {
            offered.push(rest.to_vec());
            rest.len().min(budgets.next().unwrap())
        });

        assert_eq!(sent, 10);
        assert_eq!(
            offered,
            [
                &b"0123456789"[..],
                &b"0123456789"[..],
                &b"3456789"[..],
                &b"3456789"[..],
            ]
        );
        assert_eq!(
            delay.elapsed_us(),
            3 * config::usb::TX_RETRY_INTERVAL.to_micros()
        );
    }

    #[test]
    fn retry_gives_up_after_bounded_attempts() {
        let mut delay = SimDelay::default();
        let mut attempts = 0;

        let sent = send_with_retry(b"abc", &mut delay, |_: &[u8]| {
            attempts += 1;
            0
        });

        assert_eq!(sent, 0);
        assert_eq!(attempts, config::usb::TX_ATTEMPTS);
        assert_eq!(
            delay.elapsed_us(),
            (config::usb::TX_ATTEMPTS - 1) * config::usb::TX_RETRY_INTERVAL.to_micros()
        );
    }

    #[test]
    fn retry_sends_once_when_accepted() {
        let mut delay = SimDelay::default();
        assert_eq!(send_with_retry(b"ok", &mut delay, |rest: &[u8]| rest.len()), 2);
        assert_eq!(delay.elapsed_us(), 0);
    }
}
