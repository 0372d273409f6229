//! Turns `ping` output into a [`MetricsRecord`].
//!
//! Parsing is total: empty output, DNS failures and unknown formats all
//! become a record with 100% loss and no latency data.

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;

use super::types::MetricsRecord;

/// `3 packets transmitted, 3 received, 0% packet loss`
static PACKET_LOSS_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([0-9.]+)% packet loss").expect("Invalid packet loss regex"));

/// BSD/macOS: `round-trip min/avg/max/stddev = 9.713/11.739/13.595/1.849 ms`
/// Linux:     `rtt min/avg/max/mdev = 8.106/8.247/8.387/0.106 ms`
static SUMMARY_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?:round-trip|rtt) min/avg/max/(?:stddev|mdev) = ([0-9.]+|nan)/([0-9.]+|nan)/([0-9.]+|nan)/([0-9.]+|nan) ms",
    )
    .expect("Invalid summary regex")
});

/// Parse ping output, stamping the record with the current time.
pub fn parse_ping_output(output: &str) -> MetricsRecord {
    parse_ping_output_at(output, Utc::now())
}

/// Parse ping output for a round that completed at `completed_at`.
pub fn parse_ping_output_at(output: &str, completed_at: DateTime<Utc>) -> MetricsRecord {
    let packet_loss = parse_packet_loss(output);

    // Without a summary no reply was measured, whatever the loss line says.
    match parse_summary(output) {
        Some(latency) => MetricsRecord::with_latency(completed_at, latency, packet_loss),
        None => MetricsRecord::unreachable(completed_at),
    }
}

/// Loss percentage, or 100 when the output does not state one.
fn parse_packet_loss(output: &str) -> f64 {
    PACKET_LOSS_REGEX
        .captures(output)
        .and_then(|caps| caps[1].parse::<f64>().ok())
        .filter(|loss| loss.is_finite())
        .map(|loss| loss.clamp(0.0, 100.0))
        .unwrap_or(100.0)
}

/// min/avg/max/spread in that order.
///
/// `nan` shows up as the spread when a single reply arrived. It, and any
/// field that matched the summary shape but does not parse (`2.0.0`), is
/// stored as 0.0 so a round with replies always keeps its latency.
fn parse_summary(output: &str) -> Option<[f64; 4]> {
    let caps = SUMMARY_REGEX.captures(output)?;

    let mut fields = [0.0; 4];
    for (slot, idx) in fields.iter_mut().zip(1..=4) {
        *slot = caps[idx].parse::<f64>().ok().filter(|v| !v.is_nan()).unwrap_or(0.0);
    }

    Some(fields)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const MACOS_OUTPUT: &str = "PING 8.8.8.8 (8.8.8.8): 56 data bytes
64 bytes from 8.8.8.8: icmp_seq=0 ttl=118 time=10.234 ms
64 bytes from 8.8.8.8: icmp_seq=1 ttl=118 time=11.456 ms
64 bytes from 8.8.8.8: icmp_seq=2 ttl=118 time=9.789 ms

--- 8.8.8.8 ping statistics ---
3 packets transmitted, 3 packets received, 0.0% packet loss
round-trip min/avg/max/stddev = 9.789/10.493/11.456/0.693 ms";

    const LINUX_OUTPUT: &str = "PING google.com (172.217.168.206) 56(84) bytes of data.
64 bytes from ams16s32-in-f14.1e100.net (172.217.168.206): icmp_seq=1 ttl=118 time=8.39 ms
64 bytes from ams16s32-in-f14.1e100.net (172.217.168.206): icmp_seq=2 ttl=118 time=8.30 ms
64 bytes from ams16s32-in-f14.1e100.net (172.217.168.206): icmp_seq=3 ttl=118 time=8.11 ms
64 bytes from ams16s32-in-f14.1e100.net (172.217.168.206): icmp_seq=4 ttl=118 time=8.20 ms

--- google.com ping statistics ---
4 packets transmitted, 4 received, 0% packet loss, time 3004ms
rtt min/avg/max/mdev = 8.106/8.247/8.387/0.106 ms";

    const TOTAL_LOSS_OUTPUT: &str = "PING 8.8.8.8 (8.8.8.8): 56 data bytes
Request timeout for icmp_seq 0

--- 8.8.8.8 ping statistics ---
3 packets transmitted, 0 packets received, 100.0% packet loss";

    const SINGLE_REPLY_OUTPUT: &str = "PING 10.0.0.1 (10.0.0.1): 56 data bytes
Request timeout for icmp_seq 0
Request timeout for icmp_seq 1
64 bytes from 10.0.0.1: icmp_seq=2 ttl=64 time=12.345 ms
Request timeout for icmp_seq 3

--- 10.0.0.1 ping statistics ---
5 packets transmitted, 1 packets received, 80.0% packet loss
round-trip min/avg/max/stddev = 12.345/12.345/12.345/nan ms";

    fn assert_no_latency(record: &MetricsRecord) {
        assert_eq!(record.min, None);
        assert_eq!(record.avg, None);
        assert_eq!(record.max, None);
        assert_eq!(record.stddev, None);
        assert!(!record.has_latency());
    }

    #[test]
    fn test_parse_macos_output() {
        let record = parse_ping_output(MACOS_OUTPUT);

        assert_eq!(record.packet_loss, 0.0);
        assert_eq!(record.min, Some(9.789));
        assert_eq!(record.avg, Some(10.493));
        assert_eq!(record.max, Some(11.456));
        assert_eq!(record.stddev, Some(0.693));
    }

    #[test]
    fn test_parse_linux_output() {
        let record = parse_ping_output(LINUX_OUTPUT);

        assert_eq!(record.packet_loss, 0.0);
        assert_eq!(record.min, Some(8.106));
        assert_eq!(record.avg, Some(8.247));
        assert_eq!(record.max, Some(8.387));
        assert_eq!(record.stddev, Some(0.106));
    }

    #[test]
    fn test_parse_whole_numbers() {
        let output = "3 packets transmitted, 3 packets received, 0.0% packet loss
round-trip min/avg/max/stddev = 9.0/10.0/11.0/1.0 ms";
        let record = parse_ping_output(output);

        assert_eq!(record.min, Some(9.0));
        assert_eq!(record.avg, Some(10.0));
        assert_eq!(record.max, Some(11.0));
        assert_eq!(record.stddev, Some(1.0));
    }

    #[test]
    fn test_total_loss_has_no_latency() {
        let record = parse_ping_output(TOTAL_LOSS_OUTPUT);

        assert_eq!(record.packet_loss, 100.0);
        assert_no_latency(&record);
    }

    #[test]
    fn test_empty_output_is_total_loss() {
        let record = parse_ping_output("");

        assert_eq!(record.packet_loss, 100.0);
        assert_no_latency(&record);
    }

    #[test]
    fn test_unresolvable_host_is_total_loss() {
        for output in [
            "ping: cannot resolve nosuchhost.invalid: Unknown host",
            "ping: nosuchhost.invalid: Name or service not known",
        ] {
            let record = parse_ping_output(output);
            assert_eq!(record.packet_loss, 100.0);
            assert_no_latency(&record);
        }
    }

    #[test]
    fn test_garbage_is_total_loss() {
        let record = parse_ping_output("\u{0}\u{1}garbage 42 ms / / / % loss");

        assert_eq!(record.packet_loss, 100.0);
        assert_no_latency(&record);
    }

    #[test]
    fn test_nan_spread_with_partial_loss() {
        let record = parse_ping_output(SINGLE_REPLY_OUTPUT);

        assert_eq!(record.packet_loss, 80.0);
        assert_eq!(record.min, Some(12.345));
        assert_eq!(record.avg, Some(12.345));
        assert_eq!(record.max, Some(12.345));
        assert_eq!(record.stddev, Some(0.0));
    }

    #[test]
    fn test_linux_partial_loss_with_errors() {
        let output = "--- 1.1.1.1 ping statistics ---
5 packets transmitted, 3 received, +2 errors, 40% packet loss, time 4005ms
rtt min/avg/max/mdev = 14.201/15.002/16.110/0.811 ms, pipe 2";
        let record = parse_ping_output(output);

        assert_eq!(record.packet_loss, 40.0);
        assert_eq!(record.min, Some(14.201));
        assert_eq!(record.stddev, Some(0.811));
    }

    #[test]
    fn test_summary_without_loss_line_defaults_loss() {
        let record = parse_ping_output("rtt min/avg/max/mdev = 1.0/2.0/3.0/0.5 ms");

        assert_eq!(record.packet_loss, 100.0);
        assert_eq!(record.avg, Some(2.0));
    }

    #[test]
    fn test_malformed_summary_field_becomes_zero() {
        let output = "3 packets transmitted, 3 received, 0% packet loss
rtt min/avg/max/mdev = 1.0/2.0.0/3.0/. ms";
        let record = parse_ping_output(output);

        assert_eq!(record.packet_loss, 0.0);
        assert_eq!(record.min, Some(1.0));
        assert_eq!(record.avg, Some(0.0));
        assert_eq!(record.max, Some(3.0));
        assert_eq!(record.stddev, Some(0.0));
    }

    #[test]
    fn test_missing_latency_implies_total_loss() {
        for output in [
            "",
            "3 packets transmitted, 3 received, 0% packet loss",
            "3 packets transmitted, 3 received, 0% packet loss\nrtt min/avg/max/mdev = 1.0/2.0.0/3.0/. ms",
            "ping: cannot resolve nowhere.invalid: Unknown host",
        ] {
            let record = parse_ping_output(output);
            if !record.has_latency() {
                assert_eq!(record.packet_loss, 100.0, "{output:?}");
            }
        }
    }

    #[test]
    fn test_timestamp_is_completion_time() {
        let completed_at = Utc.with_ymd_and_hms(2025, 10, 19, 12, 0, 0).unwrap();
        let record = parse_ping_output_at(MACOS_OUTPUT, completed_at);

        assert_eq!(record.timestamp, completed_at);
    }
}
