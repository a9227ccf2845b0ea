//! Human-readable time formatting for log and CLI output

/// Format a duration in seconds as `X.XXs`, `M:SS.XXs` or `H:MM:SS.XX`
///
/// Negative values keep their sign; they only show up in error messages.
///
/// ```
/// use vatl_common::human_time::format_seconds;
///
/// assert_eq!(format_seconds(4.5), "4.50s");
/// assert_eq!(format_seconds(125.25), "2:05.25s");
/// assert_eq!(format_seconds(3725.0), "1:02:05.00");
/// ```
pub fn format_seconds(seconds: f64) -> String {
    let sign = if seconds < 0.0 { "-" } else { "" };
    let abs = seconds.abs();

    let formatted = if abs < 60.0 {
        format!("{:.2}s", abs)
    } else if abs < 3600.0 {
        let minutes = (abs / 60.0).floor();
        format!("{}:{:05.2}s", minutes as u64, abs - minutes * 60.0)
    } else {
        let hours = (abs / 3600.0).floor();
        let rest = abs - hours * 3600.0;
        let minutes = (rest / 60.0).floor();
        format!("{}:{:02}:{:05.2}", hours as u64, minutes as u64, rest - minutes * 60.0)
    };

    format!("{}{}", sign, formatted)
}

/// Format a frame count at a sample rate, e.g. `132300 @ 44100Hz (3.00s)`
pub fn format_frames(frames: usize, sample_rate: u32) -> String {
    let seconds = if sample_rate == 0 {
        0.0
    } else {
        frames as f64 / sample_rate as f64
    };
    format!("{} @ {}Hz ({})", frames, sample_rate, format_seconds(seconds))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_format() {
        assert_eq!(format_seconds(0.0), "0.00s");
        assert_eq!(format_seconds(59.994), "59.99s");
    }

    #[test]
    fn test_negative() {
        assert_eq!(format_seconds(-1.5), "-1.50s");
    }

    #[test]
    fn test_frames() {
        assert_eq!(format_frames(132300, 44100), "132300 @ 44100Hz (3.00s)");
        assert_eq!(format_frames(10, 0), "10 @ 0Hz (0.00s)");
    }
}
