//! Capture files: one advertisement per line, `<hex payload> <rssi>`.
//! Blank lines and lines starting with `#` are skipped.

use futures::Stream;
use log::warn;
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt as _};

use crate::messages::Advertisement;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InputError {
    #[error("odd number of hex digits")]
    OddLength,
    #[error("invalid hex digit {0:?}")]
    InvalidDigit(char),
    #[error("missing rssi")]
    MissingRssi,
    #[error("invalid rssi {0:?}")]
    InvalidRssi(String),
    #[error("unexpected trailing field {0:?}")]
    TrailingField(String),
}

/// Parse hex bytes, with an optional `0x` prefix and `:`/`-` separators.
pub fn parse_hex(text: &str) -> Result<Vec<u8>, InputError> {
    let text = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text);

    let digits: String = text.chars().filter(|c| *c != ':' && *c != '-').collect();

    hex::decode(digits).map_err(|err| match err {
        hex::FromHexError::InvalidHexCharacter { c, .. } => InputError::InvalidDigit(c),
        hex::FromHexError::OddLength | hex::FromHexError::InvalidStringLength => {
            InputError::OddLength
        }
    })
}

pub fn parse_line(line: &str) -> Result<Option<Advertisement>, InputError> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let mut fields = line.split_whitespace();
    let payload = match fields.next() {
        Some(hex) => parse_hex(hex)?,
        None => return Ok(None),
    };
    let rssi = fields.next().ok_or(InputError::MissingRssi)?;
    let rssi = rssi
        .parse::<i16>()
        .map_err(|_| InputError::InvalidRssi(rssi.to_string()))?;
    if let Some(extra) = fields.next() {
        return Err(InputError::TrailingField(extra.to_string()));
    }

    Ok(Some(Advertisement { payload, rssi }))
}

/// Stream the advertisements of a capture. Malformed lines are logged and
/// skipped; the stream ends at EOF or on a read error.
pub fn advertisements<R>(reader: R) -> impl Stream<Item = Advertisement>
where
    R: AsyncBufRead + Unpin,
{
    futures::stream::unfold((reader.lines(), 0usize), |(mut lines, mut number)| async move {
        loop {
            number += 1;
            let line = match lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => return None,
                Err(err) => {
                    warn!("Error reading advertisements: {}", err);
                    return None;
                }
            };
            match parse_line(&line) {
                Ok(Some(advertisement)) => return Some((advertisement, (lines, number))),
                Ok(None) => {}
                Err(err) => warn!("Skipping line {}: {}", number, err),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::FrameBuilder;
    use futures::StreamExt as _;

    #[test]
    fn test_parse_hex() {
        assert_eq!(parse_hex("5d0101").unwrap(), vec![0x5D, 0x01, 0x01]);
        assert_eq!(parse_hex("0xAbCd").unwrap(), vec![0xAB, 0xCD]);
        assert_eq!(parse_hex("aa:bb-cc").unwrap(), vec![0xAA, 0xBB, 0xCC]);
        assert_eq!(parse_hex("").unwrap(), Vec::<u8>::new());
        assert_eq!(parse_hex("abc"), Err(InputError::OddLength));
        assert_eq!(parse_hex("zz"), Err(InputError::InvalidDigit('z')));
        assert_eq!(parse_hex("5d:0g"), Err(InputError::InvalidDigit('g')));
        assert_eq!(parse_hex("0x5d-01:01"), Ok(vec![0x5D, 0x01, 0x01]));
    }

    #[test]
    fn test_parse_line() {
        let hex = FrameBuilder::default().hex();
        let advertisement = parse_line(&format!("  {} -65 ", hex)).unwrap().unwrap();
        assert_eq!(advertisement.payload, FrameBuilder::default().build());
        assert_eq!(advertisement.rssi, -65);

        assert_eq!(parse_line(""), Ok(None));
        assert_eq!(parse_line("# captured in the kitchen"), Ok(None));
        assert_eq!(parse_line("5d01"), Err(InputError::MissingRssi));
        assert_eq!(
            parse_line("5d01 loud"),
            Err(InputError::InvalidRssi("loud".to_string()))
        );
        assert_eq!(
            parse_line("5d01 -40 37"),
            Err(InputError::TrailingField("37".to_string()))
        );
    }

    #[tokio::test]
    async fn test_advertisements_skip_bad_lines() {
        let hex = FrameBuilder::default().hex();
        let capture = format!("# capture\n{hex} -65\nnot-hex -65\n\n{hex} 127\n");

        let collected: Vec<Advertisement> = advertisements(capture.as_bytes()).collect().await;
        assert_eq!(collected.len(), 2);
        assert_eq!(collected[0].rssi, -65);
        assert_eq!(collected[1].rssi, 127);
    }
}
