//! Peak analysis for loudness normalization.
//!
//! [`AudioProperty::analyze`] samples a seekable stream at evenly spaced
//! probes, finds the loudest sample and derives a normalization factor that
//! brings that peak to full scale. Results are memoized, and
//! [`AudioProperties`] keys them by caller-chosen names so each asset is
//! scanned once.

use std::collections::HashMap;
use std::io::{self, Read, Seek, SeekFrom};

use crate::core::{AudioBuffer, aligned};
use crate::error::Result;

/// Bytes read at each probe.
pub const PROBE_WINDOW_BYTES: usize = 512;

/// Probe count used when a scan count of 0 is requested.
pub const DEFAULT_SCAN_COUNT: usize = 16;

/// Outcome of a stream analysis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnalysisResult {
    /// Largest absolute sample value seen across all probes.
    pub peak: f64,
    /// Gain that brings `peak` to 1.0; 1.0 for a silent stream.
    pub normalization: f64,
}

/// Memoized analysis of one stream.
#[derive(Debug, Clone, Default)]
pub struct AudioProperty {
    result: Option<AnalysisResult>,
}

impl AudioProperty {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scans `source` with `scan_count` evenly spaced probes and returns the
    /// result, or the memoized result from an earlier call.
    ///
    /// A `scan_count` of 0 means [`DEFAULT_SCAN_COUNT`]. More probes are more
    /// accurate and slower. The stream is rewound to position 0 before this
    /// returns, including when scanning fails.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::io::Cursor;
    /// use soundstack::{AudioProperty, encode_frames};
    ///
    /// let mut pcm = Cursor::new(encode_frames(&[(0.5, -0.25); 1024]));
    /// let result = AudioProperty::new().analyze(&mut pcm, 0).unwrap();
    /// assert!((result.normalization - 2.0).abs() < 1e-3);
    /// assert_eq!(pcm.position(), 0);
    /// ```
    pub fn analyze<S>(&mut self, source: &mut S, scan_count: usize) -> Result<AnalysisResult>
    where
        S: Read + Seek + ?Sized,
    {
        if let Some(result) = self.result {
            log::debug!("analysis: memo hit, normalization {:.4}", result.normalization);
            return Ok(result);
        }

        let scan_count = if scan_count == 0 { DEFAULT_SCAN_COUNT } else { scan_count };
        let scanned = scan_peak(source, scan_count);
        let rewound = source.seek(SeekFrom::Start(0));
        let peak = scanned?;
        rewound?;

        let normalization = if peak > 0.0 {
            1.0 / peak
        } else {
            log::warn!("analysis: stream is silent, leaving normalization at 1.0");
            1.0
        };
        let result = AnalysisResult { peak, normalization };
        log::debug!(
            "analysis: peak {peak:.4} over {scan_count} probes, normalization {normalization:.4}"
        );

        self.result = Some(result);
        Ok(result)
    }

    pub fn result(&self) -> Option<AnalysisResult> {
        self.result
    }

    pub fn is_analyzed(&self) -> bool {
        self.result.is_some()
    }

    /// Forgets the memoized result so the next `analyze` rescans.
    pub fn reset(&mut self) {
        self.result = None;
    }
}

/// Stream length in bytes. Sources that cannot seek from the end (endless
/// loops, some decoders) report how far a seek to the largest offset got.
fn stream_len<S: Seek + ?Sized>(source: &mut S) -> io::Result<u64> {
    match source.seek(SeekFrom::End(0)) {
        Ok(len) => Ok(len),
        Err(err) => {
            log::warn!("analysis: end seek failed ({err}), probing with a far seek");
            source.seek(SeekFrom::Start(i64::MAX as u64))
        }
    }
}

/// Reads until `window` is full or the stream ends.
fn read_window<S: Read + ?Sized>(source: &mut S, window: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < window.len() {
        match source.read(&mut window[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
            Err(err) => return Err(err),
        }
    }
    Ok(filled)
}

fn scan_peak<S: Read + Seek + ?Sized>(source: &mut S, scan_count: usize) -> io::Result<f64> {
    let len = stream_len(source)?;
    let mut window = [0u8; PROBE_WINDOW_BYTES];
    let mut peak = 0.0_f64;

    for probe in 0..scan_count as u64 {
        let offset = (u128::from(len) * u128::from(probe) / scan_count as u128) as u64;
        let offset = offset - offset % crate::core::BYTES_PER_FRAME as u64;
        if probe > 0 && offset >= len {
            break;
        }

        source.seek(SeekFrom::Start(offset))?;
        let filled = read_window(source, &mut window)?;
        let audio = AudioBuffer::new(&mut window[..aligned(filled)]);
        for i in 0..audio.len() {
            let (l, r) = audio.get(i);
            peak = peak.max(l.abs()).max(r.abs());
        }
    }

    log::trace!("analysis: scanned {len} bytes");
    Ok(peak)
}

/// Memoized analyses keyed by name.
#[derive(Debug, Clone, Default)]
pub struct AudioProperties {
    properties: HashMap<String, AudioProperty>,
}

impl AudioProperties {
    pub fn new() -> Self {
        Self::default()
    }

    /// Property stored under `key`, created empty on first access.
    pub fn get(&mut self, key: &str) -> &mut AudioProperty {
        self.properties.entry(key.to_owned()).or_default()
    }

    /// Analyzes `source` under `key`, reusing an earlier result.
    pub fn analyze<S>(
        &mut self,
        key: &str,
        source: &mut S,
        scan_count: usize,
    ) -> Result<AnalysisResult>
    where
        S: Read + Seek + ?Sized,
    {
        self.get(key).analyze(source, scan_count)
    }

    pub fn remove(&mut self, key: &str) -> Option<AudioProperty> {
        self.properties.remove(key)
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::encode_frames;
    use crate::error::Error;
    use std::io::Cursor;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-3
    }

    /// Cursor that refuses end seeks and read failures on demand.
    struct Awkward {
        inner: Cursor<Vec<u8>>,
        fail_reads: bool,
    }

    impl Read for Awkward {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.fail_reads {
                return Err(io::Error::other("bad sector"));
            }
            self.inner.read(buf)
        }
    }

    impl Seek for Awkward {
        fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
            match pos {
                SeekFrom::End(_) => Err(io::Error::new(io::ErrorKind::Unsupported, "endless")),
                SeekFrom::Start(n) => {
                    let len = self.inner.get_ref().len() as u64;
                    self.inner.seek(SeekFrom::Start(n.min(len)))
                }
                other => self.inner.seek(other),
            }
        }
    }

    #[test]
    fn test_peak_found_late_in_stream() {
        let mut frames = vec![(0.1, 0.1); 4096];
        // Probe 15 of 16 starts at frame 3840
        frames[3840] = (0.2, -0.8);
        let mut pcm = Cursor::new(encode_frames(&frames));
        let result = AudioProperty::new().analyze(&mut pcm, 16).unwrap();
        assert!(approx_eq(result.peak, 0.8));
        assert!(approx_eq(result.normalization, 1.25));
    }

    #[test]
    fn test_memoized() {
        let mut property = AudioProperty::new();
        let mut loud = Cursor::new(encode_frames(&[(0.5, 0.5); 64]));
        let first = property.analyze(&mut loud, 4).unwrap();

        let mut quiet = Cursor::new(encode_frames(&[(0.25, 0.25); 64]));
        assert_eq!(property.analyze(&mut quiet, 4).unwrap(), first);

        property.reset();
        assert!(!property.is_analyzed());
        let rescanned = property.analyze(&mut quiet, 4).unwrap();
        assert!(approx_eq(rescanned.normalization, 4.0));
        assert_eq!(property.result(), Some(rescanned));
    }

    #[test]
    fn test_silent_stream_normalizes_to_unity() {
        let mut pcm = Cursor::new(vec![0u8; 2048]);
        let result = AudioProperty::new().analyze(&mut pcm, 0).unwrap();
        assert_eq!(result.normalization, 1.0);
        assert_eq!(result.peak, 0.0);
    }

    #[test]
    fn test_empty_stream() {
        let mut pcm = Cursor::new(Vec::<u8>::new());
        let result = AudioProperty::new().analyze(&mut pcm, 8).unwrap();
        assert_eq!(result.normalization, 1.0);
    }

    #[test]
    fn test_far_seek_fallback() {
        let mut source = Awkward {
            inner: Cursor::new(encode_frames(&[(0.4, 0.4); 2000])),
            fail_reads: false,
        };
        let result = AudioProperty::new().analyze(&mut source, 8).unwrap();
        assert!(approx_eq(result.normalization, 2.5));
        assert_eq!(source.inner.position(), 0);
    }

    #[test]
    fn test_rewinds_on_error() {
        let mut source = Awkward {
            inner: Cursor::new(vec![0u8; 1024]),
            fail_reads: true,
        };
        let mut property = AudioProperty::new();
        let err = property.analyze(&mut source, 4).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
        assert_eq!(source.inner.position(), 0);
        assert!(!property.is_analyzed());
    }

    #[test]
    fn test_properties_keyed_by_name() {
        let mut properties = AudioProperties::new();
        let mut a = Cursor::new(encode_frames(&[(0.5, 0.5); 32]));
        let mut b = Cursor::new(encode_frames(&[(0.25, 0.25); 32]));

        let ra = properties.analyze("a", &mut a, 0).unwrap();
        let rb = properties.analyze("b", &mut b, 0).unwrap();
        assert!(approx_eq(ra.normalization, 2.0));
        assert!(approx_eq(rb.normalization, 4.0));
        assert_eq!(properties.len(), 2);

        // Memoized under the key, whatever stream is passed
        assert_eq!(properties.analyze("a", &mut b, 0).unwrap(), ra);
        assert!(properties.remove("a").is_some());
        assert!(!properties.get("a").is_analyzed());
    }
}
