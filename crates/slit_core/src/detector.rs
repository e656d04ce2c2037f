//! Electron detector: fires electrons through the slits and records where they land.

use glam::DVec2;
use rand::distributions::Distribution;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::Normal;
use rayon::prelude::*;
use tracing::{debug, trace};

use crate::config::ExperimentSettings;
use crate::error::{Result, SlitError};
use crate::screen::{ScreenHistogram, XHistogram};
use crate::wavefunction::Wavefunction;
use crate::Scalar;

/// Standard deviation of the vertical beam spread on the screen.
pub const BEAM_SPREAD_STD: Scalar = 1.7;
/// Electrons handled by one worker-local generator in [`Detector::electron_beam_parallel`].
pub const PARALLEL_CHUNK: usize = 4096;

/// Owns one wavefunction, a seeded generator and the log of detections.
#[derive(Debug, Clone)]
pub struct Detector {
    settings: ExperimentSettings,
    wavefunction: Wavefunction,
    beam_spread: Normal<Scalar>,
    rng: ChaCha8Rng,
    seed: Option<u64>,
    detections: Vec<DVec2>,
}

impl Detector {
    /// Builds a detector whose generator is seeded from `settings.seed` (or the default seed).
    pub fn new(settings: ExperimentSettings) -> Result<Self> {
        let seed = settings.resolved_seed();
        Self::build(settings, ChaCha8Rng::seed_from_u64(seed), Some(seed))
    }

    /// Builds a detector around a caller-supplied generator. `settings.seed` is ignored and
    /// [`Detector::seed`] reports `None`.
    pub fn with_rng(settings: ExperimentSettings, rng: ChaCha8Rng) -> Result<Self> {
        Self::build(settings, rng, None)
    }

    fn build(settings: ExperimentSettings, rng: ChaCha8Rng, seed: Option<u64>) -> Result<Self> {
        settings.validate()?;
        let wavefunction = Wavefunction::from_settings(&settings)?;
        let beam_spread = Normal::new(0.0, BEAM_SPREAD_STD)
            .map_err(|err| SlitError::InvalidConfiguration(err.to_string()))?;
        Ok(Self {
            settings,
            wavefunction,
            beam_spread,
            rng,
            seed,
            detections: Vec::new(),
        })
    }

    pub fn settings(&self) -> &ExperimentSettings {
        &self.settings
    }

    /// Direct access to the live settings.
    ///
    /// Changing a physical field here leaves the wavefunction stale: further detections
    /// fail with [`SlitError::ConfigurationStale`] until [`Detector::clear_screen`] runs.
    /// [`Detector::reconfigure`] performs both steps at once.
    pub fn settings_mut(&mut self) -> &mut ExperimentSettings {
        &mut self.settings
    }

    pub fn wavefunction(&self) -> &Wavefunction {
        &self.wavefunction
    }

    /// Seed the generator was built from; `None` for injected generators.
    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    pub fn detections(&self) -> &[DVec2] {
        &self.detections
    }

    pub fn xs(&self) -> Vec<Scalar> {
        self.detections.iter().map(|d| d.x).collect()
    }

    pub fn ys(&self) -> Vec<Scalar> {
        self.detections.iter().map(|d| d.y).collect()
    }

    pub fn len(&self) -> usize {
        self.detections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.detections.is_empty()
    }

    /// Fails when the live settings no longer describe the owned wavefunction.
    pub fn ensure_fresh(&self) -> Result<()> {
        let wf = &self.wavefunction;
        let field = if self.settings.slit_separation != wf.slit_separation() {
            "slit_separation"
        } else if self.settings.screen_distance != wf.screen_distance() {
            "screen_distance"
        } else if self.settings.measure_slits != wf.measure_slits() {
            "measure_slits"
        } else {
            return Ok(());
        };
        Err(SlitError::ConfigurationStale { field })
    }

    /// Fires a single electron through the slits and records its detection.
    pub fn fire_electron(&mut self) -> Result<()> {
        self.ensure_fresh()?;
        self.record_one();
        Ok(())
    }

    /// Fires `num_electrons` electrons one after another.
    pub fn electron_beam(&mut self, num_electrons: usize) -> Result<()> {
        self.ensure_fresh()?;
        self.detections.reserve(num_electrons);
        for _ in 0..num_electrons {
            self.record_one();
        }
        trace!(num_electrons, total = self.detections.len(), "beam finished");
        Ok(())
    }

    /// Fires `num_electrons` electrons across the rayon pool.
    ///
    /// Each chunk of [`PARALLEL_CHUNK`] electrons runs on its own generator seeded from a
    /// single draw of the detector's generator plus the chunk index, and chunks are
    /// appended in order, so the result only depends on the detector's seed.
    pub fn electron_beam_parallel(&mut self, num_electrons: usize) -> Result<()> {
        self.ensure_fresh()?;
        if num_electrons == 0 {
            return Ok(());
        }
        let base_seed: u64 = self.rng.gen();
        let wavefunction = &self.wavefunction;
        let beam_spread = &self.beam_spread;
        let num_chunks = num_electrons.div_ceil(PARALLEL_CHUNK);

        let chunks: Vec<Vec<DVec2>> = (0..num_chunks)
            .into_par_iter()
            .map(|chunk| {
                let mut rng = ChaCha8Rng::seed_from_u64(base_seed.wrapping_add(chunk as u64));
                let len = PARALLEL_CHUNK.min(num_electrons - chunk * PARALLEL_CHUNK);
                (0..len)
                    .map(|_| sample_detection(wavefunction, beam_spread, &mut rng))
                    .collect()
            })
            .collect();

        self.detections.reserve(num_electrons);
        for chunk in chunks {
            self.detections.extend(chunk);
        }
        trace!(
            num_electrons,
            num_chunks,
            total = self.detections.len(),
            "parallel beam finished"
        );
        Ok(())
    }

    /// Clears the screen and rebuilds the wavefunction from the live settings.
    ///
    /// On failure the detector is left untouched.
    pub fn clear_screen(&mut self) -> Result<()> {
        self.settings.validate()?;
        let wavefunction = Wavefunction::from_settings(&self.settings)?;
        self.wavefunction = wavefunction;
        self.detections.clear();
        debug!(settings = ?self.settings, "screen cleared");
        Ok(())
    }

    /// Swaps in new settings, rebuilding the wavefunction and clearing the screen.
    pub fn reconfigure(&mut self, settings: ExperimentSettings) -> Result<()> {
        settings.validate()?;
        let wavefunction = Wavefunction::from_settings(&settings)?;
        self.settings = settings;
        self.wavefunction = wavefunction;
        self.detections.clear();
        debug!(settings = ?self.settings, "detector reconfigured");
        Ok(())
    }

    pub fn screen_histogram(&self) -> ScreenHistogram {
        ScreenHistogram::from_detections(
            &self.detections,
            self.settings.screen_width,
            self.settings.screen_height,
        )
    }

    pub fn x_histogram(&self) -> XHistogram {
        XHistogram::from_values(&self.xs(), self.settings.screen_width)
    }

    fn record_one(&mut self) {
        let detection = sample_detection(&self.wavefunction, &self.beam_spread, &mut self.rng);
        self.detections.push(detection);
    }
}

fn sample_detection<R: Rng + ?Sized>(
    wavefunction: &Wavefunction,
    beam_spread: &Normal<Scalar>,
    rng: &mut R,
) -> DVec2 {
    let x = wavefunction.measure(rng);
    let y = beam_spread.sample(rng);
    DVec2::new(x, y)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded(settings: ExperimentSettings) -> Detector {
        Detector::new(settings.with_seed(0xD0_0B1E)).unwrap()
    }

    #[test]
    fn starts_empty_with_matching_wavefunction() {
        let detector = seeded(ExperimentSettings::default());
        assert!(detector.is_empty());
        assert!(detector.wavefunction().matches(detector.settings()));
        assert_eq!(detector.seed(), Some(0xD0_0B1E));
    }

    #[test]
    fn injected_generator_drives_detections() {
        let settings = ExperimentSettings::default().with_seed(1);
        let mut a = Detector::with_rng(settings.clone(), ChaCha8Rng::seed_from_u64(42)).unwrap();
        let mut b = Detector::with_rng(settings.clone(), ChaCha8Rng::seed_from_u64(42)).unwrap();
        assert_eq!(a.seed(), None);

        a.electron_beam(50).unwrap();
        b.electron_beam(50).unwrap();
        assert_eq!(a.detections(), b.detections());

        // The settings seed plays no part once a generator is injected.
        let mut from_settings = Detector::new(settings).unwrap();
        from_settings.electron_beam(50).unwrap();
        assert_ne!(a.detections(), from_settings.detections());
    }

    #[test]
    fn single_electron_appends_one_detection() {
        let mut detector = seeded(ExperimentSettings::default());
        detector.fire_electron().unwrap();
        detector.fire_electron().unwrap();
        assert_eq!(detector.len(), 2);
        assert_eq!(detector.xs().len(), detector.ys().len());
    }

    #[test]
    fn empty_beam_is_a_no_op() {
        let mut detector = seeded(ExperimentSettings::default());
        detector.electron_beam(0).unwrap();
        detector.electron_beam_parallel(0).unwrap();
        assert!(detector.is_empty());
    }

    #[test]
    fn mutated_settings_are_reported_stale() {
        let mut detector = seeded(ExperimentSettings::default());
        detector.settings_mut().slit_separation = 3.0;
        assert_eq!(
            detector.fire_electron(),
            Err(SlitError::ConfigurationStale {
                field: "slit_separation"
            })
        );
        assert_eq!(
            detector.electron_beam(10),
            Err(SlitError::ConfigurationStale {
                field: "slit_separation"
            })
        );
        assert!(detector.is_empty());

        detector.settings_mut().slit_separation = 1.0;
        detector.settings_mut().screen_distance = 4.0;
        assert!(matches!(
            detector.electron_beam_parallel(10),
            Err(SlitError::ConfigurationStale {
                field: "screen_distance"
            })
        ));

        detector.settings_mut().screen_distance = 10.0;
        detector.settings_mut().measure_slits = true;
        assert!(matches!(
            detector.ensure_fresh(),
            Err(SlitError::ConfigurationStale {
                field: "measure_slits"
            })
        ));
    }

    #[test]
    fn clear_screen_restores_consistency() {
        let mut detector = seeded(ExperimentSettings::default());
        detector.electron_beam(25).unwrap();
        detector.settings_mut().slit_separation = 2.0;
        assert!(detector.fire_electron().is_err());

        detector.clear_screen().unwrap();
        assert!(detector.is_empty());
        assert_eq!(detector.wavefunction().slit_separation(), 2.0);
        detector.fire_electron().unwrap();
        assert_eq!(detector.len(), 1);
    }

    #[test]
    fn failed_clear_keeps_previous_state() {
        let mut detector = seeded(ExperimentSettings::default());
        detector.electron_beam(5).unwrap();
        detector.settings_mut().screen_distance = 0.0;
        assert!(matches!(
            detector.clear_screen(),
            Err(SlitError::InvalidConfiguration(_))
        ));
        assert_eq!(detector.len(), 5);
        assert_eq!(detector.wavefunction().screen_distance(), 10.0);
    }

    #[test]
    fn reconfigure_rebuilds_atomically() {
        let mut detector = seeded(ExperimentSettings::default());
        detector.electron_beam(10).unwrap();
        let collapsed = detector.settings().clone().with_measure_slits(true);
        detector.reconfigure(collapsed).unwrap();
        assert!(detector.is_empty());
        assert!(detector.wavefunction().measure_slits());
        detector.electron_beam(10).unwrap();

        let invalid = detector.settings().clone().with_slit_separation(-1.0);
        assert!(detector.reconfigure(invalid).is_err());
        assert_eq!(detector.len(), 10);
        assert_eq!(detector.settings().slit_separation, 1.0);
    }

    #[test]
    fn same_seed_same_detections() {
        let mut a = seeded(ExperimentSettings::default());
        let mut b = seeded(ExperimentSettings::default());
        a.electron_beam(200).unwrap();
        b.electron_beam(200).unwrap();
        assert_eq!(a.detections(), b.detections());
    }

    #[test]
    fn parallel_beam_is_deterministic() {
        let mut a = seeded(ExperimentSettings::default());
        let mut b = seeded(ExperimentSettings::default());
        let n = PARALLEL_CHUNK * 2 + 17;
        a.electron_beam_parallel(n).unwrap();
        b.electron_beam_parallel(n).unwrap();
        assert_eq!(a.len(), n);
        assert_eq!(a.detections(), b.detections());
    }

    #[test]
    fn histograms_follow_screen_settings() {
        let mut detector = seeded(ExperimentSettings::default());
        detector.electron_beam(500).unwrap();
        let screen = detector.screen_histogram();
        assert_eq!(screen.width, 200);
        assert_eq!(screen.height, 100);
        assert!(screen.total() <= 500);
        let hist = detector.x_histogram();
        assert_eq!(hist.bins(), 200);
        assert_eq!(hist.total(), 500);
    }
}
