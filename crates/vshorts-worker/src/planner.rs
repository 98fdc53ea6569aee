//! Segment planning over themed clip pools.
//!
//! The planner walks `floor(target / base_unit)` steps, takes the theme for
//! step `i` from `ranked[i % len]`, and draws a clip from that theme's pool
//! without repeating a clip until the pool runs out. The final segment absorbs
//! the residual so the plan covers the target exactly.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use rand::seq::IndexedRandom;
use rand::Rng;
use tracing::{debug, info, warn};

use vshorts_models::{AspectClass, NicheTemplate, SegmentDescriptor, SegmentPlan, Theme};

use crate::config::PlannerConfig;
use crate::error::{WorkerError, WorkerResult};

/// Video extensions accepted as b-roll (compared case-insensitively).
pub const CLIP_EXTENSIONS: &[&str] = &["mp4", "mov", "avi"];

/// Lookup from theme id to candidate clips.
pub trait ClipLibrary: Send + Sync {
    /// Candidate clips for a theme; empty when the theme has none.
    fn clips(&self, theme_id: &str) -> Vec<PathBuf>;

    /// Source dimensions of a clip, when known.
    fn dimensions(&self, _clip: &Path) -> Option<(u32, u32)> {
        None
    }

    fn has_clips(&self, theme_id: &str) -> bool {
        !self.clips(theme_id).is_empty()
    }
}

/// Clip pools read from each theme's directory.
#[derive(Debug, Clone, Default)]
pub struct DirectoryClipLibrary {
    pools: HashMap<String, Vec<PathBuf>>,
    dimensions: HashMap<PathBuf, (u32, u32)>,
}

impl DirectoryClipLibrary {
    /// Build a library from explicit pools.
    pub fn from_pools<I, S>(pools: I) -> Self
    where
        I: IntoIterator<Item = (S, Vec<PathBuf>)>,
        S: Into<String>,
    {
        Self {
            pools: pools.into_iter().map(|(k, v)| (k.into(), v)).collect(),
            dimensions: HashMap::new(),
        }
    }

    /// Attach known dimensions for a clip.
    pub fn with_dimensions(mut self, clip: impl Into<PathBuf>, width: u32, height: u32) -> Self {
        self.dimensions.insert(clip.into(), (width, height));
        self
    }

    /// Scan every theme directory of a niche under `root`.
    ///
    /// Missing directories yield empty pools. When `probe` is set, each clip
    /// is probed once for its dimensions; probe failures leave them unknown.
    pub async fn scan(niche: &NicheTemplate, root: &Path, probe: bool) -> WorkerResult<Self> {
        let mut library = Self::default();

        for theme in &niche.themes {
            let dir = root.join(&theme.clip_dir);
            let clips = list_clips(&dir).await?;
            debug!(theme = %theme.id, dir = %dir.display(), clips = clips.len(), "Scanned clip pool");

            if probe {
                for clip in &clips {
                    if library.dimensions.contains_key(clip) {
                        continue;
                    }
                    match vshorts_media::probe_video(clip).await {
                        Ok(info) if info.width > 0 && info.height > 0 => {
                            library.dimensions.insert(clip.clone(), (info.width, info.height));
                        }
                        Ok(_) => {}
                        Err(e) => {
                            warn!(clip = %clip.display(), error = %e, "Failed to probe clip dimensions");
                        }
                    }
                }
            }

            library.pools.insert(theme.id.clone(), clips);
        }

        Ok(library)
    }

    /// Declared themes that have at least one playable clip, in order.
    pub fn playable_themes(&self, themes: &[Theme]) -> Vec<Theme> {
        themes
            .iter()
            .filter(|t| self.has_clips(&t.id))
            .cloned()
            .collect()
    }
}

impl ClipLibrary for DirectoryClipLibrary {
    fn clips(&self, theme_id: &str) -> Vec<PathBuf> {
        self.pools.get(theme_id).cloned().unwrap_or_default()
    }

    fn dimensions(&self, clip: &Path) -> Option<(u32, u32)> {
        self.dimensions.get(clip).copied()
    }
}

/// Video files in `dir`, sorted by path. A missing directory is an empty pool.
pub async fn list_clips(dir: &Path) -> WorkerResult<Vec<PathBuf>> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let mut clips = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if is_clip(&path) && entry.file_type().await?.is_file() {
            clips.push(path);
        }
    }
    clips.sort();
    Ok(clips)
}

fn is_clip(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| CLIP_EXTENSIONS.iter().any(|c| c.eq_ignore_ascii_case(e)))
        .unwrap_or(false)
}

/// A clip chosen by [`ClipSelector`].
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub clip: PathBuf,
    /// The used-set was cleared because every clip in the pool had been used
    pub reset: bool,
}

/// Per-run record of used clips.
///
/// When a pool is exhausted the whole used-set is cleared, not only the
/// entries belonging to that pool.
#[derive(Debug, Clone, Default)]
pub struct ClipSelector {
    used: HashSet<PathBuf>,
}

impl ClipSelector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Choose uniformly among unused clips of `pool`. `None` for an empty pool.
    pub fn select<R: Rng>(&mut self, pool: &[PathBuf], rng: &mut R) -> Option<Selection> {
        if pool.is_empty() {
            return None;
        }

        let mut available: Vec<&PathBuf> = pool.iter().filter(|c| !self.used.contains(*c)).collect();
        let reset = available.is_empty();
        if reset {
            self.used.clear();
            available = pool.iter().collect();
        }

        let clip = (*available.choose(rng)?).clone();
        self.used.insert(clip.clone());
        Some(Selection { clip, reset })
    }

    pub fn used_count(&self) -> usize {
        self.used.len()
    }

    pub fn is_used(&self, clip: &Path) -> bool {
        self.used.contains(clip)
    }
}

/// Builds timed segment plans.
#[derive(Debug, Clone, Default)]
pub struct SegmentPlanner {
    config: PlannerConfig,
}

impl SegmentPlanner {
    pub fn new(config: PlannerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Plan with the thread-local RNG.
    pub fn plan(
        &self,
        target_duration: f64,
        ranked_themes: &[String],
        library: &dyn ClipLibrary,
    ) -> WorkerResult<SegmentPlan> {
        self.plan_with_rng(target_duration, ranked_themes, library, &mut rand::rng())
    }

    /// Plan with an injected RNG.
    ///
    /// Returns an empty plan when the target is shorter than one base unit.
    /// Steps whose theme has no clips are skipped and show up as
    /// [`SegmentPlan::shortfall`].
    pub fn plan_with_rng<R: Rng>(
        &self,
        target_duration: f64,
        ranked_themes: &[String],
        library: &dyn ClipLibrary,
        rng: &mut R,
    ) -> WorkerResult<SegmentPlan> {
        let base_unit = self.config.base_unit;
        let jitter = self.config.jitter;

        if !target_duration.is_finite() || target_duration <= 0.0 {
            return Err(WorkerError::invalid_plan_input(format!(
                "target duration must be positive, got {}",
                target_duration
            )));
        }
        if ranked_themes.is_empty() {
            return Err(WorkerError::invalid_plan_input("no ranked themes to plan from"));
        }
        if base_unit <= 0.0 || jitter < 0.0 || jitter >= base_unit {
            return Err(WorkerError::invalid_plan_input(format!(
                "segment length {}s with jitter {}s cannot produce positive durations",
                base_unit, jitter
            )));
        }

        let segment_count = (target_duration / base_unit).floor() as usize;
        if segment_count == 0 {
            return Ok(SegmentPlan::empty(target_duration, base_unit));
        }

        let mut selector = ClipSelector::new();
        let mut segments: Vec<SegmentDescriptor> = Vec::with_capacity(segment_count);
        let mut skipped = 0usize;
        // Sum of offsets drawn so far, kept within [-jitter, jitter]
        let mut drift = 0.0f64;

        for step in 0..segment_count {
            let theme = &ranked_themes[step % ranked_themes.len()];
            let pool = library.clips(theme);

            let Some(selection) = selector.select(&pool, rng) else {
                warn!(theme = %theme, step, "No clips for theme, skipping step");
                skipped += 1;
                continue;
            };
            if selection.reset {
                info!(theme = %theme, "All clips in '{}' used, allowing reuse", theme);
            }

            let offset = if jitter > 0.0 {
                let low = (-jitter - drift).max(-jitter);
                let high = (jitter - drift).min(jitter);
                rng.random_range(low..=high)
            } else {
                0.0
            };
            drift += offset;
            let dimensions = library.dimensions(&selection.clip);

            segments.push(SegmentDescriptor {
                clip: selection.clip,
                duration: base_unit + offset,
                theme: theme.clone(),
                aspect: dimensions
                    .map(|(w, h)| AspectClass::from_dimensions(w, h))
                    .unwrap_or_default(),
                dimensions,
            });
        }

        // Skipped steps stay uncovered; everything else lands on the last segment.
        // With bounded drift the last segment stays within base_unit + residual +/- jitter.
        let covered = target_duration - skipped as f64 * base_unit;
        let assigned: f64 = segments.iter().map(|s| s.duration).sum();
        if let Some(last) = segments.last_mut() {
            let adjusted = last.duration + (covered - assigned);
            if adjusted <= 0.0 {
                return Err(WorkerError::invalid_plan_input(format!(
                    "final segment duration {:.3}s is not positive after residual adjustment",
                    adjusted
                )));
            }
            last.duration = adjusted;
        }

        Ok(SegmentPlan::new(target_duration, segments, skipped, base_unit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use tempfile::TempDir;
    use vshorts_models::PLAN_TOLERANCE_SECS;

    fn clips(prefix: &str, n: usize) -> Vec<PathBuf> {
        (0..n).map(|i| PathBuf::from(format!("{}/{}_{}.mp4", prefix, prefix, i))).collect()
    }

    fn ranked(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    fn library() -> DirectoryClipLibrary {
        DirectoryClipLibrary::from_pools([
            ("couple", clips("couple", 4)),
            ("candle", clips("candle", 2)),
            ("book", clips("book", 3)),
        ])
    }

    #[test]
    fn test_total_matches_target() {
        let planner = SegmentPlanner::default();
        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let target = 15.2 + seed as f64 * 0.23;
            let plan = planner
                .plan_with_rng(target, &ranked(&["couple", "candle", "book"]), &library(), &mut rng)
                .unwrap();
            assert!(!plan.is_empty());
            assert!((plan.total_duration() - target).abs() < PLAN_TOLERANCE_SECS);
            assert!(plan.segments().iter().all(|s| s.duration > 0.0));
        }
    }

    #[test]
    fn test_long_targets_always_plan() {
        let planner = SegmentPlanner::default();
        let library = DirectoryClipLibrary::from_pools([("couple", clips("couple", 5))]);
        let themes = ranked(&["couple"]);
        for target in [30.0, 60.0, 120.0, 300.0] {
            for seed in 0..300 {
                let mut rng = StdRng::seed_from_u64(seed);
                let plan = planner
                    .plan_with_rng(target, &themes, &library, &mut rng)
                    .unwrap_or_else(|e| panic!("target {} seed {}: {}", target, seed, e));
                assert_eq!(plan.len(), (target / 5.0) as usize);
                assert!((plan.total_duration() - target).abs() < PLAN_TOLERANCE_SECS);
                let (last, rest) = plan.segments().split_last().unwrap();
                assert!(rest.iter().all(|s| (3.5..=6.5).contains(&s.duration)));
                assert!(last.duration >= 5.0 - 1.5 - PLAN_TOLERANCE_SECS);
            }
        }
    }

    #[test]
    fn test_seventeen_seconds_gives_three_segments() {
        let mut rng = StdRng::seed_from_u64(7);
        let plan = SegmentPlanner::default()
            .plan_with_rng(17.0, &ranked(&["couple"]), &library(), &mut rng)
            .unwrap();
        assert_eq!(plan.len(), 3);
        assert!((plan.total_duration() - 17.0).abs() < PLAN_TOLERANCE_SECS);
    }

    #[test]
    fn test_themes_cycle_in_rank_order() {
        let mut rng = StdRng::seed_from_u64(3);
        let order = ranked(&["book", "couple", "candle"]);
        let plan = SegmentPlanner::default()
            .plan_with_rng(29.0, &order, &library(), &mut rng)
            .unwrap();
        for (i, segment) in plan.segments().iter().enumerate() {
            assert_eq!(segment.theme, order[i % order.len()]);
        }
    }

    #[test]
    fn test_jitter_bounds() {
        let mut rng = StdRng::seed_from_u64(11);
        let plan = SegmentPlanner::default()
            .plan_with_rng(19.0, &ranked(&["couple", "book"]), &library(), &mut rng)
            .unwrap();
        let (last, rest) = plan.segments().split_last().unwrap();
        assert!(rest.iter().all(|s| (3.5..=6.5).contains(&s.duration)));
        assert!(last.duration > 0.0);
    }

    #[test]
    fn test_short_target_is_empty_plan() {
        let plan = SegmentPlanner::default()
            .plan(4.9, &ranked(&["couple"]), &library())
            .unwrap();
        assert!(plan.is_empty());
    }

    #[test]
    fn test_invalid_inputs() {
        let planner = SegmentPlanner::default();
        assert!(matches!(
            planner.plan(30.0, &[], &library()),
            Err(WorkerError::InvalidPlanInput(_))
        ));
        assert!(matches!(
            planner.plan(0.0, &ranked(&["couple"]), &library()),
            Err(WorkerError::InvalidPlanInput(_))
        ));
        assert!(matches!(
            planner.plan(f64::NAN, &ranked(&["couple"]), &library()),
            Err(WorkerError::InvalidPlanInput(_))
        ));
    }

    #[test]
    fn test_empty_pool_is_skipped_and_reported() {
        let library = DirectoryClipLibrary::from_pools([
            ("couple", clips("couple", 3)),
            ("storm", Vec::new()),
        ]);
        let mut rng = StdRng::seed_from_u64(5);
        let plan = SegmentPlanner::default()
            .plan_with_rng(20.0, &ranked(&["couple", "storm"]), &library, &mut rng)
            .unwrap();

        // Steps 1 and 3 belong to the empty theme
        assert_eq!(plan.len(), 2);
        assert_eq!(plan.skipped_steps(), 2);
        assert!(plan.segments().iter().all(|s| s.theme == "couple"));
        assert!((plan.shortfall() - 10.0).abs() < PLAN_TOLERANCE_SECS);
        assert!(!plan.is_complete());
    }

    #[test]
    fn test_no_repeat_until_exhausted() {
        let pool = clips("candle", 2);
        let mut selector = ClipSelector::new();
        let mut rng = StdRng::seed_from_u64(42);

        let first = selector.select(&pool, &mut rng).unwrap();
        let second = selector.select(&pool, &mut rng).unwrap();
        assert_ne!(first.clip, second.clip);
        assert!(!first.reset && !second.reset);

        let third = selector.select(&pool, &mut rng).unwrap();
        assert!(third.reset);
        assert_eq!(selector.used_count(), 1);
    }

    #[test]
    fn test_exhaustion_clears_entire_used_set() {
        let small = clips("candle", 1);
        let other = clips("couple", 3);
        let mut selector = ClipSelector::new();
        let mut rng = StdRng::seed_from_u64(1);

        let from_other = selector.select(&other, &mut rng).unwrap();
        selector.select(&small, &mut rng).unwrap();
        let again = selector.select(&small, &mut rng).unwrap();

        assert!(again.reset);
        assert!(!selector.is_used(&from_other.clip));
    }

    #[test]
    fn test_empty_pool_selects_nothing() {
        let mut rng = StdRng::seed_from_u64(0);
        assert!(ClipSelector::new().select(&[], &mut rng).is_none());
    }

    #[test]
    fn test_same_seed_same_plan() {
        let planner = SegmentPlanner::default();
        let order = ranked(&["couple", "candle"]);
        let a = planner
            .plan_with_rng(33.3, &order, &library(), &mut StdRng::seed_from_u64(9))
            .unwrap();
        let b = planner
            .plan_with_rng(33.3, &order, &library(), &mut StdRng::seed_from_u64(9))
            .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_aspect_from_library_dimensions() {
        let library = DirectoryClipLibrary::from_pools([("book", vec![PathBuf::from("book/tall.mp4")])])
            .with_dimensions("book/tall.mp4", 720, 1280);
        let plan = SegmentPlanner::default()
            .plan(10.0, &ranked(&["book"]), &library)
            .unwrap();
        assert!(plan.segments().iter().all(|s| s.aspect == AspectClass::Portrait));
        assert_eq!(plan.segments()[0].resolution_label(), "720x1280");
    }

    #[tokio::test]
    async fn test_scan_filters_extensions() {
        let dir = TempDir::new().unwrap();
        let pool = dir.path().join("romantic_candle_vids");
        std::fs::create_dir(&pool).unwrap();
        for name in ["a.mp4", "b.MOV", "c.avi", "d.jpg", "notes.txt"] {
            std::fs::write(pool.join(name), b"x").unwrap();
        }

        let niche = NicheTemplate::builtin("love").unwrap();
        let library = DirectoryClipLibrary::scan(&niche, dir.path(), false).await.unwrap();

        let candle = library.clips("candle");
        assert_eq!(candle.len(), 3);
        assert!(library.clips("couple").is_empty());
        assert_eq!(
            library
                .playable_themes(&niche.themes)
                .iter()
                .map(|t| t.id.as_str())
                .collect::<Vec<_>>(),
            vec!["candle"]
        );
    }
}
