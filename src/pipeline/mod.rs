//! Typed pipeline stages: `Session -> Matched -> Filtered -> Localized`.
//!
//! Each stage owns the accumulated state and is consumed by the next one, so
//! a stale result cannot be reused by accident. Re-running a stage replaces
//! only that stage's output. Homography estimation borrows the stage instead
//! of consuming it, which lets a caller retry with another [`MatchSelection`]
//! after a failed fit; `locate` is the consuming shortcut for the common case.
//!
//! ```no_run
//! # use planematch::{ImageView, HomographyEstimator, DistanceFilter, MatchSelection, Session};
//! # use planematch::{BruteForceMatcher, Detector, Describer};
//! # use rand::SeedableRng;
//! # fn run(q: ImageView<'_, u8>, r: ImageView<'_, u8>, det: &dyn Detector, desc: &dyn Describer)
//! #     -> planematch::PlaneMatchResult<()> {
//! let mut rng = rand::rngs::StdRng::seed_from_u64(0);
//! let located = Session::new(q, r)
//!     .match_features(det, desc, &BruteForceMatcher::default())?
//!     .filter(&DistanceFilter::default())
//!     .locate(MatchSelection::Filtered, &HomographyEstimator::default(), &mut rng)?;
//! println!("{:?}", located.quadrilateral().corners());
//! # Ok(())
//! # }
//! ```

use crate::feature::{extract_features, Describer, Detector, ImageFeatures, KeyPoint};
use crate::homography::{HomographyEstimator, HomographyFit};
use crate::image::ImageView;
use crate::localize::{localize, Quadrilateral};
use crate::matching::{
    DescriptorMatcher, DistanceFilter, FilterOutcome, MatchSelection, MatchSet,
};
use crate::store::CorrespondenceStore;
use crate::trace::{trace_event, trace_span, trace_warn};
use crate::util::{PlaneMatchError, PlaneMatchResult};
use rand::Rng;

/// Pipeline stage names, used in precondition errors.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    Uninitialized,
    Matched,
    Filtered,
    Localized,
}

/// Distance statistics from the most recent filter run.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FilterStats {
    pub min_dist: f32,
    pub max_dist: f32,
    pub threshold: f32,
}

impl From<&FilterOutcome> for FilterStats {
    fn from(outcome: &FilterOutcome) -> Self {
        Self {
            min_dist: outcome.min_dist,
            max_dist: outcome.max_dist,
            threshold: outcome.threshold,
        }
    }
}

/// A pipeline bound to a query image and the reference image to search.
///
/// A session built with [`Session::from_extent`] carries only the query
/// size; it accepts precomputed features but cannot run detection.
#[derive(Clone, Copy, Debug)]
pub struct Session<'a> {
    images: Option<(ImageView<'a, u8>, ImageView<'a, u8>)>,
    query_width: usize,
    query_height: usize,
}

impl<'a> Session<'a> {
    pub fn new(query: ImageView<'a, u8>, reference: ImageView<'a, u8>) -> Self {
        Self {
            images: Some((query, reference)),
            query_width: query.width(),
            query_height: query.height(),
        }
    }

    pub fn stage(&self) -> Stage {
        Stage::Uninitialized
    }

    pub fn query_image(&self) -> Option<ImageView<'a, u8>> {
        self.images.map(|(query, _)| query)
    }

    pub fn reference_image(&self) -> Option<ImageView<'a, u8>> {
        self.images.map(|(_, reference)| reference)
    }

    /// Width and height of the query rectangle that gets localized.
    pub fn query_extent(&self) -> (usize, usize) {
        (self.query_width, self.query_height)
    }

    /// Detects and describes features in both images, then matches them.
    ///
    /// With the `rayon` feature the two images are processed concurrently.
    pub fn match_features<D, E, M>(
        self,
        detector: &D,
        describer: &E,
        matcher: &M,
    ) -> PlaneMatchResult<Matched<'a>>
    where
        D: Detector + ?Sized,
        E: Describer + ?Sized,
        M: DescriptorMatcher + ?Sized,
    {
        let Some((query_image, reference_image)) = self.images else {
            return Err(PlaneMatchError::ImagesUnavailable {
                operation: "feature extraction",
            });
        };
        let _span = trace_span!("extract_features").entered();

        #[cfg(feature = "rayon")]
        let (query, reference) = rayon::join(
            || extract_features(query_image, detector, describer),
            || extract_features(reference_image, detector, describer),
        );
        #[cfg(not(feature = "rayon"))]
        let (query, reference) = (
            extract_features(query_image, detector, describer),
            extract_features(reference_image, detector, describer),
        );

        let (query, reference) = (query?, reference?);
        trace_event!(
            "keypoints",
            query = query.keypoints().len(),
            reference = reference.keypoints().len()
        );
        self.match_precomputed(query, reference, matcher)
    }

    /// Matches features that were extracted elsewhere.
    pub fn match_precomputed<M>(
        self,
        query: ImageFeatures,
        reference: ImageFeatures,
        matcher: &M,
    ) -> PlaneMatchResult<Matched<'a>>
    where
        M: DescriptorMatcher + ?Sized,
    {
        let raw = matcher.match_nearest(query.descriptors(), reference.descriptors())?;
        let (query_keypoints, _) = query.into_parts();
        let (reference_keypoints, _) = reference.into_parts();
        self.with_correspondences(query_keypoints, reference_keypoints, raw)
    }

    /// Adopts keypoints and a raw match set produced by an external matcher.
    pub fn with_correspondences(
        self,
        query_keypoints: Vec<KeyPoint>,
        reference_keypoints: Vec<KeyPoint>,
        raw: MatchSet,
    ) -> PlaneMatchResult<Matched<'a>> {
        let store = CorrespondenceStore::new(query_keypoints, reference_keypoints, raw)?;
        Ok(Matched {
            inner: Inner {
                session: self,
                store,
            },
        })
    }
}

impl Session<'static> {
    /// Starts a session from the query size alone, for features computed
    /// elsewhere.
    pub fn from_extent(query_width: usize, query_height: usize) -> PlaneMatchResult<Self> {
        if query_width == 0 || query_height == 0 {
            return Err(PlaneMatchError::InvalidDimensions {
                width: query_width,
                height: query_height,
            });
        }
        Ok(Self {
            images: None,
            query_width,
            query_height,
        })
    }
}

/// The filtered match list together with the statistics that produced it.
#[derive(Clone, Debug)]
struct FilteredSet {
    matches: MatchSet,
    stats: FilterStats,
}

/// State shared by every stage after matching.
#[derive(Clone, Debug)]
struct Inner<'a> {
    session: Session<'a>,
    store: CorrespondenceStore,
}

fn select<'s>(
    store: &'s CorrespondenceStore,
    filtered: Option<&'s FilteredSet>,
    selection: MatchSelection,
) -> PlaneMatchResult<&'s MatchSet> {
    match selection {
        MatchSelection::Raw => Ok(store.raw_matches()),
        MatchSelection::Filtered => {
            filtered
                .map(|set| &set.matches)
                .ok_or(PlaneMatchError::StagePrecondition {
                    required: Stage::Filtered,
                    operation: "selecting filtered matches",
                })
        }
    }
}

impl<'a> Inner<'a> {
    fn run_filter(self, filter: &DistanceFilter) -> Filtered<'a> {
        let outcome = filter.filter(self.store.raw_matches());
        let stats = FilterStats::from(&outcome);
        Filtered {
            inner: self,
            filtered: FilteredSet {
                matches: outcome.matches,
                stats,
            },
        }
    }

    fn estimate<R: Rng + ?Sized>(
        &self,
        filtered: Option<&FilteredSet>,
        selection: MatchSelection,
        estimator: &HomographyEstimator,
        rng: &mut R,
    ) -> PlaneMatchResult<HomographyFit> {
        let _span = trace_span!("estimate_homography", selection = ?selection).entered();
        let matches = select(&self.store, filtered, selection)?;
        let (src, dst) = self.store.point_pairs(matches)?;
        let result = estimator.estimate(&src, &dst, rng);
        if let Err(err) = &result {
            trace_warn!("estimation_failed", error = err.to_string().as_str());
        }
        result
    }

    fn quadrilateral(&self, fit: &HomographyFit) -> Quadrilateral {
        let (width, height) = self.session.query_extent();
        localize(&fit.homography, width as f64, height as f64)
    }

    fn localize_with(
        self,
        filtered: Option<FilteredSet>,
        selection: MatchSelection,
        fit: HomographyFit,
    ) -> Localized<'a> {
        let quad = self.quadrilateral(&fit);
        Localized {
            inner: self,
            filtered,
            selection,
            fit,
            quad,
        }
    }
}

/// Stage after matching: keypoints and the raw match set are available.
#[derive(Clone, Debug)]
pub struct Matched<'a> {
    inner: Inner<'a>,
}

impl<'a> Matched<'a> {
    pub fn stage(&self) -> Stage {
        Stage::Matched
    }

    pub fn store(&self) -> &CorrespondenceStore {
        &self.inner.store
    }

    pub fn session(&self) -> &Session<'a> {
        &self.inner.session
    }

    /// Returns the selected match list; `Filtered` is not yet available.
    pub fn matches(&self, selection: MatchSelection) -> PlaneMatchResult<&MatchSet> {
        select(&self.inner.store, None, selection)
    }

    /// Derives the filtered match set from the raw one.
    pub fn filter(self, filter: &DistanceFilter) -> Filtered<'a> {
        self.inner.run_filter(filter)
    }

    /// Fits a homography without advancing the stage.
    ///
    /// Only [`MatchSelection::Raw`] is available before filtering.
    pub fn estimate_homography<R: Rng + ?Sized>(
        &self,
        selection: MatchSelection,
        estimator: &HomographyEstimator,
        rng: &mut R,
    ) -> PlaneMatchResult<HomographyFit> {
        self.inner.estimate(None, selection, estimator, rng)
    }

    /// Localizes the query with a fit estimated from the raw matches.
    pub fn localize_with(self, fit: HomographyFit) -> Localized<'a> {
        self.inner.localize_with(None, MatchSelection::Raw, fit)
    }

    /// Estimates the homography and localizes the query region.
    ///
    /// Consumes the stage; use [`Matched::estimate_homography`] to keep it
    /// when the fit may fail.
    pub fn locate<R: Rng + ?Sized>(
        self,
        selection: MatchSelection,
        estimator: &HomographyEstimator,
        rng: &mut R,
    ) -> PlaneMatchResult<Localized<'a>> {
        let fit = self.inner.estimate(None, selection, estimator, rng)?;
        Ok(self.inner.localize_with(None, selection, fit))
    }
}

/// Stage after filtering: both match sets are available.
#[derive(Clone, Debug)]
pub struct Filtered<'a> {
    inner: Inner<'a>,
    filtered: FilteredSet,
}

impl<'a> Filtered<'a> {
    pub fn stage(&self) -> Stage {
        Stage::Filtered
    }

    pub fn store(&self) -> &CorrespondenceStore {
        &self.inner.store
    }

    pub fn session(&self) -> &Session<'a> {
        &self.inner.session
    }

    /// The filtered ("good") matches.
    pub fn filtered_matches(&self) -> &MatchSet {
        &self.filtered.matches
    }

    pub fn filter_stats(&self) -> FilterStats {
        self.filtered.stats
    }

    /// Returns the selected match list.
    pub fn matches(&self, selection: MatchSelection) -> &MatchSet {
        match selection {
            MatchSelection::Raw => self.inner.store.raw_matches(),
            MatchSelection::Filtered => &self.filtered.matches,
        }
    }

    /// Discards the filtered set and recomputes it from the raw matches.
    pub fn refilter(self, filter: &DistanceFilter) -> Filtered<'a> {
        self.inner.run_filter(filter)
    }

    /// Drops the filtered set.
    pub fn into_matched(self) -> Matched<'a> {
        Matched { inner: self.inner }
    }

    /// Fits a homography without advancing the stage.
    pub fn estimate_homography<R: Rng + ?Sized>(
        &self,
        selection: MatchSelection,
        estimator: &HomographyEstimator,
        rng: &mut R,
    ) -> PlaneMatchResult<HomographyFit> {
        self.inner
            .estimate(Some(&self.filtered), selection, estimator, rng)
    }

    /// Localizes the query with an already estimated fit.
    pub fn localize_with(self, selection: MatchSelection, fit: HomographyFit) -> Localized<'a> {
        self.inner
            .localize_with(Some(self.filtered), selection, fit)
    }

    /// Estimates the homography and localizes the query region.
    ///
    /// Consumes the stage; use [`Filtered::estimate_homography`] to keep it
    /// when the fit may fail.
    pub fn locate<R: Rng + ?Sized>(
        self,
        selection: MatchSelection,
        estimator: &HomographyEstimator,
        rng: &mut R,
    ) -> PlaneMatchResult<Localized<'a>> {
        let fit = self.estimate_homography(selection, estimator, rng)?;
        Ok(self.localize_with(selection, fit))
    }
}

/// Final stage: the query region has been localized in the reference image.
#[derive(Clone, Debug)]
pub struct Localized<'a> {
    inner: Inner<'a>,
    filtered: Option<FilteredSet>,
    selection: MatchSelection,
    fit: HomographyFit,
    quad: Quadrilateral,
}

impl<'a> Localized<'a> {
    pub fn stage(&self) -> Stage {
        Stage::Localized
    }

    pub fn store(&self) -> &CorrespondenceStore {
        &self.inner.store
    }

    pub fn session(&self) -> &Session<'a> {
        &self.inner.session
    }

    /// The filtered matches, if the filter ran before localization.
    pub fn filtered_matches(&self) -> Option<&MatchSet> {
        self.filtered.as_ref().map(|set| &set.matches)
    }

    pub fn filter_stats(&self) -> Option<FilterStats> {
        self.filtered.as_ref().map(|set| set.stats)
    }

    /// Returns the selected match list.
    pub fn matches(&self, selection: MatchSelection) -> PlaneMatchResult<&MatchSet> {
        select(&self.inner.store, self.filtered.as_ref(), selection)
    }

    /// Match list the homography was estimated from.
    pub fn selection(&self) -> MatchSelection {
        self.selection
    }

    pub fn fit(&self) -> &HomographyFit {
        &self.fit
    }

    /// Query corners in reference coordinates.
    pub fn quadrilateral(&self) -> &Quadrilateral {
        &self.quad
    }

    /// Fits a homography without touching the current localization.
    pub fn estimate_homography<R: Rng + ?Sized>(
        &self,
        selection: MatchSelection,
        estimator: &HomographyEstimator,
        rng: &mut R,
    ) -> PlaneMatchResult<HomographyFit> {
        self.inner
            .estimate(self.filtered.as_ref(), selection, estimator, rng)
    }

    /// Replaces the localization with one from an already estimated fit.
    pub fn localize_with(self, selection: MatchSelection, fit: HomographyFit) -> Localized<'a> {
        self.inner.localize_with(self.filtered, selection, fit)
    }

    /// Re-estimates and replaces the localization in place.
    ///
    /// On failure the previous fit and quadrilateral are kept.
    pub fn relocate<R: Rng + ?Sized>(
        &mut self,
        selection: MatchSelection,
        estimator: &HomographyEstimator,
        rng: &mut R,
    ) -> PlaneMatchResult<()> {
        let fit = self.estimate_homography(selection, estimator, rng)?;
        self.quad = self.inner.quadrilateral(&fit);
        self.fit = fit;
        self.selection = selection;
        Ok(())
    }

    /// Re-runs the filter, discarding the localization.
    pub fn refilter(self, filter: &DistanceFilter) -> Filtered<'a> {
        self.inner.run_filter(filter)
    }

    /// Drops the localization, returning to the filtered stage.
    ///
    /// Hands `self` back unchanged when the filter never ran.
    pub fn into_filtered(self) -> Result<Filtered<'a>, Self> {
        match self.filtered {
            Some(filtered) => Ok(Filtered {
                inner: self.inner,
                filtered,
            }),
            None => Err(self),
        }
    }

    /// Drops the localization and any filtered matches.
    pub fn into_matched(self) -> Matched<'a> {
        Matched { inner: self.inner }
    }
}
