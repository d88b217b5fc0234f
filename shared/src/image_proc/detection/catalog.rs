//! Source catalogs: ordered records that each own one footprint.

use log::{debug, info};

use crate::error::Result;
use crate::image_proc::detection::footprint::SourceFootprint;
use crate::image_proc::detection::{Point2D, Point2I};
use crate::image_proc::image::Exposure;

/// One detected source.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceRecord {
    id: u64,
    footprint: SourceFootprint,
    centroid: Option<Point2D>,
}

impl SourceRecord {
    pub fn new(id: u64, footprint: impl Into<SourceFootprint>) -> Self {
        Self {
            id,
            footprint: footprint.into(),
            centroid: None,
        }
    }

    pub fn with_centroid(mut self, centroid: Point2D) -> Self {
        self.centroid = Some(centroid);
        self
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn footprint(&self) -> &SourceFootprint {
        &self.footprint
    }

    pub fn set_footprint(&mut self, footprint: impl Into<SourceFootprint>) {
        self.footprint = footprint.into();
    }

    pub fn centroid(&self) -> Option<Point2D> {
        self.centroid
    }
}

/// Records in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceCatalog {
    records: Vec<SourceRecord>,
}

impl SourceCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: SourceRecord) {
        self.records.push(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&SourceRecord> {
        self.records.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut SourceRecord> {
        self.records.get_mut(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SourceRecord> {
        self.records.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, SourceRecord> {
        self.records.iter_mut()
    }

    /// Number of records whose footprint already carries pixel values.
    pub fn heavy_count(&self) -> usize {
        self.records
            .iter()
            .filter(|r| r.footprint().is_heavy())
            .count()
    }
}

impl FromIterator<SourceRecord> for SourceCatalog {
    fn from_iter<I: IntoIterator<Item = SourceRecord>>(iter: I) -> Self {
        Self {
            records: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a SourceCatalog {
    type Item = &'a SourceRecord;
    type IntoIter = std::slice::Iter<'a, SourceRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// Replace every light footprint in `catalog` with a heavy one built from `exposure`.
///
/// Records that are already heavy are left alone, so running this twice is a
/// no-op the second time. With `verbose`, each upgrade is logged at info level.
/// Returns the same catalog for chaining.
pub fn make_heavy_catalog<'a>(
    catalog: &'a mut SourceCatalog,
    exposure: &Exposure,
    verbose: bool,
) -> Result<&'a mut SourceCatalog> {
    for (i, record) in catalog.iter_mut().enumerate() {
        if record.footprint().is_heavy() {
            continue;
        }
        if verbose {
            info!("{i} not heavy => heavy");
        }
        let heavy = record.footprint().to_heavy(exposure.masked_image())?;
        record.set_footprint(heavy);
    }
    Ok(catalog)
}

/// Find the first record whose footprint box contains pixel position `(x, y)`.
///
/// Containment is tested with the floating-point position first, which rounds
/// to the nearest pixel center instead of truncating toward zero (see
/// [`BBox::contains_point_f`](crate::image_proc::detection::BBox::contains_point_f)).
/// Coordinates that cannot form a floating-point point (NaN or infinite) fall
/// back to an integer test on the truncated values. A record with an invalid footprint
/// box is reported as an error rather than skipped.
pub fn search_catalog(catalog: &SourceCatalog, x: f64, y: f64) -> Result<Option<&SourceRecord>> {
    let point = Point2D::try_new(x, y);
    if let Err(err) = &point {
        debug!("falling back to integer containment: {err}");
    }

    for (i, record) in catalog.iter().enumerate() {
        let bbox = record.footprint().bbox().validated()?;
        let hit = match &point {
            Ok(p) => bbox.contains_point_f(*p),
            Err(_) => bbox.contains_point(Point2I::new(x as i32, y as i32)),
        };
        if hit {
            info!("{i}");
            return Ok(Some(record));
        }
    }
    Ok(None)
}
