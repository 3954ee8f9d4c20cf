//! Matrix Generation - Cartesian Products Over Categories
//!
//! Tuples come out in nested-loop order: the rightmost axis varies fastest.

use std::str::FromStr;

use crate::error::EngineError;
use crate::spec::Spec;
use crate::store::{AssetRecord, Category};

/// Selection filter for one category: `all`, `none`, or a comma list of ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetFilter {
    All,
    None,
    Ids(Vec<String>),
}

impl FromStr for AssetFilter {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim() {
            "all" => AssetFilter::All,
            "none" | "" => AssetFilter::None,
            list => AssetFilter::Ids(
                list.split(',')
                    .map(str::trim)
                    .filter(|id| !id.is_empty())
                    .map(str::to_string)
                    .collect(),
            ),
        })
    }
}

impl AssetFilter {
    /// Keep matching records in their source order.
    pub fn apply(&self, records: &[AssetRecord]) -> Vec<AssetRecord> {
        match self {
            AssetFilter::All => records.to_vec(),
            AssetFilter::None => vec![],
            AssetFilter::Ids(ids) => records
                .iter()
                .filter(|r| ids.iter().any(|id| id == r.id()))
                .cloned()
                .collect(),
        }
    }
}

/// A wardrobe item fits a pose when its zones meet the pose's allowed zones.
pub fn is_wardrobe_compatible(item: &AssetRecord, pose: &AssetRecord) -> bool {
    let allowed = pose.list("wardrobe_zones_allowed");
    item.list("zones").iter().any(|zone| allowed.contains(zone))
}

/// Compatible wardrobe ids for a pose, in pool order. May be empty, which
/// stands for the "no wardrobe" combination.
pub fn compatible_wardrobe(pose: &AssetRecord, pool: &[AssetRecord]) -> Vec<String> {
    pool.iter()
        .filter(|w| is_wardrobe_compatible(w, pose))
        .map(|w| w.id().to_string())
        .collect()
}

#[derive(Debug, Clone)]
pub struct MatrixAxis {
    pub category: Category,
    pub candidates: Vec<AssetRecord>,
}

#[derive(Debug, Clone, Default)]
pub struct MatrixGenerator {
    axes: Vec<MatrixAxis>,
    wardrobe_pool: Option<Vec<AssetRecord>>,
}

impl MatrixGenerator {
    pub fn new(axes: Vec<(Category, Vec<AssetRecord>)>) -> Self {
        Self {
            axes: axes
                .into_iter()
                .map(|(category, candidates)| MatrixAxis { category, candidates })
                .collect(),
            wardrobe_pool: None,
        }
    }

    /// Attach pose-compatible wardrobe from `pool` to every tuple.
    pub fn with_wardrobe_filter(mut self, pool: Vec<AssetRecord>) -> Self {
        self.wardrobe_pool = Some(pool);
        self
    }

    pub fn axes(&self) -> &[MatrixAxis] {
        &self.axes
    }

    /// Size of the product. No axes means no combinations.
    pub fn len(&self) -> usize {
        if self.axes.is_empty() {
            return 0;
        }
        self.axes.iter().map(|a| a.candidates.len()).product()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> MatrixIter<'_> {
        let cursor = if self.is_empty() {
            None
        } else {
            Some(vec![0; self.axes.len()])
        };
        MatrixIter {
            generator: self,
            cursor,
        }
    }

    fn spec_for(&self, cursor: &[usize]) -> Spec {
        let mut spec = Spec::default();
        let mut pose = None;

        for (axis, &i) in self.axes.iter().zip(cursor) {
            let record = &axis.candidates[i];
            let id = Some(record.id().to_string());
            match axis.category {
                Category::Characters => spec.character = id,
                Category::Poses => {
                    spec.pose = id;
                    pose = Some(record);
                }
                Category::Orientations => spec.orientation = id,
                Category::Scenes => spec.scene = id,
                Category::Lighting => spec.lighting = id,
                Category::Models => spec.model = id,
                Category::Wardrobe => spec.wardrobe.push(record.id().to_string()),
                Category::Props => spec.props.push(record.id().to_string()),
            }
        }

        if let (Some(pool), Some(pose)) = (&self.wardrobe_pool, pose) {
            spec.wardrobe.extend(compatible_wardrobe(pose, pool));
        }

        spec
    }
}

impl<'a> IntoIterator for &'a MatrixGenerator {
    type Item = Spec;
    type IntoIter = MatrixIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Lazy odometer over the product.
#[derive(Debug, Clone)]
pub struct MatrixIter<'a> {
    generator: &'a MatrixGenerator,
    cursor: Option<Vec<usize>>,
}

impl Iterator for MatrixIter<'_> {
    type Item = Spec;

    fn next(&mut self) -> Option<Spec> {
        let cursor = self.cursor.as_mut()?;
        let spec = self.generator.spec_for(cursor);

        let mut exhausted = true;
        for (slot, axis) in cursor.iter_mut().zip(&self.generator.axes).rev() {
            *slot += 1;
            if *slot < axis.candidates.len() {
                exhausted = false;
                break;
            }
            *slot = 0;
        }
        if exhausted {
            self.cursor = None;
        }

        Some(spec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records(ids: &[&str]) -> Vec<AssetRecord> {
        ids.iter().map(|id| AssetRecord::new(id)).collect()
    }

    #[test]
    fn test_rightmost_varies_fastest() {
        let matrix = MatrixGenerator::new(vec![
            (Category::Characters, records(&["c1", "c2"])),
            (Category::Poses, records(&["p1", "p2", "p3"])),
        ]);
        assert_eq!(matrix.len(), 6);

        let pairs: Vec<_> = matrix
            .iter()
            .map(|s| (s.character.unwrap(), s.pose.unwrap()))
            .collect();
        assert_eq!(pairs[0], ("c1".to_string(), "p1".to_string()));
        assert_eq!(pairs[1], ("c1".to_string(), "p2".to_string()));
        assert_eq!(pairs[3], ("c2".to_string(), "p1".to_string()));
        assert_eq!(pairs.len(), 6);
    }

    #[test]
    fn test_restartable() {
        let matrix = MatrixGenerator::new(vec![(Category::Scenes, records(&["s1", "s2"]))]);
        assert_eq!(matrix.iter().count(), 2);
        assert_eq!(matrix.iter().count(), 2);
    }

    #[test]
    fn test_empty_axis_yields_nothing() {
        let matrix = MatrixGenerator::new(vec![
            (Category::Characters, records(&["c1"])),
            (Category::Poses, vec![]),
        ]);
        assert_eq!(matrix.iter().count(), 0);
        assert_eq!(MatrixGenerator::default().iter().count(), 0);
    }

    #[test]
    fn test_wardrobe_axis_and_filter() {
        let pose = AssetRecord::new("p1").with("wardrobe_zones_allowed", vec!["torso", "legs"]);
        let pool = vec![
            AssetRecord::new("shirt").with("zones", vec!["torso"]),
            AssetRecord::new("hat").with("zones", vec!["head"]),
        ];
        let matrix = MatrixGenerator::new(vec![(Category::Poses, vec![pose])])
            .with_wardrobe_filter(pool);
        let specs: Vec<_> = matrix.iter().collect();
        assert_eq!(specs[0].wardrobe, vec!["shirt"]);
    }

    #[test]
    fn test_filter_parse_and_apply() {
        let all = records(&["a", "b", "c"]);
        let filter: AssetFilter = "c, a".parse().unwrap();
        let kept: Vec<_> = filter.apply(&all).iter().map(|r| r.id().to_string()).collect();
        assert_eq!(kept, vec!["a", "c"]);
        assert!("none".parse::<AssetFilter>().unwrap().apply(&all).is_empty());
        assert_eq!("all".parse::<AssetFilter>().unwrap().apply(&all).len(), 3);
    }
}
