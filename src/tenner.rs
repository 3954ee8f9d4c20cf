//! Tenner Permutations - Mixed-Radix Indexing
//!
//! A Tenner is a category with exactly ten candidates. With `n` chosen
//! categories a single index in `0..10^n` addresses one combination: digit
//! `j` of the index (base 10, least significant first) picks the item of
//! category `j`. The first category therefore varies fastest.
//!
//! Three modes live here:
//! - [`TennerGenerator`]: the full `10^n` space over chosen categories.
//! - [`Tenner32Option`]: one externally supplied record with all 32 values.
//! - [`TennerNumber`]: numbered Tenner tables (`tenner_NN.csv`), used for
//!   individual Tenner bundles and as chunk components.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, warn};

use crate::bundle::{
    reference_or_default, Bundle, BundleDraft, BundleFactory, BundleId, BundleMetadata, Extension,
    SpecSnapshot,
};
use crate::composer::{camera_framing, PromptComposer};
use crate::error::{EngineError, Result};
use crate::resolver::ContextAssets;
use crate::schema::{CategorySchema, FieldValue};
use crate::spec::Spec;
use crate::store::{read_table, AssetRecord};

pub const TENNER_SIZE: usize = 10;
pub const TENNER32_COUNT: u8 = 32;

/// Split `index` into `n` base-10 digits, least significant first.
pub fn decode(mut index: u64, n: usize) -> Vec<u8> {
    let mut digits = Vec::with_capacity(n);
    for _ in 0..n {
        digits.push((index % 10) as u8);
        index /= 10;
    }
    digits
}

/// Inverse of [`decode`]. `None` when the digits overflow a `u64`.
pub fn encode(digits: &[u8]) -> Option<u64> {
    digits
        .iter()
        .rev()
        .try_fold(0u64, |acc, &d| acc.checked_mul(10)?.checked_add(u64::from(d)))
}

/// Source file for a named Tenner category.
pub fn tenner_file_name(category: &str) -> String {
    match category {
        "character" => "tenner_characters.csv".to_string(),
        "headwear" => "tenner_headwear.csv".to_string(),
        "garments" => "tenner_garments.csv".to_string(),
        "accessories" => "tenner_accessories.csv".to_string(),
        "props" => "tenner_props.csv".to_string(),
        other => format!("tenner_{}s.csv", other),
    }
}

/// Where a Tenner category's descriptor lands in the prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum TennerRole {
    Character,
    Wardrobe(u8),
    Props,
}

impl TennerRole {
    fn of(category: &str) -> Self {
        match category {
            "character" => TennerRole::Character,
            "headwear" => TennerRole::Wardrobe(0),
            "garments" => TennerRole::Wardrobe(1),
            "accessories" => TennerRole::Wardrobe(2),
            "props" => TennerRole::Props,
            _ => TennerRole::Wardrobe(3),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TennerCategory {
    pub name: String,
    pub items: Vec<AssetRecord>,
}

/// Chosen Tenner categories, each exactly ten items.
#[derive(Debug, Clone)]
pub struct TennerSet {
    categories: Vec<TennerCategory>,
}

impl TennerSet {
    pub fn new(categories: Vec<(String, Vec<AssetRecord>)>) -> Result<Self> {
        for (name, items) in &categories {
            if items.len() != TENNER_SIZE {
                return Err(EngineError::Cardinality {
                    category: name.clone(),
                    expected: TENNER_SIZE,
                    found: items.len(),
                });
            }
        }
        Ok(Self {
            categories: categories
                .into_iter()
                .map(|(name, items)| TennerCategory { name, items })
                .collect(),
        })
    }

    /// Load each named category from `dir`. A missing source is fatal.
    pub fn load(dir: &Path, names: &[&str]) -> Result<Self> {
        let schema = CategorySchema::new();
        let mut categories = Vec::with_capacity(names.len());
        for &name in names {
            let path = dir.join(tenner_file_name(name));
            let table = read_table(&path, name, &schema)?;
            if !table.found {
                return Err(EngineError::missing_source(name, path));
            }
            debug!(category = name, rows = table.records.len(), "loaded tenner");
            categories.push((name.to_string(), table.records));
        }
        Self::new(categories)
    }

    pub fn categories(&self) -> &[TennerCategory] {
        &self.categories
    }
}

/// Enumerates the `10^n` space of a [`TennerSet`].
#[derive(Debug, Clone)]
pub struct TennerGenerator {
    set: TennerSet,
    space: u64,
}

impl TennerGenerator {
    pub fn new(set: TennerSet) -> Result<Self> {
        let n = set.categories.len();
        let space = u32::try_from(n)
            .ok()
            .and_then(|n| 10u64.checked_pow(n))
            .ok_or(EngineError::CombinationSpaceTooLarge { categories: n })?;
        Ok(Self { set, space })
    }

    /// Total combinations, `10^n`.
    pub fn len(&self) -> u64 {
        self.space
    }

    pub fn is_empty(&self) -> bool {
        self.space == 0
    }

    /// Random access by index.
    pub fn permutation(&self, index: u64) -> Option<TennerPermutation<'_>> {
        if index >= self.space {
            return None;
        }
        let digits = decode(index, self.set.categories.len());
        let items = self
            .set
            .categories
            .iter()
            .zip(&digits)
            .map(|(c, &d)| (c.name.as_str(), &c.items[usize::from(d)]))
            .collect();
        Some(TennerPermutation {
            index,
            digits,
            items,
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = TennerPermutation<'_>> + '_ {
        (0..self.space).filter_map(move |i| self.permutation(i))
    }
}

/// One decoded combination.
#[derive(Debug, Clone)]
pub struct TennerPermutation<'a> {
    pub index: u64,
    pub digits: Vec<u8>,
    /// `(category, selected item)` in chosen-category order.
    pub items: Vec<(&'a str, &'a AssetRecord)>,
}

impl<'a> TennerPermutation<'a> {
    /// Selected items in prompt order: character, wardrobe roles, props.
    fn by_role(&self, role: fn(TennerRole) -> bool) -> Vec<&'a AssetRecord> {
        let mut ranked: Vec<(TennerRole, &'a AssetRecord)> = self
            .items
            .iter()
            .map(|&(cat, item)| (TennerRole::of(cat), item))
            .filter(|&(r, _)| role(r))
            .collect();
        ranked.sort_by_key(|&(r, _)| r);
        ranked.into_iter().map(|(_, item)| item).collect()
    }

    fn characters(&self) -> Vec<&'a AssetRecord> {
        self.by_role(|r| r == TennerRole::Character)
    }

    fn wardrobe(&self) -> Vec<&'a AssetRecord> {
        self.by_role(|r| matches!(r, TennerRole::Wardrobe(_)))
    }

    fn props(&self) -> Vec<&'a AssetRecord> {
        self.by_role(|r| r == TennerRole::Props)
    }

    /// The symbolic spec this permutation stands for.
    pub fn spec(&self, context: &ContextAssets<'_>) -> Spec {
        Spec {
            character: self.characters().first().map(|c| c.id().to_string()),
            pose: context.pose.map(|p| p.id().to_string()),
            orientation: None,
            scene: context.scene.map(|s| s.id().to_string()),
            lighting: context.lighting.map(|l| l.id().to_string()),
            model: context.model.map(|m| m.id().to_string()),
            wardrobe: self.wardrobe().iter().map(|w| w.id().to_string()).collect(),
            props: self.props().iter().map(|p| p.id().to_string()).collect(),
            camera_override: None,
        }
    }

    pub fn prompt(&self, composer: &PromptComposer, context: &ContextAssets<'_>) -> String {
        let mut parts: Vec<Option<String>> = Vec::new();
        parts.extend(self.characters().iter().map(|c| c.descriptor()));
        parts.push(context.pose_descriptor());
        parts.extend(self.wardrobe().iter().map(|w| w.descriptor()));
        parts.extend(self.props().iter().map(|p| p.descriptor()));
        parts.push(context.scene_descriptor());
        parts.push(context.lighting_descriptor());
        composer.compose_parts(parts.into_iter().flatten(), camera_framing(context.scene).as_deref(), None)
    }

    pub fn to_bundle(
        &self,
        composer: &PromptComposer,
        factory: &BundleFactory,
        context: &ContextAssets<'_>,
    ) -> Result<Bundle> {
        let character = self
            .characters()
            .first()
            .map(|c| c.reference())
            .unwrap_or_else(|| "unknown@1.0.0".to_string());

        let spec = SpecSnapshot {
            film_bible: factory.film_bible_version().to_string(),
            character,
            pose: reference_or_default(context.pose),
            orientation: None,
            wardrobe: self.wardrobe().iter().map(|w| w.reference()).collect(),
            props: self.props().iter().map(|p| p.reference()).collect(),
            scene: reference_or_default(context.scene),
            lighting: reference_or_default(context.lighting),
            model: context.model.map(AssetRecord::reference),
            camera_override: None,
        };

        let metadata = TennerMetadata::Permutation {
            chunk_count: self.items.len(),
            permutation_index: self.index,
            digits: self.digits.clone(),
            categories: self.items.iter().map(|(c, _)| c.to_string()).collect(),
            items: self
                .items
                .iter()
                .map(|(c, item)| (c.to_string(), item.id().to_string()))
                .collect(),
        };

        factory.assemble(BundleDraft {
            id: BundleId::Indexed(format!("tenner_{:05}", self.index)),
            spec,
            prompt_text: self.prompt(composer, context),
            model: context.model,
            metadata: BundleMetadata::pending(
                format!("Tenner bundle {} with {} categories", self.index, self.items.len()),
                self.items.iter().map(|(_, item)| item.id().to_string()).collect(),
                "Generated by Tenner System",
            ),
            extension: Extension::Tenner(metadata),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TennerMetadata {
    Permutation {
        chunk_count: usize,
        permutation_index: u64,
        digits: Vec<u8>,
        categories: Vec<String>,
        items: BTreeMap<String, String>,
    },
    Individual {
        tenner_number: u8,
        permutation_index: usize,
        descriptor: String,
        #[serde(rename = "type")]
        kind: String,
    },
}

// ---------------------------------------------------------------------------
// Numbered Tenner tables
// ---------------------------------------------------------------------------

/// A numbered Tenner (`T1`..`T32`), backed by `tenner_NN.csv`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TennerNumber(pub u8);

impl TennerNumber {
    pub fn file_name(self) -> String {
        format!("tenner_{:02}.csv", self.0)
    }

    /// Skeleton placeholder, e.g. `<T11>`.
    pub fn placeholder(self) -> String {
        format!("<{}>", self)
    }

    /// The first ten rows of the table. A missing table is fatal.
    pub fn load_entries(self, dir: &Path) -> Result<Vec<AssetRecord>> {
        let path = dir.join(self.file_name());
        let table = read_table(&path, &self.to_string(), &CategorySchema::new())?;
        if !table.found {
            return Err(EngineError::missing_source(self.to_string(), path));
        }
        let mut entries = table.records;
        entries.truncate(TENNER_SIZE);
        Ok(entries)
    }

    /// Flattened descriptors of the first ten rows; empty cells stay empty.
    pub fn load_column(self, dir: &Path) -> Result<Vec<String>> {
        Ok(self
            .load_entries(dir)?
            .iter()
            .map(|e| e.get("descriptor").map(FieldValue::flatten).unwrap_or_default())
            .collect())
    }
}

impl fmt::Display for TennerNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T{}", self.0)
    }
}

impl FromStr for TennerNumber {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let digits = trimmed
            .strip_prefix('T')
            .or_else(|| trimmed.strip_prefix('t'))
            .unwrap_or(trimmed);
        digits
            .parse::<u8>()
            .ok()
            .filter(|&n| n >= 1)
            .map(TennerNumber)
            .ok_or_else(|| EngineError::InvalidComponent(s.to_string()))
    }
}

impl TryFrom<String> for TennerNumber {
    type Error = EngineError;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<TennerNumber> for String {
    fn from(t: TennerNumber) -> Self {
        t.to_string()
    }
}

/// One bundle per non-empty entry among the first ten rows of `number`.
pub fn individual_bundles(
    number: TennerNumber,
    entries: &[AssetRecord],
    composer: &PromptComposer,
    factory: &BundleFactory,
    context: &ContextAssets<'_>,
) -> Result<Vec<Bundle>> {
    let mut bundles = Vec::new();
    for (perm_idx, entry) in entries.iter().take(TENNER_SIZE).enumerate() {
        let Some(descriptor) = entry.descriptor() else {
            continue;
        };
        let id = format!("tenner_{:02}_perm_{:03}", number.0, perm_idx);

        let prompt_text = composer.compose_parts(
            [
                context.pose_descriptor(),
                Some(descriptor.clone()),
                context.scene_descriptor(),
                context.lighting_descriptor(),
            ]
            .into_iter()
            .flatten(),
            camera_framing(context.scene).as_deref(),
            None,
        );

        let spec = SpecSnapshot {
            film_bible: factory.film_bible_version().to_string(),
            character: format!("{}@1.0.0", id),
            pose: reference_or_default(context.pose),
            orientation: None,
            wardrobe: vec![],
            props: vec![],
            scene: reference_or_default(context.scene),
            lighting: reference_or_default(context.lighting),
            model: context.model.map(AssetRecord::reference),
            camera_override: None,
        };

        bundles.push(factory.assemble(BundleDraft {
            id: BundleId::Indexed(id.clone()),
            spec,
            prompt_text,
            model: context.model,
            metadata: BundleMetadata::pending(
                format!("Individual {} entry {}", number, perm_idx),
                vec![format!("tenner_{:02}", number.0), "individual".to_string()],
                "Generated by Tenner System",
            ),
            extension: Extension::Tenner(TennerMetadata::Individual {
                tenner_number: number.0,
                permutation_index: perm_idx,
                descriptor,
                kind: "individual_tenner".to_string(),
            }),
        })?);
    }
    Ok(bundles)
}

// ---------------------------------------------------------------------------
// 32-Tenner records
// ---------------------------------------------------------------------------

/// Column key for Tenner `i` in the 32-Tenner source.
pub fn tenner32_key(i: u8) -> String {
    format!("TENNER {} (T{})", i, i)
}

/// One complete option: a value (possibly absent) for each of the 32 Tenners.
#[derive(Debug, Clone, PartialEq)]
pub struct Tenner32Option {
    pub option: Option<serde_json::Value>,
    /// Index `i` holds Tenner `i + 1`.
    pub values: Vec<Option<String>>,
}

impl Tenner32Option {
    pub fn from_json(value: &serde_json::Value) -> Self {
        let values = (1..=TENNER32_COUNT)
            .map(|i| match value.get(tenner32_key(i)) {
                None | Some(serde_json::Value::Null) => None,
                Some(serde_json::Value::String(s)) => Some(s.clone()),
                Some(other) => Some(other.to_string()),
            })
            .collect();
        Self {
            option: value.get("option").cloned(),
            values,
        }
    }

    /// Tenners with a non-empty value.
    pub fn complete_count(&self) -> usize {
        self.descriptors().len()
    }

    pub fn descriptors(&self) -> Vec<&str> {
        self.values
            .iter()
            .flatten()
            .map(String::as_str)
            .filter(|v| !v.is_empty())
            .collect()
    }

    pub fn to_bundle(
        &self,
        permutation: usize,
        composer: &PromptComposer,
        factory: &BundleFactory,
        context: &ContextAssets<'_>,
    ) -> Result<Bundle> {
        let complete = self.complete_count();
        if complete < usize::from(TENNER32_COUNT) {
            warn!(permutation, complete, "32-Tenner permutation is incomplete");
        }

        let id = format!("tenner32_permutation_{:02}", permutation);
        let descriptors: Vec<String> = self.descriptors().into_iter().map(str::to_string).collect();

        let mut parts = vec![context.pose_descriptor()];
        parts.extend(descriptors.iter().cloned().map(Some));
        parts.push(context.scene_descriptor());
        parts.push(context.lighting_descriptor());
        let prompt_text = composer.compose_parts(
            parts.into_iter().flatten(),
            camera_framing(context.scene).as_deref(),
            None,
        );

        let spec = SpecSnapshot {
            film_bible: factory.film_bible_version().to_string(),
            character: format!("{}@1.0.0", id),
            pose: reference_or_default(context.pose),
            orientation: None,
            wardrobe: vec![],
            props: vec![],
            scene: reference_or_default(context.scene),
            lighting: reference_or_default(context.lighting),
            model: context.model.map(AssetRecord::reference),
            camera_override: None,
        };

        let mut tags = vec!["tenner32".to_string(), format!("permutation_{:02}", permutation)];
        tags.extend((1..=TENNER32_COUNT).map(|i| format!("tenner_{:02}", i)));

        factory.assemble(BundleDraft {
            id: BundleId::Indexed(id),
            spec,
            prompt_text,
            model: context.model,
            metadata: BundleMetadata::pending(
                format!("32-Tenner permutation {} with {} Tenners", permutation, descriptors.len()),
                tags,
                "Generated by 32-Tenner System",
            ),
            extension: Extension::Tenner32(Tenner32Metadata {
                permutation_index: permutation,
                complete_tenners: complete,
                tenner_descriptors: descriptors,
                total_tenners: TENNER32_COUNT,
            }),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tenner32Metadata {
    pub permutation_index: usize,
    pub complete_tenners: usize,
    pub tenner_descriptors: Vec<String>,
    pub total_tenners: u8,
}

/// Read the 32-Tenner option list. A missing file is fatal.
pub fn load_tenner32(path: &Path) -> Result<Vec<Tenner32Option>> {
    if !path.exists() {
        return Err(EngineError::missing_source("tenner32", path));
    }
    let content = fs::read_to_string(path)?;
    let rows: Vec<serde_json::Value> = serde_json::from_str(&content)?;
    Ok(rows.iter().map(Tenner32Option::from_json).collect())
}

/// Pick one option by position.
pub fn select_permutation(options: &[Tenner32Option], index: usize) -> Result<&Tenner32Option> {
    options.get(index).ok_or(EngineError::PermutationOutOfRange {
        index,
        available: options.len().saturating_sub(1),
    })
}

/// A row of a numbered Tenner table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TennerRow {
    pub id: String,
    pub version: String,
    pub descriptor: String,
    pub option_index: String,
    pub notes: String,
}

/// Split 32-Tenner options into one table per Tenner, skipping absent or
/// empty values.
pub fn split_into_tables(options: &[Tenner32Option]) -> Vec<(TennerNumber, Vec<TennerRow>)> {
    (1..=TENNER32_COUNT)
        .map(|i| {
            let slot = usize::from(i - 1);
            let mut rows: Vec<TennerRow> = Vec::new();
            for option in options {
                if let Some(descriptor) = option.values.get(slot).cloned().flatten().filter(|d| !d.is_empty()) {
                    let option_index = match &option.option {
                        Some(serde_json::Value::String(s)) => s.clone(),
                        Some(v) => v.to_string(),
                        None => String::new(),
                    };
                    rows.push(TennerRow {
                        id: format!("tenner_{:02}_{:02}", i, rows.len()),
                        version: "1.0.0".to_string(),
                        descriptor,
                        notes: format!("Tenner {} option {}", i, option_index),
                        option_index,
                    });
                }
            }
            (TennerNumber(i), rows)
        })
        .collect()
}

/// Write non-empty tables as `tenner_NN.csv` under `dir`. Returns files written.
pub fn write_tables(dir: &Path, tables: &[(TennerNumber, Vec<TennerRow>)]) -> Result<usize> {
    fs::create_dir_all(dir)?;
    let mut written = 0;
    for (number, rows) in tables {
        if rows.is_empty() {
            debug!(tenner = %number, "no values, skipping table");
            continue;
        }
        let mut writer = csv::Writer::from_path(dir.join(number.file_name()))?;
        for row in rows {
            writer.serialize(row)?;
        }
        writer.flush()?;
        written += 1;
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ten(prefix: &str) -> Vec<AssetRecord> {
        (0..10)
            .map(|i| {
                AssetRecord::new(&format!("{}{}", prefix, i))
                    .with("descriptor", format!("{} {}", prefix, i).as_str())
            })
            .collect()
    }

    #[test]
    fn test_decode_digit_order() {
        assert_eq!(decode(23, 2), vec![3, 2]);
        assert_eq!(decode(7, 3), vec![7, 0, 0]);
        assert_eq!(encode(&[3, 2]), Some(23));
    }

    #[test]
    fn test_encode_rejects_overflow() {
        assert_eq!(encode(&[9; 19]), Some(9_999_999_999_999_999_999));
        assert_eq!(encode(&[9; 20]), None);
        assert_eq!(encode(&[0; 25]), Some(0));
    }

    #[test]
    fn test_cardinality_enforced() {
        let err = TennerSet::new(vec![("character".into(), ten("c")[..9].to_vec())]).unwrap_err();
        assert!(matches!(err, EngineError::Cardinality { found: 9, .. }));
    }

    #[test]
    fn test_space_overflow_rejected() {
        let categories = (0..20).map(|i| (format!("k{}", i), ten("x"))).collect();
        let set = TennerSet::new(categories).unwrap();
        assert!(matches!(
            TennerGenerator::new(set),
            Err(EngineError::CombinationSpaceTooLarge { categories: 20 })
        ));
    }

    #[test]
    fn test_first_category_fastest() {
        let set = TennerSet::new(vec![
            ("character".into(), ten("c")),
            ("headwear".into(), ten("h")),
        ])
        .unwrap();
        let generator = TennerGenerator::new(set).unwrap();
        assert_eq!(generator.len(), 100);

        let p = generator.permutation(23).unwrap();
        assert_eq!(p.items[0].1.id(), "c3");
        assert_eq!(p.items[1].1.id(), "h2");
        assert!(generator.permutation(100).is_none());
    }

    #[test]
    fn test_prompt_order_by_role() {
        let set = TennerSet::new(vec![
            ("props".into(), ten("p")),
            ("garments".into(), ten("g")),
            ("character".into(), ten("c")),
            ("headwear".into(), ten("h")),
        ])
        .unwrap();
        let generator = TennerGenerator::new(set).unwrap();
        let p = generator.permutation(0).unwrap();
        let text = p.prompt(&PromptComposer::new(""), &ContextAssets::default());
        assert!(text.starts_with("c 0. h 0. g 0. p 0. Photographed with"));

        let spec = p.spec(&ContextAssets::default());
        assert_eq!(spec.character.as_deref(), Some("c0"));
        assert_eq!(spec.wardrobe, vec!["h0", "g0"]);
        assert_eq!(spec.props, vec!["p0"]);
    }

    #[test]
    fn test_tenner_number_parse() {
        assert_eq!("T11".parse::<TennerNumber>().unwrap(), TennerNumber(11));
        assert_eq!(TennerNumber(7).file_name(), "tenner_07.csv");
        assert_eq!(TennerNumber(7).placeholder(), "<T7>");
        assert!("X".parse::<TennerNumber>().is_err());
        assert!("T0".parse::<TennerNumber>().is_err());
    }

    #[test]
    fn test_tenner32_selection_and_split() {
        let options = vec![
            Tenner32Option::from_json(&json!({"option": 1, "TENNER 1 (T1)": "a", "TENNER 2 (T2)": null})),
            Tenner32Option::from_json(&json!({"option": 2, "TENNER 1 (T1)": "b", "TENNER 2 (T2)": "x"})),
        ];
        assert_eq!(options[0].complete_count(), 1);
        assert!(select_permutation(&options, 1).is_ok());
        assert!(matches!(
            select_permutation(&options, 2),
            Err(EngineError::PermutationOutOfRange { index: 2, available: 1 })
        ));

        let tables = split_into_tables(&options);
        assert_eq!(tables[0].1.len(), 2);
        assert_eq!(tables[0].1[1].id, "tenner_01_01");
        assert_eq!(tables[1].1.len(), 1);
        assert_eq!(tables[1].1[0].option_index, "2");
        assert!(tables[2].1.is_empty());
    }
}
