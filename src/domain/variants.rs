//! Variant combination engine.
//!
//! The product editor submits a sparse set of option axes (e.g. Size, Color,
//! Material). This module expands them into the cartesian product of concrete
//! combinations, groups the rows under a primary axis into parent/sub-variant
//! shape, and merges a previously saved tree back in so price/stock/barcode
//! entered by the user survive a regeneration. Persistence only ever sees the
//! flattened one-row-per-combination form.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::Variant;

/// One option dimension as submitted by the editor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionAxis {
    pub name: String,
    #[serde(default)]
    pub values: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubVariant {
    #[serde(default)]
    pub size: String,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub material: String,
    #[serde(default)]
    pub price: i64,
    #[serde(default)]
    pub stock: i32,
    #[serde(default)]
    pub barcode: String,
    #[serde(default)]
    pub image_variant: String,
}

/// Parent row keyed by the primary-axis value, owning one sub-variant per
/// generated combination in its group.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupedVariant {
    #[serde(default)]
    pub id: Option<Uuid>,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub product_id: Option<Uuid>,
    #[serde(default)]
    pub size: String,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub material: String,
    #[serde(default)]
    pub price: i64,
    #[serde(default)]
    pub stock: i32,
    #[serde(default)]
    pub barcode: String,
    #[serde(default)]
    pub image_variant: String,
    #[serde(default)]
    pub sub_variants: Vec<SubVariant>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeneratedVariants {
    pub variants: Vec<GroupedVariant>,
}

/// The persisted, ungrouped representation: one row per concrete combination.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlatVariant {
    pub size: String,
    pub color: String,
    pub material: String,
    pub price: i64,
    pub stock: i32,
    pub barcode: String,
    pub image_variant: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Size,
    Color,
    Material,
}

/// Axis names map to semantic slots by substring; axes matching no slot are
/// dropped from the row.
fn slot_of(name: &str) -> Option<Slot> {
    if name.contains("size") {
        Some(Slot::Size)
    } else if name.contains("color") {
        Some(Slot::Color)
    } else if name.contains("material") {
        Some(Slot::Material)
    } else {
        None
    }
}

fn set_slot(size: &mut String, color: &mut String, material: &mut String, slot: Slot, value: &str) {
    let field = match slot {
        Slot::Size => size,
        Slot::Color => color,
        Slot::Material => material,
    };
    // First axis claiming a slot wins; a second axis aliasing the same slot is
    // ignored rather than overwriting.
    if field.is_empty() {
        *field = value.to_string();
    }
}

struct Axis {
    name: String,
    values: Vec<String>,
}

/// Lower-case names, trim values, drop empty values; an axis with no name or
/// no surviving value is excluded from the product entirely.
fn normalize(axes: &[OptionAxis]) -> Vec<Axis> {
    axes.iter()
        .filter_map(|a| {
            let name = a.name.trim().to_lowercase();
            if name.is_empty() {
                return None;
            }
            let values: Vec<String> = a
                .values
                .iter()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .collect();
            if values.is_empty() {
                return None;
            }
            Some(Axis { name, values })
        })
        .collect()
}

/// Cartesian product preserving axis order: the leftmost axis varies slowest,
/// the last axis cycles fastest.
fn cartesian(axes: &[Axis]) -> Vec<Vec<String>> {
    let mut rows: Vec<Vec<String>> = vec![Vec::new()];
    for axis in axes {
        let mut next = Vec::with_capacity(rows.len() * axis.values.len());
        for row in &rows {
            for value in &axis.values {
                let mut extended = row.clone();
                extended.push(value.clone());
                next.push(extended);
            }
        }
        rows = next;
    }
    rows
}

/// Expand option axes into grouped parent/sub-variant shape. Price, stock and
/// barcode on every generated row start zeroed; `merge_previous` restores the
/// user-entered figures afterwards.
pub fn generate(axes: &[OptionAxis]) -> GeneratedVariants {
    let axes = normalize(axes);
    if axes.is_empty() {
        return GeneratedVariants::default();
    }

    // The first size-like axis keys the top-level grouping, else the first axis.
    let primary = axes
        .iter()
        .position(|a| a.name.contains("size"))
        .unwrap_or(0);

    let mut keys: Vec<String> = Vec::new();
    let mut groups: Vec<GroupedVariant> = Vec::new();

    for row in cartesian(&axes) {
        let key = row[primary].clone();
        let gi = match keys.iter().position(|k| *k == key) {
            Some(i) => i,
            None => {
                let mut group = GroupedVariant::default();
                if let Some(slot) = slot_of(&axes[primary].name) {
                    set_slot(
                        &mut group.size,
                        &mut group.color,
                        &mut group.material,
                        slot,
                        &key,
                    );
                }
                keys.push(key);
                groups.push(group);
                groups.len() - 1
            }
        };

        let mut sub = SubVariant::default();
        for (i, axis) in axes.iter().enumerate() {
            if i == primary {
                continue;
            }
            if let Some(slot) = slot_of(&axis.name) {
                set_slot(&mut sub.size, &mut sub.color, &mut sub.material, slot, &row[i]);
            }
        }
        groups[gi].sub_variants.push(sub);
    }

    GeneratedVariants { variants: groups }
}

/// Carry user-entered figures from a previously saved tree onto a freshly
/// generated one. Groups match on the exact (size, color, material) triple;
/// sub-variants are matched positionally by index, so reordering values
/// between regenerations misattributes price/stock (kept as-is pending
/// product-owner clarification).
pub fn merge_previous(
    mut generated: GeneratedVariants,
    previous: &GeneratedVariants,
) -> GeneratedVariants {
    for group in &mut generated.variants {
        let Some(prev) = previous.variants.iter().find(|p| {
            p.size == group.size && p.color == group.color && p.material == group.material
        }) else {
            continue;
        };

        group.id = prev.id;
        group.slug = prev.slug.clone();
        group.product_id = prev.product_id;
        group.price = prev.price;
        group.stock = prev.stock;
        group.barcode = prev.barcode.clone();
        group.image_variant = prev.image_variant.clone();

        for (i, sub) in group.sub_variants.iter_mut().enumerate() {
            if let Some(ps) = prev.sub_variants.get(i) {
                sub.price = ps.price;
                sub.stock = ps.stock;
                sub.barcode = ps.barcode.clone();
                sub.image_variant = ps.image_variant.clone();
            }
        }
    }
    generated
}

/// Expand grouped shape to the persisted one-row-per-combination form. Each
/// sub-variant inherits the group's size and supplies its own remaining
/// fields; a group without sub-variants flattens to a single row of its own.
pub fn flatten(generated: &GeneratedVariants) -> Vec<FlatVariant> {
    let mut rows = Vec::new();
    for group in &generated.variants {
        if group.sub_variants.is_empty() {
            rows.push(FlatVariant {
                size: group.size.clone(),
                color: group.color.clone(),
                material: group.material.clone(),
                price: group.price,
                stock: group.stock,
                barcode: group.barcode.clone(),
                image_variant: group.image_variant.clone(),
            });
        } else {
            for sub in &group.sub_variants {
                rows.push(FlatVariant {
                    size: group.size.clone(),
                    color: sub.color.clone(),
                    material: sub.material.clone(),
                    price: sub.price,
                    stock: sub.stock,
                    barcode: sub.barcode.clone(),
                    image_variant: sub.image_variant.clone(),
                });
            }
        }
    }
    rows
}

/// Rebuild the editor's grouped shape from persisted flat rows, keyed by size
/// when any row carries one, else by the first populated slot.
pub fn regroup(rows: &[Variant]) -> GeneratedVariants {
    fn field(row: &Variant, slot: Slot) -> String {
        match slot {
            Slot::Size => row.size.clone().unwrap_or_default(),
            Slot::Color => row.color.clone().unwrap_or_default(),
            Slot::Material => row.material.clone().unwrap_or_default(),
        }
    }

    let primary = [Slot::Size, Slot::Color, Slot::Material]
        .into_iter()
        .find(|&slot| rows.iter().any(|r| !field(r, slot).is_empty()));
    let Some(primary) = primary else {
        return GeneratedVariants::default();
    };

    let mut keys: Vec<String> = Vec::new();
    let mut groups: Vec<GroupedVariant> = Vec::new();
    for row in rows {
        let key = field(row, primary);
        let gi = match keys.iter().position(|k| *k == key) {
            Some(i) => i,
            None => {
                let mut group = GroupedVariant {
                    id: Some(row.id),
                    slug: Some(row.slug.clone()),
                    product_id: Some(row.product_id),
                    price: row.price,
                    stock: row.stock,
                    barcode: row.barcode.clone().unwrap_or_default(),
                    image_variant: row.image_variant.clone().unwrap_or_default(),
                    ..GroupedVariant::default()
                };
                set_slot(
                    &mut group.size,
                    &mut group.color,
                    &mut group.material,
                    primary,
                    &key,
                );
                keys.push(key);
                groups.push(group);
                groups.len() - 1
            }
        };

        let mut sub = SubVariant {
            price: row.price,
            stock: row.stock,
            barcode: row.barcode.clone().unwrap_or_default(),
            image_variant: row.image_variant.clone().unwrap_or_default(),
            ..SubVariant::default()
        };
        for slot in [Slot::Size, Slot::Color, Slot::Material] {
            if slot == primary {
                continue;
            }
            let value = field(row, slot);
            if !value.is_empty() {
                set_slot(&mut sub.size, &mut sub.color, &mut sub.material, slot, &value);
            }
        }
        groups[gi].sub_variants.push(sub);
    }

    GeneratedVariants { variants: groups }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn axis(name: &str, values: &[&str]) -> OptionAxis {
        OptionAxis {
            name: name.into(),
            values: values.iter().map(|v| v.to_string()).collect(),
        }
    }

    #[test]
    fn cartesian_row_and_group_counts() {
        let generated = generate(&[
            axis("Size", &["S", "M"]),
            axis("Color", &["Red", "Blue", "Green"]),
            axis("Material", &["Cotton", "Wool"]),
        ]);
        assert_eq!(generated.variants.len(), 2); // one group per size
        assert_eq!(flatten(&generated).len(), 12); // 2 x 3 x 2
    }

    #[test]
    fn last_axis_cycles_fastest() {
        let generated = generate(&[axis("Size", &["S"]), axis("Color", &["Red", "Blue"])]);
        let subs = &generated.variants[0].sub_variants;
        assert_eq!(subs[0].color, "Red");
        assert_eq!(subs[1].color, "Blue");
    }

    #[test]
    fn size_axis_keys_grouping_even_when_listed_later() {
        let generated = generate(&[
            axis("Color", &["Red", "Blue"]),
            axis("Size", &["S", "M"]),
        ]);
        assert_eq!(generated.variants.len(), 2);
        assert_eq!(generated.variants[0].size, "S");
        assert_eq!(generated.variants[0].sub_variants[0].color, "Red");
        assert_eq!(generated.variants[0].sub_variants[1].color, "Blue");
    }

    #[test]
    fn first_axis_is_primary_without_size() {
        let generated = generate(&[
            axis("Color", &["Red", "Blue"]),
            axis("Material", &["Cotton"]),
        ]);
        assert_eq!(generated.variants.len(), 2);
        assert_eq!(generated.variants[0].color, "Red");
        assert_eq!(generated.variants[0].size, "");
        assert_eq!(generated.variants[0].sub_variants[0].material, "Cotton");
    }

    #[test]
    fn empty_only_axis_is_excluded_not_treated_as_single_empty_value() {
        let generated = generate(&[
            axis("Size", &["S", "M"]),
            axis("Color", &["", "  "]),
        ]);
        assert_eq!(flatten(&generated).len(), 2);
        assert!(generated.variants.iter().all(|g| g
            .sub_variants
            .iter()
            .all(|s| s.color.is_empty())));
    }

    #[test]
    fn no_usable_axes_yields_empty_result() {
        assert!(generate(&[]).variants.is_empty());
        assert!(generate(&[axis("", &["S"]), axis("Size", &[])]).variants.is_empty());
    }

    #[test]
    fn unknown_axis_is_dropped_from_rows_but_still_multiplies() {
        let generated = generate(&[
            axis("Size", &["S"]),
            axis("Style", &["Slim", "Loose"]),
        ]);
        // Two combinations survive even though the style value has no slot.
        assert_eq!(generated.variants[0].sub_variants.len(), 2);
        assert_eq!(generated.variants[0].sub_variants[0], SubVariant::default());
    }

    #[test]
    fn merge_restores_user_figures_for_unchanged_triples() {
        let axes = [axis("Size", &["S", "M"]), axis("Color", &["Red", "Blue"])];
        let mut previous = generate(&axes);
        previous.variants[0].sub_variants[0].price = 1500;
        previous.variants[0].sub_variants[0].stock = 7;
        previous.variants[0].sub_variants[1].barcode = "B-42".into();
        previous.variants[1].price = 900;

        let merged = merge_previous(generate(&axes), &previous);
        assert_eq!(merged.variants[0].sub_variants[0].price, 1500);
        assert_eq!(merged.variants[0].sub_variants[0].stock, 7);
        assert_eq!(merged.variants[0].sub_variants[1].barcode, "B-42");
        assert_eq!(merged.variants[1].price, 900);
    }

    #[test]
    fn merge_is_idempotent_when_axes_are_unchanged() {
        let axes = [axis("Size", &["S", "M"]), axis("Color", &["Red", "Blue"])];
        let mut saved = generate(&axes);
        for group in &mut saved.variants {
            for (i, sub) in group.sub_variants.iter_mut().enumerate() {
                sub.price = 100 + i as i64;
                sub.stock = 3;
            }
        }
        let once = merge_previous(generate(&axes), &saved);
        let twice = merge_previous(generate(&axes), &once);
        assert_eq!(once, twice);
    }

    #[test]
    fn appending_a_non_primary_value_preserves_existing_indices() {
        let before = [axis("Size", &["S"]), axis("Color", &["Red", "Blue"])];
        let after = [axis("Size", &["S"]), axis("Color", &["Red", "Blue", "Green"])];

        let mut saved = generate(&before);
        saved.variants[0].sub_variants[0].price = 111;
        saved.variants[0].sub_variants[1].price = 222;

        let merged = merge_previous(generate(&after), &saved);
        let subs = &merged.variants[0].sub_variants;
        assert_eq!(subs[0].price, 111);
        assert_eq!(subs[1].price, 222);
        assert_eq!(subs[2].price, 0); // new combination starts zeroed
    }

    #[test]
    fn merge_matching_is_case_sensitive() {
        let mut previous = generate(&[axis("Size", &["s"])]);
        previous.variants[0].price = 500;
        let merged = merge_previous(generate(&[axis("Size", &["S"])]), &previous);
        assert_eq!(merged.variants[0].price, 0);
    }

    #[test]
    fn merge_copies_identity_onto_matching_groups() {
        let axes = [axis("Size", &["S"])];
        let mut previous = generate(&axes);
        let id = Uuid::new_v4();
        previous.variants[0].id = Some(id);
        previous.variants[0].slug = Some("tee-s".into());

        let merged = merge_previous(generate(&axes), &previous);
        assert_eq!(merged.variants[0].id, Some(id));
        assert_eq!(merged.variants[0].slug.as_deref(), Some("tee-s"));
    }

    #[test]
    fn group_without_subs_flattens_to_one_row_of_its_own_fields() {
        let generated = GeneratedVariants {
            variants: vec![GroupedVariant {
                size: "XL".into(),
                price: 2000,
                stock: 4,
                ..GroupedVariant::default()
            }],
        };
        let rows = flatten(&generated);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].size, "XL");
        assert_eq!(rows[0].price, 2000);
        assert_eq!(rows[0].stock, 4);
    }

    #[test]
    fn regroup_rebuilds_editor_shape_from_flat_rows() {
        let product_id = Uuid::new_v4();
        let row = |size: &str, color: &str, price: i64| Variant {
            id: Uuid::new_v4(),
            slug: format!("v-{size}-{color}").to_lowercase(),
            product_id,
            size: Some(size.into()),
            color: Some(color.into()),
            material: None,
            price,
            stock: 1,
            barcode: None,
            image_variant: None,
        };
        let rows = vec![row("S", "Red", 10), row("S", "Blue", 20), row("M", "Red", 30)];
        let grouped = regroup(&rows);
        assert_eq!(grouped.variants.len(), 2);
        assert_eq!(grouped.variants[0].size, "S");
        assert_eq!(grouped.variants[0].sub_variants.len(), 2);
        assert_eq!(grouped.variants[0].sub_variants[1].color, "Blue");
        assert_eq!(grouped.variants[0].sub_variants[1].price, 20);
        assert_eq!(grouped.variants[1].size, "M");
    }
}
