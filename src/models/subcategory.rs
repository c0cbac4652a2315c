//! Subcategory (secondary tag) model.
//!
//! A subcategory is a tag that cuts across job classes, e.g. the sample a
//! pipeline step ran on. For each category it keeps the resources of the
//! most recent measurement carrying the tag, which allows tags to be
//! ranked against each other on the categories they share.
//!
//! Subcategories are tracked alongside categories but are not consumed by
//! the estimation or policy pipeline.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use super::Resources;

/// Per-category resources for one tag.
#[derive(Debug, Clone)]
pub struct Subcategory {
    name: String,
    resources_by_category: BTreeMap<String, Resources>,
}

impl Subcategory {
    /// Creates an empty subcategory.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            resources_by_category: BTreeMap::new(),
        }
    }

    /// Tag name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Records the resources seen for `category` under this tag.
    ///
    /// A later measurement for the same category replaces the earlier one.
    pub fn add_measurement(&mut self, category: impl Into<String>, resources: Resources) {
        self.resources_by_category.insert(category.into(), resources);
    }

    /// Resources recorded for a category.
    pub fn resources_for(&self, category: &str) -> Option<&Resources> {
        self.resources_by_category.get(category)
    }

    /// Categories this tag appears in.
    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.resources_by_category.keys().map(String::as_str)
    }

    /// Number of categories this tag appears in.
    pub fn category_count(&self) -> usize {
        self.resources_by_category.len()
    }
}

impl PartialEq for Subcategory {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Subcategory {}

impl std::hash::Hash for Subcategory {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

/// Summed wall-time difference `a - b` over the categories both tags share.
pub fn wall_time_differential(a: &Subcategory, b: &Subcategory) -> f64 {
    a.resources_by_category
        .iter()
        .filter_map(|(cat, ra)| {
            b.resources_by_category
                .get(cat)
                .map(|rb| ra.wall_time - rb.wall_time)
        })
        .sum()
}

/// Orders tags by shared-category wall time: faster tags first.
pub fn compare_by_wall_time(a: &Subcategory, b: &Subcategory) -> Ordering {
    wall_time_differential(a, b)
        .partial_cmp(&0.0)
        .unwrap_or(Ordering::Equal)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latest_measurement_wins() {
        let mut s = Subcategory::new("sampleA");
        s.add_measurement("align", Resources::new(100.0, 60.0));
        s.add_measurement("align", Resources::new(200.0, 90.0));
        s.add_measurement("sort", Resources::new(50.0, 30.0));

        assert_eq!(s.category_count(), 2);
        assert!((s.resources_for("align").unwrap().memory - 200.0).abs() < 1e-10);
        assert_eq!(s.categories().collect::<Vec<_>>(), vec!["align", "sort"]);
    }

    #[test]
    fn test_differential_only_shared_categories() {
        let mut a = Subcategory::new("a");
        a.add_measurement("align", Resources::new(0.0, 100.0));
        a.add_measurement("only_a", Resources::new(0.0, 10_000.0));

        let mut b = Subcategory::new("b");
        b.add_measurement("align", Resources::new(0.0, 160.0));
        b.add_measurement("only_b", Resources::new(0.0, 5.0));

        assert!((wall_time_differential(&a, &b) + 60.0).abs() < 1e-10);
        assert_eq!(compare_by_wall_time(&a, &b), Ordering::Less);
        assert_eq!(compare_by_wall_time(&b, &a), Ordering::Greater);
    }

    #[test]
    fn test_no_shared_categories_equal() {
        let mut a = Subcategory::new("a");
        a.add_measurement("x", Resources::new(0.0, 1.0));
        let mut b = Subcategory::new("b");
        b.add_measurement("y", Resources::new(0.0, 2.0));
        assert_eq!(compare_by_wall_time(&a, &b), Ordering::Equal);
    }

    #[test]
    fn test_identity_is_name() {
        let mut a = Subcategory::new("t");
        a.add_measurement("x", Resources::new(0.0, 1.0));
        assert_eq!(a, Subcategory::new("t"));
    }
}
