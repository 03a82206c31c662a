//! Recommendable products. Single source of truth for the generation prompt
//! and for filtering recommendations before they leave the service.

use tracing::debug;

use crate::Recommendation;

/// Handle of the paid detailed-reading product every upsell points at.
pub const DETAILED_READING_HANDLE: &str = "detailed-reading";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Product {
    pub handle: &'static str,
    pub tag: &'static str,
    /// What the product stands for, shown to the model as a hint.
    pub meaning: &'static str,
}

const PRODUCTS: &[Product] = &[
    Product {
        handle: "fox-charm",
        tag: "love_guard",
        meaning: "protects love and builds confidence",
    },
    Product {
        handle: "rose-quartz-bracelet",
        tag: "love_boost",
        meaning: "softens relationships and eases communication",
    },
    Product {
        handle: "calm-aroma",
        tag: "calm_sleep",
        meaning: "calms the mind and steadies emotions",
    },
    Product {
        handle: "wealth-amulet",
        tag: "money_boost",
        meaning: "financial confidence and drive",
    },
    Product {
        handle: "career-talisman",
        tag: "career_boost",
        meaning: "career focus and helpful people",
    },
    Product {
        handle: DETAILED_READING_HANDLE,
        tag: "detailed_reading",
        meaning: "paid detailed reading service (digital product)",
    },
];

/// The closed allow-list of recommendable products. Not extensible at
/// runtime: neither users nor the model can add handles.
#[derive(Debug, Clone, Copy)]
pub struct Catalog {
    products: &'static [Product],
}

impl Default for Catalog {
    fn default() -> Self {
        Self { products: PRODUCTS }
    }
}

impl Catalog {
    pub fn products(&self) -> &'static [Product] {
        self.products
    }

    pub fn contains(&self, handle: &str) -> bool {
        self.get(handle).is_some()
    }

    pub fn get(&self, handle: &str) -> Option<&'static Product> {
        self.products.iter().find(|p| p.handle == handle)
    }

    /// Build a recommendation for a known handle, using the catalog tag.
    pub fn recommend(&self, handle: &str, reason: &str) -> Option<Recommendation> {
        self.get(handle).map(|p| Recommendation {
            handle: p.handle.to_string(),
            reason: reason.to_string(),
            tag: p.tag.to_string(),
        })
    }

    /// Substituted whenever filtering leaves nothing to show.
    pub fn default_recommendation(&self) -> Recommendation {
        Recommendation {
            handle: "calm-aroma".to_string(),
            reason: "A steady, calm routine supports every other area of this reading.".to_string(),
            tag: "calm_sleep".to_string(),
        }
    }

    /// Catalog as prompt text: one `- handle: tag (meaning)` line per product.
    pub fn prompt_hint(&self) -> String {
        self.products
            .iter()
            .map(|p| format!("- {}: {} ({})", p.handle, p.tag, p.meaning))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Drop recommendations whose handle is not in `catalog` and keep at most
/// `max` of the rest, in input order. May return an empty vec; callers
/// substitute [`Catalog::default_recommendation`].
pub fn filter_recommendations(
    recs: Vec<Recommendation>,
    catalog: &Catalog,
    max: usize,
) -> Vec<Recommendation> {
    let before = recs.len();
    let kept: Vec<Recommendation> = recs
        .into_iter()
        .filter(|r| catalog.contains(&r.handle))
        .take(max)
        .collect();
    if kept.len() != before {
        debug!(before, after = kept.len(), "filtered recommendations");
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn rec(handle: &str) -> Recommendation {
        Recommendation {
            handle: handle.to_string(),
            reason: "r".to_string(),
            tag: "t".to_string(),
        }
    }

    #[test]
    fn unknown_handles_are_dropped_in_order() {
        let catalog = Catalog::default();
        let out = filter_recommendations(
            vec![rec("unicorn-dust"), rec("fox-charm"), rec("calm-aroma")],
            &catalog,
            6,
        );
        let handles: Vec<_> = out.iter().map(|r| r.handle.as_str()).collect();
        assert_eq!(handles, ["fox-charm", "calm-aroma"]);
    }

    #[test]
    fn truncates_to_max() {
        let catalog = Catalog::default();
        let recs = catalog.products().iter().map(|p| rec(p.handle)).collect();
        assert_eq!(filter_recommendations(recs, &catalog, 3).len(), 3);
    }

    #[test]
    fn all_invalid_yields_empty() {
        let out = filter_recommendations(vec![rec("x"), rec("y")], &Catalog::default(), 6);
        assert!(out.is_empty());
    }

    #[test]
    fn default_recommendation_is_in_catalog() {
        let catalog = Catalog::default();
        assert!(catalog.contains(&catalog.default_recommendation().handle));
        assert!(catalog.contains(DETAILED_READING_HANDLE));
    }

    #[test]
    fn prompt_hint_lists_every_handle() {
        let catalog = Catalog::default();
        let hint = catalog.prompt_hint();
        for p in catalog.products() {
            assert!(hint.contains(p.handle));
        }
        assert_eq!(hint.lines().count(), catalog.products().len());
    }

    fn arb_handle() -> impl Strategy<Value = String> {
        prop_oneof![
            Just("fox-charm".to_string()),
            Just("calm-aroma".to_string()),
            Just("wealth-amulet".to_string()),
            "[a-z-]{1,12}",
        ]
    }

    proptest! {
        #[test]
        fn prop_filter_bounds_and_idempotent(
            handles in proptest::collection::vec(arb_handle(), 0..12),
            max in 1usize..7,
        ) {
            let catalog = Catalog::default();
            let recs: Vec<_> = handles.iter().map(|h| rec(h)).collect();
            let once = filter_recommendations(recs, &catalog, max);
            prop_assert!(once.len() <= max);
            prop_assert!(once.iter().all(|r| catalog.contains(&r.handle)));
            let twice = filter_recommendations(once.clone(), &catalog, max);
            prop_assert_eq!(once, twice);
        }
    }
}
