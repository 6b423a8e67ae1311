use crate::model::quote::{Quote, QuoteId};

const DEFAULT_SEED: &[(&str, &str, &str)] = &[
    (
        "local-default-1",
        "The best way to get started is to quit talking and begin doing.",
        "Motivation",
    ),
    (
        "local-default-2",
        "Life is what happens when you're busy making other plans.",
        "Life",
    ),
    (
        "local-default-3",
        "The only true wisdom is in knowing you know nothing.",
        "Wisdom",
    ),
];

/// Seed set installed when nothing usable is stored.
///
/// Ids are fixed so two fresh sessions seed identical collections.
pub fn default_quotes() -> Vec<Quote> {
    DEFAULT_SEED
        .iter()
        .map(|(id, text, category)| Quote {
            id: QuoteId::from_raw(*id),
            text: (*text).to_string(),
            category: (*category).to_string(),
        })
        .collect()
}
