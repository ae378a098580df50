//! Media-query merging.

use crate::css::{AtRule, Item, OutputStyle, Stylesheet, parse_asset};
use aflow_kernel::prelude::{Asset, Step, StepError};

#[derive(Debug, Default, Clone, Copy)]
pub struct MergeMedia;

impl Step for MergeMedia {
    fn name(&self) -> &'static str {
        "merge-media-queries"
    }

    fn apply(&self, mut asset: Asset) -> Result<Asset, StepError> {
        let sheet = parse_asset(&asset)?;
        let merged = Stylesheet { items: merge_media(sheet.items) };
        asset.set_text(merged.to_css(OutputStyle::Expanded));
        Ok(asset)
    }
}

/// Merges top-level `@media` blocks with identical queries and moves them
/// after everything else, in order of first appearance.
pub fn merge_media(items: Vec<Item>) -> Vec<Item> {
    let mut rest = Vec::with_capacity(items.len());
    let mut merged: Vec<AtRule> = Vec::new();

    for item in items {
        match item {
            Item::AtRule(at) if at.name.eq_ignore_ascii_case("media") && at.items.is_some() => {
                let key = query_key(&at.prelude);
                match merged.iter_mut().find(|m| query_key(&m.prelude) == key) {
                    Some(existing) => {
                        if let (Some(into), Some(from)) = (existing.items.as_mut(), at.items) {
                            into.extend(from);
                        }
                    },
                    None => merged.push(at),
                }
            },
            other => rest.push(other),
        }
    }

    rest.extend(merged.into_iter().map(Item::AtRule));
    rest
}

fn query_key(prelude: &str) -> String {
    prelude.split_whitespace().collect::<Vec<_>>().join(" ").to_ascii_lowercase()
}
